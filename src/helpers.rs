use std::fs;
use std::io;
use std::io::prelude::*;
use std::path::Path;

use bzip2::read::MultiBzDecoder;
use flate2::read::MultiGzDecoder;
use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::{WikiResult, WikiResultExt};

/// Logs go to stderr; `RUST_LOG` overrides the default `info` level.
pub fn init_logging() {
    let env = env_logger::Env::default().default_filter_or("info");
    let _ = env_logger::Builder::from_env(env).try_init();
}

pub fn data_dir_for(state: &str, source: &str, date: &str) -> String {
    format!("data/{}/{}/{}", state, source, date)
}

/// Most recent date directory under `data/<state>/<source>` carrying an `ok`
/// marker.
pub fn latest(state: &str, source: &str) -> WikiResult<Option<String>> {
    latest_in(&Path::new("data").join(state).join(source))
}

fn latest_in(root: &Path) -> WikiResult<Option<String>> {
    if !root.exists() {
        return Ok(None);
    }
    let mut dates = vec![];
    for entry in fs::read_dir(root)? {
        let entry = entry?;
        if entry.path().join("ok").exists() {
            if let Some(name) = entry.file_name().to_str() {
                dates.push(name.to_string());
            }
        }
    }
    dates.sort();
    Ok(dates.pop())
}

pub struct ReadChain<T: Read> {
    position: usize,
    inner: Vec<T>,
}

impl<T: Read> ReadChain<T> {
    pub fn new(readers: Vec<T>) -> ReadChain<T> {
        ReadChain { position: 0, inner: readers }
    }
}

impl<T: Read> Read for ReadChain<T> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        while self.position < self.inner.len() {
            let sent = self.inner[self.position].read(buf)?;
            if sent > 0 {
                return Ok(sent);
            }
            self.position += 1;
        }
        Ok(0)
    }
}

/// Chains every downloaded `.bz2` part of a dump.
pub fn bzcat(source: &str, date: &str) -> WikiResult<ReadChain<MultiBzDecoder<fs::File>>> {
    bzcat_dir(Path::new(&data_dir_for("download", source, date)))
}

fn bzcat_dir(dir: &Path) -> WikiResult<ReadChain<MultiBzDecoder<fs::File>>> {
    let glob = dir.join("*.bz2");
    let mut decompressors = vec![];
    for entry in ::glob::glob(&glob.to_string_lossy())? {
        let file = fs::File::open(entry?)?;
        decompressors.push(MultiBzDecoder::new(file));
    }
    if decompressors.is_empty() {
        bail!("no .bz2 part in {:?}", dir);
    }
    Ok(ReadChain::new(decompressors))
}

/// The given dump, or every part of the latest `<lang>wiki` download.
pub fn wiki_pages_input(lang: &str, dump: Option<&str>) -> WikiResult<Box<dyn BufRead + Send>> {
    if let Some(path) = dump {
        return open_input(path);
    }
    let source = format!("{}wiki", lang);
    let date = latest("download", &source)?
        .ok_or_else(|| format!("no {} download found, pass --dump", source))?;
    info!("reading {} dump of {}", source, date);
    Ok(Box::new(io::BufReader::new(bzcat(&source, &date)?)))
}

/// Opens a dump for reading, `-` meaning stdin. `.bz2` and `.gz` files are
/// decompressed on the fly.
pub fn open_input(path: &str) -> WikiResult<Box<dyn BufRead + Send>> {
    if path == "-" {
        return Ok(Box::new(io::BufReader::new(io::stdin())));
    }
    let file = fs::File::open(path).chain_err(|| format!("can not open {}", path))?;
    let reader: Box<dyn BufRead + Send> = if path.ends_with(".bz2") {
        Box::new(io::BufReader::new(MultiBzDecoder::new(file)))
    } else if path.ends_with(".gz") {
        Box::new(io::BufReader::new(MultiGzDecoder::new(file)))
    } else {
        Box::new(io::BufReader::new(file))
    };
    Ok(reader)
}

pub fn create_output<P: AsRef<Path>>(path: P) -> WikiResult<io::BufWriter<fs::File>> {
    let path = path.as_ref();
    let file = fs::File::create(path).chain_err(|| format!("can not create {:?}", path))?;
    Ok(io::BufWriter::new(file))
}

pub fn read_json<T: DeserializeOwned, P: AsRef<Path>>(path: P) -> WikiResult<T> {
    let path = path.as_ref();
    let file = fs::File::open(path).chain_err(|| format!("can not open {:?}", path))?;
    Ok(serde_json::from_reader(io::BufReader::new(file))
        .chain_err(|| format!("can not parse {:?}", path))?)
}

pub fn write_json<T: Serialize, P: AsRef<Path>>(path: P, value: &T) -> WikiResult<()> {
    let mut output = create_output(path)?;
    serde_json::to_writer_pretty(&mut output, value)?;
    output.write_all(b"\n")?;
    output.flush()?;
    Ok(())
}

/// Non-empty lines of a text file, trailing whitespace removed.
pub fn read_lines<P: AsRef<Path>>(path: P) -> WikiResult<Vec<String>> {
    let path = path.as_ref();
    let file = fs::File::open(path).chain_err(|| format!("can not open {:?}", path))?;
    let mut lines = vec![];
    for line in io::BufReader::new(file).lines() {
        let line = line?;
        let line = line.trim_end();
        if !line.is_empty() {
            lines.push(line.to_string());
        }
    }
    Ok(lines)
}
