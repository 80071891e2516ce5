#[macro_use]
extern crate error_chain;
#[macro_use]
extern crate log;

use std::fs;
use std::io;
use std::io::prelude::*;
use std::path::Path;
use std::time::Duration;

use clap::Parser;
use regex::Regex;

use causegraph::api::DEFAULT_USER_AGENT;
use causegraph::helpers;
use causegraph::{WikiResult, WikiResultExt};

const PREFIX: &str = "https://dumps.wikimedia.org";

/// Fetches a Wikidata JSON dump or a Wikipedia pages-articles dump into
/// data/download/.
#[derive(Parser)]
struct Args {
    /// `wikidatawiki`, or a wiki such as `enwiki`
    wiki: String,
    /// Dump date, or `latest`
    #[arg(default_value = "latest")]
    date: String,
    #[arg(long, env = "CAUSEGRAPH_USER_AGENT", default_value = DEFAULT_USER_AGENT)]
    user_agent: String,
}

struct Downloader {
    client: reqwest::blocking::Client,
}

impl Downloader {
    fn lines(&self, url: &str) -> WikiResult<Vec<String>> {
        let res = self.client.get(url).send()?.error_for_status()?;
        let mut lines = vec![];
        for line in io::BufReader::new(res).lines() {
            lines.push(line?);
        }
        Ok(lines)
    }

    fn latest_available(&self, wiki: &str, item: &str) -> WikiResult<Option<String>> {
        let rss_url = format!("{}/{}/latest/{}-latest-{}-rss.xml", PREFIX, wiki, wiki, item);
        let re = Regex::new(r#"<link>.*/(20\d+)</link>"#)?;
        Ok(self
            .lines(&rss_url)?
            .iter()
            .find_map(|line| re.captures(line).map(|cap| cap[1].to_string())))
    }

    fn latest_wikidata_available(&self) -> WikiResult<Option<String>> {
        let re = Regex::new(r#"href="(\d*)\.json\.gz""#)?;
        Ok(self
            .lines(&format!("{}/other/wikidata/", PREFIX))?
            .iter()
            .flat_map(|line| re.captures_iter(line).map(|cap| cap[1].to_string()).collect::<Vec<_>>())
            .last())
    }

    fn download_wikidata(&self, date: Option<String>) -> WikiResult<()> {
        let date = match date {
            Some(date) => date,
            None => self.latest_wikidata_available()?.ok_or("no wikidata dump found")?,
        };
        let url = format!("{}/other/wikidata/{}.json.gz", PREFIX, date);
        let dir = helpers::data_dir_for("download", "wikidata", &date);
        fs::create_dir_all(&dir)?;
        self.download_if_smaller(&url, &format!("{}/wikidata-{}.json.gz", dir, date))?;
        fs::File::create(format!("{}/ok", dir))?;
        Ok(())
    }

    fn download_wiki(&self, wiki: &str, date: Option<String>) -> WikiResult<()> {
        let date = match date {
            Some(date) => date,
            None => self
                .latest_available(wiki, "pages-articles.xml.bz2")?
                .ok_or_else(|| format!("no dump found for {}", wiki))?,
        };
        let dir = helpers::data_dir_for("download", wiki, &date);
        fs::create_dir_all(&dir)?;

        let summary_url = format!("{}/{}/{}/", PREFIX, wiki, date);
        let re = Regex::new(&format!(r#"href="(/{}/{}/{}-{}-pages-articles\d[^"]*)""#, wiki, date, wiki, date))?;
        let mut files = vec![];
        for line in self.lines(&summary_url)? {
            for cap in re.captures_iter(&line) {
                files.push(cap[1].to_string());
            }
        }
        if files.is_empty() {
            files.push(format!("/{}/{}/{}-{}-pages-articles.xml.bz2", wiki, date, wiki, date));
        }
        for file in files {
            self.download_if_smaller(&format!("{}{}", PREFIX, file), &format!("data/download{}", file))?;
        }
        fs::File::create(format!("{}/ok", dir))?;
        Ok(())
    }

    fn download_if_smaller(&self, url: &str, filename: &str) -> WikiResult<()> {
        let path = Path::new(filename);
        let mut res = self.client.get(url).send()?.error_for_status()?;
        let size = res.content_length();
        let local = path.metadata().map(|m| m.len()).ok();
        match size {
            Some(size) if local == Some(size) => info!("skip {} (size: {})", filename, size),
            _ => {
                info!("downloading {} to {}", url, filename);
                let mut file = helpers::create_output(path)?;
                io::copy(&mut res, &mut file).chain_err(|| format!("downloading {}", url))?;
                file.flush()?;
            }
        }
        Ok(())
    }
}

fn run() -> WikiResult<()> {
    helpers::init_logging();
    let args = Args::parse();
    let date = Some(args.date).filter(|d| d != "latest");
    let downloader = Downloader {
        client: reqwest::blocking::Client::builder().user_agent(args.user_agent).timeout(None::<Duration>).build()?,
    };
    if args.wiki == "wikidatawiki" {
        downloader.download_wikidata(date)
    } else {
        downloader.download_wiki(&args.wiki, date)
    }
}

quick_main!(run);
