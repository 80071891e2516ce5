#[macro_use]
extern crate error_chain;
#[macro_use]
extern crate log;

use std::collections::BTreeMap;
use std::io::prelude::*;
use std::path::{Path, PathBuf};

use clap::Parser;

use causegraph::helpers;
use causegraph::wikipedia::{write_pairs, CategoryGraph, PagesFromXml};
use causegraph::WikiResult;

/// Category membership graph of one Wikipedia, as Wikidata item pairs.
#[derive(Parser)]
struct Args {
    #[arg(default_value = "en")]
    lang: String,
    /// Pages export, `-` for stdin; defaults to the latest download
    #[arg(long)]
    dump: Option<String>,
    /// Title prefix of category pages, e.g. `Category:`
    #[arg(long, default_value = "Category:")]
    cat_prefix: String,
    /// `title | qid` lines from wd_preproc
    #[arg(long)]
    labels: Option<PathBuf>,
}

fn read_qids(path: &Path) -> WikiResult<BTreeMap<String, String>> {
    let mut qids = BTreeMap::new();
    for line in helpers::read_lines(path)? {
        match line.rsplit_once(" | ") {
            Some((title, qid)) => {
                qids.insert(title.to_string(), qid.to_string());
            }
            None => warn!("skipping label line {:?}", line),
        }
    }
    Ok(qids)
}

fn run() -> WikiResult<()> {
    helpers::init_logging();
    let args = Args::parse();
    let labels = args.labels.clone().unwrap_or_else(|| PathBuf::from(format!("wd_labels_{}.txt", args.lang)));
    let qids = read_qids(&labels)?;
    info!("{} titles with a qid", qids.len());

    let mut graph = CategoryGraph::new(&args.cat_prefix)?;
    for page in PagesFromXml::new(helpers::wiki_pages_input(&args.lang, args.dump.as_deref())?) {
        graph.process(&page?);
    }
    let pairs = graph.qid_pairs(&qids);
    let output = format!("{}wikilinks.txt", args.lang);
    let mut out = helpers::create_output(&output)?;
    write_pairs(&mut out, &pairs)?;
    out.flush()?;
    info!("{} category links written to {}", pairs.len(), output);
    Ok(())
}

quick_main!(run);
