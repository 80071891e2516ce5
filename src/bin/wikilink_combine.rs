#[macro_use]
extern crate error_chain;
#[macro_use]
extern crate log;

use std::collections::{BTreeSet, HashSet};
use std::io::prelude::*;
use std::path::PathBuf;

use clap::Parser;

use causegraph::constants::LABEL_LANGS;
use causegraph::helpers;
use causegraph::wikipedia::{combine, missing_from_wikidata, open_link_file};
use causegraph::WikiResult;

/// Combines the per-language `<lang>wikilinks.txt` files and lists the
/// links Wikidata lacks.
#[derive(Parser)]
struct Args {
    /// `qa | qb` pairs from `wd_preproc --pairs`
    #[arg(long, default_value = "statements.txt")]
    statements: PathBuf,
    /// One qid per line, links touching them are left out of the filtered
    /// list
    #[arg(long, default_value = "filter.txt")]
    filter: PathBuf,
}

fn write_set(path: &str, set: &BTreeSet<String>) -> WikiResult<()> {
    let mut out = helpers::create_output(path)?;
    for line in set {
        writeln!(out, "{}", line)?;
    }
    out.flush()?;
    Ok(())
}

fn run() -> WikiResult<()> {
    helpers::init_logging();
    let args = Args::parse();
    let mut sets = vec![];
    for lang in LABEL_LANGS {
        if let Some(set) = open_link_file(&format!("{}wikilinks.txt", lang))? {
            info!("{}: {} links", lang, set.len());
            sets.push(set);
        }
    }
    let (intersection, union) = combine(&sets);
    info!("{} links in every wiki, {} in any", intersection.len(), union.len());
    write_set("intersection-combined.txt", &intersection)?;
    write_set("union-combined.txt", &union)?;

    let statements: BTreeSet<String> = helpers::read_lines(&args.statements)?.into_iter().collect();
    let filter: HashSet<String> = helpers::read_lines(&args.filter)?.into_iter().collect();
    let (missing, filtered) = missing_from_wikidata(&intersection, &statements, &filter);
    info!("{} links missing from wikidata, {} after filtering", missing.len(), filtered.len());
    write_set("wd_missing.txt", &missing)?;
    write_set("wd_missing_filtered.txt", &filtered)
}

quick_main!(run);
