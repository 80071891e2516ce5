#[macro_use]
extern crate error_chain;
#[macro_use]
extern crate log;

use std::collections::BTreeMap;
use std::fs;
use std::io::prelude::*;
use std::path::PathBuf;

use clap::Parser;

use causegraph::constants::LABEL_LANGS;
use causegraph::helpers;
use causegraph::wikidata::{for_each_entity, Entity};
use causegraph::wikipedia::{preprocess, write_pairs, WikidataPairs};
use causegraph::WikiResult;

/// Line oriented extracts of a Wikidata dump for comparison with Wikipedia
/// links.
#[derive(Parser)]
struct Args {
    #[arg(default_value = "latest-all.json")]
    dump: String,
    #[arg(long, default_value = ".")]
    out_dir: PathBuf,
    /// Write unordered item pairs (`statements.txt`) and per-language
    /// title maps (`wd_sitelinks.json`) instead of the line files
    #[arg(long)]
    pairs: bool,
}

fn write_lines<W: Write>(entity: &Entity, statements: &mut W, labels: &mut BTreeMap<String, W>) -> WikiResult<()> {
    let pre = preprocess(entity, LABEL_LANGS);
    for line in &pre.statements {
        writeln!(statements, "{}", line)?;
    }
    for (lang, line) in &pre.labels {
        if let Some(out) = labels.get_mut(lang) {
            writeln!(out, "{}", line)?;
        }
    }
    Ok(())
}

fn run() -> WikiResult<()> {
    helpers::init_logging();
    let args = Args::parse();
    fs::create_dir_all(&args.out_dir)?;
    let input = helpers::open_input(&args.dump)?;
    if args.pairs {
        let mut pairs = WikidataPairs::default();
        let count = for_each_entity(input, |entity| pairs.process(&entity, LABEL_LANGS))?;
        info!("{} entities, {} item pairs", count, pairs.pairs.len());
        let mut output = helpers::create_output(args.out_dir.join("statements.txt"))?;
        write_pairs(&mut output, &pairs.pairs)?;
        output.flush()?;
        return helpers::write_json(args.out_dir.join("wd_sitelinks.json"), &pairs.labels);
    }

    let mut statements = helpers::create_output(args.out_dir.join("wd_statements.txt"))?;
    let mut labels = BTreeMap::new();
    for lang in LABEL_LANGS {
        let path = args.out_dir.join(format!("wd_labels_{}.txt", lang));
        labels.insert(lang.to_string(), helpers::create_output(path)?);
    }
    let mut failure = None;
    let count = for_each_entity(input, |entity| {
        if failure.is_none() {
            failure = write_lines(&entity, &mut statements, &mut labels).err();
        }
    })?;
    if let Some(e) = failure {
        return Err(e);
    }
    statements.flush()?;
    for out in labels.values_mut() {
        out.flush()?;
    }
    info!("{} entities preprocessed", count);
    Ok(())
}

quick_main!(run);
