#[macro_use]
extern crate error_chain;
#[macro_use]
extern crate log;

use clap::Parser;
use itertools::Itertools;

use causegraph::helpers;
use causegraph::mapred::MapReduceOp;
use causegraph::wikidata::{DumpReader, Entity};
use causegraph::{BoxedIter, WikiResult};

/// Counts property usage over the parts of a Wikidata dump, one worker per
/// part.
#[derive(Parser)]
struct Args {
    /// Dump parts; defaults to the latest download
    parts: Vec<String>,
    /// Only print the most used properties
    #[arg(long, default_value_t = 50)]
    top: usize,
}

fn default_parts() -> WikiResult<Vec<String>> {
    let date = helpers::latest("download", "wikidata")?.ok_or("no wikidata download found")?;
    let pattern = helpers::data_dir_for("download", "wikidata", &date) + "/*.json*";
    let mut parts = vec![];
    for entry in glob::glob(&pattern)? {
        parts.push(entry?.to_string_lossy().into_owned());
    }
    Ok(parts)
}

fn run() -> WikiResult<()> {
    helpers::init_logging();
    let args = Args::parse();
    let parts = if args.parts.is_empty() { default_parts()? } else { args.parts };
    let mut chunks: Vec<BoxedIter<Entity>> = vec![];
    for part in &parts {
        info!("reading {}", part);
        let part = part.clone();
        let entities = DumpReader::new(helpers::open_input(&part)?).filter_map(move |e| match e {
            Ok(e) => Some(e),
            Err(e) => {
                warn!("{}: {}", part, e);
                None
            }
        });
        chunks.push(Box::new(entities));
    }
    let counts = MapReduceOp::map_reduce(
        |entity: Entity| entity.claims.into_iter().map(|(prop, claims)| (prop, claims.len())).collect::<Vec<_>>(),
        |a: &usize, b: &usize| a + b,
        chunks,
    )?;
    for (prop, count) in counts.into_iter().sorted_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0))).take(args.top) {
        println!("{}\t{}", prop, count);
    }
    Ok(())
}

quick_main!(run);
