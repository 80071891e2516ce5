#[macro_use]
extern crate error_chain;
#[macro_use]
extern crate log;

use std::path::PathBuf;

use clap::Parser;

use causegraph::constants::FICTION_ROOTS;
use causegraph::fiction::FictionFilterBuilder;
use causegraph::helpers;
use causegraph::wikidata::for_each_entity;
use causegraph::WikiResult;

/// Collects the fictional and mythical classes of a Wikidata dump.
#[derive(Parser)]
struct Args {
    #[arg(default_value = "latest-all.json")]
    dump: String,
    #[arg(long, short, default_value = "filter.json")]
    output: PathBuf,
}

fn run() -> WikiResult<()> {
    helpers::init_logging();
    let args = Args::parse();
    let mut builder = FictionFilterBuilder::new();
    for_each_entity(helpers::open_input(&args.dump)?, |entity| builder.process(&entity))?;
    info!("dump processed, {} subclass statements", builder.pair_count());
    let filter = builder.filter(FICTION_ROOTS);
    info!("{} items in the new filter", filter.len());
    helpers::write_json(&args.output, &filter)
}

quick_main!(run);
