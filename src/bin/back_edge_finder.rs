#[macro_use]
extern crate error_chain;

use std::path::PathBuf;

use clap::Parser;

use causegraph::backedge::{find_back_edges, type_counts, DEFAULT_THRESHOLD};
use causegraph::causegraph::read_statements;
use causegraph::dates::Years;
use causegraph::helpers;
use causegraph::WikiResult;

/// Prints statements whose source is dated more than `threshold` years after
/// their destination.
#[derive(Parser)]
struct Args {
    #[arg(default_value_t = DEFAULT_THRESHOLD)]
    threshold: i64,
    #[arg(long, default_value = "wd_years.json")]
    years: PathBuf,
    #[arg(long, default_value = "statements_final.txt")]
    statements: PathBuf,
}

fn run() -> WikiResult<()> {
    helpers::init_logging();
    let args = Args::parse();
    let years: Years = helpers::read_json(&args.years)?;
    let statements = read_statements(&args.statements)?;
    let edges = find_back_edges(&statements, &years, args.threshold);
    for edge in &edges {
        println!("{}", edge);
    }
    for (typ, count) in type_counts(&edges) {
        println!("{}\t{}", typ, count);
    }
    Ok(())
}

quick_main!(run);
