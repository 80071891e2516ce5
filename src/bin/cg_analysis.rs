#[macro_use]
extern crate error_chain;
#[macro_use]
extern crate log;

use std::path::PathBuf;

use clap::Parser;

use causegraph::analysis::undated_leaders;
use causegraph::dates::Years;
use causegraph::graph::QidGraph;
use causegraph::{helpers, WikiResult, WD_URL};

/// Ranks the cause graph with PageRank and lists the central nodes that
/// still lack a date.
#[derive(Parser)]
struct Args {
    #[arg(long, default_value = "statements_final.txt")]
    statements: PathBuf,
    #[arg(long, default_value = "wd_years.json")]
    years: PathBuf,
    #[arg(long, default_value_t = 0.85)]
    alpha: f64,
}

fn run() -> WikiResult<()> {
    helpers::init_logging();
    let args = Args::parse();
    let years: Years = helpers::read_json(&args.years)?;
    let graph = QidGraph::from_statements(helpers::read_lines(&args.statements)?, Some(&years));
    info!("{} nodes, {} edges", graph.node_count(), graph.edge_count());
    let scores = graph.page_rank(args.alpha, 100, 1e-6);
    for (qid, score) in undated_leaders(&scores, &years) {
        println!("{}{} {}", WD_URL, qid, score);
    }
    Ok(())
}

quick_main!(run);
