#[macro_use]
extern crate error_chain;
#[macro_use]
extern crate log;

use std::fs;
use std::io;
use std::path::PathBuf;
use std::thread;

use clap::Parser;

use causegraph::api::{WikidataApi, DEFAULT_USER_AGENT};
use causegraph::dates::Years;
use causegraph::graph::QidGraph;
use causegraph::helpers;
use causegraph::recent::{watch, LiveGraph, RecentChangeStream};
use causegraph::{WikiResult, WikiResultExt};

/// Keeps the cause graph in sync with live Wikidata edits, logging added
/// edges to an append-only change file.
#[derive(Parser)]
struct Args {
    #[arg(long, default_value = "statements_final.txt")]
    statements: PathBuf,
    #[arg(long, default_value = "wd_years.json")]
    years: PathBuf,
    #[arg(long, default_value = "graph_changes.txt")]
    changes: PathBuf,
    #[arg(long, env = "CAUSEGRAPH_USER_AGENT", default_value = DEFAULT_USER_AGENT)]
    user_agent: String,
}

fn initial_graph(args: &Args) -> WikiResult<QidGraph> {
    if !args.statements.exists() {
        warn!("{:?} not found, starting with an empty graph", args.statements);
        return Ok(QidGraph::new());
    }
    let years: Years = if args.years.exists() { helpers::read_json(&args.years)? } else { Years::new() };
    Ok(QidGraph::from_statements(helpers::read_lines(&args.statements)?, Some(&years)))
}

fn run() -> WikiResult<()> {
    helpers::init_logging();
    let args = Args::parse();
    let mut live = {
        let graph = initial_graph(&args)?;
        let log = fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&args.changes)
            .chain_err(|| format!("can not open {:?}", args.changes))?;
        LiveGraph::new(graph, io::BufWriter::new(log))
    };
    info!("{}", live.status());
    live.replay(io::BufReader::new(fs::File::open(&args.changes)?))?;
    info!("{}", live.status());
    live.mark_start()?;

    let (sender, receiver) = crossbeam_channel::unbounded();
    let user_agent = args.user_agent.clone();
    let producer = thread::spawn(move || -> WikiResult<()> {
        let api = WikidataApi::new(&user_agent)?;
        let stream = RecentChangeStream::connect(&user_agent)?;
        watch(stream, &api, &sender)
    });
    for change in receiver.iter() {
        live.handle(&change)?;
    }
    let mut log = live.into_log();
    io::Write::flush(&mut log)?;
    producer.join().unwrap_or_else(|e| std::panic::resume_unwind(e))
}

quick_main!(run);
