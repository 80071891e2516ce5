#[macro_use]
extern crate error_chain;
#[macro_use]
extern crate log;

use std::io::prelude::*;
use std::path::PathBuf;
use std::time::Duration;

use clap::Parser;

use causegraph::api::{EntityCache, WikidataApi, DEFAULT_USER_AGENT};
use causegraph::backedge::{analyze, write_tsv, BackEdge};
use causegraph::helpers;
use causegraph::WikiResult;

/// Fetches the items of back_edge_finder output and sets apart the back
/// edges explained by imprecise or deprecated dates.
#[derive(Parser)]
struct Args {
    /// back_edge_finder output
    back_edges: PathBuf,
    /// Previously saved entities, to skip fetching them again
    #[arg(long)]
    entities: Option<PathBuf>,
    #[arg(long, env = "CAUSEGRAPH_USER_AGENT", default_value = DEFAULT_USER_AGENT)]
    user_agent: String,
}

fn run() -> WikiResult<()> {
    helpers::init_logging();
    let args = Args::parse();
    let mut edges: Vec<BackEdge> = vec![];
    for line in helpers::read_lines(&args.back_edges)? {
        match line.parse() {
            Ok(edge) => edges.push(edge),
            Err(e) => debug!("{}", e),
        }
    }
    let api = WikidataApi::new(&args.user_agent)?;
    let mut cache = EntityCache::new(api).with_batch_pause(Duration::from_secs(1));
    if let Some(ref path) = args.entities {
        cache.preload(helpers::read_json(path)?);
    }
    let analysis = analyze(edges, &mut cache)?;
    cache.save("entities_full.json")?;
    info!("{} back edges kept, {} excluded", analysis.kept.len(), analysis.excluded.len());

    let mut filtered = helpers::create_output("back_edges_filtered.txt")?;
    write_tsv(&mut filtered, &analysis.kept)?;
    filtered.flush()?;
    let mut excluded = helpers::create_output("back_edges_excluded.txt")?;
    write_tsv(&mut excluded, &analysis.excluded)?;
    excluded.flush()?;
    Ok(())
}

quick_main!(run);
