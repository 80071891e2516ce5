#[macro_use]
extern crate error_chain;
#[macro_use]
extern crate log;

use std::io;
use std::path::{Path, PathBuf};
use std::time::Duration;

use clap::Parser;

use causegraph::api::{EntityCache, WikidataApi, DEFAULT_USER_AGENT};
use causegraph::helpers;
use causegraph::sequence::{load_configs, save_report, select_sequences, SequenceChecker};
use causegraph::wikitime::Year;
use causegraph::WikiResult;

/// Walks a year sequence from both ends and proposes the links missing in
/// the gap.
#[derive(Parser)]
struct Args {
    /// Sequence name, a key of the config file
    #[arg(required_unless_present = "all", conflicts_with = "all")]
    sequence: Option<String>,
    /// Check every sequence of the config file
    #[arg(long)]
    all: bool,
    #[arg(long, default_value = "years.json")]
    config: PathBuf,
    #[arg(long, env = "CAUSEGRAPH_USER_AGENT", default_value = DEFAULT_USER_AGENT)]
    user_agent: String,
}

fn run() -> WikiResult<()> {
    helpers::init_logging();
    let args = Args::parse();
    let configs = load_configs::<Year, _>(&args.config)?;
    let names = select_sequences(&configs, if args.all { None } else { args.sequence.as_deref() })?;
    let api = WikidataApi::new(&args.user_agent)?.with_throttle(Duration::from_millis(100));
    let mut cache = EntityCache::new(api);
    let mut failed = 0;
    for name in &names {
        info!("checking {}", name);
        let report = match SequenceChecker::new(&mut cache).with_search_pause(Duration::from_millis(200)).check(&configs[*name]) {
            Ok(report) => report,
            Err(e) if names.len() > 1 => {
                error!("{}: {}", name, e);
                failed += 1;
                continue;
            }
            Err(e) => return Err(e),
        };
        info!("{}: {} items resolved in the gap", name, report.ids.len());
        report.patch.write_csv(io::stdout())?;
        save_report(Path::new("."), name, &report, &cache)?;
    }
    if failed > 0 {
        bail!("{} of {} sequences failed", failed, names.len());
    }
    Ok(())
}

quick_main!(run);
