#[macro_use]
extern crate error_chain;
#[macro_use]
extern crate log;

use std::io;
use std::path::PathBuf;
use std::time::Duration;

use clap::Parser;

use causegraph::api::{EntityCache, WikidataApi, DEFAULT_USER_AGENT};
use causegraph::helpers;
use causegraph::sequence::{extend_sequence, load_configs, save_configs, PatchSet};
use causegraph::wikitime::Year;
use causegraph::WikiResult;

/// Pushes every year sequence one year outward at both ends where the
/// neighbouring item is unambiguous, then rewrites the config.
#[derive(Parser)]
struct Args {
    #[arg(long, default_value = "years_auto.json")]
    config: PathBuf,
    #[arg(long, env = "CAUSEGRAPH_USER_AGENT", default_value = DEFAULT_USER_AGENT)]
    user_agent: String,
}

fn run() -> WikiResult<()> {
    helpers::init_logging();
    let args = Args::parse();
    let mut configs = load_configs::<Year, _>(&args.config)?;
    let api = WikidataApi::new(&args.user_agent)?.with_throttle(Duration::from_millis(100));
    let mut cache = EntityCache::new(api);
    let mut patch = PatchSet::default();
    for (name, config) in configs.iter_mut() {
        let before = (config.start, config.end);
        patch.extend(extend_sequence(config, &mut cache)?);
        if before != (config.start, config.end) {
            info!("{} now runs from {} to {}", name, config.start, config.end);
        }
    }
    patch.write_csv(io::stdout())?;
    save_configs(&args.config, &configs)
}

quick_main!(run);
