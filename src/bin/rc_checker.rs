#[macro_use]
extern crate error_chain;
#[macro_use]
extern crate log;

use clap::Parser;

use causegraph::api::{EntitySource, WikidataApi, DEFAULT_USER_AGENT};
use causegraph::constants::{is_time_prop, is_watched_rel};
use causegraph::helpers;
use causegraph::recent::{out_of_order, parse_change, RecentChangeStream};
use causegraph::WikiResult;

/// Prints live Wikidata edits to the relations and dates the cause graph
/// depends on.
#[derive(Parser)]
struct Args {
    /// Fetch items after date edits and report dates left out of order
    #[arg(long)]
    check_order: bool,
    #[arg(long, env = "CAUSEGRAPH_USER_AGENT", default_value = DEFAULT_USER_AGENT)]
    user_agent: String,
}

fn run() -> WikiResult<()> {
    helpers::init_logging();
    let args = Args::parse();
    let api = WikidataApi::new(&args.user_agent)?;
    for change in RecentChangeStream::connect(&args.user_agent)? {
        let change = change?;
        let parsed = match parse_change(&change) {
            Some(parsed) => parsed,
            None => continue,
        };
        if is_watched_rel(&parsed.prop) {
            println!("{} {} {} {} {}", change.meta.dt, parsed.op.readable(), change.meta.uri, parsed.prop, parsed.value);
        }
        if is_time_prop(&parsed.prop) {
            println!(
                "{} {} {} {}",
                change.meta.dt,
                parsed.op.readable(),
                change.meta.uri,
                change.comment.as_deref().unwrap_or("")
            );
            if args.check_order {
                match api.get_entities(&[parsed.qid.clone()]) {
                    Ok(entities) => {
                        for violation in entities.get(&parsed.qid).map(out_of_order).unwrap_or_default() {
                            println!("  out of order: {}", violation);
                        }
                    }
                    Err(e) => warn!("can not check {}: {}", parsed.qid, e),
                }
            }
        }
    }
    Ok(())
}

quick_main!(run);
