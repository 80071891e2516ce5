#[macro_use]
extern crate error_chain;
#[macro_use]
extern crate log;

use std::path::PathBuf;

use clap::Parser;

use causegraph::dates::{flag_monthdays, DateClaims};
use causegraph::{helpers, WikiResult};

/// Lists dates that look like a day and month stored as a month and year.
#[derive(Parser)]
struct Args {
    #[arg(default_value = "date_claims.json")]
    date_claims: PathBuf,
}

fn run() -> WikiResult<()> {
    helpers::init_logging();
    let args = Args::parse();
    let claims: DateClaims = helpers::read_json(&args.date_claims)?;
    let flagged = flag_monthdays(&claims);
    for (qid, time) in &flagged {
        println!("{} {}", qid, time);
    }
    info!("{} dates flagged over {} items", flagged.len(), claims.len());
    Ok(())
}

quick_main!(run);
