#[macro_use]
extern crate error_chain;

use std::collections::BTreeMap;
use std::path::PathBuf;

use clap::Parser;

use causegraph::analysis::fix_labels;
use causegraph::{helpers, WikiResult};

/// Turns a list of graph node labels into `"<label> - qid"`.
#[derive(Parser)]
struct Args {
    #[arg(long, default_value = "labels.json")]
    labels: PathBuf,
    #[arg(long, default_value = "wd_labels.json")]
    wd_labels: PathBuf,
    #[arg(long, short, default_value = "newlabels.json")]
    output: PathBuf,
}

fn run() -> WikiResult<()> {
    helpers::init_logging();
    let args = Args::parse();
    let labels: Vec<String> = helpers::read_json(&args.labels)?;
    let wd_labels: BTreeMap<String, String> = helpers::read_json(&args.wd_labels)?;
    helpers::write_json(&args.output, &fix_labels(&labels, &wd_labels))
}

quick_main!(run);
