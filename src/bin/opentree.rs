#[macro_use]
extern crate error_chain;
#[macro_use]
extern crate log;

use std::fs;
use std::path::PathBuf;

use clap::{Parser, Subcommand};

use causegraph::helpers;
use causegraph::opentree::{check_labels, make_labels, parse_newick};
use causegraph::WikiResult;

#[derive(Subcommand)]
enum Command {
    /// Parent to child edges of the tree, as dot
    Dot {
        #[arg(long, short, default_value = "opentree.dot")]
        output: PathBuf,
    },
    /// Readable labels of the named taxa, as json
    Labels {
        #[arg(long, short, default_value = "full_labels.json")]
        output: PathBuf,
    },
}

/// Open Tree of Life synthesis tree tools.
#[derive(Parser)]
struct Args {
    /// Newick tree file
    #[arg(long, default_value = "labelled_supertree.tre")]
    tree: PathBuf,
    #[command(subcommand)]
    command: Command,
}

fn run() -> WikiResult<()> {
    helpers::init_logging();
    let args = Args::parse();
    let text = fs::read_to_string(&args.tree)?;
    let tree = parse_newick(&text)?;
    info!("{} nodes in {:?}", tree.len(), args.tree);
    match args.command {
        Command::Dot { output } => fs::write(&output, tree.to_dot())?,
        Command::Labels { output } => {
            let labels = make_labels(&tree);
            let issues = check_labels(&labels).len();
            info!("{} labels, {} with an unexpected key", labels.len(), issues);
            helpers::write_json(&output, &labels)?;
        }
    }
    Ok(())
}

quick_main!(run);
