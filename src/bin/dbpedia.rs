#[macro_use]
extern crate error_chain;
#[macro_use]
extern crate log;

use std::fs;
use std::path::PathBuf;

use clap::{Parser, Subcommand};

use causegraph::dbpedia::{birth_years, influence_graph};
use causegraph::helpers;
use causegraph::WikiResult;

#[derive(Subcommand)]
enum Command {
    /// Influence graph of an influencedBy/influenced n-triples file, as dot
    Influences {
        #[arg(default_value = "dbpedia_influences.nt")]
        input: String,
        #[arg(long, short, default_value = "influences.dot")]
        output: PathBuf,
    },
    /// Birth year of every resource of a birthYear n-triples file, as json
    BirthYears {
        #[arg(default_value = "dbpedia_birth_years.nt")]
        input: String,
        #[arg(long, short, default_value = "birth_years.json")]
        output: PathBuf,
    },
}

/// DBpedia n-triples extracts.
#[derive(Parser)]
struct Args {
    #[command(subcommand)]
    command: Command,
}

fn run() -> WikiResult<()> {
    helpers::init_logging();
    match Args::parse().command {
        Command::Influences { input, output } => {
            let graph = influence_graph(helpers::open_input(&input)?)?;
            info!("{} nodes, {} edges", graph.node_count(), graph.edge_count());
            fs::write(&output, graph.to_dot())?;
        }
        Command::BirthYears { input, output } => {
            let years = birth_years(helpers::open_input(&input)?)?;
            info!("{} birth years", years.len());
            helpers::write_json(&output, &years)?;
        }
    }
    Ok(())
}

quick_main!(run);
