#[macro_use]
extern crate error_chain;
#[macro_use]
extern crate log;

use std::fs;
use std::io::prelude::*;
use std::path::PathBuf;

use clap::{Parser, ValueEnum};

use causegraph::causegraph::{self as cg, CauseGraphBuilder};
use causegraph::dates::dates_to_years;
use causegraph::graph::QidGraph;
use causegraph::helpers;
use causegraph::wikidata::for_each_entity;
use causegraph::WikiResult;

#[derive(Clone, Copy, Debug, ValueEnum)]
enum ImportFormat {
    Arangodb,
    Neo4j,
}

/// Builds the cause graph from a Wikidata JSON dump.
#[derive(Parser)]
struct Args {
    /// Dump file (`.bz2` and `.gz` are decompressed), `-` for stdin
    #[arg(default_value = "latest-all.json")]
    dump: String,
    /// Fiction filter from build_fiction_filter
    #[arg(long, default_value = "filter.json")]
    filter: PathBuf,
    #[arg(long, default_value = ".")]
    out_dir: PathBuf,
    /// Layout of nodes.tsv and relationships.tsv
    #[arg(long, value_enum, default_value = "arangodb")]
    format: ImportFormat,
}

fn run() -> WikiResult<()> {
    helpers::init_logging();
    let args = Args::parse();
    let mut builder = CauseGraphBuilder::new(cg::load_item_filter(&args.filter)?);
    for_each_entity(helpers::open_input(&args.dump)?, |entity| builder.process(&entity))?;

    let years = dates_to_years(&builder.date_claims);
    let node_years = builder.node_years(&years);
    let unique = cg::dedupe_and_direct(&builder.statements);
    info!("{} statements, {} once directed and deduped", builder.statements.len(), unique.len());
    let statements = cg::specific_only(&unique, &years);
    info!("{} specific statements", statements.len());

    fs::create_dir_all(&args.out_dir)?;
    let out = |name: &str| args.out_dir.join(name);
    let mut output = helpers::create_output(out("statements_final.txt"))?;
    cg::write_statements(&mut output, &statements)?;
    output.flush()?;
    helpers::write_json(out("wd_labels.json"), &builder.labels)?;
    helpers::write_json(out("date_claims.json"), &builder.date_claims)?;
    helpers::write_json(out("wd_years.json"), &node_years)?;

    let mut nodes = helpers::create_output(out("nodes.tsv"))?;
    let mut rels = helpers::create_output(out("relationships.tsv"))?;
    match args.format {
        ImportFormat::Arangodb => {
            cg::write_arangodb_nodes(&mut nodes, &builder.nodes, &builder.labels, &node_years)?;
            cg::write_arangodb_rels(&mut rels, &statements)?;
        }
        ImportFormat::Neo4j => {
            cg::write_neo4j_nodes(&mut nodes, &builder.nodes, &builder.labels)?;
            cg::write_neo4j_rels(&mut rels, &statements)?;
        }
    }
    nodes.flush()?;
    rels.flush()?;

    let graph = QidGraph::from_statement_set(&statements, &years);
    info!("graph report:\n{}", graph.report());
    fs::write(out("nxcg.dot"), graph.to_dot())?;
    Ok(())
}

quick_main!(run);
