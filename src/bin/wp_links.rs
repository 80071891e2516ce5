#[macro_use]
extern crate error_chain;
#[macro_use]
extern crate log;

use clap::Parser;

use causegraph::helpers;
use causegraph::wikipedia::{write_article_links, PagesFromXml};
use causegraph::WikiResult;

/// Writes `title | target` for every wiki link of every article of a
/// Wikipedia pages-articles export.
#[derive(Parser)]
struct Args {
    /// Language code, used for the default input and output names
    #[arg(default_value = "en")]
    lang: String,
    /// Pages export, `-` for stdin; defaults to the latest download
    #[arg(long)]
    dump: Option<String>,
    #[arg(long, short)]
    output: Option<String>,
}

fn run() -> WikiResult<()> {
    helpers::init_logging();
    let args = Args::parse();
    let output = args.output.clone().unwrap_or_else(|| format!("{}wikilinks.txt", args.lang));
    let pages = PagesFromXml::new(helpers::wiki_pages_input(&args.lang, args.dump.as_deref())?);
    let count = write_article_links(pages, helpers::create_output(&output)?)?;
    info!("{} articles written to {}", count, output);
    Ok(())
}

quick_main!(run);
