#[macro_use]
extern crate error_chain;
#[macro_use]
extern crate log;

pub mod helpers;
pub mod mapred;
pub mod constants;
pub mod wikidata;
pub mod dates;
pub mod api;
pub mod causegraph;
pub mod graph;
pub mod fiction;
pub mod backedge;
pub mod sequence;
pub mod recent;
pub mod wikipedia;
pub mod dbpedia;
pub mod opentree;
pub mod analysis;

pub use wikitime;

error_chain! {
    types { WikiError, WikiErrorKind, WikiResultExt, WikiResult; }
    foreign_links {
        Io(::std::io::Error);
        GlobPattern(::glob::PatternError);
        Glob(::glob::GlobError);
        Serde(::serde_json::Error);
        Http(::reqwest::Error);
        Xml(::xml::reader::Error);
        ParseInt(::std::num::ParseIntError);
        Regex(::regex::Error);
        ThreadPool(::rayon::ThreadPoolBuildError);
    }
    errors {
        ApiFailure(action: String) {
            description("wikidata api call failed")
            display("wikidata api call failed: {}", action)
        }
        MalformedLine(line: String) {
            description("malformed input line")
            display("malformed input line: {:?}", line)
        }
        MissingEntity(id: String) {
            description("entity not available")
            display("entity not available: {}", id)
        }
    }
}

pub type BoxedIter<'a, Item> = Box<dyn Iterator<Item = Item> + Send + 'a>;

/// Prefix of human-facing item URLs, as written in back edge reports.
pub const WD_URL: &str = "https://wikidata.org/wiki/";
