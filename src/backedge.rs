//! Back edges: statements whose source is dated long after their
//! destination, and the triage of those explained by poor dates.

use std::collections::HashMap;
use std::fmt;
use std::io::prelude::*;
use std::str::FromStr;

use itertools::Itertools;

use wikitime::year_of;

use crate::api::{EntityCache, EntitySource};
use crate::causegraph::Statement;
use crate::dates::Years;
use crate::wikidata::{Entity, Rank};
use crate::{WikiError, WikiErrorKind, WikiResult, WD_URL};

pub const EXCLUDED_RELS: &[&str] = &["P31", "P279", "P61i"];
pub const DEFAULT_THRESHOLD: i64 = 1000;

/// Decade. Anything below is a century or coarser.
const MIN_PRECISION: u8 = 8;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BackEdge {
    pub src: String,
    pub src_year: i64,
    pub typ: String,
    pub dst: String,
    pub dst_year: i64,
}

impl BackEdge {
    pub fn tsv(&self) -> String {
        format!("{}\t{}\t{}\t{}\t{}", self.src, self.src_year, self.typ, self.dst, self.dst_year)
    }
}

impl fmt::Display for BackEdge {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}{} {} {} {}{} {}", WD_URL, self.src, self.src_year, self.typ, WD_URL, self.dst, self.dst_year)
    }
}

impl FromStr for BackEdge {
    type Err = WikiError;

    fn from_str(line: &str) -> WikiResult<BackEdge> {
        let malformed = || WikiError::from(WikiErrorKind::MalformedLine(line.to_string()));
        let fields: Vec<&str> = line.split_whitespace().collect();
        if fields.len() != 5 {
            return Err(malformed());
        }
        let qid = |s: &str| s.strip_prefix(WD_URL).unwrap_or(s).to_string();
        Ok(BackEdge {
            src: qid(fields[0]),
            src_year: fields[1].parse().map_err(|_| malformed())?,
            typ: fields[2].to_string(),
            dst: qid(fields[3]),
            dst_year: fields[4].parse().map_err(|_| malformed())?,
        })
    }
}

pub fn find_back_edges(statements: &[Statement], years: &Years, threshold: i64) -> Vec<BackEdge> {
    statements
        .iter()
        .filter(|s| !EXCLUDED_RELS.contains(&&*s.prop))
        .filter_map(|s| {
            let d_src = *years.get(&s.src)?;
            let d_dst = *years.get(&s.dst)?;
            if d_src > d_dst && d_src - d_dst > threshold {
                Some(BackEdge {
                    src: s.src.clone(),
                    src_year: d_src,
                    typ: s.prop.clone(),
                    dst: s.dst.clone(),
                    dst_year: d_dst,
                })
            } else {
                None
            }
        })
        .collect()
}

/// Occurrences of each key, most common first; ties keep first-seen order.
fn most_common<'a, I: IntoIterator<Item = &'a str>>(keys: I) -> Vec<(String, usize)> {
    let mut order: Vec<&str> = vec![];
    let mut counts: HashMap<&str, usize> = HashMap::new();
    for k in keys {
        let count = counts.entry(k).or_insert(0);
        if *count == 0 {
            order.push(k);
        }
        *count += 1;
    }
    order
        .into_iter()
        .map(|k| (k.to_string(), counts[k]))
        .sorted_by(|a, b| b.1.cmp(&a.1))
        .collect()
}

pub fn type_counts(edges: &[BackEdge]) -> Vec<(String, usize)> {
    most_common(edges.iter().map(|e| &*e.typ))
}

/// Items by number of back edges they take part in.
pub fn involvement(edges: &[BackEdge]) -> Vec<(String, usize)> {
    most_common(edges.iter().flat_map(|e| vec![&*e.src, &*e.dst]))
}

/// True when a time claim for `year` is deprecated or too imprecise to
/// trust the ordering.
pub fn is_date_bad(entity: &Entity, year: i64) -> bool {
    entity.claims.values().flatten().any(|claim| {
        let snak = &claim.mainsnak;
        if snak.datatype.as_deref() != Some("time") || !snak.is_value() {
            return false;
        }
        match snak.time() {
            Some(tv) if year_of(&tv.time) == Some(year) => {
                claim.rank == Rank::Deprecated || tv.precision < MIN_PRECISION
            }
            _ => false,
        }
    })
}

pub fn is_excluded<S: EntitySource>(cache: &EntityCache<S>, edge: &BackEdge) -> bool {
    let bad = |qid: &str, year: i64| cache.peek(qid).map(|e| is_date_bad(e, year)).unwrap_or(false);
    bad(&edge.src, edge.src_year) || bad(&edge.dst, edge.dst_year)
}

#[derive(Debug, Default)]
pub struct Analysis {
    pub kept: Vec<BackEdge>,
    pub excluded: Vec<BackEdge>,
}

/// Fetches every involved item, busiest first, then splits the edges.
pub fn analyze<S: EntitySource>(edges: Vec<BackEdge>, cache: &mut EntityCache<S>) -> WikiResult<Analysis> {
    let items: Vec<String> = involvement(&edges).into_iter().map(|(qid, _)| qid).collect();
    info!("{} items in {} back edges", items.len(), edges.len());
    cache.fetch(&items)?;
    let mut analysis = Analysis::default();
    for edge in edges {
        if is_excluded(cache, &edge) {
            analysis.excluded.push(edge);
        } else {
            analysis.kept.push(edge);
        }
    }
    Ok(analysis)
}

pub fn write_tsv<W: Write>(mut out: W, edges: &[BackEdge]) -> WikiResult<()> {
    for e in edges {
        writeln!(out, "{}", e.tsv())?;
    }
    Ok(())
}
