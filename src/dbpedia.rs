//! DBpedia n-triples: the influence graph and birth years.

use std::collections::BTreeMap;
use std::io::prelude::*;

use nom::branch::alt;
use nom::bytes::complete::{escaped, is_not, tag, take_while1, take_while_m_n};
use nom::character::complete::{char, none_of, one_of, space0, space1};
use nom::combinator::{all_consuming, map, opt, recognize};
use nom::sequence::{delimited, preceded, terminated, tuple};
use nom::IResult;

use crate::graph::QidGraph;
use crate::{WikiError, WikiErrorKind, WikiResult};

pub const INFLUENCED_BY: &str = "http://dbpedia.org/ontology/influencedBy";
pub const BIRTH_YEAR: &str = "http://dbpedia.org/ontology/birthYear";
pub const RESOURCE_PREFIX: &str = "http://dbpedia.org/resource/";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Object {
    Iri(String),
    Literal { value: String, datatype: Option<String>, lang: Option<String> },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Triple {
    pub subject: String,
    pub predicate: String,
    pub object: Object,
}

fn iri(input: &str) -> IResult<&str, &str> {
    delimited(char('<'), is_not(">"), char('>'))(input)
}

fn hex(n: usize) -> impl Fn(&str) -> IResult<&str, &str> {
    move |input| take_while_m_n(n, n, |c: char| c.is_ascii_hexdigit())(input)
}

/// What may follow a backslash inside a literal.
fn escape(input: &str) -> IResult<&str, &str> {
    alt((
        recognize(preceded(char('u'), hex(4))),
        recognize(preceded(char('U'), hex(8))),
        recognize(one_of("\\\"'nrtbf")),
    ))(input)
}

fn literal(input: &str) -> IResult<&str, Object> {
    let quoted = delimited(char('"'), opt(escaped(none_of("\\\""), '\\', escape)), char('"'));
    let lang_tag = take_while1(|c: char| c.is_alphanumeric() || c == '-');
    let suffix = opt(alt((
        map(preceded(tag("^^"), iri), |dt: &str| (Some(dt.to_string()), None)),
        map(preceded(char('@'), lang_tag), |lang: &str| (None, Some(lang.to_string()))),
    )));
    map(tuple((quoted, suffix)), |(value, suffix)| {
        let (datatype, lang) = suffix.unwrap_or((None, None));
        Object::Literal { value: value.unwrap_or("").to_string(), datatype, lang }
    })(input)
}

fn object(input: &str) -> IResult<&str, Object> {
    alt((map(iri, |o: &str| Object::Iri(o.to_string())), literal))(input)
}

fn triple(input: &str) -> IResult<&str, Triple> {
    map(
        all_consuming(delimited(
            space0,
            tuple((terminated(iri, space1), terminated(iri, space1), object)),
            tuple((space0, char('.'), space0)),
        )),
        |(s, p, o)| Triple { subject: s.to_string(), predicate: p.to_string(), object: o },
    )(input)
}

/// One `<s> <p> <o> .` or `<s> <p> "literal"^^<type> .` line.
pub fn parse_ntriple(line: &str) -> WikiResult<Triple> {
    triple(line.trim_end())
        .map(|(_, t)| t)
        .map_err(|_| WikiError::from(WikiErrorKind::MalformedLine(line.to_string())))
}

fn triples<R: BufRead>(input: R) -> impl Iterator<Item = WikiResult<Triple>> {
    input.lines().filter_map(|line| match line {
        Ok(line) if line.trim().is_empty() || line.starts_with('#') => None,
        Ok(line) => Some(parse_ntriple(&line)),
        Err(e) => Some(Err(e.into())),
    })
}

/// Directed graph of IRI-to-IRI triples. `influencedBy` is turned around so
/// edges run from influencer to influenced.
pub fn influence_graph<R: BufRead>(input: R) -> WikiResult<QidGraph> {
    let mut graph = QidGraph::new();
    for t in triples(input) {
        let t = match t {
            Ok(t) => t,
            Err(e) => {
                warn!("{}", e);
                continue;
            }
        };
        let dst = match t.object {
            Object::Iri(ref o) => o,
            Object::Literal { .. } => continue,
        };
        let typ = t.predicate.rsplit('/').next().unwrap_or(&t.predicate);
        if t.predicate == INFLUENCED_BY {
            graph.add_edge(dst, &t.subject, typ);
        } else {
            graph.add_edge(&t.subject, dst, typ);
        }
    }
    Ok(graph)
}

/// Resource name → birth year. Lines and years that do not parse are logged
/// and skipped.
pub fn birth_years<R: BufRead>(input: R) -> WikiResult<BTreeMap<String, i64>> {
    let mut years = BTreeMap::new();
    for t in triples(input) {
        let t = match t {
            Ok(t) => t,
            Err(e) => {
                warn!("{}", e);
                continue;
            }
        };
        if t.predicate != BIRTH_YEAR {
            continue;
        }
        let name = t.subject.strip_prefix(RESOURCE_PREFIX).unwrap_or(&t.subject);
        match t.object {
            Object::Literal { ref value, .. } => match value.parse::<i64>() {
                Ok(year) => {
                    years.insert(name.to_string(), year);
                }
                Err(_) => warn!("bad birth year {:?} for {}", value, name),
            },
            Object::Iri(ref o) => warn!("birth year of {} is an iri: {}", name, o),
        }
    }
    Ok(years)
}
