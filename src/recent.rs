//! Wikidata recent changes: parsing edit summaries from the public event
//! stream, and keeping a cause graph current with them.

use std::fmt;
use std::io;
use std::io::prelude::*;
use std::str::FromStr;
use std::time::Duration;

use crossbeam_channel::Sender;
use serde::Deserialize;
use time::format_description::well_known::Rfc3339;
use time::OffsetDateTime;

use wikitime::WikiTime;

use crate::api::EntitySource;
use crate::constants::{self, is_cg_rel, is_time_prop, is_watched_rel, ENDS, OTHERS, STARTS};
use crate::graph::QidGraph;
use crate::wikidata::Entity;
use crate::{WikiError, WikiErrorKind, WikiResult};

pub const STREAM_URL: &str = "https://stream.wikimedia.org/v2/stream/recentchange";
pub const WIKI: &str = "wikidatawiki";

/// Added edges between two status reports.
pub const STATUS_EVERY: usize = 10;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChangeOp {
    CreateClaim,
    SetClaimCreate,
    SetClaimUpdate,
    SetClaimValue,
    RemoveClaims,
}

impl ChangeOp {
    pub const ALL: [ChangeOp; 5] = [
        ChangeOp::CreateClaim,
        ChangeOp::SetClaimCreate,
        ChangeOp::SetClaimUpdate,
        ChangeOp::SetClaimValue,
        ChangeOp::RemoveClaims,
    ];

    pub fn api_name(&self) -> &'static str {
        match *self {
            ChangeOp::CreateClaim => "wbcreateclaim",
            ChangeOp::SetClaimCreate => "wbsetclaim-create",
            ChangeOp::SetClaimUpdate => "wbsetclaim-update",
            ChangeOp::SetClaimValue => "wbsetclaimvalue",
            ChangeOp::RemoveClaims => "wbremoveclaims",
        }
    }

    pub fn readable(&self) -> &'static str {
        match *self {
            ChangeOp::CreateClaim => "claim created:",
            ChangeOp::SetClaimCreate => "claim set:",
            ChangeOp::SetClaimUpdate => "claim updated:",
            ChangeOp::SetClaimValue => "claim value set:",
            ChangeOp::RemoveClaims => "claims removed:",
        }
    }

    /// First op whose api name appears in an edit summary op such as
    /// `wbsetclaim-create:2||1`.
    pub fn classify(op: &str) -> Option<ChangeOp> {
        ChangeOp::ALL.iter().find(|o| op.contains(o.api_name())).cloned()
    }

    pub fn creates(&self) -> bool {
        matches!(*self, ChangeOp::CreateClaim | ChangeOp::SetClaimCreate)
    }
}

impl fmt::Display for ChangeOp {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.api_name())
    }
}

impl FromStr for ChangeOp {
    type Err = WikiError;

    fn from_str(s: &str) -> WikiResult<ChangeOp> {
        match ChangeOp::ALL.iter().find(|o| o.api_name() == s) {
            Some(op) => Ok(*op),
            None => bail!("unknown change op {:?}", s),
        }
    }
}

/// `/* wbsetclaim-create:2||1 */ [[Property:P737]]: [[Q42]]` to
/// `("wbsetclaim-create:2||1", "P737", "Q42")`.
pub fn parse_comment(comment: &str) -> Option<(&str, &str, &str)> {
    let spl: Vec<&str> = comment.split_whitespace().collect();
    if spl.len() < 5 {
        return None;
    }
    let prop = spl[3].trim_matches(&['[', ']', ':'][..]);
    let prop = prop.strip_prefix("Property:").unwrap_or(prop);
    let value = spl[4].trim_matches(&['[', ']', ','][..]);
    Some((spl[1], prop, value))
}

#[derive(Debug, Clone, Deserialize)]
pub struct ChangeMeta {
    pub uri: String,
    #[serde(default)]
    pub dt: String,
}

/// The fields of a recentchange event we use.
#[derive(Debug, Clone, Deserialize)]
pub struct RecentChange {
    #[serde(default)]
    pub wiki: String,
    #[serde(rename = "type", default)]
    pub kind: String,
    #[serde(default)]
    pub comment: Option<String>,
    pub meta: ChangeMeta,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GraphChange {
    pub op: ChangeOp,
    pub qid: String,
    pub prop: String,
    pub value: String,
}

impl fmt::Display for GraphChange {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{} {} {} {}", self.op, self.qid, self.prop, self.value)
    }
}

impl FromStr for GraphChange {
    type Err = WikiError;

    fn from_str(line: &str) -> WikiResult<GraphChange> {
        let fields: Vec<&str> = line.split_whitespace().collect();
        if fields.len() != 4 {
            bail!(WikiErrorKind::MalformedLine(line.to_string()));
        }
        Ok(GraphChange {
            op: fields[0].parse()?,
            qid: fields[1].to_string(),
            prop: fields[2].to_string(),
            value: fields[3].to_string(),
        })
    }
}

/// Any claim edit on Wikidata whose summary parses. Log entries,
/// categorizations and page creations are ignored.
pub fn parse_change(change: &RecentChange) -> Option<GraphChange> {
    if change.wiki != WIKI || change.kind != "edit" {
        return None;
    }
    let (op, prop, value) = parse_comment(change.comment.as_deref()?)?;
    let op = ChangeOp::classify(op)?;
    let qid = change.meta.uri.rsplit('/').next()?;
    Some(GraphChange { op, qid: qid.to_string(), prop: prop.to_string(), value: value.to_string() })
}

/// Claim edits on relations the live graph follows.
pub fn watched(change: &RecentChange) -> Option<GraphChange> {
    parse_change(change).filter(|c| is_watched_rel(&c.prop))
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderViolation {
    pub earlier_prop: String,
    pub earlier: WikiTime,
    pub later_prop: String,
    pub later: WikiTime,
}

impl fmt::Display for OrderViolation {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{} {} is after {} {}", self.earlier_prop, self.earlier, self.later_prop, self.later)
    }
}

fn times_of(entity: &Entity, table: constants::Table) -> Vec<(&str, WikiTime)> {
    table
        .iter()
        .flat_map(|&(prop, _)| entity.time_values(prop).filter_map(move |tv| tv.parsed().map(|t| (prop, t))))
        .collect()
}

/// Start times must not follow end times or other times, and other times
/// must not follow end times.
pub fn out_of_order(entity: &Entity) -> Vec<OrderViolation> {
    let starts = times_of(entity, STARTS);
    let ends = times_of(entity, ENDS);
    let others = times_of(entity, OTHERS);
    let mut violations = vec![];
    let mut check = |before: &[(&str, WikiTime)], after: &[(&str, WikiTime)]| {
        for &(bp, bt) in before {
            for &(ap, at) in after {
                if bt > at {
                    violations.push(OrderViolation {
                        earlier_prop: bp.to_string(),
                        earlier: bt,
                        later_prop: ap.to_string(),
                        later: at,
                    });
                }
            }
        }
    };
    check(&starts, &ends);
    check(&starts, &others);
    check(&others, &ends);
    violations
}

/// Server-sent events from the recentchange stream. Only `data:` lines are
/// read; unparseable payloads are skipped.
pub struct RecentChangeStream<R: BufRead> {
    lines: io::Lines<R>,
}

impl RecentChangeStream<io::BufReader<reqwest::blocking::Response>> {
    pub fn connect(user_agent: &str) -> WikiResult<RecentChangeStream<io::BufReader<reqwest::blocking::Response>>> {
        let client = reqwest::blocking::Client::builder()
            .user_agent(user_agent)
            .timeout(None::<Duration>)
            .build()?;
        let response = client
            .get(STREAM_URL)
            .header(reqwest::header::ACCEPT, "text/event-stream")
            .send()?
            .error_for_status()?;
        info!("connected to {}", STREAM_URL);
        Ok(RecentChangeStream::new(io::BufReader::new(response)))
    }
}

impl<R: BufRead> RecentChangeStream<R> {
    pub fn new(input: R) -> RecentChangeStream<R> {
        RecentChangeStream { lines: input.lines() }
    }
}

impl<R: BufRead> Iterator for RecentChangeStream<R> {
    type Item = WikiResult<RecentChange>;

    fn next(&mut self) -> Option<WikiResult<RecentChange>> {
        loop {
            let line = match self.lines.next()? {
                Ok(line) => line,
                Err(e) => return Some(Err(e.into())),
            };
            let data = match line.strip_prefix("data:") {
                Some(data) => data.trim(),
                None => continue,
            };
            match serde_json::from_str(data) {
                Ok(change) => return Some(Ok(change)),
                Err(e) => debug!("skipping event: {}", e),
            }
        }
    }
}

/// Producer side of the live graph: sends watched changes, and reports
/// time edits that leave an item's dates out of order. Returns when the
/// stream ends or the receiver hangs up.
pub fn watch<I, S>(changes: I, source: &S, sender: &Sender<GraphChange>) -> WikiResult<()>
where
    I: IntoIterator<Item = WikiResult<RecentChange>>,
    S: EntitySource,
{
    for change in changes {
        let change = change?;
        let parsed = match parse_change(&change) {
            Some(parsed) => parsed,
            None => continue,
        };
        if is_watched_rel(&parsed.prop) {
            info!("{} {} {} {} {}", change.meta.dt, parsed.op.readable(), change.meta.uri, parsed.prop, parsed.value);
            if sender.send(parsed.clone()).is_err() {
                return Ok(());
            }
        }
        if is_time_prop(&parsed.prop) {
            match source.get_entities(&[parsed.qid.clone()]) {
                Ok(entities) => {
                    if let Some(entity) = entities.get(&parsed.qid) {
                        for violation in out_of_order(entity) {
                            warn!("out of order in {}: {}", parsed.qid, violation);
                        }
                    }
                }
                Err(e) => warn!("can not check {}: {}", parsed.qid, e),
            }
        }
    }
    Ok(())
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Applied {
    Added,
    Removed,
    NotFound,
    Ignored,
    Unhandled,
}

pub fn apply(graph: &mut QidGraph, change: &GraphChange) -> Applied {
    match change.op {
        op if op.creates() => {
            if is_cg_rel(&change.prop) {
                graph.add_edge(&change.qid, &change.value, &change.prop);
                Applied::Added
            } else {
                Applied::Ignored
            }
        }
        ChangeOp::RemoveClaims => {
            if graph.remove_edge(&change.qid, &change.value, &change.prop) {
                Applied::Removed
            } else {
                Applied::NotFound
            }
        }
        op => {
            info!("no handling for {}", op);
            Applied::Unhandled
        }
    }
}

/// Consumer side: the graph plus the append-only change log
/// (`graph_changes.txt`), one `op src type dst` line per added edge.
pub struct LiveGraph<W: Write> {
    pub graph: QidGraph,
    log: W,
    edges_added: usize,
}

impl<W: Write> LiveGraph<W> {
    pub fn new(graph: QidGraph, log: W) -> LiveGraph<W> {
        LiveGraph { graph, log, edges_added: 0 }
    }

    pub fn status(&self) -> String {
        format!("graph now has {} nodes and {} edges", self.graph.node_count(), self.graph.edge_count())
    }

    /// Applies a previous session's log. Returns the number of added edges.
    pub fn replay<R: BufRead>(&mut self, previous: R) -> WikiResult<usize> {
        let mut added = 0;
        for line in previous.lines() {
            let line = line?;
            if let Some(comment) = line.strip_prefix('#') {
                info!("replaying {}", comment);
                continue;
            }
            if line.trim().is_empty() {
                continue;
            }
            match line.parse::<GraphChange>() {
                Ok(change) => {
                    if apply(&mut self.graph, &change) == Applied::Added {
                        added += 1;
                    }
                }
                Err(e) => warn!("{}", e),
            }
        }
        info!("{} edges added from existing change log", added);
        Ok(added)
    }

    pub fn mark_start(&mut self) -> WikiResult<()> {
        let now = OffsetDateTime::now_utc()
            .format(&Rfc3339)
            .map_err(|e| WikiError::from(format!("can not format timestamp: {}", e)))?;
        writeln!(self.log, "#changes starting {}", now)?;
        self.log.flush()?;
        Ok(())
    }

    pub fn handle(&mut self, change: &GraphChange) -> WikiResult<Applied> {
        let applied = apply(&mut self.graph, change);
        match applied {
            Applied::Added => {
                writeln!(self.log, "{}", change)?;
                self.edges_added += 1;
                if self.edges_added % STATUS_EVERY == 0 {
                    info!("{}, {} edges added", self.status(), self.edges_added);
                    self.log.flush()?;
                }
            }
            Applied::Removed => info!("removed {}", change),
            Applied::NotFound => info!("no edge to remove for {}", change),
            Applied::Ignored | Applied::Unhandled => (),
        }
        Ok(applied)
    }

    pub fn edges_added(&self) -> usize {
        self.edges_added
    }

    pub fn into_log(self) -> W {
        self.log
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::tests::MemorySource;

    fn event(comment: &str) -> RecentChange {
        serde_json::from_value(serde_json::json!({
            "wiki": "wikidatawiki",
            "type": "edit",
            "comment": comment,
            "meta": { "uri": "https://www.wikidata.org/wiki/Q42", "dt": "2024-01-01T00:00:00Z" }
        }))
        .unwrap()
    }

    #[test]
    fn parses_summaries() {
        assert_eq!(
            parse_comment("/* wbsetclaim-create:2||1 */ [[Property:P737]]: [[Q1]]"),
            Some(("wbsetclaim-create:2||1", "P737", "Q1"))
        );
        assert_eq!(
            parse_comment("/* wbremoveclaims-remove:1| */ [[Property:P22]]: [[Q5]], #quickstatements"),
            Some(("wbremoveclaims-remove:1|", "P22", "Q5"))
        );
        assert_eq!(parse_comment("/* wbeditentity-update:0| */"), None);
        assert_eq!(ChangeOp::classify("wbsetclaim-update:2||1"), Some(ChangeOp::SetClaimUpdate));
        assert_eq!(ChangeOp::classify("wbeditentity-update"), None);
    }

    #[test]
    fn filters_watched_changes() {
        let c = watched(&event("/* wbcreateclaim-create:1| */ [[Property:P737]]: [[Q1]]")).unwrap();
        assert_eq!(c.to_string(), "wbcreateclaim Q42 P737 Q1");
        assert!(watched(&event("/* wbcreateclaim-create:1| */ [[Property:P18]]: Foo.jpg")).is_none());
        let mut other = event("/* wbcreateclaim-create:1| */ [[Property:P737]]: [[Q1]]");
        other.wiki = "enwiki".into();
        assert!(watched(&other).is_none());
    }

    #[test]
    fn only_edit_events_count() {
        let mut log = event("/* wbcreateclaim-create:1| */ [[Property:P737]]: [[Q1]]");
        assert!(parse_change(&log).is_some());
        log.kind = "log".into();
        assert!(parse_change(&log).is_none());
        log.kind = String::new();
        assert!(parse_change(&log).is_none());
    }

    const MESSY: &str = r#"{"type":"item","id":"Q42","claims":{"P569":[{"mainsnak":{"snaktype":"value","property":"P569","datatype":"time","datavalue":{"value":{"time":"+1952-03-11T00:00:00Z","precision":11},"type":"time"}}}],"P570":[{"mainsnak":{"snaktype":"value","property":"P570","datatype":"time","datavalue":{"value":{"time":"+1901-05-11T00:00:00Z","precision":11},"type":"time"}}}],"P585":[{"mainsnak":{"snaktype":"value","property":"P585","datatype":"time","datavalue":{"value":{"time":"+1950-01-01T00:00:00Z","precision":11},"type":"time"}}}]}}"#;

    #[test]
    fn detects_order_violations() {
        let e = Entity::from_json(MESSY).unwrap();
        let v: Vec<String> = out_of_order(&e).iter().map(|v| format!("{} {}", v.earlier_prop, v.later_prop)).collect();
        assert_eq!(v, vec!["P569 P570", "P569 P585", "P585 P570"]);
        let fine = Entity::from_json(crate::wikidata::tests::DOUGLAS).unwrap();
        assert!(out_of_order(&fine).is_empty());
    }

    #[test]
    fn reads_sse_data_lines() {
        let sse = ":ok\n\nevent: message\nid: [{}]\ndata: {\"wiki\":\"wikidatawiki\",\"comment\":\"x\",\"meta\":{\"uri\":\"https://www.wikidata.org/wiki/Q1\"}}\n\ndata: not json\n";
        let changes: Vec<RecentChange> = RecentChangeStream::new(io::Cursor::new(sse)).collect::<WikiResult<_>>().unwrap();
        assert_eq!(changes.len(), 1);
        assert_eq!(changes[0].meta.uri, "https://www.wikidata.org/wiki/Q1");
    }

    #[test]
    fn producer_sends_watched() {
        let source = MemorySource::with_entities(&[MESSY]);
        let (tx, rx) = crossbeam_channel::unbounded();
        let changes = vec![
            Ok(event("/* wbsetclaim-create:2||1 */ [[Property:P737]]: [[Q1]]")),
            Ok(event("/* wbsetclaimvalue:1| */ [[Property:P570]]: 11 May 1901")),
            Ok(event("/* wbsetclaim-update:2||1 */ [[Property:P40]]: [[Q2]]")),
        ];
        watch(changes, &source, &tx).unwrap();
        drop(tx);
        let got: Vec<GraphChange> = rx.iter().collect();
        assert_eq!(got.len(), 2);
        assert_eq!(got[1].op, ChangeOp::SetClaimUpdate);
        assert_eq!(source.requests.borrow().len(), 1);
    }

    #[test]
    fn live_graph_logs_and_replays() {
        let mut live = LiveGraph::new(QidGraph::new(), vec![]);
        let previous = "#changes starting earlier\nwbcreateclaim Q1 P737 Q2\nwbsetclaim-create Q1 P26 Q3\nbogus\n";
        assert_eq!(live.replay(io::Cursor::new(previous)).unwrap(), 1);
        live.mark_start().unwrap();
        let add: GraphChange = "wbsetclaim-create Q3 P40 Q4".parse().unwrap();
        assert_eq!(live.handle(&add).unwrap(), Applied::Added);
        let remove: GraphChange = "wbremoveclaims Q1 P737 Q2".parse().unwrap();
        assert_eq!(live.handle(&remove).unwrap(), Applied::Removed);
        assert_eq!(live.handle(&remove).unwrap(), Applied::NotFound);
        let update: GraphChange = "wbsetclaimvalue Q1 P737 Q2".parse().unwrap();
        assert_eq!(live.handle(&update).unwrap(), Applied::Unhandled);
        assert_eq!(live.graph.edge_count(), 1);
        assert_eq!(live.edges_added(), 1);
        let log = String::from_utf8(live.into_log()).unwrap();
        assert!(log.starts_with("#changes starting "));
        assert!(log.ends_with("\nwbsetclaim-create Q3 P40 Q4\n"));
    }
}
