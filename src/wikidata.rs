use std::collections::BTreeMap;
use std::fmt;
use std::io;
use std::io::prelude::*;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use wikitime::WikiTime;

use crate::{WikiError, WikiErrorKind, WikiResult, WikiResultExt};

/// Entities between two progress reports.
pub const PROGRESS_EVERY: u64 = 1_000_000;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum EntityRef {
    Q(u64),
    P(u64),
    L(u64),
}

impl EntityRef {
    pub fn from_id(id: &str) -> Option<EntityRef> {
        id.parse().ok()
    }

    pub fn get_id(&self) -> String {
        self.to_string()
    }

    pub fn numeric(&self) -> u64 {
        match *self {
            EntityRef::Q(n) | EntityRef::P(n) | EntityRef::L(n) => n,
        }
    }
}

impl fmt::Display for EntityRef {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match *self {
            EntityRef::Q(n) => write!(f, "Q{}", n),
            EntityRef::P(n) => write!(f, "P{}", n),
            EntityRef::L(n) => write!(f, "L{}", n),
        }
    }
}

impl FromStr for EntityRef {
    type Err = WikiError;

    fn from_str(s: &str) -> WikiResult<EntityRef> {
        let kind = s.chars().next().ok_or("empty entity id")?;
        let n: u64 = s[kind.len_utf8()..].parse()?;
        match kind {
            'Q' => Ok(EntityRef::Q(n)),
            'P' => Ok(EntityRef::P(n)),
            'L' => Ok(EntityRef::L(n)),
            _ => bail!("unexpected entity id {:?}", s),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntityType {
    Item,
    Property,
    Lexeme,
    #[serde(other)]
    Other,
}

impl Default for EntityType {
    fn default() -> EntityType {
        EntityType::Other
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MonolingualText {
    #[serde(default)]
    pub language: String,
    pub value: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SiteLink {
    pub site: String,
    pub title: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Rank {
    Preferred,
    Normal,
    Deprecated,
}

impl Default for Rank {
    fn default() -> Rank {
        Rank::Normal
    }
}

/// A datavalue is kept as raw JSON; accessors pick out the shapes we use.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DataValue {
    #[serde(rename = "type", default)]
    pub kind: String,
    #[serde(default)]
    pub value: Value,
}

#[derive(Debug, Clone, PartialEq)]
pub struct TimeValue {
    pub time: String,
    pub precision: u8,
}

impl TimeValue {
    pub fn parsed(&self) -> Option<WikiTime> {
        WikiTime::parse(&self.time)
    }
}

impl DataValue {
    pub fn entity_id(&self) -> Option<&str> {
        self.value.get("id").and_then(|v| v.as_str())
    }

    pub fn time(&self) -> Option<TimeValue> {
        let time = self.value.get("time").and_then(|v| v.as_str())?;
        let precision = self.value.get("precision").and_then(|v| v.as_u64()).unwrap_or(0);
        Some(TimeValue { time: time.to_string(), precision: precision as u8 })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Snak {
    #[serde(default)]
    pub snaktype: String,
    #[serde(default)]
    pub property: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub datatype: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub datavalue: Option<DataValue>,
}

impl Snak {
    pub fn entity_id(&self) -> Option<&str> {
        self.datavalue.as_ref().and_then(|dv| dv.entity_id())
    }

    pub fn time(&self) -> Option<TimeValue> {
        self.datavalue.as_ref().and_then(|dv| dv.time())
    }

    pub fn is_value(&self) -> bool {
        self.snaktype == "value"
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Claim {
    pub mainsnak: Snak,
    #[serde(default)]
    pub rank: Rank,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub qualifiers: BTreeMap<String, Vec<Snak>>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Entity {
    pub id: String,
    #[serde(rename = "type", default)]
    pub kind: EntityType,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub labels: BTreeMap<String, MonolingualText>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub descriptions: BTreeMap<String, MonolingualText>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub sitelinks: BTreeMap<String, SiteLink>,
    #[serde(default)]
    pub claims: BTreeMap<String, Vec<Claim>>,
    /// Set by the API for ids that do not exist (any more).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub missing: Option<String>,
}

impl Entity {
    pub fn from_json(line: &str) -> WikiResult<Entity> {
        Ok(serde_json::from_str(line)?)
    }

    pub fn is_item(&self) -> bool {
        self.kind == EntityType::Item
    }

    pub fn is_item_or_lexeme(&self) -> bool {
        self.kind == EntityType::Item || self.kind == EntityType::Lexeme
    }

    pub fn is_missing(&self) -> bool {
        self.missing.is_some()
    }

    /// Readable label through a language fallback chain. For each language,
    /// the Wikipedia article title beats the Wikidata label.
    pub fn label(&self, lang_order: &[&str]) -> Option<&str> {
        for lang in lang_order {
            if let Some(link) = self.sitelinks.get(&format!("{}wiki", lang)) {
                return Some(&*link.title);
            }
            if let Some(label) = self.labels.get(*lang) {
                return Some(&*label.value);
            }
        }
        None
    }

    pub fn label_in(&self, lang: &str) -> Option<&str> {
        self.labels.get(lang).map(|l| &*l.value)
    }

    pub fn description(&self, lang: &str) -> Option<&str> {
        self.descriptions.get(lang).map(|d| &*d.value)
    }

    pub fn sitelink(&self, site: &str) -> Option<&str> {
        self.sitelinks.get(site).map(|s| &*s.title)
    }

    /// Article titles per language, for languages that have one.
    pub fn sitelink_labels<'a>(&'a self, langs: &[&'a str]) -> Vec<(&'a str, &'a str)> {
        langs
            .iter()
            .filter_map(|lang| self.sitelink(&format!("{}wiki", lang)).map(|t| (*lang, t)))
            .collect()
    }

    pub fn has_claim(&self, prop: &str) -> bool {
        self.claims.contains_key(prop)
    }

    pub fn get_claims(&self, prop: &str) -> &[Claim] {
        self.claims.get(prop).map(|c| &**c).unwrap_or(&[])
    }

    pub fn first_entity_value(&self, prop: &str) -> Option<&str> {
        self.get_claims(prop).first().and_then(|c| c.mainsnak.entity_id())
    }

    pub fn entity_values<'a>(&'a self, prop: &str) -> impl Iterator<Item = &'a str> + 'a {
        self.get_claims(prop).iter().filter_map(|c| c.mainsnak.entity_id())
    }

    pub fn first_time_value(&self, prop: &str) -> Option<TimeValue> {
        self.get_claims(prop).first().and_then(|c| c.mainsnak.time())
    }

    /// Every `(property, target)` pair of entity-valued main snaks.
    pub fn relations<'a>(&'a self) -> impl Iterator<Item = (&'a str, &'a str)> + 'a {
        self.claims.iter().flat_map(|(prop, claims)| {
            claims.iter().filter_map(move |c| c.mainsnak.entity_id().map(|id| (&**prop, id)))
        })
    }

    pub fn time_values<'a>(&'a self, prop: &str) -> impl Iterator<Item = TimeValue> + 'a {
        self.get_claims(prop).iter().filter_map(|c| c.mainsnak.time())
    }
}

/// Reads the one-entity-per-line Wikidata JSON dump, skipping the array
/// framing.
pub struct DumpReader<R: BufRead> {
    lines: io::Lines<R>,
    counter: u64,
}

impl<R: BufRead> DumpReader<R> {
    pub fn new(input: R) -> DumpReader<R> {
        DumpReader { lines: input.lines(), counter: 0 }
    }
}

impl<R: BufRead> Iterator for DumpReader<R> {
    type Item = WikiResult<Entity>;

    fn next(&mut self) -> Option<WikiResult<Entity>> {
        loop {
            let line = match self.lines.next()? {
                Ok(line) => line,
                Err(e) => return Some(Err(e.into())),
            };
            self.counter += 1;
            let line = line.trim_end();
            let line = line.strip_suffix(',').unwrap_or(line);
            if line.is_empty() || line == "[" || line == "]" {
                continue;
            }
            let counter = self.counter;
            return Some(Entity::from_json(line).chain_err(|| format!("json error @{}", counter)));
        }
    }
}

/// Feeds every entity of a dump to `f`. Records that do not parse are logged
/// and skipped; I/O errors stop the scan.
pub fn for_each_entity<R: BufRead, F: FnMut(Entity)>(input: R, mut f: F) -> WikiResult<u64> {
    let mut count = 0u64;
    for entity in DumpReader::new(input) {
        match entity {
            Ok(entity) => f(entity),
            Err(WikiError(WikiErrorKind::Io(e), _)) => return Err(e.into()),
            Err(e) => {
                warn!("{}", e);
                continue;
            }
        }
        count += 1;
        if count % PROGRESS_EVERY == 0 {
            info!("{} entities processed", count);
        }
    }
    info!("{} entities processed", count);
    Ok(count)
}

#[cfg(test)]
pub mod tests {
    use super::*;

    pub const DOUGLAS: &str = r#"{"type":"item","id":"Q42","labels":{"en":{"language":"en","value":"Douglas Adams"},"fr":{"language":"fr","value":"Douglas Adams"}},"descriptions":{"en":{"language":"en","value":"English writer and humorist"}},"sitelinks":{"dewiki":{"site":"dewiki","title":"Douglas Adams (Autor)","badges":[]}},"claims":{"P31":[{"mainsnak":{"snaktype":"value","property":"P31","datatype":"wikibase-item","datavalue":{"value":{"entity-type":"item","numeric-id":5,"id":"Q5"},"type":"wikibase-entityid"}},"type":"statement","rank":"normal"}],"P569":[{"mainsnak":{"snaktype":"value","property":"P569","datatype":"time","datavalue":{"value":{"time":"+1952-03-11T00:00:00Z","timezone":0,"before":0,"after":0,"precision":11,"calendarmodel":"http://www.wikidata.org/entity/Q1985727"},"type":"time"}},"type":"statement","rank":"normal"}],"P737":[{"mainsnak":{"snaktype":"value","property":"P737","datatype":"wikibase-item","datavalue":{"value":{"entity-type":"item","numeric-id":1,"id":"Q1"},"type":"wikibase-entityid"}},"type":"statement","rank":"normal"},{"mainsnak":{"snaktype":"somevalue","property":"P737","datatype":"wikibase-item"},"type":"statement","rank":"normal"}],"P69":[{"mainsnak":{"snaktype":"value","property":"P69","datatype":"wikibase-item","datavalue":{"value":{"entity-type":"item","numeric-id":691283,"id":"Q691283"},"type":"wikibase-entityid"}},"type":"statement","qualifiers":{"P582":[{"snaktype":"value","property":"P582","datatype":"time","datavalue":{"value":{"time":"+1974-00-00T00:00:00Z","precision":9},"type":"time"}}]},"rank":"normal"}],"P1082":[{"mainsnak":{"snaktype":"value","property":"P1082","datatype":"quantity","datavalue":{"value":{"amount":"+1","unit":"1"},"type":"quantity"}},"type":"statement","rank":"deprecated"}]}}"#;

    #[test]
    fn entity_ref_round_trip() {
        assert_eq!(EntityRef::from_id("Q42"), Some(EntityRef::Q(42)));
        assert_eq!(EntityRef::from_id("P737").map(|e| e.get_id()), Some("P737".to_string()));
        assert_eq!(EntityRef::from_id("X1"), None);
        assert_eq!(EntityRef::from_id("Q"), None);
        assert_eq!(EntityRef::Q(7).numeric(), 7);
    }

    #[test]
    fn parses_dump_entity() {
        let e = Entity::from_json(DOUGLAS).unwrap();
        assert!(e.is_item());
        assert_eq!(e.label(&["en", "de"]), Some("Douglas Adams"));
        assert_eq!(e.label(&["de", "en"]), Some("Douglas Adams (Autor)"));
        assert_eq!(e.label(&["sv"]), None);
        assert_eq!(e.description("en"), Some("English writer and humorist"));
        assert_eq!(e.first_entity_value("P31"), Some("Q5"));
        assert_eq!(e.entity_values("P737").collect::<Vec<_>>(), vec!["Q1"]);
        let tv = e.first_time_value("P569").unwrap();
        assert_eq!(tv.precision, 11);
        assert_eq!(tv.parsed().unwrap().year, 1952);
        assert_eq!(e.get_claims("P1082")[0].rank, Rank::Deprecated);
        assert_eq!(e.relations().count(), 3);
        assert!(e.get_claims("P9999").is_empty());
    }

    #[test]
    fn missing_entity_from_api() {
        let e = Entity::from_json(r#"{"id":"Q999999999","missing":""}"#).unwrap();
        assert!(e.is_missing());
        assert_eq!(e.kind, EntityType::Other);
    }

    #[test]
    fn dump_reader_skips_framing() {
        let dump = format!("[\n{},\n{{\"type\":\"property\",\"id\":\"P31\"}}\n]\n", DOUGLAS);
        let entities: Vec<Entity> = DumpReader::new(io::Cursor::new(dump))
            .collect::<WikiResult<_>>()
            .unwrap();
        assert_eq!(entities.len(), 2);
        assert_eq!(entities[1].kind, EntityType::Property);
    }

    #[test]
    fn dump_reader_reports_line() {
        let dump = "[\n{\"id\": oops},\n]\n";
        let err = DumpReader::new(io::Cursor::new(dump)).next().unwrap().unwrap_err();
        assert!(err.to_string().contains("@2"));
    }

    #[test]
    fn for_each_entity_skips_bad_records() {
        let dump = format!("[\n{},\n{{\"id\": oops}},\n{{\"type\":\"lexeme\",\"id\":\"L1\"}}\n]\n", DOUGLAS);
        let mut ids = vec![];
        let count = for_each_entity(io::Cursor::new(dump), |e| ids.push(e.id)).unwrap();
        assert_eq!(count, 2);
        assert_eq!(ids, vec!["Q42", "L1"]);
    }
}
