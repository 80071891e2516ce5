//! Year and month sequences: chains of "<period> in <topic>" items linked by
//! follows (P155) and followed by (P156).

use std::collections::{BTreeMap, HashSet};
use std::fs;
use std::io::prelude::*;
use std::path::Path;
use std::thread;
use std::time::Duration;

use serde::de::{self, Deserializer};
use serde::ser::{SerializeMap, Serializer};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use wikitime::{range, Month, Period, Year};

use crate::api::{EntityCache, EntitySource, SearchResponse};
use crate::constants::{EVENT_PERIOD_CLASS, FOLLOWED_BY, FOLLOWS, INSTANCE_OF, LANG_ORDER, POINT_IN_TIME};
use crate::wikidata::Entity;
use crate::{helpers, WikiResult, WikiResultExt};

/// How a period is spelled in configuration files: years as numbers,
/// months as "July 1987" (or "1987-07").
pub trait ConfigPeriod: Period {
    fn to_json(&self) -> Value;
    fn from_json(value: &Value) -> Option<Self>;
}

impl ConfigPeriod for Year {
    fn to_json(&self) -> Value {
        Value::from(self.0)
    }

    fn from_json(value: &Value) -> Option<Year> {
        match value {
            Value::Number(n) => n.as_i64().map(Year),
            Value::String(s) => s.parse().ok(),
            _ => None,
        }
    }
}

impl ConfigPeriod for Month {
    fn to_json(&self) -> Value {
        Value::from(self.to_string())
    }

    fn from_json(value: &Value) -> Option<Month> {
        value.as_str().and_then(|s| s.parse().ok())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchQuery {
    #[serde(default)]
    pub prefix: String,
    #[serde(default)]
    pub suffix: String,
    pub lang: String,
}

impl SearchQuery {
    pub fn text(&self, term: &str) -> String {
        format!("{}{}{}", self.prefix, term, self.suffix)
    }

    /// The period part of a label following this query's pattern.
    pub fn strip<'a>(&self, label: &'a str) -> Option<&'a str> {
        label.strip_prefix(&*self.prefix)?.strip_suffix(&*self.suffix).map(|s| s.trim())
    }

    pub fn matches(&self, label: &str) -> bool {
        label.starts_with(&*self.prefix) && label.ends_with(&*self.suffix)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SequenceConfig<P: ConfigPeriod> {
    pub start_id: String,
    pub end_id: String,
    pub start: P,
    pub end: P,
    pub search_query: SearchQuery,
}

impl<P: ConfigPeriod> Serialize for SequenceConfig<P> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(5))?;
        map.serialize_entry("end_id", &self.end_id)?;
        map.serialize_entry(&format!("end_{}", P::UNIT), &self.end.to_json())?;
        map.serialize_entry("search_query", &self.search_query)?;
        map.serialize_entry("start_id", &self.start_id)?;
        map.serialize_entry(&format!("start_{}", P::UNIT), &self.start.to_json())?;
        map.end()
    }
}

impl<'de, P: ConfigPeriod> Deserialize<'de> for SequenceConfig<P> {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<SequenceConfig<P>, D::Error> {
        let mut raw: BTreeMap<String, Value> = BTreeMap::deserialize(deserializer)?;
        let mut take = |key: String| -> Result<Value, D::Error> {
            raw.remove(&key).ok_or_else(|| de::Error::custom(format!("missing field `{}`", key)))
        };
        let id = |v: Value| -> Result<String, D::Error> {
            v.as_str().map(|s| s.to_string()).ok_or_else(|| de::Error::custom("ids must be strings"))
        };
        let period = |v: Value| -> Result<P, D::Error> {
            P::from_json(&v).ok_or_else(|| de::Error::custom(format!("improper {}: {}", P::UNIT, v)))
        };
        let start_id = id(take("start_id".into())?)?;
        let end_id = id(take("end_id".into())?)?;
        let start = period(take(format!("start_{}", P::UNIT))?)?;
        let end = period(take(format!("end_{}", P::UNIT))?)?;
        let search_query = SearchQuery::deserialize(take("search_query".into())?).map_err(de::Error::custom)?;
        Ok(SequenceConfig { start_id, end_id, start, end, search_query })
    }
}

pub type SequenceConfigs<P> = BTreeMap<String, SequenceConfig<P>>;

pub fn load_configs<P: ConfigPeriod, Q: AsRef<Path>>(path: Q) -> WikiResult<SequenceConfigs<P>> {
    helpers::read_json(path)
}

/// The named sequence, or every sequence of the file when `name` is `None`.
pub fn select_sequences<'c, P: ConfigPeriod>(configs: &'c SequenceConfigs<P>, name: Option<&str>) -> WikiResult<Vec<&'c str>> {
    match name {
        Some(name) => match configs.get_key_value(name) {
            Some((key, _)) => Ok(vec![key.as_str()]),
            None => bail!("no sequence {:?} in config", name),
        },
        None => Ok(configs.keys().map(|k| k.as_str()).collect()),
    }
}

/// Sorted keys, four space indent.
pub fn save_configs<P: ConfigPeriod, Q: AsRef<Path>>(path: Q, configs: &SequenceConfigs<P>) -> WikiResult<()> {
    let path = path.as_ref();
    let mut buf = vec![];
    let formatter = serde_json::ser::PrettyFormatter::with_indent(b"    ");
    let mut ser = serde_json::Serializer::with_formatter(&mut buf, formatter);
    configs.serialize(&mut ser)?;
    buf.push(b'\n');
    fs::write(path, buf).chain_err(|| format!("can not write {:?}", path))?;
    Ok(())
}

pub fn period_of<P: Period>(entity: &Entity) -> Option<P> {
    entity.first_time_value(POINT_IN_TIME).and_then(|tv| tv.parsed()).and_then(|t| P::from_time(&t))
}

/// Where a chain walk stopped.
#[derive(Debug, Clone, PartialEq)]
pub struct ChainEnd<P> {
    pub id: String,
    pub period: Option<P>,
    pub length: usize,
}

/// QuickStatements CSV sections.
#[derive(Debug, Default, PartialEq)]
pub struct PatchSet {
    pub follows: Vec<(String, String)>,
    pub followed_by: Vec<(String, String)>,
    pub point_in_time: Vec<(String, String)>,
    pub instance_of: Vec<(String, String)>,
    /// Set when a census ran, so its (possibly empty) sections get written.
    pub census: bool,
}

impl PatchSet {
    pub fn extend(&mut self, other: PatchSet) {
        self.follows.extend(other.follows);
        self.followed_by.extend(other.followed_by);
        self.point_in_time.extend(other.point_in_time);
        self.instance_of.extend(other.instance_of);
        self.census |= other.census;
    }

    pub fn write_csv<W: Write>(&self, mut out: W) -> WikiResult<()> {
        let mut section = |prop: &str, rows: &[(String, String)]| -> WikiResult<()> {
            writeln!(out, "qid,{}", prop)?;
            for (subject, value) in rows {
                writeln!(out, "{},{}", subject, value)?;
            }
            Ok(())
        };
        section(FOLLOWS, &self.follows)?;
        section(FOLLOWED_BY, &self.followed_by)?;
        if self.census {
            section(POINT_IN_TIME, &self.point_in_time)?;
            section(INSTANCE_OF, &self.instance_of)?;
        }
        Ok(())
    }
}

#[derive(Debug)]
pub struct SequenceReport<P> {
    pub gap_start: ChainEnd<P>,
    pub gap_end: ChainEnd<P>,
    /// Searched text and response, in period order.
    pub searches: Vec<(String, SearchResponse)>,
    pub ids: Vec<String>,
    pub patch: PatchSet,
}

impl<P> SequenceReport<P> {
    pub fn search_results(&self) -> Vec<&SearchResponse> {
        self.searches.iter().map(|(_, r)| r).collect()
    }
}

pub struct SequenceChecker<'a, S: EntitySource> {
    cache: &'a mut EntityCache<S>,
    search_pause: Duration,
}

impl<'a, S: EntitySource> SequenceChecker<'a, S> {
    pub fn new(cache: &'a mut EntityCache<S>) -> SequenceChecker<'a, S> {
        SequenceChecker { cache, search_pause: Duration::from_millis(0) }
    }

    /// Pause after each gap search.
    pub fn with_search_pause(mut self, pause: Duration) -> SequenceChecker<'a, S> {
        self.search_pause = pause;
        self
    }

    /// Follows the first `link` value from `from` until the chain breaks or
    /// loops.
    pub fn walk<P: Period>(&mut self, from: &str, link: &str) -> WikiResult<ChainEnd<P>> {
        self.cache.get(from)?;
        let mut visited: HashSet<String> = HashSet::new();
        visited.insert(from.to_string());
        let mut current = from.to_string();
        loop {
            let next = match self.cache.peek(&current).and_then(|e| e.first_entity_value(link)) {
                Some(next) => next.to_string(),
                None => break,
            };
            if !visited.insert(next.clone()) {
                warn!("{} {} {} loops back", current, link, next);
                break;
            }
            match self.cache.get(&next) {
                Ok(e) => info!("{} {} {}", visited.len(), next, e.label(LANG_ORDER).unwrap_or("-")),
                Err(e) => {
                    warn!("{}", e);
                    break;
                }
            }
            current = next;
        }
        let period = self.cache.peek(&current).and_then(period_of::<P>);
        Ok(ChainEnd { id: current, period, length: visited.len() })
    }

    fn search(&mut self, query: &SearchQuery, term: &str) -> WikiResult<(String, SearchResponse)> {
        let text = query.text(term);
        let response = self.cache.source().search(&text, &query.lang)?;
        thread::sleep(self.search_pause);
        Ok((text, response))
    }

    fn resolve_all(&mut self, searches: &[(String, SearchResponse)]) -> WikiResult<Vec<String>> {
        let mut ids = vec![];
        for (text, response) in searches {
            match response.resolve(text) {
                Some(id) => ids.push(id.to_string()),
                None if response.search.is_empty() => info!("no results for {:?}", text),
                None => warn!("multiple results for {:?}: {:?}", text, response.search),
            }
        }
        self.cache.fetch(&ids)?;
        Ok(ids)
    }

    /// Searches every period of the configured range and proposes the
    /// missing point in time and instance of claims.
    pub fn census<P: ConfigPeriod>(&mut self, config: &SequenceConfig<P>) -> WikiResult<PatchSet> {
        let query = &config.search_query;
        let mut searches = vec![];
        for period in range(config.start, config.end) {
            searches.push(self.search(query, &period.search_term())?);
        }
        let mut ids = self.resolve_all(&searches)?;
        let mut seen = HashSet::new();
        ids.retain(|id| seen.insert(id.clone()));
        let mut patch = PatchSet { census: true, ..PatchSet::default() };
        for id in ids {
            let entity = match self.cache.peek(&id) {
                Some(e) => e,
                None => continue,
            };
            if !entity.has_claim(POINT_IN_TIME) {
                let label = entity.label_in(&query.lang).or_else(|| entity.label(LANG_ORDER));
                match label.and_then(|l| query.strip(l)).and_then(|p| p.parse::<P>().ok()) {
                    Some(period) => patch.point_in_time.push((id.clone(), period.point_in_time())),
                    None => warn!("no {} in label {:?} of {}", P::UNIT, label, id),
                }
            }
            if !entity.has_claim(INSTANCE_OF) {
                patch.instance_of.push((id.clone(), EVENT_PERIOD_CLASS.to_string()));
            }
        }
        Ok(patch)
    }

    fn links_to(&self, src: &str, dst: &str, link: &str) -> bool {
        self.cache.peek(src).and_then(|e| e.first_entity_value(link)) == Some(dst)
    }

    fn consecutive<P: Period>(&self, src: &str, dst: &str, link: &str) -> bool {
        let period = |id: &str| self.cache.peek(id).and_then(period_of::<P>);
        match (period(src), period(dst)) {
            (Some(s), Some(d)) if link == FOLLOWS => d == s.prev(),
            (Some(s), Some(d)) if link == FOLLOWED_BY => d == s.next(),
            _ => false,
        }
    }

    /// Links between neighbours of `ids` that are missing but dated as
    /// consecutive.
    pub fn propose_links<P: Period>(&self, ids: &[String]) -> PatchSet {
        let mut patch = PatchSet::default();
        for (i, id) in ids.iter().enumerate() {
            if i > 0 {
                let prev = &ids[i - 1];
                if !self.links_to(id, prev, FOLLOWS) && self.consecutive::<P>(id, prev, FOLLOWS) {
                    patch.follows.push((id.clone(), prev.clone()));
                } else {
                    debug!("not proposing {} {} {}", id, FOLLOWS, prev);
                }
            }
            if let Some(next) = ids.get(i + 1) {
                if !self.links_to(id, next, FOLLOWED_BY) && self.consecutive::<P>(id, next, FOLLOWED_BY) {
                    patch.followed_by.push((id.clone(), next.clone()));
                } else {
                    debug!("not proposing {} {} {}", id, FOLLOWED_BY, next);
                }
            }
        }
        patch
    }

    pub fn check<P: ConfigPeriod>(&mut self, config: &SequenceConfig<P>) -> WikiResult<SequenceReport<P>> {
        info!("starting at the beginning of the chain");
        let gap_start = self.walk::<P>(&config.start_id, FOLLOWED_BY)?;
        info!("first gap starts at {}", gap_start.id);
        info!("starting at the end of the chain");
        let gap_end = self.walk::<P>(&config.end_id, FOLLOWS)?;
        info!("last gap ends at {}", gap_end.id);

        let mut patch = PatchSet::default();
        if gap_start.period.is_none() || gap_end.period.is_none() {
            patch.extend(self.census(config)?);
        }
        let from = gap_start.period.unwrap_or(config.start);
        let to = gap_end.period.unwrap_or(config.end);

        let mut searches = vec![];
        if from < to {
            info!("checking the gap from {} to {}", from, to);
            for period in range(from.prev(), to) {
                searches.push(self.search(&config.search_query, &period.search_term())?);
            }
        } else {
            info!("no gap");
        }
        let ids = self.resolve_all(&searches)?;
        patch.extend(self.propose_links::<P>(&ids));
        Ok(SequenceReport { gap_start, gap_end, searches, ids, patch })
    }
}

/// Writes the fetched entities (`seq_entities_full.json`), the gap searches
/// (`gap_search_results.json`) and the patch (`seqpatch_<name>.csv`) to `dir`.
pub fn save_report<P, S: EntitySource>(
    dir: &Path,
    name: &str,
    report: &SequenceReport<P>,
    cache: &EntityCache<S>,
) -> WikiResult<()> {
    cache.save(dir.join("seq_entities_full.json"))?;
    helpers::write_json(dir.join("gap_search_results.json"), &report.search_results())?;
    let mut out = helpers::create_output(dir.join(format!("seqpatch_{}.csv", name)))?;
    report.patch.write_csv(&mut out)?;
    out.flush()?;
    Ok(())
}

fn labels_consistent(query: &SearchQuery, a: Option<&Entity>, b: Option<&Entity>) -> bool {
    let label = |e: Option<&Entity>| e.and_then(|e| e.label_in(&query.lang)).map(|l| query.matches(l));
    label(a) == Some(true) && label(b) == Some(true)
}

/// Pushes both ends of a sequence outward by one period when the neighbour
/// is found unambiguously and labelled alike.
pub fn extend_sequence<S: EntitySource, P: ConfigPeriod>(
    config: &mut SequenceConfig<P>,
    cache: &mut EntityCache<S>,
) -> WikiResult<PatchSet> {
    let mut patch = PatchSet::default();
    let query = config.search_query.clone();

    let next = config.end.next();
    if let Some(cur) = single_hit(cache, &query, next)? {
        cache.fetch(&[config.end_id.clone(), cur.clone()])?;
        let (end, found) = (cache.peek(&config.end_id), cache.peek(&cur));
        if labels_consistent(&query, end, found) {
            if !found.map_or(false, |e| e.has_claim(FOLLOWS)) {
                patch.follows.push((cur.clone(), config.end_id.clone()));
            }
            if !end.map_or(false, |e| e.has_claim(FOLLOWED_BY)) {
                patch.followed_by.push((config.end_id.clone(), cur.clone()));
            }
            config.end = next;
            config.end_id = cur;
        }
    }

    let prev = config.start.prev();
    if let Some(cur) = single_hit(cache, &query, prev)? {
        cache.fetch(&[config.start_id.clone(), cur.clone()])?;
        let (start, found) = (cache.peek(&config.start_id), cache.peek(&cur));
        if labels_consistent(&query, start, found) {
            if !start.map_or(false, |e| e.has_claim(FOLLOWS)) {
                patch.follows.push((config.start_id.clone(), cur.clone()));
            }
            if !found.map_or(false, |e| e.has_claim(FOLLOWED_BY)) {
                patch.followed_by.push((cur.clone(), config.start_id.clone()));
            }
            config.start = prev;
            config.start_id = cur;
        }
    }
    Ok(patch)
}

fn single_hit<S: EntitySource, P: Period>(
    cache: &EntityCache<S>,
    query: &SearchQuery,
    period: P,
) -> WikiResult<Option<String>> {
    let text = query.text(&period.search_term());
    let response = cache.source().search(&text, &query.lang)?;
    match response.search.len() {
        1 => Ok(Some(response.search[0].id.clone())),
        0 => Ok(None),
        _ => {
            warn!("several hits for {:?}: {:?}", text, response.search);
            Ok(None)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::tests::MemorySource;

    fn period_item(id: &str, label: &str, year: Option<i64>, follows: Option<&str>, followed_by: Option<&str>) -> String {
        dated_item(id, label, year.map(|y| (format!("+{}-00-00T00:00:00Z", y), 9)), follows, followed_by)
    }

    fn month_item(id: &str, label: &str, month: Option<(i64, u8)>, follows: Option<&str>, followed_by: Option<&str>) -> String {
        dated_item(id, label, month.map(|(y, m)| (format!("+{}-{:02}-00T00:00:00Z", y, m), 10)), follows, followed_by)
    }

    fn dated_item(
        id: &str,
        label: &str,
        time: Option<(String, u8)>,
        follows: Option<&str>,
        followed_by: Option<&str>,
    ) -> String {
        let link = |prop: &str, target: &str| {
            format!(
                r#""{}":[{{"mainsnak":{{"snaktype":"value","property":"{}","datatype":"wikibase-item","datavalue":{{"value":{{"id":"{}"}},"type":"wikibase-entityid"}}}},"rank":"normal"}}]"#,
                prop, prop, target
            )
        };
        let mut claims = vec![];
        if let Some((time, precision)) = time {
            claims.push(format!(
                r#""P585":[{{"mainsnak":{{"snaktype":"value","property":"P585","datatype":"time","datavalue":{{"value":{{"time":"{}","precision":{}}},"type":"time"}}}},"rank":"normal"}}]"#,
                time, precision
            ));
            claims.push(link("P31", "Q18340514"));
        }
        if let Some(f) = follows {
            claims.push(link("P155", f));
        }
        if let Some(f) = followed_by {
            claims.push(link("P156", f));
        }
        format!(
            r#"{{"type":"item","id":"{}","labels":{{"en":{{"language":"en","value":"{}"}}}},"claims":{{{}}}}}"#,
            id,
            label,
            claims.join(",")
        )
    }

    fn film_config() -> SequenceConfig<Year> {
        SequenceConfig {
            start_id: "Q1990".into(),
            end_id: "Q1995".into(),
            start: Year(1990),
            end: Year(1995),
            search_query: SearchQuery { prefix: "".into(), suffix: " in film".into(), lang: "en".into() },
        }
    }

    /// 1990 -> 1991 and 1994 <- 1995 are linked; 1992 and 1993 exist unlinked.
    fn film_source() -> MemorySource {
        let items = vec![
            period_item("Q1990", "1990 in film", Some(1990), None, Some("Q1991")),
            period_item("Q1991", "1991 in film", Some(1991), Some("Q1990"), None),
            period_item("Q1992", "1992 in film", Some(1992), None, None),
            period_item("Q1993", "1993 in film", Some(1993), None, None),
            period_item("Q1994", "1994 in film", Some(1994), None, Some("Q1995")),
            period_item("Q1995", "1995 in film", Some(1995), Some("Q1994"), None),
        ];
        let refs: Vec<&str> = items.iter().map(|s| &**s).collect();
        let mut source = MemorySource::with_entities(&refs);
        for y in 1990..=1995 {
            source.add_search(&format!("{} in film", y), &[(&*format!("Q{}", y), &*format!("{} in film", y))]);
        }
        source
    }

    fn month_config(start_id: &str, end_id: &str, start: (i64, u8), end: (i64, u8)) -> SequenceConfig<Month> {
        SequenceConfig {
            start_id: start_id.into(),
            end_id: end_id.into(),
            start: Month::new(start.0, start.1).unwrap(),
            end: Month::new(end.0, end.1).unwrap(),
            search_query: SearchQuery { prefix: "".into(), suffix: "".into(), lang: "en".into() },
        }
    }

    #[test]
    fn config_file_keys_follow_unit() {
        let json = r#"{"start_id":"Q1","end_id":"Q2","start_month":"January 2000","end_month":"2000-03","search_query":{"prefix":"","suffix":" in the United States","lang":"en"}}"#;
        let config: SequenceConfig<Month> = serde_json::from_str(json).unwrap();
        assert_eq!(config.end, Month::new(2000, 3).unwrap());
        let back = serde_json::to_string(&config).unwrap();
        assert!(back.starts_with(r#"{"end_id":"Q2","end_month":"March 2000","search_query""#));
        assert!(serde_json::from_str::<SequenceConfig<Year>>(json).is_err());
    }

    #[test]
    fn walks_and_fills_gap() {
        let mut cache = EntityCache::new(film_source());
        let report = SequenceChecker::new(&mut cache).check(&film_config()).unwrap();
        assert_eq!(report.gap_start.id, "Q1991");
        assert_eq!(report.gap_start.period, Some(Year(1991)));
        assert_eq!(report.gap_end.id, "Q1994");
        assert_eq!(report.searches.len(), 5);
        assert_eq!(report.ids, vec!["Q1990", "Q1991", "Q1992", "Q1993", "Q1994"]);
        let mut out = vec![];
        report.patch.write_csv(&mut out).unwrap();
        assert_eq!(
            String::from_utf8(out).unwrap(),
            "qid,P155\nQ1992,Q1991\nQ1993,Q1992\nQ1994,Q1993\nqid,P156\nQ1991,Q1992\nQ1992,Q1993\nQ1993,Q1994\n"
        );
    }

    #[test]
    fn report_files() {
        let dir = tempfile::tempdir().unwrap();
        let mut cache = EntityCache::new(film_source());
        let report = SequenceChecker::new(&mut cache).check(&film_config()).unwrap();
        save_report(dir.path(), "film", &report, &cache).unwrap();
        let patch = fs::read_to_string(dir.path().join("seqpatch_film.csv")).unwrap();
        assert!(patch.starts_with("qid,P155\nQ1992,Q1991\n"));
        let searches: Vec<SearchResponse> = helpers::read_json(dir.path().join("gap_search_results.json")).unwrap();
        assert_eq!(searches.len(), 5);
        let entities: BTreeMap<String, Entity> = helpers::read_json(dir.path().join("seq_entities_full.json")).unwrap();
        assert!(entities.contains_key("Q1993"));
    }

    #[test]
    fn walk_stops_on_loops() {
        let source = MemorySource::with_entities(&[
            &period_item("Q1", "1 in film", Some(1), None, Some("Q2")),
            &period_item("Q2", "2 in film", Some(2), None, Some("Q1")),
        ]);
        let mut cache = EntityCache::new(source);
        let end = SequenceChecker::new(&mut cache).walk::<Year>("Q1", FOLLOWED_BY).unwrap();
        assert_eq!(end.id, "Q2");
        assert_eq!(end.length, 2);
    }

    #[test]
    fn census_proposes_dates_and_types() {
        let mut source = MemorySource::with_entities(&[
            &period_item("Q7", "1987 in film", None, None, None),
            &period_item("Q8", "1988 in film", Some(1988), None, None),
        ]);
        source.add_search("1987 in film", &[("Q7", "1987 in film")]);
        source.add_search("1988 in film", &[("Q8", "1988 in film"), ("Q9", "1988 in film festivals")]);
        let mut cache = EntityCache::new(source);
        let mut config = film_config();
        config.start = Year(1987);
        config.end = Year(1989);
        let patch = SequenceChecker::new(&mut cache).census(&config).unwrap();
        assert_eq!(patch.point_in_time, vec![("Q7".to_string(), "+1987-01-01T00:00:00Z/9".to_string())]);
        assert_eq!(patch.instance_of, vec![("Q7".to_string(), "Q18340514".to_string())]);
    }

    #[test]
    fn extends_both_ends() {
        let mut source = MemorySource::with_entities(&[
            &period_item("Q1990", "1990 in film", Some(1990), None, Some("Q1991")),
            &period_item("Q1991", "1991 in film", Some(1991), Some("Q1990"), None),
            &period_item("Q1989", "1989 in film", Some(1989), None, None),
            &period_item("Q1992", "1992 en cinéma", Some(1992), None, None),
        ]);
        source.add_search("1989 in film", &[("Q1989", "1989 in film")]);
        source.add_search("1992 in film", &[("Q1992", "1992 en cinéma")]);
        let mut cache = EntityCache::new(source);
        let mut config = film_config();
        config.end_id = "Q1991".into();
        config.end = Year(1991);
        let patch = extend_sequence(&mut config, &mut cache).unwrap();
        assert_eq!(config.end, Year(1991));
        assert_eq!(config.start, Year(1989));
        assert_eq!(config.start_id, "Q1989");
        assert_eq!(patch.follows, vec![("Q1990".to_string(), "Q1989".to_string())]);
        assert_eq!(patch.followed_by, vec![("Q1989".to_string(), "Q1990".to_string())]);
    }

    #[test]
    fn saves_sorted_four_space_indent() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("years_auto.json");
        let mut configs = SequenceConfigs::new();
        configs.insert("film".to_string(), film_config());
        save_configs(&path, &configs).unwrap();
        let text = fs::read_to_string(&path).unwrap();
        assert!(text.starts_with("{\n    \"film\": {\n        \"end_id\": \"Q1995\",\n        \"end_year\": 1995,"));
        let back: SequenceConfigs<Year> = load_configs(&path).unwrap();
        assert_eq!(back, configs);
    }

    #[test]
    fn month_gap_across_new_year() {
        let mut source = MemorySource::with_entities(&[
            &month_item("Q11", "November 1999", Some((1999, 11)), None, None),
            &month_item("Q12", "December 1999", Some((1999, 12)), None, None),
            &month_item("Q1", "January 2000", Some((2000, 1)), None, Some("Q2")),
            &month_item("Q2", "February 2000", Some((2000, 2)), Some("Q1"), None),
        ]);
        source.add_search("November 1999", &[("Q11", "November 1999")]);
        source.add_search("December 1999", &[("Q12", "December 1999")]);
        source.add_search("January 2000", &[("Q1", "January 2000")]);
        let mut cache = EntityCache::new(source);
        let config = month_config("Q11", "Q2", (1999, 11), (2000, 2));
        let report = SequenceChecker::new(&mut cache).check(&config).unwrap();
        assert_eq!(report.gap_start.period, Month::new(1999, 11));
        assert_eq!(report.gap_end.id, "Q1");
        assert_eq!(report.gap_end.period, Month::new(2000, 1));
        let terms: Vec<&str> = report.searches.iter().map(|(text, _)| &**text).collect();
        assert_eq!(terms, vec!["October 1999", "November 1999", "December 1999", "January 2000"]);
        assert_eq!(report.ids, vec!["Q11", "Q12", "Q1"]);
        let mut out = vec![];
        report.patch.write_csv(&mut out).unwrap();
        assert_eq!(String::from_utf8(out).unwrap(), "qid,P155\nQ12,Q11\nQ1,Q12\nqid,P156\nQ11,Q12\nQ12,Q1\n");
    }

    #[test]
    fn month_census_uses_month_precision() {
        let mut source = MemorySource::with_entities(&[
            &month_item("Q12", "December 1999", None, None, None),
            &month_item("Q1", "January 2000", Some((2000, 1)), None, None),
        ]);
        source.add_search("December 1999", &[("Q12", "December 1999")]);
        source.add_search("January 2000", &[("Q1", "January 2000")]);
        let mut cache = EntityCache::new(source);
        let config = month_config("Q12", "Q1", (1999, 12), (2000, 1));
        let patch = SequenceChecker::new(&mut cache).census(&config).unwrap();
        assert_eq!(patch.point_in_time, vec![("Q12".to_string(), "+1999-12-01T00:00:00Z/10".to_string())]);
        assert_eq!(patch.instance_of, vec![("Q12".to_string(), "Q18340514".to_string())]);
    }

    #[test]
    fn selects_named_or_all_sequences() {
        let mut configs = SequenceConfigs::new();
        configs.insert("film".to_string(), film_config());
        configs.insert("aviation".to_string(), film_config());
        assert_eq!(select_sequences(&configs, Some("film")).unwrap(), vec!["film"]);
        assert_eq!(select_sequences(&configs, None).unwrap(), vec!["aviation", "film"]);
        assert!(select_sequences(&configs, Some("sports")).is_err());
    }
}
