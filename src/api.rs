//! Blocking client for the Wikidata action API, and the fetch-once entity
//! cache the sequence and back edge jobs work from.

use std::collections::{BTreeMap, HashSet};
use std::path::Path;
use std::thread;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::wikidata::{Entity, MonolingualText};
use crate::{helpers, WikiErrorKind, WikiResult, WikiResultExt};

pub const API_URL: &str = "https://www.wikidata.org/w/api.php";

/// Documented maximum number of ids per `wbgetentities` call.
pub const QUERY_LIMIT: usize = 50;

pub const DEFAULT_USER_AGENT: &str = concat!("causegraph/", env!("CARGO_PKG_VERSION"));

#[derive(Debug, Deserialize)]
struct GetEntitiesResponse {
    #[serde(default)]
    success: i64,
    #[serde(default)]
    entities: BTreeMap<String, Entity>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SearchInfo {
    pub search: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SearchDisplay {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<MonolingualText>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchHit {
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub display: Option<SearchDisplay>,
}

impl SearchHit {
    pub fn display_label(&self) -> Option<&str> {
        self.display
            .as_ref()
            .and_then(|d| d.label.as_ref())
            .map(|l| &*l.value)
            .or(self.label.as_deref())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SearchResponse {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub searchinfo: Option<SearchInfo>,
    #[serde(default)]
    pub search: Vec<SearchHit>,
}

impl SearchResponse {
    /// The single id this search resolves to: the only hit, or among several
    /// hits the one whose label is exactly the searched text.
    pub fn resolve(&self, searched: &str) -> Option<&str> {
        match self.search.len() {
            0 => None,
            1 => Some(&*self.search[0].id),
            _ => self
                .search
                .iter()
                .find(|hit| hit.display_label() == Some(searched))
                .map(|hit| &*hit.id),
        }
    }
}

pub trait EntitySource {
    fn get_entities(&self, ids: &[String]) -> WikiResult<BTreeMap<String, Entity>>;
    fn search(&self, term: &str, lang: &str) -> WikiResult<SearchResponse>;
}

pub struct WikidataApi {
    client: reqwest::blocking::Client,
    endpoint: String,
    throttle: Duration,
}

impl WikidataApi {
    pub fn new(user_agent: &str) -> WikiResult<WikidataApi> {
        let client = reqwest::blocking::Client::builder().user_agent(user_agent).build()?;
        Ok(WikidataApi { client, endpoint: API_URL.to_string(), throttle: Duration::from_millis(100) })
    }

    /// Pause taken before every request.
    pub fn with_throttle(mut self, throttle: Duration) -> WikidataApi {
        self.throttle = throttle;
        self
    }

    fn call(&self, params: &[(&str, &str)]) -> WikiResult<String> {
        thread::sleep(self.throttle);
        debug!("GET {} {:?}", self.endpoint, params);
        let body = self
            .client
            .get(&self.endpoint)
            .query(&[("format", "json")])
            .query(params)
            .send()?
            .error_for_status()?
            .text()?;
        debug!("{}", body);
        Ok(body)
    }
}

fn parse_get_entities(body: &str) -> WikiResult<BTreeMap<String, Entity>> {
    let response: GetEntitiesResponse =
        serde_json::from_str(body).chain_err(|| WikiErrorKind::ApiFailure("wbgetentities".into()))?;
    if response.success != 1 {
        bail!(WikiErrorKind::ApiFailure("wbgetentities".into()));
    }
    Ok(response.entities)
}

impl EntitySource for WikidataApi {
    fn get_entities(&self, ids: &[String]) -> WikiResult<BTreeMap<String, Entity>> {
        let mut result = BTreeMap::new();
        for chunk in ids.chunks(QUERY_LIMIT) {
            let joined = chunk.join("|");
            let body = self.call(&[("action", "wbgetentities"), ("ids", &joined)])?;
            result.extend(parse_get_entities(&body)?);
        }
        Ok(result)
    }

    fn search(&self, term: &str, lang: &str) -> WikiResult<SearchResponse> {
        let body = self.call(&[("action", "wbsearchentities"), ("search", term), ("language", lang)])?;
        Ok(serde_json::from_str(&body)
            .chain_err(|| WikiErrorKind::ApiFailure(format!("wbsearchentities {:?}", term)))?)
    }
}

/// Entities fetched so far, keyed by id. Each id is requested at most once,
/// including ids the API reports missing.
pub struct EntityCache<S: EntitySource> {
    source: S,
    entities: BTreeMap<String, Entity>,
    batch_pause: Duration,
}

impl<S: EntitySource> EntityCache<S> {
    pub fn new(source: S) -> EntityCache<S> {
        EntityCache { source, entities: BTreeMap::new(), batch_pause: Duration::from_secs(0) }
    }

    /// Pause between consecutive batches of a multi-batch fetch.
    pub fn with_batch_pause(mut self, pause: Duration) -> EntityCache<S> {
        self.batch_pause = pause;
        self
    }

    pub fn source(&self) -> &S {
        &self.source
    }

    /// Seeds the cache, typically from a saved `entities_full.json`.
    pub fn preload(&mut self, entities: BTreeMap<String, Entity>) {
        self.entities.extend(entities);
    }

    pub fn fetch(&mut self, ids: &[String]) -> WikiResult<()> {
        let mut seen = HashSet::new();
        let wanted: Vec<String> = ids
            .iter()
            .filter(|id| !self.entities.contains_key(*id) && seen.insert(*id))
            .cloned()
            .collect();
        for (i, chunk) in wanted.chunks(QUERY_LIMIT).enumerate() {
            if i > 0 {
                thread::sleep(self.batch_pause);
            }
            let fetched = self.source.get_entities(chunk)?;
            for id in chunk {
                if !fetched.contains_key(id) {
                    warn!("{} absent from api response", id);
                }
            }
            self.entities.extend(fetched);
        }
        Ok(())
    }

    pub fn get(&mut self, id: &str) -> WikiResult<&Entity> {
        if !self.entities.contains_key(id) {
            self.fetch(&[id.to_string()])?;
        }
        match self.entities.get(id) {
            Some(e) if !e.is_missing() => Ok(e),
            _ => bail!(WikiErrorKind::MissingEntity(id.to_string())),
        }
    }

    pub fn peek(&self, id: &str) -> Option<&Entity> {
        self.entities.get(id).filter(|e| !e.is_missing())
    }

    pub fn entities(&self) -> &BTreeMap<String, Entity> {
        &self.entities
    }

    pub fn save<P: AsRef<Path>>(&self, path: P) -> WikiResult<()> {
        helpers::write_json(path, &self.entities)
    }
}
