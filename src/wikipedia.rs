//! Wikipedia page dumps: page streaming, wiki links, the category graph, and
//! comparing article links across languages and with Wikidata.

use std::borrow::Cow;
use std::collections::{BTreeMap, BTreeSet, HashSet};
use std::io;
use std::io::prelude::*;

use regex::Regex;
use xml::reader::{EventReader, Events, XmlEvent};

use crate::wikidata::{Entity, EntityRef};
use crate::{WikiResult, WikiResultExt};

pub const ARTICLE_NS: i64 = 0;
pub const CATEGORY_NS: i64 = 14;

/// Pages between two progress reports.
pub const PROGRESS_EVERY: u64 = 100_000;

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Page {
    pub id: u64,
    pub title: String,
    pub ns: i64,
    pub redirect: bool,
    pub text: String,
}

impl Page {
    pub fn is_article(&self) -> bool {
        self.ns == ARTICLE_NS && !self.redirect
    }

    pub fn is_article_or_category(&self) -> bool {
        (self.ns == ARTICLE_NS || self.ns == CATEGORY_NS) && !self.redirect
    }
}

/// Streams the pages of a MediaWiki XML export. Elements are matched by
/// local name, whatever the export schema version.
pub struct PagesFromXml<R: Read> {
    events: Events<R>,
}

impl<R: Read> PagesFromXml<R> {
    pub fn new(input: R) -> PagesFromXml<R> {
        PagesFromXml { events: EventReader::new(input).into_iter() }
    }

    fn consume_page(&mut self) -> WikiResult<Page> {
        let mut page = Page::default();
        while let Some(e) = self.events.next() {
            match e? {
                XmlEvent::StartElement { ref name, .. } if name.local_name == "title" => {
                    page.title = self.consume_string()?;
                }
                XmlEvent::StartElement { ref name, .. } if name.local_name == "ns" => {
                    page.ns = self.consume_string()?.trim().parse()?;
                }
                XmlEvent::StartElement { ref name, .. } if name.local_name == "id" => {
                    page.id = self.consume_string()?.trim().parse()?;
                }
                XmlEvent::StartElement { ref name, .. } if name.local_name == "redirect" => {
                    page.redirect = true;
                }
                XmlEvent::StartElement { ref name, .. } if name.local_name == "revision" => {
                    self.consume_revision(&mut page)?;
                }
                XmlEvent::EndElement { ref name } if name.local_name == "page" => return Ok(page),
                _ => (),
            }
        }
        bail!("eof in page {:?}", page.title)
    }

    fn consume_revision(&mut self, page: &mut Page) -> WikiResult<()> {
        while let Some(e) = self.events.next() {
            match e? {
                XmlEvent::StartElement { ref name, .. } if name.local_name == "text" => {
                    page.text = self.consume_string()?;
                }
                XmlEvent::EndElement { ref name } if name.local_name == "revision" => return Ok(()),
                _ => (),
            }
        }
        bail!("eof in revision of {:?}", page.title)
    }

    fn consume_string(&mut self) -> WikiResult<String> {
        let mut text = String::new();
        while let Some(e) = self.events.next() {
            match e? {
                XmlEvent::Characters(content) | XmlEvent::Whitespace(content) | XmlEvent::CData(content) => {
                    text.push_str(&content)
                }
                XmlEvent::EndElement { .. } => return Ok(text),
                _ => (),
            }
        }
        bail!("eof in text element")
    }
}

impl<R: Read> Iterator for PagesFromXml<R> {
    type Item = WikiResult<Page>;

    fn next(&mut self) -> Option<WikiResult<Page>> {
        while let Some(e) = self.events.next() {
            match e {
                Ok(XmlEvent::StartElement { ref name, .. }) if name.local_name == "page" => {
                    return Some(self.consume_page())
                }
                Ok(_) => (),
                Err(e) => return Some(Err(e.into())),
            }
        }
        None
    }
}

pub struct LinkExtractor {
    templates: Regex,
    links: Regex,
}

impl LinkExtractor {
    pub fn new() -> WikiResult<LinkExtractor> {
        Ok(LinkExtractor { templates: Regex::new(r"\{\{[^\}]*\}\}")?, links: Regex::new(r"\[\[[^\]]*\]\]")? })
    }

    /// Removes innermost templates, the ones holding no `}`.
    pub fn strip_templates<'t>(&self, text: &'t str) -> Cow<'t, str> {
        self.templates.replace_all(text, "")
    }

    /// Targets of `[[target|label]]` links.
    pub fn extract_links<'t>(&self, text: &'t str) -> Vec<&'t str> {
        self.links
            .find_iter(text)
            .map(|m| {
                let inner = m.as_str().trim_matches(&['[', ']'][..]);
                inner.split('|').next().unwrap_or(inner)
            })
            .collect()
    }

    pub fn page_links(&self, page: &Page) -> Vec<String> {
        let text = self.strip_templates(&page.text);
        self.extract_links(&text).into_iter().map(|l| l.to_string()).collect()
    }
}

/// Writes `title | target` for every link of every article. Returns the
/// number of articles.
pub fn write_article_links<R: Read, W: Write>(pages: PagesFromXml<R>, mut out: W) -> WikiResult<u64> {
    let extractor = LinkExtractor::new()?;
    let mut count = 0u64;
    for page in pages {
        let page = page?;
        if !page.is_article() {
            continue;
        }
        for link in extractor.page_links(&page) {
            writeln!(out, "{} | {}", page.title, link)?;
        }
        count += 1;
        if count % PROGRESS_EVERY == 0 {
            info!("{} articles done at {}", count, page.title);
        }
    }
    out.flush()?;
    Ok(count)
}

/// QIDs ordered by numeric id, so each unordered pair has one spelling.
pub fn ordered_pair(a: &str, b: &str) -> (String, String) {
    let n = |q: &str| EntityRef::from_id(q).map(|e| e.numeric());
    if n(a) <= n(b) {
        (a.to_string(), b.to_string())
    } else {
        (b.to_string(), a.to_string())
    }
}

/// Category membership links between articles and categories, as QID
/// pairs.
pub struct CategoryGraph {
    cat_prefix: String,
    extractor: LinkExtractor,
    titles: HashSet<String>,
    links: Vec<(String, String)>,
    pages: u64,
}

impl CategoryGraph {
    pub fn new(cat_prefix: &str) -> WikiResult<CategoryGraph> {
        Ok(CategoryGraph {
            cat_prefix: cat_prefix.to_string(),
            extractor: LinkExtractor::new()?,
            titles: HashSet::new(),
            links: vec![],
            pages: 0,
        })
    }

    pub fn process(&mut self, page: &Page) {
        if !page.is_article_or_category() {
            return;
        }
        self.titles.insert(page.title.clone());
        for link in self.extractor.page_links(page) {
            if link.starts_with(&*self.cat_prefix) {
                self.links.push((page.title.clone(), link));
            }
        }
        self.pages += 1;
        if self.pages % PROGRESS_EVERY == 0 {
            info!("{} pages done at {}", self.pages, page.title);
        }
    }

    /// Links to known pages whose both ends have a QID.
    pub fn qid_pairs(&self, qids: &BTreeMap<String, String>) -> BTreeSet<(String, String)> {
        self.links
            .iter()
            .filter(|(_, target)| self.titles.contains(target))
            .filter_map(|(a, b)| Some(ordered_pair(qids.get(a)?, qids.get(b)?)))
            .collect()
    }
}

pub fn write_pairs<'a, W, I>(mut out: W, pairs: I) -> WikiResult<()>
where
    W: Write,
    I: IntoIterator<Item = &'a (String, String)>,
{
    for (a, b) in pairs {
        writeln!(out, "{} | {}", a, b)?;
    }
    Ok(())
}

/// Sitelink titles and item-to-item pairs from a Wikidata dump, to compare
/// against Wikipedia links.
#[derive(Default)]
pub struct WikidataPairs {
    /// lang → title → qid
    pub labels: BTreeMap<String, BTreeMap<String, String>>,
    pub pairs: BTreeSet<(String, String)>,
}

impl WikidataPairs {
    pub fn process(&mut self, entity: &Entity, langs: &[&str]) {
        for (lang, title) in entity.sitelink_labels(langs) {
            self.labels.entry(lang.to_string()).or_default().insert(title.to_string(), entity.id.clone());
        }
        if entity.is_item_or_lexeme() {
            for (_, other) in item_claims(entity) {
                self.pairs.insert(ordered_pair(&entity.id, other));
            }
        }
    }
}

/// `(prop, target)` of every wikibase-item valued claim.
pub fn item_claims<'a>(entity: &'a Entity) -> impl Iterator<Item = (&'a str, &'a str)> + 'a {
    entity.claims.iter().flat_map(|(prop, claims)| {
        claims
            .iter()
            .filter(|c| c.mainsnak.datatype.as_deref() == Some("wikibase-item"))
            .filter_map(move |c| c.mainsnak.entity_id().map(|id| (&**prop, id)))
    })
}

/// Line oriented dump preprocessing: `title | qid` per language and
/// `qid | prop | target` statements.
pub struct Preprocessed {
    pub labels: Vec<(String, String)>,
    pub statements: Vec<String>,
}

pub fn preprocess(entity: &Entity, langs: &[&str]) -> Preprocessed {
    let labels = entity
        .sitelink_labels(langs)
        .into_iter()
        .map(|(lang, title)| (lang.to_string(), format!("{} | {}", title, entity.id)))
        .collect();
    let statements = if entity.is_item_or_lexeme() {
        let unique: BTreeSet<String> =
            item_claims(entity).map(|(prop, other)| format!("{} | {} | {}", entity.id, prop, other)).collect();
        unique.into_iter().collect()
    } else {
        vec![]
    };
    Preprocessed { labels, statements }
}

pub fn read_line_set<R: BufRead>(input: R) -> WikiResult<BTreeSet<String>> {
    let mut set = BTreeSet::new();
    for line in input.lines() {
        let line = line?;
        let line = line.trim_end();
        if !line.is_empty() {
            set.insert(line.to_string());
        }
    }
    Ok(set)
}

/// Intersection and union of per-language link sets.
pub fn combine(sets: &[BTreeSet<String>]) -> (BTreeSet<String>, BTreeSet<String>) {
    let mut iter = sets.iter();
    let first = match iter.next() {
        Some(first) => first.clone(),
        None => return (BTreeSet::new(), BTreeSet::new()),
    };
    let mut intersection = first.clone();
    let mut union = first;
    for set in iter {
        intersection.retain(|l| set.contains(l));
        union.extend(set.iter().cloned());
    }
    (intersection, union)
}

/// Links in `links` Wikidata does not have, and those of them with no end
/// in `filter`.
pub fn missing_from_wikidata(
    links: &BTreeSet<String>,
    statements: &BTreeSet<String>,
    filter: &HashSet<String>,
) -> (BTreeSet<String>, BTreeSet<String>) {
    let missing: BTreeSet<String> = links.difference(statements).cloned().collect();
    let filtered = missing
        .iter()
        .filter(|l| {
            let mut ends = l.split(" | ");
            !ends.any(|end| filter.contains(end.trim()))
        })
        .cloned()
        .collect();
    (missing, filtered)
}

pub fn open_link_file(path: &str) -> WikiResult<Option<BTreeSet<String>>> {
    match std::fs::File::open(path) {
        Ok(file) => Ok(Some(read_line_set(io::BufReader::new(file)).chain_err(|| format!("reading {}", path))?)),
        Err(ref e) if e.kind() == io::ErrorKind::NotFound => {
            warn!("{} file not found", path);
            Ok(None)
        }
        Err(e) => Err(e.into()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const EXPORT: &str = r#"<mediawiki xmlns="http://www.mediawiki.org/xml/export-0.10/" version="0.10">
  <siteinfo><sitename>Wikipedia</sitename></siteinfo>
  <page>
    <title>Douglas Adams</title>
    <ns>0</ns>
    <id>8091</id>
    <revision>
      <id>1</id>
      <contributor><username>x</username><id>7</id></contributor>
      <text xml:space="preserve">{{Infobox writer|name=[[Douglas Adams]]}}An [[England|English]] author of [[The Hitchhiker's Guide to the Galaxy]].
[[Category:English novelists]]</text>
    </revision>
  </page>
  <page>
    <title>Adams, Douglas</title>
    <ns>0</ns>
    <id>8092</id>
    <redirect title="Douglas Adams" />
    <revision><id>2</id><text>#REDIRECT [[Douglas Adams]]</text></revision>
  </page>
  <page>
    <title>Category:English novelists</title>
    <ns>14</ns>
    <id>9000</id>
    <revision><id>3</id><text>[[Category:Novelists]]</text></revision>
  </page>
</mediawiki>"#;

    fn pages() -> Vec<Page> {
        PagesFromXml::new(io::Cursor::new(EXPORT)).collect::<WikiResult<_>>().unwrap()
    }

    #[test]
    fn streams_pages() {
        let pages = pages();
        assert_eq!(pages.len(), 3);
        assert_eq!(pages[0].id, 8091);
        assert!(pages[0].is_article());
        assert!(pages[1].redirect);
        assert!(!pages[1].is_article());
        assert_eq!(pages[2].ns, CATEGORY_NS);
    }

    #[test]
    fn links_skip_templates() {
        let extractor = LinkExtractor::new().unwrap();
        let links = extractor.page_links(&pages()[0]);
        assert_eq!(links, vec!["England", "The Hitchhiker's Guide to the Galaxy", "Category:English novelists"]);
    }

    #[test]
    fn writes_article_links() {
        let mut out = vec![];
        let count = write_article_links(PagesFromXml::new(io::Cursor::new(EXPORT)), &mut out).unwrap();
        assert_eq!(count, 1);
        assert!(String::from_utf8(out).unwrap().starts_with("Douglas Adams | England\n"));
    }

    #[test]
    fn category_pairs() {
        let mut graph = CategoryGraph::new("Category:").unwrap();
        for page in pages() {
            graph.process(&page);
        }
        let mut qids = BTreeMap::new();
        qids.insert("Douglas Adams".to_string(), "Q42".to_string());
        qids.insert("Category:English novelists".to_string(), "Q7".to_string());
        let pairs = graph.qid_pairs(&qids);
        assert_eq!(pairs.into_iter().collect::<Vec<_>>(), vec![("Q7".to_string(), "Q42".to_string())]);
    }

    #[test]
    fn wikidata_pairs_and_preproc() {
        let e = Entity::from_json(crate::wikidata::tests::DOUGLAS).unwrap();
        let mut wd = WikidataPairs::default();
        wd.process(&e, &["en", "de"]);
        assert_eq!(wd.labels["de"]["Douglas Adams (Autor)"], "Q42");
        assert!(wd.pairs.contains(&("Q1".to_string(), "Q42".to_string())));
        assert!(wd.pairs.contains(&("Q5".to_string(), "Q42".to_string())));
        assert!(wd.pairs.contains(&("Q42".to_string(), "Q691283".to_string())));
        let pre = preprocess(&e, &["en", "de"]);
        assert_eq!(pre.labels, vec![("de".to_string(), "Douglas Adams (Autor) | Q42".to_string())]);
        assert!(pre.statements.contains(&"Q42 | P737 | Q1".to_string()));
        assert_eq!(pre.statements.len(), 3);
    }

    #[test]
    fn combines_languages() {
        let en: BTreeSet<String> = ["Q1 | Q2", "Q1 | Q3", "Q4 | Q5"].iter().map(|s| s.to_string()).collect();
        let de: BTreeSet<String> = ["Q1 | Q2", "Q4 | Q5", "Q6 | Q7"].iter().map(|s| s.to_string()).collect();
        let (inter, union) = combine(&[en, de]);
        assert_eq!(inter.len(), 2);
        assert_eq!(union.len(), 4);
        let statements: BTreeSet<String> = ["Q1 | Q2".to_string()].into_iter().collect();
        let filter: HashSet<String> = ["Q5".to_string()].into_iter().collect();
        let (missing, filtered) = missing_from_wikidata(&inter, &statements, &filter);
        assert_eq!(missing.len(), 1);
        assert!(filtered.is_empty());
    }
}
