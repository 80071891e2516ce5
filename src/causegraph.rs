//! Cause graph extraction from a Wikidata dump: nodes, labels, dates and the
//! directed statements between real (non fictional) items.

use std::collections::{BTreeMap, BTreeSet, HashSet};
use std::fmt;
use std::io::prelude::*;
use std::path::Path;
use std::str::FromStr;

use crate::constants::{self, is_cg_rel, is_likely_nonspecific, INSTANCE_OF, LANG_ORDER, SUBCLASS_OF};
use crate::dates::{self, DateClaims, Years};
use crate::wikidata::Entity;
use crate::{helpers, WikiError, WikiErrorKind, WikiResult};

#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Statement {
    pub src: String,
    pub prop: String,
    pub dst: String,
}

impl Statement {
    pub fn new(src: &str, prop: &str, dst: &str) -> Statement {
        Statement { src: src.to_string(), prop: prop.to_string(), dst: dst.to_string() }
    }
}

impl fmt::Display for Statement {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{} {} {}", self.src, self.prop, self.dst)
    }
}

impl FromStr for Statement {
    type Err = WikiError;

    fn from_str(line: &str) -> WikiResult<Statement> {
        let fields: Vec<&str> = line.split_whitespace().collect();
        if fields.len() != 3 {
            bail!(WikiErrorKind::MalformedLine(line.to_string()));
        }
        Ok(Statement::new(fields[0], fields[1], fields[2]))
    }
}

pub fn read_statements<P: AsRef<Path>>(path: P) -> WikiResult<Vec<Statement>> {
    let mut statements = vec![];
    for line in helpers::read_lines(path)? {
        match line.parse() {
            Ok(s) => statements.push(s),
            Err(e) => warn!("{}", e),
        }
    }
    Ok(statements)
}

/// False when the item is an instance of a filtered class, or a subclass of
/// one without being filtered itself.
pub fn is_real(qid: &str, entity: &Entity, fiction_filter: &HashSet<String>) -> bool {
    if entity.has_claim(INSTANCE_OF) {
        !entity.entity_values(INSTANCE_OF).any(|class| fiction_filter.contains(class))
    } else if entity.has_claim(SUBCLASS_OF) {
        let fictional = entity.entity_values(SUBCLASS_OF).any(|class| fiction_filter.contains(class))
            && !fiction_filter.contains(qid);
        if fictional {
            info!("new fictional class: {}", qid);
        }
        !fictional
    } else {
        true
    }
}

#[derive(Default)]
pub struct CauseGraphBuilder {
    fiction_filter: HashSet<String>,
    pub nodes: BTreeSet<String>,
    pub labels: BTreeMap<String, String>,
    pub date_claims: DateClaims,
    pub statements: Vec<Statement>,
}

impl CauseGraphBuilder {
    pub fn new(fiction_filter: HashSet<String>) -> CauseGraphBuilder {
        CauseGraphBuilder { fiction_filter, ..CauseGraphBuilder::default() }
    }

    pub fn process(&mut self, entity: &Entity) {
        let qid = &entity.id;
        if !self.labels.contains_key(qid) {
            if let Some(label) = entity.label(LANG_ORDER) {
                self.labels.insert(qid.clone(), label.to_string());
            }
        }
        if !entity.is_item() || !is_real(qid, entity, &self.fiction_filter) {
            return;
        }
        if entity.claims.keys().any(|prop| is_cg_rel(prop)) {
            self.nodes.insert(qid.clone());
        }
        for (prop, target) in entity.relations() {
            if is_cg_rel(prop) {
                self.nodes.insert(target.to_string());
                self.statements.push(Statement::new(qid, prop, target));
            }
        }
        let mut dates = dates::date_claims(entity);
        dates.extend(dates::nested_date_claims(entity));
        if !dates.is_empty() {
            self.date_claims.insert(qid.clone(), dates);
        }
    }

    /// Years of graph nodes only.
    pub fn node_years(&self, years: &Years) -> Years {
        years
            .iter()
            .filter(|(qid, _)| self.nodes.contains(*qid))
            .map(|(qid, y)| (qid.clone(), *y))
            .collect()
    }
}

/// Points the statement in its canonical direction.
pub fn direct(statement: &Statement) -> Statement {
    match constants::inverse_of(&statement.prop) {
        Some(inverse) => Statement::new(&statement.dst, inverse, &statement.src),
        None => statement.clone(),
    }
}

pub fn dedupe_and_direct(statements: &[Statement]) -> BTreeSet<Statement> {
    info!("starting dedupe_and_direct with {} statements", statements.len());
    let result: BTreeSet<Statement> = statements.iter().map(direct).collect();
    info!("finishing dedupe_and_direct with {} statements", result.len());
    result
}

/// Drops generic causal statements ("cause of") where neither end is dated.
pub fn specific_only(statements: &BTreeSet<Statement>, years: &Years) -> BTreeSet<Statement> {
    statements
        .iter()
        .filter(|s| {
            !is_likely_nonspecific(&s.prop) || years.contains_key(&s.src) || years.contains_key(&s.dst)
        })
        .cloned()
        .collect()
}

pub fn write_statements<'a, W, I>(mut out: W, statements: I) -> WikiResult<()>
where
    W: Write,
    I: IntoIterator<Item = &'a Statement>,
{
    for s in statements {
        writeln!(out, "{}", s)?;
    }
    Ok(())
}

pub fn write_arangodb_nodes<W: Write>(
    mut out: W,
    nodes: &BTreeSet<String>,
    labels: &BTreeMap<String, String>,
    years: &Years,
) -> WikiResult<()> {
    writeln!(out, "_key\tname\tlabel\tdate")?;
    for node in nodes {
        let label = labels.get(node).unwrap_or(node);
        let date = years.get(node).map(|y| y.to_string()).unwrap_or_else(|| "null".to_string());
        writeln!(out, "{}\t{}\tArticle\t{}", node, label, date)?;
    }
    Ok(())
}

pub fn write_arangodb_rels<W: Write>(mut out: W, statements: &BTreeSet<Statement>) -> WikiResult<()> {
    writeln!(out, "_from\t_to\ttype")?;
    for s in statements {
        writeln!(out, "{}\t{}\t{}", s.src, s.dst, s.prop)?;
    }
    Ok(())
}

pub fn write_neo4j_nodes<W: Write>(
    mut out: W,
    nodes: &BTreeSet<String>,
    labels: &BTreeMap<String, String>,
) -> WikiResult<()> {
    writeln!(out, ":ID\tname\t:LABEL")?;
    for node in nodes {
        let label = labels.get(node).unwrap_or(node);
        writeln!(out, "{}\t|{}|\tArticle", node, label)?;
    }
    Ok(())
}

pub fn write_neo4j_rels<W: Write>(mut out: W, statements: &BTreeSet<Statement>) -> WikiResult<()> {
    writeln!(out, ":START_ID\t:END_ID\t:TYPE")?;
    for s in statements {
        writeln!(out, "{}\t{}\t{}", s.src, s.dst, s.prop)?;
    }
    Ok(())
}

/// Keys of a JSON object file, such as the fiction filter.
pub fn load_item_filter<P: AsRef<Path>>(path: P) -> WikiResult<HashSet<String>> {
    let map: BTreeMap<String, serde_json::Value> = helpers::read_json(path)?;
    Ok(map.into_keys().collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::wikidata::tests::DOUGLAS;

    fn filter(ids: &[&str]) -> HashSet<String> {
        ids.iter().map(|s| s.to_string()).collect()
    }

    const DRAGON: &str = r#"{"type":"item","id":"Q7559","claims":{"P279":[{"mainsnak":{"snaktype":"value","property":"P279","datavalue":{"value":{"id":"Q24199478"},"type":"wikibase-entityid"}},"rank":"normal"}]}}"#;

    #[test]
    fn fiction_check() {
        let douglas = Entity::from_json(DOUGLAS).unwrap();
        assert!(is_real("Q42", &douglas, &filter(&["Q24199478"])));
        assert!(!is_real("Q42", &douglas, &filter(&["Q5"])));
        let dragon = Entity::from_json(DRAGON).unwrap();
        assert!(!is_real("Q7559", &dragon, &filter(&["Q24199478"])));
        assert!(is_real("Q7559", &dragon, &filter(&["Q24199478", "Q7559"])));
    }

    #[test]
    fn builder_collects_graph() {
        let mut builder = CauseGraphBuilder::new(filter(&["Q24199478"]));
        builder.process(&Entity::from_json(DOUGLAS).unwrap());
        builder.process(&Entity::from_json(DRAGON).unwrap());
        assert_eq!(builder.nodes, ["Q1", "Q42"].iter().map(|s| s.to_string()).collect());
        assert_eq!(builder.statements, vec![Statement::new("Q42", "P737", "Q1")]);
        assert_eq!(builder.labels["Q42"], "Douglas Adams");
        assert_eq!(builder.date_claims["Q42"].len(), 2);
        assert!(!builder.date_claims.contains_key("Q7559"));
    }

    #[test]
    fn direct_and_filter() {
        let statements = vec![
            Statement::new("Q2", "P22", "Q1"),
            Statement::new("Q1", "P40", "Q2"),
            Statement::new("Q3", "P828", "Q4"),
            Statement::new("Q5", "P1542", "Q6"),
        ];
        let directed = dedupe_and_direct(&statements);
        assert_eq!(directed.len(), 3);
        assert!(directed.contains(&Statement::new("Q1", "P40", "Q2")));
        assert!(directed.contains(&Statement::new("Q4", "P1542", "Q3")));
        let mut years = Years::new();
        years.insert("Q3".into(), 1900);
        let specific = specific_only(&directed, &years);
        assert_eq!(specific.len(), 2);
        assert!(!specific.contains(&Statement::new("Q5", "P1542", "Q6")));
    }

    #[test]
    fn statement_lines() {
        assert_eq!("Q1 P737 Q2".parse::<Statement>().unwrap(), Statement::new("Q1", "P737", "Q2"));
        assert!("Q1 P737".parse::<Statement>().is_err());
    }

    #[test]
    fn tsv_writers() {
        let nodes: BTreeSet<String> = ["Q1", "Q2"].iter().map(|s| s.to_string()).collect();
        let mut labels = BTreeMap::new();
        labels.insert("Q1".to_string(), "universe".to_string());
        let mut years = Years::new();
        years.insert("Q2".into(), 1987);
        let mut out = vec![];
        write_arangodb_nodes(&mut out, &nodes, &labels, &years).unwrap();
        assert_eq!(
            String::from_utf8(out).unwrap(),
            "_key\tname\tlabel\tdate\nQ1\tuniverse\tArticle\tnull\nQ2\tQ2\tArticle\t1987\n"
        );
        let mut out = vec![];
        write_neo4j_nodes(&mut out, &nodes, &labels).unwrap();
        assert!(String::from_utf8(out).unwrap().contains("Q1\t|universe|\tArticle\n"));
        let statements: BTreeSet<Statement> = vec![Statement::new("Q1", "P737", "Q2")].into_iter().collect();
        let mut out = vec![];
        write_arangodb_rels(&mut out, &statements).unwrap();
        assert_eq!(String::from_utf8(out).unwrap(), "_from\t_to\ttype\nQ1\tQ2\tP737\n");
    }

    #[test]
    fn item_filter_keys() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("filter.json");
        std::fs::write(&path, r#"{"Q24199478": "fictional entity", "Q14897293": "mythical entity"}"#).unwrap();
        let f = load_item_filter(&path).unwrap();
        assert!(f.contains("Q14897293"));
        assert_eq!(f.len(), 2);
    }
}
