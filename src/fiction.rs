//! Closure of the "fictional entity" classes over subclass of (P279).

use std::collections::{BTreeMap, HashMap, HashSet};

use crate::constants::{LANG_ORDER, SUBCLASS_OF};
use crate::wikidata::Entity;

#[derive(Default)]
pub struct FictionFilterBuilder {
    /// superclass → direct subclasses
    subclasses: HashMap<String, Vec<String>>,
    labels: HashMap<String, String>,
    pairs: usize,
}

impl FictionFilterBuilder {
    pub fn new() -> FictionFilterBuilder {
        FictionFilterBuilder::default()
    }

    pub fn process(&mut self, entity: &Entity) {
        if !self.labels.contains_key(&entity.id) {
            if let Some(label) = entity.label(LANG_ORDER) {
                self.labels.insert(entity.id.clone(), label.to_string());
            }
        }
        if entity.is_item() {
            for class in entity.entity_values(SUBCLASS_OF) {
                self.subclasses.entry(class.to_string()).or_default().push(entity.id.clone());
                self.pairs += 1;
            }
        }
    }

    pub fn pair_count(&self) -> usize {
        self.pairs
    }

    /// Roots and all their transitive subclasses.
    pub fn descendency(&self, roots: &[&str]) -> HashSet<String> {
        let mut result: HashSet<String> = HashSet::new();
        let mut queue: Vec<String> = roots.iter().map(|r| r.to_string()).collect();
        while let Some(one) = queue.pop() {
            if result.contains(&one) {
                continue;
            }
            for kid in self.subclasses.get(&one).map(|k| &**k).unwrap_or(&[]) {
                if !result.contains(kid) {
                    queue.push(kid.clone());
                }
            }
            result.insert(one);
        }
        result
    }

    /// `qid → label`, the qid standing in for missing labels.
    pub fn filter(&self, roots: &[&str]) -> BTreeMap<String, String> {
        self.descendency(roots)
            .into_iter()
            .map(|qid| {
                let label = self.labels.get(&qid).cloned().unwrap_or_else(|| qid.clone());
                (qid, label)
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constants::FICTION_ROOTS;

    fn item(id: &str, label: &str, superclasses: &[&str]) -> Entity {
        let claims: Vec<String> = superclasses
            .iter()
            .map(|c| {
                format!(
                    r#"{{"mainsnak":{{"snaktype":"value","property":"P279","datavalue":{{"value":{{"id":"{}"}},"type":"wikibase-entityid"}}}}}}"#,
                    c
                )
            })
            .collect();
        Entity::from_json(&format!(
            r#"{{"type":"item","id":"{}","labels":{{"en":{{"language":"en","value":"{}"}}}},"claims":{{"P279":[{}]}}}}"#,
            id,
            label,
            claims.join(",")
        ))
        .unwrap()
    }

    #[test]
    fn closure_terminates_on_cycles() {
        let mut builder = FictionFilterBuilder::new();
        builder.process(&item("Q24199478", "fictional entity", &["Q35120"]));
        builder.process(&item("Q15632617", "fictional human", &["Q24199478", "Q5"]));
        builder.process(&item("Q100", "fictional wizard", &["Q15632617"]));
        builder.process(&item("Q101", "odd loop", &["Q100"]));
        builder.process(&item("Q15632617", "fictional human", &["Q101"]));
        builder.process(&item("Q5", "human", &["Q35120"]));
        let filter = builder.filter(FICTION_ROOTS);
        assert_eq!(filter.len(), 5);
        assert_eq!(filter["Q100"], "fictional wizard");
        assert_eq!(filter["Q14897293"], "Q14897293");
        assert!(!filter.contains_key("Q5"));
        assert!(!filter.contains_key("Q35120"));
    }
}
