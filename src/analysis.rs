//! Small reports over wd2cg outputs.

use std::collections::BTreeMap;

use crate::dates::Years;

/// Graph labels rewritten as `"<wikidata label> - qid"` when the label is
/// known.
pub fn fix_labels(graph_labels: &[String], wd_labels: &BTreeMap<String, String>) -> Vec<String> {
    graph_labels
        .iter()
        .map(|qid| match wd_labels.get(qid) {
            Some(label) => format!("{} - {}", label, qid),
            None => qid.clone(),
        })
        .collect()
}

/// Undated nodes whose score reaches the best seen so far, in scan order.
/// The last one is the most central undated node.
pub fn undated_leaders(scores: &[(String, f64)], years: &Years) -> Vec<(String, f64)> {
    let mut best = 0.0;
    let mut leaders = vec![];
    for (qid, score) in scores {
        if *score >= best && !years.contains_key(qid) {
            best = *score;
            leaders.push((qid.clone(), *score));
        }
    }
    leaders
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn labels_get_qid_suffix() {
        let wd: BTreeMap<String, String> = vec![("Q42".to_string(), "Douglas Adams".to_string())].into_iter().collect();
        let fixed = fix_labels(&["Q42".to_string(), "Q1".to_string()], &wd);
        assert_eq!(fixed, vec!["Douglas Adams - Q42", "Q1"]);
    }

    #[test]
    fn running_maximum_skips_dated() {
        let scores: Vec<(String, f64)> = vec![("Q1", 0.2), ("Q2", 0.1), ("Q3", 0.5), ("Q4", 0.3), ("Q5", 0.5)]
            .into_iter()
            .map(|(q, s)| (q.to_string(), s))
            .collect();
        let years: Years = vec![("Q3".to_string(), 1900)].into_iter().collect();
        let leaders = undated_leaders(&scores, &years);
        assert_eq!(leaders.iter().map(|(q, _)| &**q).collect::<Vec<_>>(), vec!["Q1", "Q4", "Q5"]);
    }
}
