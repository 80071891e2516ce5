use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::fmt;

use pad::{Alignment, PadStr};
use petgraph::dot::{Config, Dot};
use petgraph::graph::{EdgeReference, Graph, NodeIndex};
use petgraph::visit::EdgeRef;
use petgraph::Direction;

use crate::causegraph::Statement;
use crate::dates::Years;

/// Directed multigraph over QIDs. Edge weights are statement types.
#[derive(Default)]
pub struct QidGraph {
    graph: Graph<String, String>,
    index: HashMap<String, NodeIndex>,
    years: BTreeMap<String, i64>,
}

impl QidGraph {
    pub fn new() -> QidGraph {
        QidGraph::default()
    }

    pub fn from_statements<I, S>(lines: I, years: Option<&Years>) -> QidGraph
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut g = QidGraph::new();
        for line in lines {
            match line.as_ref().parse::<Statement>() {
                Ok(s) => {
                    g.add_statement(&s);
                    if let Some(years) = years {
                        g.set_year_from(&s.src, years);
                        g.set_year_from(&s.dst, years);
                    }
                }
                Err(e) => warn!("error on line: {}", e),
            }
        }
        g
    }

    pub fn from_statement_set(statements: &BTreeSet<Statement>, years: &Years) -> QidGraph {
        let mut g = QidGraph::new();
        for s in statements {
            g.add_statement(s);
            g.set_year_from(&s.src, years);
            g.set_year_from(&s.dst, years);
        }
        g
    }

    fn set_year_from(&mut self, qid: &str, years: &Years) {
        if let Some(y) = years.get(qid) {
            self.years.insert(qid.to_string(), *y);
        }
    }

    pub fn node(&mut self, qid: &str) -> NodeIndex {
        if let Some(ix) = self.index.get(qid) {
            return *ix;
        }
        let ix = self.graph.add_node(qid.to_string());
        self.index.insert(qid.to_string(), ix);
        ix
    }

    pub fn contains(&self, qid: &str) -> bool {
        self.index.contains_key(qid)
    }

    pub fn add_statement(&mut self, s: &Statement) {
        self.add_edge(&s.src, &s.dst, &s.prop)
    }

    pub fn add_edge(&mut self, src: &str, dst: &str, typ: &str) {
        let a = self.node(src);
        let b = self.node(dst);
        self.graph.add_edge(a, b, typ.to_string());
    }

    /// Removes one `src -typ-> dst` edge; false when there was none.
    pub fn remove_edge(&mut self, src: &str, dst: &str, typ: &str) -> bool {
        let (a, b) = match (self.index.get(src), self.index.get(dst)) {
            (Some(a), Some(b)) => (*a, *b),
            _ => return false,
        };
        let found = self.graph.edges_connecting(a, b).find(|e| e.weight() == typ).map(|e| e.id());
        match found {
            Some(edge) => {
                self.graph.remove_edge(edge);
                true
            }
            None => false,
        }
    }

    pub fn node_count(&self) -> usize {
        self.graph.node_count()
    }

    pub fn edge_count(&self) -> usize {
        self.graph.edge_count()
    }

    pub fn year(&self, qid: &str) -> Option<i64> {
        self.years.get(qid).cloned()
    }

    pub fn report(&self) -> GraphReport {
        let mut rel_stats = BTreeMap::new();
        for e in self.graph.edge_references() {
            *rel_stats.entry(e.weight().clone()).or_insert(0) += 1;
        }
        let selfloops = self
            .graph
            .node_indices()
            .filter(|&n| self.graph.edges_connecting(n, n).next().is_some())
            .map(|n| self.graph[n].clone())
            .collect();
        GraphReport { node_count: self.node_count(), edge_count: self.edge_count(), rel_stats, selfloops }
    }

    /// PageRank on the graph with parallel edges collapsed. Scores come in
    /// node insertion order.
    pub fn page_rank(&self, alpha: f64, max_iter: usize, tol: f64) -> Vec<(String, f64)> {
        let n = self.graph.node_count();
        if n == 0 {
            return vec![];
        }
        let out: Vec<Vec<usize>> = self
            .graph
            .node_indices()
            .map(|ix| {
                let targets: BTreeSet<usize> =
                    self.graph.neighbors_directed(ix, Direction::Outgoing).map(|t| t.index()).collect();
                targets.into_iter().collect()
            })
            .collect();
        let uniform = 1.0 / n as f64;
        let mut x = vec![uniform; n];
        let mut converged = false;
        for _ in 0..max_iter {
            let last = x.clone();
            let dangling: f64 = out.iter().zip(&last).filter(|(o, _)| o.is_empty()).map(|(_, v)| v).sum();
            let base = alpha * dangling * uniform + (1.0 - alpha) * uniform;
            x.iter_mut().for_each(|v| *v = base);
            for (node, targets) in out.iter().enumerate() {
                if targets.is_empty() {
                    continue;
                }
                let share = alpha * last[node] / targets.len() as f64;
                for &t in targets {
                    x[t] += share;
                }
            }
            let err: f64 = x.iter().zip(&last).map(|(a, b)| (a - b).abs()).sum();
            if err < n as f64 * tol {
                converged = true;
                break;
            }
        }
        if !converged {
            warn!("pagerank did not converge in {} iterations", max_iter);
        }
        self.graph.node_indices().map(|ix| (self.graph[ix].clone(), x[ix.index()])).collect()
    }

    pub fn to_dot(&self) -> String {
        let edge_attrs =
            |_: &Graph<String, String>, e: EdgeReference<String>| format!("type = {:?} ", e.weight());
        let node_attrs = |_: &Graph<String, String>, (_, qid): (NodeIndex, &String)| match self.years.get(qid) {
            Some(y) => format!("label = {:?} year = {} ", qid, y),
            None => format!("label = {:?} ", qid),
        };
        Dot::with_attr_getters(&self.graph, &[Config::EdgeNoLabel, Config::NodeNoLabel], &edge_attrs, &node_attrs)
            .to_string()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct GraphReport {
    pub node_count: usize,
    pub edge_count: usize,
    pub rel_stats: BTreeMap<String, usize>,
    pub selfloops: Vec<String>,
}

impl fmt::Display for GraphReport {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        writeln!(f, "nodes: {}", self.node_count)?;
        writeln!(f, "edges: {}", self.edge_count)?;
        for (typ, count) in &self.rel_stats {
            writeln!(f, "  {} {}", typ.pad_to_width(8), count.to_string().pad_to_width_with_alignment(10, Alignment::Right))?;
        }
        writeln!(f, "self loops: {}", self.selfloops.join(" "))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> QidGraph {
        let mut years = Years::new();
        years.insert("Q1".into(), 1900);
        QidGraph::from_statements(
            vec!["Q1 P737 Q2", "Q1 P737 Q2", "Q2 P40 Q3", "Q3 P737 Q3", "garbage"],
            Some(&years),
        )
    }

    #[test]
    fn builds_multigraph() {
        let g = sample();
        let report = g.report();
        assert_eq!(report.node_count, 3);
        assert_eq!(report.edge_count, 4);
        assert_eq!(report.rel_stats["P737"], 3);
        assert_eq!(report.selfloops, vec!["Q3".to_string()]);
        assert_eq!(g.year("Q1"), Some(1900));
        assert_eq!(g.year("Q2"), None);
        assert!(report.to_string().contains("self loops: Q3"));
    }

    #[test]
    fn removes_one_typed_edge() {
        let mut g = sample();
        assert!(!g.remove_edge("Q1", "Q2", "P40"));
        assert!(!g.remove_edge("Q1", "Q9", "P737"));
        assert!(g.remove_edge("Q1", "Q2", "P737"));
        assert_eq!(g.edge_count(), 3);
        assert!(g.remove_edge("Q1", "Q2", "P737"));
        assert!(!g.remove_edge("Q1", "Q2", "P737"));
    }

    #[test]
    fn page_rank_sums_to_one() {
        let g = QidGraph::from_statements(vec!["Q1 P737 Q2", "Q1 P737 Q2", "Q3 P737 Q2", "Q2 P737 Q1"], None);
        let pr = g.page_rank(0.85, 100, 1e-6);
        assert_eq!(pr.iter().map(|(q, _)| &**q).collect::<Vec<_>>(), vec!["Q1", "Q2", "Q3"]);
        let total: f64 = pr.iter().map(|(_, s)| s).sum();
        assert!((total - 1.0).abs() < 1e-6);
        assert!(pr[1].1 > pr[0].1 && pr[0].1 > pr[2].1);
        assert!((pr[2].1 - 0.05).abs() < 1e-9);
    }

    #[test]
    fn dot_carries_types_and_years() {
        let dot = sample().to_dot();
        assert!(dot.starts_with("digraph {"));
        assert!(dot.contains("label = \"Q1\" year = 1900"));
        assert!(dot.contains("type = \"P40\""));
    }
}
