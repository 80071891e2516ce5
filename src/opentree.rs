//! Open Tree of Life synthetic trees: Newick parsing, OTT labels, and dot
//! export.

use std::collections::BTreeMap;

use petgraph::dot::{Config, Dot};
use petgraph::graph::{Graph, NodeIndex};

use crate::WikiResult;

#[derive(Debug, Clone, PartialEq, Default)]
pub struct Node {
    pub name: Option<String>,
    pub length: Option<f64>,
    pub parent: Option<usize>,
}

/// Nodes in document order; the root is node 0.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Tree {
    pub nodes: Vec<Node>,
}

impl Tree {
    fn add_child(&mut self, parent: Option<usize>) -> usize {
        self.nodes.push(Node { parent, ..Node::default() });
        self.nodes.len() - 1
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn children(&self, ix: usize) -> impl Iterator<Item = usize> + '_ {
        self.nodes.iter().enumerate().filter(move |(_, n)| n.parent == Some(ix)).map(|(i, _)| i)
    }

    /// Node name, or a synthetic `clade<ix>` for unnamed clades.
    pub fn node_id(&self, ix: usize) -> String {
        match self.nodes[ix].name {
            Some(ref name) => name.clone(),
            None => format!("clade{}", ix),
        }
    }

    /// Parent to child edges, weighted by branch length.
    pub fn to_graph(&self) -> Graph<String, f64> {
        let mut graph = Graph::with_capacity(self.nodes.len(), self.nodes.len());
        let ixs: Vec<NodeIndex> = (0..self.nodes.len()).map(|i| graph.add_node(self.node_id(i))).collect();
        for (i, node) in self.nodes.iter().enumerate() {
            if let Some(p) = node.parent {
                graph.add_edge(ixs[p], ixs[i], node.length.unwrap_or(0.0));
            }
        }
        graph
    }

    pub fn to_dot(&self) -> String {
        Dot::with_config(&self.to_graph(), &[Config::EdgeNoLabel]).to_string()
    }
}

fn flush_label(tree: &mut Tree, current: usize, label: &mut String, in_length: &mut bool) -> WikiResult<()> {
    let text = label.trim();
    if *in_length {
        if !text.is_empty() {
            let length = text.parse::<f64>().map_err(|_| format!("bad branch length {:?}", text))?;
            tree.nodes[current].length = Some(length);
        }
    } else if !text.is_empty() {
        tree.nodes[current].name = Some(text.to_string());
    }
    label.clear();
    *in_length = false;
    Ok(())
}

/// Parses one Newick tree. Works with an explicit cursor instead of
/// recursion, so tree depth is only limited by memory.
pub fn parse_newick(text: &str) -> WikiResult<Tree> {
    let mut tree = Tree::default();
    let mut current = tree.add_child(None);
    let mut label = String::new();
    let mut in_length = false;
    let mut depth = 0usize;
    let mut chars = text.chars().peekable();
    while let Some(c) = chars.next() {
        match c {
            '(' => {
                depth += 1;
                current = tree.add_child(Some(current));
            }
            ',' => {
                flush_label(&mut tree, current, &mut label, &mut in_length)?;
                let parent = tree.nodes[current].parent;
                if parent.is_none() {
                    bail!("comma outside of any clade");
                }
                current = tree.add_child(parent);
            }
            ')' => {
                flush_label(&mut tree, current, &mut label, &mut in_length)?;
                current = match (tree.nodes[current].parent, depth) {
                    (Some(p), d) if d > 0 => p,
                    _ => bail!("unbalanced closing parenthesis"),
                };
                depth -= 1;
            }
            ':' => {
                flush_label(&mut tree, current, &mut label, &mut in_length)?;
                in_length = true;
            }
            ';' => {
                flush_label(&mut tree, current, &mut label, &mut in_length)?;
                if depth != 0 {
                    bail!("{} unclosed parentheses", depth);
                }
                return Ok(tree);
            }
            '[' => {
                for c in chars.by_ref() {
                    if c == ']' {
                        break;
                    }
                }
            }
            '\'' => loop {
                match chars.next() {
                    Some('\'') if chars.peek() == Some(&'\'') => {
                        chars.next();
                        label.push('\'');
                    }
                    Some('\'') => break,
                    Some(c) => label.push(c),
                    None => bail!("unterminated quoted label"),
                }
            },
            c if c.is_whitespace() => (),
            c => label.push(c),
        }
    }
    bail!("missing ';' at end of tree")
}

/// `(key, label)` for an OTT node name: `Homo_sapiens_ott770315` and
/// `'Homo sapiens ott770315'` give `("ott770315", "Homo sapiens - 770315")`,
/// `mrcaott1ott2` gives itself and `"mrca - 1 - 2"`.
pub fn make_label(name: &str) -> Option<(String, String)> {
    if name.starts_with("mrcaott") {
        return Some((name.to_string(), name.replace("ott", " - ")));
    }
    let split = name.rfind(|c: char| c == ' ' || c == '_')?;
    let (taxon, ott) = (&name[..split], &name[split + 1..]);
    let id = ott.strip_prefix("ott")?;
    Some((ott.to_string(), format!("{} - {}", taxon.replace('_', " "), id)))
}

pub fn make_labels(tree: &Tree) -> BTreeMap<String, String> {
    let mut labels = BTreeMap::new();
    for name in tree.nodes.iter().filter_map(|n| n.name.as_deref()) {
        match make_label(name) {
            Some((key, label)) => {
                labels.insert(key, label);
            }
            None => warn!("not sure what to do with node name {:?}", name),
        }
    }
    labels
}

/// Keys that are neither `ott<number>` nor `mrcaott…`.
pub fn check_labels(labels: &BTreeMap<String, String>) -> Vec<&str> {
    labels
        .iter()
        .filter(|(key, _)| match key.strip_prefix("ott") {
            Some(id) => id.parse::<u64>().is_err(),
            None => !key.starts_with("mrcaott"),
        })
        .map(|(key, label)| {
            warn!("issue with label {} {:?}", key, label);
            &**key
        })
        .collect()
}
