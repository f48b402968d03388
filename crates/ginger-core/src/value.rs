//! The data a graph can carry.
//!
//! [`Value`] is what sits on Value-vertices and on edge labels. Runtime-only
//! values (compiled functions, tuples) live in `ginger-vm` and are never
//! stored in a graph.

use std::cmp::Ordering;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::graph::Graph;
use crate::id::{write_header, Identify};

/// A value stored within a [`Graph`].
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Value {
    Name(String),
    Number(i64),
    Graph(Graph),
}

impl Value {
    pub fn name(name: impl Into<String>) -> Value {
        Value::Name(name.into())
    }

    pub fn number(n: i64) -> Value {
        Value::Number(n)
    }

    pub fn graph(graph: Graph) -> Value {
        Value::Graph(graph)
    }

    pub fn as_name(&self) -> Option<&str> {
        match self {
            Value::Name(name) => Some(name),
            _ => None,
        }
    }

    pub fn as_number(&self) -> Option<i64> {
        match self {
            Value::Number(n) => Some(*n),
            _ => None,
        }
    }

    pub fn as_graph(&self) -> Option<&Graph> {
        match self {
            Value::Graph(g) => Some(g),
            _ => None,
        }
    }

    /// Returns `true` if this is the name `name`.
    pub fn is_name(&self, name: &str) -> bool {
        self.as_name() == Some(name)
    }

    /// Returns a human-readable description of the value's variant.
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Name(_) => "Name",
            Value::Number(_) => "Number",
            Value::Graph(_) => "Graph",
        }
    }

    fn rank(&self) -> u8 {
        match self {
            Value::Name(_) => 0,
            Value::Number(_) => 1,
            Value::Graph(_) => 2,
        }
    }
}

impl Identify for Value {
    fn identify(&self, hasher: &mut blake3::Hasher) {
        match self {
            Value::Name(name) => {
                write_header(hasher, b"name", name.len());
                hasher.update(name.as_bytes());
            }
            Value::Number(n) => {
                write_header(hasher, b"number", 8);
                hasher.update(&n.to_le_bytes());
            }
            Value::Graph(g) => {
                write_header(hasher, b"graph", 32);
                hasher.update(&g.content_id().0);
            }
        }
    }
}

/// Names sort before numbers, numbers before graphs. Graphs order by
/// content identity, which is arbitrary but stable.
impl Ord for Value {
    fn cmp(&self, other: &Self) -> Ordering {
        match (self, other) {
            (Value::Name(a), Value::Name(b)) => a.cmp(b),
            (Value::Number(a), Value::Number(b)) => a.cmp(b),
            (Value::Graph(a), Value::Graph(b)) => a.content_id().cmp(&b.content_id()),
            _ => self.rank().cmp(&other.rank()),
        }
    }
}

impl PartialOrd for Value {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Name(name) => f.write_str(name),
            Value::Number(n) => write!(f, "{}", n),
            Value::Graph(g) => write!(f, "{}", g),
        }
    }
}

impl From<i64> for Value {
    fn from(n: i64) -> Self {
        Value::Number(n)
    }
}

impl From<&str> for Value {
    fn from(name: &str) -> Self {
        Value::Name(name.to_string())
    }
}

impl From<Graph> for Value {
    fn from(g: Graph) -> Self {
        Value::Graph(g)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::edge::HalfEdge;

    #[test]
    fn name_and_number_identities_differ() {
        assert_ne!(Value::name("1").content_id(), Value::number(1).content_id());
    }

    #[test]
    fn equal_values_share_identity() {
        assert_eq!(Value::name("a").content_id(), Value::name("a").content_id());
        assert_eq!(Value::number(-3).content_id(), Value::number(-3).content_id());
    }

    #[test]
    fn graph_values_compare_structurally() {
        let build = || {
            Graph::new().add_value_in(HalfEdge::value_out(Value::number(1), None), Value::name("a"))
        };
        assert_eq!(Value::graph(build()), Value::graph(build()));
        assert_ne!(Value::graph(build()), Value::graph(Graph::new()));
    }

    #[test]
    fn ordering_groups_by_variant() {
        let mut vals = vec![
            Value::graph(Graph::new()),
            Value::number(2),
            Value::name("b"),
            Value::number(-1),
            Value::name("a"),
        ];
        vals.sort();
        assert_eq!(vals[0], Value::name("a"));
        assert_eq!(vals[1], Value::name("b"));
        assert_eq!(vals[2], Value::number(-1));
        assert_eq!(vals[3], Value::number(2));
        assert!(vals[4].as_graph().is_some());
    }

    #[test]
    fn accessors() {
        assert_eq!(Value::name("x").as_name(), Some("x"));
        assert_eq!(Value::number(4).as_number(), Some(4));
        assert!(Value::number(4).as_name().is_none());
        assert!(Value::name("in").is_name("in"));
        assert!(!Value::name("in").is_name("out"));
        assert_eq!(Value::number(1).type_name(), "Number");
    }

    #[test]
    fn display() {
        assert_eq!(Value::name("add").to_string(), "add");
        assert_eq!(Value::number(-7).to_string(), "-7");
        assert_eq!(Value::graph(Graph::new()).to_string(), "{}");
    }

    #[test]
    fn serde_roundtrip() {
        let val = Value::name("out");
        let json = serde_json::to_string(&val).unwrap();
        assert_eq!(json, r#"{"Name":"out"}"#);
        let back: Value = serde_json::from_str(&json).unwrap();
        assert_eq!(back, val);
    }
}
