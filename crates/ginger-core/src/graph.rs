//! Graph: the immutable, content-addressed store.
//!
//! A [`Graph`] maps the content identity of each Value-vertex to a
//! [`ValueRecord`]: the value itself plus the half-edges coming into it.
//! Junctions are never stored at the top level; they live only inside the
//! half-edge trees and are re-identified structurally wherever they appear.
//!
//! # Persistence
//!
//! Graphs are never modified in place. [`Graph::add_value_in`] and friends
//! return a new graph which shares every untouched record with the original:
//! only the top-level map is copied, records themselves are reference
//! counted.
//!
//! # Equality
//!
//! Two graphs are equal when they hold the same Value-vertices and each
//! vertex has the same *set* of incoming half-edges. Junction input order is
//! part of a half-edge's identity and therefore still significant.

use std::collections::BTreeMap;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::{Arc, OnceLock};

use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::edge::{value_vertex_id, HalfEdge, VertexSpec};
use crate::id::{write_header, ContentId, Identify};
use crate::value::Value;
use crate::view::{VertexRef, View};

/// A stored Value-vertex and the half-edges leading into it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValueRecord {
    value: Value,
    ins: Vec<HalfEdge>,
}

impl ValueRecord {
    fn new(value: Value) -> Self {
        ValueRecord {
            value,
            ins: Vec::new(),
        }
    }

    pub fn value(&self) -> &Value {
        &self.value
    }

    /// Incoming half-edges, in the order they were added.
    pub fn ins(&self) -> &[HalfEdge] {
        &self.ins
    }
}

type Records = BTreeMap<ContentId, Arc<ValueRecord>>;

#[derive(Default)]
struct GraphInner {
    records: Records,
    /// Memoized content identity.
    id: OnceLock<ContentId>,
    /// Memoized materialized view.
    view: OnceLock<View>,
}

/// An immutable, content-addressed graph of values.
///
/// Cloning is cheap; clones share all storage and the memoized view.
#[derive(Clone, Default)]
pub struct Graph {
    inner: Arc<GraphInner>,
}

impl Graph {
    /// Creates the empty graph, off which all graphs are built.
    pub fn new() -> Self {
        Graph::default()
    }

    fn from_records(records: Records) -> Self {
        let graph = Graph {
            inner: Arc::new(GraphInner {
                records,
                id: OnceLock::new(),
                view: OnceLock::new(),
            }),
        };

        #[cfg(debug_assertions)]
        graph.assert_consistency();

        graph
    }

    // -----------------------------------------------------------------------
    // Construction
    // -----------------------------------------------------------------------

    /// Connects `edge` to the Value-vertex containing `dest`, returning the
    /// graph which reflects that connection.
    ///
    /// Any Value-vertex referenced within `edge` which is not yet in the
    /// graph is created with no incoming edges. Adding an edge that `dest`
    /// already has returns `self` unchanged.
    pub fn add_value_in(&self, edge: HalfEdge, dest: Value) -> Graph {
        let dest_id = value_vertex_id(&dest);

        let mut record = match self.inner.records.get(&dest_id) {
            Some(existing) => {
                assert_same_value(dest_id, &existing.value, &dest);
                if existing.ins.contains(&edge) {
                    return self.clone();
                }
                existing.as_ref().clone()
            }
            None => ValueRecord::new(dest),
        };
        record.ins.push(edge);

        let mut records = self.inner.records.clone();
        if let Some(edge) = record.ins.last() {
            persist_sources(&mut records, edge);
        }
        records.insert(dest_id, Arc::new(record));

        Graph::from_records(records)
    }

    /// Disconnects `edge` from the Value-vertex containing `dest`.
    ///
    /// Value-vertices left with no incoming edges and no remaining
    /// references from any other record are dropped. If `dest` does not
    /// have `edge`, `self` is returned unchanged.
    pub fn del_value_in(&self, edge: &HalfEdge, dest: &Value) -> Graph {
        let dest_id = value_vertex_id(dest);

        let Some(existing) = self.inner.records.get(&dest_id) else {
            return self.clone();
        };
        let Some(pos) = existing.ins.iter().position(|e| e == edge) else {
            return self.clone();
        };

        let mut record = existing.as_ref().clone();
        record.ins.remove(pos);

        let mut records = self.inner.records.clone();
        records.insert(dest_id, Arc::new(record));

        let mut candidates = vec![dest_id];
        edge.for_each_source_value(&mut |v| candidates.push(value_vertex_id(v)));
        for id in candidates {
            if is_orphaned(&records, id) {
                records.remove(&id);
            }
        }

        Graph::from_records(records)
    }

    /// Returns the union of two graphs. Value-vertices present in both get
    /// the incoming edges of both.
    pub fn union(&self, other: &Graph) -> Graph {
        let mut records = self.inner.records.clone();
        let mut changed = false;

        for (id, theirs) in &other.inner.records {
            match records.get(id) {
                None => {
                    records.insert(*id, Arc::clone(theirs));
                    changed = true;
                }
                Some(ours) => {
                    assert_same_value(*id, &ours.value, &theirs.value);
                    let missing: Vec<HalfEdge> = theirs
                        .ins
                        .iter()
                        .filter(|e| !ours.ins.contains(e))
                        .cloned()
                        .collect();
                    if !missing.is_empty() {
                        let mut merged = ours.as_ref().clone();
                        merged.ins.extend(missing);
                        records.insert(*id, Arc::new(merged));
                        changed = true;
                    }
                }
            }
        }

        if !changed {
            return self.clone();
        }
        Graph::from_records(records)
    }

    // -----------------------------------------------------------------------
    // Read-only accessors
    // -----------------------------------------------------------------------

    /// Returns the half-edges leading into `value`, or an empty slice if
    /// there are none.
    pub fn value_ins(&self, value: &Value) -> &[HalfEdge] {
        self.inner
            .records
            .get(&value_vertex_id(value))
            .map(|r| r.ins.as_slice())
            .unwrap_or(&[])
    }

    /// Iterates over every stored Value-vertex's value.
    pub fn values(&self) -> impl Iterator<Item = &Value> {
        self.inner.records.values().map(|r| &r.value)
    }

    /// Iterates over every stored record.
    pub fn records(&self) -> impl Iterator<Item = &ValueRecord> {
        self.inner.records.values().map(|r| r.as_ref())
    }

    pub fn contains_value(&self, value: &Value) -> bool {
        self.inner.records.contains_key(&value_vertex_id(value))
    }

    /// Number of stored Value-vertices.
    pub fn len(&self) -> usize {
        self.inner.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.records.is_empty()
    }

    /// Returns the materialized view of this graph, building it on first use.
    pub fn view(&self) -> &View {
        self.inner
            .view
            .get_or_init(|| View::build(self.inner.records.iter().map(|(id, r)| (id, r.as_ref()))))
    }

    /// Shortcut for `self.view().vertex(value)`.
    pub fn vertex(&self, value: &Value) -> Option<VertexRef<'_>> {
        self.view().vertex(value)
    }

    fn sorted_records(&self) -> Vec<&ValueRecord> {
        let mut records: Vec<&ValueRecord> = self.records().collect();
        records.sort_by(|a, b| a.value.cmp(&b.value));
        records
    }

    /// Verifies that every record is keyed by its own value's identity.
    ///
    /// Called automatically after every construction in debug builds. A
    /// failure here means the store is corrupt, not that the caller erred.
    #[cfg(debug_assertions)]
    fn assert_consistency(&self) {
        for (id, record) in &self.inner.records {
            assert_eq!(
                *id,
                value_vertex_id(&record.value),
                "record for '{}' stored under a foreign identity",
                record.value
            );
        }
    }
}

/// Inserts every Value-vertex in `edge`'s source tree that is not stored yet.
fn persist_sources(records: &mut Records, edge: &HalfEdge) {
    match edge.source() {
        VertexSpec::Value(val) => {
            let id = value_vertex_id(val);
            match records.get(&id) {
                Some(existing) => assert_same_value(id, &existing.value, val),
                None => {
                    records.insert(id, Arc::new(ValueRecord::new(val.clone())));
                }
            }
        }
        VertexSpec::Junction(ins) => {
            for edge in ins {
                persist_sources(records, edge);
            }
        }
    }
}

fn is_orphaned(records: &Records, id: ContentId) -> bool {
    match records.get(&id) {
        None => false,
        Some(record) if !record.ins.is_empty() => false,
        Some(_) => !records.values().any(|r| {
            r.ins.iter().any(|edge| {
                let mut found = false;
                edge.for_each_source_value(&mut |v| found |= value_vertex_id(v) == id);
                found
            })
        }),
    }
}

/// Two distinct values hashing to one identity would silently merge their
/// vertices. That is a broken store, never a user error.
fn assert_same_value(id: ContentId, stored: &Value, incoming: &Value) {
    assert!(
        stored == incoming,
        "content identity collision on {}: '{}' vs '{}'",
        id.short(),
        stored,
        incoming
    );
}

// ---------------------------------------------------------------------------
// Identity and equality
// ---------------------------------------------------------------------------

impl Identify for Graph {
    fn identify(&self, hasher: &mut blake3::Hasher) {
        write_header(hasher, b"graph", self.inner.records.len());
        for (id, record) in &self.inner.records {
            hasher.update(&id.0);
            let mut ins: Vec<ContentId> = record.ins.iter().map(Identify::content_id).collect();
            ins.sort();
            write_header(hasher, b"ins", ins.len());
            for edge_id in ins {
                hasher.update(&edge_id.0);
            }
        }
    }

    fn content_id(&self) -> ContentId {
        *self.inner.id.get_or_init(|| {
            let mut hasher = blake3::Hasher::new();
            self.identify(&mut hasher);
            hasher.finalize().into()
        })
    }
}

impl PartialEq for Graph {
    fn eq(&self, other: &Self) -> bool {
        if Arc::ptr_eq(&self.inner, &other.inner) {
            return true;
        }
        let (ours, theirs) = (&self.inner.records, &other.inner.records);
        ours.len() == theirs.len()
            && ours.iter().all(|(id, record)| match theirs.get(id) {
                Some(other) => {
                    record.ins.len() == other.ins.len()
                        && record.ins.iter().all(|e| other.ins.contains(e))
                }
                None => false,
            })
    }
}

impl Eq for Graph {}

impl Hash for Graph {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.content_id().hash(state);
    }
}

// ---------------------------------------------------------------------------
// Rendering and serialization
// ---------------------------------------------------------------------------

/// Renders one statement per incoming edge, e.g. `{ a = 1; out = add < (a, b); }`.
impl fmt::Display for Graph {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut empty = true;
        f.write_str("{")?;
        for record in self.sorted_records() {
            for edge in &record.ins {
                write!(f, " {} = {};", record.value, edge)?;
                empty = false;
            }
        }
        f.write_str(if empty { "}" } else { " }" })
    }
}

impl fmt::Debug for Graph {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Graph{}", self)
    }
}

#[derive(Serialize)]
struct GraphRef<'a> {
    values: Vec<&'a ValueRecord>,
}

#[derive(Deserialize)]
struct GraphOwned {
    values: Vec<ValueRecord>,
}

impl Serialize for Graph {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        GraphRef {
            values: self.sorted_records(),
        }
        .serialize(serializer)
    }
}

/// Records are replayed through [`Graph::add_value_in`], so identities and
/// sharing are re-derived rather than trusted from the input.
impl<'de> Deserialize<'de> for Graph {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let owned = GraphOwned::deserialize(deserializer)?;
        let mut graph = Graph::new();
        let mut bare = Vec::new();
        for record in owned.values {
            if record.ins.is_empty() {
                bare.push(record.value);
                continue;
            }
            for edge in record.ins {
                graph = graph.add_value_in(edge, record.value.clone());
            }
        }

        let missing: Vec<Value> = bare.into_iter().filter(|v| !graph.contains_value(v)).collect();
        if missing.is_empty() {
            return Ok(graph);
        }
        let mut records = graph.inner.records.clone();
        for value in missing {
            records.insert(value_vertex_id(&value), Arc::new(ValueRecord::new(value)));
        }
        Ok(Graph::from_records(records))
    }
}
