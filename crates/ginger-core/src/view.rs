//! Materialized, bidirectional view over a [`Graph`](crate::graph::Graph).
//!
//! The store only records, per Value-vertex, the half-edges coming into it.
//! [`View`] turns those records into a conventional vertex/edge graph with
//! both incoming and outgoing adjacency, backed by a petgraph arena.
//!
//! # Construction
//!
//! The view is built in a single pass. Every distinct content identity gets
//! exactly one arena slot, and the slot is assigned *before* the vertex's
//! inputs are expanded. Value-vertices are expanded only from their own
//! record; Junctions are expanded the first time they are reached. Together
//! this guarantees termination on self-referential graphs and makes a
//! Junction shared by several consumers a single vertex with several
//! outgoing edges.
//!
//! Views are never mutated after construction. A graph derived through
//! `add_value_in` starts without a view and builds its own on demand.

use std::collections::HashMap;
use std::fmt;

use petgraph::graph::DiGraph;
use petgraph::visit::{Dfs, EdgeRef as _, Reversed};
use petgraph::Direction;

use crate::edge::{value_vertex_id, HalfEdge, VertexKind, VertexSpec};
use crate::error::CoreError;
use crate::graph::ValueRecord;
use crate::id::{ContentId, Identify};
use crate::value::Value;

/// Arena index of a materialized vertex.
pub type VertexIndex = petgraph::graph::NodeIndex<u32>;

/// Arena index of a materialized edge.
pub type EdgeIndex = petgraph::graph::EdgeIndex<u32>;

#[derive(Debug, Clone)]
struct ViewVertex {
    kind: VertexKind,
    /// Set if-and-only-if `kind` is [`VertexKind::Value`].
    value: Option<Value>,
}

/// A read-only vertex/edge graph derived from a store.
#[derive(Debug, Default)]
pub struct View {
    arena: DiGraph<ViewVertex, Option<Value>, u32>,
    values: HashMap<ContentId, VertexIndex>,
}

impl View {
    pub(crate) fn build<'r>(records: impl IntoIterator<Item = (&'r ContentId, &'r ValueRecord)>) -> View {
        let mut builder = ViewBuilder::default();
        for (id, record) in records {
            let (idx, _) = builder.slot(*id, VertexKind::Value, Some(record.value()));
            builder.connect(idx, record.ins());
        }

        let view = View {
            arena: builder.arena,
            values: builder.values,
        };
        tracing::trace!(
            vertices = view.vertex_count(),
            edges = view.edge_count(),
            "materialized graph view"
        );
        view
    }

    /// Returns the Value-vertex for `value`, or `None` if the graph has no
    /// such vertex.
    pub fn vertex(&self, value: &Value) -> Option<VertexRef<'_>> {
        self.values
            .get(&value_vertex_id(value))
            .map(|&index| VertexRef { view: self, index })
    }

    /// Iterates over all Value-vertices, in arena order.
    pub fn values(&self) -> impl Iterator<Item = VertexRef<'_>> {
        self.arena
            .node_indices()
            .filter(move |&idx| self.arena[idx].kind == VertexKind::Value)
            .map(move |index| VertexRef { view: self, index })
    }

    /// Total number of materialized vertices, Junctions included.
    pub fn vertex_count(&self) -> usize {
        self.arena.node_count()
    }

    pub fn edge_count(&self) -> usize {
        self.arena.edge_count()
    }

    /// Returns `true` if some vertex can reach itself by following edges.
    pub fn is_cyclic(&self) -> bool {
        petgraph::algo::is_cyclic_directed(&self.arena)
    }

    /// Visits every vertex once, following incoming edges depth-first.
    ///
    /// If `start` is given its vertex is visited first; the remaining
    /// Value-vertices are used as further roots afterwards. Returning `false`
    /// from `visit` stops the walk.
    pub fn walk<'a>(
        &'a self,
        start: Option<&Value>,
        mut visit: impl FnMut(VertexRef<'a>) -> bool,
    ) -> Result<(), CoreError> {
        let start = match start {
            Some(value) => Some(
                self.vertex(value)
                    .ok_or_else(|| CoreError::ValueNotFound {
                        value: value.to_string(),
                    })?
                    .index,
            ),
            None => None,
        };

        let reversed = Reversed(&self.arena);
        let mut dfs = Dfs::empty(reversed);
        let roots = start.into_iter().chain(self.values().map(|v| v.index));

        for root in roots {
            dfs.move_to(root);
            while let Some(index) = dfs.next(reversed) {
                if !visit(VertexRef { view: self, index }) {
                    return Ok(());
                }
            }
        }
        Ok(())
    }
}

#[derive(Default)]
struct ViewBuilder {
    arena: DiGraph<ViewVertex, Option<Value>, u32>,
    slots: HashMap<ContentId, VertexIndex>,
    values: HashMap<ContentId, VertexIndex>,
}

impl ViewBuilder {
    /// Returns the slot for `id`, creating it if needed. The flag is `true`
    /// when the slot already existed.
    fn slot(&mut self, id: ContentId, kind: VertexKind, value: Option<&Value>) -> (VertexIndex, bool) {
        if let Some(&idx) = self.slots.get(&id) {
            return (idx, true);
        }
        let idx = self.arena.add_node(ViewVertex {
            kind,
            value: value.cloned(),
        });
        self.slots.insert(id, idx);
        if kind == VertexKind::Value {
            self.values.insert(id, idx);
        }
        (idx, false)
    }

    fn connect(&mut self, to: VertexIndex, ins: &[HalfEdge]) {
        for edge in ins {
            let from = self.source(edge.source());
            self.arena.add_edge(from, to, edge.label().cloned());
        }
    }

    fn source(&mut self, spec: &VertexSpec) -> VertexIndex {
        match spec {
            VertexSpec::Value(val) => self.slot(value_vertex_id(val), VertexKind::Value, Some(val)).0,
            VertexSpec::Junction(ins) => {
                let (idx, existed) = self.slot(spec.content_id(), VertexKind::Junction, None);
                if !existed {
                    self.connect(idx, ins);
                }
                idx
            }
        }
    }
}

/// A materialized vertex, borrowed from its [`View`].
#[derive(Clone, Copy)]
pub struct VertexRef<'a> {
    view: &'a View,
    index: VertexIndex,
}

impl<'a> VertexRef<'a> {
    pub fn index(&self) -> VertexIndex {
        self.index
    }

    pub fn kind(&self) -> VertexKind {
        self.view.arena[self.index].kind
    }

    /// The wrapped value; `None` for Junctions.
    pub fn value(&self) -> Option<&'a Value> {
        let view: &'a View = self.view;
        view.arena[self.index].value.as_ref()
    }

    /// Incoming edges, in the order they were recorded. For a Junction this
    /// is its input order.
    pub fn ins(&self) -> Vec<EdgeRef<'a>> {
        self.edges(Direction::Incoming)
    }

    /// Outgoing edges, in the order they were materialized.
    pub fn outs(&self) -> Vec<EdgeRef<'a>> {
        self.edges(Direction::Outgoing)
    }

    fn edges(&self, dir: Direction) -> Vec<EdgeRef<'a>> {
        let view: &'a View = self.view;
        // petgraph yields adjacency newest-first; edge indices restore
        // insertion order.
        let mut edges: Vec<EdgeRef<'a>> = view
            .arena
            .edges_directed(self.index, dir)
            .map(|e| EdgeRef {
                view,
                index: e.id(),
                from: e.source(),
                to: e.target(),
            })
            .collect();
        edges.sort_by_key(|e| e.index);
        edges
    }
}

impl PartialEq for VertexRef<'_> {
    fn eq(&self, other: &Self) -> bool {
        std::ptr::eq(self.view, other.view) && self.index == other.index
    }
}

impl Eq for VertexRef<'_> {}

impl fmt::Debug for VertexRef<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.value() {
            Some(value) => write!(f, "Value({})#{}", value, self.index.index()),
            None => write!(f, "Junction#{}", self.index.index()),
        }
    }
}

/// A materialized edge, borrowed from its [`View`].
#[derive(Clone, Copy)]
pub struct EdgeRef<'a> {
    view: &'a View,
    index: EdgeIndex,
    from: VertexIndex,
    to: VertexIndex,
}

impl<'a> EdgeRef<'a> {
    pub fn index(&self) -> EdgeIndex {
        self.index
    }

    pub fn from(&self) -> VertexRef<'a> {
        VertexRef {
            view: self.view,
            index: self.from,
        }
    }

    pub fn to(&self) -> VertexRef<'a> {
        VertexRef {
            view: self.view,
            index: self.to,
        }
    }

    pub fn label(&self) -> Option<&'a Value> {
        let view: &'a View = self.view;
        view.arena.edge_weight(self.index).and_then(Option::as_ref)
    }
}

impl fmt::Debug for EdgeRef<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?} -", self.from())?;
        if let Some(label) = self.label() {
            write!(f, "{}", label)?;
        }
        write!(f, "-> {:?}", self.to())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::Graph;

    fn name(s: &str) -> Value {
        Value::name(s)
    }

    fn num(n: i64) -> Value {
        Value::number(n)
    }

    /// out = add < (a, b); a = 1; b = 2;
    fn add_graph() -> Graph {
        Graph::new()
            .add_value_in(HalfEdge::value_out(num(1), None), name("a"))
            .add_value_in(HalfEdge::value_out(num(2), None), name("b"))
            .add_value_in(
                HalfEdge::junction_out(
                    [
                        HalfEdge::value_out(name("a"), None),
                        HalfEdge::value_out(name("b"), None),
                    ],
                    name("add"),
                ),
                name("out"),
            )
    }

    #[test]
    fn vertex_lookup() {
        let g = add_graph();
        let view = g.view();
        let out = view.vertex(&name("out")).unwrap();
        assert_eq!(out.kind(), VertexKind::Value);
        assert_eq!(out.value(), Some(&name("out")));
        assert!(view.vertex(&name("missing")).is_none());
    }

    #[test]
    fn junction_inputs_keep_order() {
        let g = add_graph();
        let view = g.view();
        let out = view.vertex(&name("out")).unwrap();

        let ins = out.ins();
        assert_eq!(ins.len(), 1);
        assert_eq!(ins[0].label(), Some(&name("add")));

        let junction = ins[0].from();
        assert_eq!(junction.kind(), VertexKind::Junction);
        assert!(junction.value().is_none());

        let sources: Vec<_> = junction
            .ins()
            .iter()
            .map(|e| e.from().value().cloned())
            .collect();
        assert_eq!(sources, vec![Some(name("a")), Some(name("b"))]);
    }

    #[test]
    fn edges_are_linked_both_ways() {
        let g = add_graph();
        let view = g.view();
        let a = view.vertex(&name("a")).unwrap();
        let one = view.vertex(&num(1)).unwrap();

        let outs = one.outs();
        assert_eq!(outs.len(), 1);
        assert_eq!(outs[0].to(), a);
        assert_eq!(a.ins()[0].from(), one);
        assert!(one.ins().is_empty());
    }

    #[test]
    fn counts() {
        let g = add_graph();
        let view = g.view();
        // a, b, 1, 2, out + one junction
        assert_eq!(view.vertex_count(), 6);
        // 1->a, 2->b, a->j, b->j, j->out
        assert_eq!(view.edge_count(), 5);
        assert_eq!(view.values().count(), 5);
        assert!(!view.is_cyclic());
    }

    #[test]
    fn shared_junction_is_one_vertex() {
        let shared = HalfEdge::junction_out(
            [
                HalfEdge::value_out(name("x"), None),
                HalfEdge::value_out(name("y"), None),
            ],
            name("add"),
        );
        let g = Graph::new()
            .add_value_in(shared.clone(), name("p"))
            .add_value_in(shared.with_label(name("mul")), name("q"));
        let view = g.view();

        let p_src = view.vertex(&name("p")).unwrap().ins()[0].from();
        let q_src = view.vertex(&name("q")).unwrap().ins()[0].from();
        assert_eq!(p_src, q_src);
        assert_eq!(p_src.outs().len(), 2);
        assert_eq!(p_src.ins().len(), 2);
    }

    #[test]
    fn self_reference_terminates() {
        // a = f < a;
        let g = Graph::new().add_value_in(HalfEdge::value_out(name("a"), name("f")), name("a"));
        let view = g.view();
        let a = view.vertex(&name("a")).unwrap();
        assert_eq!(a.ins().len(), 1);
        assert_eq!(a.ins()[0].from(), a);
        assert_eq!(a.outs().len(), 1);
        assert!(view.is_cyclic());
    }

    #[test]
    fn mutual_reference_terminates() {
        // a = f < (b, 1); b = g < a;
        let g = Graph::new()
            .add_value_in(
                HalfEdge::junction_out(
                    [
                        HalfEdge::value_out(name("b"), None),
                        HalfEdge::value_out(num(1), None),
                    ],
                    name("f"),
                ),
                name("a"),
            )
            .add_value_in(HalfEdge::value_out(name("a"), name("g")), name("b"));
        let view = g.view();
        assert!(view.is_cyclic());
        let b = view.vertex(&name("b")).unwrap();
        let a = view.vertex(&name("a")).unwrap();
        assert_eq!(b.ins()[0].from(), a);
    }

    #[test]
    fn walk_visits_every_vertex_once() {
        let g = add_graph();
        let view = g.view();
        let mut seen = Vec::new();
        view.walk(Some(&name("out")), |v| {
            seen.push(v.index());
            true
        })
        .unwrap();

        assert_eq!(seen.len(), view.vertex_count());
        assert_eq!(seen[0], view.vertex(&name("out")).unwrap().index());
        let mut dedup = seen.clone();
        dedup.sort();
        dedup.dedup();
        assert_eq!(dedup.len(), seen.len());
    }

    #[test]
    fn walk_stops_early() {
        let g = add_graph();
        let mut visited = 0;
        g.view()
            .walk(None, |_| {
                visited += 1;
                visited < 2
            })
            .unwrap();
        assert_eq!(visited, 2);
    }

    #[test]
    fn walk_unknown_start() {
        let g = add_graph();
        let err = g.view().walk(Some(&name("nope")), |_| true).unwrap_err();
        assert!(matches!(err, CoreError::ValueNotFound { .. }));
    }

    #[test]
    fn empty_view() {
        let g = Graph::new();
        assert_eq!(g.view().vertex_count(), 0);
        assert!(g.view().vertex(&name("out")).is_none());
    }
}
