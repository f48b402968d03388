//! Construction primitives: unrealized vertices and half-edges.
//!
//! A [`HalfEdge`] describes an edge leaving some vertex, carrying an optional
//! label, with no destination yet. The destination is assigned only when the
//! half-edge is persisted with [`Graph::add_value_in`](crate::graph::Graph::add_value_in).
//!
//! Sources are [`VertexSpec`]s: either a single [`Value`] or a Junction of
//! several ordered half-edges. Neither carries identity beyond its content.

use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use smallvec::SmallVec;

use crate::id::{write_header, ContentId, Identify};
use crate::value::Value;

/// Which kind of vertex a spec or materialized vertex is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum VertexKind {
    /// Wraps exactly one value; stored at the top level of a graph.
    Value,
    /// Combines several ordered input edges; never stored on its own.
    Junction,
}

/// An unrealized vertex, as seen from a half-edge leaving it.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum VertexSpec {
    Value(Value),
    Junction(SmallVec<[HalfEdge; 4]>),
}

impl VertexSpec {
    pub fn kind(&self) -> VertexKind {
        match self {
            VertexSpec::Value(_) => VertexKind::Value,
            VertexSpec::Junction(_) => VertexKind::Junction,
        }
    }
}

impl Identify for VertexSpec {
    fn identify(&self, hasher: &mut blake3::Hasher) {
        match self {
            VertexSpec::Value(val) => identify_value_vertex(val, hasher),
            VertexSpec::Junction(ins) => {
                write_header(hasher, b"junction", ins.len());
                for edge in ins {
                    edge.identify(hasher);
                }
            }
        }
    }
}

fn identify_value_vertex(val: &Value, hasher: &mut blake3::Hasher) {
    write_header(hasher, b"value", 1);
    val.identify(hasher);
}

/// Identity of the Value-vertex wrapping `val`, without building a spec.
pub fn value_vertex_id(val: &Value) -> ContentId {
    let mut hasher = blake3::Hasher::new();
    identify_value_vertex(val, &mut hasher);
    hasher.finalize().into()
}

/// An edge leaving an unrealized vertex, carrying an optional label.
///
/// An absent label is the empty value: the edge passes its source through
/// unchanged.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct HalfEdge {
    source: Arc<VertexSpec>,
    label: Option<Value>,
}

impl HalfEdge {
    /// An edge leaving the Value-vertex containing `value`.
    ///
    /// Value-vertices are de-duplicated on their value, so every half-edge
    /// built from an equal value leaves the same stored vertex.
    pub fn value_out(value: Value, label: impl Into<Option<Value>>) -> HalfEdge {
        HalfEdge {
            source: Arc::new(VertexSpec::Value(value)),
            label: label.into(),
        }
    }

    /// An edge leaving the Junction made of `inputs`, in order.
    pub fn junction_out(
        inputs: impl IntoIterator<Item = HalfEdge>,
        label: impl Into<Option<Value>>,
    ) -> HalfEdge {
        HalfEdge {
            source: Arc::new(VertexSpec::Junction(inputs.into_iter().collect())),
            label: label.into(),
        }
    }

    /// Like [`junction_out`](Self::junction_out), but a single input is not
    /// wrapped in a Junction when that can be avoided: with no label it is
    /// returned unchanged, and an unlabeled input simply takes the label.
    pub fn tuple_out(
        inputs: impl IntoIterator<Item = HalfEdge>,
        label: impl Into<Option<Value>>,
    ) -> HalfEdge {
        let mut inputs: SmallVec<[HalfEdge; 4]> = inputs.into_iter().collect();
        let label = label.into();

        if inputs.len() == 1 {
            match label {
                None => return inputs.remove(0),
                Some(label) if inputs[0].label.is_none() => {
                    return inputs.remove(0).with_label(label);
                }
                Some(label) => return HalfEdge::junction_out(inputs, label),
            }
        }

        HalfEdge::junction_out(inputs, label)
    }

    /// Returns a copy of this edge carrying `label` instead.
    pub fn with_label(mut self, label: impl Into<Option<Value>>) -> HalfEdge {
        self.label = label.into();
        self
    }

    pub fn source(&self) -> &VertexSpec {
        &self.source
    }

    pub fn label(&self) -> Option<&Value> {
        self.label.as_ref()
    }

    /// The source value, if this edge was built with [`value_out`](Self::value_out).
    pub fn from_value(&self) -> Option<&Value> {
        match self.source.as_ref() {
            VertexSpec::Value(val) => Some(val),
            VertexSpec::Junction(_) => None,
        }
    }

    /// The junction inputs, if this edge leaves a Junction.
    pub fn from_junction(&self) -> Option<&[HalfEdge]> {
        match self.source.as_ref() {
            VertexSpec::Junction(ins) => Some(ins),
            VertexSpec::Value(_) => None,
        }
    }

    /// Calls `f` on every value appearing as a source anywhere in this edge's
    /// tree, depth-first, left to right.
    pub fn for_each_source_value<'a>(&'a self, f: &mut impl FnMut(&'a Value)) {
        match self.source.as_ref() {
            VertexSpec::Value(val) => f(val),
            VertexSpec::Junction(ins) => {
                for edge in ins {
                    edge.for_each_source_value(f);
                }
            }
        }
    }
}

impl Identify for HalfEdge {
    fn identify(&self, hasher: &mut blake3::Hasher) {
        write_header(hasher, b"half-edge", 2);
        self.source.identify(hasher);
        match &self.label {
            None => write_header(hasher, b"none", 0),
            Some(label) => {
                write_header(hasher, b"some", 1);
                label.identify(hasher);
            }
        }
    }
}

impl fmt::Display for HalfEdge {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(label) = &self.label {
            write!(f, "{} < ", label)?;
        }
        match self.source.as_ref() {
            VertexSpec::Value(val) => write!(f, "{}", val),
            VertexSpec::Junction(ins) => {
                f.write_str("(")?;
                for (i, edge) in ins.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{}", edge)?;
                }
                f.write_str(")")
            }
        }
    }
}
