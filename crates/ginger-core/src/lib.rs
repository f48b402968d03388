//! Immutable, content-addressed graphs of values.
//!
//! A [`Graph`] stores Value-vertices keyed by their content and connects them
//! with labeled half-edges, optionally through Junctions which combine several
//! ordered inputs. Every operation returns a new graph; the original is never
//! touched. [`Graph::view`] materializes a graph into a navigable [`View`],
//! cycles included.

pub mod edge;
pub mod error;
pub mod graph;
pub mod id;
pub mod value;
pub mod view;

// Re-export commonly used types
pub use edge::{value_vertex_id, HalfEdge, VertexKind, VertexSpec};
pub use error::CoreError;
pub use graph::{Graph, ValueRecord};
pub use id::{ContentId, Identify};
pub use value::Value;
pub use view::{EdgeIndex, EdgeRef, VertexIndex, VertexRef, View};
