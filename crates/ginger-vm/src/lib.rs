//! Compiles ginger graphs into callable functions.
//!
//! A graph becomes a function from the value bound to `in` to the value bound
//! to `out`. Free names resolve in a [`Scope`], usually one built from
//! [`global_scope`]:
//!
//! ```ignore
//! let scope = global_scope();
//! let function = function_from_graph(&graph, &scope)?;
//! let result = function.call(Value::Number(5))?;
//! ```

pub mod builtins;
pub mod compile;
pub mod config;
mod edge_fn;
pub mod error;
pub mod function;
pub mod scope;
pub mod value;

pub use builtins::global_scope;
pub use compile::{evaluate, function_from_graph, Compiler, IF, IN, OUT, RECUR};
pub use config::VmConfig;
pub use error::{CompileError, RuntimeError, VmError};
pub use function::Function;
pub use scope::Scope;
pub use value::Value;
