//! Error types for compiling and running graph functions.
//!
//! [`CompileError`] is returned while turning a graph into a
//! [`Function`](crate::Function); nothing has run yet. [`RuntimeError`] is
//! returned from a call and halts only that call: the compiled function, its
//! graph and its scope all stay valid for subsequent calls.

use serde::{Deserialize, Serialize};

/// Errors found while compiling a graph.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, thiserror::Error)]
pub enum CompileError {
    #[error("undefined name '{name}'")]
    UndefinedName { name: String },

    #[error("ambiguous binding: '{name}' has {count} producing edges")]
    AmbiguousBinding { name: String, count: usize },

    #[error("'if' takes exactly 3 inputs, found {found}")]
    IfArity { found: usize },

    #[error("junction has no inputs")]
    EmptyJunction,

    /// A name whose definition depends on itself without going through `recur`.
    #[error("cyclic definition of '{name}'")]
    CyclicDefinition { name: String },

    #[error("edge value must resolve to a callable, got '{value}'")]
    NotCallable { value: String },

    #[error("in nested graph: {0}")]
    Nested(Box<CompileError>),
}

/// Runtime errors produced by calling a compiled function.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, thiserror::Error)]
pub enum RuntimeError {
    #[error("edge value must resolve to a callable, got '{value}'")]
    NotCallable { value: String },

    #[error("type mismatch at runtime: expected {expected}, got {got}")]
    TypeMismatch { expected: String, got: String },

    #[error("'{function}' expects {expected} inputs, got {found}")]
    ArityMismatch {
        function: String,
        expected: String,
        found: usize,
    },

    #[error("integer overflow in '{function}'")]
    IntegerOverflow { function: String },

    #[error("recursion depth limit ({limit}) exceeded")]
    RecursionLimitExceeded { limit: usize },

    /// A graph value reached at call time failed to compile.
    #[error("compiling graph at call time: {0}")]
    Compile(Box<CompileError>),

    #[error("internal error: {message}")]
    Internal { message: String },
}

/// Either failure, as returned by [`evaluate`](crate::evaluate).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, thiserror::Error)]
pub enum VmError {
    #[error(transparent)]
    Compile(#[from] CompileError),

    #[error(transparent)]
    Runtime(#[from] RuntimeError),
}
