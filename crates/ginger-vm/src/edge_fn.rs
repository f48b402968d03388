//! Compiled edges.
//!
//! An [`EdgeFn`] computes the value flowing along one edge, given the
//! argument of the function the edge belongs to. The compiler narrows edges
//! to [`EdgeFn::Input`] or [`EdgeFn::Const`] whenever it can and only falls
//! back to a closure for what must be decided at call time.

use std::sync::Arc;

use crate::error::RuntimeError;
use crate::value::Value;

/// The state of one graph function invocation.
pub(crate) struct Frame<'a> {
    pub input: &'a Value,
    /// Nesting of the invocation this frame belongs to.
    pub depth: usize,
}

type DynEdgeFn = dyn Fn(&Frame<'_>) -> Result<Value, RuntimeError> + Send + Sync;

#[derive(Clone)]
pub(crate) enum EdgeFn {
    /// The enclosing function's argument.
    Input,
    Const(Value),
    Dynamic(Arc<DynEdgeFn>),
}

impl EdgeFn {
    pub(crate) fn dynamic(
        f: impl Fn(&Frame<'_>) -> Result<Value, RuntimeError> + Send + Sync + 'static,
    ) -> EdgeFn {
        EdgeFn::Dynamic(Arc::new(f))
    }

    pub(crate) fn eval(&self, frame: &Frame<'_>) -> Result<Value, RuntimeError> {
        match self {
            EdgeFn::Input => Ok(frame.input.clone()),
            EdgeFn::Const(val) => Ok(val.clone()),
            EdgeFn::Dynamic(f) => f(frame),
        }
    }

    /// Combines several edges into one yielding a tuple of their results,
    /// evaluated left to right.
    pub(crate) fn tuple(parts: Vec<EdgeFn>) -> EdgeFn {
        if parts.iter().all(|p| matches!(p, EdgeFn::Const(_))) {
            let items = parts
                .into_iter()
                .filter_map(|p| match p {
                    EdgeFn::Const(val) => Some(val),
                    _ => None,
                })
                .collect();
            return EdgeFn::Const(Value::Tuple(items));
        }
        EdgeFn::dynamic(move |frame| {
            parts
                .iter()
                .map(|p| p.eval(frame))
                .collect::<Result<Vec<_>, _>>()
                .map(Value::Tuple)
        })
    }
}
