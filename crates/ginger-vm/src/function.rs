//! Callable function handles.
//!
//! A [`Function`] is either a native Rust closure (the built-ins) or the
//! compiled body of a graph. Graph functions are allocated before their body
//! exists so that `recur` can refer to the function being compiled; the body
//! is filled in exactly once when compilation finishes.

use std::fmt;
use std::sync::{Arc, OnceLock, Weak};

use crate::edge_fn::{EdgeFn, Frame};
use crate::error::RuntimeError;
use crate::value::Value;

type NativeFn = dyn Fn(Value) -> Result<Value, RuntimeError> + Send + Sync;

enum Body {
    Native(Box<NativeFn>),
    Graph {
        edge: OnceLock<EdgeFn>,
        max_depth: usize,
    },
}

struct FunctionInner {
    name: String,
    body: Body,
}

/// A compiled function from one [`Value`] to another.
///
/// Cloning is cheap. Two handles are equal only if they refer to the same
/// function.
#[derive(Clone)]
pub struct Function(Arc<FunctionInner>);

/// A non-owning handle to a [`Function`], held by its own body.
#[derive(Clone)]
pub(crate) struct WeakFunction(Weak<FunctionInner>);

impl WeakFunction {
    pub(crate) fn upgrade(&self) -> Option<Function> {
        self.0.upgrade().map(Function)
    }
}

impl Function {
    /// Wraps a Rust closure.
    pub fn native(
        name: impl Into<String>,
        f: impl Fn(Value) -> Result<Value, RuntimeError> + Send + Sync + 'static,
    ) -> Function {
        Function(Arc::new(FunctionInner {
            name: name.into(),
            body: Body::Native(Box::new(f)),
        }))
    }

    /// A graph function whose body has not been compiled yet.
    pub(crate) fn deferred(name: impl Into<String>, max_depth: usize) -> Function {
        Function(Arc::new(FunctionInner {
            name: name.into(),
            body: Body::Graph {
                edge: OnceLock::new(),
                max_depth,
            },
        }))
    }

    /// Installs the compiled body. Returns `false` if this is not a graph
    /// function or its body was already set.
    pub(crate) fn fill(&self, body: EdgeFn) -> bool {
        match &self.0.body {
            Body::Graph { edge, .. } => edge.set(body).is_ok(),
            Body::Native(_) => false,
        }
    }

    pub(crate) fn downgrade(&self) -> WeakFunction {
        WeakFunction(Arc::downgrade(&self.0))
    }

    pub fn name(&self) -> &str {
        &self.0.name
    }

    /// Calls the function with `input`.
    pub fn call(&self, input: Value) -> Result<Value, RuntimeError> {
        self.invoke(input, 0)
    }

    /// Calls the function from within an invocation nested `depth` deep.
    pub(crate) fn invoke(&self, input: Value, depth: usize) -> Result<Value, RuntimeError> {
        match &self.0.body {
            Body::Native(f) => f(input),
            Body::Graph { edge, max_depth } => {
                if depth >= *max_depth {
                    tracing::warn!(function = %self.name(), limit = *max_depth, "call depth limit reached");
                    return Err(RuntimeError::RecursionLimitExceeded { limit: *max_depth });
                }
                let edge = edge.get().ok_or_else(|| RuntimeError::Internal {
                    message: format!("function '{}' called before its body was compiled", self.name()),
                })?;
                edge.eval(&Frame {
                    input: &input,
                    depth: depth + 1,
                })
            }
        }
    }

    pub fn ptr_eq(&self, other: &Function) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }
}

impl PartialEq for Function {
    fn eq(&self, other: &Self) -> bool {
        self.ptr_eq(other)
    }
}

impl fmt::Display for Function {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "<fn {}>", self.name())
    }
}

impl fmt::Debug for Function {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Function").field(&self.name()).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn native_call() {
        let neg = Function::native("neg", |v| match v {
            Value::Number(n) => Ok(Value::Number(-n)),
            other => Err(RuntimeError::TypeMismatch {
                expected: "Number".into(),
                got: other.type_name().into(),
            }),
        });
        assert_eq!(neg.call(Value::Number(3)), Ok(Value::Number(-3)));
        assert!(neg.call(Value::zero()).is_err());
        assert_eq!(neg.name(), "neg");
        assert_eq!(neg.to_string(), "<fn neg>");
    }

    #[test]
    fn unfilled_graph_function_fails() {
        let f = Function::deferred("pending", 8);
        let err = f.call(Value::zero()).unwrap_err();
        assert!(matches!(err, RuntimeError::Internal { .. }));
    }

    #[test]
    fn fill_once() {
        let f = Function::deferred("id", 8);
        assert!(f.fill(EdgeFn::Input));
        assert!(!f.fill(EdgeFn::Const(Value::zero())));
        assert_eq!(f.call(Value::Number(7)), Ok(Value::Number(7)));
        assert!(!Function::native("n", Ok).fill(EdgeFn::Input));
    }

    #[test]
    fn depth_limit() {
        let f = Function::deferred("id", 2);
        f.fill(EdgeFn::Input);
        assert!(f.invoke(Value::zero(), 1).is_ok());
        assert_eq!(
            f.invoke(Value::zero(), 2),
            Err(RuntimeError::RecursionLimitExceeded { limit: 2 })
        );
    }

    #[test]
    fn weak_handle_upgrades_while_alive() {
        let f = Function::native("n", Ok);
        let weak = f.downgrade();
        assert!(weak.upgrade().is_some_and(|g| g.ptr_eq(&f)));
        drop(f);
        assert!(weak.upgrade().is_none());
    }

    #[test]
    fn functions_are_send_and_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<Function>();
        assert_send_sync::<Value>();
    }
}
