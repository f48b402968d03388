//! Name resolution environments.
//!
//! A [`Scope`] is a set of process-wide globals (built-ins, shared by every
//! scope derived from it) plus a persistent chain of local bindings. Both
//! parts are reference counted, so scopes are cheap to clone and extend.

use std::fmt;
use std::sync::Arc;

use indexmap::IndexMap;

use crate::error::CompileError;
use crate::value::Value;

struct Binding {
    name: String,
    value: Value,
    parent: Option<Arc<Binding>>,
}

/// Resolves names left free by a graph.
#[derive(Clone, Default)]
pub struct Scope {
    globals: Arc<IndexMap<String, Value>>,
    locals: Option<Arc<Binding>>,
}

impl Scope {
    /// An empty scope.
    pub fn new() -> Self {
        Scope::default()
    }

    /// A scope whose globals are `globals`, in iteration order. Later
    /// entries replace earlier ones of the same name.
    pub fn with_globals<N: Into<String>>(globals: impl IntoIterator<Item = (N, Value)>) -> Self {
        Scope {
            globals: Arc::new(globals.into_iter().map(|(n, v)| (n.into(), v)).collect()),
            locals: None,
        }
    }

    /// Returns a scope in which `name` resolves to `value`, all other names
    /// resolving as they do in `self`.
    pub fn with(&self, name: impl Into<String>, value: Value) -> Scope {
        Scope {
            globals: Arc::clone(&self.globals),
            locals: Some(Arc::new(Binding {
                name: name.into(),
                value,
                parent: self.locals.clone(),
            })),
        }
    }

    /// Returns a scope with `name` added to the globals, so that it stays
    /// visible to nested graphs.
    pub fn with_global(&self, name: impl Into<String>, value: Value) -> Scope {
        let mut globals = IndexMap::clone(&self.globals);
        globals.insert(name.into(), value);
        Scope {
            globals: Arc::new(globals),
            locals: self.locals.clone(),
        }
    }

    /// A fresh scope for compiling a nested graph: no local bindings carry
    /// over, the globals do.
    pub fn new_scope(&self) -> Scope {
        Scope {
            globals: Arc::clone(&self.globals),
            locals: None,
        }
    }

    /// Innermost local binding first, then the globals.
    pub fn lookup(&self, name: &str) -> Option<&Value> {
        let mut cursor = self.locals.as_deref();
        while let Some(binding) = cursor {
            if binding.name == name {
                return Some(&binding.value);
            }
            cursor = binding.parent.as_deref();
        }
        self.globals.get(name)
    }

    pub fn resolve(&self, name: &str) -> Result<Value, CompileError> {
        self.lookup(name)
            .cloned()
            .ok_or_else(|| CompileError::UndefinedName {
                name: name.to_string(),
            })
    }

    /// Names of the globals, in insertion order.
    pub fn global_names(&self) -> impl Iterator<Item = &str> {
        self.globals.keys().map(String::as_str)
    }
}

impl fmt::Debug for Scope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut locals = Vec::new();
        let mut cursor = self.locals.as_deref();
        while let Some(binding) = cursor {
            locals.push(binding.name.as_str());
            cursor = binding.parent.as_deref();
        }
        f.debug_struct("Scope")
            .field("globals", &self.globals.keys().collect::<Vec<_>>())
            .field("locals", &locals)
            .finish()
    }
}
