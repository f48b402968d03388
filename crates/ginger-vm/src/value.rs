//! Runtime value representation for compiled graph functions.
//!
//! [`Value`] extends the stored value model of `ginger-core` with the two
//! kinds that only exist while a function runs: compiled [`Function`]s and
//! [`Tuple`](Value::Tuple)s built by junctions.

use std::fmt;

use ginger_core::Graph;

use crate::function::Function;

/// A value flowing along an edge at run time.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Name(String),
    Number(i64),
    Graph(Graph),
    Function(Function),
    /// Junction inputs, in order.
    Tuple(Vec<Value>),
}

impl Value {
    /// The empty value: a tuple with no elements.
    pub fn zero() -> Value {
        Value::Tuple(Vec::new())
    }

    pub fn is_zero(&self) -> bool {
        matches!(self, Value::Tuple(items) if items.is_empty())
    }

    pub fn as_number(&self) -> Option<i64> {
        match self {
            Value::Number(n) => Some(*n),
            _ => None,
        }
    }

    pub fn as_name(&self) -> Option<&str> {
        match self {
            Value::Name(name) => Some(name),
            _ => None,
        }
    }

    pub fn as_tuple(&self) -> Option<&[Value]> {
        match self {
            Value::Tuple(items) => Some(items),
            _ => None,
        }
    }

    pub fn as_function(&self) -> Option<&Function> {
        match self {
            Value::Function(f) => Some(f),
            _ => None,
        }
    }

    /// Returns a human-readable description of the value's type.
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Name(_) => "Name",
            Value::Number(_) => "Number",
            Value::Graph(_) => "Graph",
            Value::Function(_) => "Function",
            Value::Tuple(_) => "Tuple",
        }
    }

    /// Converts back to a storable value. Functions and tuples have no
    /// stored form.
    pub fn into_core(self) -> Option<ginger_core::Value> {
        match self {
            Value::Name(name) => Some(ginger_core::Value::Name(name)),
            Value::Number(n) => Some(ginger_core::Value::Number(n)),
            Value::Graph(g) => Some(ginger_core::Value::Graph(g)),
            Value::Function(_) | Value::Tuple(_) => None,
        }
    }
}

impl From<ginger_core::Value> for Value {
    fn from(val: ginger_core::Value) -> Self {
        match val {
            ginger_core::Value::Name(name) => Value::Name(name),
            ginger_core::Value::Number(n) => Value::Number(n),
            ginger_core::Value::Graph(g) => Value::Graph(g),
        }
    }
}

impl From<i64> for Value {
    fn from(n: i64) -> Self {
        Value::Number(n)
    }
}

impl From<Function> for Value {
    fn from(f: Function) -> Self {
        Value::Function(f)
    }
}

impl From<Vec<Value>> for Value {
    fn from(items: Vec<Value>) -> Self {
        Value::Tuple(items)
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Name(name) => f.write_str(name),
            Value::Number(n) => write!(f, "{}", n),
            Value::Graph(g) => write!(f, "{}", g),
            Value::Function(func) => write!(f, "{}", func),
            Value::Tuple(items) => {
                f.write_str("(")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{}", item)?;
                }
                f.write_str(")")
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zero_is_empty_tuple() {
        assert!(Value::zero().is_zero());
        assert!(!Value::Tuple(vec![Value::Number(0)]).is_zero());
        assert!(!Value::Number(0).is_zero());
    }

    #[test]
    fn core_conversion() {
        let val: Value = ginger_core::Value::name("a").into();
        assert_eq!(val, Value::Name("a".into()));
        assert_eq!(val.into_core(), Some(ginger_core::Value::name("a")));
        assert_eq!(Value::zero().into_core(), None);
    }

    #[test]
    fn functions_compare_by_handle() {
        let f = Function::native("id", Ok);
        let g = Function::native("id", Ok);
        assert_eq!(Value::Function(f.clone()), Value::Function(f));
        assert_ne!(Value::Function(g), Value::Function(Function::native("id", Ok)));
    }

    #[test]
    fn display() {
        let val = Value::Tuple(vec![
            Value::Number(1),
            Value::Name("x".into()),
            Value::Function(Function::native("add", Ok)),
            Value::zero(),
        ]);
        assert_eq!(val.to_string(), "(1, x, <fn add>, ())");
        assert_eq!(Value::Graph(Graph::new()).to_string(), "{}");
    }

    #[test]
    fn type_names() {
        assert_eq!(Value::zero().type_name(), "Tuple");
        assert_eq!(Value::Number(1).type_name(), "Number");
        assert_eq!(Value::Graph(Graph::new()).type_name(), "Graph");
    }
}
