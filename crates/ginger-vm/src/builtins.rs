//! Built-in global functions.

use crate::error::RuntimeError;
use crate::function::Function;
use crate::scope::Scope;
use crate::value::Value;

/// Builds the default global scope: `add`, `sub`, `mul` and `eq`.
///
/// Construct it once and pass it to every top-level compile.
pub fn global_scope() -> Scope {
    Scope::with_globals([
        ("add", Value::Function(Function::native("add", add))),
        ("sub", Value::Function(Function::native("sub", sub))),
        ("mul", Value::Function(Function::native("mul", mul))),
        ("eq", Value::Function(Function::native("eq", eq))),
    ])
}

fn add(input: Value) -> Result<Value, RuntimeError> {
    let nums = numbers("add", &input, 1)?;
    nums[1..]
        .iter()
        .try_fold(nums[0], |acc, n| acc.checked_add(*n))
        .map(Value::Number)
        .ok_or_else(|| overflow("add"))
}

fn sub(input: Value) -> Result<Value, RuntimeError> {
    let nums = numbers("sub", &input, 2)?;
    if nums.len() != 2 {
        return Err(arity("sub", "2", nums.len()));
    }
    nums[0]
        .checked_sub(nums[1])
        .map(Value::Number)
        .ok_or_else(|| overflow("sub"))
}

fn mul(input: Value) -> Result<Value, RuntimeError> {
    let nums = numbers("mul", &input, 1)?;
    nums[1..]
        .iter()
        .try_fold(nums[0], |acc, n| acc.checked_mul(*n))
        .map(Value::Number)
        .ok_or_else(|| overflow("mul"))
}

fn eq(input: Value) -> Result<Value, RuntimeError> {
    match input.as_tuple() {
        Some([a, b]) => Ok(Value::Number(i64::from(a == b))),
        Some(items) => Err(arity("eq", "2", items.len())),
        None => Err(tuple_expected(&input)),
    }
}

/// Unpacks a tuple of at least `min` numbers.
fn numbers(function: &str, input: &Value, min: usize) -> Result<Vec<i64>, RuntimeError> {
    let items = input.as_tuple().ok_or_else(|| tuple_expected(input))?;
    if items.len() < min {
        return Err(arity(function, &format!("at least {}", min), items.len()));
    }
    items
        .iter()
        .map(|item| {
            item.as_number().ok_or_else(|| RuntimeError::TypeMismatch {
                expected: "Number".to_string(),
                got: item.type_name().to_string(),
            })
        })
        .collect()
}

fn tuple_expected(got: &Value) -> RuntimeError {
    RuntimeError::TypeMismatch {
        expected: "Tuple".to_string(),
        got: got.type_name().to_string(),
    }
}

fn arity(function: &str, expected: &str, found: usize) -> RuntimeError {
    RuntimeError::ArityMismatch {
        function: function.to_string(),
        expected: expected.to_string(),
        found,
    }
}

fn overflow(function: &str) -> RuntimeError {
    RuntimeError::IntegerOverflow {
        function: function.to_string(),
    }
}
