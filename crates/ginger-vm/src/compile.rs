//! Graph-to-function compiler.
//!
//! Compilation is a single recursive descent from the value bound to `out`,
//! following each value's one producing edge back towards `in`, constants and
//! names resolved in the [`Scope`]. Every distinct vertex and edge is
//! compiled once.
//!
//! # Reserved names
//!
//! - `in`: the argument of the function being compiled.
//! - `out`: the value the function returns.
//! - `if`: as an edge label over a junction `(pred, then, else)`, evaluates
//!   `else` when `pred` is the number `0` and `then` otherwise. The branch not
//!   taken is never evaluated.
//! - `recur`: as an edge label, calls the function being compiled.
//!
//! Any other edge label must resolve to something callable: a built-in or
//! other function from the scope, or a graph. Graphs written in place or
//! bound within the graph are compiled as nested functions with a fresh
//! scope. Graphs found in the scope, and labels which can only be resolved at
//! call time, are compiled and dispatched per call.

use std::collections::{HashMap, HashSet};

use ginger_core::{ContentId, EdgeIndex, EdgeRef, Graph, Identify, VertexIndex, VertexRef, View};

use crate::config::VmConfig;
use crate::edge_fn::EdgeFn;
use crate::error::{CompileError, RuntimeError, VmError};
use crate::function::{Function, WeakFunction};
use crate::scope::Scope;
use crate::value::Value;

/// The argument of the function being compiled.
pub const IN: &str = "in";
/// The value the compiled function returns.
pub const OUT: &str = "out";
/// Conditional edge label over `(pred, then, else)`.
pub const IF: &str = "if";
/// Edge label calling the function being compiled.
pub const RECUR: &str = "recur";

/// Compiles graphs into [`Function`]s.
#[derive(Debug, Clone, Default)]
pub struct Compiler {
    config: VmConfig,
}

impl Compiler {
    pub fn new(config: VmConfig) -> Self {
        Compiler { config }
    }

    pub fn config(&self) -> &VmConfig {
        &self.config
    }

    /// Compiles `graph` into a function from `in` to `out`, resolving free
    /// names in `scope`.
    pub fn compile(&self, graph: &Graph, scope: &Scope) -> Result<Function, CompileError> {
        let id = graph.content_id();
        tracing::debug!(graph = %id.short(), values = graph.len(), "compiling graph");

        let function = Function::deferred(format!("graph:{}", id.short()), self.config.max_call_depth);
        let mut ctx = GraphCompiler {
            compiler: self,
            view: graph.view(),
            scope,
            this: function.downgrade(),
            values: HashMap::new(),
            edges: HashMap::new(),
            nested: HashMap::new(),
            resolving: HashSet::new(),
        };
        let body = ctx.value_fn(&ginger_core::Value::name(OUT))?;
        let filled = function.fill(body);
        debug_assert!(filled, "fresh function body was already set");

        tracing::debug!(function = %function.name(), "compiled graph");
        Ok(function)
    }

    /// Turns a value reached as an edge label at call time into a function.
    fn callable(&self, callee: Value, scope: &Scope) -> Result<Function, RuntimeError> {
        match callee {
            Value::Function(f) => Ok(f),
            Value::Graph(g) => {
                tracing::debug!(graph = %g.content_id().short(), "compiling graph value at call time");
                self.compile(&g, scope)
                    .map_err(|e| RuntimeError::Compile(Box::new(e)))
            }
            other => Err(RuntimeError::NotCallable {
                value: other.to_string(),
            }),
        }
    }
}

/// Compiles `graph` with the default configuration.
pub fn function_from_graph(graph: &Graph, scope: &Scope) -> Result<Function, CompileError> {
    Compiler::default().compile(graph, scope)
}

/// Compiles `graph` and calls the result with `input`.
pub fn evaluate(graph: &Graph, input: Value, scope: &Scope) -> Result<Value, VmError> {
    let function = function_from_graph(graph, scope)?;
    Ok(function.call(input)?)
}

// ---------------------------------------------------------------------------
// Per-graph compilation state
// ---------------------------------------------------------------------------

struct GraphCompiler<'c, 'g> {
    compiler: &'c Compiler,
    view: &'g View,
    scope: &'c Scope,
    /// The function being compiled, for `recur`.
    this: WeakFunction,
    values: HashMap<VertexIndex, EdgeFn>,
    edges: HashMap<EdgeIndex, EdgeFn>,
    nested: HashMap<ContentId, Function>,
    /// Values whose producing edge is being compiled.
    resolving: HashSet<VertexIndex>,
}

impl<'c, 'g> GraphCompiler<'c, 'g> {
    /// Compiles the value flowing out of the Value-vertex holding `val`.
    fn value_fn(&mut self, val: &ginger_core::Value) -> Result<EdgeFn, CompileError> {
        if val.is_name(IN) {
            return Ok(EdgeFn::Input);
        }
        let Some(name) = val.as_name() else {
            return Ok(EdgeFn::Const(val.clone().into()));
        };

        let vertex = match self.view.vertex(val) {
            Some(vertex) if !vertex.ins().is_empty() => vertex,
            _ => return Ok(EdgeFn::Const(self.scope.resolve(name)?)),
        };
        let ins = vertex.ins();
        if ins.len() > 1 {
            return Err(CompileError::AmbiguousBinding {
                name: name.to_string(),
                count: ins.len(),
            });
        }

        let index = vertex.index();
        if let Some(compiled) = self.values.get(&index) {
            return Ok(compiled.clone());
        }
        if !self.resolving.insert(index) {
            return Err(CompileError::CyclicDefinition {
                name: name.to_string(),
            });
        }
        let compiled = self.edge_fn(ins[0]);
        self.resolving.remove(&index);

        let compiled = compiled?;
        self.values.insert(index, compiled.clone());
        Ok(compiled)
    }

    fn edge_fn(&mut self, edge: EdgeRef<'g>) -> Result<EdgeFn, CompileError> {
        if let Some(compiled) = self.edges.get(&edge.index()) {
            return Ok(compiled.clone());
        }

        let from = edge.from();
        let label = edge.label();
        let compiled = match from.value() {
            _ if label.is_some_and(|l| l.is_name(IF)) => self.if_fn(from)?,
            Some(val) => {
                let input = self.value_fn(val)?;
                self.apply(label, input)?
            }
            None => {
                let input = self.junction_fn(from)?;
                self.apply(label, input)?
            }
        };

        self.edges.insert(edge.index(), compiled.clone());
        Ok(compiled)
    }

    fn junction_fn(&mut self, junction: VertexRef<'g>) -> Result<EdgeFn, CompileError> {
        let ins = junction.ins();
        if ins.is_empty() {
            return Err(CompileError::EmptyJunction);
        }
        let mut parts = ins
            .into_iter()
            .map(|e| self.edge_fn(e))
            .collect::<Result<Vec<_>, _>>()?;
        if parts.len() == 1 {
            return Ok(parts.remove(0));
        }
        Ok(EdgeFn::tuple(parts))
    }

    fn if_fn(&mut self, from: VertexRef<'g>) -> Result<EdgeFn, CompileError> {
        // A plain value source is a single input.
        let ins = match from.value() {
            Some(_) => return Err(CompileError::IfArity { found: 1 }),
            None => from.ins(),
        };
        let [pred, then, otherwise] = ins[..] else {
            return Err(CompileError::IfArity { found: ins.len() });
        };
        let pred = self.edge_fn(pred)?;
        let then = self.edge_fn(then)?;
        let otherwise = self.edge_fn(otherwise)?;

        if let EdgeFn::Const(Value::Number(n)) = pred {
            return Ok(if n == 0 { otherwise } else { then });
        }
        Ok(EdgeFn::dynamic(move |frame| match pred.eval(frame)? {
            Value::Number(0) => otherwise.eval(frame),
            Value::Number(_) => then.eval(frame),
            other => Err(RuntimeError::TypeMismatch {
                expected: "Number".to_string(),
                got: other.type_name().to_string(),
            }),
        }))
    }

    /// Applies the edge label `label` to `input`.
    fn apply(
        &mut self,
        label: Option<&ginger_core::Value>,
        input: EdgeFn,
    ) -> Result<EdgeFn, CompileError> {
        let Some(label) = label else {
            return Ok(input);
        };

        if label.is_name(RECUR) {
            let this = self.this.clone();
            return Ok(EdgeFn::dynamic(move |frame| {
                let function = this.upgrade().ok_or_else(|| RuntimeError::Internal {
                    message: "recur outlived its function".to_string(),
                })?;
                let arg = input.eval(frame)?;
                function.invoke(arg, frame.depth)
            }));
        }

        let from_scope = self.resolves_in_scope(label);
        let function = match self.value_fn(label)? {
            EdgeFn::Const(Value::Function(f)) => f,
            // A graph taken from the scope may refer to itself by name, so it
            // is compiled per call instead.
            EdgeFn::Const(Value::Graph(g)) if !from_scope => self.nested(&g)?,
            EdgeFn::Const(other) if !matches!(other, Value::Graph(_)) => {
                return Err(CompileError::NotCallable {
                    value: other.to_string(),
                })
            }
            callee => {
                let compiler = self.compiler.clone();
                let scope = self.scope.new_scope();
                return Ok(EdgeFn::dynamic(move |frame| {
                    let function = compiler.callable(callee.eval(frame)?, &scope)?;
                    let arg = input.eval(frame)?;
                    function.invoke(arg, frame.depth)
                }));
            }
        };

        Ok(EdgeFn::dynamic(move |frame| {
            let arg = input.eval(frame)?;
            function.invoke(arg, frame.depth)
        }))
    }

    /// Returns `true` if `val` is a name this graph leaves free.
    fn resolves_in_scope(&self, val: &ginger_core::Value) -> bool {
        val.as_name().is_some()
            && !val.is_name(IN)
            && self.view.vertex(val).map_or(true, |v| v.ins().is_empty())
    }

    /// Compiles a graph used as an edge label, once per distinct graph.
    fn nested(&mut self, graph: &Graph) -> Result<Function, CompileError> {
        let id = graph.content_id();
        if let Some(function) = self.nested.get(&id) {
            return Ok(function.clone());
        }
        let function = self
            .compiler
            .compile(graph, &self.scope.new_scope())
            .map_err(|e| CompileError::Nested(Box::new(e)))?;
        self.nested.insert(id, function.clone());
        Ok(function)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builtins::global_scope;
    use ginger_core::HalfEdge;

    fn name(s: &str) -> ginger_core::Value {
        ginger_core::Value::name(s)
    }

    fn val(v: ginger_core::Value) -> HalfEdge {
        HalfEdge::value_out(v, None)
    }

    fn out(edge: HalfEdge) -> Graph {
        Graph::new().add_value_in(edge, name(OUT))
    }

    #[test]
    fn identity() {
        let f = function_from_graph(&out(val(name(IN))), &Scope::new()).unwrap();
        assert_eq!(f.call(Value::Number(3)), Ok(Value::Number(3)));
        assert_eq!(f.call(Value::zero()), Ok(Value::zero()));
    }

    #[test]
    fn constants_need_no_scope() {
        let g = out(val(ginger_core::Value::number(42)));
        assert_eq!(evaluate(&g, Value::zero(), &Scope::new()), Ok(Value::Number(42)));
    }

    #[test]
    fn missing_out_is_undefined() {
        let err = function_from_graph(&Graph::new(), &Scope::new()).unwrap_err();
        assert_eq!(err, CompileError::UndefinedName { name: OUT.into() });
    }

    #[test]
    fn free_names_resolve_in_scope() {
        let g = out(val(name("x")));
        let scope = Scope::new().with("x", Value::Number(9));
        assert_eq!(evaluate(&g, Value::zero(), &scope), Ok(Value::Number(9)));
    }

    #[test]
    fn junction_builds_tuple() {
        let g = out(HalfEdge::junction_out(
            [val(name(IN)), val(ginger_core::Value::number(1))],
            None,
        ));
        assert_eq!(
            evaluate(&g, Value::Number(0), &Scope::new()),
            Ok(Value::Tuple(vec![Value::Number(0), Value::Number(1)]))
        );
    }

    #[test]
    fn empty_junction() {
        let g = out(HalfEdge::junction_out(Vec::new(), name("add")));
        let err = function_from_graph(&g, &global_scope()).unwrap_err();
        assert_eq!(err, CompileError::EmptyJunction);
    }

    #[test]
    fn if_arity() {
        let two = HalfEdge::junction_out([val(name(IN)), val(name(IN))], name(IF));
        let err = function_from_graph(&out(two), &Scope::new()).unwrap_err();
        assert_eq!(err, CompileError::IfArity { found: 2 });

        let one = HalfEdge::value_out(name(IN), name(IF));
        let err = function_from_graph(&out(one), &Scope::new()).unwrap_err();
        assert_eq!(err, CompileError::IfArity { found: 1 });
    }

    #[test]
    fn untaken_branch_still_compiles() {
        let edge = HalfEdge::junction_out(
            [
                val(ginger_core::Value::number(1)),
                val(name("yes")),
                HalfEdge::value_out(name(IN), name("missing")),
            ],
            name(IF),
        );
        // Both branches still have to compile.
        let err = function_from_graph(&out(edge), &Scope::new()).unwrap_err();
        assert_eq!(err, CompileError::UndefinedName { name: "yes".into() });
    }

    #[test]
    fn non_callable_constant_label() {
        let g = out(HalfEdge::value_out(name(IN), ginger_core::Value::number(5)));
        let err = function_from_graph(&g, &Scope::new()).unwrap_err();
        assert_eq!(err, CompileError::NotCallable { value: "5".into() });
    }

    #[test]
    fn shared_definitions_compile_once() {
        // out = add < (x, x); x = add < (in, in);
        let g = Graph::new()
            .add_value_in(
                HalfEdge::junction_out([val(name(IN)), val(name(IN))], name("add")),
                name("x"),
            )
            .add_value_in(
                HalfEdge::junction_out([val(name("x")), val(name("x"))], name("add")),
                name(OUT),
            );
        assert_eq!(evaluate(&g, Value::Number(3), &global_scope()), Ok(Value::Number(12)));
    }

    #[test]
    fn compiled_function_names_graph() {
        let g = out(val(name(IN)));
        let f = function_from_graph(&g, &Scope::new()).unwrap();
        assert_eq!(f.name(), format!("graph:{}", g.content_id().short()));
    }

    #[test]
    fn config_is_kept() {
        let compiler = Compiler::new(VmConfig { max_call_depth: 3 });
        assert_eq!(compiler.config().max_call_depth, 3);
        assert_eq!(Compiler::default().config(), &VmConfig::default());
    }
}
