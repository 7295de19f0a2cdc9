//! Template rendering engine for PMD templates.
//!
//! This module walks a parsed node tree and produces the output text. It
//! evaluates expressions against the render scope, selects conditional
//! branches, runs loops and renders included templates in place.

use std::borrow::Cow;
use std::cmp::Ordering;

use crate::error::Error;
use crate::interpreter::context::{RenderContext, Resolution};
use crate::interpreter::error::EvalError;
use crate::interpreter::include::IncludeResolver;
use crate::parser::ast::{CompareOp, Expr, Node, Position};
use crate::types::{Template, Value};

/// Render a template, producing its output text.
///
/// This is the core rendering function:
/// - Text nodes are copied directly to output
/// - Variable nodes are evaluated and written in canonical form
/// - Conditionals render the first branch whose condition is truthy
/// - Loops render their body once per element with a fresh frame
/// - Includes render the included template against the same scope
///
/// # Errors
///
/// Returns an error if:
/// - A comparison has operands with no order
/// - A path is unresolvable under [`Resolution::Strict`]
/// - A loop iterates over a non-collection
/// - An include is missing, circular or nested too deeply
/// - An included template fails to parse
///
/// Output is only returned when the whole walk succeeds.
pub fn render_template(
    template: &Template,
    ctx: &mut RenderContext<'_>,
    resolver: &IncludeResolver<'_>,
) -> Result<String, Error> {
    let mut output = String::new();
    render_nodes(template.nodes(), template, ctx, resolver, &mut output)?;
    Ok(output)
}

fn render_nodes(
    nodes: &[Node],
    template: &Template,
    ctx: &mut RenderContext<'_>,
    resolver: &IncludeResolver<'_>,
    output: &mut String,
) -> Result<(), Error> {
    for node in nodes {
        render_node(node, template, ctx, resolver, output)?;
    }
    Ok(())
}

fn render_node(
    node: &Node,
    template: &Template,
    ctx: &mut RenderContext<'_>,
    resolver: &IncludeResolver<'_>,
    output: &mut String,
) -> Result<(), Error> {
    match node {
        Node::Text(text) => output.push_str(text),
        Node::Variable { expr, .. } => {
            let value = evaluate(expr, ctx).map_err(|source| eval_error(template, source))?;
            output.push_str(&value.to_string());
        }
        Node::Conditional {
            branches,
            else_body,
        } => {
            let mut selected = else_body.as_deref();
            for branch in branches {
                let truthy = evaluate(&branch.condition, ctx)
                    .map_err(|source| eval_error(template, source))?
                    .is_truthy();
                if truthy {
                    selected = Some(branch.body.as_slice());
                    break;
                }
            }
            if let Some(body) = selected {
                render_nodes(body, template, ctx, resolver, output)?;
            }
        }
        Node::Loop {
            binding,
            secondary,
            source,
            body,
            position,
        } => {
            let items = evaluate(source, ctx)
                .map_err(|source| eval_error(template, source))?
                .into_owned();
            let frames = loop_frames(items, binding, secondary.as_deref(), *position)
                .map_err(|source| eval_error(template, source))?;
            for frame in frames {
                ctx.scope_mut().push_frame(frame);
                let result = render_nodes(body, template, ctx, resolver, output);
                ctx.scope_mut().pop_frame();
                result?;
            }
        }
        Node::Include { path, position } => {
            let included = resolver.enter(ctx, template, path, *position)?;
            let result = render_nodes(included.nodes(), &included, ctx, resolver, output);
            ctx.pop_include();
            result?;
        }
    }
    Ok(())
}

/// The bindings for each iteration of a loop over `items`.
///
/// Arrays bind the element, or `(index, element)` with two names. Objects
/// bind the value, or `(key, value)` with two names, in insertion order.
/// Null iterates zero times.
fn loop_frames(
    items: Value,
    binding: &str,
    secondary: Option<&str>,
    position: Position,
) -> Result<Vec<Vec<(String, Value)>>, EvalError> {
    let pair = |first: Value, second: Value| match secondary {
        Some(name) => vec![(binding.to_string(), first), (name.to_string(), second)],
        None => vec![(binding.to_string(), second)],
    };
    match items {
        Value::Null => Ok(Vec::new()),
        Value::Array(elements) => Ok(elements
            .into_iter()
            .enumerate()
            .map(|(index, element)| pair(Value::from(index), element))
            .collect()),
        Value::Object(entries) => Ok(entries
            .into_iter()
            .map(|(key, value)| pair(Value::String(key), value))
            .collect()),
        Value::Bool(_) | Value::Number(_) | Value::String(_) => Err(EvalError::NotIterable {
            kind: items.kind(),
            position,
        }),
    }
}

/// Evaluate an expression against the current scope.
///
/// Paths borrow from the scope; operators produce owned booleans.
pub fn evaluate<'v>(
    expr: &'v Expr,
    ctx: &'v RenderContext<'_>,
) -> Result<Cow<'v, Value>, EvalError> {
    match expr {
        Expr::Literal(value) => Ok(Cow::Borrowed(value)),
        Expr::Path(path) => match ctx.scope().resolve(path) {
            Some(value) => Ok(Cow::Borrowed(value)),
            None => match ctx.resolution() {
                Resolution::Lenient => {
                    log::trace!("'{path}' is not defined, using null");
                    Ok(Cow::Owned(Value::Null))
                }
                Resolution::Strict => Err(EvalError::Unresolved {
                    path: path.to_string(),
                    position: path.position,
                }),
            },
        },
        Expr::Compare {
            op,
            lhs,
            rhs,
            position,
        } => {
            let lhs = evaluate(lhs, ctx)?;
            let rhs = evaluate(rhs, ctx)?;
            compare(*op, &lhs, &rhs, *position).map(|result| Cow::Owned(Value::Bool(result)))
        }
        Expr::Not(operand) => {
            let truthy = evaluate(operand, ctx)?.is_truthy();
            Ok(Cow::Owned(Value::Bool(!truthy)))
        }
        Expr::And(lhs, rhs) => {
            let result = evaluate(lhs, ctx)?.is_truthy() && evaluate(rhs, ctx)?.is_truthy();
            Ok(Cow::Owned(Value::Bool(result)))
        }
        Expr::Or(lhs, rhs) => {
            let result = evaluate(lhs, ctx)?.is_truthy() || evaluate(rhs, ctx)?.is_truthy();
            Ok(Cow::Owned(Value::Bool(result)))
        }
    }
}

/// Apply a comparison operator.
///
/// Equality holds only between values of the same kind, so `1 == "1"` is
/// false. Ordering is defined for two numbers or two strings; any other pair
/// is an error. Strings order by code point.
pub fn compare(
    op: CompareOp,
    lhs: &Value,
    rhs: &Value,
    position: Position,
) -> Result<bool, EvalError> {
    if !op.is_ordering() {
        let equal = lhs == rhs;
        return Ok(if op == CompareOp::Eq { equal } else { !equal });
    }
    let ordering = match (lhs, rhs) {
        (Value::Number(a), Value::Number(b)) => a.partial_cmp(b),
        (Value::String(a), Value::String(b)) => Some(a.cmp(b)),
        _ => {
            return Err(EvalError::Incomparable {
                op,
                lhs: lhs.kind(),
                rhs: rhs.kind(),
                position,
            });
        }
    };
    // NaN has no order, so every ordering comparison with it is false.
    Ok(ordering.is_some_and(|ordering| ordering_holds(op, ordering)))
}

fn ordering_holds(op: CompareOp, ordering: Ordering) -> bool {
    match op {
        CompareOp::Eq => ordering.is_eq(),
        CompareOp::Ne => ordering.is_ne(),
        CompareOp::Lt => ordering.is_lt(),
        CompareOp::Le => ordering.is_le(),
        CompareOp::Gt => ordering.is_gt(),
        CompareOp::Ge => ordering.is_ge(),
    }
}

fn eval_error(template: &Template, source: EvalError) -> Error {
    Error::Eval {
        path: template.path().to_path_buf(),
        source,
    }
}
