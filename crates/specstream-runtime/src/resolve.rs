//! Prop value resolution.
//!
//! `None` plays the role of `undefined`: a binding to state that does not
//! exist, or to a repeat item outside any repeat.

use crate::visibility::evaluate;
use crate::ResolveContext;
use serde_json::{Map, Value};
use specstream_compiler::PropValue;
use specstream_patch::Pointer;
use std::collections::BTreeMap;

/// Resolve a prop value against `ctx`.
pub fn resolve(value: &PropValue, ctx: &ResolveContext<'_>) -> Option<Value> {
    match value {
        PropValue::Literal(v) => Some(v.clone()),
        PropValue::State(path) | PropValue::BindState(path) => read_state(ctx, path).cloned(),
        PropValue::Item(field) | PropValue::BindItem(field) => read_item(ctx, field).cloned(),
        PropValue::Index => ctx.repeat.as_ref().map(|scope| Value::from(scope.index)),
        PropValue::Template(template) => Some(Value::String(interpolate(template, ctx))),
        PropValue::Cond {
            cond,
            then,
            otherwise,
        } => {
            let branch = if evaluate(cond, ctx) { then } else { otherwise };
            branch.as_deref().and_then(|v| resolve(v, ctx))
        }
        PropValue::Object(props) => Some(Value::Object(resolve_props(props, ctx))),
        PropValue::Array(items) => Some(Value::Array(
            items
                .iter()
                .map(|item| resolve(item, ctx).unwrap_or(Value::Null))
                .collect(),
        )),
    }
}

/// Resolve every prop. Props that resolve to undefined are left out.
pub fn resolve_props(props: &BTreeMap<String, PropValue>, ctx: &ResolveContext<'_>) -> Map<String, Value> {
    props
        .iter()
        .filter_map(|(name, value)| resolve(value, ctx).map(|v| (name.clone(), v)))
        .collect()
}

/// The state pointer a two-way binding writes to.
///
/// `$bindState` yields its own pointer; `$bindItem` yields the field under the
/// current repeat item's base path. Everything else, and `$bindItem` outside a
/// repeat, yields `None`.
pub fn binding_path(value: &PropValue, ctx: &ResolveContext<'_>) -> Option<String> {
    match value {
        PropValue::BindState(path) => Some(Pointer::parse(path).to_string()),
        PropValue::BindItem(field) => {
            let scope = ctx.repeat.as_ref()?;
            let field = Pointer::parse(field);
            let mut path = Pointer::parse(&scope.base_path);
            for segment in field.segments() {
                path = path.join(segment.as_str());
            }
            Some(path.to_string())
        }
        _ => None,
    }
}

fn read_state<'a>(ctx: &ResolveContext<'a>, path: &str) -> Option<&'a Value> {
    Pointer::parse(path).get(ctx.state)
}

fn read_item<'a>(ctx: &ResolveContext<'a>, field: &str) -> Option<&'a Value> {
    let scope = ctx.repeat.as_ref()?;
    Pointer::parse(field).get(scope.item)
}

/// Replace each `${/pointer}` with the stringified state value.
/// An unterminated `${` is kept as text.
fn interpolate(template: &str, ctx: &ResolveContext<'_>) -> String {
    let mut out = String::with_capacity(template.len());
    let mut rest = template;

    while let Some(start) = rest.find("${") {
        out.push_str(&rest[..start]);
        let after = &rest[start + 2..];
        let Some(end) = after.find('}') else {
            out.push_str(&rest[start..]);
            return out;
        };
        if let Some(value) = read_state(ctx, after[..end].trim()) {
            out.push_str(&display(value));
        }
        rest = &after[end + 1..];
    }

    out.push_str(rest);
    out
}

fn display(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}
