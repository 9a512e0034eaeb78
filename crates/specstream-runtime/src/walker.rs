//! Tree walker.
//!
//! Starts at the root, skips hidden elements, resolves props and hands each
//! element to a [`Visitor`]. Children of a repeat element are visited once per
//! item, with that item in scope. The walker itself never builds output.
//!
//! Child references come from an untrusted producer, so two guards bound the
//! recursion: a key already on the ancestor stack is not entered again, and
//! nothing below [`MAX_DEPTH`] ancestors is visited.

use crate::repeat::{expand, ItemContext};
use crate::resolve::{binding_path, resolve_props};
use crate::visibility::evaluate;
use crate::ResolveContext;
use serde_json::{Map, Value};
use specstream_compiler::{Element, Spec};
use std::collections::BTreeMap;

/// Deepest nesting the walker descends into.
pub const MAX_DEPTH: usize = 256;

/// An element with its props resolved for the current context.
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedElement<'s> {
    pub key: &'s str,
    pub element: &'s Element,
    pub props: Map<String, Value>,
    /// Prop name to the state pointer a two-way binding writes to.
    pub bindings: BTreeMap<String, String>,
    /// Number of ancestors.
    pub depth: usize,
}

impl ResolvedElement<'_> {
    pub fn element_type(&self) -> &str {
        &self.element.element_type
    }
}

/// Receives elements in depth-first order.
pub trait Visitor {
    /// Called before an element's children. Return `false` to skip them.
    fn enter(&mut self, node: &ResolvedElement<'_>) -> bool;

    /// Called after an element's children, also when `enter` returned `false`.
    fn leave(&mut self, _node: &ResolvedElement<'_>) {}

    /// Called before the children of one repeat item.
    fn enter_item(&mut self, _item: &ItemContext<'_>) {}

    /// Called after the children of one repeat item.
    fn leave_item(&mut self, _item: &ItemContext<'_>) {}
}

/// Walk `spec` from its root against `state`.
pub fn walk<V: Visitor + ?Sized>(spec: &Spec, state: &Value, visitor: &mut V) {
    if spec.root.is_empty() {
        tracing::trace!("Spec has no root yet; nothing to walk");
        return;
    }
    visit(spec, &spec.root, &ResolveContext::new(state), visitor);
}

/// Walk the subtree at `key` with an explicit context.
pub fn visit<V: Visitor + ?Sized>(spec: &Spec, key: &str, ctx: &ResolveContext<'_>, visitor: &mut V) {
    let mut walker = Walker {
        spec,
        visitor,
        ancestors: Vec::new(),
    };
    walker.visit(key, ctx);
}

struct Walker<'s, 'v, V: ?Sized> {
    spec: &'s Spec,
    visitor: &'v mut V,
    ancestors: Vec<&'s str>,
}

impl<'s, V: Visitor + ?Sized> Walker<'s, '_, V> {
    fn visit(&mut self, key: &str, ctx: &ResolveContext<'_>) {
        let Some((key, element)) = self.spec.elements.get_key_value(key) else {
            // Streaming: a child may be referenced before its element arrives
            tracing::trace!(key, "Element not found; skipping");
            return;
        };
        let key = key.as_str();

        if self.ancestors.contains(&key) {
            tracing::warn!(key, depth = self.ancestors.len(), "Element is its own ancestor; cutting cycle");
            return;
        }

        if self.ancestors.len() >= MAX_DEPTH {
            tracing::warn!(key, max = MAX_DEPTH, "Element nested too deep; skipping subtree");
            return;
        }

        if let Some(visible) = &element.visible {
            if !evaluate(visible, ctx) {
                return;
            }
        }

        let node = ResolvedElement {
            key,
            element,
            props: resolve_props(&element.props, ctx),
            bindings: element
                .props
                .iter()
                .filter_map(|(name, value)| binding_path(value, ctx).map(|path| (name.clone(), path)))
                .collect(),
            depth: self.ancestors.len(),
        };

        if self.visitor.enter(&node) {
            self.ancestors.push(key);
            self.visit_children(element, ctx);
            self.ancestors.pop();
        }
        self.visitor.leave(&node);
    }

    fn visit_children(&mut self, element: &'s Element, ctx: &ResolveContext<'_>) {
        if element.repeat.is_none() {
            for child in &element.children {
                self.visit(child, ctx);
            }
            return;
        }

        for item in expand(element, ctx) {
            self.visitor.enter_item(&item);
            let item_ctx = ctx.with_item(&item);
            for child in &element.children {
                self.visit(child, &item_ctx);
            }
            self.visitor.leave_item(&item);
        }
    }
}
