//! Resolved render tree.
//!
//! [`TreeBuilder`] is the reference [`Visitor`]: it materializes what a
//! framework adapter would draw, as plain serializable data. The CLI and the
//! WASM bindings render through it.

use crate::walker::{walk, ResolvedElement, Visitor};
use crate::ItemContext;
use serde::Serialize;
use serde_json::{Map, Value};
use specstream_compiler::Spec;
use std::collections::BTreeMap;

/// A visible element with resolved props.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RenderNode {
    pub key: String,
    #[serde(rename = "type")]
    pub element_type: String,
    pub props: Map<String, Value>,
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub bindings: BTreeMap<String, String>,
    /// Identity of the repeat item this node was rendered for.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub item_key: Option<String>,
    pub children: Vec<RenderNode>,
}

/// Builds a [`RenderNode`] tree from a walk.
#[derive(Debug, Default)]
pub struct TreeBuilder {
    stack: Vec<RenderNode>,
    items: Vec<(String, usize)>,
    root: Option<RenderNode>,
}

impl TreeBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// The finished tree; `None` if the root was missing or hidden.
    pub fn finish(self) -> Option<RenderNode> {
        self.root
    }
}

impl Visitor for TreeBuilder {
    fn enter(&mut self, node: &ResolvedElement<'_>) -> bool {
        // Direct children of a repeat element carry the item key
        let item_key = self
            .items
            .last()
            .filter(|(_, level)| *level == self.stack.len())
            .map(|(key, _)| key.clone());

        self.stack.push(RenderNode {
            key: node.key.to_string(),
            element_type: node.element_type().to_string(),
            props: node.props.clone(),
            bindings: node.bindings.clone(),
            item_key,
            children: Vec::new(),
        });
        true
    }

    fn leave(&mut self, _node: &ResolvedElement<'_>) {
        let Some(done) = self.stack.pop() else {
            return;
        };
        match self.stack.last_mut() {
            Some(parent) => parent.children.push(done),
            None => self.root = Some(done),
        }
    }

    fn enter_item(&mut self, item: &ItemContext<'_>) {
        self.items.push((item.key.clone(), self.stack.len()));
    }

    fn leave_item(&mut self, _item: &ItemContext<'_>) {
        self.items.pop();
    }
}

/// Walk `spec` against `state` and return the visible tree.
pub fn render(spec: &Spec, state: &Value) -> Option<RenderNode> {
    let mut builder = TreeBuilder::new();
    walk(spec, state, &mut builder);
    builder.finish()
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn todo_spec() -> Spec {
        Spec::from_document(&json!({
            "root": "list",
            "elements": {
                "list": {"type": "List", "repeat": {"statePath": "/todos", "key": "id"}, "children": ["row"]},
                "row": {"type": "Row", "props": {"title": {"$item": "title"}}, "children": ["check"]},
                "check": {"type": "Checkbox", "props": {"checked": {"$bindItem": "done"}}}
            }
        }))
    }

    // =========================================================================
    // Tree shape
    // =========================================================================

    #[test]
    fn test_render_repeat() {
        let state = json!({"todos": [{"id": "a", "title": "Milk", "done": true}, {"id": "b", "title": "Eggs", "done": false}]});
        let tree = render(&todo_spec(), &state).unwrap();

        assert_eq!(tree.key, "list");
        assert_eq!(tree.item_key, None);
        assert_eq!(tree.children.len(), 2);

        let keys: Vec<_> = tree.children.iter().map(|c| c.item_key.clone()).collect();
        assert_eq!(keys, vec![Some("a".to_string()), Some("b".to_string())]);

        let first = &tree.children[0];
        assert_eq!(Value::Object(first.props.clone()), json!({"title": "Milk"}));
        // Grandchildren belong to the row, not directly to the item
        assert_eq!(first.children[0].item_key, None);
        assert_eq!(first.children[0].bindings["checked"], "/todos/0/done");
        assert_eq!(first.children[0].props["checked"], json!(true));
    }

    #[test]
    fn test_render_hidden_root() {
        let spec = Spec::from_document(&json!({
            "root": "a",
            "elements": {"a": {"type": "Text", "visible": false}}
        }));
        assert_eq!(render(&spec, &json!({})), None);
    }

    #[test]
    fn test_render_missing_root() {
        let spec = Spec::from_document(&json!({"root": "a", "elements": {}}));
        assert_eq!(render(&spec, &json!({})), None);
    }

    // =========================================================================
    // Serialization
    // =========================================================================

    #[test]
    fn test_render_node_json() {
        let spec = Spec::from_document(&json!({
            "root": "t",
            "elements": {"t": {"type": "Text", "props": {"content": {"$template": "Hi ${/name}"}}}}
        }));
        let tree = render(&spec, &json!({"name": "Ada"})).unwrap();
        assert_eq!(
            serde_json::to_value(&tree).unwrap(),
            json!({"key": "t", "type": "Text", "props": {"content": "Hi Ada"}, "children": []})
        );
    }
}
