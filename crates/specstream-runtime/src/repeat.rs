//! Repeat expansion.

use crate::{RepeatScope, ResolveContext};
use serde_json::Value;
use specstream_compiler::Element;
use specstream_patch::Pointer;

/// One item of an expanded repeat.
#[derive(Debug, Clone, PartialEq)]
pub struct ItemContext<'a> {
    pub item: &'a Value,
    pub index: usize,
    /// State pointer of the item, e.g. `/todos/0`.
    pub base_path: String,
    /// Stable identity for reconciliation: the item's key field when present,
    /// otherwise the index.
    pub key: String,
}

impl<'a> ItemContext<'a> {
    pub fn scope(&self) -> RepeatScope<'a> {
        RepeatScope {
            item: self.item,
            index: self.index,
            base_path: self.base_path.clone(),
        }
    }
}

/// Expand an element's repeat against the state in `ctx`.
///
/// Returns nothing when the element has no repeat or its `statePath` does not
/// point at an array.
pub fn expand<'a>(element: &Element, ctx: &ResolveContext<'a>) -> Vec<ItemContext<'a>> {
    let Some(repeat) = &element.repeat else {
        return Vec::new();
    };
    let path = Pointer::parse(&repeat.state_path);
    let Some(items) = path.get(ctx.state).and_then(Value::as_array) else {
        return Vec::new();
    };

    items
        .iter()
        .enumerate()
        .map(|(index, item)| ItemContext {
            item,
            index,
            base_path: path.join(index.to_string()).to_string(),
            key: item_key(item, repeat.key.as_deref()).unwrap_or_else(|| index.to_string()),
        })
        .collect()
}

fn item_key(item: &Value, field: Option<&str>) -> Option<String> {
    match item.get(field?)? {
        Value::Null => None,
        Value::String(s) => Some(s.clone()),
        other => Some(other.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;
    use specstream_compiler::Repeat;

    fn list(repeat: Repeat) -> Element {
        let mut element = Element::new("List");
        element.repeat = Some(repeat);
        element
    }

    fn keys(items: &[ItemContext<'_>]) -> Vec<String> {
        items.iter().map(|i| i.key.clone()).collect()
    }

    // =========================================================================
    // Keys
    // =========================================================================

    #[test]
    fn test_keyed_items() {
        let state = json!({"todos": [{"id": "a"}, {"id": "b"}]});
        let items = expand(&list(Repeat::new("/todos").keyed("id")), &ResolveContext::new(&state));
        assert_eq!(keys(&items), vec!["a", "b"]);
    }

    #[test]
    fn test_unkeyed_items_use_index() {
        let state = json!({"todos": [{"id": "a"}, {"id": "b"}]});
        let items = expand(&list(Repeat::new("/todos")), &ResolveContext::new(&state));
        assert_eq!(keys(&items), vec!["0", "1"]);
    }

    #[test]
    fn test_missing_or_null_key_falls_back_to_index() {
        let state = json!({"rows": [{"id": 7}, {"name": "x"}, {"id": null}, "scalar"]});
        let items = expand(&list(Repeat::new("/rows").keyed("id")), &ResolveContext::new(&state));
        assert_eq!(keys(&items), vec!["7", "1", "2", "3"]);
    }

    // =========================================================================
    // Items
    // =========================================================================

    #[test]
    fn test_item_context() {
        let state = json!({"todos": [{"id": "a"}, {"id": "b"}]});
        let items = expand(&list(Repeat::new("todos").keyed("id")), &ResolveContext::new(&state));
        assert_eq!(items[1].item, &json!({"id": "b"}));
        assert_eq!(items[1].index, 1);
        assert_eq!(items[1].base_path, "/todos/1");
        assert_eq!(items[1].scope().base_path, "/todos/1");
    }

    #[test]
    fn test_non_array_yields_nothing() {
        for state in [json!({}), json!({"todos": {"a": 1}}), json!({"todos": null})] {
            let items = expand(&list(Repeat::new("/todos")), &ResolveContext::new(&state));
            assert!(items.is_empty());
        }
    }

    #[test]
    fn test_no_repeat_yields_nothing() {
        let state = json!({"todos": [1]});
        assert!(expand(&Element::new("Text"), &ResolveContext::new(&state)).is_empty());
    }
}
