//! The materialized document.
//!
//! While a stream is arriving the document is raw JSON: patches may address
//! any path, and half-built elements are normal. [`Spec::from_document`] reads
//! that JSON leniently into typed form; anything it cannot use is skipped
//! rather than rejected.

use crate::binding::{PropValue, Visibility};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;

/// Key of an element in [`Spec::elements`].
pub type ElementKey = String;

/// A compiled UI description: a root key plus a flat element map.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Spec {
    pub root: ElementKey,
    pub elements: BTreeMap<ElementKey, Element>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub state: Option<Value>,
}

/// One UI-tree node.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Element {
    #[serde(rename = "type")]
    pub element_type: String,
    pub props: BTreeMap<String, PropValue>,
    pub children: Vec<ElementKey>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub visible: Option<Visibility>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub repeat: Option<Repeat>,
}

/// Render the element once per entry of a state array.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Repeat {
    pub state_path: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub key: Option<String>,
}

/// A structural problem found by [`Spec::validate`].
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SpecIssue {
    #[error("spec has no root")]
    MissingRoot,

    #[error("root \"{0}\" is not an element")]
    DanglingRoot(ElementKey),

    #[error("element \"{parent}\" references missing child \"{child}\"")]
    DanglingChild { parent: ElementKey, child: ElementKey },

    #[error("element \"{0}\" has no type")]
    MissingType(ElementKey),
}

impl Spec {
    /// Read a raw document. Never fails; unusable parts are dropped.
    pub fn from_document(document: &Value) -> Self {
        let Value::Object(map) = document else {
            return Self::default();
        };

        let root = map
            .get("root")
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string();

        let elements = match map.get("elements") {
            Some(Value::Object(elements)) => elements
                .iter()
                .filter_map(|(key, value)| Element::from_json(value).map(|el| (key.clone(), el)))
                .collect(),
            _ => BTreeMap::new(),
        };

        let state = map.get("state").filter(|s| !s.is_null()).cloned();

        Self {
            root,
            elements,
            state,
        }
    }

    /// The typed parts as a raw document. Anything [`Spec::from_document`]
    /// skipped is gone; seed sessions from the session's own document instead.
    pub fn to_document(&self) -> Value {
        serde_json::to_value(self).unwrap_or_else(|_| Value::Object(Map::new()))
    }

    pub fn element(&self, key: &str) -> Option<&Element> {
        self.elements.get(key)
    }

    /// The root element, if the root key resolves.
    pub fn root_element(&self) -> Option<&Element> {
        self.element(&self.root)
    }

    /// Report structural problems. An empty list means the spec is complete.
    pub fn validate(&self) -> Vec<SpecIssue> {
        let mut issues = Vec::new();

        if self.root.is_empty() {
            issues.push(SpecIssue::MissingRoot);
        } else if !self.elements.contains_key(&self.root) {
            issues.push(SpecIssue::DanglingRoot(self.root.clone()));
        }

        for (key, element) in &self.elements {
            if element.element_type.is_empty() {
                issues.push(SpecIssue::MissingType(key.clone()));
            }
            for child in &element.children {
                if !self.elements.contains_key(child) {
                    issues.push(SpecIssue::DanglingChild {
                        parent: key.clone(),
                        child: child.clone(),
                    });
                }
            }
        }

        issues
    }
}

impl<'de> Deserialize<'de> for Spec {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        Value::deserialize(deserializer).map(|v| Spec::from_document(&v))
    }
}

impl Element {
    pub fn new(element_type: impl Into<String>) -> Self {
        Self {
            element_type: element_type.into(),
            ..Self::default()
        }
    }

    /// Read an element leniently. Only non-objects are rejected.
    pub fn from_json(value: &Value) -> Option<Self> {
        let map = value.as_object()?;

        let element_type = map
            .get("type")
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string();

        let props = match map.get("props") {
            Some(Value::Object(props)) => props
                .iter()
                .map(|(k, v)| (k.clone(), PropValue::from_json(v)))
                .collect(),
            _ => BTreeMap::new(),
        };

        let children = match map.get("children") {
            Some(Value::Array(items)) => items
                .iter()
                .filter_map(|c| c.as_str().map(str::to_string))
                .collect(),
            _ => Vec::new(),
        };

        let visible = map
            .get("visible")
            .filter(|v| !v.is_null())
            .map(Visibility::from_json);

        let repeat = map.get("repeat").and_then(Repeat::from_json);

        Some(Self {
            element_type,
            props,
            children,
            visible,
            repeat,
        })
    }
}

impl<'de> Deserialize<'de> for Element {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = Value::deserialize(deserializer)?;
        Element::from_json(&value).ok_or_else(|| serde::de::Error::custom("element must be an object"))
    }
}

impl Repeat {
    pub fn new(state_path: impl Into<String>) -> Self {
        Self {
            state_path: state_path.into(),
            key: None,
        }
    }

    pub fn keyed(mut self, key: impl Into<String>) -> Self {
        self.key = Some(key.into());
        self
    }

    fn from_json(value: &Value) -> Option<Self> {
        let map = value.as_object()?;
        let state_path = map.get("statePath")?.as_str()?.to_string();
        let key = map.get("key").and_then(Value::as_str).map(str::to_string);
        Some(Self { state_path, key })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::binding::Condition;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    // =========================================================================
    // Reading documents
    // =========================================================================

    #[test]
    fn test_empty_document() {
        let spec = Spec::from_document(&json!({}));
        assert_eq!(spec, Spec::default());
        assert_eq!(Spec::from_document(&json!(null)), Spec::default());
    }

    #[test]
    fn test_full_element() {
        let doc = json!({
            "root": "list",
            "elements": {
                "list": {
                    "type": "Stack",
                    "props": {"gap": 4, "title": {"$state": "/title"}},
                    "children": ["row"],
                    "visible": {"$state": "/show"},
                    "repeat": {"statePath": "/todos", "key": "id"}
                }
            },
            "state": {"title": "Todos"}
        });
        let spec = Spec::from_document(&doc);
        assert_eq!(spec.root, "list");
        assert_eq!(spec.state, Some(json!({"title": "Todos"})));

        let el = spec.element("list").unwrap();
        assert_eq!(el.element_type, "Stack");
        assert_eq!(el.props["gap"], PropValue::Literal(json!(4)));
        assert_eq!(el.props["title"], PropValue::State("/title".into()));
        assert_eq!(el.children, vec!["row"]);
        assert_eq!(el.visible, Some(Visibility::Condition(Condition::state("/show"))));
        assert_eq!(el.repeat, Some(Repeat::new("/todos").keyed("id")));
    }

    #[test]
    fn test_partial_element_tolerated() {
        let doc = json!({"elements": {"a": {"props": {"x": 1}}, "b": 5, "c": {"type": "Text", "children": ["x", 3]}}});
        let spec = Spec::from_document(&doc);
        assert_eq!(spec.elements.len(), 2);
        assert_eq!(spec.elements["a"].element_type, "");
        assert_eq!(spec.elements["c"].children, vec!["x"]);
    }

    #[test]
    fn test_repeat_without_state_path_ignored() {
        let el = Element::from_json(&json!({"type": "Row", "repeat": {"key": "id"}})).unwrap();
        assert_eq!(el.repeat, None);
    }

    #[test]
    fn test_document_round_trip() {
        let doc = json!({
            "root": "card",
            "elements": {
                "card": {"type": "Card", "props": {"title": "Hi"}, "children": ["t"]},
                "t": {"type": "Text", "props": {"content": {"$state": "/name"}}, "visible": [{"$state": "/on"}]}
            }
        });
        let spec = Spec::from_document(&doc);
        assert_eq!(Spec::from_document(&spec.to_document()), spec);
    }

    #[test]
    fn test_document_keeps_empty_children() {
        let mut spec = Spec::default();
        spec.elements.insert("card".into(), Element::new("Card"));
        assert_eq!(spec.to_document()["elements"]["card"]["children"], json!([]));
    }

    #[test]
    fn test_deserialize_lenient() {
        let spec: Spec = serde_json::from_value(json!({"root": 5, "elements": {"a": {"type": "X"}}})).unwrap();
        assert_eq!(spec.root, "");
        assert_eq!(spec.elements["a"], Element::new("X"));
    }

    // =========================================================================
    // Validation
    // =========================================================================

    #[test]
    fn test_validate_complete() {
        let doc = json!({"root": "a", "elements": {"a": {"type": "Card", "children": ["b"]}, "b": {"type": "Text"}}});
        assert!(Spec::from_document(&doc).validate().is_empty());
    }

    #[test]
    fn test_validate_issues() {
        let doc = json!({"root": "zz", "elements": {"a": {"children": ["b"]}}});
        let issues = Spec::from_document(&doc).validate();
        assert_eq!(
            issues,
            vec![
                SpecIssue::DanglingRoot("zz".into()),
                SpecIssue::MissingType("a".into()),
                SpecIssue::DanglingChild {
                    parent: "a".into(),
                    child: "b".into()
                },
            ]
        );
    }

    #[test]
    fn test_validate_missing_root() {
        assert_eq!(Spec::default().validate(), vec![SpecIssue::MissingRoot]);
    }
}
