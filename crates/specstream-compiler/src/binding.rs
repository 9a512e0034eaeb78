//! Prop values and visibility descriptors.
//!
//! On the wire a prop is "a literal, or an object with a `$`-key". The shape is
//! sniffed exactly once, here, and turned into [`PropValue`]; everything
//! downstream matches on variants. Both types serialize back to the wire shape.

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::{Map, Value};
use std::collections::BTreeMap;

// ---------------------------------------------------------------------------
// Prop values
// ---------------------------------------------------------------------------

/// A prop value: a literal or a runtime binding.
#[derive(Debug, Clone, PartialEq)]
pub enum PropValue {
    /// Plain JSON with no bindings anywhere inside it.
    Literal(Value),

    /// `{"$state": "/user/name"}`: read from the state model.
    State(String),

    /// `{"$item": "title"}`: read a field of the current repeat item.
    /// An empty field is the whole item.
    Item(String),

    /// `{"$index": true}`: the current repeat index.
    Index,

    /// `{"$bindState": "/form/email"}`: two-way binding to a state path.
    BindState(String),

    /// `{"$bindItem": "done"}`: two-way binding to a field of the repeat item.
    BindItem(String),

    /// `{"$template": "Hello ${/user/name}"}`: string interpolation of state pointers.
    Template(String),

    /// `{"$cond": <visibility>, "$then": <prop>, "$else": <prop>}`
    Cond {
        cond: Box<Visibility>,
        then: Option<Box<PropValue>>,
        otherwise: Option<Box<PropValue>>,
    },

    /// An object with at least one binding somewhere inside it.
    Object(BTreeMap<String, PropValue>),

    /// An array with at least one binding somewhere inside it.
    Array(Vec<PropValue>),
}

impl PropValue {
    /// Classify a wire value.
    pub fn from_json(value: &Value) -> Self {
        match value {
            Value::Object(map) => {
                if let Some(binding) = binding_from_map(map) {
                    return binding;
                }
                if !contains_binding(value) {
                    return PropValue::Literal(value.clone());
                }
                PropValue::Object(
                    map.iter()
                        .map(|(k, v)| (k.clone(), PropValue::from_json(v)))
                        .collect(),
                )
            }
            Value::Array(items) if contains_binding(value) => {
                PropValue::Array(items.iter().map(PropValue::from_json).collect())
            }
            _ => PropValue::Literal(value.clone()),
        }
    }

    /// Convert back to the wire shape.
    pub fn to_json(&self) -> Value {
        match self {
            PropValue::Literal(v) => v.clone(),
            PropValue::State(p) => single("$state", Value::String(p.clone())),
            PropValue::Item(f) => single("$item", Value::String(f.clone())),
            PropValue::Index => single("$index", Value::Bool(true)),
            PropValue::BindState(p) => single("$bindState", Value::String(p.clone())),
            PropValue::BindItem(f) => single("$bindItem", Value::String(f.clone())),
            PropValue::Template(t) => single("$template", Value::String(t.clone())),
            PropValue::Cond {
                cond,
                then,
                otherwise,
            } => {
                let mut map = Map::new();
                map.insert("$cond".into(), cond.to_json());
                if let Some(then) = then {
                    map.insert("$then".into(), then.to_json());
                }
                if let Some(otherwise) = otherwise {
                    map.insert("$else".into(), otherwise.to_json());
                }
                Value::Object(map)
            }
            PropValue::Object(props) => Value::Object(
                props
                    .iter()
                    .map(|(k, v)| (k.clone(), v.to_json()))
                    .collect(),
            ),
            PropValue::Array(items) => Value::Array(items.iter().map(PropValue::to_json).collect()),
        }
    }

    pub fn is_literal(&self) -> bool {
        matches!(self, PropValue::Literal(_))
    }
}

impl From<Value> for PropValue {
    fn from(value: Value) -> Self {
        PropValue::from_json(&value)
    }
}

impl Serialize for PropValue {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.to_json().serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for PropValue {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        Value::deserialize(deserializer).map(|v| PropValue::from_json(&v))
    }
}

/// Recognize a binding object. `$cond` wins over the reference keys.
fn binding_from_map(map: &Map<String, Value>) -> Option<PropValue> {
    if let Some(cond) = map.get("$cond") {
        return Some(PropValue::Cond {
            cond: Box::new(Visibility::from_json(cond)),
            then: map.get("$then").map(|v| Box::new(PropValue::from_json(v))),
            otherwise: map.get("$else").map(|v| Box::new(PropValue::from_json(v))),
        });
    }

    let string_key = |key: &str| map.get(key).and_then(Value::as_str).map(str::to_string);

    if let Some(path) = string_key("$state") {
        return Some(PropValue::State(path));
    }
    if let Some(field) = string_key("$item") {
        return Some(PropValue::Item(field));
    }
    if map.get("$index").is_some_and(|v| v != &Value::Bool(false)) {
        return Some(PropValue::Index);
    }
    if let Some(path) = string_key("$bindState") {
        return Some(PropValue::BindState(path));
    }
    if let Some(field) = string_key("$bindItem") {
        return Some(PropValue::BindItem(field));
    }
    string_key("$template").map(PropValue::Template)
}

fn contains_binding(value: &Value) -> bool {
    match value {
        Value::Object(map) => binding_from_map(map).is_some() || map.values().any(contains_binding),
        Value::Array(items) => items.iter().any(contains_binding),
        _ => false,
    }
}

fn single(key: &str, value: Value) -> Value {
    let mut map = Map::new();
    map.insert(key.into(), value);
    Value::Object(map)
}

// ---------------------------------------------------------------------------
// Visibility
// ---------------------------------------------------------------------------

/// When an element is shown: one condition, or a list that must all hold.
#[derive(Debug, Clone, PartialEq)]
pub enum Visibility {
    Condition(Condition),
    All(Vec<Condition>),
}

impl Visibility {
    pub fn from_json(value: &Value) -> Self {
        match value {
            Value::Array(items) => Visibility::All(items.iter().map(Condition::from_json).collect()),
            other => Visibility::Condition(Condition::from_json(other)),
        }
    }

    pub fn to_json(&self) -> Value {
        match self {
            Visibility::Condition(c) => c.to_json(),
            Visibility::All(conditions) => {
                Value::Array(conditions.iter().map(Condition::to_json).collect())
            }
        }
    }
}

impl Serialize for Visibility {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.to_json().serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for Visibility {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        Value::deserialize(deserializer).map(|v| Visibility::from_json(&v))
    }
}

/// One visibility test.
///
/// `subject` is `None` when the wire object named no operand; such a condition
/// tests `undefined`.
#[derive(Debug, Clone, PartialEq)]
pub struct Condition {
    pub subject: Option<PropValue>,
    pub comparison: Option<Comparison>,
    pub negate: bool,
}

/// Comparator plus right-hand side.
#[derive(Debug, Clone, PartialEq)]
pub struct Comparison {
    pub op: Comparator,
    pub rhs: PropValue,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Comparator {
    Eq,
    Neq,
    Gt,
    Gte,
    Lt,
    Lte,
}

impl Comparator {
    /// Wire keys, in the order they are looked up.
    pub const ALL: [Comparator; 6] = [
        Comparator::Eq,
        Comparator::Neq,
        Comparator::Gt,
        Comparator::Gte,
        Comparator::Lt,
        Comparator::Lte,
    ];

    pub fn key(self) -> &'static str {
        match self {
            Comparator::Eq => "eq",
            Comparator::Neq => "neq",
            Comparator::Gt => "gt",
            Comparator::Gte => "gte",
            Comparator::Lt => "lt",
            Comparator::Lte => "lte",
        }
    }
}

impl Condition {
    /// Condition on a state pointer with no comparator.
    pub fn state(path: impl Into<String>) -> Self {
        Self {
            subject: Some(PropValue::State(path.into())),
            comparison: None,
            negate: false,
        }
    }

    pub fn compare(mut self, op: Comparator, rhs: impl Into<PropValue>) -> Self {
        self.comparison = Some(Comparison {
            op,
            rhs: rhs.into(),
        });
        self
    }

    pub fn negated(mut self) -> Self {
        self.negate = true;
        self
    }

    pub fn from_json(value: &Value) -> Self {
        let Value::Object(map) = value else {
            return Self {
                subject: Some(PropValue::Literal(value.clone())),
                comparison: None,
                negate: false,
            };
        };

        let subject = if let Some(path) = map.get("$state").and_then(Value::as_str) {
            Some(PropValue::State(path.to_string()))
        } else if let Some(field) = map.get("$item").and_then(Value::as_str) {
            Some(PropValue::Item(field.to_string()))
        } else if map.get("$index").is_some_and(|v| v != &Value::Bool(false)) {
            Some(PropValue::Index)
        } else {
            None
        };

        let comparison = Comparator::ALL.iter().find_map(|&op| {
            map.get(op.key()).map(|rhs| Comparison {
                op,
                rhs: PropValue::from_json(rhs),
            })
        });

        Self {
            subject,
            comparison,
            negate: map.get("not").and_then(Value::as_bool).unwrap_or(false),
        }
    }

    pub fn to_json(&self) -> Value {
        let mut map = Map::new();
        match &self.subject {
            Some(PropValue::Literal(v)) if self.comparison.is_none() && !self.negate => {
                return v.clone();
            }
            Some(PropValue::State(p)) => {
                map.insert("$state".into(), Value::String(p.clone()));
            }
            Some(PropValue::Item(f)) => {
                map.insert("$item".into(), Value::String(f.clone()));
            }
            Some(PropValue::Index) => {
                map.insert("$index".into(), Value::Bool(true));
            }
            // Other subjects cannot be written as a wire condition
            _ => {}
        }
        if let Some(comparison) = &self.comparison {
            map.insert(comparison.op.key().into(), comparison.rhs.to_json());
        }
        if self.negate {
            map.insert("not".into(), Value::Bool(true));
        }
        Value::Object(map)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    // =========================================================================
    // Prop classification
    // =========================================================================

    #[test]
    fn test_scalar_literal() {
        assert_eq!(PropValue::from_json(&json!("hi")), PropValue::Literal(json!("hi")));
        assert_eq!(PropValue::from_json(&json!(3)), PropValue::Literal(json!(3)));
        assert_eq!(PropValue::from_json(&json!(null)), PropValue::Literal(json!(null)));
    }

    #[test]
    fn test_plain_container_stays_literal() {
        let v = json!({"a": [1, {"b": 2}]});
        assert_eq!(PropValue::from_json(&v), PropValue::Literal(v));
    }

    #[test]
    fn test_reference_bindings() {
        assert_eq!(
            PropValue::from_json(&json!({"$state": "/user/name"})),
            PropValue::State("/user/name".into())
        );
        assert_eq!(
            PropValue::from_json(&json!({"$item": "title"})),
            PropValue::Item("title".into())
        );
        assert_eq!(PropValue::from_json(&json!({"$index": true})), PropValue::Index);
        assert_eq!(
            PropValue::from_json(&json!({"$bindState": "/form/email"})),
            PropValue::BindState("/form/email".into())
        );
        assert_eq!(
            PropValue::from_json(&json!({"$bindItem": "done"})),
            PropValue::BindItem("done".into())
        );
        assert_eq!(
            PropValue::from_json(&json!({"$template": "Hi ${/name}"})),
            PropValue::Template("Hi ${/name}".into())
        );
    }

    #[test]
    fn test_non_string_state_is_plain_object() {
        let v = json!({"$state": 5});
        assert_eq!(PropValue::from_json(&v), PropValue::Literal(v));
    }

    #[test]
    fn test_index_false_is_plain_object() {
        let v = json!({"$index": false});
        assert_eq!(PropValue::from_json(&v), PropValue::Literal(v));
    }

    #[test]
    fn test_cond_binding() {
        let v = json!({"$cond": {"$state": "/on"}, "$then": "yes", "$else": {"$state": "/fallback"}});
        assert_eq!(
            PropValue::from_json(&v),
            PropValue::Cond {
                cond: Box::new(Visibility::Condition(Condition::state("/on"))),
                then: Some(Box::new(PropValue::Literal(json!("yes")))),
                otherwise: Some(Box::new(PropValue::State("/fallback".into()))),
            }
        );
    }

    #[test]
    fn test_nested_binding_makes_container() {
        let v = json!({"label": "x", "items": [1, {"$state": "/n"}]});
        let expected = PropValue::Object(BTreeMap::from([
            ("label".to_string(), PropValue::Literal(json!("x"))),
            (
                "items".to_string(),
                PropValue::Array(vec![
                    PropValue::Literal(json!(1)),
                    PropValue::State("/n".into()),
                ]),
            ),
        ]));
        assert_eq!(PropValue::from_json(&v), expected);
    }

    #[test]
    fn test_prop_wire_round_trip() {
        for v in [
            json!({"$state": "/a"}),
            json!({"$index": true}),
            json!({"$cond": {"$state": "/n", "gt": 1}, "$then": 1, "$else": 2}),
            json!({"deep": [{"$item": "x"}, 2]}),
        ] {
            assert_eq!(PropValue::from_json(&v).to_json(), v);
        }
    }

    // =========================================================================
    // Visibility
    // =========================================================================

    #[test]
    fn test_condition_with_comparator() {
        let c = Condition::from_json(&json!({"$state": "/n", "gte": 5}));
        assert_eq!(c, Condition::state("/n").compare(Comparator::Gte, json!(5)));
    }

    #[test]
    fn test_condition_with_binding_rhs_and_not() {
        let c = Condition::from_json(&json!({"$item": "owner", "eq": {"$state": "/me"}, "not": true}));
        assert_eq!(c.subject, Some(PropValue::Item("owner".into())));
        assert_eq!(
            c.comparison,
            Some(Comparison {
                op: Comparator::Eq,
                rhs: PropValue::State("/me".into())
            })
        );
        assert!(c.negate);
    }

    #[test]
    fn test_condition_without_operand() {
        let c = Condition::from_json(&json!({"eq": 1}));
        assert_eq!(c.subject, None);
    }

    #[test]
    fn test_boolean_literal_condition() {
        let c = Condition::from_json(&json!(false));
        assert_eq!(c.subject, Some(PropValue::Literal(json!(false))));
        assert_eq!(c.to_json(), json!(false));
    }

    #[test]
    fn test_visibility_list() {
        let v = Visibility::from_json(&json!([{"$state": "/a"}, {"$state": "/b", "not": true}]));
        assert_eq!(
            v,
            Visibility::All(vec![
                Condition::state("/a"),
                Condition::state("/b").negated()
            ])
        );
    }

    #[test]
    fn test_visibility_serde() {
        let v: Visibility = serde_json::from_value(json!({"$state": "/n", "lt": 3})).unwrap();
        assert_eq!(serde_json::to_value(&v).unwrap(), json!({"$state": "/n", "lt": 3}));
    }
}
