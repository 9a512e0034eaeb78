//! Visibility evaluation.
//!
//! Truthiness and comparisons follow JavaScript: `0`, `""`, `false`, `null`
//! and undefined are falsy; ordering comparators coerce both sides to numbers
//! and are false whenever either side is not numeric.

use crate::resolve::resolve;
use crate::ResolveContext;
use serde_json::Value;
use specstream_compiler::{Comparator, Condition, Visibility};

/// Whether an element with this descriptor is shown. An empty list shows.
pub fn evaluate(descriptor: &Visibility, ctx: &ResolveContext<'_>) -> bool {
    match descriptor {
        Visibility::Condition(condition) => evaluate_condition(condition, ctx),
        Visibility::All(conditions) => conditions.iter().all(|c| evaluate_condition(c, ctx)),
    }
}

/// Evaluate one condition. `not` inverts the final result.
pub fn evaluate_condition(condition: &Condition, ctx: &ResolveContext<'_>) -> bool {
    let subject = condition.subject.as_ref().and_then(|s| resolve(s, ctx));

    let result = match &condition.comparison {
        None => is_truthy(subject.as_ref()),
        Some(comparison) => {
            let rhs = resolve(&comparison.rhs, ctx);
            compare(comparison.op, subject.as_ref(), rhs.as_ref())
        }
    };

    result != condition.negate
}

/// JavaScript truthiness. `None` is undefined.
pub fn is_truthy(value: Option<&Value>) -> bool {
    match value {
        None | Some(Value::Null) => false,
        Some(Value::Bool(b)) => *b,
        Some(Value::Number(n)) => n.as_f64().is_some_and(|f| f != 0.0 && !f.is_nan()),
        Some(Value::String(s)) => !s.is_empty(),
        Some(Value::Array(_)) | Some(Value::Object(_)) => true,
    }
}

fn compare(op: Comparator, lhs: Option<&Value>, rhs: Option<&Value>) -> bool {
    match op {
        Comparator::Eq => strict_equals(lhs, rhs),
        Comparator::Neq => !strict_equals(lhs, rhs),
        Comparator::Gt => ordered(lhs, rhs, |a, b| a > b),
        Comparator::Gte => ordered(lhs, rhs, |a, b| a >= b),
        Comparator::Lt => ordered(lhs, rhs, |a, b| a < b),
        Comparator::Lte => ordered(lhs, rhs, |a, b| a <= b),
    }
}

fn ordered(lhs: Option<&Value>, rhs: Option<&Value>, test: impl Fn(f64, f64) -> bool) -> bool {
    match (to_number(lhs), to_number(rhs)) {
        (Some(a), Some(b)) => test(a, b),
        _ => false,
    }
}

/// Equality without type coercion. Containers compare structurally;
/// `1` and `1.0` are equal.
fn strict_equals(lhs: Option<&Value>, rhs: Option<&Value>) -> bool {
    match (lhs, rhs) {
        (None, None) => true,
        (Some(a), Some(b)) => values_equal(a, b),
        _ => false,
    }
}

fn values_equal(a: &Value, b: &Value) -> bool {
    match (a, b) {
        (Value::Number(x), Value::Number(y)) => x.as_f64() == y.as_f64(),
        (Value::Array(x), Value::Array(y)) => {
            x.len() == y.len() && x.iter().zip(y).all(|(l, r)| values_equal(l, r))
        }
        (Value::Object(x), Value::Object(y)) => {
            x.len() == y.len()
                && x.iter().all(|(k, l)| y.get(k).is_some_and(|r| values_equal(l, r)))
        }
        _ => a == b,
    }
}

/// Numeric coercion for ordering comparators.
fn to_number(value: Option<&Value>) -> Option<f64> {
    match value? {
        Value::Null => Some(0.0),
        Value::Bool(b) => Some(if *b { 1.0 } else { 0.0 }),
        Value::Number(n) => n.as_f64(),
        Value::String(s) => {
            let s = s.trim();
            if s.is_empty() {
                return Some(0.0);
            }
            s.parse::<f64>().ok().filter(|f| f.is_finite())
        }
        Value::Array(_) | Value::Object(_) => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::RepeatScope;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn visible(descriptor: Value, state: Value) -> bool {
        evaluate(&Visibility::from_json(&descriptor), &ResolveContext::new(&state))
    }

    // =========================================================================
    // Truthiness
    // =========================================================================

    #[test]
    fn test_truthiness() {
        assert!(!is_truthy(None));
        for falsy in [json!(null), json!(false), json!(0), json!(0.0), json!("")] {
            assert!(!is_truthy(Some(&falsy)), "{falsy} should be falsy");
        }
        for truthy in [json!(true), json!(1), json!(-0.5), json!("0"), json!([]), json!({})] {
            assert!(is_truthy(Some(&truthy)), "{truthy} should be truthy");
        }
    }

    #[test]
    fn test_state_flag() {
        assert!(!visible(json!({"$state": "/flag"}), json!({"flag": 0})));
        assert!(visible(json!({"$state": "/flag"}), json!({"flag": 1})));
        assert!(!visible(json!({"$state": "/flag"}), json!({})));
    }

    #[test]
    fn test_boolean_literal_descriptor() {
        assert!(visible(json!(true), json!({})));
        assert!(!visible(json!(false), json!({})));
    }

    // =========================================================================
    // Comparators
    // =========================================================================

    #[test]
    fn test_gte() {
        let descriptor = json!({"$state": "/n", "gte": 5});
        assert!(!visible(descriptor.clone(), json!({"n": 4})));
        assert!(visible(descriptor.clone(), json!({"n": 5})));
        assert!(visible(descriptor, json!({"n": 6})));
    }

    #[test]
    fn test_ordering_coerces() {
        assert!(visible(json!({"$state": "/n", "gt": 2}), json!({"n": "3"})));
        assert!(visible(json!({"$state": "/n", "lt": 1}), json!({"n": null})));
        assert!(visible(json!({"$state": "/n", "lte": 1}), json!({"n": true})));
    }

    #[test]
    fn test_ordering_non_numeric_is_false() {
        assert!(!visible(json!({"$state": "/n", "gt": 0}), json!({"n": "abc"})));
        assert!(!visible(json!({"$state": "/n", "lt": 0}), json!({"n": "abc"})));
        assert!(!visible(json!({"$state": "/n", "gte": 0}), json!({})));
        assert!(!visible(json!({"$state": "/n", "gt": 0}), json!({"n": [1]})));
    }

    #[test]
    fn test_eq_is_strict() {
        assert!(visible(json!({"$state": "/s", "eq": "done"}), json!({"s": "done"})));
        assert!(!visible(json!({"$state": "/n", "eq": "1"}), json!({"n": 1})));
        assert!(visible(json!({"$state": "/n", "eq": 1}), json!({"n": 1.0})));
        assert!(visible(json!({"$state": "/a", "neq": "x"}), json!({})));
    }

    #[test]
    fn test_eq_deep() {
        assert!(visible(
            json!({"$state": "/tags", "eq": ["a", "b"]}),
            json!({"tags": ["a", "b"]})
        ));
        assert!(!visible(
            json!({"$state": "/tags", "eq": ["b", "a"]}),
            json!({"tags": ["a", "b"]})
        ));
    }

    #[test]
    fn test_rhs_binding() {
        let descriptor = json!({"$state": "/used", "lt": {"$state": "/quota"}});
        assert!(visible(descriptor.clone(), json!({"used": 3, "quota": 10})));
        assert!(!visible(descriptor, json!({"used": 30, "quota": 10})));
    }

    #[test]
    fn test_comparator_precedence() {
        // eq is looked up before gt
        assert!(visible(json!({"$state": "/n", "eq": 5, "gt": 100}), json!({"n": 5})));
    }

    // =========================================================================
    // Negation and lists
    // =========================================================================

    #[test]
    fn test_not_inverts_final_result() {
        assert!(visible(json!({"$state": "/flag", "not": true}), json!({"flag": false})));
        assert!(!visible(json!({"$state": "/n", "gte": 5, "not": true}), json!({"n": 5})));
        assert!(visible(json!({"$state": "/n", "gte": 5, "not": true}), json!({"n": "abc"})));
    }

    #[test]
    fn test_all_conditions() {
        let descriptor = json!([{"$state": "/a"}, {"$state": "/b", "eq": "x"}]);
        assert!(visible(descriptor.clone(), json!({"a": 1, "b": "x"})));
        assert!(!visible(descriptor.clone(), json!({"a": 0, "b": "x"})));
        assert!(!visible(descriptor, json!({"a": 1, "b": "y"})));
    }

    #[test]
    fn test_empty_list_is_visible() {
        assert!(visible(json!([]), json!({})));
    }

    #[test]
    fn test_no_operand_tests_undefined() {
        assert!(!visible(json!({}), json!({})));
        assert!(visible(json!({"not": true}), json!({})));
    }

    // =========================================================================
    // Repeat operands
    // =========================================================================

    #[test]
    fn test_item_and_index_operands() {
        let state = json!({});
        let item = json!({"done": true});
        let ctx = ResolveContext::new(&state).with_repeat(RepeatScope {
            item: &item,
            index: 0,
            base_path: "/todos/0".into(),
        });

        let done = Visibility::from_json(&json!({"$item": "done"}));
        let first = Visibility::from_json(&json!({"$index": true, "eq": 0}));
        assert_eq!(evaluate(&done, &ctx), true);
        assert_eq!(evaluate(&first, &ctx), true);
        assert_eq!(evaluate(&done, &ResolveContext::new(&state)), false);
    }

    #[test]
    fn test_to_number() {
        assert_eq!(to_number(Some(&json!(" 42 "))), Some(42.0));
        assert_eq!(to_number(Some(&json!(""))), Some(0.0));
        assert_eq!(to_number(Some(&json!("1e3"))), Some(1000.0));
        assert_eq!(to_number(Some(&json!("inf"))), None);
        assert_eq!(to_number(None), None);
    }
}
