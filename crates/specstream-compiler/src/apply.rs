//! Patch application.
//!
//! Lenient by default: the producer is probabilistic, so deep paths often
//! arrive before their ancestors and stray `replace`/`remove` ops target paths
//! that never existed. Lenient mode builds the best document reachable so far;
//! strict mode reports each of those recoveries as an [`ApplyError`].
//!
//! | op | missing parent | missing target | array parent |
//! |---|---|---|---|
//! | `add` | created | inserted | appended |
//! | `set` | created | inserted | overwrite / append at `len` or `-` |
//! | `replace` | no-op | inserted | overwrite in range, else no-op |
//! | `remove` | no-op | no-op | removed in range, else no-op |

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use specstream_patch::pointer::{is_index_like, parse_index};
use specstream_patch::{Patch, PatchOp, Pointer};

/// How forgiving patch application is.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ApplyMode {
    #[default]
    Lenient,
    Strict,
}

/// Why a patch could not be applied.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ApplyError {
    #[error("{op} \"{path}\": parent does not exist")]
    MissingParent { op: PatchOp, path: String },

    #[error("{op} \"{path}\": target does not exist")]
    MissingTarget { op: PatchOp, path: String },

    #[error("{op} \"{path}\": cannot descend into {found}")]
    NotAContainer {
        op: PatchOp,
        path: String,
        found: &'static str,
    },

    #[error("{op} \"{path}\": \"{segment}\" is not an array index")]
    BadIndex {
        op: PatchOp,
        path: String,
        segment: String,
    },

    #[error("{op} \"{path}\": index {index} out of range (length {len})")]
    IndexOutOfRange {
        op: PatchOp,
        path: String,
        index: usize,
        len: usize,
    },

    #[error("{0} requires a value")]
    MissingValue(PatchOp),
}

/// Apply one patch to `document` in place.
pub fn apply_patch(document: &mut Value, patch: &Patch, mode: ApplyMode) -> Result<(), ApplyError> {
    let applier = Applier {
        op: patch.op,
        path: &patch.path,
        mode,
    };
    let pointer = Pointer::parse(&patch.path);

    match (patch.op, patch.value.as_ref()) {
        (PatchOp::Remove, _) => applier.remove(document, &pointer),
        (op, None) => Err(ApplyError::MissingValue(op)),
        (PatchOp::Add, Some(value)) => applier.add(document, &pointer, value.clone()),
        (PatchOp::Set, Some(value)) => applier.set(document, &pointer, value.clone()),
        (PatchOp::Replace, Some(value)) => applier.replace(document, &pointer, value.clone()),
    }
}

/// Apply patches in order, stopping at the first error.
pub fn apply_patches<'a>(
    document: &mut Value,
    patches: impl IntoIterator<Item = &'a Patch>,
    mode: ApplyMode,
) -> Result<(), ApplyError> {
    for patch in patches {
        apply_patch(document, patch, mode)?;
    }
    Ok(())
}

struct Applier<'p> {
    op: PatchOp,
    path: &'p str,
    mode: ApplyMode,
}

impl Applier<'_> {
    fn strict(&self) -> bool {
        self.mode == ApplyMode::Strict
    }

    // =========================================================================
    // Ops
    // =========================================================================

    fn add(&self, document: &mut Value, pointer: &Pointer, value: Value) -> Result<(), ApplyError> {
        let Some((parents, last)) = pointer.split_last() else {
            *document = value;
            return Ok(());
        };

        let parent = self.descend_or_create(document, parents, last)?;
        match parent {
            Value::Object(map) => {
                match map.get_mut(last) {
                    Some(Value::Array(existing)) if !value.is_array() => existing.push(value),
                    _ => {
                        map.insert(last.to_string(), value);
                    }
                }
                Ok(())
            }
            Value::Array(items) => {
                items.push(value);
                Ok(())
            }
            other => Err(self.not_a_container(other)),
        }
    }

    fn set(&self, document: &mut Value, pointer: &Pointer, value: Value) -> Result<(), ApplyError> {
        let Some((parents, last)) = pointer.split_last() else {
            *document = value;
            return Ok(());
        };

        let parent = self.descend_or_create(document, parents, last)?;
        match parent {
            Value::Object(map) => {
                map.insert(last.to_string(), value);
                Ok(())
            }
            Value::Array(items) => {
                let index = self.slot(items.len(), last)?;
                if index < items.len() {
                    items[index] = value;
                } else {
                    items.push(value);
                }
                Ok(())
            }
            other => Err(self.not_a_container(other)),
        }
    }

    fn replace(&self, document: &mut Value, pointer: &Pointer, value: Value) -> Result<(), ApplyError> {
        let Some((parents, last)) = pointer.split_last() else {
            *document = value;
            return Ok(());
        };

        let Some(parent) = descend(document, parents) else {
            return self.recover(ApplyError::MissingParent {
                op: self.op,
                path: self.path.to_string(),
            });
        };

        match parent {
            Value::Object(map) => {
                if self.strict() && !map.contains_key(last) {
                    return Err(self.missing_target());
                }
                map.insert(last.to_string(), value);
                Ok(())
            }
            Value::Array(items) => match parse_index(last) {
                Some(index) if index < items.len() => {
                    items[index] = value;
                    Ok(())
                }
                _ => self.recover(self.missing_target()),
            },
            _ => self.recover(self.missing_target()),
        }
    }

    fn remove(&self, document: &mut Value, pointer: &Pointer) -> Result<(), ApplyError> {
        let Some((parents, last)) = pointer.split_last() else {
            *document = Value::Object(Map::new());
            return Ok(());
        };

        let removed = match descend(document, parents) {
            Some(Value::Object(map)) => map.remove(last).is_some(),
            Some(Value::Array(items)) => match parse_index(last) {
                Some(index) if index < items.len() => {
                    items.remove(index);
                    true
                }
                _ => false,
            },
            _ => false,
        };

        if removed {
            Ok(())
        } else {
            self.recover(self.missing_target())
        }
    }

    // =========================================================================
    // Path walking
    // =========================================================================

    /// Walk `segments`, creating missing containers. The kind of container
    /// created for a segment is decided by the segment after it: an array for
    /// index-like tokens, otherwise an object.
    fn descend_or_create<'d>(
        &self,
        document: &'d mut Value,
        segments: &[String],
        last: &str,
    ) -> Result<&'d mut Value, ApplyError> {
        let mut current = document;
        for (i, segment) in segments.iter().enumerate() {
            let next = segments.get(i + 1).map(String::as_str).unwrap_or(last);
            current = self.child_or_create(current, segment, next)?;
        }
        Ok(current)
    }

    fn child_or_create<'d>(
        &self,
        current: &'d mut Value,
        segment: &str,
        next: &str,
    ) -> Result<&'d mut Value, ApplyError> {
        let child = match current {
            Value::Object(map) => {
                if self.strict() && !map.contains_key(segment) {
                    return Err(self.missing_parent());
                }
                map.entry(segment.to_string())
                    .or_insert_with(|| container_for(next))
            }
            Value::Array(items) => {
                let index = self.slot(items.len(), segment)?;
                if index >= items.len() {
                    if self.strict() {
                        return Err(self.missing_parent());
                    }
                    items.push(container_for(next));
                }
                let last = items.len() - 1;
                &mut items[index.min(last)]
            }
            other => return Err(self.not_a_container(other)),
        };

        if child.is_null() {
            if self.strict() {
                return Err(self.not_a_container(child));
            }
            *child = container_for(next);
        }
        Ok(child)
    }

    /// Resolve an array token to a slot: an existing index, or `len` to append.
    /// Lenient mode clamps indices past the end to `len`.
    fn slot(&self, len: usize, segment: &str) -> Result<usize, ApplyError> {
        if segment == "-" {
            return Ok(len);
        }
        let Some(index) = parse_index(segment) else {
            return Err(ApplyError::BadIndex {
                op: self.op,
                path: self.path.to_string(),
                segment: segment.to_string(),
            });
        };
        if index > len {
            if self.strict() {
                return Err(ApplyError::IndexOutOfRange {
                    op: self.op,
                    path: self.path.to_string(),
                    index,
                    len,
                });
            }
            return Ok(len);
        }
        Ok(index)
    }

    // =========================================================================
    // Errors
    // =========================================================================

    /// Lenient mode swallows recoverable errors.
    fn recover(&self, err: ApplyError) -> Result<(), ApplyError> {
        if self.strict() {
            Err(err)
        } else {
            Ok(())
        }
    }

    fn missing_parent(&self) -> ApplyError {
        ApplyError::MissingParent {
            op: self.op,
            path: self.path.to_string(),
        }
    }

    fn missing_target(&self) -> ApplyError {
        ApplyError::MissingTarget {
            op: self.op,
            path: self.path.to_string(),
        }
    }

    fn not_a_container(&self, found: &Value) -> ApplyError {
        ApplyError::NotAContainer {
            op: self.op,
            path: self.path.to_string(),
            found: type_name(found),
        }
    }
}

/// Walk existing containers only.
fn descend<'d>(document: &'d mut Value, segments: &[String]) -> Option<&'d mut Value> {
    segments.iter().try_fold(document, |current, segment| match current {
        Value::Object(map) => map.get_mut(segment),
        Value::Array(items) => parse_index(segment).and_then(|i| items.get_mut(i)),
        _ => None,
    })
}

fn container_for(next: &str) -> Value {
    if is_index_like(next) {
        Value::Array(Vec::new())
    } else {
        Value::Object(Map::new())
    }
}

fn type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
