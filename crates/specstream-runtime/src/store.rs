//! State store seam.
//!
//! Host frameworks keep state in their own reactive containers; the runtime
//! only ever reads it. A store hands out a snapshot for a walk and single
//! values by pointer.

use crate::render::{render, RenderNode};
use crate::walker::{walk, Visitor};
use serde_json::Value;
use specstream_compiler::Spec;
use specstream_patch::pointer;
use std::borrow::Cow;

/// Read access to application state.
pub trait StateStore {
    /// Value at a JSON pointer, or `None` when absent.
    fn get(&self, pointer: &str) -> Option<Value>;

    /// The whole state model, for one evaluation pass.
    fn snapshot(&self) -> Cow<'_, Value>;

    /// Walk `spec` against the current snapshot.
    fn walk<V: Visitor + ?Sized>(&self, spec: &Spec, visitor: &mut V)
    where
        Self: Sized,
    {
        walk(spec, &self.snapshot(), visitor);
    }

    /// Render `spec` against the current snapshot.
    fn render(&self, spec: &Spec) -> Option<RenderNode> {
        render(spec, &self.snapshot())
    }
}

impl StateStore for Value {
    fn get(&self, path: &str) -> Option<Value> {
        pointer::get(self, path).cloned()
    }

    fn snapshot(&self) -> Cow<'_, Value> {
        Cow::Borrowed(self)
    }
}

/// The state a session starts from: the spec's seed, or an empty object.
pub fn initial_state(spec: &Spec) -> Value {
    spec.state
        .clone()
        .unwrap_or_else(|| Value::Object(Default::default()))
}
