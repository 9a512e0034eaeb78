//! SpecStream Runtime
//!
//! Evaluates the dynamic parts of a compiled [`Spec`] against application
//! state: prop bindings, visibility conditions and repeats. Everything here
//! takes shared references and has no side effects, so it is safe to call on
//! every re-render.
//!
//! ```text
//! Spec + state → walk() → Visitor (framework adapter, or TreeBuilder)
//!                  ├─ evaluate()  visibility
//!                  ├─ resolve()   props
//!                  └─ expand()    repeats
//! ```
//!
//! [`Spec`]: specstream_compiler::Spec

pub mod render;
pub mod repeat;
pub mod resolve;
pub mod store;
pub mod visibility;
pub mod walker;

pub use render::{render, RenderNode, TreeBuilder};
pub use repeat::{expand, ItemContext};
pub use resolve::{binding_path, resolve, resolve_props};
pub use store::{initial_state, StateStore};
pub use visibility::{evaluate, evaluate_condition, is_truthy};
pub use walker::{visit, walk, ResolvedElement, Visitor, MAX_DEPTH};

use serde_json::Value;

/// What a binding can see: the state model and, inside a repeat, the current item.
#[derive(Debug, Clone)]
pub struct ResolveContext<'a> {
    pub state: &'a Value,
    pub repeat: Option<RepeatScope<'a>>,
}

/// The innermost repeat item in scope.
#[derive(Debug, Clone, PartialEq)]
pub struct RepeatScope<'a> {
    pub item: &'a Value,
    pub index: usize,
    /// State pointer of the item, e.g. `/todos/2`.
    pub base_path: String,
}

impl<'a> ResolveContext<'a> {
    /// A context with no repeat scope.
    pub fn new(state: &'a Value) -> Self {
        Self {
            state,
            repeat: None,
        }
    }

    /// The same state with `scope` as the repeat item. Any outer item is
    /// replaced, not stacked.
    pub fn with_repeat(&self, scope: RepeatScope<'a>) -> Self {
        Self {
            state: self.state,
            repeat: Some(scope),
        }
    }

    /// Shorthand for `with_repeat(item.scope())`.
    pub fn with_item(&self, item: &ItemContext<'a>) -> Self {
        self.with_repeat(item.scope())
    }
}
