//! WASM bindings for the SpecStream compiler and runtime.
//!
//! Exposes one-shot `compile()`, a streaming `StreamCompiler` class and
//! `render()` to JavaScript via wasm-bindgen. Results cross the boundary as
//! plain JS objects; errors are thrown.

use serde::Serialize;
use serde_json::Value;
use specstream_compiler::{CompileOptions, CompilerSession, Spec};
use specstream_runtime::{initial_state, RenderNode};
use wasm_bindgen::prelude::*;

fn options(strict: Option<bool>) -> CompileOptions {
    if strict.unwrap_or(false) {
        CompileOptions::strict()
    } else {
        CompileOptions::default()
    }
}

/// Serialize to plain objects rather than JS `Map`s.
fn to_js<T: Serialize + ?Sized>(value: &T) -> Result<JsValue, JsError> {
    value
        .serialize(&serde_wasm_bindgen::Serializer::json_compatible())
        .map_err(|e| JsError::new(&e.to_string()))
}

fn from_js<T: serde::de::DeserializeOwned>(value: JsValue, what: &str) -> Result<T, JsError> {
    serde_wasm_bindgen::from_value(value).map_err(|e| JsError::new(&format!("Invalid {what}: {e}")))
}

/// Compile a complete SpecStream text.
///
/// Returns the spec `{ root, elements, state? }`. Throws only in strict mode.
#[wasm_bindgen]
pub fn compile(text: &str, strict: Option<bool>) -> Result<JsValue, JsError> {
    let spec = specstream_compiler::compile_with(text, options(strict))
        .map_err(|e| JsError::new(&e.to_string()))?;
    to_js(&spec)
}

/// Incremental compiler for one generation.
///
/// ```js
/// const compiler = new StreamCompiler();
/// for await (const chunk of response) {
///   const { result, newPatches } = compiler.push(chunk);
/// }
/// const spec = compiler.getResult();
/// ```
#[wasm_bindgen]
pub struct StreamCompiler {
    session: CompilerSession,
}

#[wasm_bindgen]
impl StreamCompiler {
    #[wasm_bindgen(constructor)]
    pub fn new(strict: Option<bool>) -> StreamCompiler {
        StreamCompiler {
            session: CompilerSession::with_options(options(strict)),
        }
    }

    /// Feed a chunk. Returns `{ result, newPatches }`.
    pub fn push(&mut self, chunk: &str) -> Result<JsValue, JsError> {
        let pushed = self.session.push(chunk).map_err(|e| JsError::new(&e.to_string()))?;
        to_js(&pushed)
    }

    /// Feed raw bytes, e.g. a `Uint8Array` straight from a stream reader.
    /// A multi-byte character may be split across chunks.
    #[wasm_bindgen(js_name = pushBytes)]
    pub fn push_bytes(&mut self, chunk: &[u8]) -> Result<JsValue, JsError> {
        let pushed = self
            .session
            .push_bytes(chunk)
            .map_err(|e| JsError::new(&e.to_string()))?;
        to_js(&pushed)
    }

    /// Flush the last line and return the final spec.
    #[wasm_bindgen(js_name = getResult)]
    pub fn get_result(&mut self) -> Result<JsValue, JsError> {
        let spec = self.session.get_result().map_err(|e| JsError::new(&e.to_string()))?;
        to_js(&spec)
    }

    /// `{ lines, applied, dropped }` so far.
    pub fn stats(&self) -> Result<JsValue, JsError> {
        to_js(&self.session.stats())
    }

    #[wasm_bindgen(getter)]
    pub fn finished(&self) -> bool {
        self.session.is_finished()
    }
}

/// Resolve a spec against state into a tree of visible nodes.
///
/// `state` defaults to the spec's own seed state. Returns `null` when the root
/// is missing or hidden.
#[wasm_bindgen]
pub fn render(spec: JsValue, state: JsValue) -> Result<JsValue, JsError> {
    let spec: Spec = from_js(spec, "spec")?;
    let state: Option<Value> = if state.is_undefined() || state.is_null() {
        None
    } else {
        Some(from_js(state, "state")?)
    };
    to_js(&render_tree(&spec, state))
}

/// Structural problems in a spec, as messages.
#[wasm_bindgen]
pub fn validate(spec: JsValue) -> Result<JsValue, JsError> {
    let spec: Spec = from_js(spec, "spec")?;
    to_js(&issues(&spec))
}

/// Get the compiler version.
#[wasm_bindgen]
pub fn version() -> String {
    env!("CARGO_PKG_VERSION").to_string()
}

fn render_tree(spec: &Spec, state: Option<Value>) -> Option<RenderNode> {
    let state = state.unwrap_or_else(|| initial_state(spec));
    specstream_runtime::render(spec, &state)
}

fn issues(spec: &Spec) -> Vec<String> {
    spec.validate().iter().map(ToString::to_string).collect()
}
