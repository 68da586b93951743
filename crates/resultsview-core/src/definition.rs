//! Host-supplied render state
//!
//! A [`ResultsDefinition`] arrives whole with every `results` envelope and
//! replaces the previous one; nothing is merged.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::address::Address;

/// Visibility value that forces the results root to render even when empty
pub const ROOT_ALWAYS_VISIBLE: i64 = 2;

/// Panel mode that includes rich markup in exports
pub const RICH_MODE: &str = "rich";

/// Render state supplied by the host
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResultsDefinition {
    /// The results tree
    #[serde(default)]
    pub results: Value,
    /// Option values keyed by `results/<path>/<name>`
    #[serde(default)]
    pub options: Map<String, Value>,
    /// Panel mode (`rich`, `text`, ...)
    #[serde(default)]
    pub mode: String,
    #[serde(default)]
    pub dev_mode: bool,
    /// Number formatting settings passed through to the renderer
    #[serde(default)]
    pub format: Value,
    /// Reference entries for the reference table
    #[serde(default)]
    pub refs: Value,
    #[serde(default)]
    pub refs_mode: Value,
}

impl ResultsDefinition {
    /// Mark the results root as always visible
    ///
    /// A root that is not an object (absent or null) becomes an empty one.
    pub fn force_root_visible(&mut self) {
        if !self.results.is_object() {
            self.results = Value::Object(Map::new());
        }
        if let Value::Object(root) = &mut self.results {
            root.insert("visible".to_string(), Value::from(ROOT_ALWAYS_VISIBLE));
        }
    }

    /// The root's visibility flag, if set
    pub fn root_visibility(&self) -> Option<i64> {
        self.results.get("visible").and_then(Value::as_i64)
    }

    /// Whether exports should include rich markup
    pub fn is_rich(&self) -> bool {
        self.mode == RICH_MODE
    }

    /// Option `name` of the node at `address`
    pub fn param(&self, address: &Address, name: &str) -> Option<&Value> {
        self.options.get(&address.option_key(name))
    }
}
