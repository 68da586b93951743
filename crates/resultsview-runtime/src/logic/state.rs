//! Router State Management
//!
//! Contains the state owned by the router task and its statistics.

use resultsview_core::{
    Address, AnnotationBooleans, FocusRefCounter, ReferenceTable, ResultsDefinition,
    RouterConfig, SelectionOverlay, ViewState,
};
use serde_json::Value;

use crate::resize::ResizeNotifier;

// ----------------------------------------------------------------------------
// Router State
// ----------------------------------------------------------------------------

/// State owned exclusively by the router task
pub struct RouterState {
    pub config: RouterConfig,
    /// Render state from the last `results` envelope
    pub definition: Option<ResultsDefinition>,
    /// Bumped on every `results`; node handles from older generations are stale
    pub generation: u64,
    /// Reference table of the current render
    pub reference_table: Option<Box<dyn ReferenceTable>>,
    /// Nested annotation editing regions
    pub focus: FocusRefCounter,
    pub annotations: AnnotationBooleans,
    pub selection: SelectionOverlay,
    pub resize: ResizeNotifier,
    /// Set once the host has sent anything
    pub host_attached: bool,
    pub stats: RouterStats,
}

impl RouterState {
    pub fn new(config: RouterConfig) -> Self {
        Self {
            selection: SelectionOverlay::new(config.overlay_inset),
            resize: ResizeNotifier::from_config(&config),
            config,
            definition: None,
            generation: 0,
            reference_table: None,
            focus: FocusRefCounter::new(),
            annotations: AnnotationBooleans::default(),
            host_attached: false,
            stats: RouterStats::default(),
        }
    }

    pub fn is_rendered(&self) -> bool {
        self.definition.is_some()
    }

    /// Panel mode of the current results
    pub fn mode(&self) -> &str {
        self.definition.as_ref().map_or("", |defn| defn.mode.as_str())
    }

    /// Project the current flags and selection
    pub fn view(&self) -> ViewState {
        ViewState::project(self.mode(), &self.annotations, &self.selection)
    }

    /// Option `name` of the node at `address`
    pub fn param(&self, address: &Address, name: &str) -> Option<Value> {
        self.definition.as_ref()?.param(address, name).cloned()
    }
}

/// Statistics for the router task
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RouterStats {
    pub inbound_handled: u64,
    pub panel_events: u64,
    pub outbound_posted: u64,
    pub exports_started: u64,
    pub exports_completed: u64,
    pub exports_aborted: u64,
    pub stale_replies: u64,
}
