//! Results View Core Protocol Implementation
//!
//! This crate provides the foundational types and pure state machines for the
//! host/panel protocol that keeps a host window synchronised with an embedded,
//! separately rendered results panel. Neither side can see the other's object
//! graph; everything crosses the boundary as typed envelopes and nodes are
//! named by path addresses.

// ----------------------------------------------------------------------------
// Module Declarations
// ----------------------------------------------------------------------------

pub mod address;
pub mod channel;
pub mod config;
pub mod definition;
pub mod errors;
pub mod export;
pub mod focus;
pub mod panel;
pub mod selection;
pub mod view;

#[cfg(feature = "headless")]
pub mod headless;

// ----------------------------------------------------------------------------
// Public API
// ----------------------------------------------------------------------------

pub use address::{flatten, unflatten, Address};
pub use channel::{
    AnnotationEvent, Envelope, Inbound, MenuEntry, MenuEvent, MenuEventKind, MouseButtonEvent,
    MouseEventKind, Outbound, PanelEvent,
};
pub use config::{ChannelConfig, HeadlessConfig, RouterConfig, StaleExportPolicy};
pub use definition::{ResultsDefinition, ROOT_ALWAYS_VISIBLE};
pub use errors::{
    EnvelopeError, ExportError, FocusError, LookupError, Result, ResultsViewError,
    ResultsViewResult,
};
pub use export::{ContentKind, ExportPlan, ExportedContent};
pub use focus::{FocusRefCounter, FocusTransition};
pub use panel::{
    resolve_address, AnnotationId, Exporter, HitTarget, NodeClass, NodeId, Rect, ReferenceTable,
    ResultsPanel, Size,
};
pub use selection::{OverlayStyle, SelectionOverlay};
pub use view::{AnnotationBooleans, ViewState};
