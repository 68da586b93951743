//! Results View Runtime Engine
//!
//! This crate contains the engine that keeps a host window and an embedded
//! results panel in step:
//! - `MessageRouter`: the single task owning all render and focus state
//! - `RouterBuilder` / `RouterHandle`: channel wiring and the host-facing handle
//! - `ResizeNotifier`: debounced content size reporting
//!
//! The envelope types, collaborator traits and pure state machines live in
//! `resultsview-core`.

pub mod builder;
pub mod logic;
pub mod query;
pub mod resize;

pub use builder::{RouterBuilder, RouterHandle};
pub use logic::{InboundHandlers, MessageRouter, PanelHandlers, RouterState, RouterStats};
pub use query::{create_query_channel, QueryReceiver, QuerySender, RouterQuery};
pub use resize::ResizeNotifier;

// Re-export core types for convenience
pub use resultsview_core::{
    channel::{
        create_inbound_channel, create_outbound_channel, create_panel_event_channel,
        ChannelError, InboundReceiver, InboundSender, OutboundReceiver, OutboundSender,
        PanelEventReceiver, PanelEventSender,
    },
    ChannelConfig, Envelope, Inbound, Outbound, PanelEvent, ResultsViewError, ResultsViewResult,
    RouterConfig,
};
