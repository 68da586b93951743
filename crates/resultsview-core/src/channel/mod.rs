//! Channel Module
//!
//! The typed message contract between host, router and panel:
//! - `communication`: envelopes and the inbound, outbound and panel-local message enums
//! - `utils`: channel aliases and constructors

pub mod communication;
pub mod utils;

// Re-export communication types
pub use communication::{
    AnnotationEvent, Envelope, Inbound, MenuEntry, MenuEvent, MenuEventKind, MouseButtonEvent,
    MouseEventKind, NoteOptions, Outbound, PanelEvent,
};

// Re-export ChannelConfig from config module
pub use crate::config::ChannelConfig;

// Re-export utility types
pub use utils::{
    create_inbound_channel, create_outbound_channel, create_panel_event_channel, ChannelError,
    InboundReceiver, InboundSender, OutboundReceiver, OutboundSender, PanelEventReceiver,
    PanelEventSender,
};
