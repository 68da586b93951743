//! Channel Utilities
//!
//! Bounded tokio channels connecting the host bridge, the panel and the
//! router task.

use thiserror::Error;

use crate::channel::communication::{Inbound, Outbound, PanelEvent};
use crate::config::ChannelConfig;
use crate::errors::ResultsViewError;

#[derive(Debug, Error)]
pub enum ChannelError {
    #[error("Channel buffer is full")]
    ChannelFull,
    #[error("Channel is closed")]
    ChannelClosed,
    #[error("Channel receiver was dropped")]
    ReceiverDropped,
}

impl From<ChannelError> for ResultsViewError {
    fn from(err: ChannelError) -> Self {
        ResultsViewError::channel_error(err.to_string())
    }
}

impl<T> From<tokio::sync::mpsc::error::SendError<T>> for ChannelError {
    fn from(_: tokio::sync::mpsc::error::SendError<T>) -> Self {
        ChannelError::ReceiverDropped
    }
}

impl<T> From<tokio::sync::mpsc::error::TrySendError<T>> for ChannelError {
    fn from(err: tokio::sync::mpsc::error::TrySendError<T>) -> Self {
        match err {
            tokio::sync::mpsc::error::TrySendError::Full(_) => ChannelError::ChannelFull,
            tokio::sync::mpsc::error::TrySendError::Closed(_) => ChannelError::ChannelClosed,
        }
    }
}

pub type InboundSender = tokio::sync::mpsc::Sender<Inbound>;
pub type InboundReceiver = tokio::sync::mpsc::Receiver<Inbound>;
pub type PanelEventSender = tokio::sync::mpsc::Sender<PanelEvent>;
pub type PanelEventReceiver = tokio::sync::mpsc::Receiver<PanelEvent>;
pub type OutboundSender = tokio::sync::mpsc::Sender<Outbound>;
pub type OutboundReceiver = tokio::sync::mpsc::Receiver<Outbound>;

// ----------------------------------------------------------------------------
// Channel Creation Utilities
// ----------------------------------------------------------------------------

/// Create bounded inbound channel (Host → Router)
pub fn create_inbound_channel(config: &ChannelConfig) -> (InboundSender, InboundReceiver) {
    tokio::sync::mpsc::channel(config.inbound_buffer_size)
}

/// Create bounded panel event channel (Panel → Router)
pub fn create_panel_event_channel(config: &ChannelConfig) -> (PanelEventSender, PanelEventReceiver) {
    tokio::sync::mpsc::channel(config.panel_buffer_size)
}

/// Create bounded outbound channel (Router → Host)
pub fn create_outbound_channel(config: &ChannelConfig) -> (OutboundSender, OutboundReceiver) {
    tokio::sync::mpsc::channel(config.outbound_buffer_size)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_send_errors_map_to_channel_errors() {
        let (sender, receiver) = create_outbound_channel(&ChannelConfig {
            outbound_buffer_size: 1,
            ..ChannelConfig::default()
        });
        sender.try_send(Outbound::AnnotationFocus(serde_json::Value::Null)).unwrap();

        let full = sender
            .try_send(Outbound::AnnotationFocus(serde_json::Value::Null))
            .unwrap_err();
        assert!(matches!(ChannelError::from(full), ChannelError::ChannelFull));

        drop(receiver);
        let dropped = sender
            .send(Outbound::AnnotationFocus(serde_json::Value::Null))
            .await
            .unwrap_err();
        let err = ChannelError::from(dropped);
        assert_eq!(err.to_string(), "Channel receiver was dropped");
        assert!(matches!(
            ResultsViewError::from(err),
            ResultsViewError::Channel { .. }
        ));
    }
}
