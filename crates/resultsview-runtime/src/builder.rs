//! Router Builder API
//!
//! Wires the host, panel and query channels to a `MessageRouter`, spawns it,
//! and hands back a `RouterHandle` for the host side.

use std::sync::Arc;

use resultsview_core::channel::{
    create_inbound_channel, create_outbound_channel, create_panel_event_channel, InboundSender,
    OutboundReceiver, PanelEventSender,
};
use resultsview_core::{
    Address, ChannelConfig, Envelope, Exporter, Inbound, Outbound, ResultsDefinition,
    ResultsPanel, ResultsViewError, ResultsViewResult, RouterConfig, ViewState,
};
use serde_json::Value;
use tokio::sync::oneshot;
use tokio::task::JoinHandle;
use tokio::time::Duration;
use tracing::{debug, info};

use crate::logic::{MessageRouter, RouterStats};
use crate::query::{create_query_channel, QuerySender, RouterQuery};

/// How long `shutdown` waits for in-flight exports
const SHUTDOWN_TIMEOUT: Duration = Duration::from_secs(10);

// ----------------------------------------------------------------------------
// Router Builder
// ----------------------------------------------------------------------------

/// Builder for a running message router
pub struct RouterBuilder {
    panel: Box<dyn ResultsPanel>,
    exporter: Arc<dyn Exporter>,
    config: RouterConfig,
    channels: ChannelConfig,
}

impl RouterBuilder {
    pub fn new(panel: Box<dyn ResultsPanel>, exporter: Arc<dyn Exporter>) -> Self {
        Self {
            panel,
            exporter,
            config: RouterConfig::default(),
            channels: ChannelConfig::default(),
        }
    }

    /// Set the router configuration
    pub fn with_config(mut self, config: RouterConfig) -> Self {
        self.config = config;
        self
    }

    /// Set channel buffer sizes
    pub fn with_channel_config(mut self, channels: ChannelConfig) -> Self {
        self.channels = channels;
        self
    }

    /// Build and start the router
    pub async fn build_and_start(self) -> ResultsViewResult<RouterHandle> {
        if self.config.overlay_inset < 0.0 {
            return Err(ResultsViewError::config_error(
                "overlay_inset must not be negative",
            ));
        }

        let (inbound_sender, inbound_receiver) = create_inbound_channel(&self.channels);
        let (panel_sender, panel_receiver) = create_panel_event_channel(&self.channels);
        let (outbound_sender, outbound_receiver) = create_outbound_channel(&self.channels);
        let (query_sender, query_receiver) = create_query_channel(&self.channels);

        let mut panel = self.panel;
        panel.attach_events(panel_sender.clone());

        let mut router = MessageRouter::new(
            self.config,
            panel,
            self.exporter,
            inbound_receiver,
            panel_receiver,
            query_receiver,
            outbound_sender,
        );
        let router_handle = tokio::spawn(async move { router.run().await });

        info!("Message router started");

        Ok(RouterHandle {
            inbound_sender: Some(inbound_sender),
            panel_sender,
            query_sender,
            outbound_receiver: Some(outbound_receiver),
            router_handle: Some(router_handle),
        })
    }
}

// ----------------------------------------------------------------------------
// Router Handle
// ----------------------------------------------------------------------------

/// Host-side handle to a running router
pub struct RouterHandle {
    inbound_sender: Option<InboundSender>,
    panel_sender: PanelEventSender,
    query_sender: QuerySender,
    outbound_receiver: Option<OutboundReceiver>,
    router_handle: Option<JoinHandle<ResultsViewResult<()>>>,
}

impl RouterHandle {
    /// Send a decoded envelope to the router
    pub async fn send(&self, message: Inbound) -> ResultsViewResult<()> {
        let sender = self
            .inbound_sender
            .as_ref()
            .ok_or_else(|| ResultsViewError::channel_error("Router is shut down"))?;
        sender
            .send(message)
            .await
            .map_err(|_| ResultsViewError::channel_error("Failed to send envelope to router"))
    }

    /// Decode and send a raw envelope
    ///
    /// Returns `Ok(false)` when the envelope type is unknown and was ignored.
    pub async fn send_envelope(&self, envelope: Envelope) -> ResultsViewResult<bool> {
        let kind = envelope.kind.clone();
        match Inbound::decode(envelope)? {
            Some(message) => {
                self.send(message).await?;
                Ok(true)
            }
            None => {
                debug!("Ignoring unknown envelope type '{}'", kind);
                Ok(false)
            }
        }
    }

    /// Sender for events raised inside the panel
    pub fn panel_events(&self) -> PanelEventSender {
        self.panel_sender.clone()
    }

    /// Take the outbound receiver (can only be called once)
    pub fn take_outbound_receiver(&mut self) -> Option<OutboundReceiver> {
        self.outbound_receiver.take()
    }

    /// Next envelope posted to the host, if the receiver was not taken
    pub async fn recv_outbound(&mut self) -> Option<Outbound> {
        self.outbound_receiver.as_mut()?.recv().await
    }

    /// Option `name` of the node at `address` in the current results
    pub async fn get_param(&self, address: Address, name: &str) -> ResultsViewResult<Option<Value>> {
        let name = name.to_string();
        self.query(|reply| RouterQuery::GetParam {
            address,
            name,
            reply,
        })
        .await
    }

    /// The current results definition
    pub async fn definition(&self) -> ResultsViewResult<Option<ResultsDefinition>> {
        self.query(|reply| RouterQuery::Definition { reply }).await
    }

    /// The current view state
    pub async fn view(&self) -> ResultsViewResult<ViewState> {
        self.query(|reply| RouterQuery::View { reply }).await
    }

    pub async fn stats(&self) -> ResultsViewResult<RouterStats> {
        self.query(|reply| RouterQuery::Stats { reply }).await
    }

    async fn query<T>(
        &self,
        build: impl FnOnce(oneshot::Sender<T>) -> RouterQuery,
    ) -> ResultsViewResult<T> {
        let (reply, answer) = oneshot::channel();
        self.query_sender
            .send(build(reply))
            .await
            .map_err(|_| ResultsViewError::channel_error("Router is not running"))?;
        answer
            .await
            .map_err(|_| ResultsViewError::channel_error("Router dropped query"))
    }

    /// Check if the router task is still running
    pub fn is_running(&self) -> bool {
        self.router_handle
            .as_ref()
            .is_some_and(|handle| !handle.is_finished())
    }

    /// Wait for the router to stop and return its result
    pub async fn wait(&mut self) -> ResultsViewResult<()> {
        match self.router_handle.take() {
            Some(handle) => match handle.await {
                Ok(result) => result,
                Err(e) => Err(ResultsViewError::channel_error(format!(
                    "Router task panicked: {}",
                    e
                ))),
            },
            None => Ok(()),
        }
    }

    /// Close the host channel; the router stops once in-flight exports reply
    pub fn close(&mut self) {
        self.inbound_sender = None;
    }

    /// Close the host channel and wait for in-flight exports to reply
    pub async fn shutdown(&mut self) -> ResultsViewResult<()> {
        info!("Shutting down message router");
        self.close();

        let Some(handle) = self.router_handle.take() else {
            return Ok(());
        };
        match tokio::time::timeout(SHUTDOWN_TIMEOUT, handle).await {
            Ok(Ok(result)) => result,
            Ok(Err(e)) => Err(ResultsViewError::channel_error(format!(
                "Router task panicked: {}",
                e
            ))),
            Err(_) => Err(ResultsViewError::channel_error(
                "Router did not stop within the shutdown timeout",
            )),
        }
    }
}
