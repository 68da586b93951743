//! Message Router Task Implementation
//!
//! Contains the `MessageRouter` struct and its event loop.

use std::sync::Arc;

use futures::future::BoxFuture;
use futures::stream::{FuturesUnordered, StreamExt};
use resultsview_core::channel::{
    ChannelError, InboundReceiver, OutboundSender, PanelEventReceiver,
};
use resultsview_core::export::{ExportJob, ExportOutcome};
use resultsview_core::{
    Exporter, Inbound, Outbound, PanelEvent, ResultsPanel, ResultsViewError, ResultsViewResult,
    RouterConfig, StaleExportPolicy,
};
use tokio::time::Instant;
use tracing::{debug, error, info, warn};

use super::handlers::{Dispatch, InboundHandlers, PanelHandlers};
use super::state::RouterState;
use crate::query::{QueryReceiver, RouterQuery};

type ExportFuture = BoxFuture<'static, ExportOutcome>;

// ----------------------------------------------------------------------------
// Message Router
// ----------------------------------------------------------------------------

/// The single task that owns render, focus and selection state
pub struct MessageRouter {
    state: RouterState,
    panel: Box<dyn ResultsPanel>,
    exporter: Arc<dyn Exporter>,
    /// Host → router envelopes; closing this stops the router
    inbound_receiver: InboundReceiver,
    /// Panel → router events
    panel_receiver: PanelEventReceiver,
    query_receiver: QueryReceiver,
    /// Router → host envelopes
    outbound_sender: OutboundSender,
    /// In-flight `getcontent` pipelines
    exports: FuturesUnordered<ExportFuture>,
    running: bool,
}

impl MessageRouter {
    pub fn new(
        config: RouterConfig,
        panel: Box<dyn ResultsPanel>,
        exporter: Arc<dyn Exporter>,
        inbound_receiver: InboundReceiver,
        panel_receiver: PanelEventReceiver,
        query_receiver: QueryReceiver,
        outbound_sender: OutboundSender,
    ) -> Self {
        Self {
            state: RouterState::new(config),
            panel,
            exporter,
            inbound_receiver,
            panel_receiver,
            query_receiver,
            outbound_sender,
            exports: FuturesUnordered::new(),
            running: true,
        }
    }

    /// Run the router until the inbound channel closes or a fatal error occurs
    pub async fn run(&mut self) -> ResultsViewResult<()> {
        info!("Message router starting");

        let mut panel_open = true;
        let mut queries_open = true;

        while self.running {
            let resize_deadline = self.state.resize.deadline();

            tokio::select! {
                inbound = self.inbound_receiver.recv() => {
                    match inbound {
                        Some(message) => {
                            self.state.host_attached = true;
                            if let Err(e) = self.process_inbound(message).await {
                                self.classify_error(e, "inbound message")?;
                            }
                        }
                        None => {
                            info!("Inbound channel closed, shutting down");
                            self.running = false;
                        }
                    }
                }

                event = self.panel_receiver.recv(), if panel_open => {
                    match event {
                        Some(event) => {
                            if let Err(e) = self.process_panel_event(event).await {
                                self.classify_error(e, "panel event")?;
                            }
                        }
                        None => {
                            debug!("Panel event channel closed");
                            panel_open = false;
                        }
                    }
                }

                query = self.query_receiver.recv(), if queries_open => {
                    match query {
                        Some(query) => self.answer_query(query),
                        None => queries_open = false,
                    }
                }

                Some(outcome) = self.exports.next(), if !self.exports.is_empty() => {
                    if let Err(e) = self.finish_export(outcome).await {
                        self.classify_error(e, "export reply")?;
                    }
                }

                _ = wait_until(resize_deadline), if resize_deadline.is_some() => {
                    if let Some(message) = self.state.resize.fire() {
                        if let Err(e) = self.send_outbound(message).await {
                            self.classify_error(e, "size report")?;
                        }
                    }
                }
            }
        }

        // Events the panel raised while handling the last inbound messages
        while let Ok(event) = self.panel_receiver.try_recv() {
            if let Err(e) = self.process_panel_event(event).await {
                self.classify_error(e, "panel event")?;
            }
        }

        // In-flight exports always complete and reply
        while let Some(outcome) = self.exports.next().await {
            if let Err(e) = self.finish_export(outcome).await {
                self.classify_error(e, "export reply")?;
            }
        }

        info!("Message router stopped");
        Ok(())
    }

    /// Stop the router after the current message
    pub fn stop(&mut self) {
        self.running = false;
    }

    pub fn state(&self) -> &RouterState {
        &self.state
    }

    /// Fatal errors stop the router; everything else is logged and dropped
    fn classify_error(&mut self, e: ResultsViewError, context: &str) -> ResultsViewResult<()> {
        if e.is_fatal() {
            error!("Unrecoverable error processing {}, shutting down router: {}", context, e);
            self.running = false;
            return Err(e);
        }
        match &e {
            ResultsViewError::Lookup(lookup) => {
                warn!("Lookup failed for {}: {}. Dropping.", context, lookup)
            }
            _ => warn!("Error processing {}: {}", context, e),
        }
        Ok(())
    }

    async fn process_inbound(&mut self, message: Inbound) -> ResultsViewResult<()> {
        self.state.stats.inbound_handled += 1;
        debug!("Handling inbound '{}'", message.kind());

        match InboundHandlers::handle(&mut self.state, self.panel.as_mut(), message)? {
            Dispatch::Post(outbound) => self.send_all(outbound).await,
            Dispatch::Export(job) => {
                self.start_export(job);
                Ok(())
            }
        }
    }

    async fn process_panel_event(&mut self, event: PanelEvent) -> ResultsViewResult<()> {
        self.state.stats.panel_events += 1;
        let outbound = PanelHandlers::handle(&mut self.state, self.panel.as_mut(), event)?;
        self.send_all(outbound).await
    }

    fn start_export(&mut self, job: ExportJob) {
        self.state.stats.exports_started += 1;
        debug!("Exporting '{}' ({:?})", job.address, job.plan);
        let exporter = Arc::clone(&self.exporter);
        self.exports.push(Box::pin(job.run(exporter)));
    }

    /// Post the reply to a finished export, subject to the stale policy
    async fn finish_export(&mut self, outcome: ExportOutcome) -> ResultsViewResult<()> {
        let ExportOutcome {
            address,
            generation,
            result,
        } = outcome;

        let content = match result {
            Ok(content) => content,
            Err(e) => {
                self.state.stats.exports_aborted += 1;
                warn!("Export of '{}' aborted without reply: {}", address, e);
                return Ok(());
            }
        };
        self.state.stats.exports_completed += 1;

        if generation != self.state.generation {
            self.state.stats.stale_replies += 1;
            match self.state.config.stale_exports {
                StaleExportPolicy::Reply => {
                    warn!(
                        "Replying to '{}' with content from replaced results (generation {} of {})",
                        address, generation, self.state.generation
                    );
                }
                StaleExportPolicy::Drop => {
                    warn!(
                        "Dropping reply to '{}': results generation {} was replaced by {}",
                        address, generation, self.state.generation
                    );
                    return Ok(());
                }
            }
        }

        self.send_outbound(Outbound::GetContent { content, address }).await
    }

    fn answer_query(&self, query: RouterQuery) {
        // A dropped reply receiver only means the asker went away
        match query {
            RouterQuery::GetParam {
                address,
                name,
                reply,
            } => {
                let _ = reply.send(self.state.param(&address, &name));
            }
            RouterQuery::Definition { reply } => {
                let _ = reply.send(self.state.definition.clone());
            }
            RouterQuery::View { reply } => {
                let _ = reply.send(self.state.view());
            }
            RouterQuery::Stats { reply } => {
                let _ = reply.send(self.state.stats.clone());
            }
        }
    }

    async fn send_all(&mut self, messages: Vec<Outbound>) -> ResultsViewResult<()> {
        for message in messages {
            self.send_outbound(message).await?;
        }
        Ok(())
    }

    async fn send_outbound(&mut self, message: Outbound) -> ResultsViewResult<()> {
        debug!("Posting '{}'", message.kind());
        self.outbound_sender
            .send(message)
            .await
            .map_err(ChannelError::from)?;
        self.state.stats.outbound_posted += 1;
        Ok(())
    }
}

/// Sleep until `deadline`; pending forever when there is none
async fn wait_until(deadline: Option<Instant>) {
    match deadline {
        Some(deadline) => tokio::time::sleep_until(deadline).await,
        None => std::future::pending().await,
    }
}
