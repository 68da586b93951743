//! Line-delimited JSON bridge between a host process and the router

use std::sync::Arc;

use resultsview_core::headless::HeadlessPanel;
use resultsview_core::{Envelope, Outbound, ResultsViewError};
use resultsview_runtime::{RouterBuilder, RouterHandle};
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt};
use tracing::{debug, info, warn};

use crate::config::AppConfig;
use crate::error::{CliError, Result};

/// Forwards host envelopes to the router and router envelopes to the host
pub struct BridgeApp {
    router: RouterHandle,
}

impl BridgeApp {
    /// Start a router driving a headless panel
    pub async fn new(config: AppConfig) -> Result<Self> {
        config.validate()?;

        let panel = HeadlessPanel::new(config.headless);
        let exporter = Arc::new(panel.exporter());
        let router = RouterBuilder::new(Box::new(panel), exporter)
            .with_config(config.router)
            .with_channel_config(config.channels)
            .build_and_start()
            .await?;

        Ok(Self { router })
    }

    /// Pump envelopes until the input ends and every reply has been written
    ///
    /// Returns the router's own error if it stopped on a fatal fault.
    pub async fn run<R, W>(mut self, input: R, mut output: W) -> Result<()>
    where
        R: AsyncBufRead + Unpin,
        W: AsyncWrite + Unpin,
    {
        let mut outbound = self
            .router
            .take_outbound_receiver()
            .ok_or_else(|| CliError::Bridge("outbound receiver already taken".into()))?;
        let mut lines = input.lines();
        let mut input_open = true;

        loop {
            tokio::select! {
                line = lines.next_line(), if input_open => {
                    match line? {
                        Some(line) => {
                            if !self.forward_line(&line).await {
                                input_open = false;
                            }
                        }
                        None => {
                            info!("Input closed, waiting for pending replies");
                            self.router.close();
                            input_open = false;
                        }
                    }
                }

                message = outbound.recv() => {
                    match message {
                        Some(message) => write_message(&mut output, &message).await?,
                        None => break,
                    }
                }
            }
        }

        output.flush().await?;
        self.router.wait().await?;
        info!("Bridge finished");
        Ok(())
    }

    /// Send one input line to the router; false once the router is gone
    async fn forward_line(&self, line: &str) -> bool {
        let line = line.trim();
        if line.is_empty() {
            return true;
        }

        let envelope: Envelope = match serde_json::from_str(line) {
            Ok(envelope) => envelope,
            Err(e) => {
                warn!("Skipping malformed envelope: {}", e);
                return true;
            }
        };

        match self.router.send_envelope(envelope).await {
            Ok(true) => true,
            Ok(false) => {
                debug!("Skipped envelope of unknown type");
                true
            }
            Err(ResultsViewError::Envelope(e)) => {
                warn!("Skipping envelope: {}", e);
                true
            }
            Err(e) => {
                warn!("Router no longer accepting envelopes: {}", e);
                false
            }
        }
    }
}

async fn write_message<W: AsyncWrite + Unpin>(output: &mut W, message: &Outbound) -> Result<()> {
    let mut line = message.to_json()?;
    line.push('\n');
    output.write_all(line.as_bytes()).await?;
    output.flush().await?;
    Ok(())
}
