//! Replies to `getcontent` requests that outlive their results

mod common;

use std::sync::Arc;

use async_trait::async_trait;
use common::{
    drain_messages, next_message, sample_results, settle, settle_inbound, start_router_with,
    SharedPanel,
};
use resultsview_core::headless::HeadlessExporter;
use resultsview_core::{
    Address, ContentKind, Envelope, ExportError, ExportedContent, Exporter, NodeId, Outbound,
    RouterConfig, StaleExportPolicy,
};
use serde_json::{json, Value};
use tokio::sync::watch;
use tokio::time::Duration;

/// Holds every export until the gate opens
struct GatedExporter {
    inner: HeadlessExporter,
    gate: watch::Receiver<bool>,
}

#[async_trait]
impl Exporter for GatedExporter {
    async fn export(
        &self,
        node: NodeId,
        kind: ContentKind,
        options: &Value,
    ) -> Result<Option<String>, ExportError> {
        let mut gate = self.gate.clone();
        let opened = gate.wait_for(|open| *open).await.is_ok();
        if !opened {
            return Err(ExportError::Failed {
                kind,
                reason: "gate closed".to_string(),
            });
        }
        self.inner.export(node, kind, options).await
    }
}

/// Start a router, request the table, then replace the results mid-export
async fn replace_during_export(
    policy: StaleExportPolicy,
) -> (resultsview_runtime::RouterHandle, watch::Sender<bool>) {
    let panel = SharedPanel::default();
    let (open, gate) = watch::channel(false);
    let exporter = Arc::new(GatedExporter {
        inner: panel.exporter(),
        gate,
    });
    let config = RouterConfig {
        stale_exports: policy,
        ..RouterConfig::default()
    };
    let router = start_router_with(&panel, exporter, config).await;

    router
        .send_envelope(Envelope::new("results", sample_results("rich")))
        .await
        .unwrap();
    router
        .send_envelope(Envelope::new("getcontent", json!({ "address": ["table"] })))
        .await
        .unwrap();
    router
        .send_envelope(Envelope::new("results", sample_results("rich")))
        .await
        .unwrap();
    settle_inbound(&router, 3).await;

    (router, open)
}

#[tokio::test]
async fn test_stale_reply_posted_by_default() {
    let (mut router, open) = replace_during_export(StaleExportPolicy::Reply).await;

    open.send(true).unwrap();
    match next_message(&mut router).await {
        Outbound::GetContent { content, address } => {
            assert_eq!(address, Address::from(&["table"][..]));
            // The old node is gone from the new render
            assert_eq!(content, ExportedContent::default());
        }
        other => panic!("unexpected message {:?}", other),
    }

    let stats = router.stats().await.unwrap();
    assert_eq!(stats.stale_replies, 1);
    router.shutdown().await.unwrap();
}

#[tokio::test]
async fn test_stale_reply_dropped_when_configured() {
    let (mut router, open) = replace_during_export(StaleExportPolicy::Drop).await;

    open.send(true).unwrap();
    let stats = settle(&router, |stats| stats.exports_completed >= 1).await;
    assert_eq!(stats.stale_replies, 1);

    assert!(drain_messages(&mut router, Duration::from_millis(100)).await.is_empty());
    router.shutdown().await.unwrap();
}

#[tokio::test]
async fn test_other_messages_flow_while_export_pending() {
    let (mut router, open) = replace_during_export(StaleExportPolicy::Reply).await;

    router
        .send_envelope(Envelope::new("selected", json!({ "state": true })))
        .await
        .unwrap();
    settle_inbound(&router, 4).await;
    assert!(router.view().await.unwrap().analysis_selected);
    assert_eq!(router.stats().await.unwrap().exports_completed, 0);

    open.send(true).unwrap();
    assert!(matches!(
        next_message(&mut router).await,
        Outbound::GetContent { .. }
    ));
    router.shutdown().await.unwrap();
}

#[tokio::test]
async fn test_shutdown_waits_for_pending_export() {
    let (mut router, open) = replace_during_export(StaleExportPolicy::Reply).await;
    let mut outbound = router.take_outbound_receiver().unwrap();

    let opener = tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(20)).await;
        open.send(true).unwrap();
    });
    router.shutdown().await.unwrap();
    opener.await.unwrap();

    let mut replies = 0;
    while let Some(message) = outbound.recv().await {
        if matches!(message, Outbound::GetContent { .. }) {
            replies += 1;
        }
    }
    assert_eq!(replies, 1);
}
