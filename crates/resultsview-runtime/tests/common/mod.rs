//! Shared fixtures for router integration tests

#![allow(dead_code)]

use std::sync::{Arc, Mutex};

use resultsview_core::channel::PanelEventSender;
use resultsview_core::headless::{HeadlessExporter, HeadlessPanel, PanelActivity};
use resultsview_core::{
    Address, AnnotationId, ChannelConfig, HitTarget, NodeClass, NodeId, Outbound, Rect,
    ReferenceTable, ResultsDefinition, ResultsPanel, RouterConfig, Size, ViewState,
};
use resultsview_runtime::{RouterBuilder, RouterHandle, RouterStats};
use serde_json::{json, Value};
use tokio::time::{sleep, timeout, Duration};

/// Headless panel the test can inspect while the router owns it
#[derive(Clone, Default)]
pub struct SharedPanel(pub Arc<Mutex<HeadlessPanel>>);

impl SharedPanel {
    pub fn exporter(&self) -> HeadlessExporter {
        self.0.lock().unwrap().exporter()
    }

    pub fn activity(&self) -> PanelActivity {
        self.0.lock().unwrap().activity().clone()
    }

    pub fn view(&self) -> Option<ViewState> {
        self.0.lock().unwrap().view().cloned()
    }

    pub fn rendered(&self) -> Option<ResultsDefinition> {
        self.0.lock().unwrap().rendered().cloned()
    }

    pub fn node_at(&self, segments: &[&str]) -> Option<NodeId> {
        self.0.lock().unwrap().node_at(&Address::from(segments))
    }

    pub fn references(&self) -> Option<(Value, Value)> {
        self.0.lock().unwrap().references()
    }
}

impl ResultsPanel for SharedPanel {
    fn attach_events(&mut self, events: PanelEventSender) {
        self.0.lock().unwrap().attach_events(events)
    }

    fn detach_annotations(&mut self) {
        self.0.lock().unwrap().detach_annotations()
    }

    fn render(&mut self, definition: &ResultsDefinition) {
        self.0.lock().unwrap().render(definition)
    }

    fn create_reference_table(&mut self) -> Box<dyn ReferenceTable> {
        self.0.lock().unwrap().create_reference_table()
    }

    fn root(&self) -> NodeId {
        self.0.lock().unwrap().root()
    }

    fn child(&self, parent: NodeId, encoded_name: &str) -> Option<NodeId> {
        self.0.lock().unwrap().child(parent, encoded_name)
    }

    fn classify(&self, node: NodeId) -> NodeClass {
        self.0.lock().unwrap().classify(node)
    }

    fn bounds(&self, node: NodeId) -> Option<Rect> {
        self.0.lock().unwrap().bounds(node)
    }

    fn hit_test(&self, x: f64, y: f64) -> HitTarget {
        self.0.lock().unwrap().hit_test(x, y)
    }

    fn open_context_menu(&mut self, node: NodeId, x: f64, y: f64) {
        self.0.lock().unwrap().open_context_menu(node, x, y)
    }

    fn annotation_control(&self, address: &Address) -> Option<AnnotationId> {
        self.0.lock().unwrap().annotation_control(address)
    }

    fn focus_annotation(&mut self, annotation: AnnotationId, text: &str) {
        self.0.lock().unwrap().focus_annotation(annotation, text)
    }

    fn had_focus_annotation(&self) -> Option<AnnotationId> {
        self.0.lock().unwrap().had_focus_annotation()
    }

    fn toolbar_action(&mut self, annotation: AnnotationId, action: &Value) {
        self.0.lock().unwrap().toolbar_action(annotation, action)
    }

    fn content_size(&self) -> Size {
        self.0.lock().unwrap().content_size()
    }

    fn apply(&mut self, view: &ViewState) {
        self.0.lock().unwrap().apply(view)
    }
}

/// A `results` payload with a table, an image and a syntax node
pub fn sample_results(mode: &str) -> Value {
    json!({
        "results": {
            "name": "",
            "title": "Descriptives",
            "group": { "elements": [
                { "name": "table", "title": "Summary", "preformatted": "n = 20\nmean = 3.4" },
                { "name": "plot", "title": "Histogram", "image": { "path": "plot.png", "height": 300 } },
                { "name": "syntax", "syntax": "descriptives(data)" },
            ]},
        },
        "options": { "results/table/digits": 3 },
        "mode": mode,
        "refs": ["R Core Team (2024)"],
        "refsMode": "bottom",
    })
}

pub async fn start_router(panel: &SharedPanel, config: RouterConfig) -> RouterHandle {
    let exporter = Arc::new(panel.exporter());
    start_router_with(panel, exporter, config).await
}

pub async fn start_router_with(
    panel: &SharedPanel,
    exporter: Arc<dyn resultsview_core::Exporter>,
    config: RouterConfig,
) -> RouterHandle {
    RouterBuilder::new(Box::new(panel.clone()), exporter)
        .with_config(config)
        .with_channel_config(ChannelConfig::testing())
        .build_and_start()
        .await
        .expect("Failed to start router")
}

/// Wait until the router has handled `count` inbound envelopes
pub async fn settle_inbound(router: &RouterHandle, count: u64) -> RouterStats {
    settle(router, |stats| stats.inbound_handled >= count).await
}

/// Wait until the router has handled `count` panel events
pub async fn settle_panel(router: &RouterHandle, count: u64) -> RouterStats {
    settle(router, |stats| stats.panel_events >= count).await
}

pub async fn settle(router: &RouterHandle, done: impl Fn(&RouterStats) -> bool) -> RouterStats {
    timeout(Duration::from_secs(2), async {
        loop {
            let stats = router.stats().await.expect("router stopped");
            if done(&stats) {
                return stats;
            }
            sleep(Duration::from_millis(2)).await;
        }
    })
    .await
    .expect("router did not settle")
}

/// Next outbound envelope other than a size report
pub async fn next_message(router: &mut RouterHandle) -> Outbound {
    timeout(Duration::from_secs(2), async {
        loop {
            match router.recv_outbound().await.expect("outbound closed") {
                Outbound::SizeChanged { .. } => continue,
                message => return message,
            }
        }
    })
    .await
    .expect("no outbound message")
}

/// Everything other than size reports posted within `window`
pub async fn drain_messages(router: &mut RouterHandle, window: Duration) -> Vec<Outbound> {
    let mut messages = Vec::new();
    while let Ok(Some(message)) = timeout(window, router.recv_outbound()).await {
        if !matches!(message, Outbound::SizeChanged { .. }) {
            messages.push(message);
        }
    }
    messages
}
