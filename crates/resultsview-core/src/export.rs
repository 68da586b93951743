//! Content export pipeline
//!
//! Extracts up to three representations of one addressed node: plain text,
//! an image and rich markup. Which ones are requested depends on the node's
//! classification and the panel mode; an image node yields only its image
//! whatever the mode. Representations are produced one after another, never
//! concurrently for the same request, and an empty one is left out of the
//! reply altogether.

use core::fmt;
use std::sync::Arc;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::address::Address;
use crate::errors::ExportError;
use crate::panel::{Exporter, NodeClass, NodeId};

// ----------------------------------------------------------------------------
// Representations
// ----------------------------------------------------------------------------

/// One content representation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ContentKind {
    Text,
    Image,
    Html,
}

impl ContentKind {
    /// MIME type requested from the export collaborator
    pub fn mime_type(&self) -> &'static str {
        match self {
            ContentKind::Text => "text/plain",
            ContentKind::Image => "image/png",
            ContentKind::Html => "text/html",
        }
    }
}

impl fmt::Display for ContentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.mime_type())
    }
}

/// Which representations to produce
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExportPlan {
    pub text: bool,
    pub image: bool,
    pub html: bool,
}

impl ExportPlan {
    /// Plan for a node of the given class in a rich or plain panel
    pub fn for_node(class: NodeClass, rich: bool) -> Self {
        let mut plan = Self {
            text: true,
            image: false,
            html: rich,
        };
        match class {
            NodeClass::Standard => {}
            NodeClass::Syntax => plan.html = false,
            NodeClass::Image => {
                plan.text = false;
                plan.image = true;
                plan.html = false;
            }
        }
        plan
    }

    /// Requested kinds in production order
    pub fn steps(&self) -> impl Iterator<Item = ContentKind> {
        [
            (self.text, ContentKind::Text),
            (self.image, ContentKind::Image),
            (self.html, ContentKind::Html),
        ]
        .into_iter()
        .filter_map(|(wanted, kind)| wanted.then_some(kind))
    }
}

/// Representations produced for one node; absent keys were not produced
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExportedContent {
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub text: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub image: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub html: Option<String>,
}

impl ExportedContent {
    fn slot(&mut self, kind: ContentKind) -> &mut Option<String> {
        match kind {
            ContentKind::Text => &mut self.text,
            ContentKind::Image => &mut self.image,
            ContentKind::Html => &mut self.html,
        }
    }
}

// ----------------------------------------------------------------------------
// Pipeline
// ----------------------------------------------------------------------------

/// Produce every planned representation, in order, one at a time
pub async fn run_pipeline(
    exporter: &dyn Exporter,
    node: NodeId,
    plan: ExportPlan,
    options: &Value,
) -> Result<ExportedContent, ExportError> {
    let mut content = ExportedContent::default();
    for kind in plan.steps() {
        let produced = exporter.export(node, kind, options).await?;
        if let Some(value) = produced.filter(|value| !value.is_empty()) {
            *content.slot(kind) = Some(value);
        }
    }
    Ok(content)
}

/// A resolved `getcontent` request waiting to run
#[derive(Debug, Clone)]
pub struct ExportJob {
    pub address: Address,
    pub node: NodeId,
    pub plan: ExportPlan,
    pub options: Value,
    /// Results generation the node handle belongs to
    pub generation: u64,
}

/// A finished `getcontent` request
#[derive(Debug)]
pub struct ExportOutcome {
    pub address: Address,
    pub generation: u64,
    pub result: Result<ExportedContent, ExportError>,
}

impl ExportJob {
    pub async fn run(self, exporter: Arc<dyn Exporter>) -> ExportOutcome {
        let result = run_pipeline(exporter.as_ref(), self.node, self.plan, &self.options).await;
        ExportOutcome {
            address: self.address,
            generation: self.generation,
            result,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::sync::Mutex;

    /// Returns a fixed value per kind and records the call order
    struct ScriptedExporter {
        text: Option<String>,
        image: Option<String>,
        html: Option<String>,
        calls: Mutex<Vec<ContentKind>>,
    }

    impl ScriptedExporter {
        fn new(text: Option<&str>, image: Option<&str>, html: Option<&str>) -> Self {
            Self {
                text: text.map(str::to_string),
                image: image.map(str::to_string),
                html: html.map(str::to_string),
                calls: Mutex::new(Vec::new()),
            }
        }
    }

    #[async_trait]
    impl Exporter for ScriptedExporter {
        async fn export(
            &self,
            _node: NodeId,
            kind: ContentKind,
            _options: &Value,
        ) -> Result<Option<String>, ExportError> {
            self.calls.lock().unwrap().push(kind);
            tokio::task::yield_now().await;
            Ok(match kind {
                ContentKind::Text => self.text.clone(),
                ContentKind::Image => self.image.clone(),
                ContentKind::Html => self.html.clone(),
            })
        }
    }

    #[test]
    fn test_plan_standard_node() {
        assert_eq!(
            ExportPlan::for_node(NodeClass::Standard, true),
            ExportPlan { text: true, image: false, html: true }
        );
        assert_eq!(
            ExportPlan::for_node(NodeClass::Standard, false),
            ExportPlan { text: true, image: false, html: false }
        );
    }

    #[test]
    fn test_plan_syntax_node_never_html() {
        assert_eq!(
            ExportPlan::for_node(NodeClass::Syntax, true),
            ExportPlan { text: true, image: false, html: false }
        );
    }

    #[test]
    fn test_plan_image_node_only_image() {
        let plan = ExportPlan::for_node(NodeClass::Image, true);
        assert_eq!(plan.steps().collect::<Vec<_>>(), vec![ContentKind::Image]);
    }

    #[tokio::test]
    async fn test_pipeline_runs_in_order_and_omits_empty() {
        let exporter = ScriptedExporter::new(Some("text"), Some("ignored"), Some(""));
        let plan = ExportPlan { text: true, image: false, html: true };
        let content = run_pipeline(&exporter, NodeId(1), plan, &Value::Null).await.unwrap();

        assert_eq!(content.text.as_deref(), Some("text"));
        assert_eq!(content.image, None);
        assert_eq!(content.html, None);
        assert_eq!(
            *exporter.calls.lock().unwrap(),
            vec![ContentKind::Text, ContentKind::Html]
        );

        let json = serde_json::to_value(&content).unwrap();
        assert_eq!(json, serde_json::json!({ "text": "text" }));
    }

    #[tokio::test]
    async fn test_pipeline_stops_on_failure() {
        struct Failing;

        #[async_trait]
        impl Exporter for Failing {
            async fn export(
                &self,
                _node: NodeId,
                kind: ContentKind,
                _options: &Value,
            ) -> Result<Option<String>, ExportError> {
                Err(ExportError::Failed { kind, reason: "encoder crashed".into() })
            }
        }

        let plan = ExportPlan::for_node(NodeClass::Standard, true);
        let result = run_pipeline(&Failing, NodeId(1), plan, &Value::Null).await;
        assert!(matches!(result, Err(ExportError::Failed { kind: ContentKind::Text, .. })));
    }
}
