//! Collaborator interfaces for the rendered panel
//!
//! The router never touches rendered nodes directly. Everything it needs from
//! the renderer (tree lookup, geometry, hit testing, annotation controls, the
//! reference table and content export) goes through the traits here, so the
//! protocol layer stays independent of the widget toolkit.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::address::{encode_name, Address};
use crate::channel::PanelEventSender;
use crate::definition::ResultsDefinition;
use crate::errors::{ExportError, LookupError};
use crate::export::ContentKind;
use crate::view::ViewState;

// ----------------------------------------------------------------------------
// Handles and Geometry
// ----------------------------------------------------------------------------

/// Opaque handle to a rendered node
///
/// Handles are only meaningful for the render that produced them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct NodeId(pub u64);

/// Opaque handle to an annotation control
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct AnnotationId(pub u64);

/// Page-space box of a rendered node
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Rect {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl Rect {
    pub fn new(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self { x, y, width, height }
    }

    pub fn contains(&self, x: f64, y: f64) -> bool {
        x >= self.x && x < self.x + self.width && y >= self.y && y < self.y + self.height
    }
}

/// Content box size
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Size {
    pub width: f64,
    pub height: f64,
}

/// Static classification that decides which representations a node exports
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum NodeClass {
    #[default]
    Standard,
    /// Syntax display: never exported as markup
    Syntax,
    /// Image: exported only as an image
    Image,
}

/// Result of hit testing a page coordinate
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HitTarget {
    /// The point is outside every node
    Background,
    Node(NodeId),
}

// ----------------------------------------------------------------------------
// Collaborator Traits
// ----------------------------------------------------------------------------

/// The rendered results panel
pub trait ResultsPanel: Send {
    /// Hand the panel the sender for events it raises; called once before
    /// the router starts
    fn attach_events(&mut self, _events: PanelEventSender) {}

    /// Detach every annotation control of the current render
    fn detach_annotations(&mut self);

    /// Rebuild the rendered tree from a new definition
    fn render(&mut self, definition: &ResultsDefinition);

    /// A fresh reference table for the next render
    fn create_reference_table(&mut self) -> Box<dyn ReferenceTable>;

    /// The top-level results container
    fn root(&self) -> NodeId;

    /// Child of `parent` whose name attribute equals `encoded_name`
    fn child(&self, parent: NodeId, encoded_name: &str) -> Option<NodeId>;

    fn classify(&self, node: NodeId) -> NodeClass;

    /// Page-space box of a node, if it has one
    fn bounds(&self, node: NodeId) -> Option<Rect>;

    /// Topmost node under a page coordinate
    fn hit_test(&self, x: f64, y: f64) -> HitTarget;

    /// Raise a context menu on a node at a page coordinate
    fn open_context_menu(&mut self, node: NodeId, x: f64, y: f64);

    /// Annotation control belonging to the node at `address`
    fn annotation_control(&self, address: &Address) -> Option<AnnotationId>;

    /// Give an annotation control input focus, seeded with text
    fn focus_annotation(&mut self, annotation: AnnotationId, text: &str);

    /// The annotation control that most recently had focus
    fn had_focus_annotation(&self) -> Option<AnnotationId>;

    /// Apply a toolbar action to an annotation control
    fn toolbar_action(&mut self, annotation: AnnotationId, action: &Value);

    /// Current size of the results content box
    fn content_size(&self) -> Size;

    /// Project router state onto the rendered view
    fn apply(&mut self, view: &ViewState);
}

/// Reference table shown alongside the results
pub trait ReferenceTable: Send {
    fn setup(&mut self, refs: &Value, refs_mode: &Value);
}

/// Produces content representations of rendered nodes
#[async_trait]
pub trait Exporter: Send + Sync {
    /// Produce one representation of a node; `None` or empty means "nothing"
    async fn export(
        &self,
        node: NodeId,
        kind: ContentKind,
        options: &Value,
    ) -> Result<Option<String>, ExportError>;
}

// ----------------------------------------------------------------------------
// Tree Lookup
// ----------------------------------------------------------------------------

/// Resolve an address by repeated child-by-name lookup from the root
pub fn resolve_address<P: ResultsPanel + ?Sized>(
    panel: &P,
    address: &Address,
) -> Result<NodeId, LookupError> {
    let mut node = panel.root();
    for segment in address.iter() {
        node = panel
            .child(node, &encode_name(segment))
            .ok_or_else(|| LookupError::NotFound {
                address: address.flatten(),
                segment: segment.clone(),
            })?;
    }
    Ok(node)
}
