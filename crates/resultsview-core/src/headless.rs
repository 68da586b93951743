//! Headless panel implementation
//!
//! Lays the results tree out as a simple vertical stack without any widget
//! toolkit, so the router can be driven end to end from a terminal or a
//! test. Node handles are never reused across renders, which makes stale
//! handles observable: exporting one yields nothing.

use std::sync::{Arc, Mutex, RwLock};

use async_trait::async_trait;
use serde_json::{json, Map, Value};
use tracing::{debug, warn};

use crate::address::{encode_name, Address};
use crate::channel::{MenuEntry, PanelEvent, PanelEventSender};
use crate::config::HeadlessConfig;
use crate::definition::ResultsDefinition;
use crate::errors::ExportError;
use crate::export::ContentKind;
use crate::panel::{
    resolve_address, AnnotationId, Exporter, HitTarget, NodeClass, NodeId, Rect, ReferenceTable,
    ResultsPanel, Size,
};
use crate::view::ViewState;

// ----------------------------------------------------------------------------
// Layout Tree
// ----------------------------------------------------------------------------

#[derive(Debug, Clone)]
struct HeadlessNode {
    id: NodeId,
    parent: Option<NodeId>,
    address: Address,
    encoded_name: String,
    title: String,
    class: NodeClass,
    rect: Rect,
    text: Option<String>,
    image_path: Option<String>,
    children: Vec<NodeId>,
}

impl HeadlessNode {
    fn menu_entry(&self) -> MenuEntry {
        let kind = match self.class {
            NodeClass::Image => "Image",
            NodeClass::Syntax => "Syntax",
            NodeClass::Standard if !self.children.is_empty() => "Group",
            NodeClass::Standard => "Item",
        };
        let mut extra = Map::new();
        extra.insert("title".to_string(), Value::String(self.title.clone()));
        MenuEntry {
            address: self.address.clone(),
            kind: kind.to_string(),
            extra,
        }
    }
}

/// Nodes of the current render in depth-first order, root first
#[derive(Debug, Default)]
struct HeadlessTree {
    nodes: Vec<HeadlessNode>,
}

impl HeadlessTree {
    fn get(&self, id: NodeId) -> Option<&HeadlessNode> {
        let first = self.nodes.first()?.id.0;
        let index = id.0.checked_sub(first)? as usize;
        self.nodes.get(index).filter(|node| node.id == id)
    }

    fn lines(&self, id: NodeId, out: &mut Vec<String>) {
        let Some(node) = self.get(id) else {
            return;
        };
        if !node.title.is_empty() {
            out.push(node.title.clone());
        }
        if let Some(text) = &node.text {
            out.extend(text.lines().map(str::to_string));
        }
        for child in &node.children {
            self.lines(*child, out);
        }
    }

    /// Menu entries from the root down to `id`
    fn menu_path(&self, id: NodeId) -> Vec<MenuEntry> {
        let mut entries = Vec::new();
        let mut current = self.get(id);
        while let Some(node) = current {
            entries.push(node.menu_entry());
            current = node.parent.and_then(|parent| self.get(parent));
        }
        entries.reverse();
        entries
    }
}

struct LayoutBuilder<'a> {
    config: &'a HeadlessConfig,
    next_id: u64,
    nodes: Vec<HeadlessNode>,
}

impl LayoutBuilder<'_> {
    /// Lay out `element` under `parent` at (`x`, `y`); returns its height
    fn place(
        &mut self,
        element: &Value,
        parent: Option<(NodeId, &Address)>,
        x: f64,
        y: f64,
        width: f64,
    ) -> f64 {
        let id = NodeId(self.next_id);
        self.next_id += 1;
        let index = self.nodes.len();

        let name = element.get("name").and_then(Value::as_str).unwrap_or_default();
        let title = element.get("title").and_then(Value::as_str).unwrap_or_default();
        let class = if element.get("image").is_some() {
            NodeClass::Image
        } else if element.get("syntax").is_some() {
            NodeClass::Syntax
        } else {
            NodeClass::Standard
        };
        let text = ["preformatted", "syntax"]
            .iter()
            .find_map(|key| element.get(*key).and_then(Value::as_str))
            .map(str::to_string);
        let image = element.get("image");
        let image_path = image
            .and_then(|image| image.get("path"))
            .and_then(Value::as_str)
            .map(str::to_string);
        // The root answers to the empty address whatever its name
        let address = match parent {
            Some((_, parent_address)) => {
                let mut address = parent_address.clone();
                address.push(name);
                address
            }
            None => Address::root(),
        };

        self.nodes.push(HeadlessNode {
            id,
            parent: parent.map(|(parent, _)| parent),
            address: address.clone(),
            encoded_name: encode_name(name),
            title: title.to_string(),
            class,
            rect: Rect::default(),
            text: text.clone(),
            image_path,
            children: Vec::new(),
        });

        let header = if title.is_empty() { 0.0 } else { self.config.header_height };
        let elements = ["group", "array"]
            .iter()
            .find_map(|key| element.get(*key)?.get("elements")?.as_array());

        let body = match elements {
            Some(elements) => {
                let mut cursor = y + header;
                let indent = self.config.indent;
                for child in elements {
                    let child_id = NodeId(self.next_id);
                    cursor += self.place(
                        child,
                        Some((id, &address)),
                        x + indent,
                        cursor,
                        (width - indent).max(0.0),
                    );
                    self.nodes[index].children.push(child_id);
                }
                cursor - (y + header)
            }
            None => match image.and_then(|image| image.get("height")).and_then(Value::as_f64) {
                Some(height) => height,
                None => {
                    let lines = text.as_deref().map_or(1, |text| text.lines().count().max(1));
                    self.config.row_height * lines as f64
                }
            },
        };

        let height = header + body;
        self.nodes[index].rect = Rect::new(x, y, width, height);
        height
    }
}

// ----------------------------------------------------------------------------
// Headless Panel
// ----------------------------------------------------------------------------

/// Annotation and menu activity recorded by the headless panel
#[derive(Debug, Clone, Default)]
pub struct PanelActivity {
    pub focused_notes: Vec<(AnnotationId, String)>,
    pub toolbar_actions: Vec<(AnnotationId, Value)>,
    pub context_menus: Vec<(NodeId, f64, f64)>,
    pub detached: usize,
}

/// Toolkit-free results panel
///
/// Once attached to a router it raises the panel events a rendered page
/// would: a menu request when a context menu opens, and the editing and
/// lost-focus pair around annotation input focus.
pub struct HeadlessPanel {
    config: HeadlessConfig,
    tree: Arc<RwLock<HeadlessTree>>,
    references: Arc<Mutex<Option<(Value, Value)>>>,
    events: Option<PanelEventSender>,
    next_id: u64,
    had_focus: Option<AnnotationId>,
    editing: Option<AnnotationId>,
    rendered: Option<ResultsDefinition>,
    view: Option<ViewState>,
    activity: PanelActivity,
}

impl HeadlessPanel {
    pub fn new(config: HeadlessConfig) -> Self {
        let mut panel = Self {
            config,
            tree: Arc::new(RwLock::new(HeadlessTree::default())),
            references: Arc::new(Mutex::new(None)),
            events: None,
            next_id: 0,
            had_focus: None,
            editing: None,
            rendered: None,
            view: None,
            activity: PanelActivity::default(),
        };
        panel.render(&ResultsDefinition::default());
        panel.rendered = None;
        panel
    }

    /// Exporter reading from this panel's current render
    pub fn exporter(&self) -> HeadlessExporter {
        HeadlessExporter {
            tree: Arc::clone(&self.tree),
        }
    }

    /// Definition of the last render
    pub fn rendered(&self) -> Option<&ResultsDefinition> {
        self.rendered.as_ref()
    }

    /// Last projected view state
    pub fn view(&self) -> Option<&ViewState> {
        self.view.as_ref()
    }

    pub fn activity(&self) -> &PanelActivity {
        &self.activity
    }

    /// Arguments of the last reference table setup
    pub fn references(&self) -> Option<(Value, Value)> {
        self.references.lock().ok().and_then(|refs| refs.clone())
    }

    /// Address-resolved handle, for driving the panel from outside
    pub fn node_at(&self, address: &Address) -> Option<NodeId> {
        resolve_address(self, address).ok()
    }

    /// Annotation control currently holding input focus
    pub fn editing(&self) -> Option<AnnotationId> {
        self.editing
    }

    /// Take input focus away from the annotation being edited
    pub fn blur_annotation(&mut self) {
        if let Some(annotation) = self.editing.take() {
            let data = self.annotation_payload(annotation);
            self.emit(PanelEvent::AnnotationLostFocus { data });
        }
    }

    fn annotation_payload(&self, annotation: AnnotationId) -> Value {
        let address = self
            .with_tree(|tree| tree.get(NodeId(annotation.0)).map(|node| node.address.clone()))
            .flatten();
        json!({ "address": address })
    }

    fn emit(&self, event: PanelEvent) {
        let Some(events) = &self.events else {
            return;
        };
        if let Err(err) = events.try_send(event) {
            warn!("Headless panel event dropped: {}", err);
        }
    }

    fn with_tree<T>(&self, f: impl FnOnce(&HeadlessTree) -> T) -> Option<T> {
        self.tree.read().ok().map(|tree| f(&tree))
    }
}

impl Default for HeadlessPanel {
    fn default() -> Self {
        Self::new(HeadlessConfig::default())
    }
}

impl ResultsPanel for HeadlessPanel {
    fn attach_events(&mut self, events: PanelEventSender) {
        self.events = Some(events);
    }

    fn detach_annotations(&mut self) {
        self.blur_annotation();
        self.had_focus = None;
        self.activity.detached += 1;
    }

    fn render(&mut self, definition: &ResultsDefinition) {
        let mut builder = LayoutBuilder {
            config: &self.config,
            next_id: self.next_id,
            nodes: Vec::new(),
        };
        builder.place(&definition.results, None, 0.0, 0.0, self.config.width);
        self.next_id = builder.next_id;
        let nodes = builder.nodes;
        debug!("Headless render laid out {} nodes", nodes.len());

        if let Ok(mut tree) = self.tree.write() {
            tree.nodes = nodes;
        }
        self.rendered = Some(definition.clone());
    }

    fn create_reference_table(&mut self) -> Box<dyn ReferenceTable> {
        Box::new(HeadlessReferenceTable {
            shared: Arc::clone(&self.references),
        })
    }

    fn root(&self) -> NodeId {
        self.with_tree(|tree| tree.nodes.first().map(|node| node.id))
            .flatten()
            .unwrap_or(NodeId(0))
    }

    fn child(&self, parent: NodeId, encoded_name: &str) -> Option<NodeId> {
        self.with_tree(|tree| {
            tree.get(parent)?.children.iter().copied().find(|child| {
                tree.get(*child)
                    .is_some_and(|node| node.encoded_name == encoded_name)
            })
        })
        .flatten()
    }

    fn classify(&self, node: NodeId) -> NodeClass {
        self.with_tree(|tree| tree.get(node).map(|node| node.class))
            .flatten()
            .unwrap_or_default()
    }

    fn bounds(&self, node: NodeId) -> Option<Rect> {
        self.with_tree(|tree| tree.get(node).map(|node| node.rect)).flatten()
    }

    fn hit_test(&self, x: f64, y: f64) -> HitTarget {
        self.with_tree(|tree| {
            tree.nodes
                .iter()
                .filter(|node| node.rect.contains(x, y))
                .last()
                .map(|node| node.id)
        })
        .flatten()
        .map_or(HitTarget::Background, HitTarget::Node)
    }

    fn open_context_menu(&mut self, node: NodeId, x: f64, y: f64) {
        self.activity.context_menus.push((node, x, y));
        let entries = self.with_tree(|tree| tree.menu_path(node)).unwrap_or_default();
        if !entries.is_empty() {
            self.emit(PanelEvent::MenuRequest { entries });
        }
    }

    fn annotation_control(&self, address: &Address) -> Option<AnnotationId> {
        self.node_at(address).map(|node| AnnotationId(node.0))
    }

    fn focus_annotation(&mut self, annotation: AnnotationId, text: &str) {
        if self.editing != Some(annotation) {
            self.blur_annotation();
            self.editing = Some(annotation);
            let data = self.annotation_payload(annotation);
            self.emit(PanelEvent::AnnotationEditing { data });
        }
        self.had_focus = Some(annotation);
        self.activity.focused_notes.push((annotation, text.to_string()));
    }

    fn had_focus_annotation(&self) -> Option<AnnotationId> {
        self.had_focus
    }

    fn toolbar_action(&mut self, annotation: AnnotationId, action: &Value) {
        self.activity.toolbar_actions.push((annotation, action.clone()));
    }

    fn content_size(&self) -> Size {
        let root = self.root();
        self.bounds(root)
            .map(|rect| Size { width: rect.width, height: rect.height })
            .unwrap_or_default()
    }

    fn apply(&mut self, view: &ViewState) {
        self.view = Some(view.clone());
    }
}

// ----------------------------------------------------------------------------
// Reference Table
// ----------------------------------------------------------------------------

/// Records the last setup so the panel can report it
pub struct HeadlessReferenceTable {
    shared: Arc<Mutex<Option<(Value, Value)>>>,
}

impl ReferenceTable for HeadlessReferenceTable {
    fn setup(&mut self, refs: &Value, refs_mode: &Value) {
        if let Ok(mut shared) = self.shared.lock() {
            *shared = Some((refs.clone(), refs_mode.clone()));
        }
    }
}

// ----------------------------------------------------------------------------
// Exporter
// ----------------------------------------------------------------------------

/// Exports titles and text content of the current render
pub struct HeadlessExporter {
    tree: Arc<RwLock<HeadlessTree>>,
}

#[async_trait]
impl Exporter for HeadlessExporter {
    async fn export(
        &self,
        node: NodeId,
        kind: ContentKind,
        _options: &Value,
    ) -> Result<Option<String>, ExportError> {
        let tree = self.tree.read().map_err(|_| ExportError::Failed {
            kind,
            reason: "layout lock poisoned".to_string(),
        })?;
        let Some(target) = tree.get(node) else {
            return Ok(None);
        };

        let content = match kind {
            ContentKind::Image => target.image_path.clone(),
            ContentKind::Text => {
                let mut lines = Vec::new();
                tree.lines(node, &mut lines);
                Some(lines.join("\n"))
            }
            ContentKind::Html => {
                let mut lines = Vec::new();
                tree.lines(node, &mut lines);
                let body: String = lines
                    .iter()
                    .map(|line| format!("<p>{}</p>", escape_html(line)))
                    .collect();
                Some(format!("<div>{}</div>", body))
            }
        };
        Ok(content)
    }
}

fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            _ => out.push(c),
        }
    }
    out
}
