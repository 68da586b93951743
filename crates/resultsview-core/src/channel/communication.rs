//! Host/Panel Communication Protocol Types
//!
//! Every message crossing the host/panel boundary is an envelope
//! `{ "type": ..., "data": ... }`. Inbound envelopes are decoded in two
//! stages: the raw envelope first, then the payload of a known type into its
//! typed variant. Unknown types are not errors; they decode to nothing.

use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};

use crate::address::Address;
use crate::definition::ResultsDefinition;
use crate::errors::EnvelopeError;
use crate::export::ExportedContent;
use crate::panel::Size;

// ----------------------------------------------------------------------------
// Raw Envelope
// ----------------------------------------------------------------------------

/// Untyped envelope as it appears on the wire
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Envelope {
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default)]
    pub data: Value,
    /// Fields next to `type` and `data`; hosts put click coordinates here
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Envelope {
    pub fn new<K: Into<String>>(kind: K, data: Value) -> Self {
        Self {
            kind: kind.into(),
            data,
            extra: Map::new(),
        }
    }

    /// Payload to decode: top-level coordinates win for `click`
    fn into_payload(self) -> (String, Value) {
        let Envelope { kind, data, extra } = self;
        if kind == "click" && extra.contains_key("pageX") {
            return (kind, Value::Object(extra));
        }
        (kind, data)
    }
}

// ----------------------------------------------------------------------------
// Inbound: Host → Router
// ----------------------------------------------------------------------------

/// Messages sent by the host to the panel
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "data")]
pub enum Inbound {
    /// Replace the render state and re-render
    #[serde(rename = "results")]
    Results(ResultsDefinition),
    /// New reference entries for the reference table
    #[serde(rename = "reftablechanged")]
    RefTableChanged {
        #[serde(default)]
        refs: Value,
        #[serde(rename = "refsMode", default)]
        refs_mode: Value,
    },
    /// Whether the analysis shown is selected in the host (tri-state)
    #[serde(rename = "selected")]
    Selected { state: Option<bool> },
    /// Host-side right click forwarded into the panel
    #[serde(rename = "click")]
    Click {
        #[serde(rename = "pageX")]
        page_x: f64,
        #[serde(rename = "pageY")]
        page_y: f64,
    },
    /// Start a note on the annotation control at an address
    #[serde(rename = "addNote")]
    AddNote {
        address: Address,
        #[serde(default)]
        options: NoteOptions,
    },
    /// Export the node at an address
    #[serde(rename = "getcontent")]
    GetContent {
        address: Address,
        #[serde(default)]
        options: Value,
    },
    #[serde(rename = "menuEvent")]
    MenuEvent(MenuEvent),
    #[serde(rename = "annotationEvent")]
    AnnotationEvent(AnnotationEvent),
}

impl Inbound {
    /// Envelope types the panel understands
    pub const TYPES: &'static [&'static str] = &[
        "results",
        "reftablechanged",
        "selected",
        "click",
        "addNote",
        "getcontent",
        "menuEvent",
        "annotationEvent",
    ];

    /// Decode a raw envelope; unknown types yield `None`
    pub fn decode(envelope: Envelope) -> Result<Option<Self>, EnvelopeError> {
        if !Self::TYPES.contains(&envelope.kind.as_str()) {
            return Ok(None);
        }
        let (kind, data) = envelope.into_payload();
        let tagged = json!({ "type": kind, "data": data });
        serde_json::from_value(tagged)
            .map(Some)
            .map_err(|source| EnvelopeError::MalformedPayload { kind, source })
    }

    /// Decode one JSON-encoded envelope
    pub fn parse(text: &str) -> Result<Option<Self>, EnvelopeError> {
        let envelope: Envelope = serde_json::from_str(text)?;
        Self::decode(envelope)
    }

    /// Wire type name, for logging
    pub fn kind(&self) -> &'static str {
        match self {
            Inbound::Results(_) => "results",
            Inbound::RefTableChanged { .. } => "reftablechanged",
            Inbound::Selected { .. } => "selected",
            Inbound::Click { .. } => "click",
            Inbound::AddNote { .. } => "addNote",
            Inbound::GetContent { .. } => "getcontent",
            Inbound::MenuEvent(_) => "menuEvent",
            Inbound::AnnotationEvent(_) => "annotationEvent",
        }
    }
}

/// Options of an `addNote` request
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NoteOptions {
    /// Text to seed the annotation with
    #[serde(default)]
    pub text: String,
}

/// Menu interaction reported by the host (or synthesised by the router)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MenuEvent {
    #[serde(rename = "type")]
    pub kind: MenuEventKind,
    /// `None` clears the selection and nothing else happens
    #[serde(default)]
    pub address: Option<Address>,
}

impl MenuEvent {
    pub fn activated(address: Address) -> Self {
        Self {
            kind: MenuEventKind::Activated,
            address: Some(address),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MenuEventKind {
    /// The entry was activated: highlight it
    Activated,
    Selected,
    #[serde(other)]
    Other,
}

/// Annotation toolbar/state changes reported by the host
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum AnnotationEvent {
    EditState { state: bool },
    EditFocused { state: bool },
    Action { action: Value },
    #[serde(other)]
    Other,
}

// ----------------------------------------------------------------------------
// Outbound: Router → Host
// ----------------------------------------------------------------------------

/// Messages sent by the panel to the host
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "data", rename_all = "camelCase")]
pub enum Outbound {
    /// Padded content size after a quiet period
    SizeChanged { width: f64, height: f64 },
    MouseEvent(MouseButtonEvent),
    OpenUrl { url: String },
    SetOption { name: String, value: Value },
    SetParam { address: Address, options: Value },
    /// Reply to `getcontent`, paired by address
    #[serde(rename = "getcontent")]
    GetContent {
        content: ExportedContent,
        address: Address,
    },
    AnnotationFocus(Value),
    AnnotationLostFocus(Value),
    AnnotationFormats(Value),
    AnnotationChanged(Value),
    /// Context menu request raised by a rendered node
    #[serde(rename = "menu")]
    MenuRequest { entries: Vec<MenuEntry> },
}

impl Outbound {
    /// Wire type name, for logging
    pub fn kind(&self) -> &'static str {
        match self {
            Outbound::SizeChanged { .. } => "sizeChanged",
            Outbound::MouseEvent(_) => "mouseEvent",
            Outbound::OpenUrl { .. } => "openUrl",
            Outbound::SetOption { .. } => "setOption",
            Outbound::SetParam { .. } => "setParam",
            Outbound::GetContent { .. } => "getcontent",
            Outbound::AnnotationFocus(_) => "annotationFocus",
            Outbound::AnnotationLostFocus(_) => "annotationLostFocus",
            Outbound::AnnotationFormats(_) => "annotationFormats",
            Outbound::AnnotationChanged(_) => "annotationChanged",
            Outbound::MenuRequest { .. } => "menu",
        }
    }

    /// Encode as one line of JSON
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }
}

/// Mouse button activity inside the panel
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MouseButtonEvent {
    pub event_name: MouseEventKind,
    /// Button id
    pub which: u16,
    pub page_x: f64,
    pub page_y: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MouseEventKind {
    MouseDown,
    MouseMove,
    MouseUp,
}

/// One entry of a context menu request
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MenuEntry {
    pub address: Address,
    /// Entry category shown by the host
    #[serde(rename = "type", default)]
    pub kind: String,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

// ----------------------------------------------------------------------------
// PanelEvent: Panel → Router
// ----------------------------------------------------------------------------

/// Events raised inside the panel by rendered nodes and the page
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum PanelEvent {
    /// The results content box changed size
    ContentResized { size: Size },
    /// An annotation region started editing
    AnnotationEditing { data: Value },
    /// An annotation region stopped editing
    AnnotationLostFocus { data: Value },
    AnnotationFormats { data: Value },
    AnnotationChanged { data: Value },
    /// A node asked for a context menu
    MenuRequest { entries: Vec<MenuEntry> },
    Mouse(MouseButtonEvent),
    /// Context menu gesture on the page body
    BodyContextMenu { page_x: f64, page_y: f64 },
    SetOption { name: String, value: Value },
    SetParam { address: Address, options: Value },
    OpenUrl { url: String },
}
