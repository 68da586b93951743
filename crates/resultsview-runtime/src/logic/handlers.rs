//! Router Inbound and Panel Event Handlers
//!
//! Every handler mutates router state, drives the panel, and returns the
//! envelopes to post to the host. Lookup failures come back as errors for
//! the task to log and drop; a focus underflow comes back as a fatal error.

use resultsview_core::{
    resolve_address, Address, AnnotationEvent, ExportPlan, FocusTransition, HitTarget, Inbound,
    LookupError, MenuEntry, MenuEvent, MenuEventKind, Outbound, PanelEvent,
    ResultsDefinition, ResultsPanel, ResultsViewResult,
};
use resultsview_core::channel::NoteOptions;
use resultsview_core::export::ExportJob;
use serde_json::Value;
use tokio::time::Instant;
use tracing::{debug, info, warn};

use super::state::RouterState;

/// Category stamped on the first entry of every forwarded menu request
const MENU_ROOT_CATEGORY: &str = "Analysis";

/// What an inbound envelope asks the task to do next
#[derive(Debug)]
pub enum Dispatch {
    /// Post these envelopes
    Post(Vec<Outbound>),
    /// Start an export; its reply is posted when it completes
    Export(ExportJob),
}

impl Dispatch {
    fn none() -> Self {
        Dispatch::Post(Vec::new())
    }
}

// ----------------------------------------------------------------------------
// Inbound Handlers
// ----------------------------------------------------------------------------

/// Handlers for host → panel envelopes
pub struct InboundHandlers;

impl InboundHandlers {
    /// Dispatch one inbound envelope
    pub fn handle(
        state: &mut RouterState,
        panel: &mut dyn ResultsPanel,
        inbound: Inbound,
    ) -> ResultsViewResult<Dispatch> {
        match inbound {
            Inbound::Results(definition) => Self::handle_results(state, panel, definition),
            Inbound::RefTableChanged { refs, refs_mode } => {
                Self::handle_ref_table_changed(state, &refs, &refs_mode)
            }
            Inbound::Selected { state: selected } => Self::handle_selected(state, panel, selected),
            Inbound::Click { page_x, page_y } => Self::handle_click(state, panel, page_x, page_y),
            Inbound::AddNote { address, options } => {
                Self::handle_add_note(state, panel, &address, &options)
            }
            Inbound::GetContent { address, options } => {
                Self::handle_get_content(state, panel, address, options).map(Dispatch::Export)
            }
            Inbound::MenuEvent(event) => {
                Self::handle_menu_event(state, panel, &event)?;
                Ok(Dispatch::none())
            }
            Inbound::AnnotationEvent(event) => Self::handle_annotation_event(state, panel, event),
        }
    }

    /// Replace the render state and re-render from scratch
    pub fn handle_results(
        state: &mut RouterState,
        panel: &mut dyn ResultsPanel,
        mut definition: ResultsDefinition,
    ) -> ResultsViewResult<Dispatch> {
        // An empty root must still render its placeholder
        definition.force_root_visible();

        state.generation += 1;
        info!(
            "Rendering results generation {} (mode '{}')",
            state.generation, definition.mode
        );

        panel.detach_annotations();
        state.selection.deactivate();

        let mut reference_table = panel.create_reference_table();
        reference_table.setup(&definition.refs, &definition.refs_mode);

        panel.render(&definition);
        state.reference_table = Some(reference_table);
        state.definition = Some(definition);

        panel.apply(&state.view());
        state.resize.observe(panel.content_size(), Instant::now());

        Ok(Dispatch::none())
    }

    pub fn handle_ref_table_changed(
        state: &mut RouterState,
        refs: &Value,
        refs_mode: &Value,
    ) -> ResultsViewResult<Dispatch> {
        match state.reference_table.as_mut() {
            Some(table) => table.setup(refs, refs_mode),
            None => debug!("Reference table changed before any results; ignoring"),
        }
        Ok(Dispatch::none())
    }

    pub fn handle_selected(
        state: &mut RouterState,
        panel: &mut dyn ResultsPanel,
        selected: Option<bool>,
    ) -> ResultsViewResult<Dispatch> {
        state.annotations.analysis_selected = selected;
        if state.is_rendered() {
            panel.apply(&state.view());
        }
        Ok(Dispatch::none())
    }

    /// Raise a context menu at a host-supplied page coordinate
    pub fn handle_click(
        state: &mut RouterState,
        panel: &mut dyn ResultsPanel,
        page_x: f64,
        page_y: f64,
    ) -> ResultsViewResult<Dispatch> {
        if !state.is_rendered() {
            return Err(LookupError::NothingRendered.into());
        }
        let node = match panel.hit_test(page_x, page_y) {
            HitTarget::Node(node) => node,
            HitTarget::Background => panel.root(),
        };
        panel.open_context_menu(node, page_x, page_y);
        Ok(Dispatch::none())
    }

    pub fn handle_add_note(
        _state: &mut RouterState,
        panel: &mut dyn ResultsPanel,
        address: &Address,
        options: &NoteOptions,
    ) -> ResultsViewResult<Dispatch> {
        match panel.annotation_control(address) {
            Some(annotation) => panel.focus_annotation(annotation, &options.text),
            None => debug!("No annotation control at '{}'", address),
        }
        Ok(Dispatch::none())
    }

    /// Resolve the node and plan its export
    pub fn handle_get_content(
        state: &mut RouterState,
        panel: &mut dyn ResultsPanel,
        address: Address,
        options: Value,
    ) -> ResultsViewResult<ExportJob> {
        let rich = match &state.definition {
            Some(definition) => definition.is_rich(),
            None => return Err(LookupError::NothingRendered.into()),
        };
        let node = resolve_address(&*panel, &address)?;
        let plan = ExportPlan::for_node(panel.classify(node), rich);

        Ok(ExportJob {
            address,
            node,
            plan,
            options,
            generation: state.generation,
        })
    }

    /// Move the selection in response to a menu interaction
    ///
    /// The previous selection is always cleared first. A null address stops
    /// there; an empty address selects the whole results root.
    pub fn handle_menu_event(
        state: &mut RouterState,
        panel: &mut dyn ResultsPanel,
        event: &MenuEvent,
    ) -> ResultsViewResult<()> {
        if state.selection.deactivate() {
            panel.apply(&state.view());
        }

        let Some(address) = &event.address else {
            return Ok(());
        };
        if !state.is_rendered() {
            return Err(LookupError::NothingRendered.into());
        }

        let root = panel.root();
        let node = if address.is_root() {
            root
        } else {
            resolve_address(&*panel, address)?
        };
        state.selection.select(node);

        if event.kind == MenuEventKind::Activated {
            state.selection.activate(node, panel.bounds(node), node == root);
            panel.apply(&state.view());
        }
        Ok(())
    }

    pub fn handle_annotation_event(
        state: &mut RouterState,
        panel: &mut dyn ResultsPanel,
        event: AnnotationEvent,
    ) -> ResultsViewResult<Dispatch> {
        match event {
            AnnotationEvent::EditState { state: editing } => {
                state.annotations.editing = editing;
            }
            AnnotationEvent::EditFocused { state: focused } => {
                state.annotations.focused = focused;
            }
            AnnotationEvent::Action { action } => {
                match panel.had_focus_annotation() {
                    Some(annotation) => panel.toolbar_action(annotation, &action),
                    None => debug!("Toolbar action with no focused annotation; ignoring"),
                }
                return Ok(Dispatch::none());
            }
            AnnotationEvent::Other => return Ok(Dispatch::none()),
        }

        if state.is_rendered() {
            panel.apply(&state.view());
        }
        Ok(Dispatch::none())
    }
}

// ----------------------------------------------------------------------------
// Panel Event Handlers
// ----------------------------------------------------------------------------

/// Handlers for events raised inside the panel
pub struct PanelHandlers;

impl PanelHandlers {
    /// Dispatch one panel event
    pub fn handle(
        state: &mut RouterState,
        panel: &mut dyn ResultsPanel,
        event: PanelEvent,
    ) -> ResultsViewResult<Vec<Outbound>> {
        match event {
            PanelEvent::ContentResized { size } => {
                state.resize.observe(size, Instant::now());
                Ok(Vec::new())
            }
            PanelEvent::AnnotationEditing { data } => {
                Ok(match state.focus.enter() {
                    Some(FocusTransition::Gained) => vec![Outbound::AnnotationFocus(data)],
                    _ => Vec::new(),
                })
            }
            PanelEvent::AnnotationLostFocus { data } => {
                Ok(match state.focus.leave()? {
                    Some(FocusTransition::Lost) => vec![Outbound::AnnotationLostFocus(data)],
                    _ => Vec::new(),
                })
            }
            PanelEvent::AnnotationFormats { data } => Ok(vec![Outbound::AnnotationFormats(data)]),
            PanelEvent::AnnotationChanged { data } => Ok(vec![Outbound::AnnotationChanged(data)]),
            PanelEvent::MenuRequest { entries } => Ok(Self::handle_menu_request(state, panel, entries)),
            PanelEvent::Mouse(event) => {
                if state.host_attached {
                    Ok(vec![Outbound::MouseEvent(event)])
                } else {
                    Ok(Vec::new())
                }
            }
            PanelEvent::BodyContextMenu { page_x, page_y } => {
                if state.is_rendered() {
                    let root = panel.root();
                    panel.open_context_menu(root, page_x, page_y);
                }
                Ok(Vec::new())
            }
            PanelEvent::SetOption { name, value } => Ok(vec![Outbound::SetOption { name, value }]),
            PanelEvent::SetParam { address, options } => {
                Ok(vec![Outbound::SetParam { address, options }])
            }
            PanelEvent::OpenUrl { url } => Ok(vec![Outbound::OpenUrl { url }]),
        }
    }

    /// Forward a node's menu request and select its deepest entry
    pub fn handle_menu_request(
        state: &mut RouterState,
        panel: &mut dyn ResultsPanel,
        mut entries: Vec<MenuEntry>,
    ) -> Vec<Outbound> {
        let Some(last) = entries.last().map(|entry| entry.address.clone()) else {
            return vec![Outbound::MenuRequest { entries }];
        };
        if let Some(first) = entries.first_mut() {
            first.kind = MENU_ROOT_CATEGORY.to_string();
        }

        let forwarded = vec![Outbound::MenuRequest { entries }];

        let activation = MenuEvent::activated(last);
        if let Err(e) = InboundHandlers::handle_menu_event(state, panel, &activation) {
            warn!("Could not select menu entry after request: {}", e);
        }

        forwarded
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use resultsview_core::headless::HeadlessPanel;
    use resultsview_core::{
        FocusError, MouseButtonEvent, MouseEventKind, ResultsViewError, RouterConfig,
    };
    use serde_json::json;

    fn rendered() -> (RouterState, HeadlessPanel) {
        let mut state = RouterState::new(RouterConfig::default());
        let mut panel = HeadlessPanel::default();
        let definition: ResultsDefinition = serde_json::from_value(json!({
            "results": { "name": "", "group": { "elements": [
                { "name": "table", "title": "Summary", "preformatted": "n = 20" },
            ]}},
            "mode": "rich",
        }))
        .unwrap();
        InboundHandlers::handle_results(&mut state, &mut panel, definition).unwrap();
        (state, panel)
    }

    #[tokio::test]
    async fn test_results_reset_render_state_but_keep_focus() {
        let (mut state, mut panel) = rendered();
        state.focus.enter();
        let table = panel.node_at(&Address::from(&["table"][..])).unwrap();
        state.selection.activate(table, panel.bounds(table), false);

        let definition = state.definition.clone().unwrap();
        InboundHandlers::handle_results(&mut state, &mut panel, definition).unwrap();

        assert_eq!(state.generation, 2);
        assert_eq!(state.focus.count(), 1);
        assert_eq!(state.selection.active(), None);
        assert!(state.resize.deadline().is_some());
        assert_eq!(panel.activity().detached, 2);
    }

    #[test]
    fn test_click_before_results_is_lookup_error() {
        let mut state = RouterState::new(RouterConfig::default());
        let mut panel = HeadlessPanel::default();
        let result = InboundHandlers::handle_click(&mut state, &mut panel, 1.0, 1.0);
        assert!(matches!(
            result,
            Err(ResultsViewError::Lookup(LookupError::NothingRendered))
        ));
        assert!(panel.activity().context_menus.is_empty());
    }

    #[tokio::test]
    async fn test_menu_event_unknown_address_clears_selection() {
        let (mut state, mut panel) = rendered();
        let root = panel.root();
        state.selection.activate(root, panel.bounds(root), true);

        let event = MenuEvent::activated(Address::from(&["nope"][..]));
        let result = InboundHandlers::handle_menu_event(&mut state, &mut panel, &event);
        assert!(matches!(
            result,
            Err(ResultsViewError::Lookup(LookupError::NotFound { .. }))
        ));
        assert_eq!(state.selection.active(), None);
        assert!(!panel.view().unwrap().overlay.is_visible());
    }

    #[tokio::test]
    async fn test_selected_menu_event_does_not_show_overlay() {
        let (mut state, mut panel) = rendered();
        let event = MenuEvent {
            kind: MenuEventKind::Selected,
            address: Some(Address::from(&["table"][..])),
        };
        InboundHandlers::handle_menu_event(&mut state, &mut panel, &event).unwrap();

        let table = panel.node_at(&Address::from(&["table"][..]));
        assert_eq!(state.selection.active(), table);
        assert!(!state.selection.style().is_visible());
    }

    #[tokio::test]
    async fn test_body_context_menu_targets_root() {
        let (mut state, mut panel) = rendered();
        let event = PanelEvent::BodyContextMenu { page_x: 3.0, page_y: 4.0 };
        let outbound = PanelHandlers::handle(&mut state, &mut panel, event).unwrap();

        assert!(outbound.is_empty());
        assert_eq!(panel.activity().context_menus, vec![(panel.root(), 3.0, 4.0)]);
    }

    #[test]
    fn test_mouse_dropped_until_host_attached() {
        let mut state = RouterState::new(RouterConfig::default());
        let mut panel = HeadlessPanel::default();
        let event = MouseButtonEvent {
            event_name: MouseEventKind::MouseUp,
            which: 3,
            page_x: 10.0,
            page_y: 20.0,
        };

        let before = PanelHandlers::handle(&mut state, &mut panel, PanelEvent::Mouse(event)).unwrap();
        assert!(before.is_empty());

        state.host_attached = true;
        let after = PanelHandlers::handle(&mut state, &mut panel, PanelEvent::Mouse(event)).unwrap();
        assert_eq!(after, vec![Outbound::MouseEvent(event)]);
    }

    #[test]
    fn test_lost_focus_without_editing_is_underflow() {
        let mut state = RouterState::new(RouterConfig::default());
        let mut panel = HeadlessPanel::default();
        let event = PanelEvent::AnnotationLostFocus { data: json!({}) };

        let result = PanelHandlers::handle(&mut state, &mut panel, event);
        let err = result.unwrap_err();
        assert!(matches!(err, ResultsViewError::Focus(FocusError::Underflow)));
        assert!(err.is_fatal());
    }
}
