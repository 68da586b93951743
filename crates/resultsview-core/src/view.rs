//! Explicit view state and its projection onto the panel
//!
//! Annotation and selection flags live here as plain fields. The panel sees
//! them only through [`ViewState`], built in one place and handed to
//! [`ResultsPanel::apply`](crate::panel::ResultsPanel::apply).

use serde::{Deserialize, Serialize};

use crate::selection::{OverlayStyle, SelectionOverlay};

/// Annotation-related flags driven by the host
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnnotationBooleans {
    /// An annotation editor has keyboard focus (`editFocused`)
    pub focused: bool,
    /// The panel is in annotation edit state (`editState`)
    pub editing: bool,
    /// `None` means no analysis is selected at all, distinct from `Some(false)`
    pub analysis_selected: Option<bool>,
}

impl Default for AnnotationBooleans {
    fn default() -> Self {
        Self {
            focused: false,
            editing: false,
            analysis_selected: Some(false),
        }
    }
}

/// Everything the rendered view reflects from router state
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ViewState {
    /// Panel mode of the current results
    pub mode: String,
    pub edit_focus: bool,
    pub edit_state: bool,
    pub analysis_selected: bool,
    pub no_analysis_selected: bool,
    pub overlay: OverlayStyle,
}

impl ViewState {
    pub fn project(mode: &str, flags: &AnnotationBooleans, selection: &SelectionOverlay) -> Self {
        Self {
            mode: mode.to_string(),
            edit_focus: flags.focused,
            edit_state: flags.editing,
            analysis_selected: flags.analysis_selected == Some(true),
            no_analysis_selected: flags.analysis_selected.is_none(),
            overlay: selection.style(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tri_state_projection() {
        let selection = SelectionOverlay::default();
        let mut flags = AnnotationBooleans::default();

        let view = ViewState::project("rich", &flags, &selection);
        assert!(!view.analysis_selected);
        assert!(!view.no_analysis_selected);

        flags.analysis_selected = None;
        let view = ViewState::project("rich", &flags, &selection);
        assert!(!view.analysis_selected);
        assert!(view.no_analysis_selected);

        flags.analysis_selected = Some(true);
        flags.editing = true;
        let view = ViewState::project("text", &flags, &selection);
        assert!(view.analysis_selected);
        assert!(!view.no_analysis_selected);
        assert!(view.edit_state);
        assert!(!view.edit_focus);
        assert_eq!(view.mode, "text");
    }
}
