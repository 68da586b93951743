//! Selection overlay over the active node
//!
//! The overlay hugs the results root exactly and insets every other node
//! horizontally only. Activating always hides the previous selection first
//! so stale geometry never leaks from one selection to the next.

use serde::{Deserialize, Serialize};

use crate::panel::{NodeId, Rect};

/// Position and visibility of the overlay box
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct OverlayStyle {
    pub left: f64,
    pub top: f64,
    pub width: f64,
    pub height: f64,
    pub opacity: f64,
}

impl OverlayStyle {
    pub fn is_visible(&self) -> bool {
        self.opacity > 0.0
    }
}

/// Tracks the active node and where its highlight sits
#[derive(Debug, Clone)]
pub struct SelectionOverlay {
    active: Option<NodeId>,
    style: OverlayStyle,
    inset: f64,
}

impl SelectionOverlay {
    /// Overlay that insets non-root nodes by `inset` on the left and right
    pub fn new(inset: f64) -> Self {
        Self {
            active: None,
            style: OverlayStyle::default(),
            inset,
        }
    }

    pub fn active(&self) -> Option<NodeId> {
        self.active
    }

    pub fn style(&self) -> OverlayStyle {
        self.style
    }

    /// Hide the overlay and forget the active node; returns whether one was active
    pub fn deactivate(&mut self) -> bool {
        self.style.opacity = 0.0;
        self.active.take().is_some()
    }

    /// Make `node` active without showing the overlay
    pub fn select(&mut self, node: NodeId) {
        self.active = Some(node);
    }

    /// Make `node` active and highlight its box
    ///
    /// Without geometry the overlay stays hidden and nothing is active.
    pub fn activate(&mut self, node: NodeId, bounds: Option<Rect>, is_root: bool) {
        self.deactivate();
        let Some(bounds) = bounds else {
            return;
        };

        let (pad_lr, pad_tb) = if is_root { (0.0, 0.0) } else { (self.inset, 0.0) };
        self.active = Some(node);
        self.style = OverlayStyle {
            left: bounds.x - pad_lr,
            top: bounds.y - pad_tb,
            width: bounds.width + 2.0 * pad_lr,
            height: bounds.height + 2.0 * pad_tb,
            opacity: 1.0,
        };
    }
}

impl Default for SelectionOverlay {
    fn default() -> Self {
        Self::new(12.0)
    }
}
