//! Annotation focus reference counting
//!
//! Several annotation regions can be edited at once, nested or side by side.
//! The host only wants to know whether the panel as a whole is being edited,
//! so enters and leaves are counted and only the 0→1 and 1→0 edges are
//! reported.

use crate::errors::FocusError;

/// Externally observable focus edge
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FocusTransition {
    /// Idle → Editing
    Gained,
    /// Editing → Idle
    Lost,
}

/// Reference counter over nested editing regions
#[derive(Debug, Default, Clone)]
pub struct FocusRefCounter {
    count: usize,
}

impl FocusRefCounter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Current number of regions being edited
    pub fn count(&self) -> usize {
        self.count
    }

    /// Whether any region is being edited
    pub fn is_editing(&self) -> bool {
        self.count > 0
    }

    /// A region started editing
    pub fn enter(&mut self) -> Option<FocusTransition> {
        self.count += 1;
        (self.count == 1).then_some(FocusTransition::Gained)
    }

    /// A region stopped editing
    ///
    /// Leaving while idle means enters and leaves are mismatched upstream.
    /// The count is left at zero and the violation is returned for the caller
    /// to treat as fatal.
    pub fn leave(&mut self) -> Result<Option<FocusTransition>, FocusError> {
        if self.count == 0 {
            return Err(FocusError::Underflow);
        }
        self.count -= 1;
        Ok((self.count == 0).then_some(FocusTransition::Lost))
    }
}
