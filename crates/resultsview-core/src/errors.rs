//! Error types for the results view protocol
//!
//! Specific error enums for each concern (tree lookup, envelope decoding,
//! focus bookkeeping, content export) plus the `ResultsViewError` type that
//! unifies them.

use crate::export::ContentKind;

// ----------------------------------------------------------------------------
// Specific Error Types
// ----------------------------------------------------------------------------

/// Failures resolving an address against the rendered tree
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum LookupError {
    #[error("No node at '{address}': segment '{segment}' has no matching child")]
    NotFound { address: String, segment: String },
    #[error("No results have been rendered yet")]
    NothingRendered,
}

/// Failures decoding an inbound envelope of a known type
#[derive(Debug, thiserror::Error)]
pub enum EnvelopeError {
    #[error("Malformed '{kind}' payload: {source}")]
    MalformedPayload {
        kind: String,
        #[source]
        source: serde_json::Error,
    },
    #[error("Envelope is not valid JSON: {0}")]
    InvalidJson(#[from] serde_json::Error),
}

/// Focus reference counting contract violations
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum FocusError {
    #[error("Annotation focus count went negative: leave without matching enter")]
    Underflow,
}

/// Failures producing a content representation
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ExportError {
    #[error("Export of {kind} failed: {reason}")]
    Failed { kind: ContentKind, reason: String },
}

// ----------------------------------------------------------------------------
// Unified Error Type
// ----------------------------------------------------------------------------

/// Core error types for the results view protocol
#[derive(Debug, thiserror::Error)]
pub enum ResultsViewError {
    #[error("Lookup error: {0}")]
    Lookup(#[from] LookupError),

    #[error("Envelope error: {0}")]
    Envelope(#[from] EnvelopeError),

    #[error("Focus error: {0}")]
    Focus(#[from] FocusError),

    #[error("Export error: {0}")]
    Export(#[from] ExportError),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Channel communication error between router and its peers
    #[error("Channel error: {message}")]
    Channel { message: String },

    /// Configuration error
    #[error("Configuration error: {reason}")]
    Configuration { reason: String },
}

// ----------------------------------------------------------------------------
// Convenience Error Constructors
// ----------------------------------------------------------------------------

impl ResultsViewError {
    /// Create a channel error with a message
    pub fn channel_error<T: Into<String>>(message: T) -> Self {
        ResultsViewError::Channel {
            message: message.into(),
        }
    }

    /// Create a configuration error with a reason
    pub fn config_error<T: Into<String>>(reason: T) -> Self {
        ResultsViewError::Configuration {
            reason: reason.into(),
        }
    }

    /// Whether the error must stop the router rather than drop one message
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            ResultsViewError::Channel { .. }
                | ResultsViewError::Configuration { .. }
                | ResultsViewError::Focus(_)
        )
    }
}

// ----------------------------------------------------------------------------
// Type Aliases
// ----------------------------------------------------------------------------

pub type Result<T> = core::result::Result<T, ResultsViewError>;
pub type ResultsViewResult<T> = Result<T>;
