//! Message Router Module
//!
//! The router logic split into focused components:
//! - `state`: router-owned render, focus, annotation and selection state
//! - `handlers`: one handler per inbound envelope and panel event
//! - `task`: the `MessageRouter` event loop tying channels to handlers
//!
//! All mutable state is owned by the single router task and only touched
//! from its handlers, so nothing here needs a lock. Exports are the one
//! piece of work that suspends; they run as futures polled by the same task
//! and never block dispatch of other messages.

pub mod handlers;
pub mod state;
pub mod task;

pub use handlers::{Dispatch, InboundHandlers, PanelHandlers};
pub use state::{RouterState, RouterStats};
pub use task::MessageRouter;
