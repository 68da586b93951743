//! Read-only queries against router state
//!
//! The router owns its state exclusively; other tasks ask for snapshots over
//! this channel and get the answer on a oneshot.

use resultsview_core::{Address, ChannelConfig, ResultsDefinition, ViewState};
use serde_json::Value;
use tokio::sync::{mpsc, oneshot};

use crate::logic::RouterStats;

#[derive(Debug)]
pub enum RouterQuery {
    /// Option `name` of the node at `address` in the current results
    GetParam {
        address: Address,
        name: String,
        reply: oneshot::Sender<Option<Value>>,
    },
    /// The current results definition
    Definition {
        reply: oneshot::Sender<Option<ResultsDefinition>>,
    },
    /// The view state last projected onto the panel
    View { reply: oneshot::Sender<ViewState> },
    Stats { reply: oneshot::Sender<RouterStats> },
}

pub type QuerySender = mpsc::Sender<RouterQuery>;
pub type QueryReceiver = mpsc::Receiver<RouterQuery>;

/// Create bounded query channel (Any task → Router)
pub fn create_query_channel(config: &ChannelConfig) -> (QuerySender, QueryReceiver) {
    mpsc::channel(config.query_buffer_size)
}
