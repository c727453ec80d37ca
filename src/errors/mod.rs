use std::error::Error;

use crate::address_book::NodeId;

/// Errors of the node core and of the peer communicators.
///
/// Transport failures (`Unreachable`, `DeadlineExceeded`) never cross a component
/// boundary raw: the core turns them into negative acknowledgements, retries,
/// health checks or elections.
#[derive(Clone, Debug, Eq, PartialEq, Display)]
pub enum BullyError {
    /// Target id is absent from the address book.
    #[display(fmt = "Node {} is not present in the topology", _0)]
    NodeNotFound(NodeId),

    /// Transport-level failure while calling a peer.
    #[display(fmt = "Node {} is unreachable. Cause: {}", node_id, cause)]
    Unreachable { node_id: NodeId, cause: String },

    /// Peer did not answer before the call deadline.
    #[display(fmt = "Deadline exceeded while waiting for node {}", _0)]
    DeadlineExceeded(NodeId),

    /// Malformed local input.
    #[display(fmt = "Invalid request: {}", _0)]
    InvalidRequest(String),

    /// Node cannot be started.
    #[display(fmt = "Node startup failed: {}", _0)]
    Startup(String),
}

impl Error for BullyError {}

pub(crate) type Result<T> = std::result::Result<T, BullyError>;

pub fn unreachable_err<T>(node_id: NodeId, cause: String) -> Result<T> {
    Err(BullyError::Unreachable { node_id, cause })
}
