use parking_lot::Mutex;
use std::sync::Arc;

use crate::address_book::{Address, AddressBook, NodeId};

#[cfg(test)]
mod tests;

/// Node state shared between request handlers and background activity.
/// Every membership or leader mutation happens under this one lock.
pub type ProtectedNode = Arc<Mutex<NodeState>>;

#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash, Display)]
pub enum NodeStatus {
    Idle,
    Electing,
    Quitting,
}

/// Printable node status: identity, leader and topology.
#[derive(Clone, Debug, Eq, PartialEq, Display)]
#[display(
    fmt = "Node id: {}, status: {}, leader: {}, is leader: {}, known nodes: {:?}",
    node_id,
    status,
    leader_id,
    is_leader,
    known_nodes
)]
pub struct NodeStatusReport {
    pub node_id: NodeId,
    pub status: NodeStatus,
    pub leader_id: NodeId,
    pub is_leader: bool,
    pub known_nodes: Vec<NodeId>,
}

#[derive(Debug)]
pub struct NodeState {
    pub address_book: AddressBook,
    status: NodeStatus,
}

impl NodeState {
    pub fn new(own_address: Address) -> NodeState {
        NodeState {
            address_book: AddressBook::new(own_address),
            status: NodeStatus::Idle,
        }
    }

    pub fn protect(self) -> ProtectedNode {
        Arc::new(Mutex::new(self))
    }

    pub fn id(&self) -> NodeId {
        self.address_book.node_id()
    }

    pub fn is_leader(&self) -> bool {
        self.address_book.is_leader()
    }

    pub fn status(&self) -> NodeStatus {
        self.status
    }

    pub fn is_quitting(&self) -> bool {
        self.status == NodeStatus::Quitting
    }

    /// Idle -> Electing. Returns false when an election is running or the node quits.
    pub fn begin_election(&mut self) -> bool {
        if self.status != NodeStatus::Idle {
            return false;
        }
        self.change_status(NodeStatus::Electing);
        true
    }

    /// Electing -> Idle.
    pub fn finish_election(&mut self) {
        if self.status == NodeStatus::Electing {
            self.change_status(NodeStatus::Idle);
        }
    }

    /// Quitting is terminal.
    pub fn begin_quit(&mut self) {
        self.change_status(NodeStatus::Quitting);
    }

    pub fn report(&self) -> NodeStatusReport {
        NodeStatusReport {
            node_id: self.id(),
            status: self.status,
            leader_id: self.address_book.leader().node_id,
            is_leader: self.is_leader(),
            known_nodes: self.address_book.known_ids(),
        }
    }

    fn change_status(&mut self, status: NodeStatus) {
        if self.status == status {
            return;
        }
        info!("Node {} state has changed from {} to {}", self.id(), self.status, status);
        self.status = status;
    }
}
