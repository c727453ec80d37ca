use std::collections::BTreeMap;

use bully::NodeId;
use bully_modules::InProcPeerCommunicator;

use crate::steps::{self, CaseNode};

pub struct CaseCluster {
    pub peer_communicator: InProcPeerCommunicator,
    pub nodes: BTreeMap<NodeId, CaseNode>,
}

/// Starts nodes one by one in the given order, each after the topology settled.
pub fn start_initial_cluster(start_order: Vec<NodeId>) -> CaseCluster {
    let mut cluster = CaseCluster {
        peer_communicator: steps::get_peer_communicator(),
        nodes: BTreeMap::new(),
    };

    for node_id in start_order {
        cluster.add_new_server(node_id);
    }

    cluster
}

impl CaseCluster {
    pub fn add_new_server(&mut self, node_id: NodeId) {
        let node = steps::create_node_inproc(node_id, self.peer_communicator.clone());
        self.nodes.insert(node_id, node);

        steps::wait_for(&format!("node {} is known to every node", node_id), || self.is_fully_connected());
    }

    pub fn node(&self, node_id: NodeId) -> &CaseNode {
        &self.nodes[&node_id]
    }

    pub fn node_ids(&self) -> Vec<NodeId> {
        self.nodes.keys().cloned().collect()
    }

    pub fn leaders(&self) -> Vec<NodeId> {
        self.nodes
            .values()
            .filter(|node| node.is_leader())
            .map(|node| node.id())
            .collect()
    }

    /// Every running node knows every other running node.
    pub fn is_fully_connected(&self) -> bool {
        let ids = self.node_ids();
        self.nodes.values().all(|node| {
            let known = node.status().known_nodes;
            ids.iter().filter(|id| **id != node.id()).all(|id| known.contains(id))
        })
    }

    /// Exactly one leader and every node points at it.
    pub fn has_single_leader(&self, leader_id: NodeId) -> bool {
        self.leaders() == vec![leader_id]
            && self.nodes.values().all(|node| node.status().leader_id == leader_id)
    }

    pub fn quit(&mut self, node_id: NodeId) -> bool {
        match self.nodes.remove(&node_id) {
            Some(node) => node.quit(),
            None => false,
        }
    }

    /// Crash: the node stops serving and calls to it fail at once.
    pub fn crash(&mut self, node_id: NodeId) {
        self.peer_communicator.disconnect(node_id);
        if let Some(node) = self.nodes.remove(&node_id) {
            node.terminate();
        }
        info!("Node {} crashed", node_id);
    }

    pub fn terminate(self) {
        for (_, node) in self.nodes {
            node.terminate();
        }
    }
}
