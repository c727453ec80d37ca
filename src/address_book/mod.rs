use std::collections::HashMap;

use crate::errors::{BullyError, Result};


pub type NodeId = i32;

/// Network location and identity of a cluster member.
#[derive(Clone, Debug, Eq, PartialEq, Hash, Display)]
#[display(fmt = "Node{{hostname:{}, port:{}, nodeId:{}}}", hostname, port, node_id)]
pub struct Address {
    pub hostname: String,
    pub port: i32,
    pub node_id: NodeId,
}

impl Address {
    pub fn new(hostname: impl Into<String>, port: i32, node_id: NodeId) -> Address {
        Address {
            hostname: hostname.into(),
            port,
            node_id,
        }
    }

    pub fn is_valid(&self) -> bool {
        self.port >= 1 && self.node_id >= 0
    }
}

/// Outcome of removing a member that may have been the leader.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Eviction {
    pub address: Address,
    pub was_leader: bool,
}

/// Membership map plus the leader pointer.
///
/// The leader pointer is always either the own address or a known member.
#[derive(Clone, Debug)]
pub struct AddressBook {
    own_address: Address,
    known_nodes: HashMap<NodeId, Address>,
    leader_address: Address,
}

impl AddressBook {
    pub fn new(own_address: Address) -> AddressBook {
        AddressBook {
            leader_address: own_address.clone(),
            own_address,
            known_nodes: HashMap::new(),
        }
    }

    pub fn own_address(&self) -> &Address {
        &self.own_address
    }

    pub fn node_id(&self) -> NodeId {
        self.own_address.node_id
    }

    pub fn leader(&self) -> &Address {
        &self.leader_address
    }

    pub fn is_leader(&self) -> bool {
        self.leader_address == self.own_address
    }

    /// Inserts or replaces a member. Returns false if the address was rejected.
    pub fn add(&mut self, address: Address) -> bool {
        if !address.is_valid() {
            warn!("Attempted to add invalid address to known nodes: {}", address);
            return false;
        }
        if address.node_id == self.node_id() {
            warn!("Attempted to add own address to known nodes: {}", address);
            return false;
        }

        info!("Adding new {}", address);
        if let Some(previous) = self.known_nodes.insert(address.node_id, address.clone()) {
            if self.leader_address == previous {
                self.leader_address = address;
            }
        }
        true
    }

    /// Removes a member and, if it was the leader, moves the leader pointer to the
    /// highest remaining id (the expected election winner) in the same step.
    pub fn evict(&mut self, node_id: NodeId) -> Option<Eviction> {
        let address = match self.known_nodes.remove(&node_id) {
            Some(address) => address,
            None => {
                warn!("Attempted to evict unknown node {}", node_id);
                return None;
            }
        };
        info!("Removing {}", address);

        let was_leader = self.leader_address == address;
        if was_leader {
            self.leader_address = self.highest_member();
            info!(
                "Leader {} removed. Provisional leader: {}",
                node_id, self.leader_address.node_id
            );
        }

        Some(Eviction { address, was_leader })
    }

    pub fn get(&self, node_id: NodeId) -> Result<Address> {
        self.known_nodes
            .get(&node_id)
            .cloned()
            .ok_or(BullyError::NodeNotFound(node_id))
    }

    pub fn contains(&self, node_id: NodeId) -> bool {
        self.known_nodes.contains_key(&node_id)
    }

    pub fn higher_nodes(&self, self_id: NodeId) -> Vec<Address> {
        let mut higher: Vec<Address> = self
            .known_nodes
            .values()
            .filter(|address| address.node_id > self_id)
            .cloned()
            .collect();
        higher.sort_by_key(|address| address.node_id);
        higher
    }

    /// All known addresses plus the own one, without `exclude_id`.
    pub fn snapshot(&self, exclude_id: NodeId) -> Vec<Address> {
        let mut members = self.members();
        members.retain(|address| address.node_id != exclude_id);
        members
    }

    /// All known addresses plus the own one.
    pub fn members(&self) -> Vec<Address> {
        self.known_nodes
            .values()
            .chain(std::iter::once(&self.own_address))
            .cloned()
            .collect()
    }

    pub fn known_addresses(&self) -> Vec<Address> {
        self.known_nodes.values().cloned().collect()
    }

    pub fn known_ids(&self) -> Vec<NodeId> {
        let mut ids: Vec<NodeId> = self.known_nodes.keys().cloned().collect();
        ids.sort_unstable();
        ids
    }

    pub fn set_leader(&mut self, leader_id: NodeId) -> Result<()> {
        if leader_id == self.node_id() {
            self.leader_address = self.own_address.clone();
            return Ok(());
        }

        self.leader_address = self.get(leader_id)?;
        Ok(())
    }

    /// Replaces the membership with `addresses`, treated as a complete set.
    ///
    /// The current leader is kept even when the set omits it; with `leader` given,
    /// the pointer moves to it instead.
    pub fn replace_topology(&mut self, addresses: Vec<Address>, leader: Option<Address>) {
        let mut known_nodes = HashMap::new();
        for address in addresses {
            if !address.is_valid() {
                warn!("Skipping invalid address in topology: {}", address);
                continue;
            }
            if address.node_id != self.node_id() {
                known_nodes.insert(address.node_id, address);
            }
        }

        let leader = leader.unwrap_or_else(|| self.leader_address.clone());
        if leader.node_id != self.node_id()
            && !known_nodes.contains_key(&leader.node_id)
            && leader.is_valid()
        {
            warn!("Topology update does not contain leader {}. Keeping it", leader.node_id);
            known_nodes.insert(leader.node_id, leader.clone());
        }

        self.known_nodes = known_nodes;
        self.leader_address = if leader.node_id == self.node_id() {
            self.own_address.clone()
        } else {
            match self.known_nodes.get(&leader.node_id) {
                Some(address) => address.clone(),
                None => self.highest_member(),
            }
        };

        info!("Topology after update: {:?}", self.known_ids());
    }

    fn highest_member(&self) -> Address {
        self.known_nodes
            .values()
            .filter(|address| address.node_id > self.node_id())
            .max_by_key(|address| address.node_id)
            .cloned()
            .unwrap_or_else(|| self.own_address.clone())
    }
}
