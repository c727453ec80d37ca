use std::time::Duration;

use crate::address_book::{Address, NodeId};
use crate::communication::peers::{PeerRequestChannels, PeerRequestHandler};

#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash)]
pub struct NodeLimits {
    /// Deadline of a single peer call.
    pub communication_timeout: Duration,
    /// Attempts for message delivery and for health checks.
    pub max_retries: u32,
    /// Pause between two attempts.
    pub retry_delay: Duration,
    /// Threads issuing concurrent peer calls.
    pub fan_out_parallelism: usize,
}

impl Default for NodeLimits {
    fn default() -> Self {
        NodeLimits {
            communication_timeout: Duration::from_secs(2),
            max_retries: 3,
            retry_delay: Duration::from_secs(3),
            fan_out_parallelism: 8,
        }
    }
}

/// Port convention and entry point used to find the cluster.
#[derive(Clone, Debug, Eq, PartialEq, Hash)]
pub struct BootstrapConfiguration {
    pub hostname: String,
    pub base_port: i32,
    pub entry_point_id: NodeId,
}

impl Default for BootstrapConfiguration {
    fn default() -> Self {
        BootstrapConfiguration {
            hostname: "localhost".to_string(),
            base_port: 50050,
            entry_point_id: 5,
        }
    }
}

impl BootstrapConfiguration {
    pub fn address_of(&self, node_id: NodeId) -> Address {
        Address::new(self.hostname.clone(), self.base_port + node_id, node_id)
    }

    /// Entry point first, then every lower id down to 1.
    pub fn join_candidates(&self, own_id: NodeId) -> Vec<NodeId> {
        (1..=self.entry_point_id)
            .rev()
            .filter(|node_id| *node_id != own_id)
            .collect()
    }
}

#[derive(Clone, Debug)]
pub struct NodeConfiguration<Pc>
where
    Pc: PeerRequestHandler + PeerRequestChannels,
{
    pub address: Address,
    pub bootstrap: BootstrapConfiguration,
    pub peer_communicator: Pc,
    pub limits: NodeLimits,
}

impl<Pc> NodeConfiguration<Pc>
where
    Pc: PeerRequestHandler + PeerRequestChannels,
{
    /// Configuration following the port convention for `node_id`.
    pub fn new(node_id: NodeId, bootstrap: BootstrapConfiguration, peer_communicator: Pc) -> Self {
        NodeConfiguration {
            address: bootstrap.address_of(node_id),
            bootstrap,
            peer_communicator,
            limits: NodeLimits::default(),
        }
    }

    pub fn with_limits(mut self, limits: NodeLimits) -> Self {
        self.limits = limits;
        self
    }
}
