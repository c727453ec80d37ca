use crate::address_book::{Address, NodeId};
use crate::common::PeerFanOut;
use crate::communication::peers::{PeerRequestHandler, UpdateTopologyRequest};

/// Best-effort membership sync: one attempt per member, no retry.
#[derive(Clone, Debug)]
pub struct TopologyPropagator<Pc: PeerRequestHandler> {
    peer_communicator: Pc,
    fan_out: PeerFanOut,
}

impl<Pc: PeerRequestHandler> TopologyPropagator<Pc> {
    pub fn new(peer_communicator: Pc, fan_out: PeerFanOut) -> TopologyPropagator<Pc> {
        TopologyPropagator {
            peer_communicator,
            fan_out,
        }
    }

    /// Sends `members` to every target; each target gets the set without itself.
    ///
    /// Returns the targets the update could not reach (transport error or deadline).
    /// A false ack is only logged.
    pub fn propagate(&self, members: Vec<Address>, targets: Vec<Address>) -> Vec<NodeId> {
        if targets.is_empty() {
            return Vec::new();
        }
        debug!(
            "Propagating topology {:?} to {:?}",
            members.iter().map(|a| a.node_id).collect::<Vec<_>>(),
            targets.iter().map(|a| a.node_id).collect::<Vec<_>>()
        );

        let responses = self.fan_out.request_peers(members, targets, |peer, members| {
            let known_addresses = members
                .into_iter()
                .filter(|address| address.node_id != peer.node_id)
                .collect();
            self.peer_communicator
                .update_topology(peer, UpdateTopologyRequest { known_addresses })
        });

        let mut unreachable = Vec::new();
        for (peer, response) in responses {
            match response {
                Ok(resp) if resp.ack => trace!("Node {} accepted topology update", peer.node_id),
                Ok(_) => warn!("Node {} answered topology update with false ack", peer.node_id),
                Err(err) => {
                    error!("Error sending topology update to node {}: {}", peer.node_id, err);
                    unreachable.push(peer.node_id);
                }
            }
        }

        unreachable
    }
}
