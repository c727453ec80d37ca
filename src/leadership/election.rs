use std::thread;

use crate::address_book::{Address, NodeId};
use crate::common::PeerFanOut;
use crate::communication::peers::{
    Acknowledgement, ElectionRequest, LeaderAnnouncementRequest, PeerRequestHandler,
};
use crate::node::configuration::BootstrapConfiguration;
use crate::node::state::{NodeStatus, ProtectedNode};

/// Bully algorithm: the highest reachable id wins.
#[derive(Clone, Debug)]
pub struct ElectionCoordinator<Pc: PeerRequestHandler> {
    protected_node: ProtectedNode,
    peer_communicator: Pc,
    fan_out: PeerFanOut,
    bootstrap: BootstrapConfiguration,
}

enum ProbeFollowUp {
    Elect,
    Reannounce,
}

impl<Pc: PeerRequestHandler> ElectionCoordinator<Pc> {
    pub fn new(
        protected_node: ProtectedNode,
        peer_communicator: Pc,
        fan_out: PeerFanOut,
        bootstrap: BootstrapConfiguration,
    ) -> ElectionCoordinator<Pc> {
        ElectionCoordinator {
            protected_node,
            peer_communicator,
            fan_out,
            bootstrap,
        }
    }

    /// Runs one election round and returns whether this node is the leader afterwards.
    ///
    /// Every higher node is probed concurrently and the decision waits for all of
    /// them. An unreachable peer does not contest.
    pub fn initiate_election(&self) -> bool {
        let (node_id, higher_nodes) = {
            let mut node = self.protected_node.lock();
            if !node.begin_election() {
                debug!("Node {} skips election, status: {}", node.id(), node.status());
                return node.is_leader();
            }
            let node_id = node.id();
            (node_id, node.address_book.higher_nodes(node_id))
        };

        info!(
            "Node {} initiates election. Higher nodes: {:?}",
            node_id,
            higher_nodes.iter().map(|a| a.node_id).collect::<Vec<_>>()
        );

        if higher_nodes.is_empty() {
            return self.become_leader();
        }

        let request = ElectionRequest { candidate_id: node_id };
        let responses = self.fan_out.request_peers(request, higher_nodes, |peer, req| {
            self.peer_communicator.start_election(peer, req)
        });

        let mut contested = false;
        for (peer, response) in responses {
            match response {
                Ok(resp) if resp.ack => {
                    info!("Node {} outranks node {}. Stopping election", peer.node_id, node_id);
                    contested = true;
                }
                Ok(_) => {
                    trace!("Node {} does not contest node {}", peer.node_id, node_id);
                }
                Err(err) => {
                    error!("Election probe to node {} failed: {}", peer.node_id, err);
                }
            }
        }

        if contested {
            self.protected_node.lock().finish_election();
            return false;
        }

        self.become_leader()
    }

    /// Points the leader to this node and announces it to every known member.
    pub fn become_leader(&self) -> bool {
        let (node_id, peers) = {
            let mut node = self.protected_node.lock();
            if node.is_quitting() {
                warn!("Node {} is quitting. Leadership declined", node.id());
                return false;
            }

            let node_id = node.id();
            if let Err(err) = node.address_book.set_leader(node_id) {
                error!("Node {} cannot become leader: {}", node_id, err);
                node.finish_election();
                return false;
            }
            node.finish_election();
            (node_id, node.address_book.known_addresses())
        };

        info!("Node {} became the leader", node_id);
        self.announce_leadership(node_id, peers);

        true
    }

    /// Answers `true` when this node outranks or ties the candidate.
    pub fn handle_election_probe(&self, request: ElectionRequest) -> Acknowledgement {
        let (ack, follow_up) = {
            let node = self.protected_node.lock();
            if node.is_quitting() {
                warn!(
                    "Node {} is quitting. Ignoring election request from {}",
                    node.id(),
                    request.candidate_id
                );
                return Acknowledgement::new(false);
            }

            info!("Node {} received election request from candidate {}", node.id(), request.candidate_id);
            let ack = node.id() >= request.candidate_id;
            let follow_up = if !ack || node.id() == request.candidate_id {
                None
            } else if node.is_leader() {
                Some(ProbeFollowUp::Reannounce)
            } else if node.status() == NodeStatus::Idle {
                Some(ProbeFollowUp::Elect)
            } else {
                None
            };
            (ack, follow_up)
        };

        if let Some(follow_up) = follow_up {
            let coordinator = self.clone();
            let candidate_id = request.candidate_id;
            thread::spawn(move || match follow_up {
                ProbeFollowUp::Elect => {
                    coordinator.initiate_election();
                }
                ProbeFollowUp::Reannounce => coordinator.reannounce_to(candidate_id),
            });
        }

        Acknowledgement::new(ack)
    }

    /// Moves the leader pointer to the announced node. Last announcement wins.
    pub fn handle_leader_announcement(&self, request: LeaderAnnouncementRequest) -> Acknowledgement {
        let mut node = self.protected_node.lock();
        let node_id = node.id();
        let leader_id = request.leader_id;

        if leader_id != node_id && !node.address_book.contains(leader_id) {
            let address = self.bootstrap.address_of(leader_id);
            info!("Announced leader {} is not known yet. Adding {}", leader_id, address);
            node.address_book.add(address);
        }

        let was_leader = node.is_leader();
        if let Err(err) = node.address_book.set_leader(leader_id) {
            warn!("Node {} rejected leader announcement: {}", node_id, err);
            return Acknowledgement::new(false);
        }

        if was_leader && leader_id != node_id {
            info!("Node {} defers leadership to node {}", node_id, leader_id);
        }
        info!("Node {} has a new leader with ID: {}", node_id, leader_id);

        Acknowledgement::new(true)
    }

    fn announce_leadership(&self, node_id: NodeId, peers: Vec<Address>) {
        info!("Node {} announces leadership", node_id);

        let request = LeaderAnnouncementRequest { leader_id: node_id };
        let responses = self.fan_out.request_peers(request, peers, |peer, req| {
            self.peer_communicator.announce_leader(peer, req)
        });

        for (peer, response) in responses {
            match response {
                Ok(resp) if resp.ack => info!("Node {} acknowledged the leadership", peer.node_id),
                Ok(_) => warn!("Node {} did not acknowledge the leadership", peer.node_id),
                Err(err) => error!("Cannot announce leadership to node {}: {}", peer.node_id, err),
            }
        }
    }

    fn reannounce_to(&self, candidate_id: NodeId) {
        let (node_id, candidate) = {
            let node = self.protected_node.lock();
            if !node.is_leader() {
                return;
            }
            let candidate = node
                .address_book
                .get(candidate_id)
                .unwrap_or_else(|_| self.bootstrap.address_of(candidate_id));
            (node.id(), candidate)
        };

        self.announce_leadership(node_id, vec![candidate]);
    }
}
