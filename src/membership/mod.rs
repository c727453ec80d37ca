use std::thread;

use crate::address_book::Address;
use crate::common::PeerFanOut;
use crate::communication::peers::{
    Acknowledgement, JoinRequest, JoinResponse, PeerRequestHandler, QuitTopologyRequest,
    UpdateTopologyRequest,
};
use crate::failure_detector::FailureDetector;
use crate::leadership::ElectionCoordinator;
use crate::node::configuration::BootstrapConfiguration;
use crate::node::state::{NodeState, ProtectedNode};

mod topology;

pub use topology::TopologyPropagator;


/// Join, quit and topology sync.
#[derive(Clone, Debug)]
pub struct MembershipProtocol<Pc: PeerRequestHandler> {
    protected_node: ProtectedNode,
    peer_communicator: Pc,
    election: ElectionCoordinator<Pc>,
    propagator: TopologyPropagator<Pc>,
    failure_detector: FailureDetector<Pc>,
    fan_out: PeerFanOut,
    bootstrap: BootstrapConfiguration,
}

impl<Pc: PeerRequestHandler> MembershipProtocol<Pc> {
    pub fn new(
        protected_node: ProtectedNode,
        peer_communicator: Pc,
        election: ElectionCoordinator<Pc>,
        propagator: TopologyPropagator<Pc>,
        failure_detector: FailureDetector<Pc>,
        fan_out: PeerFanOut,
        bootstrap: BootstrapConfiguration,
    ) -> MembershipProtocol<Pc> {
        MembershipProtocol {
            protected_node,
            peer_communicator,
            election,
            propagator,
            failure_detector,
            fan_out,
            bootstrap,
        }
    }

    /// Tries the bootstrap candidates in order and stops at the first acceptance.
    /// Without any acceptance the node leads its current topology.
    pub fn join_topology(&self) -> bool {
        let own_address = self.protected_node.lock().address_book.own_address().clone();
        let node_id = own_address.node_id;

        for candidate_id in self.bootstrap.join_candidates(node_id) {
            let target = self.bootstrap.address_of(candidate_id);
            match self.peer_communicator.join(&target, JoinRequest::from(&own_address)) {
                Ok(response) if response.ack => {
                    if self.apply_join_response(response) {
                        let node = self.protected_node.lock();
                        info!(
                            "Node {} joined network topology through node {}. Leader: {}, known nodes: {:?}",
                            node_id,
                            candidate_id,
                            node.address_book.leader().node_id,
                            node.address_book.known_ids()
                        );
                        return true;
                    }
                }
                Ok(_) => info!("Node {} responded with false ack to join request", candidate_id),
                Err(err) => debug!("Cannot join through node {}: {}", candidate_id, err),
            }
        }

        if node_id == self.bootstrap.entry_point_id {
            info!("Node {} is the entry point. Starting a new topology", node_id);
        } else {
            warn!("Node {} failed to join network topology after trying all known nodes", node_id);
        }
        self.election.become_leader();

        false
    }

    fn apply_join_response(&self, response: JoinResponse) -> bool {
        let leader = match response.leader {
            Some(leader) => leader,
            None => {
                warn!("Join response without a leader. Ignoring it");
                return false;
            }
        };

        info!("Setting up new neighbours. New leader node ID: {}", leader.node_id);
        let mut node = self.protected_node.lock();
        node.address_book.replace_topology(response.known_addresses, Some(leader));
        true
    }

    /// Admits a new member and spreads the grown topology to everybody else.
    pub fn handle_join(&self, request: JoinRequest) -> JoinResponse {
        let joining = request.address();

        let (response, members, targets) = {
            let mut node = self.protected_node.lock();
            if let Some(reason) = join_rejection_reason(&node, &joining) {
                warn!("Node {} rejected join of {}: {}", node.id(), joining, reason);
                return JoinResponse::rejected();
            }
            if !node.address_book.add(joining.clone()) {
                return JoinResponse::rejected();
            }

            let response = JoinResponse {
                ack: true,
                leader: Some(node.address_book.leader().clone()),
                known_addresses: node.address_book.snapshot(joining.node_id),
            };
            let targets: Vec<Address> = node
                .address_book
                .known_addresses()
                .into_iter()
                .filter(|address| address.node_id != joining.node_id)
                .collect();
            (response, node.address_book.members(), targets)
        };

        info!("Node {} joined the topology", joining.node_id);
        self.spawn_propagation(members, targets);

        response
    }

    /// Replaces the membership with the received set.
    pub fn handle_update_topology(&self, request: UpdateTopologyRequest) -> Acknowledgement {
        let mut node = self.protected_node.lock();
        info!(
            "Node {} received update topology request, leader {}",
            node.id(),
            node.address_book.leader().node_id
        );

        node.address_book.replace_topology(request.known_addresses, None);

        Acknowledgement::new(true)
    }

    /// Notifies the leader (or, as leader, every member) and marks the node quitting.
    /// Returns whether every notified node acknowledged.
    pub fn quit_topology(&self) -> bool {
        let (node_id, targets) = {
            let mut node = self.protected_node.lock();
            node.begin_quit();
            let targets = if node.is_leader() {
                node.address_book.known_addresses()
            } else {
                vec![node.address_book.leader().clone()]
            };
            (node.id(), targets)
        };

        if targets.is_empty() {
            info!("Node {} is the last member. Quitting the topology", node_id);
            return true;
        }

        info!(
            "Node {} quits the topology, notifying {:?}",
            node_id,
            targets.iter().map(|a| a.node_id).collect::<Vec<_>>()
        );

        let request = QuitTopologyRequest { sender_id: node_id };
        let responses = self.fan_out.request_peers(request, targets, |peer, req| {
            self.peer_communicator.quit_topology(peer, req)
        });

        let mut acknowledged = true;
        for (peer, response) in responses {
            match response {
                Ok(resp) if resp.ack => info!("Node {} knows node {} is quitting", peer.node_id, node_id),
                Ok(_) => {
                    error!("Node {} responded with false ack to quit request", peer.node_id);
                    acknowledged = false;
                }
                Err(err) => {
                    error!("Error while quitting the topology through node {}: {}", peer.node_id, err);
                    acknowledged = false;
                }
            }
        }

        acknowledged
    }

    /// Removes a departing member. Losing the leader starts an election.
    pub fn handle_quit(&self, request: QuitTopologyRequest) -> Acknowledgement {
        let sender_id = request.sender_id;

        let (was_leader, is_leader, members, remaining) = {
            let mut node = self.protected_node.lock();
            if !node.address_book.contains(sender_id) {
                warn!("Node {} received quit request from unknown node {}", node.id(), sender_id);
                return Acknowledgement::new(false);
            }

            let eviction = match node.address_book.evict(sender_id) {
                Some(eviction) => eviction,
                None => return Acknowledgement::new(false),
            };
            info!("Node {} removed quitting node {}", node.id(), sender_id);
            (
                eviction.was_leader,
                node.is_leader(),
                node.address_book.members(),
                node.address_book.known_addresses(),
            )
        };

        if was_leader {
            let election = self.election.clone();
            thread::spawn(move || election.initiate_election());
        } else if is_leader {
            self.spawn_propagation(members, remaining);
        }

        Acknowledgement::new(true)
    }

    /// Propagates on its own thread; members the update cannot reach get a health check.
    fn spawn_propagation(&self, members: Vec<Address>, targets: Vec<Address>) {
        if targets.is_empty() {
            return;
        }
        let propagator = self.propagator.clone();
        let failure_detector = self.failure_detector.clone();
        thread::spawn(move || {
            let unreachable = propagator.propagate(members, targets);
            failure_detector.spawn_health_checks(unreachable);
        });
    }
}

fn join_rejection_reason(node: &NodeState, joining: &Address) -> Option<&'static str> {
    if node.is_quitting() {
        return Some("node is quitting");
    }
    if node.id() < 0 {
        return Some("own id is invalid");
    }
    if joining.node_id == node.id() {
        return Some("sender has the same id");
    }
    if !joining.is_valid() {
        return Some("invalid address");
    }
    if node.address_book.contains(joining.node_id) {
        return Some("sender is already a member");
    }
    None
}
