use parking_lot::Mutex;
use std::collections::HashSet;
use std::sync::Arc;
use std::thread;

use crate::address_book::NodeId;
use crate::common::ShutdownSignal;
use crate::communication::peers::{Acknowledgement, AliveRequest, PeerRequestHandler};
use crate::leadership::ElectionCoordinator;
use crate::membership::TopologyPropagator;
use crate::node::configuration::NodeLimits;
use crate::node::state::ProtectedNode;


/// Reactive liveness check, run after a failed call to a peer.
#[derive(Clone, Debug)]
pub struct FailureDetector<Pc: PeerRequestHandler> {
    protected_node: ProtectedNode,
    peer_communicator: Pc,
    election: ElectionCoordinator<Pc>,
    propagator: TopologyPropagator<Pc>,
    shutdown: ShutdownSignal,
    limits: NodeLimits,
    in_flight: Arc<Mutex<HashSet<NodeId>>>,
}

struct InFlightGuard {
    in_flight: Arc<Mutex<HashSet<NodeId>>>,
    target_id: NodeId,
}

impl Drop for InFlightGuard {
    fn drop(&mut self) {
        self.in_flight.lock().remove(&self.target_id);
    }
}

impl<Pc: PeerRequestHandler> FailureDetector<Pc> {
    pub fn new(
        protected_node: ProtectedNode,
        peer_communicator: Pc,
        election: ElectionCoordinator<Pc>,
        propagator: TopologyPropagator<Pc>,
        shutdown: ShutdownSignal,
        limits: NodeLimits,
    ) -> FailureDetector<Pc> {
        FailureDetector {
            protected_node,
            peer_communicator,
            election,
            propagator,
            shutdown,
            limits,
            in_flight: Arc::new(Mutex::new(HashSet::new())),
        }
    }

    /// Probes the target up to `max_retries` times.
    ///
    /// Returns false only when the target was declared dead (or was not a member).
    /// A check already running for the same target, or cancelled by shutdown,
    /// reports true.
    pub fn check_node_health(&self, target_id: NodeId) -> bool {
        let (node_id, target) = {
            let node = self.protected_node.lock();
            match node.address_book.get(target_id) {
                Ok(target) => (node.id(), target),
                Err(err) => {
                    debug!("Health check skipped: {}", err);
                    return false;
                }
            }
        };

        if !self.in_flight.lock().insert(target_id) {
            debug!("Health check of node {} is already running", target_id);
            return true;
        }
        let _guard = InFlightGuard {
            in_flight: self.in_flight.clone(),
            target_id,
        };

        let attempts = self.limits.max_retries.max(1);
        for attempt in 1..=attempts {
            match self
                .peer_communicator
                .is_alive(&target, AliveRequest { sender_id: node_id })
            {
                Ok(resp) if resp.ack => {
                    info!("Node {} is alive", target_id);
                    return true;
                }
                Ok(_) => warn!("Node {} answered the liveness probe with false ack", target_id),
                Err(err) => error!("Node {} health check {}/{} failed: {}", target_id, attempt, attempts, err),
            }

            if attempt < attempts && !self.shutdown.wait(self.limits.retry_delay) {
                debug!("Health check of node {} cancelled by shutdown", target_id);
                return true;
            }
        }

        error!("Node {} is down after {} attempts. Evicting it", target_id, attempts);
        self.evict(target_id);

        false
    }

    /// Checks every target on its own thread without waiting for the outcome.
    pub fn spawn_health_checks(&self, target_ids: Vec<NodeId>) {
        for target_id in target_ids {
            let detector = self.clone();
            thread::spawn(move || detector.check_node_health(target_id));
        }
    }

    pub fn handle_alive_request(&self, request: AliveRequest) -> Acknowledgement {
        trace!("Liveness probe from node {}", request.sender_id);

        Acknowledgement::new(true)
    }

    fn evict(&self, target_id: NodeId) {
        let eviction = self.protected_node.lock().address_book.evict(target_id);
        let eviction = match eviction {
            Some(eviction) => eviction,
            None => return,
        };

        if eviction.was_leader {
            info!("Dead node {} was the leader. Starting election", target_id);
            self.election.initiate_election();
        }

        let (is_leader, members, remaining) = {
            let node = self.protected_node.lock();
            (
                node.is_leader(),
                node.address_book.members(),
                node.address_book.known_addresses(),
            )
        };
        if is_leader {
            let unreachable = self.propagator.propagate(members, remaining);
            self.spawn_health_checks(unreachable);
        }
    }
}
