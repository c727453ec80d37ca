use crossbeam_channel::Sender;

use crate::address_book::{Address, NodeId};
use crate::common::ShutdownSignal;
use crate::communication::peers::{Acknowledgement, MessageRequest, PeerRequestHandler};
use crate::errors::Result;
use crate::failure_detector::FailureDetector;
use crate::node::configuration::NodeLimits;
use crate::node::state::ProtectedNode;


/// Leader-mediated application messaging.
#[derive(Clone, Debug)]
pub struct MessageRouter<Pc: PeerRequestHandler> {
    protected_node: ProtectedNode,
    peer_communicator: Pc,
    failure_detector: FailureDetector<Pc>,
    shutdown: ShutdownSignal,
    limits: NodeLimits,
    delivered_tx: Sender<MessageRequest>,
}

enum Route {
    Local(MessageRequest),
    Remote(Address, MessageRequest),
}

impl<Pc: PeerRequestHandler> MessageRouter<Pc> {
    pub fn new(
        protected_node: ProtectedNode,
        peer_communicator: Pc,
        failure_detector: FailureDetector<Pc>,
        shutdown: ShutdownSignal,
        limits: NodeLimits,
        delivered_tx: Sender<MessageRequest>,
    ) -> MessageRouter<Pc> {
        MessageRouter {
            protected_node,
            peer_communicator,
            failure_detector,
            shutdown,
            limits,
            delivered_tx,
        }
    }

    /// Sends `payload` to `target_id`, directly when leading and through the leader
    /// otherwise. Returns whether the message was acknowledged.
    pub fn send_message(&self, target_id: NodeId, payload: String) -> Result<bool> {
        let route = {
            let node = self.protected_node.lock();
            let node_id = node.id();
            if target_id != node_id {
                node.address_book.get(target_id)?;
            }

            let request = MessageRequest {
                sender_id: node_id,
                receiver_id: target_id,
                payload,
            };
            if !node.is_leader() {
                Route::Remote(node.address_book.leader().clone(), request)
            } else if target_id == node_id {
                Route::Local(request)
            } else {
                Route::Remote(node.address_book.get(target_id)?, request)
            }
        };

        match route {
            Route::Local(request) => {
                self.consume(request);
                Ok(true)
            }
            Route::Remote(destination, request) => Ok(self.deliver_with_retries(&destination, request)),
        }
    }

    /// Inbound message: consumed when addressed here, forwarded once when leading.
    pub fn handle_message(&self, request: MessageRequest) -> Acknowledgement {
        let receiver = {
            let node = self.protected_node.lock();
            if request.receiver_id == node.id() {
                None
            } else if !node.is_leader() {
                warn!(
                    "Node {} is not the leader. Dropping message for node {}",
                    node.id(),
                    request.receiver_id
                );
                return Acknowledgement::new(false);
            } else {
                match node.address_book.get(request.receiver_id) {
                    Ok(receiver) => Some(receiver),
                    Err(err) => {
                        warn!("Cannot distribute message: {}", err);
                        return Acknowledgement::new(false);
                    }
                }
            }
        };

        match receiver {
            None => {
                self.consume(request);
                Acknowledgement::new(true)
            }
            Some(receiver) => Acknowledgement::new(self.distribute(&receiver, request)),
        }
    }

    fn distribute(&self, receiver: &Address, request: MessageRequest) -> bool {
        info!(
            "Forwarding message from node {} to node {}",
            request.sender_id, receiver.node_id
        );

        match self.peer_communicator.send_message(receiver, request) {
            Ok(resp) => resp.ack,
            Err(err) => {
                error!("Failed to forward message to node {}: {}", receiver.node_id, err);
                self.failure_detector.spawn_health_checks(vec![receiver.node_id]);
                false
            }
        }
    }

    fn deliver_with_retries(&self, destination: &Address, request: MessageRequest) -> bool {
        let attempts = self.limits.max_retries.max(1);
        for attempt in 1..=attempts {
            match self.peer_communicator.send_message(destination, request.clone()) {
                Ok(resp) if resp.ack => {
                    info!("Message to node {} delivered through node {}", request.receiver_id, destination.node_id);
                    return true;
                }
                Ok(_) => {
                    warn!("Node {} refused message for node {}", destination.node_id, request.receiver_id);
                    return false;
                }
                Err(err) => error!(
                    "Message delivery to node {} failed, attempt {}/{}: {}",
                    destination.node_id, attempt, attempts, err
                ),
            }

            if attempt < attempts && !self.shutdown.wait(self.limits.retry_delay) {
                return false;
            }
        }

        self.failure_detector.check_node_health(destination.node_id);
        false
    }

    fn consume(&self, request: MessageRequest) {
        info!("Received message from node {}: '{}'", request.sender_id, request.payload);
        if self.delivered_tx.send(request).is_err() {
            trace!("Nobody listens for delivered messages");
        }
    }
}
