use crossbeam_channel::{Receiver, Sender};

use crate::address_book::NodeId;
use crate::common::{run_worker, shutdown_channel, PeerFanOut, ShutdownSignal, ShutdownTrigger, Worker};
use crate::communication::peers::{MessageRequest, PeerRequestChannels, PeerRequestHandler};
use crate::errors::{BullyError, Result};
use crate::failure_detector::FailureDetector;
use crate::leadership::ElectionCoordinator;
use crate::membership::{MembershipProtocol, TopologyPropagator};
use crate::messaging::MessageRouter;
use crate::request_handler::peer::{process_peer_requests, PeerRequestHandlerParams};

use configuration::{BootstrapConfiguration, NodeConfiguration, NodeLimits};
use state::{NodeState, NodeStatusReport, ProtectedNode};

pub mod configuration;
pub mod state;

/// The protocol services of one node, sharing its protected state.
#[derive(Clone, Debug)]
pub struct NodeServices<Pc: PeerRequestHandler> {
    pub election: ElectionCoordinator<Pc>,
    pub membership: MembershipProtocol<Pc>,
    pub failure_detector: FailureDetector<Pc>,
    pub router: MessageRouter<Pc>,
}

impl<Pc: PeerRequestHandler> NodeServices<Pc> {
    pub fn new(
        protected_node: ProtectedNode,
        peer_communicator: Pc,
        fan_out: PeerFanOut,
        bootstrap: BootstrapConfiguration,
        limits: NodeLimits,
        shutdown: ShutdownSignal,
        delivered_tx: Sender<MessageRequest>,
    ) -> NodeServices<Pc> {
        let election = ElectionCoordinator::new(
            protected_node.clone(),
            peer_communicator.clone(),
            fan_out.clone(),
            bootstrap.clone(),
        );
        let propagator = TopologyPropagator::new(peer_communicator.clone(), fan_out.clone());
        let failure_detector = FailureDetector::new(
            protected_node.clone(),
            peer_communicator.clone(),
            election.clone(),
            propagator.clone(),
            shutdown.clone(),
            limits,
        );
        let membership = MembershipProtocol::new(
            protected_node.clone(),
            peer_communicator.clone(),
            election.clone(),
            propagator,
            failure_detector.clone(),
            fan_out,
            bootstrap,
        );
        let router = MessageRouter::new(
            protected_node,
            peer_communicator,
            failure_detector.clone(),
            shutdown,
            limits,
            delivered_tx,
        );

        NodeServices {
            election,
            membership,
            failure_detector,
            router,
        }
    }
}

/// Handle of a running node. Dropping it stops the node without notifying peers.
#[derive(Debug)]
pub struct BullyNode<Pc: PeerRequestHandler> {
    node_id: NodeId,
    protected_node: ProtectedNode,
    services: NodeServices<Pc>,
    delivered_rx: Receiver<MessageRequest>,
    worker: Option<Worker>,
    shutdown_trigger: Option<ShutdownTrigger>,
}

pub fn start<Pc>(config: NodeConfiguration<Pc>) -> Result<BullyNode<Pc>>
where
    Pc: PeerRequestHandler + PeerRequestChannels,
{
    if !config.address.is_valid() {
        return Err(BullyError::InvalidRequest(format!("invalid own address {}", config.address)));
    }
    let node_id = config.address.node_id;

    let protected_node = NodeState::new(config.address.clone()).protect();
    let fan_out = PeerFanOut::new(node_id, config.limits.fan_out_parallelism)?;
    let (shutdown_trigger, shutdown) = shutdown_channel();
    let (delivered_tx, delivered_rx) = crossbeam_channel::unbounded();

    let services = NodeServices::new(
        protected_node.clone(),
        config.peer_communicator.clone(),
        fan_out,
        config.bootstrap.clone(),
        config.limits,
        shutdown,
        delivered_tx,
    );

    let worker = run_worker(
        process_peer_requests,
        PeerRequestHandlerParams {
            node_id,
            peer_request_rx: config.peer_communicator.peer_request_rx(node_id),
            services: services.clone(),
        },
    );

    info!("Node {} started at {}", node_id, config.address);
    services.membership.join_topology();

    Ok(BullyNode {
        node_id,
        protected_node,
        services,
        delivered_rx,
        worker: Some(worker),
        shutdown_trigger: Some(shutdown_trigger),
    })
}

impl<Pc: PeerRequestHandler> BullyNode<Pc> {
    pub fn id(&self) -> NodeId {
        self.node_id
    }

    pub fn status(&self) -> NodeStatusReport {
        self.protected_node.lock().report()
    }

    pub fn is_leader(&self) -> bool {
        self.protected_node.lock().is_leader()
    }

    /// Returns `Ok(false)` when delivery failed after retries, and
    /// `NodeNotFound` for ids outside the topology.
    pub fn send_message(&self, target_id: NodeId, payload: impl Into<String>) -> Result<bool> {
        self.services.router.send_message(target_id, payload.into())
    }

    pub fn initiate_election(&self) -> bool {
        self.services.election.initiate_election()
    }

    /// Messages consumed by this node.
    pub fn delivered_messages(&self) -> Receiver<MessageRequest> {
        self.delivered_rx.clone()
    }

    /// Leaves the topology gracefully and stops. Returns whether the quit was acknowledged.
    pub fn quit(mut self) -> bool {
        let acknowledged = self.services.membership.quit_topology();
        self.shutdown();
        acknowledged
    }

    /// Stops serving without telling anybody.
    pub fn terminate(mut self) {
        self.shutdown();
    }

    fn shutdown(&mut self) {
        self.shutdown_trigger.take();
        if let Some(worker) = self.worker.take() {
            worker.terminate();
            info!("Node {} shut down", self.node_id);
        }
    }
}

impl<Pc: PeerRequestHandler> Drop for BullyNode<Pc> {
    fn drop(&mut self) {
        self.shutdown();
    }
}
