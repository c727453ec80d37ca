use crossbeam_channel::Receiver;
use parking_lot::RwLock;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use std::time::Duration;

use bully::{
    unreachable_err, Acknowledgement, Address, AliveRequest, BullyError, ElectionRequest, JoinRequest,
    JoinResponse, LeaderAnnouncementRequest, MessageRequest, NodeId, PeerRequest, PeerRequestChannels,
    PeerRequestHandler, QuitTopologyRequest, UpdateTopologyRequest,
};

use crate::communication::request_channel::RequestChannel;

/// In-memory implementation of the PeerRequestHandler and PeerRequestChannels traits.
/// All nodes of a process share one instance.
#[derive(Clone, Debug)]
pub struct InProcPeerCommunicator {
    timeout: Duration,
    channels: Arc<RwLock<HashMap<NodeId, RequestChannel>>>,
    disconnected: Arc<RwLock<HashSet<NodeId>>>,
}

impl InProcPeerCommunicator {
    /// Creates new instance with the communication timeout of every call.
    pub fn new(timeout: Duration) -> InProcPeerCommunicator {
        InProcPeerCommunicator {
            timeout,
            channels: Arc::new(RwLock::new(HashMap::new())),
            disconnected: Arc::new(RwLock::new(HashSet::new())),
        }
    }

    /// Makes every call to the node fail at once, as for a crashed process.
    pub fn disconnect(&self, node_id: NodeId) {
        info!("Node {} disconnected", node_id);
        self.disconnected.write().insert(node_id);
    }

    fn channel(&self, node_id: NodeId) -> RequestChannel {
        if let Some(channel) = self.channels.read().get(&node_id) {
            return channel.clone();
        }

        self.channels
            .write()
            .entry(node_id)
            .or_insert_with(|| RequestChannel::new(node_id, self.timeout))
            .clone()
    }

    fn send<Request, Response, Wrap>(
        &self,
        destination: &Address,
        request: Request,
        wrap: Wrap,
    ) -> Result<Response, BullyError>
    where
        Request: std::fmt::Display,
        Response: std::fmt::Debug,
        Wrap: FnOnce(bully::RequestEnvelope<Request, Response>) -> PeerRequest,
    {
        trace!("Destination Node {} Sending request {}", destination.node_id, request);

        if self.disconnected.read().contains(&destination.node_id) {
            return unreachable_err(destination.node_id, "node is disconnected".to_string());
        }

        let resp = self.channel(destination.node_id).send_request(request, wrap);

        trace!("Destination Node {} Response {:?}", destination.node_id, resp);

        resp
    }
}

impl PeerRequestHandler for InProcPeerCommunicator {
    fn join(&self, destination: &Address, request: JoinRequest) -> Result<JoinResponse, BullyError> {
        self.send(destination, request, PeerRequest::Join)
    }

    fn send_message(
        &self,
        destination: &Address,
        request: MessageRequest,
    ) -> Result<Acknowledgement, BullyError> {
        self.send(destination, request, PeerRequest::SendMessage)
    }

    fn start_election(
        &self,
        destination: &Address,
        request: ElectionRequest,
    ) -> Result<Acknowledgement, BullyError> {
        self.send(destination, request, PeerRequest::StartElection)
    }

    fn announce_leader(
        &self,
        destination: &Address,
        request: LeaderAnnouncementRequest,
    ) -> Result<Acknowledgement, BullyError> {
        self.send(destination, request, PeerRequest::AnnounceLeader)
    }

    fn is_alive(&self, destination: &Address, request: AliveRequest) -> Result<Acknowledgement, BullyError> {
        self.send(destination, request, PeerRequest::IsAlive)
    }

    fn update_topology(
        &self,
        destination: &Address,
        request: UpdateTopologyRequest,
    ) -> Result<Acknowledgement, BullyError> {
        self.send(destination, request, PeerRequest::UpdateTopology)
    }

    fn quit_topology(
        &self,
        destination: &Address,
        request: QuitTopologyRequest,
    ) -> Result<Acknowledgement, BullyError> {
        self.send(destination, request, PeerRequest::QuitTopology)
    }
}

impl PeerRequestChannels for InProcPeerCommunicator {
    fn peer_request_rx(&self, node_id: NodeId) -> Receiver<PeerRequest> {
        self.channel(node_id).request_rx()
    }
}
