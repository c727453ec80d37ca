use crossbeam_channel::{Receiver, Sender};

use crate::address_book::{Address, NodeId};
use crate::errors::BullyError;

#[cfg(test)]
pub(crate) mod mock;

/// Membership admission request.
#[derive(Clone, Debug, Eq, PartialEq, Hash, Display)]
#[display(fmt = "Join request: hostname {} port {} node_id {}", hostname, port, node_id)]
pub struct JoinRequest {
    pub hostname: String,
    pub port: i32,
    pub node_id: NodeId,
}

impl JoinRequest {
    pub fn address(&self) -> Address {
        Address::new(self.hostname.clone(), self.port, self.node_id)
    }
}

impl From<&Address> for JoinRequest {
    fn from(address: &Address) -> Self {
        JoinRequest {
            hostname: address.hostname.clone(),
            port: address.port,
            node_id: address.node_id,
        }
    }
}

/// Join answer. `leader` is empty on rejection.
#[derive(Clone, Debug, Eq, PartialEq, Hash, Display)]
#[display(fmt = "Join response: ack {} leader {:?} known {}", ack, "leader.as_ref().map(|l| l.node_id)", "known_addresses.len()")]
pub struct JoinResponse {
    pub ack: bool,
    pub leader: Option<Address>,
    pub known_addresses: Vec<Address>,
}

impl JoinResponse {
    pub fn rejected() -> JoinResponse {
        JoinResponse {
            ack: false,
            leader: None,
            known_addresses: Vec::new(),
        }
    }
}

/// Application message, relayed through the leader.
#[derive(Clone, Debug, Eq, PartialEq, Hash, Display)]
#[display(fmt = "Message from {} to {}: '{}'", sender_id, receiver_id, payload)]
pub struct MessageRequest {
    pub sender_id: NodeId,
    pub receiver_id: NodeId,
    pub payload: String,
}

/// Bully contest probe.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash, Display)]
#[display(fmt = "Election request: candidate {}", candidate_id)]
pub struct ElectionRequest {
    pub candidate_id: NodeId,
}

#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash, Display)]
#[display(fmt = "Leader announcement: leader {}", leader_id)]
pub struct LeaderAnnouncementRequest {
    pub leader_id: NodeId,
}

/// Liveness probe.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash, Display)]
#[display(fmt = "Alive request: sender {}", sender_id)]
pub struct AliveRequest {
    pub sender_id: NodeId,
}

/// Full membership set, applied by the receiver as a replacement.
#[derive(Clone, Debug, Eq, PartialEq, Hash, Display)]
#[display(fmt = "Update topology: {} addresses", "known_addresses.len()")]
pub struct UpdateTopologyRequest {
    pub known_addresses: Vec<Address>,
}

/// Graceful departure notice.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash, Display)]
#[display(fmt = "Quit topology: sender {}", sender_id)]
pub struct QuitTopologyRequest {
    pub sender_id: NodeId,
}

/// Response of every RPC except Join.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash, Default, Display)]
#[display(fmt = "ack {}", ack)]
pub struct Acknowledgement {
    pub ack: bool,
}

impl Acknowledgement {
    pub fn new(ack: bool) -> Acknowledgement {
        Acknowledgement { ack }
    }
}

/// Inbound request paired with the channel its answer goes to.
#[derive(Debug)]
pub struct RequestEnvelope<Request, Response> {
    pub request: Request,
    response_tx: Sender<Response>,
}

impl<Request, Response> RequestEnvelope<Request, Response> {
    /// Creates the envelope and the receiver the caller waits on.
    pub fn new(request: Request) -> (RequestEnvelope<Request, Response>, Receiver<Response>) {
        let (response_tx, response_rx) = crossbeam_channel::bounded(1);

        (RequestEnvelope { request, response_tx }, response_rx)
    }

    /// Computes the answer and sends it back. The caller may have given up already.
    pub fn respond<F>(self, handler: F)
    where
        F: FnOnce(Request) -> Response,
    {
        let response = handler(self.request);
        if self.response_tx.send(response).is_err() {
            trace!("Response dropped: caller is gone");
        }
    }
}

/// Every inbound RPC a node serves.
#[derive(Debug)]
pub enum PeerRequest {
    Join(RequestEnvelope<JoinRequest, JoinResponse>),
    SendMessage(RequestEnvelope<MessageRequest, Acknowledgement>),
    StartElection(RequestEnvelope<ElectionRequest, Acknowledgement>),
    AnnounceLeader(RequestEnvelope<LeaderAnnouncementRequest, Acknowledgement>),
    IsAlive(RequestEnvelope<AliveRequest, Acknowledgement>),
    UpdateTopology(RequestEnvelope<UpdateTopologyRequest, Acknowledgement>),
    QuitTopology(RequestEnvelope<QuitTopologyRequest, Acknowledgement>),
}

/// Outbound side of the peer RPC contract. Every call is deadline-bounded.
pub trait PeerRequestHandler: Clone + Sync + Send + 'static {
    fn join(&self, destination: &Address, request: JoinRequest) -> Result<JoinResponse, BullyError>;

    fn send_message(
        &self,
        destination: &Address,
        request: MessageRequest,
    ) -> Result<Acknowledgement, BullyError>;

    fn start_election(
        &self,
        destination: &Address,
        request: ElectionRequest,
    ) -> Result<Acknowledgement, BullyError>;

    fn announce_leader(
        &self,
        destination: &Address,
        request: LeaderAnnouncementRequest,
    ) -> Result<Acknowledgement, BullyError>;

    fn is_alive(&self, destination: &Address, request: AliveRequest) -> Result<Acknowledgement, BullyError>;

    fn update_topology(
        &self,
        destination: &Address,
        request: UpdateTopologyRequest,
    ) -> Result<Acknowledgement, BullyError>;

    fn quit_topology(
        &self,
        destination: &Address,
        request: QuitTopologyRequest,
    ) -> Result<Acknowledgement, BullyError>;
}

/// Inbound side of the peer RPC contract.
pub trait PeerRequestChannels: Send + Clone + 'static {
    /// Returns receiver channel for the requests addressed to the node.
    fn peer_request_rx(&self, node_id: NodeId) -> Receiver<PeerRequest>;
}
