use parking_lot::Mutex;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use crate::address_book::{Address, NodeId};
use crate::communication::peers::{
    Acknowledgement, AliveRequest, ElectionRequest, JoinRequest, JoinResponse,
    LeaderAnnouncementRequest, MessageRequest, PeerRequestHandler, QuitTopologyRequest,
    UpdateTopologyRequest,
};
use crate::errors::BullyError;

#[derive(Clone, Debug, Eq, PartialEq)]
pub enum MockCall {
    Join(NodeId),
    SendMessage(NodeId, MessageRequest),
    StartElection(NodeId, NodeId),
    AnnounceLeader(NodeId, NodeId),
    IsAlive(NodeId),
    UpdateTopology(NodeId, Vec<NodeId>),
    QuitTopology(NodeId, NodeId),
}

#[derive(Debug, Default)]
struct MockState {
    unreachable: HashSet<NodeId>,
    election_acks: HashMap<NodeId, bool>,
    message_acks: HashMap<NodeId, bool>,
    alive_failures: HashMap<NodeId, usize>,
    join_responses: HashMap<NodeId, JoinResponse>,
    calls: Vec<MockCall>,
}

/// Scripted peer communicator recording every outbound call.
#[derive(Clone, Debug, Default)]
pub struct MockPeerCommunicator {
    state: Arc<Mutex<MockState>>,
}

impl MockPeerCommunicator {
    pub fn new() -> MockPeerCommunicator {
        MockPeerCommunicator::default()
    }

    pub fn set_unreachable(&self, node_id: NodeId) {
        self.state.lock().unreachable.insert(node_id);
    }

    pub fn set_election_ack(&self, node_id: NodeId, ack: bool) {
        self.state.lock().election_acks.insert(node_id, ack);
    }

    pub fn set_message_ack(&self, node_id: NodeId, ack: bool) {
        self.state.lock().message_acks.insert(node_id, ack);
    }

    /// The first `failures` liveness probes to the node fail.
    pub fn set_alive_failures(&self, node_id: NodeId, failures: usize) {
        self.state.lock().alive_failures.insert(node_id, failures);
    }

    pub fn set_join_response(&self, node_id: NodeId, response: JoinResponse) {
        self.state.lock().join_responses.insert(node_id, response);
    }

    pub fn calls(&self) -> Vec<MockCall> {
        self.state.lock().calls.clone()
    }

    pub fn count_calls<F>(&self, predicate: F) -> usize
    where
        F: Fn(&MockCall) -> bool,
    {
        self.state.lock().calls.iter().filter(|call| predicate(call)).count()
    }

    fn record(&self, destination: &Address, call: MockCall) -> Result<(), BullyError> {
        let mut state = self.state.lock();
        state.calls.push(call);
        if state.unreachable.contains(&destination.node_id) {
            return Err(BullyError::Unreachable {
                node_id: destination.node_id,
                cause: "mock".to_string(),
            });
        }
        Ok(())
    }
}

impl PeerRequestHandler for MockPeerCommunicator {
    fn join(&self, destination: &Address, _request: JoinRequest) -> Result<JoinResponse, BullyError> {
        self.record(destination, MockCall::Join(destination.node_id))?;

        let state = self.state.lock();
        Ok(state
            .join_responses
            .get(&destination.node_id)
            .cloned()
            .unwrap_or_else(JoinResponse::rejected))
    }

    fn send_message(
        &self,
        destination: &Address,
        request: MessageRequest,
    ) -> Result<Acknowledgement, BullyError> {
        self.record(destination, MockCall::SendMessage(destination.node_id, request))?;

        let state = self.state.lock();
        let ack = state.message_acks.get(&destination.node_id).cloned().unwrap_or(true);
        Ok(Acknowledgement::new(ack))
    }

    fn start_election(
        &self,
        destination: &Address,
        request: ElectionRequest,
    ) -> Result<Acknowledgement, BullyError> {
        self.record(
            destination,
            MockCall::StartElection(destination.node_id, request.candidate_id),
        )?;

        let state = self.state.lock();
        let ack = state.election_acks.get(&destination.node_id).cloned().unwrap_or(false);
        Ok(Acknowledgement::new(ack))
    }

    fn announce_leader(
        &self,
        destination: &Address,
        request: LeaderAnnouncementRequest,
    ) -> Result<Acknowledgement, BullyError> {
        self.record(
            destination,
            MockCall::AnnounceLeader(destination.node_id, request.leader_id),
        )?;

        Ok(Acknowledgement::new(true))
    }

    fn is_alive(&self, destination: &Address, _request: AliveRequest) -> Result<Acknowledgement, BullyError> {
        self.record(destination, MockCall::IsAlive(destination.node_id))?;

        let mut state = self.state.lock();
        if let Some(failures) = state.alive_failures.get_mut(&destination.node_id) {
            if *failures > 0 {
                *failures -= 1;
                return Err(BullyError::DeadlineExceeded(destination.node_id));
            }
        }
        Ok(Acknowledgement::new(true))
    }

    fn update_topology(
        &self,
        destination: &Address,
        request: UpdateTopologyRequest,
    ) -> Result<Acknowledgement, BullyError> {
        let mut ids: Vec<NodeId> = request.known_addresses.iter().map(|a| a.node_id).collect();
        ids.sort_unstable();
        self.record(destination, MockCall::UpdateTopology(destination.node_id, ids))?;

        Ok(Acknowledgement::new(true))
    }

    fn quit_topology(
        &self,
        destination: &Address,
        request: QuitTopologyRequest,
    ) -> Result<Acknowledgement, BullyError> {
        self.record(
            destination,
            MockCall::QuitTopology(destination.node_id, request.sender_id),
        )?;

        Ok(Acknowledgement::new(true))
    }
}

/// Polls `condition` until it holds or a few seconds pass.
pub fn wait_until<F: Fn() -> bool>(condition: F) -> bool {
    let deadline = std::time::Instant::now() + std::time::Duration::from_secs(5);
    while std::time::Instant::now() < deadline {
        if condition() {
            return true;
        }
        std::thread::sleep(std::time::Duration::from_millis(10));
    }
    condition()
}
