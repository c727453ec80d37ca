use crossbeam_channel::{Receiver, RecvTimeoutError, Sender};
use std::time::Duration;

use bully::{unreachable_err, BullyError, NodeId, PeerRequest, RequestEnvelope};

/// Request channel of one node: callers push enveloped requests, the node's
/// dispatcher pulls them and answers on the envelope.
#[derive(Clone, Debug)]
pub struct RequestChannel {
    node_id: NodeId,
    timeout_duration: Duration,
    request_tx: Sender<PeerRequest>,
    request_rx: Receiver<PeerRequest>,
}

impl RequestChannel {
    /// Rendezvous channel: a send succeeds only while the node's dispatcher is receiving.
    pub fn new(node_id: NodeId, timeout_duration: Duration) -> RequestChannel {
        let (request_tx, request_rx) = crossbeam_channel::bounded(0);

        RequestChannel {
            node_id,
            timeout_duration,
            request_tx,
            request_rx,
        }
    }

    pub fn request_rx(&self) -> Receiver<PeerRequest> {
        self.request_rx.clone()
    }

    /// Sends the request and waits for the answer, both within the channel timeout.
    pub fn send_request<Request, Response, Wrap>(&self, request: Request, wrap: Wrap) -> Result<Response, BullyError>
    where
        Wrap: FnOnce(RequestEnvelope<Request, Response>) -> PeerRequest,
    {
        let (envelope, response_rx) = RequestEnvelope::new(request);

        if let Err(err) = self.request_tx.send_timeout(wrap(envelope), self.timeout_duration) {
            return unreachable_err(self.node_id, format!("Cannot send request: {}", err));
        }

        match response_rx.recv_timeout(self.timeout_duration) {
            Ok(response) => Ok(response),
            Err(RecvTimeoutError::Timeout) => Err(BullyError::DeadlineExceeded(self.node_id)),
            Err(RecvTimeoutError::Disconnected) => {
                unreachable_err(self.node_id, "Request dropped without response".to_string())
            }
        }
    }
}
