use crossbeam_channel::Receiver;
use std::thread;

use crate::address_book::NodeId;
use crate::communication::peers::{PeerRequest, PeerRequestHandler};
use crate::node::NodeServices;

pub struct PeerRequestHandlerParams<Pc: PeerRequestHandler> {
    pub node_id: NodeId,
    pub peer_request_rx: Receiver<PeerRequest>,
    pub services: NodeServices<Pc>,
}

/// Serves inbound peer requests until terminated, one thread per request.
pub fn process_peer_requests<Pc: PeerRequestHandler>(
    params: PeerRequestHandlerParams<Pc>,
    terminate_worker_rx: Receiver<()>,
) {
    let node_id = params.node_id;
    info!("Node {} starts serving peer requests", node_id);

    loop {
        select!(
            recv(terminate_worker_rx) -> _ => {
                info!("Node {} stops serving peer requests", node_id);
                return;
            },
            recv(params.peer_request_rx) -> res => {
                match res {
                    Ok(request) => {
                        let services = params.services.clone();
                        thread::spawn(move || handle_peer_request(node_id, request, &services));
                    }
                    Err(_) => {
                        warn!("Node {} peer request channel closed", node_id);
                        return;
                    }
                }
            }
        );
    }
}

fn handle_peer_request<Pc: PeerRequestHandler>(node_id: NodeId, request: PeerRequest, services: &NodeServices<Pc>) {
    match request {
        PeerRequest::Join(envelope) => {
            debug!("Node {} received {}", node_id, envelope.request);
            envelope.respond(|req| services.membership.handle_join(req));
        }
        PeerRequest::SendMessage(envelope) => {
            trace!("Node {} received {}", node_id, envelope.request);
            envelope.respond(|req| services.router.handle_message(req));
        }
        PeerRequest::StartElection(envelope) => {
            debug!("Node {} received {}", node_id, envelope.request);
            envelope.respond(|req| services.election.handle_election_probe(req));
        }
        PeerRequest::AnnounceLeader(envelope) => {
            debug!("Node {} received {}", node_id, envelope.request);
            envelope.respond(|req| services.election.handle_leader_announcement(req));
        }
        PeerRequest::IsAlive(envelope) => {
            trace!("Node {} received {}", node_id, envelope.request);
            envelope.respond(|req| services.failure_detector.handle_alive_request(req));
        }
        PeerRequest::UpdateTopology(envelope) => {
            debug!("Node {} received {}", node_id, envelope.request);
            envelope.respond(|req| services.membership.handle_update_topology(req));
        }
        PeerRequest::QuitTopology(envelope) => {
            debug!("Node {} received {}", node_id, envelope.request);
            envelope.respond(|req| services.membership.handle_quit(req));
        }
    }
}
