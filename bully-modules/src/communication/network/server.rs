use std::io::{BufRead, BufReader, Write};
use std::net::{TcpListener, TcpStream};
use std::thread;

use bully::{
    AliveRequest, BullyError, ElectionRequest, JoinRequest, LeaderAnnouncementRequest, MessageRequest,
    PeerRequest, QuitTopologyRequest,
};

use crate::communication::network::wire::{update_topology_request, WireRequest, WireResponse};
use crate::communication::request_channel::RequestChannel;

/// Accepts peer connections, one thread per connection.
pub fn run_server(listener: TcpListener, channel: RequestChannel) {
    match listener.local_addr() {
        Ok(addr) => info!("Network peer communicator: listening on {:?}", addr),
        Err(err) => warn!("Network peer communicator: unknown listen address: {}", err),
    }

    for stream in listener.incoming() {
        match stream {
            Ok(stream) => {
                let channel = channel.clone();
                thread::spawn(move || {
                    if let Err(err) = handle_connection(stream, channel) {
                        debug!("Peer connection closed with error: {}", err);
                    }
                });
            }
            Err(err) => error!("Accept error: {}", err),
        }
    }
}

fn handle_connection(stream: TcpStream, channel: RequestChannel) -> std::io::Result<()> {
    stream.set_nodelay(true)?;
    let mut writer = stream.try_clone()?;
    let reader = BufReader::new(stream);

    for line in reader.lines() {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }

        let response = match serde_json::from_str::<WireRequest>(&line) {
            Ok(request) => {
                trace!("Peer request {:?}", request);
                dispatch(request, &channel)
            }
            Err(err) => WireResponse::Error {
                message: format!("Failed to parse request: {}", err),
            },
        };

        let json = serde_json::to_string(&response)
            .map_err(|err| std::io::Error::new(std::io::ErrorKind::InvalidData, err))?;
        writer.write_all(format!("{}\n", json).as_bytes())?;
        writer.flush()?;
    }

    Ok(())
}

fn dispatch(request: WireRequest, channel: &RequestChannel) -> WireResponse {
    let result: Result<WireResponse, BullyError> = match request {
        WireRequest::Join {
            hostname,
            port,
            node_id,
        } => channel
            .send_request(JoinRequest { hostname, port, node_id }, PeerRequest::Join)
            .map(WireResponse::from),
        WireRequest::SendMessage {
            sender_id,
            receiver_id,
            payload,
        } => channel
            .send_request(
                MessageRequest {
                    sender_id,
                    receiver_id,
                    payload,
                },
                PeerRequest::SendMessage,
            )
            .map(WireResponse::from),
        WireRequest::StartElection { candidate_id } => channel
            .send_request(ElectionRequest { candidate_id }, PeerRequest::StartElection)
            .map(WireResponse::from),
        WireRequest::AnnounceLeader { leader_id } => channel
            .send_request(LeaderAnnouncementRequest { leader_id }, PeerRequest::AnnounceLeader)
            .map(WireResponse::from),
        WireRequest::IsAlive { sender_id } => channel
            .send_request(AliveRequest { sender_id }, PeerRequest::IsAlive)
            .map(WireResponse::from),
        WireRequest::UpdateTopology { known_addresses } => channel
            .send_request(update_topology_request(known_addresses), PeerRequest::UpdateTopology)
            .map(WireResponse::from),
        WireRequest::QuitTopology { sender_id } => channel
            .send_request(QuitTopologyRequest { sender_id }, PeerRequest::QuitTopology)
            .map(WireResponse::from),
    };

    result.unwrap_or_else(|err| WireResponse::Error {
        message: err.to_string(),
    })
}
