use crossbeam_channel::Receiver;
use std::convert::TryFrom;
use std::io::{BufRead, BufReader, ErrorKind, Write};
use std::net::{SocketAddr, TcpListener, TcpStream, ToSocketAddrs};
use std::thread;
use std::time::Duration;

use bully::{
    unreachable_err, Acknowledgement, Address, AliveRequest, BullyError, ElectionRequest, JoinRequest,
    JoinResponse, LeaderAnnouncementRequest, MessageRequest, NodeId, PeerRequest, PeerRequestChannels,
    PeerRequestHandler, QuitTopologyRequest, UpdateTopologyRequest,
};

use crate::communication::network::wire::{WireRequest, WireResponse};
use crate::communication::request_channel::RequestChannel;

/// TCP implementation of the peer RPC contract: one connection per call, one JSON
/// line each way.
#[derive(Clone, Debug)]
pub struct NetworkPeerCommunicator {
    node_id: NodeId,
    timeout: Duration,
    listen_address: Option<SocketAddr>,
    channel: RequestChannel,
}

impl NetworkPeerCommunicator {
    /// Binds `host` (`hostname:port`) and serves inbound calls when `run_server` is set.
    pub fn new(
        host: String,
        node_id: NodeId,
        timeout: Duration,
        run_server: bool,
    ) -> Result<NetworkPeerCommunicator, BullyError> {
        let channel = RequestChannel::new(node_id, timeout);

        let listen_address = if run_server {
            let listener = TcpListener::bind(&host)
                .map_err(|err| BullyError::Startup(format!("Failed to bind to {}: {}", host, err)))?;
            let listen_address = listener
                .local_addr()
                .map_err(|err| BullyError::Startup(err.to_string()))?;

            let server_channel = channel.clone();
            thread::spawn(move || super::server::run_server(listener, server_channel));
            Some(listen_address)
        } else {
            None
        };

        Ok(NetworkPeerCommunicator {
            node_id,
            timeout,
            listen_address,
            channel,
        })
    }

    pub fn listen_address(&self) -> Option<SocketAddr> {
        self.listen_address
    }

    fn call(&self, destination: &Address, request: WireRequest) -> Result<WireResponse, BullyError> {
        trace!(
            "Destination Node {}. Address ({}:{}). Request {:?}",
            destination.node_id,
            destination.hostname,
            destination.port,
            request
        );
        let node_id = destination.node_id;

        let port = match u16::try_from(destination.port) {
            Ok(port) => port,
            Err(_) => return unreachable_err(node_id, format!("Port {} is out of range", destination.port)),
        };
        let socket_address = (destination.hostname.as_str(), port)
            .to_socket_addrs()
            .ok()
            .and_then(|mut addresses| addresses.next());
        let socket_address = match socket_address {
            Some(socket_address) => socket_address,
            None => return unreachable_err(node_id, format!("Cannot resolve {}", destination)),
        };

        let stream = TcpStream::connect_timeout(&socket_address, self.timeout)
            .map_err(|err| io_error(node_id, err))?;
        stream
            .set_read_timeout(Some(self.timeout))
            .and_then(|_| stream.set_write_timeout(Some(self.timeout)))
            .map_err(|err| io_error(node_id, err))?;

        let json = serde_json::to_string(&request).map_err(|err| BullyError::InvalidRequest(err.to_string()))?;
        let mut writer = stream.try_clone().map_err(|err| io_error(node_id, err))?;
        writer
            .write_all(format!("{}\n", json).as_bytes())
            .and_then(|_| writer.flush())
            .map_err(|err| io_error(node_id, err))?;

        let mut line = String::new();
        let read = BufReader::new(stream)
            .read_line(&mut line)
            .map_err(|err| io_error(node_id, err))?;
        if read == 0 {
            return unreachable_err(node_id, "Connection closed without response".to_string());
        }

        let response: WireResponse = serde_json::from_str(&line)
            .or_else(|err| unreachable_err(node_id, format!("Failed to parse response: {}", err)))?;
        trace!("Destination Node {} Response {:?}", node_id, response);

        Ok(response)
    }

    fn acknowledged(&self, destination: &Address, request: WireRequest) -> Result<Acknowledgement, BullyError> {
        self.call(destination, request)?
            .into_acknowledgement()
            .or_else(|message| unreachable_err(destination.node_id, message))
    }
}

fn io_error(node_id: NodeId, err: std::io::Error) -> BullyError {
    match err.kind() {
        ErrorKind::TimedOut | ErrorKind::WouldBlock => BullyError::DeadlineExceeded(node_id),
        _ => BullyError::Unreachable {
            node_id,
            cause: err.to_string(),
        },
    }
}

impl PeerRequestChannels for NetworkPeerCommunicator {
    fn peer_request_rx(&self, node_id: NodeId) -> Receiver<PeerRequest> {
        if node_id != self.node_id {
            warn!("Network peer communicator of node {} serves node {}", self.node_id, node_id);
        }

        self.channel.request_rx()
    }
}

impl PeerRequestHandler for NetworkPeerCommunicator {
    fn join(&self, destination: &Address, request: JoinRequest) -> Result<JoinResponse, BullyError> {
        self.call(destination, WireRequest::from(request))?
            .into_join_response()
            .or_else(|message| unreachable_err(destination.node_id, message))
    }

    fn send_message(
        &self,
        destination: &Address,
        request: MessageRequest,
    ) -> Result<Acknowledgement, BullyError> {
        self.acknowledged(destination, WireRequest::from(request))
    }

    fn start_election(
        &self,
        destination: &Address,
        request: ElectionRequest,
    ) -> Result<Acknowledgement, BullyError> {
        self.acknowledged(destination, WireRequest::from(request))
    }

    fn announce_leader(
        &self,
        destination: &Address,
        request: LeaderAnnouncementRequest,
    ) -> Result<Acknowledgement, BullyError> {
        self.acknowledged(destination, WireRequest::from(request))
    }

    fn is_alive(&self, destination: &Address, request: AliveRequest) -> Result<Acknowledgement, BullyError> {
        self.acknowledged(destination, WireRequest::from(request))
    }

    fn update_topology(
        &self,
        destination: &Address,
        request: UpdateTopologyRequest,
    ) -> Result<Acknowledgement, BullyError> {
        self.acknowledged(destination, WireRequest::from(request))
    }

    fn quit_topology(
        &self,
        destination: &Address,
        request: QuitTopologyRequest,
    ) -> Result<Acknowledgement, BullyError> {
        self.acknowledged(destination, WireRequest::from(request))
    }
}
