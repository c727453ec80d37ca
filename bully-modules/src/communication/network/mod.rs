pub mod network_peer_communicator;
mod server;
mod wire;
