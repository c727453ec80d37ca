#[macro_use]
extern crate log;
extern crate bully;
extern crate crossbeam_channel;

mod communication;

pub use communication::inproc::inproc_peer_communicator::InProcPeerCommunicator;
pub use communication::network::network_peer_communicator::NetworkPeerCommunicator;
pub use communication::request_channel::RequestChannel;
