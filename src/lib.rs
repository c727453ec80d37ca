#![warn(missing_debug_implementations, unsafe_code)]

#[macro_use]
extern crate log;
#[macro_use]
extern crate crossbeam_channel;
#[macro_use]
extern crate derive_more;

mod address_book;
mod common;
mod communication;
mod errors;
mod failure_detector;
mod leadership;
mod membership;
mod messaging;
mod node;
mod request_handler;

pub use address_book::{Address, NodeId};
pub use communication::peers::{
    Acknowledgement, AliveRequest, ElectionRequest, JoinRequest, JoinResponse,
    LeaderAnnouncementRequest, MessageRequest, PeerRequest, PeerRequestChannels,
    PeerRequestHandler, QuitTopologyRequest, RequestEnvelope, UpdateTopologyRequest,
};
pub use errors::{unreachable_err, BullyError};
pub use node::configuration::{BootstrapConfiguration, NodeConfiguration, NodeLimits};
pub use node::state::{NodeStatus, NodeStatusReport};
pub use node::BullyNode;

/// Starts serving peer requests, joins the topology and returns the running node.
pub fn start_node<Pc>(node_config: NodeConfiguration<Pc>) -> Result<BullyNode<Pc>, BullyError>
where
    Pc: PeerRequestHandler + PeerRequestChannels,
{
    node::start(node_config)
}
