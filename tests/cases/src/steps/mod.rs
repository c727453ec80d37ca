use std::thread;
use std::time::{Duration, Instant};

use bully::{BootstrapConfiguration, BullyNode, NodeConfiguration, NodeId, NodeLimits};
use bully_modules::InProcPeerCommunicator;

pub mod cluster;

pub type CaseNode = BullyNode<InProcPeerCommunicator>;

pub fn get_peers_communication_timeout() -> Duration {
    Duration::from_millis(200)
}

pub fn get_limits() -> NodeLimits {
    NodeLimits {
        communication_timeout: get_peers_communication_timeout(),
        max_retries: 3,
        retry_delay: Duration::from_millis(100),
        fan_out_parallelism: 8,
    }
}

pub fn get_peer_communicator() -> InProcPeerCommunicator {
    InProcPeerCommunicator::new(get_peers_communication_timeout())
}

pub fn create_node_inproc(node_id: NodeId, peer_communicator: InProcPeerCommunicator) -> CaseNode {
    let node_config = NodeConfiguration::new(node_id, BootstrapConfiguration::default(), peer_communicator)
        .with_limits(get_limits());

    bully::start_node(node_config).expect("node starts")
}

/// Polls the condition for up to ten seconds and panics with `description` if it never holds.
pub fn wait_for<F: Fn() -> bool>(description: &str, condition: F) {
    let deadline = Instant::now() + Duration::from_secs(10);
    while Instant::now() < deadline {
        if condition() {
            return;
        }
        thread::sleep(Duration::from_millis(50));
    }

    panic!("Timed out waiting for: {}", description);
}
