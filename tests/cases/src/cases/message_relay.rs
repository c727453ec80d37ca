use std::time::Duration;

use crate::steps;

/// A follower's message travels through the leader to its target.
pub fn run() {
    let cluster = steps::cluster::start_initial_cluster(vec![5, 4, 3, 2, 1]);
    let target_rx = cluster.node(4).delivered_messages();
    let leader_rx = cluster.node(5).delivered_messages();

    let delivered = cluster.node(2).send_message(4, "hi");

    assert_eq!(delivered, Ok(true));
    let message = target_rx
        .recv_timeout(Duration::from_secs(1))
        .expect("message reaches node 4");
    assert_eq!(message.sender_id, 2);
    assert_eq!(message.receiver_id, 4);
    assert_eq!(message.payload, "hi");
    assert!(leader_rx.try_recv().is_err());

    assert_eq!(
        cluster.node(2).send_message(9, "nobody"),
        Err(bully::BullyError::NodeNotFound(9))
    );

    cluster.terminate();
}
