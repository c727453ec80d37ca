use crate::steps;

/// The leader fails to reach a crashed node, evicts it and tells the others.
pub fn run() {
    let mut cluster = steps::cluster::start_initial_cluster(vec![5, 4, 3, 2, 1]);
    cluster.crash(3);

    let delivered = cluster.node(5).send_message(3, "ping");

    assert_eq!(delivered, Ok(false));
    assert_eq!(cluster.node(5).status().known_nodes, vec![1, 2, 4]);
    steps::wait_for("node 3 is evicted everywhere", || {
        cluster
            .node_ids()
            .iter()
            .all(|id| !cluster.node(*id).status().known_nodes.contains(&3))
    });
    assert_eq!(cluster.leaders(), vec![5]);

    cluster.terminate();
}
