use crate::steps;

/// The leader leaves gracefully; the highest remaining node takes over.
pub fn run() {
    let mut cluster = steps::cluster::start_initial_cluster(vec![5, 4, 3, 2, 1]);

    assert!(cluster.quit(5));

    steps::wait_for("node 4 leads the remaining nodes", || cluster.has_single_leader(4));
    for node_id in cluster.node_ids() {
        assert!(!cluster.node(node_id).status().known_nodes.contains(&5));
    }

    cluster.terminate();
}
