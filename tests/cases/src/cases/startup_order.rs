use crate::steps;

/// Nodes start from the highest id down. The first one leads alone, every later
/// one joins through the entry point.
pub fn run() {
    let cluster = steps::cluster::start_initial_cluster(vec![5, 4, 3, 2, 1]);

    for node_id in cluster.node_ids() {
        let status = cluster.node(node_id).status();
        let expected: Vec<i32> = (1..=5).filter(|id| *id != node_id).collect();

        assert_eq!(status.known_nodes, expected, "topology of node {}", node_id);
        assert_eq!(status.leader_id, 5, "leader of node {}", node_id);
    }
    assert_eq!(cluster.leaders(), vec![5]);

    cluster.terminate();
}
