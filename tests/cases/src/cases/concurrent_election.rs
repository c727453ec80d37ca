use std::thread;

use crate::steps;

/// Two nodes notice the missing leader at the same time; both end up with node 4.
pub fn run() {
    let mut cluster = steps::cluster::start_initial_cluster(vec![5, 4, 3, 2, 1]);
    cluster.crash(5);

    let (elected_3, elected_4) = thread::scope(|scope| {
        let node_3 = cluster.node(3);
        let node_4 = cluster.node(4);
        let election_3 = scope.spawn(move || node_3.initiate_election());
        let election_4 = scope.spawn(move || node_4.initiate_election());

        (
            election_3.join().expect("election of node 3 completes"),
            election_4.join().expect("election of node 4 completes"),
        )
    });

    // node 4 may already be electing because of node 3's probe
    info!("Election results: node 3 {}, node 4 {}", elected_3, elected_4);
    assert!(!elected_3);
    steps::wait_for("node 4 is the only leader", || cluster.has_single_leader(4));

    cluster.terminate();
}
