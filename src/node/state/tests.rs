use crate::address_book::Address;
use crate::node::state::{NodeState, NodeStatus};

fn node(node_id: i32) -> NodeState {
    NodeState::new(Address::new("localhost", 50050 + node_id, node_id))
}

#[test]
fn only_one_election_at_a_time() {
    let mut state = node(2);

    assert!(state.begin_election());
    assert!(!state.begin_election());

    state.finish_election();
    assert_eq!(state.status(), NodeStatus::Idle);
    assert!(state.begin_election());
}

#[test]
fn quitting_is_terminal() {
    let mut state = node(2);
    state.begin_quit();

    assert!(!state.begin_election());
    state.finish_election();

    assert_eq!(state.status(), NodeStatus::Quitting);
}

#[test]
fn report_reflects_address_book() {
    let mut state = node(2);
    state.address_book.add(Address::new("localhost", 50053, 3));
    state.address_book.set_leader(3).unwrap();

    let report = state.report();

    assert_eq!(report.leader_id, 3);
    assert!(!report.is_leader);
    assert_eq!(report.known_nodes, vec![3]);
    assert_eq!(
        report.to_string(),
        "Node id: 2, status: Idle, leader: 3, is leader: false, known nodes: [3]"
    );
}
