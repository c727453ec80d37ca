extern crate cases;

#[test]
fn nodes_started_in_descending_order_share_one_leader() {
    cases::startup_order::run();
}

#[test]
fn leader_quit_elects_highest_remaining_node() {
    cases::leader_quit::run();
}

#[test]
fn follower_message_is_relayed_by_leader() {
    cases::message_relay::run();
}

#[test]
fn unreachable_node_is_evicted_and_topology_broadcast() {
    cases::unreachable_node::run();
}

#[test]
fn concurrent_elections_converge_on_highest_node() {
    cases::concurrent_election::run();
}
