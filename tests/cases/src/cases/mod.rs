pub mod concurrent_election;
pub mod leader_quit;
pub mod message_relay;
pub mod startup_order;
pub mod unreachable_node;
