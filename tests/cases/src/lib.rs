//! # Bully Node Test cases
//!
//! This subproject provides multi-node scenarios for the Bully election and membership protocol.

#[macro_use]
extern crate log;
pub mod cases;
mod steps;

pub use self::cases::{concurrent_election, leader_quit, message_relay, startup_order, unreachable_node};
