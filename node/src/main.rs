#[macro_use]
extern crate log;
extern crate chrono;
extern crate env_logger;

extern crate bully;
extern crate bully_modules;

use std::io::Write;
use std::thread;

use chrono::prelude::{DateTime, Local};
use clap::Parser;

use bully::NodeConfiguration;
use bully_modules::NetworkPeerCommunicator;

mod cli;
mod console;

use cli::Cli;

fn init_logger() {
    env_logger::builder()
        .format(|buf, record| {
            let now: DateTime<Local> = Local::now();
            writeln!(buf, "{:5}: {} - {}", record.level(), now.format("%H:%M:%S.%3f"), record.args())
        })
        .init();
}

fn main() {
    init_logger();
    let cli = Cli::parse();

    let bootstrap = cli.bootstrap();
    let limits = cli.limits();
    let address = bootstrap.address_of(cli.node_id);
    let host = format!("{}:{}", address.hostname, address.port);

    let peer_communicator = match NetworkPeerCommunicator::new(host, cli.node_id, limits.communication_timeout, true) {
        Ok(communicator) => communicator,
        Err(err) => {
            error!("Cannot start peer communicator: {}", err);
            std::process::exit(1);
        }
    };

    let node_config = NodeConfiguration::new(cli.node_id, bootstrap, peer_communicator).with_limits(limits);
    let node = match bully::start_node(node_config) {
        Ok(node) => node,
        Err(err) => {
            error!("Cannot start node {}: {}", cli.node_id, err);
            std::process::exit(1);
        }
    };
    info!("{}", node.status());

    if let Some(_node) = console::run_console(node) {
        info!("Console closed. Node {} keeps serving", cli.node_id);
        loop {
            thread::park();
        }
    }
}
