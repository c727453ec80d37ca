use std::io::{self, BufRead, Write};

use bully::{BullyError, BullyNode, NodeId, PeerRequestHandler};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Help,
    Send { target_id: NodeId, message: String },
    Status,
    Quit { force: bool },
    Invalid(String),
}

pub fn parse_command(line: &str) -> Command {
    let mut parts = line.split_whitespace();
    let command = match parts.next() {
        Some(command) => command,
        None => return Command::Invalid(String::new()),
    };
    let arguments: Vec<&str> = parts.collect();

    match command {
        "?" | "help" => Command::Help,
        "status" => Command::Status,
        "quit" => Command::Quit {
            force: arguments.first() == Some(&"--force"),
        },
        "send" => {
            if arguments.len() < 2 {
                return Command::Invalid("Usage: send <target node id> <message>".to_string());
            }
            match arguments[0].parse::<NodeId>() {
                Ok(target_id) => Command::Send {
                    target_id,
                    message: arguments[1..].join(" "),
                },
                Err(_) => Command::Invalid("Node ID should be a number".to_string()),
            }
        }
        other => Command::Invalid(format!("Unknown command '{}'. Type ? for help", other)),
    }
}

fn print_help() {
    println!("? - this help");
    println!("send <target node id> <message> - send a message to a node through the leader");
    println!("status - print this node status, including the network topology");
    println!("quit - quit the topology notifying the other nodes");
    println!("quit --force - quit without notifying");
}

/// Reads commands until the node quits or the input ends. Returns the node if it is still running.
pub fn run_console<Pc: PeerRequestHandler>(node: BullyNode<Pc>) -> Option<BullyNode<Pc>> {
    print_help();
    println!("You are node with id: {}", node.id());

    let stdin = io::stdin();
    let mut lines = stdin.lock().lines();
    loop {
        print!("\ncmd > ");
        if io::stdout().flush().is_err() {
            warn!("Cannot flush console output");
        }

        let line = match lines.next() {
            Some(Ok(line)) => line,
            Some(Err(err)) => {
                error!("Cannot read console input: {}", err);
                return Some(node);
            }
            None => {
                info!("Exit from console handler");
                return Some(node);
            }
        };

        match parse_command(line.trim()) {
            Command::Help => print_help(),
            Command::Status => println!("{}", node.status()),
            Command::Send { target_id, message } => match node.send_message(target_id, message) {
                Ok(true) => info!("Message delivered to node {}", target_id),
                Ok(false) => warn!("Message to node {} was not delivered", target_id),
                Err(BullyError::NodeNotFound(_)) => println!(
                    "Node {} is not part of this topology. Print status to see available nodes",
                    target_id
                ),
                Err(err) => error!("Cannot send message: {}", err),
            },
            Command::Quit { force: true } => {
                info!("Node {} quits without notification", node.id());
                node.terminate();
                return None;
            }
            Command::Quit { force: false } => {
                let node_id = node.id();
                if !node.quit() {
                    warn!("Node {} quit was not acknowledged by every peer", node_id);
                }
                return None;
            }
            Command::Invalid(reason) if reason.is_empty() => {}
            Command::Invalid(reason) => println!("{}", reason),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{parse_command, Command};

    #[test]
    fn send_joins_message_words() {
        assert_eq!(
            parse_command("send 4 hello there"),
            Command::Send {
                target_id: 4,
                message: "hello there".to_string()
            }
        );
    }

    #[test]
    fn send_requires_numeric_target() {
        assert!(matches!(parse_command("send four hi"), Command::Invalid(_)));
        assert!(matches!(parse_command("send 4"), Command::Invalid(_)));
    }

    #[test]
    fn quit_variants() {
        assert_eq!(parse_command("quit"), Command::Quit { force: false });
        assert_eq!(parse_command("quit --force"), Command::Quit { force: true });
    }

    #[test]
    fn blank_line_is_ignored() {
        assert_eq!(parse_command("   "), Command::Invalid(String::new()));
    }
}
