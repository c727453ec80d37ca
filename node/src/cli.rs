use clap::Parser;
use std::time::Duration;

use bully::{BootstrapConfiguration, NodeId, NodeLimits};

#[derive(Debug, Parser, Clone)]
#[command(author, version, about = "Bully election peer-to-peer node", long_about = None)]
pub struct Cli {
    /// Own node id. The node listens on `base-port + node-id`.
    #[arg(short, long)]
    pub node_id: NodeId,

    #[arg(long, default_value = "localhost")]
    pub hostname: String,

    #[arg(long, default_value_t = 50050)]
    pub base_port: i32,

    /// Node id tried first when joining.
    #[arg(short, long, default_value_t = 5)]
    pub entry_point: NodeId,

    #[arg(long, default_value_t = 2000)]
    pub communication_timeout_ms: u64,

    /// Pause between delivery or health-check attempts.
    #[arg(long, default_value_t = 3000)]
    pub retry_delay_ms: u64,

    #[arg(long, default_value_t = 3)]
    pub max_retries: u32,
}

impl Cli {
    pub fn bootstrap(&self) -> BootstrapConfiguration {
        BootstrapConfiguration {
            hostname: self.hostname.clone(),
            base_port: self.base_port,
            entry_point_id: self.entry_point,
        }
    }

    pub fn limits(&self) -> NodeLimits {
        NodeLimits {
            communication_timeout: Duration::from_millis(self.communication_timeout_ms),
            retry_delay: Duration::from_millis(self.retry_delay_ms),
            max_retries: self.max_retries,
            ..NodeLimits::default()
        }
    }
}
