use std::time::Duration;

use serde::Deserialize;
use serde::Serialize;

use super::BackoffPolicy;
use crate::Error;
use crate::Result;

/// How the coordinator decides that gossip has settled between phases
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ConvergenceStrategy {
    /// Sleep for a delay proportional to the cluster size
    Fixed,
    /// Poll `CLUSTER INFO` on every node until it reports the expected view
    Poll,
}

impl Default for ConvergenceStrategy {
    fn default() -> Self {
        ConvergenceStrategy::Poll
    }
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct BootstrapConfig {
    #[serde(default)]
    pub convergence: ConvergenceStrategy,

    /// Fixed strategy: settle time per master after slot assignment
    #[serde(default = "default_master_settle_ms_per_node")]
    pub master_settle_ms_per_node: u64,

    /// Fixed strategy: settle time after slaves meet and after replica assignment
    #[serde(default = "default_slave_settle_ms")]
    pub slave_settle_ms: u64,

    /// Poll strategy: per-node probing bounds
    #[serde(default = "default_poll")]
    pub poll: BackoffPolicy,

    /// Bound on opening one administrative connection
    #[serde(default = "default_connect_timeout_ms")]
    pub connect_timeout_ms: u64,

    /// Bound on one administrative command round trip
    #[serde(default = "default_command_timeout_ms")]
    pub command_timeout_ms: u64,

    /// Issue CLUSTER REPLICATE so every slave follows its group's master
    #[serde(default = "default_attach_replicas")]
    pub attach_replicas: bool,
}

impl Default for BootstrapConfig {
    fn default() -> Self {
        Self {
            convergence: ConvergenceStrategy::default(),
            master_settle_ms_per_node: default_master_settle_ms_per_node(),
            slave_settle_ms: default_slave_settle_ms(),
            poll: default_poll(),
            connect_timeout_ms: default_connect_timeout_ms(),
            command_timeout_ms: default_command_timeout_ms(),
            attach_replicas: default_attach_replicas(),
        }
    }
}

impl BootstrapConfig {
    pub fn master_settle_delay(
        &self,
        master_count: usize,
    ) -> Duration {
        Duration::from_millis(self.master_settle_ms_per_node * master_count as u64)
    }

    pub fn slave_settle_delay(&self) -> Duration {
        Duration::from_millis(self.slave_settle_ms)
    }

    pub fn connect_timeout(&self) -> Duration {
        Duration::from_millis(self.connect_timeout_ms)
    }

    pub fn command_timeout(&self) -> Duration {
        Duration::from_millis(self.command_timeout_ms)
    }

    pub fn validate(&self) -> Result<()> {
        if self.connect_timeout_ms == 0 {
            return Err(Error::InvalidConfig("bootstrap.connect_timeout_ms must be > 0".into()));
        }
        if self.command_timeout_ms == 0 {
            return Err(Error::InvalidConfig("bootstrap.command_timeout_ms must be > 0".into()));
        }
        self.poll.validate("bootstrap.poll")
    }
}

fn default_master_settle_ms_per_node() -> u64 {
    300
}
fn default_slave_settle_ms() -> u64 {
    500
}
fn default_poll() -> BackoffPolicy {
    BackoffPolicy::new(30_000, 100, 1000)
}
fn default_connect_timeout_ms() -> u64 {
    2000
}
fn default_command_timeout_ms() -> u64 {
    5000
}
fn default_attach_replicas() -> bool {
    true
}
