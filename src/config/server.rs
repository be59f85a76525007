use std::path::PathBuf;
use std::time::Duration;

use serde::Deserialize;
use serde::Serialize;

use super::BackoffPolicy;
use crate::constants::DEFAULT_HOST;
use crate::Error;
use crate::Result;

/// Template applied to every spawned `redis-server` process
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct ServerConfig {
    /// Server executable, resolved through `PATH` when not absolute
    #[serde(default = "default_binary")]
    pub binary: PathBuf,

    /// Address nodes bind to and announce during MEET
    #[serde(default = "default_host")]
    pub host: String,

    /// Parent of per-node data directories; a temporary directory when unset
    #[serde(default)]
    pub work_dir: Option<PathBuf>,

    /// `cluster-node-timeout` handed to every node (milliseconds)
    #[serde(default = "default_node_timeout_ms")]
    pub node_timeout_ms: u64,

    /// How long start() probes the port before giving up
    #[serde(default = "default_startup")]
    pub startup: BackoffPolicy,

    /// How long stop() waits for the killed child to be reaped (milliseconds)
    #[serde(default = "default_stop_timeout_ms")]
    pub stop_timeout_ms: u64,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            binary: default_binary(),
            host: default_host(),
            work_dir: None,
            node_timeout_ms: default_node_timeout_ms(),
            startup: default_startup(),
            stop_timeout_ms: default_stop_timeout_ms(),
        }
    }
}

impl ServerConfig {
    pub fn stop_timeout(&self) -> Duration {
        Duration::from_millis(self.stop_timeout_ms)
    }

    pub fn validate(&self) -> Result<()> {
        if self.binary.as_os_str().is_empty() {
            return Err(Error::InvalidConfig("server.binary cannot be empty".into()));
        }
        if self.host.is_empty() {
            return Err(Error::InvalidConfig("server.host cannot be empty".into()));
        }
        if self.node_timeout_ms == 0 {
            return Err(Error::InvalidConfig("server.node_timeout_ms must be > 0".into()));
        }
        if self.stop_timeout_ms == 0 {
            return Err(Error::InvalidConfig("server.stop_timeout_ms must be > 0".into()));
        }
        if let Some(dir) = &self.work_dir {
            if dir.as_os_str().is_empty() {
                return Err(Error::InvalidConfig("server.work_dir path cannot be empty".into()));
            }
        }
        self.startup.validate("server.startup")
    }
}

fn default_binary() -> PathBuf {
    PathBuf::from("redis-server")
}
fn default_host() -> String {
    DEFAULT_HOST.to_string()
}
fn default_node_timeout_ms() -> u64 {
    5000
}
fn default_startup() -> BackoffPolicy {
    BackoffPolicy::new(10_000, 20, 500)
}
fn default_stop_timeout_ms() -> u64 {
    5000
}
