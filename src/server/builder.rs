//! Per-node process template.
//!
//! [`RedisServerBuilder`] holds everything shared by the nodes of a cluster
//! (binary, bind address, work directory, common settings). The cluster
//! builder clones it per node and applies the per-node overrides: port,
//! node-id file and cluster-mode settings.

use std::path::PathBuf;
use std::time::Duration;

use super::RedisServer;
use crate::constants::cluster_config_file;
use crate::BackoffPolicy;
use crate::Error;
use crate::Result;
use crate::ServerConfig;

/// Resolved configuration of one node process
#[derive(Debug, Clone, PartialEq)]
pub struct RedisServerConfig {
    pub binary: PathBuf,
    pub host: String,
    pub port: u16,
    /// Working directory of the child; node-id file and dumps land here
    pub data_dir: PathBuf,
    /// `redis.conf` directives in order, passed as `--name value` arguments
    pub settings: Vec<(String, String)>,
    pub startup: BackoffPolicy,
    pub stop_timeout: Duration,
}

impl RedisServerConfig {
    /// Command line handed to the server binary.
    ///
    /// Multi-word values are split into separate arguments; an empty value is
    /// kept as one empty argument so directives like `save ""` survive.
    pub fn command_args(&self) -> Vec<String> {
        let mut args = vec![
            "--port".to_string(),
            self.port.to_string(),
            "--bind".to_string(),
            self.host.clone(),
            "--dir".to_string(),
            self.data_dir.display().to_string(),
        ];

        for (name, value) in &self.settings {
            args.push(format!("--{}", name));
            if value.trim().is_empty() {
                args.push(String::new());
            } else {
                args.extend(value.split_whitespace().map(str::to_string));
            }
        }
        args
    }

    pub fn setting(
        &self,
        name: &str,
    ) -> Option<&str> {
        self.settings
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, v)| v.as_str())
    }

    /// Node-id file the server writes when running in cluster mode
    pub fn cluster_config_path(&self) -> Option<PathBuf> {
        self.setting("cluster-config-file").map(|file| self.data_dir.join(file))
    }
}

#[derive(Debug, Clone)]
pub struct RedisServerBuilder {
    binary: PathBuf,
    host: String,
    port: Option<u16>,
    work_dir: Option<PathBuf>,
    settings: Vec<(String, String)>,
    startup: BackoffPolicy,
    stop_timeout: Duration,
}

impl Default for RedisServerBuilder {
    fn default() -> Self {
        Self::from_config(&ServerConfig::default())
    }
}

impl RedisServerBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_config(config: &ServerConfig) -> Self {
        Self {
            binary: config.binary.clone(),
            host: config.host.clone(),
            port: None,
            work_dir: config.work_dir.clone(),
            settings: Vec::new(),
            startup: config.startup,
            stop_timeout: config.stop_timeout(),
        }
    }

    pub fn binary(
        mut self,
        binary: impl Into<PathBuf>,
    ) -> Self {
        self.binary = binary.into();
        self
    }

    pub fn bind(
        mut self,
        host: impl Into<String>,
    ) -> Self {
        self.host = host.into();
        self
    }

    pub fn port(
        mut self,
        port: u16,
    ) -> Self {
        self.port = Some(port);
        self
    }

    /// Parent directory; each node gets `<work_dir>/<port>`
    pub fn work_dir(
        mut self,
        dir: impl Into<PathBuf>,
    ) -> Self {
        self.work_dir = Some(dir.into());
        self
    }

    /// Adds a directive, replacing an earlier one with the same name.
    pub fn setting(
        mut self,
        name: impl Into<String>,
        value: impl Into<String>,
    ) -> Self {
        let name = name.into();
        let value = value.into();
        match self.settings.iter_mut().find(|(n, _)| *n == name) {
            Some(existing) => existing.1 = value,
            None => self.settings.push((name, value)),
        }
        self
    }

    pub fn startup(
        mut self,
        policy: BackoffPolicy,
    ) -> Self {
        self.startup = policy;
        self
    }

    pub fn stop_timeout(
        mut self,
        timeout: Duration,
    ) -> Self {
        self.stop_timeout = timeout;
        self
    }

    /// Cluster-mode directives shared by masters and slaves: unique node-id
    /// file, node timeout, and persistence switched off.
    pub fn cluster_node(
        self,
        port: u16,
        node_timeout_ms: u64,
    ) -> Self {
        self.port(port)
            .setting("cluster-enabled", "yes")
            .setting("cluster-config-file", cluster_config_file(port))
            .setting("cluster-node-timeout", node_timeout_ms.to_string())
            .setting("appendonly", "no")
            .setting("save", "")
    }

    pub fn host(&self) -> &str {
        &self.host
    }

    pub fn configured_work_dir(&self) -> Option<&PathBuf> {
        self.work_dir.as_ref()
    }

    pub fn to_config(&self) -> Result<RedisServerConfig> {
        let port = self
            .port
            .ok_or_else(|| Error::InvalidConfig("server port must be set before build".into()))?;
        if port == 0 {
            return Err(Error::InvalidConfig("server port must be non-zero".into()));
        }

        let work_dir = self.work_dir.clone().unwrap_or_else(std::env::temp_dir);
        Ok(RedisServerConfig {
            binary: self.binary.clone(),
            host: self.host.clone(),
            port,
            data_dir: work_dir.join(port.to_string()),
            settings: self.settings.clone(),
            startup: self.startup,
            stop_timeout: self.stop_timeout,
        })
    }

    pub fn build(&self) -> Result<RedisServer> {
        Ok(RedisServer::new(self.to_config()?))
    }
}
