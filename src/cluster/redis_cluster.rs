use std::path::Path;
use std::path::PathBuf;

use async_trait::async_trait;
use tempfile::TempDir;
use tracing::error;
use tracing::info;
use tracing::warn;

use super::ClusterBootstrap;
use super::ClusterTopology;
use super::RedisClusterBuilder;
use crate::Error;
use crate::RedisInstance;
use crate::Result;

/// A set of node processes bootstrapped into one cluster.
///
/// Members are started in list order and the bootstrap protocol runs once
/// all of them accept connections. A failed `start()` stops the members it
/// brought up before the error is returned.
pub struct RedisCluster {
    servers: Vec<Box<dyn RedisInstance>>,
    topology: ClusterTopology,
    bootstrap: ClusterBootstrap,
    work_dir: PathBuf,
    // removed on drop, after the children are gone
    _owned_dir: Option<TempDir>,
}

impl std::fmt::Debug for RedisCluster {
    fn fmt(
        &self,
        f: &mut std::fmt::Formatter<'_>,
    ) -> std::fmt::Result {
        f.debug_struct("RedisCluster")
            .field("topology", &self.topology)
            .field("work_dir", &self.work_dir)
            .field("bootstrap", &self.bootstrap)
            .finish()
    }
}

impl RedisCluster {
    pub fn builder() -> RedisClusterBuilder {
        RedisClusterBuilder::new()
    }

    pub(crate) fn new(
        servers: Vec<Box<dyn RedisInstance>>,
        topology: ClusterTopology,
        bootstrap: ClusterBootstrap,
        work_dir: PathBuf,
        owned_dir: Option<TempDir>,
    ) -> Self {
        Self {
            servers,
            topology,
            bootstrap,
            work_dir,
            _owned_dir: owned_dir,
        }
    }

    /// Parent of every node's data directory
    pub fn work_dir(&self) -> &Path {
        &self.work_dir
    }

    pub fn topology(&self) -> &ClusterTopology {
        &self.topology
    }

    pub fn master_ports(&self) -> &[u16] {
        self.topology.master_ports()
    }

    pub fn slave_ports(&self) -> &[u16] {
        self.topology.slave_ports()
    }

    /// Ports of every member, in member order
    pub fn server_ports(&self) -> Vec<u16> {
        self.servers.iter().flat_map(|s| s.ports()).collect()
    }

    /// Starts members in list order. On failure also returns how many
    /// members this call brought up before the failing one.
    async fn start_members(&self) -> std::result::Result<(), (usize, Error)> {
        for (index, server) in self.servers.iter().enumerate() {
            if let Err(e) = server.start().await {
                return Err((index, e));
            }
        }
        Ok(())
    }

    /// Best-effort teardown of the first `started` members after a failed start.
    async fn rollback(
        &self,
        started: usize,
    ) {
        for server in self.servers.iter().take(started) {
            if let Err(e) = server.stop().await {
                warn!("rollback: failed to stop member {:?}: {}", server.ports(), e);
            }
        }
    }
}

#[async_trait]
impl RedisInstance for RedisCluster {
    async fn is_active(&self) -> bool {
        for server in &self.servers {
            if !server.is_active().await {
                return false;
            }
        }
        true
    }

    async fn start(&self) -> Result<()> {
        info!("starting cluster members {:?}", self.server_ports());

        // members that were already running are left alone
        if let Err((started, e)) = self.start_members().await {
            error!("cluster member failed to start (port {:?}): {}", e.failing_port(), e);
            self.rollback(started).await;
            return Err(e);
        }

        if let Err(e) = self.bootstrap.run(&self.topology).await {
            error!("cluster bootstrap failed (port {:?}): {}", e.failing_port(), e);
            self.rollback(self.servers.len()).await;
            return Err(e);
        }

        info!(
            "cluster ready: masters {:?}, slaves {:?}",
            self.master_ports(),
            self.slave_ports()
        );
        Ok(())
    }

    async fn stop(&self) -> Result<()> {
        let mut failures = Vec::new();
        for server in &self.servers {
            if let Err(e) = server.stop().await {
                error!("failed to stop member {:?}: {}", server.ports(), e);
                failures.push(e);
            }
        }

        if failures.is_empty() {
            info!("cluster stopped");
            Ok(())
        } else {
            Err(Error::StopFailures(failures))
        }
    }

    fn ports(&self) -> Vec<u16> {
        self.server_ports()
    }
}
