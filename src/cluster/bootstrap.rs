//! Cluster bootstrap protocol.
//!
//! Turns a set of freshly started, standalone cluster-mode nodes into one
//! cluster:
//!
//! 1. masters meet the seed (`master_ports[0]`) and claim their slots
//! 2. slaves meet the seed
//! 3. slaves replicate their group's master (optional)
//!
//! Each phase ends with a convergence wait, either a fixed settle delay or
//! bounded polling of `CLUSTER INFO`.

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::Mutex;
use tokio::time::sleep;
use tracing::debug;
use tracing::info;
use tracing::warn;

use super::ClusterTopology;
use crate::admin::AdminConnection;
use crate::admin::AdminConnector;
use crate::admin::ClusterInfo;
use crate::admin::ClusterState;
use crate::utils::async_task::poll_until;
use crate::utils::async_task::PollOutcome;
use crate::BootstrapConfig;
use crate::BootstrapError;
use crate::ConvergenceStrategy;
use crate::Error;
use crate::Result;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Phase {
    Masters,
    Slaves,
    Replicas,
}

impl Phase {
    pub(crate) fn as_str(&self) -> &'static str {
        match self {
            Phase::Masters => "masters",
            Phase::Slaves => "slaves",
            Phase::Replicas => "replicas",
        }
    }

    /// Ports whose view must settle before the phase counts as converged
    fn watched_ports(
        &self,
        topology: &ClusterTopology,
    ) -> Vec<u16> {
        match self {
            Phase::Masters => topology.master_ports().to_vec(),
            Phase::Slaves | Phase::Replicas => topology.all_ports(),
        }
    }

    fn satisfied_by(
        &self,
        info: &ClusterInfo,
        topology: &ClusterTopology,
    ) -> bool {
        match self {
            Phase::Masters => {
                info.state == ClusterState::Ok
                    && info.all_slots_assigned()
                    && info.known_nodes as usize >= topology.master_count()
            }
            Phase::Slaves => info.known_nodes as usize >= topology.node_count(),
            Phase::Replicas => info.state == ClusterState::Ok,
        }
    }
}

pub struct ClusterBootstrap {
    connector: Arc<dyn AdminConnector>,
    host: String,
    config: BootstrapConfig,
}

impl std::fmt::Debug for ClusterBootstrap {
    fn fmt(
        &self,
        f: &mut std::fmt::Formatter<'_>,
    ) -> std::fmt::Result {
        f.debug_struct("ClusterBootstrap")
            .field("host", &self.host)
            .field("config", &self.config)
            .finish()
    }
}

impl ClusterBootstrap {
    pub fn new(
        connector: Arc<dyn AdminConnector>,
        host: impl Into<String>,
        config: BootstrapConfig,
    ) -> Self {
        Self {
            connector,
            host: host.into(),
            config,
        }
    }

    pub fn config(&self) -> &BootstrapConfig {
        &self.config
    }

    /// Runs every phase against already running nodes.
    ///
    /// Stops at the first failure; the caller owns rollback.
    pub async fn run(
        &self,
        topology: &ClusterTopology,
    ) -> Result<()> {
        let target = topology.meet_target().ok_or(BootstrapError::NoMasters)?;
        info!(
            "bootstrapping cluster: {} master(s), {} slave(s), seed {}",
            topology.master_count(),
            topology.slave_ports().len(),
            target
        );

        let master_ids = self.join_masters(topology, target).await?;
        self.await_convergence(Phase::Masters, topology).await?;

        self.join_slaves(topology, target).await?;
        self.await_convergence(Phase::Slaves, topology).await?;

        if self.config.attach_replicas && !topology.slave_ports().is_empty() {
            if self.config.convergence == ConvergenceStrategy::Fixed {
                // REPLICATE fails with "Unknown node" until the slave has
                // learned its master's id through gossip
                self.poll_convergence(Phase::Slaves, topology).await?;
            }
            self.attach_replicas(topology, &master_ids).await?;
            self.await_convergence(Phase::Replicas, topology).await?;
        }

        info!("cluster bootstrap complete");
        Ok(())
    }

    /// Phase A. Returns node ids by master port when replicas get attached.
    async fn join_masters(
        &self,
        topology: &ClusterTopology,
        target: u16,
    ) -> Result<HashMap<u16, String>> {
        let mut node_ids = HashMap::new();
        for (index, &port) in topology.master_ports().iter().enumerate() {
            let slots = topology.slots_of(index);
            debug!("master {} (index {}) claims {} slots", port, index, slots.len());

            let result = match self.connector.connect(&self.host, port).await {
                Ok(conn) => {
                    let result = self.configure_master(conn.as_ref(), index, target, slots).await;
                    close_quietly(conn.as_ref()).await;
                    result
                }
                Err(e) => Err(e),
            };

            match result {
                Ok(Some(id)) => {
                    node_ids.insert(port, id);
                }
                Ok(None) => {}
                Err(e) => {
                    return Err(BootstrapError::Master {
                        port,
                        source: Box::new(e),
                    }
                    .into())
                }
            }
        }
        Ok(node_ids)
    }

    async fn configure_master(
        &self,
        conn: &dyn AdminConnection,
        index: usize,
        target: u16,
        slots: Vec<u16>,
    ) -> Result<Option<String>> {
        // the seed is the rendezvous point; it never meets itself
        if index != 0 {
            conn.cluster_meet(&self.host, target).await?;
        }
        conn.cluster_add_slots(slots).await?;

        if self.config.attach_replicas {
            Ok(Some(conn.cluster_myid().await?))
        } else {
            Ok(None)
        }
    }

    /// Phase B
    async fn join_slaves(
        &self,
        topology: &ClusterTopology,
        target: u16,
    ) -> Result<()> {
        for &port in topology.slave_ports() {
            let result = match self.connector.connect(&self.host, port).await {
                Ok(conn) => {
                    let result = conn.cluster_meet(&self.host, target).await;
                    close_quietly(conn.as_ref()).await;
                    result
                }
                Err(e) => Err(e),
            };

            result.map_err(|e| BootstrapError::Slave {
                port,
                source: Box::new(e),
            })?;
            debug!("slave {} met seed {}", port, target);
        }
        Ok(())
    }

    /// Phase C
    async fn attach_replicas(
        &self,
        topology: &ClusterTopology,
        master_ids: &HashMap<u16, String>,
    ) -> Result<()> {
        for (port, master_port) in topology.replica_pairs() {
            let wrap = |e: Error| BootstrapError::Replica {
                port,
                master_port,
                source: Box::new(e),
            };

            let node_id = master_ids.get(&master_port).ok_or_else(|| {
                wrap(Error::InvalidConfig(format!(
                    "no node id recorded for master {}",
                    master_port
                )))
            })?;

            let conn = self.connector.connect(&self.host, port).await.map_err(wrap)?;
            let result = conn.cluster_replicate(node_id).await;
            close_quietly(conn.as_ref()).await;
            result.map_err(wrap)?;

            debug!("slave {} replicates master {} ({})", port, master_port, node_id);
        }
        Ok(())
    }

    pub(crate) async fn await_convergence(
        &self,
        phase: Phase,
        topology: &ClusterTopology,
    ) -> Result<()> {
        match self.config.convergence {
            ConvergenceStrategy::Fixed => {
                let delay = match phase {
                    Phase::Masters => self.config.master_settle_delay(topology.master_count()),
                    Phase::Slaves | Phase::Replicas => self.config.slave_settle_delay(),
                };
                debug!("{} phase: settling for {:?}", phase.as_str(), delay);
                sleep(delay).await;
                Ok(())
            }
            ConvergenceStrategy::Poll => self.poll_convergence(phase, topology).await,
        }
    }

    async fn poll_convergence(
        &self,
        phase: Phase,
        topology: &ClusterTopology,
    ) -> Result<()> {
        let ports = phase.watched_ports(topology);
        let lagging = Mutex::new(ports.first().copied());
        let (ports, lagging_ref) = (&ports, &lagging);

        let outcome = poll_until(&self.config.poll, || async move {
            for &port in ports {
                if !self.node_converged(phase, port, topology).await {
                    *lagging_ref.lock() = Some(port);
                    return false;
                }
            }
            true
        })
        .await;

        let port = lagging.lock().unwrap_or_default();
        match outcome {
            PollOutcome::Ready { attempts } => {
                info!("{} phase converged after {} probe(s)", phase.as_str(), attempts);
                return Ok(());
            }
            PollOutcome::TimedOut { attempts, elapsed } => {
                warn!(
                    "{} phase not converged after {} probe(s) in {:?}, node {} lagging",
                    phase.as_str(),
                    attempts,
                    elapsed,
                    port
                );
            }
        }

        Err(BootstrapError::ConvergenceTimeout {
            phase: phase.as_str(),
            port,
            timeout: self.config.poll.timeout(),
        }
        .into())
    }

    async fn node_converged(
        &self,
        phase: Phase,
        port: u16,
        topology: &ClusterTopology,
    ) -> bool {
        let conn = match self.connector.connect(&self.host, port).await {
            Ok(conn) => conn,
            Err(e) => {
                debug!("convergence probe could not reach {}: {}", port, e);
                return false;
            }
        };
        let info = conn.cluster_info().await;
        close_quietly(conn.as_ref()).await;

        match info {
            Ok(info) => phase.satisfied_by(&info, topology),
            Err(e) => {
                debug!("convergence probe on {} failed: {}", port, e);
                false
            }
        }
    }
}

async fn close_quietly(conn: &dyn AdminConnection) {
    if let Err(e) = conn.close().await {
        warn!("failed to close admin connection to {}: {}", conn.port(), e);
    }
}
