use std::collections::HashSet;
use std::sync::Arc;

use tracing::debug;
use tracing::warn;

use super::ClusterBootstrap;
use super::ClusterTopology;
use super::RedisCluster;
use super::ReplicationGroup;
use crate::admin::AdminConnector;
use crate::admin::FredAdminConnector;
use crate::constants::DEFAULT_SEQUENTIAL_BASE;
use crate::constants::WORK_DIR_PREFIX;
use crate::BootstrapConfig;
use crate::ClusterSettings;
use crate::EphemeralPortProvider;
use crate::Error;
use crate::PortProvider;
use crate::PredefinedPortProvider;
use crate::RedisInstance;
use crate::RedisServerBuilder;
use crate::Result;
use crate::SequentialPortProvider;
use crate::ServerConfig;
use crate::MAX_CLUSTER_CLIENT_PORT;

/// Declares replication groups and produces an unstarted [`RedisCluster`].
///
/// Ports are drawn the moment a group is declared, from whichever provider
/// is current at that point. Planning failures do not break the chain; the
/// first one is reported by [`build`](Self::build).
///
/// ```ignore
/// let cluster = RedisCluster::builder()
///     .server_ports(vec![7001, 8001, 7002, 8002, 7003, 8003])
///     .replication_group("master1", 1)
///     .replication_group("master2", 1)
///     .replication_group("master3", 1)
///     .build()?;
/// cluster.start().await?;
/// ```
pub struct RedisClusterBuilder {
    server_template: RedisServerBuilder,
    provider: Arc<dyn PortProvider>,
    groups: Vec<ReplicationGroup>,
    planning_error: Option<Error>,
    bootstrap: BootstrapConfig,
    node_timeout_ms: u64,
    connector: Option<Arc<dyn AdminConnector>>,
}

impl Default for RedisClusterBuilder {
    fn default() -> Self {
        let server = ServerConfig::default();
        Self {
            server_template: RedisServerBuilder::from_config(&server),
            provider: Arc::new(SequentialPortProvider::new(DEFAULT_SEQUENTIAL_BASE)),
            groups: Vec::new(),
            planning_error: None,
            bootstrap: BootstrapConfig::default(),
            node_timeout_ms: server.node_timeout_ms,
            connector: None,
        }
    }
}

impl RedisClusterBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder preloaded with every section of `settings`, groups included.
    pub fn from_settings(settings: &ClusterSettings) -> Self {
        let mut builder = Self {
            server_template: RedisServerBuilder::from_config(&settings.server),
            provider: settings.topology.ports.provider(),
            bootstrap: settings.bootstrap.clone(),
            node_timeout_ms: settings.server.node_timeout_ms,
            ..Self::default()
        };
        for group in &settings.topology.groups {
            builder = builder.replication_group(&group.name, group.slaves);
        }
        builder
    }

    /// Template every node is derived from.
    pub fn with_server_builder(
        mut self,
        template: RedisServerBuilder,
    ) -> Self {
        self.server_template = template;
        self
    }

    pub fn port_provider(
        mut self,
        provider: Arc<dyn PortProvider>,
    ) -> Self {
        self.provider = provider;
        self
    }

    /// Subsequent groups take their ports from `ports`, in order.
    pub fn server_ports(
        self,
        ports: Vec<u16>,
    ) -> Self {
        self.port_provider(Arc::new(PredefinedPortProvider::new(ports)))
    }

    /// Subsequent groups take OS-assigned free ports.
    pub fn ephemeral(self) -> Self {
        self.port_provider(Arc::new(EphemeralPortProvider::for_cluster()))
    }

    pub fn sequential(
        self,
        base: u16,
    ) -> Self {
        self.port_provider(Arc::new(SequentialPortProvider::new(base)))
    }

    /// Declares a master named `name` with `slave_count` slaves.
    pub fn replication_group(
        mut self,
        name: impl Into<String>,
        slave_count: usize,
    ) -> Self {
        if self.planning_error.is_some() {
            return self;
        }
        let name = name.into();
        match ReplicationGroup::plan(name.clone(), slave_count, self.provider.as_ref()) {
            Ok(group) => self.groups.push(group),
            Err(e) => {
                warn!("failed to plan replication group {}: {}", name, e);
                self.planning_error = Some(e);
            }
        }
        self
    }

    pub fn bootstrap_config(
        mut self,
        config: BootstrapConfig,
    ) -> Self {
        self.bootstrap = config;
        self
    }

    pub fn node_timeout_ms(
        mut self,
        timeout_ms: u64,
    ) -> Self {
        self.node_timeout_ms = timeout_ms;
        self
    }

    /// Replaces the fred-backed connector used by the bootstrap protocol.
    pub fn admin_connector(
        mut self,
        connector: Arc<dyn AdminConnector>,
    ) -> Self {
        self.connector = Some(connector);
        self
    }

    pub fn groups(&self) -> &[ReplicationGroup] {
        &self.groups
    }

    /// Materializes node handles. No process is started.
    ///
    /// # Errors
    /// - the first port planning failure of any `replication_group` call
    /// - [`Error::InvalidConfig`] with no groups, duplicate ports, or a port
    ///   whose cluster bus port would not fit in 16 bits
    pub fn build(self) -> Result<RedisCluster> {
        if let Some(e) = self.planning_error {
            return Err(e);
        }
        if self.groups.is_empty() {
            return Err(Error::InvalidConfig(
                "cluster requires at least one replication group".into(),
            ));
        }

        let topology = ClusterTopology::from_groups(self.groups);
        check_ports(&topology.all_ports())?;

        let (work_dir, owned_dir) = match self.server_template.configured_work_dir() {
            Some(dir) => (dir.clone(), None),
            None => {
                let dir = tempfile::Builder::new().prefix(WORK_DIR_PREFIX).tempdir()?;
                (dir.path().to_path_buf(), Some(dir))
            }
        };
        debug!("cluster work dir: {}", work_dir.display());

        let mut servers: Vec<Box<dyn RedisInstance>> = Vec::with_capacity(topology.node_count());
        for group in topology.groups() {
            for port in group.ports() {
                let server = self
                    .server_template
                    .clone()
                    .work_dir(&work_dir)
                    .cluster_node(port, self.node_timeout_ms)
                    .build()?;
                servers.push(Box::new(server));
            }
        }

        let connector = self
            .connector
            .unwrap_or_else(|| Arc::new(FredAdminConnector::from_config(&self.bootstrap)));
        let bootstrap = ClusterBootstrap::new(connector, self.server_template.host(), self.bootstrap);

        Ok(RedisCluster::new(servers, topology, bootstrap, work_dir, owned_dir))
    }
}

fn check_ports(ports: &[u16]) -> Result<()> {
    let mut seen = HashSet::with_capacity(ports.len());
    for &port in ports {
        if port > MAX_CLUSTER_CLIENT_PORT {
            return Err(Error::InvalidConfig(format!(
                "port {} leaves no room for its cluster bus port (max {})",
                port, MAX_CLUSTER_CLIENT_PORT
            )));
        }
        if !seen.insert(port) {
            return Err(Error::InvalidConfig(format!("port {} assigned to more than one node", port)));
        }
    }
    Ok(())
}
