//! Administrative connections backed by the `fred` client.

use std::time::Duration;

use async_trait::async_trait;
use fred::error::Error as FredError;
use fred::error::ErrorKind;
use fred::prelude::Builder;
use fred::prelude::Client;
use fred::prelude::ClientLike;
use fred::prelude::ClusterInterface;
use fred::prelude::Config;
use fred::prelude::KeysInterface;
use fred::prelude::Server;
use fred::prelude::ServerConfig;
use tokio::time::timeout;
use tracing::debug;
use tracing::instrument;

use super::AdminConnection;
use super::AdminConnector;
use super::ClusterInfo;
use crate::AdminError;
use crate::BootstrapConfig;
use crate::Error;
use crate::Result;

/// Opens one centralized (non-cluster-aware) client per node.
#[derive(Debug, Clone)]
pub struct FredAdminConnector {
    connect_timeout: Duration,
    command_timeout: Duration,
}

impl FredAdminConnector {
    pub fn new(
        connect_timeout: Duration,
        command_timeout: Duration,
    ) -> Self {
        Self {
            connect_timeout,
            command_timeout,
        }
    }

    pub fn from_config(config: &BootstrapConfig) -> Self {
        Self::new(config.connect_timeout(), config.command_timeout())
    }
}

impl Default for FredAdminConnector {
    fn default() -> Self {
        Self::from_config(&BootstrapConfig::default())
    }
}

#[async_trait]
impl AdminConnector for FredAdminConnector {
    #[instrument(skip(self))]
    async fn connect(
        &self,
        host: &str,
        port: u16,
    ) -> Result<Box<dyn AdminConnection>> {
        let config = Config {
            server: ServerConfig::Centralized {
                server: Server::new(host, port),
            },
            ..Default::default()
        };

        let command_timeout = self.command_timeout;
        let connection_timeout = self.connect_timeout;
        let client = Builder::from_config(config)
            .with_performance_config(|perf| {
                perf.default_command_timeout = command_timeout;
            })
            .with_connection_config(|conn| {
                conn.connection_timeout = connection_timeout;
            })
            .build()
            .map_err(AdminError::Client)?;

        match timeout(self.connect_timeout, client.init()).await {
            Ok(Ok(_)) => {}
            Ok(Err(e)) => return Err(AdminError::Client(e).into()),
            Err(_) => {
                return Err(AdminError::Timeout {
                    port,
                    duration: self.connect_timeout,
                }
                .into())
            }
        }
        debug!("admin connection to {}:{} established", host, port);

        Ok(Box::new(FredAdminConnection {
            client,
            port,
            command_timeout: self.command_timeout,
        }))
    }
}

pub struct FredAdminConnection {
    client: Client,
    port: u16,
    command_timeout: Duration,
}

impl FredAdminConnection {
    fn map_err(
        &self,
        e: FredError,
    ) -> Error {
        if *e.kind() == ErrorKind::Timeout {
            AdminError::Timeout {
                port: self.port,
                duration: self.command_timeout,
            }
            .into()
        } else {
            AdminError::Client(e).into()
        }
    }
}

#[async_trait]
impl AdminConnection for FredAdminConnection {
    fn port(&self) -> u16 {
        self.port
    }

    #[instrument(skip(self), fields(node = self.port))]
    async fn cluster_meet(
        &self,
        host: &str,
        port: u16,
    ) -> Result<()> {
        self.client.cluster_meet(host, port).await.map_err(|e| self.map_err(e))?;
        Ok(())
    }

    #[instrument(skip(self, slots), fields(node = self.port, slot_count = slots.len()))]
    async fn cluster_add_slots(
        &self,
        slots: Vec<u16>,
    ) -> Result<()> {
        self.client.cluster_add_slots(slots).await.map_err(|e| self.map_err(e))?;
        Ok(())
    }

    async fn cluster_myid(&self) -> Result<String> {
        let id: String = self.client.cluster_myid().await.map_err(|e| self.map_err(e))?;
        Ok(id)
    }

    #[instrument(skip(self), fields(node = self.port))]
    async fn cluster_replicate(
        &self,
        node_id: &str,
    ) -> Result<()> {
        self.client
            .cluster_replicate(node_id)
            .await
            .map_err(|e| self.map_err(e))?;
        Ok(())
    }

    async fn cluster_info(&self) -> Result<ClusterInfo> {
        let raw: String = self.client.cluster_info().await.map_err(|e| self.map_err(e))?;
        Ok(ClusterInfo::parse(&raw).map_err(AdminError::Parse)?)
    }

    async fn cluster_keyslot(
        &self,
        key: &str,
    ) -> Result<u16> {
        let slot: u16 = self.client.cluster_keyslot(key).await.map_err(|e| self.map_err(e))?;
        Ok(slot)
    }

    async fn set(
        &self,
        key: &str,
        value: &str,
    ) -> Result<()> {
        self.client
            .set::<(), _, _>(key, value, None, None, false)
            .await
            .map_err(|e| self.map_err(e))?;
        Ok(())
    }

    async fn get(
        &self,
        key: &str,
    ) -> Result<Option<String>> {
        let value: Option<String> = self.client.get(key).await.map_err(|e| self.map_err(e))?;
        Ok(value)
    }

    async fn close(&self) -> Result<()> {
        self.client.quit().await.map_err(|e| self.map_err(e))?;
        Ok(())
    }
}
