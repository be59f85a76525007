//! Administrative protocol abstraction.
//!
//! The bootstrap coordinator only needs "open a connection to host:port,
//! issue a command, read the reply, close". [`AdminConnector`] and
//! [`AdminConnection`] capture exactly that so the protocol sequence can be
//! exercised against recorded fakes, while [`FredAdminConnector`] talks to
//! real nodes.
mod cluster_info;
mod fred_admin;
pub use cluster_info::*;
pub use fred_admin::*;


use async_trait::async_trait;

use crate::Result;

/// Opens administrative connections to individual nodes
#[async_trait]
pub trait AdminConnector: Send + Sync + 'static {
    /// Connects to a single node, bypassing cluster redirection.
    ///
    /// # Errors
    /// - [`crate::AdminError::Timeout`] when the connect bound is exceeded
    /// - [`crate::AdminError::Client`] when the node refuses the connection
    async fn connect(
        &self,
        host: &str,
        port: u16,
    ) -> Result<Box<dyn AdminConnection>>;
}

/// One open connection to one node
///
/// Owned by the single step that opened it; `close` must be called on every
/// path, including after a failed command.
#[async_trait]
pub trait AdminConnection: Send + Sync {
    /// Port of the node this connection talks to
    fn port(&self) -> u16;

    /// CLUSTER MEET: make this node gossip with `host:port`
    async fn cluster_meet(
        &self,
        host: &str,
        port: u16,
    ) -> Result<()>;

    /// CLUSTER ADDSLOTS with every slot in one request
    async fn cluster_add_slots(
        &self,
        slots: Vec<u16>,
    ) -> Result<()>;

    /// CLUSTER MYID
    async fn cluster_myid(&self) -> Result<String>;

    /// CLUSTER REPLICATE: follow the master with the given node id
    async fn cluster_replicate(
        &self,
        node_id: &str,
    ) -> Result<()>;

    /// CLUSTER INFO, parsed
    async fn cluster_info(&self) -> Result<ClusterInfo>;

    /// CLUSTER KEYSLOT: hash slot the node computes for `key`
    async fn cluster_keyslot(
        &self,
        key: &str,
    ) -> Result<u16>;

    async fn set(
        &self,
        key: &str,
        value: &str,
    ) -> Result<()>;

    async fn get(
        &self,
        key: &str,
    ) -> Result<Option<String>>;

    async fn close(&self) -> Result<()>;
}
