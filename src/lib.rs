//! Ephemeral multi-node Redis clusters for integration tests.
//!
//! Spawns local `redis-server` processes, wires them into one slot-sharded,
//! replicated cluster through the cluster admin commands, and tears them
//! down again.
//!
//! ```ignore
//! use redis_embedded_cluster::RedisCluster;
//! use redis_embedded_cluster::RedisInstance;
//!
//! let cluster = RedisCluster::builder()
//!     .ephemeral()
//!     .replication_group("master1", 1)
//!     .replication_group("master2", 1)
//!     .replication_group("master3", 1)
//!     .build()?;
//! cluster.start().await?;
//! // ... talk to cluster.master_ports()
//! cluster.stop().await?;
//! ```
pub mod admin;
mod cluster;
mod config;
mod constants;
mod errors;
mod ports;
mod server;
pub(crate) mod utils;

pub use cluster::*;
pub use config::*;
pub use constants::CLUSTER_BUS_PORT_OFFSET;
pub use constants::MAX_CLUSTER_CLIENT_PORT;
pub use constants::SLOT_COUNT;
pub use errors::*;
pub use ports::*;
pub use server::*;

//-----------------------------------------------------------
// Test utils

#[cfg(test)]
pub mod test_utils;
