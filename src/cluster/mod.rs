//! Cluster assembly and bootstrap.
//!
//! [`RedisClusterBuilder`] plans ports per replication group and derives one
//! [`crate::RedisServer`] per node. [`RedisCluster`] starts them and runs
//! [`ClusterBootstrap`], which wires the standalone nodes into one
//! slot-sharded cluster through the admin protocol.
mod bootstrap;
mod builder;
mod redis_cluster;
mod replication_group;
mod slots;
mod topology;
pub use bootstrap::*;
pub use builder::*;
pub use redis_cluster::*;
pub use replication_group::*;
pub use slots::*;
pub use topology::*;

#[cfg(test)]
mod bootstrap_test;
