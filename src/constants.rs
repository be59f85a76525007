// -
// Cluster protocol

/// Total number of hash slots (Redis Cluster standard).
pub const SLOT_COUNT: u16 = 16384;

/// The cluster bus listens on the client port plus this offset.
pub const CLUSTER_BUS_PORT_OFFSET: u16 = 10000;

/// Highest client port whose cluster bus port is still valid.
pub const MAX_CLUSTER_CLIENT_PORT: u16 = u16::MAX - CLUSTER_BUS_PORT_OFFSET;

/// Address every spawned node binds to and every meet is directed at.
pub(crate) const DEFAULT_HOST: &str = "127.0.0.1";

/// Default port sequence base, the well-known Redis port.
pub(crate) const DEFAULT_SEQUENTIAL_BASE: u16 = 6379;

// -
// Node files

/// Node-id file written by each node inside its data directory
pub(crate) fn cluster_config_file(port: u16) -> String {
    format!("nodes-{}.conf", port)
}

pub(crate) const WORK_DIR_PREFIX: &str = "redis-cluster-";
