//! Embedded Cluster Error Hierarchy
//!
//! Defines error types for provisioning and bootstrapping a local Redis
//! cluster, categorized by the layer that produced them: port allocation,
//! node processes, the administrative protocol and the bootstrap sequence.

use std::path::PathBuf;
use std::time::Duration;

use config::ConfigError;

#[doc(hidden)]
pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Configuration loading failures
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// Port provider failures
    #[error(transparent)]
    Port(#[from] PortError),

    /// Node process lifecycle failures
    #[error(transparent)]
    Process(#[from] ProcessError),

    /// Administrative protocol failures against a single node
    #[error(transparent)]
    Admin(#[from] AdminError),

    /// Cluster bootstrap protocol failures
    #[error(transparent)]
    Bootstrap(#[from] BootstrapError),

    /// Semantic validation failures of builder or config input
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// One or more members failed to stop; every member was still attempted
    #[error("{} cluster member(s) failed to stop: {}", .0.len(), join_errors(.0))]
    StopFailures(Vec<Error>),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Port of the node an administrative or process failure is attributed to.
    pub fn failing_port(&self) -> Option<u16> {
        match self {
            Error::Bootstrap(e) => e.port(),
            Error::Process(e) => e.port(),
            Error::Admin(e) => e.port(),
            _ => None,
        }
    }
}

fn join_errors(errors: &[Error]) -> String {
    errors.iter().map(|e| e.to_string()).collect::<Vec<_>>().join("; ")
}

#[derive(Debug, thiserror::Error)]
pub enum PortError {
    /// Predefined port list consumed
    #[error("Port allocation exhausted: all {supplied} predefined port(s) already handed out")]
    Exhausted { supplied: usize },

    /// OS refused to hand out an ephemeral port
    #[error("No ephemeral port available: {0}")]
    Unavailable(#[source] std::io::Error),

    /// Sequence walked past the last valid port number
    #[error("Port sequence starting at {base} overflowed at offset {offset}")]
    OutOfRange { base: u16, offset: u32 },
}

#[derive(Debug, thiserror::Error)]
pub enum ProcessError {
    /// Binary could not be launched at all
    #[error("Failed to spawn {binary} for port {port}")]
    Spawn {
        port: u16,
        binary: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Child died before it accepted connections
    #[error("Server on port {port} exited before becoming ready: {status}")]
    Exited { port: u16, status: String },

    /// Child kept running but never accepted connections
    #[error("Server on port {port} not ready after {duration:?}")]
    NotReady { port: u16, duration: Duration },

    /// start() called while the previous child is still owned
    #[error("Server on port {port} is already running")]
    AlreadyRunning { port: u16 },

    /// Something else already accepts connections on the port
    #[error("Port {port} is already in use by another process")]
    PortInUse { port: u16 },

    /// Data directory preparation failed
    #[error("Failed to prepare data directory {path}")]
    DataDir {
        port: u16,
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to stop server on port {port}")]
    StopFailed {
        port: u16,
        #[source]
        source: std::io::Error,
    },

    #[error("Server on port {port} did not exit within {duration:?}")]
    StopTimeout { port: u16, duration: Duration },
}

impl ProcessError {
    pub fn port(&self) -> Option<u16> {
        match self {
            ProcessError::Spawn { port, .. }
            | ProcessError::Exited { port, .. }
            | ProcessError::NotReady { port, .. }
            | ProcessError::AlreadyRunning { port }
            | ProcessError::PortInUse { port }
            | ProcessError::DataDir { port, .. }
            | ProcessError::StopFailed { port, .. }
            | ProcessError::StopTimeout { port, .. } => Some(*port),
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum AdminError {
    /// Wire client failures (connection refused, protocol errors, error replies)
    #[error("Admin client error: {0}")]
    Client(#[from] fred::error::Error),

    /// Connect or command exceeded its bound
    #[error("Admin request to port {port} timed out after {duration:?}")]
    Timeout { port: u16, duration: Duration },

    /// Node answered with an error reply
    #[error("Node on port {port} rejected command: {message}")]
    Rejected { port: u16, message: String },

    #[error(transparent)]
    Parse(#[from] ParseError),
}

impl AdminError {
    pub fn port(&self) -> Option<u16> {
        match self {
            AdminError::Timeout { port, .. } | AdminError::Rejected { port, .. } => Some(*port),
            _ => None,
        }
    }
}

/// Errors that can occur when parsing cluster command replies.
#[derive(Debug, thiserror::Error)]
pub enum ParseError {
    #[error("Invalid cluster info format: {0}")]
    InvalidClusterInfo(String),

    #[error("Missing required field: {0}")]
    MissingField(String),
}

#[derive(Debug, thiserror::Error)]
pub enum BootstrapError {
    /// Topology without masters cannot be bootstrapped
    #[error("Cluster topology contains no master nodes")]
    NoMasters,

    /// MEET or ADDSLOTS failed against a master
    #[error("Failed creating master instance at port: {port}")]
    Master {
        port: u16,
        #[source]
        source: Box<Error>,
    },

    /// MEET failed against a slave
    #[error("Failed creating slave instance at port: {port}")]
    Slave {
        port: u16,
        #[source]
        source: Box<Error>,
    },

    /// REPLICATE failed against a slave
    #[error("Failed attaching replica at port {port} to master {master_port}")]
    Replica {
        port: u16,
        master_port: u16,
        #[source]
        source: Box<Error>,
    },

    /// Gossip did not settle within the configured bound
    #[error("Cluster did not converge during {phase} phase: node {port} still pending after {timeout:?}")]
    ConvergenceTimeout {
        phase: &'static str,
        port: u16,
        timeout: Duration,
    },
}

impl BootstrapError {
    pub fn port(&self) -> Option<u16> {
        match self {
            BootstrapError::NoMasters => None,
            BootstrapError::Master { port, .. }
            | BootstrapError::Slave { port, .. }
            | BootstrapError::Replica { port, .. }
            | BootstrapError::ConvergenceTimeout { port, .. } => Some(*port),
        }
    }
}
