//! Node process handles.
//!
//! A [`RedisInstance`] is anything with a start/stop lifecycle and a set of
//! exposed ports. [`RedisServer`] wraps a single `redis-server` child; the
//! cluster aggregate holds a list of instances and is one itself.
mod builder;
mod redis_server;
pub use builder::*;
pub use redis_server::*;


use async_trait::async_trait;

use crate::Result;

#[async_trait]
pub trait RedisInstance: Send + Sync {
    /// Non-blocking status probe.
    async fn is_active(&self) -> bool;

    /// Spawns the process and blocks until it accepts connections.
    ///
    /// # Errors
    /// - [`crate::ProcessError::AlreadyRunning`] if a previous start was not stopped
    /// - [`crate::ProcessError::Spawn`] if the binary cannot be launched
    /// - [`crate::ProcessError::Exited`] if the process dies before becoming ready
    /// - [`crate::ProcessError::NotReady`] if the readiness deadline passes
    async fn start(&self) -> Result<()>;

    /// Terminates the process and waits for it to exit. Safe to call twice.
    async fn stop(&self) -> Result<()>;

    /// Client-facing ports this instance exposes.
    fn ports(&self) -> Vec<u16>;
}
