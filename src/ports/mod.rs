//! Port allocation for spawned nodes.
//!
//! Every replication group draws its ports from a [`PortProvider`] captured
//! at the moment the group is declared, so a single builder can mix
//! predefined, sequential and OS-assigned ports across groups.
mod ephemeral;
mod predefined;
mod sequential;
pub use ephemeral::*;
pub use predefined::*;
pub use sequential::*;


use std::sync::Arc;

#[cfg(test)]
use mockall::automock;

use crate::PortsConfig;
use crate::Result;

/// Supplies the next usable port number.
///
/// Implementations keep their own cursor; callers share a provider through
/// `Arc` when several groups should draw from the same sequence.
#[cfg_attr(test, automock)]
pub trait PortProvider: Send + Sync {
    /// Returns a port not handed out before by this provider.
    ///
    /// # Errors
    /// - [`crate::PortError::Exhausted`] when a predefined list is consumed
    /// - [`crate::PortError::Unavailable`] when the OS refuses a port
    /// - [`crate::PortError::OutOfRange`] when a sequence passes 65535
    fn next(&self) -> Result<u16>;
}

impl PortsConfig {
    /// Instantiates the provider described by settings.
    pub fn provider(&self) -> Arc<dyn PortProvider> {
        match self {
            PortsConfig::Sequential { base } => Arc::new(SequentialPortProvider::new(*base)),
            PortsConfig::Ephemeral => Arc::new(EphemeralPortProvider::for_cluster()),
            PortsConfig::Predefined { ports } => Arc::new(PredefinedPortProvider::new(ports.clone())),
        }
    }
}
