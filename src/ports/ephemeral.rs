use std::collections::HashSet;
use std::io;
use std::net::Ipv4Addr;
use std::net::TcpListener;

use parking_lot::Mutex;
use tracing::debug;

use super::PortProvider;
use crate::constants::MAX_CLUSTER_CLIENT_PORT;
use crate::PortError;
use crate::Result;

const MAX_BIND_ATTEMPTS: usize = 64;

/// Asks the OS for a free port by binding port 0 and releasing it at once.
///
/// The port is free at the time of the call only; another process may grab
/// it before the node binds it.
#[derive(Debug)]
pub struct EphemeralPortProvider {
    ceiling: u16,
    issued: Mutex<HashSet<u16>>,
}

impl Default for EphemeralPortProvider {
    fn default() -> Self {
        Self::with_ceiling(u16::MAX)
    }
}

impl EphemeralPortProvider {
    pub fn new() -> Self {
        Self::default()
    }

    /// Only hands out ports whose cluster bus port (`port + 10000`) exists.
    pub fn for_cluster() -> Self {
        Self::with_ceiling(MAX_CLUSTER_CLIENT_PORT)
    }

    pub fn with_ceiling(ceiling: u16) -> Self {
        Self {
            ceiling,
            issued: Mutex::new(HashSet::new()),
        }
    }

    fn bind_free_port() -> io::Result<u16> {
        let listener = TcpListener::bind((Ipv4Addr::LOCALHOST, 0))?;
        let port = listener.local_addr()?.port();
        drop(listener);
        Ok(port)
    }
}

impl PortProvider for EphemeralPortProvider {
    fn next(&self) -> Result<u16> {
        for _ in 0..MAX_BIND_ATTEMPTS {
            let port = Self::bind_free_port().map_err(PortError::Unavailable)?;
            if port > self.ceiling {
                debug!("ephemeral port {} above ceiling {}, retrying", port, self.ceiling);
                continue;
            }
            if self.issued.lock().insert(port) {
                return Ok(port);
            }
            debug!("ephemeral port {} already issued, retrying", port);
        }

        Err(PortError::Unavailable(io::Error::new(
            io::ErrorKind::AddrNotAvailable,
            format!(
                "no unused port at or below {} after {} attempts",
                self.ceiling, MAX_BIND_ATTEMPTS
            ),
        ))
        .into())
    }
}
