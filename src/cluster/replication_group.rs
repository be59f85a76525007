use tracing::debug;

use crate::PortProvider;
use crate::Result;

/// One master and its slaves, with ports fixed at plan time
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReplicationGroup {
    pub master_name: String,
    pub master_port: u16,
    pub slave_ports: Vec<u16>,
}

impl ReplicationGroup {
    /// Draws `1 + slave_count` ports from `provider`, master first.
    ///
    /// Provider errors are returned as-is; nothing is retried.
    pub fn plan(
        master_name: impl Into<String>,
        slave_count: usize,
        provider: &dyn PortProvider,
    ) -> Result<Self> {
        let master_name = master_name.into();
        let master_port = provider.next()?;
        let slave_ports = (0..slave_count)
            .map(|_| provider.next())
            .collect::<Result<Vec<_>>>()?;

        debug!(
            "planned group {}: master {} slaves {:?}",
            master_name, master_port, slave_ports
        );
        Ok(Self {
            master_name,
            master_port,
            slave_ports,
        })
    }

    /// Master port followed by slave ports
    pub fn ports(&self) -> Vec<u16> {
        std::iter::once(self.master_port)
            .chain(self.slave_ports.iter().copied())
            .collect()
    }
}
