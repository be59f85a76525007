use std::collections::HashSet;

use serde::Deserialize;
use serde::Serialize;

use crate::Error;
use crate::Result;

/// Port provider selection, as read from settings
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum PortsConfig {
    Sequential { base: u16 },
    Ephemeral,
    Predefined { ports: Vec<u16> },
}

impl Default for PortsConfig {
    fn default() -> Self {
        PortsConfig::Sequential { base: 7000 }
    }
}

/// One replication group declaration
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct GroupConfig {
    pub name: String,
    #[serde(default)]
    pub slaves: usize,
}

/// Cluster shape used by the command line entry point
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct TopologyConfig {
    #[serde(default)]
    pub ports: PortsConfig,

    #[serde(default = "default_groups")]
    pub groups: Vec<GroupConfig>,
}

impl Default for TopologyConfig {
    fn default() -> Self {
        Self {
            ports: PortsConfig::default(),
            groups: default_groups(),
        }
    }
}

impl TopologyConfig {
    /// Number of ports the declared groups will consume
    pub fn required_ports(&self) -> usize {
        self.groups.iter().map(|g| 1 + g.slaves).sum()
    }

    pub fn validate(&self) -> Result<()> {
        if self.groups.is_empty() {
            return Err(Error::InvalidConfig(
                "topology.groups must contain at least one replication group".into(),
            ));
        }

        let mut names = HashSet::new();
        for group in &self.groups {
            if group.name.is_empty() {
                return Err(Error::InvalidConfig("replication group name cannot be empty".into()));
            }
            if !names.insert(group.name.as_str()) {
                return Err(Error::InvalidConfig(format!(
                    "Duplicate replication group name {}",
                    group.name
                )));
            }
        }

        match &self.ports {
            PortsConfig::Sequential { base } if *base == 0 => Err(Error::InvalidConfig(
                "topology.ports.base must specify a non-zero port".into(),
            )),
            PortsConfig::Predefined { ports } if ports.contains(&0) => Err(Error::InvalidConfig(
                "topology.ports.ports cannot contain port 0".into(),
            )),
            _ => Ok(()),
        }
    }
}

fn default_groups() -> Vec<GroupConfig> {
    (1..=3)
        .map(|i| GroupConfig {
            name: format!("master{}", i),
            slaves: 1,
        })
        .collect()
}
