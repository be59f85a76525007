//! Parsed `CLUSTER INFO` reply.

use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

use crate::ParseError;
use crate::SLOT_COUNT;

/// Health of the cluster as seen by one node
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClusterState {
    Ok,
    Fail,
}

impl FromStr for ClusterState {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "ok" => Ok(ClusterState::Ok),
            "fail" => Ok(ClusterState::Fail),
            _ => Err(ParseError::InvalidClusterInfo(format!(
                "Unknown cluster state: {}",
                s
            ))),
        }
    }
}

impl fmt::Display for ClusterState {
    fn fmt(
        &self,
        f: &mut fmt::Formatter<'_>,
    ) -> fmt::Result {
        match self {
            ClusterState::Ok => write!(f, "ok"),
            ClusterState::Fail => write!(f, "fail"),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ClusterInfo {
    pub state: ClusterState,
    /// Slots bound to some node, as known by this node
    pub slots_assigned: u32,
    pub slots_ok: u32,
    pub slots_pfail: u32,
    pub slots_fail: u32,
    /// Nodes this node has in its table, itself included
    pub known_nodes: u32,
    /// Masters serving at least one slot
    pub cluster_size: u32,
    pub current_epoch: u64,
}

impl ClusterInfo {
    /// Parses the `key:value` lines of `CLUSTER INFO`.
    pub fn parse(info: &str) -> Result<Self, ParseError> {
        let mut raw = HashMap::new();

        for line in info.lines() {
            let line = line.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }
            if let Some((key, value)) = line.split_once(':') {
                raw.insert(key, value.trim());
            }
        }

        let state = raw
            .get("cluster_state")
            .ok_or_else(|| ParseError::MissingField("cluster_state".to_string()))?
            .parse()?;

        let number = |key: &str| -> Result<u64, ParseError> {
            raw.get(key)
                .ok_or_else(|| ParseError::MissingField(key.to_string()))?
                .parse()
                .map_err(|_| ParseError::InvalidClusterInfo(format!("Invalid {} value", key)))
        };

        Ok(ClusterInfo {
            state,
            slots_assigned: number("cluster_slots_assigned")? as u32,
            slots_ok: number("cluster_slots_ok")? as u32,
            slots_pfail: number("cluster_slots_pfail")? as u32,
            slots_fail: number("cluster_slots_fail")? as u32,
            known_nodes: number("cluster_known_nodes")? as u32,
            cluster_size: number("cluster_size")? as u32,
            current_epoch: number("cluster_current_epoch").unwrap_or(0),
        })
    }

    pub fn all_slots_assigned(&self) -> bool {
        self.slots_assigned == SLOT_COUNT as u32
    }

    /// State ok, full slot coverage, nothing failing.
    pub fn is_healthy(&self) -> bool {
        self.state == ClusterState::Ok
            && self.all_slots_assigned()
            && self.slots_fail == 0
            && self.slots_pfail == 0
    }
}
