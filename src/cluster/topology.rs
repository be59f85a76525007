use super::slots_for_master;
use super::ReplicationGroup;

/// Port layout of a built cluster.
///
/// `master_ports[0]` is the seed every other node meets.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ClusterTopology {
    groups: Vec<ReplicationGroup>,
    master_ports: Vec<u16>,
    slave_ports: Vec<u16>,
}

impl ClusterTopology {
    pub fn from_groups(groups: Vec<ReplicationGroup>) -> Self {
        let master_ports = groups.iter().map(|g| g.master_port).collect();
        let slave_ports = groups
            .iter()
            .flat_map(|g| g.slave_ports.iter().copied())
            .collect();
        Self {
            groups,
            master_ports,
            slave_ports,
        }
    }

    pub fn groups(&self) -> &[ReplicationGroup] {
        &self.groups
    }

    pub fn master_ports(&self) -> &[u16] {
        &self.master_ports
    }

    pub fn slave_ports(&self) -> &[u16] {
        &self.slave_ports
    }

    pub fn master_count(&self) -> usize {
        self.master_ports.len()
    }

    pub fn node_count(&self) -> usize {
        self.master_ports.len() + self.slave_ports.len()
    }

    pub fn meet_target(&self) -> Option<u16> {
        self.master_ports.first().copied()
    }

    /// Slots assigned to the master at `index`
    pub fn slots_of(
        &self,
        index: usize,
    ) -> Vec<u16> {
        slots_for_master(index, self.master_count())
    }

    /// Every slave paired with its group's master port, in group order
    pub fn replica_pairs(&self) -> impl Iterator<Item = (u16, u16)> + '_ {
        self.groups
            .iter()
            .flat_map(|g| g.slave_ports.iter().map(move |slave| (*slave, g.master_port)))
    }

    /// Masters then slaves
    pub fn all_ports(&self) -> Vec<u16> {
        self.master_ports
            .iter()
            .chain(self.slave_ports.iter())
            .copied()
            .collect()
    }
}
