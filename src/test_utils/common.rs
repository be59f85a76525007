use std::net::Ipv4Addr;
use std::net::TcpListener;

use crate::admin::ClusterInfo;
use crate::admin::ClusterState;
use crate::ReplicationGroup;

static LOGGER_INIT: once_cell::sync::Lazy<()> = once_cell::sync::Lazy::new(|| {
    env_logger::init();
});

pub fn enable_logger() {
    *LOGGER_INIT;
    println!("setup logger for unit test.");
}

/// A port nothing listens on right now
pub fn free_port() -> u16 {
    let listener = TcpListener::bind((Ipv4Addr::LOCALHOST, 0)).unwrap();
    listener.local_addr().unwrap().port()
}

pub fn group(
    name: &str,
    master_port: u16,
    slave_ports: Vec<u16>,
) -> ReplicationGroup {
    ReplicationGroup {
        master_name: name.to_string(),
        master_port,
        slave_ports,
    }
}

/// What a node reports once the whole cluster agrees
pub fn converged_info(known_nodes: u32) -> ClusterInfo {
    ClusterInfo {
        state: ClusterState::Ok,
        slots_assigned: 16384,
        slots_ok: 16384,
        slots_pfail: 0,
        slots_fail: 0,
        known_nodes,
        cluster_size: known_nodes,
        current_epoch: known_nodes as u64,
    }
}

/// What a node reports right after start
pub fn fresh_info() -> ClusterInfo {
    ClusterInfo {
        state: ClusterState::Fail,
        slots_assigned: 0,
        slots_ok: 0,
        slots_pfail: 0,
        slots_fail: 0,
        known_nodes: 1,
        cluster_size: 0,
        current_epoch: 0,
    }
}
