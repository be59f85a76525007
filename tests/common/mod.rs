use std::process::Command;
use std::process::Stdio;

use redis_embedded_cluster::admin::AdminConnection;
use redis_embedded_cluster::admin::AdminConnector;
use redis_embedded_cluster::admin::FredAdminConnector;
use redis_embedded_cluster::slot_owner;
use redis_embedded_cluster::Result;
use tracing::warn;

pub const HOST: &str = "127.0.0.1";

/// End-to-end cases need a real server binary; they pass vacuously without one.
pub fn redis_server_available() -> bool {
    let found = Command::new("redis-server")
        .arg("--version")
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .status()
        .map(|status| status.success())
        .unwrap_or(false);
    if !found {
        warn!("redis-server not found on PATH, skipping");
        println!("redis-server not found on PATH, skipping");
    }
    found
}

pub async fn connect(port: u16) -> Result<Box<dyn AdminConnection>> {
    FredAdminConnector::default().connect(HOST, port).await
}

/// Finds a key whose slot is owned by the master at `index`.
pub async fn key_owned_by(
    conn: &dyn AdminConnection,
    index: usize,
    master_count: usize,
) -> Result<String> {
    for n in 0.. {
        let key = format!("key-{}", n);
        let slot = conn.cluster_keyslot(&key).await?;
        if slot_owner(slot, master_count) == Some(index) {
            return Ok(key);
        }
    }
    unreachable!("slot space is finite")
}
