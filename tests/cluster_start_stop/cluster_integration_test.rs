use redis_embedded_cluster::admin::ClusterState;
use redis_embedded_cluster::Error;
use redis_embedded_cluster::PortError;
use redis_embedded_cluster::RedisCluster;
use redis_embedded_cluster::RedisInstance;
use redis_embedded_cluster::RedisServerBuilder;
use serial_test::serial;

use crate::common::connect;
use crate::common::key_owned_by;
use crate::common::redis_server_available;

/// Case 1: three groups on fixed ports, one key written to and read back
/// from each master, then the cluster is stopped twice.
#[tokio::test]
#[serial]
async fn test_three_masters_with_slaves_on_predefined_ports() {
    crate::enable_logger();
    if !redis_server_available() {
        return;
    }

    let cluster = RedisCluster::builder()
        .server_ports(vec![7001, 8001, 7002, 8002, 7003, 8003])
        .replication_group("master1", 1)
        .replication_group("master2", 1)
        .replication_group("master3", 1)
        .build()
        .unwrap();

    assert_eq!(cluster.master_ports(), &[7001, 7002, 7003]);
    assert_eq!(cluster.slave_ports(), &[8001, 8002, 8003]);

    cluster.start().await.unwrap();
    assert!(cluster.is_active().await);

    for (index, &port) in cluster.master_ports().iter().enumerate() {
        let conn = connect(port).await.unwrap();

        let info = conn.cluster_info().await.unwrap();
        assert_eq!(info.state, ClusterState::Ok);
        assert_eq!(info.known_nodes, 6);

        let key = key_owned_by(conn.as_ref(), index, 3).await.unwrap();
        conn.set(&key, "value").await.unwrap();
        assert_eq!(conn.get(&key).await.unwrap().as_deref(), Some("value"));
        conn.close().await.unwrap();
    }

    cluster.stop().await.unwrap();
    assert!(!cluster.is_active().await);
    cluster.stop().await.unwrap();
}

/// Case 2: OS-assigned ports, a custom setting on every node, and a
/// restart after stop.
#[tokio::test]
#[serial]
async fn test_ephemeral_cluster_restarts_after_stop() {
    crate::enable_logger();
    if !redis_server_available() {
        return;
    }

    let cluster = RedisCluster::builder()
        .with_server_builder(RedisServerBuilder::new().setting("maxmemory", "64mb"))
        .ephemeral()
        .replication_group("master1", 1)
        .replication_group("master2", 1)
        .replication_group("master3", 0)
        .build()
        .unwrap();

    cluster.start().await.unwrap();
    let seed = connect(cluster.master_ports()[0]).await.unwrap();
    assert_eq!(seed.cluster_info().await.unwrap().slots_assigned, 16384);
    seed.close().await.unwrap();
    cluster.stop().await.unwrap();

    // node-id files of the first run are discarded, so the cluster forms again
    cluster.start().await.unwrap();
    assert!(cluster.is_active().await);
    cluster.stop().await.unwrap();
}

/// Case 3: a port list too short for the declared groups fails before any
/// process is spawned.
#[tokio::test]
async fn test_short_port_list_spawns_nothing() {
    crate::enable_logger();

    let result = RedisCluster::builder()
        .server_ports(vec![7001, 8001, 7002])
        .replication_group("master1", 1)
        .replication_group("master2", 1)
        .build();

    assert!(matches!(result, Err(Error::Port(PortError::Exhausted { supplied: 3 }))));
}
