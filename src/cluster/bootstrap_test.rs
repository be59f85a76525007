use std::sync::Arc;
use std::time::Duration;

use tokio::time::Instant;

use super::*;
use crate::test_utils::enable_logger;
use crate::test_utils::fresh_info;
use crate::test_utils::group;
use crate::test_utils::AdminCall;
use crate::test_utils::FailPoint;
use crate::test_utils::RecordingAdmin;
use crate::BackoffPolicy;
use crate::BootstrapConfig;
use crate::BootstrapError;
use crate::ConvergenceStrategy;
use crate::Error;

const HOST: &str = "127.0.0.1";

fn three_by_one() -> ClusterTopology {
    ClusterTopology::from_groups(vec![
        group("master1", 7001, vec![8001]),
        group("master2", 7002, vec![8002]),
        group("master3", 7003, vec![8003]),
    ])
}

fn poll_config() -> BootstrapConfig {
    BootstrapConfig {
        convergence: ConvergenceStrategy::Poll,
        poll: BackoffPolicy::new(500, 10, 100),
        ..BootstrapConfig::default()
    }
}

fn bootstrap(
    admin: &RecordingAdmin,
    config: BootstrapConfig,
) -> ClusterBootstrap {
    ClusterBootstrap::new(Arc::new(admin.clone()), HOST, config)
}

#[tokio::test]
async fn every_node_but_the_seed_meets_the_seed() {
    enable_logger();
    let admin = RecordingAdmin::new();

    bootstrap(&admin, poll_config()).run(&three_by_one()).await.unwrap();

    assert_eq!(
        admin.meets(),
        vec![(7002, 7001), (7003, 7001), (8001, 7001), (8002, 7001), (8003, 7001)]
    );
    assert!(admin.calls().iter().all(|c| match c {
        AdminCall::Meet { host, .. } => host == HOST,
        _ => true,
    }));
}

#[tokio::test]
async fn masters_claim_their_slots_in_one_batch() {
    let admin = RecordingAdmin::new();
    let topology = three_by_one();

    bootstrap(&admin, poll_config()).run(&topology).await.unwrap();

    let batches: Vec<(u16, Vec<u16>)> = admin
        .calls()
        .into_iter()
        .filter_map(|c| match c {
            AdminCall::AddSlots { port, slots } => Some((port, slots)),
            _ => None,
        })
        .collect();
    assert_eq!(
        batches,
        vec![
            (7001, slots_for_master(0, 3)),
            (7002, slots_for_master(1, 3)),
            (7003, slots_for_master(2, 3)),
        ]
    );
}

#[tokio::test]
async fn slaves_replicate_their_group_master() {
    let admin = RecordingAdmin::new();

    bootstrap(&admin, poll_config()).run(&three_by_one()).await.unwrap();

    let replicas: Vec<(u16, String)> = admin
        .calls()
        .into_iter()
        .filter_map(|c| match c {
            AdminCall::Replicate { port, node_id } => Some((port, node_id)),
            _ => None,
        })
        .collect();
    assert_eq!(
        replicas,
        vec![
            (8001, RecordingAdmin::node_id(7001)),
            (8002, RecordingAdmin::node_id(7002)),
            (8003, RecordingAdmin::node_id(7003)),
        ]
    );
}

#[tokio::test]
async fn replica_attachment_can_be_disabled() {
    let admin = RecordingAdmin::new();
    let config = BootstrapConfig {
        attach_replicas: false,
        ..poll_config()
    };

    bootstrap(&admin, config).run(&three_by_one()).await.unwrap();

    assert_eq!(admin.count(|c| matches!(c, AdminCall::MyId { .. })), 0);
    assert_eq!(admin.count(|c| matches!(c, AdminCall::Replicate { .. })), 0);
    assert_eq!(admin.meets().len(), 5);
}

#[tokio::test]
async fn every_opened_connection_is_closed() {
    let admin = RecordingAdmin::new();
    admin.fail_on(8002, FailPoint::Meet);

    let _ = bootstrap(&admin, poll_config()).run(&three_by_one()).await;

    let opened = admin.count(|c| matches!(c, AdminCall::Connect { .. }));
    let closed = admin.count(|c| matches!(c, AdminCall::Close { .. }));
    assert!(opened > 0);
    assert_eq!(opened, closed);
}

#[tokio::test]
async fn master_failure_names_port_and_stops_the_sequence() {
    let admin = RecordingAdmin::new();
    admin.fail_on(7002, FailPoint::AddSlots);

    let err = bootstrap(&admin, poll_config())
        .run(&three_by_one())
        .await
        .unwrap_err();

    assert!(matches!(err, Error::Bootstrap(BootstrapError::Master { port: 7002, .. })));
    assert_eq!(err.failing_port(), Some(7002));
    assert!(admin.calls().contains(&AdminCall::Close { port: 7002 }));
    assert_eq!(admin.count(|c| matches!(c, AdminCall::Connect { port: 7003 })), 0);
}

#[tokio::test]
async fn unreachable_master_is_a_master_failure() {
    let admin = RecordingAdmin::new();
    admin.fail_on(7001, FailPoint::Connect);

    let err = bootstrap(&admin, poll_config())
        .run(&three_by_one())
        .await
        .unwrap_err();

    assert_eq!(err.failing_port(), Some(7001));
    assert!(admin.meets().is_empty());
}

#[tokio::test]
async fn slave_meet_failure_is_a_slave_failure() {
    let admin = RecordingAdmin::new();
    admin.fail_on(8002, FailPoint::Meet);

    let err = bootstrap(&admin, poll_config())
        .run(&three_by_one())
        .await
        .unwrap_err();

    assert!(matches!(err, Error::Bootstrap(BootstrapError::Slave { port: 8002, .. })));
    assert_eq!(admin.meets().last(), Some(&(8002, 7001)));
}

#[tokio::test]
async fn replicate_failure_reports_slave_and_master() {
    let admin = RecordingAdmin::new();
    admin.fail_on(8003, FailPoint::Replicate);

    let err = bootstrap(&admin, poll_config())
        .run(&three_by_one())
        .await
        .unwrap_err();

    assert!(matches!(
        err,
        Error::Bootstrap(BootstrapError::Replica {
            port: 8003,
            master_port: 7003,
            ..
        })
    ));
}

#[tokio::test]
async fn empty_topology_has_no_seed() {
    let admin = RecordingAdmin::new();

    let err = bootstrap(&admin, poll_config())
        .run(&ClusterTopology::default())
        .await
        .unwrap_err();

    assert!(matches!(err, Error::Bootstrap(BootstrapError::NoMasters)));
    assert!(admin.calls().is_empty());
}

#[tokio::test(start_paused = true)]
async fn fixed_strategy_sleeps_per_master_then_per_phase() {
    let admin = RecordingAdmin::new();
    let config = BootstrapConfig {
        convergence: ConvergenceStrategy::Fixed,
        ..BootstrapConfig::default()
    };

    let started = Instant::now();
    bootstrap(&admin, config).run(&three_by_one()).await.unwrap();
    let elapsed = started.elapsed();

    // 3 x 300ms for masters, 500ms for slaves, 500ms for replicas
    assert!(elapsed >= Duration::from_millis(1900), "elapsed {:?}", elapsed);
    assert!(elapsed < Duration::from_millis(2000), "elapsed {:?}", elapsed);
    // one membership check on every node before REPLICATE
    assert_eq!(admin.count(|c| matches!(c, AdminCall::Info { .. })), 6);
}

#[tokio::test(start_paused = true)]
async fn fixed_strategy_waits_for_membership_before_replicate() {
    let admin = RecordingAdmin::new();
    // the slave never learns about the other nodes
    admin.report_info(8002, fresh_info());
    let config = BootstrapConfig {
        convergence: ConvergenceStrategy::Fixed,
        poll: BackoffPolicy::new(500, 10, 100),
        ..BootstrapConfig::default()
    };

    let err = bootstrap(&admin, config).run(&three_by_one()).await.unwrap_err();

    match err {
        Error::Bootstrap(BootstrapError::ConvergenceTimeout { phase, port, .. }) => {
            assert_eq!(phase, "slaves");
            assert_eq!(port, 8002);
        }
        other => panic!("unexpected error: {:?}", other),
    }
    assert_eq!(admin.count(|c| matches!(c, AdminCall::Replicate { .. })), 0);
}

#[tokio::test(start_paused = true)]
async fn fixed_strategy_without_replicas_never_polls() {
    let admin = RecordingAdmin::new();
    let config = BootstrapConfig {
        convergence: ConvergenceStrategy::Fixed,
        attach_replicas: false,
        ..BootstrapConfig::default()
    };

    bootstrap(&admin, config).run(&three_by_one()).await.unwrap();

    assert_eq!(admin.count(|c| matches!(c, AdminCall::Info { .. })), 0);
}

#[tokio::test(start_paused = true)]
async fn lagging_master_times_out_the_master_phase() {
    let admin = RecordingAdmin::new();
    admin.report_info(7002, fresh_info());

    let err = bootstrap(&admin, poll_config())
        .run(&three_by_one())
        .await
        .unwrap_err();

    match err {
        Error::Bootstrap(BootstrapError::ConvergenceTimeout { phase, port, timeout }) => {
            assert_eq!(phase, "masters");
            assert_eq!(port, 7002);
            assert_eq!(timeout, Duration::from_millis(500));
        }
        other => panic!("unexpected error: {:?}", other),
    }
    assert!(admin.meets().iter().all(|(port, _)| *port < 8000));
}

#[tokio::test(start_paused = true)]
async fn slave_phase_waits_for_full_membership() {
    let admin = RecordingAdmin::new();
    // masters see each other but the slave view never grows
    admin.report_info(8001, crate::test_utils::converged_info(3));

    let err = bootstrap(&admin, poll_config())
        .run(&three_by_one())
        .await
        .unwrap_err();

    assert!(matches!(
        err,
        Error::Bootstrap(BootstrapError::ConvergenceTimeout {
            phase: "slaves",
            port: 8001,
            ..
        })
    ));
}
