use redis_embedded_cluster::ClusterSettings;
use redis_embedded_cluster::Error;
use redis_embedded_cluster::RedisClusterBuilder;
use redis_embedded_cluster::RedisInstance;
use redis_embedded_cluster::Result;
use tokio::signal::unix::signal;
use tokio::signal::unix::SignalKind;
use tracing::error;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[tokio::main(flavor = "multi_thread", worker_threads = 2)]
async fn main() -> Result<()> {
    init_observability();

    let settings = ClusterSettings::new()?.validate()?;
    info!("loaded settings: {:?}", settings);

    let cluster = RedisClusterBuilder::from_settings(&settings).build()?;
    cluster.start().await?;

    println!("masters: {:?}", cluster.master_ports());
    println!("slaves:  {:?}", cluster.slave_ports());
    info!("cluster running. Waiting for CTRL+C signal...");

    if let Err(e) = graceful_shutdown().await {
        error!("signal handling failed: {:?}", e);
    }

    if let Err(e) = cluster.stop().await {
        error!("cluster stop failed: {}", e);
        return Err(e);
    }

    println!("Exiting program.");
    Ok(())
}

async fn graceful_shutdown() -> Result<()> {
    let mut sigint = signal(SignalKind::interrupt()).map_err(Error::Io)?;
    let mut sigterm = signal(SignalKind::terminate()).map_err(Error::Io)?;
    tokio::select! {
        _ = sigint.recv() => {
            info!("SIGINT detected.");
        },
        _ = sigterm.recv() => {
            info!("SIGTERM detected.");
        },
        _ = tokio::signal::ctrl_c() => {
            info!("Ctrl+C detected.");
        },
    }

    info!("Shutting down cluster..");
    Ok(())
}

fn init_observability() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_target(false)
        .init();
}
