use std::io::ErrorKind;
use std::process::Stdio;

use async_trait::async_trait;
use tokio::process::Child;
use tokio::process::Command;
use tokio::sync::Mutex;
use tokio::time::sleep;
use tokio::time::timeout;
use tokio::time::Instant;
use tracing::debug;
use tracing::info;
use tracing::warn;

use super::RedisInstance;
use super::RedisServerBuilder;
use super::RedisServerConfig;
use crate::utils::net::address_str;
use crate::utils::net::is_server_ready;
use crate::ProcessError;
use crate::Result;

enum ProcessState {
    NotStarted,
    Running(Child),
    Stopped,
}

/// One `redis-server` child process.
///
/// The child is spawned with `kill_on_drop`, so dropping a running server
/// never leaves an orphan behind.
pub struct RedisServer {
    config: RedisServerConfig,
    state: Mutex<ProcessState>,
}

impl std::fmt::Debug for RedisServer {
    fn fmt(
        &self,
        f: &mut std::fmt::Formatter<'_>,
    ) -> std::fmt::Result {
        f.debug_struct("RedisServer")
            .field("port", &self.config.port)
            .field("data_dir", &self.config.data_dir)
            .finish()
    }
}

impl RedisServer {
    pub fn new(config: RedisServerConfig) -> Self {
        Self {
            config,
            state: Mutex::new(ProcessState::NotStarted),
        }
    }

    pub fn builder() -> RedisServerBuilder {
        RedisServerBuilder::new()
    }

    pub fn config(&self) -> &RedisServerConfig {
        &self.config
    }

    pub fn port(&self) -> u16 {
        self.config.port
    }

    /// Creates the data directory and drops a node-id file left by an
    /// earlier run; a stale file would make the node rejoin an old cluster.
    async fn prepare_data_dir(&self) -> Result<()> {
        let port = self.config.port;
        let dir = &self.config.data_dir;
        tokio::fs::create_dir_all(dir)
            .await
            .map_err(|source| ProcessError::DataDir {
                port,
                path: dir.clone(),
                source,
            })?;

        if let Some(path) = self.config.cluster_config_path() {
            match tokio::fs::remove_file(&path).await {
                Ok(()) => debug!("removed stale cluster config {}", path.display()),
                Err(e) if e.kind() == ErrorKind::NotFound => {}
                Err(source) => return Err(ProcessError::DataDir { port, path, source }.into()),
            }
        }
        Ok(())
    }

    fn spawn(&self) -> Result<Child> {
        let args = self.config.command_args();
        debug!("spawning {} {:?}", self.config.binary.display(), args);

        Command::new(&self.config.binary)
            .args(&args)
            .current_dir(&self.config.data_dir)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .kill_on_drop(true)
            .spawn()
            .map_err(|source| {
                ProcessError::Spawn {
                    port: self.config.port,
                    binary: self.config.binary.clone(),
                    source,
                }
                .into()
            })
    }

    /// Probes the client port with backoff until it accepts connections,
    /// failing fast if the child exits first.
    async fn wait_until_ready(
        &self,
        child: &mut Child,
    ) -> Result<()> {
        let port = self.config.port;
        let addr = address_str(&self.config.host, port);
        let policy = &self.config.startup;
        let started = Instant::now();
        let deadline = started + policy.timeout();
        let mut delay = policy.base_delay();

        loop {
            match child.try_wait() {
                Ok(Some(status)) => {
                    return Err(ProcessError::Exited {
                        port,
                        status: status.to_string(),
                    }
                    .into())
                }
                Ok(None) => {}
                Err(e) => {
                    return Err(ProcessError::Exited {
                        port,
                        status: e.to_string(),
                    }
                    .into())
                }
            }

            if is_server_ready(&addr).await {
                debug!("server {} ready after {:?}", addr, started.elapsed());
                return Ok(());
            }

            let now = Instant::now();
            if now >= deadline {
                return Err(ProcessError::NotReady {
                    port,
                    duration: policy.timeout(),
                }
                .into());
            }
            sleep(delay.min(deadline - now)).await;
            delay = (delay * 2).min(policy.max_delay());
        }
    }

    async fn terminate(
        &self,
        mut child: Child,
    ) -> Result<()> {
        let port = self.config.port;
        match child.try_wait() {
            Ok(Some(status)) => {
                warn!("server on port {} had already exited: {}", port, status);
                return Ok(());
            }
            Ok(None) => {}
            Err(source) => return Err(ProcessError::StopFailed { port, source }.into()),
        }

        child
            .start_kill()
            .map_err(|source| ProcessError::StopFailed { port, source })?;

        match timeout(self.config.stop_timeout, child.wait()).await {
            Ok(Ok(status)) => {
                info!("server on port {} stopped ({})", port, status);
                Ok(())
            }
            Ok(Err(source)) => Err(ProcessError::StopFailed { port, source }.into()),
            Err(_) => Err(ProcessError::StopTimeout {
                port,
                duration: self.config.stop_timeout,
            }
            .into()),
        }
    }
}

#[async_trait]
impl RedisInstance for RedisServer {
    async fn is_active(&self) -> bool {
        let mut state = self.state.lock().await;
        match &mut *state {
            ProcessState::Running(child) => matches!(child.try_wait(), Ok(None)),
            _ => false,
        }
    }

    async fn start(&self) -> Result<()> {
        let port = self.config.port;
        let mut state = self.state.lock().await;
        if matches!(*state, ProcessState::Running(_)) {
            return Err(ProcessError::AlreadyRunning { port }.into());
        }

        self.prepare_data_dir().await?;
        if is_server_ready(&address_str(&self.config.host, port)).await {
            return Err(ProcessError::PortInUse { port }.into());
        }

        let mut child = self.spawn()?;
        if let Err(e) = self.wait_until_ready(&mut child).await {
            if let Err(kill_err) = child.start_kill() {
                debug!("failed to kill unready server on port {}: {}", port, kill_err);
            }
            if let Err(wait_err) = child.wait().await {
                debug!("failed to reap unready server on port {}: {}", port, wait_err);
            }
            *state = ProcessState::Stopped;
            return Err(e);
        }

        info!(
            "redis server started on {}:{} (pid {:?})",
            self.config.host,
            port,
            child.id()
        );
        *state = ProcessState::Running(child);
        Ok(())
    }

    async fn stop(&self) -> Result<()> {
        let mut state = self.state.lock().await;
        match std::mem::replace(&mut *state, ProcessState::Stopped) {
            ProcessState::Running(child) => self.terminate(child).await,
            previous => {
                debug!("server on port {} not running, nothing to stop", self.config.port);
                *state = previous;
                Ok(())
            }
        }
    }

    fn ports(&self) -> Vec<u16> {
        vec![self.config.port]
    }
}
