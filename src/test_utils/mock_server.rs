use std::sync::atomic::AtomicBool;
use std::sync::atomic::AtomicUsize;
use std::sync::atomic::Ordering;
use std::sync::Arc;

use async_trait::async_trait;

use crate::ProcessError;
use crate::RedisInstance;
use crate::Result;

#[derive(Default)]
pub struct InstanceProbe {
    pub active: AtomicBool,
    pub starts: AtomicUsize,
    pub stops: AtomicUsize,
    pub fail_start: AtomicBool,
    pub fail_stop: AtomicBool,
}

/// Process-free [`RedisInstance`] whose state is observable through a
/// shared [`InstanceProbe`].
pub struct FakeInstance {
    port: u16,
    pub probe: Arc<InstanceProbe>,
}

impl FakeInstance {
    pub fn new(port: u16) -> Self {
        Self {
            port,
            probe: Arc::new(InstanceProbe::default()),
        }
    }

    pub fn failing_start(port: u16) -> Self {
        let instance = Self::new(port);
        instance.probe.fail_start.store(true, Ordering::SeqCst);
        instance
    }
}

#[async_trait]
impl RedisInstance for FakeInstance {
    async fn is_active(&self) -> bool {
        self.probe.active.load(Ordering::SeqCst)
    }

    async fn start(&self) -> Result<()> {
        self.probe.starts.fetch_add(1, Ordering::SeqCst);
        if self.probe.active.load(Ordering::SeqCst) {
            return Err(ProcessError::AlreadyRunning { port: self.port }.into());
        }
        if self.probe.fail_start.load(Ordering::SeqCst) {
            return Err(ProcessError::Exited {
                port: self.port,
                status: "exit status: 1".into(),
            }
            .into());
        }
        self.probe.active.store(true, Ordering::SeqCst);
        Ok(())
    }

    async fn stop(&self) -> Result<()> {
        self.probe.stops.fetch_add(1, Ordering::SeqCst);
        if self.probe.fail_stop.load(Ordering::SeqCst) {
            return Err(ProcessError::StopTimeout {
                port: self.port,
                duration: std::time::Duration::from_millis(10),
            }
            .into());
        }
        self.probe.active.store(false, Ordering::SeqCst);
        Ok(())
    }

    fn ports(&self) -> Vec<u16> {
        vec![self.port]
    }
}
