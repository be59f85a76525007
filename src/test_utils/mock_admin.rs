use std::collections::HashMap;
use std::collections::HashSet;
use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::Mutex;

use super::converged_info;
use crate::admin::AdminConnection;
use crate::admin::AdminConnector;
use crate::admin::ClusterInfo;
use crate::AdminError;
use crate::Result;

/// One admin interaction seen by [`RecordingAdmin`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AdminCall {
    Connect { port: u16 },
    Meet { port: u16, host: String, target: u16 },
    AddSlots { port: u16, slots: Vec<u16> },
    MyId { port: u16 },
    Replicate { port: u16, node_id: String },
    Info { port: u16 },
    Close { port: u16 },
}

/// Step at which a node should reject the request
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FailPoint {
    Connect,
    Meet,
    AddSlots,
    MyId,
    Replicate,
}

#[derive(Default)]
struct Recorder {
    calls: Mutex<Vec<AdminCall>>,
    failures: Mutex<HashSet<(u16, FailPoint)>>,
    infos: Mutex<HashMap<u16, ClusterInfo>>,
}

impl Recorder {
    fn record(
        &self,
        call: AdminCall,
    ) {
        self.calls.lock().push(call);
    }

    fn check(
        &self,
        port: u16,
        point: FailPoint,
    ) -> Result<()> {
        if self.failures.lock().contains(&(port, point)) {
            return Err(AdminError::Rejected {
                port,
                message: format!("injected {:?} failure", point),
            }
            .into());
        }
        Ok(())
    }
}

/// In-memory admin connector recording every call in order.
///
/// Nodes report a converged `CLUSTER INFO` unless told otherwise and
/// answer `CLUSTER MYID` with `node-<port>`.
#[derive(Clone, Default)]
pub struct RecordingAdmin {
    recorder: Arc<Recorder>,
}

impl RecordingAdmin {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn fail_on(
        &self,
        port: u16,
        point: FailPoint,
    ) {
        self.recorder.failures.lock().insert((port, point));
    }

    pub fn report_info(
        &self,
        port: u16,
        info: ClusterInfo,
    ) {
        self.recorder.infos.lock().insert(port, info);
    }

    pub fn calls(&self) -> Vec<AdminCall> {
        self.recorder.calls.lock().clone()
    }

    pub fn meets(&self) -> Vec<(u16, u16)> {
        self.calls()
            .into_iter()
            .filter_map(|c| match c {
                AdminCall::Meet { port, target, .. } => Some((port, target)),
                _ => None,
            })
            .collect()
    }

    pub fn count(
        &self,
        pred: impl Fn(&AdminCall) -> bool,
    ) -> usize {
        self.calls().iter().filter(|c| pred(c)).count()
    }

    pub fn node_id(port: u16) -> String {
        format!("node-{}", port)
    }
}

#[async_trait]
impl AdminConnector for RecordingAdmin {
    async fn connect(
        &self,
        _host: &str,
        port: u16,
    ) -> Result<Box<dyn AdminConnection>> {
        self.recorder.record(AdminCall::Connect { port });
        self.recorder.check(port, FailPoint::Connect)?;
        Ok(Box::new(RecordingConnection {
            port,
            recorder: self.recorder.clone(),
        }))
    }
}

struct RecordingConnection {
    port: u16,
    recorder: Arc<Recorder>,
}

#[async_trait]
impl AdminConnection for RecordingConnection {
    fn port(&self) -> u16 {
        self.port
    }

    async fn cluster_meet(
        &self,
        host: &str,
        port: u16,
    ) -> Result<()> {
        self.recorder.record(AdminCall::Meet {
            port: self.port,
            host: host.to_string(),
            target: port,
        });
        self.recorder.check(self.port, FailPoint::Meet)
    }

    async fn cluster_add_slots(
        &self,
        slots: Vec<u16>,
    ) -> Result<()> {
        self.recorder.record(AdminCall::AddSlots { port: self.port, slots });
        self.recorder.check(self.port, FailPoint::AddSlots)
    }

    async fn cluster_myid(&self) -> Result<String> {
        self.recorder.record(AdminCall::MyId { port: self.port });
        self.recorder.check(self.port, FailPoint::MyId)?;
        Ok(RecordingAdmin::node_id(self.port))
    }

    async fn cluster_replicate(
        &self,
        node_id: &str,
    ) -> Result<()> {
        self.recorder.record(AdminCall::Replicate {
            port: self.port,
            node_id: node_id.to_string(),
        });
        self.recorder.check(self.port, FailPoint::Replicate)
    }

    async fn cluster_info(&self) -> Result<ClusterInfo> {
        self.recorder.record(AdminCall::Info { port: self.port });
        let info = self.recorder.infos.lock().get(&self.port).cloned();
        Ok(info.unwrap_or_else(|| converged_info(64)))
    }

    async fn cluster_keyslot(
        &self,
        _key: &str,
    ) -> Result<u16> {
        Ok(0)
    }

    async fn set(
        &self,
        _key: &str,
        _value: &str,
    ) -> Result<()> {
        Ok(())
    }

    async fn get(
        &self,
        _key: &str,
    ) -> Result<Option<String>> {
        Ok(None)
    }

    async fn close(&self) -> Result<()> {
        self.recorder.record(AdminCall::Close { port: self.port });
        Ok(())
    }
}
