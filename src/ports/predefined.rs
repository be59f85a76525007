use std::collections::VecDeque;

use parking_lot::Mutex;

use super::PortProvider;
use crate::PortError;
use crate::Result;

/// Consumes a fixed list of ports in the order supplied
#[derive(Debug)]
pub struct PredefinedPortProvider {
    supplied: usize,
    remaining: Mutex<VecDeque<u16>>,
}

impl PredefinedPortProvider {
    pub fn new(ports: impl IntoIterator<Item = u16>) -> Self {
        let remaining: VecDeque<u16> = ports.into_iter().collect();
        Self {
            supplied: remaining.len(),
            remaining: Mutex::new(remaining),
        }
    }

    /// Ports not yet handed out
    pub fn remaining(&self) -> usize {
        self.remaining.lock().len()
    }
}

impl PortProvider for PredefinedPortProvider {
    fn next(&self) -> Result<u16> {
        self.remaining.lock().pop_front().ok_or_else(|| {
            PortError::Exhausted {
                supplied: self.supplied,
            }
            .into()
        })
    }
}
