use std::sync::atomic::AtomicU32;
use std::sync::atomic::Ordering;

use super::PortProvider;
use crate::PortError;
use crate::Result;

/// Hands out `base, base + 1, base + 2, ...`
#[derive(Debug)]
pub struct SequentialPortProvider {
    base: u16,
    offset: AtomicU32,
}

impl SequentialPortProvider {
    pub fn new(base: u16) -> Self {
        Self {
            base,
            offset: AtomicU32::new(0),
        }
    }
}

impl PortProvider for SequentialPortProvider {
    fn next(&self) -> Result<u16> {
        let offset = self.offset.fetch_add(1, Ordering::SeqCst);
        let port = self.base as u32 + offset;
        u16::try_from(port).map_err(|_| {
            PortError::OutOfRange {
                base: self.base,
                offset,
            }
            .into()
        })
    }
}
