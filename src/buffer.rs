//! Receive-side accumulation buffer for the master state machine.
//!
//! One exchange collects one response; the machine is consumed when the
//! terminator arrives, so the buffer only ever grows.

use crate::frame::MAX_WIRE;

#[derive(Debug)]
pub(crate) struct Buffer {
    data: Vec<u8>,
}

impl Buffer {
    pub fn new() -> Buffer {
        Buffer {
            data: Vec::with_capacity(MAX_WIRE),
        }
    }

    pub fn write(&mut self, bytes: &[u8]) {
        self.data.extend_from_slice(bytes);
    }
}

impl AsRef<[u8]> for Buffer {
    fn as_ref(&self) -> &[u8] {
        &self.data
    }
}
