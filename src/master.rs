//! Sans-io bus-master half of a request/response exchange.
//!
//! The master owns no I/O. It hands the caller the bytes to put on the
//! bus, then consumes whatever the transport reads back, in arbitrary
//! chunks, until a complete `'\r'`-terminated response has arrived:
//!
//! `Master` → [`SendData`] → [`ReceiveResponse`] → result.
//!
//! One exchange is one pass through the chain; the half-duplex bus never
//! has more than one request outstanding per unit.

use crate::buffer::Buffer;
use crate::codec::ParamValue;
use crate::frame::WireBytes;
use crate::nom_parser::{scan_response, ScanToken};
use crate::packet::{Protocol, Response};
use crate::types::{Flag, Mnemonic, Unit};
use crate::Error;

/// Request builder for one unit.
///
/// # Example
/// ```
/// use owen_proto::{AddressMode, Master, Unit};
/// let master = Master::new(Unit::new(1, AddressMode::Bits8).unwrap());
/// let send = master.read_parameter("PV".parse().unwrap(), None).unwrap();
/// // serial.write_all(send.as_slice())...
/// ```
#[derive(Debug, Copy, Clone)]
pub struct Master {
    proto: Protocol,
}

impl Master {
    /// Create a master for the given unit.
    pub const fn new(unit: Unit) -> Self {
        Self {
            proto: Protocol::new(unit),
        }
    }

    /// Build a read request for `mnemonic`, optionally selecting a
    /// sub-parameter with `index`.
    pub fn read_parameter(
        &self,
        mnemonic: Mnemonic,
        index: Option<u16>,
    ) -> Result<SendData, Error> {
        let request = self.proto.make_packet(Flag::Read, mnemonic, index, None)?;
        Ok(SendData {
            proto: self.proto,
            request,
        })
    }

    /// Build a write request carrying `value` packed into its wire type.
    pub fn write_parameter(
        &self,
        mnemonic: Mnemonic,
        index: Option<u16>,
        value: &ParamValue,
    ) -> Result<SendData, Error> {
        let data = value.pack()?;
        let request = self
            .proto
            .make_packet(Flag::Write, mnemonic, index, Some(&data))?;
        Ok(SendData {
            proto: self.proto,
            request,
        })
    }
}

/// A request waiting to be put on the bus.
#[derive(Debug)]
pub struct SendData {
    proto: Protocol,
    request: WireBytes,
}

impl SendData {
    /// The bytes to transmit.
    pub fn as_slice(&self) -> &[u8] {
        &self.request
    }

    /// Signal that the request went out; start collecting the response.
    pub fn data_sent(self) -> ReceiveResponse {
        ReceiveResponse {
            proto: self.proto,
            request: self.request,
            buffer: Buffer::new(),
        }
    }
}

/// Response bytes are being collected.
#[derive(Debug)]
pub struct ReceiveResponse {
    proto: Protocol,
    request: WireBytes,
    buffer: Buffer,
}

/// Outcome of feeding received bytes into [`ReceiveResponse`].
#[derive(Debug)]
pub enum ReceiveResult {
    /// The response terminator has not arrived yet.
    NeedData(ReceiveResponse),
    /// The response is complete and has been validated.
    Done(Result<Response, Error>),
}

impl ReceiveResponse {
    /// Feed bytes read from the bus, in whatever chunks the transport
    /// produces. An empty chunk is allowed and changes nothing.
    pub fn receive_data(mut self, data: &[u8]) -> ReceiveResult {
        self.buffer.write(data);
        match scan_response(self.buffer.as_ref()) {
            ScanToken::NeedData => ReceiveResult::NeedData(self),
            ScanToken::Response(len) => {
                let answer = &self.buffer.as_ref()[..len];
                ReceiveResult::Done(self.proto.parse_response(&self.request, answer))
            }
        }
    }
}
