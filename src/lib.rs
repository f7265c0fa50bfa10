//! Sans-io implementation of the OWEN ASCII instrument protocol.
//!
//! OWEN process controllers speak a framed ASCII protocol over a
//! half-duplex serial bus: every frame is `'#'`, two letters per byte in
//! `'G'..='V'`, and a `'\r'` terminator. Commands are not numbered
//! opcodes but 16-bit hashes of four-symbol parameter mnemonics, and the
//! frame checksum uses the same 0x8F57 polynomial step with different
//! parameters. Parameter values travel in a family of compact encodings,
//! from plain big-endian integers to a variable-width sign/exponent/
//! mantissa decimal format.
//!
//! This crate implements the protocol engine only. It performs no I/O:
//! the caller owns the serial port (or any other byte pipe), writes the
//! request bytes the crate produces and feeds the received bytes back.
//! Retry and timeout policy belong to that transport layer, as does the
//! per-device parameter catalog mapping mnemonics to wire types.
//!
//! # Example
//!
//! ```
//! use owen_proto::{
//!     codec, AddressMode, Master, ParamValue, ReceiveResult, Response, Unit, WireType,
//! };
//!
//! # fn main() -> Result<(), owen_proto::Error> {
//! let master = Master::new(Unit::new(1, AddressMode::Bits8)?);
//! let send = master.read_parameter("A.LEN".parse()?, None)?;
//! assert_eq!(send.as_slice(), b"#GHHGHUTIKGJI\r");
//!
//! // The transport writes the request, then feeds back what it reads:
//! let reply = b"#GHGHHUTIGGJKGK\r";
//! match send.data_sent().receive_data(reply) {
//!     ReceiveResult::Done(Ok(Response::Payload(payload))) => {
//!         let value = codec::unpack_reply(WireType::U8, &payload, false)?;
//!         assert_eq!(value, ParamValue::U8(0));
//!     }
//!     other => panic!("unexpected: {:?}", other),
//! }
//! # Ok(()) }
//! ```

mod buffer;
pub mod codec;
mod error;
pub mod frame;
mod hash;
pub mod master;
mod nom_parser;
pub mod packet;
pub mod types;

pub use codec::{ParamValue, Payload, WireType};
pub use error::Error;
pub use master::{Master, ReceiveResult};
pub use packet::{Protocol, Response};
pub use types::{AddressMode, Flag, Mnemonic, Unit};
