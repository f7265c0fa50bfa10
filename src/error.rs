//! Protocol error type.

use snafu::Snafu;

use crate::types::AddressMode;

/// Everything that can go wrong while encoding a request or decoding a
/// response. No variant is ever retried internally; retry policy belongs
/// to the transport layer above.
#[derive(Debug, Snafu, Clone, PartialEq, Eq)]
#[snafu(visibility(pub(crate)))]
#[non_exhaustive]
pub enum Error {
    /// The unit address does not fit the configured addressing mode.
    #[snafu(display("unit address {} does not fit {:?} addressing", unit, mode))]
    InvalidUnit { unit: u16, mode: AddressMode },

    /// The mnemonic name cannot be encoded into four symbol codes.
    #[snafu(display("invalid mnemonic: {}", reason))]
    InvalidMnemonic { reason: &'static str },

    /// Structurally malformed wire frame.
    #[snafu(display("malformed wire frame: {}", reason))]
    Format { reason: &'static str },

    /// The recomputed frame checksum does not match the transmitted one.
    #[snafu(display(
        "checksum mismatch: computed {:04X}, received {:04X}",
        computed,
        received
    ))]
    Checksum { computed: u16, received: u16 },

    /// The response carries a different sender address than the unit this
    /// protocol instance talks to.
    #[snafu(display("response from unit {}, expected {}", received, expected))]
    AddressMismatch { expected: u16, received: u16 },

    /// The device reported an error code instead of data.
    #[snafu(display("device reported error {:#04X}", code))]
    Device { code: u8 },

    /// The value cannot be represented in the requested wire type.
    #[snafu(display("value not encodable: {}", reason))]
    Encoding { reason: &'static str },

    /// The payload bytes cannot be interpreted under the requested wire
    /// type's width rule.
    #[snafu(display("payload not decodable: {}", reason))]
    Decode { reason: &'static str },
}

pub(crate) fn format_error(reason: &'static str) -> Error {
    Error::Format { reason }
}

pub(crate) fn encoding_error(reason: &'static str) -> Error {
    Error::Encoding { reason }
}

pub(crate) fn decode_error(reason: &'static str) -> Error {
    Error::Decode { reason }
}
