//! ASCII framing of the numeric frame bytes.
//!
//! Every frame byte becomes two letters in `'G'..='V'` (one per nibble,
//! offset from `chr(71)`), wrapped in a leading `'#'` and a trailing
//! `'\r'`. Note that these are *not* hexadecimal digits.

use arrayvec::ArrayVec;

use crate::error::format_error;
use crate::Error;

/// Frame start marker.
pub const FRAME_START: u8 = b'#';
/// Frame terminator.
pub const FRAME_END: u8 = b'\r';

const NIBBLE_BASE: u8 = b'G'; // chr(71)
const NIBBLE_MAX: u8 = b'V'; // chr(71 + 15)

/// Largest numeric frame: 4 header/command bytes, 15 payload bytes
/// (the length field is a nibble), 2 checksum bytes.
pub const MAX_FRAME: usize = 4 + 15 + 2;
/// Largest wire packet: two letters per frame byte plus the delimiters.
pub const MAX_WIRE: usize = 2 * MAX_FRAME + 2;

/// A decoded numeric frame.
pub type FrameBytes = ArrayVec<u8, MAX_FRAME>;
/// An ASCII wire packet, delimiters included.
pub type WireBytes = ArrayVec<u8, MAX_WIRE>;

/// Encode numeric frame bytes into the ASCII wire form.
///
/// The caller guarantees `frame.len() <= MAX_FRAME`; the packet layer
/// enforces the payload length nibble before assembling a frame.
pub(crate) fn encode(frame: &[u8]) -> WireBytes {
    let mut wire = WireBytes::new();
    wire.push(FRAME_START);
    for &b in frame {
        wire.push(NIBBLE_BASE + (b >> 4));
        wire.push(NIBBLE_BASE + (b & 0xF));
    }
    wire.push(FRAME_END);
    wire
}

/// Decode an ASCII wire packet back into numeric frame bytes.
///
/// Rejects missing delimiters, an odd number of symbol characters and
/// characters outside `'G'..='V'`. The original implementation silently
/// wrapped out-of-range characters; decoding them here is an error.
pub(crate) fn decode(wire: &[u8]) -> Result<FrameBytes, Error> {
    if wire.is_empty() {
        return Err(format_error("empty response"));
    }
    if wire.first() != Some(&FRAME_START) {
        return Err(format_error("missing '#' frame start"));
    }
    if wire.last() != Some(&FRAME_END) {
        return Err(format_error("missing '\\r' frame terminator"));
    }
    let symbols = &wire[1..wire.len() - 1];
    if symbols.len() % 2 != 0 {
        return Err(format_error("odd number of frame symbols"));
    }
    if symbols.len() / 2 > MAX_FRAME {
        return Err(format_error("frame too long"));
    }
    let mut frame = FrameBytes::new();
    for pair in symbols.chunks_exact(2) {
        let (hi, lo) = (pair[0], pair[1]);
        if !(NIBBLE_BASE..=NIBBLE_MAX).contains(&hi) || !(NIBBLE_BASE..=NIBBLE_MAX).contains(&lo) {
            return Err(format_error("frame symbol out of range"));
        }
        frame.push((hi - NIBBLE_BASE) << 4 | (lo - NIBBLE_BASE));
    }
    Ok(frame)
}
