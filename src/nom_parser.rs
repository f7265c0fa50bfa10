//! Streaming scanner for `'\r'`-terminated responses.
//!
//! The transport hands the master whatever the serial line produced; the
//! scanner only decides whether a complete response is sitting in the
//! buffer. Structural validation of the packet itself happens in
//! [`crate::packet`].

use nom::bytes::streaming::take_while;
use nom::character::streaming::char;
use nom::sequence::terminated;
use nom::Err::Incomplete;
use nom::IResult;

use crate::frame::FRAME_END;

#[derive(Debug, PartialEq, Eq, Copy, Clone)]
pub(crate) enum ScanToken {
    /// The terminator has not arrived yet.
    NeedData,
    /// A complete response of this many bytes, terminator included.
    Response(usize),
}

pub(crate) fn scan_response(buf: &[u8]) -> ScanToken {
    let result: IResult<&[u8], &[u8]> =
        terminated(take_while(|c| c != FRAME_END), char(FRAME_END as char))(buf);
    match result {
        Ok((remaining, _)) => ScanToken::Response(buf.len() - remaining.len()),
        Err(Incomplete(_)) => ScanToken::NeedData,
        // take_while consumes everything that isn't the terminator, so
        // the only other outcome is an empty streaming buffer.
        Err(_) => ScanToken::NeedData,
    }
}
