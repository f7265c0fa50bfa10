//! Request assembly and response parsing.
//!
//! A [`Protocol`] is the pure, I/O-free half of one bus connection: it
//! holds the configured unit address and turns (flag, mnemonic, index,
//! data) into a wire packet, and a received wire packet back into a
//! validated payload. No state survives an exchange.

use crate::codec::Payload;
use crate::error::{encoding_error, format_error};
use crate::frame::{self, FrameBytes, WireBytes};
use crate::hash;
use crate::types::{Flag, Mnemonic, Unit};
use crate::Error;

/// Outcome of a successfully validated response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Response {
    /// Payload bytes, ready for the value codec.
    Payload(Payload),
    /// The device echoed the request byte-for-byte: a data-less
    /// acknowledgement, used by some write operations.
    Ack,
    /// The device substituted its own command hash, which is how it
    /// reports an error code instead of data.
    DeviceError {
        /// Device error code.
        code: u8,
    },
}

/// Protocol engine for a single unit.
#[derive(Debug, Copy, Clone)]
pub struct Protocol {
    unit: Unit,
}

impl Protocol {
    /// Create a protocol instance talking to `unit`.
    pub const fn new(unit: Unit) -> Self {
        Self { unit }
    }

    /// The unit this instance talks to.
    pub const fn unit(&self) -> Unit {
        self.unit
    }

    /// Assemble the wire packet for one request.
    ///
    /// `data` carries the packed value for a write and is omitted for a
    /// read; `index` selects a sub-parameter and is appended to the
    /// payload as two big-endian bytes.
    ///
    /// # Errors
    /// Returns [`Error::Encoding`] if data plus index exceed the 15-byte
    /// payload length field.
    pub fn make_packet(
        &self,
        flag: Flag,
        mnemonic: Mnemonic,
        index: Option<u16>,
        data: Option<&[u8]>,
    ) -> Result<WireBytes, Error> {
        let mut payload = Payload::new();
        if let Some(data) = data {
            payload
                .try_extend_from_slice(data)
                .map_err(|_| encoding_error("payload exceeds the 15-byte length field"))?;
        }
        if let Some(index) = index {
            payload
                .try_extend_from_slice(&index.to_be_bytes())
                .map_err(|_| encoding_error("payload exceeds the 15-byte length field"))?;
        }

        let cmd = mnemonic.hash();
        let [addr0, addr1] = self.unit.to_frame_bytes();

        let mut frame = FrameBytes::new();
        frame.push(addr0);
        frame.push(addr1 | flag.bit() << 4 | payload.len() as u8);
        frame.push((cmd >> 8) as u8);
        frame.push((cmd & 0xFF) as u8);
        frame
            .try_extend_from_slice(&payload)
            .expect("BUG: frame buffer too small");
        let crc = hash::checksum(&frame);
        frame.push((crc >> 8) as u8);
        frame.push((crc & 0xFF) as u8);

        log::debug!(
            "send: unit={} flag={:?} cmd={:04X} size={} crc={:04X}",
            self.unit.address(),
            flag,
            cmd,
            payload.len(),
            crc
        );
        Ok(frame::encode(&frame))
    }

    /// Validate a response against the request it answers and extract its
    /// meaning.
    ///
    /// # Errors
    /// - [`Error::Format`] for a structurally broken packet;
    /// - [`Error::Checksum`] when the recomputed checksum differs;
    /// - [`Error::AddressMismatch`] when another unit answered.
    pub fn parse_response(&self, sent: &[u8], answer: &[u8]) -> Result<Response, Error> {
        let frame = frame::decode(answer)?;
        if frame.len() < 6 {
            return Err(format_error("frame shorter than header and checksum"));
        }
        let size = (frame[1] & 0xF) as usize;
        if frame.len() != 6 + size {
            return Err(format_error("length nibble does not match frame size"));
        }

        let received = u16::from_be_bytes([frame[frame.len() - 2], frame[frame.len() - 1]]);
        let computed = hash::checksum(&frame[..frame.len() - 2]);
        if computed != received {
            return Err(Error::Checksum { computed, received });
        }

        let address = self.unit.decode_address(frame[0], frame[1]);
        if address != self.unit.address() {
            return Err(Error::AddressMismatch {
                expected: self.unit.address(),
                received: address,
            });
        }

        let payload = &frame[4..4 + size];
        log::debug!(
            "recv: unit={} flag={} cmd={:04X} size={} crc={:04X}",
            address,
            frame[1] >> 4 & 1,
            u16::from_be_bytes([frame[2], frame[3]]),
            size,
            received
        );

        // The device reports an error by answering with a different
        // command hash. Matching the reference implementation, only the
        // low command byte (ASCII positions 7..9) is compared.
        if sent.get(7..9) != answer.get(7..9) {
            let code = payload
                .first()
                .copied()
                .ok_or_else(|| format_error("error report without code"))?;
            return Ok(Response::DeviceError { code });
        }

        if answer == sent {
            return Ok(Response::Ack);
        }
        Ok(Response::Payload(payload.iter().copied().collect()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::AddressMode;

    fn proto(unit: u16, mode: AddressMode) -> Protocol {
        Protocol::new(Unit::new(unit, mode).unwrap())
    }

    fn mn(name: &str) -> Mnemonic {
        Mnemonic::new(name).unwrap()
    }

    #[test]
    fn read_request_no_index() {
        let p = proto(1, AddressMode::Bits8);
        let packet = p.make_packet(Flag::Read, mn("A.LEN"), None, None).unwrap();
        assert_eq!(packet.as_slice(), b"#GHHGHUTIKGJI\r");
        let packet = p.make_packet(Flag::Read, mn("DEV"), None, None).unwrap();
        assert_eq!(packet.as_slice(), b"#GHHGTMOHHRTO\r");
        let packet = p.make_packet(Flag::Read, mn("ADDR"), None, None).unwrap();
        assert_eq!(packet.as_slice(), b"#GHHGPVMIJIMK\r");
        let packet = p.make_packet(Flag::Read, mn("PV"), None, None).unwrap();
        assert_eq!(packet.as_slice(), b"#GHHGROTVJNPQ\r");
    }

    #[test]
    fn read_request_with_index() {
        let p = proto(1, AddressMode::Bits8);
        let packet = p.make_packet(Flag::Read, mn("SL.H"), Some(0), None).unwrap();
        assert_eq!(packet.as_slice(), b"#GHHIUSIGGGGGTJIT\r");
        let packet = p.make_packet(Flag::Read, mn("DP"), Some(0), None).unwrap();
        assert_eq!(packet.as_slice(), b"#GHHIRJURGGGGHQIV\r");
    }

    #[test]
    fn write_request() {
        let p = proto(1, AddressMode::Bits8);
        let packet = p
            .make_packet(Flag::Write, mn("A.LEN"), None, Some(&[0]))
            .unwrap();
        assert_eq!(packet.as_slice(), b"#GHGHHUTIGGJKGK\r");
        let packet = p
            .make_packet(Flag::Write, mn("SL.H"), Some(0), Some(&[68, 59, 128]))
            .unwrap();
        assert_eq!(packet.as_slice(), b"#GHGLUSIGKKJROGGGGGPVUS\r");
        let packet = p
            .make_packet(Flag::Write, mn("ADDR"), None, Some(&[0, 1]))
            .unwrap();
        assert_eq!(packet.as_slice(), b"#GHGIPVMIGGGHNHIR\r");
    }

    #[test]
    fn split_address_request() {
        let p = proto(400, AddressMode::Bits11);
        let packet = p.make_packet(Flag::Read, mn("SP"), Some(0), None).unwrap();
        assert_eq!(packet.as_slice(), b"#JIHIPHGNGGGGJHVJ\r");
    }

    #[test]
    fn payload_length_is_limited() {
        let p = proto(1, AddressMode::Bits8);
        assert!(p
            .make_packet(Flag::Write, mn("SP"), None, Some(&[0; 15]))
            .is_ok());
        assert!(p
            .make_packet(Flag::Write, mn("SP"), None, Some(&[0; 16]))
            .is_err());
        assert!(p
            .make_packet(Flag::Write, mn("SP"), Some(0), Some(&[0; 14]))
            .is_err());
    }

    #[test]
    fn parse_payload_response() {
        let p = proto(1, AddressMode::Bits8);
        let sent = p.make_packet(Flag::Read, mn("A.LEN"), None, None).unwrap();
        let resp = p.parse_response(&sent, b"#GHGHHUTIGGJKGK\r").unwrap();
        assert_eq!(resp, Response::Payload([0].iter().copied().collect()));

        let sent = p.make_packet(Flag::Read, mn("SL.L"), Some(0), None).unwrap();
        let resp = p
            .parse_response(&sent, b"#GHGLUHNTSJKNUMGGGGLPTV\r")
            .unwrap();
        assert_eq!(
            resp,
            Response::Payload([195, 71, 230, 0, 0].iter().copied().collect())
        );

        let sent = p.make_packet(Flag::Read, mn("VER"), None, None).unwrap();
        let resp = p
            .parse_response(&sent, b"#GHGOITLRJKJGJGJGIUJJJGLMUPPR\r")
            .unwrap();
        assert_eq!(
            resp,
            Response::Payload(
                [52, 48, 48, 48, 46, 51, 48, 86].iter().copied().collect()
            )
        );
    }

    #[test]
    fn echo_is_an_ack() {
        let p = proto(1, AddressMode::Bits8);
        let sent = p
            .make_packet(Flag::Write, mn("A.LEN"), None, Some(&[0]))
            .unwrap();
        let resp = p.parse_response(&sent, &sent).unwrap();
        assert_eq!(resp, Response::Ack);
    }

    #[test]
    fn hash_mismatch_is_a_device_error() {
        let p = proto(1, AddressMode::Bits8);
        let sent = p.make_packet(Flag::Read, mn("CTL"), None, None).unwrap();
        let resp = p.parse_response(&sent, b"#GHGJGIJJKNNNRQPUSV\r").unwrap();
        assert_eq!(resp, Response::DeviceError { code: 0x47 });
    }

    #[test]
    fn checksum_mismatch_is_rejected() {
        let p = proto(1, AddressMode::Bits8);
        let sent = p.make_packet(Flag::Read, mn("SL.L"), Some(0), None).unwrap();
        // Same frame as in parse_payload_response with the last checksum
        // byte decremented.
        let mut bytes = crate::frame::decode(b"#GHGLUHNTSJKNUMGGGGLPTV\r").unwrap();
        let last = bytes.len() - 1;
        bytes[last] -= 1;
        let tampered = crate::frame::encode(&bytes);
        assert!(matches!(
            p.parse_response(&sent, &tampered),
            Err(Error::Checksum { .. })
        ));
    }

    #[test]
    fn wrong_sender_is_rejected() {
        let p = proto(2, AddressMode::Bits8);
        let sent = p.make_packet(Flag::Read, mn("A.LEN"), None, None).unwrap();
        // Answer from unit 1.
        assert!(matches!(
            p.parse_response(&sent, b"#GHGHHUTIGGJKGK\r"),
            Err(Error::AddressMismatch {
                expected: 2,
                received: 1
            })
        ));
    }

    #[test]
    fn malformed_responses_are_format_errors() {
        let p = proto(1, AddressMode::Bits8);
        let sent = p.make_packet(Flag::Read, mn("A.LEN"), None, None).unwrap();
        for answer in [
            &b""[..],
            b"GHGHHUTIGGJKGK\r",
            b"#GHGHHUTIGGJKGK",
            b"#GHGHHUTIGGJKG\r",
            b"#GHGH\r",
        ] {
            assert!(
                matches!(p.parse_response(&sent, answer), Err(Error::Format { .. })),
                "{:?}",
                answer
            );
        }
    }
}
