//! Typed parameter values and their wire encodings.
//!
//! Every parameter read from or written to a unit travels as a short byte
//! sequence whose interpretation is fixed by the parameter catalog's type
//! tag. The tag set is closed, so dispatch is an exhaustive match instead
//! of the original's runtime lookup table.

use core::str::FromStr;

use arrayvec::ArrayVec;

use crate::error::{decode_error, encoding_error};
use crate::Error;

/// The payload length field is a nibble, so a payload never exceeds 15
/// bytes (including an appended index pair).
pub const MAX_PAYLOAD: usize = 15;

/// A packed payload, or the raw data bytes of a parsed response.
pub type Payload = ArrayVec<u8, MAX_PAYLOAD>;

/// STR values occupy at most [`STR_WIDTH`] bytes on the wire.
pub type StrBytes = ArrayVec<u8, STR_WIDTH>;

/// Maximum on-wire length of a STR value.
pub const STR_WIDTH: usize = 8;

/// Wire type tag, as named by the per-device parameter catalog.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum WireType {
    U8,
    I8,
    U16,
    I16,
    /// Composite diagnostic value (used by `N.ERR`).
    U24,
    U32,
    I32,
    /// f32 truncated to its three most significant bytes.
    F24,
    F32,
    /// f32 followed by a 16-bit unsigned trailer.
    F32T,
    /// Byte-reversed ASCII string.
    Str,
    /// Variable-width sign/exponent/mantissa decimal ("stored dot").
    SDot,
    /// Decimal digits packed two per byte.
    Dot0,
    /// Like `Dot0` with three implied decimal places.
    Dot3,
}

impl WireType {
    /// On-wire width in bytes, `None` for the value-dependent encodings.
    pub const fn width(self) -> Option<usize> {
        match self {
            WireType::U8 | WireType::I8 => Some(1),
            WireType::U16 | WireType::I16 => Some(2),
            WireType::U24 | WireType::F24 => Some(3),
            WireType::U32 | WireType::I32 | WireType::F32 => Some(4),
            WireType::F32T => Some(6),
            WireType::Str | WireType::SDot | WireType::Dot0 | WireType::Dot3 => None,
        }
    }
}

impl FromStr for WireType {
    type Err = Error;

    /// Parse a catalog type tag, e.g. `"F32+T"` or `"SDOT"`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s {
            "U8" => WireType::U8,
            "I8" => WireType::I8,
            "U16" => WireType::U16,
            "I16" => WireType::I16,
            "U24" => WireType::U24,
            "U32" => WireType::U32,
            "I32" => WireType::I32,
            "F24" => WireType::F24,
            "F32" => WireType::F32,
            "F32+T" => WireType::F32T,
            "STR" => WireType::Str,
            "SDOT" => WireType::SDot,
            "DOT0" => WireType::Dot0,
            "DOT3" => WireType::Dot3,
            _ => return Err(decode_error("unknown wire type tag")),
        })
    }
}

/// A typed parameter value.
#[derive(Debug, Clone, PartialEq)]
pub enum ParamValue {
    U8(u8),
    I8(i8),
    U16(u16),
    I16(i16),
    /// Error class and error detail word, big-endian on the wire.
    U24(u8, u16),
    U32(u32),
    I32(i32),
    F24(f32),
    F32(f32),
    /// Float plus unsigned trailer (e.g. a timestamp word).
    F32T(f32, u16),
    Str(StrBytes),
    SDot(f64),
    Dot0(u64),
    Dot3(f64),
}

impl ParamValue {
    /// The wire type this value packs as.
    pub const fn wire_type(&self) -> WireType {
        match self {
            ParamValue::U8(_) => WireType::U8,
            ParamValue::I8(_) => WireType::I8,
            ParamValue::U16(_) => WireType::U16,
            ParamValue::I16(_) => WireType::I16,
            ParamValue::U24(..) => WireType::U24,
            ParamValue::U32(_) => WireType::U32,
            ParamValue::I32(_) => WireType::I32,
            ParamValue::F24(_) => WireType::F24,
            ParamValue::F32(_) => WireType::F32,
            ParamValue::F32T(..) => WireType::F32T,
            ParamValue::Str(_) => WireType::Str,
            ParamValue::SDot(_) => WireType::SDot,
            ParamValue::Dot0(_) => WireType::Dot0,
            ParamValue::Dot3(_) => WireType::Dot3,
        }
    }

    /// Pack this value into its wire byte sequence.
    ///
    /// # Errors
    /// Returns [`Error::Encoding`] when the value has no representation
    /// in its wire type (stored-dot mantissa or exponent overflow,
    /// negative `Dot3`, non-finite floats).
    pub fn pack(&self) -> Result<Payload, Error> {
        let mut out = Payload::new();
        match *self {
            ParamValue::U8(v) => out.push(v),
            ParamValue::I8(v) => out.push(v as u8),
            ParamValue::U16(v) => push_all(&mut out, &v.to_be_bytes()),
            ParamValue::I16(v) => push_all(&mut out, &v.to_be_bytes()),
            ParamValue::U24(class, detail) => {
                out.push(class);
                push_all(&mut out, &detail.to_be_bytes());
            }
            ParamValue::U32(v) => push_all(&mut out, &v.to_be_bytes()),
            ParamValue::I32(v) => push_all(&mut out, &v.to_be_bytes()),
            ParamValue::F24(v) => push_all(&mut out, &v.to_be_bytes()[..3]),
            ParamValue::F32(v) => push_all(&mut out, &v.to_be_bytes()),
            ParamValue::F32T(v, t) => {
                push_all(&mut out, &v.to_be_bytes());
                push_all(&mut out, &t.to_be_bytes());
            }
            ParamValue::Str(ref s) => {
                for &b in s.iter().rev() {
                    out.push(b);
                }
            }
            ParamValue::SDot(v) => pack_sdot(v, &mut out)?,
            ParamValue::Dot0(v) => pack_digits(v, &mut out),
            ParamValue::Dot3(v) => {
                if !v.is_finite() || v < 0.0 {
                    return Err(encoding_error("DOT3 value must be finite and non-negative"));
                }
                let scaled = (v * 1000.0).round();
                if scaled > u64::MAX as f64 {
                    return Err(encoding_error("DOT3 value too large"));
                }
                pack_digits(scaled as u64, &mut out);
            }
        }
        Ok(out)
    }
}

/// Unpack `payload` as `tag`.
///
/// Fixed-width types decode from the leading bytes and ignore anything
/// after them, which is how a trailing index echo is skipped. The decimal
/// encodings strip the two index bytes explicitly when `indexed` is set.
///
/// # Errors
/// Returns [`Error::Decode`] when the payload is shorter than the type's
/// width or violates the type's digit/width rules.
pub fn unpack(tag: WireType, payload: &[u8], indexed: bool) -> Result<ParamValue, Error> {
    Ok(match tag {
        WireType::U8 => ParamValue::U8(take::<1>(payload)?[0]),
        WireType::I8 => ParamValue::I8(take::<1>(payload)?[0] as i8),
        WireType::U16 => ParamValue::U16(u16::from_be_bytes(take::<2>(payload)?)),
        WireType::I16 => ParamValue::I16(i16::from_be_bytes(take::<2>(payload)?)),
        WireType::U24 => {
            let b = take::<3>(payload)?;
            ParamValue::U24(b[0], u16::from_be_bytes([b[1], b[2]]))
        }
        WireType::U32 => ParamValue::U32(u32::from_be_bytes(take::<4>(payload)?)),
        WireType::I32 => ParamValue::I32(i32::from_be_bytes(take::<4>(payload)?)),
        WireType::F24 => {
            let b = take::<3>(payload)?;
            ParamValue::F24(f32::from_be_bytes([b[0], b[1], b[2], 0]))
        }
        WireType::F32 => ParamValue::F32(f32::from_be_bytes(take::<4>(payload)?)),
        WireType::F32T => {
            let b = take::<6>(payload)?;
            ParamValue::F32T(
                f32::from_be_bytes([b[0], b[1], b[2], b[3]]),
                u16::from_be_bytes([b[4], b[5]]),
            )
        }
        WireType::Str => {
            if payload.len() > STR_WIDTH {
                return Err(decode_error("STR payload longer than eight bytes"));
            }
            ParamValue::Str(payload.iter().rev().copied().collect())
        }
        WireType::SDot => ParamValue::SDot(unpack_sdot(strip_index(payload, indexed)?)?),
        WireType::Dot0 => ParamValue::Dot0(unpack_digits(strip_index(payload, indexed)?)?),
        WireType::Dot3 => {
            ParamValue::Dot3(unpack_digits(strip_index(payload, indexed)?)? as f64 / 1000.0)
        }
    })
}

/// [`unpack`], with the protocol convention layered on top: a one-byte
/// payload that fails type decoding is a device error code, not data.
pub fn unpack_reply(tag: WireType, payload: &[u8], indexed: bool) -> Result<ParamValue, Error> {
    match unpack(tag, payload, indexed) {
        Err(Error::Decode { .. }) if payload.len() == 1 => {
            let code = payload[0];
            log::error!("device error report: code={:02X}", code);
            Err(Error::Device { code })
        }
        other => other,
    }
}

fn take<const N: usize>(payload: &[u8]) -> Result<[u8; N], Error> {
    let mut out = [0; N];
    match payload.get(..N) {
        Some(bytes) => {
            out.copy_from_slice(bytes);
            Ok(out)
        }
        None => Err(decode_error("payload shorter than the type width")),
    }
}

fn strip_index(payload: &[u8], indexed: bool) -> Result<&[u8], Error> {
    if !indexed {
        return Ok(payload);
    }
    payload
        .len()
        .checked_sub(2)
        .map(|end| &payload[..end])
        .ok_or_else(|| decode_error("payload shorter than its index echo"))
}

fn push_all(out: &mut Payload, bytes: &[u8]) {
    out.try_extend_from_slice(bytes)
        .expect("BUG: payload buffer too small");
}

/// Split a value into the sign/exponent/mantissa triple of its shortest
/// decimal form. An integral value contributes one trailing zero decimal
/// place, so 350.0 becomes mantissa 3500 with exponent 1.
fn sdot_parts(value: f64) -> Result<(bool, u32, u32), Error> {
    if !value.is_finite() {
        return Err(encoding_error("stored-dot value must be finite"));
    }
    let negative = value.is_sign_negative();
    let repr = format!("{}", value.abs());
    if repr.contains('e') || repr.contains('E') {
        return Err(encoding_error("stored-dot value has no compact decimal form"));
    }
    let (mantissa_str, exponent) = match repr.split_once('.') {
        Some((int_part, frac_part)) => {
            (format!("{}{}", int_part, frac_part), frac_part.len() as u32)
        }
        None => (format!("{}0", repr), 1),
    };
    if exponent > 7 {
        return Err(encoding_error("stored-dot exponent exceeds three bits"));
    }
    let mantissa: u32 = mantissa_str
        .parse()
        .map_err(|_| encoding_error("stored-dot mantissa exceeds twenty bits"))?;
    if mantissa >= 1 << 20 {
        return Err(encoding_error("stored-dot mantissa exceeds twenty bits"));
    }
    Ok((negative, exponent, mantissa))
}

fn pack_sdot(value: f64, out: &mut Payload) -> Result<(), Error> {
    let (negative, exponent, mantissa) = sdot_parts(value)?;
    let sign = u32::from(negative);
    if mantissa < 16 {
        out.push((sign << 7 | exponent << 4 | mantissa) as u8);
    } else if mantissa < 4096 {
        let v = (sign << 15 | exponent << 12 | mantissa) as u16;
        push_all(out, &v.to_be_bytes());
    } else {
        let v = sign << 23 | exponent << 20 | mantissa;
        push_all(out, &v.to_be_bytes()[1..]);
    }
    Ok(())
}

fn unpack_sdot(bytes: &[u8]) -> Result<f64, Error> {
    let (data, shift) = match *bytes {
        [b0] => (u32::from(b0), 4),
        [b0, b1] => (u32::from(u16::from_be_bytes([b0, b1])), 12),
        [b0, b1, b2] => (u32::from_be_bytes([0, b0, b1, b2]), 20),
        _ => return Err(decode_error("stored-dot width must be one to three bytes")),
    };
    let sign = data >> (shift + 3) & 1;
    let exponent = (data >> shift & 7) as i32;
    let mantissa = f64::from(data & ((1 << shift) - 1));
    let value = mantissa * 10f64.powi(-exponent);
    Ok(if sign == 1 { -value } else { value })
}

fn pack_digits(value: u64, out: &mut Payload) {
    let mut digits = ArrayVec::<u8, 20>::new();
    let mut v = value;
    loop {
        digits.push((v % 10) as u8);
        v /= 10;
        if v == 0 {
            break;
        }
    }
    if digits.len() % 2 != 0 {
        digits.push(0); // left-pad to an even digit count
    }
    for pair in digits.chunks_exact(2).rev() {
        out.push(pair[1] << 4 | pair[0]);
    }
}

fn unpack_digits(bytes: &[u8]) -> Result<u64, Error> {
    if bytes.is_empty() {
        return Err(decode_error("empty decimal payload"));
    }
    let mut value: u64 = 0;
    for &b in bytes {
        let (hi, lo) = (b >> 4, b & 0xF);
        if hi > 9 || lo > 9 {
            return Err(decode_error("non-decimal digit nibble"));
        }
        value = value
            .checked_mul(100)
            .and_then(|v| v.checked_add(u64::from(hi) * 10 + u64::from(lo)))
            .ok_or_else(|| decode_error("decimal payload overflows u64"))?;
    }
    Ok(value)
}
