//! Range-checked types for OWEN unit addresses and parameter mnemonics,
//! meant to simplify correct usage of the API.

use core::convert::TryInto;
use core::fmt;
use core::str::FromStr;

use snafu::ensure;

use crate::error::{InvalidMnemonicSnafu, InvalidUnitSnafu};
use crate::{hash, Error};

/// On-wire width of the unit address, fixed per bus at construction time.
///
/// In 8-bit mode the address occupies the first frame byte alone; in
/// 11-bit mode it is split over the first two bytes, with the low three
/// bits stored in the top of the flag/length byte. The two modes cannot
/// be told apart from the wire when an 11-bit address is a multiple of 8;
/// that ambiguity is part of the protocol and is not resolved here.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum AddressMode {
    /// One address byte, unit in [0, 255].
    Bits8,
    /// Split address, unit in [0, 2047].
    Bits11,
}

impl AddressMode {
    const fn max_unit(self) -> u16 {
        match self {
            AddressMode::Bits8 => 0xFF,
            AddressMode::Bits11 => 0x7FF,
        }
    }
}

/// A bus unit address together with its addressing mode.
///
/// ## Example
/// ```
/// use owen_proto::{AddressMode, Unit};
/// let unit = Unit::new(1, AddressMode::Bits8).unwrap();
/// let wide = Unit::new(400, AddressMode::Bits11).unwrap();
/// ```
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub struct Unit {
    address: u16,
    mode: AddressMode,
}

impl Unit {
    /// Create a new `Unit`, checking that the address fits the mode.
    ///
    /// # Errors
    /// Returns [`Error::InvalidUnit`] if `address` is out of range.
    pub fn new(address: impl TryInto<u16>, mode: AddressMode) -> Result<Self, Error> {
        let address = match address.try_into() {
            Ok(a) => a,
            Err(_) => return InvalidUnitSnafu { unit: u16::MAX, mode }.fail(),
        };
        ensure!(
            address <= mode.max_unit(),
            InvalidUnitSnafu { unit: address, mode }
        );
        Ok(Self { address, mode })
    }

    /// The configured unit address.
    pub const fn address(&self) -> u16 {
        self.address
    }

    /// The configured addressing mode.
    pub const fn mode(&self) -> AddressMode {
        self.mode
    }

    /// The two leading frame bytes contributed by the address. The second
    /// byte is OR-merged with the flag and length nibbles by the packet
    /// layer.
    pub(crate) const fn to_frame_bytes(self) -> [u8; 2] {
        match self.mode {
            AddressMode::Bits8 => [self.address as u8, 0],
            AddressMode::Bits11 => [(self.address >> 3) as u8, ((self.address & 0x7) << 5) as u8],
        }
    }

    /// Reconstruct the sender address from the first two frame bytes of a
    /// response, according to this unit's mode.
    pub(crate) const fn decode_address(self, addr0: u8, addr1: u8) -> u16 {
        match self.mode {
            AddressMode::Bits8 => addr0 as u16,
            AddressMode::Bits11 => (addr0 as u16) << 3 | (addr1 as u16) >> 5,
        }
    }
}

/// Read/write selector embedded in the frame's second byte.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum Flag {
    /// Data flows to the device.
    Write,
    /// Data is requested from the device.
    Read,
}

impl Flag {
    pub(crate) const fn bit(self) -> u8 {
        match self {
            Flag::Write => 0,
            Flag::Read => 1,
        }
    }
}

// Mnemonic symbol codes, two apart so that the literal-dot rule below can
// use the odd codes in between.
const MNEMONIC_SYMBOLS: &[u8] = b"0123456789ABCDEFGHIJKLMNOPQRSTUVWXYZ-_/ ";
const SPACE_CODE: u8 = 78;

fn symbol_code(ch: char) -> Option<u8> {
    let ch = ch.to_ascii_uppercase();
    MNEMONIC_SYMBOLS
        .iter()
        .position(|&s| s as char == ch)
        .map(|pos| (pos * 2) as u8)
}

/// A parameter mnemonic, stored as its four numeric symbol codes.
///
/// Up to four significant symbols; a literal `'.'` consumes no slot of its
/// own but increments the code of the preceding symbol, which is how a
/// channel suffix is baked into the name (e.g. `"SL.H"`). Shorter names
/// are right-padded with the space code. Case is ignored.
///
/// ## Example
/// ```
/// use owen_proto::Mnemonic;
/// let pv: Mnemonic = "PV".parse().unwrap();
/// let alen: Mnemonic = "A.LEN".parse().unwrap();
/// assert_eq!(alen.hash(), 7890);
/// ```
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub struct Mnemonic([u8; 4]);

impl Mnemonic {
    /// Encode `name` into its four symbol codes.
    ///
    /// # Errors
    /// Returns [`Error::InvalidMnemonic`] if the name contains a symbol
    /// outside the mnemonic alphabet, starts with `'.'`, or yields more
    /// than four codes.
    pub fn new(name: &str) -> Result<Self, Error> {
        let mut codes = [SPACE_CODE; 4];
        let mut len = 0;
        for ch in name.chars() {
            if ch == '.' {
                ensure!(
                    len > 0,
                    InvalidMnemonicSnafu {
                        reason: "'.' with no preceding symbol"
                    }
                );
                codes[len - 1] = codes[len - 1].checked_add(1).ok_or_else(|| {
                    InvalidMnemonicSnafu {
                        reason: "too many '.' after a symbol",
                    }
                    .build()
                })?;
            } else {
                let code = symbol_code(ch).ok_or_else(|| {
                    InvalidMnemonicSnafu {
                        reason: "symbol outside the mnemonic alphabet",
                    }
                    .build()
                })?;
                ensure!(
                    len < 4,
                    InvalidMnemonicSnafu {
                        reason: "more than four symbols"
                    }
                );
                codes[len] = code;
                len += 1;
            }
        }
        Ok(Self(codes))
    }

    /// The 16-bit command hash that identifies this mnemonic on the wire.
    pub fn hash(&self) -> u16 {
        hash::mnemonic_hash(self.0)
    }

    /// The four symbol codes, space-padded.
    pub const fn codes(&self) -> [u8; 4] {
        self.0
    }
}

impl FromStr for Mnemonic {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

impl fmt::Display for Mnemonic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for &code in &self.0 {
            if code == SPACE_CODE {
                break;
            }
            // Odd codes carry an embedded channel dot.
            let sym = MNEMONIC_SYMBOLS[code as usize / 2] as char;
            if code % 2 == 1 {
                write!(f, "{}.", sym)?;
            } else {
                write!(f, "{}", sym)?;
            }
        }
        Ok(())
    }
}
