//! Polynomial arithmetic shared by the frame checksum and the mnemonic
//! command hash.
//!
//! Both folds use the same bit-step over the 0x8F57 polynomial, but with
//! different parameters: the checksum consumes whole bytes (8 steps), the
//! command hash consumes 7 steps of each mnemonic code pre-shifted left by
//! one. This is not CRC-16/CCITT or any other table-driven standard; the
//! step sequence below is part of the wire contract and must not be
//! substituted.

const POLY: u16 = 0x8F57;

/// One accumulation step: feed `value` into `crc` over `bits` iterations.
///
/// `value` is widened to 16 bits because the hash fold passes mnemonic
/// codes pre-shifted left by one (up to 156).
pub(crate) fn step(value: u16, mut crc: u16, bits: u32) -> u16 {
    for i in 0..bits {
        if ((value << i) ^ (crc >> 8)) & 0x80 != 0 {
            crc = (crc << 1) ^ POLY;
        } else {
            crc <<= 1;
        }
    }
    crc
}

/// Frame integrity checksum: fold every byte with 8 steps, initial 0.
pub(crate) fn checksum(bytes: &[u8]) -> u16 {
    bytes
        .iter()
        .fold(0, |crc, &b| step(u16::from(b), crc, 8))
}

/// Command identifier hash over the 4 mnemonic codes: each code is
/// shifted left by one and folded with 7 steps, initial 0.
///
/// Distinct mnemonics can collide; the device and client must agree on
/// the parameter set a priori, so no collision detection is attempted.
pub(crate) fn mnemonic_hash(codes: [u8; 4]) -> u16 {
    codes
        .iter()
        .fold(0, |crc, &c| step(u16::from(c) << 1, crc, 7))
}
