// SPDX-License-Identifier: MIT

use core::fmt;

pub const GUID_SIZE: usize = 16;
pub const UUID_NODE_LEN: usize = 6;

/// 16-byte GUID as stored on disk.
///
/// The first three fields are little-endian, the rest is kept in
/// byte order. Identity is plain byte equality.
#[derive(Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub struct Guid([u8; GUID_SIZE]);

impl Guid {
    pub const ZERO: Guid = Guid([0u8; GUID_SIZE]);

    #[inline]
    pub const fn from_bytes(bytes: [u8; GUID_SIZE]) -> Self {
        Self(bytes)
    }

    #[inline]
    pub const fn to_bytes(self) -> [u8; GUID_SIZE] {
        self.0
    }

    #[inline]
    pub const fn as_bytes(&self) -> &[u8; GUID_SIZE] {
        &self.0
    }

    /// Builds a GUID from its RFC 4122 fields as they are written in text form.
    pub const fn from_fields(
        time_low: u32,
        time_mid: u16,
        time_high_and_version: u16,
        clock_seq_high_and_reserved: u8,
        clock_seq_low: u8,
        node: [u8; UUID_NODE_LEN],
    ) -> Self {
        let tl = time_low.to_le_bytes();
        let tm = time_mid.to_le_bytes();
        let th = time_high_and_version.to_le_bytes();
        Self([
            tl[0],
            tl[1],
            tl[2],
            tl[3],
            tm[0],
            tm[1],
            th[0],
            th[1],
            clock_seq_high_and_reserved,
            clock_seq_low,
            node[0],
            node[1],
            node[2],
            node[3],
            node[4],
            node[5],
        ])
    }

    #[inline]
    pub fn time_low(&self) -> u32 {
        u32::from_le_bytes([self.0[0], self.0[1], self.0[2], self.0[3]])
    }

    #[inline]
    pub fn time_mid(&self) -> u16 {
        u16::from_le_bytes([self.0[4], self.0[5]])
    }

    #[inline]
    pub fn time_high_and_version(&self) -> u16 {
        u16::from_le_bytes([self.0[6], self.0[7]])
    }

    #[inline]
    pub fn clock_seq_high_and_reserved(&self) -> u8 {
        self.0[8]
    }

    #[inline]
    pub fn clock_seq_low(&self) -> u8 {
        self.0[9]
    }

    #[inline]
    pub fn node(&self) -> [u8; UUID_NODE_LEN] {
        let mut node = [0u8; UUID_NODE_LEN];
        node.copy_from_slice(&self.0[10..16]);
        node
    }

    #[inline]
    pub fn is_zero(&self) -> bool {
        self.0 == [0u8; GUID_SIZE]
    }
}

/// Reinterprets 16 raw bytes as a GUID.
#[inline]
pub const fn parse_guid(bytes: [u8; GUID_SIZE]) -> Guid {
    Guid::from_bytes(bytes)
}

impl From<[u8; GUID_SIZE]> for Guid {
    #[inline]
    fn from(bytes: [u8; GUID_SIZE]) -> Self {
        Self(bytes)
    }
}

impl From<Guid> for [u8; GUID_SIZE] {
    #[inline]
    fn from(g: Guid) -> Self {
        g.0
    }
}

impl fmt::Debug for Guid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Guid({:02X?})", self.0)
    }
}

/// Canonical text form, e.g. `C12A7328-F81F-11D2-BA4B-00A0C93EC93B`.
impl fmt::Display for Guid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let n = self.node();
        write!(
            f,
            "{:08X}-{:04X}-{:04X}-{:02X}{:02X}-{:02X}{:02X}{:02X}{:02X}{:02X}{:02X}",
            self.time_low(),
            self.time_mid(),
            self.time_high_and_version(),
            self.clock_seq_high_and_reserved(),
            self.clock_seq_low(),
            n[0],
            n[1],
            n[2],
            n[3],
            n[4],
            n[5],
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fields_are_stored_mixed_endian() {
        // C12A7328-F81F-11D2-BA4B-00A0C93EC93B
        let g = Guid::from_fields(
            0xC12A7328,
            0xF81F,
            0x11D2,
            0xBA,
            0x4B,
            [0x00, 0xA0, 0xC9, 0x3E, 0xC9, 0x3B],
        );
        assert_eq!(
            g.to_bytes(),
            [
                0x28, 0x73, 0x2A, 0xC1, 0x1F, 0xF8, 0xD2, 0x11, 0xBA, 0x4B, 0x00, 0xA0, 0xC9,
                0x3E, 0xC9, 0x3B
            ]
        );
        assert_eq!(g.time_low(), 0xC12A7328);
        assert_eq!(g.time_mid(), 0xF81F);
        assert_eq!(g.time_high_and_version(), 0x11D2);
        assert_eq!(g.clock_seq_high_and_reserved(), 0xBA);
        assert_eq!(g.clock_seq_low(), 0x4B);
        assert_eq!(g.node(), [0x00, 0xA0, 0xC9, 0x3E, 0xC9, 0x3B]);
        assert_eq!(
            alloc::format!("{g}"),
            "C12A7328-F81F-11D2-BA4B-00A0C93EC93B"
        );
    }

    #[test]
    fn parse_is_pure_reinterpretation() {
        let raw = [0xFFu8; 16];
        assert_eq!(parse_guid(raw).to_bytes(), raw);
        assert!(!parse_guid(raw).is_zero());
        assert!(Guid::ZERO.is_zero());
    }
}
