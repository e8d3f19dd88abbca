// SPDX-License-Identifier: MIT

/// CRC32 (IEEE, reflected polynomial 0xEDB88320) as used by GPT.
#[inline]
pub fn crc32(bytes: &[u8]) -> u32 {
    crc32fast::hash(bytes)
}
