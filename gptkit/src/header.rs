// SPDX-License-Identifier: MIT

use zerocopy::byteorder::little_endian::{U32, U64};
use zerocopy::{FromBytes, Immutable, IntoBytes, KnownLayout, Unaligned};

use crate::crc::crc32;
use crate::guid::Guid;

pub const GPT_SIGNATURE: &[u8; 8] = b"EFI PART";
pub const GPT_REVISION: u32 = 0x00010000;
/// Bytes of the header that carry meaning.
pub const GPT_HEADER_SIZE: u32 = 92;
/// The header always occupies one 512-byte block; the tail is zero padding.
pub const GPT_HEADER_SECTOR_SIZE: usize = 512;
pub const GPT_PRIMARY_HEADER_LBA: u64 = 1;
pub const GPT_PRIMARY_ENTRIES_LBA: u64 = 2;

/// Bytes after the defined fields, up to the end of the header block.
pub const GPT_HEADER_PADDING_LEN: usize = GPT_HEADER_SECTOR_SIZE - GPT_HEADER_SIZE as usize;

/// Offset of `header_crc32` inside the header block.
const HEADER_CRC_OFFSET: usize = 16;
/// Offset of the reserved word inside the header block.
pub const GPT_HEADER_RESERVED_OFFSET: usize = 20;

/// On-disk header layout. Little-endian, no alignment requirements.
#[derive(IntoBytes, FromBytes, KnownLayout, Immutable, Unaligned, Copy, Clone, Debug)]
#[repr(C)]
struct RawGptHeader {
    signature: [u8; 8],
    revision: U32,
    size: U32,
    header_crc32: U32,
    reserved: U32,
    my_lba: U64,
    alternate_lba: U64,
    first_usable_lba: U64,
    last_usable_lba: U64,
    disk_uuid: [u8; 16],
    entries_lba: U64,
    number_of_entries: U32,
    size_of_entry: U32,
    entries_crc32: U32,
    padding: [u8; GPT_HEADER_PADDING_LEN],
}

/// Structured GPT header.
///
/// `reserved` and `padding` keep the bytes as read so the CRC covers exactly
/// what is on disk; freshly built and mirrored headers have them zeroed.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct GptHeader {
    pub signature: [u8; 8],
    pub revision: u32,
    pub size: u32,
    pub header_crc32: u32,
    pub reserved: u32,
    pub my_lba: u64,
    pub alternate_lba: u64,
    pub first_usable_lba: u64,
    pub last_usable_lba: u64,
    pub disk_uuid: Guid,
    pub entries_lba: u64,
    pub number_of_entries: u32,
    pub size_of_entry: u32,
    pub entries_crc32: u32,
    pub padding: [u8; GPT_HEADER_PADDING_LEN],
}

impl Default for GptHeader {
    fn default() -> Self {
        Self {
            signature: [0; 8],
            revision: 0,
            size: 0,
            header_crc32: 0,
            reserved: 0,
            my_lba: 0,
            alternate_lba: 0,
            first_usable_lba: 0,
            last_usable_lba: 0,
            disk_uuid: Guid::ZERO,
            entries_lba: 0,
            number_of_entries: 0,
            size_of_entry: 0,
            entries_crc32: 0,
            padding: [0; GPT_HEADER_PADDING_LEN],
        }
    }
}

/// Pure field extraction. Any byte pattern decodes to some header.
pub fn decode_header(sector: &[u8; GPT_HEADER_SECTOR_SIZE]) -> GptHeader {
    let raw: RawGptHeader = zerocopy::transmute!(*sector);
    GptHeader {
        signature: raw.signature,
        revision: raw.revision.get(),
        size: raw.size.get(),
        header_crc32: raw.header_crc32.get(),
        reserved: raw.reserved.get(),
        my_lba: raw.my_lba.get(),
        alternate_lba: raw.alternate_lba.get(),
        first_usable_lba: raw.first_usable_lba.get(),
        last_usable_lba: raw.last_usable_lba.get(),
        disk_uuid: Guid::from_bytes(raw.disk_uuid),
        entries_lba: raw.entries_lba.get(),
        number_of_entries: raw.number_of_entries.get(),
        size_of_entry: raw.size_of_entry.get(),
        entries_crc32: raw.entries_crc32.get(),
        padding: raw.padding,
    }
}

/// Inverse of [`decode_header`]. Recomputes nothing; reserved bytes are written as stored.
pub fn encode_header(header: &GptHeader) -> [u8; GPT_HEADER_SECTOR_SIZE] {
    let raw = RawGptHeader {
        signature: header.signature,
        revision: U32::new(header.revision),
        size: U32::new(header.size),
        header_crc32: U32::new(header.header_crc32),
        reserved: U32::new(header.reserved),
        my_lba: U64::new(header.my_lba),
        alternate_lba: U64::new(header.alternate_lba),
        first_usable_lba: U64::new(header.first_usable_lba),
        last_usable_lba: U64::new(header.last_usable_lba),
        disk_uuid: header.disk_uuid.to_bytes(),
        entries_lba: U64::new(header.entries_lba),
        number_of_entries: U32::new(header.number_of_entries),
        size_of_entry: U32::new(header.size_of_entry),
        entries_crc32: U32::new(header.entries_crc32),
        padding: header.padding,
    };
    zerocopy::transmute!(raw)
}

impl GptHeader {
    /// CRC32 of the first `size` bytes with the CRC field zeroed.
    ///
    /// `size` is clamped to the header block; range checking is the validator's job.
    pub fn compute_header_crc32(&self) -> u32 {
        let mut bytes = encode_header(self);
        bytes[HEADER_CRC_OFFSET..HEADER_CRC_OFFSET + 4].fill(0);
        let len = (self.size as usize).min(GPT_HEADER_SECTOR_SIZE);
        crc32(&bytes[..len])
    }

    #[inline]
    pub fn update_header_crc(&mut self) {
        self.header_crc32 = self.compute_header_crc32();
    }

    /// Sets `entries_crc32` from the raw array, then refreshes the header CRC.
    pub fn update_crcs(&mut self, entries_raw: &[u8]) {
        self.entries_crc32 = crc32(entries_raw);
        self.update_header_crc();
    }

    /// `number_of_entries * size_of_entry`, if it fits in memory.
    #[inline]
    pub fn entries_byte_len(&self) -> Option<usize> {
        (self.number_of_entries as usize).checked_mul(self.size_of_entry as usize)
    }

    /// Sectors spanned by the entry array.
    #[inline]
    pub fn entries_sectors(&self, sector_size: u64) -> u64 {
        (self.number_of_entries as u64 * self.size_of_entry as u64).div_ceil(sector_size.max(1))
    }

    /// Offset of the first non-zero reserved byte covered by `size`, if any.
    pub fn first_nonzero_reserved(&self) -> Option<usize> {
        if self.reserved != 0 {
            return Some(GPT_HEADER_RESERVED_OFFSET);
        }
        let covered = (self.size as usize)
            .min(GPT_HEADER_SECTOR_SIZE)
            .saturating_sub(GPT_HEADER_SIZE as usize);
        self.padding[..covered]
            .iter()
            .position(|&b| b != 0)
            .map(|i| GPT_HEADER_SIZE as usize + i)
    }

    #[inline]
    fn clear_reserved(&mut self) {
        self.reserved = 0;
        self.padding = [0; GPT_HEADER_PADDING_LEN];
    }

    /// Header for the primary position, everything else copied.
    pub fn to_primary(mut self, total_sectors: u64) -> Self {
        self.clear_reserved();
        self.my_lba = GPT_PRIMARY_HEADER_LBA;
        self.alternate_lba = total_sectors - 1;
        self.entries_lba = GPT_PRIMARY_ENTRIES_LBA;
        self.update_header_crc();
        self
    }

    /// Header for the secondary position: last sector, entries right before it.
    pub fn to_backup(mut self, total_sectors: u64, sector_size: u64) -> Self {
        self.clear_reserved();
        self.my_lba = total_sectors - 1;
        self.alternate_lba = GPT_PRIMARY_HEADER_LBA;
        self.entries_lba = self.my_lba.saturating_sub(self.entries_sectors(sector_size));
        self.update_header_crc();
        self
    }
}
