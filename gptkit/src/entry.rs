// SPDX-License-Identifier: MIT

use alloc::string::String;
use alloc::vec;
use alloc::vec::Vec;

use zerocopy::byteorder::little_endian::{U16, U64};
use zerocopy::{FromBytes, Immutable, IntoBytes, KnownLayout, Unaligned};

use crate::errors::*;
use crate::guid::Guid;
use crate::guids::PartitionKind;

/// Width of the fields an entry carries; on-disk slots may be wider.
pub const GPT_ENTRY_SIZE: usize = 128;
pub const GPT_DEFAULT_NUM_ENTRIES: u32 = 128;
pub const GPT_NAME_LEN: usize = 36;

/// On-disk entry layout (first 128 bytes of a slot).
#[derive(IntoBytes, FromBytes, KnownLayout, Immutable, Unaligned, Copy, Clone, Debug)]
#[repr(C)]
struct RawGptEntry {
    type_guid: [u8; 16],
    unique_guid: [u8; 16],
    starting_lba: U64,
    ending_lba: U64,
    attributes: U64,
    name: [U16; GPT_NAME_LEN],
}

pub fn encode_gpt_name(name: &str) -> [u16; GPT_NAME_LEN] {
    let mut buf = [0u16; GPT_NAME_LEN];
    for (i, c) in name.encode_utf16().take(GPT_NAME_LEN).enumerate() {
        buf[i] = c;
    }
    buf
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct GptEntry {
    pub type_guid: Guid,
    pub unique_guid: Guid,
    pub starting_lba: u64,
    pub ending_lba: u64,
    pub attributes: u64,
    pub name: [u16; GPT_NAME_LEN],
}

/// An unused slot: all fields zero.
impl Default for GptEntry {
    fn default() -> Self {
        Self {
            type_guid: Guid::ZERO,
            unique_guid: Guid::ZERO,
            starting_lba: 0,
            ending_lba: 0,
            attributes: 0,
            name: [0; GPT_NAME_LEN],
        }
    }
}

impl GptEntry {
    pub fn new(
        type_guid: Guid,
        unique_guid: Guid,
        starting_lba: u64,
        ending_lba: u64,
        attributes: u64,
        name: &str,
    ) -> Self {
        Self {
            type_guid,
            unique_guid,
            starting_lba,
            ending_lba,
            attributes,
            name: encode_gpt_name(name),
        }
    }

    /// An all-zero type GUID marks a free slot.
    #[inline]
    pub fn is_unused(&self) -> bool {
        self.type_guid.is_zero()
    }

    #[inline]
    pub fn kind(&self) -> PartitionKind {
        PartitionKind::from_guid(&self.type_guid)
    }

    /// Inclusive length, zero for an inverted range.
    #[inline]
    pub fn size_in_sectors(&self) -> u64 {
        if self.ending_lba >= self.starting_lba {
            self.ending_lba - self.starting_lba + 1
        } else {
            0
        }
    }

    /// Decodes the label up to the first NUL, replacing invalid code units.
    pub fn name_string(&self) -> String {
        let end = self
            .name
            .iter()
            .position(|&c| c == 0)
            .unwrap_or(GPT_NAME_LEN);
        String::from_utf16_lossy(&self.name[..end])
    }

    fn from_raw(raw: &RawGptEntry) -> Self {
        Self {
            type_guid: Guid::from_bytes(raw.type_guid),
            unique_guid: Guid::from_bytes(raw.unique_guid),
            starting_lba: raw.starting_lba.get(),
            ending_lba: raw.ending_lba.get(),
            attributes: raw.attributes.get(),
            name: raw.name.map(|c| c.get()),
        }
    }

    fn to_raw(&self) -> RawGptEntry {
        RawGptEntry {
            type_guid: self.type_guid.to_bytes(),
            unique_guid: self.unique_guid.to_bytes(),
            starting_lba: U64::new(self.starting_lba),
            ending_lba: U64::new(self.ending_lba),
            attributes: U64::new(self.attributes),
            name: self.name.map(U16::new),
        }
    }
}

#[inline]
fn check_entry_size(size_of_entry: usize) -> GptResult<()> {
    if size_of_entry < GPT_ENTRY_SIZE {
        return Err(GptError::MalformedEntryArray("GPT: entry size below 128 bytes"));
    }
    Ok(())
}

/// Splits the array into positional records, unused slots included.
pub fn decode_entries(
    bytes: &[u8],
    number_of_entries: u32,
    size_of_entry: u32,
) -> GptResult<Vec<GptEntry>> {
    let es = size_of_entry as usize;
    check_entry_size(es)?;
    let expected = (number_of_entries as usize)
        .checked_mul(es)
        .ok_or(GptError::MalformedEntryArray("GPT: entries byte length overflow"))?;
    if bytes.len() != expected {
        return Err(GptError::MalformedEntryArray(
            "GPT: entry array length does not match header",
        ));
    }

    let mut out = Vec::with_capacity(number_of_entries as usize);
    for slot in bytes.chunks_exact(es) {
        let (raw, _tail) = RawGptEntry::ref_from_prefix(slot)
            .map_err(|_| GptError::MalformedEntryArray("GPT: invalid entry"))?;
        out.push(GptEntry::from_raw(raw));
    }
    Ok(out)
}

/// Serializes entries into slots of `size_of_entry` bytes, zero-padding each slot.
pub fn encode_entries(entries: &[GptEntry], size_of_entry: u32) -> GptResult<Vec<u8>> {
    let es = size_of_entry as usize;
    check_entry_size(es)?;
    let len = entries
        .len()
        .checked_mul(es)
        .ok_or(GptError::MalformedEntryArray("GPT: entries byte length overflow"))?;

    let mut out = vec![0u8; len];
    for (slot, e) in out.chunks_exact_mut(es).zip(entries) {
        slot[..GPT_ENTRY_SIZE].copy_from_slice(e.to_raw().as_bytes());
    }
    Ok(out)
}

/// Builds a full table of `number_of_entries` slots, `entries` first, the rest unused.
pub fn encode_entry_table(
    entries: &[GptEntry],
    number_of_entries: u32,
    size_of_entry: u32,
) -> GptResult<Vec<u8>> {
    if entries.len() > number_of_entries as usize {
        return Err(GptError::MalformedEntryArray(
            "GPT: more entries than table slots",
        ));
    }
    let mut table = vec![GptEntry::default(); number_of_entries as usize];
    table[..entries.len()].copy_from_slice(entries);
    encode_entries(&table, size_of_entry)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::guids::GPT_ENT_TYPE_EFI;

    fn esp() -> GptEntry {
        GptEntry::new(
            GPT_ENT_TYPE_EFI,
            Guid::from_bytes([1; 16]),
            100,
            500,
            0x8000_0000_0000_0001,
            "EFI-SYSTEM",
        )
    }

    #[test]
    fn wire_offsets() {
        let bytes = encode_entries(&[esp()], 128).unwrap();
        assert_eq!(bytes.len(), 128);
        assert_eq!(&bytes[0..16], GPT_ENT_TYPE_EFI.as_bytes());
        assert_eq!(&bytes[16..32], &[1; 16]);
        assert_eq!(u64::from_le_bytes(bytes[32..40].try_into().unwrap()), 100);
        assert_eq!(u64::from_le_bytes(bytes[40..48].try_into().unwrap()), 500);
        assert_eq!(
            u64::from_le_bytes(bytes[48..56].try_into().unwrap()),
            0x8000_0000_0000_0001
        );
        assert_eq!(&bytes[56..60], &[b'E', 0, b'F', 0]);
    }

    #[test]
    fn wide_slots_are_zero_padded_and_positional() {
        let entries = [esp(), GptEntry::default(), esp()];
        let bytes = encode_entries(&entries, 256).unwrap();
        assert_eq!(bytes.len(), 768);
        assert!(bytes[128..256].iter().all(|&b| b == 0));

        let back = decode_entries(&bytes, 3, 256).unwrap();
        assert_eq!(back, entries);
        assert!(back[1].is_unused());
    }

    #[test]
    fn length_mismatch_is_malformed() {
        let bytes = encode_entries(&[esp()], 128).unwrap();
        assert!(matches!(
            decode_entries(&bytes, 2, 128),
            Err(GptError::MalformedEntryArray(_))
        ));
        assert!(matches!(
            decode_entries(&bytes[..64], 1, 64),
            Err(GptError::MalformedEntryArray(_))
        ));
    }

    #[test]
    fn name_decoding_stops_at_nul() {
        assert_eq!(esp().name_string(), "EFI-SYSTEM");
        let long = "x".repeat(50);
        let e = GptEntry::new(GPT_ENT_TYPE_EFI, Guid::ZERO, 0, 0, 0, &long);
        assert_eq!(e.name_string().len(), GPT_NAME_LEN);
    }

    #[test]
    fn table_fills_unused_slots() {
        let table = encode_entry_table(&[esp()], 4, 128).unwrap();
        assert_eq!(table.len(), 512);
        let back = decode_entries(&table, 4, 128).unwrap();
        assert_eq!(back.iter().filter(|e| !e.is_unused()).count(), 1);
        assert!(encode_entry_table(&[esp(); 5], 4, 128).is_err());
    }

    #[test]
    fn default_entry_encodes_as_zero_slot() {
        let e = GptEntry::default();
        assert!(e.is_unused());
        assert_eq!(e.name_string(), "");
        let bytes = encode_entries(&[e], 128).unwrap();
        assert!(bytes.iter().all(|&b| b == 0));
    }

    #[test]
    fn inverted_range_has_no_size() {
        let mut e = esp();
        assert_eq!(e.size_in_sectors(), 401);
        e.ending_lba = 10;
        assert_eq!(e.size_in_sectors(), 0);
    }
}
