// SPDX-License-Identifier: MIT

//! Structural validation of one header + entry array, in isolation.

use crate::crc::crc32;
use crate::errors::*;
use crate::header::*;
use crate::entry::GPT_ENTRY_SIZE;

pub const DEFAULT_SECTOR_SIZE: u64 = diskio::DEFAULT_SECTOR_SIZE;
pub const GPT_MAX_NUM_ENTRIES: u32 = 16_384;
pub const GPT_MAX_ENTRY_SIZE: u32 = 4096;

/// Size of the device the tables are checked against.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct DiskGeometry {
    pub total_sectors: u64,
    pub sector_size: u64,
}

impl DiskGeometry {
    pub const fn new(total_sectors: u64) -> Self {
        Self {
            total_sectors,
            sector_size: DEFAULT_SECTOR_SIZE,
        }
    }

    pub const fn with_sector_size(mut self, sector_size: u64) -> Self {
        self.sector_size = sector_size;
        self
    }

    /// Sector of the secondary header.
    #[inline]
    pub const fn last_lba(&self) -> u64 {
        self.total_sectors.saturating_sub(1)
    }

    #[inline]
    pub const fn contains(&self, lba: u64) -> bool {
        lba < self.total_sectors
    }
}

/// Validation stages, in the order they run.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Check {
    Signature,
    Revision,
    HeaderSize,
    HeaderCrc,
    Reserved,
    LbaRange,
    EntriesRegion,
    EntriesCrc,
}

/// Outcome of validating one copy: valid, or the first stage that failed.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Verdict {
    Valid,
    Invalid { check: Check, error: GptError },
}

impl Verdict {
    #[inline]
    pub fn is_valid(&self) -> bool {
        matches!(self, Verdict::Valid)
    }

    #[inline]
    pub fn error(&self) -> Option<GptError> {
        match self {
            Verdict::Valid => None,
            Verdict::Invalid { error, .. } => Some(*error),
        }
    }

    #[inline]
    pub fn failed_check(&self) -> Option<Check> {
        match self {
            Verdict::Valid => None,
            Verdict::Invalid { check, .. } => Some(*check),
        }
    }

    fn from_result(check: Check, r: GptResult) -> Self {
        match r {
            Ok(()) => Verdict::Valid,
            Err(error) => Verdict::Invalid { check, error },
        }
    }
}

macro_rules! run_check {
    ($check:expr, $e:expr) => {
        if let Err(error) = $e {
            return Verdict::Invalid {
                check: $check,
                error,
            };
        }
    };
}

#[inline]
fn in_range(lba: u64, first: u64, last: u64) -> bool {
    first <= lba && lba <= last
}

#[inline]
fn lba_err(what: &'static str, lba: u64) -> GptError {
    GptError::LbaOutOfRange { what, lba }
}

fn check_signature(h: &GptHeader) -> GptResult {
    if &h.signature != GPT_SIGNATURE {
        return Err(GptError::SignatureMismatch { found: h.signature });
    }
    Ok(())
}

fn check_revision(h: &GptHeader) -> GptResult {
    if h.revision != GPT_REVISION {
        return Err(GptError::RevisionMismatch { found: h.revision });
    }
    Ok(())
}

fn check_header_size(h: &GptHeader) -> GptResult {
    if h.size < GPT_HEADER_SIZE || h.size as usize > GPT_HEADER_SECTOR_SIZE {
        return Err(GptError::InvalidHeaderSize { size: h.size });
    }
    Ok(())
}

fn check_header_crc(h: &GptHeader) -> GptResult {
    let found = h.compute_header_crc32();
    if found != h.header_crc32 {
        return Err(GptError::HeaderChecksumMismatch {
            expected: h.header_crc32,
            found,
        });
    }
    Ok(())
}

fn check_reserved(h: &GptHeader) -> GptResult {
    match h.first_nonzero_reserved() {
        Some(offset) => Err(GptError::ReservedNotZero { offset }),
        None => Ok(()),
    }
}

fn check_lba_range(h: &GptHeader, geo: &DiskGeometry) -> GptResult {
    let (first, last) = (h.first_usable_lba, h.last_usable_lba);
    if first > last {
        return Err(lba_err("first_usable_lba", first));
    }
    if !geo.contains(last) {
        return Err(lba_err("last_usable_lba", last));
    }
    // LBA 0 belongs to the protective MBR.
    if h.my_lba == 0 || !geo.contains(h.my_lba) || in_range(h.my_lba, first, last) {
        return Err(lba_err("my_lba", h.my_lba));
    }
    if h.alternate_lba == 0
        || h.alternate_lba == h.my_lba
        || !geo.contains(h.alternate_lba)
        || in_range(h.alternate_lba, first, last)
    {
        return Err(lba_err("alternate_lba", h.alternate_lba));
    }
    Ok(())
}

fn check_entries_region(h: &GptHeader, geo: &DiskGeometry) -> GptResult {
    let es = h.size_of_entry;
    if es < GPT_ENTRY_SIZE as u32 || es > GPT_MAX_ENTRY_SIZE || !es.is_power_of_two() {
        return Err(GptError::MalformedEntryArray("GPT: invalid size_of_entry"));
    }
    if h.number_of_entries == 0 || h.number_of_entries > GPT_MAX_NUM_ENTRIES {
        return Err(GptError::MalformedEntryArray(
            "GPT: number_of_entries out of range",
        ));
    }

    let start = h.entries_lba;
    let sectors = h.entries_sectors(geo.sector_size);
    let end = start
        .checked_add(sectors - 1)
        .ok_or(lba_err("entries_lba", start))?;

    if start == 0 || !geo.contains(end) {
        return Err(lba_err("entries_lba", start));
    }
    // [start, end] must stay clear of the usable range and of both header sectors.
    if start <= h.last_usable_lba && h.first_usable_lba <= end {
        return Err(lba_err("entries_lba", start));
    }
    if in_range(h.my_lba, start, end) || in_range(h.alternate_lba, start, end) {
        return Err(lba_err("entries_lba", start));
    }
    Ok(())
}

fn check_entries_crc(h: &GptHeader, entries_raw: &[u8]) -> GptResult {
    if Some(entries_raw.len()) != h.entries_byte_len() {
        return Err(GptError::MalformedEntryArray(
            "GPT: entry array length does not match header",
        ));
    }
    let found = crc32(entries_raw);
    if found != h.entries_crc32 {
        return Err(GptError::EntriesChecksumMismatch {
            expected: h.entries_crc32,
            found,
        });
    }
    Ok(())
}

/// Runs every check that does not need the entry array.
///
/// When this passes, the entry region is known to lie on the disk and can be read.
pub fn validate_header(header: &GptHeader, geo: &DiskGeometry) -> Verdict {
    run_check!(Check::Signature, check_signature(header));
    run_check!(Check::Revision, check_revision(header));
    run_check!(Check::HeaderSize, check_header_size(header));
    run_check!(Check::HeaderCrc, check_header_crc(header));
    run_check!(Check::Reserved, check_reserved(header));
    run_check!(Check::LbaRange, check_lba_range(header, geo));
    run_check!(Check::EntriesRegion, check_entries_region(header, geo));
    Verdict::Valid
}

/// Full validation of one copy. Pure: no I/O, no mutation.
pub fn validate(header: &GptHeader, entries_raw: &[u8], geo: &DiskGeometry) -> Verdict {
    match validate_header(header, geo) {
        Verdict::Valid => {
            Verdict::from_result(Check::EntriesCrc, check_entries_crc(header, entries_raw))
        }
        invalid => invalid,
    }
}
