// SPDX-License-Identifier: MIT

//! Disk-level operations: read both copies, reconcile, write repairs, lay out fresh tables.

use alloc::vec::Vec;

use diskio::prelude::*;

use crate::entry::*;
use crate::errors::*;
use crate::guid::Guid;
use crate::header::*;
use crate::overlap::{EntryFinding, check_entries};
use crate::reconcile::*;
use crate::validate::*;

/// Smallest disk that can hold both headers next to the protective MBR.
pub const GPT_MIN_DISK_SECTORS: u64 = 3;

/// Options for [`check_disk`] and [`sync_gpt`].
#[derive(Clone, Copy, Debug)]
pub struct SyncOptions {
    /// Write the planned repair back to the disk.
    pub write_repairs: bool,
    /// Run bounds/GUID/overlap checks on the trusted entries.
    pub check_entries: bool,
}

impl Default for SyncOptions {
    fn default() -> Self {
        Self {
            write_repairs: true,
            check_entries: true,
        }
    }
}

impl SyncOptions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Plan the repair but leave the disk untouched.
    pub fn dry_run(mut self) -> Self {
        self.write_repairs = false;
        self
    }

    pub fn no_entry_checks(mut self) -> Self {
        self.check_entries = false;
        self
    }
}

/// Everything learned from one pass over a disk.
#[derive(Clone, Debug)]
pub struct DiskReport {
    pub geometry: DiskGeometry,
    pub reconciliation: Reconciliation,
    pub findings: Vec<EntryFinding>,
    /// A repair image was written during this pass.
    pub repaired: bool,
}

impl DiskReport {
    #[inline]
    pub fn outcome(&self) -> Outcome {
        self.reconciliation.outcome()
    }

    /// Both copies valid and agreeing, no entry findings.
    pub fn is_healthy(&self) -> bool {
        self.outcome() == Outcome::BothValid && self.findings.is_empty()
    }
}

/// Geometry of the device behind `io`.
pub fn disk_geometry<IO: DiskIO + ?Sized>(io: &mut IO) -> PartResult<DiskGeometry> {
    let ss = io.sector_size();
    if ss < GPT_HEADER_SECTOR_SIZE as u64 || !ss.is_power_of_two() {
        return Err(PartError::Invalid("unsupported sector size"));
    }
    let total = io.disk_sector_count()?;
    if total < GPT_MIN_DISK_SECTORS {
        return Err(PartError::Invalid("disk too small for GPT"));
    }
    Ok(DiskGeometry::new(total).with_sector_size(ss))
}

/// Reads and validates one side.
///
/// The entry array is only read when the header passed every header-level check;
/// otherwise `entries_raw` is left empty.
pub fn read_gpt_copy<IO: DiskIO + ?Sized>(
    io: &mut IO,
    side: Side,
    geo: &DiskGeometry,
) -> PartResult<GptCopy> {
    let mut sector = [0u8; GPT_HEADER_SECTOR_SIZE];
    io.read_sectors_into(side.header_lba(geo), &mut sector)?;
    let header = decode_header(&sector);

    let verdict = validate_header(&header, geo);
    if !verdict.is_valid() {
        return Ok(GptCopy {
            side,
            header,
            entries_raw: Vec::new(),
            verdict,
        });
    }

    let len = header
        .entries_byte_len()
        .ok_or(PartError::Gpt(GptError::MalformedEntryArray(
            "GPT: entries byte length overflow",
        )))?;
    let mut entries_raw =
        io.read_sector_range(header.entries_lba, header.entries_sectors(geo.sector_size))?;
    entries_raw.truncate(len);

    Ok(GptCopy::new(side, header, entries_raw, geo))
}

/// Reads both sides and reconciles them. Never writes.
pub fn inspect_disk<IO: DiskIO + ?Sized>(io: &mut IO) -> PartResult<Reconciliation> {
    let geo = disk_geometry(io)?;
    let primary = read_gpt_copy(io, Side::Primary, &geo)?;
    let secondary = read_gpt_copy(io, Side::Secondary, &geo)?;
    Ok(reconcile(primary, secondary, &geo))
}

impl RepairImage {
    /// Writes the entry array, then the header, then flushes.
    pub fn apply<IO: DiskIO + ?Sized>(&self, io: &mut IO) -> PartResult {
        io.write_sector_range(self.entries_lba, &self.entries_block)?;
        io.write_sector_range(self.header_lba, &self.header_block)?;
        io.flush()?;
        Ok(())
    }
}

fn run<IO: DiskIO + ?Sized>(io: &mut IO, opts: &SyncOptions, write: bool) -> PartResult<DiskReport> {
    let geometry = disk_geometry(io)?;
    let primary = read_gpt_copy(io, Side::Primary, &geometry)?;
    let secondary = read_gpt_copy(io, Side::Secondary, &geometry)?;
    let reconciliation = reconcile(primary, secondary, &geometry);

    let findings = match reconciliation.authoritative() {
        Some(copy) if opts.check_entries => check_entries(&copy.header, &copy.entries()?),
        _ => Vec::new(),
    };

    let mut repaired = false;
    if write {
        if let Some(repair) = reconciliation.repair() {
            repair.apply(io)?;
            repaired = true;
        }
    }

    Ok(DiskReport {
        geometry,
        reconciliation,
        findings,
        repaired,
    })
}

/// Read-only health check.
pub fn check_disk<IO: DiskIO + ?Sized>(io: &mut IO, opts: &SyncOptions) -> PartResult<DiskReport> {
    run(io, opts, false)
}

/// Health check that also restores a missing or corrupt copy when allowed by `opts`.
///
/// Inconsistent or doubly-invalid tables are reported, never written.
pub fn sync_gpt<IO: DiskIO + ?Sized>(io: &mut IO, opts: &SyncOptions) -> PartResult<DiskReport> {
    run(io, opts, opts.write_repairs)
}

/// Parameters for a fresh table.
#[derive(Clone, Copy, Debug)]
pub struct GptLayout {
    pub total_sectors: u64,
    pub sector_size: u64,
    pub disk_guid: Guid,
    pub number_of_entries: u32,
    pub size_of_entry: u32,
}

impl GptLayout {
    pub fn new(total_sectors: u64, disk_guid: Guid) -> Self {
        Self {
            total_sectors,
            sector_size: DEFAULT_SECTOR_SIZE,
            disk_guid,
            number_of_entries: GPT_DEFAULT_NUM_ENTRIES,
            size_of_entry: GPT_ENTRY_SIZE as u32,
        }
    }

    pub fn with_sector_size(mut self, sector_size: u64) -> Self {
        self.sector_size = sector_size;
        self
    }

    pub fn with_entries(mut self, number_of_entries: u32, size_of_entry: u32) -> Self {
        self.number_of_entries = number_of_entries;
        self.size_of_entry = size_of_entry;
        self
    }

    #[inline]
    pub fn geometry(&self) -> DiskGeometry {
        DiskGeometry::new(self.total_sectors).with_sector_size(self.sector_size)
    }

    #[inline]
    pub fn entries_sectors(&self) -> u64 {
        (self.number_of_entries as u64 * self.size_of_entry as u64).div_ceil(self.sector_size)
    }

    #[inline]
    pub fn first_usable_lba(&self) -> u64 {
        GPT_PRIMARY_ENTRIES_LBA + self.entries_sectors()
    }

    /// Last sector before the secondary entry array.
    #[inline]
    pub fn last_usable_lba(&self) -> u64 {
        self.total_sectors
            .saturating_sub(2)
            .saturating_sub(self.entries_sectors())
    }

    /// Primary header for `entries_raw`, CRCs filled in.
    pub fn primary_header(&self, entries_raw: &[u8]) -> GptHeader {
        let mut h = GptHeader {
            signature: *GPT_SIGNATURE,
            revision: GPT_REVISION,
            size: GPT_HEADER_SIZE,
            header_crc32: 0,
            my_lba: GPT_PRIMARY_HEADER_LBA,
            alternate_lba: self.total_sectors.saturating_sub(1),
            first_usable_lba: self.first_usable_lba(),
            last_usable_lba: self.last_usable_lba(),
            disk_uuid: self.disk_guid,
            entries_lba: GPT_PRIMARY_ENTRIES_LBA,
            number_of_entries: self.number_of_entries,
            size_of_entry: self.size_of_entry,
            entries_crc32: 0,
            ..GptHeader::default()
        };
        h.update_crcs(entries_raw);
        h
    }
}

/// Writes both copies of a new table describing `entries`. Returns the primary header.
///
/// Entries are checked first; a table with overlaps, duplicate GUIDs or
/// out-of-range partitions is refused.
pub fn write_gpt<IO: DiskIO + ?Sized>(
    io: &mut IO,
    layout: &GptLayout,
    entries: &[GptEntry],
) -> PartResult<GptHeader> {
    let geo = disk_geometry(io)?;
    // The secondary copy must land in the disk's real last sector.
    if geo.sector_size != layout.sector_size || geo.total_sectors != layout.total_sectors {
        return Err(PartError::Invalid("layout does not match disk"));
    }
    let geo = layout.geometry();
    if layout.first_usable_lba() > layout.last_usable_lba() {
        return Err(PartError::Invalid("disk too small for GPT"));
    }

    let entries_raw =
        encode_entry_table(entries, layout.number_of_entries, layout.size_of_entry)?;
    let primary = GptCopy::new(
        Side::Primary,
        layout.primary_header(&entries_raw),
        entries_raw,
        &geo,
    );
    if let Some(err) = primary.verdict.error() {
        return Err(err.into());
    }
    if let Some(finding) = check_entries(&primary.header, &primary.entries()?).first() {
        return Err(finding.error.into());
    }

    let secondary = synthesize_counterpart(&primary, Side::Secondary, &geo);
    if let Some(err) = secondary.verdict.error() {
        return Err(err.into());
    }

    // Secondary first: a crash part way leaves the primary as it was.
    RepairImage::from_copy(&secondary, geo.sector_size).apply(io)?;
    RepairImage::from_copy(&primary, geo.sector_size).apply(io)?;
    Ok(primary.header)
}
