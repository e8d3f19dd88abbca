// SPDX-License-Identifier: MIT

//! Decides which GPT copy to trust and what to write to bring both copies back in sync.

use alloc::vec;
use alloc::vec::Vec;
use core::fmt;

use crate::entry::{GptEntry, decode_entries};
use crate::errors::*;
use crate::header::*;
use crate::validate::*;

/// Where a copy lives.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum Side {
    Primary,
    Secondary,
}

impl Side {
    /// Header sector for this side on a disk of the given geometry.
    #[inline]
    pub fn header_lba(self, geo: &DiskGeometry) -> u64 {
        match self {
            Side::Primary => GPT_PRIMARY_HEADER_LBA,
            Side::Secondary => geo.last_lba(),
        }
    }

    #[inline]
    pub fn other(self) -> Side {
        match self {
            Side::Primary => Side::Secondary,
            Side::Secondary => Side::Primary,
        }
    }
}

impl fmt::Display for Side {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Side::Primary => "primary",
            Side::Secondary => "secondary",
        })
    }
}

/// One header with its raw entry array, as read from one side.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct GptCopy {
    pub side: Side,
    pub header: GptHeader,
    /// Exactly `number_of_entries * size_of_entry` bytes when the header allowed reading them.
    pub entries_raw: Vec<u8>,
    pub verdict: Verdict,
}

impl GptCopy {
    /// Validates `header` + `entries_raw` and records the verdict.
    pub fn new(side: Side, header: GptHeader, entries_raw: Vec<u8>, geo: &DiskGeometry) -> Self {
        let verdict = validate(&header, &entries_raw, geo);
        Self {
            side,
            header,
            entries_raw,
            verdict,
        }
    }

    #[inline]
    pub fn is_valid(&self) -> bool {
        self.verdict.is_valid()
    }

    /// Positional entries, unused slots included.
    pub fn entries(&self) -> GptResult<Vec<GptEntry>> {
        decode_entries(
            &self.entries_raw,
            self.header.number_of_entries,
            self.header.size_of_entry,
        )
    }

    /// A structurally valid copy must also sit where its side says it does.
    fn check_role(&mut self, geo: &DiskGeometry) {
        if !self.is_valid() {
            return;
        }
        let (my, alt) = match self.side {
            Side::Primary => (GPT_PRIMARY_HEADER_LBA, geo.last_lba()),
            Side::Secondary => (geo.last_lba(), GPT_PRIMARY_HEADER_LBA),
        };
        let error = if self.header.my_lba != my {
            GptError::LbaOutOfRange {
                what: "my_lba",
                lba: self.header.my_lba,
            }
        } else if self.header.alternate_lba != alt {
            GptError::LbaOutOfRange {
                what: "alternate_lba",
                lba: self.header.alternate_lba,
            }
        } else {
            return;
        };
        self.verdict = Verdict::Invalid {
            check: Check::LbaRange,
            error,
        };
    }
}

/// Sectors to write to restore one side. Entries go down before the header.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RepairImage {
    pub side: Side,
    pub header: GptHeader,
    pub header_lba: u64,
    /// Encoded header, zero-padded to a whole sector.
    pub header_block: Vec<u8>,
    pub entries_lba: u64,
    /// Entry array, zero-padded to whole sectors.
    pub entries_block: Vec<u8>,
}

impl RepairImage {
    /// Sector images for writing `copy` at its own position.
    pub fn from_copy(copy: &GptCopy, sector_size: u64) -> Self {
        let ss = (sector_size as usize).max(1);
        let mut header_block = vec![0u8; ss.max(GPT_HEADER_SECTOR_SIZE)];
        header_block[..GPT_HEADER_SECTOR_SIZE].copy_from_slice(&encode_header(&copy.header));

        let mut entries_block = copy.entries_raw.clone();
        entries_block.resize(copy.entries_raw.len().div_ceil(ss) * ss, 0);

        Self {
            side: copy.side,
            header: copy.header,
            header_lba: copy.header.my_lba,
            header_block,
            entries_lba: copy.header.entries_lba,
            entries_block,
        }
    }
}

/// Builds the copy for `side` from a trusted one: same entries, mirrored geometry, fresh CRCs.
pub fn synthesize_counterpart(trusted: &GptCopy, side: Side, geo: &DiskGeometry) -> GptCopy {
    let mut header = match side {
        Side::Primary => trusted.header.to_primary(geo.total_sectors),
        Side::Secondary => trusted.header.to_backup(geo.total_sectors, geo.sector_size),
    };
    let entries_raw = trusted.entries_raw.clone();
    header.update_crcs(&entries_raw);
    GptCopy::new(side, header, entries_raw, geo)
}

/// Result tag, for reporting.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Outcome {
    BothValid,
    PrimaryOnly,
    SecondaryOnly,
    InconsistentMirrors,
    NeitherValid,
}

impl fmt::Display for Outcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Outcome::BothValid => "both copies valid",
            Outcome::PrimaryOnly => "primary valid, secondary needs repair",
            Outcome::SecondaryOnly => "secondary valid, primary needs repair",
            Outcome::InconsistentMirrors => "both copies valid but they disagree",
            Outcome::NeitherValid => "no valid copy",
        })
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Reconciliation {
    BothValid {
        authoritative: GptCopy,
    },
    PrimaryOnly {
        authoritative: GptCopy,
        secondary_error: GptError,
        repair: RepairImage,
    },
    SecondaryOnly {
        authoritative: GptCopy,
        primary_error: GptError,
        repair: RepairImage,
    },
    /// Both copies are valid on their own but describe different tables.
    /// Never auto-repaired.
    Inconsistent {
        primary: GptCopy,
        secondary: GptCopy,
        mismatches: Vec<&'static str>,
    },
    NeitherValid {
        primary_error: GptError,
        secondary_error: GptError,
    },
}

impl Reconciliation {
    pub fn outcome(&self) -> Outcome {
        match self {
            Reconciliation::BothValid { .. } => Outcome::BothValid,
            Reconciliation::PrimaryOnly { .. } => Outcome::PrimaryOnly,
            Reconciliation::SecondaryOnly { .. } => Outcome::SecondaryOnly,
            Reconciliation::Inconsistent { .. } => Outcome::InconsistentMirrors,
            Reconciliation::NeitherValid { .. } => Outcome::NeitherValid,
        }
    }

    pub fn authoritative(&self) -> Option<&GptCopy> {
        match self {
            Reconciliation::BothValid { authoritative }
            | Reconciliation::PrimaryOnly { authoritative, .. }
            | Reconciliation::SecondaryOnly { authoritative, .. } => Some(authoritative),
            _ => None,
        }
    }

    pub fn repair(&self) -> Option<&RepairImage> {
        match self {
            Reconciliation::PrimaryOnly { repair, .. }
            | Reconciliation::SecondaryOnly { repair, .. } => Some(repair),
            _ => None,
        }
    }

    /// The trusted copy, or the error an operator has to deal with.
    pub fn into_result(self) -> GptResult<GptCopy> {
        match self {
            Reconciliation::BothValid { authoritative }
            | Reconciliation::PrimaryOnly { authoritative, .. }
            | Reconciliation::SecondaryOnly { authoritative, .. } => Ok(authoritative),
            Reconciliation::Inconsistent { mismatches, .. } => Err(GptError::InconsistentMirrors {
                field: mismatches.first().copied().unwrap_or("entries"),
            }),
            Reconciliation::NeitherValid { .. } => Err(GptError::Unrecoverable),
        }
    }
}

/// Fields that must agree between two valid copies.
pub fn mirror_mismatches(primary: &GptHeader, pe: &[u8], secondary: &GptHeader, se: &[u8]) -> Vec<&'static str> {
    let mut out = Vec::new();
    if primary.disk_uuid != secondary.disk_uuid {
        out.push("disk_uuid");
    }
    if primary.first_usable_lba != secondary.first_usable_lba {
        out.push("first_usable_lba");
    }
    if primary.last_usable_lba != secondary.last_usable_lba {
        out.push("last_usable_lba");
    }
    if primary.number_of_entries != secondary.number_of_entries {
        out.push("number_of_entries");
    }
    if primary.size_of_entry != secondary.size_of_entry {
        out.push("size_of_entry");
    }
    if primary.alternate_lba != secondary.my_lba || secondary.alternate_lba != primary.my_lba {
        out.push("alternate_lba");
    }
    if pe != se {
        out.push("entries");
    }
    out
}

fn error_of(copy: &GptCopy) -> GptError {
    copy.verdict.error().unwrap_or(GptError::Unrecoverable)
}

fn restore(trusted: GptCopy, geo: &DiskGeometry, other_error: GptError) -> Reconciliation {
    let target = trusted.side.other();
    let counterpart = synthesize_counterpart(&trusted, target, geo);

    if !counterpart.is_valid() {
        // The trusted copy cannot be mirrored on this disk.
        let mirror_error = error_of(&counterpart);
        return match trusted.side {
            Side::Primary => Reconciliation::NeitherValid {
                primary_error: mirror_error,
                secondary_error: other_error,
            },
            Side::Secondary => Reconciliation::NeitherValid {
                primary_error: other_error,
                secondary_error: mirror_error,
            },
        };
    }

    let repair = RepairImage::from_copy(&counterpart, geo.sector_size);
    match trusted.side {
        Side::Primary => Reconciliation::PrimaryOnly {
            authoritative: trusted,
            secondary_error: other_error,
            repair,
        },
        Side::Secondary => Reconciliation::SecondaryOnly {
            authoritative: trusted,
            primary_error: other_error,
            repair,
        },
    }
}

/// Compares the two copies and plans a repair. Pure: performs no I/O.
///
/// `primary` and `secondary` carry the verdicts from [`validate`]; the reconciler adds
/// the check that each copy sits at its side's position on this disk.
pub fn reconcile(mut primary: GptCopy, mut secondary: GptCopy, geo: &DiskGeometry) -> Reconciliation {
    primary.side = Side::Primary;
    secondary.side = Side::Secondary;
    primary.check_role(geo);
    secondary.check_role(geo);

    match (primary.is_valid(), secondary.is_valid()) {
        (true, true) => {
            let mismatches = mirror_mismatches(
                &primary.header,
                &primary.entries_raw,
                &secondary.header,
                &secondary.entries_raw,
            );
            if mismatches.is_empty() {
                Reconciliation::BothValid {
                    authoritative: primary,
                }
            } else {
                Reconciliation::Inconsistent {
                    primary,
                    secondary,
                    mismatches,
                }
            }
        }
        (true, false) => {
            let err = error_of(&secondary);
            restore(primary, geo, err)
        }
        (false, true) => {
            let err = error_of(&primary);
            restore(secondary, geo, err)
        }
        (false, false) => Reconciliation::NeitherValid {
            primary_error: error_of(&primary),
            secondary_error: error_of(&secondary),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entry::encode_entry_table;
    use crate::guid::Guid;
    use crate::guids::{GPT_ENT_TYPE_CHROMEOS_KERNEL, GPT_ENT_TYPE_EFI};

    const GEO: DiskGeometry = DiskGeometry::new(1000);

    fn table() -> Vec<u8> {
        let esp = GptEntry::new(GPT_ENT_TYPE_EFI, Guid::from_bytes([1; 16]), 100, 500, 0, "ESP");
        let kern = GptEntry::new(
            GPT_ENT_TYPE_CHROMEOS_KERNEL,
            Guid::from_bytes([2; 16]),
            501,
            900,
            0,
            "KERN-A",
        );
        encode_entry_table(&[esp, kern], 128, 128).unwrap()
    }

    fn copies() -> (GptCopy, GptCopy) {
        let raw = table();
        let mut h = GptHeader {
            signature: *GPT_SIGNATURE,
            revision: GPT_REVISION,
            size: GPT_HEADER_SIZE,
            header_crc32: 0,
            my_lba: 1,
            alternate_lba: 999,
            first_usable_lba: 34,
            last_usable_lba: 966,
            disk_uuid: Guid::from_bytes([0xAB; 16]),
            entries_lba: 2,
            number_of_entries: 128,
            size_of_entry: 128,
            entries_crc32: 0,
            ..GptHeader::default()
        };
        h.update_crcs(&raw);
        let p = GptCopy::new(Side::Primary, h, raw.clone(), &GEO);
        let b = h.to_backup(GEO.total_sectors, GEO.sector_size);
        let s = GptCopy::new(Side::Secondary, b, raw, &GEO);
        (p, s)
    }

    fn corrupt(copy: &mut GptCopy) {
        copy.header.signature = *b"XXXXXXXX";
        copy.verdict = validate(&copy.header, &copy.entries_raw, &GEO);
    }

    #[test]
    fn healthy_disk_needs_nothing() {
        let (p, s) = copies();
        let r = reconcile(p.clone(), s, &GEO);
        assert_eq!(r.outcome(), Outcome::BothValid);
        assert!(r.repair().is_none());
        assert_eq!(r.authoritative(), Some(&p));
    }

    #[test]
    fn corrupt_primary_is_rebuilt_from_secondary() {
        let (mut p, s) = copies();
        let expected = p.header;
        corrupt(&mut p);

        let r = reconcile(p, s.clone(), &GEO);
        assert_eq!(r.outcome(), Outcome::SecondaryOnly);
        let repair = r.repair().unwrap();
        assert_eq!(repair.side, Side::Primary);
        assert_eq!(repair.header_lba, 1);
        assert_eq!(repair.entries_lba, 2);
        assert_eq!(repair.header, expected);
        assert_eq!(repair.entries_block, s.entries_raw);
        assert_eq!(repair.header_block.len(), 512);
        assert_eq!(decode_header(repair.header_block[..512].try_into().unwrap()), expected);
    }

    #[test]
    fn corrupt_secondary_is_rebuilt_from_primary() {
        let (p, mut s) = copies();
        let expected = s.header;
        s.entries_raw[0] ^= 1;
        s.verdict = validate(&s.header, &s.entries_raw, &GEO);

        let r = reconcile(p, s, &GEO);
        match &r {
            Reconciliation::PrimaryOnly {
                secondary_error,
                repair,
                ..
            } => {
                assert!(matches!(secondary_error, GptError::EntriesChecksumMismatch { .. }));
                assert_eq!(repair.header, expected);
                assert_eq!(repair.header_lba, 999);
                assert_eq!(repair.entries_lba, 967);
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn applying_repair_then_reconciling_is_idempotent() {
        let (p, mut s) = copies();
        corrupt(&mut s);
        let r = reconcile(p.clone(), s, &GEO);
        let repair = r.repair().unwrap().clone();

        let rebuilt = GptCopy::new(Side::Secondary, repair.header, repair.entries_block, &GEO);
        let again = reconcile(p, rebuilt, &GEO);
        assert_eq!(again.outcome(), Outcome::BothValid);
        assert!(again.repair().is_none());
    }

    #[test]
    fn repair_image_tolerates_zero_sector_size() {
        let (p, _) = copies();
        let img = RepairImage::from_copy(&p, 0);
        assert_eq!(img.header_block.len(), GPT_HEADER_SECTOR_SIZE);
        assert_eq!(img.entries_block, p.entries_raw);
    }

    #[test]
    fn neither_valid_is_unrecoverable() {
        let (mut p, mut s) = copies();
        corrupt(&mut p);
        corrupt(&mut s);
        let r = reconcile(p, s, &GEO);
        assert_eq!(r.outcome(), Outcome::NeitherValid);
        assert!(r.repair().is_none());
        assert_eq!(r.into_result().unwrap_err(), GptError::Unrecoverable);
    }

    #[test]
    fn disagreeing_valid_copies_are_not_repaired() {
        let (p, mut s) = copies();
        s.header.disk_uuid = Guid::from_bytes([0xCD; 16]);
        s.header.update_header_crc();
        s.verdict = validate(&s.header, &s.entries_raw, &GEO);
        assert!(s.is_valid());

        let r = reconcile(p, s, &GEO);
        assert!(r.repair().is_none());
        match &r {
            Reconciliation::Inconsistent { mismatches, .. } => {
                assert_eq!(mismatches.as_slice(), ["disk_uuid"])
            }
            other => panic!("unexpected {other:?}"),
        }
        assert_eq!(
            r.into_result().unwrap_err(),
            GptError::InconsistentMirrors { field: "disk_uuid" }
        );
    }

    #[test]
    fn copy_in_the_wrong_position_is_not_trusted() {
        let (p, _) = copies();
        // A primary image stored where the secondary belongs.
        let misplaced = GptCopy::new(Side::Secondary, p.header, p.entries_raw.clone(), &GEO);
        assert!(misplaced.is_valid());
        let r = reconcile(p, misplaced, &GEO);
        assert_eq!(r.outcome(), Outcome::PrimaryOnly);
    }

    #[test]
    fn trusted_copy_that_cannot_be_mirrored() {
        let (mut p, mut s) = copies();
        // Usable range reaches into where the secondary entries must go.
        p.header.last_usable_lba = 990;
        p.header.update_header_crc();
        p.verdict = validate(&p.header, &p.entries_raw, &GEO);
        assert!(p.is_valid());
        corrupt(&mut s);

        let r = reconcile(p, s, &GEO);
        assert_eq!(r.outcome(), Outcome::NeitherValid);
    }
}
