// SPDX-License-Identifier: MIT

//! Semantic checks over the decoded entries of an already-valid table.

use alloc::vec::Vec;

use crate::entry::GptEntry;
use crate::errors::GptError;
use crate::header::GptHeader;

/// One problem in the entry array. `index` is the slot number;
/// `other` names the second slot for pairwise findings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EntryFinding {
    pub index: usize,
    pub other: Option<usize>,
    pub error: GptError,
}

impl EntryFinding {
    #[inline]
    fn single(index: usize, error: GptError) -> Self {
        Self {
            index,
            other: None,
            error,
        }
    }

    #[inline]
    fn pair(index: usize, other: usize, error: GptError) -> Self {
        Self {
            index,
            other: Some(other),
            error,
        }
    }
}

/// Bounds, GUID and overlap checks for every used entry.
///
/// Unused slots (zero type GUID) are ignored. Findings come in this order:
/// range problems, zero unique GUIDs, duplicate unique GUIDs, overlaps.
pub fn check_entries(header: &GptHeader, entries: &[GptEntry]) -> Vec<EntryFinding> {
    let mut findings = Vec::new();
    let used: Vec<(usize, &GptEntry)> = entries
        .iter()
        .enumerate()
        .filter(|(_, e)| !e.is_unused())
        .collect();

    // Bounds
    for &(i, e) in &used {
        if e.starting_lba > e.ending_lba || e.starting_lba < header.first_usable_lba {
            findings.push(EntryFinding::single(
                i,
                GptError::LbaOutOfRange {
                    what: "starting_lba",
                    lba: e.starting_lba,
                },
            ));
        } else if e.ending_lba > header.last_usable_lba {
            findings.push(EntryFinding::single(
                i,
                GptError::LbaOutOfRange {
                    what: "ending_lba",
                    lba: e.ending_lba,
                },
            ));
        }
    }

    // Unique GUIDs
    for &(i, e) in &used {
        if e.unique_guid.is_zero() {
            findings.push(EntryFinding::single(i, GptError::ZeroPartitionGuid));
        }
    }

    let mut by_guid: Vec<(usize, &GptEntry)> = used
        .iter()
        .copied()
        .filter(|(_, e)| !e.unique_guid.is_zero())
        .collect();
    by_guid.sort_by_key(|&(i, e)| (e.unique_guid, i));
    for w in by_guid.windows(2) {
        let ((a, ea), (b, eb)) = (w[0], w[1]);
        if ea.unique_guid == eb.unique_guid {
            findings.push(EntryFinding::pair(
                b,
                a,
                GptError::DuplicatePartitionGuid {
                    guid: eb.unique_guid,
                },
            ));
        }
    }

    // Overlaps: sort by start and compare each entry with every earlier span still open.
    let mut spans: Vec<(usize, u64, u64)> = used
        .iter()
        .filter(|(_, e)| e.starting_lba <= e.ending_lba)
        .map(|&(i, e)| (i, e.starting_lba, e.ending_lba))
        .collect();
    spans.sort_by_key(|&(i, start, _)| (start, i));

    let mut open: Vec<(usize, u64, u64)> = Vec::new();
    for &cur in &spans {
        let (ci, cs, ce) = cur;
        // Equal starts always land here: an open span ends at or after its own start.
        open.retain(|&(_, _, oe)| oe >= cs);
        for &(oi, os, oe) in &open {
            findings.push(EntryFinding::pair(
                ci,
                oi,
                GptError::OverlappingPartitions {
                    a_start: os,
                    a_end: oe,
                    b_start: cs,
                    b_end: ce,
                },
            ));
        }
        open.push(cur);
    }

    findings
}

/// True when any finding is an overlap.
pub fn has_overlaps(findings: &[EntryFinding]) -> bool {
    findings
        .iter()
        .any(|f| matches!(f.error, GptError::OverlappingPartitions { .. }))
}
