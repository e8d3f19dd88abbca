// SPDX-License-Identifier: MIT
#![cfg_attr(not(feature = "std"), no_std)]

//! GUID Partition Table validation and dual-copy repair.
//!
//! The pure core (`header`, `entry`, `validate`, `overlap`, `reconcile`) never touches a
//! device; `disk` wires it to any [`diskio::DiskIO`] backend.

extern crate alloc;

#[macro_use]
mod macros;

pub mod crc;
pub mod errors;
pub mod guid;
/// Common partition type GUIDs.
pub mod guids;

/// Header codec.
pub mod header;
/// Entry array codec.
pub mod entry;

pub mod validate;
pub mod overlap;
pub mod reconcile;

/// Device-level read, check, sync and write.
pub mod disk;

pub use disk::{
    DiskReport, GptLayout, SyncOptions, check_disk, disk_geometry, inspect_disk, read_gpt_copy,
    sync_gpt, write_gpt,
};
pub use entry::{GptEntry, decode_entries, encode_entries};
pub use errors::{GptError, GptResult, PartError, PartResult};
pub use guid::Guid;
pub use header::{GptHeader, decode_header, encode_header};
pub use overlap::{EntryFinding, check_entries};
pub use reconcile::{GptCopy, Outcome, Reconciliation, RepairImage, Side, reconcile};
pub use validate::{Check, DEFAULT_SECTOR_SIZE, DiskGeometry, Verdict, validate, validate_header};
