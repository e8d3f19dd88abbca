// SPDX-License-Identifier: MIT

use core::fmt;

use diskio::errors::*;

use crate::guid::Guid;

/// Structural and data-quality problems found in a GPT.
///
/// Validation failures are carried as values inside verdicts and reports;
/// only `InconsistentMirrors` and `Unrecoverable` are meant to reach an operator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GptError {
    SignatureMismatch {
        found: [u8; 8],
    },
    RevisionMismatch {
        found: u32,
    },
    InvalidHeaderSize {
        size: u32,
    },
    HeaderChecksumMismatch {
        expected: u32,
        found: u32,
    },
    ReservedNotZero {
        offset: usize,
    },
    EntriesChecksumMismatch {
        expected: u32,
        found: u32,
    },
    LbaOutOfRange {
        what: &'static str,
        lba: u64,
    },
    MalformedEntryArray(&'static str),
    DuplicatePartitionGuid {
        guid: Guid,
    },
    ZeroPartitionGuid,
    OverlappingPartitions {
        a_start: u64,
        a_end: u64,
        b_start: u64,
        b_end: u64,
    },
    InconsistentMirrors {
        field: &'static str,
    },
    Unrecoverable,
}

impl GptError {
    pub fn msg(&self) -> &'static str {
        match self {
            GptError::SignatureMismatch { .. } => "GPT: invalid signature",
            GptError::RevisionMismatch { .. } => "GPT: unsupported revision",
            GptError::InvalidHeaderSize { .. } => "GPT: header size out of range",
            GptError::HeaderChecksumMismatch { .. } => "GPT: header CRC mismatch",
            GptError::ReservedNotZero { .. } => "GPT: reserved header bytes are not zero",
            GptError::EntriesChecksumMismatch { .. } => "GPT: entries CRC mismatch",
            GptError::LbaOutOfRange { .. } => "GPT: LBA out of range",
            GptError::MalformedEntryArray(msg) => msg,
            GptError::DuplicatePartitionGuid { .. } => "GPT: duplicate partition GUID",
            GptError::ZeroPartitionGuid => "GPT: used partition has a zero unique GUID",
            GptError::OverlappingPartitions { .. } => "GPT: partition overlap detected",
            GptError::InconsistentMirrors { .. } => "GPT: primary and secondary disagree",
            GptError::Unrecoverable => "GPT: no valid copy, unrecoverable",
        }
    }
}

impl fmt::Display for GptError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.msg())?;
        match self {
            GptError::SignatureMismatch { found } => write!(f, " (found {found:02X?})"),
            GptError::RevisionMismatch { found } => write!(f, " (found {found:#010X})"),
            GptError::InvalidHeaderSize { size } => write!(f, " ({size} bytes)"),
            GptError::HeaderChecksumMismatch { expected, found }
            | GptError::EntriesChecksumMismatch { expected, found } => {
                write!(f, " (stored {expected:#010X}, computed {found:#010X})")
            }
            GptError::ReservedNotZero { offset } => write!(f, " (offset {offset})"),
            GptError::LbaOutOfRange { what, lba } => write!(f, " ({what} = {lba})"),
            GptError::DuplicatePartitionGuid { guid } => write!(f, " ({guid})"),
            GptError::OverlappingPartitions {
                a_start,
                a_end,
                b_start,
                b_end,
            } => write!(f, " ([{a_start}..={a_end}] vs [{b_start}..={b_end}])"),
            GptError::InconsistentMirrors { field } => write!(f, " ({field})"),
            _ => Ok(()),
        }
    }
}

/// Unified error type for the disk-facing GPT operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PartError {
    IO(DiskIOError),
    Gpt(GptError),
    Invalid(&'static str),
    Other(&'static str),
}

impl PartError {
    pub fn msg(&self) -> &'static str {
        match self {
            PartError::IO(e) => e.msg(),
            PartError::Gpt(e) => e.msg(),
            PartError::Invalid(msg) => msg,
            PartError::Other(msg) => msg,
        }
    }
}

impl From<&'static str> for PartError {
    fn from(s: &'static str) -> Self {
        PartError::Other(s)
    }
}

impl From<DiskIOError> for PartError {
    fn from(e: DiskIOError) -> Self {
        PartError::IO(e)
    }
}

impl From<GptError> for PartError {
    fn from(e: GptError) -> Self {
        PartError::Gpt(e)
    }
}

impl fmt::Display for PartError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PartError::Gpt(e) => write!(f, "{e}"),
            PartError::IO(e) => write!(f, "IO: {e}"),
            _ => write!(f, "{}", self.msg()),
        }
    }
}

#[cfg(feature = "std")]
impl std::error::Error for GptError {}

#[cfg(feature = "std")]
impl std::error::Error for PartError {}

pub type PartResult<T = ()> = Result<T, PartError>;
pub type GptResult<T = ()> = Result<T, GptError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_carries_details() {
        let e = PartError::from(GptError::LbaOutOfRange {
            what: "ending_lba",
            lba: 967,
        });
        let s = alloc::format!("{e}");
        assert!(s.contains("LBA out of range"));
        assert!(s.contains("ending_lba = 967"));
    }

    #[test]
    fn io_errors_convert() {
        let e: PartError = DiskIOError::OutOfBounds.into();
        assert_eq!(e.msg(), "access past end of device");
    }
}
