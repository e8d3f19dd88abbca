// SPDX-License-Identifier: MIT
#![cfg_attr(not(feature = "std"), no_std)]

#[cfg(feature = "alloc")]
extern crate alloc;

#[cfg(feature = "alloc")]
use alloc::{vec, vec::Vec};

// Core modules
pub mod errors;
mod macros;
pub mod stats;

// Backend modules
#[cfg(feature = "mem")]
mod mem;

#[cfg(feature = "std")]
mod std;

// Prelude re-exports (central entrypoint)
pub mod prelude {
    pub use super::DiskIO;
    pub use super::DiskIOExt;
    pub use super::SectorIOExt;
    pub use super::errors::*;
    pub use super::stats::*;

    #[cfg(feature = "mem")]
    pub use super::mem::MemDiskIO;

    #[cfg(feature = "std")]
    pub use super::std::StdDiskIO;
}

// Internal use
use errors::*;

// Constants

/// Logical sector size assumed when a backend does not say otherwise.
pub const DEFAULT_SECTOR_SIZE: u64 = 512;

/// Size of the stack scratch buffer used by zero fills.
pub const BLOCK_BUF_SIZE: usize = 4096;

// Traits

/// Disk IO abstraction trait.
///
/// Byte-addressed read/write/flush over a device of known length.
/// Implementations may target RAM, image files or real block devices.
pub trait DiskIO {
    /// Writes `data` at `offset` (absolute).
    fn write_at(&mut self, offset: u64, data: &[u8]) -> DiskIOResult;

    /// Reads `buf.len()` bytes into `buf` from `offset` (absolute).
    fn read_at(&mut self, offset: u64, buf: &mut [u8]) -> DiskIOResult;

    /// Flushes any buffered data (may be a no-op).
    fn flush(&mut self) -> DiskIOResult;

    /// Total addressable length of the device in bytes.
    fn size_bytes(&mut self) -> DiskIOResult<u64>;

    /// Logical sector size in bytes.
    fn sector_size(&self) -> u64 {
        DEFAULT_SECTOR_SIZE
    }
}

/// Extension helpers for DiskIO.
pub trait DiskIOExt: DiskIO {
    /// Fills a region with zeroes.
    #[inline(always)]
    fn zero_fill(&mut self, offset: u64, len: usize) -> DiskIOResult {
        const ZERO_BUF: [u8; BLOCK_BUF_SIZE] = [0u8; BLOCK_BUF_SIZE];
        let mut remaining = len;
        let mut off = offset;
        while remaining > 0 {
            let chunk = remaining.min(ZERO_BUF.len());
            self.write_at(off, &ZERO_BUF[..chunk])?;
            off += chunk as u64;
            remaining -= chunk;
        }
        Ok(())
    }

    // Implements read/write helpers for primitive types (u16, u32, u64)
    diskio_impl_primitive_rw!(u16, u32, u64);
}

impl<T: DiskIO + ?Sized> DiskIOExt for T {}

/// Offset = LBA * sector_size (with overflow-check)
#[inline]
fn lba_offset(lba: u64, sector_size: u64) -> DiskIOResult<u64> {
    lba.checked_mul(sector_size)
        .ok_or(DiskIOError::Other("lba_offset overflow"))
}

/// Sector-addressed access, the only surface the GPT core talks to.
pub trait SectorIOExt: DiskIO {
    /// Number of whole sectors on the device.
    #[inline]
    fn disk_sector_count(&mut self) -> DiskIOResult<u64> {
        let ss = self.sector_size();
        if ss == 0 {
            return Err(DiskIOError::Unsupported);
        }
        Ok(self.size_bytes()? / ss)
    }

    /// Reads `buf.len()` bytes starting at `lba`.
    #[inline]
    fn read_sectors_into(&mut self, lba: u64, buf: &mut [u8]) -> DiskIOResult {
        let off = lba_offset(lba, self.sector_size())?;
        self.read_at(off, buf)
    }

    /// Reads `count` whole sectors starting at `lba`.
    #[cfg(feature = "alloc")]
    fn read_sector_range(&mut self, lba: u64, count: u64) -> DiskIOResult<Vec<u8>> {
        let len = count
            .checked_mul(self.sector_size())
            .ok_or(DiskIOError::Other("sector range overflow"))?;
        let len = usize::try_from(len).map_err(|_| DiskIOError::Unsupported)?;
        let mut buf = vec![0u8; len];
        self.read_sectors_into(lba, &mut buf)?;
        Ok(buf)
    }

    /// Writes whole sectors starting at `lba`. `data` must be sector-aligned in length.
    fn write_sector_range(&mut self, lba: u64, data: &[u8]) -> DiskIOResult {
        let ss = self.sector_size();
        if ss == 0 {
            return Err(DiskIOError::Unsupported);
        }
        if (data.len() as u64) % ss != 0 {
            return Err(DiskIOError::Unaligned {
                len: data.len(),
                sector_size: ss,
            });
        }
        let off = lba_offset(lba, ss)?;
        self.write_at(off, data)
    }
}

impl<T: DiskIO + ?Sized> SectorIOExt for T {}
