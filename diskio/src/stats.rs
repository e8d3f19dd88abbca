// SPDX-License-Identifier: MIT

use crate::{DiskIO, DiskIOResult};

/// Simple counters, no_std friendly.
#[derive(Clone, Copy, Default, Debug, PartialEq, Eq)]
pub struct IoStats {
    pub reads: u64,
    pub read_bytes: u64,
    pub writes: u64,
    pub write_bytes: u64,
    pub flushes: u64,

    // Sector alignment of each request
    pub aligned_reads: u64,
    pub unaligned_reads: u64,
    pub aligned_writes: u64,
    pub unaligned_writes: u64,
}

impl IoStats {
    #[inline] pub fn reset(&mut self) { *self = IoStats::default(); }

    /// True when nothing was written or flushed.
    #[inline] pub fn is_read_only(&self) -> bool { self.writes == 0 && self.flushes == 0 }
}

/// Transparent instrumentation wrapper.
///
/// Alignment is measured against the wrapped device's sector size.
pub struct IOCounter<'a, IO: DiskIO + ?Sized> {
    inner: &'a mut IO,
    pub stats: IoStats,
}

impl<'a, IO: DiskIO + ?Sized> IOCounter<'a, IO> {
    #[inline]
    pub fn new(inner: &'a mut IO) -> Self {
        Self { inner, stats: IoStats::default() }
    }

    #[inline] pub fn snapshot(&self) -> IoStats { self.stats }
    #[inline] pub fn into_inner(self) -> &'a mut IO { self.inner }

    #[inline]
    fn is_aligned(&self, offset: u64, len: usize) -> bool {
        let ss = self.inner.sector_size().max(1);
        offset % ss == 0 && len as u64 % ss == 0
    }
}

impl<'a, IO: DiskIO + ?Sized> DiskIO for IOCounter<'a, IO> {
    #[inline]
    fn write_at(&mut self, offset: u64, data: &[u8]) -> DiskIOResult {
        if self.is_aligned(offset, data.len()) { self.stats.aligned_writes += 1; } else { self.stats.unaligned_writes += 1; }

        self.stats.writes += 1;
        self.stats.write_bytes += data.len() as u64;

        self.inner.write_at(offset, data)
    }

    #[inline]
    fn read_at(&mut self, offset: u64, buf: &mut [u8]) -> DiskIOResult {
        if self.is_aligned(offset, buf.len()) { self.stats.aligned_reads += 1; } else { self.stats.unaligned_reads += 1; }

        self.stats.reads += 1;
        self.stats.read_bytes += buf.len() as u64;

        self.inner.read_at(offset, buf)
    }

    #[inline]
    fn flush(&mut self) -> DiskIOResult {
        self.stats.flushes += 1;
        self.inner.flush()
    }

    #[inline] fn size_bytes(&mut self) -> DiskIOResult<u64> { self.inner.size_bytes() }
    #[inline] fn sector_size(&self) -> u64 { self.inner.sector_size() }
}

#[cfg(all(test, feature = "mem"))]
mod tests {
    use super::*;
    use crate::prelude::*;

    #[test]
    fn counts_sector_traffic() {
        let mut buf = [0u8; 512 * 8];
        let mut mem = MemDiskIO::new(&mut buf);
        let mut io = IOCounter::new(&mut mem);

        let sectors = io.read_sector_range(1, 2).unwrap();
        assert_eq!(sectors.len(), 1024);
        assert!(io.snapshot().is_read_only());

        io.write_sector_range(3, &[0xAA; 512]).unwrap();
        io.write_at(7, &[1, 2, 3]).unwrap();
        io.flush().unwrap();

        let s = io.snapshot();
        assert_eq!(s.reads, 1);
        assert_eq!(s.aligned_reads, 1);
        assert_eq!(s.writes, 2);
        assert_eq!(s.aligned_writes, 1);
        assert_eq!(s.unaligned_writes, 1);
        assert_eq!(s.write_bytes, 515);
        assert_eq!(s.flushes, 1);
        assert!(!s.is_read_only());
    }
}
