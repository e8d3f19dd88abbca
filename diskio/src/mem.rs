// SPDX-License-Identifier: MIT

use crate::{DEFAULT_SECTOR_SIZE, DiskIO, DiskIOError, DiskIOResult};

/// In-memory implementation of `DiskIO`.
///
/// Useful for tests and for disk images already loaded in RAM.
#[derive(Debug)]
pub struct MemDiskIO<'a> {
    buffer: &'a mut [u8],
    sector_size: u64,
}

impl<'a> MemDiskIO<'a> {
    #[inline]
    pub fn new(buffer: &'a mut [u8]) -> Self {
        Self {
            buffer,
            sector_size: DEFAULT_SECTOR_SIZE,
        }
    }

    #[inline]
    pub fn with_sector_size(buffer: &'a mut [u8], sector_size: u64) -> Self {
        Self {
            buffer,
            sector_size,
        }
    }

    #[inline]
    fn check_bounds(&self, off: u64, len: usize) -> DiskIOResult<usize> {
        let end = off
            .checked_add(len as u64)
            .ok_or(DiskIOError::OutOfBounds)?;
        if end > self.buffer.len() as u64 {
            return Err(DiskIOError::OutOfBounds);
        }
        Ok(off as usize)
    }
}

impl<'a> DiskIO for MemDiskIO<'a> {
    #[inline(always)]
    fn write_at(&mut self, offset: u64, data: &[u8]) -> DiskIOResult {
        let start = self.check_bounds(offset, data.len())?;
        self.buffer[start..start + data.len()].copy_from_slice(data);
        Ok(())
    }

    #[inline(always)]
    fn read_at(&mut self, offset: u64, buf: &mut [u8]) -> DiskIOResult {
        let start = self.check_bounds(offset, buf.len())?;
        buf.copy_from_slice(&self.buffer[start..start + buf.len()]);
        Ok(())
    }

    #[inline]
    fn flush(&mut self) -> DiskIOResult {
        Ok(())
    }

    #[inline]
    fn size_bytes(&mut self) -> DiskIOResult<u64> {
        Ok(self.buffer.len() as u64)
    }

    #[inline]
    fn sector_size(&self) -> u64 {
        self.sector_size
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::prelude::*;

    #[test]
    fn sector_range_roundtrip() {
        let mut buf = [0u8; 512 * 4];
        let mut io = MemDiskIO::new(&mut buf);

        assert_eq!(io.disk_sector_count().unwrap(), 4);
        io.write_sector_range(2, &[0x5A; 512]).unwrap();
        let back = io.read_sector_range(2, 1).unwrap();
        assert!(back.iter().all(|&b| b == 0x5A));
    }

    #[test]
    fn out_of_bounds_is_rejected() {
        let mut buf = [0u8; 512 * 4];
        let mut io = MemDiskIO::new(&mut buf);

        assert_eq!(io.read_sector_range(3, 2).unwrap_err(), DiskIOError::OutOfBounds);
        assert_eq!(io.write_at(u64::MAX, &[1]).unwrap_err(), DiskIOError::OutOfBounds);
    }

    #[test]
    fn unaligned_sector_write_is_rejected() {
        let mut buf = [0u8; 512 * 4];
        let mut io = MemDiskIO::new(&mut buf);

        assert_eq!(
            io.write_sector_range(0, &[0u8; 100]).unwrap_err(),
            DiskIOError::Unaligned {
                len: 100,
                sector_size: 512
            }
        );
    }

    #[test]
    fn primitive_helpers_are_little_endian() {
        let mut buf = [0u8; 64];
        let mut io = MemDiskIO::new(&mut buf);

        io.write_u32_at(4, 0x0001_0000).unwrap();
        assert_eq!(io.read_u32_at(4).unwrap(), 0x0001_0000);
        assert_eq!(io.read_u16_at(6).unwrap(), 1);

        assert_eq!(io.xor_u32_at(4, 0x0001_0001).unwrap(), 0x0001_0000);
        assert_eq!(io.read_u32_at(4).unwrap(), 0x0000_0001);

        io.zero_fill(4, 4).unwrap();
        assert_eq!(io.read_u64_at(0).unwrap(), 0);
    }

    #[test]
    fn custom_sector_size() {
        let mut buf = [0u8; 4096 * 3];
        let mut io = MemDiskIO::with_sector_size(&mut buf, 4096);

        assert_eq!(io.disk_sector_count().unwrap(), 3);
        io.write_sector_range(1, &[7u8; 4096]).unwrap();
        let mut byte = [0u8; 1];
        io.read_at(4096, &mut byte).unwrap();
        assert_eq!(byte[0], 7);
    }
}
