// SPDX-License-Identifier: MIT

use std::io::{Error, Read, Seek, SeekFrom, Write};

use crate::{DEFAULT_SECTOR_SIZE, DiskIO, DiskIOError, DiskIOResult};

/// `DiskIO` over anything seekable: image files, block device nodes, cursors.
#[derive(Debug)]
pub struct StdDiskIO<'a, T: Read + Write + Seek> {
    io: &'a mut T,
    sector_size: u64,
}

impl<'a, T: Read + Write + Seek> StdDiskIO<'a, T> {
    #[inline]
    pub fn new(io: &'a mut T) -> Self {
        Self {
            io,
            sector_size: DEFAULT_SECTOR_SIZE,
        }
    }

    #[inline]
    pub fn with_sector_size(io: &'a mut T, sector_size: u64) -> Self {
        Self { io, sector_size }
    }
}

impl<'a, T: Read + Write + Seek> DiskIO for StdDiskIO<'a, T> {
    fn write_at(&mut self, offset: u64, data: &[u8]) -> DiskIOResult {
        self.io.seek(SeekFrom::Start(offset))?;
        self.io.write_all(data)?;
        Ok(())
    }

    fn read_at(&mut self, offset: u64, buf: &mut [u8]) -> DiskIOResult {
        self.io.seek(SeekFrom::Start(offset))?;
        self.io.read_exact(buf)?;
        Ok(())
    }

    fn flush(&mut self) -> DiskIOResult {
        self.io.flush()?;
        Ok(())
    }

    fn size_bytes(&mut self) -> DiskIOResult<u64> {
        let len = self.io.seek(SeekFrom::End(0))?;
        Ok(len)
    }

    #[inline]
    fn sector_size(&self) -> u64 {
        self.sector_size
    }
}

impl From<Error> for DiskIOError {
    #[cold]
    #[inline(never)]
    fn from(e: Error) -> Self {
        if e.kind() == std::io::ErrorKind::UnexpectedEof {
            return DiskIOError::OutOfBounds;
        }
        // Leaked to get a 'static message.
        let leaked_str: &'static str = Box::leak(e.to_string().into_boxed_str());
        DiskIOError::Other(leaked_str)
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::prelude::*;
    use tempfile::tempfile;

    #[test]
    fn test_rw() {
        let mut file = tempfile().unwrap();
        let mut io = StdDiskIO::new(&mut file);
        io.write_at(10, &[1, 2, 3, 4]).unwrap();

        let mut output = [0u8; 4];
        io.read_at(10, &mut output).unwrap();
        assert_eq!(output, [1, 2, 3, 4]);
    }

    #[test]
    fn test_sector_count_follows_file_length() {
        let mut file = tempfile().unwrap();
        file.set_len(512 * 10 + 100).unwrap();
        let mut io = StdDiskIO::new(&mut file);

        assert_eq!(io.size_bytes().unwrap(), 5220);
        assert_eq!(io.disk_sector_count().unwrap(), 10);
    }

    #[test]
    fn test_sector_range_rw() {
        let mut file = tempfile().unwrap();
        file.set_len(512 * 4).unwrap();
        let mut io = StdDiskIO::new(&mut file);

        io.write_sector_range(1, &[0xC3; 1024]).unwrap();
        let back = io.read_sector_range(1, 2).unwrap();
        assert_eq!(back, vec![0xC3; 1024]);
    }

    #[test]
    fn test_read_past_end_fails() {
        let mut file = tempfile().unwrap();
        file.set_len(512).unwrap();
        let mut io = StdDiskIO::new(&mut file);

        assert_eq!(io.read_sector_range(1, 1).unwrap_err(), DiskIOError::OutOfBounds);
    }
}
