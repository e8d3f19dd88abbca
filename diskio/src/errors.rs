// SPDX-License-Identifier: MIT

use core::fmt;

/// Result type for DiskIO operations.
pub type DiskIOResult<T = ()> = core::result::Result<T, DiskIOError>;

/// Error type for DiskIO operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DiskIOError {
    Other(&'static str),
    /// Access past the end of the device.
    OutOfBounds,
    /// A sector-addressed write whose length is not whole sectors.
    Unaligned { len: usize, sector_size: u64 },
    /// Sector size of zero, or a range that does not fit in memory.
    Unsupported,
}

impl DiskIOError {
    pub fn msg(&self) -> &'static str {
        match self {
            DiskIOError::Other(msg) => msg,
            DiskIOError::OutOfBounds => "access past end of device",
            DiskIOError::Unaligned { .. } => "length is not a whole number of sectors",
            DiskIOError::Unsupported => "unsupported sector geometry",
        }
    }
}

impl From<&'static str> for DiskIOError {
    #[inline]
    fn from(msg: &'static str) -> Self {
        DiskIOError::Other(msg)
    }
}

impl fmt::Display for DiskIOError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.msg())?;
        if let DiskIOError::Unaligned { len, sector_size } = self {
            write!(f, " ({len} bytes, sector {sector_size})")?;
        }
        Ok(())
    }
}

#[cfg(feature = "std")]
impl std::error::Error for DiskIOError {}

#[cfg(all(test, feature = "std"))]
mod tests {
    use super::*;

    #[test]
    fn display_carries_geometry() {
        let e = DiskIOError::Unaligned {
            len: 100,
            sector_size: 512,
        };
        assert_eq!(
            e.to_string(),
            "length is not a whole number of sectors (100 bytes, sector 512)"
        );
        assert_eq!(DiskIOError::OutOfBounds.to_string(), "access past end of device");
    }

    #[test]
    fn boxes_as_std_error() {
        let e: Box<dyn std::error::Error> = Box::new(DiskIOError::from("device gone"));
        assert_eq!(e.to_string(), "device gone");
    }
}
