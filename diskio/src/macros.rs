// SPDX-License-Identifier: MIT

/// Little-endian field access on a `DiskIO` for each listed integer type:
/// `read_<ty>_at`, `write_<ty>_at`, and `xor_<ty>_at` (read, flip bits, write back).
#[macro_export]
macro_rules! diskio_impl_primitive_rw {
    ($($ty:ty),+ $(,)?) => {
        $(
            paste::paste! {
                #[doc = concat!("Writes a little-endian `", stringify!($ty), "` at `offset`.")]
                #[inline]
                fn [<write_ $ty _at>](&mut self, offset: u64, value: $ty) -> DiskIOResult {
                    self.write_at(offset, &value.to_le_bytes())
                }

                #[doc = concat!("Reads a little-endian `", stringify!($ty), "` at `offset`.")]
                #[inline]
                fn [<read_ $ty _at>](&mut self, offset: u64) -> DiskIOResult<$ty> {
                    let mut buf = [0u8; core::mem::size_of::<$ty>()];
                    self.read_at(offset, &mut buf)?;
                    Ok(<$ty>::from_le_bytes(buf))
                }

                #[doc = concat!("Flips the bits of `mask` in the `", stringify!($ty), "` at `offset`; returns the old value.")]
                #[inline]
                fn [<xor_ $ty _at>](&mut self, offset: u64, mask: $ty) -> DiskIOResult<$ty> {
                    let old = self.[<read_ $ty _at>](offset)?;
                    self.[<write_ $ty _at>](offset, old ^ mask)?;
                    Ok(old)
                }
            }
        )+
    };
}
