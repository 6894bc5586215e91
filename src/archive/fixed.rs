//! Fixed-Width Integer Codec
//!
//! Unsigned integer W bit ditulis sebagai W/8 bytes little-endian.
//! Signed integer tidak punya jalur sendiri: dispatch layer memetakannya ke
//! unsigned dengan lebar sama lewat `cast_unsigned` / `cast_signed`
//! (two's-complement, tanpa cast yang bergantung platform).

use std::mem::size_of;

use super::error::ArchiveError;
use super::session::Archive;
use crate::core::Buffer;

/// Unsigned integer dengan lebar tetap
pub trait FixedWidth: Copy {
    /// Lebar encoding dalam bytes
    const WIDTH: usize;

    /// Representasi bytes little-endian
    type Bytes: AsRef<[u8]> + AsMut<[u8]> + Default;

    fn into_le_bytes(self) -> Self::Bytes;

    fn from_le_bytes(bytes: Self::Bytes) -> Self;
}

macro_rules! impl_fixed_width {
    ($($ty:ty),* $(,)?) => {
        $(
            impl FixedWidth for $ty {
                const WIDTH: usize = size_of::<$ty>();

                type Bytes = [u8; size_of::<$ty>()];

                #[inline(always)]
                fn into_le_bytes(self) -> Self::Bytes {
                    self.to_le_bytes()
                }

                #[inline(always)]
                fn from_le_bytes(bytes: Self::Bytes) -> Self {
                    <$ty>::from_le_bytes(bytes)
                }
            }
        )*
    };
}

impl_fixed_width!(u8, u16, u32, u64, u128);

impl<B: Buffer + ?Sized> Archive<'_, B> {
    /// Tulis `value` sebagai `T::WIDTH` bytes little-endian di write cursor
    #[inline(always)]
    pub fn write_fixed<T: FixedWidth>(&mut self, value: T) -> Result<(), ArchiveError> {
        let bytes = value.into_le_bytes();
        self.write_blob(bytes.as_ref())
    }

    /// Baca `T::WIDTH` bytes little-endian dari read cursor.
    ///
    /// Jika bytes kurang, End-of-Stream dan read cursor tidak berubah.
    #[inline(always)]
    pub fn read_fixed<T: FixedWidth>(&mut self) -> Result<T, ArchiveError> {
        let mut bytes = T::Bytes::default();
        self.read_blob_into(bytes.as_mut())?;
        Ok(T::from_le_bytes(bytes))
    }
}
