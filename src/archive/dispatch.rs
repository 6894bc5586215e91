//! Type-Dispatch Layer
//!
//! Setiap kategori tipe punya impl `Encode`/`Decode` sendiri, dipilih saat
//! compile time:
//!
//! | Tipe                    | Wire                                    |
//! |-------------------------|-----------------------------------------|
//! | `bool`                  | 1 byte `00`/`01`                        |
//! | `u8..u128`, `i8..i128`  | W/8 bytes little-endian                 |
//! | `usize` / `isize`       | sebagai `u64` / `i64`                   |
//! | `f32` / `f64`           | bit pattern IEEE-754 sebagai `u32/u64`  |
//! | `str` / `String`        | varint length + bytes UTF-8             |
//! | `[T; N]`                | N elemen, tanpa prefix                  |
//! | `[T]` / `Vec<T>`        | varint length + elemen                  |
//! | tuple / composite       | member berurutan                        |
//!
//! Elemen byte-like (`u8`, `i8`) meng-override hook slice/vec/array dengan
//! satu bulk copy, sehingga `Vec<u8>` dan `[u8; N]` tidak lewat dispatch
//! per elemen.

use std::mem::size_of;

use super::error::ArchiveError;
use super::session::Archive;
use crate::core::Buffer;

/// Tipe yang bisa di-encode ke Archive
pub trait Encode {
    fn encode<B: Buffer + ?Sized>(&self, archive: &mut Archive<'_, B>) -> Result<(), ArchiveError>;

    /// Encode elemen slice secara berurutan, tanpa length prefix.
    #[inline]
    fn encode_slice<B: Buffer + ?Sized>(
        items: &[Self],
        archive: &mut Archive<'_, B>,
    ) -> Result<(), ArchiveError>
    where
        Self: Sized,
    {
        for item in items {
            item.encode(archive)?;
        }
        Ok(())
    }
}

/// Tipe yang bisa di-decode dari Archive.
///
/// Decode tidak transactional; lihat `Archive::decode_atomic`.
pub trait Decode: Sized {
    fn decode<B: Buffer + ?Sized>(archive: &mut Archive<'_, B>) -> Result<Self, ArchiveError>;

    /// Decode `len` elemen berurutan.
    ///
    /// Default ini menganggap setiap elemen yang tidak zero-sized memakan
    /// minimal satu byte, jadi `len` di atas bytes tersisa langsung
    /// End-of-Stream. Elemen zero-sized dibatasi `MAX_ZERO_SIZED_ELEMENTS`.
    #[inline]
    fn decode_vec<B: Buffer + ?Sized>(
        len: usize,
        archive: &mut Archive<'_, B>,
    ) -> Result<Vec<Self>, ArchiveError> {
        check_sequence_len::<Self, B>(len, archive)?;

        // Length dari wire tidak dipercaya untuk alokasi di muka
        let mut items = Vec::with_capacity(len.min(archive.remaining()));
        for _ in 0..len {
            items.push(Self::decode(archive)?);
        }
        Ok(items)
    }

    /// Decode tepat `N` elemen berurutan.
    #[inline]
    fn decode_array<B: Buffer + ?Sized, const N: usize>(
        archive: &mut Archive<'_, B>,
    ) -> Result<[Self; N], ArchiveError> {
        let items = Self::decode_vec(N, archive)?;
        Ok(items
            .try_into()
            .unwrap_or_else(|_: Vec<Self>| unreachable!("decode_vec returns exactly N items")))
    }
}

/// Batas elemen untuk sequence zero-sized: elemen seperti ini tidak memakan
/// byte, jadi length dari wire tidak bisa dicek terhadap bytes tersisa.
pub const MAX_ZERO_SIZED_ELEMENTS: usize = 1 << 20;

#[inline(always)]
fn check_sequence_len<T, B: Buffer + ?Sized>(
    len: usize,
    archive: &Archive<'_, B>,
) -> Result<(), ArchiveError> {
    if size_of::<T>() == 0 {
        if len > MAX_ZERO_SIZED_ELEMENTS {
            return Err(ArchiveError::SequenceTooLong {
                len,
                limit: MAX_ZERO_SIZED_ELEMENTS,
            });
        }
        return Ok(());
    }

    let available = archive.remaining();
    if len > available {
        return Err(ArchiveError::EndOfStream {
            needed: len,
            available,
        });
    }

    Ok(())
}

// ---------------------------------------------------------------------------
// Boolean
// ---------------------------------------------------------------------------

impl Encode for bool {
    #[inline(always)]
    fn encode<B: Buffer + ?Sized>(&self, archive: &mut Archive<'_, B>) -> Result<(), ArchiveError> {
        archive.write_fixed(u8::from(*self))
    }
}

impl Decode for bool {
    /// Byte non-zero apa pun dibaca sebagai `true`
    #[inline(always)]
    fn decode<B: Buffer + ?Sized>(archive: &mut Archive<'_, B>) -> Result<Self, ArchiveError> {
        Ok(archive.read_fixed::<u8>()? != 0)
    }
}

// ---------------------------------------------------------------------------
// Byte-like integers
// ---------------------------------------------------------------------------

impl Encode for u8 {
    #[inline(always)]
    fn encode<B: Buffer + ?Sized>(&self, archive: &mut Archive<'_, B>) -> Result<(), ArchiveError> {
        archive.write_fixed(*self)
    }

    #[inline(always)]
    fn encode_slice<B: Buffer + ?Sized>(
        items: &[Self],
        archive: &mut Archive<'_, B>,
    ) -> Result<(), ArchiveError> {
        archive.write_blob(items)
    }
}

impl Decode for u8 {
    #[inline(always)]
    fn decode<B: Buffer + ?Sized>(archive: &mut Archive<'_, B>) -> Result<Self, ArchiveError> {
        archive.read_fixed()
    }

    #[inline(always)]
    fn decode_vec<B: Buffer + ?Sized>(
        len: usize,
        archive: &mut Archive<'_, B>,
    ) -> Result<Vec<Self>, ArchiveError> {
        archive.read_blob(len)
    }

    #[inline(always)]
    fn decode_array<B: Buffer + ?Sized, const N: usize>(
        archive: &mut Archive<'_, B>,
    ) -> Result<[Self; N], ArchiveError> {
        let mut items = [0u8; N];
        archive.read_blob_into(&mut items)?;
        Ok(items)
    }
}

impl Encode for i8 {
    #[inline(always)]
    fn encode<B: Buffer + ?Sized>(&self, archive: &mut Archive<'_, B>) -> Result<(), ArchiveError> {
        archive.write_fixed(self.cast_unsigned())
    }

    #[inline(always)]
    fn encode_slice<B: Buffer + ?Sized>(
        items: &[Self],
        archive: &mut Archive<'_, B>,
    ) -> Result<(), ArchiveError> {
        archive.write_blob_with(items.len(), |out| {
            for (slot, item) in out.iter_mut().zip(items) {
                *slot = item.cast_unsigned();
            }
        })
    }
}

impl Decode for i8 {
    #[inline(always)]
    fn decode<B: Buffer + ?Sized>(archive: &mut Archive<'_, B>) -> Result<Self, ArchiveError> {
        Ok(archive.read_fixed::<u8>()?.cast_signed())
    }

    #[inline(always)]
    fn decode_vec<B: Buffer + ?Sized>(
        len: usize,
        archive: &mut Archive<'_, B>,
    ) -> Result<Vec<Self>, ArchiveError> {
        let bytes = archive.read_blob(len)?;
        Ok(bytes.into_iter().map(u8::cast_signed).collect())
    }

    #[inline(always)]
    fn decode_array<B: Buffer + ?Sized, const N: usize>(
        archive: &mut Archive<'_, B>,
    ) -> Result<[Self; N], ArchiveError> {
        let mut bytes = [0u8; N];
        archive.read_blob_into(&mut bytes)?;
        Ok(bytes.map(u8::cast_signed))
    }
}

// ---------------------------------------------------------------------------
// Wider integers
// ---------------------------------------------------------------------------

macro_rules! impl_unsigned {
    ($($ty:ty),* $(,)?) => {
        $(
            impl Encode for $ty {
                #[inline(always)]
                fn encode<B: Buffer + ?Sized>(
                    &self,
                    archive: &mut Archive<'_, B>,
                ) -> Result<(), ArchiveError> {
                    archive.write_fixed(*self)
                }
            }

            impl Decode for $ty {
                #[inline(always)]
                fn decode<B: Buffer + ?Sized>(
                    archive: &mut Archive<'_, B>,
                ) -> Result<Self, ArchiveError> {
                    archive.read_fixed()
                }
            }
        )*
    };
}

macro_rules! impl_signed {
    ($($ty:ty => $unsigned:ty),* $(,)?) => {
        $(
            impl Encode for $ty {
                #[inline(always)]
                fn encode<B: Buffer + ?Sized>(
                    &self,
                    archive: &mut Archive<'_, B>,
                ) -> Result<(), ArchiveError> {
                    archive.write_fixed(self.cast_unsigned())
                }
            }

            impl Decode for $ty {
                #[inline(always)]
                fn decode<B: Buffer + ?Sized>(
                    archive: &mut Archive<'_, B>,
                ) -> Result<Self, ArchiveError> {
                    Ok(archive.read_fixed::<$unsigned>()?.cast_signed())
                }
            }
        )*
    };
}

impl_unsigned!(u16, u32, u64, u128);
impl_signed!(i16 => u16, i32 => u32, i64 => u64, i128 => u128);

// usize/isize selalu 64 bit di wire agar portable antar platform
impl Encode for usize {
    #[inline(always)]
    fn encode<B: Buffer + ?Sized>(&self, archive: &mut Archive<'_, B>) -> Result<(), ArchiveError> {
        archive.write_fixed(*self as u64)
    }
}

impl Decode for usize {
    #[inline(always)]
    fn decode<B: Buffer + ?Sized>(archive: &mut Archive<'_, B>) -> Result<Self, ArchiveError> {
        let value = archive.read_fixed::<u64>()?;
        usize::try_from(value).map_err(|_| ArchiveError::LengthOverflow { value })
    }
}

impl Encode for isize {
    #[inline(always)]
    fn encode<B: Buffer + ?Sized>(&self, archive: &mut Archive<'_, B>) -> Result<(), ArchiveError> {
        archive.write_fixed((*self as i64).cast_unsigned())
    }
}

impl Decode for isize {
    #[inline(always)]
    fn decode<B: Buffer + ?Sized>(archive: &mut Archive<'_, B>) -> Result<Self, ArchiveError> {
        let value = archive.read_fixed::<u64>()?;
        isize::try_from(value.cast_signed()).map_err(|_| ArchiveError::LengthOverflow { value })
    }
}

// ---------------------------------------------------------------------------
// Floating point
// ---------------------------------------------------------------------------

impl Encode for f32 {
    #[inline(always)]
    fn encode<B: Buffer + ?Sized>(&self, archive: &mut Archive<'_, B>) -> Result<(), ArchiveError> {
        archive.write_fixed(self.to_bits())
    }
}

impl Decode for f32 {
    #[inline(always)]
    fn decode<B: Buffer + ?Sized>(archive: &mut Archive<'_, B>) -> Result<Self, ArchiveError> {
        Ok(f32::from_bits(archive.read_fixed()?))
    }
}

impl Encode for f64 {
    #[inline(always)]
    fn encode<B: Buffer + ?Sized>(&self, archive: &mut Archive<'_, B>) -> Result<(), ArchiveError> {
        archive.write_fixed(self.to_bits())
    }
}

impl Decode for f64 {
    #[inline(always)]
    fn decode<B: Buffer + ?Sized>(archive: &mut Archive<'_, B>) -> Result<Self, ArchiveError> {
        Ok(f64::from_bits(archive.read_fixed()?))
    }
}

// ---------------------------------------------------------------------------
// Strings
// ---------------------------------------------------------------------------

impl Encode for str {
    #[inline]
    fn encode<B: Buffer + ?Sized>(&self, archive: &mut Archive<'_, B>) -> Result<(), ArchiveError> {
        archive.write_length(self.len())?;
        archive.write_blob(self.as_bytes())
    }
}

impl Encode for String {
    #[inline]
    fn encode<B: Buffer + ?Sized>(&self, archive: &mut Archive<'_, B>) -> Result<(), ArchiveError> {
        self.as_str().encode(archive)
    }
}

impl Decode for String {
    #[inline]
    fn decode<B: Buffer + ?Sized>(archive: &mut Archive<'_, B>) -> Result<Self, ArchiveError> {
        let len = archive.read_length()?;
        let bytes = archive.read_blob(len)?;
        Ok(String::from_utf8(bytes)?)
    }
}

// ---------------------------------------------------------------------------
// Arrays dan sequences
// ---------------------------------------------------------------------------

impl<T: Encode, const N: usize> Encode for [T; N] {
    #[inline]
    fn encode<B: Buffer + ?Sized>(&self, archive: &mut Archive<'_, B>) -> Result<(), ArchiveError> {
        T::encode_slice(self, archive)
    }
}

impl<T: Decode, const N: usize> Decode for [T; N] {
    #[inline]
    fn decode<B: Buffer + ?Sized>(archive: &mut Archive<'_, B>) -> Result<Self, ArchiveError> {
        T::decode_array::<B, N>(archive)
    }
}

impl<T: Encode> Encode for [T] {
    #[inline]
    fn encode<B: Buffer + ?Sized>(&self, archive: &mut Archive<'_, B>) -> Result<(), ArchiveError> {
        archive.write_length(self.len())?;
        T::encode_slice(self, archive)
    }
}

impl<T: Encode> Encode for Vec<T> {
    #[inline]
    fn encode<B: Buffer + ?Sized>(&self, archive: &mut Archive<'_, B>) -> Result<(), ArchiveError> {
        self.as_slice().encode(archive)
    }
}

impl<T: Decode> Decode for Vec<T> {
    #[inline]
    fn decode<B: Buffer + ?Sized>(archive: &mut Archive<'_, B>) -> Result<Self, ArchiveError> {
        let len = archive.read_length()?;
        T::decode_vec(len, archive)
    }
}

// ---------------------------------------------------------------------------
// Pointer-like
// ---------------------------------------------------------------------------

impl<T: Encode + ?Sized> Encode for &T {
    #[inline(always)]
    fn encode<B: Buffer + ?Sized>(&self, archive: &mut Archive<'_, B>) -> Result<(), ArchiveError> {
        (**self).encode(archive)
    }
}

impl<T: Encode + ?Sized> Encode for Box<T> {
    #[inline(always)]
    fn encode<B: Buffer + ?Sized>(&self, archive: &mut Archive<'_, B>) -> Result<(), ArchiveError> {
        (**self).encode(archive)
    }
}

impl<T: Decode> Decode for Box<T> {
    #[inline(always)]
    fn decode<B: Buffer + ?Sized>(archive: &mut Archive<'_, B>) -> Result<Self, ArchiveError> {
        Ok(Box::new(T::decode(archive)?))
    }
}

// ---------------------------------------------------------------------------
// Tuples: composite posisional
// ---------------------------------------------------------------------------

macro_rules! impl_tuple {
    ($($name:ident),+) => {
        impl<$($name: Encode),+> Encode for ($($name,)+) {
            #[inline]
            #[allow(non_snake_case)]
            fn encode<Buf: Buffer + ?Sized>(
                &self,
                archive: &mut Archive<'_, Buf>,
            ) -> Result<(), ArchiveError> {
                let ($($name,)+) = self;
                $( $name.encode(archive)?; )+
                Ok(())
            }
        }

        impl<$($name: Decode),+> Decode for ($($name,)+) {
            #[inline]
            fn decode<Buf: Buffer + ?Sized>(
                archive: &mut Archive<'_, Buf>,
            ) -> Result<Self, ArchiveError> {
                Ok(($($name::decode(archive)?,)+))
            }
        }
    };
}

impl_tuple!(T0);
impl_tuple!(T0, T1);
impl_tuple!(T0, T1, T2);
impl_tuple!(T0, T1, T2, T3);
impl_tuple!(T0, T1, T2, T3, T4);
impl_tuple!(T0, T1, T2, T3, T4, T5);

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::VecBuffer;

    fn encoded<T: Encode + ?Sized>(value: &T) -> Vec<u8> {
        let mut buffer = VecBuffer::new();
        Archive::new(&mut buffer).encode(value).unwrap();
        buffer.as_slice().to_vec()
    }

    fn roundtrip<T: Encode + Decode>(value: &T) -> T {
        let mut buffer = VecBuffer::from_bytes(&encoded(value));
        let mut archive = Archive::new(&mut buffer);
        let decoded = archive.decode::<T>().unwrap();
        assert_eq!(archive.remaining(), 0);
        decoded
    }

    #[test]
    fn test_bool_layout() {
        assert_eq!(encoded(&false), [0x00]);
        assert_eq!(encoded(&true), [0x01]);

        let mut buffer = VecBuffer::from_bytes(&[0x02]);
        assert!(Archive::new(&mut buffer).decode::<bool>().unwrap());
    }

    #[test]
    fn test_signed_two_complement() {
        assert_eq!(encoded(&-1i8), [0xFF]);
        assert_eq!(encoded(&-2i16), [0xFE, 0xFF]);
        assert_eq!(encoded(&i32::MIN), [0x00, 0x00, 0x00, 0x80]);

        assert_eq!(roundtrip(&-1i8), -1);
        assert_eq!(roundtrip(&i64::MIN), i64::MIN);
        assert_eq!(roundtrip(&i128::MAX), i128::MAX);
    }

    #[test]
    fn test_usize_is_eight_bytes() {
        assert_eq!(encoded(&1usize), [1, 0, 0, 0, 0, 0, 0, 0]);
        assert_eq!(encoded(&-1isize), [0xFF; 8]);
        assert_eq!(roundtrip(&usize::MAX), usize::MAX);
        assert_eq!(roundtrip(&isize::MIN), isize::MIN);
    }

    #[test]
    fn test_float_bits_preserved() {
        assert_eq!(encoded(&1.0f32), 1.0f32.to_bits().to_le_bytes());

        let nan = f64::from_bits(0x7FF8_0000_0000_BEEF);
        assert_eq!(roundtrip(&nan).to_bits(), nan.to_bits());
        assert_eq!(roundtrip(&-0.0f64).to_bits(), (-0.0f64).to_bits());
        assert_eq!(roundtrip(&f32::NEG_INFINITY), f32::NEG_INFINITY);
    }

    #[test]
    fn test_string_layout() {
        assert_eq!(encoded("ab"), [0x02, 0x61, 0x62]);
        assert_eq!(encoded(&String::new()), [0x00]);
        assert_eq!(roundtrip(&"héllo".to_string()), "héllo");
    }

    #[test]
    fn test_invalid_utf8_rejected() {
        let mut buffer = VecBuffer::from_bytes(&[0x02, 0xC3, 0x28]);
        let err = Archive::new(&mut buffer).decode::<String>().unwrap_err();
        assert!(matches!(err, ArchiveError::InvalidUtf8(_)));
    }

    #[test]
    fn test_byte_array_has_no_prefix() {
        assert_eq!(encoded(&[1u8, 2, 3]), [1, 2, 3]);
        assert_eq!(encoded(&[-1i8, 1]), [0xFF, 0x01]);
        assert_eq!(roundtrip(&[9u8; 32]), [9u8; 32]);
        assert_eq!(roundtrip(&[-5i8, 5]), [-5i8, 5]);
    }

    #[test]
    fn test_wide_array_encodes_each_element() {
        assert_eq!(encoded(&[1u16, 2]), [1, 0, 2, 0]);
        assert_eq!(encoded(&[true, false]), [1, 0]);
        assert_eq!(roundtrip(&[[1u32, 2], [3, 4]]), [[1, 2], [3, 4]]);
    }

    #[test]
    fn test_sequence_layout() {
        assert_eq!(encoded(&vec![0xAAu8, 0xBB]), [0x02, 0xAA, 0xBB]);
        assert_eq!(encoded(&vec![1u16]), [0x01, 0x01, 0x00]);
        assert_eq!(encoded(&Vec::<u64>::new()), [0x00]);
        assert_eq!(encoded(&[7u8, 8][..]), [0x02, 7, 8]);

        assert_eq!(roundtrip(&vec![-3i8, 4]), vec![-3i8, 4]);
        assert_eq!(
            roundtrip(&vec!["a".to_string(), String::new()]),
            vec!["a".to_string(), String::new()]
        );
    }

    #[test]
    fn test_tuple_order() {
        assert_eq!(encoded(&(1u8, 2u16, true)), [1, 2, 0, 1]);
        assert_eq!(roundtrip(&(1u8, -2i32, 3.5f64)), (1u8, -2i32, 3.5f64));
    }

    #[test]
    fn test_box_transparent() {
        assert_eq!(encoded(&Box::new(5u8)), [5]);
        assert_eq!(*roundtrip(&Box::new(7u32)), 7);
    }

    #[test]
    fn test_bogus_sequence_length_is_end_of_stream() {
        // Length 2^62 tapi hanya 1 byte data
        let mut bytes = vec![0x80, 0x80, 0x80, 0x80, 0x80, 0x80, 0x80, 0x80, 0x40];
        bytes.push(0x01);
        let mut buffer = VecBuffer::from_bytes(&bytes);

        let err = Archive::new(&mut buffer).decode::<Vec<u32>>().unwrap_err();
        assert!(err.is_end_of_stream());
    }

    #[test]
    fn test_sequence_length_checked_before_elements() {
        // Length 3 untuk Vec<u16>, tapi hanya 2 byte tersedia
        let mut buffer = VecBuffer::from_bytes(&[0x03, 0x01, 0x00]);
        let err = Archive::new(&mut buffer).decode::<Vec<u16>>().unwrap_err();
        assert!(matches!(
            err,
            ArchiveError::EndOfStream {
                needed: 3,
                available: 2
            }
        ));
    }

    #[test]
    fn test_zero_sized_sequence_length_is_capped() {
        let zero_sized = vec![[0u8; 0]; 5];
        assert_eq!(encoded(&zero_sized), [0x05]);
        assert_eq!(roundtrip(&zero_sized), zero_sized);

        // Length ~2^55 dengan elemen zero-sized harus gagal cepat
        let mut buffer =
            VecBuffer::from_bytes(&[0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0x7F]);
        let err = Archive::new(&mut buffer)
            .decode::<Vec<[u8; 0]>>()
            .unwrap_err();
        assert!(matches!(
            err,
            ArchiveError::SequenceTooLong {
                limit: MAX_ZERO_SIZED_ELEMENTS,
                ..
            }
        ));
    }

    #[test]
    fn test_signed_byte_slice_bulk_copy() {
        assert_eq!(encoded(&vec![-1i8, 0, 1, i8::MIN]), [0x04, 0xFF, 0x00, 0x01, 0x80]);
        assert_eq!(encoded(&[-128i8, 127][..]), [0x02, 0x80, 0x7F]);
    }
}
