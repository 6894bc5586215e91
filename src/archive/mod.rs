//! Archive Layer: Schema-less Binary Encoding
//!
//! Prinsip desain:
//! - Tanpa tag: kedua sisi sepakat soal tipe dan urutan di luar band
//! - Bit-exact: integer little-endian, float sebagai bit pattern
//! - Length sebagai varint, payload byte-like di-copy sekaligus
//! - Buffer eksternal: Archive hanya memegang cursor

mod blob;
mod dispatch;
mod error;
mod fixed;
mod macros;
mod session;
mod varint;

pub use dispatch::{Decode, Encode, MAX_ZERO_SIZED_ELEMENTS};
pub use error::ArchiveError;
pub use fixed::FixedWidth;
pub use session::{Archive, Checkpoint};
pub use varint::{decode_varint, encode_varint, encoded_len, MAX_VARINT_LEN};

use crate::core::VecBuffer;

/// Encode satu nilai ke `Vec<u8>` baru
pub fn to_vec<T: Encode + ?Sized>(value: &T) -> Result<Vec<u8>, ArchiveError> {
    let mut buffer = VecBuffer::new();
    {
        let mut archive = Archive::new(&mut buffer);
        archive.encode(value)?;
    }
    Ok(buffer.as_slice().to_vec())
}

/// Decode tepat satu nilai dari `bytes`; sisa bytes dianggap error
pub fn from_slice<T: Decode>(bytes: &[u8]) -> Result<T, ArchiveError> {
    let mut buffer = VecBuffer::from_bytes(bytes);
    let mut archive = Archive::new(&mut buffer);

    let value = archive.decode()?;
    let remaining = archive.remaining();
    if remaining > 0 {
        return Err(ArchiveError::TrailingBytes { remaining });
    }

    Ok(value)
}
