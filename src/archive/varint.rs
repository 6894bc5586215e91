//! Variable-Length Integer Codec (LEB128-style)
//!
//! Dipakai hanya untuk length string/sequence.
//!
//! Format:
//! - Nilai dipecah per 7 bit, chunk paling tidak signifikan duluan
//! - Bit tertinggi = 1 berarti masih ada byte berikutnya
//! - Byte terakhir punya bit tertinggi = 0
//!
//! Contoh: `127 -> 7F`, `128 -> 80 01`, `300 -> AC 02`

use super::error::ArchiveError;
use super::session::Archive;
use crate::core::Buffer;

/// Panjang maksimum varint untuk nilai 64 bit
pub const MAX_VARINT_LEN: usize = 10;

const CONTINUATION: u8 = 0x80;
const PAYLOAD_MASK: u8 = 0x7F;

/// Jumlah bytes yang dibutuhkan untuk meng-encode `value`
#[inline(always)]
pub fn encoded_len(value: u64) -> usize {
    let bits = 64 - (value | 1).leading_zeros() as usize;
    bits.div_ceil(7)
}

/// Encode `value` ke `out`, mengembalikan jumlah bytes yang terpakai
#[inline(always)]
pub fn encode_varint(mut value: u64, out: &mut [u8; MAX_VARINT_LEN]) -> usize {
    let mut len = 0;

    while value >= u64::from(CONTINUATION) {
        out[len] = (value as u8 & PAYLOAD_MASK) | CONTINUATION;
        value >>= 7;
        len += 1;
    }

    out[len] = value as u8;
    len + 1
}

/// Decode varint dari awal `bytes`.
///
/// Returns `(value, consumed)`. Encoding non-minimal (misal `80 00`) diterima.
#[inline(always)]
pub fn decode_varint(bytes: &[u8]) -> Result<(u64, usize), ArchiveError> {
    let mut value = 0u64;

    for (index, &byte) in bytes.iter().take(MAX_VARINT_LEN).enumerate() {
        // Byte ke-10 hanya boleh membawa 1 bit payload dan harus terminator
        if index == MAX_VARINT_LEN - 1 && byte > 1 {
            return Err(ArchiveError::VarintOverflow);
        }

        value |= u64::from(byte & PAYLOAD_MASK) << (7 * index);

        if byte & CONTINUATION == 0 {
            return Ok((value, index + 1));
        }
    }

    Err(ArchiveError::EndOfStream {
        needed: bytes.len() + 1,
        available: bytes.len(),
    })
}

impl<B: Buffer + ?Sized> Archive<'_, B> {
    /// Tulis varint di write cursor
    #[track_caller]
    pub fn write_varint(&mut self, value: u64) -> Result<(), ArchiveError> {
        let mut bytes = [0u8; MAX_VARINT_LEN];
        let len = encode_varint(value, &mut bytes);
        self.write_blob(&bytes[..len])
    }

    /// Baca varint dari read cursor.
    ///
    /// Atomic: jika terminator belum tersedia, End-of-Stream dan read cursor
    /// tidak bergerak.
    #[track_caller]
    pub fn read_varint(&mut self) -> Result<u64, ArchiveError> {
        let offset = self.read_offset();
        let (value, len) = decode_varint(self.bound_buffer().readable(offset))?;

        self.advance_read(len);
        Ok(value)
    }

    /// Tulis length string/sequence
    #[track_caller]
    pub(crate) fn write_length(&mut self, len: usize) -> Result<(), ArchiveError> {
        self.write_varint(len as u64)
    }

    /// Baca length string/sequence
    #[track_caller]
    pub(crate) fn read_length(&mut self) -> Result<usize, ArchiveError> {
        let value = self.read_varint()?;
        usize::try_from(value).map_err(|_| ArchiveError::LengthOverflow { value })
    }
}
