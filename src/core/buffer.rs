//! Buffer Contract: kontrak byte store yang dipakai Archive
//!
//! Layout logis setiap buffer:
//! ┌──────────────────────┬───────────────────────────┐
//! │ Readable (available) │ Writable (reserved)       │
//! └──────────────────────┴───────────────────────────┘
//!
//! Archive tidak pernah menyimpan byte sendiri. Semua offset relatif
//! terhadap awal area masing-masing, jadi buffer bebas memindahkan
//! (compact/remap) datanya tanpa membuat cursor Archive basi.

use std::io;

use thiserror::Error;

/// Kapasitas awal default (4KB)
pub const DEFAULT_INITIAL_CAPACITY: usize = 4 * 1024;
/// Batas kapasitas default (256MB)
pub const DEFAULT_MAX_CAPACITY: usize = 256 * 1024 * 1024;

/// Error level buffer - diteruskan apa adanya oleh Archive
#[derive(Debug, Error)]
pub enum BufferError {
    #[error("buffer capacity exceeded: requested {requested} bytes, limit {limit} bytes")]
    CapacityExceeded { requested: usize, limit: usize },

    #[error("buffer I/O failed: {0}")]
    Io(#[from] io::Error),
}

/// Konfigurasi kapasitas buffer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BufferConfig {
    /// Kapasitas yang dialokasikan saat buffer pertama kali tumbuh
    pub initial_capacity: usize,
    /// Batas atas total kapasitas (readable + writable)
    pub max_capacity: usize,
}

impl Default for BufferConfig {
    fn default() -> Self {
        Self {
            initial_capacity: DEFAULT_INITIAL_CAPACITY,
            max_capacity: DEFAULT_MAX_CAPACITY,
        }
    }
}

impl BufferConfig {
    /// Hitung kapasitas baru: doubling, minimal `required`, maksimal `max_capacity`
    pub(crate) fn grow_to(&self, current: usize, required: usize) -> Result<usize, BufferError> {
        if required > self.max_capacity {
            return Err(BufferError::CapacityExceeded {
                requested: required,
                limit: self.max_capacity,
            });
        }

        let doubled = current.saturating_mul(2).max(self.initial_capacity);
        Ok(doubled.max(required).min(self.max_capacity))
    }
}

/// Byte store eksternal yang dikendalikan oleh satu Archive pada satu waktu.
///
/// Buffer sendiri yang mengatur alokasi, growth, dan retensi.
pub trait Buffer {
    /// Pastikan area writable punya minimal `len` bytes dari awalnya.
    fn reserve(&mut self, len: usize) -> Result<(), BufferError>;

    /// Area writable mulai dari `offset`, sampai akhir region yang sudah di-reserve.
    ///
    /// # Panics
    /// Panic jika `offset` melewati region yang di-reserve.
    fn writable(&mut self, offset: usize) -> &mut [u8];

    /// Pindahkan `len` bytes pertama dari area writable ke akhir area readable.
    ///
    /// # Panics
    /// Panic jika `len` melebihi region yang di-reserve.
    fn commit(&mut self, len: usize);

    /// Jumlah bytes yang bisa dibaca saat ini.
    fn available(&self) -> usize;

    /// Area readable mulai dari `offset`.
    ///
    /// # Panics
    /// Panic jika `offset > available()`.
    fn readable(&self, offset: usize) -> &[u8];

    /// Buang `len` bytes pertama dari area readable.
    fn discard(&mut self, len: usize);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_grow_doubles_from_initial() {
        let config = BufferConfig {
            initial_capacity: 16,
            max_capacity: 1024,
        };

        assert_eq!(config.grow_to(0, 1).unwrap(), 16);
        assert_eq!(config.grow_to(16, 17).unwrap(), 32);
        assert_eq!(config.grow_to(32, 100).unwrap(), 100);
    }

    #[test]
    fn test_grow_clamps_to_limit() {
        let config = BufferConfig {
            initial_capacity: 16,
            max_capacity: 48,
        };

        assert_eq!(config.grow_to(32, 40).unwrap(), 48);

        let err = config.grow_to(48, 49).unwrap_err();
        assert!(matches!(
            err,
            BufferError::CapacityExceeded {
                requested: 49,
                limit: 48
            }
        ));
    }
}
