//! Heap-backed Buffer
//!
//! Satu `Vec<u8>` dibagi dua region:
//! - `[head, tail)` : data readable
//! - `[tail, len)`  : region writable yang sudah di-reserve
//!
//! Sebelum tumbuh, ruang yang sudah di-consume di depan (`head`) di-compact
//! dulu supaya buffer streaming tidak membengkak tanpa batas.

use tracing::trace;

use super::buffer::{Buffer, BufferConfig, BufferError};

/// Growable in-memory buffer
#[derive(Debug, Default)]
pub struct VecBuffer {
    data: Vec<u8>,
    head: usize,
    tail: usize,
    config: BufferConfig,
}

impl VecBuffer {
    /// Membuat buffer kosong dengan konfigurasi default
    pub fn new() -> Self {
        Self::default()
    }

    /// Membuat buffer kosong dengan konfigurasi tertentu
    pub fn with_config(config: BufferConfig) -> Self {
        Self {
            data: Vec::new(),
            head: 0,
            tail: 0,
            config,
        }
    }

    /// Membuat buffer yang langsung berisi `bytes` sebagai data readable
    pub fn from_bytes(bytes: &[u8]) -> Self {
        Self {
            data: bytes.to_vec(),
            head: 0,
            tail: bytes.len(),
            config: BufferConfig::default(),
        }
    }

    /// Data readable saat ini (zero-copy)
    #[inline(always)]
    pub fn as_slice(&self) -> &[u8] {
        &self.data[self.head..self.tail]
    }

    /// Jumlah bytes readable
    #[inline(always)]
    pub fn len(&self) -> usize {
        self.tail - self.head
    }

    /// Cek apakah tidak ada data readable
    #[inline(always)]
    pub fn is_empty(&self) -> bool {
        self.head == self.tail
    }

    /// Total kapasitas yang sudah dialokasikan
    #[inline(always)]
    pub fn capacity(&self) -> usize {
        self.data.len()
    }

    /// Konfigurasi buffer
    pub fn config(&self) -> &BufferConfig {
        &self.config
    }

    /// Append bytes langsung ke area readable (reserve + copy + commit)
    pub fn extend_from_slice(&mut self, bytes: &[u8]) -> Result<(), BufferError> {
        self.reserve(bytes.len())?;
        self.writable(0)[..bytes.len()].copy_from_slice(bytes);
        self.commit(bytes.len());
        Ok(())
    }

    /// Buang semua data, kapasitas tetap dipertahankan
    pub fn clear(&mut self) {
        self.head = 0;
        self.tail = 0;
    }

    /// Geser data readable (dan bytes writable yang belum di-commit) ke awal Vec
    fn compact(&mut self) {
        if self.head == 0 {
            return;
        }

        self.data.copy_within(self.head.., 0);
        self.tail -= self.head;
        self.head = 0;
    }
}

impl Buffer for VecBuffer {
    fn reserve(&mut self, len: usize) -> Result<(), BufferError> {
        let required = self.tail.checked_add(len).ok_or(BufferError::CapacityExceeded {
            requested: usize::MAX,
            limit: self.config.max_capacity,
        })?;

        if required <= self.data.len() {
            return Ok(());
        }

        self.compact();

        let required = self.tail + len;
        if required <= self.data.len() {
            return Ok(());
        }

        let new_capacity = self.config.grow_to(self.data.len(), required)?;
        trace!(
            from = self.data.len(),
            to = new_capacity,
            "growing vec buffer"
        );
        self.data.resize(new_capacity, 0);

        Ok(())
    }

    #[inline(always)]
    fn writable(&mut self, offset: usize) -> &mut [u8] {
        &mut self.data[self.tail + offset..]
    }

    #[inline(always)]
    fn commit(&mut self, len: usize) {
        assert!(
            self.tail + len <= self.data.len(),
            "commit of {} bytes exceeds reserved region",
            len
        );
        self.tail += len;
    }

    #[inline(always)]
    fn available(&self) -> usize {
        self.tail - self.head
    }

    #[inline(always)]
    fn readable(&self, offset: usize) -> &[u8] {
        &self.data[self.head + offset..self.tail]
    }

    #[inline(always)]
    fn discard(&mut self, len: usize) {
        // Posisi tidak di-reset walau kosong: bytes writable yang belum
        // di-commit bisa masih ada di belakang tail. Ruangnya direklamasi
        // oleh compact saat reserve berikutnya.
        self.head += len.min(self.tail - self.head);
    }
}
