//! Memory-Mapped File Buffer untuk archive yang persisten
//!
//! Data di-mmap langsung ke virtual memory:
//! - Zero-copy read: decode langsung dari page cache
//! - Persistence: data readable yang belum di-consume tetap ada setelah reopen
//! - Growth: file diperbesar lalu di-remap ketika region writable habis
//!
//! Layout file:
//! ┌──────────────────────────────────────────┐
//! │ Header (64 bytes): magic, version,       │
//! │                    head, tail            │
//! ├──────────────────────────────────────────┤
//! │ Data region                              │
//! └──────────────────────────────────────────┘

use std::fs::{File, OpenOptions};
use std::path::Path;

use memmap2::{MmapMut, MmapOptions};
use tracing::{debug, trace};

use super::buffer::{Buffer, BufferConfig, BufferError};

const MAGIC: u64 = 0x5652_4341_534D_5248; // "HRMSACRV" little-endian
const VERSION: u32 = 1;
const HEADER_SIZE: usize = 64;

const MAGIC_OFFSET: usize = 0;
const VERSION_OFFSET: usize = 8;
const HEAD_OFFSET: usize = 16;
const TAIL_OFFSET: usize = 24;

/// Mmap-backed buffer
pub struct MmapBuffer {
    file: File,
    mmap: MmapMut,
    head: usize,
    tail: usize,
    config: BufferConfig,
}

impl MmapBuffer {
    /// Membuat atau membuka file buffer dengan konfigurasi default
    ///
    /// # Arguments
    /// * `path` - Path ke file buffer
    /// * `capacity` - Kapasitas data region awal dalam bytes
    pub fn open<P: AsRef<Path>>(path: P, capacity: usize) -> Result<Self, BufferError> {
        Self::open_with_config(path, capacity, BufferConfig::default())
    }

    /// Membuat atau membuka file buffer dengan konfigurasi tertentu
    pub fn open_with_config<P: AsRef<Path>>(
        path: P,
        capacity: usize,
        config: BufferConfig,
    ) -> Result<Self, BufferError> {
        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .truncate(false)
            .open(path.as_ref())?;

        let existing = file.metadata()?.len() as usize;
        let total_size = existing.max(HEADER_SIZE + capacity.max(1));
        if total_size > existing {
            file.set_len(total_size as u64)?;
        }

        let mmap = Self::map(&file)?;
        let mut buffer = Self {
            file,
            mmap,
            head: 0,
            tail: 0,
            config,
        };

        if buffer.read_u64(MAGIC_OFFSET) == MAGIC
            && buffer.read_u32(VERSION_OFFSET) == VERSION
            && buffer.restore_positions()
        {
            debug!(
                path = %path.as_ref().display(),
                available = buffer.available(),
                "reopened mmap buffer"
            );
        } else {
            buffer.head = 0;
            buffer.tail = 0;
            buffer.write_u64(MAGIC_OFFSET, MAGIC);
            buffer.write_u32(VERSION_OFFSET, VERSION);
            buffer.store_positions();
            debug!(
                path = %path.as_ref().display(),
                capacity = buffer.data_capacity(),
                "initialized mmap buffer"
            );
        }

        Ok(buffer)
    }

    /// Kapasitas data region (tanpa header)
    #[inline(always)]
    pub fn data_capacity(&self) -> usize {
        self.mmap.len() - HEADER_SIZE
    }

    /// Data readable saat ini (zero-copy)
    #[inline(always)]
    pub fn as_slice(&self) -> &[u8] {
        &self.mmap[HEADER_SIZE + self.head..HEADER_SIZE + self.tail]
    }

    /// Sinkronisasi mmap ke disk
    pub fn flush(&self) -> Result<(), BufferError> {
        self.mmap.flush()?;
        Ok(())
    }

    fn map(file: &File) -> Result<MmapMut, BufferError> {
        // SAFETY: File dibuka read/write dan dimiliki buffer ini; file tidak
        // boleh di-truncate oleh proses lain selama mapping hidup.
        let mmap = unsafe { MmapOptions::new().map_mut(file)? };
        Ok(mmap)
    }

    fn restore_positions(&mut self) -> bool {
        let head = self.read_u64(HEAD_OFFSET) as usize;
        let tail = self.read_u64(TAIL_OFFSET) as usize;

        if head > tail || tail > self.data_capacity() {
            return false;
        }

        self.head = head;
        self.tail = tail;
        true
    }

    fn store_positions(&mut self) {
        self.write_u64(HEAD_OFFSET, self.head as u64);
        self.write_u64(TAIL_OFFSET, self.tail as u64);
    }

    fn read_u64(&self, offset: usize) -> u64 {
        let mut bytes = [0u8; 8];
        bytes.copy_from_slice(&self.mmap[offset..offset + 8]);
        u64::from_le_bytes(bytes)
    }

    fn read_u32(&self, offset: usize) -> u32 {
        let mut bytes = [0u8; 4];
        bytes.copy_from_slice(&self.mmap[offset..offset + 4]);
        u32::from_le_bytes(bytes)
    }

    fn write_u64(&mut self, offset: usize, value: u64) {
        self.mmap[offset..offset + 8].copy_from_slice(&value.to_le_bytes());
    }

    fn write_u32(&mut self, offset: usize, value: u32) {
        self.mmap[offset..offset + 4].copy_from_slice(&value.to_le_bytes());
    }

    /// Geser data readable dan writable ke awal data region
    fn compact(&mut self) {
        if self.head == 0 {
            return;
        }

        let end = self.mmap.len();
        self.mmap
            .copy_within(HEADER_SIZE + self.head..end, HEADER_SIZE);
        self.tail -= self.head;
        self.head = 0;
        self.store_positions();
    }

    /// Perbesar file lalu remap
    fn grow(&mut self, required: usize) -> Result<(), BufferError> {
        let new_capacity = self.config.grow_to(self.data_capacity(), required)?;

        self.mmap.flush()?;
        self.file.set_len((HEADER_SIZE + new_capacity) as u64)?;
        self.mmap = Self::map(&self.file)?;

        trace!(capacity = new_capacity, "remapped mmap buffer");
        Ok(())
    }
}

impl Buffer for MmapBuffer {
    fn reserve(&mut self, len: usize) -> Result<(), BufferError> {
        let required = self.tail.checked_add(len).ok_or(BufferError::CapacityExceeded {
            requested: usize::MAX,
            limit: self.config.max_capacity,
        })?;

        if required <= self.data_capacity() {
            return Ok(());
        }

        self.compact();

        let required = self.tail + len;
        if required <= self.data_capacity() {
            return Ok(());
        }

        self.grow(required)
    }

    #[inline(always)]
    fn writable(&mut self, offset: usize) -> &mut [u8] {
        let start = HEADER_SIZE + self.tail + offset;
        &mut self.mmap[start..]
    }

    #[inline(always)]
    fn commit(&mut self, len: usize) {
        assert!(
            self.tail + len <= self.data_capacity(),
            "commit of {} bytes exceeds reserved region",
            len
        );
        self.tail += len;
        self.store_positions();
    }

    #[inline(always)]
    fn available(&self) -> usize {
        self.tail - self.head
    }

    #[inline(always)]
    fn readable(&self, offset: usize) -> &[u8] {
        &self.mmap[HEADER_SIZE + self.head + offset..HEADER_SIZE + self.tail]
    }

    #[inline(always)]
    fn discard(&mut self, len: usize) {
        self.head += len.min(self.tail - self.head);
        self.store_positions();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mmap_buffer_basic() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("basic.dat");

        let mut buffer = MmapBuffer::open(&path, 4096).unwrap();

        buffer.reserve(14).unwrap();
        buffer.writable(0)[..14].copy_from_slice(b"Hello, Hermes!");
        buffer.commit(14);

        assert_eq!(buffer.readable(0), b"Hello, Hermes!");
        buffer.discard(7);
        assert_eq!(buffer.as_slice(), b"Hermes!");
    }

    #[test]
    fn test_mmap_persistence() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("persistence.dat");

        // Write data
        {
            let mut buffer = MmapBuffer::open(&path, 4096).unwrap();
            buffer.reserve(20).unwrap();
            buffer.writable(0)[..20].copy_from_slice(b"xxxxxPersistent data");
            buffer.commit(20);
            buffer.discard(5);
            buffer.flush().unwrap();
        }

        // Reopen and verify
        {
            let buffer = MmapBuffer::open(&path, 4096).unwrap();
            assert_eq!(buffer.available(), 15);
            assert_eq!(buffer.as_slice(), b"Persistent data");
        }
    }

    #[test]
    fn test_mmap_grows_and_remaps() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("grow.dat");

        let mut buffer = MmapBuffer::open_with_config(
            &path,
            16,
            BufferConfig {
                initial_capacity: 16,
                max_capacity: 1024,
            },
        )
        .unwrap();

        let payload: Vec<u8> = (0..100u8).collect();
        buffer.reserve(payload.len()).unwrap();
        buffer.writable(0)[..payload.len()].copy_from_slice(&payload);
        buffer.commit(payload.len());

        assert!(buffer.data_capacity() >= 100);
        assert_eq!(buffer.as_slice(), payload.as_slice());
    }

    #[test]
    fn test_mmap_capacity_limit() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("limit.dat");

        let mut buffer = MmapBuffer::open_with_config(
            &path,
            16,
            BufferConfig {
                initial_capacity: 16,
                max_capacity: 32,
            },
        )
        .unwrap();

        assert!(buffer.reserve(32).is_ok());
        assert!(matches!(
            buffer.reserve(33),
            Err(BufferError::CapacityExceeded { limit: 32, .. })
        ));
    }
}
