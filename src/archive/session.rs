//! Archive Session: cursor write/read di atas Buffer eksternal
//!
//! State machine:
//! ```text
//! Unbound ──new()──▶ Bound ──take()──▶ Moved-From (terminal)
//! ```
//!
//! Kedua cursor adalah total monotonic sejak archive dibuat. Offset di dalam
//! buffer dihitung dari selisih cursor dengan bytes yang sudah di-commit /
//! di-discard lewat `flush()`.
//!
//! Decode composite TIDAK transactional: jika member ke-3 gagal dengan
//! End-of-Stream, member 1 dan 2 sudah memajukan read cursor. Gunakan
//! `checkpoint()`/`rewind()` atau `decode_atomic()` untuk retry yang benar
//! di atas buffer parsial.

use std::fmt;
use std::mem;

use super::dispatch::{Decode, Encode};
use super::error::ArchiveError;
use crate::core::Buffer;

/// Snapshot read cursor untuk retry decode
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Checkpoint {
    read: usize,
}

impl Checkpoint {
    /// Posisi read cursor saat snapshot diambil
    pub fn position(&self) -> usize {
        self.read
    }
}

/// Session encode/decode yang meminjam Buffer secara eksklusif.
///
/// Archive tidak bisa di-clone. `take()` memindahkan buffer dan kedua cursor
/// ke archive baru dan membuat sumbernya invalid secara permanen.
pub struct Archive<'a, B: Buffer + ?Sized> {
    buffer: Option<&'a mut B>,
    // Total bytes yang sudah di-encode
    written: usize,
    // Bagian dari `written` yang sudah di-commit ke area readable
    committed: usize,
    // Total bytes yang sudah di-decode
    read: usize,
    // Bagian dari `read` yang sudah di-discard dari buffer
    discarded: usize,
}

impl<'a, B: Buffer + ?Sized> Archive<'a, B> {
    /// Membuat archive yang terikat ke `buffer`, kedua cursor di nol
    pub fn new(buffer: &'a mut B) -> Self {
        Self {
            buffer: Some(buffer),
            written: 0,
            committed: 0,
            read: 0,
            discarded: 0,
        }
    }

    /// Cek apakah archive masih terikat ke buffer
    #[inline(always)]
    pub fn is_valid(&self) -> bool {
        self.buffer.is_some()
    }

    /// Pindahkan archive ini ke nilai baru; sumbernya menjadi moved-from.
    pub fn take(&mut self) -> Self {
        Self {
            buffer: self.buffer.take(),
            written: mem::take(&mut self.written),
            committed: mem::take(&mut self.committed),
            read: mem::take(&mut self.read),
            discarded: mem::take(&mut self.discarded),
        }
    }

    /// Total bytes yang sudah di-encode
    #[inline(always)]
    pub fn written_bytes(&self) -> usize {
        self.written
    }

    /// Total bytes yang sudah di-decode
    #[inline(always)]
    pub fn read_bytes(&self) -> usize {
        self.read
    }

    /// Bytes readable yang belum di-decode
    #[track_caller]
    pub fn remaining(&self) -> usize {
        self.bound_buffer().available() - self.read_offset()
    }

    /// Encode satu nilai, bisa di-chain: `archive.encode(&a)?.encode(&b)?`
    #[track_caller]
    pub fn encode<T: Encode + ?Sized>(&mut self, value: &T) -> Result<&mut Self, ArchiveError> {
        self.assert_valid();
        value.encode(self)?;
        Ok(self)
    }

    /// Encode transactional: jika gagal di tengah, bytes parsial nilai ini
    /// dibuang dan tidak akan ter-commit.
    #[track_caller]
    pub fn encode_atomic<T: Encode + ?Sized>(
        &mut self,
        value: &T,
    ) -> Result<&mut Self, ArchiveError> {
        self.assert_valid();
        let written = self.written;

        match value.encode(self) {
            Ok(()) => Ok(self),
            Err(err) => {
                // Bytes sesudah `written` belum di-commit, cukup mundurkan cursor
                self.written = written;
                Err(err)
            }
        }
    }

    /// Decode satu nilai bertipe `T`
    #[track_caller]
    pub fn decode<T: Decode>(&mut self) -> Result<T, ArchiveError> {
        self.assert_valid();
        T::decode(self)
    }

    /// Decode ke slot yang sudah ada, bisa di-chain seperti `encode`
    #[track_caller]
    pub fn decode_into<T: Decode>(&mut self, slot: &mut T) -> Result<&mut Self, ArchiveError> {
        *slot = self.decode()?;
        Ok(self)
    }

    /// Decode transactional: jika gagal, read cursor dikembalikan ke posisi awal
    #[track_caller]
    pub fn decode_atomic<T: Decode>(&mut self) -> Result<T, ArchiveError> {
        let checkpoint = self.checkpoint();

        match self.decode() {
            Ok(value) => Ok(value),
            Err(err) => {
                self.rewind(checkpoint);
                Err(err)
            }
        }
    }

    /// Snapshot read cursor saat ini
    #[track_caller]
    pub fn checkpoint(&self) -> Checkpoint {
        self.assert_valid();
        Checkpoint { read: self.read }
    }

    /// Kembalikan read cursor ke `checkpoint`.
    ///
    /// # Panics
    /// Panic jika checkpoint berada sebelum `flush()` terakhir atau di depan
    /// read cursor saat ini.
    #[track_caller]
    pub fn rewind(&mut self, checkpoint: Checkpoint) {
        self.assert_valid();
        assert!(
            checkpoint.read >= self.discarded && checkpoint.read <= self.read,
            "checkpoint {} outside rewindable range {}..={}",
            checkpoint.read,
            self.discarded,
            self.read
        );
        self.read = checkpoint.read;
    }

    /// Commit bytes yang sudah di-encode dan discard bytes yang sudah di-decode.
    ///
    /// Dipanggil otomatis saat archive di-drop.
    #[track_caller]
    pub fn flush(&mut self) {
        let pending = self.write_offset();
        let consumed = self.read_offset();
        let buffer = self.bound_buffer_mut();

        if pending > 0 {
            buffer.commit(pending);
        }
        if consumed > 0 {
            buffer.discard(consumed);
        }

        self.committed = self.written;
        self.discarded = self.read;
    }

    /// Offset write cursor di dalam area writable buffer
    #[inline(always)]
    pub(crate) fn write_offset(&self) -> usize {
        self.written - self.committed
    }

    /// Offset read cursor di dalam area readable buffer
    #[inline(always)]
    pub(crate) fn read_offset(&self) -> usize {
        self.read - self.discarded
    }

    #[inline(always)]
    pub(crate) fn advance_write(&mut self, len: usize) {
        self.written += len;
    }

    #[inline(always)]
    pub(crate) fn advance_read(&mut self, len: usize) {
        self.read += len;
    }

    #[inline(always)]
    #[track_caller]
    pub(crate) fn bound_buffer(&self) -> &B {
        match self.buffer.as_deref() {
            Some(buffer) => buffer,
            None => not_bound(),
        }
    }

    #[inline(always)]
    #[track_caller]
    pub(crate) fn bound_buffer_mut(&mut self) -> &mut B {
        match self.buffer.as_deref_mut() {
            Some(buffer) => buffer,
            None => not_bound(),
        }
    }

    #[inline(always)]
    #[track_caller]
    fn assert_valid(&self) {
        if !self.is_valid() {
            not_bound();
        }
    }
}

#[cold]
#[inline(never)]
#[track_caller]
fn not_bound() -> ! {
    panic!("archive is not bound to a buffer (unbound or moved-from)");
}

impl<B: Buffer + ?Sized> Default for Archive<'_, B> {
    /// Archive unbound; semua operasi encode/decode akan panic
    fn default() -> Self {
        Self {
            buffer: None,
            written: 0,
            committed: 0,
            read: 0,
            discarded: 0,
        }
    }
}

impl<B: Buffer + ?Sized> Drop for Archive<'_, B> {
    fn drop(&mut self) {
        if self.is_valid() {
            self.flush();
        }
    }
}

impl<B: Buffer + ?Sized> fmt::Debug for Archive<'_, B> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Archive")
            .field("valid", &self.is_valid())
            .field("written", &self.written)
            .field("read", &self.read)
            .finish()
    }
}
