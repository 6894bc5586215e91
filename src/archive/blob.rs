//! Byte-Blob Codec: bulk copy bytes mentah ke/dari buffer
//!
//! Tidak ada alignment, padding, atau length prefix di level ini.
//! Read selalu dicek dulu terhadap bytes yang tersedia sebelum alokasi.

use tracing::trace;

use super::error::ArchiveError;
use super::session::Archive;
use crate::core::Buffer;

impl<B: Buffer + ?Sized> Archive<'_, B> {
    /// Copy `bytes` apa adanya ke write cursor
    #[track_caller]
    pub fn write_blob(&mut self, bytes: &[u8]) -> Result<(), ArchiveError> {
        self.write_blob_with(bytes.len(), |out| out.copy_from_slice(bytes))
    }

    /// Reserve `len` bytes di write cursor lalu biarkan `fill` mengisinya
    #[track_caller]
    pub(crate) fn write_blob_with<F>(&mut self, len: usize, fill: F) -> Result<(), ArchiveError>
    where
        F: FnOnce(&mut [u8]),
    {
        let offset = self.write_offset();
        let buffer = self.bound_buffer_mut();

        buffer.reserve(offset.saturating_add(len))?;
        fill(&mut buffer.writable(offset)[..len]);

        self.advance_write(len);
        Ok(())
    }

    /// Isi `out` penuh dari read cursor
    #[track_caller]
    pub fn read_blob_into(&mut self, out: &mut [u8]) -> Result<(), ArchiveError> {
        self.ensure_available(out.len())?;

        let offset = self.read_offset();
        out.copy_from_slice(&self.bound_buffer().readable(offset)[..out.len()]);

        self.advance_read(out.len());
        Ok(())
    }

    /// Baca `len` bytes dari read cursor ke `Vec` baru
    #[track_caller]
    pub fn read_blob(&mut self, len: usize) -> Result<Vec<u8>, ArchiveError> {
        self.ensure_available(len)?;

        let offset = self.read_offset();
        let bytes = self.bound_buffer().readable(offset)[..len].to_vec();

        self.advance_read(len);
        Ok(bytes)
    }

    /// Lihat `len` bytes berikutnya tanpa memajukan read cursor (zero-copy)
    #[track_caller]
    pub fn peek_blob(&self, len: usize) -> Result<&[u8], ArchiveError> {
        self.ensure_available(len)?;

        let offset = self.read_offset();
        Ok(&self.bound_buffer().readable(offset)[..len])
    }

    #[track_caller]
    pub(crate) fn ensure_available(&self, len: usize) -> Result<(), ArchiveError> {
        let available = self.remaining();
        if available < len {
            trace!(needed = len, available, "archive end of stream");
            return Err(ArchiveError::EndOfStream {
                needed: len,
                available,
            });
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::VecBuffer;

    #[test]
    fn test_blob_roundtrip_without_prefix() {
        let mut buffer = VecBuffer::new();
        Archive::new(&mut buffer).write_blob(b"raw bytes").unwrap();
        assert_eq!(buffer.as_slice(), b"raw bytes");

        let mut archive = Archive::new(&mut buffer);
        assert_eq!(archive.peek_blob(3).unwrap(), b"raw");
        assert_eq!(archive.read_bytes(), 0);

        assert_eq!(archive.read_blob(4).unwrap(), b"raw ");

        let mut rest = [0u8; 5];
        archive.read_blob_into(&mut rest).unwrap();
        assert_eq!(&rest, b"bytes");
        assert_eq!(archive.remaining(), 0);
    }

    #[test]
    fn test_short_blob_is_end_of_stream() {
        let mut buffer = VecBuffer::from_bytes(b"abc");
        let mut archive = Archive::new(&mut buffer);

        let err = archive.read_blob(4).unwrap_err();
        assert!(err.is_end_of_stream());
        assert_eq!(archive.read_bytes(), 0);
    }

    #[test]
    fn test_huge_length_does_not_allocate() {
        let mut buffer = VecBuffer::from_bytes(b"abc");
        let mut archive = Archive::new(&mut buffer);

        let err = archive.read_blob(usize::MAX).unwrap_err();
        assert!(matches!(
            err,
            ArchiveError::EndOfStream {
                needed: usize::MAX,
                available: 3
            }
        ));
    }
}
