//! Connection handling dengan archive framing
//!
//! Inbound dan outbound masing-masing satu `VecBuffer`:
//! - `fill()` menarik bytes dari socket ke inbound sampai `WouldBlock`
//! - `receive()` decode satu nilai secara atomic; nilai parsial menunggu
//!   `fill()` berikutnya tanpa merusak read cursor
//! - `send()` encode ke outbound, `flush()` mendorongnya ke socket

use std::io::{self, Read, Write};

use tracing::{debug, trace};

use crate::archive::{Archive, ArchiveError, Decode, Encode};
use crate::core::{Buffer, BufferConfig, BufferError, VecBuffer};

/// Ukuran chunk per `read()` dari socket (64KB)
const READ_CHUNK_SIZE: usize = 64 * 1024;

/// Connection non-blocking di atas stream apa pun (`mio::net::TcpStream`,
/// `std::net::TcpStream`, atau mock di test)
pub struct Connection<S> {
    stream: S,
    inbound: VecBuffer,
    outbound: VecBuffer,
    peer_closed: bool,
}

impl<S: Read + Write> Connection<S> {
    /// Wrap stream dengan konfigurasi buffer default
    pub fn new(stream: S) -> Self {
        Self::with_config(stream, BufferConfig::default())
    }

    /// Wrap stream dengan konfigurasi buffer tertentu untuk kedua arah
    pub fn with_config(stream: S, config: BufferConfig) -> Self {
        Self {
            stream,
            inbound: VecBuffer::with_config(config),
            outbound: VecBuffer::with_config(config),
            peer_closed: false,
        }
    }

    /// Baca dari socket ke inbound buffer sampai `WouldBlock` atau EOF.
    ///
    /// Returns jumlah bytes baru yang diterima.
    pub fn fill(&mut self) -> io::Result<usize> {
        let mut total = 0;

        loop {
            // Chunk dibatasi sisa kapasitas agar config kecil tetap bisa read
            let headroom = self.inbound.config().max_capacity.saturating_sub(self.inbound.len());
            let chunk = READ_CHUNK_SIZE.min(headroom);
            if chunk == 0 {
                // Beri kesempatan caller men-decode yang sudah masuk dulu
                if total > 0 {
                    break;
                }
                return Err(io::Error::new(
                    io::ErrorKind::OutOfMemory,
                    BufferError::CapacityExceeded {
                        requested: self.inbound.len() + 1,
                        limit: self.inbound.config().max_capacity,
                    },
                ));
            }

            self.inbound
                .reserve(chunk)
                .map_err(|err| io::Error::new(io::ErrorKind::OutOfMemory, err))?;

            match self.stream.read(&mut self.inbound.writable(0)[..chunk]) {
                Ok(0) => {
                    debug!(received = total, "peer closed connection");
                    self.peer_closed = true;
                    break;
                }
                Ok(n) => {
                    self.inbound.commit(n);
                    total += n;
                }
                Err(ref e) if e.kind() == io::ErrorKind::WouldBlock => break,
                Err(ref e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(e) => return Err(e),
            }
        }

        trace!(received = total, buffered = self.inbound.len(), "filled inbound");
        Ok(total)
    }

    /// Decode satu nilai dari inbound.
    ///
    /// Returns `Ok(None)` jika bytes belum lengkap; bytes parsial tetap
    /// di buffer untuk percobaan berikutnya.
    pub fn receive<T: Decode>(&mut self) -> Result<Option<T>, ArchiveError> {
        let mut archive = Archive::new(&mut self.inbound);

        match archive.decode_atomic::<T>() {
            Ok(value) => Ok(Some(value)),
            Err(err) if err.is_end_of_stream() => Ok(None),
            Err(err) => Err(err),
        }
    }

    /// Encode satu nilai ke outbound buffer.
    ///
    /// Jika encode gagal di tengah (misal kapasitas habis), tidak ada byte
    /// dari nilai ini yang masuk outbound.
    pub fn send<T: Encode + ?Sized>(&mut self, value: &T) -> Result<(), ArchiveError> {
        Archive::new(&mut self.outbound).encode_atomic(value)?;
        Ok(())
    }

    /// Flush outbound buffer ke socket.
    ///
    /// Partial write dan `WouldBlock` bukan error: sisa bytes tetap di
    /// outbound sampai flush berikutnya.
    pub fn flush(&mut self) -> io::Result<()> {
        while !self.outbound.is_empty() {
            match self.stream.write(self.outbound.as_slice()) {
                Ok(0) => {
                    return Err(io::Error::new(
                        io::ErrorKind::WriteZero,
                        "Failed to write to socket",
                    ));
                }
                Ok(n) => self.outbound.discard(n),
                Err(ref e) if e.kind() == io::ErrorKind::WouldBlock => break,
                Err(ref e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(e) => return Err(e),
            }
        }

        Ok(())
    }

    /// Bytes inbound yang belum di-decode
    #[inline(always)]
    pub fn read_pending(&self) -> usize {
        self.inbound.len()
    }

    /// Cek apakah inbound sudah penuh sampai `max_capacity`
    #[inline(always)]
    pub fn is_inbound_full(&self) -> bool {
        self.inbound.len() >= self.inbound.config().max_capacity
    }

    /// Bytes outbound yang belum terkirim
    #[inline(always)]
    pub fn write_pending(&self) -> usize {
        self.outbound.len()
    }

    /// Cek apakah peer sudah menutup sisi write-nya
    #[inline(always)]
    pub fn is_peer_closed(&self) -> bool {
        self.peer_closed
    }

    /// Underlying stream untuk registrasi polling
    pub fn stream(&self) -> &S {
        &self.stream
    }

    /// Underlying stream (mutable) untuk registrasi polling
    pub fn stream_mut(&mut self) -> &mut S {
        &mut self.stream
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::VecDeque;

    /// Mock stream: inbound dikirim per chunk, lalu `WouldBlock`
    struct ChunkedStream {
        chunks: VecDeque<Vec<u8>>,
        written: Vec<u8>,
        write_limit: usize,
        closed: bool,
    }

    impl ChunkedStream {
        fn new(chunks: Vec<Vec<u8>>) -> Self {
            Self {
                chunks: chunks.into(),
                written: Vec::new(),
                write_limit: usize::MAX,
                closed: false,
            }
        }
    }

    impl Read for ChunkedStream {
        fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
            match self.chunks.pop_front() {
                Some(chunk) => {
                    buf[..chunk.len()].copy_from_slice(&chunk);
                    Ok(chunk.len())
                }
                None if self.closed => Ok(0),
                None => Err(io::ErrorKind::WouldBlock.into()),
            }
        }
    }

    impl Write for ChunkedStream {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            if self.write_limit == 0 {
                return Err(io::ErrorKind::WouldBlock.into());
            }
            let n = buf.len().min(self.write_limit);
            self.written.extend_from_slice(&buf[..n]);
            self.write_limit -= n;
            Ok(n)
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    #[test]
    fn test_receive_waits_for_complete_value() {
        let bytes = crate::to_vec(&(7u32, "split")).unwrap();
        let (head, tail) = bytes.split_at(6);

        let mut conn = Connection::new(ChunkedStream::new(vec![head.to_vec()]));
        assert_eq!(conn.fill().unwrap(), 6);
        assert_eq!(conn.receive::<(u32, String)>().unwrap(), None);
        assert_eq!(conn.read_pending(), 6);

        conn.stream_mut().chunks.push_back(tail.to_vec());
        conn.fill().unwrap();

        let value = conn.receive::<(u32, String)>().unwrap();
        assert_eq!(value, Some((7, "split".to_string())));
        assert_eq!(conn.read_pending(), 0);
    }

    #[test]
    fn test_fill_with_small_capacity() {
        let config = BufferConfig {
            initial_capacity: 1024,
            max_capacity: 16 * 1024,
        };
        let mut conn = Connection::with_config(ChunkedStream::new(vec![vec![1, 0, 0, 0]]), config);

        assert_eq!(conn.fill().unwrap(), 4);
        assert_eq!(conn.receive::<u32>().unwrap(), Some(1));
    }

    #[test]
    fn test_fill_stops_at_capacity_limit() {
        let config = BufferConfig {
            initial_capacity: 4,
            max_capacity: 8,
        };
        let mut conn =
            Connection::with_config(ChunkedStream::new(vec![vec![0xAB; 8], vec![0xCD]]), config);

        assert_eq!(conn.fill().unwrap(), 8);
        assert!(conn.is_inbound_full());
        assert_eq!(conn.receive::<[u8; 16]>().unwrap(), None);

        // Buffer penuh oleh nilai parsial: read berikutnya tidak punya ruang
        let err = conn.fill().unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::OutOfMemory);
        assert_eq!(conn.read_pending(), 8);
        assert_eq!(conn.stream().chunks.len(), 1);
    }

    #[test]
    fn test_failed_send_leaves_outbound_clean() {
        let config = BufferConfig {
            initial_capacity: 8,
            max_capacity: 8,
        };
        let mut conn = Connection::with_config(ChunkedStream::new(Vec::new()), config);

        assert!(conn.send(&(1u32, [0u8; 16])).is_err());
        assert_eq!(conn.write_pending(), 0);

        conn.send(&2u16).unwrap();
        conn.flush().unwrap();
        assert_eq!(conn.stream().written, [2, 0]);
    }

    #[test]
    fn test_multiple_values_in_one_read() {
        let mut bytes = crate::to_vec(&1u16).unwrap();
        bytes.extend(crate::to_vec(&2u16).unwrap());

        let mut conn = Connection::new(ChunkedStream::new(vec![bytes]));
        conn.fill().unwrap();

        assert_eq!(conn.receive::<u16>().unwrap(), Some(1));
        assert_eq!(conn.receive::<u16>().unwrap(), Some(2));
        assert_eq!(conn.receive::<u16>().unwrap(), None);
    }

    #[test]
    fn test_peer_close_detected() {
        let mut stream = ChunkedStream::new(vec![vec![1]]);
        stream.closed = true;

        let mut conn = Connection::new(stream);
        assert_eq!(conn.fill().unwrap(), 1);
        assert!(conn.is_peer_closed());
    }

    #[test]
    fn test_partial_flush_keeps_remaining() {
        let mut stream = ChunkedStream::new(Vec::new());
        stream.write_limit = 3;

        let mut conn = Connection::new(stream);
        conn.send("abcdef").unwrap();
        assert_eq!(conn.write_pending(), 7);

        conn.flush().unwrap();
        assert_eq!(conn.write_pending(), 4);
        assert_eq!(conn.stream().written, [6, b'a', b'b']);

        conn.stream_mut().write_limit = usize::MAX;
        conn.flush().unwrap();
        assert_eq!(conn.write_pending(), 0);
        assert_eq!(conn.stream().written, [6, b'a', b'b', b'c', b'd', b'e', b'f']);
    }
}
