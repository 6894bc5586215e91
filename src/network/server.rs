//! Echo Server dengan event-driven I/O
//!
//! Menggunakan mio untuk non-blocking I/O multiplexing. Setiap `Frame` yang
//! diterima langsung di-encode balik ke pengirimnya.

use std::collections::HashMap;
use std::io;
use std::net::SocketAddr;
use std::time::Duration;

use mio::net::{TcpListener, TcpStream};
use mio::{Events, Interest, Poll, Token};
use tracing::{debug, info, warn};

use super::{Connection, Frame};

const SERVER_TOKEN: Token = Token(0);
const EVENTS_CAPACITY: usize = 1024;

/// Konfigurasi echo server
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Alamat listen; port 0 untuk port acak
    pub bind_addr: SocketAddr,
    /// SO_SNDBUF / SO_RCVBUF per koneksi (unix saja)
    pub socket_buffer_size: usize,
    /// Koneksi di atas batas ini langsung ditutup
    pub max_connections: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_addr: SocketAddr::from(([127, 0, 0, 1], 9999)),
            socket_buffer_size: 256 * 1024, // 256KB
            max_connections: 1024,
        }
    }
}

/// Echo server
///
/// Event-driven server dengan:
/// - Non-blocking I/O (epoll/kqueue/IOCP)
/// - Satu `Connection` (inbound + outbound buffer) per client
/// - Decode atomic: frame parsial menunggu bytes berikutnya
pub struct EchoServer {
    poll: Poll,
    listener: TcpListener,
    connections: HashMap<Token, Connection<TcpStream>>,
    next_token: usize,
    config: ServerConfig,
    frames_echoed: u64,
}

impl EchoServer {
    /// Bind listener dan daftarkan ke poller
    pub fn bind(config: ServerConfig) -> io::Result<Self> {
        let poll = Poll::new()?;
        let mut listener = TcpListener::bind(config.bind_addr)?;

        poll.registry()
            .register(&mut listener, SERVER_TOKEN, Interest::READABLE)?;

        info!(addr = %listener.local_addr()?, "echo server bound");

        Ok(Self {
            poll,
            listener,
            connections: HashMap::with_capacity(config.max_connections),
            next_token: 1,
            config,
            frames_echoed: 0,
        })
    }

    /// Alamat listen aktual (berguna jika port 0)
    pub fn local_addr(&self) -> io::Result<SocketAddr> {
        self.listener.local_addr()
    }

    /// Jumlah koneksi aktif
    pub fn connection_count(&self) -> usize {
        self.connections.len()
    }

    /// Total frame yang sudah di-echo sejak server dibuat
    pub fn frames_echoed(&self) -> u64 {
        self.frames_echoed
    }

    /// Satu iterasi poll + dispatch.
    ///
    /// Returns jumlah frame yang di-echo pada iterasi ini.
    pub fn run_once(&mut self, timeout: Option<Duration>) -> io::Result<usize> {
        let mut events = Events::with_capacity(EVENTS_CAPACITY);
        self.poll.poll(&mut events, timeout)?;

        let mut echoed = 0;

        for event in events.iter() {
            match event.token() {
                SERVER_TOKEN => self.accept_connections()?,
                token => {
                    if event.is_readable() || event.is_read_closed() {
                        echoed += self.handle_read(token)?;
                    }
                    if event.is_writable() {
                        self.handle_write(token)?;
                    }
                }
            }
        }

        self.frames_echoed += echoed as u64;
        Ok(echoed)
    }

    /// Accept new connections
    fn accept_connections(&mut self) -> io::Result<()> {
        loop {
            match self.listener.accept() {
                Ok((mut stream, addr)) => {
                    if self.connections.len() >= self.config.max_connections {
                        warn!(%addr, "max connections reached, rejecting");
                        continue;
                    }

                    // TCP_NODELAY untuk low latency
                    stream.set_nodelay(true)?;
                    tune_socket_buffers(&stream, self.config.socket_buffer_size);

                    let token = Token(self.next_token);
                    self.next_token += 1;

                    self.poll
                        .registry()
                        .register(&mut stream, token, Interest::READABLE)?;

                    self.connections.insert(token, Connection::new(stream));
                    debug!(%addr, token = token.0, "new connection");
                }
                Err(ref e) if e.kind() == io::ErrorKind::WouldBlock => break,
                Err(e) => return Err(e),
            }
        }
        Ok(())
    }

    /// Handle readable event: fill, decode semua frame lengkap, echo balik
    fn handle_read(&mut self, token: Token) -> io::Result<usize> {
        let conn = match self.connections.get_mut(&token) {
            Some(c) => c,
            None => return Ok(0),
        };

        let mut echoed = 0;
        loop {
            if let Err(e) = conn.fill() {
                debug!(token = token.0, error = %e, "read failed, closing");
                self.close(token);
                return Ok(echoed);
            }

            // Fill berhenti karena inbound penuh, socket mungkin masih ada data
            let hit_capacity = conn.is_inbound_full();

            loop {
                match conn.receive::<Frame>() {
                    Ok(Some(frame)) => {
                        if let Err(e) = conn.send(&frame) {
                            warn!(token = token.0, error = %e, "failed to queue echo");
                            self.close(token);
                            return Ok(echoed);
                        }
                        echoed += 1;
                    }
                    Ok(None) => break,
                    Err(e) => {
                        warn!(token = token.0, error = %e, "malformed frame, closing");
                        self.close(token);
                        return Ok(echoed);
                    }
                }
            }

            if !hit_capacity {
                break;
            }
        }

        self.handle_write(token)?;
        Ok(echoed)
    }

    /// Handle writable event: flush outbound, atur ulang interest
    fn handle_write(&mut self, token: Token) -> io::Result<()> {
        let conn = match self.connections.get_mut(&token) {
            Some(c) => c,
            None => return Ok(()),
        };

        if let Err(e) = conn.flush() {
            debug!(token = token.0, error = %e, "write failed, closing");
            self.close(token);
            return Ok(());
        }

        if conn.is_peer_closed() && conn.write_pending() == 0 {
            self.close(token);
            return Ok(());
        }

        // Minta WRITABLE hanya selama masih ada sisa outbound
        let interest = if conn.write_pending() > 0 {
            Interest::READABLE | Interest::WRITABLE
        } else {
            Interest::READABLE
        };
        self.poll
            .registry()
            .reregister(conn.stream_mut(), token, interest)?;

        Ok(())
    }

    fn close(&mut self, token: Token) {
        if let Some(mut conn) = self.connections.remove(&token) {
            let _ = self.poll.registry().deregister(conn.stream_mut());
            debug!(token = token.0, "connection closed");
        }
    }
}

/// Set SO_SNDBUF dan SO_RCVBUF. Error diabaikan: tidak semua platform
/// mengizinkan ukuran yang diminta.
#[cfg(unix)]
fn tune_socket_buffers(stream: &TcpStream, size: usize) {
    use std::os::unix::io::AsRawFd;

    let fd = stream.as_raw_fd();
    let optval = libc::c_int::try_from(size).unwrap_or(libc::c_int::MAX);

    for option in [libc::SO_SNDBUF, libc::SO_RCVBUF] {
        // SAFETY: fd valid selama `stream` hidup, optval adalah c_int lokal
        // dengan panjang yang dilaporkan tepat.
        let ret = unsafe {
            libc::setsockopt(
                fd,
                libc::SOL_SOCKET,
                option,
                &optval as *const _ as *const libc::c_void,
                std::mem::size_of::<libc::c_int>() as libc::socklen_t,
            )
        };
        if ret != 0 {
            debug!(option, error = %io::Error::last_os_error(), "setsockopt failed");
        }
    }
}

#[cfg(not(unix))]
fn tune_socket_buffers(_stream: &TcpStream, _size: usize) {}

#[cfg(test)]
mod tests {
    use super::*;

    fn local_config() -> ServerConfig {
        ServerConfig {
            bind_addr: SocketAddr::from(([127, 0, 0, 1], 0)),
            ..ServerConfig::default()
        }
    }

    #[test]
    fn test_bind_random_port() {
        let server = EchoServer::bind(local_config()).unwrap();
        assert_ne!(server.local_addr().unwrap().port(), 0);
        assert_eq!(server.connection_count(), 0);
        assert_eq!(server.frames_echoed(), 0);
    }

    #[test]
    fn test_idle_poll_echoes_nothing() {
        let mut server = EchoServer::bind(local_config()).unwrap();
        let echoed = server.run_once(Some(Duration::from_millis(5))).unwrap();
        assert_eq!(echoed, 0);
    }
}
