//! Network Layer: Archive di atas TCP
//!
//! Menggunakan mio untuk cross-platform async I/O.
//!
//! Fitur:
//! - Non-blocking I/O dengan epoll/kqueue/IOCP
//! - Framing lewat Archive: nilai parsial tidak merusak stream
//! - Partial write tetap di outbound buffer sampai socket writable

mod connection;
mod frame;
mod server;

pub use connection::Connection;
pub use frame::Frame;
pub use server::{EchoServer, ServerConfig};
