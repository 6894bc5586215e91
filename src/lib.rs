//! Hermes Archive: Binary Object Serialization
//!
//! Arsitektur:
//! - `core`: Buffer eksternal (heap dan memory-mapped) tempat bytes tinggal
//! - `archive`: Codec fixed-width, varint, blob, dan dispatch per tipe
//! - `network`: Framing non-blocking di atas TCP dengan mio
//!
//! ```
//! use hermes_archive::{Archive, VecBuffer};
//!
//! let mut buffer = VecBuffer::new();
//! Archive::new(&mut buffer)
//!     .encode(&0x01020304u32).unwrap()
//!     .encode("hermes").unwrap();
//!
//! let mut archive = Archive::new(&mut buffer);
//! let number: u32 = archive.decode().unwrap();
//! let text: String = archive.decode().unwrap();
//! assert_eq!((number, text.as_str()), (0x01020304, "hermes"));
//! ```

pub mod archive;
pub mod core;
pub mod network;

pub use archive::{from_slice, to_vec, Archive, ArchiveError, Checkpoint, Decode, Encode, FixedWidth};
pub use crate::core::{Buffer, BufferConfig, BufferError, MmapBuffer, VecBuffer};
