//! Core module: Buffer contract dan implementasinya
//!
//! Prinsip desain:
//! - Archive hanya meminta region write/read pada offset tertentu
//! - Buffer yang memutuskan alokasi, growth, dan retensi
//! - Dua backing: heap (`VecBuffer`) dan mmap file (`MmapBuffer`)

mod buffer;
mod mmap_buffer;
mod vec_buffer;

pub use buffer::{
    Buffer, BufferConfig, BufferError, DEFAULT_INITIAL_CAPACITY, DEFAULT_MAX_CAPACITY,
};
pub use mmap_buffer::MmapBuffer;
pub use vec_buffer::VecBuffer;
