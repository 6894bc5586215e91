//! Frame: unit pesan yang dipertukarkan echo server
//!
//! Wire layout (tanpa header tambahan):
//! ```text
//! ┌──────────────┬────────────────┬─────────────────┐
//! │ sequence: u64│ len: varint    │ payload: [u8]   │
//! │ (8 bytes LE) │ (1-10 bytes)   │ (len bytes)     │
//! └──────────────┴────────────────┴─────────────────┘
//! ```

/// Pesan bernomor urut dengan payload opaque
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Frame {
    pub sequence: u64,
    pub payload: Vec<u8>,
}

crate::archive_fields!(Frame { sequence, payload });

impl Frame {
    pub fn new(sequence: u64, payload: impl Into<Vec<u8>>) -> Self {
        Self {
            sequence,
            payload: payload.into(),
        }
    }

    /// Ukuran frame di wire
    pub fn encoded_len(&self) -> usize {
        8 + crate::archive::encoded_len(self.payload.len() as u64) + self.payload.len()
    }
}
