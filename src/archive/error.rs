//! Error taxonomy untuk encode/decode

use std::string::FromUtf8Error;

use thiserror::Error;

use crate::core::BufferError;

/// Error yang bisa dikembalikan Archive.
///
/// Hanya `EndOfStream` yang bisa di-retry setelah buffer menerima bytes
/// tambahan. Pelanggaran precondition (archive yang sudah di-move) bukan
/// error di sini: itu panic.
#[derive(Debug, Error)]
pub enum ArchiveError {
    #[error("end of stream: {needed} bytes needed, {available} available")]
    EndOfStream { needed: usize, available: usize },

    #[error("variable-length integer exceeds 64 bits")]
    VarintOverflow,

    #[error("decoded value {value} does not fit in usize/isize")]
    LengthOverflow { value: u64 },

    #[error("sequence of {len} zero-sized elements exceeds limit {limit}")]
    SequenceTooLong { len: usize, limit: usize },

    #[error("string payload is not valid UTF-8")]
    InvalidUtf8(#[from] FromUtf8Error),

    #[error("value {value} is not a valid discriminant of {type_name}")]
    InvalidDiscriminant {
        type_name: &'static str,
        value: i128,
    },

    #[error("{remaining} trailing bytes left after decode")]
    TrailingBytes { remaining: usize },

    #[error(transparent)]
    Buffer(#[from] BufferError),
}

impl ArchiveError {
    /// Cek apakah error ini End-of-Stream (recoverable)
    #[inline(always)]
    pub fn is_end_of_stream(&self) -> bool {
        matches!(self, Self::EndOfStream { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_end_of_stream_is_recoverable() {
        let err = ArchiveError::EndOfStream {
            needed: 4,
            available: 3,
        };
        assert!(err.is_end_of_stream());
        assert_eq!(
            err.to_string(),
            "end of stream: 4 bytes needed, 3 available"
        );

        assert!(!ArchiveError::VarintOverflow.is_end_of_stream());
    }
}
