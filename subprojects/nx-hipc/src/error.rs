//! Error types shared by the encode and decode paths.
//!
//! All errors are detected synchronously at the point of violation. Encoding
//! is deterministic pure computation, so there is nothing to retry; on any
//! encode error the destination buffer's contents are undefined and must be
//! discarded by the caller.

/// Error returned by the encode path.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum EncodeError {
    /// A count, size, or mode value does not fit its declared bit width.
    #[error("{field} value {value:#x} exceeds field maximum {max:#x}")]
    FieldOverflow {
        /// Name of the offending field.
        field: &'static str,
        /// The rejected value.
        value: u64,
        /// Largest value the field can hold.
        max: u64,
    },
    /// An address does not fit the representable width of its descriptor kind.
    #[error("address {address:#x} exceeds representable maximum {max:#x}")]
    AddressOutOfRange {
        /// The rejected address.
        address: u64,
        /// Largest address the descriptor kind can carry.
        max: u64,
    },
    /// The destination buffer cannot hold the encoded message.
    #[error("buffer too small: {needed} words needed, {capacity} available")]
    BufferTooSmall {
        /// Total words the encoding occupies.
        needed: usize,
        /// Words the caller supplied.
        capacity: usize,
    },
}

/// Error returned by the decode path.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum DecodeError {
    /// Fewer words remain than the next section requires.
    #[error("buffer too small: {needed} more words needed, {available} remain")]
    BufferTooSmall {
        /// Words the current section requires.
        needed: usize,
        /// Words remaining in the buffer.
        available: usize,
    },
    /// Reserved special-header padding bits are non-zero.
    ///
    /// Only raised under [`PaddingPolicy::Reject`](crate::header::PaddingPolicy).
    #[error("malformed special header: reserved padding bits {padding:#x}")]
    MalformedSpecialHeader {
        /// Value of the reserved bit range.
        padding: u32,
    },
}

/// Validates that `value` fits the field's bit width.
pub(crate) fn check_width(field: &'static str, value: u64, max: u64) -> Result<(), EncodeError> {
    if value > max {
        return Err(EncodeError::FieldOverflow { field, value, max });
    }
    Ok(())
}
