//! TIPC (Trivial IPC) command conventions.
//!
//! TIPC is a simplified command layer introduced in Horizon OS 12.0.0. It has
//! no magic headers and no domains: the command ID is carried directly in the
//! HIPC message type field as `id + 16`, message type 15 closes the session,
//! and the first response data word is the result code (zero on success).

use crate::header::MessageType;

/// Offset added to a TIPC command ID to form the HIPC message type.
const COMMAND_ID_BASE: u16 = 16;

/// TIPC command types.
///
/// Regular commands do not appear here; they are formed with [`request`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u16)]
pub enum CommandType {
    /// Close session (type = 15).
    Close = 15,
}

impl From<CommandType> for MessageType {
    fn from(cmd: CommandType) -> Self {
        MessageType::from_raw(cmd as u16)
    }
}

/// Forms the message type for a TIPC request with the given command ID.
///
/// The sum is formed in 32 bits and truncated to the 16-bit message type
/// field, so IDs near `u16::MAX` do not overflow on the way in.
#[inline]
pub const fn request(command_id: u16) -> MessageType {
    MessageType::from_raw((command_id as u32 + COMMAND_ID_BASE as u32) as u16)
}

/// Recovers the command ID from a request message type.
///
/// Returns `None` for types below the command-ID base (including `Close`).
#[inline]
pub const fn command_id(message_type: MessageType) -> Option<u16> {
    let raw = message_type.to_raw();
    if raw < COMMAND_ID_BASE {
        return None;
    }
    Some(raw - COMMAND_ID_BASE)
}

/// Splits a response's data words into result code and payload.
///
/// The first data word is the result code; the remaining words are the
/// response payload.
pub fn parse_response(data_words: &[u32]) -> Result<&[u32], ParseResponseError> {
    let (&result, payload) = data_words
        .split_first()
        .ok_or(ParseResponseError::EmptyResponse)?;
    if result != 0 {
        return Err(ParseResponseError::ServiceError(result));
    }
    Ok(payload)
}

/// Error returned by [`parse_response`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum ParseResponseError {
    /// Response carries no data words at all.
    #[error("empty response data")]
    EmptyResponse,
    /// Service returned a non-zero result code.
    #[error("service error: {0:#x}")]
    ServiceError(u32),
}
