//! CMIF (Command Message Interface Format) command headers.
//!
//! CMIF is the command serialization layer riding inside the HIPC data-word
//! section. This module covers its word-level formats only: the 16-byte
//! `"SFCI"`/`"SFCO"` command headers, the domain headers that prepend them
//! for domain sessions, and the command-type values stored in the HIPC
//! message type field. Building whole requests (payload layout, buffer
//! auto-selection) belongs to the service layer above.
//!
//! # Magic Numbers
//!
//! - `"SFCI"` (0x49434653): Service Framework Command Input
//! - `"SFCO"` (0x4F434653): Service Framework Command Output

use crate::header::MessageType;

/// Magic number for CMIF input headers ("SFCI").
const IN_HEADER_MAGIC: u32 = 0x49434653;

/// Magic number for CMIF output headers ("SFCO").
const OUT_HEADER_MAGIC: u32 = 0x4F434653;

/// Words occupied by each of the four CMIF header formats.
pub const CMIF_HEADER_WORDS: usize = 4;

/// CMIF command type (stored in the HIPC message type field).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u16)]
pub enum CommandType {
    /// Invalid command.
    Invalid = 0,
    /// Legacy request (pre-5.0.0).
    LegacyRequest = 1,
    /// Close session.
    Close = 2,
    /// Legacy control request.
    LegacyControl = 3,
    /// Standard request.
    Request = 4,
    /// Control request (domain conversion, cloning, etc.).
    Control = 5,
    /// Request with context token (5.0.0+).
    RequestWithContext = 6,
    /// Control request with context token.
    ControlWithContext = 7,
}

impl CommandType {
    /// Maps a raw message-type value back to a command type.
    pub const fn from_raw(value: u16) -> Option<Self> {
        Some(match value {
            0 => Self::Invalid,
            1 => Self::LegacyRequest,
            2 => Self::Close,
            3 => Self::LegacyControl,
            4 => Self::Request,
            5 => Self::Control,
            6 => Self::RequestWithContext,
            7 => Self::ControlWithContext,
            _ => return None,
        })
    }
}

impl From<CommandType> for MessageType {
    fn from(cmd: CommandType) -> Self {
        MessageType::from_raw(cmd as u16)
    }
}

/// Domain request type (stored in the domain input header).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum DomainRequestType {
    /// Invalid request.
    Invalid = 0,
    /// Send message to a domain object.
    SendMessage = 1,
    /// Close a domain object.
    Close = 2,
}

/// CMIF input header (4 words), at the start of every request payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct InHeader {
    /// Protocol version (0 = standard, 1 = with context).
    pub version: u32,
    /// Command/method ID to invoke.
    pub command_id: u32,
    /// Context token for versioning.
    pub token: u32,
}

impl InHeader {
    /// Packs the header, magic included.
    pub const fn encode(&self) -> [u32; CMIF_HEADER_WORDS] {
        [IN_HEADER_MAGIC, self.version, self.command_id, self.token]
    }

    /// Unpacks the header, validating the `"SFCI"` magic.
    pub const fn decode(words: [u32; CMIF_HEADER_WORDS]) -> Result<Self, ParseRequestError> {
        let [magic, version, command_id, token] = words;
        if magic != IN_HEADER_MAGIC {
            return Err(ParseRequestError::InvalidMagic);
        }
        Ok(Self {
            version,
            command_id,
            token,
        })
    }
}

/// CMIF output header (4 words), at the start of every response payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct OutHeader {
    /// Protocol version.
    pub version: u32,
    /// Echo of the request token.
    pub token: u32,
}

impl OutHeader {
    /// Packs a successful response header, magic included.
    pub const fn encode(&self) -> [u32; CMIF_HEADER_WORDS] {
        [OUT_HEADER_MAGIC, self.version, 0, self.token]
    }

    /// Packs a response header carrying a service result code.
    pub const fn encode_with_result(&self, result: u32) -> [u32; CMIF_HEADER_WORDS] {
        [OUT_HEADER_MAGIC, self.version, result, self.token]
    }

    /// Unpacks the header, validating the `"SFCO"` magic and surfacing a
    /// non-zero result code.
    pub const fn decode(words: [u32; CMIF_HEADER_WORDS]) -> Result<Self, ParseResponseError> {
        let [magic, version, result, token] = words;
        if magic != OUT_HEADER_MAGIC {
            return Err(ParseResponseError::InvalidMagic);
        }
        if result != 0 {
            return Err(ParseResponseError::ServiceError(result));
        }
        Ok(Self { version, token })
    }
}

/// Domain input header (4 words), prepended to the CMIF header for domain
/// requests.
///
/// Word 0 packs `request_type(8) | num_in_objects(8) | data_size(16)`;
/// word 2 is reserved padding, written zero and ignored on read.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct DomainInHeader {
    /// Request type (see [`DomainRequestType`]).
    pub request_type: u8,
    /// Number of object IDs passed in the request.
    pub num_in_objects: u8,
    /// Size of the CMIF header plus payload, in bytes.
    pub data_size: u16,
    /// Target object ID within the domain.
    pub object_id: u32,
    /// Context token.
    pub token: u32,
}

impl DomainInHeader {
    /// Packs the header.
    pub const fn encode(&self) -> [u32; CMIF_HEADER_WORDS] {
        let word0 = (self.request_type as u32)
            | ((self.num_in_objects as u32) << 8)
            | ((self.data_size as u32) << 16);
        [word0, self.object_id, 0, self.token]
    }

    /// Unpacks the header, ignoring the reserved padding word.
    pub const fn decode(words: [u32; CMIF_HEADER_WORDS]) -> Self {
        let [word0, object_id, _padding, token] = words;
        Self {
            request_type: (word0 & 0xFF) as u8,
            num_in_objects: ((word0 >> 8) & 0xFF) as u8,
            data_size: (word0 >> 16) as u16,
            object_id,
            token,
        }
    }
}

/// Domain output header (4 words), prepended to the CMIF header for domain
/// responses. Words 1-3 are reserved padding.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct DomainOutHeader {
    /// Number of object IDs returned.
    pub num_out_objects: u32,
}

impl DomainOutHeader {
    /// Packs the header.
    pub const fn encode(&self) -> [u32; CMIF_HEADER_WORDS] {
        [self.num_out_objects, 0, 0, 0]
    }

    /// Unpacks the header, ignoring the reserved padding words.
    pub const fn decode(words: [u32; CMIF_HEADER_WORDS]) -> Self {
        Self {
            num_out_objects: words[0],
        }
    }
}

/// Error returned by [`InHeader::decode`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum ParseRequestError {
    /// Request does not start with the `"SFCI"` magic.
    #[error("invalid CMIF magic header")]
    InvalidMagic,
}

/// Error returned by [`OutHeader::decode`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum ParseResponseError {
    /// Response does not start with the `"SFCO"` magic.
    #[error("invalid CMIF magic header")]
    InvalidMagic,
    /// Service returned a non-zero result code.
    #[error("service error: {0:#x}")]
    ServiceError(u32),
}
