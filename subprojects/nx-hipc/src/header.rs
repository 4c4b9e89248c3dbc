//! The two-word message header and the optional special header.
//!
//! Bit layout (bit 0 = least significant):
//!
//! ```text
//! Word 1: [0,16)  message type
//!         [16,20) num_in_pointers        (Rev 1: num_send_statics)
//!         [20,24) num_in_map_aliases     (Rev 1: num_send_buffers)
//!         [24,28) num_out_map_aliases    (Rev 1: num_recv_buffers)
//!         [28,32) num_inout_map_aliases  (Rev 1: num_exch_buffers)
//! Word 2: [0,10)  num_data_words
//!         [10,14) out_pointer_mode       (Rev 1: recv_static_mode)
//!         [14,20) padding (zero)
//!         [20,31) recv_list_offset (dead field, always zero)
//!         [31]    has_special_header
//! ```
//!
//! `recv_list_offset` is unused in both protocol revisions: encode always
//! writes zero and decode ignores whatever is stored there.

use static_assertions::const_assert_eq;

use crate::error::{DecodeError, EncodeError, check_width};

/// Words occupied by the [`Header`].
pub const HEADER_WORDS: usize = 2;

/// Words occupied by the [`SpecialHeader`] itself (pid and handles follow).
pub const SPECIAL_HEADER_WORDS: usize = 1;

/// Words occupied by the 64-bit process-id placeholder (low word first).
pub const PID_WORDS: usize = 2;

// Word 1.
const TYPE_MASK: u32 = 0xFFFF;
const COUNT_MASK: u32 = 0xF;
const IN_POINTERS_SHIFT: u32 = 16;
const IN_MAP_ALIASES_SHIFT: u32 = 20;
const OUT_MAP_ALIASES_SHIFT: u32 = 24;
const INOUT_MAP_ALIASES_SHIFT: u32 = 28;

// Word 2.
const DATA_WORDS_MASK: u32 = 0x3FF;
const MODE_MASK: u32 = 0xF;
const MODE_SHIFT: u32 = 10;
const SPECIAL_HEADER_SHIFT: u32 = 31;

// Special header word.
const SEND_PID_BIT: u32 = 1;
const HANDLE_COUNT_MASK: u32 = 0xF;
const COPY_HANDLES_SHIFT: u32 = 1;
const MOVE_HANDLES_SHIFT: u32 = 5;
const SPECIAL_PADDING_SHIFT: u32 = 9;

// The four counts fill word 1 exactly behind the 16-bit type.
const_assert_eq!(INOUT_MAP_ALIASES_SHIFT + 4, 32);

/// Message type for HIPC requests.
///
/// Newtype wrapper around the raw 16-bit message type field. Protocol-specific
/// command types (CMIF, TIPC) convert into this type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[repr(transparent)]
pub struct MessageType(u16);

impl MessageType {
    /// Creates a message type from a raw value.
    #[inline]
    pub const fn from_raw(value: u16) -> Self {
        Self(value)
    }

    /// Returns the raw u16 value.
    #[inline]
    pub const fn to_raw(self) -> u16 {
        self.0
    }
}

/// Interpretation of the 4-bit mode nibble in header word 2.
///
/// The mapping is bijective over all sixteen raw values, so a decoded nibble
/// always re-encodes to the same bits:
///
/// - raw 0: no receive list ([`None`](Self::None))
/// - raw 1: entries inlined in the data words, no trailing entries
/// - raw 2: a single trailing entry
/// - raw 2+n: exactly n trailing entries (n in 1..=13)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutPointerMode {
    /// No receive list follows the message.
    #[default]
    None,
    /// Receive-list entries are carried inside the data words.
    Inlined,
    /// One trailing receive-list entry.
    Single,
    /// Exactly n trailing receive-list entries (1..=13).
    Multi(u8),
}

impl OutPointerMode {
    /// Largest entry count expressible by the [`Multi`](Self::Multi) encoding.
    pub const MAX_MULTI: u8 = 13;

    /// Decodes the mode nibble.
    #[inline]
    pub const fn from_raw(raw: u8) -> Self {
        match raw {
            0 => Self::None,
            1 => Self::Inlined,
            2 => Self::Single,
            n => Self::Multi(n - 2),
        }
    }

    /// Re-encodes the mode nibble.
    ///
    /// Returned as `u32` so an out-of-range `Multi` count surfaces as a
    /// value above 15 instead of wrapping; encode rejects it there.
    #[inline]
    pub const fn to_raw(self) -> u32 {
        match self {
            Self::None => 0,
            Self::Inlined => 1,
            Self::Single => 2,
            Self::Multi(n) => n as u32 + 2,
        }
    }

    /// Number of trailing receive-list entries this mode declares.
    #[inline]
    pub const fn trailing_entries(self) -> usize {
        match self {
            Self::None | Self::Inlined => 0,
            Self::Single => 1,
            Self::Multi(n) => n as usize,
        }
    }
}

/// Policy for reserved padding bits encountered during decode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PaddingPolicy {
    /// Non-zero reserved bits fail with
    /// [`DecodeError::MalformedSpecialHeader`].
    #[default]
    Reject,
    /// Non-zero reserved bits are ignored.
    Tolerate,
}

/// The HIPC message header (2 words).
///
/// The first structure in every message; its counts drive the layout of
/// everything that follows. Field names use the Revision 2 vocabulary; the
/// [`revision`](crate::revision) module provides the Revision 1 view.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Header {
    /// Message type (protocol-specific command type).
    pub message_type: MessageType,
    /// Number of in-pointer descriptors.
    pub num_in_pointers: u8,
    /// Number of in map-alias descriptors.
    pub num_in_map_aliases: u8,
    /// Number of out map-alias descriptors.
    pub num_out_map_aliases: u8,
    /// Number of inout map-alias descriptors.
    pub num_inout_map_aliases: u8,
    /// Number of raw data words.
    pub num_data_words: u16,
    /// Receive-list mode nibble.
    pub out_pointer_mode: OutPointerMode,
    /// Whether a [`SpecialHeader`] follows.
    pub has_special_header: bool,
}

impl Header {
    /// Packs the header into its two words.
    ///
    /// Every field is validated against its bit width; the dead
    /// `recv_list_offset` range and the padding bits are written as zero.
    pub fn encode(&self) -> Result<[u32; HEADER_WORDS], EncodeError> {
        check_width(
            "num_in_pointers",
            self.num_in_pointers as u64,
            COUNT_MASK as u64,
        )?;
        check_width(
            "num_in_map_aliases",
            self.num_in_map_aliases as u64,
            COUNT_MASK as u64,
        )?;
        check_width(
            "num_out_map_aliases",
            self.num_out_map_aliases as u64,
            COUNT_MASK as u64,
        )?;
        check_width(
            "num_inout_map_aliases",
            self.num_inout_map_aliases as u64,
            COUNT_MASK as u64,
        )?;
        check_width(
            "num_data_words",
            self.num_data_words as u64,
            DATA_WORDS_MASK as u64,
        )?;
        let mode = self.out_pointer_mode.to_raw();
        check_width("out_pointer_mode", mode as u64, MODE_MASK as u64)?;

        let word1 = (self.message_type.to_raw() as u32)
            | ((self.num_in_pointers as u32) << IN_POINTERS_SHIFT)
            | ((self.num_in_map_aliases as u32) << IN_MAP_ALIASES_SHIFT)
            | ((self.num_out_map_aliases as u32) << OUT_MAP_ALIASES_SHIFT)
            | ((self.num_inout_map_aliases as u32) << INOUT_MAP_ALIASES_SHIFT);
        let word2 = (self.num_data_words as u32)
            | (mode << MODE_SHIFT)
            | ((self.has_special_header as u32) << SPECIAL_HEADER_SHIFT);
        Ok([word1, word2])
    }

    /// Unpacks the header from its two words.
    ///
    /// Extraction is pure masking; stored values are definitionally in range,
    /// so decoding never fails. The `recv_list_offset` bits are ignored.
    pub fn decode(words: [u32; HEADER_WORDS]) -> Self {
        let [word1, word2] = words;
        Self {
            message_type: MessageType::from_raw((word1 & TYPE_MASK) as u16),
            num_in_pointers: ((word1 >> IN_POINTERS_SHIFT) & COUNT_MASK) as u8,
            num_in_map_aliases: ((word1 >> IN_MAP_ALIASES_SHIFT) & COUNT_MASK) as u8,
            num_out_map_aliases: ((word1 >> OUT_MAP_ALIASES_SHIFT) & COUNT_MASK) as u8,
            num_inout_map_aliases: ((word1 >> INOUT_MAP_ALIASES_SHIFT) & COUNT_MASK) as u8,
            num_data_words: (word2 & DATA_WORDS_MASK) as u16,
            out_pointer_mode: OutPointerMode::from_raw(((word2 >> MODE_SHIFT) & MODE_MASK) as u8),
            has_special_header: (word2 >> SPECIAL_HEADER_SHIFT) & 1 != 0,
        }
    }
}

/// The optional special header (1 word).
///
/// Present only when the header's `has_special_header` flag is set. The word
/// is followed by the 64-bit pid placeholder (if `send_pid`), then the copy
/// handles, then the move handles.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SpecialHeader {
    /// Whether the 64-bit pid placeholder follows.
    ///
    /// The codec writes the placeholder as zero; the kernel overwrites it.
    pub send_pid: bool,
    /// Number of copy handles following the pid.
    pub num_copy_handles: u8,
    /// Number of move handles following the copy handles.
    pub num_move_handles: u8,
}

impl SpecialHeader {
    /// Packs the special header into its word, padding forced to zero.
    pub fn encode(&self) -> Result<u32, EncodeError> {
        check_width(
            "num_copy_handles",
            self.num_copy_handles as u64,
            HANDLE_COUNT_MASK as u64,
        )?;
        check_width(
            "num_move_handles",
            self.num_move_handles as u64,
            HANDLE_COUNT_MASK as u64,
        )?;
        Ok((self.send_pid as u32)
            | ((self.num_copy_handles as u32) << COPY_HANDLES_SHIFT)
            | ((self.num_move_handles as u32) << MOVE_HANDLES_SHIFT))
    }

    /// Unpacks the special header from its word.
    ///
    /// Non-zero reserved padding fails with
    /// [`DecodeError::MalformedSpecialHeader`] under
    /// [`PaddingPolicy::Reject`] and is ignored under
    /// [`PaddingPolicy::Tolerate`].
    pub fn decode(word: u32, policy: PaddingPolicy) -> Result<Self, DecodeError> {
        let padding = word >> SPECIAL_PADDING_SHIFT;
        if padding != 0 && matches!(policy, PaddingPolicy::Reject) {
            return Err(DecodeError::MalformedSpecialHeader { padding });
        }
        Ok(Self {
            send_pid: word & SEND_PID_BIT != 0,
            num_copy_handles: ((word >> COPY_HANDLES_SHIFT) & HANDLE_COUNT_MASK) as u8,
            num_move_handles: ((word >> MOVE_HANDLES_SHIFT) & HANDLE_COUNT_MASK) as u8,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_header_known_words() {
        let header = Header {
            message_type: MessageType::from_raw(4),
            num_in_pointers: 1,
            num_in_map_aliases: 2,
            num_out_map_aliases: 3,
            num_inout_map_aliases: 4,
            num_data_words: 10,
            out_pointer_mode: OutPointerMode::Single,
            has_special_header: true,
        };

        let words = header.encode().unwrap();
        assert_eq!(words, [0x4321_0004, 0x8000_080A]);
        assert_eq!(Header::decode(words), header);
    }

    #[test]
    fn test_header_count_overflow() {
        let header = Header {
            num_in_pointers: 16,
            ..Default::default()
        };
        assert_eq!(
            header.encode(),
            Err(EncodeError::FieldOverflow {
                field: "num_in_pointers",
                value: 16,
                max: 15,
            })
        );
    }

    #[test]
    fn test_header_data_words_overflow() {
        let header = Header {
            num_data_words: 1024,
            ..Default::default()
        };
        assert!(matches!(
            header.encode(),
            Err(EncodeError::FieldOverflow {
                field: "num_data_words",
                ..
            })
        ));
    }

    #[test]
    fn test_header_multi_mode_overflow() {
        let header = Header {
            out_pointer_mode: OutPointerMode::Multi(14),
            ..Default::default()
        };
        assert!(matches!(
            header.encode(),
            Err(EncodeError::FieldOverflow {
                field: "out_pointer_mode",
                ..
            })
        ));
    }

    #[test]
    fn test_recv_list_offset_ignored() {
        // Garbage in the dead bit range [20,31) of word 2 must not affect decode.
        let clean = Header::decode([0x1234, 0x0000_0005]);
        let dirty = Header::decode([0x1234, 0x0000_0005 | (0x7FF << 20)]);
        assert_eq!(clean, dirty);
    }

    #[test]
    fn test_out_pointer_mode_bijective() {
        for raw in 0..=15u8 {
            let mode = OutPointerMode::from_raw(raw);
            assert_eq!(mode.to_raw(), raw as u32);
        }
    }

    #[test]
    fn test_special_header_round_trip() {
        let special = SpecialHeader {
            send_pid: true,
            num_copy_handles: 3,
            num_move_handles: 1,
        };
        let word = special.encode().unwrap();
        assert_eq!(word, 1 | (3 << 1) | (1 << 5));
        assert_eq!(
            SpecialHeader::decode(word, PaddingPolicy::Reject).unwrap(),
            special
        );
    }

    #[test]
    fn test_special_header_padding_policy() {
        let word = (2 << 1) | (0xABC << 9);
        assert_eq!(
            SpecialHeader::decode(word, PaddingPolicy::Reject),
            Err(DecodeError::MalformedSpecialHeader { padding: 0xABC })
        );

        let special = SpecialHeader::decode(word, PaddingPolicy::Tolerate).unwrap();
        assert_eq!(special.num_copy_handles, 2);
        assert!(!special.send_pid);
    }

    #[test]
    fn test_special_header_count_overflow() {
        let special = SpecialHeader {
            num_copy_handles: 16,
            ..Default::default()
        };
        assert!(matches!(
            special.encode(),
            Err(EncodeError::FieldOverflow {
                field: "num_copy_handles",
                ..
            })
        ));
    }
}
