//! Whole-buffer message encode and decode.
//!
//! [`MessageCodec`] walks the protocol's fixed section order over a
//! caller-owned `[u32]` region. Encoding writes the sections strictly in
//! order; decoding reads the header first and uses its counts to compute
//! every following section's length (the format is count-driven, not
//! self-delimiting). Each step checks remaining length before advancing and
//! fails with `BufferTooSmall` rather than reading out of bounds.
//!
//! # Data-section alignment
//!
//! With [`OutPointers::None`] the message is packed: the data words
//! immediately follow the descriptors. Any other mode declares an aligned
//! data section: the data words begin at the next 4-word (16-byte) boundary,
//! and the pre-padding plus trailing padding always total 4 words. Padding
//! is written as zero on encode and skipped without inspection on decode.

use crate::{
    RawHandle,
    descriptor::{
        IN_POINTER_WORDS, InPointerDescriptor, MAP_ALIAS_WORDS, MapAliasDescriptor,
        OUT_POINTER_WORDS, OutPointerDescriptor,
    },
    error::{DecodeError, EncodeError, check_width},
    header::{
        HEADER_WORDS, Header, MessageType, OutPointerMode, PID_WORDS, PaddingPolicy, SpecialHeader,
    },
    revision::{Revision, SectionCounts},
};

/// Alignment of the data section, in words, when a receive-list mode is set.
const DATA_ALIGN_WORDS: usize = 4;

/// The out-pointer (receive list) section of a message to encode.
///
/// Fuses the header's mode nibble with the trailing entries so the declared
/// count and the entry array cannot disagree.
#[derive(Debug, Clone, Copy, Default)]
pub enum OutPointers<'a> {
    /// No receive list; the message is packed (no data alignment).
    #[default]
    None,
    /// Entries are carried inside the data words; nothing trails.
    Inlined,
    /// One trailing entry.
    Single(OutPointerDescriptor),
    /// Trailing entries, at most [`OutPointerMode::MAX_MULTI`].
    ///
    /// An empty slice encodes as [`None`](Self::None): zero entries have no
    /// `Multi` nibble encoding of their own (raw 2 is `Single`).
    Multi(&'a [OutPointerDescriptor]),
}

impl OutPointers<'_> {
    /// The mode nibble this section encodes to.
    ///
    /// For `Multi` the slice length must already be within
    /// [`OutPointerMode::MAX_MULTI`]; [`MessageCodec::encode`] validates it.
    pub fn mode(&self) -> OutPointerMode {
        match self {
            Self::None => OutPointerMode::None,
            Self::Inlined => OutPointerMode::Inlined,
            Self::Single(_) => OutPointerMode::Single,
            Self::Multi(entries) if entries.is_empty() => OutPointerMode::None,
            Self::Multi(entries) => OutPointerMode::Multi(entries.len() as u8),
        }
    }

    fn trailing_entry_count(&self) -> usize {
        match self {
            Self::None | Self::Inlined => 0,
            Self::Single(_) => 1,
            Self::Multi(entries) => entries.len(),
        }
    }
}

/// A message to encode.
///
/// Pure description of the sections; all storage is borrowed from the
/// caller. Section slices appear here in the order they are written.
#[derive(Debug, Clone, Copy, Default)]
pub struct Message<'a> {
    /// Message type (protocol-specific command type).
    pub message_type: MessageType,
    /// Whether to reserve the 64-bit pid placeholder (kernel fills it).
    pub send_pid: bool,
    /// Copy handles to transfer.
    pub copy_handles: &'a [RawHandle],
    /// Move handles to transfer.
    pub move_handles: &'a [RawHandle],
    /// In-pointer descriptors.
    pub in_pointers: &'a [InPointerDescriptor],
    /// Map-alias descriptors, in sub-group.
    pub in_map_aliases: &'a [MapAliasDescriptor],
    /// Map-alias descriptors, out sub-group.
    pub out_map_aliases: &'a [MapAliasDescriptor],
    /// Map-alias descriptors, inout sub-group.
    pub inout_map_aliases: &'a [MapAliasDescriptor],
    /// Raw data words (opaque payload owned by the caller).
    pub data_words: &'a [u32],
    /// Out-pointer (receive list) section.
    pub out_pointers: OutPointers<'a>,
}

impl Message<'_> {
    /// Whether this message needs a special header.
    ///
    /// A special header is needed when sending a pid or any handles.
    #[inline]
    pub const fn has_special_header(&self) -> bool {
        self.send_pid || !self.copy_handles.is_empty() || !self.move_handles.is_empty()
    }

    /// Exact number of words the encoding occupies.
    pub fn encoded_words(&self) -> usize {
        let mut words = HEADER_WORDS;
        if self.has_special_header() {
            words += 1;
            if self.send_pid {
                words += PID_WORDS;
            }
            words += self.copy_handles.len() + self.move_handles.len();
        }
        words += self.in_pointers.len() * IN_POINTER_WORDS;
        words += (self.in_map_aliases.len()
            + self.out_map_aliases.len()
            + self.inout_map_aliases.len())
            * MAP_ALIAS_WORDS;
        if !matches!(self.out_pointers.mode(), OutPointerMode::None) {
            words += DATA_ALIGN_WORDS;
        }
        words += self.data_words.len();
        words += self.out_pointers.trailing_entry_count() * OUT_POINTER_WORDS;
        words
    }
}

/// Encoder/decoder for whole command buffers.
///
/// Cheap `Copy` configuration selected once: the protocol [`Revision`]
/// (which only affects the naming of the count fields exposed to the
/// caller) and the [`PaddingPolicy`] applied while decoding the special
/// header. Concurrent calls must use distinct buffers.
#[derive(Debug, Clone, Copy)]
pub struct MessageCodec {
    revision: Revision,
    padding_policy: PaddingPolicy,
}

impl MessageCodec {
    /// Creates a codec for the given revision with the default
    /// [`PaddingPolicy::Reject`].
    pub const fn new(revision: Revision) -> Self {
        Self {
            revision,
            padding_policy: PaddingPolicy::Reject,
        }
    }

    /// Sets the padding policy applied during decode.
    pub const fn with_padding_policy(mut self, policy: PaddingPolicy) -> Self {
        self.padding_policy = policy;
        self
    }

    /// Returns the revision this codec was created with.
    pub const fn revision(&self) -> Revision {
        self.revision
    }

    /// Encodes `msg` into `buf`, returning the number of words written.
    ///
    /// Capacity is checked once up front. On any error the destination
    /// contents are undefined and must be discarded.
    pub fn encode(&self, msg: &Message<'_>, buf: &mut [u32]) -> Result<usize, EncodeError> {
        check_width("num_in_pointers", msg.in_pointers.len() as u64, 15)?;
        check_width("num_in_map_aliases", msg.in_map_aliases.len() as u64, 15)?;
        check_width("num_out_map_aliases", msg.out_map_aliases.len() as u64, 15)?;
        check_width(
            "num_inout_map_aliases",
            msg.inout_map_aliases.len() as u64,
            15,
        )?;
        check_width("num_data_words", msg.data_words.len() as u64, 1023)?;
        check_width("num_copy_handles", msg.copy_handles.len() as u64, 15)?;
        check_width("num_move_handles", msg.move_handles.len() as u64, 15)?;
        if let OutPointers::Multi(entries) = msg.out_pointers {
            check_width(
                "num_out_pointers",
                entries.len() as u64,
                OutPointerMode::MAX_MULTI as u64,
            )?;
        }

        let needed = msg.encoded_words();
        if buf.len() < needed {
            return Err(EncodeError::BufferTooSmall {
                needed,
                capacity: buf.len(),
            });
        }

        let header = Header {
            message_type: msg.message_type,
            num_in_pointers: msg.in_pointers.len() as u8,
            num_in_map_aliases: msg.in_map_aliases.len() as u8,
            num_out_map_aliases: msg.out_map_aliases.len() as u8,
            num_inout_map_aliases: msg.inout_map_aliases.len() as u8,
            num_data_words: msg.data_words.len() as u16,
            out_pointer_mode: msg.out_pointers.mode(),
            has_special_header: msg.has_special_header(),
        };
        let header_words = header.encode()?;
        buf[..HEADER_WORDS].copy_from_slice(&header_words);
        let mut cursor = HEADER_WORDS;

        if msg.has_special_header() {
            let special = SpecialHeader {
                send_pid: msg.send_pid,
                num_copy_handles: msg.copy_handles.len() as u8,
                num_move_handles: msg.move_handles.len() as u8,
            };
            buf[cursor] = special.encode()?;
            cursor += 1;

            if msg.send_pid {
                // Placeholder; the kernel overwrites it on transfer.
                buf[cursor..cursor + PID_WORDS].fill(0);
                cursor += PID_WORDS;
            }
            buf[cursor..cursor + msg.copy_handles.len()].copy_from_slice(msg.copy_handles);
            cursor += msg.copy_handles.len();
            buf[cursor..cursor + msg.move_handles.len()].copy_from_slice(msg.move_handles);
            cursor += msg.move_handles.len();
        }

        for desc in msg.in_pointers {
            let words = desc.encode()?;
            buf[cursor..cursor + IN_POINTER_WORDS].copy_from_slice(&words);
            cursor += IN_POINTER_WORDS;
        }
        for group in [
            msg.in_map_aliases,
            msg.out_map_aliases,
            msg.inout_map_aliases,
        ] {
            for desc in group {
                let words = desc.encode()?;
                buf[cursor..cursor + MAP_ALIAS_WORDS].copy_from_slice(&words);
                cursor += MAP_ALIAS_WORDS;
            }
        }

        if matches!(msg.out_pointers.mode(), OutPointerMode::None) {
            buf[cursor..cursor + msg.data_words.len()].copy_from_slice(msg.data_words);
            cursor += msg.data_words.len();
        } else {
            let pre = (DATA_ALIGN_WORDS - cursor % DATA_ALIGN_WORDS) % DATA_ALIGN_WORDS;
            let trailing = DATA_ALIGN_WORDS - pre;
            buf[cursor..cursor + pre].fill(0);
            cursor += pre;
            buf[cursor..cursor + msg.data_words.len()].copy_from_slice(msg.data_words);
            cursor += msg.data_words.len();
            buf[cursor..cursor + trailing].fill(0);
            cursor += trailing;
        }

        match msg.out_pointers {
            OutPointers::None | OutPointers::Inlined => {}
            OutPointers::Single(entry) => {
                let words = entry.encode()?;
                buf[cursor..cursor + OUT_POINTER_WORDS].copy_from_slice(&words);
                cursor += OUT_POINTER_WORDS;
            }
            OutPointers::Multi(entries) => {
                for entry in entries {
                    let words = entry.encode()?;
                    buf[cursor..cursor + OUT_POINTER_WORDS].copy_from_slice(&words);
                    cursor += OUT_POINTER_WORDS;
                }
            }
        }

        debug_assert_eq!(cursor, needed);
        Ok(cursor)
    }

    /// Decodes a command buffer, borrowing every section from `words`.
    ///
    /// Descriptor values are unpacked lazily through the
    /// [`ParsedMessage`] accessors; decode itself only splits the buffer
    /// into count-delimited word regions.
    pub fn decode<'a>(&self, words: &'a [u32]) -> Result<ParsedMessage<'a>, DecodeError> {
        let mut offset = 0;

        let header_words = take(words, &mut offset, HEADER_WORDS)?;
        let header = Header::decode([header_words[0], header_words[1]]);

        let mut special = None;
        let mut pid = None;
        let mut copy_handles: &[RawHandle] = &[];
        let mut move_handles: &[RawHandle] = &[];
        if header.has_special_header {
            let word = take(words, &mut offset, 1)?[0];
            let sh = SpecialHeader::decode(word, self.padding_policy)?;
            if sh.send_pid {
                let pid_words = take(words, &mut offset, PID_WORDS)?;
                pid = Some((pid_words[0] as u64) | ((pid_words[1] as u64) << 32));
            }
            copy_handles = take(words, &mut offset, sh.num_copy_handles as usize)?;
            move_handles = take(words, &mut offset, sh.num_move_handles as usize)?;
            special = Some(sh);
        }

        let in_pointer_words = take(
            words,
            &mut offset,
            header.num_in_pointers as usize * IN_POINTER_WORDS,
        )?;
        let in_map_alias_words = take(
            words,
            &mut offset,
            header.num_in_map_aliases as usize * MAP_ALIAS_WORDS,
        )?;
        let out_map_alias_words = take(
            words,
            &mut offset,
            header.num_out_map_aliases as usize * MAP_ALIAS_WORDS,
        )?;
        let inout_map_alias_words = take(
            words,
            &mut offset,
            header.num_inout_map_aliases as usize * MAP_ALIAS_WORDS,
        )?;

        let data_words = if matches!(header.out_pointer_mode, OutPointerMode::None) {
            take(words, &mut offset, header.num_data_words as usize)?
        } else {
            let pre = (DATA_ALIGN_WORDS - offset % DATA_ALIGN_WORDS) % DATA_ALIGN_WORDS;
            take(words, &mut offset, pre)?;
            let data = take(words, &mut offset, header.num_data_words as usize)?;
            take(words, &mut offset, DATA_ALIGN_WORDS - pre)?;
            data
        };

        let out_pointer_words = take(
            words,
            &mut offset,
            header.out_pointer_mode.trailing_entries() * OUT_POINTER_WORDS,
        )?;

        Ok(ParsedMessage {
            revision: self.revision,
            header,
            special,
            pid,
            copy_handles,
            move_handles,
            in_pointer_words,
            in_map_alias_words,
            out_map_alias_words,
            inout_map_alias_words,
            data_words,
            out_pointer_words,
        })
    }
}

/// Splits off the next `count` words, failing instead of reading past the end.
fn take<'a>(words: &'a [u32], offset: &mut usize, count: usize) -> Result<&'a [u32], DecodeError> {
    let available = words.len() - *offset;
    if available < count {
        return Err(DecodeError::BufferTooSmall {
            needed: count,
            available,
        });
    }
    let section = &words[*offset..*offset + count];
    *offset += count;
    Ok(section)
}

/// A decoded message borrowing every section from the input buffer.
///
/// Descriptor accessors unpack on access; the word regions themselves are
/// zero-copy slices of the decoded buffer.
#[derive(Debug, Clone, Copy)]
pub struct ParsedMessage<'a> {
    revision: Revision,
    /// The decoded header.
    pub header: Header,
    /// The decoded special header, if the header flag was set.
    pub special: Option<SpecialHeader>,
    /// The pid value, if the special header carried one.
    pub pid: Option<u64>,
    /// Copy handles received.
    pub copy_handles: &'a [RawHandle],
    /// Move handles received.
    pub move_handles: &'a [RawHandle],
    in_pointer_words: &'a [u32],
    in_map_alias_words: &'a [u32],
    out_map_alias_words: &'a [u32],
    inout_map_alias_words: &'a [u32],
    /// Raw data words.
    pub data_words: &'a [u32],
    out_pointer_words: &'a [u32],
}

impl<'a> ParsedMessage<'a> {
    /// Section counts under the codec's revision vocabulary.
    pub fn counts(&self) -> SectionCounts {
        self.header.counts(self.revision)
    }

    /// The receive-list mode declared by the header.
    pub fn out_pointer_mode(&self) -> OutPointerMode {
        self.header.out_pointer_mode
    }

    /// Number of in-pointer descriptors.
    pub fn num_in_pointers(&self) -> usize {
        self.in_pointer_words.len() / IN_POINTER_WORDS
    }

    /// Unpacks the in-pointer descriptor at `index`.
    pub fn in_pointer(&self, index: usize) -> Option<InPointerDescriptor> {
        let start = index * IN_POINTER_WORDS;
        let words = self.in_pointer_words.get(start..start + IN_POINTER_WORDS)?;
        Some(InPointerDescriptor::decode([words[0], words[1]]))
    }

    /// Unpacks the in-pointer descriptors in wire order.
    pub fn in_pointers(&self) -> impl Iterator<Item = InPointerDescriptor> + use<'a> {
        self.in_pointer_words
            .chunks_exact(IN_POINTER_WORDS)
            .map(|w| InPointerDescriptor::decode([w[0], w[1]]))
    }

    /// Unpacks the in map-alias descriptors in wire order.
    pub fn in_map_aliases(&self) -> impl Iterator<Item = MapAliasDescriptor> + use<'a> {
        map_aliases(self.in_map_alias_words)
    }

    /// Unpacks the out map-alias descriptors in wire order.
    pub fn out_map_aliases(&self) -> impl Iterator<Item = MapAliasDescriptor> + use<'a> {
        map_aliases(self.out_map_alias_words)
    }

    /// Unpacks the inout map-alias descriptors in wire order.
    pub fn inout_map_aliases(&self) -> impl Iterator<Item = MapAliasDescriptor> + use<'a> {
        map_aliases(self.inout_map_alias_words)
    }

    /// Number of trailing out-pointer entries.
    pub fn num_out_pointers(&self) -> usize {
        self.out_pointer_words.len() / OUT_POINTER_WORDS
    }

    /// Unpacks the out-pointer entry at `index`.
    pub fn out_pointer(&self, index: usize) -> Option<OutPointerDescriptor> {
        let start = index * OUT_POINTER_WORDS;
        let words = self
            .out_pointer_words
            .get(start..start + OUT_POINTER_WORDS)?;
        Some(OutPointerDescriptor::decode([words[0], words[1]]))
    }

    /// Unpacks the trailing out-pointer entries in wire order.
    pub fn out_pointers(&self) -> impl Iterator<Item = OutPointerDescriptor> + use<'a> {
        self.out_pointer_words
            .chunks_exact(OUT_POINTER_WORDS)
            .map(|w| OutPointerDescriptor::decode([w[0], w[1]]))
    }
}

fn map_aliases<'a>(words: &'a [u32]) -> impl Iterator<Item = MapAliasDescriptor> + use<'a> {
    words
        .chunks_exact(MAP_ALIAS_WORDS)
        .map(|w| MapAliasDescriptor::decode([w[0], w[1], w[2]]))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::descriptor::TransferMode;

    const CODEC: MessageCodec = MessageCodec::new(Revision::Two);

    #[test]
    fn test_data_only_message() {
        // type=4, two data words, no special header, zero descriptors.
        let msg = Message {
            message_type: MessageType::from_raw(4),
            data_words: &[0xAAAA_AAAA, 0xBBBB_BBBB],
            ..Default::default()
        };

        let mut buf = [0u32; 8];
        let written = CODEC.encode(&msg, &mut buf).unwrap();
        assert_eq!(written, 4);
        assert_eq!(&buf[..4], &[0x4, 0x2, 0xAAAA_AAAA, 0xBBBB_BBBB]);

        let parsed = CODEC.decode(&buf[..4]).unwrap();
        assert_eq!(parsed.header.message_type, MessageType::from_raw(4));
        assert_eq!(parsed.data_words, &[0xAAAA_AAAA, 0xBBBB_BBBB]);
        assert!(parsed.special.is_none());
        assert!(parsed.pid.is_none());
    }

    #[test]
    fn test_section_order_round_trip() {
        let in_ptr = InPointerDescriptor {
            index: 1,
            address: 0x1000,
            size: 32,
        };
        let in_alias = MapAliasDescriptor {
            address: 0x2000,
            size: 0x100,
            mode: TransferMode::from_raw(0),
        };
        let out_alias = MapAliasDescriptor {
            address: 0x3000,
            size: 0x200,
            mode: TransferMode::from_raw(1),
        };
        let inout_alias = MapAliasDescriptor {
            address: 0x4000,
            size: 0x300,
            mode: TransferMode::from_raw(3),
        };
        let recv = [
            OutPointerDescriptor {
                address: 0x5000,
                size: 64,
            },
            OutPointerDescriptor {
                address: 0x6000,
                size: 128,
            },
        ];

        let msg = Message {
            message_type: MessageType::from_raw(6),
            in_pointers: &[in_ptr],
            in_map_aliases: &[in_alias],
            out_map_aliases: &[out_alias],
            inout_map_aliases: &[inout_alias],
            data_words: &[0xDEAD_BEEF],
            out_pointers: OutPointers::Multi(&recv),
            ..Default::default()
        };

        let mut buf = [0u32; 32];
        let written = CODEC.encode(&msg, &mut buf).unwrap();
        let parsed = CODEC.decode(&buf[..written]).unwrap();

        // In-pointer words start right after the two header words.
        assert_eq!(parsed.in_pointer(0), Some(in_ptr));
        assert_eq!(InPointerDescriptor::decode([buf[2], buf[3]]), in_ptr);

        // Map-alias groups come back in their written sub-order.
        assert_eq!(parsed.in_map_aliases().next(), Some(in_alias));
        assert_eq!(parsed.out_map_aliases().next(), Some(out_alias));
        assert_eq!(parsed.inout_map_aliases().next(), Some(inout_alias));

        assert_eq!(parsed.data_words, &[0xDEAD_BEEF]);
        assert_eq!(parsed.num_out_pointers(), 2);
        assert_eq!(parsed.out_pointer(0), Some(recv[0]));
        assert_eq!(parsed.out_pointer(1), Some(recv[1]));
        assert_eq!(parsed.out_pointer_mode(), OutPointerMode::Multi(2));
    }

    #[test]
    fn test_data_alignment() {
        // Header ends at word 2; with a receive-list mode set the data
        // section moves to the next 4-word boundary, and pre + trailing
        // padding total exactly 4 words.
        let entry = OutPointerDescriptor {
            address: 0x9000,
            size: 16,
        };
        let msg = Message {
            data_words: &[0x11, 0x22, 0x33],
            out_pointers: OutPointers::Single(entry),
            ..Default::default()
        };

        assert_eq!(msg.encoded_words(), 2 + 4 + 3 + 2);

        let mut buf = [0xFFFF_FFFFu32; 16];
        let written = CODEC.encode(&msg, &mut buf).unwrap();
        assert_eq!(written, 11);
        assert_eq!(&buf[2..4], &[0, 0]); // pre-padding
        assert_eq!(&buf[4..7], &[0x11, 0x22, 0x33]);
        assert_eq!(&buf[7..9], &[0, 0]); // trailing padding
        assert_eq!(OutPointerDescriptor::decode([buf[9], buf[10]]), entry);

        let parsed = CODEC.decode(&buf[..written]).unwrap();
        assert_eq!(parsed.data_words, &[0x11, 0x22, 0x33]);
        assert_eq!(parsed.out_pointer(0), Some(entry));
        assert_eq!(parsed.out_pointer_mode(), OutPointerMode::Single);
    }

    #[test]
    fn test_special_header_handles() {
        let msg = Message {
            copy_handles: &[0xCAFE, 0xF00D],
            move_handles: &[0xBEEF],
            ..Default::default()
        };

        let mut buf = [0u32; 8];
        let written = CODEC.encode(&msg, &mut buf).unwrap();
        assert_eq!(written, 2 + 1 + 3);

        let parsed = CODEC.decode(&buf[..written]).unwrap();
        assert_eq!(parsed.copy_handles, &[0xCAFE, 0xF00D]);
        assert_eq!(parsed.move_handles, &[0xBEEF]);
        assert!(parsed.pid.is_none());
    }

    #[test]
    fn test_pid_carriage() {
        let msg = Message {
            send_pid: true,
            ..Default::default()
        };

        let mut buf = [0xFFFF_FFFFu32; 8];
        let written = CODEC.encode(&msg, &mut buf).unwrap();
        assert_eq!(written, 2 + 1 + 2);
        // The placeholder is written as zero.
        assert_eq!(&buf[3..5], &[0, 0]);

        // Simulate the kernel filling in the pid before decode.
        buf[3] = 0x90AB_CDEF;
        buf[4] = 0x1234_5678;
        let parsed = CODEC.decode(&buf[..written]).unwrap();
        assert_eq!(parsed.pid, Some(0x1234_5678_90AB_CDEF));
    }

    #[test]
    fn test_special_header_padding_policy() {
        let msg = Message {
            copy_handles: &[0xCAFE],
            ..Default::default()
        };
        let mut buf = [0u32; 8];
        let written = CODEC.encode(&msg, &mut buf).unwrap();

        // Corrupt the reserved special-header padding bits.
        buf[2] |= 0x55 << 9;
        assert!(matches!(
            CODEC.decode(&buf[..written]),
            Err(DecodeError::MalformedSpecialHeader { padding: 0x55 })
        ));

        let tolerant = MessageCodec::new(Revision::Two).with_padding_policy(PaddingPolicy::Tolerate);
        let parsed = tolerant.decode(&buf[..written]).unwrap();
        assert_eq!(parsed.copy_handles, &[0xCAFE]);
    }

    #[test]
    fn test_revision_transparency() {
        let msg = Message {
            in_pointers: &[InPointerDescriptor::default(); 2],
            in_map_aliases: &[MapAliasDescriptor::default(); 3],
            out_map_aliases: &[MapAliasDescriptor::default(); 1],
            ..Default::default()
        };

        let mut buf = [0u32; 32];
        let written = MessageCodec::new(Revision::One).encode(&msg, &mut buf).unwrap();

        let one = MessageCodec::new(Revision::One)
            .decode(&buf[..written])
            .unwrap()
            .counts()
            .into_revision_one()
            .unwrap();
        let two = MessageCodec::new(Revision::Two)
            .decode(&buf[..written])
            .unwrap()
            .counts()
            .into_revision_two()
            .unwrap();

        assert_eq!(one.num_send_statics, two.num_in_pointers);
        assert_eq!(one.num_send_buffers, two.num_in_map_aliases);
        assert_eq!(one.num_recv_buffers, two.num_out_map_aliases);
        assert_eq!(one.num_exch_buffers, two.num_inout_map_aliases);
        assert_eq!(one.recv_static_mode, two.out_pointer_mode);
        assert_eq!(two.num_in_pointers, 2);
        assert_eq!(two.num_in_map_aliases, 3);
        assert_eq!(two.num_out_map_aliases, 1);
    }

    #[test]
    fn test_count_overflow_rejected() {
        let msg = Message {
            in_pointers: &[InPointerDescriptor::default(); 16],
            ..Default::default()
        };
        let mut buf = [0u32; 64];
        assert!(matches!(
            CODEC.encode(&msg, &mut buf),
            Err(EncodeError::FieldOverflow {
                field: "num_in_pointers",
                ..
            })
        ));
    }

    #[test]
    fn test_multi_out_pointers_overflow() {
        let entries = [OutPointerDescriptor::default(); 14];
        let msg = Message {
            out_pointers: OutPointers::Multi(&entries),
            ..Default::default()
        };
        let mut buf = [0u32; 64];
        assert!(matches!(
            CODEC.encode(&msg, &mut buf),
            Err(EncodeError::FieldOverflow {
                field: "num_out_pointers",
                ..
            })
        ));
    }

    #[test]
    fn test_empty_multi_encodes_as_no_recv_list() {
        // Zero trailing entries have no Multi nibble encoding (raw 2 would
        // read back as Single and demand an entry that was never written),
        // so an empty slice must encode as mode None and stay decodable.
        let msg = Message {
            data_words: &[0x77, 0x88],
            out_pointers: OutPointers::Multi(&[]),
            ..Default::default()
        };

        assert_eq!(msg.encoded_words(), 4);
        let mut buf = [0u32; 8];
        let written = CODEC.encode(&msg, &mut buf).unwrap();
        assert_eq!(written, 4);

        let parsed = CODEC.decode(&buf[..written]).unwrap();
        assert_eq!(parsed.out_pointer_mode(), OutPointerMode::None);
        assert_eq!(parsed.num_out_pointers(), 0);
        assert_eq!(parsed.data_words, &[0x77, 0x88]);
    }

    #[test]
    fn test_encode_buffer_too_small() {
        let msg = Message {
            data_words: &[1, 2, 3, 4],
            ..Default::default()
        };
        let mut buf = [0u32; 5];
        assert_eq!(
            CODEC.encode(&msg, &mut buf),
            Err(EncodeError::BufferTooSmall {
                needed: 6,
                capacity: 5,
            })
        );
    }

    #[test]
    fn test_decode_truncated_buffer() {
        let msg = Message {
            data_words: &[1, 2, 3, 4],
            ..Default::default()
        };
        let mut buf = [0u32; 8];
        let written = CODEC.encode(&msg, &mut buf).unwrap();

        // Dropping the last word leaves fewer data words than the header
        // declares.
        assert!(matches!(
            CODEC.decode(&buf[..written - 1]),
            Err(DecodeError::BufferTooSmall { .. })
        ));
        // A lone header word is not even a complete header.
        assert!(matches!(
            CODEC.decode(&buf[..1]),
            Err(DecodeError::BufferTooSmall { .. })
        ));
    }
}
