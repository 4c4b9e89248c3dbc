//! The three descriptor kinds and their bit-split address encodings.
//!
//! 64-bit addresses (and the map-alias 36-bit size) do not fit a single
//! word, so each kind splits them across non-contiguous bit ranges:
//!
//! ```text
//! In-pointer (2 words, 42-bit address):
//!   word1: [0,6) index · [6,12) address[36:41] · [12,16) address[32:35]
//!          · [16,32) size
//!   word2: address[0:31]
//!
//! Map-alias (3 words, 58-bit address, 36-bit size):
//!   word1: size[0:31]
//!   word2: address[0:31]
//!   word3: [0,2) mode · [2,24) address[36:57] · [24,28) size[32:35]
//!          · [28,32) address[32:35]
//!
//! Out-pointer / recv-list entry (2 words, 48-bit address):
//!   word1: address[0:31]
//!   word2: [0,16) address[32:47] · [16,32) size
//! ```
//!
//! Splitting and joining are exact inverses for any value within the
//! representable width; encode rejects anything wider.

use static_assertions::const_assert_eq;

use crate::error::{EncodeError, check_width};

/// Words occupied by an [`InPointerDescriptor`].
pub const IN_POINTER_WORDS: usize = 2;

/// Words occupied by a [`MapAliasDescriptor`].
pub const MAP_ALIAS_WORDS: usize = 3;

/// Words occupied by an [`OutPointerDescriptor`].
pub const OUT_POINTER_WORDS: usize = 2;

// In-pointer word 1.
const IN_PTR_INDEX_MASK: u32 = 0x3F;
const IN_PTR_ADDR_HIGH_MASK: u32 = 0x3F;
const IN_PTR_ADDR_HIGH_SHIFT: u32 = 6;
const IN_PTR_ADDR_MID_MASK: u32 = 0xF;
const IN_PTR_ADDR_MID_SHIFT: u32 = 12;
const IN_PTR_SIZE_SHIFT: u32 = 16;
const IN_PTR_SIZE_MASK: u32 = 0xFFFF;

// Map-alias word 3.
const MAP_MODE_MASK: u32 = 0x3;
const MAP_ADDR_HIGH_MASK: u32 = 0x3F_FFFF;
const MAP_ADDR_HIGH_SHIFT: u32 = 2;
const MAP_SIZE_HIGH_MASK: u32 = 0xF;
const MAP_SIZE_HIGH_SHIFT: u32 = 24;
const MAP_ADDR_MID_MASK: u32 = 0xF;
const MAP_ADDR_MID_SHIFT: u32 = 28;

// Out-pointer word 2.
const OUT_PTR_ADDR_HIGH_MASK: u32 = 0xFFFF;
const OUT_PTR_SIZE_SHIFT: u32 = 16;
const OUT_PTR_SIZE_MASK: u32 = 0xFFFF;

// Mid/high splices sit above the 32-bit low word in the joined value.
const ADDR_MID_JOIN_SHIFT: u32 = 32;
const ADDR_HIGH_JOIN_SHIFT: u32 = 36;
const SIZE_HIGH_JOIN_SHIFT: u32 = 32;
const OUT_PTR_ADDR_HIGH_JOIN_SHIFT: u32 = 32;

// Each word-3 field group tiles the word exactly.
const_assert_eq!(MAP_ADDR_MID_SHIFT + 4, 32);
const_assert_eq!(IN_PTR_SIZE_SHIFT + 16, 32);

/// Opaque 2-bit transfer-mode tag carried by map-alias descriptors.
///
/// The concrete meanings of the four values are defined by the host OS; the
/// codec passes the tag through unmodified. Encoding a raw tag above 3 fails
/// with [`EncodeError::FieldOverflow`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[repr(transparent)]
pub struct TransferMode(u8);

impl TransferMode {
    /// Creates a transfer mode from a raw tag value.
    #[inline]
    pub const fn from_raw(value: u8) -> Self {
        Self(value)
    }

    /// Returns the raw tag value.
    #[inline]
    pub const fn to_raw(self) -> u8 {
        self.0
    }
}

/// In-pointer (send static) descriptor.
///
/// Describes a small send-only buffer transferred by reference; the 6-bit
/// index matches send/receive pairs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct InPointerDescriptor {
    /// Index for matching send/receive pairs (6 bits).
    pub index: u8,
    /// Buffer address (42 bits).
    pub address: u64,
    /// Buffer size in bytes (16 bits, max 64 KB).
    pub size: u16,
}

impl InPointerDescriptor {
    /// Largest address the 6+4+32-bit split can carry.
    pub const MAX_ADDRESS: u64 = (1 << 42) - 1;

    /// Packs the descriptor into its two words.
    pub fn encode(&self) -> Result<[u32; IN_POINTER_WORDS], EncodeError> {
        check_width("index", self.index as u64, IN_PTR_INDEX_MASK as u64)?;
        if self.address > Self::MAX_ADDRESS {
            return Err(EncodeError::AddressOutOfRange {
                address: self.address,
                max: Self::MAX_ADDRESS,
            });
        }

        let address_high = ((self.address >> ADDR_HIGH_JOIN_SHIFT) as u32) & IN_PTR_ADDR_HIGH_MASK;
        let address_mid = ((self.address >> ADDR_MID_JOIN_SHIFT) as u32) & IN_PTR_ADDR_MID_MASK;
        let word1 = (self.index as u32)
            | (address_high << IN_PTR_ADDR_HIGH_SHIFT)
            | (address_mid << IN_PTR_ADDR_MID_SHIFT)
            | ((self.size as u32) << IN_PTR_SIZE_SHIFT);
        Ok([word1, self.address as u32])
    }

    /// Unpacks the descriptor from its two words.
    pub fn decode(words: [u32; IN_POINTER_WORDS]) -> Self {
        let [word1, word2] = words;
        let address_high = (word1 >> IN_PTR_ADDR_HIGH_SHIFT) & IN_PTR_ADDR_HIGH_MASK;
        let address_mid = (word1 >> IN_PTR_ADDR_MID_SHIFT) & IN_PTR_ADDR_MID_MASK;
        Self {
            index: (word1 & IN_PTR_INDEX_MASK) as u8,
            address: (word2 as u64)
                | ((address_mid as u64) << ADDR_MID_JOIN_SHIFT)
                | ((address_high as u64) << ADDR_HIGH_JOIN_SHIFT),
            size: ((word1 >> IN_PTR_SIZE_SHIFT) & IN_PTR_SIZE_MASK) as u16,
        }
    }
}

/// Map-alias (buffer) descriptor.
///
/// Describes a buffer transferred via memory mapping, with a 58-bit address,
/// a 36-bit size, and the opaque [`TransferMode`] tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct MapAliasDescriptor {
    /// Buffer address (58 bits).
    pub address: u64,
    /// Buffer size in bytes (36 bits, max 64 GB).
    pub size: u64,
    /// Transfer-mode tag (2 bits, passed through unmodified).
    pub mode: TransferMode,
}

impl MapAliasDescriptor {
    /// Largest address the 22+4+32-bit split can carry.
    pub const MAX_ADDRESS: u64 = (1 << 58) - 1;

    /// Largest size the 4+32-bit split can carry.
    pub const MAX_SIZE: u64 = (1 << 36) - 1;

    /// Packs the descriptor into its three words.
    pub fn encode(&self) -> Result<[u32; MAP_ALIAS_WORDS], EncodeError> {
        check_width(
            "transfer_mode",
            self.mode.to_raw() as u64,
            MAP_MODE_MASK as u64,
        )?;
        check_width("size", self.size, Self::MAX_SIZE)?;
        if self.address > Self::MAX_ADDRESS {
            return Err(EncodeError::AddressOutOfRange {
                address: self.address,
                max: Self::MAX_ADDRESS,
            });
        }

        let address_high = ((self.address >> ADDR_HIGH_JOIN_SHIFT) as u32) & MAP_ADDR_HIGH_MASK;
        let address_mid = ((self.address >> ADDR_MID_JOIN_SHIFT) as u32) & MAP_ADDR_MID_MASK;
        let size_high = ((self.size >> SIZE_HIGH_JOIN_SHIFT) as u32) & MAP_SIZE_HIGH_MASK;
        let word3 = (self.mode.to_raw() as u32)
            | (address_high << MAP_ADDR_HIGH_SHIFT)
            | (size_high << MAP_SIZE_HIGH_SHIFT)
            | (address_mid << MAP_ADDR_MID_SHIFT);
        Ok([self.size as u32, self.address as u32, word3])
    }

    /// Unpacks the descriptor from its three words.
    pub fn decode(words: [u32; MAP_ALIAS_WORDS]) -> Self {
        let [word1, word2, word3] = words;
        let address_high = (word3 >> MAP_ADDR_HIGH_SHIFT) & MAP_ADDR_HIGH_MASK;
        let address_mid = (word3 >> MAP_ADDR_MID_SHIFT) & MAP_ADDR_MID_MASK;
        let size_high = (word3 >> MAP_SIZE_HIGH_SHIFT) & MAP_SIZE_HIGH_MASK;
        Self {
            address: (word2 as u64)
                | ((address_mid as u64) << ADDR_MID_JOIN_SHIFT)
                | ((address_high as u64) << ADDR_HIGH_JOIN_SHIFT),
            size: (word1 as u64) | ((size_high as u64) << SIZE_HIGH_JOIN_SHIFT),
            mode: TransferMode::from_raw((word3 & MAP_MODE_MASK) as u8),
        }
    }
}

/// Out-pointer (receive list) entry.
///
/// Describes a receive-side buffer location with a 48-bit address.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct OutPointerDescriptor {
    /// Buffer address (48 bits).
    pub address: u64,
    /// Buffer size in bytes (16 bits, max 64 KB).
    pub size: u16,
}

impl OutPointerDescriptor {
    /// Largest address the 16+32-bit split can carry.
    pub const MAX_ADDRESS: u64 = (1 << 48) - 1;

    /// Packs the entry into its two words.
    pub fn encode(&self) -> Result<[u32; OUT_POINTER_WORDS], EncodeError> {
        if self.address > Self::MAX_ADDRESS {
            return Err(EncodeError::AddressOutOfRange {
                address: self.address,
                max: Self::MAX_ADDRESS,
            });
        }

        let address_high =
            ((self.address >> OUT_PTR_ADDR_HIGH_JOIN_SHIFT) as u32) & OUT_PTR_ADDR_HIGH_MASK;
        let word2 = address_high | ((self.size as u32) << OUT_PTR_SIZE_SHIFT);
        Ok([self.address as u32, word2])
    }

    /// Unpacks the entry from its two words.
    pub fn decode(words: [u32; OUT_POINTER_WORDS]) -> Self {
        let [word1, word2] = words;
        let address_high = word2 & OUT_PTR_ADDR_HIGH_MASK;
        Self {
            address: (word1 as u64) | ((address_high as u64) << OUT_PTR_ADDR_HIGH_JOIN_SHIFT),
            size: ((word2 >> OUT_PTR_SIZE_SHIFT) & OUT_PTR_SIZE_MASK) as u16,
        }
    }
}
