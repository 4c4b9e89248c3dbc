//! HIPC (Horizon Inter-Process Communication) wire-format codec.
//!
//! HIPC is the low-level message serialization protocol for IPC on Horizon OS.
//! This crate implements the *wire format only*: it packs and unpacks the
//! 32-bit words of a command buffer, computing section offsets from the
//! header-declared counts. It performs no I/O, no syscalls, and no allocation;
//! the command buffer is always a caller-owned `[u32]` region.
//!
//! # Protocol Stack
//!
//! ```text
//! ┌─────────────────────────────────────┐
//! │  Service APIs (fs, sm, hid, etc.)   │  Application layer
//! ├─────────────────────────────────────┤
//! │  CMIF or TIPC                       │  Command serialization
//! ├─────────────────────────────────────┤
//! │  HIPC  ← this crate                 │  Message framing & descriptors
//! ├─────────────────────────────────────┤
//! │  Kernel SVCs (SendSyncRequest, etc) │  Transport (not implemented here)
//! └─────────────────────────────────────┘
//! ```
//!
//! # Message Layout
//!
//! Every message follows one fixed section order, identical for encode and
//! decode (all sizes in 32-bit words):
//!
//! ```text
//! Section                              Words
//! ─────────────────────────────────────────────────────────────
//! Header                               2
//! SpecialHeader                        0 or 1
//! ProcessId placeholder                0 or 2 (if send_pid)
//! Copy handles                         1 × num_copy_handles
//! Move handles                         1 × num_move_handles
//! In-pointer descriptors               2 × count
//! Map-alias descriptors (in,out,inout) 3 × count each group
//! Padding to data alignment            mode-dependent
//! Data words                           num_data_words
//! Trailing padding                     mode-dependent
//! Out-pointer (recv-list) entries      2 × count
//! ─────────────────────────────────────────────────────────────
//! ```
//!
//! Decoding is count-driven, not self-delimiting: the header is decoded
//! first and its counts determine every following section's length. A
//! corrupted count misreads everything after it; that is a property of the
//! protocol, not of this implementation.
//!
//! # Protocol Revisions
//!
//! Two revisions of the header exist with *identical* bit layout; only the
//! semantic names of the four section-count fields and the mode nibble
//! differ (e.g. Revision 1 `num_send_statics` is Revision 2
//! `num_in_pointers`). The [`revision`] module maps between the two views;
//! nothing about offsets or section order depends on the revision.
//!
//! # Modules
//!
//! - [`header`]: the two header words, the optional special-header word.
//! - [`descriptor`]: the three descriptor kinds and their bit-split
//!   address/size encodings.
//! - [`message`]: whole-buffer encode/decode ([`message::MessageCodec`]).
//! - [`revision`]: Revision 1 ↔ Revision 2 field renaming.
//! - [`cmif`]: CMIF command headers carried inside the data words.
//! - [`tipc`]: TIPC command-id ↔ message-type mapping.
//!
//! # References
//!
//! - [Switchbrew IPC Marshalling](https://switchbrew.org/wiki/IPC_Marshalling)
//! - libnx `sf/hipc.h` (fincs, SciresM)

#![no_std]

pub mod cmif;
pub mod descriptor;
mod error;
pub mod header;
pub mod message;
pub mod revision;
pub mod tipc;

pub use error::{DecodeError, EncodeError};

/// An opaque 32-bit kernel handle token.
///
/// Handle values are produced and consumed by the kernel's handle table;
/// this codec copies them through without interpretation.
pub type RawHandle = u32;
