//! Revision 1 ↔ Revision 2 header field renaming.
//!
//! The two protocol revisions share one physical bit layout; only the
//! semantic names of the four section-count fields and the mode nibble
//! differ:
//!
//! | Revision 1         | Revision 2             |
//! |--------------------|------------------------|
//! | `num_send_statics` | `num_in_pointers`      |
//! | `num_send_buffers` | `num_in_map_aliases`   |
//! | `num_recv_buffers` | `num_out_map_aliases`  |
//! | `num_exch_buffers` | `num_inout_map_aliases`|
//! | `recv_static_mode` | `out_pointer_mode`     |
//!
//! The adapter renames field meaning for the caller's API and nothing else:
//! bit offsets, widths, and section order are revision-independent. The
//! canonical [`Header`] stores the Revision 2 names; Revision 1 callers go
//! through [`SectionCounts`].

use crate::header::{Header, OutPointerMode};

/// Protocol revision tag, selected once per codec instance.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Revision {
    /// Revision 1 (send/recv/exch buffer vocabulary).
    One,
    /// Revision 2 (pointer/map-alias vocabulary).
    Two,
}

/// The five renamed header fields under the Revision 1 vocabulary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct RevisionOneCounts {
    /// Number of send-static descriptors.
    pub num_send_statics: u8,
    /// Number of send-buffer descriptors.
    pub num_send_buffers: u8,
    /// Number of recv-buffer descriptors.
    pub num_recv_buffers: u8,
    /// Number of exch-buffer descriptors.
    pub num_exch_buffers: u8,
    /// Raw recv-static mode nibble.
    pub recv_static_mode: u8,
}

/// The five renamed header fields under the Revision 2 vocabulary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct RevisionTwoCounts {
    /// Number of in-pointer descriptors.
    pub num_in_pointers: u8,
    /// Number of in map-alias descriptors.
    pub num_in_map_aliases: u8,
    /// Number of out map-alias descriptors.
    pub num_out_map_aliases: u8,
    /// Number of inout map-alias descriptors.
    pub num_inout_map_aliases: u8,
    /// Raw out-pointer mode nibble.
    pub out_pointer_mode: u8,
}

/// Revision-tagged view of the header's section counts.
///
/// Both variants carry the same five numeric values; the tag records which
/// naming scheme the caller asked for. Converting to the other view is
/// adapter misuse and fails with [`RevisionMismatch`] (a logical error;
/// the bit layout itself is revision-independent).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SectionCounts {
    /// Counts under the Revision 1 names.
    One(RevisionOneCounts),
    /// Counts under the Revision 2 names.
    Two(RevisionTwoCounts),
}

impl SectionCounts {
    /// Returns the revision this view is tagged with.
    #[inline]
    pub const fn revision(&self) -> Revision {
        match self {
            Self::One(_) => Revision::One,
            Self::Two(_) => Revision::Two,
        }
    }

    /// Unwraps the Revision 1 view.
    pub fn into_revision_one(self) -> Result<RevisionOneCounts, RevisionMismatch> {
        match self {
            Self::One(counts) => Ok(counts),
            Self::Two(_) => Err(RevisionMismatch {
                expected: Revision::One,
                found: Revision::Two,
            }),
        }
    }

    /// Unwraps the Revision 2 view.
    pub fn into_revision_two(self) -> Result<RevisionTwoCounts, RevisionMismatch> {
        match self {
            Self::Two(counts) => Ok(counts),
            Self::One(_) => Err(RevisionMismatch {
                expected: Revision::Two,
                found: Revision::One,
            }),
        }
    }
}

/// Adapter misuse: section counts unwrapped under the wrong revision tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("section counts tagged {found:?}, expected {expected:?}")]
pub struct RevisionMismatch {
    /// Revision the caller asked for.
    pub expected: Revision,
    /// Revision the counts were tagged with.
    pub found: Revision,
}

impl Header {
    /// Returns the section counts under the given revision's names.
    pub fn counts(&self, revision: Revision) -> SectionCounts {
        match revision {
            Revision::One => SectionCounts::One(RevisionOneCounts {
                num_send_statics: self.num_in_pointers,
                num_send_buffers: self.num_in_map_aliases,
                num_recv_buffers: self.num_out_map_aliases,
                num_exch_buffers: self.num_inout_map_aliases,
                recv_static_mode: self.out_pointer_mode.to_raw() as u8,
            }),
            Revision::Two => SectionCounts::Two(RevisionTwoCounts {
                num_in_pointers: self.num_in_pointers,
                num_in_map_aliases: self.num_in_map_aliases,
                num_out_map_aliases: self.num_out_map_aliases,
                num_inout_map_aliases: self.num_inout_map_aliases,
                out_pointer_mode: self.out_pointer_mode.to_raw() as u8,
            }),
        }
    }

    /// Writes the section counts back, whichever view they are tagged with.
    ///
    /// Renaming is lossless in both directions, so this never fails.
    pub fn set_counts(&mut self, counts: SectionCounts) {
        match counts {
            SectionCounts::One(c) => {
                self.num_in_pointers = c.num_send_statics;
                self.num_in_map_aliases = c.num_send_buffers;
                self.num_out_map_aliases = c.num_recv_buffers;
                self.num_inout_map_aliases = c.num_exch_buffers;
                self.out_pointer_mode = OutPointerMode::from_raw(c.recv_static_mode);
            }
            SectionCounts::Two(c) => {
                self.num_in_pointers = c.num_in_pointers;
                self.num_in_map_aliases = c.num_in_map_aliases;
                self.num_out_map_aliases = c.num_out_map_aliases;
                self.num_inout_map_aliases = c.num_inout_map_aliases;
                self.out_pointer_mode = OutPointerMode::from_raw(c.out_pointer_mode);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_header() -> Header {
        Header {
            num_in_pointers: 1,
            num_in_map_aliases: 2,
            num_out_map_aliases: 3,
            num_inout_map_aliases: 4,
            out_pointer_mode: OutPointerMode::Multi(5),
            ..Default::default()
        }
    }

    #[test]
    fn test_counts_renaming() {
        let header = sample_header();

        let one = header.counts(Revision::One).into_revision_one().unwrap();
        assert_eq!(one.num_send_statics, 1);
        assert_eq!(one.num_send_buffers, 2);
        assert_eq!(one.num_recv_buffers, 3);
        assert_eq!(one.num_exch_buffers, 4);
        assert_eq!(one.recv_static_mode, 7);

        let two = header.counts(Revision::Two).into_revision_two().unwrap();
        assert_eq!(two.num_in_pointers, 1);
        assert_eq!(two.num_in_map_aliases, 2);
        assert_eq!(two.num_out_map_aliases, 3);
        assert_eq!(two.num_inout_map_aliases, 4);
        assert_eq!(two.out_pointer_mode, 7);
    }

    #[test]
    fn test_set_counts_round_trip() {
        let header = sample_header();

        let mut rebuilt = Header::default();
        rebuilt.set_counts(header.counts(Revision::One));
        assert_eq!(rebuilt, sample_header());

        let mut rebuilt = Header::default();
        rebuilt.set_counts(header.counts(Revision::Two));
        assert_eq!(rebuilt, sample_header());
    }

    #[test]
    fn test_revision_mismatch() {
        let header = sample_header();

        assert_eq!(
            header.counts(Revision::One).into_revision_two(),
            Err(RevisionMismatch {
                expected: Revision::Two,
                found: Revision::One,
            })
        );
        assert_eq!(
            header.counts(Revision::Two).into_revision_one(),
            Err(RevisionMismatch {
                expected: Revision::One,
                found: Revision::Two,
            })
        );
    }
}
