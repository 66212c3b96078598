//! Packed stream word format.
//!
//! ```text
//!  31        24 23        16 15         8 7          0
//! ┌────────────┬────────────┬────────────┬────────────┐
//! │    tag     │   lane 2   │   lane 1   │   lane 0   │
//! └────────────┴────────────┴────────────┴────────────┘
//! ```
//!
//! Lanes carry 8-bit matrix elements, low byte first. The tag byte marks
//! the wavefront step that produced the word; words without a tag leave it
//! zero. Weight words use the same layout with only lane 0 populated.

/// Bit position of the tag byte.
pub const TAG_SHIFT: u32 = 24;

/// Width of one data lane.
pub const LANE_BITS: u32 = 8;

/// Data lanes per word (the tag owns the fourth byte).
pub const MAX_LANES: usize = 3;

/// Mask of the three data lanes.
pub const LANE_MASK: u32 = (1 << TAG_SHIFT) - 1;

/// Assemble a stream word from an optional tag and up to three lanes.
///
/// Missing lanes are zero.
#[must_use]
pub const fn pack_word(tag: u8, lanes: [u8; MAX_LANES]) -> u32 {
    ((tag as u32) << TAG_SHIFT)
        | ((lanes[2] as u32) << (2 * LANE_BITS))
        | ((lanes[1] as u32) << LANE_BITS)
        | lanes[0] as u32
}

/// Tag-only word, as written for the end-of-frame marker.
#[must_use]
pub const fn terminal_word(tag: u8) -> u32 {
    (tag as u32) << TAG_SHIFT
}

/// Tag byte of a word.
#[must_use]
pub const fn tag_of(word: u32) -> u8 {
    (word >> TAG_SHIFT) as u8
}

/// Data lane `lane` of a word.
///
/// # Panics
///
/// Panics if `lane >= MAX_LANES`.
#[must_use]
pub const fn lane_of(word: u32, lane: usize) -> u8 {
    assert!(lane < MAX_LANES, "lane out of range");
    (word >> (lane as u32 * LANE_BITS)) as u8
}

/// Weight words carry one element, zero-extended; the accelerator reads
/// only the low byte.
#[must_use]
pub const fn weight_word(value: u8) -> u32 {
    value as u32
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lanes_fill_low_byte_first() {
        assert_eq!(pack_word(0, [1, 0, 0]), 0x0000_0001);
        assert_eq!(pack_word(0, [5, 5, 0]), 0x0000_0505);
        assert_eq!(pack_word(1, [12, 9, 6]), 0x0106_090C);
    }

    #[test]
    fn terminal_word_has_only_tag() {
        assert_eq!(terminal_word(4), 0x0400_0000);
        assert_eq!(terminal_word(4) & LANE_MASK, 0);
    }

    #[test]
    fn accessors_split_fields() {
        let w = pack_word(3, [0, 0, 19]);
        assert_eq!(w, 0x0313_0000);
        assert_eq!(tag_of(w), 3);
        assert_eq!(lane_of(w, 2), 19);
        assert_eq!(lane_of(w, 0), 0);
    }

    #[test]
    fn weight_word_upper_bits_zero() {
        assert_eq!(weight_word(0xFF), 0xFF);
        assert_eq!(weight_word(11) >> LANE_BITS, 0);
    }
}
