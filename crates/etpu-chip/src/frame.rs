//! Reference frame protocol for the 3×3 array.
//!
//! One frame is a fixed sequence of bus accesses:
//!
//! ```text
//! 1. weight  slots 0..9    9 writes   one element per word, row-major
//! 2. stream  slots 0..5    5 writes   wavefront words, tags 0,0,1,2,3
//! 3. readout slots 5..30  25 reads    pacing drain, values unused
//! 4. stream  slot  4       1 write    terminal tag 4 (end of frame)
//! ```
//!
//! The accelerator is free-running: there is no start command and no
//! status register. The 25-read drain is the only synchronisation.

/// Array dimension of the reference accelerator.
pub const DIMENSION: usize = 3;

/// Weight words written per frame.
pub const WEIGHT_WORDS: usize = DIMENSION * DIMENSION;

/// Stream words written before the drain (one per anti-diagonal).
pub const STREAM_WORDS: usize = 2 * DIMENSION - 1;

/// Stream slot that receives the end-of-frame tag.
pub const TERMINAL_SLOT: usize = STREAM_WORDS - 1;

/// Tag carried by the end-of-frame word.
pub const TERMINAL_TAG: u8 = DIMENSION as u8 + 1;

/// First readout slot polled by the drain.
pub const READOUT_FIRST_SLOT: usize = 5;

/// Readout words polled per frame.
pub const READOUT_WORDS: usize = 25;

/// Fixed matrices of the reference frame.
pub mod reference {
    use super::DIMENSION;

    /// Stationary weight matrix.
    pub const WEIGHTS: [[u8; DIMENSION]; DIMENSION] = [
        [1, 5, 6],
        [4, 8, 7],
        [5, 9, 11],
    ];

    /// Input matrix fed through the stream window.
    pub const INPUT: [[u8; DIMENSION]; DIMENSION] = [
        [1, 5, 12],
        [5, 9, 0],
        [6, 11, 19],
    ];
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::windows::WINDOW_SLOTS;

    #[test]
    fn access_counts_match_protocol() {
        assert_eq!(WEIGHT_WORDS, 9);
        assert_eq!(STREAM_WORDS, 5);
        assert_eq!(READOUT_WORDS, 25);
        assert_eq!(TERMINAL_SLOT, 4);
        assert_eq!(TERMINAL_TAG, 4);
    }

    #[test]
    fn readout_span_fits_window() {
        assert_eq!(READOUT_FIRST_SLOT + READOUT_WORDS, 30);
        assert!(READOUT_FIRST_SLOT + READOUT_WORDS <= WINDOW_SLOTS);
    }
}
