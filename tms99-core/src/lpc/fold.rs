// Symphonia
// Copyright (c) 2019-2022 The Project Symphonia Developers.
//
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Repeat folding and expansion (§4.6).
//!
//! A [`RepeatingWriter`] sits in front of the bitstream writer and collapses a Voiced or
//! Unvoiced frame into a cheaper [`LpcFrame::Repeat`] whenever it shares its reflection
//! coefficients with the most recent non-repeat frame. [`NonRepeatingReader`] is the inverse: it
//! reconstructs the full frame a `Repeat` stands in for. `expand(fold(seq)) == seq`.

use super::frame::LpcFrame;

/// Wraps frame emission, replacing frames that repeat the previous non-repeat frame's
/// coefficients with a cheaper [`LpcFrame::Repeat`].
#[derive(Debug, Default)]
pub struct RepeatingWriter {
    previous: Option<LpcFrame>,
}

impl RepeatingWriter {
    /// Creates a writer with no prior frame history.
    pub fn new() -> Self {
        RepeatingWriter { previous: None }
    }

    /// Folds one frame against the writer's history, returning the frame that should actually be
    /// emitted to the bitstream (either `frame` unchanged, or a `Repeat` standing in for it).
    pub fn fold(&mut self, frame: LpcFrame) -> LpcFrame {
        let folded = match (&self.previous, &frame) {
            (Some(LpcFrame::Voiced { k: pk, .. }), LpcFrame::Voiced { energy, pitch, k })
                if pk == k =>
            {
                Some(LpcFrame::Repeat { energy: *energy, pitch: *pitch })
            }
            (Some(LpcFrame::Unvoiced { k: pk, .. }), LpcFrame::Unvoiced { energy, k })
                if pk == k =>
            {
                Some(LpcFrame::Repeat { energy: *energy, pitch: 0 })
            }
            _ => None,
        };

        // Silence and Stop frames don't update the repeat history: a Repeat must still be able
        // to reach back through them to the last Voiced/Unvoiced frame's coefficients.
        if matches!(frame, LpcFrame::Voiced { .. } | LpcFrame::Unvoiced { .. }) {
            self.previous = Some(frame.clone());
        }

        folded.unwrap_or(frame)
    }

    /// Folds an entire sequence, returning the sequence that should be written to the bitstream.
    pub fn fold_all(frames: impl IntoIterator<Item = LpcFrame>) -> Vec<LpcFrame> {
        let mut writer = RepeatingWriter::new();
        frames.into_iter().map(|f| writer.fold(f)).collect()
    }
}

/// Wraps frame consumption, expanding a [`LpcFrame::Repeat`] back into the full Voiced or
/// Unvoiced frame it stands in for.
#[derive(Debug, Default)]
pub struct NonRepeatingReader {
    previous: Option<LpcFrame>,
}

impl NonRepeatingReader {
    /// Creates a reader with no prior frame history.
    pub fn new() -> Self {
        NonRepeatingReader { previous: None }
    }

    /// Expands one frame read from the bitstream against the reader's history.
    ///
    /// Returns `None` if a `Repeat` is seen before any Voiced/Unvoiced frame has established
    /// history; this indicates a malformed stream.
    pub fn expand(&mut self, frame: LpcFrame) -> Option<LpcFrame> {
        let expanded = match (&frame, &self.previous) {
            (LpcFrame::Repeat { energy, pitch }, Some(LpcFrame::Voiced { k, .. })) => {
                LpcFrame::Voiced { energy: *energy, pitch: *pitch, k: *k }
            }
            (LpcFrame::Repeat { energy, .. }, Some(LpcFrame::Unvoiced { k, .. })) => {
                LpcFrame::Unvoiced { energy: *energy, k: *k }
            }
            (LpcFrame::Repeat { .. }, _) => return None,
            _ => frame,
        };

        if matches!(expanded, LpcFrame::Voiced { .. } | LpcFrame::Unvoiced { .. }) {
            self.previous = Some(expanded.clone());
        }

        Some(expanded)
    }

    /// Expands an entire sequence read from the bitstream back to its original form.
    pub fn expand_all(frames: impl IntoIterator<Item = LpcFrame>) -> Vec<LpcFrame> {
        let mut reader = NonRepeatingReader::new();
        frames.into_iter().filter_map(|f| reader.expand(f)).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn verify_repeat_folds_identical_coefficients() {
        let a = LpcFrame::Voiced { energy: 5, pitch: 10, k: [1; 10] };
        let b = LpcFrame::Voiced { energy: 6, pitch: 11, k: [1; 10] };

        let folded = RepeatingWriter::fold_all([a.clone(), b]);
        assert_eq!(folded[0], a);
        assert_eq!(folded[1], LpcFrame::Repeat { energy: 6, pitch: 11 });
    }

    #[test]
    fn verify_different_coefficients_do_not_fold() {
        let a = LpcFrame::Voiced { energy: 5, pitch: 10, k: [1; 10] };
        let b = LpcFrame::Voiced { energy: 6, pitch: 11, k: [2; 10] };

        let folded = RepeatingWriter::fold_all([a.clone(), b.clone()]);
        assert_eq!(folded, vec![a, b]);
    }

    #[test]
    fn verify_fold_then_expand_round_trips() {
        let seq = vec![
            LpcFrame::Voiced { energy: 5, pitch: 10, k: [1; 10] },
            LpcFrame::Voiced { energy: 6, pitch: 11, k: [1; 10] },
            LpcFrame::Silence,
            LpcFrame::Voiced { energy: 7, pitch: 12, k: [1; 10] },
            LpcFrame::Unvoiced { energy: 2, k: [3; 4] },
            LpcFrame::Unvoiced { energy: 1, k: [3; 4] },
        ];

        let folded = RepeatingWriter::fold_all(seq.clone());
        assert_eq!(folded[1], LpcFrame::Repeat { energy: 6, pitch: 11 });
        // Silence doesn't overwrite history, so the repeat after it still folds.
        assert_eq!(folded[3], LpcFrame::Repeat { energy: 7, pitch: 12 });
        assert_eq!(folded[5], LpcFrame::Repeat { energy: 1, pitch: 0 });

        let expanded = NonRepeatingReader::expand_all(folded);
        assert_eq!(expanded, seq);
    }
}
