// Symphonia
// Copyright (c) 2019-2022 The Project Symphonia Developers.
//
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Reference PCM renderer (§11 supplement): plays an LPC frame sequence through the full,
//! interpolating [`Simulator`] and serializes the result to a WAVE file, the same scoring
//! function the encoder calibrates candidate frames against (§4.5 pass 4-5), exposed standalone
//! so an encoded stream can be auditioned without a cartridge or chip.

use tms99_core::lpc::{ChipVariant, LpcFrame, LpcQuantization, OutputMode, OutputPrecision, Simulator};

use crate::config::FRAME_STEP;
use crate::wav;

/// Plays `frames` through a fresh [`Simulator`] seeded per §8's determinism property, returning
/// the concatenated 16-bit sample stream at full precision.
pub fn render_samples(frames: &[LpcFrame], chip_variant: ChipVariant) -> Vec<i16> {
    let quant = LpcQuantization::new(chip_variant);
    let mut sim = Simulator::new();
    let mut samples = Vec::with_capacity(frames.len() * FRAME_STEP);

    for frame in frames {
        let mut out = [0i16; FRAME_STEP];
        sim.play_frame(&quant, frame, &mut out, OutputMode::Digital, OutputPrecision::Full);
        samples.extend_from_slice(&out);
    }

    samples
}

/// Renders `frames` to a complete 8 kHz 16-bit mono WAVE file.
pub fn render_wav(frames: &[LpcFrame], chip_variant: ChipVariant) -> Vec<u8> {
    wav::write_pcm16_mono_8khz(&render_samples(frames, chip_variant))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn verify_silence_sequence_renders_near_zero() {
        let frames = vec![LpcFrame::Silence; 4];
        let samples = render_samples(&frames, ChipVariant::Tms5200);
        assert_eq!(samples.len(), 4 * FRAME_STEP);
        // The last frame's filter tail should have settled close to zero.
        for &s in &samples[samples.len() - 50..] {
            assert!((-4..=4).contains(&s), "sample {} outside filter-tail bound", s);
        }
    }

    #[test]
    fn verify_render_wav_has_riff_header() {
        let bytes = render_wav(&[LpcFrame::Silence], ChipVariant::Tms5200);
        assert_eq!(&bytes[0..4], b"RIFF");
        assert_eq!(&bytes[8..12], b"WAVE");
    }
}
