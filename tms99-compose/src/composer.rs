// Symphonia
// Copyright (c) 2019-2022 The Project Symphonia Developers.
//
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! The TMS composer's timeline main loop (§4.7): the piece that merges a display stream, a
//! sound stream, and a speech stream onto a single chunk timeline under bank limits, pulling
//! from three independently scheduled, lazily-opened sources and pushing the result to a
//! bank-aware sink.

use log::warn;

use tms99_core::errors::Result;

use crate::chunk::SPEECH_MAX_LEN;
use crate::sink::{TmsSink, DEFAULT_BANK_SIZE};
use crate::sources::{DisplaySource, LpcSpeechSource, SoundSource};

/// The synthesizer's speak-external command byte: enters continuous-feed mode (§3 glossary).
const SPEAK_EXTERNAL: u8 = 0x60;

/// Maximum number of LPC frames concatenated into the priming speech chunk (§4.7 step 1).
const MAX_PRIMER_FRAMES: usize = 10;

/// `f_lpc`, the composer's fixed LPC feed rate. Biased slightly fast (`40.0 + ε`) because the
/// synthesizer stalls gracefully on buffer overflow but enters a dead state on underflow (§4.7).
pub const LPC_FREQUENCY_HZ: f64 = 40.01;

/// Target video system, setting the vsync rate `f_v` the speech pacer is relative to (§4.7, §6).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VideoSystem {
    Ntsc,
    Pal,
}

impl VideoSystem {
    /// Vsync frequency in Hz.
    pub fn hz(self) -> f64 {
        match self {
            VideoSystem::Ntsc => 59.922_738,
            VideoSystem::Pal => 50.158_969,
        }
    }
}

/// Composer-wide tunables (§9 design notes: "a single configuration record").
#[derive(Debug, Clone, Copy)]
pub struct ComposerConfig {
    pub video_system: VideoSystem,
    pub bank_size: usize,
}

impl Default for ComposerConfig {
    fn default() -> Self {
        ComposerConfig { video_system: VideoSystem::Ntsc, bank_size: DEFAULT_BANK_SIZE }
    }
}

/// One `(startFrame, source)` entry of the composer's input schedule (§4.7). A list of these,
/// sorted ascending by `start_frame`, is supplied per source kind.
pub struct Scheduled<T> {
    pub start_frame: u64,
    pub source: T,
}

impl<T> Scheduled<T> {
    pub fn new(start_frame: u64, source: T) -> Self {
        Scheduled { start_frame, source }
    }
}

/// Pacer state: which half of the current display delta is expected next (§4.7's state
/// machine).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum PacerState {
    ExpectingDelta1,
    ExpectingDelta2,
}

/// Runs the composer's timeline main loop (§4.7) to completion, pushing every chunk it produces
/// to `sink` and finishing with `sink.close()`.
///
/// Schedules need not arrive pre-sorted; they are sorted by `start_frame` here for robustness,
/// though callers are expected to hand them over in ascending order already.
pub fn compose<D, S, L>(
    mut display_schedule: Vec<Scheduled<D>>,
    mut sound_schedule: Vec<Scheduled<S>>,
    mut speech_schedule: Vec<Scheduled<L>>,
    config: &ComposerConfig,
    sink: &mut impl TmsSink,
) -> Result<()>
where
    D: DisplaySource,
    S: SoundSource,
    L: LpcSpeechSource,
{
    display_schedule.sort_by_key(|s| s.start_frame);
    sound_schedule.sort_by_key(|s| s.start_frame);
    speech_schedule.sort_by_key(|s| s.start_frame);

    let mut display_schedule: std::collections::VecDeque<_> = display_schedule.into();
    let mut sound_schedule: std::collections::VecDeque<_> = sound_schedule.into();
    let mut speech_schedule: std::collections::VecDeque<_> = speech_schedule.into();

    let mut display: Option<D> = None;
    let mut sound: Option<S> = None;
    let mut speech: Option<L> = None;

    // A frame read during priming that didn't fit in the primer chunk, held for the first
    // regular due slot (§4.7 step 1's byte-budgeted concatenation).
    let mut speech_pending: Option<Vec<u8>> = None;

    let mut vsync: u64 = 0;
    let mut pacer = PacerState::ExpectingDelta1;
    let mut speech_start_vsync: Option<u64> = None;
    let mut speech_suppress_count: i64 = 0;

    let f_v = config.video_system.hz();

    loop {
        // Step 1: open every scheduled source whose startFrame has arrived.
        while display_schedule.front().is_some_and(|s| s.start_frame <= vsync) {
            let entry = display_schedule.pop_front().unwrap();
            if let Some(mut old) = display.take() {
                old.close();
            }
            let mut source = entry.source;
            source.skip_frames((vsync - entry.start_frame) as usize)?;
            display = Some(source);
            pacer = PacerState::ExpectingDelta1;
        }

        while sound_schedule.front().is_some_and(|s| s.start_frame <= vsync) {
            let entry = sound_schedule.pop_front().unwrap();
            if let Some(mut old) = sound.take() {
                old.close();
            }
            let mut source = entry.source;
            source.skip_frames((vsync - entry.start_frame) as usize)?;
            sound = Some(source);
        }

        while speech_schedule.front().is_some_and(|s| s.start_frame <= vsync) {
            let entry = speech_schedule.pop_front().unwrap();
            if let Some(mut old) = speech.take() {
                old.close();
            }
            let mut source = entry.source;

            let (primer, frames_read, pending) = prime_speech(&mut source)?;
            sink.write_speech(&primer)?;

            speech = Some(source);
            speech_pending = pending;
            speech_start_vsync = Some(vsync);
            speech_suppress_count = -2 + frames_read as i64;
        }

        // Step 2: advance the display-delta pacer.
        match pacer {
            PacerState::ExpectingDelta1 => {
                if let Some(d) = display.as_mut() {
                    match d.read_frame()? {
                        Some((addr, bytes)) => {
                            sink.write_display(addr, &bytes)?;
                            pacer = PacerState::ExpectingDelta2;
                        }
                        None => {
                            d.close();
                            display = None;
                        }
                    }
                }
            }
            PacerState::ExpectingDelta2 => {
                if let Some(d) = display.as_mut() {
                    match d.read_frame()? {
                        Some((addr, bytes)) => sink.write_display(addr, &bytes)?,
                        None => {
                            d.close();
                            display = None;
                        }
                    }
                }
                pacer = PacerState::ExpectingDelta1;
            }
        }

        // Step 3: tick the master clock.
        sink.write_vsync()?;
        vsync += 1;

        // Step 4: sound, one frame per vsync.
        if let Some(s) = sound.as_mut() {
            match s.read_frame()? {
                Some(bytes) => sink.write_sound(&bytes)?,
                None => {
                    s.close();
                    sound = None;
                }
            }
        }

        // Step 5: speech, only on a due slot (§4.7's floor-difference test).
        if let Some(start) = speech_start_vsync {
            let due = speech_slot_due(vsync, start, f_v);

            if due {
                if speech_suppress_count > 0 {
                    speech_suppress_count -= 1;
                }
                else if let Some(sp) = speech.as_mut() {
                    let next = match speech_pending.take() {
                        Some(bytes) => Some(bytes),
                        None => sp.read_frame()?,
                    };

                    match next {
                        Some(bytes) => sink.write_speech(&bytes)?,
                        None => {
                            sp.close();
                            speech = None;
                            speech_start_vsync = None;
                        }
                    }
                }
                else {
                    warn!("speech buffer underflow: slot due at vsync {} with no active source", vsync);
                }
            }
        }

        let schedules_exhausted =
            display_schedule.is_empty() && sound_schedule.is_empty() && speech_schedule.is_empty();
        let all_closed = display.is_none() && sound.is_none() && speech.is_none();
        let pacer_idle = pacer == PacerState::ExpectingDelta1;

        if schedules_exhausted && all_closed && pacer_idle {
            break;
        }
    }

    sink.close()
}

/// Whether a speech slot falls on vsync `v` (§4.7 step 5): the floor of the elapsed-LPC-frame
/// count changes between the lookahead windows `v+1` and `v+2` relative to `start`.
fn speech_slot_due(v: u64, start: u64, f_v: f64) -> bool {
    let a = (((v + 1 - start) as f64) / f_v * LPC_FREQUENCY_HZ).floor() as i64;
    let b = (((v + 2 - start) as f64) / f_v * LPC_FREQUENCY_HZ).floor() as i64;
    a != b
}

/// Reads up to [`MAX_PRIMER_FRAMES`] frames from a newly opened speech source, concatenating
/// their bytes behind a [`SPEAK_EXTERNAL`] prefix byte, stopping early if the next frame would
/// overflow the `SPEECH_MAX_LEN` chunk ceiling the primer is emitted as a single chunk under.
/// Returns the primer buffer, the number of frames actually folded into it, and an overflowing
/// frame (if any) held back for the first regular due slot.
fn prime_speech<L: LpcSpeechSource>(speech: &mut L) -> Result<(Vec<u8>, usize, Option<Vec<u8>>)> {
    let mut buf = vec![SPEAK_EXTERNAL];
    let mut frames_read = 0;
    let mut pending = None;

    while frames_read < MAX_PRIMER_FRAMES {
        match speech.read_frame()? {
            Some(bytes) => {
                if buf.len() + bytes.len() > SPEECH_MAX_LEN {
                    pending = Some(bytes);
                    break;
                }
                buf.extend_from_slice(&bytes);
                frames_read += 1;
            }
            None => break,
        }
    }

    Ok((buf, frames_read, pending))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chunk::TmsChunk;
    use crate::sink::BankWriter;
    use crate::sources::{VecDisplaySource, VecLpcSource, VecSoundSource};
    use tms99_core::io::BufWriter;

    fn collect(sink: BankWriter<BufWriter>) -> Vec<TmsChunk> {
        let bytes = sink.into_inner().into_bytes();
        let mut reader = crate::reader::TmsReader::new(bytes.as_slice());
        let mut chunks = Vec::new();
        while let Some(chunk) = reader.next_chunk().unwrap() {
            chunks.push(chunk);
        }
        chunks
    }

    #[test]
    fn verify_vsync_sequence_strictly_increasing_and_sound_every_tick() {
        let sound = VecSoundSource::new(vec![vec![0x9F]; 5]);

        let mut sink = BankWriter::new(BufWriter::new());
        compose::<VecDisplaySource, _, VecLpcSource>(
            vec![],
            vec![Scheduled::new(0, sound)],
            vec![],
            &ComposerConfig::default(),
            &mut sink,
        )
        .unwrap();

        let chunks = collect(sink);
        let vsyncs = chunks.iter().filter(|c| matches!(c, TmsChunk::Vsync)).count();
        assert_eq!(vsyncs, 5);
        let sounds = chunks.iter().filter(|c| matches!(c, TmsChunk::Sound(_))).count();
        assert_eq!(sounds, 5);
        assert_eq!(*chunks.last().unwrap(), TmsChunk::Eof);
    }

    #[test]
    fn verify_sound_does_not_interleave_with_speech_and_speech_starts_on_schedule() {
        // A.snd @0, B.lpc @10, matching §8's "Composer-ordering" golden scenario.
        let sound = VecSoundSource::new(vec![vec![0x9F]; 20]);
        let speech = VecLpcSource::new(vec![vec![0x12], vec![0x34], vec![0x56]]);

        let mut sink = BankWriter::new(BufWriter::new());
        compose::<VecDisplaySource, _, _>(
            vec![],
            vec![Scheduled::new(0, sound)],
            vec![Scheduled::new(10, speech)],
            &ComposerConfig::default(),
            &mut sink,
        )
        .unwrap();

        let chunks = collect(sink);

        // Every sound chunk appears; no speech chunk before vsync 10.
        let mut vsync = 0u64;
        for chunk in &chunks {
            match chunk {
                TmsChunk::Vsync => vsync += 1,
                TmsChunk::Speech(_) => assert!(vsync >= 10, "speech chunk before schedule at vsync {}", vsync),
                _ => {}
            }
        }

        let sounds = chunks.iter().filter(|c| matches!(c, TmsChunk::Sound(_))).count();
        assert_eq!(sounds, 20);

        // At least the primer speech chunk was emitted.
        assert!(chunks.iter().any(|c| matches!(c, TmsChunk::Speech(data) if data.first() == Some(&SPEAK_EXTERNAL))));
    }

    #[test]
    fn verify_speech_primer_is_prefixed_and_bounded() {
        let speech = VecLpcSource::new(vec![vec![0xAA; 7]; 10]);
        let mut sink = BankWriter::new(BufWriter::new());
        compose::<VecDisplaySource, VecSoundSource, _>(
            vec![],
            vec![],
            vec![Scheduled::new(0, speech)],
            &ComposerConfig::default(),
            &mut sink,
        )
        .unwrap();

        let chunks = collect(sink);
        let primer = chunks
            .iter()
            .find_map(|c| match c {
                TmsChunk::Speech(data) => Some(data.clone()),
                _ => None,
            })
            .expect("a primer speech chunk was emitted");

        assert_eq!(primer[0], SPEAK_EXTERNAL);
        assert!(primer.len() <= SPEECH_MAX_LEN);
    }

    #[test]
    fn verify_display_pacer_alternates_halves() {
        let display = VecDisplaySource::new(vec![
            (0x0000, vec![1]),
            (0x1800, vec![2]),
            (0x0000, vec![3]),
            (0x1800, vec![4]),
        ]);

        let mut sink = BankWriter::new(BufWriter::new());
        compose::<_, VecSoundSource, VecLpcSource>(
            vec![Scheduled::new(0, display)],
            vec![],
            vec![],
            &ComposerConfig::default(),
            &mut sink,
        )
        .unwrap();

        let chunks = collect(sink);
        let displays: Vec<_> =
            chunks.iter().filter(|c| matches!(c, TmsChunk::Display { .. })).collect();
        assert_eq!(displays.len(), 4);
    }

    #[test]
    fn verify_empty_timeline_terminates_immediately_with_eof() {
        let mut sink = BankWriter::new(BufWriter::new());
        compose::<VecDisplaySource, VecSoundSource, VecLpcSource>(
            vec![],
            vec![],
            vec![],
            &ComposerConfig::default(),
            &mut sink,
        )
        .unwrap();

        let chunks = collect(sink);
        assert_eq!(chunks, vec![TmsChunk::Vsync, TmsChunk::Eof]);
    }
}
