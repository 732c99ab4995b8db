// Symphonia
// Copyright (c) 2019-2022 The Project Symphonia Developers.
//
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! The five-pass WAV→LPC analysis and optimization pipeline (§4.5).
//!
//! Each pass is a free function taking the previous pass's output and the shared
//! [`EncoderConfig`]; [`encode`] chains them in order, matching the "each pass opens the source
//! fresh" design (§5) by taking an owned, already-decoded sample buffer rather than a stream.

use log::{debug, trace};

use tms99_core::dsp::analysis::{
    autocorrelation, estimate_pitch, le_roux_gueguen, log_spectrum, power_spectrum,
    smooth_gaussian, squared_difference_energy,
};
use tms99_core::dsp::window::{hamming, pre_emphasize};
use tms99_core::dsp::Fft;
use tms99_core::lpc::{
    ChipVariant, LpcFrame, LpcQuantization, NonRepeatingReader, OutputMode, OutputPrecision,
    RepeatingWriter, Simulator,
};

use crate::config::{EncoderConfig, FRAME_STEP};

const LPC_ORDER: usize = 10;
const SPECTRUM_FFT_SIZE: usize = 256;
const OPTIMIZATION_SWEEPS: usize = 10;
const SATURATION_THRESHOLD: i16 = 0x7FF0;

/// Sample delay (§4.5-5) applied when comparing oversampled candidates, centering the comparison
/// window over the audible (post-interpolation) part of the candidate's output rather than its
/// leading, still-interpolating edge.
const OVERSAMPLE_SELECT_DELAY: usize = 150;

/// Sample delay (§4.5-5) applied when re-optimizing a kept frame's energy against the full
/// simulator, shorter than the selection delay since energy is re-scored on the already-selected
/// candidate rather than compared against its siblings.
const OVERSAMPLE_ENERGY_DELAY: usize = 100;

/// A per-frame pitch/voicing candidate produced by pass 1 and refined by pass 2.
#[derive(Debug, Clone, Copy)]
struct Candidate {
    lag: usize,
    voiced: bool,
    normalized: f32,
}

/// Runs the complete WAV→LPC pipeline over already-decoded, 8 kHz mono PCM samples, returning the
/// repeat-folded, optionally stop-terminated frame sequence ready for the binary or text writer.
pub fn encode(samples: &[i16], config: &EncoderConfig) -> Vec<LpcFrame> {
    let n_frames = samples.len() / FRAME_STEP;
    let oversampling = config.frame_oversampling.max(1);
    let candidate_step = (FRAME_STEP / oversampling).max(1);
    let n_candidates = n_frames * oversampling;
    debug!(
        "encoding {} frames ({} candidates at oversampling {}) from {} samples",
        n_frames,
        n_candidates,
        oversampling,
        samples.len()
    );

    let scaled: Vec<f32> = samples.iter().map(|&s| s as f32 * config.amplification).collect();

    let candidates = pass1_pitch_and_voicing(&scaled, n_candidates, candidate_step, config);
    let candidates = pass2_fix_outliers(candidates, config);

    let quant = LpcQuantization::new(config.chip_variant);
    let frames = pass3_initial_lpc(&scaled, &candidates, &quant, config, candidate_step, oversampling);
    let frames = if config.optimize_frames {
        pass4_optimize(&scaled, frames, &quant, config, candidate_step)
    }
    else {
        frames
    };
    let frames = if oversampling > 1 {
        select_oversampled_candidates(&scaled, frames, &quant, config, oversampling)
    }
    else {
        frames
    };
    let mut frames = pass5_post_fixes(frames, &quant, config);

    if config.trim_silence {
        trim_silence(&mut frames);
    }

    let mut frames = RepeatingWriter::fold_all(frames);

    if config.append_stop_frame {
        frames.push(LpcFrame::Stop);
    }

    frames
}

/// Pass 1: per-frame pitch and voicing estimate (§4.5-1). Runs over the oversampled candidate
/// grid (`n_candidates = n_frames * frame_oversampling`, spaced `candidate_step` samples apart)
/// so that, when `frame_oversampling > 1`, each real output slot gets `N` independently analyzed
/// candidates for pass 5 to choose among (§4.5-5).
fn pass1_pitch_and_voicing(
    samples: &[f32],
    n_candidates: usize,
    candidate_step: usize,
    config: &EncoderConfig,
) -> Vec<Candidate> {
    let (min_lag, max_lag) = config.pitch_lag_range();
    // A window several frames wide centered on the frame gives the pitch estimator enough cycles
    // of a low-frequency voice to lock onto, matching "a large window centered on the frame".
    let half_window = (max_lag * 2).max(FRAME_STEP);

    (0..n_candidates)
        .map(|i| {
            let center = candidate_center(i, candidate_step);
            let start = center.saturating_sub(half_window);
            let end = (center + half_window).min(samples.len());
            let window = &samples[start..end];

            let estimate = estimate_pitch(window, min_lag, max_lag.min(window.len().saturating_sub(1).max(1)));
            let voiced = estimate.normalized >= config.voiced_threshold;

            Candidate { lag: estimate.lag, voiced, normalized: estimate.normalized }
        })
        .collect()
}

/// Sample position a candidate/analysis frame at index `i`, spaced `step` samples apart, is
/// centered on. With `step == FRAME_STEP` (no oversampling) this is the center of real frame `i`;
/// with a finer `step` it is the center of the `i`-th oversampled candidate within its slot.
fn candidate_center(i: usize, step: usize) -> usize {
    i * step + step / 2
}

/// Pass 2: pitch-outlier replacement and short voiced/unvoiced run smoothing (§4.5-2).
fn pass2_fix_outliers(mut candidates: Vec<Candidate>, config: &EncoderConfig) -> Vec<Candidate> {
    let window = 5 * config.frame_oversampling.max(1);

    if config.fix_pitch_outliers {
        fix_pitch_outliers(&mut candidates, window);
    }
    if config.fix_voiced_jittering {
        fix_short_runs(&mut candidates, 2 * config.frame_oversampling.max(1), config.voiced_threshold);
    }

    candidates
}

fn fix_pitch_outliers(candidates: &mut [Candidate], window: usize) {
    let n = candidates.len();
    if n == 0 {
        return;
    }

    let original: Vec<usize> = candidates.iter().map(|c| c.lag).collect();

    for i in 0..n {
        let lo = i.saturating_sub(window / 2);
        let hi = (i + window / 2 + 1).min(n);
        let local: Vec<usize> = (lo..hi).filter(|&j| candidates[j].voiced).map(|j| original[j]).collect();
        if local.is_empty() {
            continue;
        }
        let avg = local.iter().sum::<usize>() as f32 / local.len() as f32;
        if avg <= 0.0 {
            continue;
        }

        let p = original[i] as f32;
        if ((p - avg) / avg).abs() > 0.25 {
            let candidates_vals = [2.0 * p, p / 2.0, avg];
            let best = candidates_vals
                .iter()
                .copied()
                .min_by(|a, b| (a - avg).abs().partial_cmp(&(b - avg).abs()).unwrap())
                .unwrap();
            candidates[i].lag = best.round().max(1.0) as usize;
        }
    }
}

fn fix_short_runs(candidates: &mut [Candidate], min_run_len: usize, threshold: f32) {
    let n = candidates.len();
    if n == 0 {
        return;
    }

    for _ in 0..OPTIMIZATION_SWEEPS {
        let mut changed = false;
        let mut i = 0;
        while i < n {
            let voiced = candidates[i].voiced;
            let mut j = i;
            while j < n && candidates[j].voiced == voiced {
                j += 1;
            }
            let run_len = j - i;
            if run_len < min_run_len {
                let avg = candidates[i..j].iter().map(|c| c.normalized).sum::<f32>() / run_len as f32;
                for c in &mut candidates[i..j] {
                    if (c.normalized - avg).abs() > f32::EPSILON {
                        changed = true;
                    }
                    c.normalized = avg;
                    c.voiced = avg >= threshold;
                }
            }
            i = j;
        }
        if !changed {
            break;
        }
    }
}

/// Pass 3: windowed LPC analysis producing an initial Voiced/Unvoiced/Silence candidate per frame,
/// with energy chosen to best match the raw frame's RMS (§4.5-3). Runs over the same oversampled
/// candidate grid as pass 1 ("for each frame (possibly N-oversampled)"); `oversampling` candidates
/// share one real frame's RMS target since they compete for the same output slot in pass 5.
fn pass3_initial_lpc(
    samples: &[f32],
    candidates: &[Candidate],
    quant: &LpcQuantization,
    config: &EncoderConfig,
    candidate_step: usize,
    oversampling: usize,
) -> Vec<LpcFrame> {
    let mut sim = Simulator::new();
    let mut frames = Vec::with_capacity(candidates.len());

    for (i, cand) in candidates.iter().enumerate() {
        let center = candidate_center(i, candidate_step);
        let half = config.lpc_window_size / 2;
        let start = center.saturating_sub(half);
        let end = (center + half).min(samples.len());

        let mut window: Vec<f32> = samples[start..end].to_vec();
        pre_emphasize(&mut window, config.pre_emphasis);
        hamming(&mut window);

        let r = autocorrelation(&window, LPC_ORDER);
        let k = le_roux_gueguen(&r, LPC_ORDER);

        let real_frame = i / oversampling;
        let raw_rms = rms(&samples[real_frame * FRAME_STEP..((real_frame + 1) * FRAME_STEP).min(samples.len())]);

        let frame = match k {
            None => LpcFrame::Silence,
            Some(k) => {
                let pitch_index = if cand.voiced { quant.encode_pitch(8_000.0 / cand.lag.max(1) as f32) } else { 0 };

                let template = build_frame(quant, cand.voiced, pitch_index, &k, 14);
                let energy = best_energy_for_rms(&mut sim.clone(), quant, &template, raw_rms);

                if energy == 0 {
                    LpcFrame::Silence
                }
                else {
                    with_energy(template, energy)
                }
            }
        };

        trace!("frame {}: voiced={} lag={} -> {:?}", i, cand.voiced, cand.lag, frame);

        // Advance the running simulator with the chosen frame so later frames' energy search
        // starts from the correct lattice-filter history.
        let mut scratch = [0i16; FRAME_STEP];
        sim.play_frame_simplified(quant, &frame, &mut scratch, OutputMode::Digital, OutputPrecision::Full);

        frames.push(frame);
    }

    frames
}

fn build_frame(_quant: &LpcQuantization, voiced: bool, pitch: u8, k: &[f32], energy: u8) -> LpcFrame {
    if voiced {
        let mut idx = [0u32; 10];
        for (i, slot) in idx.iter_mut().enumerate() {
            *slot = _quant.encode_k(i, k.get(i).copied().unwrap_or(0.0));
        }
        LpcFrame::Voiced { energy, pitch, k: idx }
    }
    else {
        let mut idx = [0u32; 4];
        for (i, slot) in idx.iter_mut().enumerate() {
            *slot = _quant.encode_k(i, k.get(i).copied().unwrap_or(0.0));
        }
        LpcFrame::Unvoiced { energy, k: idx }
    }
}

fn with_energy(frame: LpcFrame, energy: u8) -> LpcFrame {
    match frame {
        LpcFrame::Voiced { pitch, k, .. } => LpcFrame::Voiced { energy, pitch, k },
        LpcFrame::Unvoiced { k, .. } => LpcFrame::Unvoiced { energy, k },
        other => other,
    }
}

/// Tries each encoded energy `0..=14`, simulating `frame` with that energy on a scratch clone of
/// `sim`, and returns the one whose RMS output most closely matches `target_rms`.
fn best_energy_for_rms(sim: &mut Simulator, quant: &LpcQuantization, frame: &LpcFrame, target_rms: f32) -> u8 {
    let mut best_energy = 0u8;
    let mut best_err = f32::MAX;

    for energy in 0u8..=14 {
        let candidate = with_energy(frame.clone(), energy);
        let mut scratch = sim.clone();
        let mut out = [0i16; FRAME_STEP];
        scratch.play_frame_simplified(quant, &candidate, &mut out, OutputMode::Digital, OutputPrecision::Full);

        let err = (rms_i16(&out) - target_rms).abs();
        if err < best_err {
            best_err = err;
            best_energy = energy;
        }
    }

    best_energy
}

fn rms(samples: &[f32]) -> f32 {
    if samples.is_empty() {
        return 0.0;
    }
    (samples.iter().map(|&x| x * x).sum::<f32>() / samples.len() as f32).sqrt()
}

fn rms_i16(samples: &[i16]) -> f32 {
    if samples.is_empty() {
        return 0.0;
    }
    (samples.iter().map(|&x| (x as f32) * (x as f32)).sum::<f32>() / samples.len() as f32).sqrt()
}

/// Pass 4: per-parameter hill-climb against the smoothed log power spectrum, simulating the
/// current and next frame with full interpolation (§4.5-4). Runs over the same candidate grid as
/// passes 1 and 3; each candidate is optimized independently against the audio centered on its
/// own position, ahead of pass 5 choosing among them.
fn pass4_optimize(
    samples: &[f32],
    mut frames: Vec<LpcFrame>,
    quant: &LpcQuantization,
    config: &EncoderConfig,
    candidate_step: usize,
) -> Vec<LpcFrame> {
    let fft = Fft::new(SPECTRUM_FFT_SIZE);
    let mut sim = Simulator::new();

    for i in 0..frames.len() {
        let reference =
            spectrum_at(samples, candidate_center(i, candidate_step), config.optimization_window_size, &fft);

        for _sweep in 0..OPTIMIZATION_SWEEPS {
            let mut any_changed = false;

            let param_count = match &frames[i] {
                LpcFrame::Voiced { .. } => 10,
                LpcFrame::Unvoiced { .. } => 4,
                _ => 0,
            };

            // Energy, then each k, then energy again (§4.5-4).
            let order: Vec<ParamKind> = std::iter::once(ParamKind::Energy)
                .chain((0..param_count).map(ParamKind::K))
                .chain(std::iter::once(ParamKind::Energy))
                .collect();

            for kind in order {
                let changed = optimize_one_param(
                    &mut frames,
                    i,
                    kind,
                    &sim,
                    quant,
                    &reference,
                    &fft,
                    config,
                );
                any_changed |= changed;
            }

            if !any_changed {
                break;
            }
        }

        // Commit the (now locally optimal) frame to the canonical running simulator.
        let mut scratch = [0i16; FRAME_STEP];
        sim.play_frame(quant, &frames[i], &mut scratch, OutputMode::Digital, OutputPrecision::Full);
    }

    frames
}

#[derive(Debug, Clone, Copy)]
enum ParamKind {
    Energy,
    K(usize),
}

fn get_param(frame: &LpcFrame, kind: ParamKind) -> Option<(u32, u32)> {
    match (frame, kind) {
        (LpcFrame::Voiced { energy, .. }, ParamKind::Energy) => Some((*energy as u32, 14)),
        (LpcFrame::Unvoiced { energy, .. }, ParamKind::Energy) => Some((*energy as u32, 14)),
        (LpcFrame::Voiced { k, .. }, ParamKind::K(i)) if i < k.len() => {
            Some((k[i], (1u32 << tms99_core::lpc::quant::K_BITS[i]) - 1))
        }
        (LpcFrame::Unvoiced { k, .. }, ParamKind::K(i)) if i < k.len() => {
            Some((k[i], (1u32 << tms99_core::lpc::quant::K_BITS[i]) - 1))
        }
        _ => None,
    }
}

fn set_param(frame: &mut LpcFrame, kind: ParamKind, value: u32) {
    match (frame, kind) {
        (LpcFrame::Voiced { energy, .. }, ParamKind::Energy) => *energy = value as u8,
        (LpcFrame::Unvoiced { energy, .. }, ParamKind::Energy) => *energy = value as u8,
        (LpcFrame::Voiced { k, .. }, ParamKind::K(i)) if i < k.len() => k[i] = value,
        (LpcFrame::Unvoiced { k, .. }, ParamKind::K(i)) if i < k.len() => k[i] = value,
        _ => {}
    }
}

#[allow(clippy::too_many_arguments)]
fn optimize_one_param(
    frames: &mut [LpcFrame],
    i: usize,
    kind: ParamKind,
    sim_before: &Simulator,
    quant: &LpcQuantization,
    reference: &[f32],
    fft: &Fft,
    config: &EncoderConfig,
) -> bool {
    let Some((current, max_value)) = get_param(&frames[i], kind) else { return false };

    let eval = |value: u32, frames: &[LpcFrame]| -> f32 {
        let mut trial = frames[i].clone();
        set_param(&mut trial, kind, value);

        let mut sim = sim_before.clone();
        let mut out = [0i16; FRAME_STEP];
        sim.play_frame(quant, &trial, &mut out, OutputMode::Digital, OutputPrecision::Full);
        if i + 1 < frames.len() {
            sim.play_frame(quant, &frames[i + 1], &mut out, OutputMode::Digital, OutputPrecision::Full);
        }

        let samples: Vec<f32> = out.iter().map(|&s| s as f32).collect();
        let window = last_n(&samples, config.optimization_window_size);
        let spectrum = smooth_gaussian(&log_spectrum(&power_spectrum(window, fft), 1.0), 2);
        squared_difference_energy(&spectrum, reference)
    };

    let mut best = current;
    let mut best_err = eval(current, frames);

    let mut v = current;
    while v < max_value {
        v += 1;
        let err = eval(v, frames);
        if err < best_err {
            best_err = err;
            best = v;
        }
        else {
            break;
        }
    }

    let mut v = current;
    while v > 0 {
        v -= 1;
        let err = eval(v, frames);
        if err < best_err {
            best_err = err;
            best = v;
        }
        else {
            break;
        }
    }

    if best != current {
        set_param(&mut frames[i], kind, best);
        true
    }
    else {
        false
    }
}

/// Smoothed log power spectrum of the raw audio in a `window_size`-sample window centered on
/// `center`. Shared by pass 4 (reference for a candidate's own position) and pass 5's oversampling
/// selection (reference for the real output slot all `N` candidates compete for).
fn spectrum_at(samples: &[f32], center: usize, window_size: usize, fft: &Fft) -> Vec<f32> {
    let half = window_size / 2;
    let start = center.saturating_sub(half);
    let end = (center + half).min(samples.len());
    let spectrum = power_spectrum(&samples[start..end], fft);
    smooth_gaussian(&log_spectrum(&spectrum, 1.0), 2)
}

fn last_n(samples: &[f32], n: usize) -> &[f32] {
    let start = samples.len().saturating_sub(n);
    &samples[start..]
}

/// Plays `frame` twice back-to-back from a clone of `sim`, then returns the smoothed log power
/// spectrum of a `window_size`-sample window starting `delay` samples into the combined output
/// (§4.5-5's "centering the optimization window over the audible part of the interpolated
/// output"): the delay skips the leading samples still coasting toward the frame's interpolated
/// target, and playing the frame twice guarantees enough samples exist past the delay regardless
/// of `window_size`.
fn delayed_spectrum(
    sim: &Simulator,
    quant: &LpcQuantization,
    frame: &LpcFrame,
    delay: usize,
    window_size: usize,
    fft: &Fft,
) -> Vec<f32> {
    let mut scratch = sim.clone();
    let mut first = [0i16; FRAME_STEP];
    scratch.play_frame(quant, frame, &mut first, OutputMode::Digital, OutputPrecision::Full);
    let mut second = [0i16; FRAME_STEP];
    scratch.play_frame(quant, frame, &mut second, OutputMode::Digital, OutputPrecision::Full);

    let combined: Vec<f32> = first.iter().chain(second.iter()).map(|&s| s as f32).collect();
    let end = (delay + window_size).min(combined.len());
    let start = end.saturating_sub(window_size);

    smooth_gaussian(&log_spectrum(&power_spectrum(&combined[start..end], fft), 1.0), 2)
}

/// Pass 5's oversampling candidate selection (§4.5-5): for each real output slot, re-simulates its
/// `oversampling` candidates through the full interpolating simulator with [`OVERSAMPLE_SELECT_DELAY`],
/// keeps the one with minimum spectral error against the raw audio, then re-optimizes that
/// candidate's energy against the full simulator with [`OVERSAMPLE_ENERGY_DELAY`]. A no-op (by
/// construction, `encode` never calls this) when `frame_oversampling == 1`.
fn select_oversampled_candidates(
    samples: &[f32],
    candidates: Vec<LpcFrame>,
    quant: &LpcQuantization,
    config: &EncoderConfig,
    oversampling: usize,
) -> Vec<LpcFrame> {
    let n_frames = candidates.len() / oversampling;
    let fft = Fft::new(SPECTRUM_FFT_SIZE);
    let mut sim = Simulator::new();
    let mut frames = Vec::with_capacity(n_frames);

    for i in 0..n_frames {
        let reference = spectrum_at(samples, i * FRAME_STEP + FRAME_STEP / 2, config.optimization_window_size, &fft);

        let mut best_idx = i * oversampling;
        let mut best_err = f32::MAX;
        for j in 0..oversampling {
            let idx = i * oversampling + j;
            let spectrum = delayed_spectrum(
                &sim,
                quant,
                &candidates[idx],
                OVERSAMPLE_SELECT_DELAY,
                config.optimization_window_size,
                &fft,
            );
            let err = squared_difference_energy(&spectrum, &reference);
            if err < best_err {
                best_err = err;
                best_idx = idx;
            }
        }

        let chosen = reoptimize_energy_spectral(&sim, quant, &candidates[best_idx], &reference, config, &fft);

        let mut advance = [0i16; FRAME_STEP];
        sim.play_frame(quant, &chosen, &mut advance, OutputMode::Digital, OutputPrecision::Full);

        trace!("slot {}: kept oversampled candidate {} (of {})", i, best_idx - i * oversampling, oversampling);
        frames.push(chosen);
    }

    frames
}

/// Re-optimizes `frame`'s energy against `reference` using the full simulator with
/// [`OVERSAMPLE_ENERGY_DELAY`], trying every encoded energy `0..=14` (§4.5-5).
fn reoptimize_energy_spectral(
    sim: &Simulator,
    quant: &LpcQuantization,
    frame: &LpcFrame,
    reference: &[f32],
    config: &EncoderConfig,
    fft: &Fft,
) -> LpcFrame {
    if !matches!(frame, LpcFrame::Voiced { .. } | LpcFrame::Unvoiced { .. }) {
        return frame.clone();
    }

    let mut best = frame.clone();
    let mut best_err = f32::MAX;

    for energy in 0u8..=14 {
        let candidate = with_energy(frame.clone(), energy);
        let spectrum =
            delayed_spectrum(sim, quant, &candidate, OVERSAMPLE_ENERGY_DELAY, config.optimization_window_size, fft);
        let err = squared_difference_energy(&spectrum, reference);
        if err < best_err {
            best_err = err;
            best = candidate;
        }
    }

    best
}

/// Pass 5's post-fixes (§4.5-5): energy-transition smoothing, clamped-sample energy reduction, and
/// silence folding. Runs on the already-selected, one-frame-per-slot sequence; oversampling
/// candidate generation and selection happens earlier, in [`select_oversampled_candidates`].
fn pass5_post_fixes(mut frames: Vec<LpcFrame>, quant: &LpcQuantization, config: &EncoderConfig) -> Vec<LpcFrame> {
    if config.fix_energy_transitions {
        fix_energy_transitions(&mut frames);
    }
    if config.fix_clamped_samples {
        fix_clamped_samples(&mut frames, quant);
    }
    fold_silence(&mut frames);

    frames
}

fn fix_energy_transitions(frames: &mut [LpcFrame]) {
    for i in 1..frames.len() {
        let (prev_unvoiced_energy, prev_energy) = match &frames[i - 1] {
            LpcFrame::Unvoiced { energy, .. } => (true, *energy),
            LpcFrame::Voiced { energy, .. } | LpcFrame::Repeat { energy, .. } => (false, *energy),
            _ => (false, 0),
        };

        if let LpcFrame::Voiced { energy, .. } = &mut frames[i] {
            if prev_unvoiced_energy && prev_energy < *energy {
                *energy = (prev_energy as u16 + *energy as u16).div_ceil(2) as u8;
            }
        }
    }
}

fn fix_clamped_samples(frames: &mut [LpcFrame], quant: &LpcQuantization) {
    let mut sim = Simulator::new();
    let mut i = 0;

    while i < frames.len() {
        loop {
            let mut scratch = sim.clone();
            let mut first = [0i16; FRAME_STEP];
            scratch.play_frame(quant, &frames[i], &mut first, OutputMode::Digital, OutputPrecision::Full);

            let mut clamped = first[FRAME_STEP / 2..].iter().any(|&s| is_saturated(s));

            if i + 1 < frames.len() {
                let mut second = [0i16; FRAME_STEP];
                scratch.play_frame(
                    quant,
                    &frames[i + 1],
                    &mut second,
                    OutputMode::Digital,
                    OutputPrecision::Full,
                );
                clamped |= second[..FRAME_STEP / 2].iter().any(|&s| is_saturated(s));
            }

            if !clamped {
                break;
            }

            let energy = match &mut frames[i] {
                LpcFrame::Voiced { energy, .. } | LpcFrame::Unvoiced { energy, .. } => energy,
                _ => break,
            };

            if *energy == 0 {
                break;
            }
            *energy -= 1;
        }

        let mut advance = [0i16; FRAME_STEP];
        sim.play_frame(quant, &frames[i], &mut advance, OutputMode::Digital, OutputPrecision::Full);
        i += 1;
    }
}

fn is_saturated(sample: i16) -> bool {
    sample >= SATURATION_THRESHOLD || sample <= -SATURATION_THRESHOLD
}

fn fold_silence(frames: &mut [LpcFrame]) {
    let n = frames.len();
    let energies: Vec<Option<u8>> = frames.iter().map(|f| f.energy()).collect();

    for i in 0..n {
        let Some(energy) = energies[i] else { continue };

        let low_with_neighbors = energy <= 1
            && (i == 0 || energies[i - 1].map(|e| e <= 1).unwrap_or(true))
            && (i + 1 >= n || energies[i + 1].map(|e| e <= 1).unwrap_or(true));

        if matches!(frames[i], LpcFrame::Voiced { .. } | LpcFrame::Unvoiced { .. })
            && (energy == 0 || low_with_neighbors)
        {
            frames[i] = LpcFrame::Silence;
        }
    }
}

fn trim_silence(frames: &mut Vec<LpcFrame>) {
    while matches!(frames.first(), Some(LpcFrame::Silence)) {
        frames.remove(0);
    }
    while matches!(frames.last(), Some(LpcFrame::Silence)) {
        frames.pop();
    }
}

/// Expands a repeat-folded sequence back to explicit Voiced/Unvoiced frames, the inverse of the
/// final fold performed by [`encode`]; exposed for callers that want to re-render an encoded
/// stream without decoding it from the bitstream first.
pub fn expand(frames: &[LpcFrame]) -> Vec<LpcFrame> {
    NonRepeatingReader::expand_all(frames.iter().cloned())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tone(freq_hz: f32, n_samples: usize) -> Vec<i16> {
        (0..n_samples)
            .map(|i| {
                let t = i as f32 / 8_000.0;
                (8_000.0 * (freq_hz * std::f32::consts::TAU * t).sin()) as i16
            })
            .collect()
    }

    #[test]
    fn verify_silence_input_encodes_to_silence_or_stop_frames() {
        let samples = vec![0i16; FRAME_STEP * 6];
        let config = EncoderConfig::default();
        let frames = encode(&samples, &config);

        assert!(frames.iter().all(|f| matches!(f, LpcFrame::Silence | LpcFrame::Stop)));
    }

    #[test]
    fn verify_encode_appends_stop_frame_when_configured() {
        let samples = vec![0i16; FRAME_STEP * 3];
        let mut config = EncoderConfig::default();
        config.append_stop_frame = true;
        let frames = encode(&samples, &config);

        assert_eq!(frames.last(), Some(&LpcFrame::Stop));
    }

    #[test]
    fn verify_voiced_tone_produces_at_least_one_non_silence_frame() {
        let samples = tone(150.0, FRAME_STEP * 8);
        let mut config = EncoderConfig::default();
        config.append_stop_frame = false;
        let frames = encode(&samples, &config);

        assert!(frames.iter().any(|f| !matches!(f, LpcFrame::Silence)));
    }

    #[test]
    fn verify_oversampling_produces_one_frame_per_slot() {
        let samples = tone(150.0, FRAME_STEP * 8);
        let mut config = EncoderConfig::default();
        config.append_stop_frame = false;
        config.frame_oversampling = 3;
        config.validate().unwrap();

        let frames = encode(&samples, &config);

        assert_eq!(frames.len(), samples.len() / FRAME_STEP);
        assert!(frames.iter().any(|f| !matches!(f, LpcFrame::Silence)));
    }

    #[test]
    fn verify_expand_is_inverse_of_internal_fold() {
        let a = LpcFrame::Voiced { energy: 5, pitch: 10, k: [1; 10] };
        let b = LpcFrame::Voiced { energy: 6, pitch: 11, k: [1; 10] };
        let folded = RepeatingWriter::fold_all([a.clone(), b.clone()]);
        assert_eq!(expand(&folded), vec![a, b]);
    }
}
