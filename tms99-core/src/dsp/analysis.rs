// Symphonia
// Copyright (c) 2019-2022 The Project Symphonia Developers.
//
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Autocorrelation, pitch estimation, and reflection-coefficient estimation.
//!
//! These routines back the speech encoder's analysis passes (`tms99-lpc`). None of them existed
//! in the upstream decoder this crate is modelled on; they follow the same "plain function over
//! borrowed slices, instance owns no hidden state" style as [`super::fft::Fft`].

use super::complex::Complex;
use super::fft::Fft;

/// Computes the one-sided power spectrum of a windowed frame, zero-padded or truncated to
/// `fft.size()` samples. Used to compare candidate LPC frames by the energy they would place in
/// each frequency bin (§4.5 pass 4).
pub fn power_spectrum(samples: &[f32], fft: &Fft) -> Vec<f32> {
    let n = fft.size();
    let mut buf: Vec<Complex> = samples.iter().take(n).map(|&s| Complex::new(s, 0.0)).collect();
    buf.resize(n, Complex::new(0.0, 0.0));
    fft.fft_inplace(&mut buf);
    buf.iter().take(n / 2 + 1).map(|c| c.re * c.re + c.im * c.im).collect()
}

/// Computes the autocorrelation `R(tau) = sum(x[i] * x[i+tau]) / N` for `tau` in `0..=max_lag`.
///
/// Note the divisor is `N`, not `N - tau`, matching the reference implementation's observed bias
/// (see design notes).
pub fn autocorrelation(samples: &[f32], max_lag: usize) -> Vec<f32> {
    let n = samples.len();
    let mut r = vec![0.0f32; max_lag + 1];

    for (tau, r_tau) in r.iter_mut().enumerate() {
        let mut sum = 0.0f32;
        for i in 0..n.saturating_sub(tau) {
            sum += samples[i] * samples[i + tau];
        }
        *r_tau = sum / n as f32;
    }

    r
}

/// Result of a pitch-period search: the lag (in samples) of the highest normalized
/// autocorrelation peak within `[min_lag, max_lag]`, and the normalized autocorrelation value
/// itself (`R(lag) / R(0)`, clamped to `[0, 1]`).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PitchEstimate {
    pub lag: usize,
    pub normalized: f32,
}

/// Estimates the pitch period by finding the lag in `[min_lag, max_lag]` maximizing the
/// normalized autocorrelation of `samples`.
pub fn estimate_pitch(samples: &[f32], min_lag: usize, max_lag: usize) -> PitchEstimate {
    let max_lag = max_lag.max(min_lag);
    let r = autocorrelation(samples, max_lag);

    let r0 = r[0].max(f32::EPSILON);

    let mut best_lag = min_lag;
    let mut best_val = f32::MIN;

    for lag in min_lag..=max_lag {
        let val = r.get(lag).copied().unwrap_or(0.0);
        if val > best_val {
            best_val = val;
            best_lag = lag;
        }
    }

    PitchEstimate { lag: best_lag, normalized: (best_val / r0).clamp(0.0, 1.0) }
}

/// Estimates reflection coefficients `k[0..order]` from an autocorrelation vector using the
/// Le-Roux/Gueguen recursion (a numerically robust, division-light variant of the Levinson-Durbin
/// recursion, historically used by LPC-10 implementations for fixed-point friendliness).
///
/// Returns `None` if the signal is degenerate (zero energy).
pub fn le_roux_gueguen(r: &[f32], order: usize) -> Option<Vec<f32>> {
    if r[0] <= 0.0 {
        return None;
    }

    let mut b1 = vec![0.0f32; order + 1];
    let mut b2 = vec![0.0f32; order + 1];
    let mut k = vec![0.0f32; order];

    for i in 0..=order {
        b1[i] = r[i];
        b2[i] = r[i];
    }

    let mut r0 = r[0];

    for i in 0..order {
        if r0.abs() < f32::EPSILON {
            return None;
        }

        let ki = -b1[i + 1] / r0;
        k[i] = ki.clamp(-1.0, 1.0);

        for j in 0..(order - i) {
            let b1_new = b1[i + 1 + j] + ki * b2[j];
            let b2_new = b2[j] + ki * b1[i + 1 + j];
            b1[i + 1 + j] = b1_new;
            b2[j] = b2_new;
        }

        r0 += ki * b1[i + 1];
    }

    Some(k)
}

/// Estimates reflection coefficients `k[0..order]` from an autocorrelation vector using the
/// classic Levinson-Durbin recursion.
///
/// Returns `None` if the signal is degenerate (zero energy).
pub fn levinson_durbin(r: &[f32], order: usize) -> Option<Vec<f32>> {
    if r[0] <= 0.0 {
        return None;
    }

    let mut a = vec![0.0f32; order + 1];
    let mut k = vec![0.0f32; order];
    let mut err = r[0];

    a[0] = 1.0;

    for i in 0..order {
        let mut acc = r[i + 1];
        for j in 1..=i {
            acc += a[j] * r[i + 1 - j];
        }

        if err.abs() < f32::EPSILON {
            return None;
        }

        let ki = -acc / err;
        k[i] = ki.clamp(-1.0, 1.0);

        let mut new_a = a.clone();
        new_a[i + 1] = ki;
        for j in 1..=i {
            new_a[j] = a[j] + ki * a[i + 1 - j];
        }
        a = new_a;

        err *= 1.0 - ki * ki;
    }

    Some(k)
}

/// Applies `f(x)` to every element of `v` in-place.
pub fn map_inplace(v: &mut [f32], f: impl Fn(f32) -> f32) {
    for x in v.iter_mut() {
        *x = f(*x);
    }
}

/// Returns the element-wise natural logarithm of `v`, flooring at `floor` before taking the log
/// to avoid `-inf`.
pub fn log_spectrum(v: &[f32], floor: f32) -> Vec<f32> {
    v.iter().map(|&x| x.max(floor).ln()).collect()
}

/// Applies a small 1-D Gaussian smoothing kernel to `v`, used to smooth a log power spectrum
/// before comparing candidate encodings by squared difference.
pub fn smooth_gaussian(v: &[f32], radius: usize) -> Vec<f32> {
    if radius == 0 {
        return v.to_vec();
    }

    let sigma = radius as f32 / 2.0;
    let mut kernel = vec![0.0f32; 2 * radius + 1];
    let mut sum = 0.0f32;

    for (i, k) in kernel.iter_mut().enumerate() {
        let t = i as f32 - radius as f32;
        *k = (-0.5 * (t / sigma) * (t / sigma)).exp();
        sum += *k;
    }
    for k in kernel.iter_mut() {
        *k /= sum;
    }

    let n = v.len();
    let mut out = vec![0.0f32; n];

    for (i, out_i) in out.iter_mut().enumerate() {
        let mut acc = 0.0f32;
        for (j, &kw) in kernel.iter().enumerate() {
            let src = i as isize + j as isize - radius as isize;
            let src = src.clamp(0, n as isize - 1) as usize;
            acc += v[src] * kw;
        }
        *out_i = acc;
    }

    out
}

/// Returns the sum of squared differences between `a` and `b` over their common length.
pub fn squared_difference_energy(a: &[f32], b: &[f32]) -> f32 {
    a.iter().zip(b.iter()).map(|(x, y)| (x - y) * (x - y)).sum()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn verify_autocorrelation_zero_lag_is_energy_over_n() {
        let samples = [1.0f32, -1.0, 1.0, -1.0];
        let r = autocorrelation(&samples, 2);
        assert_eq!(r[0], 1.0);
        assert!((r[1] - (-1.0)).abs() < 1e-6);
    }

    #[test]
    fn verify_pitch_estimate_finds_period() {
        let mut samples = Vec::new();
        for i in 0..200 {
            samples.push((i as f32 * std::f32::consts::TAU / 20.0).sin());
        }
        let est = estimate_pitch(&samples, 5, 60);
        assert_eq!(est.lag, 20);
        assert!(est.normalized > 0.9);
    }

    #[test]
    fn verify_le_roux_gueguen_matches_levinson_durbin_order_one() {
        let r = [1.0f32, 0.5, 0.2];
        let a = le_roux_gueguen(&r, 2).unwrap();
        let b = levinson_durbin(&r, 2).unwrap();
        for (x, y) in a.iter().zip(b.iter()) {
            assert!((x - y).abs() < 1e-4, "{} vs {}", x, y);
        }
    }

    #[test]
    fn verify_power_spectrum_dc_tone_peaks_at_bin_zero() {
        let fft = Fft::new(64);
        let samples = vec![1.0f32; 64];
        let spectrum = power_spectrum(&samples, &fft);
        let peak = spectrum
            .iter()
            .enumerate()
            .max_by(|(_, a), (_, b)| a.partial_cmp(b).unwrap())
            .map(|(i, _)| i)
            .unwrap();
        assert_eq!(peak, 0);
    }

    #[test]
    fn verify_squared_difference_energy() {
        let a = [1.0, 2.0, 3.0];
        let b = [1.0, 0.0, 3.0];
        assert_eq!(squared_difference_energy(&a, &b), 4.0);
    }
}
