// Symphonia
// Copyright (c) 2019-2022 The Project Symphonia Developers.
//
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Analysis windows and pre-emphasis used by the speech encoder's LPC passes.

use std::f32::consts::PI;

/// Applies a Hamming window in-place.
pub fn hamming(samples: &mut [f32]) {
    let n = samples.len();
    if n <= 1 {
        return;
    }
    for (i, s) in samples.iter_mut().enumerate() {
        let w = 0.54 - 0.46 * (2.0 * PI * i as f32 / (n - 1) as f32).cos();
        *s *= w;
    }
}

/// Applies a Blackman window in-place.
pub fn blackman(samples: &mut [f32]) {
    let n = samples.len();
    if n <= 1 {
        return;
    }
    for (i, s) in samples.iter_mut().enumerate() {
        let phase = 2.0 * PI * i as f32 / (n - 1) as f32;
        let w = 0.42 - 0.5 * phase.cos() + 0.08 * (2.0 * phase).cos();
        *s *= w;
    }
}

/// Applies a Gaussian window in-place with standard deviation `sigma` expressed as a fraction of
/// the half-window length (a common value is `0.4`).
pub fn gaussian(samples: &mut [f32], sigma: f32) {
    let n = samples.len();
    if n <= 1 {
        return;
    }
    let half = (n - 1) as f32 / 2.0;
    for (i, s) in samples.iter_mut().enumerate() {
        let t = (i as f32 - half) / (sigma * half);
        let w = (-0.5 * t * t).exp();
        *s *= w;
    }
}

/// Applies a first-order pre-emphasis filter `x[i] -= alpha * x[i-1]` in-place. The first sample
/// is left untouched (there is no `x[-1]`).
pub fn pre_emphasize(samples: &mut [f32], alpha: f32) {
    for i in (1..samples.len()).rev() {
        samples[i] -= alpha * samples[i - 1];
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn verify_hamming_endpoints_near_zero() {
        let mut samples = vec![1.0f32; 9];
        hamming(&mut samples);
        assert!((samples[0] - 0.08).abs() < 1e-4);
        assert!((samples[8] - 0.08).abs() < 1e-4);
        assert!((samples[4] - 1.0).abs() < 1e-4);
    }

    #[test]
    fn verify_pre_emphasis_first_sample_untouched() {
        let mut samples = vec![2.0, 4.0, 6.0];
        pre_emphasize(&mut samples, 0.5);
        assert_eq!(samples[0], 2.0);
        assert_eq!(samples[1], 4.0 - 0.5 * 2.0);
        assert_eq!(samples[2], 6.0 - 0.5 * 4.0);
    }
}
