// Symphonia
// Copyright (c) 2019-2022 The Project Symphonia Developers.
//
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! The encoder's configuration record (§4.5, §9 design notes: "a single configuration record"
//! rather than reflective keyword arguments).

use tms99_core::errors::{config_error, Result};
use tms99_core::lpc::ChipVariant;

/// Number of audio samples the simulator consumes per LPC frame (25 ms at 8 kHz).
pub const FRAME_STEP: usize = 200;

/// All tunables for the WAV→LPC pipeline (§4.5).
#[derive(Debug, Clone)]
pub struct EncoderConfig {
    pub chip_variant: ChipVariant,
    /// Linear amplification applied to input samples before analysis.
    pub amplification: f32,
    /// Pre-emphasis coefficient alpha.
    pub pre_emphasis: f32,
    /// Minimum pitch frequency in Hz (mapped to the pitch table's upper period bound).
    pub min_frequency_hz: f32,
    /// Maximum pitch frequency in Hz (mapped to the pitch table's lower period bound).
    pub max_frequency_hz: f32,
    /// Normalized-autocorrelation threshold above which a frame is considered voiced.
    pub voiced_threshold: f32,
    /// Size, in samples, of the analysis window used for the initial LPC pass.
    pub lpc_window_size: usize,
    /// Number of candidate frames generated per output slot (§4.5 pass 5); 1 disables
    /// oversampling.
    pub frame_oversampling: usize,
    /// Size, in samples, of the window used when comparing candidate frames by spectral error.
    pub optimization_window_size: usize,
    /// Shift applied when converting samples to linear power for pass 3's energy search.
    pub linear_power_shift: u32,

    pub fix_pitch_outliers: bool,
    pub fix_voiced_jittering: bool,
    pub optimize_frames: bool,
    pub fix_energy_transitions: bool,
    pub fix_clamped_samples: bool,
    pub trim_silence: bool,
    pub append_stop_frame: bool,
}

impl Default for EncoderConfig {
    fn default() -> Self {
        EncoderConfig {
            chip_variant: ChipVariant::Tms5200,
            amplification: 1.0,
            pre_emphasis: 0.9375,
            min_frequency_hz: 52.0,
            max_frequency_hz: 400.0,
            voiced_threshold: 0.4,
            lpc_window_size: 200,
            frame_oversampling: 1,
            optimization_window_size: 200,
            linear_power_shift: 0,
            fix_pitch_outliers: true,
            fix_voiced_jittering: true,
            optimize_frames: true,
            fix_energy_transitions: true,
            fix_clamped_samples: true,
            trim_silence: false,
            append_stop_frame: true,
        }
    }
}

impl EncoderConfig {
    /// Validates cross-field invariants not expressible in the type alone.
    pub fn validate(&self) -> Result<()> {
        if self.min_frequency_hz <= 0.0 || self.max_frequency_hz <= 0.0 {
            return config_error("encoder: frequency bounds must be positive");
        }
        if self.min_frequency_hz >= self.max_frequency_hz {
            return config_error("encoder: min frequency must be less than max frequency");
        }
        if !(0.0..=1.0).contains(&self.voiced_threshold) {
            return config_error("encoder: voiced threshold must be in [0, 1]");
        }
        if self.lpc_window_size == 0 || self.optimization_window_size == 0 {
            return config_error("encoder: window sizes must be non-zero");
        }
        if self.frame_oversampling == 0 {
            return config_error("encoder: frame oversampling must be at least 1");
        }
        Ok(())
    }

    /// The pitch search range, in samples at 8 kHz, corresponding to `[min_frequency_hz,
    /// max_frequency_hz]`.
    pub fn pitch_lag_range(&self) -> (usize, usize) {
        let min_lag = (8_000.0 / self.max_frequency_hz).round() as usize;
        let max_lag = (8_000.0 / self.min_frequency_hz).round() as usize;
        (min_lag.max(1), max_lag.max(min_lag.max(1)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn verify_default_config_is_valid() {
        EncoderConfig::default().validate().unwrap();
    }

    #[test]
    fn verify_inverted_frequency_range_is_rejected() {
        let mut cfg = EncoderConfig::default();
        cfg.min_frequency_hz = 400.0;
        cfg.max_frequency_hz = 100.0;
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn verify_pitch_lag_range_is_monotonic_with_frequency() {
        let cfg = EncoderConfig::default();
        let (min_lag, max_lag) = cfg.pitch_lag_range();
        assert!(min_lag < max_lag);
    }
}
