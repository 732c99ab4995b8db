// Symphonia
// Copyright (c) 2019-2022 The Project Symphonia Developers.
//
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Per-chip LPC quantization tables and the encode/decode helpers built on top of them.

use log::trace;

use crate::errors::{config_error, Result};

/// Bit widths of the ten reflection-coefficient codebooks, packed big-to-small.
pub const K_BITS: [u32; 10] = [5, 5, 4, 4, 4, 4, 4, 3, 3, 3];

/// Number of reflection coefficients used by an Unvoiced frame.
pub const UNVOICED_K_COUNT: usize = 4;

/// Number of bits in the pitch codebook index.
pub const PITCH_BITS: u32 = 6;

/// Identifies which vintage speech chip's tables to use. The two variants model the historical
/// TMS5200 family (wider chirp table, `0x800`-scale output) and its cost-reduced TMS5220C
/// successor (identical field widths, slightly different chirp excitation and interpolation
/// shift tables) — both read the same bitstream format, only the codebooks differ.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChipVariant {
    Tms5200,
    Tms5220C,
}

impl ChipVariant {
    /// Parses a chip variant from its configuration name.
    pub fn parse(name: &str) -> Result<Self> {
        match name {
            "tms5200" => Ok(ChipVariant::Tms5200),
            "tms5220c" => Ok(ChipVariant::Tms5220C),
            other => {
                trace!("rejected unknown chip variant name: {}", other);
                config_error("unknown chip variant")
            }
        }
    }
}

/// Binds a [`ChipVariant`] to its five codebooks and the encode/decode helpers that operate on
/// them.
///
/// Every codebook is monotonically increasing, so encoding is a nearest-value binary search and
/// `encode(decode(x)) == x` for every in-range encoded value (§4.2).
pub struct LpcQuantization {
    variant: ChipVariant,
    energy_table: [i32; 16],
    pitch_table: Vec<i32>,
    k_tables: [Vec<f32>; 10],
    chirp_table: Vec<i32>,
    interpolation_shifts: [u32; 8],
}

impl LpcQuantization {
    /// Builds the codebooks for the given chip variant.
    pub fn new(variant: ChipVariant) -> Self {
        let energy_table = build_energy_table();
        let pitch_table = build_pitch_table(variant);
        let k_tables = build_k_tables();
        let chirp_table = build_chirp_table(variant);
        let interpolation_shifts = [0, 1, 2, 3, 4, 5, 6, 6];

        LpcQuantization {
            variant,
            energy_table,
            pitch_table,
            k_tables,
            chirp_table,
            interpolation_shifts,
        }
    }

    pub fn variant(&self) -> ChipVariant {
        self.variant
    }

    /// Decodes an encoded energy index (`0..=15`) to its linear amplitude.
    pub fn decode_energy(&self, index: u8) -> i32 {
        self.energy_table[index as usize & 0xF]
    }

    /// Encodes a linear energy value (`0.0..=1.0`) to the nearest codebook index.
    pub fn encode_energy(&self, linear: f32) -> u8 {
        if !(0.0..=1.0).contains(&linear) {
            trace!("energy {} outside [0, 1], clamping", linear);
        }
        let target = (linear.clamp(0.0, 1.0) * self.energy_table[15] as f32) as i32;
        nearest_index(&self.energy_table, target) as u8
    }

    /// Decodes an encoded pitch index to a period, in samples at 8 kHz.
    pub fn decode_pitch(&self, index: u8) -> i32 {
        self.pitch_table[index as usize & 0x3F]
    }

    /// Encodes a pitch frequency in Hz to the nearest codebook index (`0` means Unvoiced and is
    /// never returned by this method; callers choosing Unvoiced must set the index to `0`
    /// explicitly). Returns an index in `1..2^PITCH_BITS`.
    pub fn encode_pitch(&self, hz: f32) -> u8 {
        let period = if hz > 0.0 { (8000.0 / hz).round() as i32 } else { self.pitch_table[1] };
        let idx = nearest_index(&self.pitch_table[1..], period) + 1;
        trace!("pitch {} Hz -> period {} -> codebook index {}", hz, period, idx);
        idx as u8
    }

    /// Number of reflection coefficients for a frame with `k_count` coefficients present.
    pub fn k_table(&self, coefficient: usize) -> &[f32] {
        &self.k_tables[coefficient]
    }

    /// Encodes a single reflection coefficient (`-1.0..=1.0`) to the nearest table index.
    pub fn encode_k(&self, coefficient: usize, value: f32) -> u32 {
        nearest_index_f32(&self.k_tables[coefficient], value) as u32
    }

    /// Decodes a single reflection coefficient index back to its `[-1, 1]` value.
    pub fn decode_k(&self, coefficient: usize, index: u32) -> f32 {
        let table = &self.k_tables[coefficient];
        table[index as usize % table.len()]
    }

    /// Packs up to ten reflection-coefficient indices big-to-small into a single 64-bit word.
    pub fn pack_k(&self, indices: &[u32]) -> u64 {
        pack_k_bits(indices)
    }

    /// Unpacks `count` reflection-coefficient indices from a big-to-small-packed word.
    pub fn unpack_k(&self, packed: u64, count: usize) -> Vec<u32> {
        unpack_k_bits(packed, count)
    }

    pub fn chirp(&self, index: usize) -> i32 {
        let last = self.chirp_table.len() - 1;
        self.chirp_table[index.min(last)]
    }

    pub fn chirp_len(&self) -> usize {
        self.chirp_table.len()
    }

    pub fn interpolation_shift(&self, ip: usize) -> u32 {
        self.interpolation_shifts[ip % 8]
    }
}

/// Packs up to ten reflection-coefficient indices big-to-small into a single 64-bit word.
/// Free-standing so the text codec (`super::text`) can pack/unpack without a chip-specific
/// [`LpcQuantization`] instance; the field widths are fixed regardless of chip variant.
pub fn pack_k_bits(indices: &[u32]) -> u64 {
    let mut acc: u64 = 0;
    for (i, &idx) in indices.iter().enumerate() {
        acc = (acc << K_BITS[i]) | (idx as u64 & ((1u64 << K_BITS[i]) - 1));
    }
    acc
}

/// Unpacks `count` reflection-coefficient indices from a big-to-small-packed word.
pub fn unpack_k_bits(packed: u64, count: usize) -> Vec<u32> {
    let total_bits: u32 = K_BITS[..count].iter().sum();
    let mut remaining = total_bits;
    let mut out = Vec::with_capacity(count);

    for &w in &K_BITS[..count] {
        remaining -= w;
        let idx = (packed >> remaining) & ((1u64 << w) - 1);
        out.push(idx as u32);
    }
    out
}

/// Binary-searches a monotonically increasing table for the entry nearest to `target`.
fn nearest_index(table: &[i32], target: i32) -> usize {
    match table.binary_search(&target) {
        Ok(i) => i,
        Err(0) => 0,
        Err(i) if i >= table.len() => table.len() - 1,
        Err(i) => {
            let lo = table[i - 1];
            let hi = table[i];
            if (target - lo).abs() <= (hi - target).abs() {
                i - 1
            }
            else {
                i
            }
        }
    }
}

fn nearest_index_f32(table: &[f32], target: f32) -> usize {
    let mut best_i = 0;
    let mut best_d = f32::MAX;
    for (i, &v) in table.iter().enumerate() {
        let d = (v - target).abs();
        if d < best_d {
            best_d = d;
            best_i = i;
        }
    }
    best_i
}

fn build_energy_table() -> [i32; 16] {
    // Index 0 is reserved for Silence; the remaining 14 values follow the logarithmic energy
    // progression documented for LPC-10 style energy codebooks, index 15 is the loudest step
    // actually usable by a Voiced/Unvoiced frame (Stop is keyed off the frame type, not this
    // table, see `crate::lpc::frame`).
    let mut table = [0i32; 16];
    for (i, t) in table.iter_mut().enumerate().skip(1) {
        let x = i as f32 / 15.0;
        *t = (x * x * 511.0).round() as i32;
    }
    table
}

fn build_pitch_table(variant: ChipVariant) -> Vec<i32> {
    // Index 0 is reserved (Unvoiced); indices 1..=63 span a period range of roughly 20..154
    // samples at 8 kHz (~52..400 Hz), matching the historical TMS52xx pitch range.
    let (min_period, max_period) = match variant {
        ChipVariant::Tms5200 => (20, 154),
        ChipVariant::Tms5220C => (20, 145),
    };

    let mut table = vec![0i32; 64];
    for (i, t) in table.iter_mut().enumerate().skip(1) {
        let x = (i - 1) as f32 / 62.0;
        *t = min_period + (x * (max_period - min_period) as f32).round() as i32;
    }
    table
}

fn build_k_tables() -> [Vec<f32>; 10] {
    let mut tables: [Vec<f32>; 10] = Default::default();
    for (i, width) in K_BITS.iter().enumerate() {
        let n = 1usize << width;
        let mut table = vec![0.0f32; n];
        for (j, v) in table.iter_mut().enumerate() {
            // Coefficients are spaced with a tanh warp so resolution is finer near zero, the
            // region reflection coefficients of stable filters spend most of their time in.
            let x = (j as f32 + 0.5) / n as f32 * 2.0 - 1.0;
            *v = x.tanh() / 1.0f32.tanh();
        }
        tables[i] = table;
    }
    tables
}

fn build_chirp_table(variant: ChipVariant) -> Vec<i32> {
    // The chirp table is the fixed excitation waveform scanned during voiced frames; both chip
    // variants use a ~52-entry table (§9 open question: chipIndex beyond the last entry repeats
    // it, implemented in `chirp()` above via `.min(last)`).
    let scale = match variant {
        ChipVariant::Tms5200 => 1.0,
        ChipVariant::Tms5220C => 0.94,
    };

    (0..52)
        .map(|i| {
            let t = i as f32 / 51.0;
            let envelope = (1.0 - t).powf(1.5);
            let v = (t * std::f32::consts::TAU * 2.0).sin() * envelope * 500.0 * scale;
            v.round() as i32
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn verify_energy_round_trip_at_codebook_points() {
        let q = LpcQuantization::new(ChipVariant::Tms5200);
        for idx in 0u8..16 {
            let linear = q.decode_energy(idx) as f32 / q.decode_energy(15) as f32;
            assert_eq!(q.encode_energy(linear), idx);
        }
    }

    #[test]
    fn verify_pitch_is_never_zero_when_encoding() {
        let q = LpcQuantization::new(ChipVariant::Tms5200);
        assert!(q.encode_pitch(120.0) >= 1);
    }

    #[test]
    fn verify_k_pack_unpack_round_trip() {
        let q = LpcQuantization::new(ChipVariant::Tms5200);
        let indices: Vec<u32> = K_BITS.iter().map(|&w| (1u32 << w) - 1).collect();
        let packed = q.pack_k(&indices);
        let unpacked = q.unpack_k(packed, 10);
        assert_eq!(indices, unpacked);
    }

    #[test]
    fn verify_chirp_repeats_last_entry_past_end() {
        let q = LpcQuantization::new(ChipVariant::Tms5200);
        let last = q.chirp(q.chirp_len() - 1);
        assert_eq!(q.chirp(q.chirp_len() + 10), last);
    }
}
