// Symphonia
// Copyright (c) 2019-2022 The Project Symphonia Developers.
//
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! The [`LpcFrame`] tagged-variant model: five frame kinds sharing an `energy` field (except
//! [`LpcFrame::Stop`]), each with its own bit-layout, matching §3 of the format this crate
//! implements.

use crate::errors::{decode_error, Result};
use crate::io::{BitReaderRtl, BitWriterRtl, FiniteBitStream};

use super::quant::{K_BITS, UNVOICED_K_COUNT};

/// One 4/11/29/50-bit LPC-10 speech frame.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LpcFrame {
    /// 4 bits, energy nibble `0000`. 25 ms of silence.
    Silence,
    /// 4 bits, energy nibble `1111`. Terminates a speech stream.
    Stop,
    /// 11 bits. Reuses the previous non-repeat frame's coefficients with a new energy and pitch.
    Repeat { energy: u8, pitch: u8 },
    /// 29 bits. Unvoiced excitation, four reflection coefficients.
    Unvoiced { energy: u8, k: [u32; UNVOICED_K_COUNT] },
    /// 50 bits. Voiced excitation, ten reflection coefficients.
    Voiced { energy: u8, pitch: u8, k: [u32; 10] },
}

impl LpcFrame {
    /// Returns the number of bits this frame occupies in the bitstream.
    pub fn bit_len(&self) -> u32 {
        match self {
            LpcFrame::Silence | LpcFrame::Stop => 4,
            LpcFrame::Repeat { .. } => 11,
            LpcFrame::Unvoiced { .. } => 29,
            LpcFrame::Voiced { .. } => 50,
        }
    }

    /// Returns the frame's energy index, or `None` for [`LpcFrame::Stop`] (which has no
    /// meaningful energy; its nibble is the sentinel `15`).
    pub fn energy(&self) -> Option<u8> {
        match self {
            LpcFrame::Silence => Some(0),
            LpcFrame::Stop => None,
            LpcFrame::Repeat { energy, .. }
            | LpcFrame::Unvoiced { energy, .. }
            | LpcFrame::Voiced { energy, .. } => Some(*energy),
        }
    }

    /// Writes this frame's bits to `writer`.
    pub fn write(&self, writer: &mut BitWriterRtl) {
        match self {
            LpcFrame::Silence => writer.write_bits_leq32(0b0000, 4),
            LpcFrame::Stop => writer.write_bits_leq32(0b1111, 4),
            LpcFrame::Repeat { energy, pitch } => {
                writer.write_bits_leq32(*energy as u32, 4);
                writer.write_bit(true);
                writer.write_bits_leq32(*pitch as u32, 6);
            }
            LpcFrame::Unvoiced { energy, k } => {
                writer.write_bits_leq32(*energy as u32, 4);
                writer.write_bit(false);
                writer.write_bits_leq32(0, 6);
                for (i, &idx) in k.iter().enumerate() {
                    writer.write_bits_leq32(idx, K_BITS[i]);
                }
            }
            LpcFrame::Voiced { energy, pitch, k } => {
                writer.write_bits_leq32(*energy as u32, 4);
                writer.write_bit(false);
                writer.write_bits_leq32(*pitch as u32, 6);
                for (i, &idx) in k.iter().enumerate() {
                    writer.write_bits_leq32(idx, K_BITS[i]);
                }
            }
        }
    }

    /// Reads one frame from `reader`. Returns `Ok(None)` if fewer than 4 bits remain (clean
    /// end-of-stream at a frame boundary).
    pub fn read(reader: &mut BitReaderRtl<'_>) -> Result<Option<LpcFrame>> {
        if reader.bits_left() < 4 {
            return Ok(None);
        }

        let energy = reader.read_bits_leq32(4)? as u8;

        if energy == 0 {
            return Ok(Some(LpcFrame::Silence));
        }
        if energy == 0xF {
            return Ok(Some(LpcFrame::Stop));
        }

        if reader.bits_left() < 1 {
            return decode_error("truncated LPC frame: missing repeat bit");
        }
        let repeat = reader.read_bit()?;

        if repeat {
            if reader.bits_left() < 6 {
                return decode_error("truncated LPC frame: missing repeat pitch");
            }
            let pitch = reader.read_bits_leq32(6)? as u8;
            return Ok(Some(LpcFrame::Repeat { energy, pitch }));
        }

        if reader.bits_left() < 6 {
            return decode_error("truncated LPC frame: missing pitch field");
        }
        let pitch = reader.read_bits_leq32(6)? as u8;

        if pitch == 0 {
            let bits: u32 = K_BITS[..UNVOICED_K_COUNT].iter().sum();
            if reader.bits_left() < bits as u64 {
                return decode_error("truncated LPC frame: missing unvoiced coefficients");
            }
            let mut k = [0u32; UNVOICED_K_COUNT];
            for (i, slot) in k.iter_mut().enumerate() {
                *slot = reader.read_bits_leq32(K_BITS[i])?;
            }
            Ok(Some(LpcFrame::Unvoiced { energy, k }))
        }
        else {
            let bits: u32 = K_BITS.iter().sum();
            if reader.bits_left() < bits as u64 {
                return decode_error("truncated LPC frame: missing voiced coefficients");
            }
            let mut k = [0u32; 10];
            for (i, slot) in k.iter_mut().enumerate() {
                *slot = reader.read_bits_leq32(K_BITS[i])?;
            }
            Ok(Some(LpcFrame::Voiced { energy, pitch, k }))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn round_trip(frame: &LpcFrame) -> LpcFrame {
        let mut writer = BitWriterRtl::new();
        frame.write(&mut writer);
        assert_eq!(writer.bits_written(), frame.bit_len() as u64);

        let bytes = writer.into_bytes();
        let mut reader = BitReaderRtl::new(&bytes);
        LpcFrame::read(&mut reader).unwrap().unwrap()
    }

    #[test]
    fn verify_silence_and_stop_round_trip() {
        assert_eq!(round_trip(&LpcFrame::Silence), LpcFrame::Silence);
        assert_eq!(round_trip(&LpcFrame::Stop), LpcFrame::Stop);
    }

    #[test]
    fn verify_repeat_round_trip() {
        let frame = LpcFrame::Repeat { energy: 7, pitch: 0x12 };
        assert_eq!(round_trip(&frame), frame);
    }

    #[test]
    fn verify_unvoiced_round_trip() {
        let frame = LpcFrame::Unvoiced { energy: 3, k: [1, 2, 3, 4] };
        assert_eq!(round_trip(&frame), frame);
    }

    #[test]
    fn verify_voiced_round_trip_matches_golden_path_lengths() {
        let frame = LpcFrame::Voiced { energy: 5, pitch: 0x12, k: [1, 2, 3, 4, 5, 6, 7, 1, 2, 3] };
        assert_eq!(frame.bit_len(), 50);
        assert_eq!(round_trip(&frame), frame);
    }

    #[test]
    fn verify_sequence_total_bit_length() {
        let seq = [
            LpcFrame::Voiced { energy: 5, pitch: 0x12, k: [0; 10] },
            LpcFrame::Silence,
            LpcFrame::Voiced { energy: 5, pitch: 0x12, k: [0; 10] },
        ];

        let mut writer = BitWriterRtl::new();
        for frame in &seq {
            frame.write(&mut writer);
        }
        assert_eq!(writer.bits_written(), 50 + 4 + 50);

        let bytes = writer.into_bytes();
        let mut reader = BitReaderRtl::new(&bytes);
        let mut decoded = Vec::new();
        while let Some(frame) = LpcFrame::read(&mut reader).unwrap() {
            decoded.push(frame);
        }
        assert_eq!(decoded, seq);
    }
}
