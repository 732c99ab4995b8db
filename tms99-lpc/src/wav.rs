// Symphonia
// Copyright (c) 2019-2022 The Project Symphonia Developers.
//
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! A minimal WAVE reader for the encoder's input: walks the RIFF chunk chain looking for `fmt `
//! and `data`, verifying the stream is 8 kHz 16-bit mono PCM (§4.5's standing assumption), and
//! hands back the raw samples.
//!
//! This follows the same RIFF chunk-walking shape as a general-purpose WAVE demuxer, trimmed down
//! to what the encoder actually needs: no seeking, no metadata, no packetization, just "give me
//! every sample".

use std::io::Read;

use tms99_core::errors::{decode_error, unsupported_error, Result};
use tms99_core::io::ReadBytes;

const RIFF_MARKER: [u8; 4] = *b"RIFF";
const WAVE_FORM: [u8; 4] = *b"WAVE";
const FMT_CHUNK: [u8; 4] = *b"fmt ";
const DATA_CHUNK: [u8; 4] = *b"data";

const PCM_FORMAT_TAG: u16 = 1;

/// The encoder's required input format: 8 kHz, 16-bit, mono, linear PCM.
pub const REQUIRED_SAMPLE_RATE: u32 = 8_000;
pub const REQUIRED_CHANNELS: u16 = 1;
pub const REQUIRED_BITS_PER_SAMPLE: u16 = 16;

/// Reads an entire WAVE stream's `data` chunk as signed 16-bit samples, verifying the format
/// chunk matches the encoder's required input format. Opens the source fresh each call, matching
/// the encoder's "each pass opens a fresh reader" design (§5).
pub fn read_pcm16_mono_8khz<R: Read>(mut source: R) -> Result<Vec<i16>> {
    let marker = source.read_quad_bytes()?;
    if marker != RIFF_MARKER {
        return unsupported_error("wav: missing RIFF stream marker");
    }

    // Overall RIFF chunk length; unused beyond validating the file isn't empty.
    let _riff_len = source.read_u32()?;

    let form = source.read_quad_bytes()?;
    if form != WAVE_FORM {
        return unsupported_error("wav: riff form is not WAVE");
    }

    let mut sample_rate = None;
    let mut channels = None;
    let mut bits_per_sample = None;

    loop {
        let id = source.read_quad_bytes()?;
        let len = source.read_u32()? as usize;

        if id == FMT_CHUNK {
            if len < 16 {
                return decode_error("wav: fmt chunk too short");
            }
            let format_tag = source.read_u16()?;
            let ch = source.read_u16()?;
            let rate = source.read_u32()?;
            let _byte_rate = source.read_u32()?;
            let _block_align = source.read_u16()?;
            let bits = source.read_u16()?;

            if format_tag != PCM_FORMAT_TAG {
                return unsupported_error("wav: only PCM format is supported");
            }

            // Skip any extra fmt bytes (cbSize and extension data on extensible formats).
            let consumed = 16;
            if len > consumed {
                source.ignore_bytes((len - consumed) as u64)?;
            }
            if len % 2 == 1 {
                source.ignore_bytes(1)?;
            }

            sample_rate = Some(rate);
            channels = Some(ch);
            bits_per_sample = Some(bits);
        }
        else if id == DATA_CHUNK {
            let (Some(rate), Some(ch), Some(bits)) = (sample_rate, channels, bits_per_sample)
            else {
                return decode_error("wav: data chunk precedes fmt chunk");
            };

            if rate != REQUIRED_SAMPLE_RATE {
                return unsupported_error("wav: encoder requires 8 kHz input");
            }
            if ch != REQUIRED_CHANNELS {
                return unsupported_error("wav: encoder requires mono input");
            }
            if bits != REQUIRED_BITS_PER_SAMPLE {
                return unsupported_error("wav: encoder requires 16-bit input");
            }

            let n_samples = len / 2;
            let mut samples = Vec::with_capacity(n_samples);
            for _ in 0..n_samples {
                samples.push(source.read_u16()? as i16);
            }
            if len % 2 == 1 {
                source.ignore_bytes(1)?;
            }

            return Ok(samples);
        }
        else {
            // An unrecognized chunk (LIST, cue, fact, ...); skip it whole.
            source.ignore_bytes(len as u64)?;
            if len % 2 == 1 {
                source.ignore_bytes(1)?;
            }
        }
    }
}

/// Writes `samples` as a minimal 8 kHz 16-bit mono WAVE file, the reference renderer's output
/// format (§11).
pub fn write_pcm16_mono_8khz(samples: &[i16]) -> Vec<u8> {
    let data_len = samples.len() * 2;
    let mut out = Vec::with_capacity(44 + data_len);

    out.extend_from_slice(b"RIFF");
    out.extend_from_slice(&((36 + data_len) as u32).to_le_bytes());
    out.extend_from_slice(b"WAVE");

    out.extend_from_slice(b"fmt ");
    out.extend_from_slice(&16u32.to_le_bytes());
    out.extend_from_slice(&PCM_FORMAT_TAG.to_le_bytes());
    out.extend_from_slice(&REQUIRED_CHANNELS.to_le_bytes());
    out.extend_from_slice(&REQUIRED_SAMPLE_RATE.to_le_bytes());
    let byte_rate = REQUIRED_SAMPLE_RATE * REQUIRED_CHANNELS as u32 * 2;
    out.extend_from_slice(&byte_rate.to_le_bytes());
    let block_align = REQUIRED_CHANNELS * 2;
    out.extend_from_slice(&block_align.to_le_bytes());
    out.extend_from_slice(&REQUIRED_BITS_PER_SAMPLE.to_le_bytes());

    out.extend_from_slice(b"data");
    out.extend_from_slice(&(data_len as u32).to_le_bytes());
    for &s in samples {
        out.extend_from_slice(&s.to_le_bytes());
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    #[test]
    fn verify_round_trip_through_write_and_read() {
        let samples: Vec<i16> = (0..400).map(|i| (i * 17) as i16).collect();
        let bytes = write_pcm16_mono_8khz(&samples);
        let decoded = read_pcm16_mono_8khz(Cursor::new(bytes)).unwrap();
        assert_eq!(decoded, samples);
    }

    #[test]
    fn verify_rejects_non_matching_sample_rate() {
        let mut file = Vec::new();
        file.extend_from_slice(b"RIFF");
        file.extend_from_slice(&36u32.to_le_bytes());
        file.extend_from_slice(b"WAVE");
        file.extend_from_slice(b"fmt ");
        file.extend_from_slice(&16u32.to_le_bytes());
        file.extend_from_slice(&1u16.to_le_bytes());
        file.extend_from_slice(&1u16.to_le_bytes());
        file.extend_from_slice(&44_100u32.to_le_bytes());
        file.extend_from_slice(&88_200u32.to_le_bytes());
        file.extend_from_slice(&2u16.to_le_bytes());
        file.extend_from_slice(&16u16.to_le_bytes());
        file.extend_from_slice(b"data");
        file.extend_from_slice(&0u32.to_le_bytes());

        assert!(read_pcm16_mono_8khz(Cursor::new(file)).is_err());
    }
}
