// Symphonia
// Copyright (c) 2019-2022 The Project Symphonia Developers.
//
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! The LPC text format (§6): one frame per line, fields separated by single spaces.
//!
//! ```text
//! 0                          -> Silence
//! f                          -> Stop
//! <e:1hex> <p:2hex>          -> Repeat
//! <e:1hex> <k:5hex>          -> Unvoiced
//! <e:1hex> <p:2hex> <k:10hex> -> Voiced
//! ```
//!
//! Lines beginning with `#` and empty lines are ignored. Round-tripping `binary -> text ->
//! binary` is the identity for well-formed input.

use std::io::{self, BufRead, Write};

use super::frame::LpcFrame;
use super::quant::{pack_k_bits, unpack_k_bits, UNVOICED_K_COUNT};
use crate::errors::{decode_error, Result};

/// Writes `frames` to `out` in the text grammar described above, one frame per line.
pub fn write_text<W: Write>(frames: &[LpcFrame], out: &mut W) -> Result<()> {
    for frame in frames {
        writeln!(out, "{}", format_line(frame)).map_err(io_err)?;
    }
    Ok(())
}

/// Reads a sequence of frames from `input`, skipping blank lines and `#` comments.
pub fn read_text<R: BufRead>(input: &mut R) -> Result<Vec<LpcFrame>> {
    let mut frames = Vec::new();

    for line in input.lines() {
        let line = line.map_err(io_err)?;
        let trimmed = line.trim();
        if trimmed.is_empty() || trimmed.starts_with('#') {
            continue;
        }
        frames.push(parse_line(trimmed)?);
    }

    Ok(frames)
}

fn io_err(err: io::Error) -> crate::errors::TmsError {
    crate::errors::TmsError::from(err)
}

fn format_line(frame: &LpcFrame) -> String {
    match frame {
        LpcFrame::Silence => "0".to_string(),
        LpcFrame::Stop => "f".to_string(),
        LpcFrame::Repeat { energy, pitch } => format!("{:01x} {:02x}", energy, pitch),
        LpcFrame::Unvoiced { energy, k } => {
            let packed = pack_k_bits(k);
            format!("{:01x} {:05x}", energy, packed)
        }
        LpcFrame::Voiced { energy, pitch, k } => {
            let packed = pack_k_bits(k);
            format!("{:01x} {:02x} {:010x}", energy, pitch, packed)
        }
    }
}

fn parse_line(line: &str) -> Result<LpcFrame> {
    if line == "0" {
        return Ok(LpcFrame::Silence);
    }
    if line == "f" {
        return Ok(LpcFrame::Stop);
    }

    let fields: Vec<&str> = line.split_whitespace().collect();

    match fields.len() {
        // Ambiguous with Repeat by field count alone; disambiguate by the second field's
        // width: Repeat's pitch is 2 hex digits, Unvoiced's k is 5.
        2 if fields[1].len() == 5 => {
            let energy = parse_hex_u8(fields[0])?;
            let packed = parse_hex_u64(fields[1])?;
            let k = to_k_array(unpack_k_bits(packed, UNVOICED_K_COUNT));
            Ok(LpcFrame::Unvoiced { energy, k })
        }
        2 => {
            let energy = parse_hex_u8(fields[0])?;
            let pitch = parse_hex_u8(fields[1])?;
            Ok(LpcFrame::Repeat { energy, pitch })
        }
        3 => {
            let energy = parse_hex_u8(fields[0])?;
            let pitch = parse_hex_u8(fields[1])?;
            let packed = parse_hex_u64(fields[2])?;
            let unpacked = unpack_k_bits(packed, 10);
            let mut k = [0u32; 10];
            k.copy_from_slice(&unpacked);
            Ok(LpcFrame::Voiced { energy, pitch, k })
        }
        _ => decode_error("lpc text: malformed frame line"),
    }
}

fn to_k_array(v: Vec<u32>) -> [u32; UNVOICED_K_COUNT] {
    let mut k = [0u32; UNVOICED_K_COUNT];
    k.copy_from_slice(&v);
    k
}

fn parse_hex_u8(s: &str) -> Result<u8> {
    u8::from_str_radix(s, 16).map_err(|_| crate::errors::TmsError::DecodeError("lpc text: invalid hex field"))
}

fn parse_hex_u64(s: &str) -> Result<u64> {
    u64::from_str_radix(s, 16).map_err(|_| crate::errors::TmsError::DecodeError("lpc text: invalid hex field"))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn round_trip(frames: &[LpcFrame]) -> Vec<LpcFrame> {
        let mut buf = Vec::new();
        write_text(frames, &mut buf).unwrap();
        let mut reader = std::io::BufReader::new(buf.as_slice());
        read_text(&mut reader).unwrap()
    }

    #[test]
    fn verify_silence_and_stop() {
        let frames = vec![LpcFrame::Silence, LpcFrame::Stop];
        assert_eq!(round_trip(&frames), frames);
    }

    #[test]
    fn verify_repeat_and_voiced_and_unvoiced() {
        let frames = vec![
            LpcFrame::Repeat { energy: 7, pitch: 0x12 },
            LpcFrame::Voiced { energy: 5, pitch: 0x12, k: [1, 2, 3, 4, 5, 6, 7, 1, 2, 3] },
            LpcFrame::Unvoiced { energy: 3, k: [1, 2, 3, 4] },
        ];
        assert_eq!(round_trip(&frames), frames);
    }

    #[test]
    fn verify_comments_and_blank_lines_are_ignored() {
        let text = "# a comment\n\n0\n\nf\n";
        let mut reader = std::io::BufReader::new(text.as_bytes());
        let frames = read_text(&mut reader).unwrap();
        assert_eq!(frames, vec![LpcFrame::Silence, LpcFrame::Stop]);
    }
}
