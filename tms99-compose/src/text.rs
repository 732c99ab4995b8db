// Symphonia
// Copyright (c) 2019-2022 The Project Symphonia Developers.
//
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! The xas99-compatible TMS text format (§4.8, §6).
//!
//! The binary writer emits header words and addresses little-endian. xas99's `text` directive
//! assembles its operand as a sequence of big-endian 16-bit words, so a word that must end up
//! little-endian on the chip has to be byte-swapped before it is printed as hex: the assembler's
//! big-endian store of the swapped word is bit-for-bit the little-endian word the chip expects.
//! Each chunk is rendered as one or more `text >XXXX` lines, grouping the chunk's words the same
//! way the binary writer packs them (header word, then address for Display, then payload words
//! two bytes at a time with a final odd byte zero-padded high).

use std::io::{self, Write};

use tms99_core::errors::Result;

use crate::chunk::TmsChunk;

/// Writes `chunks` as xas99 `text >XXXX` directives, one word per line, byte-swapped so the
/// assembler's big-endian word store reproduces the binary format's little-endian bytes.
pub fn write_text<W: Write>(chunks: &[TmsChunk], out: &mut W) -> Result<()> {
    for chunk in chunks {
        for word in chunk_words(chunk)? {
            writeln!(out, "\ttext >{:04X}", word.swap_bytes()).map_err(io_err)?;
        }
    }
    Ok(())
}

fn io_err(err: io::Error) -> tms99_core::errors::TmsError {
    tms99_core::errors::TmsError::from(err)
}

/// The chunk's wire representation as a sequence of native (not yet byte-swapped) 16-bit words:
/// the header word, an address word for Display chunks, then the payload two bytes at a time
/// with a trailing odd byte zero-padded in the low byte's companion.
fn chunk_words(chunk: &TmsChunk) -> Result<Vec<u16>> {
    let mut words = vec![chunk.header_word()?];

    match chunk {
        TmsChunk::Display { addr, data } => {
            words.push(*addr);
            push_payload_words(&mut words, data);
        }
        TmsChunk::Sound(data) | TmsChunk::Speech(data) => {
            push_payload_words(&mut words, data);
        }
        TmsChunk::Vsync | TmsChunk::NextBank | TmsChunk::Eof => {}
    }

    Ok(words)
}

fn push_payload_words(words: &mut Vec<u16>, data: &[u8]) {
    let mut it = data.chunks(2);
    while let Some(pair) = it.next() {
        let lo = pair[0];
        let hi = pair.get(1).copied().unwrap_or(0);
        words.push(u16::from_le_bytes([lo, hi]));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn verify_vsync_is_one_word() {
        let mut buf = Vec::new();
        write_text(&[TmsChunk::Vsync], &mut buf).unwrap();
        assert_eq!(String::from_utf8(buf).unwrap(), "\ttext >CFFF\n");
    }

    #[test]
    fn verify_sound_chunk_swaps_header_and_payload_words() {
        let chunk = TmsChunk::Sound(vec![0x81, 0x23]);
        let mut buf = Vec::new();
        write_text(&[chunk], &mut buf).unwrap();
        let text = String::from_utf8(buf).unwrap();
        // Header word 0xFFE2 byte-swapped is 0xE2FF; payload word 0x2381 (LE [0x81,0x23])
        // byte-swapped is 0x8123.
        assert_eq!(text, "\ttext >E2FF\n\ttext >8123\n");
    }

    #[test]
    fn verify_display_chunk_includes_address_word() {
        let chunk = TmsChunk::Display { addr: 0x4000, data: vec![0xAB] };
        let mut buf = Vec::new();
        write_text(&[chunk], &mut buf).unwrap();
        let text = String::from_utf8(buf).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        // header word (len=1), address word, one payload word (odd byte zero-padded high).
        assert_eq!(lines.len(), 3);
        assert_eq!(lines[0], "\ttext >0100"); // header 0x0001 byte-swapped
        assert_eq!(lines[1], "\ttext >0040"); // address 0x4000 byte-swapped
        assert_eq!(lines[2], "\ttext >00AB"); // payload word 0x00AB (LE [0xAB,0x00]) byte-swapped
    }
}
