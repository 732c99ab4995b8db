// Symphonia
// Copyright (c) 2019-2022 The Project Symphonia Developers.
//
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! The `TmsChunk` model (§3) and its binary encoding (§4.8): one little-endian header word
//! followed by a kind-specific payload, or no payload at all for the three fixed markers.

use tms99_core::errors::{range_error, Result, TmsError};
use tms99_core::io::{ReadBytes, WriteBytes};

/// Largest payload a Display chunk may carry.
pub const DISPLAY_MAX_LEN: usize = 0xFFCC;
/// Largest payload a Sound chunk may carry.
pub const SOUND_MAX_LEN: usize = 0x1F;
/// Largest payload a Speech chunk may carry.
pub const SPEECH_MAX_LEN: usize = 0x0F;

const SOUND_BASE: u16 = 0xFFE0;
const SPEECH_BASE: u16 = 0xFFD0;
const HDR_EOF: u16 = 0xFFCD;
const HDR_NEXT_BANK: u16 = 0xFFCE;
const HDR_VSYNC: u16 = 0xFFCF;

/// One unit of the multiplexed TMS stream (§3).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TmsChunk {
    /// A VDP write: a destination address and up to [`DISPLAY_MAX_LEN`] bytes.
    Display { addr: u16, data: Vec<u8> },
    /// Up to [`SOUND_MAX_LEN`] raw PSG latch bytes for one tick.
    Sound(Vec<u8>),
    /// Up to [`SPEECH_MAX_LEN`] raw LPC sub-frame bytes.
    Speech(Vec<u8>),
    /// One tick of the master clock.
    Vsync,
    /// Marks the boundary between two physical memory banks.
    NextBank,
    /// Terminates the stream.
    Eof,
}

impl TmsChunk {
    /// The little-endian header word this chunk serializes to, or a range error if a payload
    /// exceeds its kind's length ceiling (§3).
    pub fn header_word(&self) -> Result<u16> {
        match self {
            TmsChunk::Display { data, .. } => {
                if data.len() > DISPLAY_MAX_LEN {
                    return range_error("tms chunk: display payload exceeds 0xFFCC bytes");
                }
                Ok(data.len() as u16)
            }
            TmsChunk::Sound(data) => {
                if data.len() > SOUND_MAX_LEN {
                    return range_error("tms chunk: sound payload exceeds 0x1F bytes");
                }
                Ok(SOUND_BASE + data.len() as u16)
            }
            TmsChunk::Speech(data) => {
                if data.len() > SPEECH_MAX_LEN {
                    return range_error("tms chunk: speech payload exceeds 0x0F bytes");
                }
                Ok(SPEECH_BASE + data.len() as u16)
            }
            TmsChunk::Vsync => Ok(HDR_VSYNC),
            TmsChunk::NextBank => Ok(HDR_NEXT_BANK),
            TmsChunk::Eof => Ok(HDR_EOF),
        }
    }

    /// Total wire length of this chunk, header word included; what bank accounting must reserve
    /// space for (§4.7's `needed`).
    pub fn encoded_len(&self) -> usize {
        match self {
            TmsChunk::Display { data, .. } => 2 + 2 + data.len(),
            TmsChunk::Sound(data) => 2 + data.len(),
            TmsChunk::Speech(data) => 2 + data.len(),
            TmsChunk::Vsync | TmsChunk::NextBank | TmsChunk::Eof => 2,
        }
    }

    /// Writes this chunk's header word and payload, little-endian throughout (§4.8).
    pub fn write<W: WriteBytes>(&self, writer: &mut W) -> Result<()> {
        writer.write_u16(self.header_word()?)?;

        match self {
            TmsChunk::Display { addr, data } => {
                writer.write_u16(*addr)?;
                writer.write_buf(data)?;
            }
            TmsChunk::Sound(data) | TmsChunk::Speech(data) => {
                writer.write_buf(data)?;
            }
            TmsChunk::Vsync | TmsChunk::NextBank | TmsChunk::Eof => {}
        }

        Ok(())
    }
}

/// Reads one chunk from `reader`, classifying the header word by range (§4.8): the fixed markers
/// first, then Sound and Speech by their base offset, and everything else as a Display chunk
/// whose header word doubles as its payload length. Returns `Ok(None)` only when the stream ends
/// cleanly before a header word could be read at all.
pub fn read_chunk<R: ReadBytes>(reader: &mut R) -> Result<Option<TmsChunk>> {
    let header = match reader.read_u16() {
        Ok(h) => h,
        Err(TmsError::EndOfStream) => return Ok(None),
        Err(e) => return Err(e),
    };

    let chunk = match header {
        HDR_EOF => TmsChunk::Eof,
        HDR_NEXT_BANK => TmsChunk::NextBank,
        HDR_VSYNC => TmsChunk::Vsync,
        h if (SOUND_BASE..=0xFFFF).contains(&h) => {
            let len = (h - SOUND_BASE) as usize;
            let mut data = vec![0u8; len];
            reader.read_buf_exact(&mut data)?;
            TmsChunk::Sound(data)
        }
        h if (SPEECH_BASE..0xFFE0).contains(&h) => {
            let len = (h - SPEECH_BASE) as usize;
            let mut data = vec![0u8; len];
            reader.read_buf_exact(&mut data)?;
            TmsChunk::Speech(data)
        }
        h if h as usize <= DISPLAY_MAX_LEN => {
            let addr = reader.read_u16()?;
            let mut data = vec![0u8; h as usize];
            reader.read_buf_exact(&mut data)?;
            TmsChunk::Display { addr, data }
        }
        _ => return tms99_core::errors::decode_error("tms chunk: header word in reserved range"),
    };

    Ok(Some(chunk))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tms99_core::io::BufWriter;

    #[test]
    fn verify_display_header_is_its_length() {
        let chunk = TmsChunk::Display { addr: 0x4000, data: vec![1, 2, 3] };
        assert_eq!(chunk.header_word().unwrap(), 3);
    }

    #[test]
    fn verify_sound_and_speech_headers_are_offset() {
        assert_eq!(TmsChunk::Sound(vec![0; 4]).header_word().unwrap(), 0xFFE0 + 4);
        assert_eq!(TmsChunk::Speech(vec![0; 4]).header_word().unwrap(), 0xFFD0 + 4);
    }

    #[test]
    fn verify_oversized_payloads_are_rejected() {
        assert!(TmsChunk::Sound(vec![0; 32]).header_word().is_err());
        assert!(TmsChunk::Speech(vec![0; 16]).header_word().is_err());
        assert!(TmsChunk::Display { addr: 0, data: vec![0; DISPLAY_MAX_LEN + 1] }.header_word().is_err());
    }

    #[test]
    fn verify_round_trip_each_kind() {
        let chunks = vec![
            TmsChunk::Display { addr: 0x4000, data: vec![0xAB; 10] },
            TmsChunk::Sound(vec![0x81, 0x23]),
            TmsChunk::Speech(vec![0x60, 0x11]),
            TmsChunk::Vsync,
            TmsChunk::NextBank,
            TmsChunk::Eof,
        ];

        let mut writer = BufWriter::new();
        for chunk in &chunks {
            chunk.write(&mut writer).unwrap();
        }

        let bytes = writer.into_bytes();
        let mut cursor = bytes.as_slice();
        let mut decoded = Vec::new();
        while let Some(chunk) = read_chunk(&mut cursor).unwrap() {
            decoded.push(chunk);
        }

        assert_eq!(decoded, chunks);
    }

    #[test]
    fn verify_clean_eof_without_marker_returns_none() {
        let mut cursor: &[u8] = &[];
        assert_eq!(read_chunk(&mut cursor).unwrap(), None);
    }
}
