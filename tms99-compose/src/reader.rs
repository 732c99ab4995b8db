// Symphonia
// Copyright (c) 2019-2022 The Project Symphonia Developers.
//
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! The bank-aware counterpart to [`crate::sink::BankWriter`]: a reader that skips a bank's zero
//! padding after each `NextBank` marker so chunk boundaries realign with [`crate::chunk::read_chunk`].

use tms99_core::errors::Result;
use tms99_core::io::ReadBytes;

use crate::chunk::{read_chunk, TmsChunk};
use crate::sink::DEFAULT_BANK_SIZE;

/// Reads a `TmsChunk` stream, tracking position within the current physical bank so that a
/// `NextBank` marker's trailing zero padding is skipped rather than misparsed as chunks.
pub struct TmsReader<R> {
    reader: R,
    bank_size: usize,
    bank_bytes: usize,
    done: bool,
}

impl<R: ReadBytes> TmsReader<R> {
    pub fn new(reader: R) -> Self {
        Self::with_bank_size(reader, DEFAULT_BANK_SIZE)
    }

    pub fn with_bank_size(reader: R, bank_size: usize) -> Self {
        TmsReader { reader, bank_size, bank_bytes: 0, done: false }
    }

    /// Returns the next chunk, or `Ok(None)` once `Eof` has been read or the stream ends cleanly.
    /// On a `NextBank` marker, the rest of the current bank's zero padding is consumed before
    /// returning, so the following call starts aligned to the next bank's first header word.
    pub fn next_chunk(&mut self) -> Result<Option<TmsChunk>> {
        if self.done {
            return Ok(None);
        }

        let Some(chunk) = read_chunk(&mut self.reader)?
        else {
            self.done = true;
            return Ok(None);
        };

        self.bank_bytes += chunk.encoded_len();

        match chunk {
            TmsChunk::NextBank => {
                let remaining = self.bank_size.saturating_sub(self.bank_bytes);
                self.reader.ignore_bytes(remaining as u64)?;
                self.bank_bytes = 0;
                Ok(Some(chunk))
            }
            TmsChunk::Eof => {
                self.done = true;
                Ok(Some(chunk))
            }
            _ => Ok(Some(chunk)),
        }
    }
}

impl<R: ReadBytes> Iterator for TmsReader<R> {
    type Item = Result<TmsChunk>;

    fn next(&mut self) -> Option<Result<TmsChunk>> {
        self.next_chunk().transpose()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sink::{BankWriter, TmsSink};
    use tms99_core::io::BufWriter;

    #[test]
    fn verify_reader_skips_bank_padding_transparently() {
        let mut sink = BankWriter::new(BufWriter::new());
        sink.write_display(0x0000, &vec![0xAAu8; 8_180]).unwrap();
        sink.write_sound(&vec![0x9Fu8; 20]).unwrap();
        sink.write_vsync().unwrap();
        sink.close().unwrap();

        let bytes = sink.into_inner().into_bytes();
        let mut reader = TmsReader::new(bytes.as_slice());

        let mut chunks = Vec::new();
        while let Some(chunk) = reader.next_chunk().unwrap() {
            chunks.push(chunk);
        }

        assert!(matches!(chunks[0], TmsChunk::Display { .. }));
        assert_eq!(chunks[1], TmsChunk::NextBank);
        assert!(matches!(chunks[2], TmsChunk::Sound(_)));
        assert_eq!(chunks[3], TmsChunk::Vsync);
        assert_eq!(chunks[4], TmsChunk::Eof);
        assert_eq!(chunks.len(), 5);
    }

    #[test]
    fn verify_round_trip_excluding_trailing_padding_after_eof() {
        let mut sink = BankWriter::new(BufWriter::new());
        sink.write_display(0x4000, &[1, 2, 3, 4]).unwrap();
        sink.write_vsync().unwrap();
        sink.write_sound(&[0x81, 0x00]).unwrap();
        sink.close().unwrap();
        let original = sink.into_inner().into_bytes();

        let mut reader = TmsReader::new(original.as_slice());
        let chunks: Vec<TmsChunk> =
            std::iter::from_fn(|| reader.next_chunk().unwrap()).collect();

        let mut resink = BankWriter::new(BufWriter::new());
        for chunk in &chunks {
            match chunk {
                TmsChunk::Display { addr, data } => resink.write_display(*addr, data).unwrap(),
                TmsChunk::Sound(data) => resink.write_sound(data).unwrap(),
                TmsChunk::Speech(data) => resink.write_speech(data).unwrap(),
                TmsChunk::Vsync => resink.write_vsync().unwrap(),
                TmsChunk::NextBank => {}
                TmsChunk::Eof => resink.close().unwrap(),
            }
        }
        let rewritten = resink.into_inner().into_bytes();

        assert_eq!(rewritten, original);
    }
}
