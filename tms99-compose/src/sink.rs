// Symphonia
// Copyright (c) 2019-2022 The Project Symphonia Developers.
//
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! The TMS sink (§6) and its bank-partitioning binary writer (§3, §4.7 "Bank management").

use tms99_core::errors::Result;
use tms99_core::io::WriteBytes;

use crate::chunk::TmsChunk;

/// Default physical bank size in bytes (§3).
pub const DEFAULT_BANK_SIZE: usize = 8_192;

/// The composer's output collaborator (§6): four chunk-writing methods plus `close`, with bank
/// accounting owned entirely by the sink so the composer never has to reason about byte offsets.
pub trait TmsSink {
    fn write_display(&mut self, addr: u16, data: &[u8]) -> Result<()>;
    fn write_sound(&mut self, data: &[u8]) -> Result<()>;
    fn write_speech(&mut self, data: &[u8]) -> Result<()>;
    fn write_vsync(&mut self) -> Result<()>;
    fn close(&mut self) -> Result<()>;
}

/// A [`TmsSink`] that partitions its output into fixed-size banks (§3, §4.7), emitting a
/// `NextBank` marker and zero-padding whenever the next chunk would straddle a bank boundary.
pub struct BankWriter<W> {
    writer: W,
    bank_size: usize,
    bank_bytes: usize,
    bank_count: usize,
    closed: bool,
}

impl<W: WriteBytes> BankWriter<W> {
    pub fn new(writer: W) -> Self {
        Self::with_bank_size(writer, DEFAULT_BANK_SIZE)
    }

    pub fn with_bank_size(writer: W, bank_size: usize) -> Self {
        BankWriter { writer, bank_size, bank_bytes: 0, bank_count: 0, closed: false }
    }

    /// Number of `NextBank` transitions emitted so far.
    pub fn bank_count(&self) -> usize {
        self.bank_count
    }

    /// Consumes the writer, returning the underlying sink. Panics if `close` was never called,
    /// since an unclosed stream has no terminating `Eof` chunk.
    pub fn into_inner(self) -> W {
        assert!(self.closed, "BankWriter dropped without calling close()");
        self.writer
    }

    /// Emits a `NextBank` marker and pads the remainder of the current bank to `bank_size` with
    /// zero bytes (§3, §4.7).
    fn roll_bank(&mut self) -> Result<()> {
        TmsChunk::NextBank.write(&mut self.writer)?;
        self.bank_bytes += 2;
        self.pad_bank()?;
        self.bank_count += 1;
        self.bank_bytes = 0;
        Ok(())
    }

    fn pad_bank(&mut self) -> Result<()> {
        let remaining = self.bank_size.saturating_sub(self.bank_bytes);
        for _ in 0..remaining {
            self.writer.write_byte(0)?;
        }
        Ok(())
    }

    /// Rolls to a new bank if `chunk` (plus the two-byte `NextBank` marker that would be needed
    /// to roll) cannot fit in what remains of the current one (§4.7's bank management check).
    fn ensure_room(&mut self, needed: usize) -> Result<()> {
        if self.bank_bytes + needed + 2 > self.bank_size {
            self.roll_bank()?;
        }
        Ok(())
    }

    fn emit(&mut self, chunk: TmsChunk) -> Result<()> {
        let needed = chunk.encoded_len();
        self.ensure_room(needed)?;
        chunk.write(&mut self.writer)?;
        self.bank_bytes += needed;
        Ok(())
    }
}

impl<W: WriteBytes> TmsSink for BankWriter<W> {
    fn write_display(&mut self, addr: u16, data: &[u8]) -> Result<()> {
        self.emit(TmsChunk::Display { addr, data: data.to_vec() })
    }

    fn write_sound(&mut self, data: &[u8]) -> Result<()> {
        self.emit(TmsChunk::Sound(data.to_vec()))
    }

    fn write_speech(&mut self, data: &[u8]) -> Result<()> {
        self.emit(TmsChunk::Speech(data.to_vec()))
    }

    fn write_vsync(&mut self) -> Result<()> {
        self.emit(TmsChunk::Vsync)
    }

    /// Emits `Eof` and pads the final bank, but does not roll to a new one (§4.7's normal
    /// termination: "emit Eof, close the final bank").
    fn close(&mut self) -> Result<()> {
        if self.closed {
            return Ok(());
        }
        let needed = TmsChunk::Eof.encoded_len();
        self.ensure_room(needed)?;
        TmsChunk::Eof.write(&mut self.writer)?;
        self.bank_bytes += needed;
        self.pad_bank()?;
        self.closed = true;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tms99_core::io::BufWriter;

    #[test]
    fn verify_small_stream_fits_in_one_bank_no_rolls() {
        let mut sink = BankWriter::new(BufWriter::new());
        sink.write_display(0x4000, &[1, 2, 3]).unwrap();
        sink.write_vsync().unwrap();
        sink.close().unwrap();
        assert_eq!(sink.bank_count(), 0);

        let bytes = sink.into_inner().into_bytes();
        assert_eq!(bytes.len(), DEFAULT_BANK_SIZE);
    }

    #[test]
    fn verify_bank_overflow_emits_next_bank_and_pads() {
        let mut sink = BankWriter::new(BufWriter::new());
        // 8,180 bytes of display payload followed by a 20-byte sound chunk, the bank-overflow
        // golden scenario (§8): the remaining 8 bytes of the first bank can hold neither the
        // 22-byte sound chunk nor a NextBank marker alongside it.
        sink.write_display(0x0000, &vec![0xAAu8; 8_180]).unwrap();
        sink.write_sound(&vec![0x9Fu8; 20]).unwrap();
        sink.close().unwrap();

        assert_eq!(sink.bank_count(), 1);
        let bytes = sink.into_inner().into_bytes();
        assert_eq!(bytes.len(), 2 * DEFAULT_BANK_SIZE);

        // The display chunk plus its header/address occupies the first 8,184 bytes; the
        // remaining 8 bytes of the first bank are the NextBank marker and zero padding.
        let next_bank_header = u16::from_le_bytes([bytes[8_184], bytes[8_185]]);
        assert_eq!(next_bank_header, 0xFFCE);
        assert!(bytes[8_186..8_192].iter().all(|&b| b == 0));
    }
}
