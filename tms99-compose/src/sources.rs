// Symphonia
// Copyright (c) 2019-2022 The Project Symphonia Developers.
//
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! The composer's input collaborators (§6). Image decoding, display-delta computation, MusicXML
//! and VGM parsing are out of scope; these traits are the seam a caller plugs such
//! implementations into. [`VecDisplaySource`], [`VecSoundSource`], and [`VecLpcSource`] are
//! minimal in-memory implementations used by the composer's own tests.

use tms99_core::errors::Result;

/// A source of display-delta bytes, already split into `delta1`/`delta2` halves by a wrapper the
/// composer doesn't own (§6). Each returned part carries the VDP address it must be written to;
/// the two halves of one logical frame may target different addresses (e.g. pattern table then
/// color table).
pub trait DisplaySource {
    /// Returns the next delta part's VDP address and bytes, or `None` at end of stream.
    fn read_frame(&mut self) -> Result<Option<(u16, Vec<u8>)>>;
    /// Discards `n` leading frames without returning them, used when a source opens partway
    /// through the timeline (§4.7 step 1).
    fn skip_frames(&mut self, n: usize) -> Result<()>;
    fn close(&mut self);
}

/// A source of one PSG command frame per tick (§6). SND- and VGM-backed implementations share
/// this interface; VGM is out of scope here.
pub trait SoundSource {
    fn read_frame(&mut self) -> Result<Option<Vec<u8>>>;
    fn skip_frames(&mut self, n: usize) -> Result<()>;
    fn close(&mut self);
}

/// A source of one LPC frame's raw bits per call (§6). The `0x60` speak-external prefix the
/// composer inserts on priming is added by the composer itself, not by the source.
pub trait LpcSpeechSource {
    fn read_frame(&mut self) -> Result<Option<Vec<u8>>>;
    fn close(&mut self);
}

/// A [`DisplaySource`] backed by a fixed in-memory list of `(addr, bytes)` delta parts.
pub struct VecDisplaySource {
    frames: Vec<(u16, Vec<u8>)>,
    pos: usize,
}

impl VecDisplaySource {
    pub fn new(frames: Vec<(u16, Vec<u8>)>) -> Self {
        VecDisplaySource { frames, pos: 0 }
    }
}

impl DisplaySource for VecDisplaySource {
    fn read_frame(&mut self) -> Result<Option<(u16, Vec<u8>)>> {
        Ok(self.frames.get(self.pos).cloned().inspect(|_| self.pos += 1))
    }

    fn skip_frames(&mut self, n: usize) -> Result<()> {
        self.pos = (self.pos + n).min(self.frames.len());
        Ok(())
    }

    fn close(&mut self) {
        self.pos = self.frames.len();
    }
}

/// A [`SoundSource`] backed by a fixed in-memory list of per-tick PSG byte frames.
pub struct VecSoundSource {
    frames: Vec<Vec<u8>>,
    pos: usize,
}

impl VecSoundSource {
    pub fn new(frames: Vec<Vec<u8>>) -> Self {
        VecSoundSource { frames, pos: 0 }
    }
}

impl SoundSource for VecSoundSource {
    fn read_frame(&mut self) -> Result<Option<Vec<u8>>> {
        Ok(self.frames.get(self.pos).cloned().inspect(|_| self.pos += 1))
    }

    fn skip_frames(&mut self, n: usize) -> Result<()> {
        self.pos = (self.pos + n).min(self.frames.len());
        Ok(())
    }

    fn close(&mut self) {
        self.pos = self.frames.len();
    }
}

/// An [`LpcSpeechSource`] yielding each frame's raw bytes from a fixed list, as decoded by the
/// LPC bitstream reader (§4.1); the composer is responsible for chunking these into
/// `SPEECH_MAX_LEN`-sized pieces.
pub struct VecLpcSource {
    frames: Vec<Vec<u8>>,
    pos: usize,
}

impl VecLpcSource {
    pub fn new(frames: Vec<Vec<u8>>) -> Self {
        VecLpcSource { frames, pos: 0 }
    }
}

impl LpcSpeechSource for VecLpcSource {
    fn read_frame(&mut self) -> Result<Option<Vec<u8>>> {
        Ok(self.frames.get(self.pos).cloned().inspect(|_| self.pos += 1))
    }

    fn close(&mut self) {
        self.pos = self.frames.len();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn verify_display_source_skips_and_exhausts() {
        let mut source =
            VecDisplaySource::new(vec![(0x4000, vec![1]), (0x4000, vec![2]), (0x4000, vec![3])]);
        source.skip_frames(1).unwrap();
        assert_eq!(source.read_frame().unwrap(), Some((0x4000, vec![2])));
        assert_eq!(source.read_frame().unwrap(), Some((0x4000, vec![3])));
        assert_eq!(source.read_frame().unwrap(), None);
    }

    #[test]
    fn verify_sound_source_skips_and_exhausts() {
        let mut source = VecSoundSource::new(vec![vec![1], vec![2]]);
        assert_eq!(source.read_frame().unwrap(), Some(vec![1]));
        source.close();
        assert_eq!(source.read_frame().unwrap(), None);
    }
}
