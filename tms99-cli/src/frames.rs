// Symphonia
// Copyright (c) 2019-2022 The Project Symphonia Developers.
//
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! A minimal length-prefixed display-delta interchange format for the `compose` subcommand.
//!
//! Producing real display deltas means decoding images, an out-of-scope external collaborator per
//! the composer's design. This reader instead loads the small ad-hoc binary format the CLI's own
//! test fixtures are written in, so `compose --display` has something concrete to drive
//! [`tms99_compose::compose`] with. The sound side uses the real SND binary format
//! ([`tms99_core::snd::read_snd`]) instead, since that format is part of the specification.

use std::io::Read;

use tms99_core::errors::Result;
use tms99_core::io::ReadBytes;

/// Reads a sequence of `(address, payload)` display-delta parts: each is a little-endian `u16`
/// VDP address, a little-endian `u32` payload length, then the payload bytes.
pub fn read_display_frames<R: Read>(mut source: R) -> Result<Vec<(u16, Vec<u8>)>> {
    let mut frames = Vec::new();
    loop {
        let addr = match source.read_u16() {
            Ok(addr) => addr,
            Err(_) => break,
        };
        let len = source.read_u32()? as usize;
        let mut payload = vec![0u8; len];
        source.read_buf_exact(&mut payload)?;
        frames.push((addr, payload));
    }
    Ok(frames)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    #[test]
    fn verify_display_frames_round_trip() {
        let mut bytes = Vec::new();
        bytes.extend_from_slice(&0x4000u16.to_le_bytes());
        bytes.extend_from_slice(&3u32.to_le_bytes());
        bytes.extend_from_slice(&[1, 2, 3]);

        let frames = read_display_frames(Cursor::new(bytes)).unwrap();
        assert_eq!(frames, vec![(0x4000, vec![1, 2, 3])]);
    }
}
