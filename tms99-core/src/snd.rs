// Symphonia
// Copyright (c) 2019-2022 The Project Symphonia Developers.
//
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! The programmable sound generator command model (§3) and its SND binary codec (§6).
//!
//! `SoundCommand` is a tagged variant over the chip's two latch types, `Frequency` and `Volume`,
//! addressed to one of its four internal generators. The wire encoding below follows the
//! four-channel PSG command-byte convention this family of sound chips uses: a one- or two-byte
//! "latch" sequence per command, with the noise generator (`N`) able to slave its period to tone
//! generator `T2` (§3's "named tuning conflict").

use crate::errors::{decode_error, range_error, Result};
use crate::io::{ReadBytes, WriteBytes};

/// One of the chip's four internal sound generators: three tone channels and one noise channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Generator {
    T0,
    T1,
    T2,
    N,
}

impl Generator {
    fn register(self) -> u8 {
        match self {
            Generator::T0 => 0,
            Generator::T1 => 1,
            Generator::T2 => 2,
            Generator::N => 3,
        }
    }

    fn from_register(reg: u8) -> Self {
        match reg {
            0 => Generator::T0,
            1 => Generator::T1,
            2 => Generator::T2,
            _ => Generator::N,
        }
    }

    /// `true` for the three tone generators, which take a 10-bit divider; `false` for noise,
    /// whose 3-bit value selects a fixed rate or couples to `T2` (§3).
    fn is_tone(self) -> bool {
        !matches!(self, Generator::N)
    }
}

/// Minimum and maximum tone divider value a `Frequency` command may carry (10-bit register).
pub const MIN_DIVIDER: u16 = 1;
pub const MAX_DIVIDER: u16 = 0x3FF;

/// One command latched into the sound chip.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SoundCommand {
    /// Sets a generator's period. For `N`, only the low 3 bits are meaningful; a value of `3`
    /// (both low bits set) couples the noise generator to `T2`'s frequency rather than selecting
    /// a fixed rate (§3).
    Frequency { generator: Generator, divider: u16 },
    /// Sets a generator's attenuation, `0` (loudest) to `15` (silent).
    Volume { generator: Generator, attenuation: u8 },
}

impl SoundCommand {
    /// Encodes this command as the one or two PSG latch bytes that would be written to the
    /// chip's data port.
    pub fn to_bytes(self) -> Vec<u8> {
        match self {
            SoundCommand::Frequency { generator, divider } => {
                if generator.is_tone() {
                    let divider = divider.clamp(MIN_DIVIDER, MAX_DIVIDER);
                    let low = (divider & 0xF) as u8;
                    let high = ((divider >> 4) & 0x3F) as u8;
                    vec![0x80 | (generator.register() << 5) | low, high]
                }
                else {
                    let data = (divider & 0x7) as u8;
                    vec![0x80 | (generator.register() << 5) | data]
                }
            }
            SoundCommand::Volume { generator, attenuation } => {
                let attenuation = attenuation.min(0xF);
                vec![0x80 | (generator.register() << 5) | 0x10 | attenuation]
            }
        }
    }
}

/// An ordered sequence of at most 31 [`SoundCommand`]s issued for one sound-chip frame tick
/// (§3; the 31 bound matches the SND chunk length ceiling of §6).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SoundFrame {
    commands: Vec<SoundCommand>,
}

/// Maximum number of commands a `SoundFrame` may hold.
pub const MAX_FRAME_COMMANDS: usize = 31;

impl SoundFrame {
    /// Creates an empty frame.
    pub fn new() -> Self {
        SoundFrame { commands: Vec::new() }
    }

    /// Wraps a command sequence, checking the §3 length bound.
    pub fn from_commands(commands: Vec<SoundCommand>) -> Result<Self> {
        if commands.len() > MAX_FRAME_COMMANDS {
            return decode_error("sound frame exceeds 31 commands");
        }
        Ok(SoundFrame { commands })
    }

    pub fn commands(&self) -> &[SoundCommand] {
        &self.commands
    }

    pub fn push(&mut self, command: SoundCommand) -> Result<()> {
        if self.commands.len() >= MAX_FRAME_COMMANDS {
            return decode_error("sound frame exceeds 31 commands");
        }
        self.commands.push(command);
        Ok(())
    }

    /// Encodes the frame's commands into chip-ready bytes, in order.
    pub fn to_bytes(&self) -> Vec<u8> {
        self.commands.iter().flat_map(|c| c.to_bytes()).collect()
    }

    /// Decodes a frame's raw chip bytes back into its `SoundCommand`s, the inverse of
    /// [`Self::to_bytes`]. A tone `Frequency` latch followed by a data byte is consumed as one
    /// command.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        let mut commands = Vec::new();
        let mut i = 0;

        while i < bytes.len() {
            let latch = bytes[i];
            if latch & 0x80 == 0 {
                return decode_error("sound chunk: expected a latch byte");
            }
            i += 1;

            let generator = Generator::from_register((latch >> 5) & 0x3);
            let is_volume = latch & 0x10 != 0;

            let command = if is_volume {
                SoundCommand::Volume { generator, attenuation: latch & 0xF }
            }
            else if generator.is_tone() {
                let high = *bytes.get(i).ok_or(crate::errors::TmsError::DecodeError(
                    "sound chunk: truncated tone frequency latch",
                ))?;
                i += 1;
                let divider = ((high as u16 & 0x3F) << 4) | (latch as u16 & 0xF);
                SoundCommand::Frequency { generator, divider }
            }
            else {
                SoundCommand::Frequency { generator, divider: (latch & 0x7) as u16 }
            };

            commands.push(command);
        }

        SoundFrame::from_commands(commands)
    }
}

/// Largest payload a single SND chunk may carry: the length byte is unsigned and single-byte
/// (§6).
pub const SND_MAX_CHUNK_LEN: usize = 0xFF;

/// Writes `frames` as the SND binary format (§6): each frame becomes one chunk, a single unsigned
/// length byte `n` followed by `n` raw chip-ready bytes. One chunk corresponds to one frame at the
/// target video system's rate.
pub fn write_snd<W: WriteBytes>(frames: &[SoundFrame], writer: &mut W) -> Result<()> {
    for frame in frames {
        let bytes = frame.to_bytes();
        if bytes.len() > SND_MAX_CHUNK_LEN {
            return range_error("snd: frame exceeds 255-byte chunk length");
        }
        writer.write_byte(bytes.len() as u8)?;
        writer.write_buf(&bytes)?;
    }
    Ok(())
}

/// Reads a sequence of [`SoundFrame`]s from the SND binary format (§6), one chunk per frame, until
/// the stream ends cleanly on a chunk boundary.
pub fn read_snd<R: ReadBytes>(reader: &mut R) -> Result<Vec<SoundFrame>> {
    let mut frames = Vec::new();
    loop {
        let len = match reader.read_byte() {
            Ok(len) => len as usize,
            Err(crate::errors::TmsError::EndOfStream) => break,
            Err(e) => return Err(e),
        };
        let mut bytes = vec![0u8; len];
        reader.read_buf_exact(&mut bytes)?;
        frames.push(SoundFrame::from_bytes(&bytes)?);
    }
    Ok(frames)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::io::BufWriter;

    #[test]
    fn verify_snd_round_trip() {
        let frames = vec![
            SoundFrame::from_commands(vec![
                SoundCommand::Frequency { generator: Generator::T0, divider: 0x100 },
                SoundCommand::Volume { generator: Generator::T0, attenuation: 0 },
            ])
            .unwrap(),
            SoundFrame::new(),
            SoundFrame::from_commands(vec![SoundCommand::Volume {
                generator: Generator::N,
                attenuation: 15,
            }])
            .unwrap(),
        ];

        let mut writer = BufWriter::new();
        write_snd(&frames, &mut writer).unwrap();
        let bytes = writer.into_bytes();

        let mut cursor = bytes.as_slice();
        let decoded = read_snd(&mut cursor).unwrap();
        assert_eq!(decoded, frames);
    }

    #[test]
    fn verify_snd_chunk_is_length_prefixed() {
        let frames =
            vec![SoundFrame::from_commands(vec![SoundCommand::Volume {
                generator: Generator::T0,
                attenuation: 5,
            }])
            .unwrap()];
        let mut writer = BufWriter::new();
        write_snd(&frames, &mut writer).unwrap();
        let bytes = writer.into_bytes();
        assert_eq!(bytes[0], 1);
        assert_eq!(bytes.len(), 2);
    }

    #[test]
    fn verify_volume_round_trip() {
        let cmd = SoundCommand::Volume { generator: Generator::T1, attenuation: 9 };
        let bytes = cmd.to_bytes();
        assert_eq!(bytes.len(), 1);
        let frame = SoundFrame::from_bytes(&bytes).unwrap();
        assert_eq!(frame.commands(), &[cmd]);
    }

    #[test]
    fn verify_tone_frequency_round_trip() {
        let cmd = SoundCommand::Frequency { generator: Generator::T0, divider: 0x123 };
        let bytes = cmd.to_bytes();
        assert_eq!(bytes.len(), 2);
        let frame = SoundFrame::from_bytes(&bytes).unwrap();
        assert_eq!(frame.commands(), &[cmd]);
    }

    #[test]
    fn verify_noise_frequency_is_single_byte() {
        let cmd = SoundCommand::Frequency { generator: Generator::N, divider: 0x3 };
        let bytes = cmd.to_bytes();
        assert_eq!(bytes.len(), 1);
        let frame = SoundFrame::from_bytes(&bytes).unwrap();
        assert_eq!(frame.commands(), &[cmd]);
    }

    #[test]
    fn verify_full_frame_round_trip() {
        let frame = SoundFrame::from_commands(vec![
            SoundCommand::Frequency { generator: Generator::T0, divider: 0x100 },
            SoundCommand::Volume { generator: Generator::T0, attenuation: 0 },
            SoundCommand::Frequency { generator: Generator::N, divider: 0x3 },
            SoundCommand::Volume { generator: Generator::N, attenuation: 15 },
        ])
        .unwrap();

        let bytes = frame.to_bytes();
        let decoded = SoundFrame::from_bytes(&bytes).unwrap();
        assert_eq!(decoded, frame);
    }

    #[test]
    fn verify_frame_length_is_bounded() {
        let commands = vec![SoundCommand::Volume { generator: Generator::T0, attenuation: 0 }; 32];
        assert!(SoundFrame::from_commands(commands).is_err());
    }
}
