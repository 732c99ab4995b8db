// Symphonia
// Copyright (c) 2019 The Project Symphonia Developers.
//
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

#![warn(rust_2018_idioms)]
#![forbid(unsafe_code)]

mod frames;
mod ui;

use std::fs::File;
use std::io::{BufReader, BufWriter as IoBufWriter, Write};
use std::path::{Path, PathBuf};
use std::process::exit;

use clap::{Parser, Subcommand};
use log::error;

use tms99::compose::sources::{VecDisplaySource, VecLpcSource, VecSoundSource};
use tms99::compose::{compose, BankWriter, ComposerConfig, Scheduled, VideoSystem};
use tms99::core::errors::Result;
use tms99::core::io::{BitWriterRtl, BufWriter};
use tms99::core::lpc::LpcFrame;
use tms99::lpc::config::EncoderConfig;
use tms99::lpc::{render, wav};

/// Command-line front-end for the `tms99` media pipeline: encodes speech, auditions an encoded
/// stream, and multiplexes display/sound/speech timelines into a TMS container.
#[derive(Parser)]
#[clap(name = "tms99", version, about = "TMS media pipeline: encode speech, simulate, compose TMS streams")]
struct Cli {
    #[clap(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Encode an 8 kHz 16-bit mono WAV file into an LPC frame stream.
    Encode {
        /// Input WAV file (8 kHz, 16-bit, mono PCM).
        input: PathBuf,
        /// Output path for the encoded LPC frames.
        output: PathBuf,
        /// Write the human-readable LPC text format instead of raw bits.
        #[clap(long)]
        text: bool,
        /// Chip variant whose quantization tables to encode against.
        #[clap(long, default_value = "tms5200")]
        chip: String,
    },
    /// Render an encoded LPC frame stream back to a WAV file via the reference simulator.
    Simulate {
        /// Input LPC frame stream, as produced by `encode`.
        input: PathBuf,
        /// Output WAV file.
        output: PathBuf,
        /// The input is the human-readable LPC text format instead of raw bits.
        #[clap(long)]
        text: bool,
        /// Chip variant to simulate.
        #[clap(long, default_value = "tms5200")]
        chip: String,
    },
    /// Multiplex display, sound, and speech timelines into a single TMS container.
    Compose {
        /// Output TMS stream path.
        output: PathBuf,
        /// Display-delta frame file (see `frames::read_display_frames`), optionally with a
        /// `:start_frame` suffix giving the vsync at which this source opens.
        #[clap(long)]
        display: Option<String>,
        /// Per-tick PSG command frame file, optionally with a `:start_frame` suffix.
        #[clap(long)]
        sound: Option<String>,
        /// LPC text speech file, optionally with a `:start_frame` suffix.
        #[clap(long)]
        speech: Option<String>,
        /// Target video system.
        #[clap(long, default_value = "ntsc")]
        video_system: String,
        /// Physical bank size in bytes.
        #[clap(long, default_value_t = tms99::compose::DEFAULT_BANK_SIZE)]
        bank_size: usize,
        /// Write xas99-compatible `text >XXXX` assembly lines instead of the raw binary stream.
        #[clap(long)]
        text: bool,
    },
}

fn main() {
    pretty_env_logger::init();

    let cli = Cli::parse();

    let result = match cli.command {
        Command::Encode { input, output, text, chip } => run_encode(&input, &output, text, &chip),
        Command::Simulate { input, output, text, chip } => {
            run_simulate(&input, &output, text, &chip)
        }
        Command::Compose { output, display, sound, speech, video_system, bank_size, text } => {
            run_compose(&output, display, sound, speech, &video_system, bank_size, text)
        }
    };

    if let Err(err) = result {
        error!("{}", err);
        exit(1);
    }
}

fn run_encode(input: &Path, output: &Path, text: bool, chip: &str) -> Result<()> {
    let mut config = EncoderConfig::default();
    config.chip_variant = tms99::core::lpc::ChipVariant::parse(chip)?;
    config.validate()?;

    let source = BufReader::new(File::open(input)?);
    let samples = wav::read_pcm16_mono_8khz(source)?;

    let frames = tms99::lpc::encode(&samples, &config);

    if text {
        let mut out = IoBufWriter::new(File::create(output)?);
        tms99::core::lpc::text::write_text(&frames, &mut out)?;
    }
    else {
        let mut writer = BitWriterRtl::new();
        for frame in &frames {
            frame.write(&mut writer);
        }
        writer.pad_to_byte();
        File::create(output)?.write_all(&writer.into_bytes())?;
    }

    ui::print_encode_summary(input, output, &frames);
    Ok(())
}

fn run_simulate(input: &Path, output: &Path, text: bool, chip: &str) -> Result<()> {
    let chip_variant = tms99::core::lpc::ChipVariant::parse(chip)?;
    let frames = read_lpc_frames(input, text)?;

    let samples = render::render_samples(&frames, chip_variant);
    let bytes = wav::write_pcm16_mono_8khz(&samples);
    File::create(output)?.write_all(&bytes)?;

    ui::print_simulate_summary(input, output, frames.len(), samples.len());
    Ok(())
}

fn run_compose(
    output: &Path,
    display: Option<String>,
    sound: Option<String>,
    speech: Option<String>,
    video_system: &str,
    bank_size: usize,
    text: bool,
) -> Result<()> {
    let video_system = match video_system {
        "ntsc" => VideoSystem::Ntsc,
        "pal" => VideoSystem::Pal,
        _ => return tms99::core::errors::config_error("compose: video-system must be ntsc or pal"),
    };

    let display_schedule = match display {
        Some(spec) => {
            let (path, start) = split_start_frame(&spec);
            let frames = frames::read_display_frames(BufReader::new(File::open(path)?))?;
            vec![Scheduled::new(start, VecDisplaySource::new(frames))]
        }
        None => vec![],
    };

    let sound_schedule = match sound {
        Some(spec) => {
            let (path, start) = split_start_frame(&spec);
            let mut reader = BufReader::new(File::open(path)?);
            let frames =
                tms99::core::snd::read_snd(&mut reader)?.iter().map(|f| f.to_bytes()).collect();
            vec![Scheduled::new(start, VecSoundSource::new(frames))]
        }
        None => vec![],
    };

    let speech_schedule = match speech {
        Some(spec) => {
            let (path, start) = split_start_frame(&spec);
            let frames = read_lpc_frames(Path::new(path), true)?;
            let byte_frames = frames
                .iter()
                .map(|frame| {
                    let mut writer = BitWriterRtl::new();
                    frame.write(&mut writer);
                    writer.pad_to_byte();
                    writer.into_bytes()
                })
                .collect();
            vec![Scheduled::new(start, VecLpcSource::new(byte_frames))]
        }
        None => vec![],
    };

    let config = ComposerConfig { video_system, bank_size };
    let mut sink = BankWriter::with_bank_size(BufWriter::new(), bank_size);

    compose(display_schedule, sound_schedule, speech_schedule, &config, &mut sink)?;

    let bank_count = sink.bank_count();
    let bytes = sink.into_inner().into_bytes();
    let byte_len = bytes.len();

    if text {
        let mut reader = tms99::compose::TmsReader::with_bank_size(bytes.as_slice(), bank_size);
        let mut chunks = Vec::new();
        while let Some(chunk) = reader.next_chunk()? {
            chunks.push(chunk);
        }
        let mut out = IoBufWriter::new(File::create(output)?);
        tms99::compose::write_text(&chunks, &mut out)?;
    }
    else {
        File::create(output)?.write_all(&bytes)?;
    }

    ui::print_compose_summary(output, bank_count, byte_len);
    Ok(())
}

fn read_lpc_frames(path: &Path, text: bool) -> Result<Vec<LpcFrame>> {
    if text {
        let mut reader = BufReader::new(File::open(path)?);
        tms99::core::lpc::text::read_text(&mut reader)
    }
    else {
        let bytes = std::fs::read(path)?;
        let mut reader = tms99::core::io::BitReaderRtl::new(&bytes);
        let mut frames = Vec::new();
        while let Some(frame) = LpcFrame::read(&mut reader)? {
            frames.push(frame);
        }
        Ok(frames)
    }
}

/// Splits a `path[:start_frame]` CLI argument, defaulting to a start frame of 0.
fn split_start_frame(spec: &str) -> (&str, u64) {
    match spec.rsplit_once(':') {
        Some((path, frame)) => match frame.parse() {
            Ok(frame) => (path, frame),
            Err(_) => (spec, 0),
        },
        None => (spec, 0),
    }
}
