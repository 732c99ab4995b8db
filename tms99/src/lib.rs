// Symphonia
// Copyright (c) 2019-2021 The Project Symphonia Developers.
//
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

#![warn(rust_2018_idioms)]
#![forbid(unsafe_code)]

//! # tms99
//!
//! `tms99` is an offline media pipeline for encoding speech, music, and imagery into the TMS
//! container format consumed by vintage VDP/PSG/LPC hardware.
//!
//! # Crates
//!
//! | Crate          | Feature  | Default | Provides                                            |
//! |----------------|----------|---------|------------------------------------------------------|
//! | `tms99-core`   | —        | always  | bitstream I/O, LPC frame codec, chip simulator, PSG   |
//! | `tms99-lpc`    | `lpc`    | Yes     | WAV → LPC encoder pipeline, reference PCM renderer    |
//! | `tms99-compose`| `compose`| Yes     | TMS chunk model, bank writer/reader, timeline composer|
//!
//! # Usage
//!
//! 1. Encode speech with [`core::lpc`][core::lpc], via [`lpc::encode`] when the `lpc` feature is
//!    enabled, to get a sequence of [`core::lpc::LpcFrame`]s.
//! 2. Fold repeated frames with [`core::lpc::fold::RepeatingWriter`] to shrink the speech
//!    timeline before feeding it to a composer source.
//! 3. Build [`compose::DisplaySource`], [`compose::SoundSource`], and [`compose::LpcSpeechSource`]
//!    implementations for the display, sound, and speech timelines and run [`compose::compose`]
//!    to multiplex them into a single bank-partitioned TMS stream.
//! 4. Read the result back with [`compose::TmsReader`], or inspect individual frames with
//!    [`core::lpc::sim::Simulator`] for a reference software render.

pub use tms99_core as core;

#[cfg(feature = "lpc")]
pub use tms99_lpc as lpc;

#[cfg(feature = "compose")]
pub use tms99_compose as compose;
