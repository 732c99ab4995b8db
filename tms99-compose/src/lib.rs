// Symphonia
// Copyright (c) 2019-2022 The Project Symphonia Developers.
//
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

#![warn(rust_2018_idioms)]
#![forbid(unsafe_code)]

//! The TMS container multiplexer: the chunk model (§3, §4.8), the bank-aware writer and reader
//! (§4.7's bank management), the composer's input source traits, and the composer timeline
//! main loop itself (§4.7).

pub mod chunk;
pub mod composer;
pub mod reader;
pub mod sink;
pub mod sources;
pub mod text;

pub use chunk::{read_chunk, TmsChunk};
pub use composer::{compose, ComposerConfig, Scheduled, VideoSystem};
pub use reader::TmsReader;
pub use sink::{BankWriter, TmsSink, DEFAULT_BANK_SIZE};
pub use sources::{DisplaySource, LpcSpeechSource, SoundSource};
pub use text::write_text;
