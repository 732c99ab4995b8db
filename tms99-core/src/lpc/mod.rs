// Symphonia
// Copyright (c) 2019-2022 The Project Symphonia Developers.
//
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! The LPC-10 frame codec: the [`frame::LpcFrame`] tagged variant, the per-chip
//! [`quant::LpcQuantization`] codebooks, the cycle-accurate [`sim::Simulator`], binary/text frame
//! I/O, and the repeat-folding wrapper (§3, §4.1, §4.2, §4.6 of the format this crate
//! implements).

pub mod fold;
pub mod frame;
pub mod quant;
pub mod sim;
pub mod text;

pub use fold::{NonRepeatingReader, RepeatingWriter};
pub use frame::LpcFrame;
pub use quant::{ChipVariant, LpcQuantization};
pub use sim::{OutputMode, OutputPrecision, Simulator};
