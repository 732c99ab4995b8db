// Symphonia
// Copyright (c) 2019-2022 The Project Symphonia Developers.
//
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! `tms99-core` provides the foundational types shared by every `tms99-*` crate: the common
//! error type, byte- and bit-level I/O primitives, a small DSP toolkit used by the speech
//! encoder, the LPC-10 frame codec and chip simulator, and the sound-chip command codec used as
//! the composer's minimal concrete [`snd`] source.

pub mod dsp;
pub mod errors;
pub mod io;
pub mod lpc;
pub mod snd;
