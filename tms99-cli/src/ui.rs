// Symphonia
// Copyright (c) 2019-2024 The Project Symphonia Developers.
//
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Small pretty-printers for summarizing a pipeline run.

use std::path::Path;

use tms99_core::lpc::LpcFrame;

const PAD: usize = 22;

fn print_header(title: &str) {
    println!("|");
    println!("| // {} //", title);
}

fn print_pair(key: &str, value: &str) {
    println!("|     {:<pad$} {}", key, value, pad = PAD);
}

/// Summarizes an `encode` run: input path, frame-kind histogram, and total encoded bit length.
pub fn print_encode_summary(input: &Path, output: &Path, frames: &[LpcFrame]) {
    println!("+ {} -> {}", input.display(), output.display());

    print_header("Speech");
    print_pair("Frames:", &frames.len().to_string());

    let mut silence = 0;
    let mut stop = 0;
    let mut repeat = 0;
    let mut unvoiced = 0;
    let mut voiced = 0;
    let mut bits = 0u64;

    for frame in frames {
        bits += frame.bit_len() as u64;
        match frame {
            LpcFrame::Silence => silence += 1,
            LpcFrame::Stop => stop += 1,
            LpcFrame::Repeat { .. } => repeat += 1,
            LpcFrame::Unvoiced { .. } => unvoiced += 1,
            LpcFrame::Voiced { .. } => voiced += 1,
        }
    }

    print_pair("Silence:", &silence.to_string());
    print_pair("Stop:", &stop.to_string());
    print_pair("Repeat:", &repeat.to_string());
    print_pair("Unvoiced:", &unvoiced.to_string());
    print_pair("Voiced:", &voiced.to_string());
    print_pair("Encoded bits:", &bits.to_string());
    print_pair("Encoded bytes:", &bits.div_ceil(8).to_string());
}

/// Summarizes a `simulate` run: frame count and rendered sample count.
pub fn print_simulate_summary(input: &Path, output: &Path, frames: usize, samples: usize) {
    println!("+ {} -> {}", input.display(), output.display());
    print_header("Render");
    print_pair("Frames:", &frames.to_string());
    print_pair("Samples:", &samples.to_string());
}

/// Summarizes a `compose` run: bank count and output size.
pub fn print_compose_summary(output: &Path, bank_count: usize, byte_len: usize) {
    println!("+ {}", output.display());
    print_header("Composer");
    print_pair("Banks:", &(bank_count + 1).to_string());
    print_pair("Bytes:", &byte_len.to_string());
}
