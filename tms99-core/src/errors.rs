// Symphonia
// Copyright (c) 2019-2022 The Project Symphonia Developers.
//
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! The `errors` module defines the common error type shared by every `tms99-*` crate.

use std::error::Error as StdError;
use std::fmt;
use std::ops::Deref;
use std::result;

/// `TmsError` enumerates all possible errors reported by the `tms99` pipeline.
#[derive(Debug)]
pub enum TmsError {
    /// An IO error occurred while reading, writing, or seeking a stream.
    IoError(Box<dyn StdError + Send + Sync>),
    /// The stream contained malformed data and could not be decoded or demuxed. Carries a
    /// human-readable description and, where known, the byte or frame offset at which the
    /// problem was detected.
    DecodeError(&'static str),
    /// A value fell outside the range a format or codec allows (an over-long chunk, a pitch
    /// index with no corresponding table entry, and so on).
    RangeError(&'static str),
    /// A configuration option was invalid at construction time (unknown chip name, illegal
    /// numeric range).
    ConfigError(&'static str),
    /// An unsupported container or codec feature was encountered.
    Unsupported(&'static str),
    /// End of stream was reached where more data was expected.
    EndOfStream,
}

impl fmt::Display for TmsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TmsError::IoError(err) => write!(f, "io error: {err}"),
            TmsError::DecodeError(msg) => write!(f, "malformed stream: {msg}"),
            TmsError::RangeError(msg) => write!(f, "out of range: {msg}"),
            TmsError::ConfigError(msg) => write!(f, "invalid configuration: {msg}"),
            TmsError::Unsupported(feature) => write!(f, "unsupported: {feature}"),
            TmsError::EndOfStream => write!(f, "unexpected end of stream"),
        }
    }
}

impl StdError for TmsError {
    fn source(&self) -> Option<&(dyn StdError + 'static)> {
        match self {
            TmsError::IoError(err) => Some(err.deref()),
            _ => None,
        }
    }
}

impl From<std::io::Error> for TmsError {
    fn from(err: std::io::Error) -> TmsError {
        match err.kind() {
            std::io::ErrorKind::UnexpectedEof => TmsError::EndOfStream,
            _ => TmsError::IoError(Box::new(err)),
        }
    }
}

pub type Result<T> = result::Result<T, TmsError>;

/// Convenience function to create a decode error.
pub fn decode_error<T>(desc: &'static str) -> Result<T> {
    Err(TmsError::DecodeError(desc))
}

/// Convenience function to create a range error.
pub fn range_error<T>(desc: &'static str) -> Result<T> {
    Err(TmsError::RangeError(desc))
}

/// Convenience function to create a configuration error.
pub fn config_error<T>(desc: &'static str) -> Result<T> {
    Err(TmsError::ConfigError(desc))
}

/// Convenience function to create an unsupported-feature error.
pub fn unsupported_error<T>(feature: &'static str) -> Result<T> {
    Err(TmsError::Unsupported(feature))
}

/// Convenience function to create an end-of-stream error.
pub fn end_of_stream_error<T>() -> Result<T> {
    Err(TmsError::EndOfStream)
}
