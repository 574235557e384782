// Copyright (c) 2026 The retag authors
//
// This Source Code Form is subject to the terms of the Mozilla Public License, v. 2.0. If a copy
// of the MPL was not distributed with this file, You can obtain one at
// http://mozilla.org/MPL/2.0/.
//
// SPDX-License-Identifier: MPL-2.0

//! Error and result types.

use crate::audiofile::TagSlot;
use crate::tag::{TagField, TagVersion, TextEncoding};
use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Main error type.
#[derive(Error, Debug)]
pub enum ErrorType {
    /// Configuration error.
    #[error("Configuration Error ({0})")]
    Config(#[from] crate::config::ConfigError),
    /// I/O Error.
    #[error("Input/Output error ({:?})", .0)]
    Io(#[from] io::Error),
    /// File has an unknown file extension.
    #[error("File has unknown file type")]
    UnknownFileType,
    /// Errors raised by the [`id3`] crate.
    #[error("ID3v2 tag operation failed ({0})")]
    Id3(#[from] id3::Error),
    /// Errors raised by the [`lofty`] crate.
    #[error("Audio stream operation failed ({0})")]
    Lofty(#[from] lofty::error::LoftyError),
    /// The field is not representable in the given tag version.
    #[error("Field {field} is not supported by {version}")]
    UnsupportedField {
        /// The rejected field.
        field: TagField,
        /// The version of the tag that rejected it.
        version: TagVersion,
    },
    /// No attached tag has the requested version.
    #[error("File has no {0} tag")]
    NoSuchTagVersion(TagVersion),
    /// The requested save target version is not writable.
    #[error("Cannot write a {version} tag to the {slot} slot")]
    InvalidSaveVersion {
        /// The slot the version was requested for.
        slot: TagSlot,
        /// The rejected target version.
        version: TagVersion,
    },
    /// The text encoding is incompatible with the save target version.
    #[error("Encoding {encoding} requires ID3v2.4, but the target is {version}")]
    InvalidEncoding {
        /// The requested text encoding.
        encoding: TextEncoding,
        /// The incompatible target version.
        version: TagVersion,
    },
    /// The file is already part of the collection.
    #[error("File {} is already loaded", .0.display())]
    DuplicateFile(PathBuf),
    /// Writing or removing a single tag slot failed.
    #[error("Failed to save {slot} tag of {}: {source}", path.display())]
    SaveFailed {
        /// Path of the file that failed to save.
        path: PathBuf,
        /// The slot whose write or removal failed.
        slot: TagSlot,
        /// The underlying error.
        source: Box<ErrorType>,
    },
    /// A field name could not be parsed.
    #[error("Unknown tag field: {0}")]
    UnknownField(String),
    /// A tag version string could not be parsed.
    #[error("Unknown tag version: {0}")]
    UnknownVersion(String),
    /// A text encoding name could not be parsed.
    #[error("Unknown text encoding: {0}")]
    UnknownEncoding(String),
}

/// Convenience type.
pub type Result<T> = std::result::Result<T, ErrorType>;
