// Copyright (c) 2026 The retag authors
//
// This Source Code Form is subject to the terms of the Mozilla Public License, v. 2.0. If a copy
// of the MPL was not distributed with this file, You can obtain one at
// http://mozilla.org/MPL/2.0/.
//
// SPDX-License-Identifier: MPL-2.0

//! Tags and tag-related functions.

mod id3v1;
mod id3v2;

pub use id3v1::ID3v1Tag;
pub use id3v2::ID3v2Tag;

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// The structural kind of a tag.
///
/// A file can hold at most one tag of each format at the same time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TagFormat {
    /// Fixed-size tag appended to the end of the file (ID3v1.0/v1.1).
    Id3v1,
    /// Frame-based tag prepended to the audio stream (ID3v2.2/v2.3/v2.4).
    Id3v2,
}

impl fmt::Display for TagFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TagFormat::Id3v1 => write!(f, "ID3v1"),
            TagFormat::Id3v2 => write!(f, "ID3v2"),
        }
    }
}

/// A concrete tag version.
///
/// The ordering reflects the capabilities of the versions and is used to derive field support
/// (see [`TagField::min_version`]).
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Deserialize, Serialize,
)]
pub enum TagVersion {
    /// ID3v1.0 (no track number).
    #[serde(rename = "1.0")]
    Id3v10,
    /// ID3v1.1 (track number stored in the last comment byte).
    #[serde(rename = "1.1")]
    Id3v11,
    /// ID3v2.2 (read-only legacy version).
    #[serde(rename = "2.2")]
    Id3v22,
    /// ID3v2.3.
    #[serde(rename = "2.3")]
    Id3v23,
    /// ID3v2.4.
    #[serde(rename = "2.4")]
    Id3v24,
}

impl TagVersion {
    /// The structural format this version belongs to.
    #[must_use]
    pub fn format(&self) -> TagFormat {
        match self {
            TagVersion::Id3v10 | TagVersion::Id3v11 => TagFormat::Id3v1,
            TagVersion::Id3v22 | TagVersion::Id3v23 | TagVersion::Id3v24 => TagFormat::Id3v2,
        }
    }
}

impl fmt::Display for TagVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TagVersion::Id3v10 => write!(f, "ID3v1.0"),
            TagVersion::Id3v11 => write!(f, "ID3v1.1"),
            TagVersion::Id3v22 => write!(f, "ID3v2.2"),
            TagVersion::Id3v23 => write!(f, "ID3v2.3"),
            TagVersion::Id3v24 => write!(f, "ID3v2.4"),
        }
    }
}

impl FromStr for TagVersion {
    type Err = crate::ErrorType;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "1.0" => Ok(TagVersion::Id3v10),
            "1.1" => Ok(TagVersion::Id3v11),
            "2.2" => Ok(TagVersion::Id3v22),
            "2.3" => Ok(TagVersion::Id3v23),
            "2.4" => Ok(TagVersion::Id3v24),
            other => Err(crate::ErrorType::UnknownVersion(other.to_string())),
        }
    }
}

/// A field identifier, valid across tag formats.
///
/// The set of fields is fixed; whether a concrete tag can store a field depends on its version
/// only (see [`Tag::supports`]).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TagField {
    /// Track title.
    Title,
    /// Track artist.
    Artist,
    /// Album title.
    Album,
    /// Artist credited for the whole album.
    AlbumArtist,
    /// Performer of the original recording.
    OriginalArtist,
    /// Composer.
    Composer,
    /// Person or organization that encoded the file.
    EncodedBy,
    /// Record label or publisher.
    Publisher,
    /// Copyright message.
    Copyright,
    /// Free-form comment.
    Comment,
    /// Associated URL.
    Url,
    /// Genre.
    Genre,
    /// Track number on the disc.
    TrackNumber,
    /// Total number of tracks on the disc.
    TrackTotal,
    /// Disc number.
    DiscNumber,
    /// Total number of discs.
    DiscTotal,
    /// Date the release was issued. On ID3v1 tags this is the 4-digit year.
    ReleaseDate,
    /// Date the track was recorded.
    RecordingDate,
    /// Date of the earliest release of the recording.
    OriginalReleaseDate,
}

impl TagField {
    /// All known fields, in display order.
    #[must_use]
    pub fn all() -> [TagField; 19] {
        [
            TagField::Title,
            TagField::Artist,
            TagField::Album,
            TagField::AlbumArtist,
            TagField::OriginalArtist,
            TagField::Composer,
            TagField::EncodedBy,
            TagField::Publisher,
            TagField::Copyright,
            TagField::Comment,
            TagField::Url,
            TagField::Genre,
            TagField::TrackNumber,
            TagField::TrackTotal,
            TagField::DiscNumber,
            TagField::DiscTotal,
            TagField::ReleaseDate,
            TagField::RecordingDate,
            TagField::OriginalReleaseDate,
        ]
    }

    /// The oldest tag version that can store this field.
    #[must_use]
    pub fn min_version(&self) -> TagVersion {
        match self {
            TagField::Title
            | TagField::Artist
            | TagField::Album
            | TagField::Comment
            | TagField::Genre
            | TagField::ReleaseDate => TagVersion::Id3v10,
            TagField::TrackNumber => TagVersion::Id3v11,
            TagField::AlbumArtist
            | TagField::OriginalArtist
            | TagField::Composer
            | TagField::EncodedBy
            | TagField::Publisher
            | TagField::Copyright
            | TagField::Url
            | TagField::TrackTotal
            | TagField::DiscNumber
            | TagField::DiscTotal
            | TagField::RecordingDate => TagVersion::Id3v22,
            TagField::OriginalReleaseDate => TagVersion::Id3v24,
        }
    }

    /// Whether the field holds free-form text that is subject to encoding transliteration.
    #[must_use]
    pub fn is_text(&self) -> bool {
        matches!(
            self,
            TagField::Title
                | TagField::Artist
                | TagField::Album
                | TagField::AlbumArtist
                | TagField::OriginalArtist
                | TagField::Composer
                | TagField::EncodedBy
                | TagField::Publisher
                | TagField::Copyright
                | TagField::Comment
                | TagField::Genre
        )
    }

    /// The command line name of this field.
    #[must_use]
    pub fn name(&self) -> &'static str {
        match self {
            TagField::Title => "title",
            TagField::Artist => "artist",
            TagField::Album => "album",
            TagField::AlbumArtist => "album-artist",
            TagField::OriginalArtist => "original-artist",
            TagField::Composer => "composer",
            TagField::EncodedBy => "encoded-by",
            TagField::Publisher => "publisher",
            TagField::Copyright => "copyright",
            TagField::Comment => "comment",
            TagField::Url => "url",
            TagField::Genre => "genre",
            TagField::TrackNumber => "track-number",
            TagField::TrackTotal => "track-total",
            TagField::DiscNumber => "disc-number",
            TagField::DiscTotal => "disc-total",
            TagField::ReleaseDate => "release-date",
            TagField::RecordingDate => "recording-date",
            TagField::OriginalReleaseDate => "original-release-date",
        }
    }
}

impl fmt::Display for TagField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

impl FromStr for TagField {
    type Err = crate::ErrorType;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        TagField::all()
            .into_iter()
            .find(|field| field.name() == value)
            .ok_or_else(|| crate::ErrorType::UnknownField(value.to_string()))
    }
}

/// Text encoding override for ID3v2 writes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
pub enum TextEncoding {
    /// ISO-8859-1. Values are transliterated to ASCII before writing.
    #[serde(rename = "latin1")]
    Latin1,
    /// UTF-16 with BOM. Values pass through unchanged.
    #[serde(rename = "utf16")]
    Utf16,
    /// UTF-8. Only valid for ID3v2.4 targets.
    #[serde(rename = "utf8")]
    Utf8,
}

impl fmt::Display for TextEncoding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TextEncoding::Latin1 => write!(f, "latin1"),
            TextEncoding::Utf16 => write!(f, "utf16"),
            TextEncoding::Utf8 => write!(f, "utf8"),
        }
    }
}

impl FromStr for TextEncoding {
    type Err = crate::ErrorType;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "latin1" => Ok(TextEncoding::Latin1),
            "utf16" => Ok(TextEncoding::Utf16),
            "utf8" => Ok(TextEncoding::Utf8),
            other => Err(crate::ErrorType::UnknownEncoding(other.to_string())),
        }
    }
}

/// Outcome of a [`Tag::set`] call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SetFieldResult {
    /// The stored value differs from the previous one.
    Changed,
    /// The value was already stored; nothing happened.
    Unchanged,
    /// The value failed validation; the stored value is untouched.
    Rejected,
}

impl SetFieldResult {
    /// Whether the stored value was actually modified.
    #[must_use]
    pub fn is_changed(&self) -> bool {
        matches!(self, SetFieldResult::Changed)
    }
}

/// Uniform string-based access to a concrete tag.
pub trait Tag {
    /// The version of this tag.
    fn version(&self) -> TagVersion;

    /// The structural format of this tag.
    fn format(&self) -> TagFormat {
        self.version().format()
    }

    /// Whether this tag can store the given field.
    fn supports(&self, field: TagField) -> bool {
        self.version() >= field.min_version()
    }

    /// Get the normalized display value of a field, or `None` if it is absent.
    fn get(&self, field: TagField) -> Option<String>;

    /// Store a field value.
    ///
    /// An empty string removes the field. Values that fail validation (unparseable dates or
    /// numbers) are rejected and leave the stored value untouched.
    ///
    /// # Errors
    ///
    /// Returns [`ErrorType::UnsupportedField`](crate::ErrorType::UnsupportedField) if the field
    /// cannot be represented in this tag version.
    fn set(&mut self, field: TagField, value: &str) -> crate::Result<SetFieldResult>;

    /// Whether this tag has unsaved modifications.
    fn is_dirty(&self) -> bool;

    /// Reset the dirty flag.
    fn mark_clean(&mut self);
}
