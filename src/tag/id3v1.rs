// Copyright (c) 2026 The retag authors
//
// This Source Code Form is subject to the terms of the Mozilla Public License, v. 2.0. If a copy
// of the MPL was not distributed with this file, You can obtain one at
// http://mozilla.org/MPL/2.0/.
//
// SPDX-License-Identifier: MPL-2.0

//! Support for trailer-style ID3v1 tags.

use crate::tag::{SetFieldResult, Tag, TagField, TagVersion};
use lofty::id3::v1::GENRES;

/// Maximum byte length of the title, artist, album and year-less comment fields.
const MAX_TEXT_LEN: usize = 30;

/// Maximum byte length of the comment field in a v1.1 tag, where the last two
/// comment bytes hold the track number.
const MAX_COMMENT_LEN_V11: usize = 28;

/// Truncate a value to at most `limit` bytes without splitting a character.
fn clip(value: &str, limit: usize) -> &str {
    if value.len() <= limit {
        return value;
    }
    let mut end = limit;
    while !value.is_char_boundary(end) {
        end -= 1;
    }
    &value[..end]
}

/// Look up the genre index for a value, which may be a genre name or a numeric index.
fn genre_index(value: &str) -> Option<u8> {
    if let Ok(index) = value.parse::<u8>() {
        return (usize::from(index) < GENRES.len()).then_some(index);
    }
    GENRES
        .iter()
        .position(|genre| genre.eq_ignore_ascii_case(value))
        .and_then(|index| u8::try_from(index).ok())
}

/// Parse the year out of a value that is either a bare year or a longer `YYYY-MM-DD` date.
fn parse_year(value: &str) -> Option<u16> {
    let year_part = value.split('-').next().unwrap_or(value);
    year_part.parse::<u16>().ok().filter(|year| *year <= 9999)
}

/// ID3v1 tag.
#[derive(Debug, Clone)]
pub struct ID3v1Tag {
    /// The underlying tag data.
    data: lofty::id3::v1::Id3v1Tag,
    /// The version of the tag (v1.0 or v1.1).
    version: TagVersion,
    /// Whether the tag has unsaved modifications.
    dirty: bool,
}

impl ID3v1Tag {
    /// Creates an empty tag with the given trailer-style version.
    #[must_use]
    pub fn new(version: TagVersion) -> Self {
        debug_assert!(version.format() == crate::tag::TagFormat::Id3v1);
        ID3v1Tag {
            data: lofty::id3::v1::Id3v1Tag::default(),
            version,
            dirty: false,
        }
    }

    /// Wraps an already parsed [`lofty::id3::v1::Id3v1Tag`].
    ///
    /// The version is inferred from the parsed data: a tag with a track number must be v1.1.
    pub(crate) fn from_inner(data: lofty::id3::v1::Id3v1Tag) -> Self {
        let version = if data.track_number.is_some() {
            TagVersion::Id3v11
        } else {
            TagVersion::Id3v10
        };
        ID3v1Tag {
            data,
            version,
            dirty: false,
        }
    }

    /// Access the underlying tag data.
    pub(crate) fn inner(&self) -> &lofty::id3::v1::Id3v1Tag {
        &self.data
    }

    /// Byte limit of the comment field for this tag version.
    fn comment_limit(&self) -> usize {
        if self.version == TagVersion::Id3v11 {
            MAX_COMMENT_LEN_V11
        } else {
            MAX_TEXT_LEN
        }
    }

    /// Store a clipped text value into one of the fixed-size slots.
    ///
    /// Returns the effective change state after clipping.
    fn store_clipped(target: &mut Option<String>, value: &str, limit: usize) -> SetFieldResult {
        let clipped = clip(value, limit);
        if target.as_deref() == Some(clipped) {
            SetFieldResult::Unchanged
        } else {
            *target = Some(clipped.to_string());
            SetFieldResult::Changed
        }
    }

    /// Remove a field. Returns `Unchanged` if the field was already absent.
    fn clear(&mut self, field: TagField) -> SetFieldResult {
        let changed = match field {
            TagField::Title => self.data.title.take().is_some(),
            TagField::Artist => self.data.artist.take().is_some(),
            TagField::Album => self.data.album.take().is_some(),
            TagField::Comment => self.data.comment.take().is_some(),
            TagField::Genre => self.data.genre.take().is_some(),
            TagField::TrackNumber => self.data.track_number.take().is_some(),
            TagField::ReleaseDate => self.data.year.take().is_some(),
            _ => false,
        };
        if changed {
            self.dirty = true;
            SetFieldResult::Changed
        } else {
            SetFieldResult::Unchanged
        }
    }
}

impl Tag for ID3v1Tag {
    fn version(&self) -> TagVersion {
        self.version
    }

    fn get(&self, field: TagField) -> Option<String> {
        match field {
            TagField::Title => self.data.title.clone(),
            TagField::Artist => self.data.artist.clone(),
            TagField::Album => self.data.album.clone(),
            TagField::Comment => self.data.comment.clone(),
            TagField::Genre => self
                .data
                .genre
                .and_then(|index| GENRES.get(usize::from(index)))
                .map(|genre| (*genre).to_string()),
            TagField::TrackNumber => self.data.track_number.map(|number| number.to_string()),
            TagField::ReleaseDate => self.data.year.clone(),
            _ => None,
        }
    }

    fn set(&mut self, field: TagField, value: &str) -> crate::Result<SetFieldResult> {
        if !self.supports(field) {
            return Err(crate::ErrorType::UnsupportedField {
                field,
                version: self.version,
            });
        }
        if value.is_empty() {
            return Ok(self.clear(field));
        }
        let result = match field {
            TagField::Title => Self::store_clipped(&mut self.data.title, value, MAX_TEXT_LEN),
            TagField::Artist => Self::store_clipped(&mut self.data.artist, value, MAX_TEXT_LEN),
            TagField::Album => Self::store_clipped(&mut self.data.album, value, MAX_TEXT_LEN),
            TagField::Comment => {
                let limit = self.comment_limit();
                Self::store_clipped(&mut self.data.comment, value, limit)
            }
            TagField::Genre => match genre_index(value) {
                None => SetFieldResult::Rejected,
                Some(index) => {
                    if self.data.genre == Some(index) {
                        SetFieldResult::Unchanged
                    } else {
                        self.data.genre = Some(index);
                        SetFieldResult::Changed
                    }
                }
            },
            TagField::TrackNumber => match value.parse::<u8>() {
                // Track number zero is indistinguishable from a v1.0 tag on disk.
                Err(_) | Ok(0) => SetFieldResult::Rejected,
                Ok(number) => {
                    if self.data.track_number == Some(number) {
                        SetFieldResult::Unchanged
                    } else {
                        self.data.track_number = Some(number);
                        SetFieldResult::Changed
                    }
                }
            },
            TagField::ReleaseDate => match parse_year(value) {
                None => SetFieldResult::Rejected,
                // The year slot holds free text on disk; only validated years go in.
                Some(year) => {
                    let year = year.to_string();
                    if self.data.year.as_deref() == Some(year.as_str()) {
                        SetFieldResult::Unchanged
                    } else {
                        self.data.year = Some(year);
                        SetFieldResult::Changed
                    }
                }
            },
            _ => unreachable!("field {field} is not representable in {}", self.version),
        };
        if result.is_changed() {
            self.dirty = true;
        }
        Ok(result)
    }

    fn is_dirty(&self) -> bool {
        self.dirty
    }

    fn mark_clean(&mut self) {
        self.dirty = false;
    }
}
