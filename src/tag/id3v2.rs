// Copyright (c) 2026 The retag authors
//
// This Source Code Form is subject to the terms of the Mozilla Public License, v. 2.0. If a copy
// of the MPL was not distributed with this file, You can obtain one at
// http://mozilla.org/MPL/2.0/.
//
// SPDX-License-Identifier: MPL-2.0

//! Support for header-style ID3v2 tags.

use crate::tag::{SetFieldResult, Tag, TagField, TagVersion};
use id3::frame::{Comment, Content, ExtendedLink, ExtendedText, Timestamp};
use id3::TagLike;
use std::path::Path;

/// Language code used for comment frames without an explicit language.
const COMMENT_LANG: &str = "eng";

/// Map a header-style [`TagVersion`] to the [`id3`] crate version.
///
/// Trailer versions cannot occur here; they fall back to ID3v2.4.
fn id3_version(version: TagVersion) -> id3::Version {
    match version {
        TagVersion::Id3v22 => id3::Version::Id3v22,
        TagVersion::Id3v23 => id3::Version::Id3v23,
        _ => id3::Version::Id3v24,
    }
}

/// ID3v2 tag.
#[derive(Debug, Clone)]
pub struct ID3v2Tag {
    /// The underlying tag data.
    data: id3::Tag,
    /// Whether the tag has unsaved modifications.
    dirty: bool,
}

impl ID3v2Tag {
    /// Creates an empty tag with the given header-style version.
    #[must_use]
    pub fn new(version: TagVersion) -> Self {
        debug_assert!(version.format() == crate::tag::TagFormat::Id3v2);
        ID3v2Tag {
            data: id3::Tag::with_version(id3_version(version)),
            dirty: false,
        }
    }

    /// Wraps an already parsed [`id3::Tag`].
    pub(crate) fn from_inner(data: id3::Tag) -> Self {
        ID3v2Tag { data, dirty: false }
    }

    /// Read the ID3v2 tag from the path.
    ///
    /// Returns `Ok(None)` if the file has no ID3v2 tag.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or the tag is malformed.
    pub fn read_from_path(path: impl AsRef<Path>) -> crate::Result<Option<Self>> {
        match id3::Tag::read_from_path(path) {
            Ok(data) => Ok(Some(ID3v2Tag::from_inner(data))),
            Err(id3::Error {
                kind: id3::ErrorKind::NoTag,
                ..
            }) => Ok(None),
            Err(err) => Err(err.into()),
        }
    }

    /// Serialize this tag into the file at `path` with the given target version.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be rewritten.
    pub(crate) fn write_to_path(&self, path: &Path, version: TagVersion) -> crate::Result<()> {
        self.data.write_to_path(path, id3_version(version))?;
        Ok(())
    }

    /// Get the value of a custom `TXXX` frame.
    #[must_use]
    pub fn custom_text(&self, description: &str) -> Option<String> {
        self.data
            .extended_texts()
            .find(|extended| extended.description == description)
            .map(|extended| extended.value.clone())
    }

    /// Set a custom `TXXX` frame. An empty value removes the frame.
    pub fn set_custom_text(&mut self, description: &str, value: &str) -> SetFieldResult {
        let current = self.custom_text(description);
        if value.is_empty() {
            if current.is_none() {
                return SetFieldResult::Unchanged;
            }
            self.data.remove_extended_text(Some(description), None);
        } else {
            if current.as_deref() == Some(value) {
                return SetFieldResult::Unchanged;
            }
            let _unused = self.data.add_frame(ExtendedText {
                description: description.to_string(),
                value: value.to_string(),
            });
        }
        self.dirty = true;
        SetFieldResult::Changed
    }

    /// Get the text content of a plain text frame.
    fn text_frame(&self, id: &str) -> Option<String> {
        self.data
            .get(id)
            .and_then(|frame| frame.content().text())
            .map(ToString::to_string)
    }

    /// Store a text-like field. The value must be non-empty.
    fn store_text(&mut self, field: TagField, value: &str) {
        match field {
            TagField::Title => self.data.set_title(value),
            TagField::Artist => self.data.set_artist(value),
            TagField::Album => self.data.set_album(value),
            TagField::AlbumArtist => self.data.set_album_artist(value),
            TagField::OriginalArtist => self.data.set_text("TOPE", value),
            TagField::Composer => self.data.set_text("TCOM", value),
            TagField::EncodedBy => self.data.set_text("TENC", value),
            TagField::Publisher => self.data.set_text("TPUB", value),
            TagField::Copyright => self.data.set_text("TCOP", value),
            TagField::Genre => self.data.set_genre(value),
            TagField::Comment => {
                self.data.remove_comment(Some(""), None);
                let _unused = self.data.add_frame(Comment {
                    lang: COMMENT_LANG.to_string(),
                    description: String::new(),
                    text: value.to_string(),
                });
            }
            TagField::Url => {
                let _unused = self.data.remove("WXXX");
                let _unused = self.data.add_frame(id3::Frame::with_content(
                    "WXXX",
                    Content::ExtendedLink(ExtendedLink {
                        description: String::new(),
                        link: value.to_string(),
                    }),
                ));
            }
            _ => unreachable!("field {field} is not text-like"),
        }
    }

    /// Store a numeric pair half. Setting one half preserves the other.
    ///
    /// Both halves live in a single `number/total` text frame that cannot represent a bare
    /// total, so storing a total while the number half is absent also stores number 1.
    fn store_number(&mut self, field: TagField, number: u32) {
        match field {
            TagField::TrackNumber => self.data.set_track(number),
            TagField::TrackTotal => self.data.set_total_tracks(number),
            TagField::DiscNumber => self.data.set_disc(number),
            TagField::DiscTotal => self.data.set_total_discs(number),
            _ => unreachable!("field {field} is not numeric"),
        }
    }

    /// Store a date field.
    fn store_date(&mut self, field: TagField, timestamp: Timestamp) {
        match field {
            TagField::ReleaseDate => self.data.set_date_released(timestamp),
            TagField::RecordingDate => self.data.set_date_recorded(timestamp),
            TagField::OriginalReleaseDate => {
                self.data.set_text("TDOR", timestamp.to_string());
            }
            _ => unreachable!("field {field} is not a date"),
        }
    }

    /// Remove a field. Returns `Unchanged` if the field was already absent.
    fn clear(&mut self, field: TagField) -> SetFieldResult {
        if self.get(field).is_none() {
            return SetFieldResult::Unchanged;
        }
        match field {
            TagField::Title => self.data.remove_title(),
            TagField::Artist => self.data.remove_artist(),
            TagField::Album => self.data.remove_album(),
            TagField::AlbumArtist => self.data.remove_album_artist(),
            TagField::OriginalArtist => {
                let _unused = self.data.remove("TOPE");
            }
            TagField::Composer => {
                let _unused = self.data.remove("TCOM");
            }
            TagField::EncodedBy => {
                let _unused = self.data.remove("TENC");
            }
            TagField::Publisher => {
                let _unused = self.data.remove("TPUB");
            }
            TagField::Copyright => {
                let _unused = self.data.remove("TCOP");
            }
            TagField::Comment => self.data.remove_comment(Some(""), None),
            TagField::Url => {
                let _unused = self.data.remove("WXXX");
            }
            TagField::Genre => self.data.remove_genre(),
            TagField::TrackNumber => self.data.remove_track(),
            TagField::TrackTotal => self.data.remove_total_tracks(),
            TagField::DiscNumber => self.data.remove_disc(),
            TagField::DiscTotal => self.data.remove_total_discs(),
            TagField::ReleaseDate => self.data.remove_date_released(),
            TagField::RecordingDate => self.data.remove_date_recorded(),
            TagField::OriginalReleaseDate => {
                let _unused = self.data.remove("TDOR");
            }
        }
        self.dirty = true;
        SetFieldResult::Changed
    }
}

impl Tag for ID3v2Tag {
    fn version(&self) -> TagVersion {
        match self.data.version() {
            id3::Version::Id3v22 => TagVersion::Id3v22,
            id3::Version::Id3v23 => TagVersion::Id3v23,
            id3::Version::Id3v24 => TagVersion::Id3v24,
        }
    }

    fn get(&self, field: TagField) -> Option<String> {
        match field {
            TagField::Title => self.data.title().map(ToString::to_string),
            TagField::Artist => self.data.artist().map(ToString::to_string),
            TagField::Album => self.data.album().map(ToString::to_string),
            TagField::AlbumArtist => self.data.album_artist().map(ToString::to_string),
            TagField::OriginalArtist => self.text_frame("TOPE"),
            TagField::Composer => self.text_frame("TCOM"),
            TagField::EncodedBy => self.text_frame("TENC"),
            TagField::Publisher => self.text_frame("TPUB"),
            TagField::Copyright => self.text_frame("TCOP"),
            TagField::Comment => self
                .data
                .comments()
                .find(|comment| comment.description.is_empty())
                .map(|comment| comment.text.clone()),
            TagField::Url => self.data.get("WXXX").and_then(|frame| {
                if let Content::ExtendedLink(link) = frame.content() {
                    Some(link.link.clone())
                } else {
                    None
                }
            }),
            TagField::Genre => self.data.genre().map(ToString::to_string),
            TagField::TrackNumber => self.data.track().map(|number| number.to_string()),
            TagField::TrackTotal => self.data.total_tracks().map(|number| number.to_string()),
            TagField::DiscNumber => self.data.disc().map(|number| number.to_string()),
            TagField::DiscTotal => self.data.total_discs().map(|number| number.to_string()),
            TagField::ReleaseDate => self
                .data
                .date_released()
                .map(|timestamp| timestamp.to_string()),
            TagField::RecordingDate => self
                .data
                .date_recorded()
                .map(|timestamp| timestamp.to_string()),
            TagField::OriginalReleaseDate => self.text_frame("TDOR"),
        }
    }

    fn set(&mut self, field: TagField, value: &str) -> crate::Result<SetFieldResult> {
        if !self.supports(field) {
            return Err(crate::ErrorType::UnsupportedField {
                field,
                version: self.version(),
            });
        }
        if value.is_empty() {
            return Ok(self.clear(field));
        }
        let current = self.get(field);
        let result = match field {
            TagField::TrackNumber
            | TagField::TrackTotal
            | TagField::DiscNumber
            | TagField::DiscTotal => match value.parse::<u32>() {
                Err(_) => SetFieldResult::Rejected,
                Ok(number) => {
                    if current.as_deref() == Some(number.to_string().as_str()) {
                        SetFieldResult::Unchanged
                    } else {
                        self.store_number(field, number);
                        SetFieldResult::Changed
                    }
                }
            },
            TagField::ReleaseDate | TagField::RecordingDate | TagField::OriginalReleaseDate => {
                match value.parse::<Timestamp>() {
                    Err(_) => SetFieldResult::Rejected,
                    Ok(timestamp) => {
                        if current.as_deref() == Some(timestamp.to_string().as_str()) {
                            SetFieldResult::Unchanged
                        } else {
                            self.store_date(field, timestamp);
                            SetFieldResult::Changed
                        }
                    }
                }
            }
            _ => {
                if current.as_deref() == Some(value) {
                    SetFieldResult::Unchanged
                } else {
                    self.store_text(field, value);
                    SetFieldResult::Changed
                }
            }
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

#[cfg(test)]
mod tests {
    use super::*;
    use paste::paste;

    macro_rules! add_test_get_and_set_with_version {
        ($field:expr, $version:expr, $fnsuffix:ident) => {
            paste! {
                #[test]
                fn [<test_get_and_set_ $fnsuffix>]() {
                    let mut tag = ID3v2Tag::new($version);
                    assert!(tag.get($field).is_none());
                    assert!(!tag.is_dirty());

                    assert_eq!(
                        tag.set($field, "Example Value").unwrap(),
                        SetFieldResult::Changed
                    );
                    assert_eq!(tag.get($field).as_deref(), Some("Example Value"));
                    assert!(tag.is_dirty());

                    assert_eq!(
                        tag.set($field, "Example Value").unwrap(),
                        SetFieldResult::Unchanged
                    );
                }
            }
        };
    }
    macro_rules! add_test_get_and_set_all_versions {
        ($field:expr, $fnsuffix:ident) => {
            paste! {
            add_test_get_and_set_with_version!($field, TagVersion::Id3v22, [< $fnsuffix _id3v22>]);
            add_test_get_and_set_with_version!($field, TagVersion::Id3v23, [< $fnsuffix _id3v23>]);
            add_test_get_and_set_with_version!($field, TagVersion::Id3v24, [< $fnsuffix _id3v24>]);
            }
        };
    }

    add_test_get_and_set_all_versions!(TagField::Title, title);
    add_test_get_and_set_all_versions!(TagField::Artist, artist);
    add_test_get_and_set_all_versions!(TagField::Album, album);
    add_test_get_and_set_all_versions!(TagField::AlbumArtist, albumartist);
    add_test_get_and_set_all_versions!(TagField::OriginalArtist, originalartist);
    add_test_get_and_set_all_versions!(TagField::Composer, composer);
    add_test_get_and_set_all_versions!(TagField::EncodedBy, encodedby);
    add_test_get_and_set_all_versions!(TagField::Publisher, publisher);
    add_test_get_and_set_all_versions!(TagField::Copyright, copyright);
    add_test_get_and_set_all_versions!(TagField::Comment, comment);
    add_test_get_and_set_all_versions!(TagField::Url, url);
    add_test_get_and_set_all_versions!(TagField::Genre, genre);

    #[test]
    fn test_empty_string_clears_field() {
        let mut tag = ID3v2Tag::new(TagVersion::Id3v24);
        assert_eq!(
            tag.set(TagField::Title, "Paranoid").unwrap(),
            SetFieldResult::Changed
        );
        assert_eq!(
            tag.set(TagField::Title, "").unwrap(),
            SetFieldResult::Changed
        );
        assert!(tag.get(TagField::Title).is_none());

        // Clearing an absent field is a no-op.
        assert_eq!(
            tag.set(TagField::Title, "").unwrap(),
            SetFieldResult::Unchanged
        );
    }

    #[test]
    fn test_track_pair_preserves_other_half() {
        let mut tag = ID3v2Tag::new(TagVersion::Id3v24);
        assert_eq!(
            tag.set(TagField::TrackNumber, "3").unwrap(),
            SetFieldResult::Changed
        );
        assert_eq!(
            tag.set(TagField::TrackTotal, "12").unwrap(),
            SetFieldResult::Changed
        );
        assert_eq!(tag.get(TagField::TrackNumber).as_deref(), Some("3"));
        assert_eq!(tag.get(TagField::TrackTotal).as_deref(), Some("12"));

        assert_eq!(
            tag.set(TagField::TrackNumber, "4").unwrap(),
            SetFieldResult::Changed
        );
        assert_eq!(tag.get(TagField::TrackTotal).as_deref(), Some("12"));
    }

    #[test]
    fn test_disc_pair_preserves_other_half() {
        let mut tag = ID3v2Tag::new(TagVersion::Id3v23);
        assert_eq!(
            tag.set(TagField::DiscNumber, "1").unwrap(),
            SetFieldResult::Changed
        );
        assert_eq!(
            tag.set(TagField::DiscTotal, "2").unwrap(),
            SetFieldResult::Changed
        );
        assert_eq!(tag.get(TagField::DiscNumber).as_deref(), Some("1"));
        assert_eq!(tag.get(TagField::DiscTotal).as_deref(), Some("2"));

        assert_eq!(
            tag.set(TagField::DiscTotal, "3").unwrap(),
            SetFieldResult::Changed
        );
        assert_eq!(tag.get(TagField::DiscNumber).as_deref(), Some("1"));
    }

    #[test]
    fn test_total_without_number_stores_number_one() {
        // The pair frame cannot hold a bare total, so the number half materializes as 1.
        let mut tag = ID3v2Tag::new(TagVersion::Id3v24);
        assert_eq!(
            tag.set(TagField::DiscTotal, "2").unwrap(),
            SetFieldResult::Changed
        );
        assert_eq!(tag.get(TagField::DiscNumber).as_deref(), Some("1"));
        assert_eq!(tag.get(TagField::DiscTotal).as_deref(), Some("2"));

        // The materialized number is real stored state, so re-setting it is a no-op
        // and change reporting stays truthful.
        assert_eq!(
            tag.set(TagField::DiscNumber, "1").unwrap(),
            SetFieldResult::Unchanged
        );
        assert_eq!(
            tag.set(TagField::DiscNumber, "4").unwrap(),
            SetFieldResult::Changed
        );
        assert_eq!(tag.get(TagField::DiscTotal).as_deref(), Some("2"));
    }

    #[test]
    fn test_invalid_number_is_rejected() {
        let mut tag = ID3v2Tag::new(TagVersion::Id3v24);
        assert_eq!(
            tag.set(TagField::TrackNumber, "7").unwrap(),
            SetFieldResult::Changed
        );
        assert_eq!(
            tag.set(TagField::TrackNumber, "seven").unwrap(),
            SetFieldResult::Rejected
        );
        assert_eq!(tag.get(TagField::TrackNumber).as_deref(), Some("7"));
    }

    #[test]
    fn test_invalid_date_is_rejected_and_value_kept() {
        let mut tag = ID3v2Tag::new(TagVersion::Id3v24);
        assert_eq!(
            tag.set(TagField::RecordingDate, "1986-04-26").unwrap(),
            SetFieldResult::Changed
        );
        tag.mark_clean();

        assert_eq!(
            tag.set(TagField::RecordingDate, "not a date").unwrap(),
            SetFieldResult::Rejected
        );
        assert_eq!(
            tag.get(TagField::RecordingDate).as_deref(),
            Some("1986-04-26")
        );
        assert!(!tag.is_dirty());
    }

    #[test]
    fn test_year_only_date_is_accepted() {
        let mut tag = ID3v2Tag::new(TagVersion::Id3v24);
        assert_eq!(
            tag.set(TagField::ReleaseDate, "1986").unwrap(),
            SetFieldResult::Changed
        );
        assert_eq!(tag.get(TagField::ReleaseDate).as_deref(), Some("1986"));
    }

    #[test]
    fn test_original_release_date_requires_id3v24() {
        let mut tag = ID3v2Tag::new(TagVersion::Id3v23);
        assert!(!tag.supports(TagField::OriginalReleaseDate));
        assert!(matches!(
            tag.set(TagField::OriginalReleaseDate, "1970-01-01"),
            Err(crate::ErrorType::UnsupportedField {
                field: TagField::OriginalReleaseDate,
                version: TagVersion::Id3v23,
            })
        ));

        let mut tag = ID3v2Tag::new(TagVersion::Id3v24);
        assert_eq!(
            tag.set(TagField::OriginalReleaseDate, "1970-01-01").unwrap(),
            SetFieldResult::Changed
        );
        assert_eq!(
            tag.get(TagField::OriginalReleaseDate).as_deref(),
            Some("1970-01-01")
        );
    }

    #[test]
    fn test_unchanged_set_does_not_mark_dirty() {
        let mut tag = ID3v2Tag::new(TagVersion::Id3v24);
        assert_eq!(
            tag.set(TagField::Artist, "Queen").unwrap(),
            SetFieldResult::Changed
        );
        tag.mark_clean();
        assert_eq!(
            tag.set(TagField::Artist, "Queen").unwrap(),
            SetFieldResult::Unchanged
        );
        assert!(!tag.is_dirty());
    }

    #[test]
    fn test_custom_text() {
        let mut tag = ID3v2Tag::new(TagVersion::Id3v24);
        assert!(tag.custom_text("MOOD").is_none());

        assert_eq!(
            tag.set_custom_text("MOOD", "mellow"),
            SetFieldResult::Changed
        );
        assert_eq!(tag.custom_text("MOOD").as_deref(), Some("mellow"));
        assert!(tag.is_dirty());

        assert_eq!(tag.set_custom_text("MOOD", ""), SetFieldResult::Changed);
        assert!(tag.custom_text("MOOD").is_none());
    }

    #[test]
    fn test_supports_follows_version() {
        let tag = ID3v2Tag::new(TagVersion::Id3v23);
        assert!(tag.supports(TagField::Title));
        assert!(tag.supports(TagField::DiscTotal));
        assert!(tag.supports(TagField::TrackNumber));
        assert!(!tag.supports(TagField::OriginalReleaseDate));
    }
}
