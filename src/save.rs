// Copyright (c) 2026 The retag authors
//
// This Source Code Form is subject to the terms of the Mozilla Public License, v. 2.0. If a copy
// of the MPL was not distributed with this file, You can obtain one at
// http://mozilla.org/MPL/2.0/.
//
// SPDX-License-Identifier: MPL-2.0

//! Persisting tags back to disk.
//!
//! Saving a file is a two-step affair: [`plan`] classifies the requested targets into removals
//! and per-slot writes without touching the disk, and [`save`] executes such a plan. The two
//! slots are written independently: a failure on one slot never rolls back the other, the
//! failed slot simply keeps its in-memory edits and dirty flag so the save can be retried.

use crate::audiofile::{AudioFile, TagSlot};
use crate::config::Config;
use crate::tag::{ID3v1Tag, ID3v2Tag, Tag, TagField, TagFormat, TagVersion, TextEncoding};
use lofty::config::WriteOptions;
use lofty::tag::{TagExt, TagType};
use std::path::Path;
use unidecode::unidecode;

/// Save targets for a single file.
///
/// `None` means "remove that tag"; both targets `None` strips the file of all tags and leaves a
/// fresh in-memory tag behind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SaveOptions {
    /// Target version for the ID3v2 slot.
    pub id3v2_version: Option<TagVersion>,
    /// Target version for the ID3v1 slot.
    pub id3v1_version: Option<TagVersion>,
    /// Text encoding override, applied to ID3v2 writes only.
    pub encoding: Option<TextEncoding>,
}

impl SaveOptions {
    /// Build options from the configured default save targets.
    #[must_use]
    pub fn from_config(config: &Config) -> Self {
        SaveOptions {
            id3v2_version: config.save.id3v2_version,
            id3v1_version: config.save.id3v1_version,
            encoding: config.save.encoding,
        }
    }
}

/// Classified actions for a single save, produced by [`plan`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SavePlan {
    /// Remove the ID3v2 tag from the file.
    pub remove_id3v2: bool,
    /// Remove the ID3v1 tag from the file.
    pub remove_id3v1: bool,
    /// Write an ID3v2 tag with this version, seeded from the tag in the given slot.
    pub write_id3v2: Option<(TagVersion, TagSlot)>,
    /// Write an ID3v1 tag with this version, seeded from the tag in the given slot.
    pub write_id3v1: Option<(TagVersion, TagSlot)>,
    /// Attach a fresh in-memory tag after stripping the file (both targets were `None`).
    pub synthesize_fresh: bool,
}

/// Classify the requested save targets for a file.
///
/// This is a pure function: it performs no I/O and leaves the file untouched, so a rejected
/// target surfaces before anything is modified.
///
/// # Errors
///
/// Returns [`ErrorType::InvalidSaveVersion`](crate::ErrorType::InvalidSaveVersion) if a target
/// version does not fit its slot (this includes ID3v2.2, which is read-only), and
/// [`ErrorType::InvalidEncoding`](crate::ErrorType::InvalidEncoding) if UTF-8 is requested for a
/// pre-v2.4 target.
pub fn plan(file: &AudioFile, options: &SaveOptions) -> crate::Result<SavePlan> {
    if let Some(version) = options.id3v2_version {
        if version.format() != TagFormat::Id3v2 || version == TagVersion::Id3v22 {
            return Err(crate::ErrorType::InvalidSaveVersion {
                slot: TagSlot::Header,
                version,
            });
        }
        if options.encoding == Some(TextEncoding::Utf8) && version != TagVersion::Id3v24 {
            return Err(crate::ErrorType::InvalidEncoding {
                encoding: TextEncoding::Utf8,
                version,
            });
        }
    }
    if let Some(version) = options.id3v1_version {
        if version.format() != TagFormat::Id3v1 {
            return Err(crate::ErrorType::InvalidSaveVersion {
                slot: TagSlot::Trailer,
                version,
            });
        }
    }

    let has_header = file.id3v2().is_some();
    let has_trailer = file.id3v1().is_some();
    debug_assert!(has_header || has_trailer, "file carries no tags");

    // A write is seeded from the same-format tag when one exists, and from the other
    // (cross-format) tag otherwise.
    let write_id3v2 = options.id3v2_version.map(|version| {
        let source = if has_header {
            TagSlot::Header
        } else {
            TagSlot::Trailer
        };
        (version, source)
    });
    let write_id3v1 = options.id3v1_version.map(|version| {
        let source = if has_trailer {
            TagSlot::Trailer
        } else {
            TagSlot::Header
        };
        (version, source)
    });

    Ok(SavePlan {
        remove_id3v2: options.id3v2_version.is_none() && has_header,
        remove_id3v1: options.id3v1_version.is_none() && has_trailer,
        write_id3v2,
        write_id3v1,
        synthesize_fresh: options.id3v2_version.is_none() && options.id3v1_version.is_none(),
    })
}

/// Save a file according to the given options.
///
/// Removals happen first, then the ID3v1 slot is written, then the ID3v2 slot. After each
/// successful write the source tag's dirty flag is cleared and the written slot is reloaded from
/// the persisted bytes, making the codec the source of truth. The selection is recomputed
/// afterwards in every case.
///
/// # Errors
///
/// Returns the [`plan`] errors, or an [`ErrorType::SaveFailed`](crate::ErrorType::SaveFailed)
/// wrapping the slot that could not be written or removed.
pub fn save(file: &mut AudioFile, options: &SaveOptions, config: &Config) -> crate::Result<()> {
    let save_plan = plan(file, options)?;
    log::debug!("Save plan for {}: {:?}", file.path().display(), save_plan);
    let result = execute(file, options, &save_plan, config);
    file.reselect(config.prefer_id3v1());
    result
}

/// Execute a save plan. Selection recomputation is left to the caller.
fn execute(
    file: &mut AudioFile,
    options: &SaveOptions,
    save_plan: &SavePlan,
    config: &Config,
) -> crate::Result<()> {
    // Snapshots taken before any slot is detached, so a removed tag can still seed a
    // cross-format write.
    let header_source = file.id3v2().cloned();
    let trailer_source = file.id3v1().cloned();

    if save_plan.remove_id3v1 {
        TagType::Id3v1
            .remove_from_path(file.path())
            .map_err(|err| save_error(file.path(), TagSlot::Trailer, err.into()))?;
        file.clear_slot(TagSlot::Trailer);
        log::info!("Removed ID3v1 tag from {}", file.path().display());
    }
    if save_plan.remove_id3v2 {
        TagType::Id3v2
            .remove_from_path(file.path())
            .map_err(|err| save_error(file.path(), TagSlot::Header, err.into()))?;
        file.clear_slot(TagSlot::Header);
        log::info!("Removed ID3v2 tag from {}", file.path().display());
    }

    if save_plan.synthesize_fresh {
        file.init_default_tag(config);
        log::info!(
            "Stripped all tags from {}, attached a fresh {} tag",
            file.path().display(),
            config.preferred_version()
        );
        return Ok(());
    }

    if let Some((version, source)) = save_plan.write_id3v1 {
        let disk_tag = match source {
            TagSlot::Trailer => trailer_source.as_ref().map(|tag| {
                let mut data = tag.inner().clone();
                // A v1.0 tag is a v1.1 tag without the track number byte.
                if version == TagVersion::Id3v10 {
                    data.track_number = None;
                }
                data
            }),
            TagSlot::Header => header_source.as_ref().map(|tag| {
                let mut seeded = ID3v1Tag::new(version);
                copy_fields(tag, &mut seeded);
                seeded.inner().clone()
            }),
        };
        if let Some(disk_tag) = disk_tag {
            disk_tag
                .save_to_path(file.path(), WriteOptions::default())
                .map_err(|err| save_error(file.path(), TagSlot::Trailer, err.into()))?;
            file.mark_slot_clean(source);
            file.reload_id3v1()?;
            log::info!("Wrote {} tag to {}", version, file.path().display());
        }
    }

    if let Some((version, source)) = save_plan.write_id3v2 {
        let built = match source {
            TagSlot::Header => header_source.clone(),
            TagSlot::Trailer => trailer_source.as_ref().map(|tag| {
                let mut seeded = ID3v2Tag::new(version);
                copy_fields(tag, &mut seeded);
                seeded
            }),
        };
        if let Some(mut tag) = built {
            if options.encoding == Some(TextEncoding::Latin1) {
                transliterate(&mut tag);
            }
            tag.write_to_path(file.path(), version)
                .map_err(|err| save_error(file.path(), TagSlot::Header, err))?;
            file.mark_slot_clean(source);
            file.reload_id3v2()?;
            log::info!("Wrote {} tag to {}", version, file.path().display());
        }
    }

    Ok(())
}

/// Copy every field the destination can represent from one tag to another.
///
/// Fields the destination does not support are dropped silently.
pub(crate) fn copy_fields(source: &dyn Tag, dest: &mut dyn Tag) {
    for field in TagField::all() {
        if !dest.supports(field) {
            log::debug!("Dropping field {field}, not supported by {}", dest.version());
            continue;
        }
        if let Some(value) = source.get(field) {
            if dest.set(field, &value).is_err() {
                log::debug!("Dropping field {field}, rejected by {}", dest.version());
            }
        }
    }
}

/// Replace every text-bearing field with its ASCII transliteration.
fn transliterate(tag: &mut ID3v2Tag) {
    for field in TagField::all().into_iter().filter(TagField::is_text) {
        if let Some(value) = tag.get(field) {
            let ascii = unidecode(&value);
            if ascii != value && tag.set(field, &ascii).is_err() {
                log::warn!("Could not transliterate field {field}");
            }
        }
    }
}

/// Wrap a slot operation failure with file and slot context.
fn save_error(path: &Path, slot: TagSlot, source: crate::ErrorType) -> crate::ErrorType {
    crate::ErrorType::SaveFailed {
        path: path.to_path_buf(),
        slot,
        source: Box::new(source),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::util::testing::write_mpeg_stream;

    fn dual_tag_file() -> AudioFile {
        AudioFile::with_tags(
            Some(ID3v2Tag::new(TagVersion::Id3v24)),
            Some(ID3v1Tag::new(TagVersion::Id3v11)),
            false,
        )
    }

    fn header_only_file() -> AudioFile {
        AudioFile::with_tags(Some(ID3v2Tag::new(TagVersion::Id3v24)), None, false)
    }

    #[test]
    fn test_plan_rejects_id3v22_target() {
        let options = SaveOptions {
            id3v2_version: Some(TagVersion::Id3v22),
            ..SaveOptions::default()
        };
        assert!(matches!(
            plan(&dual_tag_file(), &options),
            Err(crate::ErrorType::InvalidSaveVersion {
                slot: TagSlot::Header,
                version: TagVersion::Id3v22,
            })
        ));
    }

    #[test]
    fn test_plan_rejects_format_mismatch() {
        let options = SaveOptions {
            id3v2_version: Some(TagVersion::Id3v11),
            ..SaveOptions::default()
        };
        assert!(plan(&dual_tag_file(), &options).is_err());

        let options = SaveOptions {
            id3v1_version: Some(TagVersion::Id3v23),
            ..SaveOptions::default()
        };
        assert!(plan(&dual_tag_file(), &options).is_err());
    }

    #[test]
    fn test_plan_rejects_utf8_for_id3v23() {
        let options = SaveOptions {
            id3v2_version: Some(TagVersion::Id3v23),
            id3v1_version: None,
            encoding: Some(TextEncoding::Utf8),
        };
        assert!(matches!(
            plan(&dual_tag_file(), &options),
            Err(crate::ErrorType::InvalidEncoding { .. })
        ));

        let options = SaveOptions {
            id3v2_version: Some(TagVersion::Id3v24),
            id3v1_version: None,
            encoding: Some(TextEncoding::Utf8),
        };
        assert!(plan(&dual_tag_file(), &options).is_ok());
    }

    #[test]
    fn test_plan_prefers_same_format_source() {
        let options = SaveOptions {
            id3v2_version: Some(TagVersion::Id3v24),
            id3v1_version: Some(TagVersion::Id3v11),
            encoding: None,
        };
        let save_plan = plan(&dual_tag_file(), &options).unwrap();
        assert_eq!(
            save_plan.write_id3v2,
            Some((TagVersion::Id3v24, TagSlot::Header))
        );
        assert_eq!(
            save_plan.write_id3v1,
            Some((TagVersion::Id3v11, TagSlot::Trailer))
        );
        assert!(!save_plan.remove_id3v2);
        assert!(!save_plan.remove_id3v1);
        assert!(!save_plan.synthesize_fresh);
    }

    #[test]
    fn test_plan_crossformat_source() {
        let options = SaveOptions {
            id3v2_version: None,
            id3v1_version: Some(TagVersion::Id3v11),
            encoding: None,
        };
        let save_plan = plan(&header_only_file(), &options).unwrap();
        assert_eq!(
            save_plan.write_id3v1,
            Some((TagVersion::Id3v11, TagSlot::Header))
        );
        assert!(save_plan.remove_id3v2);
        assert!(!save_plan.remove_id3v1);
    }

    #[test]
    fn test_plan_both_none_synthesizes() {
        let save_plan = plan(&dual_tag_file(), &SaveOptions::default()).unwrap();
        assert!(save_plan.synthesize_fresh);
        assert!(save_plan.remove_id3v2);
        assert!(save_plan.remove_id3v1);
        assert!(save_plan.write_id3v2.is_none());
        assert!(save_plan.write_id3v1.is_none());
    }

    #[test]
    fn test_plan_does_not_remove_absent_slots() {
        let save_plan = plan(&header_only_file(), &SaveOptions::default()).unwrap();
        assert!(save_plan.remove_id3v2);
        assert!(!save_plan.remove_id3v1);
    }

    #[test]
    fn test_copy_fields_drops_unsupported() {
        let mut source = ID3v2Tag::new(TagVersion::Id3v24);
        let _unused = source.set(TagField::Title, "Silent Lucidity").unwrap();
        let _unused = source.set(TagField::AlbumArtist, "Queensrÿche").unwrap();
        let _unused = source.set(TagField::TrackNumber, "9").unwrap();

        let mut dest = ID3v1Tag::new(TagVersion::Id3v11);
        copy_fields(&source, &mut dest);
        assert_eq!(dest.get(TagField::Title).as_deref(), Some("Silent Lucidity"));
        assert_eq!(dest.get(TagField::TrackNumber).as_deref(), Some("9"));
        assert!(dest.get(TagField::AlbumArtist).is_none());
    }

    #[test]
    fn test_save_writes_header_and_reloads() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("track.mp3");
        write_mpeg_stream(&path);

        let config = Config::default();
        let mut file = AudioFile::read_from_path(&path, &config).unwrap();
        // A bare stream gets a fresh tag of the preferred version.
        assert_eq!(
            file.id3v2().unwrap().version(),
            TagVersion::Id3v24
        );
        assert!(!file.is_dirty());

        let _unused = file
            .id3v2_mut()
            .unwrap()
            .set(TagField::Title, "Detroit Rock City")
            .unwrap();
        let _unused = file.id3v2_mut().unwrap().set(TagField::Artist, "Kiss").unwrap();
        assert!(file.is_dirty());

        let options = SaveOptions {
            id3v2_version: Some(TagVersion::Id3v24),
            id3v1_version: None,
            encoding: None,
        };
        save(&mut file, &options, &config).unwrap();
        assert!(!file.is_dirty());

        let reread = AudioFile::read_from_path(&path, &config).unwrap();
        assert_eq!(
            reread.id3v2().unwrap().get(TagField::Title).as_deref(),
            Some("Detroit Rock City")
        );
        assert_eq!(
            reread.id3v2().unwrap().get(TagField::Artist).as_deref(),
            Some("Kiss")
        );
        assert!(reread.id3v1().is_none());
    }

    #[test]
    fn test_save_crossformat_seeds_trailer_from_header() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("track.mp3");
        write_mpeg_stream(&path);

        let config = Config::default();
        let mut file = AudioFile::read_from_path(&path, &config).unwrap();
        let header = file.id3v2_mut().unwrap();
        let _unused = header.set(TagField::Title, "Song").unwrap();
        let _unused = header.set(TagField::Artist, "Band").unwrap();
        let _unused = header.set(TagField::TrackNumber, "5").unwrap();
        let _unused = header.set(TagField::AlbumArtist, "Someone Else").unwrap();

        let options = SaveOptions {
            id3v2_version: None,
            id3v1_version: Some(TagVersion::Id3v11),
            encoding: None,
        };
        save(&mut file, &options, &config).unwrap();

        assert!(file.id3v2().is_none());
        let trailer = file.id3v1().unwrap();
        assert_eq!(trailer.version(), TagVersion::Id3v11);
        assert_eq!(trailer.get(TagField::Title).as_deref(), Some("Song"));
        assert_eq!(trailer.get(TagField::Artist).as_deref(), Some("Band"));
        assert_eq!(trailer.get(TagField::TrackNumber).as_deref(), Some("5"));
        // Header-only fields are dropped silently.
        assert!(trailer.get(TagField::AlbumArtist).is_none());

        assert!(!file.is_dirty());
        assert_eq!(file.selected_slot(), TagSlot::Trailer);
    }

    #[test]
    fn test_save_both_none_strips_and_synthesizes() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("track.mp3");
        write_mpeg_stream(&path);

        let config = Config::default();
        let mut file = AudioFile::read_from_path(&path, &config).unwrap();
        let _unused = file.id3v2_mut().unwrap().set(TagField::Title, "Gone").unwrap();
        let options = SaveOptions {
            id3v2_version: Some(TagVersion::Id3v24),
            id3v1_version: Some(TagVersion::Id3v11),
            encoding: None,
        };
        save(&mut file, &options, &config).unwrap();
        assert!(file.id3v2().is_some());
        assert!(file.id3v1().is_some());

        // Now strip everything.
        let _unused = file.id3v2_mut().unwrap().set(TagField::Artist, "Nobody").unwrap();
        save(&mut file, &SaveOptions::default(), &config).unwrap();

        // Nothing on disk, one fresh clean tag in memory.
        let reread = AudioFile::read_from_path(&path, &config).unwrap();
        assert!(reread.id3v1().is_none());
        assert!(reread.id3v2().unwrap().get(TagField::Title).is_none());

        assert!(!file.is_dirty());
        assert!(file.id3v2().is_some());
        assert!(file.id3v1().is_none());
        assert!(file.id3v2().unwrap().get(TagField::Artist).is_none());
        assert_eq!(file.selected_slot(), TagSlot::Header);
    }

    #[test]
    fn test_save_v10_target_strips_track_number() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("track.mp3");
        write_mpeg_stream(&path);

        let config = Config::default();
        let mut file = AudioFile::read_from_path(&path, &config).unwrap();
        let header = file.id3v2_mut().unwrap();
        let _unused = header.set(TagField::Title, "Old School").unwrap();
        let _unused = header.set(TagField::TrackNumber, "2").unwrap();

        let options = SaveOptions {
            id3v2_version: None,
            id3v1_version: Some(TagVersion::Id3v10),
            encoding: None,
        };
        save(&mut file, &options, &config).unwrap();

        let trailer = file.id3v1().unwrap();
        assert_eq!(trailer.version(), TagVersion::Id3v10);
        assert_eq!(trailer.get(TagField::Title).as_deref(), Some("Old School"));
        assert!(trailer.get(TagField::TrackNumber).is_none());
    }

    #[test]
    fn test_save_latin1_transliterates_text_fields() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("track.mp3");
        write_mpeg_stream(&path);

        let config = Config::default();
        let mut file = AudioFile::read_from_path(&path, &config).unwrap();
        let _unused = file
            .id3v2_mut()
            .unwrap()
            .set(TagField::Artist, "Motörhead")
            .unwrap();

        let options = SaveOptions {
            id3v2_version: Some(TagVersion::Id3v24),
            id3v1_version: None,
            encoding: Some(TextEncoding::Latin1),
        };
        save(&mut file, &options, &config).unwrap();

        assert_eq!(
            file.id3v2().unwrap().get(TagField::Artist).as_deref(),
            Some("Motorhead")
        );
    }

    #[test]
    fn test_failed_write_keeps_edits_and_dirty_flag() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("track.mp3");
        write_mpeg_stream(&path);

        let config = Config::default();
        let mut file = AudioFile::read_from_path(&path, &config).unwrap();
        let _unused = file.id3v2_mut().unwrap().set(TagField::Title, "Kept Edit").unwrap();
        assert!(file.is_dirty());

        // Turning the path into a directory makes the slot write fail.
        std::fs::remove_file(&path).unwrap();
        std::fs::create_dir(&path).unwrap();

        let options = SaveOptions {
            id3v2_version: Some(TagVersion::Id3v24),
            id3v1_version: None,
            encoding: None,
        };
        let err = save(&mut file, &options, &config).unwrap_err();
        assert!(matches!(
            err,
            crate::ErrorType::SaveFailed {
                slot: TagSlot::Header,
                ..
            }
        ));

        // The failed slot keeps its edits and dirty flag so the save can be retried.
        assert!(file.is_dirty());
        assert_eq!(
            file.id3v2().unwrap().get(TagField::Title).as_deref(),
            Some("Kept Edit")
        );
    }

    #[test]
    fn test_save_version_migration_reloads_with_target_version() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("track.mp3");
        write_mpeg_stream(&path);

        let config = Config::default();
        let mut file = AudioFile::read_from_path(&path, &config).unwrap();
        let _unused = file.id3v2_mut().unwrap().set(TagField::Title, "Migrate").unwrap();

        let options = SaveOptions {
            id3v2_version: Some(TagVersion::Id3v23),
            id3v1_version: None,
            encoding: None,
        };
        save(&mut file, &options, &config).unwrap();

        assert_eq!(file.id3v2().unwrap().version(), TagVersion::Id3v23);
        assert_eq!(
            file.id3v2().unwrap().get(TagField::Title).as_deref(),
            Some("Migrate")
        );
    }
}
