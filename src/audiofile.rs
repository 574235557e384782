// Copyright (c) 2026 The retag authors
//
// This Source Code Form is subject to the terms of the Mozilla Public License, v. 2.0. If a copy
// of the MPL was not distributed with this file, You can obtain one at
// http://mozilla.org/MPL/2.0/.
//
// SPDX-License-Identifier: MPL-2.0

//! A single MPEG audio file and its attached tags.

use crate::config::Config;
use crate::tag::{ID3v1Tag, ID3v2Tag, Tag, TagFormat, TagVersion};
use lofty::config::ParseOptions;
use lofty::file::AudioFile as _;
use lofty::mpeg::MpegFile;
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// The two positions a tag can occupy in a file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TagSlot {
    /// ID3v2 tag at the start of the file.
    Header,
    /// ID3v1 tag at the end of the file.
    Trailer,
}

impl TagSlot {
    /// The other slot.
    #[must_use]
    pub fn other(&self) -> TagSlot {
        match self {
            TagSlot::Header => TagSlot::Trailer,
            TagSlot::Trailer => TagSlot::Header,
        }
    }
}

impl fmt::Display for TagSlot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TagSlot::Header => write!(f, "ID3v2"),
            TagSlot::Trailer => write!(f, "ID3v1"),
        }
    }
}

/// Properties of the audio stream, read once at load time.
#[derive(Debug, Default, Clone)]
pub struct StreamInfo {
    /// Play time of the stream.
    pub duration: Duration,
    /// Audio bitrate in kbps.
    pub bitrate: u32,
    /// Sample rate in Hz.
    pub sample_rate: u32,
    /// Number of channels.
    pub channels: u8,
    /// MPEG version of the stream.
    pub mpeg_version: String,
    /// MPEG layer of the stream.
    pub layer: String,
    /// File size in bytes.
    pub size_bytes: u64,
}

impl StreamInfo {
    /// Build stream info from a parsed MPEG file.
    fn from_mpeg(mpeg: &MpegFile, size_bytes: u64) -> Self {
        let properties = mpeg.properties();
        StreamInfo {
            duration: properties.duration(),
            bitrate: properties.audio_bitrate(),
            sample_rate: properties.sample_rate(),
            channels: properties.channels(),
            mpeg_version: format!("{:?}", properties.version()),
            layer: format!("{:?}", properties.layer()),
            size_bytes,
        }
    }
}

/// An MPEG audio file with up to two attached tags and a selection state.
///
/// A file always carries at least one tag: loading a file without any tags attaches a fresh,
/// clean tag of the configured preferred version.
#[derive(Debug)]
pub struct AudioFile {
    /// Path of the file on disk.
    path: PathBuf,
    /// Properties of the audio stream.
    info: StreamInfo,
    /// The header-style tag, if present.
    id3v2: Option<ID3v2Tag>,
    /// The trailer-style tag, if present.
    id3v1: Option<ID3v1Tag>,
    /// The slot whose tag is currently shown and edited.
    selected: TagSlot,
    /// Whether the selection was requested explicitly (via [`AudioFile::select_version`]).
    explicit_selection: bool,
}

impl AudioFile {
    /// Load an audio file and its tags from the given path.
    ///
    /// # Errors
    ///
    /// Returns [`ErrorType::UnknownFileType`](crate::ErrorType::UnknownFileType) if the path does
    /// not have an `mp3` extension, and an error if the stream or a tag cannot be parsed.
    pub fn read_from_path(path: impl AsRef<Path>, config: &Config) -> crate::Result<Self> {
        let path = path.as_ref();
        let is_mp3 = path
            .extension()
            .map(std::ffi::OsStr::to_ascii_lowercase)
            .is_some_and(|extension| extension == "mp3");
        if !is_mp3 {
            log::debug!("Unknown file extension: {}", path.display());
            return Err(crate::ErrorType::UnknownFileType);
        }

        let mut file = fs::File::open(path)?;
        let mpeg = MpegFile::read_from(&mut file, ParseOptions::new())?;
        let info = StreamInfo::from_mpeg(&mpeg, file.metadata()?.len());
        let id3v1 = mpeg.id3v1().cloned().map(ID3v1Tag::from_inner);
        let id3v2 = ID3v2Tag::read_from_path(path)?;

        let mut audio_file = AudioFile {
            path: path.to_path_buf(),
            info,
            id3v2,
            id3v1,
            selected: TagSlot::Header,
            explicit_selection: false,
        };
        if audio_file.id3v2.is_none() && audio_file.id3v1.is_none() {
            log::debug!("{} has no tags, creating one", path.display());
            audio_file.init_default_tag(config);
        }
        audio_file.reselect(config.prefer_id3v1());
        Ok(audio_file)
    }

    /// Path of the file on disk.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Properties of the audio stream.
    #[must_use]
    pub fn info(&self) -> &StreamInfo {
        &self.info
    }

    /// The header-style tag, if present.
    #[must_use]
    pub fn id3v2(&self) -> Option<&ID3v2Tag> {
        self.id3v2.as_ref()
    }

    /// Mutable access to the header-style tag.
    pub fn id3v2_mut(&mut self) -> Option<&mut ID3v2Tag> {
        self.id3v2.as_mut()
    }

    /// The trailer-style tag, if present.
    #[must_use]
    pub fn id3v1(&self) -> Option<&ID3v1Tag> {
        self.id3v1.as_ref()
    }

    /// Mutable access to the trailer-style tag.
    pub fn id3v1_mut(&mut self) -> Option<&mut ID3v1Tag> {
        self.id3v1.as_mut()
    }

    /// The tag in the given slot, if present.
    #[must_use]
    pub fn tag(&self, slot: TagSlot) -> Option<&dyn Tag> {
        match slot {
            TagSlot::Header => self.id3v2.as_ref().map(|tag| -> &dyn Tag { tag }),
            TagSlot::Trailer => self.id3v1.as_ref().map(|tag| -> &dyn Tag { tag }),
        }
    }

    /// Mutable access to the tag in the given slot.
    pub fn tag_mut(&mut self, slot: TagSlot) -> Option<&mut dyn Tag> {
        match slot {
            TagSlot::Header => self.id3v2.as_mut().map(|tag| -> &mut dyn Tag { tag }),
            TagSlot::Trailer => self.id3v1.as_mut().map(|tag| -> &mut dyn Tag { tag }),
        }
    }

    /// Iterate over all attached tags.
    pub fn tags_mut(&mut self) -> impl Iterator<Item = &mut dyn Tag> + '_ {
        self.id3v2
            .as_mut()
            .map(|tag| -> &mut dyn Tag { tag })
            .into_iter()
            .chain(self.id3v1.as_mut().map(|tag| -> &mut dyn Tag { tag }))
    }

    /// The slot whose tag is currently selected.
    #[must_use]
    pub fn selected_slot(&self) -> TagSlot {
        self.selected
    }

    /// The currently selected tag.
    ///
    /// Always `Some` for a file that carries at least one tag. A selection pointing at an empty
    /// slot is a bug; debug builds assert, release builds fall back to the other slot.
    #[must_use]
    pub fn selected_tag(&self) -> Option<&dyn Tag> {
        let tag = self.tag(self.selected);
        debug_assert!(tag.is_some(), "selected slot {} has no tag", self.selected);
        tag.or_else(|| self.tag(self.selected.other()))
    }

    /// Mutable access to the currently selected tag.
    pub fn selected_tag_mut(&mut self) -> Option<&mut dyn Tag> {
        let slot = if self.tag(self.selected).is_some() {
            self.selected
        } else {
            debug_assert!(false, "selected slot {} has no tag", self.selected);
            self.selected.other()
        };
        self.tag_mut(slot)
    }

    /// Explicitly select the attached tag with the given version.
    ///
    /// The selection sticks until the set of attached tags changes.
    ///
    /// # Errors
    ///
    /// Returns [`ErrorType::NoSuchTagVersion`](crate::ErrorType::NoSuchTagVersion) if no attached
    /// tag has that version.
    pub fn select_version(&mut self, version: TagVersion) -> crate::Result<()> {
        let slot = [TagSlot::Header, TagSlot::Trailer]
            .into_iter()
            .find(|slot| {
                self.tag(*slot)
                    .is_some_and(|tag| tag.version() == version)
            })
            .ok_or(crate::ErrorType::NoSuchTagVersion(version))?;
        self.selected = slot;
        self.explicit_selection = true;
        Ok(())
    }

    /// Recompute the selection after the set of attached tags changed.
    ///
    /// A single tag selects itself; with both tags present the header wins unless the ID3v1
    /// preference is set. Any explicit selection is discarded.
    pub fn reselect(&mut self, prefer_id3v1: bool) {
        self.explicit_selection = false;
        self.selected = match (self.id3v2.is_some(), self.id3v1.is_some()) {
            (true, false) => TagSlot::Header,
            (false, true) => TagSlot::Trailer,
            _ => {
                if prefer_id3v1 && self.id3v1.is_some() {
                    TagSlot::Trailer
                } else {
                    TagSlot::Header
                }
            }
        };
    }

    /// Whether the selection was made explicitly via [`AudioFile::select_version`].
    #[must_use]
    pub fn has_explicit_selection(&self) -> bool {
        self.explicit_selection
    }

    /// Whether any attached tag has unsaved modifications.
    #[must_use]
    pub fn is_dirty(&self) -> bool {
        self.id3v2.as_ref().is_some_and(|tag| tag.is_dirty())
            || self.id3v1.as_ref().is_some_and(|tag| tag.is_dirty())
    }

    /// Attach a fresh, clean tag of the configured preferred version.
    ///
    /// Used when a file has no tags at all, either at load time or after both tags were removed
    /// by a save operation.
    pub(crate) fn init_default_tag(&mut self, config: &Config) {
        let version = config.preferred_version();
        match version.format() {
            TagFormat::Id3v2 => self.id3v2 = Some(ID3v2Tag::new(version)),
            TagFormat::Id3v1 => self.id3v1 = Some(ID3v1Tag::new(version)),
        }
        self.reselect(config.prefer_id3v1());
    }

    /// Detach the tag in the given slot without touching the file on disk.
    pub(crate) fn clear_slot(&mut self, slot: TagSlot) {
        match slot {
            TagSlot::Header => self.id3v2 = None,
            TagSlot::Trailer => self.id3v1 = None,
        }
    }

    /// Reset the dirty flag of the tag in the given slot.
    pub(crate) fn mark_slot_clean(&mut self, slot: TagSlot) {
        if let Some(tag) = self.tag_mut(slot) {
            tag.mark_clean();
        }
    }

    /// Re-read the trailer tag and the stream properties from disk.
    pub(crate) fn reload_id3v1(&mut self) -> crate::Result<()> {
        let mut file = fs::File::open(&self.path)?;
        let mpeg = MpegFile::read_from(&mut file, ParseOptions::new())?;
        self.info = StreamInfo::from_mpeg(&mpeg, file.metadata()?.len());
        self.id3v1 = mpeg.id3v1().cloned().map(ID3v1Tag::from_inner);
        Ok(())
    }

    /// Re-read the header tag from disk.
    pub(crate) fn reload_id3v2(&mut self) -> crate::Result<()> {
        self.id3v2 = ID3v2Tag::read_from_path(&self.path)?;
        Ok(())
    }

    /// Build a file around in-memory tags, without touching the disk.
    #[cfg(test)]
    pub(crate) fn with_tags(
        id3v2: Option<ID3v2Tag>,
        id3v1: Option<ID3v1Tag>,
        prefer_id3v1: bool,
    ) -> Self {
        Self::with_tags_at(PathBuf::from("test.mp3"), id3v2, id3v1, prefer_id3v1)
    }

    /// Build a file around in-memory tags with an explicit path, without touching the disk.
    #[cfg(test)]
    pub(crate) fn with_tags_at(
        path: PathBuf,
        id3v2: Option<ID3v2Tag>,
        id3v1: Option<ID3v1Tag>,
        prefer_id3v1: bool,
    ) -> Self {
        let mut audio_file = AudioFile {
            path,
            info: StreamInfo::default(),
            id3v2,
            id3v1,
            selected: TagSlot::Header,
            explicit_selection: false,
        };
        audio_file.reselect(prefer_id3v1);
        audio_file
    }
}
