// Copyright (c) 2026 The retag authors
//
// This Source Code Form is subject to the terms of the Mozilla Public License, v. 2.0. If a copy
// of the MPL was not distributed with this file, You can obtain one at
// http://mozilla.org/MPL/2.0/.
//
// SPDX-License-Identifier: MPL-2.0

//! A collection of loaded audio files and batch operations on them.

use crate::audiofile::{AudioFile, TagSlot};
use crate::config::Config;
use crate::save::{self, SaveOptions};
use crate::tag::TagField;
use crate::util::walk_dir;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// The outcome of saving a whole collection.
#[derive(Debug, Default)]
pub struct SaveReport {
    /// Number of files that were saved successfully.
    pub saved: usize,
    /// Files that could not be saved, with the error that occurred.
    pub failures: Vec<(PathBuf, crate::ErrorType)>,
}

impl SaveReport {
    /// Whether every file was saved successfully.
    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.failures.is_empty()
    }
}

/// An ordered collection of audio files.
///
/// Files keep the order in which they were added. Directory arguments are walked recursively,
/// unreadable files inside a directory are skipped with a warning while explicitly named files
/// fail the load.
#[derive(Debug, Default)]
pub struct AudioFileCollection {
    /// The loaded files.
    files: Vec<AudioFile>,
}

impl AudioFileCollection {
    /// Create an empty collection.
    #[must_use]
    pub fn new() -> Self {
        AudioFileCollection::default()
    }

    /// Load the given paths into a collection.
    ///
    /// # Errors
    ///
    /// Returns an error if an explicitly named file cannot be loaded or if a path would be added
    /// twice.
    pub fn load_paths(paths: &[PathBuf], config: &Config) -> crate::Result<Self> {
        let mut collection = AudioFileCollection::new();
        for path in paths {
            if path.is_dir() {
                collection.load_dir(path, config)?;
            } else {
                collection.append(AudioFile::read_from_path(path, config)?)?;
            }
        }
        Ok(collection)
    }

    /// Walk a directory recursively and add every loadable MP3 file.
    fn load_dir(&mut self, path: &Path, config: &Config) -> crate::Result<()> {
        for entry in walk_dir(path.to_path_buf()) {
            let (_dir, _subdirs, files) = entry?;
            for file_path in files {
                let is_mp3 = file_path
                    .extension()
                    .map(std::ffi::OsStr::to_ascii_lowercase)
                    .is_some_and(|extension| extension == "mp3");
                if !is_mp3 {
                    continue;
                }
                match AudioFile::read_from_path(&file_path, config) {
                    Ok(file) => self.append(file)?,
                    Err(err) => {
                        log::warn!("Skipping {}: {}", file_path.display(), err);
                    }
                }
            }
        }
        Ok(())
    }

    /// Add a file to the collection.
    ///
    /// # Errors
    ///
    /// Returns [`ErrorType::DuplicateFile`](crate::ErrorType::DuplicateFile) if a file with the
    /// same path is already present.
    pub fn append(&mut self, file: AudioFile) -> crate::Result<()> {
        if self.files.iter().any(|other| other.path() == file.path()) {
            return Err(crate::ErrorType::DuplicateFile(file.path().to_path_buf()));
        }
        self.files.push(file);
        Ok(())
    }

    /// Number of files in the collection.
    #[must_use]
    pub fn len(&self) -> usize {
        self.files.len()
    }

    /// Whether the collection contains no files.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }

    /// Iterate over the files in the collection.
    #[must_use]
    pub fn iter(&self) -> std::slice::Iter<'_, AudioFile> {
        self.files.iter()
    }

    /// Iterate mutably over the files in the collection.
    pub fn iter_mut(&mut self) -> std::slice::IterMut<'_, AudioFile> {
        self.files.iter_mut()
    }

    /// Iterate over the files with unsaved modifications.
    #[must_use]
    pub fn dirty_files(&self) -> impl Iterator<Item = &AudioFile> + '_ {
        self.files.iter().filter(|file| file.is_dirty())
    }

    /// Total size of all files in bytes.
    #[must_use]
    pub fn total_size(&self) -> u64 {
        self.files.iter().map(|file| file.info().size_bytes).sum()
    }

    /// Total play time of all files.
    #[must_use]
    pub fn total_duration(&self) -> Duration {
        self.files.iter().map(|file| file.info().duration).sum()
    }

    /// Set a field to the same value on every attached tag of every file.
    ///
    /// Tags that do not support the field are skipped. Returns the number of tags that actually
    /// changed.
    pub fn copy_field_to_all(&mut self, field: TagField, value: &str) -> usize {
        let mut changed = 0;
        for file in &mut self.files {
            for tag in file.tags_mut() {
                if !tag.supports(field) {
                    log::debug!("Skipping a {} tag, {field} not supported", tag.version());
                    continue;
                }
                match tag.set(field, value) {
                    Ok(result) if result.is_changed() => changed += 1,
                    Ok(_) => {}
                    Err(err) => log::warn!("Could not set {field}: {err}"),
                }
            }
        }
        changed
    }

    /// Number the tracks sequentially in collection order, starting at 1.
    ///
    /// The number is stored in every attached tag that can hold it. Returns the number of tags
    /// that actually changed.
    pub fn renumber_tracks(&mut self) -> usize {
        let mut changed = 0;
        for (index, file) in self.files.iter_mut().enumerate() {
            let number = (index + 1).to_string();
            for tag in file.tags_mut() {
                if !tag.supports(TagField::TrackNumber) {
                    continue;
                }
                if tag
                    .set(TagField::TrackNumber, &number)
                    .is_ok_and(|result| result.is_changed())
                {
                    changed += 1;
                }
            }
        }
        changed
    }

    /// Set the track total of every header tag to the collection size.
    ///
    /// The trailer format has no track total, so only header tags are touched. Returns the
    /// number of tags that actually changed.
    pub fn assign_track_totals(&mut self) -> usize {
        let total = self.files.len().to_string();
        let mut changed = 0;
        for file in &mut self.files {
            let Some(tag) = file.tag_mut(TagSlot::Header) else {
                continue;
            };
            if tag
                .set(TagField::TrackTotal, &total)
                .is_ok_and(|result| result.is_changed())
            {
                changed += 1;
            }
        }
        changed
    }

    /// Save every file, resolving the save targets per file.
    ///
    /// A failed file is reported and does not stop the remaining files from being saved.
    pub fn save_all_with(
        &mut self,
        config: &Config,
        resolve: impl Fn(&AudioFile) -> SaveOptions,
    ) -> SaveReport {
        let mut report = SaveReport::default();
        for file in &mut self.files {
            let options = resolve(file);
            match save::save(file, &options, config) {
                Ok(()) => report.saved += 1,
                Err(err) => {
                    log::error!("{err}");
                    report.failures.push((file.path().to_path_buf(), err));
                }
            }
        }
        report
    }

    /// Save every file with the same options.
    pub fn save_all(&mut self, options: &SaveOptions, config: &Config) -> SaveReport {
        self.save_all_with(config, |_file| *options)
    }
}

impl<'a> IntoIterator for &'a AudioFileCollection {
    type Item = &'a AudioFile;
    type IntoIter = std::slice::Iter<'a, AudioFile>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

impl<'a> IntoIterator for &'a mut AudioFileCollection {
    type Item = &'a mut AudioFile;
    type IntoIter = std::slice::IterMut<'a, AudioFile>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter_mut()
    }
}
