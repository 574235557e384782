// Copyright (c) 2026 The retag authors
//
// This Source Code Form is subject to the terms of the Mozilla Public License, v. 2.0. If a copy
// of the MPL was not distributed with this file, You can obtain one at
// http://mozilla.org/MPL/2.0/.
//
// SPDX-License-Identifier: MPL-2.0

//! Configuration utils.

use crate::tag::{TagVersion, TextEncoding};
use serde::{Deserialize, Serialize};
use std::path::Path;
use thiserror::Error;

/// Encountered when the configuration cannot be loaded.
#[derive(Error, Debug)]
#[error("Configuration Error: {0}")]
pub struct ConfigError(#[from] toml::de::Error);

/// Default configuration TOML string.
const DEFAULT_CONFIG: &str = include_str!("default_config.toml");

/// Represents a piece of configuration that can be merged with another one.
trait MergeableConfig {
    /// Merge this configuration object with another one, taking values not set in this object from
    /// the other one (if present).
    fn merge(&self, other: &Self) -> Self;
}

/// Editing and tag selection preferences.
#[expect(missing_copy_implementations)]
#[derive(Debug, Default, Clone, Deserialize, Serialize)]
pub struct EditorConfig {
    /// Version of the tag that is created when a file has no tags at all.
    pub preferred_version: Option<TagVersion>,
    /// Select the ID3v1 tag by default when a file carries both tags.
    pub prefer_id3v1: Option<bool>,
}

impl MergeableConfig for EditorConfig {
    fn merge(&self, other: &Self) -> Self {
        EditorConfig {
            preferred_version: self.preferred_version.or(other.preferred_version),
            prefer_id3v1: self.prefer_id3v1.or(other.prefer_id3v1),
        }
    }
}

/// Default save targets, used when the command line does not specify them.
#[expect(missing_copy_implementations)]
#[derive(Debug, Default, Clone, Deserialize, Serialize)]
pub struct SaveConfig {
    /// Default ID3v2 target version.
    pub id3v2_version: Option<TagVersion>,
    /// Default ID3v1 target version.
    pub id3v1_version: Option<TagVersion>,
    /// Default text encoding override for ID3v2 writes.
    pub encoding: Option<TextEncoding>,
}

impl MergeableConfig for SaveConfig {
    fn merge(&self, other: &Self) -> Self {
        SaveConfig {
            id3v2_version: self.id3v2_version.or(other.id3v2_version),
            id3v1_version: self.id3v1_version.or(other.id3v1_version),
            encoding: self.encoding.or(other.encoding),
        }
    }
}

/// The main configuration struct.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Config {
    /// Editing and tag selection preferences.
    #[serde(default)]
    pub editor: EditorConfig,
    /// Default save targets.
    #[serde(default)]
    pub save: SaveConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self::load_default().expect("Failed to load default config")
    }
}

impl MergeableConfig for Config {
    /// Merge this configuration object with another one, taking values not set in this object from
    /// the other one (if present).
    fn merge(&self, other: &Self) -> Self {
        Config {
            editor: self.editor.merge(&other.editor),
            save: self.save.merge(&other.save),
        }
    }
}

impl Config {
    /// Load the configuration from a string slice.
    fn load_from_str(text: &str) -> Result<Self, ConfigError> {
        let config = toml::from_str(text)?;
        Ok(config)
    }

    /// Load the default configuration.
    fn load_default() -> Result<Self, ConfigError> {
        Self::load_from_str(DEFAULT_CONFIG)
    }

    /// Load the configuration from a file located at the given path.
    ///
    /// # Errors
    ///
    /// This method can fail if the file cannot be accessed or if it contains malformed
    /// configuration markup.
    pub fn load_from_path<T: AsRef<Path>>(path: T) -> crate::Result<Self> {
        let text = std::fs::read_to_string(path)?;
        let config = Self::load_from_str(&text)?;
        Ok(config)
    }

    /// Merge this configuration struct with the default values.
    #[must_use]
    pub fn with_defaults(&self) -> Self {
        let default = Self::default();
        self.merge(&default)
    }

    /// Version used when a fresh tag has to be created.
    #[must_use]
    pub fn preferred_version(&self) -> TagVersion {
        self.editor.preferred_version.unwrap_or(TagVersion::Id3v24)
    }

    /// Whether the ID3v1 tag is selected by default when both tags are present.
    #[must_use]
    pub fn prefer_id3v1(&self) -> bool {
        self.editor.prefer_id3v1.unwrap_or(false)
    }
}
