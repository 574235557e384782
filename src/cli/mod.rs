// Copyright (c) 2026 The retag authors
//
// This Source Code Form is subject to the terms of the Mozilla Public License, v. 2.0. If a copy
// of the MPL was not distributed with this file, You can obtain one at
// http://mozilla.org/MPL/2.0/.
//
// SPDX-License-Identifier: MPL-2.0

//! Command line interface.

use crate::audiofile::{AudioFile, TagSlot};
use crate::collection::AudioFileCollection;
use crate::save::SaveOptions;
use crate::tag::{Tag, TagField, TagVersion, TextEncoding};
use crate::util::{format_size, FormattedDuration};
use crate::Config;
use clap::Parser;
use env_logger::{Builder, WriteStyle};
use log::LevelFilter;
use std::path::PathBuf;
use std::str::FromStr;

/// A save target for one tag slot, as given on the command line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum VersionTarget {
    /// Write a tag with this version.
    Version(TagVersion),
    /// Remove the tag from this slot.
    Remove,
}

/// Parse a save target, accepting `none` for removal.
fn parse_version_target(value: &str) -> Result<VersionTarget, String> {
    if value.eq_ignore_ascii_case("none") {
        return Ok(VersionTarget::Remove);
    }
    TagVersion::from_str(value)
        .map(VersionTarget::Version)
        .map_err(|err| err.to_string())
}

/// Parse a `FIELD=VALUE` assignment.
fn parse_assignment(value: &str) -> Result<(TagField, String), String> {
    let (field, field_value) = value
        .split_once('=')
        .ok_or_else(|| String::from("expected FIELD=VALUE"))?;
    let field = TagField::from_str(field.trim()).map_err(|err| err.to_string())?;
    Ok((field, field_value.to_string()))
}

/// Parse a tag version.
fn parse_version(value: &str) -> Result<TagVersion, String> {
    TagVersion::from_str(value).map_err(|err| err.to_string())
}

/// A text encoding override, as given on the command line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum EncodingTarget {
    /// Use this encoding.
    Encoding(TextEncoding),
    /// Use no override, even if the configuration sets one.
    Unset,
}

/// Parse a text encoding, accepting `none` to suppress a configured override.
fn parse_encoding_target(value: &str) -> Result<EncodingTarget, String> {
    if value.eq_ignore_ascii_case("none") {
        return Ok(EncodingTarget::Unset);
    }
    TextEncoding::from_str(value)
        .map(EncodingTarget::Encoding)
        .map_err(|err| err.to_string())
}

/// Command line Arguments.
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Files or directories to load.
    #[arg(required = true)]
    paths: Vec<PathBuf>,
    /// Show debug information.
    #[arg(short, long)]
    verbose: bool,
    /// Path to configuration file.
    #[arg(short, long, required = false)]
    config_path: Option<PathBuf>,
    /// Set a field on every tag of every file (e.g. `--set artist=Rush`).
    #[arg(long, value_name = "FIELD=VALUE", value_parser = parse_assignment)]
    set: Vec<(TagField, String)>,
    /// Number the tracks sequentially in load order.
    #[arg(long)]
    renumber_tracks: bool,
    /// Set the track total of every file to the number of loaded files.
    #[arg(long)]
    assign_track_totals: bool,
    /// Select the attached tag with this version instead of the default.
    #[arg(long, value_name = "VERSION", value_parser = parse_version)]
    select_version: Option<TagVersion>,
    /// ID3v2 save target (a version, or `none` to remove the tag).
    #[arg(long, value_name = "VERSION", value_parser = parse_version_target)]
    id3v2_version: Option<VersionTarget>,
    /// ID3v1 save target (a version, or `none` to remove the tag).
    #[arg(long, value_name = "VERSION", value_parser = parse_version_target)]
    id3v1_version: Option<VersionTarget>,
    /// Text encoding override for ID3v2 writes (an encoding, or `none` for no override).
    #[arg(long, value_name = "ENCODING", value_parser = parse_encoding_target)]
    encoding: Option<EncodingTarget>,
    /// Prefer the ID3v1 tag when both tags are present.
    #[arg(long)]
    prefer_id3v1: bool,
    /// Write the tags back to disk.
    #[arg(short, long)]
    save: bool,
}

impl Args {
    /// Get the desired log level, depending on the verbose flag passed on the command line.
    fn log_level_filter(&self) -> LevelFilter {
        if self.verbose {
            LevelFilter::Debug
        } else {
            LevelFilter::Info
        }
    }

    /// Get the current configuration, with command line overrides applied.
    fn config(&self) -> crate::Result<Config> {
        let mut config = match &self.config_path {
            Some(path) => Config::load_from_path(path).map(|config| config.with_defaults())?,
            None => Config::default(),
        };
        if self.prefer_id3v1 {
            config.editor.prefer_id3v1 = Some(true);
        }
        Ok(config)
    }

    /// Resolve the save targets for a single file.
    ///
    /// A slot without a command line target falls back to the configured default, and failing
    /// that, keeps the version of the tag currently attached to that slot.
    fn save_options(&self, file: &AudioFile, config: &Config) -> SaveOptions {
        let resolve = |target: Option<VersionTarget>,
                       configured: Option<TagVersion>,
                       current: Option<TagVersion>| {
            match target {
                Some(VersionTarget::Version(version)) => Some(version),
                Some(VersionTarget::Remove) => None,
                None => configured.or(current),
            }
        };
        SaveOptions {
            id3v2_version: resolve(
                self.id3v2_version,
                config.save.id3v2_version,
                file.id3v2().map(|tag| tag.version()),
            ),
            id3v1_version: resolve(
                self.id3v1_version,
                config.save.id3v1_version,
                file.id3v1().map(|tag| tag.version()),
            ),
            encoding: match self.encoding {
                Some(EncodingTarget::Encoding(encoding)) => Some(encoding),
                Some(EncodingTarget::Unset) => None,
                None => config.save.encoding,
            },
        }
    }
}

/// Print a file with its stream properties and the fields of its attached tags.
fn print_file(file: &AudioFile) {
    let info = file.info();
    println!("{}", file.path().display());
    println!(
        "  {} {}, {} kbps, {} Hz, {} channel(s), {}, {}",
        info.mpeg_version,
        info.layer,
        info.bitrate,
        info.sample_rate,
        info.channels,
        info.duration.formatted_duration(),
        format_size(info.size_bytes),
    );

    for slot in [TagSlot::Header, TagSlot::Trailer] {
        let Some(tag) = file.tag(slot) else {
            continue;
        };
        let marker = if slot == file.selected_slot() { "*" } else { " " };
        let dirty = if tag.is_dirty() { " (modified)" } else { "" };
        println!("  {marker} {}{}", tag.version(), dirty);
        for field in TagField::all() {
            if let Some(value) = tag.get(field) {
                println!("      {field}: {value}");
            }
        }
    }
}

/// Run the editor on the given arguments.
fn run(args: &Args, config: &Config) -> crate::Result<()> {
    let mut collection = AudioFileCollection::load_paths(&args.paths, config)?;
    if collection.is_empty() {
        log::warn!("No audio files found");
        return Ok(());
    }

    if let Some(version) = args.select_version {
        for file in collection.iter_mut() {
            if let Err(err) = file.select_version(version) {
                log::warn!("{}: {}", file.path().display(), err);
            }
        }
    }

    for (field, value) in &args.set {
        let changed = collection.copy_field_to_all(*field, value);
        log::info!("Set {field} on {changed} tag(s)");
    }
    if args.renumber_tracks {
        let changed = collection.renumber_tracks();
        log::info!("Renumbered {changed} track(s)");
    }
    if args.assign_track_totals {
        let changed = collection.assign_track_totals();
        log::info!("Assigned track total to {changed} file(s)");
    }

    if args.save {
        let report = collection.save_all_with(config, |file| args.save_options(file, config));
        log::info!("Saved {} file(s)", report.saved);
        if let Some((_path, err)) = report.failures.into_iter().next() {
            return Err(err);
        }
    } else {
        for file in collection.iter() {
            print_file(file);
        }
        println!(
            "{} file(s), {}, {}",
            collection.len(),
            collection.total_duration().formatted_duration(),
            format_size(collection.total_size()),
        );
        let dirty = collection.dirty_files().count();
        if dirty > 0 {
            log::info!("{dirty} file(s) have unsaved changes, pass --save to write them");
        }
    }

    Ok(())
}

/// Main entry point.
///
/// # Errors
///
/// Returns an error if the command line arguments are incorrect or if loading, editing or saving
/// the files fails.
pub fn main() -> crate::Result<()> {
    let args = Args::parse();
    let config = args.config()?;

    Builder::new()
        .filter(None, args.log_level_filter())
        .write_style(WriteStyle::Auto)
        .init();

    run(&args, &config)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_version_target() {
        assert_eq!(
            parse_version_target("2.4"),
            Ok(VersionTarget::Version(TagVersion::Id3v24))
        );
        assert_eq!(parse_version_target("none"), Ok(VersionTarget::Remove));
        assert_eq!(parse_version_target("NONE"), Ok(VersionTarget::Remove));
        assert!(parse_version_target("3.0").is_err());
    }

    #[test]
    fn test_parse_encoding_target() {
        assert_eq!(
            parse_encoding_target("utf8"),
            Ok(EncodingTarget::Encoding(TextEncoding::Utf8))
        );
        assert_eq!(parse_encoding_target("none"), Ok(EncodingTarget::Unset));
        assert!(parse_encoding_target("ebcdic").is_err());
    }

    #[test]
    fn test_parse_assignment() {
        assert_eq!(
            parse_assignment("artist=Rush"),
            Ok((TagField::Artist, String::from("Rush")))
        );
        assert_eq!(
            parse_assignment("title=A=B"),
            Ok((TagField::Title, String::from("A=B")))
        );
        assert!(parse_assignment("artist").is_err());
        assert!(parse_assignment("bogus=1").is_err());
    }

    #[test]
    fn test_save_options_fall_back_to_current_versions() {
        let args = Args::parse_from(["retag", "song.mp3"]);
        let config = Config::default();
        let file = AudioFile::with_tags(
            Some(crate::tag::ID3v2Tag::new(TagVersion::Id3v23)),
            Some(crate::tag::ID3v1Tag::new(TagVersion::Id3v10)),
            false,
        );
        let options = args.save_options(&file, &config);
        assert_eq!(options.id3v2_version, Some(TagVersion::Id3v23));
        assert_eq!(options.id3v1_version, Some(TagVersion::Id3v10));
        assert_eq!(options.encoding, None);
    }

    #[test]
    fn test_save_options_explicit_targets_win() {
        let args = Args::parse_from([
            "retag",
            "--id3v2-version",
            "2.4",
            "--id3v1-version",
            "none",
            "--encoding",
            "utf8",
            "song.mp3",
        ]);
        let config = Config::default();
        let file = AudioFile::with_tags(
            Some(crate::tag::ID3v2Tag::new(TagVersion::Id3v23)),
            Some(crate::tag::ID3v1Tag::new(TagVersion::Id3v11)),
            false,
        );
        let options = args.save_options(&file, &config);
        assert_eq!(options.id3v2_version, Some(TagVersion::Id3v24));
        assert_eq!(options.id3v1_version, None);
        assert_eq!(options.encoding, Some(TextEncoding::Utf8));
    }

    #[test]
    fn test_save_options_absent_slot_stays_absent() {
        let args = Args::parse_from(["retag", "song.mp3"]);
        let config = Config::default();
        let file = AudioFile::with_tags(
            Some(crate::tag::ID3v2Tag::new(TagVersion::Id3v24)),
            None,
            false,
        );
        let options = args.save_options(&file, &config);
        assert_eq!(options.id3v2_version, Some(TagVersion::Id3v24));
        assert_eq!(options.id3v1_version, None);
    }
}
