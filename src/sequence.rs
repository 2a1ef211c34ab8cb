use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::metadata::{TagReader, TagSet};

/// Sort key for tracks without a usable track number. Sorts before every
/// valid number.
pub const UNSEQUENCED: i64 = -1;

pub const TRACK_NUMBER_KEYS: [&str; 2] = ["Track", "TRACKNUMBER"];

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Track {
    pub source_path: PathBuf,
    pub normalized_path: PathBuf,
    pub track_number: Option<u32>,
    pub artist: Option<String>,
    pub title: Option<String>,
    pub album: Option<String>,
}

impl Track {
    pub fn from_tags(source_path: PathBuf, normalized_path: PathBuf, tags: &TagSet) -> Self {
        let owned = |name: &str| tags.get(name).map(str::to_string);

        Self {
            track_number: track_number(tags),
            artist: owned("ARTIST"),
            title: owned("TITLE"),
            album: owned("ALBUM"),
            source_path,
            normalized_path,
        }
    }

    /// Read tags from the normalized file. Unreadable tags leave every tag
    /// field empty.
    pub fn read(reader: &dyn TagReader, source_path: PathBuf, normalized_path: PathBuf) -> Self {
        let tags = reader.read_tags(&normalized_path).unwrap_or_else(|err| {
            tracing::warn!(path = %normalized_path.display(), error = %err, "could not read tags");
            TagSet::new()
        });
        Self::from_tags(source_path, normalized_path, &tags)
    }

    pub fn sort_key(&self) -> i64 {
        self.track_number.map_or(UNSEQUENCED, i64::from)
    }

    pub fn file_name(&self) -> &Path {
        self.normalized_path
            .file_name()
            .map(Path::new)
            .unwrap_or(&self.normalized_path)
    }
}

pub fn track_number(tags: &TagSet) -> Option<u32> {
    TRACK_NUMBER_KEYS
        .iter()
        .find_map(|key| tags.get(key).and_then(parse_track_number))
}

/// Parse `"7"`, `"07"` or `"7/12"` into `7`.
pub fn parse_track_number(raw: &str) -> Option<u32> {
    let number = raw.split_once('/').map_or(raw, |(number, _)| number);
    number.trim().parse().ok()
}

pub fn sequence(mut tracks: Vec<Track>) -> Vec<Track> {
    tracks.sort_by_key(Track::sort_key);
    tracks
}

/// Order in which sequenced tracks are rendered and uploaded.
///
/// Without a playlist the destination feed lists the newest upload first, so
/// uploading in reverse makes the feed read in album order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UploadOrder {
    Sequenced,
    Reversed,
}

impl UploadOrder {
    pub fn default_for(playlist: bool) -> Self {
        if playlist {
            UploadOrder::Sequenced
        } else {
            UploadOrder::Reversed
        }
    }

    pub fn apply(self, mut tracks: Vec<Track>) -> Vec<Track> {
        if self == UploadOrder::Reversed {
            tracks.reverse();
        }
        tracks
    }
}
