use std::path::Path;

use lofty::file::{AudioFile, TaggedFileExt};
use lofty::probe::Probe;
use lofty::tag::{ItemKey, ItemValue};

use crate::error::Result;

/// Case-insensitive name/value tag lookup.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TagSet {
    entries: Vec<(String, String)>,
}

impl TagSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.entries.push((name.into(), value.into()));
    }

    pub fn with(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.insert(name, value);
        self
    }

    /// First non-blank value stored under `name`, ignoring case.
    pub fn get(&self, name: &str) -> Option<&str> {
        self.entries
            .iter()
            .filter(|(key, _)| key.eq_ignore_ascii_case(name))
            .map(|(_, value)| value.trim())
            .find(|value| !value.is_empty())
    }
}

pub trait TagReader {
    fn read_tags(&self, path: &Path) -> Result<TagSet>;
}

pub trait AudioProbe {
    /// Total decoded playback length in milliseconds.
    fn duration_ms(&self, path: &Path) -> Result<u64>;
}

/// [`TagReader`] and [`AudioProbe`] backed by lofty.
#[derive(Debug, Clone, Copy, Default)]
pub struct LoftyReader;

const NAMED_KEYS: [(&str, ItemKey); 4] = [
    ("TRACK", ItemKey::TrackNumber),
    ("ARTIST", ItemKey::TrackArtist),
    ("TITLE", ItemKey::TrackTitle),
    ("ALBUM", ItemKey::AlbumTitle),
];

impl TagReader for LoftyReader {
    fn read_tags(&self, path: &Path) -> Result<TagSet> {
        let tagged = Probe::open(path)?.read()?;
        let mut tags = TagSet::new();

        let Some(tag) = tagged.primary_tag().or_else(|| tagged.first_tag()) else {
            return Ok(tags);
        };

        for (name, key) in &NAMED_KEYS {
            if let Some(value) = tag.get_string(key) {
                tags.insert(*name, value);
            }
        }

        // Frames lofty has no generic key for keep their native names.
        for item in tag.items() {
            if let (ItemKey::Unknown(name), ItemValue::Text(value)) = (item.key(), item.value()) {
                tags.insert(name.as_str(), value.as_str());
            }
        }

        Ok(tags)
    }
}

impl AudioProbe for LoftyReader {
    fn duration_ms(&self, path: &Path) -> Result<u64> {
        let tagged = Probe::open(path)?.read()?;
        let millis = tagged.properties().duration().as_millis();
        Ok(u64::try_from(millis).unwrap_or(u64::MAX))
    }
}
