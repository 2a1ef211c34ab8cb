use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

use crate::error::Result;

/// Length of the leading entry that binds the track's own audio file.
pub const LEAD_IN_SECONDS: u64 = 1;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecipeEntry {
    pub path: PathBuf,
    pub seconds: u64,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Recipe {
    pub entries: Vec<RecipeEntry>,
}

impl Recipe {
    /// Recipe showing `cover` for the whole track.
    ///
    /// The renderer needs a non-empty entry before the image, so the audio
    /// file itself leads for one second. The image duration is the decoded
    /// length floored to whole seconds.
    pub fn for_track(audio: &Path, cover: &Path, duration_ms: u64) -> Self {
        Self {
            entries: vec![
                RecipeEntry {
                    path: audio.to_path_buf(),
                    seconds: LEAD_IN_SECONDS,
                },
                RecipeEntry {
                    path: cover.to_path_buf(),
                    seconds: whole_seconds(duration_ms),
                },
            ],
        }
    }

    pub fn write_to(&self, path: &Path) -> Result<()> {
        fs::write(path, self.to_string())?;
        Ok(())
    }
}

impl fmt::Display for Recipe {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for entry in &self.entries {
            writeln!(f, "{}:{}", entry.path.display(), entry.seconds)?;
        }
        Ok(())
    }
}

pub fn whole_seconds(duration_ms: u64) -> u64 {
    duration_ms / 1000
}
