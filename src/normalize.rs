use std::ffi::{OsStr, OsString};
use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;

use crate::error::{AppError, Result};
use crate::tools::{self, CONVERTER};

pub const TARGET_EXTENSION: &str = "mp3";

pub trait Converter {
    fn convert(&self, input: &Path, output: &Path) -> Result<()>;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct Sox;

impl Converter for Sox {
    fn convert(&self, input: &Path, output: &Path) -> Result<()> {
        let result = tools::run_captured(CONVERTER, Command::new(CONVERTER).arg(input).arg(output))?;
        tools::ensure_command_success(CONVERTER, &result)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NormalizedFile {
    pub source: PathBuf,
    pub normalized: PathBuf,
}

pub fn is_target_format(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case(TARGET_EXTENSION))
}

/// Normalize every song into `workspace`, in input order.
///
/// Missing inputs and failed conversions are logged and skipped.
pub fn normalize(songs: &[PathBuf], workspace: &Path, converter: &dyn Converter) -> Vec<NormalizedFile> {
    let mut normalized = Vec::with_capacity(songs.len());

    for song in songs {
        if !song.exists() {
            tracing::warn!(path = %song.display(), "skipping missing song file");
            continue;
        }

        match normalize_one(song, workspace, converter) {
            Ok(file) => normalized.push(file),
            Err(err) => {
                println!("(conversion failed: {})", song.display());
                tracing::warn!(path = %song.display(), error = %err, "skipping song");
            }
        }
    }

    normalized
}

/// Copy an mp3 into `workspace` unchanged, or convert anything else to
/// `<stem>.mp3` there.
pub fn normalize_one(song: &Path, workspace: &Path, converter: &dyn Converter) -> Result<NormalizedFile> {
    let source = std::path::absolute(song)?;
    let Some(stem) = source.file_stem() else {
        return Err(AppError::EmptyConversion(source));
    };

    if is_target_format(&source) {
        let extension = source.extension().unwrap_or_default();
        let normalized = free_path(workspace, stem, extension, &source);
        if normalized != source {
            fs::copy(&source, &normalized)?;
        }
        tracing::debug!(source = %source.display(), "copied into workspace");
        return Ok(NormalizedFile { source, normalized });
    }

    let normalized = free_path(workspace, stem, OsStr::new(TARGET_EXTENSION), &source);

    println!("Converting {} ...", source.display());
    converter.convert(&source, &normalized)?;

    let written = fs::metadata(&normalized).map(|m| m.len()).unwrap_or(0);
    if written == 0 {
        return Err(AppError::EmptyConversion(source));
    }

    Ok(NormalizedFile { source, normalized })
}

/// `<stem>.<ext>` in `workspace`, or `<stem>-N.<ext>` when an earlier input
/// already claimed that name. `source` may reuse its own path.
fn free_path(workspace: &Path, stem: &OsStr, extension: &OsStr, source: &Path) -> PathBuf {
    let named = |suffix: Option<usize>| {
        let mut name = OsString::from(stem);
        if let Some(n) = suffix {
            name.push(format!("-{n}"));
        }
        if !extension.is_empty() {
            name.push(".");
            name.push(extension);
        }
        workspace.join(name)
    };

    let mut candidate = named(None);
    let mut n = 1;
    while candidate != source && candidate.exists() {
        n += 1;
        candidate = named(Some(n));
    }
    candidate
}
