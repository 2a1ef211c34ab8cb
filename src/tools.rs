use std::fs;
use std::path::{Path, PathBuf};
use std::process::{Command, Output};

use crate::error::{AppError, Result};

pub const CONVERTER: &str = "sox";

pub const RENDERER: &str = "dvd-slideshow";

const COVER_EXTENSIONS: [&str; 4] = ["jpg", "jpeg", "png", "gif"];

/// Fail with [`AppError::MissingTool`] for the first external program not on PATH.
pub fn require_tools() -> Result<()> {
    for program in [CONVERTER, RENDERER] {
        let path = which::which(program).map_err(|_| AppError::MissingTool(program))?;
        tracing::debug!(program, path = %path.display(), "found external tool");
    }
    Ok(())
}

pub fn tools_available() -> bool {
    require_tools().is_ok()
}

/// Check the cover image and return its absolute path.
///
/// The file must exist, carry an image extension and have a readable image
/// header.
pub fn validate_cover(path: &Path) -> Result<PathBuf> {
    let invalid = || AppError::InvalidCover(path.to_path_buf());

    let has_image_extension = path
        .extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| COVER_EXTENSIONS.iter().any(|e| ext.eq_ignore_ascii_case(e)))
        .unwrap_or(false);
    if !has_image_extension || !path.is_file() {
        return Err(invalid());
    }

    let (width, height) = image::image_dimensions(path).map_err(|_| invalid())?;
    tracing::debug!(path = %path.display(), width, height, "cover image accepted");

    Ok(fs::canonicalize(path)?)
}

pub(crate) fn run_captured(program: &str, command: &mut Command) -> Result<Output> {
    command.output().map_err(|source| AppError::CommandSpawn {
        program: program.to_string(),
        source,
    })
}

pub(crate) fn ensure_command_success(program: &str, output: &Output) -> Result<()> {
    if output.status.success() {
        return Ok(());
    }

    Err(AppError::CommandFailed {
        program: program.to_string(),
        code: output.status.code(),
        output: combined_output(output).trim().to_string(),
    })
}

pub(crate) fn combined_output(output: &Output) -> String {
    let mut text = String::from_utf8_lossy(&output.stdout).into_owned();
    let stderr = String::from_utf8_lossy(&output.stderr);
    if !stderr.is_empty() {
        if !text.is_empty() && !text.ends_with('\n') {
            text.push('\n');
        }
        text.push_str(&stderr);
    }
    text
}
