use std::path::{Path, PathBuf};
use std::process::Command;

use crate::error::Result;
use crate::sequence::Track;
use crate::tools::{self, RENDERER};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Quality {
    Low,
    /// mp2 audio in a vob container. mp2 instead of the default AC3 avoids
    /// an encoder crash in some ffmpeg builds.
    Standard,
}

impl Quality {
    pub fn flag(self) -> &'static str {
        match self {
            Quality::Low => "-flv",
            Quality::Standard => "-mp2",
        }
    }

    pub fn extension(self) -> &'static str {
        match self {
            Quality::Low => "flv",
            Quality::Standard => "vob",
        }
    }
}

/// Video file the renderer is expected to leave next to `recipe`.
pub fn expected_output(recipe: &Path, quality: Quality) -> PathBuf {
    recipe.with_extension(quality.extension())
}

pub trait Renderer {
    /// Render `recipe` inside `workdir` and return the renderer's captured
    /// output for diagnostics.
    fn render(&self, recipe: &Path, quality: Quality, workdir: &Path) -> Result<String>;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct DvdSlideshow;

impl Renderer for DvdSlideshow {
    fn render(&self, recipe: &Path, quality: Quality, workdir: &Path) -> Result<String> {
        let output = tools::run_captured(
            RENDERER,
            Command::new(RENDERER)
                .arg(quality.flag())
                .arg(recipe)
                .current_dir(workdir),
        )?;
        tracing::debug!(status = ?output.status.code(), "renderer exited");
        Ok(tools::combined_output(&output))
    }
}

#[derive(Debug, Clone)]
pub struct RenderResult {
    pub track: Track,
    pub video_path: PathBuf,
    pub succeeded: bool,
    pub diagnostics: String,
}

pub fn render_track(
    renderer: &dyn Renderer,
    track: &Track,
    recipe: &Path,
    quality: Quality,
    workdir: &Path,
) -> RenderResult {
    let video_path = expected_output(recipe, quality);

    let diagnostics = match renderer.render(recipe, quality, workdir) {
        Ok(output) => output,
        Err(err) => err.to_string(),
    };

    RenderResult {
        track: track.clone(),
        succeeded: video_path.is_file(),
        video_path,
        diagnostics,
    }
}
