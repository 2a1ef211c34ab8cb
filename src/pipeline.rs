use std::io::{self, Write};
use std::path::PathBuf;
use std::time::{SystemTime, UNIX_EPOCH};

use crate::config::RunConfig;
use crate::error::Result;
use crate::metadata::{AudioProbe, TagReader};
use crate::normalize::{Converter, normalize};
use crate::prompt::Prompter;
use crate::recipe::Recipe;
use crate::render::{Renderer, render_track};
use crate::sequence::{Track, sequence};
use crate::upload::{UploadCoordinator, UploadOutcome, playlist_title};
use crate::youtube::VideoHost;

pub struct Collaborators<'a> {
    pub converter: &'a dyn Converter,
    pub tags: &'a dyn TagReader,
    pub probe: &'a dyn AudioProbe,
    pub renderer: &'a dyn Renderer,
    pub host: &'a mut dyn VideoHost,
    pub prompter: &'a mut dyn Prompter,
}

#[derive(Debug, Clone)]
pub struct RunSummary {
    pub workspace: PathBuf,
    pub tracks: usize,
    pub rendered: usize,
    pub outcomes: Vec<UploadOutcome>,
}

impl RunSummary {
    pub fn uploaded(&self) -> usize {
        self.outcomes.iter().filter(|o| o.video_id.is_some()).count()
    }

    pub fn attached(&self) -> usize {
        self.outcomes.iter().filter(|o| o.playlist_attached).count()
    }
}

/// Create the run's scratch workspace under the system temp directory.
///
/// The directory is kept after the run for inspection.
pub fn create_workspace() -> Result<PathBuf> {
    let started = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|elapsed| elapsed.as_secs())
        .unwrap_or_default();

    let dir = tempfile::Builder::new()
        .prefix(&format!("youtubegen-{started}-"))
        .tempdir()?;
    Ok(dir.keep())
}

/// Authenticate, normalize, sequence, then render and upload each track in
/// turn.
///
/// The workspace is only created once authentication succeeded. Per-track
/// failures are reported and recorded in the summary.
pub fn run(
    config: &RunConfig,
    new_workspace: impl FnOnce() -> Result<PathBuf>,
    collaborators: Collaborators<'_>,
) -> Result<RunSummary> {
    let Collaborators {
        converter,
        tags,
        probe,
        renderer,
        host,
        prompter,
    } = collaborators;

    let mut uploader = UploadCoordinator::authenticate(
        host,
        &config.credentials,
        config.description.clone(),
        config.keywords.clone(),
    )?;
    let workspace_dir = new_workspace()?;
    let workspace = workspace_dir.as_path();

    let tracks: Vec<Track> = normalize(&config.songs, workspace, converter)
        .into_iter()
        .map(|file| Track::read(tags, file.source, file.normalized))
        .collect();
    let sequenced = sequence(tracks);

    if config.playlist {
        let title = match playlist_title(&sequenced).or_else(|| config.playlist_title.clone()) {
            Some(title) => title,
            None => prompter.line("Playlist Title")?,
        };
        uploader.create_playlist(&title);
    } else {
        uploader.skip_playlist();
    }

    let ordered = config.order.apply(sequenced);
    let total = ordered.len();
    let mut rendered_count = 0;
    let mut outcomes = Vec::with_capacity(total);

    for (index, track) in ordered.iter().enumerate() {
        let number = index + 1;
        print!("[{number}/{total}] Generating... ");
        io::stdout().flush()?;

        let skipped = UploadOutcome {
            track: track.clone(),
            video_id: None,
            playlist_attached: false,
        };

        let duration_ms = match probe.duration_ms(&track.normalized_path) {
            Ok(ms) => ms,
            Err(err) => {
                println!("(failed)");
                tracing::warn!(path = %track.normalized_path.display(), error = %err, "could not decode audio length");
                outcomes.push(skipped);
                continue;
            }
        };

        let recipe_path = workspace.join(format!("{number}.txt"));
        if let Err(err) = Recipe::for_track(&track.normalized_path, &config.cover, duration_ms).write_to(&recipe_path) {
            println!("(failed)");
            tracing::warn!(path = %recipe_path.display(), error = %err, "could not write recipe");
            outcomes.push(skipped);
            continue;
        }

        let rendered = render_track(renderer, track, &recipe_path, config.quality, workspace);
        if !rendered.succeeded {
            println!("(failed)");
            println!("{}", rendered.diagnostics.trim_end());
            outcomes.push(skipped);
            continue;
        }
        rendered_count += 1;

        print!("Uploading... ");
        io::stdout().flush()?;
        outcomes.push(uploader.upload(&rendered));
        println!();
    }

    uploader.finish();

    Ok(RunSummary {
        workspace: workspace_dir,
        tracks: total,
        rendered: rendered_count,
        outcomes,
    })
}
