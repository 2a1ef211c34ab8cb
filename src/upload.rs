use std::path::Path;

use crate::config::Credentials;
use crate::error::Result;
use crate::render::RenderResult;
use crate::sequence::Track;
use crate::youtube::{MUSIC_CATEGORY, PlaylistHandle, VideoHost, VideoMetadata};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UploadState {
    Authenticated,
    PlaylistCreated,
    NoPlaylist,
    Uploading(usize),
    Done,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadOutcome {
    pub track: Track,
    pub video_id: Option<String>,
    pub playlist_attached: bool,
}

pub struct UploadCoordinator<'a> {
    host: &'a mut dyn VideoHost,
    description: String,
    keywords: Option<String>,
    playlist: Option<PlaylistHandle>,
    state: UploadState,
    attempted: usize,
}

impl<'a> UploadCoordinator<'a> {
    pub fn authenticate(
        host: &'a mut dyn VideoHost,
        credentials: &Credentials,
        description: String,
        keywords: Option<String>,
    ) -> Result<Self> {
        host.authenticate(credentials)?;

        Ok(Self {
            host,
            description,
            keywords,
            playlist: None,
            state: UploadState::Authenticated,
            attempted: 0,
        })
    }

    pub fn state(&self) -> UploadState {
        self.state
    }

    /// Create the run's playlist. On failure the run continues without one.
    pub fn create_playlist(&mut self, title: &str) -> Option<&PlaylistHandle> {
        match self.host.create_playlist(title, &self.description) {
            Ok(handle) => {
                println!("Created Playlist \"{title}\"");
                tracing::info!(playlist = %handle.id, "created playlist");
                self.playlist = Some(handle);
                self.state = UploadState::PlaylistCreated;
            }
            Err(err) => {
                println!("Failed to create Playlist \"{title}\"");
                tracing::warn!(error = %err, "continuing without playlist");
                self.state = UploadState::NoPlaylist;
            }
        }
        self.playlist.as_ref()
    }

    pub fn skip_playlist(&mut self) {
        self.state = UploadState::NoPlaylist;
    }

    /// Upload one rendered track and attach it to the playlist, if any.
    ///
    /// Failures are logged and reflected in the outcome; they never stop
    /// the run.
    pub fn upload(&mut self, rendered: &RenderResult) -> UploadOutcome {
        let mut outcome = UploadOutcome {
            track: rendered.track.clone(),
            video_id: None,
            playlist_attached: false,
        };
        if !rendered.succeeded {
            return outcome;
        }

        self.state = UploadState::Uploading(self.attempted);
        self.attempted += 1;

        let metadata = VideoMetadata {
            title: display_title(&rendered.track),
            description: self.description.clone(),
            keywords: self.keywords.clone(),
            category: MUSIC_CATEGORY,
        };

        let video_id = match self.host.create_video_entry(&metadata, &rendered.video_path) {
            Ok(id) => id,
            Err(err) => {
                print!("[Upload failed] ");
                tracing::warn!(title = %metadata.title, error = %err, "upload failed");
                return outcome;
            }
        };
        tracing::info!(title = %metadata.title, video_id = %video_id, "uploaded");

        if let Some(playlist) = &self.playlist {
            match self.host.add_video_to_playlist(playlist, &video_id) {
                Ok(()) => outcome.playlist_attached = true,
                Err(err) => {
                    print!("[Failed to add to playlist] ");
                    tracing::warn!(video_id = %video_id, error = %err, "playlist attach failed");
                }
            }
        }

        outcome.video_id = Some(video_id);
        outcome
    }

    pub fn finish(mut self) -> UploadState {
        self.state = UploadState::Done;
        self.state
    }
}

/// `"<artist> - <album>"` from the first track carrying both tags.
pub fn playlist_title(tracks: &[Track]) -> Option<String> {
    tracks.iter().find_map(|track| match (&track.artist, &track.album) {
        (Some(artist), Some(album)) => Some(format!("{artist} - {album}")),
        _ => None,
    })
}

/// `"<artist> - <title>"` when both tags exist, else the file name without
/// its extension.
pub fn display_title(track: &Track) -> String {
    match (&track.artist, &track.title) {
        (Some(artist), Some(title)) => sanitize_title(format!("{artist} - {title}").as_bytes()),
        _ => file_title(&track.normalized_path),
    }
}

fn file_title(path: &Path) -> String {
    let stem = path.file_stem().unwrap_or(path.as_os_str());
    sanitize_title(stem.as_encoded_bytes())
}

/// Decode `bytes`, dropping invalid UTF-8 sequences and replacement
/// characters left by earlier lossy decoding.
pub fn sanitize_title(bytes: &[u8]) -> String {
    bytes
        .utf8_chunks()
        .flat_map(|chunk| chunk.valid().chars())
        .filter(|&c| c != char::REPLACEMENT_CHARACTER)
        .collect()
}
