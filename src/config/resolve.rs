use std::fmt;
use std::path::PathBuf;

use super::schema::FileSettings;
use crate::cli::{Cli, OrderArg};
use crate::error::Result;
use crate::prompt::Prompter;
use crate::render::Quality;
use crate::sequence::UploadOrder;

#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    pub email: String,
    pub password: String,
    pub developer_key: String,
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("email", &self.email)
            .field("password", &"<redacted>")
            .field("developer_key", &"<redacted>")
            .finish()
    }
}

/// Fully resolved options for one run.
#[derive(Debug, Clone)]
pub struct RunConfig {
    pub cover: PathBuf,
    pub songs: Vec<PathBuf>,
    pub credentials: Credentials,
    /// Shared by every uploaded video and the playlist.
    pub description: String,
    pub keywords: Option<String>,
    pub playlist: bool,
    /// Used when no track carries both artist and album tags.
    pub playlist_title: Option<String>,
    pub quality: Quality,
    pub order: UploadOrder,
}

/// Merge command-line flags, file settings and prompts into a [`RunConfig`].
///
/// Prompts are only issued for values missing from both the command line
/// and the config file.
pub fn resolve(cli: &Cli, file: &FileSettings, prompter: &mut dyn Prompter) -> Result<RunConfig> {
    let login = &file.login;
    let settings = &file.settings;

    let email = match pick(cli.email.as_deref(), login.email.as_deref()) {
        Some(email) => email,
        None => prompter.line("Email")?,
    };
    let password = match pick(cli.password.as_deref(), login.pass.as_deref()) {
        Some(password) => password,
        None => prompter.secret("Password")?,
    };
    let developer_key = match pick(cli.developer_key.as_deref(), login.developer_key.as_deref()) {
        Some(key) => key,
        None => prompter.line("Developer Key")?,
    };

    let description = match cli.description() {
        Some(desc) => desc,
        None if settings.skip_description => String::new(),
        None => prompter.text("Enter description")?,
    };

    let keywords = pick(cli.keywords.as_deref(), settings.keywords.as_deref());
    let playlist = cli.playlist || settings.always_playlist;

    let order = match cli.order {
        Some(OrderArg::Sequenced) => UploadOrder::Sequenced,
        Some(OrderArg::Reversed) => UploadOrder::Reversed,
        None => settings
            .upload_order
            .unwrap_or_else(|| UploadOrder::default_for(playlist)),
    };

    let quality = if cli.low_quality {
        Quality::Low
    } else {
        Quality::Standard
    };

    Ok(RunConfig {
        cover: cli.cover.clone(),
        songs: cli.songs.clone(),
        credentials: Credentials {
            email,
            password,
            developer_key,
        },
        description,
        keywords,
        playlist,
        playlist_title: cli.playlist_title.clone(),
        quality,
        order,
    })
}

/// First non-empty value, command line before file.
fn pick(flag: Option<&str>, file: Option<&str>) -> Option<String> {
    flag.into_iter()
        .chain(file)
        .find(|value| !value.trim().is_empty())
        .map(str::to_string)
}
