use std::path::PathBuf;

use thiserror::Error;

pub type Result<T> = std::result::Result<T, AppError>;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("image file does not exist, or is invalid: {0}")]
    InvalidCover(PathBuf),

    #[error("`{0}` must be installed and available on PATH")]
    MissingTool(&'static str),

    #[error("failed to load configuration: {0}")]
    Config(String),

    #[error("failed to run command `{program}`: {source}")]
    CommandSpawn {
        program: String,
        #[source]
        source: std::io::Error,
    },

    #[error("command `{program}` failed (exit code {code:?}): {output}")]
    CommandFailed {
        program: String,
        code: Option<i32>,
        output: String,
    },

    #[error("converter produced no usable output for {0}")]
    EmptyConversion(PathBuf),

    #[error("authentication failed: {0}")]
    AuthenticationFailed(String),

    #[error("not authenticated with the video host")]
    NotAuthenticated,

    #[error("request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("video host returned status {status}: {body}")]
    Api { status: u16, body: String },

    #[error("unexpected response from video host: {0}")]
    Response(String),

    #[error("failed to read tags: {0}")]
    Tags(#[from] lofty::error::LoftyError),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Image(#[from] image::ImageError),
}

impl From<::config::ConfigError> for AppError {
    fn from(err: ::config::ConfigError) -> Self {
        AppError::Config(err.to_string())
    }
}
