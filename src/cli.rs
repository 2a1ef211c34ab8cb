use std::path::PathBuf;

use clap::{Parser, ValueEnum};

/// Upload order of the sequenced tracks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OrderArg {
    Sequenced,
    Reversed,
}

#[derive(Debug, Parser)]
#[command(
    author,
    version,
    about = "Generate and upload music videos one album at a time with cover art"
)]
pub struct Cli {
    /// Cover image file
    #[arg(value_name = "COVER")]
    pub cover: PathBuf,

    /// List of song files
    #[arg(value_name = "SONGS", required = true, num_args = 1..)]
    pub songs: Vec<PathBuf>,

    /// Description for the videos (`\n` is turned into a newline)
    #[arg(long)]
    pub desc: Option<String>,

    /// Video host login email
    #[arg(long)]
    pub email: Option<String>,

    /// Video host password
    #[arg(long = "pass")]
    pub password: Option<String>,

    /// Additional search keywords (ex: "punk, hardcore")
    #[arg(long)]
    pub keywords: Option<String>,

    /// Developer key for the video host API
    #[arg(short = 'k', long = "developer_key")]
    pub developer_key: Option<String>,

    /// Group all videos into a playlist
    #[arg(short = 'P', long)]
    pub playlist: bool,

    /// Playlist title used when no track carries both artist and album tags
    #[arg(long)]
    pub playlist_title: Option<String>,

    /// Render videos in low quality (faster & shorter upload, but scratchy image quality)
    #[arg(short = 'L', long = "low-quality")]
    pub low_quality: bool,

    /// Upload order of the sequenced tracks (defaults to reversed without a playlist)
    #[arg(long, value_enum)]
    pub order: Option<OrderArg>,
}

impl Cli {
    /// Description with literal `\n` escapes expanded.
    pub fn description(&self) -> Option<String> {
        self.desc.as_ref().map(|desc| desc.replace("\\n", "\n"))
    }
}
