use clap::Parser;
use tracing_subscriber::EnvFilter;
use youtubegen::cli::Cli;
use youtubegen::config::{FileSettings, resolve};
use youtubegen::error::Result;
use youtubegen::metadata::LoftyReader;
use youtubegen::normalize::Sox;
use youtubegen::pipeline::{self, Collaborators};
use youtubegen::prompt::StdinPrompter;
use youtubegen::render::DvdSlideshow;
use youtubegen::tools;
use youtubegen::youtube::YouTubeClient;

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    if let Err(err) = run(&cli) {
        eprintln!("error: {err}");
        std::process::exit(1);
    }
}

fn run(cli: &Cli) -> Result<()> {
    let cover = tools::validate_cover(&cli.cover)?;
    tools::require_tools()?;

    let settings = FileSettings::load()?;
    let mut prompter = StdinPrompter::stdin();
    let mut config = resolve(cli, &settings, &mut prompter)?;
    config.cover = cover;

    let mut host = YouTubeClient::new()?;

    let summary = pipeline::run(
        &config,
        pipeline::create_workspace,
        Collaborators {
            converter: &Sox,
            tags: &LoftyReader,
            probe: &LoftyReader,
            renderer: &DvdSlideshow,
            host: &mut host,
            prompter: &mut prompter,
        },
    )?;

    println!(
        "Uploaded {} of {} videos ({} rendered)",
        summary.uploaded(),
        summary.tracks,
        summary.rendered
    );
    if config.playlist {
        println!("{} videos added to the playlist", summary.attached());
    }
    println!("Temporary directory was {}", summary.workspace.display());
    Ok(())
}
