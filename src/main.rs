use anyhow::{bail, Result};
use clap::{CommandFactory, Parser};
use tracing::info;

use coverwall::app;
use coverwall::cli::{Cli, Command, GenerateArgs};
use coverwall::config::Config;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    let directive = if cli.verbose { "coverwall=debug" } else { "coverwall=info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env().add_directive(directive.parse()?),
        )
        .with_writer(std::io::stderr)
        .init();

    // Load config: explicit path, then XDG default, then built-in defaults
    let mut config = match &cli.config {
        Some(path) => Config::load(path)?,
        None => Config::load_from_default_path().unwrap_or_default(),
    };
    config.apply_env();

    match cli.into_command() {
        Some(Command::Generate(args)) => run_generate(config, args).await,
        Some(Command::InitConfig) => {
            let path = Config::init_default_config()?;
            println!("Config written to {}", path.display());
            Ok(())
        }
        Some(Command::Completions { shell }) => {
            clap_complete::generate(shell, &mut Cli::command(), "coverwall", &mut std::io::stdout());
            Ok(())
        }
        None => {
            Cli::command().print_help()?;
            Ok(())
        }
    }
}

async fn run_generate(mut config: Config, args: GenerateArgs) -> Result<()> {
    let Some(link) = args.link.clone() else {
        bail!("a track or album link is required");
    };
    config.merge_args(&args);

    info!("Generating wallpaper for {}", link);
    let summary = app::generate(&link, &config, args.output.as_deref()).await?;

    println!("Title:    {}", summary.title);
    println!("Artist:   {}", summary.artist);
    println!("Duration: {}", summary.duration);
    println!("Dominant: {}", summary.dominant);
    println!("Saved to: {}", summary.path.display());
    Ok(())
}
