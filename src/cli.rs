use clap::{Args, Parser, Subcommand};
use clap_complete::Shell;
use std::path::PathBuf;

use crate::color::{Color, GradientDirection, TextColor};

#[derive(Parser, Debug)]
#[command(name = "coverwall")]
#[command(author, version, about = "Phone wallpapers from a track or album's cover art")]
#[command(args_conflicts_with_subcommands = true)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Command>,

    #[command(flatten)]
    pub generate: GenerateArgs,

    /// Config file path
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Log debug output
    #[arg(short, long, global = true)]
    pub verbose: bool,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Render a wallpaper (the default when a link is given)
    Generate(GenerateArgs),
    /// Write a commented config file to the default location
    InitConfig,
    /// Print shell completions
    Completions {
        #[arg(value_enum)]
        shell: Shell,
    },
}

#[derive(Args, Debug, Default, Clone)]
pub struct GenerateArgs {
    /// Track or album link (open.spotify.com URL or spotify: URI)
    pub link: Option<String>,

    /// Output PNG path
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Background color (#rrggbb)
    #[arg(long)]
    pub bg: Option<Color>,

    /// Gradient accent color (#rrggbb); defaults to the cover's dominant color
    #[arg(long)]
    pub accent: Option<Color>,

    /// Gradient strength (0.0-1.0)
    #[arg(long)]
    pub gradient_strength: Option<f32>,

    /// Gradient direction
    #[arg(long, value_enum)]
    pub gradient_direction: Option<GradientDirection>,

    /// Text color
    #[arg(long, value_enum)]
    pub text_color: Option<TextColor>,

    /// Disable the vignette
    #[arg(long)]
    pub no_vignette: bool,

    /// Vignette intensity (0.0-1.0)
    #[arg(long)]
    pub vignette_intensity: Option<f32>,

    /// Do not draw the palette swatches
    #[arg(long)]
    pub hide_palette: bool,

    /// Web API access token (overrides config and environment)
    #[arg(long)]
    pub token: Option<String>,

    /// Palette sampling stride
    #[arg(long)]
    pub quality: Option<usize>,
}

impl Cli {
    /// The explicit subcommand, or `generate` when a bare link was given.
    pub fn into_command(self) -> Option<Command> {
        match self.command {
            Some(command) => Some(command),
            None if self.generate.link.is_some() => Some(Command::Generate(self.generate)),
            None => None,
        }
    }
}
