use std::path::PathBuf;

use clap::{
    CommandFactory, Parser, Subcommand,
    builder::{
        Styles,
        styling::{AnsiColor, Effects},
    },
};
use clap_complete::{Shell, generate};

use vibesync::{cli, config, error, types::PlaylistPreferences};

fn styles() -> Styles {
    Styles::styled()
        .header(AnsiColor::White.on_default() | Effects::BOLD)
        .usage(AnsiColor::White.on_default() | Effects::BOLD)
        .literal(AnsiColor::BrightBlue.on_default())
        .placeholder(AnsiColor::BrightGreen.on_default())
}

#[derive(Parser, Debug, Clone)]
#[clap(
  version = env!("CARGO_PKG_VERSION"),
  name=env!("CARGO_PKG_NAME"),
  bin_name=env!("CARGO_PKG_NAME"),
  author=env!("CARGO_PKG_AUTHORS"),
  about=env!("CARGO_PKG_DESCRIPTION"),
  styles=styles(),
)]
struct Cli {
    #[clap(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// Curate a playlist and cover image from taste sliders
    Generate(GenerateOptions),

    /// List past generations or show one of them
    History(HistoryOptions),

    /// Export a generated playlist to Spotify
    Export(ExportOptions),

    /// Authorize with Spotify API
    Auth,

    /// Forget the stored Spotify token
    Logout,

    /// Show the connected Spotify account
    Whoami,

    /// Get shell completions
    Completions(CompletionsOption),
}

#[derive(Parser, Debug, Clone)]
pub struct GenerateOptions {
    #[clap(long, default_value_t = 65, value_parser = clap::value_parser!(u8).range(0..=100))]
    mood: u8,
    #[clap(long, default_value_t = 40, value_parser = clap::value_parser!(u8).range(0..=100))]
    energy: u8,
    #[clap(long, default_value_t = 75, value_parser = clap::value_parser!(u8).range(0..=100))]
    popularity: u8,
    #[clap(long, default_value_t = 30, value_parser = clap::value_parser!(u8).range(0..=100))]
    danceability: u8,
    #[clap(long, default_value_t = 20, value_parser = clap::value_parser!(u8).range(0..=100))]
    acousticness: u8,
    #[clap(long, default_value_t = 10, value_parser = clap::value_parser!(u8).range(0..=100))]
    instrumentalness: u8,

    /// Genre label, e.g. Synthwave, Dark Techno, Ambient, Jazz Fusion,
    /// Hyperpop, K-Pop, Metal, Lo-fi, Indie Sleaze
    #[clap(long, default_value = "Synthwave")]
    genre: String,

    /// Free-text description of the aesthetic
    #[clap(long, default_value = "")]
    prompt: String,

    /// Write the generated cover image to this file
    #[clap(long)]
    cover_out: Option<PathBuf>,
}

impl From<GenerateOptions> for PlaylistPreferences {
    fn from(opt: GenerateOptions) -> Self {
        PlaylistPreferences {
            mood: opt.mood,
            energy: opt.energy,
            popularity: opt.popularity,
            danceability: opt.danceability,
            acousticness: opt.acousticness,
            instrumentalness: opt.instrumentalness,
            genre: opt.genre,
            prompt: opt.prompt,
        }
    }
}

#[derive(Parser, Debug, Clone)]
pub struct HistoryOptions {
    /// Show the tracks of entry N (0 is the most recent)
    #[clap(long)]
    show: Option<usize>,
}

#[derive(Parser, Debug, Clone)]
pub struct ExportOptions {
    /// History entry to export (0 is the most recent)
    #[clap(long, default_value_t = 0)]
    index: usize,

    /// Open the created playlist in the browser
    #[clap(long)]
    open: bool,
}

#[derive(Parser, Debug, Clone)]
pub struct CompletionsOption {
    shell: Shell,
}

#[tokio::main]
async fn main() {
    if let Err(e) = config::load_env().await {
        error!("Cannot load environment. Err: {}", e);
    }

    let cli = Cli::parse();

    match cli.command {
        Command::Generate(opt) => {
            let cover_out = opt.cover_out.clone();
            cli::generate(opt.into(), cover_out).await
        }
        Command::History(opt) => cli::history(opt.show).await,
        Command::Export(opt) => cli::export(opt.index, opt.open).await,
        Command::Auth => cli::auth().await,
        Command::Logout => cli::logout().await,
        Command::Whoami => cli::whoami().await,
        Command::Completions(opt) => {
            let mut cmd = Cli::command_for_update();
            let name = cmd.get_name().to_string();
            generate(opt.shell, &mut cmd, name, &mut std::io::stdout())
        }
    }
}
