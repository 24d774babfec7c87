use std::path::PathBuf;

use clap::builder::styling::{AnsiColor, Effects};
use clap::builder::Styles;
use clap::{Args, Parser, Subcommand, ValueEnum};
use rollpack::{Mode, DEFAULT_CONFIG_FILE};

#[derive(Parser)]
#[command(name = "rollpack")]
#[command(about = "Bundle JavaScript modules and their assets into chunks")]
#[command(version)]
#[command(styles = get_styles())]
pub struct Cli {
  #[command(subcommand)]
  pub command: Commands,

  /// Show debug logs of the build phases
  #[arg(short, long, global = true)]
  pub verbose: bool,
}

#[derive(Subcommand)]
pub enum Commands {
  /// Build once and write the output
  Build(BuildArgs),
  /// Build, then rebuild whenever a file under the context changes
  Watch(BuildArgs),
  /// Print the JSON schema of the configuration file
  Schema,
}

#[derive(Args)]
pub struct BuildArgs {
  /// Path of the configuration file
  #[arg(short, long, default_value = DEFAULT_CONFIG_FILE)]
  pub config: PathBuf,

  /// Overrides `mode` of the configuration file
  #[arg(short, long, value_enum)]
  pub mode: Option<ModeArg>,
}

#[derive(Clone, Copy, ValueEnum)]
pub enum ModeArg {
  Development,
  Production,
}

impl From<ModeArg> for Mode {
  fn from(mode: ModeArg) -> Self {
    match mode {
      ModeArg::Development => Mode::Development,
      ModeArg::Production => Mode::Production,
    }
  }
}

fn get_styles() -> Styles {
  Styles::styled()
    .usage(AnsiColor::Yellow.on_default() | Effects::BOLD)
    .header(AnsiColor::Green.on_default() | Effects::BOLD)
    .literal(AnsiColor::Cyan.on_default())
    .invalid(AnsiColor::Red.on_default() | Effects::BOLD)
    .error(AnsiColor::Red.on_default() | Effects::BOLD)
    .valid(AnsiColor::Green.on_default())
    .placeholder(AnsiColor::White.on_default())
}
