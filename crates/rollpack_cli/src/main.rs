mod cli;
mod watch;

use std::{
  path::{Path, PathBuf},
  process::ExitCode,
  time::{Duration, Instant},
};

use ansi_term::Color;
use clap::Parser;
use rollpack::{
  BuildResult, BundleOutput, Bundler, Errors, LoaderRegistry, Mode, OsFileSystem, ResolvedConfig,
  RollpackConfig,
};

use crate::cli::{BuildArgs, Cli, Commands};
use crate::watch::ChangeWatcher;

/// A configuration file and the command line overrides.
struct Project {
  config_path: PathBuf,
  mode: Option<Mode>,
}

struct Build {
  cwd: PathBuf,
  output_dir: PathBuf,
  output: BundleOutput,
  elapsed: Duration,
}

impl Project {
  fn new(args: BuildArgs) -> std::io::Result<Self> {
    Ok(Self {
      config_path: std::env::current_dir()?.join(args.config),
      mode: args.mode.map(Mode::from),
    })
  }

  fn config_dir(&self) -> &Path {
    self.config_path.parent().unwrap_or_else(|| Path::new("/"))
  }

  fn resolve(&self) -> Result<ResolvedConfig, rollpack::Error> {
    let fs = OsFileSystem::new_shared();
    let config = RollpackConfig::load(&fs, &self.config_path)?;
    config.resolve(
      self.config_dir(),
      self.mode,
      fs,
      &LoaderRegistry::with_builtins(),
    )
  }

  async fn build(&self) -> BuildResult<Build> {
    let started = Instant::now();
    let ResolvedConfig {
      input,
      output,
      plugins,
    } = self.resolve()?;
    tracing::debug!("Building {} in {} mode", self.config_path.display(), input.mode.as_str());
    let cwd = input.cwd.clone();
    let mut bundler = Bundler::with_plugins(input, plugins);
    let output_dir = bundler.output_dir(&output);
    let output = bundler.write(&output).await?;
    Ok(Build {
      cwd,
      output_dir,
      output,
      elapsed: started.elapsed(),
    })
  }

  /// Logs the written files or the errors of the build.
  async fn build_and_report(&self) -> Option<Build> {
    match self.build().await {
      Ok(build) => {
        print_summary(&build);
        Some(build)
      }
      Err(errors) => {
        print_errors(&errors, self.config_dir());
        None
      }
    }
  }
}

fn format_size(size: usize) -> String {
  if size < 1024 {
    format!("{size} B")
  } else {
    format!("{:.2} KiB", size as f64 / 1024.0)
  }
}

fn print_summary(build: &Build) {
  build.output.files().for_each(|(file_name, content)| {
    tracing::info!(
      "{} {}",
      Color::Green.paint(file_name),
      Color::White.dimmed().paint(format_size(content.len()))
    );
  });
  tracing::info!(
    "Wrote {} files to {} in {}ms",
    build.output.files().count(),
    build.output_dir.display(),
    build.elapsed.as_millis()
  );
}

fn print_errors(errors: &Errors, cwd: &Path) {
  errors.iter().for_each(|err| {
    tracing::error!(
      "{} {}",
      Color::Red.bold().paint(err.kind.code()),
      err.kind.to_readable_string(cwd)
    );
  });
}

async fn watch(project: Project) -> ExitCode {
  let mut watcher = match ChangeWatcher::new() {
    Ok(watcher) => watcher,
    Err(err) => {
      tracing::error!("Failed to start the file watcher: {err}");
      return ExitCode::FAILURE;
    }
  };

  let mut watched_dirs: Vec<PathBuf> = vec![];
  loop {
    let build = project.build_and_report().await;

    let mut dirs = vec![project.config_dir().to_path_buf()];
    if let Some(build) = &build {
      dirs.push(build.cwd.clone());
      watcher.ignore(build.output_dir.clone());
    }
    for dir in dirs {
      if watched_dirs.iter().any(|watched| dir.starts_with(watched)) {
        continue;
      }
      if let Err(err) = watcher.watch(&dir) {
        tracing::error!("Failed to watch {}: {err}", dir.display());
        return ExitCode::FAILURE;
      }
      watched_dirs.push(dir);
    }

    tracing::info!("Watching for changes...");
    match watcher.next_change().await {
      Some(paths) => tracing::debug!("Changed: {:?}", paths),
      None => return ExitCode::SUCCESS,
    }
  }
}

#[tokio::main]
async fn main() -> ExitCode {
  let cli = Cli::parse();
  rollpack_tracing::init(cli.verbose);

  let (args, watch_mode) = match cli.command {
    Commands::Schema => {
      println!("{}", RollpackConfig::json_schema());
      return ExitCode::SUCCESS;
    }
    Commands::Build(args) => (args, false),
    Commands::Watch(args) => (args, true),
  };

  let project = match Project::new(args) {
    Ok(project) => project,
    Err(err) => {
      tracing::error!("{err}");
      return ExitCode::FAILURE;
    }
  };

  if watch_mode {
    watch(project).await
  } else if project.build_and_report().await.is_some() {
    ExitCode::SUCCESS
  } else {
    ExitCode::FAILURE
  }
}
