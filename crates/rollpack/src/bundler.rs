use std::path::PathBuf;

use rollpack_common::BundleOutput;
use rollpack_core::{BuildResult, BundlerCore, InputOptions, OutputOptions};
use rollpack_fs::SharedFileSystem;
use rollpack_plugin::BuildPlugin;
use sugar_path::SugarPath;

pub struct Bundler {
  core: BundlerCore,
  cwd: PathBuf,
  fs: SharedFileSystem,
}

impl Bundler {
  pub fn new(input_opts: InputOptions) -> Self {
    Self::with_plugins(input_opts, vec![])
  }

  pub fn with_plugins(input_opts: InputOptions, plugins: Vec<Box<dyn BuildPlugin>>) -> Self {
    rollpack_tracing::enable_tracing_on_demand();
    let cwd = input_opts.cwd.clone();
    let fs = input_opts.fs.clone();
    Self {
      core: BundlerCore::with_plugins(input_opts, plugins),
      cwd,
      fs,
    }
  }

  pub fn input_options(&self) -> &InputOptions {
    self.core.input_options()
  }

  /// Directory the output is written to. Relative directories are resolved
  /// against `cwd`.
  pub fn output_dir(&self, output_options: &OutputOptions) -> PathBuf {
    match &output_options.dir {
      Some(dir) => self.cwd.join(dir).normalize(),
      None => self.cwd.join("dist"),
    }
  }

  pub async fn write(&mut self, output_options: &OutputOptions) -> BuildResult<BundleOutput> {
    let dir = self.output_dir(output_options);
    let output = self.core.build(output_options).await?;

    self.fs.create_dir_all(&dir)?;
    for (file_name, content) in output.files() {
      let dest = dir.join(file_name);
      if let Some(parent) = dest.parent() {
        if !self.fs.is_dir(parent) {
          self.fs.create_dir_all(parent)?;
        }
      }
      self.fs.write(&dest, content)?;
      tracing::trace!("wrote {}", dest.display());
    }
    tracing::debug!("output written to {}", dir.display());
    Ok(output)
  }

  pub async fn generate(&mut self, output_options: &OutputOptions) -> BuildResult<BundleOutput> {
    self.core.build(output_options).await
  }
}
