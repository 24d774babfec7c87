use std::{path::PathBuf, sync::Arc};

use derivative::Derivative;
use rollpack_common::Mode;
use rollpack_fs::{OsFileSystem, SharedFileSystem};
use rollpack_loader::TransformPipeline;
use rollpack_resolver::ResolveOptions;
use rustc_hash::FxHashMap;

use crate::BuildError;

pub type WarningHandler = Arc<dyn Fn(BuildError) + Send + Sync>;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InputItem {
  pub name: String,
  pub import: String,
}

impl InputItem {
  pub fn new(name: impl Into<String>, import: impl Into<String>) -> Self {
    Self {
      name: name.into(),
      import: import.into(),
    }
  }
}

#[derive(Derivative)]
#[derivative(Debug)]
pub struct InputOptions {
  pub input: Vec<InputItem>,
  pub cwd: PathBuf,
  pub mode: Mode,
  pub resolve: ResolveOptions,
  pub pipeline: TransformPipeline,
  /// Specifier -> global variable the module evaluates to.
  pub externals: FxHashMap<String, String>,
  /// Upper bound of module tasks running at the same time. `None` means the
  /// available parallelism of the machine.
  pub concurrency: Option<usize>,
  #[derivative(Debug = "ignore")]
  pub fs: SharedFileSystem,
  #[derivative(Debug = "ignore")]
  pub on_warn: WarningHandler,
}

impl InputOptions {
  pub(crate) fn concurrency(&self) -> usize {
    self
      .concurrency
      .or_else(|| std::thread::available_parallelism().ok().map(|n| n.get()))
      .unwrap_or(4)
      .max(1)
  }
}

impl Default for InputOptions {
  fn default() -> Self {
    Self {
      input: Default::default(),
      cwd: std::env::current_dir().unwrap_or_else(|_| PathBuf::from("/")),
      mode: Mode::default(),
      resolve: Default::default(),
      pipeline: Default::default(),
      externals: Default::default(),
      concurrency: None,
      fs: OsFileSystem::new_shared(),
      on_warn: Arc::new(|err| {
        tracing::warn!("{}", err);
      }),
    }
  }
}
