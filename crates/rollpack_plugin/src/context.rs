use std::{path::Path, sync::Arc};

use rollpack_common::Mode;

/// Build-wide information handed to every hook call.
#[derive(Debug, Clone)]
pub struct Context {
  cwd: Arc<Path>,
  mode: Mode,
}

impl Context {
  pub fn new(cwd: Arc<Path>, mode: Mode) -> Self {
    Self { cwd, mode }
  }

  pub fn cwd(&self) -> &Path {
    &self.cwd
  }

  pub fn mode(&self) -> Mode {
    self.mode
  }
}
