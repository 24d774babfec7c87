use std::{
  path::Path,
  sync::{Arc, Mutex},
};

use rollpack::{LoaderRegistry, OsFileSystem, ResolvedConfig};
use rollpack_error::Error as BuildError;

use crate::test_config::TestConfig;

pub struct Tester {
  pub config: TestConfig,
  pub warnings: Arc<Mutex<Vec<BuildError>>>,
}

impl Tester {
  pub fn from_config_path(filepath: &Path) -> Self {
    let test_config = TestConfig::from_config_path(filepath);
    Self {
      config: test_config,
      warnings: Default::default(),
    }
  }

  /// Turn the build part of the test config into options rooted at
  /// `fixture_dir`. Warnings are collected into `self.warnings`.
  pub fn resolved_config(&mut self, fixture_dir: &Path) -> rollpack_error::Result<ResolvedConfig> {
    let config = std::mem::take(&mut self.config.config);
    let mut resolved = config.resolve(
      fixture_dir,
      None,
      OsFileSystem::new_shared(),
      &LoaderRegistry::with_builtins(),
    )?;
    let warning_collector = self.warnings.clone();
    resolved.input.on_warn = Arc::new(move |err| {
      warning_collector.lock().unwrap().push(err);
    });
    Ok(resolved)
  }
}
