use rollpack_common::ModuleId;

/// A module listed in `externals`. It is never read, the rendered module
/// evaluates to the configured global variable.
#[derive(Debug)]
pub struct ExternalModule {
  pub exec_order: usize,
  pub id: ModuleId,
  pub global: String,
}

impl ExternalModule {
  pub(crate) fn new(id: ModuleId, global: String) -> Self {
    Self {
      exec_order: usize::MAX,
      id,
      global,
    }
  }

  pub(crate) fn code(&self) -> String {
    format!("module.exports = {};", self.global)
  }
}
