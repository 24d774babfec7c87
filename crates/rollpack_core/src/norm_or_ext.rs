use rollpack_common::ModuleId;

use crate::{external_module::ExternalModule, normal_module::NormalModule};

/// A graph node: a bundled module or a module left to a global variable.
#[derive(Debug)]
pub enum NormOrExt {
  Normal(NormalModule),
  External(ExternalModule),
}

impl NormOrExt {
  pub fn id(&self) -> &ModuleId {
    match self {
      NormOrExt::Normal(module) => &module.id,
      NormOrExt::External(module) => &module.id,
    }
  }

  /// Static dependencies, including the ones declared by loaders. Externals
  /// have none.
  pub fn dependencies(&self) -> &[ModuleId] {
    self
      .as_norm()
      .map(|m| m.dependencies.as_slice())
      .unwrap_or_default()
  }

  /// Targets of `import()`.
  pub fn dynamic_dependencies(&self) -> &[ModuleId] {
    self
      .as_norm()
      .map(|m| m.dyn_dependencies.as_slice())
      .unwrap_or_default()
  }

  pub fn exec_order(&self) -> usize {
    match self {
      NormOrExt::Normal(module) => module.exec_order,
      NormOrExt::External(module) => module.exec_order,
    }
  }

  pub fn set_exec_order(&mut self, exec_order: usize) {
    match self {
      NormOrExt::Normal(module) => module.exec_order = exec_order,
      NormOrExt::External(module) => module.exec_order = exec_order,
    }
  }

  /// Bytes of rendered code, what `minSize` of cache groups is compared to.
  pub fn size(&self) -> usize {
    match self {
      NormOrExt::Normal(module) => module.size(),
      NormOrExt::External(module) => module.code().len(),
    }
  }

  pub fn as_norm(&self) -> Option<&NormalModule> {
    match self {
      NormOrExt::Normal(module) => Some(module),
      NormOrExt::External(_) => None,
    }
  }

  pub fn as_norm_mut(&mut self) -> Option<&mut NormalModule> {
    match self {
      NormOrExt::Normal(module) => Some(module),
      NormOrExt::External(_) => None,
    }
  }
}
