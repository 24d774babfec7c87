use rollpack_common::{ChunkId, ChunkKind, ModuleId};
use rustc_hash::FxHashSet;

use crate::{BuildError, ModuleById, NormOrExt, UnaryBuildResult};

#[derive(Debug)]
pub struct Chunk {
  pub(crate) id: ChunkId,
  pub(crate) kind: ChunkKind,
  /// Modules that caused the chunk to exist. Empty for shared and runtime
  /// chunks.
  pub(crate) roots: Vec<ModuleId>,
  pub(crate) modules: FxHashSet<ModuleId>,
  pub(crate) content_hash: Option<String>,
  pub(crate) file_name: Option<String>,
}

impl Chunk {
  pub fn new(id: impl Into<ChunkId>, kind: ChunkKind) -> Self {
    Self {
      id: id.into(),
      kind,
      roots: Default::default(),
      modules: Default::default(),
      content_hash: None,
      file_name: None,
    }
  }

  pub fn id(&self) -> &ChunkId {
    &self.id
  }

  pub fn kind(&self) -> ChunkKind {
    self.kind
  }

  pub(crate) fn is_root(&self, id: &ModuleId) -> bool {
    self.roots.contains(id)
  }

  pub(crate) fn ordered_modules<'m>(
    &self,
    module_by_id: &'m ModuleById,
  ) -> UnaryBuildResult<Vec<&'m NormOrExt>> {
    let mut modules = self
      .modules
      .iter()
      .map(|id| {
        module_by_id
          .get(id)
          .ok_or_else(|| BuildError::missing_module(id.id()))
      })
      .collect::<UnaryBuildResult<Vec<_>>>()?;

    modules.sort_by_key(|m| m.exec_order());

    Ok(modules)
  }

  pub(crate) fn size(&self, module_by_id: &ModuleById) -> usize {
    self
      .modules
      .iter()
      .filter_map(|id| module_by_id.get(id))
      .map(NormOrExt::size)
      .sum()
  }
}
