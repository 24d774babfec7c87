use hashlink::LinkedHashMap;
use rollpack_common::{ChunkId, ModuleId};
use rustc_hash::{FxHashMap, FxHashSet};

use crate::Chunk;

/// Chunks that have to be loaded together, in load order. Every entry and
/// every async chunk owns one group, its own chunk comes last. An async group
/// whose chunk turned out empty holds no chunks.
#[derive(Debug)]
pub(crate) struct ChunkGroup {
  pub(crate) is_entry: bool,
  pub(crate) chunks: Vec<ChunkId>,
  pub(crate) parents: FxHashSet<usize>,
}

impl ChunkGroup {
  pub(crate) fn new(root: ChunkId, is_entry: bool) -> Self {
    Self {
      is_entry,
      chunks: vec![root],
      parents: Default::default(),
    }
  }

  pub(crate) fn root(&self) -> Option<&ChunkId> {
    self.chunks.last()
  }

  pub(crate) fn contains(&self, chunk: &ChunkId) -> bool {
    self.chunks.contains(chunk)
  }

  /// Shared chunks load after the runtime and before the root.
  pub(crate) fn insert_before_root(&mut self, chunk: ChunkId) {
    if !self.contains(&chunk) {
      let idx = self.chunks.len().saturating_sub(1);
      self.chunks.insert(idx, chunk);
    }
  }
}

#[derive(Debug)]
pub(crate) struct ChunkGraph {
  /// In creation order: entries, async, shared, runtime.
  pub(crate) chunk_by_id: LinkedHashMap<ChunkId, Chunk>,
  /// Entry groups come first, in declaration order.
  pub(crate) groups: Vec<ChunkGroup>,
  pub(crate) split_point_to_group: FxHashMap<ModuleId, usize>,
}

impl ChunkGraph {
  pub(crate) fn entry_groups(&self) -> impl Iterator<Item = &ChunkGroup> {
    self.groups.iter().filter(|g| g.is_entry)
  }
}
