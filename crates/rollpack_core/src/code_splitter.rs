use hashlink::{LinkedHashMap, LinkedHashSet};
use itertools::Itertools;
use rollpack_common::{ChunkId, ChunkKind, ModuleId, RenderOptions, CWD};
use rustc_hash::{FxHashMap, FxHashSet};

use crate::{
  uri_to_chunk_name, BuildError, CacheGroup, Chunk, ChunkGraph, ChunkGroup, Graph, InputOptions,
  OutputOptions, RuntimeChunk, UnaryBuildResult,
};

pub(crate) struct CodeSplitter<'me> {
  input_options: &'me InputOptions,
  output_options: &'me OutputOptions,
  graph: &'me Graph,
  chunk_by_id: LinkedHashMap<ChunkId, Chunk>,
  groups: Vec<ChunkGroup>,
  split_point_to_group: FxHashMap<ModuleId, usize>,
  mod_to_chunks: FxHashMap<ModuleId, FxHashSet<ChunkId>>,
}

/// Modules that one cache group wants to move into one new chunk.
#[derive(Debug)]
struct SharedCandidate {
  group_idx: usize,
  modules: Vec<ModuleId>,
  chunks: LinkedHashSet<ChunkId>,
}

impl<'me> CodeSplitter<'me> {
  pub(crate) fn new(
    graph: &'me Graph,
    input_options: &'me InputOptions,
    output_options: &'me OutputOptions,
  ) -> Self {
    Self {
      input_options,
      output_options,
      graph,
      chunk_by_id: Default::default(),
      groups: Default::default(),
      split_point_to_group: Default::default(),
      mod_to_chunks: Default::default(),
    }
  }

  fn chunk_name_conflict(&self, name: &str, other: &str) -> BuildError {
    BuildError::chunk_name_conflict(name.to_string(), vec![name.to_string(), other.to_string()])
  }

  /// Put every module statically reachable from `root` into the chunk.
  fn fill_chunk(&mut self, chunk_id: &ChunkId, root: &ModuleId) -> UnaryBuildResult<()> {
    let mut visited_modules: FxHashSet<ModuleId> = Default::default();
    let mut stack = vec![root.clone()];
    let mut reached = vec![];
    while let Some(module_id) = stack.pop() {
      if !visited_modules.insert(module_id.clone()) {
        continue;
      }
      let module = self.graph.fetch_module(&module_id)?;
      stack.extend(module.dependencies().iter().rev().cloned());
      reached.push(module_id);
    }

    let chunk = self
      .chunk_by_id
      .get_mut(chunk_id)
      .ok_or_else(|| BuildError::panic(format!("Chunk {chunk_id} does not exist")))?;
    chunk.roots.push(root.clone());
    chunk.modules.extend(reached);
    Ok(())
  }

  fn analyze_entries(&mut self) -> UnaryBuildResult<()> {
    let graph = self.graph;
    for (name, entry) in &graph.entries {
      tracing::trace!("Analyzing entry: {} ({})", name, entry);
      let chunk_id = ChunkId::from(name.as_str());
      if self.chunk_by_id.contains_key(&chunk_id) {
        return Err(self.chunk_name_conflict(name, entry.id()));
      }
      self
        .chunk_by_id
        .insert(chunk_id.clone(), Chunk::new(chunk_id.clone(), ChunkKind::Entry));
      self.groups.push(ChunkGroup::new(chunk_id.clone(), true));
      self
        .split_point_to_group
        .entry(entry.clone())
        .or_insert(self.groups.len() - 1);
      self.fill_chunk(&chunk_id, entry)?;
    }
    Ok(())
  }

  /// Targets of `import()` with the first chunk name requested for them, in
  /// execution order of the importers.
  fn collect_dynamic_entries(&self) -> LinkedHashMap<ModuleId, Option<String>> {
    let mut dynamic_entries: LinkedHashMap<ModuleId, Option<String>> = Default::default();
    self
      .graph
      .module_by_id
      .values()
      .filter_map(|m| m.as_norm())
      .sorted_by_key(|m| m.exec_order)
      .flat_map(|m| m.import_records.iter())
      .filter(|rec| rec.kind.is_dynamic() && !rec.resolved.is_external())
      .for_each(|rec| {
        let name = dynamic_entries.entry(rec.resolved.clone()).or_insert(None);
        if name.is_none() {
          *name = rec.chunk_name.clone();
        }
      });
    dynamic_entries
  }

  fn analyze_dynamic_entries(&mut self) -> UnaryBuildResult<()> {
    let cwd = self.input_options.cwd.to_string_lossy().into_owned();
    for (entry, requested_name) in self.collect_dynamic_entries() {
      if self.split_point_to_group.contains_key(&entry) {
        continue;
      }
      let name = requested_name.unwrap_or_else(|| uri_to_chunk_name(&cwd, entry.id()));
      let chunk_id = ChunkId::from(name.as_str());
      let group_idx = match self.chunk_by_id.get(&chunk_id) {
        // Split points asking for the same name share a chunk
        Some(chunk) if chunk.kind == ChunkKind::Async => self
          .groups
          .iter()
          .position(|g| g.root() == Some(&chunk_id))
          .ok_or_else(|| BuildError::panic(format!("Chunk {chunk_id} has no group")))?,
        Some(_) => return Err(self.chunk_name_conflict(&name, entry.id())),
        None => {
          self
            .chunk_by_id
            .insert(chunk_id.clone(), Chunk::new(chunk_id.clone(), ChunkKind::Async));
          self.groups.push(ChunkGroup::new(chunk_id.clone(), false));
          self.groups.len() - 1
        }
      };
      self.split_point_to_group.insert(entry.clone(), group_idx);
      self.fill_chunk(&chunk_id, &entry)?;
    }
    Ok(())
  }

  fn link_parents(&mut self) {
    let mut links = vec![];
    for (group_idx, group) in self.groups.iter().enumerate() {
      let Some(chunk) = group.root().and_then(|root| self.chunk_by_id.get(root)) else {
        continue;
      };
      chunk
        .modules
        .iter()
        .filter_map(|id| self.graph.module_by_id.get(id))
        .flat_map(|m| m.dynamic_dependencies())
        .filter_map(|dep| self.split_point_to_group.get(dep))
        .filter(|child| **child != group_idx)
        .for_each(|child| links.push((*child, group_idx)));
    }
    links.into_iter().for_each(|(child, parent)| {
      self.groups[child].parents.insert(parent);
    });
  }

  /// Modules already loaded whenever an async chunk gets loaded are dropped
  /// from it, the split point itself included.
  fn remove_available_modules(&mut self) {
    let group_modules = self
      .groups
      .iter()
      .map(|g| {
        g.root()
          .and_then(|root| self.chunk_by_id.get(root))
          .map(|c| c.modules.clone())
          .unwrap_or_default()
      })
      .collect::<Vec<_>>();

    // `None` stands for "every module", the neutral element of intersection
    let mut available: Vec<Option<FxHashSet<ModuleId>>> = self
      .groups
      .iter()
      .map(|g| g.is_entry.then(FxHashSet::default))
      .collect();

    let mut changed = true;
    while changed {
      changed = false;
      for idx in 0..self.groups.len() {
        if self.groups[idx].is_entry {
          continue;
        }
        let next = self.groups[idx]
          .parents
          .iter()
          .sorted()
          .filter_map(|parent| {
            available[*parent].as_ref().map(|avail| {
              avail
                .union(&group_modules[*parent])
                .cloned()
                .collect::<FxHashSet<_>>()
            })
          })
          .reduce(|acc, set| acc.intersection(&set).cloned().collect());
        if next.is_some() && next != available[idx] {
          available[idx] = next;
          changed = true;
        }
      }
    }

    for (idx, group) in self.groups.iter().enumerate() {
      let Some(avail) = &available[idx] else {
        continue;
      };
      if let Some(chunk) = group.root().and_then(|root| self.chunk_by_id.get_mut(root)) {
        let removable = chunk
          .modules
          .iter()
          .filter(|id| avail.contains(*id))
          .cloned()
          .collect::<Vec<_>>();
        removable.iter().for_each(|id| {
          tracing::trace!("{} is already available for chunk {}", id, chunk.id);
          chunk.modules.remove(id);
        });
      }
    }
  }

  /// The parent group serving an emptied async group, following emptied
  /// parents up. `None` when the walk goes in circles.
  fn serving_group(&self, idx: usize, emptied: &FxHashSet<usize>) -> Option<usize> {
    let mut visited: FxHashSet<usize> = Default::default();
    let mut current = idx;
    while emptied.contains(&current) {
      if !visited.insert(current) {
        return None;
      }
      current = *self.groups[current].parents.iter().min()?;
    }
    Some(current)
  }

  /// An async chunk left without modules is not emitted. Its split points
  /// resolve to a parent group, which is loaded already.
  fn drop_empty_async_chunks(&mut self) {
    let emptied = self
      .groups
      .iter()
      .enumerate()
      .filter(|(_, g)| !g.is_entry)
      .filter(|(_, g)| {
        g.root()
          .and_then(|root| self.chunk_by_id.get(root))
          .map_or(false, |c| c.modules.is_empty())
      })
      .map(|(idx, _)| idx)
      .collect::<FxHashSet<_>>();

    for idx in emptied.iter().copied().sorted() {
      let Some(parent) = self.serving_group(idx, &emptied) else {
        continue;
      };
      if let Some(root) = self.groups[idx].root().cloned() {
        tracing::debug!("Chunk {} is served by its parents", root);
        self.chunk_by_id.remove(&root);
      }
      self.groups[idx].chunks.clear();
      self
        .split_point_to_group
        .values_mut()
        .filter(|group_idx| **group_idx == idx)
        .for_each(|group_idx| *group_idx = parent);
    }
  }

  fn compute_mod_to_chunks(&mut self) {
    self.mod_to_chunks.clear();
    self.chunk_by_id.values().for_each(|chunk| {
      chunk.modules.iter().for_each(|id| {
        self
          .mod_to_chunks
          .entry(id.clone())
          .or_default()
          .insert(chunk.id.clone());
      });
    });
  }

  /// Cache groups ordered by priority, ties broken by declaration order.
  fn sorted_cache_groups(&self) -> Vec<(usize, &'me CacheGroup)> {
    let output_options: &'me OutputOptions = self.output_options;
    output_options
      .split_chunks
      .cache_groups
      .iter()
      .enumerate()
      .sorted_by(|(a_idx, a), (b_idx, b)| b.priority.cmp(&a.priority).then(a_idx.cmp(b_idx)))
      .collect()
  }

  fn collect_shared_candidates(&self) -> Vec<(String, SharedCandidate)> {
    let options = &self.output_options.split_chunks;
    let cache_groups = self.sorted_cache_groups();
    let chunk_order = self
      .chunk_by_id
      .keys()
      .enumerate()
      .map(|(idx, id)| (id.clone(), idx))
      .collect::<FxHashMap<_, _>>();
    let mut candidates: LinkedHashMap<String, SharedCandidate> = Default::default();

    let modules = self
      .graph
      .module_by_id
      .values()
      .sorted_by_key(|m| m.exec_order());

    for module in modules {
      let id = module.id();
      let Some(containing) = self.mod_to_chunks.get(id) else {
        continue;
      };
      let rooted_in = containing
        .iter()
        .filter_map(|c| self.chunk_by_id.get(c))
        .filter(|c| c.is_root(id))
        .map(|c| c.kind)
        .collect::<Vec<_>>();
      if rooted_in.contains(&ChunkKind::Entry) {
        continue;
      }
      // The root of an async chunk only moves by reusing that chunk
      let is_async_root = !rooted_in.is_empty();

      for (group_idx, group) in &cache_groups {
        if !group.matches(id.id()) || (is_async_root && !group.reuse_existing_chunk) {
          continue;
        }
        let filter = group.chunks.unwrap_or(options.chunks);
        let selected = containing
          .iter()
          .filter(|c| {
            self
              .chunk_by_id
              .get(*c)
              .map_or(false, |c| filter.accepts(c.kind))
          })
          .sorted_by_key(|c| chunk_order.get(*c).copied().unwrap_or(usize::MAX))
          .cloned()
          .collect::<Vec<_>>();
        let min_chunks = group.min_chunks.unwrap_or(options.min_chunks).max(1);
        if selected.len() < min_chunks {
          continue;
        }

        let name = group.name.clone().unwrap_or_else(|| {
          std::iter::once(group.key.as_str())
            .chain(selected.iter().map(|c| c.value()))
            .join(&options.automatic_name_delimiter)
        });
        let candidate = candidates
          .entry(name)
          .or_insert_with(|| SharedCandidate {
            group_idx: *group_idx,
            modules: vec![],
            chunks: Default::default(),
          });
        candidate.modules.push(id.clone());
        candidate.chunks.extend(selected);
        break;
      }
    }

    let priority_rank = cache_groups
      .iter()
      .enumerate()
      .map(|(rank, (group_idx, _))| (*group_idx, rank))
      .collect::<FxHashMap<_, _>>();
    candidates
      .into_iter()
      .sorted_by_key(|(_, c)| priority_rank.get(&c.group_idx).copied().unwrap_or(usize::MAX))
      .collect()
  }

  fn groups_containing<'a>(
    groups: &'a [ChunkGroup],
    chunks: &'a LinkedHashSet<ChunkId>,
  ) -> impl Iterator<Item = usize> + 'a {
    groups
      .iter()
      .enumerate()
      .filter(|(_, g)| chunks.iter().any(|c| g.contains(c)))
      .map(|(idx, _)| idx)
  }

  fn exceeds_request_limits(&self, candidate: &SharedCandidate) -> bool {
    let options = &self.output_options.split_chunks;
    Self::groups_containing(&self.groups, &candidate.chunks).any(|idx| {
      let group = &self.groups[idx];
      let limit = if group.is_entry {
        options.max_initial_requests
      } else {
        options.max_async_requests
      };
      group.chunks.len() + 1 > limit
    })
  }

  fn move_modules(&mut self, modules: &[ModuleId], from: &[ChunkId]) {
    from.iter().for_each(|chunk_id| {
      if let Some(chunk) = self.chunk_by_id.get_mut(chunk_id) {
        modules.iter().for_each(|id| {
          chunk.modules.remove(id);
        });
      }
    });
  }

  fn modules_size(&self, modules: &[ModuleId]) -> usize {
    modules
      .iter()
      .filter_map(|id| self.graph.module_by_id.get(id))
      .map(|m| m.size())
      .sum()
  }

  fn is_chunk_root(&self, id: &ModuleId) -> bool {
    self.chunk_by_id.values().any(|c| c.is_root(id))
  }

  fn extract_shared_chunks(&mut self) -> UnaryBuildResult<()> {
    let output_options = self.output_options;
    let options = &output_options.split_chunks;
    for (name, mut candidate) in self.collect_shared_candidates() {
      let group = &options.cache_groups[candidate.group_idx];
      let min_size = group.min_size.unwrap_or(options.min_size);
      let size = self.modules_size(&candidate.modules);

      if !group.enforce && size < min_size {
        tracing::trace!("{} is too small to be extracted ({} bytes)", name, size);
        continue;
      }

      if group.reuse_existing_chunk {
        let wanted = candidate.modules.iter().collect::<FxHashSet<_>>();
        let reusable = candidate.chunks.iter().find(|c| {
          self
            .chunk_by_id
            .get(*c)
            .map_or(false, |c| c.modules.iter().collect::<FxHashSet<_>>() == wanted)
        });
        if let Some(reused) = reusable.cloned() {
          tracing::debug!("Reusing chunk {} for {}", reused, name);
          let others = candidate
            .chunks
            .iter()
            .filter(|c| **c != reused)
            .cloned()
            .collect::<Vec<_>>();
          self.move_modules(&candidate.modules, &others);
          let others = others.into_iter().collect::<LinkedHashSet<_>>();
          let targets = Self::groups_containing(&self.groups, &others).collect::<Vec<_>>();
          targets.into_iter().for_each(|idx| {
            self.groups[idx].insert_before_root(reused.clone());
          });
          continue;
        }
      }

      if candidate.modules.iter().any(|id| self.is_chunk_root(id)) {
        candidate.modules.retain(|id| !self.is_chunk_root(id));
        let chunk_by_id = &self.chunk_by_id;
        let modules = &candidate.modules;
        candidate.chunks.retain(|c| {
          chunk_by_id
            .get(c)
            .map_or(false, |c| modules.iter().any(|id| c.modules.contains(id)))
        });
        let min_chunks = group.min_chunks.unwrap_or(options.min_chunks).max(1);
        if candidate.modules.is_empty()
          || candidate.chunks.len() < min_chunks
          || (!group.enforce && self.modules_size(&candidate.modules) < min_size)
        {
          tracing::trace!("{} has nothing left to extract besides chunk roots", name);
          continue;
        }
      }

      if !group.enforce && self.exceeds_request_limits(&candidate) {
        tracing::trace!("{} would exceed the parallel request limit", name);
        continue;
      }

      let chunk_id = ChunkId::from(name.as_str());
      if self.chunk_by_id.contains_key(&chunk_id) {
        return Err(self.chunk_name_conflict(&name, &group.key));
      }
      tracing::debug!("Extracting {} modules into {}", candidate.modules.len(), name);
      let from = candidate.chunks.iter().cloned().collect::<Vec<_>>();
      self.move_modules(&candidate.modules, &from);
      let mut chunk = Chunk::new(chunk_id.clone(), ChunkKind::Shared);
      chunk.modules.extend(candidate.modules.iter().cloned());
      self.chunk_by_id.insert(chunk_id.clone(), chunk);
      let targets = Self::groups_containing(&self.groups, &candidate.chunks).collect::<Vec<_>>();
      targets.into_iter().for_each(|idx| {
        self.groups[idx].insert_before_root(chunk_id.clone());
      });
    }
    Ok(())
  }

  fn add_runtime_chunks(&mut self) -> UnaryBuildResult<()> {
    let entry_names = self
      .graph
      .entries
      .iter()
      .map(|(name, _)| name.clone())
      .collect::<Vec<_>>();
    let output_options = self.output_options;
    match &output_options.runtime_chunk {
      RuntimeChunk::Disabled => return Ok(()),
      RuntimeChunk::Single { name } => {
        let chunk_id = ChunkId::from(name.as_str());
        if self.chunk_by_id.contains_key(&chunk_id) {
          return Err(self.chunk_name_conflict(name, "runtime"));
        }
        self
          .chunk_by_id
          .insert(chunk_id.clone(), Chunk::new(chunk_id.clone(), ChunkKind::Runtime));
        self
          .groups
          .iter_mut()
          .filter(|g| g.is_entry)
          .for_each(|g| g.chunks.insert(0, chunk_id.clone()));
      }
      RuntimeChunk::PerEntry { name } => {
        let entry_groups = self
          .groups
          .iter()
          .enumerate()
          .filter(|(_, g)| g.is_entry)
          .map(|(idx, _)| idx)
          .collect::<Vec<_>>();
        for (group_idx, entry_name) in entry_groups.into_iter().zip(entry_names) {
          let runtime_name = name.render(RenderOptions {
            name: Some(entry_name.as_str()),
            ..Default::default()
          });
          let chunk_id = ChunkId::from(runtime_name.as_str());
          if self.chunk_by_id.contains_key(&chunk_id) {
            return Err(self.chunk_name_conflict(&runtime_name, &entry_name));
          }
          self
            .chunk_by_id
            .insert(chunk_id.clone(), Chunk::new(chunk_id.clone(), ChunkKind::Runtime));
          self.groups[group_idx].chunks.insert(0, chunk_id);
        }
      }
    }
    Ok(())
  }

  fn check_orphans(&self) -> UnaryBuildResult<()> {
    let covered = self
      .chunk_by_id
      .values()
      .flat_map(|c| c.modules.iter())
      .collect::<FxHashSet<_>>();
    self
      .graph
      .module_by_id
      .keys()
      .filter(|id| !id.is_external())
      .sorted()
      .find(|id| !covered.contains(*id))
      .map_or(Ok(()), |id| {
        Err(CWD.set(&self.input_options.cwd, || {
          BuildError::orphaned_module(id.id())
        }))
      })
  }

  #[tracing::instrument(skip_all)]
  pub(crate) fn split(mut self) -> UnaryBuildResult<ChunkGraph> {
    self.analyze_entries()?;
    self.analyze_dynamic_entries()?;
    self.link_parents();
    self.remove_available_modules();
    self.drop_empty_async_chunks();
    self.compute_mod_to_chunks();
    tracing::trace!("mod_to_chunks: {:#?}", self.mod_to_chunks);

    self.extract_shared_chunks()?;
    self.add_runtime_chunks()?;
    self.check_orphans()?;

    tracing::debug!(
      "chunks: {:?}",
      self
        .chunk_by_id
        .values()
        .map(|c| format!("{}({}, {} modules)", c.id, c.kind, c.modules.len()))
        .collect::<Vec<_>>()
    );

    Ok(ChunkGraph {
      chunk_by_id: self.chunk_by_id,
      groups: self.groups,
      split_point_to_group: self.split_point_to_group,
    })
  }
}
