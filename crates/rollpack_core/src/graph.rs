use derivative::Derivative;
use rollpack_common::{ModuleId, CWD};
use rustc_hash::FxHashSet;

use crate::module_loader::ModuleLoader;
use crate::{
  norm_or_ext::NormOrExt, BuildError, BuildResult, ModuleById, SharedBuildPluginDriver,
  SharedInputOptions, SharedResolver, UnaryBuildResult,
};

#[derive(Derivative)]
#[derivative(Debug)]
pub struct Graph {
  /// `(entry name, module)` in declaration order.
  pub entries: Vec<(String, ModuleId)>,
  pub(crate) module_by_id: ModuleById,
  #[derivative(Debug = "ignore")]
  pub(crate) build_plugin_driver: SharedBuildPluginDriver,
  #[derivative(Debug = "ignore")]
  pub(crate) input_options: SharedInputOptions,
}

impl Graph {
  pub(crate) fn new(
    build_plugin_driver: SharedBuildPluginDriver,
    input_options: SharedInputOptions,
  ) -> Self {
    Self {
      entries: Default::default(),
      module_by_id: Default::default(),
      build_plugin_driver,
      input_options,
    }
  }

  pub(crate) fn add_module(&mut self, module: NormOrExt) {
    debug_assert!(!self.module_by_id.contains_key(module.id()));
    self.module_by_id.insert(module.id().clone(), module);
  }

  pub fn module(&self, id: &ModuleId) -> Option<&NormOrExt> {
    self.module_by_id.get(id)
  }

  pub fn modules(&self) -> impl Iterator<Item = &NormOrExt> {
    self.module_by_id.values()
  }

  pub(crate) fn fetch_module(&self, id: &ModuleId) -> UnaryBuildResult<&NormOrExt> {
    self
      .module_by_id
      .get(id)
      .ok_or_else(|| CWD.set(&self.input_options.cwd, || BuildError::missing_module(id.id())))
  }

  #[tracing::instrument(skip_all)]
  pub(crate) async fn generate_module_graph(&mut self, resolver: SharedResolver) -> BuildResult<()> {
    let plugin_driver = self.build_plugin_driver.clone();
    let input_options = self.input_options.clone();
    ModuleLoader::new(self, resolver, plugin_driver, input_options)
      .fetch_all_modules()
      .await?;

    self.check_edges()?;
    self.sort_modules();

    tracing::debug!("{} modules in graph", self.module_by_id.len());
    Ok(())
  }

  /// Every edge target must have a node before chunking starts.
  fn check_edges(&self) -> UnaryBuildResult<()> {
    self.module_by_id.values().try_for_each(|module| {
      module
        .dependencies()
        .iter()
        .chain(module.dynamic_dependencies())
        .try_for_each(|dep| self.fetch_module(dep).map(|_| ()))
    })
  }

  /// Depth-first post-order from the entries. Dynamic imports are walked
  /// after every statically reachable module got its order.
  fn sort_modules(&mut self) {
    enum Action {
      Enter,
      Exit,
    }
    type Queue = Vec<(Action, ModuleId)>;

    let mut queue: Queue = self
      .entries
      .iter()
      .map(|(_, id)| (Action::Enter, id.clone()))
      .rev()
      .collect();

    let mut entered_ids: FxHashSet<ModuleId> = FxHashSet::default();
    let mut next_exec_order = 0;

    loop {
      let mut dynamic_entries: Queue = vec![];
      while let Some((action, id)) = queue.pop() {
        match action {
          Action::Enter => {
            let Some(module) = self.module_by_id.get(&id) else {
              continue;
            };
            if !entered_ids.contains(&id) {
              entered_ids.insert(id.clone());
              queue.push((Action::Exit, id.clone()));
              module
                .dependencies()
                .iter()
                .rev()
                // Early filter modules that are already entered
                .filter(|id| !entered_ids.contains(*id))
                .for_each(|dep| {
                  queue.push((Action::Enter, dep.clone()));
                });
              module
                .dynamic_dependencies()
                .iter()
                .filter(|id| !entered_ids.contains(*id))
                .for_each(|dep| {
                  dynamic_entries.push((Action::Enter, dep.clone()));
                });
            }
          }
          Action::Exit => {
            if let Some(module) = self.module_by_id.get_mut(&id) {
              module.set_exec_order(next_exec_order);
              next_exec_order += 1;
            }
          }
        }
      }
      if dynamic_entries.is_empty() {
        break;
      }
      dynamic_entries.reverse();
      queue = dynamic_entries;
    }
  }
}
