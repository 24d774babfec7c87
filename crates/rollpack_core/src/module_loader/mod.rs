use std::sync::Arc;

use futures::future::join_all;
use rollpack_common::{ModuleId, CWD};
use rollpack_error::Errors;
use rustc_hash::{FxHashMap, FxHashSet};
use tokio::{sync::Semaphore, task::AbortHandle};

pub(crate) mod module_task;

use module_task::{ModuleTask, TaskResult};

use crate::{
  resolve_id, BuildError, BuildResult, ExternalModule, Graph, ModuleState, NormOrExt,
  SharedBuildPluginDriver, SharedInputOptions, SharedResolver, UnaryBuildResult,
};

pub(crate) struct ModuleLoader<'a> {
  input_options: SharedInputOptions,
  graph: &'a mut Graph,
  build_plugin_driver: SharedBuildPluginDriver,
  /// Every module id ever seen. The loop is the only writer, so an id gets
  /// exactly one task.
  module_states: FxHashMap<ModuleId, ModuleState>,
  remaining_tasks: usize,
  tx: tokio::sync::mpsc::UnboundedSender<Msg>,
  rx: tokio::sync::mpsc::UnboundedReceiver<Msg>,
  resolver: SharedResolver,
  errors: Vec<BuildError>,
  dynamic_imported_modules: FxHashSet<ModuleId>,
  semaphore: Arc<Semaphore>,
  abort_handles: Vec<AbortHandle>,
}

#[derive(Debug)]
pub(crate) enum Msg {
  Transformed(ModuleId),
  Scanned(TaskResult),
  Error(BuildError),
}

impl<'a> ModuleLoader<'a> {
  pub(crate) fn new(
    graph: &'a mut Graph,
    resolver: SharedResolver,
    plugin_driver: SharedBuildPluginDriver,
    input_options: SharedInputOptions,
  ) -> Self {
    let (tx, rx) = tokio::sync::mpsc::unbounded_channel::<Msg>();
    let semaphore = Arc::new(Semaphore::new(input_options.concurrency()));
    Self {
      graph,
      module_states: Default::default(),
      remaining_tasks: 0,
      tx,
      rx,
      resolver,
      errors: Default::default(),
      build_plugin_driver: plugin_driver,
      dynamic_imported_modules: Default::default(),
      input_options,
      semaphore,
      abort_handles: Default::default(),
    }
  }

  async fn resolve_entries(&self) -> Vec<UnaryBuildResult<ModuleId>> {
    let resolver = &self.resolver;
    let input_options = &self.input_options;
    let plugin_driver = &self.build_plugin_driver;
    join_all(input_options.input.iter().map(|item| async move {
      let id = resolve_id(resolver, input_options, plugin_driver, None, &item.import).await?;

      if id.is_external() {
        return CWD.set(&input_options.cwd, || {
          Err(BuildError::entry_cannot_be_external(id.id()))
        });
      }
      UnaryBuildResult::Ok(id)
    }))
    .await
  }

  pub(crate) async fn fetch_all_modules(mut self) -> BuildResult<()> {
    if self.input_options.input.is_empty() {
      return Err(BuildError::invalid_config("You must supply at least one entry").into());
    }

    let resolved_entries = self.resolve_entries().await;

    let mut entry_errors = vec![];
    let entries = self.input_options.input.clone();
    entries
      .into_iter()
      .zip(resolved_entries)
      .for_each(|(item, resolved)| match resolved {
        Ok(id) => {
          self.graph.entries.push((item.name, id.clone()));
          if !self.module_states.contains_key(&id) {
            self.spawn_new_module_task(id, true);
          }
        }
        Err(err) => entry_errors.push(err),
      });
    if let Some(errors) = Errors::from_vec(entry_errors) {
      return Err(errors);
    }

    while self.remaining_tasks > 0 {
      let Some(msg) = self.rx.recv().await else {
        break;
      };
      match msg {
        Msg::Transformed(id) => {
          self.advance(&id, ModuleState::Transformed);
        }
        Msg::Scanned(res) => {
          tracing::trace!("finish: {}", res.module.id);
          self.remaining_tasks -= 1;
          self.handle_msg_scanned(res);
        }
        Msg::Error(err) => {
          self.remaining_tasks -= 1;
          self.errors.push(err);
          // A single failure fails the build, don't wait for the others
          break;
        }
      }
      tracing::trace!("remaining: {}", self.remaining_tasks);
    }

    if !self.errors.is_empty() {
      self.abort_all();
      // Failures that raced with the first one are reported as well
      while let Ok(msg) = self.rx.try_recv() {
        if let Msg::Error(err) = msg {
          self.errors.push(err);
        }
      }
      let errors = std::mem::take(&mut self.errors);
      return Err(Errors::from_vec(errors).unwrap_or_else(|| {
        Errors::new(BuildError::panic("Module loading failed".to_string()))
      }));
    }

    self.mark_dynamic_imported_module();
    Ok(())
  }

  fn advance(&mut self, id: &ModuleId, next: ModuleState) {
    let state = self
      .module_states
      .entry(id.clone())
      .or_insert(ModuleState::Unresolved);
    debug_assert!(*state < next, "{id}: {state:?} -> {next:?}");
    *state = next;
  }

  fn mark_dynamic_imported_module(&mut self) {
    self.dynamic_imported_modules.iter().for_each(|id| {
      if let Some(module) = self
        .graph
        .module_by_id
        .get_mut(id)
        .and_then(NormOrExt::as_norm_mut)
      {
        module.is_dynamic_entry = true;
      }
    });
  }

  fn spawn_new_module_task(&mut self, module_id: ModuleId, is_user_defined_entry: bool) {
    tracing::trace!("spawning new job for {}", module_id);
    self.advance(&module_id, ModuleState::Resolving);
    self.remaining_tasks += 1;
    let task = ModuleTask {
      id: module_id,
      is_user_defined_entry,
      tx: self.tx.clone(),
      input_options: self.input_options.clone(),
      resolver: self.resolver.clone(),
      plugin_driver: self.build_plugin_driver.clone(),
      semaphore: self.semaphore.clone(),
    };
    let handle = tokio::spawn(task.run());
    self.abort_handles.push(handle.abort_handle());
  }

  fn handle_msg_scanned(&mut self, result: TaskResult) {
    let TaskResult { mut module } = result;
    self.advance(&module.id, ModuleState::Scanned);

    module.import_records.iter().for_each(|rec| {
      let id = &rec.resolved;
      if rec.kind.is_dynamic() && !id.is_external() {
        self.dynamic_imported_modules.insert(id.clone());
      }
      if self.module_states.contains_key(id) {
        return;
      }
      if id.is_external() {
        self.advance(id, ModuleState::Done);
        let global = self
          .input_options
          .externals
          .get(id.id())
          .cloned()
          .unwrap_or_else(|| id.id().to_string());
        self
          .graph
          .add_module(NormOrExt::External(ExternalModule::new(id.clone(), global)));
      } else {
        self.spawn_new_module_task(id.clone(), false);
      }
    });

    // Every target now has a node or a running task
    self.advance(&module.id, ModuleState::Done);
    module.state = ModuleState::Done;
    self.graph.add_module(NormOrExt::Normal(module));
  }

  fn abort_all(&mut self) {
    self.abort_handles.drain(..).for_each(|handle| handle.abort());
  }
}

impl Drop for ModuleLoader<'_> {
  fn drop(&mut self) {
    self.abort_all();
  }
}
