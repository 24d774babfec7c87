use std::{panic::AssertUnwindSafe, sync::Arc};

use futures::{future::join_all, FutureExt};
use rollpack_common::{ImportKind, ModuleId, ModuleType};
use rollpack_scanner::ScanResult;
use tokio::sync::Semaphore;
use tracing::instrument;

use super::Msg;
use crate::{
  normal_module::ModuleContent, resolve_id, BuildError, ImportRecord, NormalModule,
  SharedBuildPluginDriver, SharedInputOptions, SharedResolver, UnaryBuildResult,
};

pub(crate) struct ModuleTask {
  pub(crate) id: ModuleId,
  pub(crate) is_user_defined_entry: bool,
  pub(crate) tx: tokio::sync::mpsc::UnboundedSender<Msg>,
  pub(crate) input_options: SharedInputOptions,
  pub(crate) resolver: SharedResolver,
  pub(crate) plugin_driver: SharedBuildPluginDriver,
  pub(crate) semaphore: Arc<Semaphore>,
}

struct PendingImport {
  specifier: String,
  kind: ImportKind,
  chunk_name: Option<String>,
  prefetch: bool,
}

impl ModuleTask {
  #[instrument(skip_all)]
  pub(crate) async fn run(self) {
    let tx = self.tx.clone();
    let id = self.id.clone();
    let msg = match AssertUnwindSafe(self.run_inner()).catch_unwind().await {
      Ok(Ok(result)) => Msg::Scanned(result),
      Ok(Err(err)) => Msg::Error(err),
      Err(panic) => {
        let reason = panic
          .downcast_ref::<&str>()
          .map(|s| s.to_string())
          .or_else(|| panic.downcast_ref::<String>().cloned())
          .unwrap_or_default();
        Msg::Error(BuildError::panic(format!(
          "Task of {id} panicked: {reason}"
        )))
      }
    };
    // The loader is gone only when the build was dropped or already failed
    let _ = tx.send(msg);
  }

  async fn run_inner(self) -> UnaryBuildResult<TaskResult> {
    let _permit = self
      .semaphore
      .clone()
      .acquire_owned()
      .await
      .map_err(|e| BuildError::panic(e.to_string()))?;

    let path = self.id.as_path();
    let raw = self
      .input_options
      .fs
      .read(path)
      .map_err(|e| BuildError::read_file_failed(path, e))?;

    let transformed = self
      .input_options
      .pipeline
      .run(path, &raw, self.input_options.mode)?;
    let module_type = ModuleType::from_path(path);

    let code = self
      .plugin_driver
      .read()
      .await
      .after_transform(&self.id, module_type, transformed.code)
      .await?;
    let _ = self.tx.send(Msg::Transformed(self.id.clone()));

    let (scanned, rendered) = scan_module(&self.id, &code)?;

    let pending = scanned
      .imports
      .into_iter()
      .map(|import| PendingImport {
        specifier: import.specifier,
        kind: import.kind,
        chunk_name: import.chunk_name,
        prefetch: import.prefetch,
      })
      .chain(transformed.dependencies.into_iter().map(|specifier| PendingImport {
        specifier,
        kind: ImportKind::Asset,
        chunk_name: None,
        prefetch: false,
      }))
      .collect::<Vec<_>>();

    let import_records = join_all(pending.into_iter().map(|import| {
      let resolver = self.resolver.clone();
      let plugin_driver = self.plugin_driver.clone();
      let input_options = self.input_options.clone();
      let importer = self.id.clone();
      async move {
        resolve_id(
          &resolver,
          &input_options,
          &plugin_driver,
          Some(&importer),
          &import.specifier,
        )
        .await
        .map(|resolved| ImportRecord {
          specifier: import.specifier,
          resolved,
          kind: import.kind,
          chunk_name: import.chunk_name,
          prefetch: import.prefetch,
        })
      }
    }))
    .await
    .into_iter()
    .collect::<UnaryBuildResult<Vec<_>>>()?;

    Ok(TaskResult {
      module: NormalModule::new(
        self.id,
        module_type,
        self.is_user_defined_entry,
        ModuleContent {
          code,
          rendered,
          import_records,
          emitted_files: transformed.emitted_files,
          asset_url: transformed.asset_url,
          extracted_css: transformed.extracted_css,
        },
      ),
    })
  }
}

/// Import specifiers and the CommonJS form of the module. The parsed tree is
/// not `Send`, so it must not live across an `.await`.
fn scan_module(id: &ModuleId, code: &str) -> UnaryBuildResult<(ScanResult, String)> {
  let parsed = rollpack_scanner::parse(id.as_path(), code.to_string())?;
  let scanned = rollpack_scanner::scan(&parsed);
  let rendered = rollpack_scanner::to_cjs(parsed).map_err(|err| err.context(id.to_string()))?;
  Ok((scanned, rendered))
}

#[derive(Debug)]
pub(crate) struct TaskResult {
  pub module: NormalModule,
}
