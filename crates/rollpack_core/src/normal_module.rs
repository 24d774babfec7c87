use rollpack_common::{content_hash, ImportKind, ModuleId, ModuleType, OutputAsset};
use rollpack_loader::builtins::CssPart;

/// Lifecycle of a module inside the module loader. A module only moves
/// forward, and reaches `Done` exactly once.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ModuleState {
  Unresolved,
  Resolving,
  Transformed,
  Scanned,
  Done,
}

#[derive(Debug, Clone)]
pub struct ImportRecord {
  pub specifier: String,
  pub resolved: ModuleId,
  pub kind: ImportKind,
  /// Requested chunk name of a dynamic import.
  pub chunk_name: Option<String>,
  pub prefetch: bool,
}

#[derive(Debug)]
pub struct NormalModule {
  pub id: ModuleId,
  pub module_type: ModuleType,
  pub exec_order: usize,
  pub state: ModuleState,
  pub is_user_defined_entry: bool,
  pub is_dynamic_entry: bool,
  /// Output of the loader chain and the `after_transform` hooks.
  pub code: String,
  /// `code` as the body of a module wrapper, the way chunks embed it.
  pub rendered: String,
  /// Sha256 of `code`.
  pub content_hash: String,
  pub import_records: Vec<ImportRecord>,
  /// Files emitted by loaders while transforming this module.
  pub emitted_files: Vec<OutputAsset>,
  /// Public URL of the file this module stands for, if a loader emitted one.
  pub asset_url: Option<String>,
  /// Stylesheet moved out of the module into its chunk's CSS file.
  pub extracted_css: Option<Vec<CssPart>>,
  pub(crate) dependencies: Vec<ModuleId>,
  pub(crate) dyn_dependencies: Vec<ModuleId>,
}

/// What the module task produced for one module.
#[derive(Debug, Default)]
pub(crate) struct ModuleContent {
  pub code: String,
  pub rendered: String,
  pub import_records: Vec<ImportRecord>,
  pub emitted_files: Vec<OutputAsset>,
  pub asset_url: Option<String>,
  pub extracted_css: Option<Vec<CssPart>>,
}

impl NormalModule {
  pub(crate) fn new(
    id: ModuleId,
    module_type: ModuleType,
    is_user_defined_entry: bool,
    content: ModuleContent,
  ) -> Self {
    let ModuleContent {
      code,
      rendered,
      import_records,
      emitted_files,
      asset_url,
      extracted_css,
    } = content;
    let mut dependencies = vec![];
    let mut dyn_dependencies = vec![];
    import_records.iter().for_each(|rec| {
      let deps = if rec.kind.is_dynamic() {
        &mut dyn_dependencies
      } else {
        &mut dependencies
      };
      if !deps.contains(&rec.resolved) {
        deps.push(rec.resolved.clone());
      }
    });
    Self {
      id,
      module_type,
      exec_order: usize::MAX,
      state: ModuleState::Scanned,
      is_user_defined_entry,
      is_dynamic_entry: false,
      content_hash: content_hash(&code),
      code,
      rendered,
      import_records,
      emitted_files,
      asset_url,
      extracted_css,
      dependencies,
      dyn_dependencies,
    }
  }

  pub fn size(&self) -> usize {
    self.rendered.len()
  }
}
