use std::borrow::Cow;
use std::fmt::Display;
use std::path::{Path, PathBuf};
use std::sync::Arc;

mod module_type;
pub use module_type::*;
mod mode;
pub use mode::*;
mod output;
pub use output::*;
mod file_name;
pub use file_name::*;

scoped_tls::scoped_thread_local!(pub static CWD: PathBuf);

#[derive(Debug, Hash, PartialEq, Eq, PartialOrd, Ord, Clone)]
pub struct ChunkId(Arc<str>);

impl ChunkId {
  pub fn new(value: impl Into<Arc<str>>) -> Self {
    Self(value.into())
  }

  pub fn value(&self) -> &str {
    &self.0
  }
}

impl From<String> for ChunkId {
  fn from(value: String) -> Self {
    Self(value.into())
  }
}

impl From<&str> for ChunkId {
  fn from(value: &str) -> Self {
    Self(value.into())
  }
}

impl AsRef<str> for ChunkId {
  fn as_ref(&self) -> &str {
    &self.0
  }
}

impl Display for ChunkId {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    f.write_str(&self.0)
  }
}

/// Identity of a module in the graph.
///
/// For normal modules the value is the resolved absolute path. For external
/// modules it is the specifier as written by the importer.
#[derive(Debug, Hash, PartialEq, Eq, PartialOrd, Ord, Clone)]
pub struct ModuleId {
  value: Arc<str>,
  is_external: bool,
}

impl Display for ModuleId {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    write!(f, "{}", self.value)
  }
}

impl ModuleId {
  pub fn new(value: impl Into<Arc<str>>, is_external: bool) -> Self {
    Self {
      value: value.into(),
      is_external,
    }
  }

  pub fn is_external(&self) -> bool {
    self.is_external
  }

  pub fn id(&self) -> &str {
    &self.value
  }

  pub fn as_path(&self) -> &Path {
    Path::new(&*self.value)
  }

  /// Forward-slash path relative to `root`. Used as the stable key of the
  /// module inside rendered chunks.
  pub fn stable_key(&self, root: &Path) -> String {
    use sugar_path::SugarPath;
    if self.is_external {
      return format!("external:{}", self.value);
    }
    self.as_path().relative(root).to_slash_lossy().into_owned()
  }
}

impl AsRef<str> for ModuleId {
  fn as_ref(&self) -> &str {
    &self.value
  }
}

/// How an import edge was written in the importer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ImportKind {
  /// `import x from './x'`, `export * from './x'`
  Import,
  /// `require('./x')`
  Require,
  /// `import('./x')`. A split point.
  DynamicImport,
  /// Declared by a loader, e.g. `url(./a.png)` in a stylesheet.
  Asset,
}

impl ImportKind {
  pub fn is_dynamic(&self) -> bool {
    matches!(self, ImportKind::DynamicImport)
  }

  pub fn is_static(&self) -> bool {
    !self.is_dynamic()
  }
}

pub type StaticStr = Cow<'static, str>;
