use std::{
  fmt::Display,
  path::{Path, PathBuf},
};

use crate::ErrorKind;

#[derive(Debug)]
pub struct Error {
  contexts: Vec<String>,
  pub kind: ErrorKind,
}

impl PartialEq for Error {
  fn eq(&self, other: &Self) -> bool {
    self.kind.to_string().eq(&other.kind.to_string())
  }
}

impl Eq for Error {}

impl PartialOrd for Error {
  fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
    Some(self.cmp(other))
  }
}

impl Ord for Error {
  fn cmp(&self, other: &Self) -> std::cmp::Ordering {
    self.kind.to_string().cmp(&other.kind.to_string())
  }
}

impl Error {
  fn with_kind(kind: ErrorKind) -> Self {
    Self {
      contexts: vec![],
      kind,
    }
  }

  pub fn context(mut self, context: String) -> Self {
    self.contexts.push(context);
    self
  }

  // --- Resolution

  pub fn unresolved_entry(unresolved_id: impl AsRef<Path>) -> Self {
    Self::with_kind(ErrorKind::UnresolvedEntry {
      unresolved_id: unresolved_id.as_ref().to_path_buf(),
    })
  }

  pub fn unresolved_import(specifier: impl Into<String>, importer: impl AsRef<Path>) -> Self {
    Self::with_kind(ErrorKind::UnresolvedImport {
      specifier: specifier.into(),
      importer: importer.as_ref().to_path_buf(),
    })
  }

  // --- Transform

  pub fn transform_failed(
    path: impl AsRef<Path>,
    loader: impl Into<String>,
    reason: impl Into<String>,
  ) -> Self {
    Self::with_kind(ErrorKind::TransformFailed {
      path: path.as_ref().to_path_buf(),
      loader: loader.into(),
      reason: reason.into(),
    })
  }

  pub fn parse_failed(path: impl AsRef<Path>, reason: impl Into<String>) -> Self {
    Self::with_kind(ErrorKind::ParseFailed {
      path: path.as_ref().to_path_buf(),
      reason: reason.into(),
    })
  }

  // --- Graph

  pub fn entry_cannot_be_external(unresolved_id: impl AsRef<Path>) -> Self {
    Self::with_kind(ErrorKind::ExternalEntry {
      id: unresolved_id.as_ref().to_path_buf(),
    })
  }

  pub fn missing_module(id: impl AsRef<Path>) -> Self {
    Self::with_kind(ErrorKind::MissingModule {
      id: id.as_ref().to_path_buf(),
    })
  }

  pub fn invalid_config(reason: impl Into<String>) -> Self {
    Self::with_kind(ErrorKind::InvalidConfig(reason.into()))
  }

  // --- Chunking

  pub fn orphaned_module(id: impl AsRef<Path>) -> Self {
    Self::with_kind(ErrorKind::OrphanedModule {
      id: id.as_ref().to_path_buf(),
    })
  }

  pub fn chunk_name_conflict(file_name: String, chunks: Vec<String>) -> Self {
    Self::with_kind(ErrorKind::ChunkNameConflict { file_name, chunks })
  }

  pub fn asset_too_large(file_name: impl Into<String>, size: usize, limit: usize) -> Self {
    Self::with_kind(ErrorKind::AssetTooLarge {
      file_name: file_name.into(),
      size,
      limit,
    })
  }

  // --- Others

  pub fn io_error(e: std::io::Error) -> Self {
    Self::with_kind(ErrorKind::IoError(e))
  }

  pub fn read_file_failed(path: impl AsRef<Path>, source: std::io::Error) -> Self {
    Self::with_kind(ErrorKind::ReadFileFailed {
      path: PathBuf::from(path.as_ref()),
      source,
    })
  }

  pub fn panic(msg: String) -> Self {
    anyhow::format_err!(msg).into()
  }
}

impl std::convert::From<anyhow::Error> for Error {
  fn from(value: anyhow::Error) -> Self {
    Self::with_kind(ErrorKind::Panic { source: value })
  }
}

impl std::error::Error for Error {
  fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
    match &self.kind {
      ErrorKind::Panic { source, .. } => Some(source.as_ref()),
      ErrorKind::IoError(e) => Some(e),
      ErrorKind::ReadFileFailed { source, .. } => Some(source),
      _ => None,
    }
  }
}

impl Display for Error {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    for ctx in self.contexts.iter().rev() {
      writeln!(f, "{}: {}", ansi_term::Color::Yellow.paint("context"), ctx)?;
    }

    self.kind.fmt(f)
  }
}
