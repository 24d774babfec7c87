use std::{
  fmt::Display,
  path::{Path, PathBuf},
};

use crate::utils::{format_quoted_strings, PathExt};
use crate::CWD;

pub mod error_code;

/// The four failure families of a build. All of them are fatal for the
/// current build invocation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
  Resolution,
  Transform,
  Graph,
  Chunking,
}

#[derive(Debug)]
pub enum ErrorKind {
  // --- Resolution
  UnresolvedEntry {
    unresolved_id: PathBuf,
  },
  UnresolvedImport {
    specifier: String,
    importer: PathBuf,
  },

  // --- Transform
  TransformFailed {
    path: PathBuf,
    loader: String,
    reason: String,
  },
  ParseFailed {
    path: PathBuf,
    reason: String,
  },

  // --- Graph
  ExternalEntry {
    id: PathBuf,
  },
  MissingModule {
    id: PathBuf,
  },
  InvalidConfig(String),

  // --- Chunking
  OrphanedModule {
    id: PathBuf,
  },
  ChunkNameConflict {
    file_name: String,
    chunks: Vec<String>,
  },
  /// Reported as a warning, never fails a build.
  AssetTooLarge {
    file_name: String,
    size: usize,
    limit: usize,
  },

  /// This error means that rollpack panics because unrecoverable error happens.
  ///
  /// We also use this to replace `panic!()` in the code for graceful shutdown.
  /// But this is not recommended.
  Panic {
    source: anyhow::Error,
  },

  // --- Custom
  ReadFileFailed {
    path: PathBuf,
    source: std::io::Error,
  },
  IoError(std::io::Error),
}

impl Display for ErrorKind {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    match self {
      ErrorKind::UnresolvedEntry { unresolved_id } => write!(f, "Could not resolve entry module \"{}\".", unresolved_id.may_display_relative()),
      ErrorKind::UnresolvedImport { specifier, importer } => write!(f, "Could not resolve \"{specifier}\" from \"{}\".", importer.may_display_relative()),
      ErrorKind::TransformFailed { path, loader, reason } => write!(f, "Loader \"{loader}\" failed to transform \"{}\": {reason}", path.may_display_relative()),
      ErrorKind::ParseFailed { path, reason } => write!(f, "Parse failed: \"{}\": {reason}", path.may_display_relative()),
      ErrorKind::ExternalEntry { id } => write!(f, "Entry module \"{}\" cannot be external.", id.may_display_relative()),
      ErrorKind::MissingModule { id } => write!(f, "Module \"{}\" is referenced but missing from the module graph.", id.may_display_relative()),
      ErrorKind::InvalidConfig(reason) => write!(f, "Invalid configuration: {reason}"),
      ErrorKind::OrphanedModule { id } => write!(f, "Module \"{}\" does not belong to any chunk.", id.may_display_relative()),
      ErrorKind::ChunkNameConflict { file_name, chunks } => write!(f, "Chunks {} are emitted to the same file \"{file_name}\".", format_quoted_strings(chunks)),
      ErrorKind::AssetTooLarge { file_name, size, limit } => write!(f, "\"{file_name}\" ({} KiB) exceeds the recommended size limit ({} KiB).", size / 1024, limit / 1024),
      ErrorKind::Panic { source } => source.fmt(f),
      ErrorKind::ReadFileFailed { path, source } => write!(f, "Read file failed: \"{}\": {source}", path.may_display_relative()),
      ErrorKind::IoError(e) => e.fmt(f),
    }
  }
}

impl ErrorKind {
  /// Shorten the file paths in messages by make them relative to CWD.
  pub fn to_readable_string(&self, cwd: impl AsRef<Path>) -> String {
    let cwd = cwd.as_ref().to_path_buf();
    CWD.set(&cwd, || self.to_string())
  }

  pub fn category(&self) -> ErrorCategory {
    match self {
      ErrorKind::UnresolvedEntry { .. } | ErrorKind::UnresolvedImport { .. } => {
        ErrorCategory::Resolution
      }
      ErrorKind::TransformFailed { .. }
      | ErrorKind::ParseFailed { .. }
      | ErrorKind::ReadFileFailed { .. } => ErrorCategory::Transform,
      ErrorKind::OrphanedModule { .. }
      | ErrorKind::ChunkNameConflict { .. }
      | ErrorKind::AssetTooLarge { .. } => ErrorCategory::Chunking,
      ErrorKind::ExternalEntry { .. }
      | ErrorKind::MissingModule { .. }
      | ErrorKind::InvalidConfig(_)
      | ErrorKind::Panic { .. }
      | ErrorKind::IoError(_) => ErrorCategory::Graph,
    }
  }

  pub fn code(&self) -> &'static str {
    match self {
      ErrorKind::UnresolvedEntry { .. } => error_code::UNRESOLVED_ENTRY,
      ErrorKind::UnresolvedImport { .. } => error_code::UNRESOLVED_IMPORT,
      ErrorKind::TransformFailed { .. } => error_code::TRANSFORM_FAILED,
      ErrorKind::ParseFailed { .. } => error_code::PARSE_FAILED,
      ErrorKind::ExternalEntry { .. } => error_code::UNRESOLVED_ENTRY,
      ErrorKind::MissingModule { .. } => error_code::MISSING_MODULE,
      ErrorKind::InvalidConfig(_) => error_code::INVALID_CONFIG,
      ErrorKind::OrphanedModule { .. } => error_code::ORPHANED_MODULE,
      ErrorKind::ChunkNameConflict { .. } => error_code::CHUNK_NAME_CONFLICT,
      ErrorKind::AssetTooLarge { .. } => error_code::ASSET_TOO_LARGE,
      ErrorKind::Panic { .. } => error_code::PANIC,
      ErrorKind::ReadFileFailed { .. } => error_code::READ_FILE_FAILED,
      ErrorKind::IoError(_) => error_code::IO_ERROR,
    }
  }
}
