use std::fmt::Display;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ChunkKind {
  /// Seeded by a user defined entry.
  Entry,
  /// Seeded by a dynamic `import()`.
  Async,
  /// Extracted by a cache group.
  Shared,
  /// Holds only the chunk loading bookkeeping.
  Runtime,
}

impl ChunkKind {
  pub fn is_initial(self) -> bool {
    matches!(self, ChunkKind::Entry | ChunkKind::Runtime)
  }
}

impl Display for ChunkKind {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    f.write_str(match self {
      ChunkKind::Entry => "entry",
      ChunkKind::Async => "async",
      ChunkKind::Shared => "shared",
      ChunkKind::Runtime => "runtime",
    })
  }
}

#[derive(Debug, Clone)]
pub struct OutputChunk {
  pub name: String,
  pub file_name: String,
  pub kind: ChunkKind,
  /// Stable keys of the modules, in execution order.
  pub modules: Vec<String>,
  pub content_hash: String,
  pub code: String,
  /// Stylesheet extracted from the chunk's modules, emitted as an asset.
  pub css_file: Option<String>,
}

#[derive(Debug, Clone)]
pub struct OutputAsset {
  pub file_name: String,
  pub source: Vec<u8>,
}

impl OutputAsset {
  pub fn new(file_name: impl Into<String>, source: impl Into<Vec<u8>>) -> Self {
    Self {
      file_name: file_name.into(),
      source: source.into(),
    }
  }
}

/// The initial files of a user defined entry, in load order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutputEntrypoint {
  pub name: String,
  pub files: Vec<String>,
  /// Extracted stylesheets of the initial chunks, in load order.
  pub styles: Vec<String>,
}

#[derive(Debug, Clone, Default)]
pub struct BundleOutput {
  pub chunks: Vec<OutputChunk>,
  pub assets: Vec<OutputAsset>,
  /// In declaration order.
  pub entrypoints: Vec<OutputEntrypoint>,
}

impl BundleOutput {
  pub fn chunk_by_name(&self, name: &str) -> Option<&OutputChunk> {
    self.chunks.iter().find(|c| c.name == name)
  }

  pub fn entrypoint(&self, name: &str) -> Option<&OutputEntrypoint> {
    self.entrypoints.iter().find(|e| e.name == name)
  }

  pub fn asset_by_file_name(&self, file_name: &str) -> Option<&OutputAsset> {
    self.assets.iter().find(|a| a.file_name == file_name)
  }

  /// Every emitted file as `(file_name, content)`.
  pub fn files(&self) -> impl Iterator<Item = (&str, &[u8])> {
    self
      .chunks
      .iter()
      .map(|c| (c.file_name.as_str(), c.code.as_bytes()))
      .chain(
        self
          .assets
          .iter()
          .map(|a| (a.file_name.as_str(), a.source.as_slice())),
      )
  }
}
