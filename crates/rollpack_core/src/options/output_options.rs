use rollpack_common::{FileNameTemplate, Mode};

use crate::SplitChunksOptions;

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum RuntimeChunk {
  /// Every entry chunk carries its own copy of the runtime.
  #[default]
  Disabled,
  /// One runtime chunk shared by every entry.
  Single { name: String },
  /// One runtime chunk per entry. `[name]` in the template is the entry name.
  PerEntry { name: FileNameTemplate },
}

impl RuntimeChunk {
  pub fn single() -> Self {
    Self::Single {
      name: "runtime".to_string(),
    }
  }

  pub fn per_entry() -> Self {
    Self::PerEntry {
      name: FileNameTemplate::new("runtime~[name]"),
    }
  }

  pub fn is_enabled(&self) -> bool {
    !matches!(self, Self::Disabled)
  }
}

#[derive(Debug, Clone)]
pub struct OutputOptions {
  pub dir: Option<String>,
  pub entry_file_names: FileNameTemplate,
  pub chunk_file_names: FileNameTemplate,
  /// Names the stylesheet extracted from a chunk. `[name]` is the chunk name,
  /// `[contenthash]` hashes the stylesheet.
  pub css_file_names: FileNameTemplate,
  /// Prefix of chunk URLs used by the runtime when loading async chunks.
  pub public_path: String,
  pub split_chunks: SplitChunksOptions,
  pub runtime_chunk: RuntimeChunk,
  /// `None` follows the mode: on in production.
  pub minimize: Option<bool>,
  /// File name of the manifest, not emitted when `None`.
  pub manifest: Option<String>,
  /// Emitted files above this many bytes are reported through `on_warn`.
  /// `None` follows the mode: [DEFAULT_MAX_ASSET_SIZE] in production,
  /// unchecked in development.
  pub max_asset_size: Option<usize>,
}

pub const DEFAULT_MAX_ASSET_SIZE: usize = 250_000;

impl OutputOptions {
  pub(crate) fn max_asset_size(&self, mode: Mode) -> Option<usize> {
    self
      .max_asset_size
      .or_else(|| mode.is_production().then_some(DEFAULT_MAX_ASSET_SIZE))
  }
}

impl Default for OutputOptions {
  fn default() -> Self {
    Self {
      dir: None,
      entry_file_names: FileNameTemplate::from("[name].js"),
      chunk_file_names: FileNameTemplate::from("[name].js"),
      css_file_names: FileNameTemplate::from("[name].css"),
      public_path: String::new(),
      split_chunks: Default::default(),
      runtime_chunk: Default::default(),
      minimize: None,
      manifest: None,
      max_asset_size: None,
    }
  }
}
