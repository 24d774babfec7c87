use regex::Regex;
use rollpack_common::ChunkKind;

/// Which chunks a cache group is allowed to pull modules out of.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ChunksFilter {
  All,
  #[default]
  Async,
  Initial,
}

impl ChunksFilter {
  pub fn accepts(self, kind: ChunkKind) -> bool {
    match self {
      ChunksFilter::All => true,
      ChunksFilter::Async => kind == ChunkKind::Async,
      ChunksFilter::Initial => kind.is_initial(),
    }
  }
}

impl std::str::FromStr for ChunksFilter {
  type Err = String;

  fn from_str(s: &str) -> Result<Self, Self::Err> {
    match s {
      "all" => Ok(Self::All),
      "async" => Ok(Self::Async),
      "initial" => Ok(Self::Initial),
      _ => Err(format!("Invalid chunks filter: {s}")),
    }
  }
}

#[derive(Debug, Clone)]
pub struct CacheGroup {
  /// Key of the group, used in generated chunk names.
  pub key: String,
  /// Fixed name of the extracted chunk. Every module of the group ends up in
  /// it regardless of the chunks it came from.
  pub name: Option<String>,
  /// Matched against the absolute path of a module. `None` matches all.
  pub test: Option<Regex>,
  pub priority: i32,
  /// Falls back to `SplitChunksOptions::chunks`.
  pub chunks: Option<ChunksFilter>,
  /// Falls back to `SplitChunksOptions::min_chunks`.
  pub min_chunks: Option<usize>,
  /// Falls back to `SplitChunksOptions::min_size`.
  pub min_size: Option<usize>,
  pub reuse_existing_chunk: bool,
  /// Ignore `min_size` and the request limits.
  pub enforce: bool,
}

impl CacheGroup {
  pub fn new(key: impl Into<String>) -> Self {
    Self {
      key: key.into(),
      name: None,
      test: None,
      priority: 0,
      chunks: None,
      min_chunks: None,
      min_size: None,
      reuse_existing_chunk: false,
      enforce: false,
    }
  }

  pub fn vendors() -> Self {
    Self {
      test: Regex::new(r"[\\/]node_modules[\\/]").ok(),
      priority: -10,
      ..Self::new("vendors")
    }
  }

  pub fn default_group() -> Self {
    Self {
      min_chunks: Some(2),
      priority: -20,
      reuse_existing_chunk: true,
      ..Self::new("default")
    }
  }

  pub(crate) fn matches(&self, path: &str) -> bool {
    self.test.as_ref().map_or(true, |test| test.is_match(path))
  }
}

#[derive(Debug, Clone)]
pub struct SplitChunksOptions {
  pub chunks: ChunksFilter,
  /// Minimal size in bytes of an extracted chunk.
  pub min_size: usize,
  pub min_chunks: usize,
  pub max_async_requests: usize,
  pub max_initial_requests: usize,
  pub automatic_name_delimiter: String,
  /// Later groups lose ties on `priority`.
  pub cache_groups: Vec<CacheGroup>,
}

impl SplitChunksOptions {
  /// No extraction at all.
  pub fn disabled() -> Self {
    Self {
      cache_groups: vec![],
      ..Default::default()
    }
  }
}

impl Default for SplitChunksOptions {
  fn default() -> Self {
    Self {
      chunks: ChunksFilter::Async,
      min_size: 30 * 1024,
      min_chunks: 1,
      max_async_requests: 5,
      max_initial_requests: 3,
      automatic_name_delimiter: "~".to_string(),
      cache_groups: vec![CacheGroup::vendors(), CacheGroup::default_group()],
    }
  }
}
