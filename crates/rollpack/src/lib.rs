mod bundler;
pub mod config;
pub use {
  bundler::Bundler,
  config::{ResolvedConfig, RollpackConfig, DEFAULT_CONFIG_FILE},
  rollpack_common::{
    BundleOutput, ChunkKind, FileNameTemplate, Mode, OutputAsset, OutputChunk, OutputEntrypoint,
  },
  rollpack_core::{
    BuildError, BuildResult, CacheGroup, ChunksFilter, InputItem, InputOptions, OutputOptions,
    RuntimeChunk, SplitChunksOptions, WarningHandler,
  },
  rollpack_error::{Error, ErrorCategory, ErrorKind, Errors},
  rollpack_fs::{FileSystem, MemoryFileSystem, OsFileSystem, SharedFileSystem},
  rollpack_loader::{
    Condition, Enforce, Loader, LoaderContext, LoaderRegistry, Rule, RuleCondition,
    TransformPipeline,
  },
  rollpack_plugin::BuildPlugin,
  rollpack_plugin_html::{HtmlPlugin, HtmlPluginOptions},
  rollpack_resolver::ResolveOptions,
};
