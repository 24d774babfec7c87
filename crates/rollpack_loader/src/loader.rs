use std::{fmt::Debug, path::Path};

use rollpack_common::{FileNameTemplate, Mode, OutputAsset};

use crate::builtins::CssPart;

/// One transform step. Receives the output of the previous step.
///
/// Loaders are synchronous and CPU bound, they run inside the module task that
/// owns the file.
pub trait Loader: Debug + Send + Sync {
  fn name(&self) -> &str;

  fn run(&self, ctx: &mut LoaderContext, source: String) -> anyhow::Result<String>;
}

/// What a loader can see and declare besides its input string.
#[derive(Debug)]
pub struct LoaderContext<'a> {
  resource_path: &'a Path,
  raw: &'a [u8],
  mode: Mode,
  asset_file_names: Option<&'a FileNameTemplate>,
  pub(crate) dependencies: Vec<String>,
  pub(crate) emitted_files: Vec<OutputAsset>,
  pub(crate) asset_url: Option<String>,
  /// Stylesheet parsed by `css-loader`, for the loaders that run after it.
  pub(crate) css: Option<Vec<CssPart>>,
  pub(crate) extracted_css: Option<Vec<CssPart>>,
}

impl<'a> LoaderContext<'a> {
  pub fn new(resource_path: &'a Path, raw: &'a [u8], mode: Mode) -> Self {
    Self {
      resource_path,
      raw,
      mode,
      asset_file_names: None,
      dependencies: vec![],
      emitted_files: vec![],
      asset_url: None,
      css: None,
      extracted_css: None,
    }
  }

  /// Template for the files emitted by loaders that do not name them
  /// themselves.
  pub fn with_asset_file_names(mut self, template: Option<&'a FileNameTemplate>) -> Self {
    self.asset_file_names = template;
    self
  }

  pub fn asset_file_names(&self) -> Option<&FileNameTemplate> {
    self.asset_file_names
  }

  pub fn resource_path(&self) -> &Path {
    self.resource_path
  }

  /// Untouched bytes of the file, for loaders that deal with binary assets.
  pub fn raw(&self) -> &[u8] {
    self.raw
  }

  pub fn mode(&self) -> Mode {
    self.mode
  }

  /// Declare that the module depends on `specifier`, resolved relative to the
  /// module like any other import.
  pub fn add_dependency(&mut self, specifier: impl Into<String>) {
    let specifier = specifier.into();
    if !self.dependencies.contains(&specifier) {
      self.dependencies.push(specifier);
    }
  }

  /// Emit an extra file to the output directory.
  pub fn emit_file(&mut self, file_name: impl Into<String>, source: impl Into<Vec<u8>>) {
    self.emitted_files.push(OutputAsset::new(file_name, source));
  }

  pub fn dependencies(&self) -> &[String] {
    &self.dependencies
  }

  /// The URL the module resolves to at runtime, when the module stands for a
  /// file. Extracted stylesheets use it for their `url()` references.
  pub fn set_asset_url(&mut self, url: impl Into<String>) {
    self.asset_url = Some(url.into());
  }

  pub fn asset_url(&self) -> Option<&str> {
    self.asset_url.as_deref()
  }

  pub fn set_css(&mut self, parts: Vec<CssPart>) {
    self.css = Some(parts);
  }

  pub fn take_css(&mut self) -> Option<Vec<CssPart>> {
    self.css.take()
  }

  /// Move the stylesheet out of the JavaScript output into the chunk's CSS
  /// file.
  pub fn extract_css(&mut self, parts: Vec<CssPart>) {
    self.extracted_css = Some(parts);
  }

  pub fn extracted_css(&self) -> Option<&[CssPart]> {
    self.extracted_css.as_deref()
  }
}
