use rollpack_common::{content_hash, FileNameTemplate, RenderOptions};
use serde::Deserialize;

use super::js_string;
use crate::{Loader, LoaderContext};

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct FileLoaderOptions {
  /// `[hash:10].[ext]` style template. Falls back to the output asset
  /// template, then to [DEFAULT_ASSET_NAME].
  pub name: Option<String>,
  /// Directory inside the output directory.
  pub output_path: Option<String>,
  pub public_path: String,
  /// `export default` when true, `module.exports =` otherwise.
  pub es_module: bool,
}

impl Default for FileLoaderOptions {
  fn default() -> Self {
    Self {
      name: None,
      output_path: None,
      public_path: String::new(),
      es_module: true,
    }
  }
}

pub const DEFAULT_ASSET_NAME: &str = "[contenthash].[ext]";

/// Copies the file to the output and exports its public URL.
#[derive(Debug, Default)]
pub struct FileLoader {
  pub options: FileLoaderOptions,
}

impl FileLoader {
  pub fn new(options: FileLoaderOptions) -> Self {
    Self { options }
  }

  pub(crate) fn emit(&self, ctx: &mut LoaderContext) -> String {
    let path = ctx.resource_path();
    let name = path
      .file_stem()
      .map(|s| s.to_string_lossy().into_owned())
      .unwrap_or_default();
    let ext = path
      .extension()
      .map(|s| s.to_string_lossy().into_owned())
      .unwrap_or_default();
    let hash = content_hash(ctx.raw());
    let template = match (&self.options.name, ctx.asset_file_names()) {
      (Some(name), _) => FileNameTemplate::from(name.as_str()),
      (None, Some(template)) => template.clone(),
      (None, None) => FileNameTemplate::from(DEFAULT_ASSET_NAME),
    };
    let file_name = template.render(RenderOptions {
      name: Some(&name),
      ext: Some(&ext),
      hash: Some(&hash),
      ..Default::default()
    });
    let file_name = match &self.options.output_path {
      Some(dir) if !dir.is_empty() => format!("{}/{}", dir.trim_end_matches('/'), file_name),
      _ => file_name,
    };
    let raw = ctx.raw().to_vec();
    ctx.emit_file(file_name.clone(), raw);
    let url = format!("{}{}", self.options.public_path, file_name);
    ctx.set_asset_url(url.clone());
    url
  }

  pub(crate) fn export(&self, value: &str) -> String {
    if self.options.es_module {
      format!("export default {};\n", js_string(value))
    } else {
      format!("module.exports = {};\n", js_string(value))
    }
  }
}

impl Loader for FileLoader {
  fn name(&self) -> &str {
    "file-loader"
  }

  fn run(&self, ctx: &mut LoaderContext, _source: String) -> anyhow::Result<String> {
    let url = self.emit(ctx);
    Ok(self.export(&url))
  }
}
