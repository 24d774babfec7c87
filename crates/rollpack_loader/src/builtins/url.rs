use base64::Engine;
use serde::Deserialize;

use super::{FileLoader, FileLoaderOptions};
use crate::{Loader, LoaderContext};

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct UrlLoaderOptions {
  /// Files smaller than this many bytes are inlined. `None` inlines everything.
  pub limit: Option<usize>,
  pub mimetype: Option<String>,
  #[serde(flatten)]
  pub file: FileLoaderOptions,
}

/// Inlines small files as `data:` URLs and falls back to `file-loader`.
#[derive(Debug, Default)]
pub struct UrlLoader {
  options: UrlLoaderOptions,
  fallback: FileLoader,
}

impl UrlLoader {
  pub fn new(options: UrlLoaderOptions) -> Self {
    let fallback = FileLoader::new(options.file.clone());
    Self { options, fallback }
  }
}

impl Loader for UrlLoader {
  fn name(&self) -> &str {
    "url-loader"
  }

  fn run(&self, ctx: &mut LoaderContext, _source: String) -> anyhow::Result<String> {
    let inline = self.options.limit.map_or(true, |limit| ctx.raw().len() < limit);
    if !inline {
      let url = self.fallback.emit(ctx);
      return Ok(self.fallback.export(&url));
    }
    let mime = self.options.mimetype.clone().unwrap_or_else(|| {
      mime_guess::from_path(ctx.resource_path())
        .first_or_octet_stream()
        .to_string()
    });
    let data = base64::engine::general_purpose::STANDARD.encode(ctx.raw());
    let url = format!("data:{mime};base64,{data}");
    ctx.set_asset_url(url.clone());
    Ok(self.fallback.export(&url))
  }
}
