use once_cell::sync::Lazy;
use regex::{Captures, Regex};

use super::{js_string, ASSET_HELPER};
use crate::{Loader, LoaderContext};

static IMPORT_RE: Lazy<Regex> = Lazy::new(|| {
  Regex::new(r#"@import\s+(?:url\(\s*)?["']?([^"')\s;]+)["']?\s*\)?\s*;"#).expect("valid regex")
});

static URL_RE: Lazy<Regex> =
  Lazy::new(|| Regex::new(r#"url\(\s*["']?([^"')]+?)["']?\s*\)"#).expect("valid regex"));

/// Name of the variable holding the stylesheet text in the generated module.
pub const CSS_BINDING: &str = "__css__";

/// A piece of a stylesheet as seen by `css-loader`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CssPart {
  /// `@import` of another stylesheet, by specifier.
  Import(String),
  Text(String),
  /// A local `url()` reference, by specifier.
  Url(String),
}

impl CssPart {
  fn to_js(&self) -> String {
    match self {
      CssPart::Import(request) | CssPart::Url(request) => {
        format!("{ASSET_HELPER}({})", js_string(request))
      }
      CssPart::Text(text) => js_string(text),
    }
  }
}

/// Turns a stylesheet into a module whose default export is the CSS text.
///
/// `@import` and local `url()` references are declared as dependencies, the
/// generated code pulls them in through the asset helper.
#[derive(Debug, Default)]
pub struct CssLoader;

fn is_local_url(url: &str) -> bool {
  !(url.starts_with("data:")
    || url.starts_with('#')
    || url.starts_with('/')
    || url.contains("://")
    || url.starts_with("//"))
}

fn as_request(url: &str) -> String {
  if url.starts_with("./") || url.starts_with("../") {
    url.to_string()
  } else {
    format!("./{url}")
  }
}

pub(crate) fn parse_css(ctx: &mut LoaderContext, source: &str) -> Vec<CssPart> {
  let mut imports: Vec<CssPart> = vec![];
  let without_imports = IMPORT_RE.replace_all(source, |caps: &Captures| {
    let request = as_request(&caps[1]);
    ctx.add_dependency(request.clone());
    imports.push(CssPart::Import(request));
    String::new()
  });

  let mut parts = imports;
  let mut last = 0;
  for caps in URL_RE.captures_iter(&without_imports) {
    let url = caps[1].trim();
    if !is_local_url(url) {
      continue;
    }
    let whole = caps.get(0).expect("group 0 always exists");
    let request = as_request(url);
    ctx.add_dependency(request.clone());
    parts.push(CssPart::Text(format!(
      "{}url(",
      &without_imports[last..whole.start()]
    )));
    parts.push(CssPart::Url(request));
    parts.push(CssPart::Text(")".to_string()));
    last = whole.end();
  }
  parts.push(CssPart::Text(without_imports[last..].to_string()));
  parts
}

impl Loader for CssLoader {
  fn name(&self) -> &str {
    "css-loader"
  }

  fn run(&self, ctx: &mut LoaderContext, source: String) -> anyhow::Result<String> {
    let parts = parse_css(ctx, &source);
    let code = format!(
      "var {CSS_BINDING} = [{}].join(\"\");\nexport default {CSS_BINDING};\n",
      parts.iter().map(CssPart::to_js).collect::<Vec<_>>().join(", ")
    );
    ctx.set_css(parts);
    Ok(code)
  }
}
