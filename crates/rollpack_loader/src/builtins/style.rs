use super::CSS_BINDING;
use crate::{Loader, LoaderContext};

/// Injects the stylesheet produced by `css-loader` into the document.
#[derive(Debug, Default)]
pub struct StyleLoader;

impl Loader for StyleLoader {
  fn name(&self) -> &str {
    "style-loader"
  }

  fn run(&self, _ctx: &mut LoaderContext, source: String) -> anyhow::Result<String> {
    if !source.contains(CSS_BINDING) {
      anyhow::bail!("style-loader expects the output of css-loader");
    }
    Ok(format!(
      "{source}if (typeof document !== \"undefined\") {{\n  var style = document.createElement(\"style\");\n  style.textContent = {CSS_BINDING};\n  document.head.appendChild(style);\n}}\n"
    ))
  }
}
