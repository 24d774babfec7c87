use crate::{Loader, LoaderContext};

/// Takes the place of `style-loader`: the stylesheet parsed by `css-loader`
/// goes into the CSS file of the chunk instead of a `<style>` tag.
///
/// The module itself exports nothing. Its `@import`s stay dependencies, so
/// imported stylesheets are extracted by their own modules, before it.
#[derive(Debug, Default)]
pub struct CssExtractLoader;

impl Loader for CssExtractLoader {
  fn name(&self) -> &str {
    "mini-css-extract-loader"
  }

  fn run(&self, ctx: &mut LoaderContext, _source: String) -> anyhow::Result<String> {
    let Some(parts) = ctx.take_css() else {
      anyhow::bail!("mini-css-extract-loader expects the output of css-loader");
    };
    ctx.extract_css(parts);
    Ok("export { };\n".to_string())
  }
}
