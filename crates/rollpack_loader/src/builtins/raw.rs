use super::js_string;
use crate::{Loader, LoaderContext};

#[derive(Debug, Default)]
pub struct RawLoader;

impl Loader for RawLoader {
  fn name(&self) -> &str {
    "raw-loader"
  }

  fn run(&self, _ctx: &mut LoaderContext, source: String) -> anyhow::Result<String> {
    Ok(format!("export default {};\n", js_string(&source)))
  }
}
