use crate::{Loader, LoaderContext};

/// Validates JSON and exposes it as the default export.
#[derive(Debug, Default)]
pub struct JsonLoader;

impl Loader for JsonLoader {
  fn name(&self) -> &str {
    "json-loader"
  }

  fn run(&self, _ctx: &mut LoaderContext, source: String) -> anyhow::Result<String> {
    let value: serde_json::Value = serde_json::from_str(&source)?;
    Ok(format!("export default {};\n", serde_json::to_string(&value)?))
  }
}
