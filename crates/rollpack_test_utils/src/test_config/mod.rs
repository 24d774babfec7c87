use std::path::Path;

use rollpack::RollpackConfig;
use schemars::JsonSchema;
use serde::Deserialize;

mod expected;
pub use expected::*;

use crate::impl_serde_default;

/// `test.config.json` of a fixture directory.
#[derive(Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct TestConfig {
  /// Same shape as `rollpack.config.json`, relative to the fixture directory.
  #[serde(default)]
  pub config: RollpackConfig,

  /// Chunks of the output, compared by name. Not checked when absent.
  #[serde(default)]
  pub expected_chunks: Option<Vec<ExpectedChunk>>,

  /// Entry name -> initial chunk names, in load order.
  #[serde(default)]
  pub expected_entrypoints: Option<Vec<ExpectedEntrypoint>>,

  /// File names of assets that must be emitted.
  #[serde(default)]
  pub expected_assets: Vec<String>,

  #[serde(default)]
  pub expected_error: Option<ExpectedError>,
}

impl_serde_default!(TestConfig);

impl TestConfig {
  pub fn from_config_path(filepath: &Path) -> Self {
    let content = std::fs::read_to_string(filepath).unwrap_or_else(|_| "{}".to_string());
    serde_json::from_str(&content)
      .unwrap_or_else(|err| panic!("Invalid test config {}: {err}", filepath.display()))
  }

  pub fn json_schema() -> String {
    serde_json::to_string_pretty(&schemars::schema_for!(TestConfig))
      .expect("schema is serializable")
  }
}
