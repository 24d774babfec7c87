use schemars::JsonSchema;
use serde::Deserialize;

#[derive(Debug, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct ExpectedChunk {
  pub name: String,
  /// `entry`, `async`, `shared` or `runtime`.
  pub kind: String,
  /// Stable keys of the modules, compared without order.
  #[serde(default)]
  pub modules: Vec<String>,
}

#[derive(Debug, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct ExpectedEntrypoint {
  pub name: String,
  pub chunks: Vec<String>,
}

#[derive(Debug, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct ExpectedError {
  pub code: String,
  /// Substring of the message, with paths relative to the fixture directory.
  #[serde(default)]
  pub message: Option<String>,
}
