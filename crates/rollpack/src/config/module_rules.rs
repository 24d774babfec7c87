use std::path::Path;

use rollpack_error::Error;
use rollpack_loader::{Condition, Enforce, LoaderRegistry, Rule, RuleCondition};
use schemars::JsonSchema;
use serde::Deserialize;
use sugar_path::SugarPath;

#[derive(Debug, Default, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct ModuleConfig {
  #[serde(default)]
  pub rules: Vec<RuleConfig>,
}

#[derive(Debug, Deserialize, JsonSchema)]
#[serde(untagged)]
pub enum OneOrMany<T> {
  // Tried first, a struct can be deserialized from a sequence too
  Many(Vec<T>),
  One(T),
}

impl<T> OneOrMany<T> {
  fn into_vec(self) -> Vec<T> {
    match self {
      OneOrMany::One(item) => vec![item],
      OneOrMany::Many(items) => items,
    }
  }
}

#[derive(Debug, Clone, Copy, Deserialize, JsonSchema)]
#[serde(rename_all = "lowercase")]
pub enum EnforceConfig {
  Pre,
  Post,
}

#[derive(Debug, Deserialize, JsonSchema)]
#[serde(untagged)]
pub enum UseEntry {
  Name(String),
  #[serde(rename_all = "camelCase")]
  Loader {
    loader: String,
    #[serde(default)]
    options: serde_json::Value,
  },
}

#[derive(Debug, Default, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct RuleConfig {
  /// Regular expression matched against the absolute module path.
  #[serde(default)]
  pub test: Option<String>,
  /// Paths starting with `/`, `./` or `../` match a directory tree, anything
  /// else is a regular expression.
  #[serde(default)]
  pub include: Option<OneOrMany<String>>,
  #[serde(default)]
  pub exclude: Option<OneOrMany<String>>,
  #[serde(default)]
  pub enforce: Option<EnforceConfig>,
  /// Loaders, applied right to left.
  #[serde(default, rename = "use")]
  pub uses: Option<OneOrMany<UseEntry>>,
  /// Shorthand for a single entry in `use`.
  #[serde(default)]
  pub loader: Option<String>,
  /// Options of `loader`.
  #[serde(default)]
  pub options: Option<serde_json::Value>,
  #[serde(default)]
  pub one_of: Vec<RuleConfig>,
}

fn to_condition(cwd: &Path, value: &str) -> rollpack_error::Result<Condition> {
  if value.starts_with('/') || value.starts_with("./") || value.starts_with("../") {
    Ok(Condition::Path(cwd.join(value).normalize()))
  } else {
    Condition::regex(value)
      .map_err(|err| Error::invalid_config(format!("Invalid condition \"{value}\": {err}")))
  }
}

fn to_conditions(
  cwd: &Path,
  values: Option<OneOrMany<String>>,
) -> rollpack_error::Result<Vec<Condition>> {
  values
    .map(OneOrMany::into_vec)
    .unwrap_or_default()
    .iter()
    .map(|value| to_condition(cwd, value))
    .collect()
}

impl RuleConfig {
  pub(crate) fn into_rule(self, cwd: &Path, registry: &LoaderRegistry) -> rollpack_error::Result<Rule> {
    let test = self
      .test
      .as_deref()
      .map(|test| {
        Condition::regex(test)
          .map_err(|err| Error::invalid_config(format!("Invalid test \"{test}\": {err}")))
      })
      .transpose()?;

    let entries = match (self.uses, self.loader) {
      (Some(_), Some(loader)) => {
        return Err(Error::invalid_config(format!(
          "A rule cannot have both \"use\" and \"loader\" (loader \"{loader}\")"
        )))
      }
      (Some(uses), None) => uses.into_vec(),
      (None, Some(loader)) => vec![UseEntry::Loader {
        loader,
        options: self.options.unwrap_or_default(),
      }],
      (None, None) => vec![],
    };
    let uses = entries
      .into_iter()
      .map(|entry| match entry {
        UseEntry::Name(name) => registry.create(&name, &serde_json::Value::Null),
        UseEntry::Loader { loader, options } => registry.create(&loader, &options),
      })
      .collect::<rollpack_error::Result<Vec<_>>>()?;

    let one_of = self
      .one_of
      .into_iter()
      .map(|child| child.into_rule(cwd, registry))
      .collect::<rollpack_error::Result<Vec<_>>>()?;

    Ok(Rule {
      condition: RuleCondition {
        test,
        include: to_conditions(cwd, self.include)?,
        exclude: to_conditions(cwd, self.exclude)?,
      },
      uses,
      enforce: match self.enforce {
        Some(EnforceConfig::Pre) => Enforce::Pre,
        Some(EnforceConfig::Post) => Enforce::Post,
        None => Enforce::Normal,
      },
      one_of,
    })
  }
}
