use std::str::FromStr;

use serde::Deserialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Mode {
  #[default]
  Development,
  Production,
}

impl Mode {
  pub fn is_production(self) -> bool {
    self == Mode::Production
  }

  pub fn as_str(self) -> &'static str {
    match self {
      Mode::Development => "development",
      Mode::Production => "production",
    }
  }
}

impl FromStr for Mode {
  type Err = String;

  fn from_str(value: &str) -> Result<Self, Self::Err> {
    match value {
      "development" => Ok(Mode::Development),
      "production" => Ok(Mode::Production),
      _ => Err(format!("Invalid mode: {value}")),
    }
  }
}
