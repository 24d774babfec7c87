use std::path::Path;
use std::str::FromStr;

/// The kind of content a module holds, guessed from its extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ModuleType {
  Js,
  Jsx,
  Json,
  Css,
  Html,
  Asset,
}

impl ModuleType {
  pub fn from_path(p: &Path) -> Self {
    p.extension()
      .and_then(|ext| ext.to_str())
      .map(|ext| Self::from_str(ext).unwrap_or(ModuleType::Asset))
      // No extension at all is treated like JavaScript
      .unwrap_or(ModuleType::Js)
  }

  pub fn is_text(&self) -> bool {
    !matches!(self, ModuleType::Asset)
  }
}

impl FromStr for ModuleType {
  type Err = String;

  fn from_str(s: &str) -> Result<Self, Self::Err> {
    match s {
      "js" | "mjs" | "cjs" => Ok(Self::Js),
      "jsx" => Ok(Self::Jsx),
      "json" => Ok(Self::Json),
      "css" | "less" | "scss" => Ok(Self::Css),
      "html" | "htm" => Ok(Self::Html),
      _ => Err(format!("Unknown module type \"{s}\"")),
    }
  }
}
