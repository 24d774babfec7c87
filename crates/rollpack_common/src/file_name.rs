use once_cell::sync::Lazy;
use regex::{Captures, Regex};
use sha2::{Digest, Sha256};

static HASH_PLACEHOLDER: Lazy<Regex> =
  Lazy::new(|| Regex::new(r"\[(contenthash|chunkhash|hash)(?::(\d+))?\]").expect("valid regex"));

/// Hex encoded sha256 of `content`.
pub fn content_hash(content: impl AsRef<[u8]>) -> String {
  let mut hasher = Sha256::new();
  hasher.update(content.as_ref());
  hex::encode(hasher.finalize())
}

/// A file name pattern like `js/[name].[contenthash:10].js`.
///
/// Supported placeholders: `[name]`, `[id]`, `[ext]`, `[hash]`,
/// `[contenthash]`, `[chunkhash]`. Hash placeholders accept a length,
/// `[hash:8]`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileNameTemplate {
  template: String,
}

impl FileNameTemplate {
  pub fn new(template: impl Into<String>) -> Self {
    Self {
      template: template.into(),
    }
  }

  pub fn template(&self) -> &str {
    &self.template
  }

  pub fn has_hash(&self) -> bool {
    HASH_PLACEHOLDER.is_match(&self.template)
  }
}

impl From<String> for FileNameTemplate {
  fn from(template: String) -> Self {
    Self { template }
  }
}

impl From<&str> for FileNameTemplate {
  fn from(template: &str) -> Self {
    Self::new(template)
  }
}

#[derive(Debug, Default)]
pub struct RenderOptions<'me> {
  pub name: Option<&'me str>,
  pub id: Option<&'me str>,
  pub ext: Option<&'me str>,
  pub hash: Option<&'me str>,
}

impl FileNameTemplate {
  pub fn render(&self, options: RenderOptions) -> String {
    let mut tmp = self.template.clone();
    if let Some(name) = options.name {
      tmp = tmp.replace("[name]", name);
    }
    if let Some(id) = options.id {
      tmp = tmp.replace("[id]", id);
    }
    if let Some(ext) = options.ext {
      tmp = tmp.replace("[ext]", ext);
    }
    if let Some(hash) = options.hash {
      tmp = HASH_PLACEHOLDER
        .replace_all(&tmp, |caps: &Captures| {
          let len = caps
            .get(2)
            .and_then(|len| len.as_str().parse::<usize>().ok())
            .unwrap_or(hash.len())
            .min(hash.len());
          hash[..len].to_string()
        })
        .into_owned();
    }
    tmp
  }
}
