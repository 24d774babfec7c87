use once_cell::sync::Lazy;
use regex::Regex;

static CHUNK_NAME_RE: Lazy<Regex> = Lazy::new(|| {
  Regex::new(r#"(?:webpack|rollpack)ChunkName\s*:\s*["']([^"']+)["']"#).expect("valid regex")
});

static PREFETCH_RE: Lazy<Regex> =
  Lazy::new(|| Regex::new(r"(?:webpack|rollpack)Prefetch\s*:\s*true").expect("valid regex"));

#[derive(Debug, Default, PartialEq, Eq)]
pub(crate) struct MagicComment {
  pub chunk_name: Option<String>,
  pub prefetch: bool,
}

/// `import(/* webpackChunkName: 'test', webpackPrefetch: true */ './test')`
pub(crate) fn parse_magic_comment<'a>(texts: impl Iterator<Item = &'a str>) -> MagicComment {
  texts.fold(MagicComment::default(), |mut acc, text| {
    if let Some(caps) = CHUNK_NAME_RE.captures(text) {
      acc.chunk_name = Some(caps[1].to_string());
    }
    acc.prefetch |= PREFETCH_RE.is_match(text);
    acc
  })
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn chunk_name_and_prefetch() {
    let parsed = parse_magic_comment([" webpackChunkName: 'test', webpackPrefetch: true "].into_iter());
    assert_eq!(
      parsed,
      MagicComment {
        chunk_name: Some("test".to_string()),
        prefetch: true
      }
    );
    assert_eq!(parse_magic_comment([" hello "].into_iter()), MagicComment::default());
  }
}
