mod resolve_id;
pub(crate) use resolve_id::*;
mod name_helpers;
pub use name_helpers::*;

/// Drop trailing whitespace and blank lines.
pub(crate) fn minimize(code: &str) -> String {
  code
    .lines()
    .map(str::trim_end)
    .filter(|line| !line.is_empty())
    .collect::<Vec<_>>()
    .join("\n")
}

#[cfg(test)]
mod tests {
  #[test]
  fn minimize() {
    assert_eq!(
      super::minimize("const a = 1;   \n\n\n  console.log(a);\t\n"),
      "const a = 1;\n  console.log(a);"
    );
  }
}
