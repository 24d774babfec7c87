use std::{borrow::Cow, path::Path};

use sugar_path::SugarPath;

use crate::CWD;

pub fn format_quoted_strings(list: &[impl AsRef<str>]) -> String {
  debug_assert!(!list.is_empty());
  let mut quoted_list = list
    .iter()
    .map(|item| format!("\"{}\"", item.as_ref()))
    .collect::<Vec<_>>();
  match quoted_list.len() {
    0 => String::new(),
    1 => quoted_list.remove(0),
    _ => {
      let last_item = quoted_list.pop().unwrap_or_default();
      format!("{} and {}", quoted_list.join(", "), last_item)
    }
  }
}

pub trait PathExt {
  fn may_display_relative(&self) -> Cow<str>;
}

impl PathExt for Path {
  fn may_display_relative(&self) -> Cow<str> {
    let path = if CWD.is_set() && self.is_absolute() {
      CWD.with(|cwd| self.relative(cwd))
    } else {
      return self.to_string_lossy();
    };
    Cow::Owned(path.to_slash_lossy().into_owned())
  }
}
