use std::path::Component;

use sugar_path::SugarPath;

/// `/root/src/pages/home.js` relative to `/root` becomes `src_pages_home`.
pub fn uri_to_chunk_name(root: &str, uri: &str) -> String {
  let path = uri.as_path();
  let mut relatived = path.relative(root);
  relatived.set_extension("");
  itertools::Itertools::intersperse(
    relatived
      .components()
      .filter(|com| matches!(com, Component::Normal(_)))
      .filter_map(|seg| seg.as_os_str().to_str()),
    "_",
  )
  .fold(String::new(), |mut acc, seg| {
    acc.push_str(seg);
    acc
  })
}
