use std::{borrow::Cow, collections::BTreeMap};

use rollpack_loader::builtins::ASSET_HELPER;
use rollpack_scanner::DYNAMIC_IMPORT_HELPER;

const RUNTIME_TEMPLATE: &str = include_str!("./runtime.js");

/// Name of the global array chunks push their modules into.
pub(crate) const CHUNK_QUEUE: &str = "rollpackChunk";
/// Name of the global array entry chunks push their entry module into.
pub(crate) const STARTUP_QUEUE: &str = "rollpackStartup";

fn to_json<T: serde::Serialize + ?Sized>(value: &T) -> String {
  serde_json::to_string(value).unwrap_or_else(|_| "null".to_string())
}

#[derive(Debug, Default)]
pub(crate) struct RuntimeInfo<'a> {
  /// Chunk name -> file name, for every chunk that may be loaded on demand.
  pub chunk_files: BTreeMap<&'a str, &'a str>,
  /// Chunk name -> extracted stylesheet, loaded along with the chunk.
  pub css_files: BTreeMap<&'a str, &'a str>,
  /// Split point module key -> chunk names to load, in load order.
  pub split_points: BTreeMap<String, Vec<&'a str>>,
  /// Chunk name -> chunks hinted with `<link rel="prefetch">` once it is
  /// registered.
  pub prefetch: BTreeMap<&'a str, Vec<&'a str>>,
  pub public_path: &'a str,
}

pub(crate) fn render_runtime(info: &RuntimeInfo) -> String {
  RUNTIME_TEMPLATE
    .replace("__ROLLPACK_CHUNK_FILES__", &to_json(&info.chunk_files))
    .replace("__ROLLPACK_CSS_FILES__", &to_json(&info.css_files))
    .replace("__ROLLPACK_SPLIT_POINTS__", &to_json(&info.split_points))
    .replace("__ROLLPACK_PREFETCH__", &to_json(&info.prefetch))
    .replace("__ROLLPACK_PUBLIC_PATH__", &to_json(&info.public_path))
}

pub(crate) struct RenderedModule<'a> {
  pub key: String,
  /// CommonJS body of the module wrapper.
  pub code: Cow<'a, str>,
  /// Specifier -> key of the resolved module.
  pub deps: BTreeMap<&'a str, String>,
}

/// One chunk's modules as an entry of the chunk queue.
pub(crate) fn render_chunk_modules(chunk_name: &str, modules: &[RenderedModule]) -> String {
  let mut code = format!(
    "(self[{queue}] = self[{queue}] || []).push([[{name}], {{\n",
    queue = to_json(&CHUNK_QUEUE),
    name = to_json(&chunk_name)
  );
  modules.iter().for_each(|module| {
    code.push_str(&format!(
      "{}: [function (module, exports, require, {ASSET_HELPER}, {DYNAMIC_IMPORT_HELPER}) {{\n{}\n}}, {}],\n",
      to_json(&module.key),
      module.code,
      to_json(&module.deps)
    ));
  });
  code.push_str("}]);\n");
  code
}

pub(crate) fn render_startup(entry_key: &str) -> String {
  format!(
    "(self[{queue}] = self[{queue}] || []).push({});\n",
    to_json(&entry_key),
    queue = to_json(&STARTUP_QUEUE),
  )
}
