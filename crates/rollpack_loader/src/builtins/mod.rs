//! Loaders shipped with rollpack. Their names match the ones used in
//! configuration files.

mod json;
pub use json::*;
mod raw;
pub use raw::*;
mod css;
pub use css::*;
mod style;
pub use style::*;
mod extract_css;
pub use extract_css::*;
mod file;
pub use file::*;
mod url;
pub use url::*;

/// Name of the helper through which generated code reaches a dependency that
/// was declared with `LoaderContext::add_dependency`.
pub const ASSET_HELPER: &str = "__rollpack_asset__";

/// Quote `value` as a JavaScript string literal.
pub(crate) fn js_string(value: &str) -> String {
  serde_json::to_string(value).unwrap_or_else(|_| "\"\"".to_string())
}
