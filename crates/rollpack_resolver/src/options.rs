#[derive(Debug, Clone)]
pub struct ResolveOptions {
  /// Prefix rewrites, e.g. `$css` => `/project/src/css`.
  pub alias: Vec<(String, String)>,
  /// Appended to a candidate in order, e.g. `.js`.
  pub extensions: Vec<String>,
  /// Absolute directories, or names looked up in every ancestor directory.
  pub modules: Vec<String>,
  /// File names tried when a candidate is a directory.
  pub main_files: Vec<String>,
  /// `package.json` fields consulted when a candidate is a package directory.
  pub main_fields: Vec<String>,
}

impl Default for ResolveOptions {
  fn default() -> Self {
    Self {
      alias: vec![],
      extensions: vec![".js".to_string(), ".json".to_string()],
      modules: vec!["node_modules".to_string()],
      main_files: vec!["index".to_string()],
      main_fields: vec![
        "browser".to_string(),
        "module".to_string(),
        "main".to_string(),
      ],
    }
  }
}
