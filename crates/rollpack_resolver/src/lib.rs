use std::path::{Path, PathBuf};

use rollpack_error::Error;
use rollpack_fs::SharedFileSystem;
use sugar_path::SugarPath;

mod options;
pub use options::*;

#[derive(Debug)]
pub struct Resolver {
  cwd: PathBuf,
  options: ResolveOptions,
  fs: SharedFileSystem,
}

impl Resolver {
  pub fn new(cwd: PathBuf, options: ResolveOptions, fs: SharedFileSystem) -> Self {
    Self { cwd, options, fs }
  }

  pub fn cwd(&self) -> &PathBuf {
    &self.cwd
  }

  pub fn options(&self) -> &ResolveOptions {
    &self.options
  }
}

impl Resolver {
  /// Map `specifier` requested by `importer` to an absolute file path.
  ///
  /// Entries are resolved with `importer` set to `None` and are looked up
  /// relative to `cwd`.
  pub fn resolve(&self, importer: Option<&str>, specifier: &str) -> rollpack_error::Result<PathBuf> {
    let base_dir = importer
      .and_then(|importer| Path::new(importer).parent())
      .map(Path::to_path_buf)
      .unwrap_or_else(|| self.cwd.clone());

    let request = self.apply_alias(specifier);

    let resolved = if Path::new(request.as_ref()).is_absolute() {
      self.try_candidate(&Path::new(request.as_ref()).normalize())
    } else if is_relative_specifier(&request) || importer.is_none() {
      self.try_candidate(&base_dir.join(request.as_ref()).normalize())
    } else {
      self.resolve_bare(&base_dir, &request)
    };

    tracing::trace!("resolve {:?} from {:?} => {:?}", specifier, importer, resolved);

    resolved.ok_or_else(|| match importer {
      Some(importer) => Error::unresolved_import(specifier, importer),
      None => Error::unresolved_entry(specifier),
    })
  }

  /// Longest alias key wins. A key ending with `$` only matches exactly.
  fn apply_alias<'s>(&self, specifier: &'s str) -> std::borrow::Cow<'s, str> {
    let matched = self
      .options
      .alias
      .iter()
      .filter_map(|(key, replacement)| {
        if let Some(exact) = key.strip_suffix('$') {
          (specifier == exact).then_some((exact.len(), replacement, ""))
        } else if specifier == key {
          Some((key.len(), replacement, ""))
        } else {
          specifier
            .strip_prefix(key.as_str())
            .filter(|rest| rest.starts_with('/'))
            .map(|rest| (key.len(), replacement, rest))
        }
      })
      .max_by_key(|(len, ..)| *len);

    match matched {
      Some((_, replacement, rest)) => format!("{replacement}{rest}").into(),
      None => specifier.into(),
    }
  }

  fn resolve_bare(&self, base_dir: &Path, request: &str) -> Option<PathBuf> {
    self.options.modules.iter().find_map(|module_dir| {
      let module_dir = Path::new(module_dir);
      if module_dir.is_absolute() {
        self.try_candidate(&module_dir.join(request).normalize())
      } else {
        base_dir
          .ancestors()
          .map(|ancestor| ancestor.join(module_dir))
          .filter(|dir| self.fs.is_dir(dir))
          .find_map(|dir| self.try_candidate(&dir.join(request).normalize()))
      }
    })
  }

  fn try_candidate(&self, base: &Path) -> Option<PathBuf> {
    self
      .try_file(base)
      .or_else(|| self.try_directory(base))
  }

  /// The literal path, then the path with each extension appended.
  fn try_file(&self, base: &Path) -> Option<PathBuf> {
    if self.fs.is_file(base) {
      return Some(base.to_path_buf());
    }
    self.options.extensions.iter().find_map(|ext| {
      let mut candidate = base.as_os_str().to_os_string();
      candidate.push(ext);
      let candidate = PathBuf::from(candidate);
      self.fs.is_file(&candidate).then_some(candidate)
    })
  }

  fn try_directory(&self, dir: &Path) -> Option<PathBuf> {
    if !self.fs.is_dir(dir) {
      return None;
    }
    self
      .try_package_main(dir)
      .or_else(|| {
        self
          .options
          .main_files
          .iter()
          .find_map(|main_file| self.try_file(&dir.join(main_file)))
      })
  }

  fn try_package_main(&self, dir: &Path) -> Option<PathBuf> {
    let package_json = dir.join("package.json");
    if !self.fs.is_file(&package_json) {
      return None;
    }
    let content = self.fs.read(&package_json).ok()?;
    let manifest = serde_json::from_slice::<serde_json::Value>(&content)
      .map_err(|err| tracing::warn!("Ignoring malformed {}: {err}", package_json.display()))
      .ok()?;
    self
      .options
      .main_fields
      .iter()
      .filter_map(|field| manifest.get(field).and_then(|v| v.as_str()))
      .map(|main| dir.join(main).normalize())
      .filter(|main| main != dir)
      .find_map(|main| {
        self.try_file(&main).or_else(|| {
          self
            .options
            .main_files
            .iter()
            .find_map(|main_file| self.try_file(&main.join(main_file)))
        })
      })
  }
}

fn is_relative_specifier(specifier: &str) -> bool {
  specifier == "."
    || specifier == ".."
    || specifier.starts_with("./")
    || specifier.starts_with("../")
}

#[cfg(test)]
mod tests {
  use rollpack_fs::MemoryFileSystem;

  use super::*;

  fn resolver(files: &[(&str, &str)], options: ResolveOptions) -> Resolver {
    Resolver::new(
      PathBuf::from("/project"),
      options,
      MemoryFileSystem::new(files).into_shared(),
    )
  }

  fn resolve(resolver: &Resolver, importer: &str, specifier: &str) -> String {
    resolver
      .resolve(Some(importer), specifier)
      .unwrap()
      .to_string_lossy()
      .to_string()
  }

  #[test]
  fn extensions_are_tried_in_order() {
    let r = resolver(
      &[("/project/src/a.json", "{}"), ("/project/src/a.jsx", "")],
      ResolveOptions {
        extensions: vec![".js".into(), ".json".into(), ".jsx".into()],
        ..Default::default()
      },
    );
    assert_eq!(resolve(&r, "/project/src/index.js", "./a"), "/project/src/a.json");
  }

  #[test]
  fn literal_path_before_extensions() {
    let r = resolver(
      &[("/project/src/a", ""), ("/project/src/a.js", "")],
      Default::default(),
    );
    assert_eq!(resolve(&r, "/project/src/index.js", "./a"), "/project/src/a");
  }

  #[test]
  fn directory_index_fallback() {
    let r = resolver(&[("/project/src/utils/index.js", "")], Default::default());
    assert_eq!(
      resolve(&r, "/project/src/index.js", "./utils"),
      "/project/src/utils/index.js"
    );
  }

  #[test]
  fn longest_alias_prefix_wins() {
    let r = resolver(
      &[
        ("/project/src/css/index.css", ""),
        ("/project/src/css/theme/dark.css", ""),
        ("/project/themes/dark.css", ""),
      ],
      ResolveOptions {
        alias: vec![
          ("$css".into(), "/project/src/css".into()),
          ("$css/theme".into(), "/project/themes".into()),
        ],
        ..Default::default()
      },
    );
    assert_eq!(
      resolve(&r, "/project/src/index.js", "$css/index.css"),
      "/project/src/css/index.css"
    );
    assert_eq!(
      resolve(&r, "/project/src/index.js", "$css/theme/dark.css"),
      "/project/themes/dark.css"
    );
  }

  #[test]
  fn exact_alias() {
    let r = resolver(
      &[("/project/vendor/jq.js", ""), ("/project/node_modules/jquery/ui.js", "")],
      ResolveOptions {
        alias: vec![("jquery$".into(), "/project/vendor/jq.js".into())],
        ..Default::default()
      },
    );
    assert_eq!(resolve(&r, "/project/index.js", "jquery"), "/project/vendor/jq.js");
    assert_eq!(
      resolve(&r, "/project/index.js", "jquery/ui"),
      "/project/node_modules/jquery/ui.js"
    );
  }

  #[test]
  fn bare_specifier_searches_module_roots() {
    let r = resolver(
      &[
        ("/shared/node_modules/lodash/index.js", ""),
        ("/project/node_modules/lodash/index.js", ""),
        ("/project/node_modules/react/package.json", r#"{"main": "cjs/react.js"}"#),
        ("/project/node_modules/react/cjs/react.js", ""),
      ],
      ResolveOptions {
        modules: vec!["/shared/node_modules".into(), "node_modules".into()],
        ..Default::default()
      },
    );
    assert_eq!(
      resolve(&r, "/project/src/deep/index.js", "lodash"),
      "/shared/node_modules/lodash/index.js"
    );
    assert_eq!(
      resolve(&r, "/project/src/deep/index.js", "react"),
      "/project/node_modules/react/cjs/react.js"
    );
  }

  #[test]
  fn missing_file_reports_importer_and_specifier() {
    let r = resolver(&[("/src/index.js", "")], Default::default());
    let err = r.resolve(Some("/src/index.js"), "./missing").unwrap_err();
    match err.kind {
      rollpack_error::ErrorKind::UnresolvedImport { specifier, importer } => {
        assert_eq!(specifier, "./missing");
        assert_eq!(importer, PathBuf::from("/src/index.js"));
      }
      other => panic!("unexpected error {other:?}"),
    }
  }

  #[test]
  fn entries_resolve_against_cwd() {
    let r = resolver(&[("/project/src/js/index.js", "")], Default::default());
    assert_eq!(
      r.resolve(None, "./src/js/index").unwrap(),
      PathBuf::from("/project/src/js/index.js")
    );
    assert!(matches!(
      r.resolve(None, "./nope").unwrap_err().kind,
      rollpack_error::ErrorKind::UnresolvedEntry { .. }
    ));
  }
}
