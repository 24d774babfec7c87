//! The `rollpack.config.json` file.
//!
//! Keys are camelCase and unknown keys are rejected. A loaded
//! [RollpackConfig] is turned into the immutable build options with
//! [RollpackConfig::resolve].

use std::{collections::BTreeMap, path::Path};

use hashlink::LinkedHashMap;
use rollpack_common::{FileNameTemplate, Mode};
use rollpack_core::{InputItem, InputOptions, OutputOptions};
use rollpack_error::Error;
use rollpack_fs::SharedFileSystem;
use rollpack_loader::{LoaderRegistry, TransformPipeline};
use rollpack_plugin::BuildPlugin;
use rollpack_plugin_html::{HtmlPlugin, HtmlPluginOptions};
use rollpack_resolver::ResolveOptions;
use schemars::JsonSchema;
use serde::Deserialize;
use sugar_path::SugarPath;

mod module_rules;
pub use module_rules::*;
mod optimization;
pub use optimization::*;

pub const DEFAULT_CONFIG_FILE: &str = "rollpack.config.json";

#[derive(Debug, Default, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct RollpackConfig {
  #[serde(default)]
  #[schemars(with = "Option<String>")]
  pub mode: Option<Mode>,
  /// Base directory of `entry` and relative paths, relative to the config
  /// file.
  #[serde(default)]
  pub context: Option<String>,
  #[serde(default)]
  pub entry: EntryConfig,
  #[serde(default)]
  pub output: OutputConfig,
  #[serde(default)]
  pub module: ModuleConfig,
  #[serde(default)]
  pub resolve: ResolveConfig,
  /// Specifier -> global variable, e.g. `"jquery": "jQuery"`.
  #[serde(default)]
  pub externals: BTreeMap<String, String>,
  #[serde(default)]
  pub optimization: OptimizationConfig,
  #[serde(default)]
  pub html: Option<HtmlConfig>,
  #[serde(default)]
  pub performance: PerformanceConfig,
}

#[derive(Debug, Deserialize, JsonSchema)]
#[serde(untagged)]
pub enum EntryConfig {
  /// A single entry named `main`.
  Single(String),
  /// Entry name -> specifier, in declaration order.
  Named(#[schemars(with = "BTreeMap<String, String>")] LinkedHashMap<String, String>),
}

impl Default for EntryConfig {
  fn default() -> Self {
    Self::Single("./src/index.js".to_string())
  }
}

impl EntryConfig {
  fn into_input(self) -> Vec<InputItem> {
    match self {
      EntryConfig::Single(import) => vec![InputItem::new("main", import)],
      EntryConfig::Named(map) => map
        .into_iter()
        .map(|(name, import)| InputItem::new(name, import))
        .collect(),
    }
  }
}

#[derive(Debug, Default, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct OutputConfig {
  /// Output directory, `dist` by default.
  #[serde(default)]
  pub path: Option<String>,
  #[serde(default)]
  pub filename: Option<String>,
  #[serde(default)]
  pub chunk_filename: Option<String>,
  /// Names files emitted by loaders without a `name` option of their own.
  #[serde(default)]
  pub asset_filename: Option<String>,
  /// Names the stylesheet extracted from each chunk.
  #[serde(default)]
  pub css_filename: Option<String>,
  #[serde(default)]
  pub public_path: Option<String>,
  #[serde(default)]
  pub manifest: Option<ManifestConfig>,
}

#[derive(Debug, Deserialize, JsonSchema)]
#[serde(untagged)]
pub enum ManifestConfig {
  /// `true` emits `manifest.json`.
  Enabled(bool),
  FileName(String),
}

#[derive(Debug, Default, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct ResolveConfig {
  /// Prefix -> replacement. Relative replacements are resolved against
  /// `context`.
  #[serde(default)]
  pub alias: BTreeMap<String, String>,
  #[serde(default)]
  pub extensions: Option<Vec<String>>,
  #[serde(default)]
  pub modules: Option<Vec<String>>,
  #[serde(default)]
  pub main_files: Option<Vec<String>>,
  #[serde(default)]
  pub main_fields: Option<Vec<String>>,
}

#[derive(Debug, Default, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct HtmlConfig {
  /// Path of the page template, relative to `context`.
  #[serde(default)]
  pub template: Option<String>,
  #[serde(default)]
  pub filename: Option<String>,
  #[serde(default)]
  pub title: Option<String>,
  /// Entries to include, all of them when empty.
  #[serde(default)]
  pub chunks: Vec<String>,
  /// Follows the mode when absent.
  #[serde(default)]
  pub minify: Option<bool>,
}

#[derive(Debug, Default, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct PerformanceConfig {
  /// `false` turns the size warnings off.
  #[serde(default)]
  pub hints: Option<bool>,
  #[serde(default)]
  pub max_asset_size: Option<usize>,
}

/// Everything a build needs, derived from a [RollpackConfig].
#[derive(Debug)]
pub struct ResolvedConfig {
  pub input: InputOptions,
  pub output: OutputOptions,
  pub plugins: Vec<Box<dyn BuildPlugin>>,
}

/// Relative paths are taken from `base`. Anything else is kept as written.
pub(crate) fn absolutize(base: &Path, value: &str) -> String {
  if value.starts_with("./") || value.starts_with("../") || value == "." {
    base.join(value).normalize().to_string_lossy().into_owned()
  } else {
    value.to_string()
  }
}

impl RollpackConfig {
  pub fn from_json(content: &str) -> rollpack_error::Result<Self> {
    serde_json::from_str(content)
      .map_err(|err| Error::invalid_config(format!("Failed to parse configuration: {err}")))
  }

  /// Read and parse the config file at `path`.
  pub fn load(fs: &SharedFileSystem, path: &Path) -> rollpack_error::Result<Self> {
    let content = fs
      .read_to_string(path)
      .map_err(|err| Error::read_file_failed(path, err))?;
    Self::from_json(&content).map_err(|err| err.context(format!("in {}", path.display())))
  }

  /// The JSON Schema of the config file.
  pub fn json_schema() -> String {
    let schema = schemars::schema_for!(RollpackConfig);
    serde_json::to_string_pretty(&schema).unwrap_or_default()
  }

  /// Build the options. `config_dir` is the directory of the config file,
  /// `mode` overrides the one written in the file.
  pub fn resolve(
    self,
    config_dir: &Path,
    mode: Option<Mode>,
    fs: SharedFileSystem,
    registry: &LoaderRegistry,
  ) -> rollpack_error::Result<ResolvedConfig> {
    let mode = mode.or(self.mode).unwrap_or_default();
    let cwd = match &self.context {
      Some(context) => config_dir.join(context).normalize(),
      None => config_dir.to_path_buf(),
    };

    let rules = self
      .module
      .rules
      .into_iter()
      .map(|rule| rule.into_rule(&cwd, registry))
      .collect::<rollpack_error::Result<Vec<_>>>()?;

    let resolve = {
      let defaults = ResolveOptions::default();
      let ResolveConfig {
        alias,
        extensions,
        modules,
        main_files,
        main_fields,
      } = self.resolve;
      ResolveOptions {
        alias: alias
          .into_iter()
          .map(|(key, target)| {
            let target = absolutize(&cwd, &target);
            (key, target)
          })
          .collect(),
        extensions: extensions.unwrap_or(defaults.extensions),
        modules: modules
          .map(|modules| modules.iter().map(|m| absolutize(&cwd, m)).collect())
          .unwrap_or(defaults.modules),
        main_files: main_files.unwrap_or(defaults.main_files),
        main_fields: main_fields.unwrap_or(defaults.main_fields),
      }
    };

    let OutputConfig {
      path,
      filename,
      chunk_filename,
      asset_filename,
      css_filename,
      public_path,
      manifest,
    } = self.output;

    let pipeline = match asset_filename {
      Some(template) => TransformPipeline::new(rules).with_asset_file_names(template.into()),
      None => TransformPipeline::new(rules),
    };
    let input = InputOptions {
      input: self.entry.into_input(),
      cwd: cwd.clone(),
      mode,
      resolve,
      pipeline,
      externals: self.externals.into_iter().collect(),
      fs: fs.clone(),
      ..Default::default()
    };

    let defaults = OutputOptions::default();
    let entry_file_names = filename
      .map(FileNameTemplate::from)
      .unwrap_or(defaults.entry_file_names);
    let output = OutputOptions {
      dir: Some(
        cwd
          .join(path.as_deref().unwrap_or("dist"))
          .normalize()
          .to_string_lossy()
          .into_owned(),
      ),
      // A chunk template is only derived from `filename` when it can tell
      // chunks apart.
      chunk_file_names: match chunk_filename {
        Some(template) => FileNameTemplate::from(template),
        None if entry_file_names.template().contains("[name]") => entry_file_names.clone(),
        None => defaults.chunk_file_names,
      },
      entry_file_names,
      css_file_names: css_filename
        .map(FileNameTemplate::from)
        .unwrap_or(defaults.css_file_names),
      public_path: public_path.unwrap_or_default(),
      split_chunks: self.optimization.split_chunks()?,
      runtime_chunk: self.optimization.runtime_chunk()?,
      minimize: self.optimization.minimize,
      manifest: match manifest {
        Some(ManifestConfig::Enabled(true)) => Some("manifest.json".to_string()),
        Some(ManifestConfig::Enabled(false)) | None => None,
        Some(ManifestConfig::FileName(file_name)) => Some(file_name),
      },
      max_asset_size: match self.performance {
        PerformanceConfig {
          hints: Some(false), ..
        } => Some(usize::MAX),
        PerformanceConfig { max_asset_size, .. } => max_asset_size,
      },
    };

    let mut plugins: Vec<Box<dyn BuildPlugin>> = vec![];
    if let Some(html) = self.html {
      let template = match &html.template {
        Some(template) => {
          let path = cwd.join(template).normalize();
          Some(
            fs.read_to_string(&path)
              .map_err(|err| Error::read_file_failed(&path, err))?,
          )
        }
        None => None,
      };
      plugins.push(HtmlPlugin::new_boxed(HtmlPluginOptions {
        filename: html.filename.unwrap_or_else(|| "index.html".to_string()),
        title: html.title,
        template,
        public_path: output.public_path.clone(),
        chunks: html.chunks,
        minify: html.minify.unwrap_or_else(|| mode.is_production()),
      }));
    }

    Ok(ResolvedConfig {
      input,
      output,
      plugins,
    })
  }
}

#[cfg(test)]
mod tests {
  use std::path::Path;

  use rollpack_core::RuntimeChunk;
  use rollpack_fs::MemoryFileSystem;

  use super::*;

  fn resolve(json: &str) -> rollpack_error::Result<ResolvedConfig> {
    let fs = MemoryFileSystem::new(&[(
      "/project/src/index.html",
      "<html><body></body></html>",
    )])
    .into_shared();
    RollpackConfig::from_json(json)?.resolve(
      Path::new("/project"),
      None,
      fs,
      &LoaderRegistry::with_builtins(),
    )
  }

  #[test]
  fn defaults() {
    let config = resolve("{}").unwrap();
    assert_eq!(config.input.input, vec![InputItem::new("main", "./src/index.js")]);
    assert_eq!(config.input.cwd, Path::new("/project"));
    assert_eq!(config.input.mode, Mode::Development);
    assert_eq!(config.output.dir.as_deref(), Some("/project/dist"));
    assert_eq!(config.output.entry_file_names.template(), "[name].js");
    assert_eq!(config.output.css_file_names.template(), "[name].css");
    assert_eq!(config.output.runtime_chunk, RuntimeChunk::Disabled);
    assert!(config.output.manifest.is_none());
    assert!(config.plugins.is_empty());
  }

  #[test]
  fn named_entries_keep_declaration_order() {
    let config = resolve(
      r#"{
        "mode": "production",
        "entry": { "zeta": "./src/z.js", "alpha": "./src/a.js" },
        "output": {
          "path": "build",
          "filename": "js/[name].[contenthash:10].js",
          "cssFilename": "css/[name].[contenthash:8].css",
          "manifest": true
        }
      }"#,
    )
    .unwrap();
    assert_eq!(
      config.input.input,
      vec![
        InputItem::new("zeta", "./src/z.js"),
        InputItem::new("alpha", "./src/a.js")
      ]
    );
    assert_eq!(config.input.mode, Mode::Production);
    assert_eq!(config.output.dir.as_deref(), Some("/project/build"));
    assert_eq!(
      config.output.chunk_file_names.template(),
      "js/[name].[contenthash:10].js"
    );
    assert_eq!(
      config.output.css_file_names.template(),
      "css/[name].[contenthash:8].css"
    );
    assert_eq!(config.output.manifest.as_deref(), Some("manifest.json"));
  }

  #[test]
  fn resolve_paths_follow_context() {
    let config = resolve(
      r#"{
        "context": "./app",
        "resolve": {
          "alias": { "$css": "./src/css", "lodash": "lodash-es" },
          "extensions": [".js", ".json", ".jsx"],
          "modules": ["./vendor", "node_modules"]
        },
        "externals": { "jquery": "jQuery" }
      }"#,
    )
    .unwrap();
    let resolve = &config.input.resolve;
    assert_eq!(config.input.cwd, Path::new("/project/app"));
    assert!(resolve
      .alias
      .contains(&("$css".to_string(), "/project/app/src/css".to_string())));
    assert!(resolve
      .alias
      .contains(&("lodash".to_string(), "lodash-es".to_string())));
    assert_eq!(resolve.extensions, vec![".js", ".json", ".jsx"]);
    assert_eq!(resolve.modules, vec!["/project/app/vendor", "node_modules"]);
    assert_eq!(config.input.externals.get("jquery").map(String::as_str), Some("jQuery"));
  }

  #[test]
  fn html_template_is_read_through_the_file_system() {
    let config = resolve(r#"{ "html": { "template": "./src/index.html" } }"#).unwrap();
    assert_eq!(config.plugins.len(), 1);
    assert_eq!(config.plugins[0].name(), "builtin:html");

    let err = resolve(r#"{ "html": { "template": "./src/missing.html" } }"#).unwrap_err();
    assert_eq!(err.kind.code(), "READ_FILE_FAILED");
  }

  #[test]
  fn unknown_keys_are_rejected() {
    let err = RollpackConfig::from_json(r#"{ "devServer": {} }"#).unwrap_err();
    assert_eq!(err.kind.code(), "INVALID_CONFIG");
  }

  #[test]
  fn schema_lists_top_level_keys() {
    let schema = RollpackConfig::json_schema();
    for key in ["entry", "output", "module", "resolve", "externals", "optimization", "html"] {
      assert!(schema.contains(&format!("\"{key}\"")), "missing {key}");
    }
  }
}
