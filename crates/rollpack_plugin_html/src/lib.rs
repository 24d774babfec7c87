use rollpack_common::OutputAsset;
use rollpack_plugin::{async_trait, BuildPlugin, Context, EmitArgs, EmitOutput, PluginName};

const DEFAULT_TEMPLATE: &str = r#"<!DOCTYPE html>
<html lang="en">
<head>
  <meta charset="UTF-8">
  <title></title>
</head>
<body>
</body>
</html>
"#;

#[derive(Debug, Clone)]
pub struct HtmlPluginOptions {
  /// Output file name of the page.
  pub filename: String,
  pub title: Option<String>,
  /// Content of the page template. Stylesheets are injected before
  /// `</head>`, scripts before `</body>`.
  pub template: Option<String>,
  /// Prefix of the script URLs.
  pub public_path: String,
  /// Entries whose scripts go into the page. Empty means every entry.
  pub chunks: Vec<String>,
  /// Drop blank lines and indentation.
  pub minify: bool,
}

impl Default for HtmlPluginOptions {
  fn default() -> Self {
    Self {
      filename: "index.html".to_string(),
      title: None,
      template: None,
      public_path: String::new(),
      chunks: vec![],
      minify: false,
    }
  }
}

/// Emits an HTML page loading the initial chunks of the entries.
#[derive(Debug, Default)]
pub struct HtmlPlugin {
  options: HtmlPluginOptions,
}

impl HtmlPlugin {
  pub fn new(options: HtmlPluginOptions) -> Self {
    Self { options }
  }

  pub fn new_boxed(options: HtmlPluginOptions) -> Box<dyn BuildPlugin> {
    Box::new(Self::new(options))
  }

  fn render(&self, styles: &[String], scripts: &[String]) -> String {
    let mut html = self
      .options
      .template
      .clone()
      .unwrap_or_else(|| DEFAULT_TEMPLATE.to_string());

    if let Some(title) = &self.options.title {
      html = match (html.find("<title>"), html.find("</title>")) {
        (Some(start), Some(end)) if start < end => {
          format!("{}<title>{title}</title>{}", &html[..start], &html[end + 8..])
        }
        _ => html,
      };
    }

    let links = styles
      .iter()
      .map(|href| {
        format!("  <link rel=\"stylesheet\" href=\"{}{href}\">\n", self.options.public_path)
      })
      .collect::<String>();
    html = match html.find("</head>") {
      Some(idx) => format!("{}{links}{}", &html[..idx], &html[idx..]),
      None => format!("{links}{html}"),
    };

    let tags = scripts
      .iter()
      .map(|src| format!("  <script src=\"{}{src}\"></script>\n", self.options.public_path))
      .collect::<String>();
    html = match html.rfind("</body>") {
      Some(idx) => format!("{}{tags}{}", &html[..idx], &html[idx..]),
      None => format!("{html}{tags}"),
    };

    if self.options.minify {
      html = html
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .collect::<String>();
    }
    html
  }
}

#[async_trait::async_trait]
impl BuildPlugin for HtmlPlugin {
  fn name(&self) -> PluginName {
    std::borrow::Cow::Borrowed("builtin:html")
  }

  async fn before_emit(&self, _ctx: &mut Context, args: &mut EmitArgs) -> EmitOutput {
    let mut styles: Vec<String> = vec![];
    let mut scripts: Vec<String> = vec![];
    args
      .entries
      .iter()
      .filter(|name| self.options.chunks.is_empty() || self.options.chunks.contains(name))
      .filter_map(|name| args.output.entrypoint(name))
      .for_each(|entry| {
        entry.styles.iter().for_each(|file| {
          if !styles.contains(file) {
            styles.push(file.clone());
          }
        });
        entry.files.iter().for_each(|file| {
          if !scripts.contains(file) {
            scripts.push(file.clone());
          }
        });
      });
    Ok(vec![OutputAsset::new(
      self.options.filename.as_str(),
      self.render(&styles, &scripts),
    )])
  }
}

#[cfg(test)]
mod tests {
  use std::{path::Path, sync::Arc};

  use rollpack_common::{BundleOutput, Mode, OutputEntrypoint};

  use super::*;

  fn emit(plugin: &HtmlPlugin, output: &BundleOutput, entries: &[String]) -> String {
    let mut ctx = Context::new(Arc::from(Path::new("/")), Mode::Development);
    let assets = tokio::runtime::Runtime::new()
      .unwrap()
      .block_on(plugin.before_emit(&mut ctx, &mut EmitArgs { output, entries }))
      .unwrap();
    assert_eq!(assets.len(), 1);
    String::from_utf8(assets[0].source.clone()).unwrap()
  }

  #[test]
  fn injects_initial_chunks_of_entries() {
    let output = BundleOutput {
      entrypoints: vec![
        OutputEntrypoint {
          name: "index".to_string(),
          files: vec!["runtime.js".to_string(), "index.1a2b.js".to_string()],
          styles: vec!["index.css".to_string()],
        },
        OutputEntrypoint {
          name: "admin".to_string(),
          files: vec!["runtime.js".to_string(), "admin.3c4d.js".to_string()],
          styles: vec!["admin.css".to_string()],
        },
      ],
      ..Default::default()
    };
    let plugin = HtmlPlugin::new(HtmlPluginOptions {
      title: Some("webpack".to_string()),
      public_path: "/static/".to_string(),
      chunks: vec!["index".to_string()],
      ..Default::default()
    });
    let html = emit(&plugin, &output, &["index".to_string(), "admin".to_string()]);
    assert!(html.contains("<title>webpack</title>"));
    assert!(html.contains("  <link rel=\"stylesheet\" href=\"/static/index.css\">\n</head>"));
    assert!(html.contains(
      "  <script src=\"/static/runtime.js\"></script>\n  <script src=\"/static/index.1a2b.js\"></script>\n</body>"
    ));
    assert!(!html.contains("admin"));
  }

  #[test]
  fn minified_template() {
    let plugin = HtmlPlugin::new(HtmlPluginOptions {
      template: Some("<html>\n  <body>\n    <div id=\"title\"></div>\n  </body>\n</html>\n".to_string()),
      minify: true,
      ..Default::default()
    });
    let output = BundleOutput {
      entrypoints: vec![OutputEntrypoint {
        name: "main".to_string(),
        files: vec!["main.js".to_string()],
        styles: vec![],
      }],
      ..Default::default()
    };
    assert_eq!(
      emit(&plugin, &output, &["main".to_string()]),
      "<html><body><div id=\"title\"></div><script src=\"main.js\"></script></body></html>"
    );
  }
}
