use std::{path::Path, sync::Arc};

use rollpack_common::{FileNameTemplate, Mode, ModuleType, OutputAsset};
use rollpack_error::Error;

use crate::{
  builtins::{CssPart, JsonLoader},
  Enforce, Loader, LoaderContext, Rule,
};

#[derive(Debug)]
pub struct TransformResult {
  pub code: String,
  /// Extra specifiers declared by loaders through `add_dependency`.
  pub dependencies: Vec<String>,
  pub emitted_files: Vec<OutputAsset>,
  /// Runtime URL of the file the module stands for.
  pub asset_url: Option<String>,
  /// Stylesheet bound for the chunk's CSS file.
  pub extracted_css: Option<Vec<CssPart>>,
  /// Names of the loaders that ran, in execution order.
  pub applied: Vec<String>,
}

#[derive(Debug, Default, Clone)]
pub struct TransformPipeline {
  rules: Vec<Rule>,
  asset_file_names: Option<FileNameTemplate>,
}

impl TransformPipeline {
  pub fn new(rules: Vec<Rule>) -> Self {
    Self {
      rules,
      asset_file_names: None,
    }
  }

  /// Names files emitted by loaders that have no naming option of their own.
  pub fn with_asset_file_names(mut self, template: FileNameTemplate) -> Self {
    self.asset_file_names = Some(template);
    self
  }

  pub fn rules(&self) -> &[Rule] {
    &self.rules
  }

  /// Loaders for `path` in execution order.
  ///
  /// Stages run `pre`, normal, `post`. Inside a stage, the last declared rule
  /// runs first and a rule's own `uses` run right to left.
  pub fn loaders_for(&self, path: &str) -> Vec<Arc<dyn Loader>> {
    let mut matched: Vec<(Enforce, usize, usize, Arc<dyn Loader>)> = vec![];

    self
      .rules
      .iter()
      .enumerate()
      .filter(|(_, rule)| rule.condition.matches(path))
      .for_each(|(rule_idx, rule)| {
        let effective = if rule.one_of.is_empty() {
          Some(rule)
        } else {
          rule.one_of.iter().find(|child| child.condition.matches(path))
        };
        if let Some(effective) = effective {
          effective
            .uses
            .iter()
            .enumerate()
            .for_each(|(use_idx, loader)| {
              matched.push((effective.enforce, rule_idx, use_idx, loader.clone()));
            });
        }
      });

    matched.sort_by(|(a_stage, a_rule, a_use, _), (b_stage, b_rule, b_use, _)| {
      a_stage
        .cmp(b_stage)
        .then_with(|| b_rule.cmp(a_rule))
        .then_with(|| b_use.cmp(a_use))
    });

    matched.into_iter().map(|(.., loader)| loader).collect()
  }

  pub fn run(&self, path: &Path, raw: &[u8], mode: Mode) -> rollpack_error::Result<TransformResult> {
    let path_str = path.to_string_lossy();
    let mut loaders = self.loaders_for(&path_str);

    if loaders.is_empty() {
      match ModuleType::from_path(path) {
        ModuleType::Js | ModuleType::Jsx => {}
        ModuleType::Json => loaders.push(Arc::new(JsonLoader)),
        _ => {
          return Err(Error::transform_failed(
            path,
            "none",
            "No loader is configured for this file type. You may need an appropriate loader to handle it.",
          ))
        }
      }
    }

    let mut ctx =
      LoaderContext::new(path, raw, mode).with_asset_file_names(self.asset_file_names.as_ref());
    let mut code = String::from_utf8_lossy(raw).into_owned();
    let mut applied = Vec::with_capacity(loaders.len());

    for loader in loaders {
      tracing::trace!("loader {} on {}", loader.name(), path.display());
      code = loader
        .run(&mut ctx, code)
        .map_err(|err| Error::transform_failed(path, loader.name(), format!("{err:#}")))?;
      applied.push(loader.name().to_string());
    }

    Ok(TransformResult {
      code,
      dependencies: ctx.dependencies,
      emitted_files: ctx.emitted_files,
      asset_url: ctx.asset_url,
      extracted_css: ctx.extracted_css,
      applied,
    })
  }
}
