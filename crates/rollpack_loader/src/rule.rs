use std::{path::PathBuf, sync::Arc};

use derivative::Derivative;
use regex::Regex;

use crate::Loader;

/// Condition over a module path.
#[derive(Debug, Clone)]
pub enum Condition {
  Regex(Regex),
  /// Matches the path itself and everything below it.
  Path(PathBuf),
}

impl Condition {
  pub fn regex(pattern: &str) -> Result<Self, regex::Error> {
    Regex::new(pattern).map(Condition::Regex)
  }

  pub fn matches(&self, path: &str) -> bool {
    match self {
      Condition::Regex(re) => re.is_match(path),
      Condition::Path(prefix) => std::path::Path::new(path).starts_with(prefix),
    }
  }
}

/// `enforce` of a rule. Stages run in declaration order of this enum.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub enum Enforce {
  Pre,
  #[default]
  Normal,
  Post,
}

#[derive(Debug, Clone, Default)]
pub struct RuleCondition {
  pub test: Option<Condition>,
  /// Empty means everything is included.
  pub include: Vec<Condition>,
  pub exclude: Vec<Condition>,
}

impl RuleCondition {
  pub fn matches(&self, path: &str) -> bool {
    self.test.as_ref().map_or(true, |test| test.matches(path))
      && (self.include.is_empty() || self.include.iter().any(|c| c.matches(path)))
      && !self.exclude.iter().any(|c| c.matches(path))
  }
}

#[derive(Derivative, Clone, Default)]
#[derivative(Debug)]
pub struct Rule {
  pub condition: RuleCondition,
  /// Loaders of this rule. Executed right to left.
  #[derivative(Debug(format_with = "fmt_loader_names"))]
  pub uses: Vec<Arc<dyn Loader>>,
  pub enforce: Enforce,
  /// Only the first matching child contributes its loaders.
  pub one_of: Vec<Rule>,
}

impl Rule {
  pub fn new(test: Condition, uses: Vec<Arc<dyn Loader>>) -> Self {
    Self {
      condition: RuleCondition {
        test: Some(test),
        ..Default::default()
      },
      uses,
      ..Default::default()
    }
  }

  pub fn with_enforce(mut self, enforce: Enforce) -> Self {
    self.enforce = enforce;
    self
  }
}

fn fmt_loader_names(
  uses: &Vec<Arc<dyn Loader>>,
  f: &mut std::fmt::Formatter,
) -> std::result::Result<(), std::fmt::Error> {
  f.debug_list().entries(uses.iter().map(|l| l.name())).finish()
}
