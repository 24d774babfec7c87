use std::{borrow::Cow, fmt::Debug};

use rollpack_common::OutputAsset;

use crate::{Context, EmitArgs, ResolveArgs, TransformArgs};

#[derive(Debug)]
pub struct ResolvedId {
  pub id: String,
  pub external: bool,
}

pub type ResolveOutput = rollpack_error::Result<Option<ResolvedId>>;
pub type TransformOutput = rollpack_error::Result<Option<String>>;
pub type EmitOutput = rollpack_error::Result<Vec<OutputAsset>>;
pub type PluginName<'a> = Cow<'a, str>;

/// The extension point of a build. Every hook has a default no-op body.
///
/// - `before_resolve` runs before the builtin resolver. The first plugin that
///   returns `Some` decides the id.
/// - `after_transform` runs after the loader chain of a module. Plugins are
///   chained, each one sees the output of the previous one.
/// - `before_emit` sees the finished output and may add assets to it.
#[async_trait::async_trait]
pub trait BuildPlugin: Debug + Send + Sync {
  fn name(&self) -> PluginName;

  async fn before_resolve(&self, _ctx: &mut Context, _args: &mut ResolveArgs) -> ResolveOutput {
    Ok(None)
  }

  async fn after_transform(&self, _ctx: &mut Context, _args: &mut TransformArgs) -> TransformOutput {
    Ok(None)
  }

  async fn before_emit(&self, _ctx: &mut Context, _args: &mut EmitArgs) -> EmitOutput {
    Ok(vec![])
  }
}
