use std::sync::Arc;

use rollpack_common::{ModuleId, ModuleType, OutputAsset};
use rollpack_plugin::{
  BuildPlugin, Context, EmitArgs, ResolveArgs, ResolveOutput, TransformArgs,
};
use tokio::sync::RwLock;

use crate::UnaryBuildResult;

pub(crate) type SharedBuildPluginDriver = Arc<RwLock<BuildPluginDriver>>;

#[derive(Debug)]
pub(crate) struct BuildPluginDriver {
  pub plugins: Vec<Box<dyn BuildPlugin>>,
  ctx: Context,
}

impl BuildPluginDriver {
  pub(crate) fn new(plugins: Vec<Box<dyn BuildPlugin>>, ctx: Context) -> Self {
    Self { plugins, ctx }
  }

  pub(crate) fn into_shared(self) -> SharedBuildPluginDriver {
    Arc::new(RwLock::new(self))
  }

  pub(crate) async fn before_resolve(&self, mut args: ResolveArgs<'_>) -> ResolveOutput {
    for plugin in &self.plugins {
      let output = plugin
        .before_resolve(&mut self.ctx.clone(), &mut args)
        .await?;
      if output.is_some() {
        return Ok(output);
      }
    }
    Ok(None)
  }

  pub(crate) async fn after_transform(
    &self,
    id: &ModuleId,
    module_type: ModuleType,
    code: String,
  ) -> UnaryBuildResult<String> {
    let mut code = code;
    for plugin in &self.plugins {
      let output = plugin
        .after_transform(
          &mut self.ctx.clone(),
          &mut TransformArgs {
            id,
            module_type,
            code: &code,
          },
        )
        .await?;
      if let Some(output) = output {
        code = output
      }
    }
    Ok(code)
  }

  pub(crate) async fn before_emit(
    &self,
    mut args: EmitArgs<'_>,
  ) -> UnaryBuildResult<Vec<OutputAsset>> {
    let mut assets = vec![];
    for plugin in &self.plugins {
      tracing::trace!("before_emit: {}", plugin.name());
      assets.extend(plugin.before_emit(&mut self.ctx.clone(), &mut args).await?);
    }
    Ok(assets)
  }
}
