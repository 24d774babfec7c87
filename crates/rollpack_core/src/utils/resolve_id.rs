use rollpack_common::ModuleId;
use rollpack_plugin::ResolveArgs;
use rollpack_resolver::Resolver;

use crate::{InputOptions, SharedBuildPluginDriver, UnaryBuildResult};

/// Plugins first, then `externals`, then the resolver.
pub(crate) async fn resolve_id(
  resolver: &Resolver,
  input_options: &InputOptions,
  plugin_driver: &SharedBuildPluginDriver,
  importer: Option<&ModuleId>,
  specifier: &str,
) -> UnaryBuildResult<ModuleId> {
  let plugin_result = plugin_driver
    .read()
    .await
    .before_resolve(ResolveArgs {
      importer,
      specifier,
    })
    .await?;

  if let Some(resolved) = plugin_result {
    return Ok(ModuleId::new(resolved.id, resolved.external));
  }

  if input_options.externals.contains_key(specifier) {
    return Ok(ModuleId::new(specifier, true));
  }

  let resolved = resolver.resolve(importer.map(|id| id.id()), specifier)?;

  Ok(ModuleId::new(resolved.to_string_lossy().as_ref(), false))
}
