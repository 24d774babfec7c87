use std::sync::Arc;

use rollpack_common::BundleOutput;
use rollpack_plugin::{BuildPlugin, Context};
use rollpack_resolver::Resolver;
use tracing::instrument;

use crate::{
  BuildPluginDriver, BuildResult, Bundle, Graph, InputOptions, OutputOptions,
  SharedBuildPluginDriver, SharedInputOptions,
};

pub struct BundlerCore {
  input_options: SharedInputOptions,
  plugin_driver: SharedBuildPluginDriver,
}

impl BundlerCore {
  pub fn new(input_opts: InputOptions) -> Self {
    Self::with_plugins(input_opts, vec![])
  }

  pub fn with_plugins(input_opts: InputOptions, plugins: Vec<Box<dyn BuildPlugin>>) -> Self {
    rollpack_tracing::enable_tracing_on_demand();
    let ctx = Context::new(Arc::from(input_opts.cwd.as_path()), input_opts.mode);
    Self {
      input_options: Arc::new(input_opts),
      plugin_driver: BuildPluginDriver::new(plugins, ctx).into_shared(),
    }
  }

  pub fn input_options(&self) -> &InputOptions {
    &self.input_options
  }

  /// Run the whole pipeline. Nothing is written, the caller decides what to
  /// do with the output.
  #[instrument(skip_all)]
  pub async fn build(&mut self, output_opts: &OutputOptions) -> BuildResult<BundleOutput> {
    tracing::debug!("{:#?}", self.input_options);
    tracing::debug!("{:#?}", output_opts);
    let resolver = Arc::new(Resolver::new(
      self.input_options.cwd.clone(),
      self.input_options.resolve.clone(),
      self.input_options.fs.clone(),
    ));
    let mut graph = Graph::new(self.plugin_driver.clone(), self.input_options.clone());
    graph.generate_module_graph(resolver).await?;
    let mut bundle = Bundle::new(
      &self.input_options,
      output_opts,
      &graph,
      self.plugin_driver.clone(),
    );
    let output = bundle.generate().await?;
    tracing::debug!(
      "emitted {} chunks and {} assets",
      output.chunks.len(),
      output.assets.len()
    );
    Ok(output)
  }
}
