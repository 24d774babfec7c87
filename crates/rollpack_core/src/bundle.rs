use std::{borrow::Cow, collections::BTreeMap};

use itertools::Itertools;
use rollpack_common::{
  content_hash, BundleOutput, ChunkId, ChunkKind, OutputAsset, OutputChunk, OutputEntrypoint,
  RenderOptions,
};
use rollpack_error::Errors;
use rollpack_loader::builtins::CssPart;
use rollpack_plugin::EmitArgs;
use rustc_hash::FxHashMap as HashMap;

use crate::{
  minimize,
  runtime::{render_chunk_modules, render_runtime, render_startup, RenderedModule, RuntimeInfo},
  BuildError, BuildResult, Chunk, ChunkGraph, CodeSplitter, Graph, InputOptions, NormOrExt,
  NormalModule, OutputOptions, SharedBuildPluginDriver, UnaryBuildResult,
};

#[derive(Debug)]
pub struct Bundle<'a> {
  pub input_options: &'a InputOptions,
  pub output_options: &'a OutputOptions,
  pub graph: &'a Graph,
  plugin_driver: SharedBuildPluginDriver,
}

impl<'a> Bundle<'a> {
  pub(crate) fn new(
    input_options: &'a InputOptions,
    output_options: &'a OutputOptions,
    graph: &'a Graph,
    plugin_driver: SharedBuildPluginDriver,
  ) -> Self {
    Self {
      input_options,
      output_options,
      graph,
      plugin_driver,
    }
  }

  fn should_minimize(&self) -> bool {
    self
      .output_options
      .minimize
      .unwrap_or_else(|| self.input_options.mode.is_production())
  }

  fn carries_runtime(&self, chunk: &Chunk) -> bool {
    match chunk.kind {
      ChunkKind::Runtime => true,
      ChunkKind::Entry => !self.output_options.runtime_chunk.is_enabled(),
      ChunkKind::Async | ChunkKind::Shared => false,
    }
  }

  /// The module queue entry of the chunk, followed by the startup calls of
  /// its entries.
  fn render_body(&self, chunk: &Chunk) -> UnaryBuildResult<(String, Vec<String>)> {
    let cwd = &self.input_options.cwd;
    let should_minimize = self.should_minimize();
    let modules = chunk.ordered_modules(&self.graph.module_by_id)?;

    let rendered = modules
      .iter()
      .map(|module| match module {
        NormOrExt::Normal(m) => RenderedModule {
          key: m.id.stable_key(cwd),
          code: if should_minimize {
            Cow::Owned(minimize(&m.rendered))
          } else {
            Cow::Borrowed(m.rendered.as_str())
          },
          deps: m
            .import_records
            .iter()
            .map(|rec| (rec.specifier.as_str(), rec.resolved.stable_key(cwd)))
            .collect(),
        },
        NormOrExt::External(m) => RenderedModule {
          key: m.id.stable_key(cwd),
          code: Cow::Owned(m.code()),
          deps: Default::default(),
        },
      })
      .collect::<Vec<_>>();

    let mut body = render_chunk_modules(chunk.id.value(), &rendered);
    if chunk.kind == ChunkKind::Entry {
      chunk
        .roots
        .iter()
        .for_each(|root| body.push_str(&render_startup(&root.stable_key(cwd))));
    }

    Ok((body, rendered.into_iter().map(|m| m.key).collect()))
  }

  fn file_name_of(&self, chunk: &Chunk, hash: &str) -> String {
    let template = if chunk.kind.is_initial() {
      &self.output_options.entry_file_names
    } else {
      &self.output_options.chunk_file_names
    };
    template.render(RenderOptions {
      name: Some(chunk.id.value()),
      id: Some(chunk.id.value()),
      ext: Some("js"),
      hash: Some(hash),
    })
  }

  /// The target of a `url()` in an extracted stylesheet, as the emitted
  /// file is reachable from the page.
  fn asset_url_of(&self, importer: &NormalModule, specifier: &str) -> String {
    importer
      .import_records
      .iter()
      .find(|rec| rec.specifier == specifier)
      .and_then(|rec| self.graph.module_by_id.get(&rec.resolved))
      .and_then(|m| m.as_norm())
      .and_then(|m| m.asset_url.clone())
      .unwrap_or_else(|| {
        tracing::warn!("{} in {} emitted no file, kept as written", specifier, importer.id);
        specifier.to_string()
      })
  }

  /// Stylesheets extracted from the chunk's modules, in execution order.
  fn render_css(&self, chunk: &Chunk) -> UnaryBuildResult<Option<String>> {
    let modules = chunk.ordered_modules(&self.graph.module_by_id)?;
    let sheets = modules
      .iter()
      .filter_map(|m| m.as_norm())
      .filter_map(|m| {
        m.extracted_css.as_ref().map(|parts| {
          parts
            .iter()
            .map(|part| match part {
              // The imported sheet is a module of its own
              CssPart::Import(_) => Cow::Borrowed(""),
              CssPart::Text(text) => Cow::Borrowed(text.as_str()),
              CssPart::Url(specifier) => Cow::Owned(self.asset_url_of(m, specifier)),
            })
            .collect::<String>()
        })
      })
      .collect::<Vec<_>>();
    if sheets.is_empty() {
      return Ok(None);
    }
    let css = sheets.join("\n");
    Ok(Some(if self.should_minimize() {
      minimize(&css)
    } else {
      css
    }))
  }

  /// What the runtime needs to know to load async chunks. Chunks without a
  /// file name yet are left out.
  fn runtime_info<'c>(
    &'c self,
    chunk_graph: &'c ChunkGraph,
    file_names: &'c HashMap<ChunkId, String>,
    css_files: &'c HashMap<ChunkId, String>,
  ) -> RuntimeInfo<'c> {
    let cwd = &self.input_options.cwd;
    let mut info = RuntimeInfo {
      public_path: &self.output_options.public_path,
      ..Default::default()
    };
    // Entry and runtime chunks are on the page already
    let on_demand = move |group_idx: usize| -> Vec<&'c ChunkId> {
      chunk_graph.groups[group_idx]
        .chunks
        .iter()
        .filter(|c| {
          chunk_graph
            .chunk_by_id
            .get(*c)
            .map_or(false, |c| matches!(c.kind, ChunkKind::Async | ChunkKind::Shared))
        })
        .collect()
    };

    // Entries only need a split point when something imports them dynamically
    chunk_graph
      .split_point_to_group
      .iter()
      .filter(|(module, _)| {
        self
          .graph
          .module_by_id
          .get(*module)
          .and_then(|m| m.as_norm())
          .map_or(false, |m| m.is_dynamic_entry)
      })
      .for_each(|(module, group_idx)| {
        let chunks = on_demand(*group_idx);
        chunks.iter().for_each(|c| {
          if let Some(file_name) = file_names.get(*c) {
            info.chunk_files.insert(c.value(), file_name.as_str());
          }
          if let Some(css_file) = css_files.get(*c) {
            info.css_files.insert(c.value(), css_file.as_str());
          }
        });
        info
          .split_points
          .insert(module.stable_key(cwd), chunks.iter().map(|c| c.value()).collect());
      });

    chunk_graph.chunk_by_id.values().for_each(|chunk| {
      let targets = chunk
        .modules
        .iter()
        .filter_map(|id| self.graph.module_by_id.get(id))
        .filter_map(|m| m.as_norm())
        .sorted_by_key(|m| m.exec_order)
        .flat_map(|m| m.import_records.iter())
        .filter(|rec| rec.prefetch && rec.kind.is_dynamic())
        .filter_map(|rec| chunk_graph.split_point_to_group.get(&rec.resolved))
        .flat_map(|group_idx| on_demand(*group_idx))
        .filter(|c| **c != chunk.id)
        .map(|c| c.value())
        .unique()
        .collect::<Vec<_>>();
      if !targets.is_empty() {
        info.prefetch.insert(chunk.id.value(), targets);
      }
    });
    info
  }

  /// Loaders name their files with the asset template already.
  fn emitted_assets(&self) -> Vec<OutputAsset> {
    self
      .graph
      .module_by_id
      .values()
      .filter_map(|m| m.as_norm())
      .sorted_by_key(|m| m.exec_order)
      .flat_map(|m| m.emitted_files.iter().cloned())
      .collect()
  }

  #[tracing::instrument(skip_all)]
  pub async fn generate(&mut self) -> BuildResult<BundleOutput> {
    let chunk_graph =
      CodeSplitter::new(self.graph, self.input_options, self.output_options).split()?;

    let mut bodies: HashMap<ChunkId, (String, Vec<String>)> = HashMap::default();
    let mut css_files: HashMap<ChunkId, String> = HashMap::default();
    let mut css_assets = vec![];
    for chunk in chunk_graph.chunk_by_id.values() {
      bodies.insert(chunk.id.clone(), self.render_body(chunk)?);
      if let Some(css) = self.render_css(chunk)? {
        let hash = content_hash(&css);
        let file_name = self.output_options.css_file_names.render(RenderOptions {
          name: Some(chunk.id.value()),
          id: Some(chunk.id.value()),
          ext: Some("css"),
          hash: Some(hash.as_str()),
        });
        css_files.insert(chunk.id.clone(), file_name.clone());
        css_assets.push(OutputAsset::new(file_name, css));
      }
    }

    // Chunks without the runtime only depend on their own modules
    let mut hashes: HashMap<ChunkId, String> = HashMap::default();
    let mut file_names: HashMap<ChunkId, String> = HashMap::default();
    chunk_graph
      .chunk_by_id
      .values()
      .filter(|c| !self.carries_runtime(c))
      .for_each(|chunk| {
        let hash = content_hash(&bodies[&chunk.id].0);
        file_names.insert(chunk.id.clone(), self.file_name_of(chunk, &hash));
        hashes.insert(chunk.id.clone(), hash);
      });

    // The runtime embeds the file names of the chunks above
    let known_runtime = render_runtime(&self.runtime_info(&chunk_graph, &file_names, &css_files));
    let carriers = chunk_graph
      .chunk_by_id
      .values()
      .filter(|c| self.carries_runtime(c))
      .collect::<Vec<_>>();
    carriers.iter().for_each(|chunk| {
      let hash = content_hash(format!("{known_runtime}{}", bodies[&chunk.id].0));
      file_names.insert(chunk.id.clone(), self.file_name_of(chunk, &hash));
      hashes.insert(chunk.id.clone(), hash);
    });
    let runtime = render_runtime(&self.runtime_info(&chunk_graph, &file_names, &css_files));

    let chunks = chunk_graph
      .chunk_by_id
      .values()
      .map(|chunk| {
        let (body, modules) = &bodies[&chunk.id];
        let code = if self.carries_runtime(chunk) {
          format!("{runtime}\n{body}")
        } else {
          body.clone()
        };
        OutputChunk {
          name: chunk.id.value().to_string(),
          file_name: file_names[&chunk.id].clone(),
          kind: chunk.kind,
          modules: modules.clone(),
          content_hash: hashes[&chunk.id].clone(),
          code,
          css_file: css_files.get(&chunk.id).cloned(),
        }
      })
      .collect::<Vec<_>>();

    let entrypoints = chunk_graph
      .entry_groups()
      .zip(self.graph.entries.iter())
      .map(|(group, (name, _))| OutputEntrypoint {
        name: name.clone(),
        files: group
          .chunks
          .iter()
          .filter_map(|c| file_names.get(c).cloned())
          .collect(),
        styles: group
          .chunks
          .iter()
          .filter_map(|c| css_files.get(c).cloned())
          .collect(),
      })
      .collect();

    let mut assets = self.emitted_assets();
    assets.extend(css_assets);
    let mut output = BundleOutput {
      chunks,
      assets,
      entrypoints,
    };
    dedupe_assets(&mut output.assets);

    let entry_names = self
      .graph
      .entries
      .iter()
      .map(|(name, _)| name.clone())
      .collect::<Vec<_>>();
    let plugin_assets = self
      .plugin_driver
      .read()
      .await
      .before_emit(EmitArgs {
        output: &output,
        entries: &entry_names,
      })
      .await?;
    output.assets.extend(plugin_assets);

    if let Some(manifest) = &self.output_options.manifest {
      let manifest_asset = OutputAsset::new(manifest.as_str(), render_manifest(&output)?);
      output.assets.push(manifest_asset);
    }

    check_file_names(&output)?;
    self.report_large_files(&output);
    Ok(output)
  }

  fn report_large_files(&self, output: &BundleOutput) {
    let Some(limit) = self.output_options.max_asset_size(self.input_options.mode) else {
      return;
    };
    output
      .files()
      .filter(|(_, content)| content.len() > limit)
      .for_each(|(file_name, content)| {
        (self.input_options.on_warn)(BuildError::asset_too_large(file_name, content.len(), limit));
      });
  }
}

/// The same file emitted by several modules is kept once.
fn dedupe_assets(assets: &mut Vec<OutputAsset>) {
  let mut seen: Vec<(String, String)> = vec![];
  assets.retain(|asset| {
    let key = (asset.file_name.clone(), content_hash(&asset.source));
    if seen.contains(&key) {
      false
    } else {
      seen.push(key);
      true
    }
  });
}

fn check_file_names(output: &BundleOutput) -> BuildResult<()> {
  let mut owners: BTreeMap<&str, Vec<String>> = BTreeMap::new();
  output.chunks.iter().for_each(|chunk| {
    owners
      .entry(chunk.file_name.as_str())
      .or_default()
      .push(chunk.name.clone());
  });
  output.assets.iter().for_each(|asset| {
    owners
      .entry(asset.file_name.as_str())
      .or_default()
      .push(asset.file_name.clone());
  });
  let errors = owners
    .into_iter()
    .filter(|(_, owners)| owners.len() > 1)
    .map(|(file_name, owners)| BuildError::chunk_name_conflict(file_name.to_string(), owners))
    .collect::<Vec<_>>();
  match Errors::from_vec(errors) {
    Some(errors) => Err(errors),
    None => Ok(()),
  }
}

fn render_manifest(output: &BundleOutput) -> UnaryBuildResult<String> {
  let manifest = serde_json::json!({
    "entrypoints": output
      .entrypoints
      .iter()
      .map(|e| (e.name.clone(), e.files.clone()))
      .collect::<BTreeMap<_, _>>(),
    "chunks": output
      .chunks
      .iter()
      .map(|c| (c.name.clone(), c.file_name.clone()))
      .collect::<BTreeMap<_, _>>(),
    "assets": output
      .assets
      .iter()
      .map(|a| a.file_name.clone())
      .collect::<Vec<_>>(),
  });
  serde_json::to_string_pretty(&manifest).map_err(|e| BuildError::panic(e.to_string()))
}
