use std::{
  path::{Path, PathBuf},
  sync::{
    atomic::{AtomicUsize, Ordering},
    Arc, Mutex,
  },
  time::Duration,
};

use rollpack::{
  BuildError, BuildPlugin, BuildResult, BundleOutput, Bundler, CacheGroup, ChunkKind, ChunksFilter,
  Condition, Enforce, ErrorCategory, FileNameTemplate, FileSystem, HtmlPlugin, HtmlPluginOptions,
  InputItem, InputOptions, Loader, LoaderContext, LoaderRegistry, MemoryFileSystem, Mode,
  OutputOptions, RollpackConfig, Rule, RuntimeChunk, SharedFileSystem, SplitChunksOptions,
  TransformPipeline,
};
use rollpack_test_utils::script::assert_chunks_are_scripts;

const CWD: &str = "/project";

fn input_options(files: &[(&str, &str)], input: &[(&str, &str)]) -> InputOptions {
  InputOptions {
    input: input
      .iter()
      .map(|(name, import)| InputItem::new(*name, *import))
      .collect(),
    cwd: PathBuf::from(CWD),
    fs: MemoryFileSystem::new(files).into_shared(),
    ..Default::default()
  }
}

async fn build_with(input: InputOptions, output: &OutputOptions) -> BuildResult<BundleOutput> {
  Bundler::new(input).generate(output).await
}

async fn build(
  files: &[(&str, &str)],
  input: &[(&str, &str)],
  output: &OutputOptions,
) -> BuildResult<BundleOutput> {
  build_with(input_options(files, input), output).await
}

fn sorted_modules(output: &BundleOutput, chunk: &str) -> Vec<String> {
  let mut modules = output
    .chunk_by_name(chunk)
    .unwrap_or_else(|| panic!("chunk {chunk} is missing"))
    .modules
    .clone();
  modules.sort();
  modules
}

fn chunk_layout(output: &BundleOutput) -> Vec<(String, ChunkKind)> {
  let mut layout = output
    .chunks
    .iter()
    .map(|c| (c.name.clone(), c.kind))
    .collect::<Vec<_>>();
  layout.sort();
  layout
}

fn split_everything() -> SplitChunksOptions {
  SplitChunksOptions {
    chunks: ChunksFilter::All,
    min_size: 0,
    ..Default::default()
  }
}

#[tokio::test]
async fn module_identity_is_unique_per_path() {
  let files = [
    ("/project/src/index.js", "import './a';\nimport './b';\nimport './c.js';"),
    ("/project/src/a.js", "import './c';\nexport const a = 1;"),
    ("/project/src/b.js", "import { c } from './c';\nexport * from './c.js';"),
    ("/project/src/c.js", "export const c = 1;"),
  ];
  let output = build(&files, &[("main", "./src/index.js")], &Default::default())
    .await
    .unwrap();
  assert_eq!(output.chunks.len(), 1);
  let modules = &output.chunks[0].modules;
  assert_eq!(
    sorted_modules(&output, "main"),
    vec!["src/a.js", "src/b.js", "src/c.js", "src/index.js"]
  );
  assert_eq!(modules.len(), 4);
  // Dependencies execute before their importers
  let position = |key: &str| modules.iter().position(|m| m == key).unwrap();
  assert!(position("src/c.js") < position("src/a.js"));
  assert!(position("src/a.js") < position("src/b.js"));
  assert!(position("src/b.js") < position("src/index.js"));
}

#[tokio::test]
async fn identity_does_not_depend_on_concurrency() {
  let files = [
    ("/project/src/index.js", "import './a';\nimport './b';\nimport('./lazy');"),
    ("/project/src/a.js", "import './shared';"),
    ("/project/src/b.js", "import './shared';"),
    ("/project/src/shared.js", "export default 1;"),
    ("/project/src/lazy.js", "import './shared';\nimport './a';"),
  ];
  let mut sequential = input_options(&files, &[("main", "./src/index.js")]);
  sequential.concurrency = Some(1);
  let sequential = build_with(sequential, &Default::default()).await.unwrap();
  let parallel = build(&files, &[("main", "./src/index.js")], &Default::default())
    .await
    .unwrap();
  assert_eq!(chunk_layout(&sequential), chunk_layout(&parallel));
  for chunk in &sequential.chunks {
    let other = parallel.chunk_by_name(&chunk.name).unwrap();
    assert_eq!(chunk.modules, other.modules);
    assert_eq!(chunk.code, other.code);
  }
}

#[tokio::test]
async fn circular_imports_terminate() {
  let files = [
    ("/project/src/a.js", "import { b } from './b';\nexport const a = () => b;"),
    ("/project/src/b.js", "import { a } from './a';\nexport const b = () => a;"),
  ];
  let output = build(&files, &[("main", "./src/a.js")], &Default::default())
    .await
    .unwrap();
  assert_eq!(sorted_modules(&output, "main"), vec!["src/a.js", "src/b.js"]);
  assert_eq!(output.chunks[0].modules, vec!["src/b.js", "src/a.js"]);
}

#[tokio::test]
async fn self_import_terminates() {
  let files = [("/project/src/index.js", "import './index';\nimport('./index.js');")];
  let output = build(&files, &[("main", "./src/index.js")], &Default::default())
    .await
    .unwrap();
  assert_eq!(chunk_layout(&output), vec![("main".to_string(), ChunkKind::Entry)]);
}

#[derive(Debug)]
struct Tag(&'static str);

impl Loader for Tag {
  fn name(&self) -> &str {
    self.0
  }

  fn run(&self, _ctx: &mut LoaderContext, source: String) -> rollpack_error::anyhow::Result<String> {
    Ok(format!("{source}\nconsole.log(\"{}\");", self.0))
  }
}

#[tokio::test]
async fn rules_run_by_stage_then_last_declared_first() {
  let js = || Condition::regex(r"\.js$").unwrap();
  let mut input = input_options(
    &[("/project/src/index.js", "export default 1;")],
    &[("main", "./src/index.js")],
  );
  input.pipeline = TransformPipeline::new(vec![
    Rule::new(js(), vec![Arc::new(Tag("R1"))]).with_enforce(Enforce::Pre),
    Rule::new(js(), vec![Arc::new(Tag("R2"))]),
    Rule::new(js(), vec![Arc::new(Tag("R3"))]),
  ]);
  let output = build_with(input, &Default::default()).await.unwrap();
  let code = &output.chunks[0].code;
  let position = |tag: &str| code.find(tag).unwrap_or_else(|| panic!("{tag} is missing"));
  assert!(position("\"R1\"") < position("\"R3\""));
  assert!(position("\"R3\"") < position("\"R2\""));
}

#[tokio::test]
async fn chunk_hashes_are_deterministic() {
  let files = [
    ("/project/src/index.js", "import './a';"),
    ("/project/src/a.js", "import('./b').then(console.log);"),
    ("/project/src/b.js", "export default 'b';"),
  ];
  let output_options = OutputOptions {
    entry_file_names: FileNameTemplate::from("[name].[contenthash:8].js"),
    chunk_file_names: FileNameTemplate::from("[name].[contenthash:8].js"),
    runtime_chunk: RuntimeChunk::single(),
    ..Default::default()
  };
  let input = [("index", "./src/index.js")];

  let first = build(&files, &input, &output_options).await.unwrap();
  let second = build(&files, &input, &output_options).await.unwrap();
  for chunk in &first.chunks {
    let again = second.chunk_by_name(&chunk.name).unwrap();
    assert_eq!(chunk.content_hash, again.content_hash);
    assert_eq!(chunk.file_name, again.file_name);
    assert_eq!(chunk.code, again.code);
  }

  let changed_files = [files[0], files[1], ("/project/src/b.js", "export default 'B';")];
  let changed = build(&changed_files, &input, &output_options).await.unwrap();
  let hash_of = |output: &BundleOutput, name: &str| output.chunk_by_name(name).unwrap().content_hash.clone();
  assert_ne!(hash_of(&first, "src_b"), hash_of(&changed, "src_b"));
  assert_eq!(hash_of(&first, "index"), hash_of(&changed, "index"));
  // The runtime embeds the new file name of `src_b`
  assert_ne!(hash_of(&first, "runtime"), hash_of(&changed, "runtime"));
  let file_name = &changed.chunk_by_name("src_b").unwrap().file_name;
  assert!(changed.chunk_by_name("runtime").unwrap().code.contains(file_name.as_str()));
}

#[tokio::test]
async fn modules_shared_by_entries_are_extracted_once() {
  let files = [
    ("/project/src/e1.js", "import './shared';"),
    ("/project/src/e2.js", "import './shared';"),
    ("/project/src/e3.js", "import './shared';"),
    ("/project/src/shared.js", "export default 'shared';"),
  ];
  let output_options = OutputOptions {
    split_chunks: split_everything(),
    ..Default::default()
  };
  let output = build(
    &files,
    &[("e1", "./src/e1.js"), ("e2", "./src/e2.js"), ("e3", "./src/e3.js")],
    &output_options,
  )
  .await
  .unwrap();

  let shared = output
    .chunks
    .iter()
    .filter(|c| c.kind == ChunkKind::Shared)
    .collect::<Vec<_>>();
  assert_eq!(shared.len(), 1);
  assert_eq!(shared[0].name, "default~e1~e2~e3");
  assert_eq!(shared[0].modules, vec!["src/shared.js"]);
  for entry in ["e1", "e2", "e3"] {
    assert_eq!(sorted_modules(&output, entry), vec![format!("src/{entry}.js")]);
    assert_eq!(
      output.entrypoint(entry).unwrap().files,
      vec!["default~e1~e2~e3.js".to_string(), format!("{entry}.js")]
    );
  }
}

#[tokio::test]
async fn min_chunks_is_respected() {
  let files = [
    ("/project/src/e1.js", "import './shared';\nimport './only-one';"),
    ("/project/src/e2.js", "import './shared';"),
    ("/project/src/shared.js", "export default 'shared';"),
    ("/project/src/only-one.js", "export default 1;"),
  ];
  let mut split_chunks = split_everything();
  split_chunks.cache_groups = vec![CacheGroup {
    min_chunks: Some(3),
    ..CacheGroup::default_group()
  }];
  let output = build(
    &files,
    &[("e1", "./src/e1.js"), ("e2", "./src/e2.js")],
    &OutputOptions {
      split_chunks,
      ..Default::default()
    },
  )
  .await
  .unwrap();
  assert_eq!(
    chunk_layout(&output),
    vec![
      ("e1".to_string(), ChunkKind::Entry),
      ("e2".to_string(), ChunkKind::Entry)
    ]
  );
}

#[tokio::test]
async fn higher_priority_group_wins() {
  let files = [
    ("/project/src/e1.js", "import 'lib';\nimport './util';"),
    ("/project/src/e2.js", "import 'lib';\nimport './util';"),
    ("/project/src/util.js", "export default 1;"),
    ("/project/node_modules/lib/index.js", "export default 'lib';"),
  ];
  let output = build(
    &files,
    &[("e1", "./src/e1.js"), ("e2", "./src/e2.js")],
    &OutputOptions {
      split_chunks: split_everything(),
      ..Default::default()
    },
  )
  .await
  .unwrap();
  assert_eq!(
    sorted_modules(&output, "vendors~e1~e2"),
    vec!["node_modules/lib/index.js"]
  );
  assert_eq!(sorted_modules(&output, "default~e1~e2"), vec!["src/util.js"]);
}

#[tokio::test]
async fn dynamic_import_with_runtime_chunk() {
  let files = [
    ("/project/src/index.js", "import './a';"),
    ("/project/src/a.js", "export const load = () => import('./b');"),
    ("/project/src/b.js", "export default 'b';"),
  ];
  let output = build(
    &files,
    &[("index", "./src/index.js")],
    &OutputOptions {
      runtime_chunk: RuntimeChunk::single(),
      ..Default::default()
    },
  )
  .await
  .unwrap();

  assert_eq!(
    chunk_layout(&output),
    vec![
      ("index".to_string(), ChunkKind::Entry),
      ("runtime".to_string(), ChunkKind::Runtime),
      ("src_b".to_string(), ChunkKind::Async),
    ]
  );
  assert_eq!(sorted_modules(&output, "index"), vec!["src/a.js", "src/index.js"]);
  assert_eq!(sorted_modules(&output, "src_b"), vec!["src/b.js"]);
  assert!(output.chunk_by_name("runtime").unwrap().modules.is_empty());
  assert_eq!(
    output.entrypoint("index").unwrap().files,
    vec!["runtime.js", "index.js"]
  );
  let runtime = &output.chunk_by_name("runtime").unwrap().code;
  assert!(runtime.contains(r#"var chunkFiles = {"src_b":"src_b.js"};"#));
  assert!(runtime.contains(r#"var splitPoints = {"src/b.js":["src_b"]};"#));
  assert!(!output.chunk_by_name("index").unwrap().code.contains("chunkFiles"));
}

#[tokio::test]
async fn magic_comment_names_async_chunks() {
  let files = [
    (
      "/project/src/index.js",
      "import(/* webpackChunkName: 'test', webpackPrefetch: true */ './test');\nimport(/* webpackChunkName: \"test\" */ './other');",
    ),
    ("/project/src/test.js", "export default 1;"),
    ("/project/src/other.js", "export default 2;"),
  ];
  let output = build(&files, &[("main", "./src/index.js")], &Default::default())
    .await
    .unwrap();
  assert_eq!(
    chunk_layout(&output),
    vec![
      ("main".to_string(), ChunkKind::Entry),
      ("test".to_string(), ChunkKind::Async)
    ]
  );
  assert_eq!(sorted_modules(&output, "test"), vec!["src/other.js", "src/test.js"]);
  // `webpackPrefetch` hints the chunk as soon as `main` is registered
  assert!(output.chunks[0].code.contains(r#"var prefetchChunks = {"main":["test"]};"#));
}

#[tokio::test]
async fn modules_loaded_by_the_parent_are_not_duplicated() {
  let files = [
    ("/project/src/index.js", "import './util';\nimport('./page');"),
    ("/project/src/page.js", "import './util';\nexport default 'page';"),
    ("/project/src/util.js", "export default 'util';"),
  ];
  let output = build(&files, &[("main", "./src/index.js")], &Default::default())
    .await
    .unwrap();
  assert_eq!(sorted_modules(&output, "src_page"), vec!["src/page.js"]);
}

#[tokio::test]
async fn per_entry_runtime_chunks() {
  let files = [
    ("/project/src/a.js", "export default 'a';"),
    ("/project/src/b.js", "export default 'b';"),
  ];
  let output = build(
    &files,
    &[("a", "./src/a.js"), ("b", "./src/b.js")],
    &OutputOptions {
      runtime_chunk: RuntimeChunk::per_entry(),
      ..Default::default()
    },
  )
  .await
  .unwrap();
  assert_eq!(
    output.entrypoint("a").unwrap().files,
    vec!["runtime~a.js", "a.js"]
  );
  assert_eq!(
    output.entrypoint("b").unwrap().files,
    vec!["runtime~b.js", "b.js"]
  );
}

#[tokio::test]
async fn missing_import_is_a_resolution_error() {
  let files = [("/src/index.js", "import './missing';")];
  let mut input = input_options(&files, &[("main", "./src/index.js")]);
  input.cwd = PathBuf::from("/");
  let errors = build_with(input, &Default::default()).await.unwrap_err();
  let err = errors.first();
  assert_eq!(err.kind.code(), "UNRESOLVED_IMPORT");
  assert_eq!(err.kind.category(), ErrorCategory::Resolution);
  insta::assert_snapshot!(
    err.kind.to_readable_string("/"),
    @r###"Could not resolve "./missing" from "src/index.js"."###
  );
}

#[tokio::test]
async fn missing_entry_is_a_resolution_error() {
  let errors = build(&[], &[("main", "./src/index.js")], &Default::default())
    .await
    .unwrap_err();
  assert_eq!(errors.first().kind.code(), "UNRESOLVED_ENTRY");
}

#[tokio::test]
async fn file_without_loader_is_a_transform_error() {
  let files = [
    ("/project/src/index.js", "import './style.css';"),
    ("/project/src/style.css", "body { color: red; }"),
  ];
  let errors = build(&files, &[("main", "./src/index.js")], &Default::default())
    .await
    .unwrap_err();
  assert_eq!(errors.first().kind.category(), ErrorCategory::Transform);
}

#[tokio::test]
async fn syntax_error_is_a_transform_error() {
  let files = [("/project/src/index.js", "import from from from;")];
  let errors = build(&files, &[("main", "./src/index.js")], &Default::default())
    .await
    .unwrap_err();
  assert_eq!(errors.first().kind.code(), "PARSE_FAILED");
  assert_eq!(errors.first().kind.category(), ErrorCategory::Transform);
}

#[tokio::test]
async fn empty_input_is_rejected() {
  let errors = build(&[], &[], &Default::default()).await.unwrap_err();
  assert_eq!(errors.first().kind.code(), "INVALID_CONFIG");
}

#[tokio::test]
async fn chunk_name_conflicts() {
  let files = [
    ("/project/src/index.js", "import(/* webpackChunkName: 'other' */ './lazy');"),
    ("/project/src/other.js", "export default 1;"),
    ("/project/src/lazy.js", "export default 2;"),
  ];
  let errors = build(
    &files,
    &[("main", "./src/index.js"), ("other", "./src/other.js")],
    &Default::default(),
  )
  .await
  .unwrap_err();
  assert_eq!(errors.first().kind.code(), "CHUNK_NAME_CONFLICT");
  assert_eq!(errors.first().kind.category(), ErrorCategory::Chunking);

  let errors = build(
    &files[1..],
    &[("main", "./src/lazy.js"), ("other", "./src/other.js")],
    &OutputOptions {
      entry_file_names: FileNameTemplate::from("bundle.js"),
      ..Default::default()
    },
  )
  .await
  .unwrap_err();
  assert_eq!(errors.first().kind.code(), "CHUNK_NAME_CONFLICT");
}

#[tokio::test]
async fn externals_are_not_bundled() {
  let files = [("/project/src/index.js", "import $ from 'jquery';\n$('body');")];
  let mut input = input_options(&files, &[("main", "./src/index.js")]);
  input
    .externals
    .insert("jquery".to_string(), "jQuery".to_string());
  let output = build_with(input, &Default::default()).await.unwrap();
  let chunk = output.chunk_by_name("main").unwrap();
  assert_eq!(
    sorted_modules(&output, "main"),
    vec!["external:jquery", "src/index.js"]
  );
  assert!(chunk.code.contains("module.exports = jQuery;"));
  assert!(chunk.code.contains(r#"{"jquery":"external:jquery"}"#));
}

#[tokio::test]
async fn stylesheets_and_images_go_through_loaders() {
  let files = [
    ("/project/src/index.js", "import './style.css';"),
    (
      "/project/src/style.css",
      "body { background: url(./logo.png); }\n.icon { background: url(./icon.png); }",
    ),
    ("/project/src/logo.png", "a large enough picture"),
    ("/project/src/icon.png", "tiny"),
  ];
  let registry = LoaderRegistry::with_builtins();
  let mut input = input_options(&files, &[("main", "./src/index.js")]);
  input.pipeline = TransformPipeline::new(vec![
    Rule::new(
      Condition::regex(r"\.css$").unwrap(),
      vec![
        registry.create("style-loader", &serde_json::Value::Null).unwrap(),
        registry.create("css-loader", &serde_json::Value::Null).unwrap(),
      ],
    ),
    Rule::new(
      Condition::regex(r"\.png$").unwrap(),
      vec![registry
        .create(
          "url-loader",
          &serde_json::json!({ "limit": 10, "name": "img/[name].[hash:10].[ext]", "esModule": false }),
        )
        .unwrap()],
    ),
  ]);
  let output = build_with(input, &Default::default()).await.unwrap();

  assert_eq!(
    sorted_modules(&output, "main"),
    vec!["src/icon.png", "src/index.js", "src/logo.png", "src/style.css"]
  );
  assert_eq!(output.assets.len(), 1);
  let asset = &output.assets[0];
  assert!(asset.file_name.starts_with("img/logo."));
  assert!(asset.file_name.ends_with(".png"));
  assert_eq!(asset.source, b"a large enough picture");
  let code = &output.chunks[0].code;
  assert!(code.contains("document.createElement(\"style\")"));
  assert!(code.contains("data:image/png;base64,"));
}

#[tokio::test]
async fn json_modules_are_supported_without_rules() {
  let files = [
    ("/project/src/index.js", "import data from './data.json';"),
    ("/project/src/data.json", r#"{ "answer": 42 }"#),
  ];
  let output = build(&files, &[("main", "./src/index.js")], &Default::default())
    .await
    .unwrap();
  assert!(output.chunks[0].code.contains("42"));
}

#[tokio::test]
async fn manifest_lists_the_output() {
  let files = [
    ("/project/src/index.js", "import('./lazy');"),
    ("/project/src/lazy.js", "export default 1;"),
  ];
  let output = build(
    &files,
    &[("main", "./src/index.js")],
    &OutputOptions {
      manifest: Some("manifest.json".to_string()),
      ..Default::default()
    },
  )
  .await
  .unwrap();
  let manifest: serde_json::Value =
    serde_json::from_slice(&output.asset_by_file_name("manifest.json").unwrap().source).unwrap();
  assert_eq!(
    manifest,
    serde_json::json!({
      "entrypoints": { "main": ["main.js"] },
      "chunks": { "main": "main.js", "src_lazy": "src_lazy.js" },
      "assets": []
    })
  );
}

#[tokio::test]
async fn html_plugin_loads_initial_chunks() {
  let files = [("/project/src/index.js", "console.log('hi');")];
  let mut bundler = Bundler::with_plugins(
    input_options(&files, &[("main", "./src/index.js")]),
    vec![HtmlPlugin::new_boxed(HtmlPluginOptions {
      title: Some("Demo".to_string()),
      ..Default::default()
    })],
  );
  let output = bundler
    .generate(&OutputOptions {
      runtime_chunk: RuntimeChunk::single(),
      ..Default::default()
    })
    .await
    .unwrap();
  let html = String::from_utf8(output.asset_by_file_name("index.html").unwrap().source.clone()).unwrap();
  assert!(html.contains("<title>Demo</title>"));
  assert!(html.contains("<script src=\"runtime.js\"></script>\n  <script src=\"main.js\"></script>"));
}

#[derive(Debug)]
struct Banner;

#[rollpack_plugin::async_trait::async_trait]
impl BuildPlugin for Banner {
  fn name(&self) -> rollpack_plugin::PluginName {
    "banner".into()
  }

  async fn before_resolve(
    &self,
    _ctx: &mut rollpack_plugin::Context,
    args: &mut rollpack_plugin::ResolveArgs,
  ) -> rollpack_plugin::ResolveOutput {
    Ok((args.specifier == "virtual:banner").then(|| rollpack_plugin::ResolvedId {
      id: "/project/src/banner.js".to_string(),
      external: false,
    }))
  }

  async fn after_transform(
    &self,
    _ctx: &mut rollpack_plugin::Context,
    args: &mut rollpack_plugin::TransformArgs,
  ) -> rollpack_plugin::TransformOutput {
    Ok(Some(format!(
      "{}\nconsole.log(\"banner for {}\");",
      args.code,
      args.id.stable_key(Path::new(CWD))
    )))
  }
}

#[tokio::test]
async fn plugins_take_part_in_resolution_and_transform() {
  let files = [
    ("/project/src/index.js", "import 'virtual:banner';"),
    ("/project/src/banner.js", "export default 'banner';"),
  ];
  let output = Bundler::with_plugins(
    input_options(&files, &[("main", "./src/index.js")]),
    vec![Box::new(Banner)],
  )
  .generate(&Default::default())
  .await
  .unwrap();
  assert_eq!(sorted_modules(&output, "main"), vec!["src/banner.js", "src/index.js"]);
  let code = &output.chunks[0].code;
  assert!(code.contains("\"banner for src/banner.js\""));
  assert!(code.contains("\"banner for src/index.js\""));
}

#[tokio::test]
async fn production_mode_minimizes_and_reports_large_files() {
  let files = [("/project/src/index.js", "const a = 1;   \n\n\nconsole.log(a);\n")];
  let warnings: Arc<Mutex<Vec<BuildError>>> = Default::default();
  let mut input = input_options(&files, &[("main", "./src/index.js")]);
  input.mode = Mode::Production;
  let collector = warnings.clone();
  input.on_warn = Arc::new(move |err| collector.lock().unwrap().push(err));
  let output = build_with(
    input,
    &OutputOptions {
      max_asset_size: Some(64),
      ..Default::default()
    },
  )
  .await
  .unwrap();
  assert!(output.chunks[0].code.contains("const a = 1;\nconsole.log(a);"));
  let warnings = warnings.lock().unwrap();
  assert_eq!(warnings.len(), 1);
  assert_eq!(warnings[0].kind.code(), "ASSET_TOO_LARGE");
}

#[tokio::test]
async fn write_puts_files_in_the_output_dir() {
  let fs = Arc::new(MemoryFileSystem::new(&[
    ("/project/src/index.js", "import('./lazy');"),
    ("/project/src/lazy.js", "export default 1;"),
  ]));
  let shared: SharedFileSystem = fs.clone();
  let mut bundler = Bundler::new(InputOptions {
    input: vec![InputItem::new("main", "./src/index.js")],
    cwd: PathBuf::from(CWD),
    fs: shared,
    ..Default::default()
  });
  bundler
    .write(&OutputOptions {
      dir: Some("build".to_string()),
      chunk_file_names: FileNameTemplate::from("js/[name].js"),
      ..Default::default()
    })
    .await
    .unwrap();
  assert!(fs.is_file(Path::new("/project/build/main.js")));
  assert!(fs.is_file(Path::new("/project/build/js/src_lazy.js")));
}

#[tokio::test]
async fn builds_from_a_config_file() {
  let fs = MemoryFileSystem::new(&[
    (
      "/project/rollpack.config.json",
      r#"{
        "entry": { "index": "./src/index.js" },
        "output": { "filename": "[name].js", "publicPath": "/assets/" },
        "module": { "rules": [ { "test": "\\.txt$", "use": "raw-loader" } ] },
        "resolve": { "alias": { "@": "./src" } },
        "optimization": { "runtimeChunk": "single" }
      }"#,
    ),
    ("/project/src/index.js", "import text from '@/hello.txt';\nimport('@/lazy');"),
    ("/project/src/hello.txt", "hello"),
    ("/project/src/lazy.js", "export default 1;"),
  ])
  .into_shared();
  let config = RollpackConfig::load(&fs, Path::new("/project/rollpack.config.json")).unwrap();
  let resolved = config
    .resolve(Path::new(CWD), None, fs, &LoaderRegistry::with_builtins())
    .unwrap();
  let output = Bundler::with_plugins(resolved.input, resolved.plugins)
    .generate(&resolved.output)
    .await
    .unwrap();
  assert_eq!(sorted_modules(&output, "index"), vec!["src/hello.txt", "src/index.js"]);
  let runtime = &output.chunk_by_name("runtime").unwrap().code;
  assert!(runtime.contains(r#"var publicPath = "/assets/";"#));
  assert!(output.chunk_by_name("index").unwrap().code.contains("\"hello\""));
}

#[tokio::test]
async fn every_chunk_is_a_script() {
  let files = [
    (
      "/project/src/index.js",
      "import { sum } from './math';\nimport * as all from './math';\nimport data from './data.json';\nimport './style.css';\nexport * from './math';\nexport default sum(data.a, all.one);\nimport('./lazy').then(({ lazy }) => lazy());",
    ),
    ("/project/src/math.js", "export const one = 1;\nexport function sum(a, b) {\n  return a + b;\n}"),
    ("/project/src/data.json", r#"{ "a": 1 }"#),
    ("/project/src/style.css", "body { color: red; }"),
    (
      "/project/src/lazy.js",
      "import { one } from './math';\nexport const lazy = async () => (await import('./math')).one + one;",
    ),
  ];
  let registry = LoaderRegistry::with_builtins();
  let mut input = input_options(&files, &[("index", "./src/index.js")]);
  input.pipeline = TransformPipeline::new(vec![Rule::new(
    Condition::regex(r"\.css$").unwrap(),
    vec![
      registry.create("style-loader", &serde_json::Value::Null).unwrap(),
      registry.create("css-loader", &serde_json::Value::Null).unwrap(),
    ],
  )]);
  let output = build_with(
    input,
    &OutputOptions {
      runtime_chunk: RuntimeChunk::single(),
      split_chunks: split_everything(),
      ..Default::default()
    },
  )
  .await
  .unwrap();

  assert_chunks_are_scripts(&output);
  for chunk in &output.chunks {
    assert!(!chunk.code.contains("import("), "{}", chunk.code);
    assert!(!chunk.code.contains("export "), "{}", chunk.code);
  }
  let index = &output.chunk_by_name("index").unwrap().code;
  assert!(index.contains("require(\"./math\")") || index.contains("require('./math')"));
  assert!(index.contains("__rollpack_import__("));
}

#[tokio::test]
async fn dynamic_import_of_a_loaded_module_creates_no_chunk() {
  let files = [
    (
      "/project/src/index.js",
      "import { a } from './a';\nimport('./a').then((m) => console.log(m.a === a));",
    ),
    ("/project/src/a.js", "export const a = 'a';"),
  ];
  let output = build(&files, &[("main", "./src/index.js")], &Default::default())
    .await
    .unwrap();
  assert_eq!(chunk_layout(&output), vec![("main".to_string(), ChunkKind::Entry)]);
  assert_eq!(sorted_modules(&output, "main"), vec!["src/a.js", "src/index.js"]);
  let code = &output.chunks[0].code;
  assert!(code.contains(r#"var splitPoints = {"src/a.js":[]};"#));
  assert!(code.contains("var chunkFiles = {};"));
  assert_chunks_are_scripts(&output);
}

#[tokio::test]
async fn nested_split_point_served_by_its_parent() {
  let files = [
    ("/project/src/index.js", "import('./page');"),
    ("/project/src/page.js", "import './widget';\nexport const open = () => import('./widget');"),
    ("/project/src/widget.js", "export default 'widget';"),
  ];
  let output = build(&files, &[("main", "./src/index.js")], &Default::default())
    .await
    .unwrap();
  assert_eq!(
    chunk_layout(&output),
    vec![
      ("main".to_string(), ChunkKind::Entry),
      ("src_page".to_string(), ChunkKind::Async)
    ]
  );
  assert_eq!(sorted_modules(&output, "src_page"), vec!["src/page.js", "src/widget.js"]);
  let code = &output.chunk_by_name("main").unwrap().code;
  assert!(code.contains(r#"var splitPoints = {"src/page.js":["src_page"],"src/widget.js":["src_page"]};"#));
}

#[tokio::test]
async fn exported_asset_url_is_the_emitted_file_name() {
  let files = [
    (
      "/project/src/index.js",
      "import logo from './logo.svg';\ndocument.body.style.backgroundImage = `url(${logo})`;",
    ),
    ("/project/src/logo.svg", "<svg/>"),
  ];
  let registry = LoaderRegistry::with_builtins();
  let mut input = input_options(&files, &[("main", "./src/index.js")]);
  input.pipeline = TransformPipeline::new(vec![Rule::new(
    Condition::regex(r"\.svg$").unwrap(),
    vec![registry.create("file-loader", &serde_json::Value::Null).unwrap()],
  )])
  .with_asset_file_names(FileNameTemplate::from("static/[name].[ext]"));
  let output = build_with(input, &Default::default()).await.unwrap();

  assert_eq!(
    output
      .assets
      .iter()
      .map(|a| a.file_name.as_str())
      .collect::<Vec<_>>(),
    vec!["static/logo.svg"]
  );
  assert!(output.chunks[0].code.contains("\"static/logo.svg\""));
}

#[tokio::test]
async fn async_chunk_is_reused_by_an_entry() {
  let files = [
    ("/project/src/a.js", "import './c';"),
    ("/project/src/b.js", "import('./c');"),
    ("/project/src/c.js", "export default 'c';"),
  ];
  let output = build(
    &files,
    &[("a", "./src/a.js"), ("b", "./src/b.js")],
    &OutputOptions {
      split_chunks: split_everything(),
      ..Default::default()
    },
  )
  .await
  .unwrap();
  assert_eq!(
    chunk_layout(&output),
    vec![
      ("a".to_string(), ChunkKind::Entry),
      ("b".to_string(), ChunkKind::Entry),
      ("src_c".to_string(), ChunkKind::Async)
    ]
  );
  assert_eq!(sorted_modules(&output, "a"), vec!["src/a.js"]);
  assert_eq!(sorted_modules(&output, "src_c"), vec!["src/c.js"]);
  assert_eq!(output.entrypoint("a").unwrap().files, vec!["src_c.js", "a.js"]);
  assert_eq!(output.entrypoint("b").unwrap().files, vec!["b.js"]);
}

#[tokio::test]
async fn async_root_stays_without_reuse() {
  let files = [
    ("/project/src/a.js", "import './c';"),
    ("/project/src/b.js", "import('./c');"),
    ("/project/src/c.js", "export default 'c';"),
  ];
  let mut split_chunks = split_everything();
  split_chunks.cache_groups = vec![CacheGroup {
    reuse_existing_chunk: false,
    ..CacheGroup::default_group()
  }];
  let output = build(
    &files,
    &[("a", "./src/a.js"), ("b", "./src/b.js")],
    &OutputOptions {
      split_chunks,
      ..Default::default()
    },
  )
  .await
  .unwrap();
  assert_eq!(sorted_modules(&output, "a"), vec!["src/a.js", "src/c.js"]);
  assert_eq!(sorted_modules(&output, "src_c"), vec!["src/c.js"]);
  assert!(output.chunks.iter().all(|c| c.kind != ChunkKind::Shared));
}

#[tokio::test]
async fn stylesheets_are_extracted_per_chunk() {
  let files = [
    ("/project/src/index.js", "import './base.css';\nimport('./page');"),
    (
      "/project/src/base.css",
      "@import './reset.css';\nbody { background: url(./logo.png); }",
    ),
    ("/project/src/reset.css", "* { margin: 0; }"),
    ("/project/src/logo.png", "png"),
    ("/project/src/page.js", "import './page.css';\nexport default 'page';"),
    ("/project/src/page.css", ".page { color: red; }"),
  ];
  let registry = LoaderRegistry::with_builtins();
  let mut input = input_options(&files, &[("main", "./src/index.js")]);
  input.pipeline = TransformPipeline::new(vec![
    Rule::new(
      Condition::regex(r"\.css$").unwrap(),
      vec![
        registry
          .create("mini-css-extract-loader", &serde_json::Value::Null)
          .unwrap(),
        registry.create("css-loader", &serde_json::Value::Null).unwrap(),
      ],
    ),
    Rule::new(
      Condition::regex(r"\.png$").unwrap(),
      vec![registry
        .create("file-loader", &serde_json::json!({ "name": "img/[name].[ext]" }))
        .unwrap()],
    ),
  ]);
  let output = Bundler::with_plugins(input, vec![HtmlPlugin::new_boxed(Default::default())])
    .generate(&Default::default())
    .await
    .unwrap();

  let text_of = |file_name: &str| {
    String::from_utf8(
      output
        .asset_by_file_name(file_name)
        .unwrap_or_else(|| panic!("{file_name} is missing"))
        .source
        .clone(),
    )
    .unwrap()
  };
  let main_css = text_of("main.css");
  assert!(main_css.find("margin").unwrap() < main_css.find("body").unwrap());
  assert!(main_css.contains("url(img/logo.png)"));
  assert!(!main_css.contains("@import"));
  assert!(text_of("src_page.css").contains(".page { color: red; }"));
  assert!(output.asset_by_file_name("img/logo.png").is_some());

  let main = output.chunk_by_name("main").unwrap();
  assert_eq!(main.css_file.as_deref(), Some("main.css"));
  assert!(!main.code.contains("margin"));
  assert!(main.code.contains(r#"var cssFiles = {"src_page":"src_page.css"};"#));
  assert_eq!(output.entrypoint("main").unwrap().styles, vec!["main.css"]);
  assert!(text_of("index.html").contains("<link rel=\"stylesheet\" href=\"main.css\">"));
  assert_chunks_are_scripts(&output);
}

#[tokio::test]
async fn failed_write_leaves_no_files() {
  let fs = Arc::new(MemoryFileSystem::new(&[
    ("/project/src/index.js", "import './ok';\nimport('./broken');"),
    ("/project/src/ok.js", "export default 1;"),
    ("/project/src/broken.js", "import from from from;"),
  ]));
  let shared: SharedFileSystem = fs.clone();
  let mut bundler = Bundler::new(InputOptions {
    input: vec![InputItem::new("main", "./src/index.js")],
    cwd: PathBuf::from(CWD),
    fs: shared,
    ..Default::default()
  });
  let errors = bundler
    .write(&OutputOptions {
      dir: Some("build".to_string()),
      ..Default::default()
    })
    .await
    .unwrap_err();
  assert_eq!(errors.first().kind.code(), "PARSE_FAILED");
  assert!(fs
    .file_paths()
    .iter()
    .all(|path| !path.starts_with("/project/build")));
  assert!(!fs.is_dir(Path::new("/project/build")));
}

#[derive(Debug)]
struct Slow(Arc<AtomicUsize>);

impl Loader for Slow {
  fn name(&self) -> &str {
    "slow"
  }

  fn run(&self, _ctx: &mut LoaderContext, source: String) -> rollpack_error::anyhow::Result<String> {
    std::thread::sleep(Duration::from_millis(20));
    self.0.fetch_add(1, Ordering::SeqCst);
    Ok(source)
  }
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn one_failure_aborts_pending_siblings() {
  let siblings = 40;
  let mut files = vec![
    ("/project/src/broken.js".to_string(), "import from from from;".to_string()),
  ];
  let mut index = "import './broken';\n".to_string();
  for i in 0..siblings {
    files.push((format!("/project/src/s{i}.js"), format!("export default {i};")));
    index.push_str(&format!("import './s{i}';\n"));
  }
  files.push(("/project/src/index.js".to_string(), index));
  let files = files
    .iter()
    .map(|(path, code)| (path.as_str(), code.as_str()))
    .collect::<Vec<_>>();

  let ran: Arc<AtomicUsize> = Default::default();
  let mut input = input_options(&files, &[("main", "./src/index.js")]);
  input.concurrency = Some(1);
  input.pipeline = TransformPipeline::new(vec![Rule::new(
    Condition::regex(r"/s\d+\.js$").unwrap(),
    vec![Arc::new(Slow(ran.clone()))],
  )]);
  let errors = build_with(input, &Default::default()).await.unwrap_err();

  assert_eq!(errors.len(), 1);
  assert_eq!(errors.first().kind.code(), "PARSE_FAILED");
  assert!(ran.load(Ordering::SeqCst) < siblings);
}
