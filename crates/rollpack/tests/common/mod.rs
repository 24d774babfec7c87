use std::path::{Path, PathBuf};

use rollpack::{BuildResult, BundleOutput, Bundler};
use rollpack_test_utils::{script::assert_chunks_are_scripts, tester::Tester};

pub struct CompiledFixture {
  pub tester: Tester,
  pub output: BuildResult<BundleOutput>,
  pub fixture_path: PathBuf,
}

impl CompiledFixture {
  fn chunk_name_of_file<'a>(&self, output: &'a BundleOutput, file_name: &str) -> &'a str {
    output
      .chunks
      .iter()
      .find(|c| c.file_name == file_name)
      .map(|c| c.name.as_str())
      .unwrap_or_else(|| panic!("{file_name} is not a chunk"))
  }

  fn assert_output(&self) {
    let output = self.output.as_ref().unwrap_or_else(|errors| {
      panic!(
        "Build of {} failed: {}",
        self.fixture_path.display(),
        errors.first().kind.to_readable_string(&self.fixture_path)
      )
    });
    let config = &self.tester.config;
    assert_chunks_are_scripts(output);

    if let Some(expected_chunks) = &config.expected_chunks {
      let mut actual = output
        .chunks
        .iter()
        .map(|c| {
          let mut modules = c.modules.clone();
          modules.sort();
          (c.name.clone(), c.kind.to_string(), modules)
        })
        .collect::<Vec<_>>();
      actual.sort();
      let mut expected = expected_chunks
        .iter()
        .map(|c| {
          let mut modules = c.modules.clone();
          modules.sort();
          (c.name.clone(), c.kind.clone(), modules)
        })
        .collect::<Vec<_>>();
      expected.sort();
      assert_eq!(actual, expected);
    }

    if let Some(expected_entrypoints) = &config.expected_entrypoints {
      for expected in expected_entrypoints {
        let entrypoint = output
          .entrypoint(&expected.name)
          .unwrap_or_else(|| panic!("Entrypoint {} is missing", expected.name));
        let chunks = entrypoint
          .files
          .iter()
          .map(|file| self.chunk_name_of_file(output, file))
          .collect::<Vec<_>>();
        assert_eq!(chunks, expected.chunks);
      }
    }

    for asset in &config.expected_assets {
      assert!(
        output.asset_by_file_name(asset).is_some(),
        "Asset {asset} is missing"
      );
    }
  }
}

pub async fn compile_fixture(test_config_path: &Path) -> CompiledFixture {
  let fixture_path = test_config_path
    .parent()
    .unwrap()
    .canonicalize()
    .unwrap();

  let mut tester = Tester::from_config_path(test_config_path);

  let output = match tester.resolved_config(&fixture_path) {
    Ok(resolved) => {
      Bundler::with_plugins(resolved.input, resolved.plugins)
        .generate(&resolved.output)
        .await
    }
    Err(err) => Err(err.into()),
  };

  CompiledFixture {
    tester,
    output,
    fixture_path,
  }
}

pub fn run_test(test_config_path: &Path) {
  // compile the fixture folder
  let compiled_fx = tokio::runtime::Runtime::new()
    .unwrap()
    .block_on(crate::common::compile_fixture(test_config_path));

  // If the test config has an expected error, assert that the error matches
  if let Some(expected_error) = &compiled_fx.tester.config.expected_error {
    let errors = compiled_fx
      .output
      .as_ref()
      .err()
      .expect("Expected error but got success");
    let error = errors.first();
    assert_eq!(error.kind.code(), expected_error.code);
    if let Some(message) = &expected_error.message {
      let readable = error.kind.to_readable_string(&compiled_fx.fixture_path);
      assert!(
        readable.contains(message.as_str()),
        "{readable:?} does not contain {message:?}"
      );
    }
    return;
  }

  compiled_fx.assert_output();
}
