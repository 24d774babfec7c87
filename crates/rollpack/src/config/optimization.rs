use std::collections::BTreeMap;

use hashlink::LinkedHashMap;
use regex::Regex;
use rollpack_common::FileNameTemplate;
use rollpack_core::{CacheGroup, ChunksFilter, RuntimeChunk, SplitChunksOptions};
use rollpack_error::Error;
use schemars::JsonSchema;
use serde::Deserialize;

#[derive(Debug, Default, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct OptimizationConfig {
  /// `false` turns extraction off.
  #[serde(default)]
  pub split_chunks: Option<SplitChunksSetting>,
  #[serde(default)]
  pub runtime_chunk: Option<RuntimeChunkConfig>,
  #[serde(default)]
  pub minimize: Option<bool>,
}

#[derive(Debug, Deserialize, JsonSchema)]
#[serde(untagged)]
pub enum SplitChunksSetting {
  Enabled(bool),
  Options(SplitChunksConfig),
}

#[derive(Debug, Default, Clone, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct SplitChunksConfig {
  #[serde(default)]
  pub chunks: Option<String>,
  #[serde(default)]
  pub min_size: Option<usize>,
  #[serde(default)]
  pub min_chunks: Option<usize>,
  #[serde(default)]
  pub max_async_requests: Option<usize>,
  #[serde(default)]
  pub max_initial_requests: Option<usize>,
  #[serde(default)]
  pub automatic_name_delimiter: Option<String>,
  /// Merged over the builtin `vendors` and `default` groups. `false` removes
  /// a group.
  #[serde(default)]
  #[schemars(with = "BTreeMap<String, CacheGroupSetting>")]
  pub cache_groups: LinkedHashMap<String, CacheGroupSetting>,
}

#[derive(Debug, Clone, Deserialize, JsonSchema)]
#[serde(untagged)]
pub enum CacheGroupSetting {
  Enabled(bool),
  Group(CacheGroupConfig),
}

#[derive(Debug, Default, Clone, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct CacheGroupConfig {
  #[serde(default)]
  pub test: Option<String>,
  #[serde(default)]
  pub name: Option<String>,
  #[serde(default)]
  pub priority: Option<i32>,
  #[serde(default)]
  pub chunks: Option<String>,
  #[serde(default)]
  pub min_chunks: Option<usize>,
  #[serde(default)]
  pub min_size: Option<usize>,
  #[serde(default)]
  pub reuse_existing_chunk: Option<bool>,
  #[serde(default)]
  pub enforce: Option<bool>,
}

#[derive(Debug, Deserialize, JsonSchema)]
#[serde(untagged)]
pub enum RuntimeChunkConfig {
  /// `true` is the same as `"multiple"`.
  Enabled(bool),
  /// `"single"` or `"multiple"`.
  Preset(String),
  /// A name containing `[name]` gives one runtime chunk per entry.
  Named { name: String },
}

fn parse_chunks(value: &str) -> rollpack_error::Result<ChunksFilter> {
  value.parse().map_err(Error::invalid_config)
}

impl CacheGroupConfig {
  fn apply(self, group: &mut CacheGroup) -> rollpack_error::Result<()> {
    if let Some(test) = self.test {
      group.test = Some(Regex::new(&test).map_err(|err| {
        Error::invalid_config(format!(
          "Invalid test \"{test}\" of cache group \"{}\": {err}",
          group.key
        ))
      })?);
    }
    if let Some(name) = self.name {
      group.name = Some(name);
    }
    if let Some(priority) = self.priority {
      group.priority = priority;
    }
    if let Some(chunks) = self.chunks {
      group.chunks = Some(parse_chunks(&chunks)?);
    }
    if let Some(min_chunks) = self.min_chunks {
      group.min_chunks = Some(min_chunks);
    }
    if let Some(min_size) = self.min_size {
      group.min_size = Some(min_size);
    }
    if let Some(reuse_existing_chunk) = self.reuse_existing_chunk {
      group.reuse_existing_chunk = reuse_existing_chunk;
    }
    if let Some(enforce) = self.enforce {
      group.enforce = enforce;
    }
    Ok(())
  }
}

impl SplitChunksConfig {
  fn into_options(self) -> rollpack_error::Result<SplitChunksOptions> {
    let mut options = SplitChunksOptions::default();
    if let Some(chunks) = &self.chunks {
      options.chunks = parse_chunks(chunks)?;
    }
    if let Some(min_size) = self.min_size {
      options.min_size = min_size;
    }
    if let Some(min_chunks) = self.min_chunks {
      options.min_chunks = min_chunks;
    }
    if let Some(max_async_requests) = self.max_async_requests {
      options.max_async_requests = max_async_requests;
    }
    if let Some(max_initial_requests) = self.max_initial_requests {
      options.max_initial_requests = max_initial_requests;
    }
    if let Some(delimiter) = self.automatic_name_delimiter {
      options.automatic_name_delimiter = delimiter;
    }

    for (key, setting) in self.cache_groups {
      let existing = options.cache_groups.iter().position(|g| g.key == key);
      match (setting, existing) {
        (CacheGroupSetting::Enabled(false), Some(idx)) => {
          options.cache_groups.remove(idx);
        }
        (CacheGroupSetting::Enabled(_), _) => {}
        (CacheGroupSetting::Group(config), Some(idx)) => {
          config.apply(&mut options.cache_groups[idx])?;
        }
        (CacheGroupSetting::Group(config), None) => {
          let mut group = CacheGroup::new(key);
          config.apply(&mut group)?;
          options.cache_groups.push(group);
        }
      }
    }
    Ok(options)
  }
}

impl OptimizationConfig {
  pub(crate) fn split_chunks(&self) -> rollpack_error::Result<SplitChunksOptions> {
    match &self.split_chunks {
      None | Some(SplitChunksSetting::Enabled(true)) => Ok(SplitChunksOptions::default()),
      Some(SplitChunksSetting::Enabled(false)) => Ok(SplitChunksOptions::disabled()),
      Some(SplitChunksSetting::Options(config)) => config.clone().into_options(),
    }
  }

  pub(crate) fn runtime_chunk(&self) -> rollpack_error::Result<RuntimeChunk> {
    Ok(match &self.runtime_chunk {
      None | Some(RuntimeChunkConfig::Enabled(false)) => RuntimeChunk::Disabled,
      Some(RuntimeChunkConfig::Enabled(true)) => RuntimeChunk::per_entry(),
      Some(RuntimeChunkConfig::Preset(preset)) => match preset.as_str() {
        "single" => RuntimeChunk::single(),
        "multiple" => RuntimeChunk::per_entry(),
        _ => {
          return Err(Error::invalid_config(format!(
            "Invalid runtimeChunk: \"{preset}\""
          )))
        }
      },
      Some(RuntimeChunkConfig::Named { name }) if name.contains("[name]") => {
        RuntimeChunk::PerEntry {
          name: FileNameTemplate::from(name.as_str()),
        }
      }
      Some(RuntimeChunkConfig::Named { name }) => RuntimeChunk::Single { name: name.clone() },
    })
  }
}
