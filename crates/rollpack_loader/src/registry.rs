use std::sync::Arc;

use rollpack_error::Error;
use rustc_hash::FxHashMap;
use serde::de::DeserializeOwned;

use crate::{
  builtins::{
    CssExtractLoader, CssLoader, FileLoader, JsonLoader, RawLoader, StyleLoader, UrlLoader,
  },
  Loader,
};

pub type LoaderFactory =
  Arc<dyn Fn(&serde_json::Value) -> anyhow::Result<Arc<dyn Loader>> + Send + Sync>;

/// Creates loaders from the names and options written in a configuration.
#[derive(Clone)]
pub struct LoaderRegistry {
  factories: FxHashMap<String, LoaderFactory>,
}

impl std::fmt::Debug for LoaderRegistry {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    let mut names = self.factories.keys().collect::<Vec<_>>();
    names.sort();
    f.debug_struct("LoaderRegistry").field("loaders", &names).finish()
  }
}

fn options_of<T: DeserializeOwned + Default>(options: &serde_json::Value) -> anyhow::Result<T> {
  if options.is_null() {
    Ok(T::default())
  } else {
    Ok(serde_json::from_value(options.clone())?)
  }
}

impl LoaderRegistry {
  pub fn empty() -> Self {
    Self {
      factories: Default::default(),
    }
  }

  pub fn with_builtins() -> Self {
    let mut registry = Self::empty();
    registry.register("json-loader", |_| Ok(Arc::new(JsonLoader)));
    registry.register("raw-loader", |_| Ok(Arc::new(RawLoader)));
    registry.register("css-loader", |_| Ok(Arc::new(CssLoader)));
    registry.register("style-loader", |_| Ok(Arc::new(StyleLoader)));
    registry.register("mini-css-extract-loader", |_| Ok(Arc::new(CssExtractLoader)));
    registry.register("file-loader", |options| {
      Ok(Arc::new(FileLoader::new(options_of(options)?)))
    });
    registry.register("url-loader", |options| {
      Ok(Arc::new(UrlLoader::new(options_of(options)?)))
    });
    registry
  }

  pub fn register(
    &mut self,
    name: impl Into<String>,
    factory: impl Fn(&serde_json::Value) -> anyhow::Result<Arc<dyn Loader>> + Send + Sync + 'static,
  ) {
    self.factories.insert(name.into(), Arc::new(factory));
  }

  pub fn contains(&self, name: &str) -> bool {
    self.factories.contains_key(name)
  }

  pub fn create(&self, name: &str, options: &serde_json::Value) -> rollpack_error::Result<Arc<dyn Loader>> {
    let factory = self
      .factories
      .get(name)
      .ok_or_else(|| Error::invalid_config(format!("Unknown loader \"{name}\"")))?;
    factory(options)
      .map_err(|err| Error::invalid_config(format!("Invalid options for loader \"{name}\": {err}")))
  }
}

impl Default for LoaderRegistry {
  fn default() -> Self {
    Self::with_builtins()
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn builtins_are_registered() {
    let registry = LoaderRegistry::with_builtins();
    let loader = registry
      .create("url-loader", &serde_json::json!({ "limit": 8192 }))
      .unwrap();
    assert_eq!(loader.name(), "url-loader");
    assert!(registry.create("css-loader", &serde_json::Value::Null).is_ok());
  }

  #[test]
  fn unknown_loader_is_a_config_error() {
    let err = LoaderRegistry::with_builtins()
      .create("eslint-loader", &serde_json::Value::Null)
      .unwrap_err();
    assert_eq!(err.kind.code(), "INVALID_CONFIG");
    let err = LoaderRegistry::with_builtins()
      .create("url-loader", &serde_json::json!({ "limit": "big" }))
      .unwrap_err();
    assert_eq!(err.kind.code(), "INVALID_CONFIG");
  }
}
