pub mod test_config;
pub mod script;
pub mod tester;

#[macro_export]
macro_rules! impl_serde_default {
  ($name:ident) => {
    impl Default for $name {
      fn default() -> Self {
        serde_json::from_str("{}").expect("every field has a default")
      }
    }
  };
}
