use rollpack_common::{BundleOutput, ModuleId, ModuleType};

#[derive(Debug, Clone)]
pub struct ResolveArgs<'a> {
  pub importer: Option<&'a ModuleId>,
  pub specifier: &'a str,
}

#[derive(Debug)]
pub struct TransformArgs<'a> {
  pub id: &'a ModuleId,
  pub module_type: ModuleType,
  /// Output of the loader chain.
  pub code: &'a String,
}

#[derive(Debug)]
pub struct EmitArgs<'a> {
  /// The complete output, with file names and hashes already assigned.
  pub output: &'a BundleOutput,
  /// Names of the user defined entries, in declaration order.
  pub entries: &'a [String],
}
