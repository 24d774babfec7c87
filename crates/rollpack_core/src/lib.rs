use std::sync::Arc;

mod bundler;
pub use bundler::*;
mod chunk;
pub use chunk::*;
mod normal_module;
pub use normal_module::*;
mod external_module;
pub use external_module::*;
mod options;
pub use options::*;
mod graph;
pub use graph::*;
mod module_loader;
use rollpack_common::ModuleId;
use rollpack_resolver::Resolver;
use rustc_hash::FxHashMap;
mod bundle;
mod norm_or_ext;
pub use bundle::*;
mod code_splitter;
pub(crate) use code_splitter::*;
mod chunk_graph;
pub(crate) use chunk_graph::*;
mod plugin_driver;
pub(crate) use plugin_driver::*;
mod runtime;
mod utils;
pub use utils::*;

pub(crate) type SharedResolver = Arc<Resolver>;
pub(crate) type SharedInputOptions = Arc<InputOptions>;
pub use norm_or_ext::*;

pub(crate) type ModuleById = FxHashMap<ModuleId, NormOrExt>;

// public exports

pub type BuildError = rollpack_error::Error;
pub type UnaryBuildResult<T> = rollpack_error::Result<T>;
pub type BuildResult<T> = Result<T, rollpack_error::Errors>;
