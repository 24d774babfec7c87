//! The transform pipeline: rules select loaders for a file, loaders turn the
//! raw content into JavaScript.

mod loader;
pub use loader::*;
mod rule;
pub use rule::*;
mod pipeline;
pub use pipeline::*;
mod registry;
pub use registry::*;
pub mod builtins;
