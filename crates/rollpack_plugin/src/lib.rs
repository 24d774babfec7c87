mod args;
pub use args::*;
mod plugin;
pub use plugin::*;
mod context;
pub use context::*;

pub use async_trait;
