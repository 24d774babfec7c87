mod input_options;
pub use input_options::*;
mod output_options;
pub use output_options::*;
mod split_chunks;
pub use split_chunks::*;
