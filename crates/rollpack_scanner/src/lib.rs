mod parse;
pub use parse::*;
mod scan;
pub use scan::*;
mod magic_comment;
mod to_cjs;
pub use to_cjs::*;
