use std::path::Path;

use rollpack_common::ModuleType;
use rollpack_error::Error;
use swc_core::{
  common::{comments::SingleThreadedComments, sync::Lrc, FileName, SourceMap, Spanned},
  ecma::{
    ast::{self, EsVersion},
    parser::{lexer::Lexer, EsConfig, Parser, StringInput, Syntax},
  },
};

pub struct ParsedModule {
  pub ast: ast::Module,
  pub comments: SingleThreadedComments,
  pub cm: Lrc<SourceMap>,
}

/// Parse the output of the loader chain. It must be valid JavaScript (with JSX
/// for `.jsx` files) at this point.
pub fn parse(path: &Path, source: String) -> rollpack_error::Result<ParsedModule> {
  let cm: Lrc<SourceMap> = Default::default();
  let fm = cm.new_source_file(FileName::Real(path.to_path_buf()), source);
  let syntax = Syntax::Es(EsConfig {
    jsx: matches!(ModuleType::from_path(path), ModuleType::Jsx),
    ..Default::default()
  });
  let comments = SingleThreadedComments::default();
  let lexer = Lexer::new(
    syntax,
    EsVersion::latest(),
    StringInput::from(&*fm),
    Some(&comments),
  );
  let mut parser = Parser::new_from(lexer);
  // To be clear, rollpack will always assume the input is a module
  let ast = parser.parse_module().map_err(|err| {
    let loc = cm.lookup_char_pos(err.span().lo);
    Error::parse_failed(
      path,
      format!(
        "{} ({}:{})",
        err.kind().msg(),
        loc.line,
        loc.col_display + 1
      ),
    )
  })?;
  Ok(ParsedModule { ast, comments, cm })
}
