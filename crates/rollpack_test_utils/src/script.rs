use rollpack::BundleOutput;
use swc_core::{
  common::{sync::Lrc, FileName, SourceMap},
  ecma::{
    ast::EsVersion,
    parser::{lexer::Lexer, Parser, StringInput, Syntax},
  },
};

/// Parses `code` the way a `<script>` tag would. Module syntax is an error.
pub fn parse_script(code: &str) -> Result<(), String> {
  let cm: Lrc<SourceMap> = Default::default();
  let fm = cm.new_source_file(FileName::Anon, code.to_string());
  let lexer = Lexer::new(
    Syntax::Es(Default::default()),
    EsVersion::latest(),
    StringInput::from(&*fm),
    None,
  );
  let mut parser = Parser::new_from(lexer);
  parser
    .parse_script()
    .map_err(|err| err.kind().msg().into_owned())?;
  match parser.take_errors().first() {
    Some(err) => Err(err.kind().msg().into_owned()),
    None => Ok(()),
  }
}

pub fn assert_chunks_are_scripts(output: &BundleOutput) {
  for chunk in &output.chunks {
    if let Err(msg) = parse_script(&chunk.code) {
      panic!("{} is not a script: {msg}\n{}", chunk.file_name, chunk.code);
    }
  }
}
