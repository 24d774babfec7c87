use rollpack_error::Error;
use swc_core::{
  common::{comments::SingleThreadedComments, Mark, DUMMY_SP, GLOBALS},
  ecma::{
    ast::{self, Callee, Expr, Ident},
    codegen::{self as swc_ecma_codegen, text_writer::JsWriter},
    transforms::{
      base::{
        fixer::{self, paren_remover},
        helpers::{self, inject_helpers, HELPERS},
        hygiene::hygiene,
        resolver,
      },
      module::common_js,
    },
    visit::{FoldWith, VisitMut, VisitMutWith},
  },
};

use crate::ParsedModule;

/// Parameter of the module wrapper that loads the chunks of a split point.
/// `import('./a')` becomes `__rollpack_import__('./a')`, the runtime maps the
/// specifier to the module key.
pub const DYNAMIC_IMPORT_HELPER: &str = "__rollpack_import__";

struct DynamicImportRewriter;

impl VisitMut for DynamicImportRewriter {
  fn visit_mut_callee(&mut self, callee: &mut Callee) {
    if matches!(callee, Callee::Import(_)) {
      *callee = Callee::Expr(Box::new(Expr::Ident(Ident::new(
        DYNAMIC_IMPORT_HELPER.into(),
        DUMMY_SP,
      ))));
    } else {
      callee.visit_mut_children_with(self);
    }
  }
}

fn convert(ast: ast::Module, comments: &SingleThreadedComments) -> ast::Module {
  GLOBALS.set(&Default::default(), || {
    let mut ast = ast;
    ast.visit_mut_with(&mut DynamicImportRewriter);
    let unresolved_mark = Mark::new();
    HELPERS.set(&helpers::Helpers::new(false), || {
      ast
        .fold_with(&mut paren_remover(Some(comments)))
        .fold_with(&mut resolver(unresolved_mark, Mark::new(), false))
        .fold_with(&mut common_js::common_js::<SingleThreadedComments>(
          unresolved_mark,
          common_js::Config {
            ..Default::default()
          },
          Default::default(),
          Default::default(),
        ))
        .fold_with(&mut hygiene())
        .fold_with(&mut fixer::fixer(Some(comments)))
        .fold_with(&mut inject_helpers(unresolved_mark))
    })
  })
}

/// Print the module as a CommonJS function body: imports become `require`
/// calls, exports assignments to `exports`, and `import()` a call of
/// [DYNAMIC_IMPORT_HELPER].
pub fn to_cjs(module: ParsedModule) -> rollpack_error::Result<String> {
  let ParsedModule { ast, comments, cm } = module;
  let ast = convert(ast, &comments);

  let mut output = Vec::new();
  let mut emitter = swc_ecma_codegen::Emitter {
    cfg: swc_ecma_codegen::Config {
      ..Default::default()
    },
    cm: cm.clone(),
    comments: Some(&comments),
    wr: Box::new(JsWriter::new(cm.clone(), "\n", &mut output, None)),
  };
  emitter
    .emit_module(&ast)
    .map_err(|e| Error::panic(format!("Failed to print module: {e}")))?;
  String::from_utf8(output).map_err(|e| Error::panic(e.to_string()))
}
