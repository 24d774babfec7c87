use hashlink::LinkedHashMap;
use rollpack_common::ImportKind;
use swc_core::{
  common::{
    comments::{Comments, SingleThreadedComments},
    Spanned,
  },
  ecma::{
    ast::{self, CallExpr, Callee, Expr, Lit, ModuleDecl},
    visit::{Visit, VisitWith},
  },
};

use crate::{magic_comment::parse_magic_comment, ParsedModule};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScannedImport {
  pub specifier: String,
  pub kind: ImportKind,
  /// Requested name of the chunk created for a dynamic import.
  pub chunk_name: Option<String>,
  pub prefetch: bool,
}

#[derive(Debug, Default)]
pub struct ScanResult {
  /// Unique by `(specifier, kind)`, in source order.
  pub imports: Vec<ScannedImport>,
}

pub fn scan(module: &ParsedModule) -> ScanResult {
  let mut scanner = ImportScanner {
    comments: &module.comments,
    found: Default::default(),
  };
  module.ast.visit_with(&mut scanner);
  ScanResult {
    imports: scanner.found.into_iter().map(|(_, import)| import).collect(),
  }
}

struct ImportScanner<'a> {
  comments: &'a SingleThreadedComments,
  found: LinkedHashMap<(String, ImportKind), ScannedImport>,
}

impl ImportScanner<'_> {
  fn add(&mut self, import: ScannedImport) {
    let key = (import.specifier.clone(), import.kind);
    match self.found.get_mut(&key) {
      Some(existing) => {
        if existing.chunk_name.is_none() {
          existing.chunk_name = import.chunk_name;
        }
        existing.prefetch |= import.prefetch;
      }
      None => {
        self.found.insert(key, import);
      }
    }
  }

  fn add_static(&mut self, specifier: &str, kind: ImportKind) {
    self.add(ScannedImport {
      specifier: specifier.to_string(),
      kind,
      chunk_name: None,
      prefetch: false,
    });
  }
}

fn string_literal(expr: &Expr) -> Option<&str> {
  match expr {
    Expr::Lit(Lit::Str(s)) => Some(&*s.value),
    _ => None,
  }
}

impl Visit for ImportScanner<'_> {
  fn visit_module_decl(&mut self, decl: &ModuleDecl) {
    match decl {
      ModuleDecl::Import(import) if !import.type_only => {
        self.add_static(&import.src.value, ImportKind::Import)
      }
      ModuleDecl::ExportAll(export) => self.add_static(&export.src.value, ImportKind::Import),
      ModuleDecl::ExportNamed(ast::NamedExport {
        src: Some(src),
        type_only: false,
        ..
      }) => self.add_static(&src.value, ImportKind::Import),
      _ => {}
    }
    decl.visit_children_with(self);
  }

  fn visit_call_expr(&mut self, call: &CallExpr) {
    match &call.callee {
      Callee::Import(_) => match call.args.first() {
        Some(arg) => match string_literal(&arg.expr) {
          Some(specifier) => {
            let magic = self
              .comments
              .get_leading(arg.expr.span_lo())
              .unwrap_or_default();
            let magic = parse_magic_comment(magic.iter().map(|c| &*c.text));
            self.add(ScannedImport {
              specifier: specifier.to_string(),
              kind: ImportKind::DynamicImport,
              chunk_name: magic.chunk_name,
              prefetch: magic.prefetch,
            });
          }
          None => tracing::warn!("Ignoring dynamic import() with a non-literal specifier"),
        },
        None => {}
      },
      Callee::Expr(callee) => {
        if let Expr::Ident(ident) = &**callee {
          if &*ident.sym == "require" && call.args.len() == 1 {
            if let Some(specifier) = string_literal(&call.args[0].expr) {
              self.add_static(specifier, ImportKind::Require);
            }
          }
        }
      }
      Callee::Super(_) => {}
    }
    call.visit_children_with(self);
  }
}
