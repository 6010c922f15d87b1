mod restrict;

use crate::ast::TranslationUnit;
use crate::config::ValidatorConfig;
use crate::diagnostic::Diagnostic;
use crate::lexer::Lexer;
use crate::parser::Parser;
use crate::passes::{Context, Instrumenter, KernelDescriptor, Restrictor, SignatureAnalyzer};
use crate::typecheck::TypeChecker;

pub(super) fn typed_unit(source: &str) -> TranslationUnit {
    let (tokens, lex_errors) = Lexer::new(source).tokenize();
    assert!(lex_errors.is_empty(), "lex errors: {:?}", lex_errors);
    let mut unit = Parser::new(tokens)
        .parse_unit()
        .unwrap_or_else(|errs| panic!("parse errors: {:?}", errs));
    TypeChecker::new(&mut unit)
        .check_unit()
        .unwrap_or_else(|errs| panic!("type errors: {:?}", errs));
    unit
}

pub(super) fn restrict(source: &str) -> Vec<Diagnostic> {
    let config = ValidatorConfig::webcl();
    let mut cx = Context::new(source, typed_unit(source), &config);
    Restrictor::new(&mut cx).run();
    cx.diagnostics
}

/// Rewritten source and the instrumenter's diagnostics.
pub(super) fn instrument(source: &str) -> (String, Vec<Diagnostic>) {
    let config = ValidatorConfig::webcl();
    let mut cx = Context::new(source, typed_unit(source), &config);
    Instrumenter::new(&mut cx).unwrap().run().unwrap();
    (cx.rewrites.apply(source), cx.diagnostics)
}

/// Kernel descriptors and the source with size parameters inserted.
pub(super) fn describe(source: &str) -> (Vec<KernelDescriptor>, String) {
    let config = ValidatorConfig::webcl();
    let mut cx = Context::new(source, typed_unit(source), &config);
    SignatureAnalyzer::new(&mut cx).run().unwrap();
    (cx.kernels, cx.rewrites.apply(source))
}

/// The line of `text` containing `needle`, trimmed.
pub(super) fn line_with<'t>(text: &'t str, needle: &str) -> &'t str {
    text.lines()
        .find(|l| l.contains(needle))
        .map(str::trim)
        .unwrap_or_else(|| panic!("no line containing '{}' in:\n{}", needle, text))
}
