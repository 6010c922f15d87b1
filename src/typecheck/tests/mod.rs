
use crate::ast::TranslationUnit;
use crate::diagnostic::Diagnostic;
use crate::lexer::Lexer;
use crate::parser::Parser;
use crate::typecheck::TypeChecker;

/// Parse and check `source`; `Ok` carries the typed unit and its warnings.
pub(super) fn check(source: &str) -> Result<(TranslationUnit, Vec<Diagnostic>), Vec<Diagnostic>> {
    let (tokens, lex_errors) = Lexer::new(source).tokenize();
    assert!(lex_errors.is_empty(), "lex errors: {:?}", lex_errors);
    let mut unit = Parser::new(tokens).parse_unit()?;
    let warnings = TypeChecker::new(&mut unit).check_unit()?;
    Ok((unit, warnings))
}

pub(super) fn check_err(source: &str) -> Vec<Diagnostic> {
    match check(source) {
        Ok(_) => vec![],
        Err(diags) => diags,
    }
}
