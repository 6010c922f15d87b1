//! The validation pipeline: front end, restriction checks, access
//! instrumentation, signature analysis, header emission and final assembly.
//!
//! Each stage runs only when the earlier ones recorded no error. A broken
//! internal invariant ends the run at once with a fatal diagnostic.

use tracing::{debug, info};

use crate::ast::TranslationUnit;
use crate::config::{FrontEndOptions, ValidatorConfig};
use crate::diagnostic::{has_errors, Diagnostic, DiagnosticKind, Severity};
use crate::header::emit_header;
use crate::lexer::Lexer;
use crate::parser::Parser;
use crate::passes::{Context, Instrumenter, InternalError, Restrictor, SignatureAnalyzer};
use crate::typecheck::TypeChecker;

use super::program::Program;

pub(crate) fn run(source: &str, config: &ValidatorConfig, options: &FrontEndOptions) -> Program {
    let mut program = Program::validating(source);
    if let Err(message) = config.check() {
        program.diagnostics.push(Diagnostic::global(
            Severity::Error,
            format!("invalid validator config: {}", message),
        ));
        return conclude(program);
    }

    debug!(bytes = source.len(), "front end");
    let unit = match front_end(source, options, &mut program.diagnostics) {
        Some(unit) => unit,
        None => return conclude(program),
    };

    let mut cx = Context::new(source, unit, config);
    cx.diagnostics = std::mem::take(&mut program.diagnostics);
    let outcome = passes(&mut cx);
    program.diagnostics = std::mem::take(&mut cx.diagnostics);
    match outcome {
        Ok(true) => {
            let header = emit_header(&cx.kernels, config);
            let rewritten = cx.rewrites.apply(source);
            debug!(edits = cx.rewrites.len(), "assembled output");
            program.validated_source = Some(format!("{}{}", header, rewritten));
            program.header = Some(header);
            program.kernels = std::mem::take(&mut cx.kernels);
        }
        Ok(false) => {}
        Err(err) => program.diagnostics.push(Diagnostic::from(err)),
    }
    conclude(program)
}

/// Lex, parse and type check. `None` when the source is not valid OpenCL C.
fn front_end(
    source: &str,
    options: &FrontEndOptions,
    diagnostics: &mut Vec<Diagnostic>,
) -> Option<TranslationUnit> {
    let report = |found: Vec<Diagnostic>, diagnostics: &mut Vec<Diagnostic>| {
        diagnostics.extend(found.into_iter().filter_map(|d| options.adjust(d)));
        !has_errors(diagnostics)
    };

    if !report(options.ignored_diagnostics(), diagnostics) {
        return None;
    }

    let (tokens, lex_errors) = Lexer::new(source).tokenize();
    if !report(lex_errors, diagnostics) {
        return None;
    }

    let mut unit = match Parser::new(tokens).parse_unit() {
        Ok(unit) => unit,
        Err(errors) => {
            report(errors, diagnostics);
            return None;
        }
    };

    let found = match TypeChecker::new(&mut unit).check_unit() {
        Ok(warnings) => warnings,
        Err(all) => all,
    };
    if report(found, diagnostics) {
        Some(unit)
    } else {
        None
    }
}

/// Run the passes in order. `Ok(false)` when a pass reported errors.
fn passes(cx: &mut Context<'_>) -> Result<bool, InternalError> {
    debug!("restriction checks");
    Restrictor::new(cx).run();
    if cx.has_errors() {
        return Ok(false);
    }

    debug!("access instrumentation");
    Instrumenter::new(cx)?.run()?;
    if cx.has_errors() {
        return Ok(false);
    }

    debug!("signature analysis");
    SignatureAnalyzer::new(cx).run()?;
    Ok(!cx.has_errors())
}

fn conclude(program: Program) -> Program {
    let program = program.finish();
    let rejected_by = program
        .diagnostics()
        .iter()
        .find(|d| d.severity.is_error())
        .map(|d| d.kind);
    match rejected_by {
        Some(kind) => info!(status = ?program.status(), stage = stage_name(kind), "validation finished"),
        None => info!(
            status = ?program.status(),
            kernels = program.kernel_count(),
            "validation finished"
        ),
    }
    program
}

fn stage_name(kind: DiagnosticKind) -> &'static str {
    match kind {
        DiagnosticKind::FrontEnd => "front end",
        DiagnosticKind::RestrictionViolation => "restrictions",
        DiagnosticKind::UnresolvableBound => "instrumentation",
        DiagnosticKind::InternalConsistency => "internal",
    }
}
