use crate::span::Span;

/// A validator diagnostic (note, warning, error, or fatal error).
#[derive(Clone, Debug, PartialEq)]
pub struct Diagnostic {
    pub severity: Severity,
    pub kind: DiagnosticKind,
    pub message: String,
    pub span: Option<Span>,
    pub notes: Vec<String>,
    pub help: Option<String>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord)]
pub enum Severity {
    Note,
    Warning,
    Error,
    Fatal,
}

impl Severity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Severity::Note => "note",
            Severity::Warning => "warning",
            Severity::Error => "error",
            Severity::Fatal => "fatal",
        }
    }

    /// Errors and fatal errors make a program illegal.
    pub fn is_error(&self) -> bool {
        matches!(self, Severity::Error | Severity::Fatal)
    }
}

/// Which part of the pipeline produced a diagnostic.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DiagnosticKind {
    /// Lexer, parser, or type checker.
    FrontEnd,
    /// A construct the sandbox does not allow.
    RestrictionViolation,
    /// An access whose bound cannot be determined statically.
    UnresolvableBound,
    /// An invariant that should hold by construction was broken.
    InternalConsistency,
}

impl Diagnostic {
    fn build(severity: Severity, kind: DiagnosticKind, message: String, span: Option<Span>) -> Self {
        Self {
            severity,
            kind,
            message,
            span,
            notes: Vec::new(),
            help: None,
        }
    }

    pub fn error(message: String, span: Span) -> Self {
        Self::build(Severity::Error, DiagnosticKind::FrontEnd, message, Some(span))
    }

    pub fn warning(message: String, span: Span) -> Self {
        Self::build(Severity::Warning, DiagnosticKind::FrontEnd, message, Some(span))
    }

    pub fn note(message: String, span: Span) -> Self {
        Self::build(Severity::Note, DiagnosticKind::FrontEnd, message, Some(span))
    }

    pub fn restriction(message: String, span: Span) -> Self {
        Self::build(
            Severity::Error,
            DiagnosticKind::RestrictionViolation,
            message,
            Some(span),
        )
    }

    pub fn unresolvable_bound(message: String, span: Span) -> Self {
        Self::build(
            Severity::Error,
            DiagnosticKind::UnresolvableBound,
            message,
            Some(span),
        )
    }

    pub fn fatal(message: String, span: Option<Span>) -> Self {
        Self::build(
            Severity::Fatal,
            DiagnosticKind::InternalConsistency,
            message,
            span,
        )
    }

    /// A front-end diagnostic that is not tied to a source location.
    pub fn global(severity: Severity, message: String) -> Self {
        Self::build(severity, DiagnosticKind::FrontEnd, message, None)
    }

    pub fn with_severity(mut self, severity: Severity) -> Self {
        self.severity = severity;
        self
    }

    pub fn with_note(mut self, note: String) -> Self {
        self.notes.push(note);
        self
    }

    pub fn with_help(mut self, help: String) -> Self {
        self.help = Some(help);
        self
    }

    /// Render the diagnostic to stderr using ariadne.
    pub fn render(&self, filename: &str, source: &str) {
        let mut out = Vec::new();
        self.write_report(filename, source, true, &mut out);
        eprint!("{}", String::from_utf8_lossy(&out));
    }

    /// Render the diagnostic without colors, for embedding hosts.
    pub fn render_plain(&self, filename: &str, source: &str) -> String {
        let mut out = Vec::new();
        self.write_report(filename, source, false, &mut out);
        String::from_utf8_lossy(&out).into_owned()
    }

    fn write_report(&self, filename: &str, source: &str, color: bool, out: &mut Vec<u8>) {
        use ariadne::{Color, Config, Label, Report, ReportKind, Source};

        let kind = match self.severity {
            Severity::Note => ReportKind::Advice,
            Severity::Warning => ReportKind::Warning,
            Severity::Error => ReportKind::Error,
            Severity::Fatal => ReportKind::Custom("Fatal", Color::Red),
        };

        let label_color = match self.severity {
            Severity::Note => Color::Cyan,
            Severity::Warning => Color::Yellow,
            Severity::Error | Severity::Fatal => Color::Red,
        };

        let offset = self.span.map(|s| s.start as usize).unwrap_or(0);
        let mut report = Report::<(&str, std::ops::Range<usize>)>::build(kind, filename, offset)
            .with_config(Config::default().with_color(color))
            .with_message(&self.message);

        if let Some(span) = self.span {
            report = report.with_label(
                Label::new((filename, span.range()))
                    .with_message(&self.message)
                    .with_color(label_color),
            );
        }

        for note in &self.notes {
            report = report.with_note(note);
        }

        if let Some(help) = &self.help {
            report = report.with_help(help);
        }

        if let Err(err) = report
            .finish()
            .write((filename, Source::from(source)), &mut *out)
        {
            tracing::warn!("failed to render diagnostic '{}': {}", self.message, err);
        }
    }
}

/// Render a list of diagnostics.
pub fn render_diagnostics(diagnostics: &[Diagnostic], filename: &str, source: &str) {
    for diag in diagnostics {
        diag.render(filename, source);
    }
}

/// Whether any diagnostic is an error or a fatal error.
pub fn has_errors(diagnostics: &[Diagnostic]) -> bool {
    diagnostics.iter().any(|d| d.severity.is_error())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_construction() {
        let span = Span::new(10, 15);
        let d = Diagnostic::error("undeclared identifier 'x'".to_string(), span);
        assert_eq!(d.severity, Severity::Error);
        assert_eq!(d.kind, DiagnosticKind::FrontEnd);
        assert_eq!(d.message, "undeclared identifier 'x'");
        assert_eq!(d.span, Some(span));
        assert!(d.notes.is_empty());
        assert!(d.help.is_none());
    }

    #[test]
    fn test_restriction_is_error() {
        let d = Diagnostic::restriction("no 3D images".to_string(), Span::dummy());
        assert_eq!(d.kind, DiagnosticKind::RestrictionViolation);
        assert!(d.severity.is_error());
    }

    #[test]
    fn test_fatal_has_no_span() {
        let d = Diagnostic::fatal("missing size companion".to_string(), None);
        assert_eq!(d.severity, Severity::Fatal);
        assert_eq!(d.kind, DiagnosticKind::InternalConsistency);
        assert!(d.span.is_none());
    }

    #[test]
    fn test_chained_builders() {
        let d = Diagnostic::warning("hint".to_string(), Span::new(0, 5))
            .with_note("note 1".to_string())
            .with_help("help text".to_string())
            .with_note("note 2".to_string());
        assert_eq!(d.severity, Severity::Warning);
        assert_eq!(d.notes.len(), 2);
        assert!(d.help.is_some());
    }

    #[test]
    fn test_severity_ordering() {
        assert!(Severity::Note < Severity::Warning);
        assert!(Severity::Warning < Severity::Error);
        assert!(Severity::Error < Severity::Fatal);
        assert!(!Severity::Warning.is_error());
    }

    #[test]
    fn test_has_errors() {
        let warnings = vec![Diagnostic::warning("w".to_string(), Span::dummy())];
        assert!(!has_errors(&warnings));
        let mixed = vec![
            Diagnostic::warning("w".to_string(), Span::dummy()),
            Diagnostic::unresolvable_bound("e".to_string(), Span::dummy()),
        ];
        assert!(has_errors(&mixed));
    }

    #[test]
    fn test_render_plain_mentions_message() {
        let source = "kernel void k(struct S s) {}\n";
        let d = Diagnostic::restriction(
            "structures may not be passed to kernels by value".to_string(),
            Span::new(14, 24),
        );
        let text = d.render_plain("input.cl", source);
        assert!(text.contains("structures may not be passed to kernels by value"));
    }

    #[test]
    fn test_render_without_span_does_not_panic() {
        let d = Diagnostic::global(Severity::Warning, "ignoring option '-O3'".to_string());
        let text = d.render_plain("input.cl", "");
        assert!(text.contains("ignoring option"));
    }
}
