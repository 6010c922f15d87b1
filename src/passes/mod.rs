//! Validation passes over a type-checked translation unit.
//!
//! Each pass borrows the invocation's [`Context`] and records its findings
//! there; a later pass only runs when no earlier one reported an error.

pub mod instrument;
pub mod restrict;
pub mod signature;
#[cfg(test)]
mod tests;

use thiserror::Error;

use crate::ast::TranslationUnit;
use crate::config::ValidatorConfig;
use crate::diagnostic::{has_errors, Diagnostic};
use crate::rewrite::RewriteBuffer;
use crate::span::Span;

pub use instrument::Instrumenter;
pub use restrict::Restrictor;
pub use signature::{ImageAccess, KernelDescriptor, KernelParameter, ParameterKind, SignatureAnalyzer};

/// State owned by one validation run.
pub struct Context<'a> {
    pub source: &'a str,
    pub config: &'a ValidatorConfig,
    pub unit: TranslationUnit,
    pub diagnostics: Vec<Diagnostic>,
    pub rewrites: RewriteBuffer,
    pub kernels: Vec<KernelDescriptor>,
}

impl<'a> Context<'a> {
    pub fn new(source: &'a str, unit: TranslationUnit, config: &'a ValidatorConfig) -> Self {
        Self {
            source,
            config,
            unit,
            diagnostics: Vec::new(),
            rewrites: RewriteBuffer::new(),
            kernels: Vec::new(),
        }
    }

    pub fn has_errors(&self) -> bool {
        has_errors(&self.diagnostics)
    }

    /// Source text of `span` with the rewrites queued inside it applied.
    pub fn rendered(&self, span: Span) -> String {
        self.rewrites.render_span(self.source, span)
    }
}

/// Broken invariants. These abort the run with a fatal diagnostic.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum InternalError {
    #[error("pointer parameter '{parameter}' of kernel '{kernel}' has no size parameter")]
    MissingSizeCompanion {
        kernel: String,
        parameter: String,
        span: Span,
    },

    #[error("parameter '{parameter}' of kernel '{kernel}' points to unsupported address space '{space}'")]
    UnsupportedAddressSpace {
        kernel: String,
        parameter: String,
        space: &'static str,
        span: Span,
    },

    #[error("rewrite of bytes {}..{} overlaps an earlier rewrite of bytes {}..{}", new.start, new.end, existing.start, existing.end)]
    OverlappingRewrite { existing: Span, new: Span },

    #[error("size parameter type '{spelling}' is not an unsigned integer type")]
    UnsupportedSizeType { spelling: String },
}

impl InternalError {
    pub fn span(&self) -> Option<Span> {
        match self {
            InternalError::MissingSizeCompanion { span, .. }
            | InternalError::UnsupportedAddressSpace { span, .. } => Some(*span),
            InternalError::OverlappingRewrite { new, .. } => Some(*new),
            InternalError::UnsupportedSizeType { .. } => None,
        }
    }
}

impl From<InternalError> for Diagnostic {
    fn from(err: InternalError) -> Self {
        let span = err.span();
        Diagnostic::fatal(format!("internal consistency error: {}", err), span)
    }
}
