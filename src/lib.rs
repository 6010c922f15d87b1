//! Validation and bounds instrumentation of OpenCL C kernels for sandboxed
//! (WebCL) execution.
//!
//! [`validate`] runs the whole pipeline on one source: the front end parses
//! and type checks it, the restriction checks reject constructs the sandbox
//! cannot support, every array and pointer access is clamped into its
//! allocation, and each pointer kernel parameter gains a size parameter. The
//! resulting [`Program`] carries the diagnostics, the kernel descriptors and
//! the rewritten source with its JSON header.

pub mod api;
pub mod ast;
pub mod config;
pub mod diagnostic;
pub mod header;
pub mod passes;
pub mod rewrite;
pub mod span;
pub mod syntax;
pub mod typecheck;

pub use syntax::lexeme;
pub use syntax::lexer;
pub use syntax::parser;
pub use typecheck::types;

pub use api::*;
