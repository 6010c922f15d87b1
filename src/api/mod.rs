pub(crate) mod pipeline;
pub mod program;

#[cfg(test)]
mod tests;

use crate::config::{FrontEndOptions, ValidatorConfig};

pub use program::{ImageKind, PointerKind, Program, ProgramStatus};

/// Validate one OpenCL C source with the built-in WebCL configuration.
pub fn validate(source: &str) -> Program {
    validate_with_options(source, &ValidatorConfig::webcl(), &FrontEndOptions::default())
}

/// Validate one OpenCL C source.
///
/// Every call owns its own state, so independent sources can be validated
/// concurrently from different threads.
pub fn validate_with_options(
    source: &str,
    config: &ValidatorConfig,
    options: &FrontEndOptions,
) -> Program {
    pipeline::run(source, config, options)
}
