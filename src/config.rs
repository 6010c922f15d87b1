use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::diagnostic::{Diagnostic, Severity};
use crate::types::{ScalarKind, Ty};

/// Extension every program may enable; it can never be disabled.
pub const INITIALIZE_MEMORY_EXTENSION: &str = "cl_khr_initialize_memory";

/// Names and spellings the validator injects into rewritten sources.
///
/// Every generated identifier is derived from `variable_prefix`, so user
/// code that avoids the prefix can never collide with a synthesized name.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ValidatorConfig {
    /// Prefix of every synthesized identifier (e.g. "_wcl").
    pub variable_prefix: String,
    /// OpenCL C type of size companion parameters (e.g. "ulong").
    pub size_parameter_type: String,
    /// First line of the header comment block.
    pub header_title: String,
    /// One level of header indentation.
    pub indentation: String,
    /// Extensions the platform supports, besides `cl_khr_initialize_memory`.
    pub extensions: Vec<String>,
}

impl Default for ValidatorConfig {
    fn default() -> Self {
        Self::webcl()
    }
}

impl ValidatorConfig {
    /// Built-in WebCL configuration.
    pub fn webcl() -> Self {
        Self {
            variable_prefix: "_wcl".to_string(),
            size_parameter_type: "ulong".to_string(),
            header_title: "WebCL Validator JSON header".to_string(),
            indentation: "    ".to_string(),
            extensions: Vec::new(),
        }
    }

    /// Load a configuration from a TOML file. Missing keys keep their defaults.
    pub fn load(path: &Path) -> Result<Self, Diagnostic> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            Diagnostic::global(
                Severity::Error,
                format!("cannot read validator config '{}': {}", path.display(), e),
            )
        })?;
        Self::parse_toml(&content, path)
    }

    pub fn parse_toml(content: &str, path: &Path) -> Result<Self, Diagnostic> {
        let invalid = |message: String| {
            Diagnostic::global(
                Severity::Error,
                format!("invalid validator config '{}': {}", path.display(), message),
            )
        };
        let config: ValidatorConfig =
            toml::from_str(content).map_err(|e| invalid(e.to_string()))?;
        config.check().map_err(invalid)?;
        Ok(config)
    }

    /// Reject settings that would produce unsafe or malformed output.
    pub fn check(&self) -> Result<(), String> {
        if !is_identifier(&self.variable_prefix) {
            return Err(format!(
                "variable_prefix '{}' is not an identifier",
                self.variable_prefix
            ));
        }
        if self.size_type().is_none() {
            return Err(format!(
                "size_parameter_type '{}' is not an unsigned integer type of at least 32 bits",
                self.size_parameter_type
            ));
        }
        if self.header_title.contains("*/") || self.header_title.contains(['\n', '\r']) {
            return Err("header_title must be a single line without '*/'".to_string());
        }
        if !self.indentation.chars().all(|c| c == ' ' || c == '\t') {
            return Err("indentation may only contain spaces and tabs".to_string());
        }
        Ok(())
    }

    /// Type of the size parameters and of converted indices: `uint`,
    /// `ulong` or `size_t`.
    pub fn size_type(&self) -> Option<Ty> {
        match ScalarKind::from_name(&self.size_parameter_type)? {
            kind @ (ScalarKind::UInt | ScalarKind::ULong) => Some(Ty::Scalar(kind)),
            _ => None,
        }
    }

    /// Name of the size companion of a pointer parameter: `_wcl_<name>_size`.
    pub fn size_parameter_name(&self, pointer_name: &str) -> String {
        format!("{}_{}_size", self.variable_prefix, pointer_name)
    }

    /// Whether a user identifier intrudes on the synthesized namespace.
    pub fn is_reserved(&self, name: &str) -> bool {
        name.starts_with(&self.variable_prefix)
    }

    /// Whether a program may enable `extension`.
    pub fn supports_extension(&self, extension: &str) -> bool {
        extension == INITIALIZE_MEMORY_EXTENSION || self.extensions.iter().any(|e| e == extension)
    }
}

fn is_identifier(s: &str) -> bool {
    let mut chars = s.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() || c == '_' => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}

/// Options understood by the front end, parsed from pass-through arguments.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct FrontEndOptions {
    /// `-Werror`: every warning is reported as an error.
    pub warnings_as_errors: bool,
    /// `-w`: warnings are dropped.
    pub suppress_warnings: bool,
    /// Arguments that were not understood.
    pub ignored: Vec<String>,
}

impl FrontEndOptions {
    pub fn from_args<S: AsRef<str>>(args: &[S]) -> Self {
        let mut options = Self::default();
        for arg in args {
            match arg.as_ref() {
                "-Werror" => options.warnings_as_errors = true,
                "-w" => options.suppress_warnings = true,
                other => options.ignored.push(other.to_string()),
            }
        }
        options
    }

    /// Diagnostics describing arguments the front end ignored.
    pub fn ignored_diagnostics(&self) -> Vec<Diagnostic> {
        self.ignored
            .iter()
            .map(|arg| {
                Diagnostic::global(
                    Severity::Warning,
                    format!("ignoring unsupported front-end option '{}'", arg),
                )
            })
            .collect()
    }

    /// Apply `-w` / `-Werror` to a front-end diagnostic.
    pub fn adjust(&self, diag: Diagnostic) -> Option<Diagnostic> {
        if diag.severity != Severity::Warning {
            return Some(diag);
        }
        if self.suppress_warnings {
            None
        } else if self.warnings_as_errors {
            Some(diag.with_severity(Severity::Error))
        } else {
            Some(diag)
        }
    }
}
