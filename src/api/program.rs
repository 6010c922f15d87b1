//! The result of one validation run and its query interface.

use crate::diagnostic::Diagnostic;
use crate::passes::{ImageAccess, KernelDescriptor, KernelParameter, ParameterKind};
use crate::types::AddressSpace;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ProgramStatus {
    /// The pipeline is still running.
    Validating,
    /// At least one error or fatal diagnostic.
    Illegal,
    AcceptedWithWarnings,
    Accepted,
}

impl ProgramStatus {
    /// Status implied by a finished run's diagnostics.
    pub fn from_diagnostics(diagnostics: &[Diagnostic]) -> Self {
        if diagnostics.iter().any(|d| d.severity.is_error()) {
            ProgramStatus::Illegal
        } else if diagnostics.is_empty() {
            ProgramStatus::Accepted
        } else {
            ProgramStatus::AcceptedWithWarnings
        }
    }

    pub fn is_accepted(&self) -> bool {
        matches!(
            self,
            ProgramStatus::Accepted | ProgramStatus::AcceptedWithWarnings
        )
    }
}

/// Access of an image parameter as seen by the host.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ImageKind {
    NotImage,
    Readable,
    Writable,
}

/// Memory a pointer parameter refers to.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PointerKind {
    NotPointer,
    Global,
    Constant,
    Local,
}

/// A validated (or rejected) program.
#[derive(Clone, Debug)]
pub struct Program {
    pub(crate) status: ProgramStatus,
    pub(crate) source: String,
    pub(crate) diagnostics: Vec<Diagnostic>,
    pub(crate) kernels: Vec<KernelDescriptor>,
    pub(crate) header: Option<String>,
    pub(crate) validated_source: Option<String>,
}

impl Program {
    pub(crate) fn validating(source: &str) -> Self {
        Self {
            status: ProgramStatus::Validating,
            source: source.to_string(),
            diagnostics: Vec::new(),
            kernels: Vec::new(),
            header: None,
            validated_source: None,
        }
    }

    /// Close the run: fix the status and drop outputs of illegal programs.
    pub(crate) fn finish(mut self) -> Self {
        self.status = ProgramStatus::from_diagnostics(&self.diagnostics);
        if !self.status.is_accepted() {
            self.kernels.clear();
            self.header = None;
            self.validated_source = None;
        }
        self
    }

    pub fn status(&self) -> ProgramStatus {
        self.status
    }

    pub fn diagnostics(&self) -> &[Diagnostic] {
        &self.diagnostics
    }

    pub fn diagnostic_count(&self) -> usize {
        self.diagnostics.len()
    }

    pub fn diagnostic_at(&self, n: usize) -> Option<&Diagnostic> {
        self.diagnostics.get(n)
    }

    pub fn kernels(&self) -> &[KernelDescriptor] {
        &self.kernels
    }

    pub fn kernel_count(&self) -> usize {
        self.kernels.len()
    }

    pub fn kernel_name(&self, k: usize) -> Option<&str> {
        self.kernels.get(k).map(|kernel| kernel.name.as_str())
    }

    /// Number of parameters of the rewritten kernel, size parameters included.
    pub fn parameter_count(&self, k: usize) -> Option<usize> {
        self.kernels.get(k).map(|kernel| kernel.parameters.len())
    }

    fn parameter(&self, k: usize, p: usize) -> Option<&KernelParameter> {
        self.kernels.get(k)?.parameters.get(p)
    }

    pub fn parameter_name(&self, k: usize, p: usize) -> Option<&str> {
        self.parameter(k, p).map(|param| param.name.as_str())
    }

    pub fn parameter_type(&self, k: usize, p: usize) -> Option<&str> {
        self.parameter(k, p).map(|param| param.type_name.as_str())
    }

    pub fn parameter_is_pointer(&self, k: usize, p: usize) -> Option<bool> {
        self.parameter(k, p).map(KernelParameter::is_pointer)
    }

    pub fn parameter_address_space(&self, k: usize, p: usize) -> Option<PointerKind> {
        self.parameter(k, p).map(|param| match &param.kind {
            ParameterKind::Pointer { address_space, .. } => match address_space {
                AddressSpace::Global => PointerKind::Global,
                AddressSpace::Constant => PointerKind::Constant,
                AddressSpace::Local => PointerKind::Local,
                AddressSpace::Private => PointerKind::NotPointer,
            },
            _ => PointerKind::NotPointer,
        })
    }

    pub fn parameter_is_image(&self, k: usize, p: usize) -> Option<bool> {
        self.parameter(k, p).map(KernelParameter::is_image)
    }

    pub fn parameter_access_qualifier(&self, k: usize, p: usize) -> Option<ImageKind> {
        self.parameter(k, p).map(|param| match &param.kind {
            ParameterKind::Image {
                access: ImageAccess::ReadOnly,
            } => ImageKind::Readable,
            ParameterKind::Image {
                access: ImageAccess::WriteOnly,
            } => ImageKind::Writable,
            _ => ImageKind::NotImage,
        })
    }

    /// The header followed by the rewritten source; `None` unless accepted.
    pub fn validated_source(&self) -> Option<&str> {
        self.validated_source.as_deref()
    }

    /// The JSON header comment; `None` unless accepted.
    pub fn header(&self) -> Option<&str> {
        self.header.as_deref()
    }

    /// All diagnostics rendered without colors, in order.
    pub fn render_diagnostics(&self, filename: &str) -> String {
        self.diagnostics
            .iter()
            .map(|d| d.render_plain(filename, &self.source))
            .collect()
    }
}
