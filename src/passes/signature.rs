//! Classifies kernel parameters and adds a size parameter after every
//! pointer parameter.

use serde::Serialize;
use tracing::debug;

use crate::ast::*;
use crate::typecheck::builtins;
use crate::types::{AddressSpace, Ty};

use super::{Context, InternalError};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ImageAccess {
    ReadOnly,
    WriteOnly,
}

impl ImageAccess {
    pub fn as_str(&self) -> &'static str {
        match self {
            ImageAccess::ReadOnly => "read_only",
            ImageAccess::WriteOnly => "write_only",
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "kebab-case")]
pub enum ParameterKind {
    Image {
        access: ImageAccess,
    },
    Sampler,
    /// A memory object; `size_parameter` holds its element count.
    Pointer {
        #[serde(rename = "address-space")]
        address_space: AddressSpace,
        #[serde(rename = "size-parameter")]
        size_parameter: String,
    },
    Primitive,
    /// The synthesized element count of the pointer parameter `owner`.
    SizeCompanion {
        owner: String,
    },
}

/// One parameter of a rewritten kernel.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct KernelParameter {
    pub name: String,
    /// Position in the rewritten parameter list.
    pub index: usize,
    #[serde(rename = "type")]
    pub type_name: String,
    #[serde(flatten)]
    pub kind: ParameterKind,
}

impl KernelParameter {
    pub fn is_pointer(&self) -> bool {
        matches!(self.kind, ParameterKind::Pointer { .. })
    }

    pub fn is_image(&self) -> bool {
        matches!(self.kind, ParameterKind::Image { .. })
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct KernelDescriptor {
    pub name: String,
    pub parameters: Vec<KernelParameter>,
}

pub struct SignatureAnalyzer<'c, 'a> {
    cx: &'c mut Context<'a>,
}

impl<'c, 'a> SignatureAnalyzer<'c, 'a> {
    pub fn new(cx: &'c mut Context<'a>) -> Self {
        Self { cx }
    }

    /// Describe every kernel in declaration order and queue the size
    /// parameter insertions.
    pub fn run(self) -> Result<(), InternalError> {
        let mut kernels = Vec::new();
        let mut insertions = Vec::new();
        for kernel in self.cx.unit.kernels() {
            let descriptor = self.describe(kernel, &mut insertions)?;
            check_size_parameters(&descriptor, kernel)?;
            debug!(
                kernel = %descriptor.name,
                parameters = descriptor.parameters.len(),
                "described kernel"
            );
            kernels.push(descriptor);
        }
        for (offset, text) in insertions {
            self.cx.rewrites.insert(offset, text)?;
        }
        self.cx.kernels = kernels;
        Ok(())
    }

    fn describe(
        &self,
        kernel: &FunctionDecl,
        insertions: &mut Vec<(u32, String)>,
    ) -> Result<KernelDescriptor, InternalError> {
        let unit = &self.cx.unit;
        let config = self.cx.config;
        let mut parameters = Vec::new();
        let mut index = 0;
        for param in &kernel.params {
            let var = unit.var(param.var);
            let name = var.name.node.clone();
            let type_name = unit.type_name(&var.ty);
            match &var.ty {
                Ty::Image(_) => {
                    let access = self.image_access(param);
                    parameters.push(KernelParameter {
                        name,
                        index,
                        type_name,
                        kind: ParameterKind::Image { access },
                    });
                }
                Ty::Sampler => parameters.push(KernelParameter {
                    name,
                    index,
                    type_name,
                    kind: ParameterKind::Sampler,
                }),
                Ty::Pointer { space, .. } => {
                    if *space == AddressSpace::Private {
                        return Err(InternalError::UnsupportedAddressSpace {
                            kernel: kernel.name.node.clone(),
                            parameter: name,
                            space: space.as_str(),
                            span: param.span,
                        });
                    }
                    let size_parameter = config.size_parameter_name(&name);
                    insertions.push((
                        param.span.end,
                        format!(", {} {}", config.size_parameter_type, size_parameter),
                    ));
                    parameters.push(KernelParameter {
                        name: name.clone(),
                        index,
                        type_name,
                        kind: ParameterKind::Pointer {
                            address_space: *space,
                            size_parameter: size_parameter.clone(),
                        },
                    });
                    index += 1;
                    parameters.push(KernelParameter {
                        name: size_parameter,
                        index,
                        type_name: config.size_parameter_type.clone(),
                        kind: ParameterKind::SizeCompanion { owner: name },
                    });
                }
                _ => parameters.push(KernelParameter {
                    name,
                    index,
                    type_name,
                    kind: ParameterKind::Primitive,
                }),
            }
            index += 1;
        }
        Ok(KernelDescriptor {
            name: kernel.name.node.clone(),
            parameters,
        })
    }

    /// Declared access, or `write_only` for an undeclared image that is
    /// passed to a `write_image*` builtin.
    fn image_access(&self, param: &ParamDecl) -> ImageAccess {
        match param.access {
            Some(AccessQualifier::WriteOnly) => return ImageAccess::WriteOnly,
            Some(_) => return ImageAccess::ReadOnly,
            None => {}
        }
        let arena = &self.cx.unit.exprs;
        let written = (0..arena.len() as u32).map(ExprId).any(|id| {
            let ExprKind::Call { callee, args } = &arena.get(id).kind else {
                return false;
            };
            builtins::is_image_write(&callee.node)
                && args.first().is_some_and(|arg| {
                    matches!(
                        &arena.get(arena.strip_parens(*arg)).kind,
                        ExprKind::Ident { binding: Binding::Var(var), .. } if *var == param.var
                    )
                })
        });
        if written {
            ImageAccess::WriteOnly
        } else {
            ImageAccess::ReadOnly
        }
    }
}

/// Every pointer parameter is directly followed by its own size parameter.
fn check_size_parameters(
    descriptor: &KernelDescriptor,
    kernel: &FunctionDecl,
) -> Result<(), InternalError> {
    for (i, param) in descriptor.parameters.iter().enumerate() {
        let ParameterKind::Pointer { size_parameter, .. } = &param.kind else {
            continue;
        };
        let follows = descriptor.parameters.get(i + 1).is_some_and(|next| {
            next.name == *size_parameter
                && next.index == param.index + 1
                && matches!(&next.kind, ParameterKind::SizeCompanion { owner } if *owner == param.name)
        });
        if !follows {
            return Err(InternalError::MissingSizeCompanion {
                kernel: descriptor.name.clone(),
                parameter: param.name.clone(),
                span: kernel.name.span,
            });
        }
    }
    Ok(())
}
