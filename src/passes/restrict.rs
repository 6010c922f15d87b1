//! Rejects constructs that cannot run safely inside the sandbox.

use std::collections::{HashMap, HashSet};

use crate::ast::*;
use crate::config::INITIALIZE_MEMORY_EXTENSION;
use crate::diagnostic::{Diagnostic, Severity};
use crate::parser::parse_define_value;
use crate::span::{Span, Spanned};
use crate::typecheck::builtins;
use crate::types::{AddressSpace, ImageDim, Ty};

use super::Context;

pub struct Restrictor<'c, 'a> {
    cx: &'c mut Context<'a>,
}

impl<'c, 'a> Restrictor<'c, 'a> {
    pub fn new(cx: &'c mut Context<'a>) -> Self {
        Self { cx }
    }

    /// Collect every violation in one sweep. The AST is not modified.
    pub fn run(self) {
        let mut found = Vec::new();
        for directive in &self.cx.unit.directives {
            self.check_directive(directive, &mut found);
        }
        self.check_defines(&mut found);
        for f in self.cx.unit.functions() {
            self.check_reserved(&f.name.node, f.name.span, &mut found);
            if f.is_kernel {
                if f.body.is_none() {
                    found.push(
                        Diagnostic::restriction(
                            format!("declaration of kernel '{}' without a body", f.name.node),
                            f.name.span,
                        )
                        .with_help("define each kernel once, without a separate prototype".to_string()),
                    );
                }
                for param in &f.params {
                    self.check_kernel_param(param, &mut found);
                }
            }
        }
        for var in &self.cx.unit.vars {
            if !var.name.node.is_empty() {
                self.check_reserved(&var.name.node, var.name.span, &mut found);
            }
        }
        for record in &self.cx.unit.records {
            if let Some(name) = &record.name {
                self.check_reserved(&name.node, name.span, &mut found);
            }
            for field in &record.fields {
                self.check_reserved(&field.name.node, field.name.span, &mut found);
            }
        }
        for typedef in typedefs(&self.cx.unit) {
            self.check_reserved(&typedef.name.node, typedef.name.span, &mut found);
        }
        self.check_calls(&mut found);
        self.check_pointer_parameter_uses(&mut found);

        found.sort_by_key(|d: &Diagnostic| d.span.map(|s| s.start));
        self.cx.diagnostics.append(&mut found);
    }

    fn check_kernel_param(&self, param: &ParamDecl, found: &mut Vec<Diagnostic>) {
        let var = self.cx.unit.var(param.var);
        let name = &var.name.node;
        let type_name = self.cx.unit.type_name(&var.ty);
        match &var.ty {
            ty if ty.is_structure() => found.push(
                Diagnostic::restriction(
                    format!(
                        "kernel parameter '{}' has structure or union type '{}'",
                        name, type_name
                    ),
                    param.span,
                )
                .with_help("pass the structure through a global or constant pointer".to_string()),
            ),
            Ty::Image(ImageDim::Image3d) => found.push(Diagnostic::restriction(
                format!("kernel parameter '{}' has unsupported image type 'image3d_t'", name),
                param.span,
            )),
            Ty::Image(_) if param.access == Some(AccessQualifier::ReadWrite) => {
                found.push(
                    Diagnostic::restriction(
                        format!("image parameter '{}' cannot be read_write", name),
                        param.span,
                    )
                    .with_help("declare the image read_only or write_only".to_string()),
                )
            }
            Ty::Event => found.push(Diagnostic::restriction(
                format!(
                    "kernel parameter '{}' has type '{}', which cannot be passed from the host",
                    name, type_name
                ),
                param.span,
            )),
            Ty::Pointer { pointee, space } => {
                if *space == AddressSpace::Private {
                    found.push(
                        Diagnostic::restriction(
                            format!(
                                "kernel pointer parameter '{}' must point to global, constant or local memory",
                                name
                            ),
                            param.span,
                        )
                        .with_help("add an address space qualifier such as '__global'".to_string()),
                    );
                }
                if pointee.is_pointer() {
                    found.push(Diagnostic::restriction(
                        format!("kernel parameter '{}' is a pointer to a pointer", name),
                        param.span,
                    ));
                }
            }
            _ => {}
        }
    }

    fn check_reserved(&self, name: &str, span: Span, found: &mut Vec<Diagnostic>) {
        if self.cx.config.is_reserved(name) {
            found.push(Diagnostic::restriction(
                format!(
                    "identifier '{}' uses the reserved prefix '{}'",
                    name, self.cx.config.variable_prefix
                ),
                span,
            ));
        }
    }

    fn check_calls(&self, found: &mut Vec<Diagnostic>) {
        let arena = &self.cx.unit.exprs;
        for id in (0..arena.len() as u32).map(ExprId) {
            let ExprKind::Call { callee, .. } = &arena.get(id).kind else {
                continue;
            };
            let name = callee.node.as_str();
            if let Some(f) = self.cx.unit.functions().find(|f| f.name.node == name) {
                if f.is_kernel {
                    found.push(
                        Diagnostic::restriction(
                            format!("kernel '{}' cannot be called from device code", name),
                            callee.span,
                        )
                        .with_help("move the shared code into a non-kernel function".to_string()),
                    );
                }
                continue;
            }
            if builtins::is_unsupported(name) {
                found.push(Diagnostic::restriction(
                    format!("builtin function '{}' is not supported", name),
                    callee.span,
                ));
            } else if builtins::accesses_through_pointer(name) {
                found.push(
                    Diagnostic::restriction(
                        format!(
                            "pointer arguments of builtin function '{}' are not bounds checked",
                            name
                        ),
                        callee.span,
                    )
                    .with_severity(Severity::Warning),
                );
            }
        }
    }

    /// Directives the front end does not expand itself. Macros must be
    /// integer constants and nothing may be included.
    fn check_directive(&self, directive: &Spanned<String>, found: &mut Vec<Diagnostic>) {
        let text = directive.node.replace("\\\n", " ");
        let (keyword, rest) = split_word(&text);
        let span = directive.span;
        match keyword {
            "" | "undef" | "line" | "error" | "warning" => {}
            "define" => self.check_define(rest, span, found),
            "pragma" => self.check_pragma(rest, span, found),
            "include" | "import" => found.push(Diagnostic::restriction(
                format!("the '#{}' directive is not supported", keyword),
                span,
            )),
            "if" | "ifdef" | "ifndef" | "elif" | "else" | "endif" => found.push(
                Diagnostic::restriction(
                    format!("conditional directive '#{}' is not supported", keyword),
                    span,
                )
                .with_help("every line of the program is validated, so select the code before validation".to_string()),
            ),
            other => found.push(Diagnostic::restriction(
                format!("preprocessor directive '#{}' is not supported", other),
                span,
            )),
        }
    }

    fn check_define(&self, rest: &str, span: Span, found: &mut Vec<Diagnostic>) {
        let (name, body) = split_word(rest);
        if name.is_empty() {
            found.push(Diagnostic::restriction("macro definition without a name".to_string(), span));
            return;
        }
        if rest[name.len()..].starts_with('(') {
            found.push(
                Diagnostic::restriction(format!("function-like macro '{}' is not supported", name), span)
                    .with_help("use a function instead".to_string()),
            );
        } else if parse_define_value(body).is_none() {
            found.push(Diagnostic::restriction(
                format!("macro '{}' must expand to an integer constant", name),
                span,
            ));
        }
    }

    /// `#pragma OPENCL EXTENSION <name> : enable|disable`; other pragmas pass.
    fn check_pragma(&self, rest: &str, span: Span, found: &mut Vec<Diagnostic>) {
        let (namespace, rest) = split_word(rest);
        let (directive, rest) = split_word(rest);
        if namespace != "OPENCL" || directive != "EXTENSION" {
            return;
        }
        let (extension, state) = match rest.split_once(':') {
            Some((extension, state)) => (extension.trim(), state.trim()),
            None => (rest.trim(), ""),
        };
        match state {
            "enable" if !self.cx.config.supports_extension(extension) => {
                found.push(Diagnostic::restriction(
                    format!("enabling extension '{}' is not supported", extension),
                    span,
                ))
            }
            "disable" if extension == INITIALIZE_MEMORY_EXTENSION || extension == "all" => {
                found.push(Diagnostic::restriction(
                    format!("extension '{}' cannot be disabled", INITIALIZE_MEMORY_EXTENSION),
                    span,
                ))
            }
            "enable" | "disable" => {}
            _ => found.push(Diagnostic::restriction(
                "malformed OPENCL EXTENSION pragma".to_string(),
                span,
            )),
        }
    }

    fn check_defines(&self, found: &mut Vec<Diagnostic>) {
        let mut values: HashMap<&str, u64> = HashMap::new();
        for define in &self.cx.unit.defines {
            self.check_reserved(&define.name.node, define.name.span, found);
            match values.insert(&define.name.node, define.value) {
                Some(previous) if previous != define.value => found.push(Diagnostic::restriction(
                    format!("macro '{}' is redefined with a different value", define.name.node),
                    define.name.span,
                )),
                _ => {}
            }
        }
    }

    /// The size parameter of a pointer kernel parameter counts elements from
    /// the address the host passed, so the pointer itself must stay fixed.
    fn check_pointer_parameter_uses(&self, found: &mut Vec<Diagnostic>) {
        let unit = &self.cx.unit;
        let pointers: HashSet<VarId> = unit
            .functions()
            .filter(|f| f.is_kernel)
            .flat_map(|f| f.params.iter().map(|p| p.var))
            .filter(|var| unit.var(*var).ty.is_pointer())
            .collect();
        if pointers.is_empty() {
            return;
        }
        let arena = &unit.exprs;
        let pointer_parameter = |id: ExprId| match &arena.get(arena.strip_parens(id)).kind {
            ExprKind::Ident {
                binding: Binding::Var(var),
                name,
            } if pointers.contains(var) => Some(name.clone()),
            _ => None,
        };
        for id in (0..arena.len() as u32).map(ExprId) {
            let node = arena.get(id);
            let (target, action) = match &node.kind {
                ExprKind::Assign { lhs, .. } => (*lhs, "modified"),
                ExprKind::Unary {
                    op: UnaryOp::PreInc | UnaryOp::PreDec | UnaryOp::PostInc | UnaryOp::PostDec,
                    operand,
                } => (*operand, "modified"),
                ExprKind::Unary {
                    op: UnaryOp::AddrOf,
                    operand,
                } => (*operand, "taken by address"),
                _ => continue,
            };
            if let Some(name) = pointer_parameter(target) {
                found.push(
                    Diagnostic::restriction(
                        format!("pointer kernel parameter '{}' cannot be {}", name, action),
                        node.span,
                    )
                    .with_help(format!("index '{}' with an offset variable instead", name)),
                );
            }
        }
    }
}

/// Leading identifier of `text` and the trimmed remainder.
fn split_word(text: &str) -> (&str, &str) {
    let text = text.trim_start();
    let end = text
        .find(|c: char| !(c.is_ascii_alphanumeric() || c == '_'))
        .unwrap_or(text.len());
    (&text[..end], text[end..].trim())
}

/// Typedefs at file scope and inside function bodies.
fn typedefs(unit: &TranslationUnit) -> Vec<&TypedefDecl> {
    fn from_stmt<'u>(stmt: &'u Stmt, out: &mut Vec<&'u TypedefDecl>) {
        match stmt {
            Stmt::Typedef(decls) => out.extend(decls),
            Stmt::Block(block) => block.stmts.iter().for_each(|s| from_stmt(&s.node, out)),
            Stmt::If {
                then, otherwise, ..
            } => {
                from_stmt(&then.node, out);
                if let Some(otherwise) = otherwise {
                    from_stmt(&otherwise.node, out);
                }
            }
            Stmt::While { body, .. } | Stmt::DoWhile { body, .. } | Stmt::Switch { body, .. } => {
                from_stmt(&body.node, out)
            }
            Stmt::For { init, body, .. } => {
                if let Some(init) = init {
                    from_stmt(&init.node, out);
                }
                from_stmt(&body.node, out);
            }
            _ => {}
        }
    }

    let mut out = Vec::new();
    for item in &unit.items {
        match item {
            Item::Typedef(decl) => out.push(decl),
            Item::Function(f) => {
                if let Some(body) = &f.body {
                    body.stmts.iter().for_each(|s| from_stmt(&s.node, &mut out));
                }
            }
            _ => {}
        }
    }
    out
}
