//! Clamps every array subscript and pointer dereference into its allocation.
//!
//! `base[index]` becomes `base[index % bound]`, where the bound is the
//! element count of a fixed-size array or vector, or the size parameter
//! synthesized for a pointer kernel parameter. Indices that may be negative
//! are converted to the size type first, so the clamped value always lies in
//! `[0, bound)`. Accesses are rebuilt bottom-up: the rewrite of an enclosing
//! access is printed from the already clamped subtree and replaces the inner
//! rewrites.

use std::collections::HashMap;

use tracing::debug;

use crate::ast::display::print_expr;
use crate::ast::*;
use crate::diagnostic::Diagnostic;
use crate::span::Spanned;
use crate::types::Ty;

use super::{Context, InternalError};

/// What an access's index is clamped against.
enum Bound {
    Length(u64),
    SizeParameter(String),
}

pub struct Instrumenter<'c, 'a> {
    cx: &'c mut Context<'a>,
    /// Size parameter names of the pointer parameters of the kernel being walked.
    size_parameters: HashMap<VarId, String>,
    size_ty: Ty,
}

impl<'c, 'a> Instrumenter<'c, 'a> {
    pub fn new(cx: &'c mut Context<'a>) -> Result<Self, InternalError> {
        let size_ty =
            cx.config
                .size_type()
                .ok_or_else(|| InternalError::UnsupportedSizeType {
                    spelling: cx.config.size_parameter_type.clone(),
                })?;
        Ok(Self {
            cx,
            size_parameters: HashMap::new(),
            size_ty,
        })
    }

    /// Instrument every function body and program-scope initializer.
    /// Unresolvable accesses are reported and left unchanged.
    pub fn run(mut self) -> Result<(), InternalError> {
        let items = std::mem::take(&mut self.cx.unit.items);
        let result = self.walk_items(&items);
        self.cx.unit.items = items;
        result
    }

    fn walk_items(&mut self, items: &[Item]) -> Result<(), InternalError> {
        for item in items {
            match item {
                Item::Function(f) => {
                    let Some(body) = &f.body else {
                        continue;
                    };
                    self.enter_function(f);
                    debug!(function = %f.name.node, "instrumenting");
                    self.walk_block(body)?;
                }
                Item::Variables(vars) => {
                    self.size_parameters.clear();
                    self.walk_vars(vars)?;
                }
                Item::Record(_) | Item::Typedef(_) | Item::Directive(_) => {}
            }
        }
        Ok(())
    }

    fn enter_function(&mut self, f: &FunctionDecl) {
        self.size_parameters.clear();
        if !f.is_kernel {
            return;
        }
        for param in &f.params {
            let var = self.cx.unit.var(param.var);
            if var.ty.is_pointer() {
                let name = self.cx.config.size_parameter_name(&var.name.node);
                self.size_parameters.insert(param.var, name);
            }
        }
    }

    fn walk_block(&mut self, block: &Block) -> Result<(), InternalError> {
        for stmt in &block.stmts {
            self.walk_stmt(stmt)?;
        }
        Ok(())
    }

    fn walk_stmt(&mut self, stmt: &Spanned<Stmt>) -> Result<(), InternalError> {
        match &stmt.node {
            Stmt::Decl(vars) => self.walk_vars(vars)?,
            Stmt::Expr(e) | Stmt::Case(e) | Stmt::Return(Some(e)) => self.visit(*e)?,
            Stmt::Block(block) => self.walk_block(block)?,
            Stmt::If {
                cond,
                then,
                otherwise,
            } => {
                self.visit(*cond)?;
                self.walk_stmt(then)?;
                if let Some(otherwise) = otherwise {
                    self.walk_stmt(otherwise)?;
                }
            }
            Stmt::While { cond, body } | Stmt::Switch { cond, body } => {
                self.visit(*cond)?;
                self.walk_stmt(body)?;
            }
            Stmt::DoWhile { body, cond } => {
                self.walk_stmt(body)?;
                self.visit(*cond)?;
            }
            Stmt::For {
                init,
                cond,
                step,
                body,
            } => {
                if let Some(init) = init {
                    self.walk_stmt(init)?;
                }
                for e in [cond, step].into_iter().flatten() {
                    self.visit(*e)?;
                }
                self.walk_stmt(body)?;
            }
            Stmt::Typedef(_)
            | Stmt::Return(None)
            | Stmt::Default
            | Stmt::Break
            | Stmt::Continue
            | Stmt::Empty => {}
        }
        Ok(())
    }

    fn walk_vars(&mut self, vars: &[VarId]) -> Result<(), InternalError> {
        for &var in vars {
            if let Some(init) = self.cx.unit.var(var).init.clone() {
                self.walk_init(&init)?;
            }
        }
        Ok(())
    }

    fn walk_init(&mut self, init: &Init) -> Result<(), InternalError> {
        match init {
            Init::Expr(e) => self.visit(*e),
            Init::List(elems, _) => elems.iter().try_for_each(|e| self.walk_init(e)),
        }
    }

    /// Post-order: children are clamped before the access that contains them.
    fn visit(&mut self, id: ExprId) -> Result<(), InternalError> {
        if matches!(self.cx.unit.exprs.get(id).kind, ExprKind::SizeofExpr(_)) {
            // unevaluated
            return Ok(());
        }
        for child in self.cx.unit.exprs.children(id) {
            self.visit(child)?;
        }

        match self.cx.unit.exprs.get(id).kind.clone() {
            ExprKind::Index { base, index } => self.clamp(id, base, Some(index), None),
            ExprKind::Unary {
                op: UnaryOp::Deref,
                operand,
            } => {
                let (base, index) = self.split_deref(operand);
                self.clamp(id, base, index, None)
            }
            ExprKind::Member {
                base,
                field,
                arrow: true,
            } => self.clamp(id, base, None, Some(field)),
            _ => Ok(()),
        }
    }

    /// `*(p + i)` and `*(i + p)` access `p[i]`; any other `*p` accesses `p[0]`.
    fn split_deref(&self, operand: ExprId) -> (ExprId, Option<ExprId>) {
        let arena = &self.cx.unit.exprs;
        let inner = arena.strip_parens(operand);
        if let ExprKind::Binary {
            op: BinOp::Add,
            lhs,
            rhs,
        } = arena.get(inner).kind
        {
            let addressable = |e: ExprId| matches!(arena.get(e).ty, Ty::Pointer { .. } | Ty::Array { .. });
            if addressable(lhs) && arena.get(rhs).ty.is_integer() {
                return (lhs, Some(rhs));
            }
            if addressable(rhs) && arena.get(lhs).ty.is_integer() {
                return (rhs, Some(lhs));
            }
        }
        (operand, None)
    }

    /// Replace the access `id` by `base[index % bound]`, followed by `.field`
    /// for `p->field`.
    fn clamp(
        &mut self,
        id: ExprId,
        base: ExprId,
        index: Option<ExprId>,
        field: Option<Spanned<String>>,
    ) -> Result<(), InternalError> {
        let node = self.cx.unit.exprs.get(id).clone();
        let bound = match self.bound(base) {
            Ok(bound) => bound,
            Err(diag) => {
                self.cx.diagnostics.push(diag);
                return Ok(());
            }
        };

        let arena = &mut self.cx.unit.exprs;
        let base_copy = arena.deep_clone(base);
        let index_copy = match index {
            Some(index) => arena.deep_clone(index),
            None => arena.synthesize(
                ExprKind::Int {
                    value: 0,
                    unsigned: false,
                },
                node.span,
                Ty::int(),
            ),
        };
        let index_copy = if is_non_negative(arena, index_copy) {
            index_copy
        } else {
            let span = arena.get(index_copy).span;
            arena.synthesize(
                ExprKind::Cast {
                    ty: self.size_ty.clone(),
                    spelling: self.cx.config.size_parameter_type.clone(),
                    expr: index_copy,
                },
                span,
                self.size_ty.clone(),
            )
        };
        let bound_expr = match bound {
            Bound::Length(len) => arena.synthesize(
                ExprKind::Int {
                    value: len,
                    unsigned: false,
                },
                node.span,
                Ty::int(),
            ),
            Bound::SizeParameter(name) => arena.synthesize(
                ExprKind::Ident {
                    name,
                    binding: Binding::Unresolved,
                },
                node.span,
                self.size_ty.clone(),
            ),
        };
        let clamped = arena.synthesize(
            ExprKind::Binary {
                op: BinOp::Rem,
                lhs: index_copy,
                rhs: bound_expr,
            },
            node.span,
            self.size_ty.clone(),
        );

        let element_ty = arena.get(base).ty.element_type().unwrap_or(Ty::Unknown);
        let kind = match field {
            None => ExprKind::Index {
                base: base_copy,
                index: clamped,
            },
            Some(field) => {
                let element = arena.synthesize(
                    ExprKind::Index {
                        base: base_copy,
                        index: clamped,
                    },
                    node.span,
                    element_ty,
                );
                ExprKind::Member {
                    base: element,
                    field,
                    arrow: false,
                }
            }
        };
        arena.replace(
            id,
            ExprNode {
                kind,
                span: node.span,
                ty: node.ty,
                synthesized: true,
            },
        );

        let text = {
            let cx = &*self.cx;
            print_expr(&cx.unit.exprs, id, &|span| cx.rendered(span))
        };
        debug!(start = node.span.start, end = node.span.end, %text, "clamped access");
        self.cx.rewrites.replace(node.span, text)
    }

    /// The bound of an access through `base`.
    fn bound(&self, base: ExprId) -> Result<Bound, Diagnostic> {
        let arena = &self.cx.unit.exprs;
        let base_node = arena.get(base);
        let ty = &base_node.ty;
        if let Some(len) = ty.known_array_len() {
            if len == 0 {
                return Err(Diagnostic::unresolvable_bound(
                    "cannot index an array of length zero".to_string(),
                    base_node.span,
                ));
            }
            return Ok(Bound::Length(len));
        }

        if let ExprKind::Ident {
            binding: Binding::Var(var),
            ..
        } = &arena.get(arena.strip_parens(base)).kind
        {
            if let Some(name) = self.size_parameters.get(var) {
                return Ok(Bound::SizeParameter(name.clone()));
            }
        }

        let text = self.cx.rendered(base_node.span);
        Err(Diagnostic::unresolvable_bound(
            format!(
                "cannot determine the size of the memory accessed through '{}'",
                text
            ),
            base_node.span,
        )
        .with_help(
            "only fixed-size arrays and pointer kernel parameters can be accessed".to_string(),
        ))
    }
}

/// Unsigned values and integer constants can be clamped with a plain `%`.
fn is_non_negative(arena: &ExprArena, id: ExprId) -> bool {
    let node = arena.get(arena.strip_parens(id));
    match &node.kind {
        ExprKind::Int { .. } => true,
        // `char` may be signed: '\xff' is -1
        ExprKind::Char(value) => *value < 0x80,
        ExprKind::Ident {
            binding: Binding::Constant(_),
            ..
        } => true,
        _ => node.ty.is_unsigned_integer(),
    }
}
