pub mod builtins;
mod expr;
#[cfg(test)]
mod tests;
pub mod types;

use std::collections::HashMap;

use crate::ast::*;
use crate::diagnostic::{has_errors, Diagnostic};
use crate::span::Span;
use crate::types::Ty;

/// Resolves identifiers and assigns a type to every expression of a
/// translation unit.
pub(crate) struct TypeChecker<'a> {
    pub(super) unit: &'a mut TranslationUnit,
    /// Variable scopes (stack of scope maps); the first is file scope.
    pub(super) scopes: Vec<HashMap<String, VarId>>,
    /// Return types of user functions.
    pub(super) functions: HashMap<String, Ty>,
    /// Accumulated diagnostics.
    pub(super) diagnostics: Vec<Diagnostic>,
}

impl<'a> TypeChecker<'a> {
    pub(crate) fn new(unit: &'a mut TranslationUnit) -> Self {
        Self {
            unit,
            scopes: vec![HashMap::new()],
            functions: HashMap::new(),
            diagnostics: Vec::new(),
        }
    }

    /// Check the whole unit. `Ok` carries the warnings; `Err` carries every
    /// diagnostic when at least one is an error.
    pub(crate) fn check_unit(mut self) -> Result<Vec<Diagnostic>, Vec<Diagnostic>> {
        for f in self.unit.functions() {
            self.functions
                .entry(f.name.node.clone())
                .or_insert_with(|| f.return_ty.clone());
        }

        let items = std::mem::take(&mut self.unit.items);
        for item in &items {
            match item {
                Item::Function(f) => self.check_function(f),
                Item::Variables(vars) => self.check_var_decls(vars),
                Item::Record(_) | Item::Typedef(_) | Item::Directive(_) => {}
            }
        }
        self.unit.items = items;

        if has_errors(&self.diagnostics) {
            Err(self.diagnostics)
        } else {
            Ok(self.diagnostics)
        }
    }

    fn check_function(&mut self, f: &FunctionDecl) {
        let Some(body) = &f.body else {
            return;
        };
        self.scopes.push(HashMap::new());
        for param in &f.params {
            let name = self.unit.var(param.var).name.node.clone();
            if !name.is_empty() {
                self.declare(name, param.var);
            }
        }
        self.check_block(body);
        self.scopes.pop();
    }

    fn check_block(&mut self, block: &Block) {
        self.scopes.push(HashMap::new());
        for stmt in &block.stmts {
            self.check_stmt(&stmt.node, stmt.span);
        }
        self.scopes.pop();
    }

    fn check_stmt(&mut self, stmt: &Stmt, span: Span) {
        match stmt {
            Stmt::Decl(vars) => self.check_var_decls(vars),
            Stmt::Expr(e) => {
                self.check_expr(*e);
                self.warn_if_unused(*e, span);
            }
            Stmt::Block(block) => self.check_block(block),
            Stmt::If {
                cond,
                then,
                otherwise,
            } => {
                self.check_expr(*cond);
                self.check_stmt(&then.node, then.span);
                if let Some(otherwise) = otherwise {
                    self.check_stmt(&otherwise.node, otherwise.span);
                }
            }
            Stmt::While { cond, body } | Stmt::DoWhile { body, cond } | Stmt::Switch { cond, body } => {
                self.check_expr(*cond);
                self.check_stmt(&body.node, body.span);
            }
            Stmt::For {
                init,
                cond,
                step,
                body,
            } => {
                self.scopes.push(HashMap::new());
                if let Some(init) = init {
                    self.check_stmt(&init.node, init.span);
                }
                if let Some(cond) = cond {
                    self.check_expr(*cond);
                }
                if let Some(step) = step {
                    self.check_expr(*step);
                }
                self.check_stmt(&body.node, body.span);
                self.scopes.pop();
            }
            Stmt::Case(value) => {
                self.check_expr(*value);
            }
            Stmt::Return(value) => {
                if let Some(value) = value {
                    self.check_expr(*value);
                }
            }
            Stmt::Typedef(_)
            | Stmt::Default
            | Stmt::Break
            | Stmt::Continue
            | Stmt::Empty => {}
        }
    }

    /// Check initializers, then bring the names into scope.
    fn check_var_decls(&mut self, vars: &[VarId]) {
        for &var in vars {
            if let Some(init) = self.unit.var(var).init.clone() {
                self.check_init(&init);
                // `int a[] = {1, 2, 3}` takes its length from the initializer
                let inferred = match (&self.unit.var(var).ty, &init) {
                    (Ty::Array { elem, len: None }, Init::List(elems, _)) => Some(Ty::Array {
                        elem: elem.clone(),
                        len: Some(elems.len() as u64),
                    }),
                    _ => None,
                };
                if let Some(ty) = inferred {
                    self.unit.vars[var.0 as usize].ty = ty;
                }
            }
            let name = self.unit.var(var).name.node.clone();
            self.declare(name, var);
        }
    }

    fn check_init(&mut self, init: &Init) {
        match init {
            Init::Expr(e) => {
                self.check_expr(*e);
            }
            Init::List(elems, _) => {
                for elem in elems {
                    self.check_init(elem);
                }
            }
        }
    }

    fn warn_if_unused(&mut self, id: ExprId, span: Span) {
        let root = self.unit.exprs.strip_parens(id);
        let unused = match &self.unit.exprs.get(root).kind {
            ExprKind::Unary { op, .. } => !matches!(
                op,
                UnaryOp::PreInc | UnaryOp::PreDec | UnaryOp::PostInc | UnaryOp::PostDec
            ),
            ExprKind::Binary { .. }
            | ExprKind::Ident { .. }
            | ExprKind::Int { .. }
            | ExprKind::Float(_)
            | ExprKind::Char(_)
            | ExprKind::Index { .. }
            | ExprKind::Member { .. } => true,
            _ => false,
        };
        if unused {
            self.diagnostics
                .push(Diagnostic::warning("expression result unused".to_string(), span));
        }
    }

    pub(super) fn declare(&mut self, name: String, var: VarId) {
        if let Some(scope) = self.scopes.last_mut() {
            scope.insert(name, var);
        }
    }

    pub(super) fn lookup(&self, name: &str) -> Option<VarId> {
        self.scopes
            .iter()
            .rev()
            .find_map(|scope| scope.get(name).copied())
    }

    pub(super) fn error(&mut self, msg: String, span: Span) {
        self.diagnostics.push(Diagnostic::error(msg, span));
    }
}
