use crate::ast::*;
use crate::types::{AddressSpace, ScalarKind, Ty};

use super::{builtins, TypeChecker};

impl TypeChecker<'_> {
    /// Type an expression tree bottom-up and record the type on every node.
    pub(super) fn check_expr(&mut self, id: ExprId) -> Ty {
        let ty = self.compute_type(id);
        self.unit.exprs.get_mut(id).ty = ty.clone();
        ty
    }

    fn compute_type(&mut self, id: ExprId) -> Ty {
        let node = self.unit.exprs.get(id);
        let span = node.span;
        match node.kind.clone() {
            ExprKind::Int { value, unsigned } => integer_literal_type(value, unsigned),
            ExprKind::Float(text) => {
                if text.ends_with(['f', 'F']) {
                    Ty::Scalar(ScalarKind::Float)
                } else if text.ends_with(['h', 'H']) {
                    Ty::Scalar(ScalarKind::Half)
                } else {
                    Ty::Scalar(ScalarKind::Double)
                }
            }
            ExprKind::Char(_) => Ty::int(),
            ExprKind::Str(_) => Ty::Pointer {
                pointee: Box::new(Ty::Scalar(ScalarKind::Char)),
                space: AddressSpace::Constant,
            },
            ExprKind::Ident { name, .. } => self.resolve_ident(id, &name),
            ExprKind::Paren(inner) => self.check_expr(inner),
            ExprKind::Unary { op, operand } => {
                let operand_ty = self.check_expr(operand);
                match op {
                    UnaryOp::Deref => match operand_ty.element_type() {
                        Some(elem) if !matches!(operand_ty, Ty::Vector(..)) => elem,
                        _ if operand_ty == Ty::Unknown => Ty::Unknown,
                        _ => {
                            self.error(
                                format!(
                                    "indirection requires pointer operand ('{}' invalid)",
                                    self.unit.type_name(&operand_ty)
                                ),
                                span,
                            );
                            Ty::Unknown
                        }
                    },
                    UnaryOp::AddrOf => Ty::Pointer {
                        pointee: Box::new(operand_ty),
                        space: AddressSpace::Private,
                    },
                    UnaryOp::Not => Ty::int(),
                    UnaryOp::Neg | UnaryOp::Plus | UnaryOp::BitNot => match operand_ty {
                        Ty::Scalar(kind) => Ty::Scalar(kind.promote()),
                        other => other,
                    },
                    UnaryOp::PreInc | UnaryOp::PreDec | UnaryOp::PostInc | UnaryOp::PostDec => {
                        operand_ty
                    }
                }
            }
            ExprKind::Binary { op, lhs, rhs } => {
                let lhs_ty = self.check_expr(lhs);
                let rhs_ty = self.check_expr(rhs);
                binary_type(op, &lhs_ty, &rhs_ty)
            }
            ExprKind::Assign { lhs, rhs, .. } => {
                let lhs_ty = self.check_expr(lhs);
                self.check_expr(rhs);
                lhs_ty
            }
            ExprKind::Conditional {
                cond,
                then,
                otherwise,
            } => {
                self.check_expr(cond);
                let then_ty = self.check_expr(then);
                let else_ty = self.check_expr(otherwise);
                if then_ty.is_arithmetic() && else_ty.is_arithmetic() {
                    Ty::arithmetic_result(&then_ty, &else_ty)
                } else {
                    then_ty
                }
            }
            ExprKind::Comma { lhs, rhs } => {
                self.check_expr(lhs);
                self.check_expr(rhs)
            }
            ExprKind::Call { callee, args } => {
                let arg_tys: Vec<Ty> = args.iter().map(|a| self.check_expr(*a)).collect();
                if let Some(ret) = self.functions.get(&callee.node) {
                    ret.clone()
                } else {
                    // unknown callees are builtins
                    builtins::return_type(&callee.node, &arg_tys).unwrap_or(Ty::Unknown)
                }
            }
            ExprKind::Index { base, index } => {
                let base_ty = self.check_expr(base);
                let index_ty = self.check_expr(index);
                if !index_ty.is_integer() && index_ty != Ty::Unknown {
                    let index_span = self.unit.exprs.get(index).span;
                    self.error("array subscript is not an integer".to_string(), index_span);
                }
                match base_ty.element_type() {
                    Some(elem) => elem,
                    None if base_ty == Ty::Unknown => Ty::Unknown,
                    None => {
                        self.error(
                            format!(
                                "subscripted value of type '{}' is not an array, pointer, or vector",
                                self.unit.type_name(&base_ty)
                            ),
                            span,
                        );
                        Ty::Unknown
                    }
                }
            }
            ExprKind::Member { base, field, arrow } => {
                let base_ty = self.check_expr(base);
                let target = if arrow {
                    match &base_ty {
                        Ty::Pointer { pointee, .. } => (**pointee).clone(),
                        Ty::Unknown => Ty::Unknown,
                        other => {
                            self.error(
                                format!(
                                    "member reference type '{}' is not a pointer",
                                    self.unit.type_name(other)
                                ),
                                span,
                            );
                            Ty::Unknown
                        }
                    }
                } else {
                    base_ty
                };
                self.member_type(&target, &field.node, field.span)
            }
            ExprKind::Cast { ty, expr, .. } => {
                self.check_expr(expr);
                ty
            }
            ExprKind::SizeofType(_) => Ty::Scalar(ScalarKind::ULong),
            ExprKind::SizeofExpr(e) => {
                self.check_expr(e);
                Ty::Scalar(ScalarKind::ULong)
            }
        }
    }

    fn resolve_ident(&mut self, id: ExprId, name: &str) -> Ty {
        let span = self.unit.exprs.get(id).span;
        let constant = self
            .unit
            .defines
            .iter()
            .rev()
            .find(|d| d.name.node == name)
            .map(|d| d.value);
        let (binding, ty) = match (self.lookup(name), constant) {
            (Some(var), _) => (Binding::Var(var), self.unit.var(var).ty.clone()),
            (None, Some(value)) => (Binding::Constant(value), Ty::int()),
            (None, None) => {
                self.error(format!("use of undeclared identifier '{}'", name), span);
                (Binding::Unresolved, Ty::Unknown)
            }
        };
        if let ExprKind::Ident { binding: slot, .. } = &mut self.unit.exprs.get_mut(id).kind {
            *slot = binding;
        }
        ty
    }

    fn member_type(&mut self, base: &Ty, field: &str, span: crate::span::Span) -> Ty {
        match base {
            Ty::Record { id, .. } => match self.unit.field(*id, field) {
                Some(decl) => decl.ty.clone(),
                None => {
                    let record = self.unit.type_name(base);
                    self.error(format!("no member named '{}' in '{}'", field, record), span);
                    Ty::Unknown
                }
            },
            Ty::Vector(kind, width) => match swizzle_len(field, *width) {
                Some(1) => Ty::Scalar(*kind),
                Some(n) => Ty::Vector(*kind, n),
                None => {
                    self.error(
                        format!("invalid vector component '{}' for '{}{}'", field, kind.name(), width),
                        span,
                    );
                    Ty::Unknown
                }
            },
            Ty::Unknown => Ty::Unknown,
            other => {
                let name = self.unit.type_name(other);
                self.error(
                    format!("member reference base type '{}' is not a structure or union", name),
                    span,
                );
                Ty::Unknown
            }
        }
    }
}

/// Type of an integer literal: `int` if it fits, then `long`; `u` suffixes
/// pick the unsigned counterparts.
fn integer_literal_type(value: u64, unsigned: bool) -> Ty {
    let fits_32 = if unsigned {
        value <= u64::from(u32::MAX)
    } else {
        value <= i32::MAX as u64
    };
    let kind = match (unsigned, fits_32) {
        (false, true) => ScalarKind::Int,
        (false, false) => ScalarKind::Long,
        (true, true) => ScalarKind::UInt,
        (true, false) => ScalarKind::ULong,
    };
    Ty::Scalar(kind)
}

fn binary_type(op: BinOp, lhs: &Ty, rhs: &Ty) -> Ty {
    if op.is_comparison() {
        return match (lhs, rhs) {
            (Ty::Vector(_, n), _) | (_, Ty::Vector(_, n)) => Ty::Vector(ScalarKind::Int, *n),
            _ => Ty::int(),
        };
    }
    match (op, lhs, rhs) {
        (BinOp::Add | BinOp::Sub, Ty::Pointer { .. }, r) if r.is_integer() => lhs.clone(),
        (BinOp::Add, l, Ty::Pointer { .. }) if l.is_integer() => rhs.clone(),
        (BinOp::Add | BinOp::Sub, Ty::Array { .. }, r) if r.is_integer() => {
            lhs.decay(AddressSpace::Private)
        }
        (BinOp::Sub, Ty::Pointer { .. }, Ty::Pointer { .. }) => Ty::Scalar(ScalarKind::Long),
        (BinOp::Shl | BinOp::Shr, Ty::Scalar(kind), _) => Ty::Scalar(kind.promote()),
        _ => Ty::arithmetic_result(lhs, rhs),
    }
}

/// Number of components selected by a vector swizzle, if valid.
fn swizzle_len(field: &str, width: u8) -> Option<u8> {
    match field {
        "lo" | "hi" | "even" | "odd" => return Some((width / 2).max(1)),
        _ => {}
    }
    let component = |c: char| -> Option<u8> {
        match c {
            'x' => Some(0),
            'y' => Some(1),
            'z' => Some(2),
            'w' => Some(3),
            _ => None,
        }
    };
    let count = if let Some(digits) = field.strip_prefix(['s', 'S']) {
        for c in digits.chars() {
            if c.to_digit(16)? >= u32::from(width) {
                return None;
            }
        }
        digits.len()
    } else {
        for c in field.chars() {
            if component(c)? >= width {
                return None;
            }
        }
        field.len()
    };
    match count {
        1 | 2 | 3 | 4 | 8 | 16 => Some(count as u8),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_swizzles() {
        assert_eq!(swizzle_len("x", 4), Some(1));
        assert_eq!(swizzle_len("xy", 4), Some(2));
        assert_eq!(swizzle_len("w", 2), None);
        assert_eq!(swizzle_len("s0", 8), Some(1));
        assert_eq!(swizzle_len("s01", 8), Some(2));
        assert_eq!(swizzle_len("lo", 4), Some(2));
    }

    #[test]
    fn test_literal_types() {
        assert_eq!(integer_literal_type(1, false), Ty::int());
        assert_eq!(integer_literal_type(1, true), Ty::Scalar(ScalarKind::UInt));
        assert_eq!(
            integer_literal_type(1 << 40, false),
            Ty::Scalar(ScalarKind::Long)
        );
    }
}
