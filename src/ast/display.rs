//! Printing of rewritten expressions.
//!
//! Parsed nodes are printed verbatim from the (already rewritten) source;
//! nodes built by a pass are printed structurally with the parentheses that
//! C precedence requires.

use super::{ExprArena, ExprId, ExprKind};
use crate::span::Span;

const PREC_PRIMARY: u8 = 16;
const PREC_UNARY: u8 = 15;
const PREC_CONDITIONAL: u8 = 3;
const PREC_ASSIGN: u8 = 2;
const PREC_COMMA: u8 = 1;

/// Print an expression. `verbatim` returns the current text of a source span.
pub fn print_expr(arena: &ExprArena, id: ExprId, verbatim: &dyn Fn(Span) -> String) -> String {
    let node = arena.get(id);
    if !node.synthesized {
        return verbatim(node.span);
    }
    match &node.kind {
        ExprKind::Int { value, unsigned } => {
            if *unsigned {
                format!("{}u", value)
            } else {
                value.to_string()
            }
        }
        ExprKind::Float(text) => text.clone(),
        ExprKind::Char(value) => value.to_string(),
        ExprKind::Str(text) => format!("\"{}\"", text),
        ExprKind::Ident { name, .. } => name.clone(),
        ExprKind::Paren(inner) => format!("({})", print_expr(arena, *inner, verbatim)),
        ExprKind::Unary { op, operand } => {
            if op.is_postfix() {
                format!(
                    "{}{}",
                    print_operand(arena, *operand, PREC_PRIMARY, verbatim),
                    op.symbol()
                )
            } else {
                let text = print_operand(arena, *operand, PREC_UNARY, verbatim);
                // keep `- -x` from turning into `--x`
                let sym = op.symbol();
                if text.starts_with(sym.chars().last().unwrap_or(' ')) && sym.len() == 1 {
                    format!("{} {}", sym, text)
                } else {
                    format!("{}{}", sym, text)
                }
            }
        }
        ExprKind::Binary { op, lhs, rhs } => {
            let prec = op.precedence();
            format!(
                "{} {} {}",
                print_operand(arena, *lhs, prec, verbatim),
                op.symbol(),
                print_operand(arena, *rhs, prec + 1, verbatim)
            )
        }
        ExprKind::Assign { op, lhs, rhs } => format!(
            "{} {} {}",
            print_operand(arena, *lhs, PREC_UNARY, verbatim),
            op.symbol(),
            print_operand(arena, *rhs, PREC_ASSIGN, verbatim)
        ),
        ExprKind::Conditional {
            cond,
            then,
            otherwise,
        } => format!(
            "{} ? {} : {}",
            print_operand(arena, *cond, PREC_CONDITIONAL + 1, verbatim),
            print_operand(arena, *then, PREC_COMMA, verbatim),
            print_operand(arena, *otherwise, PREC_CONDITIONAL, verbatim)
        ),
        ExprKind::Comma { lhs, rhs } => format!(
            "{}, {}",
            print_operand(arena, *lhs, PREC_COMMA, verbatim),
            print_operand(arena, *rhs, PREC_ASSIGN, verbatim)
        ),
        ExprKind::Call { callee, args } => {
            let args: Vec<String> = args
                .iter()
                .map(|a| print_operand(arena, *a, PREC_ASSIGN, verbatim))
                .collect();
            format!("{}({})", callee.node, args.join(", "))
        }
        ExprKind::Index { base, index } => format!(
            "{}[{}]",
            print_operand(arena, *base, PREC_PRIMARY, verbatim),
            print_expr(arena, *index, verbatim)
        ),
        ExprKind::Member { base, field, arrow } => format!(
            "{}{}{}",
            print_operand(arena, *base, PREC_PRIMARY, verbatim),
            if *arrow { "->" } else { "." },
            field.node
        ),
        // the operand is always parenthesized: `(ulong)(i)`
        ExprKind::Cast { spelling, expr, .. } => {
            format!("({})({})", spelling, print_expr(arena, *expr, verbatim))
        }
        ExprKind::SizeofType(ty) => format!("sizeof({})", ty.canonical_name(&[])),
        ExprKind::SizeofExpr(e) => format!("sizeof({})", print_expr(arena, *e, verbatim)),
    }
}

fn print_operand(
    arena: &ExprArena,
    id: ExprId,
    min_prec: u8,
    verbatim: &dyn Fn(Span) -> String,
) -> String {
    let text = print_expr(arena, id, verbatim);
    if precedence(&arena.get(id).kind) < min_prec {
        format!("({})", text)
    } else {
        text
    }
}

/// C precedence of the operator at the root of an expression.
pub fn precedence(kind: &ExprKind) -> u8 {
    match kind {
        ExprKind::Int { .. }
        | ExprKind::Float(_)
        | ExprKind::Char(_)
        | ExprKind::Str(_)
        | ExprKind::Ident { .. }
        | ExprKind::Paren(_)
        | ExprKind::Call { .. }
        | ExprKind::Index { .. }
        | ExprKind::Member { .. } => PREC_PRIMARY,
        ExprKind::Unary { op, .. } if op.is_postfix() => PREC_PRIMARY,
        ExprKind::Unary { .. }
        | ExprKind::Cast { .. }
        | ExprKind::SizeofType(_)
        | ExprKind::SizeofExpr(_) => PREC_UNARY,
        ExprKind::Binary { op, .. } => op.precedence(),
        ExprKind::Conditional { .. } => PREC_CONDITIONAL,
        ExprKind::Assign { .. } => PREC_ASSIGN,
        ExprKind::Comma { .. } => PREC_COMMA,
    }
}
