use crate::ast::*;
use crate::lexeme::Lexeme;
use crate::span::{Span, Spanned};

use super::Parser;

/// Lowest binary precedence (`||`).
const MIN_BINARY_PREC: u8 = 4;

impl Parser {
    /// Full expression, including the comma operator.
    pub(super) fn parse_expr(&mut self) -> ExprId {
        let mut lhs = self.parse_assign();
        while self.eat(&Lexeme::Comma) {
            let rhs = self.parse_assign();
            let span = self.span_of(lhs).merge(self.span_of(rhs));
            lhs = self
                .unit
                .exprs
                .alloc(ExprKind::Comma { lhs, rhs }, span);
        }
        lhs
    }

    pub(super) fn parse_assign(&mut self) -> ExprId {
        let lhs = self.parse_conditional();
        let op = match self.peek() {
            Lexeme::Eq => AssignOp::Assign,
            Lexeme::PlusEq => AssignOp::Compound(BinOp::Add),
            Lexeme::MinusEq => AssignOp::Compound(BinOp::Sub),
            Lexeme::StarEq => AssignOp::Compound(BinOp::Mul),
            Lexeme::SlashEq => AssignOp::Compound(BinOp::Div),
            Lexeme::PercentEq => AssignOp::Compound(BinOp::Rem),
            Lexeme::AmpEq => AssignOp::Compound(BinOp::BitAnd),
            Lexeme::PipeEq => AssignOp::Compound(BinOp::BitOr),
            Lexeme::CaretEq => AssignOp::Compound(BinOp::BitXor),
            Lexeme::ShlEq => AssignOp::Compound(BinOp::Shl),
            Lexeme::ShrEq => AssignOp::Compound(BinOp::Shr),
            _ => return lhs,
        };
        self.advance();
        let rhs = self.parse_assign();
        let span = self.span_of(lhs).merge(self.span_of(rhs));
        self.unit
            .exprs
            .alloc(ExprKind::Assign { op, lhs, rhs }, span)
    }

    pub(super) fn parse_conditional(&mut self) -> ExprId {
        let cond = self.parse_binary(MIN_BINARY_PREC);
        if !self.eat(&Lexeme::Question) {
            return cond;
        }
        let then = self.parse_expr();
        self.expect(&Lexeme::Colon);
        let otherwise = self.parse_conditional();
        let span = self.span_of(cond).merge(self.span_of(otherwise));
        self.unit.exprs.alloc(
            ExprKind::Conditional {
                cond,
                then,
                otherwise,
            },
            span,
        )
    }

    fn parse_binary(&mut self, min_prec: u8) -> ExprId {
        let mut lhs = self.parse_unary();
        loop {
            let Some(op) = binary_op(self.peek()) else {
                break;
            };
            if op.precedence() < min_prec {
                break;
            }
            self.advance(); // consume operator
            let rhs = self.parse_binary(op.precedence() + 1);
            let span = self.span_of(lhs).merge(self.span_of(rhs));
            lhs = self
                .unit
                .exprs
                .alloc(ExprKind::Binary { op, lhs, rhs }, span);
        }
        lhs
    }

    fn parse_unary(&mut self) -> ExprId {
        let start = self.current_span();
        if !self.enter_nesting() {
            return self.error_expr(start);
        }
        let expr = self.parse_unary_inner(start);
        self.exit_nesting();
        expr
    }

    fn parse_unary_inner(&mut self, start: Span) -> ExprId {
        let op = match self.peek() {
            Lexeme::Minus => Some(UnaryOp::Neg),
            Lexeme::Plus => Some(UnaryOp::Plus),
            Lexeme::Bang => Some(UnaryOp::Not),
            Lexeme::Tilde => Some(UnaryOp::BitNot),
            Lexeme::Star => Some(UnaryOp::Deref),
            Lexeme::Amp => Some(UnaryOp::AddrOf),
            Lexeme::PlusPlus => Some(UnaryOp::PreInc),
            Lexeme::MinusMinus => Some(UnaryOp::PreDec),
            _ => None,
        };
        if let Some(op) = op {
            self.advance();
            let operand = self.parse_unary();
            let span = start.merge(self.span_of(operand));
            return self
                .unit
                .exprs
                .alloc(ExprKind::Unary { op, operand }, span);
        }

        if self.at(&Lexeme::Sizeof) {
            self.advance();
            if self.at(&Lexeme::LParen) && self.is_type_name_ahead() {
                self.advance();
                let ty = self.parse_type_name();
                self.expect(&Lexeme::RParen);
                let span = start.merge(self.prev_span());
                return self.unit.exprs.alloc(ExprKind::SizeofType(ty), span);
            }
            let operand = self.parse_unary();
            let span = start.merge(self.span_of(operand));
            return self.unit.exprs.alloc(ExprKind::SizeofExpr(operand), span);
        }

        if self.at(&Lexeme::LParen) && self.is_type_name_ahead() {
            self.advance();
            let ty = self.parse_type_name();
            self.expect(&Lexeme::RParen);
            if self.at(&Lexeme::LBrace) {
                self.error_at_current("compound literals are not supported");
            }
            let expr = self.parse_unary();
            let span = start.merge(self.span_of(expr));
            let spelling = self.unit.type_name(&ty);
            return self
                .unit
                .exprs
                .alloc(ExprKind::Cast { ty, spelling, expr }, span);
        }

        let primary = self.parse_primary();
        self.parse_postfix(primary)
    }

    /// Postfix operations: `[index]`, `(args)`, `.field`, `->field`, `++`, `--`.
    fn parse_postfix(&mut self, mut expr: ExprId) -> ExprId {
        loop {
            let start = self.span_of(expr);
            match self.peek() {
                Lexeme::LBracket => {
                    self.advance();
                    let index = self.parse_expr();
                    self.expect(&Lexeme::RBracket);
                    let span = start.merge(self.prev_span());
                    expr = self
                        .unit
                        .exprs
                        .alloc(ExprKind::Index { base: expr, index }, span);
                }
                Lexeme::LParen => {
                    let callee = match &self.unit.exprs.get(expr).kind {
                        ExprKind::Ident { name, .. } => Spanned::new(name.clone(), start),
                        _ => {
                            self.error_at("called object is not a function name", start);
                            Spanned::new("_error_".to_string(), start)
                        }
                    };
                    self.advance();
                    let args = self.parse_call_args();
                    self.expect(&Lexeme::RParen);
                    let span = start.merge(self.prev_span());
                    expr = self
                        .unit
                        .exprs
                        .alloc(ExprKind::Call { callee, args }, span);
                }
                Lexeme::Dot | Lexeme::Arrow => {
                    let arrow = self.at(&Lexeme::Arrow);
                    self.advance();
                    let field = self.expect_ident();
                    let span = start.merge(field.span);
                    expr = self.unit.exprs.alloc(
                        ExprKind::Member {
                            base: expr,
                            field,
                            arrow,
                        },
                        span,
                    );
                }
                Lexeme::PlusPlus | Lexeme::MinusMinus => {
                    let op = if self.at(&Lexeme::PlusPlus) {
                        UnaryOp::PostInc
                    } else {
                        UnaryOp::PostDec
                    };
                    self.advance();
                    let span = start.merge(self.prev_span());
                    expr = self
                        .unit
                        .exprs
                        .alloc(ExprKind::Unary { op, operand: expr }, span);
                }
                _ => break,
            }
        }
        expr
    }

    fn parse_call_args(&mut self) -> Vec<ExprId> {
        let mut args = Vec::new();
        if self.at(&Lexeme::RParen) {
            return args;
        }
        loop {
            args.push(self.parse_assign());
            if !self.eat(&Lexeme::Comma) {
                break;
            }
        }
        args
    }

    fn parse_primary(&mut self) -> ExprId {
        let start = self.current_span();

        let kind = match self.peek().clone() {
            Lexeme::Integer { value, unsigned } => ExprKind::Int { value, unsigned },
            Lexeme::Float(text) => ExprKind::Float(text),
            Lexeme::Char(value) => ExprKind::Char(value),
            Lexeme::Str(text) => {
                self.advance();
                let mut text = text;
                // adjacent string literals concatenate
                while let Lexeme::Str(more) = self.peek().clone() {
                    text.push_str(&more);
                    self.advance();
                }
                let span = start.merge(self.prev_span());
                return self.unit.exprs.alloc(ExprKind::Str(text), span);
            }
            Lexeme::Ident(name) => ExprKind::Ident {
                name,
                binding: Binding::Unresolved,
            },
            Lexeme::LParen => {
                self.advance();
                let inner = self.parse_expr();
                self.expect(&Lexeme::RParen);
                let span = start.merge(self.prev_span());
                return self.unit.exprs.alloc(ExprKind::Paren(inner), span);
            }
            other => {
                self.error_at_current(&format!(
                    "expected expression, found {}",
                    other.description()
                ));
                return self.error_expr(start);
            }
        };
        self.advance();
        self.unit.exprs.alloc(kind, start)
    }

    /// Placeholder for an expression that failed to parse.
    fn error_expr(&mut self, span: Span) -> ExprId {
        self.unit.exprs.alloc(
            ExprKind::Int {
                value: 0,
                unsigned: false,
            },
            span,
        )
    }

    fn span_of(&self, id: ExprId) -> Span {
        self.unit.exprs.get(id).span
    }
}

fn binary_op(lexeme: &Lexeme) -> Option<BinOp> {
    let op = match lexeme {
        Lexeme::Star => BinOp::Mul,
        Lexeme::Slash => BinOp::Div,
        Lexeme::Percent => BinOp::Rem,
        Lexeme::Plus => BinOp::Add,
        Lexeme::Minus => BinOp::Sub,
        Lexeme::Shl => BinOp::Shl,
        Lexeme::Shr => BinOp::Shr,
        Lexeme::Lt => BinOp::Lt,
        Lexeme::Gt => BinOp::Gt,
        Lexeme::LtEq => BinOp::Le,
        Lexeme::GtEq => BinOp::Ge,
        Lexeme::EqEq => BinOp::Eq,
        Lexeme::BangEq => BinOp::Ne,
        Lexeme::Amp => BinOp::BitAnd,
        Lexeme::Caret => BinOp::BitXor,
        Lexeme::Pipe => BinOp::BitOr,
        Lexeme::AmpAmp => BinOp::And,
        Lexeme::PipePipe => BinOp::Or,
        _ => return None,
    };
    Some(op)
}
