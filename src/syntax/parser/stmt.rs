use crate::ast::*;
use crate::lexeme::Lexeme;
use crate::span::Spanned;

use super::Parser;

impl Parser {
    pub(super) fn parse_block(&mut self) -> Block {
        self.expect(&Lexeme::LBrace);
        let mut stmts = Vec::new();
        while !self.at(&Lexeme::RBrace) && !self.at(&Lexeme::Eof) {
            if let Lexeme::Directive(text) = self.peek().clone() {
                let span = self.current_span();
                self.advance();
                self.handle_directive(&text, span);
                continue;
            }
            let before_pos = self.pos;
            let before_errors = self.diagnostics.len();
            stmts.push(self.parse_stmt());
            if self.diagnostics.len() > before_errors {
                self.recover_in_block();
            }
            if self.pos == before_pos {
                self.advance();
            }
        }
        self.expect(&Lexeme::RBrace);
        Block { stmts }
    }

    /// Skip past the next `;`, stopping before a `}` that closes the block.
    fn recover_in_block(&mut self) {
        while !self.at(&Lexeme::Eof) && !self.at(&Lexeme::RBrace) {
            if self.eat(&Lexeme::Semicolon) {
                return;
            }
            self.advance();
        }
    }

    fn parse_stmt(&mut self) -> Spanned<Stmt> {
        let start = self.current_span();
        if !self.enter_nesting() {
            self.advance();
            return Spanned::new(Stmt::Empty, start);
        }
        let stmt = self.parse_stmt_inner();
        self.exit_nesting();
        Spanned::new(stmt, start.merge(self.prev_span()))
    }

    fn parse_stmt_inner(&mut self) -> Stmt {
        match self.peek() {
            Lexeme::LBrace => Stmt::Block(self.parse_block()),
            Lexeme::Semicolon => {
                self.advance();
                Stmt::Empty
            }
            Lexeme::If => {
                self.advance();
                let cond = self.parse_paren_cond();
                let then = Box::new(self.parse_stmt());
                let otherwise = if self.eat(&Lexeme::Else) {
                    Some(Box::new(self.parse_stmt()))
                } else {
                    None
                };
                Stmt::If {
                    cond,
                    then,
                    otherwise,
                }
            }
            Lexeme::While => {
                self.advance();
                let cond = self.parse_paren_cond();
                let body = Box::new(self.parse_stmt());
                Stmt::While { cond, body }
            }
            Lexeme::Do => {
                self.advance();
                let body = Box::new(self.parse_stmt());
                self.expect(&Lexeme::While);
                let cond = self.parse_paren_cond();
                self.expect(&Lexeme::Semicolon);
                Stmt::DoWhile { body, cond }
            }
            Lexeme::For => self.parse_for_stmt(),
            Lexeme::Switch => {
                self.advance();
                let cond = self.parse_paren_cond();
                let body = Box::new(self.parse_stmt());
                Stmt::Switch { cond, body }
            }
            Lexeme::Case => {
                self.advance();
                let value = self.parse_conditional();
                self.expect(&Lexeme::Colon);
                Stmt::Case(value)
            }
            Lexeme::Default => {
                self.advance();
                self.expect(&Lexeme::Colon);
                Stmt::Default
            }
            Lexeme::Return => {
                self.advance();
                let value = if self.at(&Lexeme::Semicolon) {
                    None
                } else {
                    Some(self.parse_expr())
                };
                self.expect(&Lexeme::Semicolon);
                Stmt::Return(value)
            }
            Lexeme::Break => {
                self.advance();
                self.expect(&Lexeme::Semicolon);
                Stmt::Break
            }
            Lexeme::Continue => {
                self.advance();
                self.expect(&Lexeme::Semicolon);
                Stmt::Continue
            }
            _ if self.is_decl_start() => self.parse_local_decl(),
            _ => {
                let expr = self.parse_expr();
                self.expect(&Lexeme::Semicolon);
                Stmt::Expr(expr)
            }
        }
    }

    fn parse_for_stmt(&mut self) -> Stmt {
        self.advance(); // consume 'for'
        self.expect(&Lexeme::LParen);
        let init_start = self.current_span();
        let init = if self.eat(&Lexeme::Semicolon) {
            None
        } else if self.is_decl_start() {
            let decl = self.parse_local_decl();
            Some(Box::new(Spanned::new(decl, init_start.merge(self.prev_span()))))
        } else {
            let expr = self.parse_expr();
            self.expect(&Lexeme::Semicolon);
            Some(Box::new(Spanned::new(
                Stmt::Expr(expr),
                init_start.merge(self.prev_span()),
            )))
        };
        let cond = if self.at(&Lexeme::Semicolon) {
            None
        } else {
            Some(self.parse_expr())
        };
        self.expect(&Lexeme::Semicolon);
        let step = if self.at(&Lexeme::RParen) {
            None
        } else {
            Some(self.parse_expr())
        };
        self.expect(&Lexeme::RParen);
        let body = Box::new(self.parse_stmt());
        Stmt::For {
            init,
            cond,
            step,
            body,
        }
    }

    fn parse_local_decl(&mut self) -> Stmt {
        let Some(specs) = self.parse_decl_specifiers() else {
            return Stmt::Empty;
        };
        if self.eat(&Lexeme::Semicolon) {
            // a struct declaration inside a function
            return Stmt::Empty;
        }
        let first = self.parse_declarator(&specs);
        if first.params.is_some() {
            self.error_at(
                "function declarations are not allowed inside functions",
                specs.start,
            );
            return Stmt::Empty;
        }
        if specs.is_typedef {
            return Stmt::Typedef(self.parse_typedef_rest(&specs, first));
        }
        Stmt::Decl(self.parse_var_list(&specs, first, VarKind::Local))
    }

    fn parse_paren_cond(&mut self) -> ExprId {
        self.expect(&Lexeme::LParen);
        let cond = self.parse_expr();
        self.expect(&Lexeme::RParen);
        cond
    }
}
