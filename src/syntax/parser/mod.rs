mod expr;
mod items;
mod stmt;
#[cfg(test)]
mod tests;

use std::collections::HashMap;

use crate::ast::*;
use crate::diagnostic::Diagnostic;
use crate::lexeme::Lexeme;
use crate::span::{Span, Spanned};
use crate::types::{RecordKind, Ty};

const MAX_NESTING_DEPTH: u32 = 256;

pub(crate) struct Parser {
    tokens: Vec<Spanned<Lexeme>>,
    pos: usize,
    diagnostics: Vec<Diagnostic>,
    depth: u32,
    unit: TranslationUnit,
    /// Typedef names in scope, already resolved to their types.
    typedefs: HashMap<String, Ty>,
    /// Record tags: `struct S` and `union S` live in separate slots.
    tags: HashMap<(RecordKind, String), usize>,
}

impl Parser {
    pub(crate) fn new(tokens: Vec<Spanned<Lexeme>>) -> Self {
        Self {
            tokens,
            pos: 0,
            diagnostics: Vec::new(),
            depth: 0,
            unit: TranslationUnit::default(),
            typedefs: HashMap::new(),
            tags: HashMap::new(),
        }
    }

    fn enter_nesting(&mut self) -> bool {
        self.depth += 1;
        if self.depth > MAX_NESTING_DEPTH {
            self.error_with_help(
                "nesting depth exceeded (maximum 256 levels)",
                "simplify the kernel by extracting deeply nested code into functions",
            );
            return false;
        }
        true
    }

    fn exit_nesting(&mut self) {
        self.depth -= 1;
    }

    pub(crate) fn parse_unit(mut self) -> Result<TranslationUnit, Vec<Diagnostic>> {
        while !self.at(&Lexeme::Eof) {
            let before_pos = self.pos;
            let before_errors = self.diagnostics.len();
            let items = self.parse_external_declaration();
            self.unit.items.extend(items);
            if self.diagnostics.len() > before_errors {
                self.synchronize();
            }
            if self.pos == before_pos {
                self.advance();
            }
        }

        if !self.diagnostics.is_empty() {
            return Err(self.diagnostics);
        }
        Ok(self.unit)
    }

    /// Skip to just after the next `;` or `}`, whichever comes first.
    fn synchronize(&mut self) {
        while !self.at(&Lexeme::Eof) {
            if self.eat(&Lexeme::Semicolon) || self.eat(&Lexeme::RBrace) {
                return;
            }
            self.advance();
        }
    }

    /// Record a preprocessor line. `#define NAME <integer>` becomes a constant.
    fn handle_directive(&mut self, text: &str, span: Span) -> Item {
        let parts: Vec<&str> = text.split_whitespace().collect();
        if let ["define", name, value] = parts.as_slice() {
            if name.chars().all(|c| c.is_ascii_alphanumeric() || c == '_') {
                if let Some(value) = parse_define_value(value) {
                    let name_start = span.start + text.find(name).unwrap_or(0) as u32 + 1;
                    self.unit.defines.push(Define {
                        name: Spanned::new(
                            name.to_string(),
                            Span::new(name_start, name_start + name.len() as u32),
                        ),
                        value,
                    });
                }
            }
        }
        let directive = Spanned::new(text.to_string(), span);
        self.unit.directives.push(directive.clone());
        Item::Directive(directive)
    }

    fn define_value(&self, name: &str) -> Option<u64> {
        self.unit
            .defines
            .iter()
            .rev()
            .find(|d| d.name.node == name)
            .map(|d| d.value)
    }

    fn is_type_name(&self, name: &str) -> bool {
        Ty::from_builtin_name(name).is_some() || self.typedefs.contains_key(name)
    }

    fn new_var(&mut self, decl: VarDecl) -> VarId {
        let id = VarId(self.unit.vars.len() as u32);
        self.unit.vars.push(decl);
        id
    }

    // --- Utility methods ---

    fn peek(&self) -> &Lexeme {
        &self.tokens[self.pos].node
    }

    fn peek_at(&self, ahead: usize) -> &Lexeme {
        let last = self.tokens.len() - 1;
        &self.tokens[(self.pos + ahead).min(last)].node
    }

    fn current_span(&self) -> Span {
        self.tokens[self.pos].span
    }

    fn prev_span(&self) -> Span {
        if self.pos > 0 {
            self.tokens[self.pos - 1].span
        } else {
            self.current_span()
        }
    }

    fn advance(&mut self) -> &Spanned<Lexeme> {
        let tok = &self.tokens[self.pos];
        if self.pos < self.tokens.len() - 1 {
            self.pos += 1;
        }
        tok
    }

    fn at(&self, token: &Lexeme) -> bool {
        std::mem::discriminant(self.peek()) == std::mem::discriminant(token)
    }

    fn eat(&mut self, token: &Lexeme) -> bool {
        if self.at(token) {
            self.advance();
            true
        } else {
            false
        }
    }

    fn expect(&mut self, token: &Lexeme) -> Span {
        if self.at(token) {
            let span = self.current_span();
            self.advance();
            span
        } else {
            self.error_at_current(&format!(
                "expected {}, found {}",
                token.description(),
                self.peek().description()
            ));
            self.current_span()
        }
    }

    fn expect_ident(&mut self) -> Spanned<String> {
        if let Lexeme::Ident(name) = self.peek().clone() {
            let span = self.current_span();
            self.advance();
            Spanned::new(name, span)
        } else {
            self.error_at_current(&format!(
                "expected identifier, found {}",
                self.peek().description()
            ));
            Spanned::new("_error_".to_string(), self.current_span())
        }
    }

    fn error_at_current(&mut self, msg: &str) {
        self.diagnostics
            .push(Diagnostic::error(msg.to_string(), self.current_span()));
    }

    fn error_at(&mut self, msg: &str, span: Span) {
        self.diagnostics
            .push(Diagnostic::error(msg.to_string(), span));
    }

    fn error_with_help(&mut self, msg: &str, help: &str) {
        self.diagnostics.push(
            Diagnostic::error(msg.to_string(), self.current_span()).with_help(help.to_string()),
        );
    }
}

/// Integer value of a `#define` body: decimal or hex, optional suffix and parentheses.
pub(crate) fn parse_define_value(text: &str) -> Option<u64> {
    let text = text.trim_start_matches('(').trim_end_matches(')');
    let digits = text.trim_end_matches(['u', 'U', 'l', 'L']);
    if let Some(hex) = digits
        .strip_prefix("0x")
        .or_else(|| digits.strip_prefix("0X"))
    {
        u64::from_str_radix(hex, 16).ok()
    } else {
        digits.parse::<u64>().ok()
    }
}
