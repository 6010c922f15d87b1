use crate::diagnostic::Diagnostic;
use crate::lexeme::Lexeme;
use crate::span::{Span, Spanned};

pub(crate) struct Lexer<'src> {
    source: &'src [u8],
    pos: usize,
    diagnostics: Vec<Diagnostic>,
    /// Whether we've seen a token on the current line (a `#` only starts a
    /// directive at the beginning of a line).
    token_on_line: bool,
}

impl<'src> Lexer<'src> {
    pub(crate) fn new(source: &'src str) -> Self {
        Self {
            source: source.as_bytes(),
            pos: 0,
            diagnostics: Vec::new(),
            token_on_line: false,
        }
    }

    pub(crate) fn tokenize(mut self) -> (Vec<Spanned<Lexeme>>, Vec<Diagnostic>) {
        let mut tokens = Vec::new();
        loop {
            let tok = self.next_token();
            let is_eof = tok.node == Lexeme::Eof;
            tokens.push(tok);
            if is_eof {
                break;
            }
        }
        (tokens, self.diagnostics)
    }

    fn next_token(&mut self) -> Spanned<Lexeme> {
        loop {
            self.skip_whitespace_and_comments();

            if self.pos >= self.source.len() {
                return self.make_token(Lexeme::Eof, self.pos, self.pos);
            }

            let start = self.pos;
            let ch = self.source[self.pos];

            if ch == b'#' && !self.token_on_line {
                return self.scan_directive();
            }

            self.token_on_line = true;

            if is_ident_start(ch) {
                return self.scan_ident_or_keyword();
            }

            if ch.is_ascii_digit()
                || (ch == b'.' && self.peek_at(1).is_some_and(|c| c.is_ascii_digit()))
            {
                return self.scan_number();
            }

            if ch == b'\'' {
                return self.scan_char();
            }

            if ch == b'"' {
                return self.scan_string();
            }

            if let Some(tok) = self.scan_symbol(start) {
                return tok;
            }
            // scan_symbol returned None → error was recorded, try again
        }
    }

    fn skip_whitespace_and_comments(&mut self) {
        loop {
            while self.pos < self.source.len() && self.source[self.pos].is_ascii_whitespace() {
                if self.source[self.pos] == b'\n' {
                    self.token_on_line = false;
                }
                self.pos += 1;
            }

            if self.peek_at(0) == Some(b'/') && self.peek_at(1) == Some(b'/') {
                while self.pos < self.source.len() && self.source[self.pos] != b'\n' {
                    self.pos += 1;
                }
                continue;
            }

            if self.peek_at(0) == Some(b'/') && self.peek_at(1) == Some(b'*') {
                let start = self.pos;
                self.pos += 2;
                loop {
                    if self.pos + 1 >= self.source.len() {
                        self.pos = self.source.len();
                        self.diagnostics.push(Diagnostic::error(
                            "unterminated /* comment".to_string(),
                            Span::new(start as u32, self.pos as u32),
                        ));
                        break;
                    }
                    if self.source[self.pos] == b'*' && self.source[self.pos + 1] == b'/' {
                        self.pos += 2;
                        break;
                    }
                    self.pos += 1;
                }
                continue;
            }

            break;
        }
    }

    /// A directive runs to the end of the line; backslash-newline continues it.
    fn scan_directive(&mut self) -> Spanned<Lexeme> {
        let start = self.pos;
        self.pos += 1; // skip '#'
        while self.pos < self.source.len() && self.source[self.pos] != b'\n' {
            if self.source[self.pos] == b'\\' && self.peek_at(1) == Some(b'\n') {
                self.pos += 2;
                continue;
            }
            self.pos += 1;
        }
        let text = self.text(start + 1, self.pos).trim().to_string();
        self.make_token(Lexeme::Directive(text), start, self.pos)
    }

    fn scan_ident_or_keyword(&mut self) -> Spanned<Lexeme> {
        let start = self.pos;
        while self.pos < self.source.len() && is_ident_continue(self.source[self.pos]) {
            self.pos += 1;
        }
        let text = self.text(start, self.pos);
        let token = Lexeme::from_keyword(text).unwrap_or_else(|| Lexeme::Ident(text.to_string()));
        self.make_token(token, start, self.pos)
    }

    fn scan_number(&mut self) -> Spanned<Lexeme> {
        let start = self.pos;
        let is_hex = self.peek_at(0) == Some(b'0') && matches!(self.peek_at(1), Some(b'x' | b'X'));
        if is_hex {
            self.pos += 2;
            while self.pos < self.source.len() && self.source[self.pos].is_ascii_hexdigit() {
                self.pos += 1;
            }
        } else {
            while self.pos < self.source.len() && self.source[self.pos].is_ascii_digit() {
                self.pos += 1;
            }
        }

        let mut is_float = false;
        if !is_hex && self.peek_at(0) == Some(b'.') {
            is_float = true;
            self.pos += 1;
            while self.pos < self.source.len() && self.source[self.pos].is_ascii_digit() {
                self.pos += 1;
            }
        }
        if !is_hex && matches!(self.peek_at(0), Some(b'e' | b'E')) {
            let sign = usize::from(matches!(self.peek_at(1), Some(b'+' | b'-')));
            if self.peek_at(1 + sign).is_some_and(|c| c.is_ascii_digit()) {
                is_float = true;
                self.pos += 1 + sign;
                while self.pos < self.source.len() && self.source[self.pos].is_ascii_digit() {
                    self.pos += 1;
                }
            }
        }

        if is_float {
            if matches!(self.peek_at(0), Some(b'f' | b'F' | b'h' | b'H')) {
                self.pos += 1;
            }
            let text = self.text(start, self.pos).to_string();
            return self.make_token(Lexeme::Float(text), start, self.pos);
        }

        let digits_end = self.pos;
        let mut unsigned = false;
        while let Some(c) = self.peek_at(0) {
            match c {
                b'u' | b'U' => unsigned = true,
                b'l' | b'L' => {}
                _ => break,
            }
            self.pos += 1;
        }

        let digits = self.text(start, digits_end);
        let parsed = if is_hex {
            u64::from_str_radix(&digits[2..], 16)
        } else if digits.len() > 1 && digits.starts_with('0') {
            u64::from_str_radix(&digits[1..], 8)
        } else {
            digits.parse::<u64>()
        };
        match parsed {
            Ok(value) => self.make_token(Lexeme::Integer { value, unsigned }, start, self.pos),
            Err(_) => {
                self.diagnostics.push(
                    Diagnostic::error(
                        format!("invalid integer literal '{}'", digits),
                        Span::new(start as u32, self.pos as u32),
                    )
                    .with_help(format!("maximum integer value is {}", u64::MAX)),
                );
                self.make_token(Lexeme::Integer { value: 0, unsigned }, start, self.pos)
            }
        }
    }

    fn scan_char(&mut self) -> Spanned<Lexeme> {
        let start = self.pos;
        self.pos += 1; // skip opening quote
        let value = match self.peek_at(0) {
            Some(b'\\') => {
                self.pos += 1;
                self.scan_escape()
            }
            Some(c) if c != b'\'' && c != b'\n' => {
                self.pos += 1;
                u64::from(c)
            }
            _ => 0,
        };
        if self.peek_at(0) == Some(b'\'') {
            self.pos += 1;
        } else {
            self.diagnostics.push(Diagnostic::error(
                "unterminated character literal".to_string(),
                Span::new(start as u32, self.pos as u32),
            ));
        }
        self.make_token(Lexeme::Char(value), start, self.pos)
    }

    /// The escape after a backslash: `\x` with hex digits, up to three
    /// octal digits, or a single character.
    fn scan_escape(&mut self) -> u64 {
        match self.peek_at(0) {
            Some(b'x') => {
                self.pos += 1;
                let mut value: u64 = 0;
                while let Some(digit) = self.peek_at(0).and_then(|c| (c as char).to_digit(16)) {
                    value = value.wrapping_mul(16).wrapping_add(u64::from(digit));
                    self.pos += 1;
                }
                value & 0xff
            }
            Some(b'0'..=b'7') => {
                let mut value = 0;
                for _ in 0..3 {
                    match self.peek_at(0) {
                        Some(c @ b'0'..=b'7') => {
                            value = value * 8 + u64::from(c - b'0');
                            self.pos += 1;
                        }
                        _ => break,
                    }
                }
                value & 0xff
            }
            Some(c) => {
                self.pos += 1;
                escape_value(c)
            }
            None => 0,
        }
    }

    fn scan_string(&mut self) -> Spanned<Lexeme> {
        let start = self.pos;
        self.pos += 1; // skip opening quote
        while self.pos < self.source.len() {
            match self.source[self.pos] {
                b'"' => break,
                b'\n' => break,
                b'\\' => self.pos += 2,
                _ => self.pos += 1,
            }
        }
        let end = self.pos.min(self.source.len());
        let text = self.text(start + 1, end).to_string();
        if self.peek_at(0) == Some(b'"') {
            self.pos += 1;
        } else {
            self.pos = end;
            self.diagnostics.push(Diagnostic::error(
                "unterminated string literal".to_string(),
                Span::new(start as u32, end as u32),
            ));
        }
        self.make_token(Lexeme::Str(text), start, self.pos)
    }

    fn scan_symbol(&mut self, start: usize) -> Option<Spanned<Lexeme>> {
        let ch = self.source[self.pos];
        self.pos += 1;
        let next = self.peek_at(0);

        let token = match ch {
            b'(' => Lexeme::LParen,
            b')' => Lexeme::RParen,
            b'{' => Lexeme::LBrace,
            b'}' => Lexeme::RBrace,
            b'[' => Lexeme::LBracket,
            b']' => Lexeme::RBracket,
            b',' => Lexeme::Comma,
            b';' => Lexeme::Semicolon,
            b':' => Lexeme::Colon,
            b'?' => Lexeme::Question,
            b'.' => Lexeme::Dot,
            b'~' => Lexeme::Tilde,
            b'+' => match next {
                Some(b'+') => self.two(Lexeme::PlusPlus),
                Some(b'=') => self.two(Lexeme::PlusEq),
                _ => Lexeme::Plus,
            },
            b'-' => match next {
                Some(b'-') => self.two(Lexeme::MinusMinus),
                Some(b'=') => self.two(Lexeme::MinusEq),
                Some(b'>') => self.two(Lexeme::Arrow),
                _ => Lexeme::Minus,
            },
            b'*' => self.with_eq(Lexeme::Star, Lexeme::StarEq),
            b'/' => self.with_eq(Lexeme::Slash, Lexeme::SlashEq),
            b'%' => self.with_eq(Lexeme::Percent, Lexeme::PercentEq),
            b'^' => self.with_eq(Lexeme::Caret, Lexeme::CaretEq),
            b'!' => self.with_eq(Lexeme::Bang, Lexeme::BangEq),
            b'=' => self.with_eq(Lexeme::Eq, Lexeme::EqEq),
            b'&' => match next {
                Some(b'&') => self.two(Lexeme::AmpAmp),
                Some(b'=') => self.two(Lexeme::AmpEq),
                _ => Lexeme::Amp,
            },
            b'|' => match next {
                Some(b'|') => self.two(Lexeme::PipePipe),
                Some(b'=') => self.two(Lexeme::PipeEq),
                _ => Lexeme::Pipe,
            },
            b'<' => match next {
                Some(b'<') => {
                    self.pos += 1;
                    self.with_eq(Lexeme::Shl, Lexeme::ShlEq)
                }
                Some(b'=') => self.two(Lexeme::LtEq),
                _ => Lexeme::Lt,
            },
            b'>' => match next {
                Some(b'>') => {
                    self.pos += 1;
                    self.with_eq(Lexeme::Shr, Lexeme::ShrEq)
                }
                Some(b'=') => self.two(Lexeme::GtEq),
                _ => Lexeme::Gt,
            },
            _ => {
                self.diagnostics.push(
                    Diagnostic::error(
                        format!("unexpected character '{}' (U+{:04X})", ch as char, ch),
                        Span::new(start as u32, self.pos as u32),
                    )
                    .with_help("this character is not part of OpenCL C syntax".to_string()),
                );
                return None;
            }
        };

        Some(self.make_token(token, start, self.pos))
    }

    /// Consume the second character of a two-character operator.
    fn two(&mut self, token: Lexeme) -> Lexeme {
        self.pos += 1;
        token
    }

    /// `op` or `op=`.
    fn with_eq(&mut self, plain: Lexeme, assign: Lexeme) -> Lexeme {
        if self.peek_at(0) == Some(b'=') {
            self.pos += 1;
            assign
        } else {
            plain
        }
    }

    fn peek_at(&self, ahead: usize) -> Option<u8> {
        self.source.get(self.pos + ahead).copied()
    }

    fn text(&self, start: usize, end: usize) -> &'src str {
        // Token boundaries always fall on ASCII bytes.
        std::str::from_utf8(&self.source[start..end]).unwrap_or("")
    }

    fn make_token(&self, token: Lexeme, start: usize, end: usize) -> Spanned<Lexeme> {
        Spanned::new(token, Span::new(start as u32, end as u32))
    }
}

fn escape_value(c: u8) -> u64 {
    match c {
        b'n' => 10,
        b't' => 9,
        b'r' => 13,
        b'a' => 7,
        b'b' => 8,
        b'f' => 12,
        b'v' => 11,
        other => u64::from(other),
    }
}

fn is_ident_start(ch: u8) -> bool {
    ch.is_ascii_alphabetic() || ch == b'_'
}

fn is_ident_continue(ch: u8) -> bool {
    ch.is_ascii_alphanumeric() || ch == b'_'
}
