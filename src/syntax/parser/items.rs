use crate::ast::*;
use crate::lexeme::Lexeme;
use crate::span::{Span, Spanned};
use crate::types::{AddressSpace, RecordKind, ScalarKind, Ty};

use super::Parser;

/// Declaration specifiers: everything before the declarator.
pub(super) struct DeclSpecs {
    pub(super) ty: Ty,
    pub(super) space: Option<AddressSpace>,
    pub(super) access: Option<AccessQualifier>,
    pub(super) is_kernel: bool,
    pub(super) is_typedef: bool,
    /// A record defined without a tag in these specifiers.
    pub(super) anonymous_record: Option<usize>,
    pub(super) start: Span,
}

pub(super) struct Declarator {
    pub(super) name: Option<Spanned<String>>,
    pub(super) ty: Ty,
    /// Present when the declarator declares a function.
    pub(super) params: Option<Vec<ParamDecl>>,
}

impl Parser {
    pub(super) fn parse_external_declaration(&mut self) -> Vec<Item> {
        if let Lexeme::Directive(text) = self.peek().clone() {
            let span = self.current_span();
            self.advance();
            return vec![self.handle_directive(&text, span)];
        }
        if self.eat(&Lexeme::Semicolon) {
            return Vec::new();
        }

        let Some(specs) = self.parse_decl_specifiers() else {
            return Vec::new();
        };
        if self.eat(&Lexeme::Semicolon) {
            return match specs.ty {
                Ty::Record { id, .. } => vec![Item::Record(id)],
                _ => Vec::new(),
            };
        }

        let first = self.parse_declarator(&specs);
        if let Some(params) = first.params {
            let function = self.parse_function_rest(&specs, first.name, first.ty, params);
            return vec![Item::Function(function)];
        }

        if specs.is_typedef {
            return self
                .parse_typedef_rest(&specs, first)
                .into_iter()
                .map(Item::Typedef)
                .collect();
        }

        let vars = self.parse_var_list(&specs, first, VarKind::Global);
        vec![Item::Variables(vars)]
    }

    fn parse_function_rest(
        &mut self,
        specs: &DeclSpecs,
        name: Option<Spanned<String>>,
        return_ty: Ty,
        params: Vec<ParamDecl>,
    ) -> FunctionDecl {
        let name = name.unwrap_or_else(|| Spanned::new("_error_".to_string(), specs.start));
        self.skip_attributes();
        let body = if self.at(&Lexeme::LBrace) {
            Some(self.parse_block())
        } else {
            self.expect(&Lexeme::Semicolon);
            None
        };
        FunctionDecl {
            name,
            is_kernel: specs.is_kernel,
            return_ty,
            params,
            body,
            span: specs.start.merge(self.prev_span()),
        }
    }

    /// Register every name of a `typedef` declaration. Returns the declarations.
    pub(super) fn parse_typedef_rest(
        &mut self,
        specs: &DeclSpecs,
        first: Declarator,
    ) -> Vec<TypedefDecl> {
        let mut decls = Vec::new();
        let mut declarator = first;
        loop {
            if let Some(name) = declarator.name {
                if let Some(id) = specs.anonymous_record {
                    if self.unit.records[id].typedef_name.is_none() {
                        self.unit.records[id].typedef_name = Some(name.node.clone());
                    }
                }
                self.typedefs.insert(name.node.clone(), declarator.ty.clone());
                decls.push(TypedefDecl {
                    name,
                    ty: declarator.ty,
                });
            } else {
                self.error_at_current("expected a typedef name");
            }
            if !self.eat(&Lexeme::Comma) {
                break;
            }
            declarator = self.parse_declarator(specs);
        }
        self.expect(&Lexeme::Semicolon);
        decls
    }

    /// Variables declared together: `int a = 1, b[4];`.
    pub(super) fn parse_var_list(
        &mut self,
        specs: &DeclSpecs,
        first: Declarator,
        kind: VarKind,
    ) -> Vec<VarId> {
        let mut vars = Vec::new();
        let mut declarator = first;
        loop {
            let decl_start = declarator
                .name
                .as_ref()
                .map(|n| n.span)
                .unwrap_or_else(|| self.current_span());
            let name = match declarator.name {
                Some(name) => name,
                None => {
                    self.error_at_current("expected a variable name");
                    Spanned::new("_error_".to_string(), decl_start)
                }
            };
            let init = if self.eat(&Lexeme::Eq) {
                Some(self.parse_initializer())
            } else {
                None
            };
            let span = specs.start.merge(self.prev_span());
            vars.push(self.new_var(VarDecl {
                name,
                ty: declarator.ty,
                kind,
                init,
                span,
            }));
            if !self.eat(&Lexeme::Comma) {
                break;
            }
            declarator = self.parse_declarator(specs);
        }
        self.expect(&Lexeme::Semicolon);
        vars
    }

    fn parse_initializer(&mut self) -> Init {
        if !self.at(&Lexeme::LBrace) {
            return Init::Expr(self.parse_assign());
        }
        let start = self.current_span();
        self.advance();
        let mut elems = Vec::new();
        while !self.at(&Lexeme::RBrace) && !self.at(&Lexeme::Eof) {
            elems.push(self.parse_initializer());
            if !self.eat(&Lexeme::Comma) {
                break;
            }
        }
        self.expect(&Lexeme::RBrace);
        Init::List(elems, start.merge(self.prev_span()))
    }

    /// Whether the current token can start a declaration.
    pub(super) fn is_decl_start(&self) -> bool {
        match self.peek() {
            Lexeme::Kernel
            | Lexeme::Global
            | Lexeme::Constant
            | Lexeme::Local
            | Lexeme::Private
            | Lexeme::ReadOnly
            | Lexeme::WriteOnly
            | Lexeme::ReadWrite
            | Lexeme::Const
            | Lexeme::Volatile
            | Lexeme::Restrict
            | Lexeme::Static
            | Lexeme::Extern
            | Lexeme::Inline
            | Lexeme::Struct
            | Lexeme::Union
            | Lexeme::Typedef
            | Lexeme::Signed
            | Lexeme::Unsigned
            | Lexeme::Attribute => true,
            Lexeme::Ident(name) => self.is_type_name(name),
            _ => false,
        }
    }

    /// Whether the token after the current one starts a type name (for casts and sizeof).
    pub(super) fn is_type_name_ahead(&self) -> bool {
        match self.peek_at(1) {
            Lexeme::Global
            | Lexeme::Constant
            | Lexeme::Local
            | Lexeme::Private
            | Lexeme::Const
            | Lexeme::Volatile
            | Lexeme::Struct
            | Lexeme::Union
            | Lexeme::Signed
            | Lexeme::Unsigned => true,
            Lexeme::Ident(name) => self.is_type_name(name),
            _ => false,
        }
    }

    pub(super) fn parse_decl_specifiers(&mut self) -> Option<DeclSpecs> {
        let start = self.current_span();
        let mut base: Option<Ty> = None;
        let mut unsigned = false;
        let mut signed = false;
        let mut specs = DeclSpecs {
            ty: Ty::Unknown,
            space: None,
            access: None,
            is_kernel: false,
            is_typedef: false,
            anonymous_record: None,
            start,
        };

        loop {
            match self.peek().clone() {
                Lexeme::Kernel => specs.is_kernel = true,
                Lexeme::Global => specs.space = Some(AddressSpace::Global),
                Lexeme::Constant => specs.space = Some(AddressSpace::Constant),
                Lexeme::Local => specs.space = Some(AddressSpace::Local),
                Lexeme::Private => specs.space = Some(AddressSpace::Private),
                Lexeme::ReadOnly => specs.access = Some(AccessQualifier::ReadOnly),
                Lexeme::WriteOnly => specs.access = Some(AccessQualifier::WriteOnly),
                Lexeme::ReadWrite => specs.access = Some(AccessQualifier::ReadWrite),
                Lexeme::Typedef => specs.is_typedef = true,
                Lexeme::Const
                | Lexeme::Volatile
                | Lexeme::Restrict
                | Lexeme::Static
                | Lexeme::Extern
                | Lexeme::Inline => {}
                Lexeme::Signed => signed = true,
                Lexeme::Unsigned => unsigned = true,
                Lexeme::Attribute => {
                    self.skip_attributes();
                    continue;
                }
                Lexeme::Struct | Lexeme::Union => {
                    if base.is_some() {
                        break;
                    }
                    let (ty, anonymous) = self.parse_record_specifier();
                    base = Some(ty);
                    specs.anonymous_record = anonymous;
                    continue;
                }
                Lexeme::Ident(name) => {
                    // `short int`, `long int`, `long long`
                    let width_suffix = matches!(
                        base,
                        Some(Ty::Scalar(ScalarKind::Short | ScalarKind::Long))
                    ) && (name == "int" || name == "long");
                    if !width_suffix {
                        if base.is_some() {
                            break;
                        }
                        match Ty::from_builtin_name(&name)
                            .or_else(|| self.typedefs.get(&name).cloned())
                        {
                            Some(ty) => base = Some(ty),
                            None => break,
                        }
                    }
                }
                _ => break,
            }
            self.advance();
        }

        let ty = match base {
            Some(Ty::Scalar(kind)) if unsigned => Ty::Scalar(kind.to_unsigned()),
            Some(ty) => ty,
            None if unsigned => Ty::Scalar(ScalarKind::UInt),
            None if signed => Ty::int(),
            None => {
                self.error_at_current(&format!(
                    "expected a type, found {}",
                    self.peek().description()
                ));
                return None;
            }
        };
        specs.ty = ty;
        Some(specs)
    }

    /// `struct [tag] [{ fields }]`. Returns the type and, for untagged
    /// definitions, the new record's index.
    fn parse_record_specifier(&mut self) -> (Ty, Option<usize>) {
        let start = self.current_span();
        let kind = if self.eat(&Lexeme::Union) {
            RecordKind::Union
        } else {
            self.advance();
            RecordKind::Struct
        };
        self.skip_attributes();

        let tag = match self.peek().clone() {
            Lexeme::Ident(name) => {
                let span = self.current_span();
                self.advance();
                Some(Spanned::new(name, span))
            }
            _ => None,
        };

        let existing = tag
            .as_ref()
            .and_then(|t| self.tags.get(&(kind, t.node.clone())).copied());

        if !self.at(&Lexeme::LBrace) {
            let Some(tag) = tag else {
                self.error_at_current("expected a struct tag or '{'");
                return (Ty::Unknown, None);
            };
            let id = match existing {
                Some(id) => id,
                None => self.new_record(kind, Some(tag), Vec::new(), false, start),
            };
            return (Ty::Record { kind, id }, None);
        }

        self.advance(); // consume '{'
        let mut fields = Vec::new();
        while !self.at(&Lexeme::RBrace) && !self.at(&Lexeme::Eof) {
            let before = self.pos;
            let Some(specs) = self.parse_decl_specifiers() else {
                self.synchronize();
                continue;
            };
            loop {
                let declarator = self.parse_declarator(&specs);
                match declarator.name {
                    Some(name) => fields.push(FieldDecl {
                        name,
                        ty: declarator.ty,
                    }),
                    None => self.error_at_current("expected a field name"),
                }
                if !self.eat(&Lexeme::Comma) {
                    break;
                }
            }
            self.expect(&Lexeme::Semicolon);
            if self.pos == before {
                self.advance();
            }
        }
        self.expect(&Lexeme::RBrace);
        self.skip_attributes();
        let span = start.merge(self.prev_span());

        match existing {
            Some(id) if !self.unit.records[id].complete => {
                let record = &mut self.unit.records[id];
                record.fields = fields;
                record.complete = true;
                record.span = span;
                (Ty::Record { kind, id }, None)
            }
            _ => {
                let anonymous = tag.is_none();
                let id = self.new_record(kind, tag, fields, true, span);
                (Ty::Record { kind, id }, anonymous.then_some(id))
            }
        }
    }

    fn new_record(
        &mut self,
        kind: RecordKind,
        name: Option<Spanned<String>>,
        fields: Vec<FieldDecl>,
        complete: bool,
        span: Span,
    ) -> usize {
        let id = self.unit.records.len();
        if let Some(tag) = &name {
            self.tags.insert((kind, tag.node.clone()), id);
        }
        self.unit.records.push(RecordDef {
            kind,
            name,
            typedef_name: None,
            fields,
            complete,
            span,
        });
        id
    }

    /// Pointers, an optional name, then a parameter list or array suffixes.
    pub(super) fn parse_declarator(&mut self, specs: &DeclSpecs) -> Declarator {
        let mut ty = specs.ty.clone();
        let mut first_star = true;
        while self.eat(&Lexeme::Star) {
            let space = if first_star {
                specs.space.unwrap_or(AddressSpace::Private)
            } else {
                AddressSpace::Private
            };
            first_star = false;
            ty = Ty::Pointer {
                pointee: Box::new(ty),
                space,
            };
            while matches!(
                self.peek(),
                Lexeme::Const | Lexeme::Volatile | Lexeme::Restrict
            ) {
                self.advance();
            }
        }
        self.skip_attributes();

        let name = match self.peek().clone() {
            Lexeme::Ident(name) => {
                let span = self.current_span();
                self.advance();
                Some(Spanned::new(name, span))
            }
            _ => None,
        };

        if name.is_some() && self.at(&Lexeme::LParen) {
            let params = self.parse_params();
            return Declarator {
                name,
                ty,
                params: Some(params),
            };
        }

        let mut lens = Vec::new();
        while self.eat(&Lexeme::LBracket) {
            if self.eat(&Lexeme::RBracket) {
                lens.push(None);
                continue;
            }
            let size_expr = self.parse_conditional();
            let span = self.unit.exprs.get(size_expr).span;
            match self.const_eval(size_expr) {
                Some(n) => lens.push(Some(n)),
                None => {
                    self.error_at("array size is not an integer constant expression", span);
                    lens.push(None);
                }
            }
            self.expect(&Lexeme::RBracket);
        }
        for len in lens.into_iter().rev() {
            ty = Ty::Array {
                elem: Box::new(ty),
                len,
            };
        }
        self.skip_attributes();

        Declarator {
            name,
            ty,
            params: None,
        }
    }

    fn parse_params(&mut self) -> Vec<ParamDecl> {
        self.expect(&Lexeme::LParen);
        let mut params = Vec::new();
        if self.eat(&Lexeme::RParen) {
            return params;
        }
        if matches!(self.peek(), Lexeme::Ident(n) if n == "void")
            && matches!(self.peek_at(1), Lexeme::RParen)
        {
            self.advance();
            self.advance();
            return params;
        }

        loop {
            let start = self.current_span();
            let Some(specs) = self.parse_decl_specifiers() else {
                break;
            };
            let declarator = self.parse_declarator(&specs);
            // array parameters are pointers
            let ty = match declarator.ty {
                Ty::Array { elem, .. } => Ty::Pointer {
                    pointee: elem,
                    space: specs.space.unwrap_or(AddressSpace::Private),
                },
                other => other,
            };
            let span = start.merge(self.prev_span());
            let name = declarator
                .name
                .unwrap_or_else(|| Spanned::new(String::new(), Span::point(span.end)));
            let var = self.new_var(VarDecl {
                name,
                ty,
                kind: VarKind::Param,
                init: None,
                span,
            });
            params.push(ParamDecl {
                var,
                access: specs.access,
                span,
            });
            if !self.eat(&Lexeme::Comma) {
                break;
            }
        }
        self.expect(&Lexeme::RParen);
        params
    }

    /// A type name in a cast or `sizeof`: specifiers and `*`s, no declarator name.
    pub(super) fn parse_type_name(&mut self) -> Ty {
        let Some(specs) = self.parse_decl_specifiers() else {
            return Ty::Unknown;
        };
        let declarator = self.parse_declarator(&specs);
        if let Some(name) = declarator.name {
            self.error_at(
                &format!("unexpected identifier '{}' in type name", name.node),
                name.span,
            );
        }
        declarator.ty
    }

    /// Skip `__attribute__((...))` groups.
    pub(super) fn skip_attributes(&mut self) {
        while self.eat(&Lexeme::Attribute) {
            if !self.at(&Lexeme::LParen) {
                self.error_at_current("expected '(' after __attribute__");
                return;
            }
            let mut depth = 0u32;
            loop {
                match self.peek() {
                    Lexeme::LParen => depth += 1,
                    Lexeme::RParen => depth -= 1,
                    Lexeme::Eof => return,
                    _ => {}
                }
                self.advance();
                if depth == 0 {
                    break;
                }
            }
        }
    }

    /// Evaluate an integer constant expression (literals, `#define`s, arithmetic).
    pub(super) fn const_eval(&self, id: ExprId) -> Option<u64> {
        match &self.unit.exprs.get(id).kind {
            ExprKind::Int { value, .. } | ExprKind::Char(value) => Some(*value),
            ExprKind::Ident { name, .. } => self.define_value(name),
            ExprKind::Paren(inner) => self.const_eval(*inner),
            ExprKind::Cast { expr, .. } => self.const_eval(*expr),
            ExprKind::Unary {
                op: UnaryOp::Plus,
                operand,
            } => self.const_eval(*operand),
            ExprKind::Binary { op, lhs, rhs } => {
                let (a, b) = (self.const_eval(*lhs)?, self.const_eval(*rhs)?);
                match op {
                    BinOp::Add => a.checked_add(b),
                    BinOp::Sub => a.checked_sub(b),
                    BinOp::Mul => a.checked_mul(b),
                    BinOp::Div => a.checked_div(b),
                    BinOp::Rem => a.checked_rem(b),
                    BinOp::Shl => a.checked_shl(u32::try_from(b).ok()?),
                    BinOp::Shr => a.checked_shr(u32::try_from(b).ok()?),
                    BinOp::BitAnd => Some(a & b),
                    BinOp::BitOr => Some(a | b),
                    BinOp::BitXor => Some(a ^ b),
                    _ => None,
                }
            }
            _ => None,
        }
    }
}
