pub mod display;

use crate::span::{Span, Spanned};
use crate::types::{RecordKind, Ty};

/// A parsed OpenCL C translation unit.
///
/// Expressions live in an arena so that passes can clone and rebuild
/// subtrees without aliasing; variables are addressed by `VarId`.
#[derive(Clone, Debug, Default)]
pub struct TranslationUnit {
    pub items: Vec<Item>,
    pub exprs: ExprArena,
    pub vars: Vec<VarDecl>,
    pub records: Vec<RecordDef>,
    pub defines: Vec<Define>,
    /// Every preprocessor line, in source order, wherever it appears.
    pub directives: Vec<Spanned<String>>,
}

impl TranslationUnit {
    /// Kernel definitions, in declaration order.
    pub fn kernels(&self) -> impl Iterator<Item = &FunctionDecl> {
        self.functions().filter(|f| f.is_kernel && f.body.is_some())
    }

    /// All function declarations and definitions, in declaration order.
    pub fn functions(&self) -> impl Iterator<Item = &FunctionDecl> {
        self.items.iter().filter_map(|item| match item {
            Item::Function(f) => Some(f),
            _ => None,
        })
    }

    pub fn var(&self, id: VarId) -> &VarDecl {
        &self.vars[id.0 as usize]
    }

    pub fn expr_ty(&self, id: ExprId) -> &Ty {
        &self.exprs.get(id).ty
    }

    /// Canonical name of a type, with record names resolved.
    pub fn type_name(&self, ty: &Ty) -> String {
        ty.canonical_name(&self.records)
    }

    /// Look up a field of a structure or union.
    pub fn field(&self, record: usize, name: &str) -> Option<&FieldDecl> {
        self.records
            .get(record)?
            .fields
            .iter()
            .find(|f| f.name.node == name)
    }
}

/// Top-level items.
#[derive(Clone, Debug)]
pub enum Item {
    Function(FunctionDecl),
    /// Program-scope variables (`constant` data) declared together.
    Variables(Vec<VarId>),
    /// A standalone `struct S { ... };` or `union U { ... };`.
    Record(usize),
    Typedef(TypedefDecl),
    /// A preprocessor line, kept verbatim in the output.
    Directive(Spanned<String>),
}

#[derive(Clone, Debug)]
pub struct FunctionDecl {
    pub name: Spanned<String>,
    pub is_kernel: bool,
    pub return_ty: Ty,
    pub params: Vec<ParamDecl>,
    /// `None` for prototypes.
    pub body: Option<Block>,
    pub span: Span,
}

#[derive(Clone, Debug)]
pub struct ParamDecl {
    pub var: VarId,
    /// Image access qualifier as written.
    pub access: Option<AccessQualifier>,
    /// From the first specifier to the end of the declarator.
    pub span: Span,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AccessQualifier {
    ReadOnly,
    WriteOnly,
    ReadWrite,
}

impl AccessQualifier {
    pub fn as_str(&self) -> &'static str {
        match self {
            AccessQualifier::ReadOnly => "read_only",
            AccessQualifier::WriteOnly => "write_only",
            AccessQualifier::ReadWrite => "read_write",
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct VarId(pub u32);

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum VarKind {
    Param,
    Local,
    Global,
}

#[derive(Clone, Debug)]
pub struct VarDecl {
    pub name: Spanned<String>,
    pub ty: Ty,
    pub kind: VarKind,
    pub init: Option<Init>,
    pub span: Span,
}

#[derive(Clone, Debug)]
pub enum Init {
    Expr(ExprId),
    List(Vec<Init>, Span),
}

#[derive(Clone, Debug)]
pub struct RecordDef {
    pub kind: RecordKind,
    pub name: Option<Spanned<String>>,
    /// Set when an anonymous record is named by a typedef.
    pub typedef_name: Option<String>,
    pub fields: Vec<FieldDecl>,
    /// False for forward declarations that were never completed.
    pub complete: bool,
    pub span: Span,
}

impl RecordDef {
    pub fn display_name(&self) -> String {
        match (&self.name, &self.typedef_name) {
            (Some(name), _) => format!("{} {}", self.kind.keyword(), name.node),
            (None, Some(alias)) => alias.clone(),
            (None, None) => format!("{} (anonymous)", self.kind.keyword()),
        }
    }
}

#[derive(Clone, Debug)]
pub struct FieldDecl {
    pub name: Spanned<String>,
    pub ty: Ty,
}

#[derive(Clone, Debug)]
pub struct TypedefDecl {
    pub name: Spanned<String>,
    pub ty: Ty,
}

/// `#define NAME <integer>`.
#[derive(Clone, Debug)]
pub struct Define {
    pub name: Spanned<String>,
    pub value: u64,
}

#[derive(Clone, Debug, Default)]
pub struct Block {
    pub stmts: Vec<Spanned<Stmt>>,
}

#[derive(Clone, Debug)]
pub enum Stmt {
    /// Local declarations; initializers live in the `VarDecl`s.
    Decl(Vec<VarId>),
    /// A typedef inside a function body.
    Typedef(Vec<TypedefDecl>),
    Expr(ExprId),
    Block(Block),
    If {
        cond: ExprId,
        then: Box<Spanned<Stmt>>,
        otherwise: Option<Box<Spanned<Stmt>>>,
    },
    While {
        cond: ExprId,
        body: Box<Spanned<Stmt>>,
    },
    DoWhile {
        body: Box<Spanned<Stmt>>,
        cond: ExprId,
    },
    For {
        init: Option<Box<Spanned<Stmt>>>,
        cond: Option<ExprId>,
        step: Option<ExprId>,
        body: Box<Spanned<Stmt>>,
    },
    Switch {
        cond: ExprId,
        body: Box<Spanned<Stmt>>,
    },
    Case(ExprId),
    Default,
    Return(Option<ExprId>),
    Break,
    Continue,
    Empty,
}

// ─── Expressions ───────────────────────────────────────────────────

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ExprId(pub u32);

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum UnaryOp {
    Neg,
    Plus,
    Not,
    BitNot,
    Deref,
    AddrOf,
    PreInc,
    PreDec,
    PostInc,
    PostDec,
}

impl UnaryOp {
    pub fn symbol(&self) -> &'static str {
        match self {
            UnaryOp::Neg => "-",
            UnaryOp::Plus => "+",
            UnaryOp::Not => "!",
            UnaryOp::BitNot => "~",
            UnaryOp::Deref => "*",
            UnaryOp::AddrOf => "&",
            UnaryOp::PreInc | UnaryOp::PostInc => "++",
            UnaryOp::PreDec | UnaryOp::PostDec => "--",
        }
    }

    pub fn is_postfix(&self) -> bool {
        matches!(self, UnaryOp::PostInc | UnaryOp::PostDec)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BinOp {
    Mul,
    Div,
    Rem,
    Add,
    Sub,
    Shl,
    Shr,
    Lt,
    Gt,
    Le,
    Ge,
    Eq,
    Ne,
    BitAnd,
    BitXor,
    BitOr,
    And,
    Or,
}

impl BinOp {
    pub fn symbol(&self) -> &'static str {
        match self {
            BinOp::Mul => "*",
            BinOp::Div => "/",
            BinOp::Rem => "%",
            BinOp::Add => "+",
            BinOp::Sub => "-",
            BinOp::Shl => "<<",
            BinOp::Shr => ">>",
            BinOp::Lt => "<",
            BinOp::Gt => ">",
            BinOp::Le => "<=",
            BinOp::Ge => ">=",
            BinOp::Eq => "==",
            BinOp::Ne => "!=",
            BinOp::BitAnd => "&",
            BinOp::BitXor => "^",
            BinOp::BitOr => "|",
            BinOp::And => "&&",
            BinOp::Or => "||",
        }
    }

    /// C precedence level; higher binds tighter.
    pub fn precedence(&self) -> u8 {
        match self {
            BinOp::Mul | BinOp::Div | BinOp::Rem => 13,
            BinOp::Add | BinOp::Sub => 12,
            BinOp::Shl | BinOp::Shr => 11,
            BinOp::Lt | BinOp::Gt | BinOp::Le | BinOp::Ge => 10,
            BinOp::Eq | BinOp::Ne => 9,
            BinOp::BitAnd => 8,
            BinOp::BitXor => 7,
            BinOp::BitOr => 6,
            BinOp::And => 5,
            BinOp::Or => 4,
        }
    }

    pub fn is_comparison(&self) -> bool {
        matches!(
            self,
            BinOp::Lt
                | BinOp::Gt
                | BinOp::Le
                | BinOp::Ge
                | BinOp::Eq
                | BinOp::Ne
                | BinOp::And
                | BinOp::Or
        )
    }
}

/// `=` or a compound assignment such as `+=`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AssignOp {
    Assign,
    Compound(BinOp),
}

impl AssignOp {
    pub fn symbol(&self) -> String {
        match self {
            AssignOp::Assign => "=".to_string(),
            AssignOp::Compound(op) => format!("{}=", op.symbol()),
        }
    }
}

/// What an identifier refers to, filled in by the type checker.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Binding {
    Unresolved,
    Var(VarId),
    /// A `#define` constant.
    Constant(u64),
}

#[derive(Clone, Debug)]
pub enum ExprKind {
    Int {
        value: u64,
        unsigned: bool,
    },
    Float(String),
    Char(u64),
    Str(String),
    Ident {
        name: String,
        binding: Binding,
    },
    Paren(ExprId),
    Unary {
        op: UnaryOp,
        operand: ExprId,
    },
    Binary {
        op: BinOp,
        lhs: ExprId,
        rhs: ExprId,
    },
    Assign {
        op: AssignOp,
        lhs: ExprId,
        rhs: ExprId,
    },
    Conditional {
        cond: ExprId,
        then: ExprId,
        otherwise: ExprId,
    },
    Comma {
        lhs: ExprId,
        rhs: ExprId,
    },
    Call {
        callee: Spanned<String>,
        args: Vec<ExprId>,
    },
    Index {
        base: ExprId,
        index: ExprId,
    },
    Member {
        base: ExprId,
        field: Spanned<String>,
        arrow: bool,
    },
    /// `(T) expr`; `spelling` is the type as it should be printed.
    Cast {
        ty: Ty,
        spelling: String,
        expr: ExprId,
    },
    SizeofType(Ty),
    SizeofExpr(ExprId),
}

#[derive(Clone, Debug)]
pub struct ExprNode {
    pub kind: ExprKind,
    pub span: Span,
    /// Resolved by the type checker; `Ty::Unknown` until then.
    pub ty: Ty,
    /// Built by a pass rather than parsed from the source.
    pub synthesized: bool,
}

#[derive(Clone, Debug, Default)]
pub struct ExprArena {
    nodes: Vec<ExprNode>,
}

impl ExprArena {
    pub fn alloc(&mut self, kind: ExprKind, span: Span) -> ExprId {
        self.push(ExprNode {
            kind,
            span,
            ty: Ty::Unknown,
            synthesized: false,
        })
    }

    /// Allocate a node built by a pass; `span` is the source range it stands for.
    pub fn synthesize(&mut self, kind: ExprKind, span: Span, ty: Ty) -> ExprId {
        self.push(ExprNode {
            kind,
            span,
            ty,
            synthesized: true,
        })
    }

    fn push(&mut self, node: ExprNode) -> ExprId {
        let id = ExprId(self.nodes.len() as u32);
        self.nodes.push(node);
        id
    }

    pub fn get(&self, id: ExprId) -> &ExprNode {
        &self.nodes[id.0 as usize]
    }

    pub fn get_mut(&mut self, id: ExprId) -> &mut ExprNode {
        &mut self.nodes[id.0 as usize]
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Put `node` in place of `id`; every parent referring to `id` now sees it.
    pub fn replace(&mut self, id: ExprId, node: ExprNode) {
        self.nodes[id.0 as usize] = node;
    }

    /// Look through any number of parentheses.
    pub fn strip_parens(&self, mut id: ExprId) -> ExprId {
        while let ExprKind::Paren(inner) = self.get(id).kind {
            id = inner;
        }
        id
    }

    /// Direct children, in source order.
    pub fn children(&self, id: ExprId) -> Vec<ExprId> {
        match &self.get(id).kind {
            ExprKind::Int { .. }
            | ExprKind::Float(_)
            | ExprKind::Char(_)
            | ExprKind::Str(_)
            | ExprKind::Ident { .. }
            | ExprKind::SizeofType(_) => Vec::new(),
            ExprKind::Paren(e)
            | ExprKind::Unary { operand: e, .. }
            | ExprKind::Cast { expr: e, .. }
            | ExprKind::SizeofExpr(e)
            | ExprKind::Member { base: e, .. } => vec![*e],
            ExprKind::Binary { lhs, rhs, .. }
            | ExprKind::Assign { lhs, rhs, .. }
            | ExprKind::Comma { lhs, rhs } => vec![*lhs, *rhs],
            ExprKind::Index { base, index } => vec![*base, *index],
            ExprKind::Conditional {
                cond,
                then,
                otherwise,
            } => vec![*cond, *then, *otherwise],
            ExprKind::Call { args, .. } => args.clone(),
        }
    }

    /// Copy a subtree into fresh nodes. The copy shares nothing with the original.
    pub fn deep_clone(&mut self, id: ExprId) -> ExprId {
        let node = self.get(id).clone();
        let kind = match node.kind {
            ExprKind::Paren(e) => ExprKind::Paren(self.deep_clone(e)),
            ExprKind::Unary { op, operand } => ExprKind::Unary {
                op,
                operand: self.deep_clone(operand),
            },
            ExprKind::Binary { op, lhs, rhs } => ExprKind::Binary {
                op,
                lhs: self.deep_clone(lhs),
                rhs: self.deep_clone(rhs),
            },
            ExprKind::Assign { op, lhs, rhs } => ExprKind::Assign {
                op,
                lhs: self.deep_clone(lhs),
                rhs: self.deep_clone(rhs),
            },
            ExprKind::Conditional {
                cond,
                then,
                otherwise,
            } => ExprKind::Conditional {
                cond: self.deep_clone(cond),
                then: self.deep_clone(then),
                otherwise: self.deep_clone(otherwise),
            },
            ExprKind::Comma { lhs, rhs } => ExprKind::Comma {
                lhs: self.deep_clone(lhs),
                rhs: self.deep_clone(rhs),
            },
            ExprKind::Call { callee, args } => ExprKind::Call {
                callee,
                args: args.into_iter().map(|a| self.deep_clone(a)).collect(),
            },
            ExprKind::Index { base, index } => ExprKind::Index {
                base: self.deep_clone(base),
                index: self.deep_clone(index),
            },
            ExprKind::Member { base, field, arrow } => ExprKind::Member {
                base: self.deep_clone(base),
                field,
                arrow,
            },
            ExprKind::Cast { ty, spelling, expr } => ExprKind::Cast {
                ty,
                spelling,
                expr: self.deep_clone(expr),
            },
            ExprKind::SizeofExpr(e) => ExprKind::SizeofExpr(self.deep_clone(e)),
            leaf => leaf,
        };
        self.push(ExprNode {
            kind,
            span: node.span,
            ty: node.ty,
            synthesized: node.synthesized,
        })
    }
}
