/// All lexemes of the OpenCL C subset.
///
/// Type names (`int`, `float4`, `image2d_t`, ...) are plain identifiers; the
/// parser decides whether an identifier names a type.
#[derive(Clone, Debug, PartialEq)]
pub enum Lexeme {
    // Keywords
    Kernel,
    Global,
    Constant,
    Local,
    Private,
    ReadOnly,
    WriteOnly,
    ReadWrite,
    Const,
    Volatile,
    Restrict,
    Static,
    Extern,
    Inline,
    Struct,
    Union,
    Typedef,
    Signed,
    Unsigned,
    If,
    Else,
    For,
    While,
    Do,
    Switch,
    Case,
    Default,
    Return,
    Break,
    Continue,
    Sizeof,
    Attribute,

    // Punctuation
    LParen,    // (
    RParen,    // )
    LBrace,    // {
    RBrace,    // }
    LBracket,  // [
    RBracket,  // ]
    Comma,     // ,
    Semicolon, // ;
    Colon,     // :
    Question,  // ?
    Dot,       // .
    Arrow,     // ->

    // Operators
    Plus,       // +
    Minus,      // -
    Star,       // *
    Slash,      // /
    Percent,    // %
    Amp,        // &
    Pipe,       // |
    Caret,      // ^
    Tilde,      // ~
    Bang,       // !
    Lt,         // <
    Gt,         // >
    LtEq,       // <=
    GtEq,       // >=
    EqEq,       // ==
    BangEq,     // !=
    Shl,        // <<
    Shr,        // >>
    AmpAmp,     // &&
    PipePipe,   // ||
    Eq,         // =
    PlusEq,     // +=
    MinusEq,    // -=
    StarEq,     // *=
    SlashEq,    // /=
    PercentEq,  // %=
    AmpEq,      // &=
    PipeEq,     // |=
    CaretEq,    // ^=
    ShlEq,      // <<=
    ShrEq,      // >>=
    PlusPlus,   // ++
    MinusMinus, // --

    // Literals
    Integer { value: u64, unsigned: bool },
    Float(String),
    Char(u64),
    Str(String),
    Ident(String),

    /// A whole preprocessor line, without the leading `#`.
    Directive(String),

    Eof,
}

impl Lexeme {
    /// Try to match an identifier string to a keyword.
    pub fn from_keyword(s: &str) -> Option<Lexeme> {
        match s {
            "kernel" | "__kernel" => Some(Lexeme::Kernel),
            "global" | "__global" => Some(Lexeme::Global),
            "constant" | "__constant" => Some(Lexeme::Constant),
            "local" | "__local" => Some(Lexeme::Local),
            "private" | "__private" => Some(Lexeme::Private),
            "read_only" | "__read_only" => Some(Lexeme::ReadOnly),
            "write_only" | "__write_only" => Some(Lexeme::WriteOnly),
            "read_write" | "__read_write" => Some(Lexeme::ReadWrite),
            "const" => Some(Lexeme::Const),
            "volatile" => Some(Lexeme::Volatile),
            "restrict" => Some(Lexeme::Restrict),
            "static" => Some(Lexeme::Static),
            "extern" => Some(Lexeme::Extern),
            "inline" | "__inline" => Some(Lexeme::Inline),
            "struct" => Some(Lexeme::Struct),
            "union" => Some(Lexeme::Union),
            "typedef" => Some(Lexeme::Typedef),
            "signed" => Some(Lexeme::Signed),
            "unsigned" => Some(Lexeme::Unsigned),
            "if" => Some(Lexeme::If),
            "else" => Some(Lexeme::Else),
            "for" => Some(Lexeme::For),
            "while" => Some(Lexeme::While),
            "do" => Some(Lexeme::Do),
            "switch" => Some(Lexeme::Switch),
            "case" => Some(Lexeme::Case),
            "default" => Some(Lexeme::Default),
            "return" => Some(Lexeme::Return),
            "break" => Some(Lexeme::Break),
            "continue" => Some(Lexeme::Continue),
            "sizeof" => Some(Lexeme::Sizeof),
            "__attribute__" => Some(Lexeme::Attribute),
            _ => None,
        }
    }

    /// Human-readable description for error messages.
    pub fn description(&self) -> String {
        match self {
            Lexeme::Kernel => "'kernel'".into(),
            Lexeme::Global => "'global'".into(),
            Lexeme::Constant => "'constant'".into(),
            Lexeme::Local => "'local'".into(),
            Lexeme::Private => "'private'".into(),
            Lexeme::ReadOnly => "'read_only'".into(),
            Lexeme::WriteOnly => "'write_only'".into(),
            Lexeme::ReadWrite => "'read_write'".into(),
            Lexeme::Const => "'const'".into(),
            Lexeme::Volatile => "'volatile'".into(),
            Lexeme::Restrict => "'restrict'".into(),
            Lexeme::Static => "'static'".into(),
            Lexeme::Extern => "'extern'".into(),
            Lexeme::Inline => "'inline'".into(),
            Lexeme::Struct => "'struct'".into(),
            Lexeme::Union => "'union'".into(),
            Lexeme::Typedef => "'typedef'".into(),
            Lexeme::Signed => "'signed'".into(),
            Lexeme::Unsigned => "'unsigned'".into(),
            Lexeme::If => "'if'".into(),
            Lexeme::Else => "'else'".into(),
            Lexeme::For => "'for'".into(),
            Lexeme::While => "'while'".into(),
            Lexeme::Do => "'do'".into(),
            Lexeme::Switch => "'switch'".into(),
            Lexeme::Case => "'case'".into(),
            Lexeme::Default => "'default'".into(),
            Lexeme::Return => "'return'".into(),
            Lexeme::Break => "'break'".into(),
            Lexeme::Continue => "'continue'".into(),
            Lexeme::Sizeof => "'sizeof'".into(),
            Lexeme::Attribute => "'__attribute__'".into(),
            Lexeme::LParen => "'('".into(),
            Lexeme::RParen => "')'".into(),
            Lexeme::LBrace => "'{'".into(),
            Lexeme::RBrace => "'}'".into(),
            Lexeme::LBracket => "'['".into(),
            Lexeme::RBracket => "']'".into(),
            Lexeme::Comma => "','".into(),
            Lexeme::Semicolon => "';'".into(),
            Lexeme::Colon => "':'".into(),
            Lexeme::Question => "'?'".into(),
            Lexeme::Dot => "'.'".into(),
            Lexeme::Arrow => "'->'".into(),
            Lexeme::Plus => "'+'".into(),
            Lexeme::Minus => "'-'".into(),
            Lexeme::Star => "'*'".into(),
            Lexeme::Slash => "'/'".into(),
            Lexeme::Percent => "'%'".into(),
            Lexeme::Amp => "'&'".into(),
            Lexeme::Pipe => "'|'".into(),
            Lexeme::Caret => "'^'".into(),
            Lexeme::Tilde => "'~'".into(),
            Lexeme::Bang => "'!'".into(),
            Lexeme::Lt => "'<'".into(),
            Lexeme::Gt => "'>'".into(),
            Lexeme::LtEq => "'<='".into(),
            Lexeme::GtEq => "'>='".into(),
            Lexeme::EqEq => "'=='".into(),
            Lexeme::BangEq => "'!='".into(),
            Lexeme::Shl => "'<<'".into(),
            Lexeme::Shr => "'>>'".into(),
            Lexeme::AmpAmp => "'&&'".into(),
            Lexeme::PipePipe => "'||'".into(),
            Lexeme::Eq => "'='".into(),
            Lexeme::PlusEq => "'+='".into(),
            Lexeme::MinusEq => "'-='".into(),
            Lexeme::StarEq => "'*='".into(),
            Lexeme::SlashEq => "'/='".into(),
            Lexeme::PercentEq => "'%='".into(),
            Lexeme::AmpEq => "'&='".into(),
            Lexeme::PipeEq => "'|='".into(),
            Lexeme::CaretEq => "'^='".into(),
            Lexeme::ShlEq => "'<<='".into(),
            Lexeme::ShrEq => "'>>='".into(),
            Lexeme::PlusPlus => "'++'".into(),
            Lexeme::MinusMinus => "'--'".into(),
            Lexeme::Integer { value, .. } => format!("integer {}", value),
            Lexeme::Float(text) => format!("float {}", text),
            Lexeme::Char(_) => "character literal".into(),
            Lexeme::Str(_) => "string literal".into(),
            Lexeme::Ident(name) => format!("identifier '{}'", name),
            Lexeme::Directive(_) => "preprocessor directive".into(),
            Lexeme::Eof => "end of file".into(),
        }
    }

    /// Whether this lexeme is an address space qualifier.
    pub fn is_address_space(&self) -> bool {
        matches!(
            self,
            Lexeme::Global | Lexeme::Constant | Lexeme::Local | Lexeme::Private
        )
    }
}
