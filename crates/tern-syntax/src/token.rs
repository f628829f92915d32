//! Token types produced by the Tern lexer.

use tern_ast::Loc;

/// A token with its kind and source position.
#[derive(Debug, Clone, PartialEq)]
pub struct Token {
    pub kind: TokenKind,
    pub loc: Loc,
}

/// The kind of a lexical token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TokenKind {
    // -- Literals --
    Integral(u64),

    // -- Identifiers --
    Ident(String),

    // -- Keywords --
    TypeKw,
    Void,
    U8,
    S8,
    U16,
    S16,
    U32,
    S32,
    U64,
    S64,
    Bool,
    True,
    False,
    Struct,
    Union,
    Return,
    If,
    Then,
    Else,

    // -- Multi-character symbols --
    EqEq,    // ==
    BangEq,  // !=
    LtEq,    // <=
    GtEq,    // >=
    GtGt,    // >>
    Arrow,   // ->

    // -- Single-character symbols --
    Eq,        // =
    Lt,        // <
    Gt,        // >
    Plus,      // +
    Minus,     // -
    Star,      // *
    Amp,       // &
    Backslash, // \
    LParen,    // (
    RParen,    // )
    LBracket,  // [
    RBracket,  // ]
    LBrace,    // {
    RBrace,    // }
    Comma,     // ,
    Semicolon, // ;
    Dot,       // .

    Eof,
}

impl TokenKind {
    /// A short human-readable description for syntax errors.
    pub fn describe(&self) -> String {
        match self {
            TokenKind::Integral(n) => format!("integer `{n}`"),
            TokenKind::Ident(name) => format!("identifier `{name}`"),
            TokenKind::TypeKw => "`type`".to_string(),
            TokenKind::Void => "`void`".to_string(),
            TokenKind::U8 => "`u8`".to_string(),
            TokenKind::S8 => "`s8`".to_string(),
            TokenKind::U16 => "`u16`".to_string(),
            TokenKind::S16 => "`s16`".to_string(),
            TokenKind::U32 => "`u32`".to_string(),
            TokenKind::S32 => "`s32`".to_string(),
            TokenKind::U64 => "`u64`".to_string(),
            TokenKind::S64 => "`s64`".to_string(),
            TokenKind::Bool => "`bool`".to_string(),
            TokenKind::True => "`true`".to_string(),
            TokenKind::False => "`false`".to_string(),
            TokenKind::Struct => "`struct`".to_string(),
            TokenKind::Union => "`union`".to_string(),
            TokenKind::Return => "`return`".to_string(),
            TokenKind::If => "`if`".to_string(),
            TokenKind::Then => "`then`".to_string(),
            TokenKind::Else => "`else`".to_string(),
            TokenKind::EqEq => "`==`".to_string(),
            TokenKind::BangEq => "`!=`".to_string(),
            TokenKind::LtEq => "`<=`".to_string(),
            TokenKind::GtEq => "`>=`".to_string(),
            TokenKind::GtGt => "`>>`".to_string(),
            TokenKind::Arrow => "`->`".to_string(),
            TokenKind::Eq => "`=`".to_string(),
            TokenKind::Lt => "`<`".to_string(),
            TokenKind::Gt => "`>`".to_string(),
            TokenKind::Plus => "`+`".to_string(),
            TokenKind::Minus => "`-`".to_string(),
            TokenKind::Star => "`*`".to_string(),
            TokenKind::Amp => "`&`".to_string(),
            TokenKind::Backslash => "`\\`".to_string(),
            TokenKind::LParen => "`(`".to_string(),
            TokenKind::RParen => "`)`".to_string(),
            TokenKind::LBracket => "`[`".to_string(),
            TokenKind::RBracket => "`]`".to_string(),
            TokenKind::LBrace => "`{`".to_string(),
            TokenKind::RBrace => "`}`".to_string(),
            TokenKind::Comma => "`,`".to_string(),
            TokenKind::Semicolon => "`;`".to_string(),
            TokenKind::Dot => "`.`".to_string(),
            TokenKind::Eof => "end of input".to_string(),
        }
    }
}

/// Map an identifier text to its keyword token, if it is reserved.
pub fn keyword(text: &str) -> Option<TokenKind> {
    let kind = match text {
        "type" => TokenKind::TypeKw,
        "void" => TokenKind::Void,
        "u8" => TokenKind::U8,
        "s8" => TokenKind::S8,
        "u16" => TokenKind::U16,
        "s16" => TokenKind::S16,
        "u32" => TokenKind::U32,
        "s32" => TokenKind::S32,
        "u64" => TokenKind::U64,
        "s64" => TokenKind::S64,
        "bool" => TokenKind::Bool,
        "true" => TokenKind::True,
        "false" => TokenKind::False,
        "struct" => TokenKind::Struct,
        "union" => TokenKind::Union,
        "return" => TokenKind::Return,
        "if" => TokenKind::If,
        "then" => TokenKind::Then,
        "else" => TokenKind::Else,
        _ => return None,
    };
    Some(kind)
}
