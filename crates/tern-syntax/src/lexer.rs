//! Hand-written lexer for Tern source code.

use tern_ast::Loc;
use tern_diag::{Category, Diagnostic, SourceLocation};

use crate::token::{Token, TokenKind, keyword};

/// Lex source text into a sequence of tokens. The last token is always
/// `Eof`.
///
/// Lexing never aborts: unknown characters are reported and skipped, and
/// malformed integers are reported and dropped. The returned diagnostics
/// are for the caller to route (the driver sends them to stderr).
pub fn lex(source: &str) -> (Vec<Token>, Vec<Diagnostic>) {
    let mut lexer = Lexer::new(source);
    lexer.scan_all();
    (lexer.tokens, lexer.errors)
}

struct Lexer<'a> {
    source: &'a [u8],
    pos: usize,
    line: u32,
    column: u32,
    tokens: Vec<Token>,
    errors: Vec<Diagnostic>,
}

impl<'a> Lexer<'a> {
    fn new(source: &'a str) -> Self {
        Self {
            source: source.as_bytes(),
            pos: 0,
            line: 1,
            column: 1,
            tokens: Vec::new(),
            errors: Vec::new(),
        }
    }

    fn scan_all(&mut self) {
        while self.pos < self.source.len() {
            self.scan_token();
        }
        let loc = self.loc();
        self.push(TokenKind::Eof, loc);
    }

    fn loc(&self) -> Loc {
        Loc::new(self.line, self.column)
    }

    fn peek(&self) -> Option<u8> {
        self.source.get(self.pos).copied()
    }

    /// Advance one byte, tracking (line, column).
    fn bump(&mut self) -> u8 {
        let byte = self.source[self.pos];
        self.pos += 1;
        if byte == b'\n' {
            self.line += 1;
            self.column = 1;
        } else {
            self.column += 1;
        }
        byte
    }

    fn push(&mut self, kind: TokenKind, loc: Loc) {
        self.tokens.push(Token { kind, loc });
    }

    /// Consume the second byte of a two-byte symbol and push `kind`.
    fn push_pair(&mut self, kind: TokenKind, loc: Loc) {
        self.bump();
        self.push(kind, loc);
    }

    fn scan_token(&mut self) {
        let loc = self.loc();
        let byte = self.bump();
        match byte {
            b' ' | b'\t' | b'\r' | b'\n' => {}

            b'/' if self.peek() == Some(b'/') => {
                while let Some(b) = self.peek() {
                    if b == b'\n' {
                        break;
                    }
                    self.bump();
                }
            }

            b'=' if self.peek() == Some(b'=') => self.push_pair(TokenKind::EqEq, loc),
            b'=' => self.push(TokenKind::Eq, loc),

            b'!' if self.peek() == Some(b'=') => self.push_pair(TokenKind::BangEq, loc),

            b'<' if self.peek() == Some(b'=') => self.push_pair(TokenKind::LtEq, loc),
            b'<' => self.push(TokenKind::Lt, loc),

            b'>' if self.peek() == Some(b'=') => self.push_pair(TokenKind::GtEq, loc),
            b'>' if self.peek() == Some(b'>') => self.push_pair(TokenKind::GtGt, loc),
            b'>' => self.push(TokenKind::Gt, loc),

            b'-' if self.peek() == Some(b'>') => self.push_pair(TokenKind::Arrow, loc),
            b'-' => self.push(TokenKind::Minus, loc),

            b'+' => self.push(TokenKind::Plus, loc),
            b'*' => self.push(TokenKind::Star, loc),
            b'&' => self.push(TokenKind::Amp, loc),
            b'\\' => self.push(TokenKind::Backslash, loc),
            b'(' => self.push(TokenKind::LParen, loc),
            b')' => self.push(TokenKind::RParen, loc),
            b'[' => self.push(TokenKind::LBracket, loc),
            b']' => self.push(TokenKind::RBracket, loc),
            b'{' => self.push(TokenKind::LBrace, loc),
            b'}' => self.push(TokenKind::RBrace, loc),
            b',' => self.push(TokenKind::Comma, loc),
            b';' => self.push(TokenKind::Semicolon, loc),
            b'.' => self.push(TokenKind::Dot, loc),

            b'0'..=b'9' => self.scan_integer(byte, loc),

            b'a'..=b'z' | b'A'..=b'Z' | b'_' => self.scan_ident(byte, loc),

            other => {
                // Unknown character: report, skip, keep lexing.
                self.errors.push(
                    Diagnostic::error(
                        Category::Lexical,
                        format!("unknown character `{}`", other as char),
                    )
                    .at(SourceLocation::new(loc.line, loc.column)),
                );
            }
        }
    }

    fn scan_integer(&mut self, first: u8, loc: Loc) {
        let mut text = String::new();
        text.push(first as char);
        while let Some(b @ b'0'..=b'9') = self.peek() {
            text.push(b as char);
            self.bump();
        }
        match text.parse::<u64>() {
            Ok(value) => self.push(TokenKind::Integral(value), loc),
            Err(_) => {
                self.errors.push(
                    Diagnostic::error(
                        Category::Lexical,
                        format!("integer literal `{text}` does not fit in 64 bits"),
                    )
                    .at(SourceLocation::new(loc.line, loc.column)),
                );
            }
        }
    }

    fn scan_ident(&mut self, first: u8, loc: Loc) {
        let mut text = String::new();
        text.push(first as char);
        while let Some(b) = self.peek() {
            if b.is_ascii_alphanumeric() || b == b'_' {
                text.push(b as char);
                self.bump();
            } else {
                break;
            }
        }
        match keyword(&text) {
            Some(kind) => self.push(kind, loc),
            None => self.push(TokenKind::Ident(text), loc),
        }
    }
}
