//! Recursive descent parser for Tern.
//!
//! The grammar mirrors the pretty-printed surface: postfix `(args)` is a
//! call, postfix `[params]` is a function type, prefix `*`/`&` dereference
//! and take references, postfix `*` forms a pointer type, and `[` at the
//! head of an expression opens either a pack `[type]{.f = e, ...}` or a
//! bracketed statement expression.
//!
//! Syntax errors abort the parse with a diagnostic carrying the offending
//! token's (line, column).

use tern_ast::{
    Binder, BinOp, Block, Expr, ExprKind, Field, FieldInit, FuncDef, IfArm, Literal, Loc, Param,
    Statement, StatementKind, TopLevel, TopLevelKind, TranslationUnit,
};
use tern_diag::{Category, Diagnostic, SourceLocation};
use tern_sym::{Interner, Symbol};

use crate::token::{Token, TokenKind};

/// Parse a complete translation unit from a token stream.
pub fn parse_unit(
    tokens: Vec<Token>,
    interner: &mut Interner,
) -> Result<TranslationUnit, Vec<Diagnostic>> {
    let mut parser = Parser::new(tokens, interner);
    parser.unit().map_err(|diag| vec![diag])
}

/// Parse a single expression from a token stream. Used by tests and tools.
pub fn parse_expr(tokens: Vec<Token>, interner: &mut Interner) -> Result<Expr, Vec<Diagnostic>> {
    let mut parser = Parser::new(tokens, interner);
    let expr = parser.expression().map_err(|diag| vec![diag])?;
    if !parser.at_eof() {
        return Err(vec![parser.error_at_current("unexpected token after expression")]);
    }
    Ok(expr)
}

struct Parser<'a> {
    tokens: Vec<Token>,
    pos: usize,
    interner: &'a mut Interner,
}

impl<'a> Parser<'a> {
    fn new(mut tokens: Vec<Token>, interner: &'a mut Interner) -> Self {
        if tokens.last().map(|t| &t.kind) != Some(&TokenKind::Eof) {
            let loc = tokens.last().map(|t| t.loc).unwrap_or(Loc::new(1, 1));
            tokens.push(Token {
                kind: TokenKind::Eof,
                loc,
            });
        }
        Self {
            tokens,
            pos: 0,
            interner,
        }
    }

    // -- Token stream helpers --

    fn current(&self) -> &Token {
        &self.tokens[self.pos]
    }

    fn current_loc(&self) -> Loc {
        self.current().loc
    }

    fn peek_kind(&self, ahead: usize) -> &TokenKind {
        let idx = (self.pos + ahead).min(self.tokens.len() - 1);
        &self.tokens[idx].kind
    }

    fn at_eof(&self) -> bool {
        self.current().kind == TokenKind::Eof
    }

    fn check(&self, kind: &TokenKind) -> bool {
        &self.current().kind == kind
    }

    fn advance(&mut self) {
        if !self.at_eof() {
            self.pos += 1;
        }
    }

    fn match_token(&mut self, kind: &TokenKind) -> bool {
        if self.check(kind) {
            self.advance();
            true
        } else {
            false
        }
    }

    fn expect(&mut self, kind: &TokenKind, context: &str) -> Result<(), Diagnostic> {
        if self.match_token(kind) {
            Ok(())
        } else {
            Err(self.error_at_current(&format!(
                "expected {} {context}, found {}",
                kind.describe(),
                self.current().kind.describe()
            )))
        }
    }

    fn error_at_current(&self, message: &str) -> Diagnostic {
        let loc = self.current_loc();
        Diagnostic::error(Category::Syntax, message)
            .at(SourceLocation::new(loc.line, loc.column))
    }

    /// Expect an identifier token and intern it.
    fn ident(&mut self, context: &str) -> Result<(Symbol, Loc), Diagnostic> {
        let loc = self.current_loc();
        let text = match &self.tokens[self.pos].kind {
            TokenKind::Ident(text) => text.clone(),
            other => {
                let found = other.describe();
                return Err(self
                    .error_at_current(&format!("expected {context}, found {found}")));
            }
        };
        self.advance();
        Ok((self.interner.intern(&text), loc))
    }

    // -- Translation unit --

    fn unit(&mut self) -> Result<TranslationUnit, Diagnostic> {
        let mut top_levels = Vec::new();
        while !self.at_eof() {
            top_levels.push(self.top_level()?);
        }
        Ok(TranslationUnit { top_levels })
    }

    /// `ReturnType name(param-list) { statement-list }`
    fn top_level(&mut self) -> Result<TopLevel, Diagnostic> {
        let loc = self.current_loc();
        let ret_type = self.expression()?;
        let (name, _) = self.ident("a function name")?;
        self.expect(&TokenKind::LParen, "after the function name")?;
        let params = self.param_list()?;
        self.expect(&TokenKind::RParen, "after the parameter list")?;

        let body_loc = self.current_loc();
        let block = self.block()?;
        let body = Expr::at(
            ExprKind::Statement(Box::new(Statement::at(
                StatementKind::Block(block),
                body_loc,
            ))),
            body_loc,
        );
        Ok(TopLevel {
            loc: Some(loc),
            name,
            kind: TopLevelKind::Func(FuncDef {
                ret_type,
                params,
                body,
            }),
        })
    }

    /// `expr name?, expr name?, ...` terminated by `)`.
    fn param_list(&mut self) -> Result<Vec<Param>, Diagnostic> {
        let mut params = Vec::new();
        if self.check(&TokenKind::RParen) {
            return Ok(params);
        }
        loop {
            let ty = self.expression()?;
            let name = if matches!(self.current().kind, TokenKind::Ident(_)) {
                Some(self.ident("a parameter name")?.0)
            } else {
                None
            };
            params.push(Param { ty, name });
            if !self.match_token(&TokenKind::Comma) {
                break;
            }
        }
        Ok(params)
    }

    // -- Statements --

    fn block(&mut self) -> Result<Block, Diagnostic> {
        self.expect(&TokenKind::LBrace, "to open a block")?;
        let mut statements = Vec::new();
        while !self.check(&TokenKind::RBrace) {
            if self.at_eof() {
                return Err(self.error_at_current("unclosed block"));
            }
            statements.push(self.statement()?);
        }
        self.advance();
        Ok(Block::new(statements))
    }

    fn statement(&mut self) -> Result<Statement, Diagnostic> {
        let loc = self.current_loc();
        match &self.current().kind {
            TokenKind::Semicolon => {
                self.advance();
                Ok(Statement::at(StatementKind::Empty, loc))
            }

            TokenKind::Return => {
                self.advance();
                let expr = self.expression()?;
                self.expect(&TokenKind::Semicolon, "after the return value")?;
                Ok(Statement::at(StatementKind::Return(expr), loc))
            }

            TokenKind::LBrace => {
                let block = self.block()?;
                Ok(Statement::at(StatementKind::Block(block), loc))
            }

            TokenKind::If => self.if_statement(loc),

            _ => {
                let expr = self.expression()?;
                self.statement_tail(expr, loc)
            }
        }
    }

    /// Finish a statement that began with an expression: a declaration
    /// `type name (= init)? ;` when an identifier follows, otherwise an
    /// expression statement `expr ;`.
    fn statement_tail(&mut self, expr: Expr, loc: Loc) -> Result<Statement, Diagnostic> {
        if matches!(self.current().kind, TokenKind::Ident(_)) {
            let (name, _) = self.ident("a declared name")?;
            let init = if self.match_token(&TokenKind::Eq) {
                Some(self.expression()?)
            } else {
                None
            };
            self.expect(&TokenKind::Semicolon, "after the declaration")?;
            Ok(Statement::at(
                StatementKind::Decl {
                    ty: expr,
                    name,
                    init,
                },
                loc,
            ))
        } else {
            self.expect(&TokenKind::Semicolon, "after the expression")?;
            Ok(Statement::at(StatementKind::Expr(expr), loc))
        }
    }

    /// `if (c) { .. } else if (c) { .. } ... else { .. }`
    fn if_statement(&mut self, loc: Loc) -> Result<Statement, Diagnostic> {
        self.advance(); // consume 'if'
        let mut arms = Vec::new();
        loop {
            self.expect(&TokenKind::LParen, "after `if`")?;
            let condition = self.expression()?;
            self.expect(&TokenKind::RParen, "after the condition")?;
            let block = self.block()?;
            arms.push(IfArm { condition, block });

            if !self.match_token(&TokenKind::Else) {
                return Ok(Statement::at(
                    StatementKind::IfThenElse {
                        arms,
                        else_block: Block::default(),
                    },
                    loc,
                ));
            }
            if self.match_token(&TokenKind::If) {
                continue;
            }
            let else_block = self.block()?;
            return Ok(Statement::at(
                StatementKind::IfThenElse { arms, else_block },
                loc,
            ));
        }
    }

    // -- Expressions --

    fn expression(&mut self) -> Result<Expr, Diagnostic> {
        self.and_then()
    }

    /// `>>` sequencing, right associative, loosest.
    fn and_then(&mut self) -> Result<Expr, Diagnostic> {
        let lhs = self.comparison()?;
        if !self.match_token(&TokenKind::GtGt) {
            return Ok(lhs);
        }
        let loc = lhs.loc;
        let rhs = self.and_then()?;
        Ok(Expr {
            loc,
            kind: ExprKind::BinOp {
                op: BinOp::AndThen,
                lhs: Box::new(lhs),
                rhs: Box::new(rhs),
            },
        })
    }

    fn comparison(&mut self) -> Result<Expr, Diagnostic> {
        let mut lhs = self.additive()?;
        loop {
            let op = match self.current().kind {
                TokenKind::EqEq => BinOp::Eq,
                TokenKind::BangEq => BinOp::Ne,
                TokenKind::Lt => BinOp::Lt,
                TokenKind::LtEq => BinOp::Le,
                TokenKind::Gt => BinOp::Gt,
                TokenKind::GtEq => BinOp::Ge,
                _ => break,
            };
            self.advance();
            let rhs = self.additive()?;
            let loc = lhs.loc;
            lhs = Expr {
                loc,
                kind: ExprKind::BinOp {
                    op,
                    lhs: Box::new(lhs),
                    rhs: Box::new(rhs),
                },
            };
        }
        Ok(lhs)
    }

    fn additive(&mut self) -> Result<Expr, Diagnostic> {
        let mut lhs = self.prefix()?;
        loop {
            let op = match self.current().kind {
                TokenKind::Plus => BinOp::Add,
                TokenKind::Minus => BinOp::Sub,
                _ => break,
            };
            self.advance();
            let rhs = self.prefix()?;
            let loc = lhs.loc;
            lhs = Expr {
                loc,
                kind: ExprKind::BinOp {
                    op,
                    lhs: Box::new(lhs),
                    rhs: Box::new(rhs),
                },
            };
        }
        Ok(lhs)
    }

    fn prefix(&mut self) -> Result<Expr, Diagnostic> {
        let loc = self.current_loc();
        if self.match_token(&TokenKind::Star) {
            let inner = self.prefix()?;
            return Ok(Expr::at(ExprKind::Dereference(Box::new(inner)), loc));
        }
        if self.match_token(&TokenKind::Amp) {
            let inner = self.prefix()?;
            return Ok(Expr::at(ExprKind::Reference(Box::new(inner)), loc));
        }
        self.postfix()
    }

    fn postfix(&mut self) -> Result<Expr, Diagnostic> {
        let mut expr = self.primary()?;
        loop {
            match self.current().kind {
                TokenKind::LParen => {
                    self.advance();
                    let args = self.argument_list()?;
                    self.expect(&TokenKind::RParen, "after the arguments")?;
                    let loc = expr.loc;
                    expr = Expr {
                        loc,
                        kind: ExprKind::Call {
                            callee: Box::new(expr),
                            args,
                        },
                    };
                }

                TokenKind::LBracket => {
                    self.advance();
                    let params = self.func_type_params()?;
                    self.expect(&TokenKind::RBracket, "after the parameter types")?;
                    let loc = expr.loc;
                    expr = Expr {
                        loc,
                        kind: ExprKind::FuncType {
                            ret_type: Box::new(expr),
                            params,
                        },
                    };
                }

                TokenKind::Dot => {
                    self.advance();
                    let (field, _) = self.ident("a field name")?;
                    let loc = expr.loc;
                    expr = Expr {
                        loc,
                        kind: ExprKind::Member {
                            record: Box::new(expr),
                            field,
                        },
                    };
                }

                TokenKind::Star => {
                    self.advance();
                    let loc = expr.loc;
                    expr = Expr {
                        loc,
                        kind: ExprKind::Pointer(Box::new(expr)),
                    };
                }

                _ => break,
            }
        }
        Ok(expr)
    }

    fn argument_list(&mut self) -> Result<Vec<Expr>, Diagnostic> {
        let mut args = Vec::new();
        if self.check(&TokenKind::RParen) {
            return Ok(args);
        }
        loop {
            args.push(self.expression()?);
            if !self.match_token(&TokenKind::Comma) {
                break;
            }
        }
        Ok(args)
    }

    /// `expr name?, ...` terminated by `]`.
    fn func_type_params(&mut self) -> Result<Vec<Param>, Diagnostic> {
        let mut params = Vec::new();
        if self.check(&TokenKind::RBracket) {
            return Ok(params);
        }
        loop {
            let ty = self.expression()?;
            let name = if matches!(self.current().kind, TokenKind::Ident(_)) {
                Some(self.ident("a parameter name")?.0)
            } else {
                None
            };
            params.push(Param { ty, name });
            if !self.match_token(&TokenKind::Comma) {
                break;
            }
        }
        Ok(params)
    }

    fn primary(&mut self) -> Result<Expr, Diagnostic> {
        let loc = self.current_loc();

        if let Some(literal) = literal_of(&self.current().kind) {
            self.advance();
            return Ok(Expr::at(ExprKind::Literal(literal), loc));
        }

        match &self.current().kind {
            TokenKind::Ident(_) => {
                let (sym, _) = self.ident("an identifier")?;
                Ok(Expr::at(ExprKind::Ident(sym), loc))
            }

            TokenKind::LParen => {
                self.advance();
                let expr = self.expression()?;
                self.expect(&TokenKind::RParen, "after the expression")?;
                Ok(expr)
            }

            TokenKind::Struct => {
                self.advance();
                let fields = self.field_list()?;
                Ok(Expr::at(ExprKind::Struct(fields), loc))
            }

            TokenKind::Union => {
                self.advance();
                let fields = self.field_list()?;
                Ok(Expr::at(ExprKind::Union(fields), loc))
            }

            TokenKind::Backslash => {
                self.advance();
                self.expect(&TokenKind::LParen, "after `\\`")?;
                let params = self.binder_list()?;
                self.expect(&TokenKind::RParen, "after the lambda parameters")?;
                self.expect(&TokenKind::Arrow, "before the lambda body")?;
                let body = self.expression()?;
                Ok(Expr::at(
                    ExprKind::Lambda {
                        params,
                        body: Box::new(body),
                    },
                    loc,
                ))
            }

            TokenKind::If => {
                self.advance();
                let predicate = self.expression()?;
                self.expect(&TokenKind::Then, "after the condition")?;
                let then_branch = self.expression()?;
                self.expect(&TokenKind::Else, "after the then-branch")?;
                let else_branch = self.expression()?;
                Ok(Expr::at(
                    ExprKind::IfThenElse {
                        predicate: Box::new(predicate),
                        then_branch: Box::new(then_branch),
                        else_branch: Box::new(else_branch),
                    },
                    loc,
                ))
            }

            TokenKind::LBracket => self.bracket_expression(loc),

            other => {
                let found = other.describe();
                Err(self.error_at_current(&format!("expected an expression, found {found}")))
            }
        }
    }

    /// `struct`/`union` body: `{ expr name; ... }`.
    fn field_list(&mut self) -> Result<Vec<Field>, Diagnostic> {
        self.expect(&TokenKind::LBrace, "to open the field list")?;
        let mut fields = Vec::new();
        while !self.check(&TokenKind::RBrace) {
            if self.at_eof() {
                return Err(self.error_at_current("unclosed field list"));
            }
            let ty = self.expression()?;
            let (name, _) = self.ident("a field name")?;
            self.expect(&TokenKind::Semicolon, "after the field")?;
            fields.push(Field { ty, name });
        }
        self.advance();
        Ok(fields)
    }

    /// Lambda parameters: `expr name, ...` terminated by `)`.
    fn binder_list(&mut self) -> Result<Vec<Binder>, Diagnostic> {
        let mut params = Vec::new();
        if self.check(&TokenKind::RParen) {
            return Ok(params);
        }
        loop {
            let ty = self.expression()?;
            let (name, _) = self.ident("a parameter name")?;
            params.push(Binder { ty, name });
            if !self.match_token(&TokenKind::Comma) {
                break;
            }
        }
        Ok(params)
    }

    /// `[` at the head of an expression: a pack `[type]{.f = e, ...}` or a
    /// bracketed statement expression `[ statement ]`.
    ///
    /// A statement opener (`{`, `return`, `;`, or `if` followed by `(`)
    /// selects the statement form; anything else begins a type expression,
    /// which turns out to be a declaration statement when an identifier
    /// follows instead of `]`.
    fn bracket_expression(&mut self, loc: Loc) -> Result<Expr, Diagnostic> {
        self.advance(); // consume '['

        let statement_head = matches!(
            self.current().kind,
            TokenKind::LBrace | TokenKind::Return | TokenKind::Semicolon
        ) || (self.check(&TokenKind::If) && *self.peek_kind(1) == TokenKind::LParen);
        if statement_head {
            let statement = self.statement()?;
            self.expect(&TokenKind::RBracket, "to close the statement expression")?;
            return Ok(Expr::at(ExprKind::Statement(Box::new(statement)), loc));
        }

        let expr = self.expression()?;
        if self.match_token(&TokenKind::RBracket) {
            self.expect(&TokenKind::LBrace, "to open the pack body")?;
            let mut inits = Vec::new();
            if !self.check(&TokenKind::RBrace) {
                loop {
                    self.expect(&TokenKind::Dot, "before a field name")?;
                    let (name, _) = self.ident("a field name")?;
                    self.expect(&TokenKind::Eq, "after the field name")?;
                    let value = self.expression()?;
                    inits.push(FieldInit { name, value });
                    if !self.match_token(&TokenKind::Comma) {
                        break;
                    }
                }
            }
            self.expect(&TokenKind::RBrace, "to close the pack")?;
            return Ok(Expr::at(
                ExprKind::Pack {
                    ty: Box::new(expr),
                    inits,
                },
                loc,
            ));
        }

        let statement = self.statement_tail(expr, loc)?;
        self.expect(&TokenKind::RBracket, "to close the statement expression")?;
        Ok(Expr::at(ExprKind::Statement(Box::new(statement)), loc))
    }
}

fn literal_of(kind: &TokenKind) -> Option<Literal> {
    let literal = match kind {
        TokenKind::TypeKw => Literal::Type,
        TokenKind::Void => Literal::Void,
        TokenKind::U8 => Literal::U8,
        TokenKind::S8 => Literal::S8,
        TokenKind::U16 => Literal::U16,
        TokenKind::S16 => Literal::S16,
        TokenKind::U32 => Literal::U32,
        TokenKind::S32 => Literal::S32,
        TokenKind::U64 => Literal::U64,
        TokenKind::S64 => Literal::S64,
        TokenKind::Bool => Literal::Bool,
        TokenKind::True => Literal::Boolean(true),
        TokenKind::False => Literal::Boolean(false),
        TokenKind::Integral(n) => Literal::Integral(*n),
        _ => return None,
    };
    Some(literal)
}
