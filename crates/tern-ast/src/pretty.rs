//! Pretty-printing for Tern AST nodes.
//!
//! Symbols only resolve against the interner that issued them, so nodes do
//! not implement `Display` directly; [`Expr::display`] and friends pair a
//! node with an interner and the pair renders. The surface is reproducible
//! byte for byte: sub-expressions other than literals, identifiers, structs,
//! and unions are parenthesized, statements indent four spaces per nesting
//! level, and conditionals use C-style braces.

use std::fmt;

use tern_sym::Interner;

use crate::{
    BinOp, Block, Expr, ExprKind, Literal, Statement, StatementKind, TopLevel, TopLevelKind,
    TranslationUnit,
};

impl Expr {
    pub fn display<'a>(&'a self, interner: &'a Interner) -> DisplayExpr<'a> {
        DisplayExpr {
            expr: self,
            interner,
        }
    }
}

impl Statement {
    pub fn display<'a>(&'a self, interner: &'a Interner) -> DisplayStatement<'a> {
        DisplayStatement {
            statement: self,
            interner,
        }
    }
}

impl TopLevel {
    pub fn display<'a>(&'a self, interner: &'a Interner) -> DisplayTopLevel<'a> {
        DisplayTopLevel {
            top_level: self,
            interner,
        }
    }
}

impl TranslationUnit {
    pub fn display<'a>(&'a self, interner: &'a Interner) -> DisplayUnit<'a> {
        DisplayUnit {
            unit: self,
            interner,
        }
    }
}

/// An [`Expr`] paired with its interner for rendering.
pub struct DisplayExpr<'a> {
    expr: &'a Expr,
    interner: &'a Interner,
}

impl fmt::Display for DisplayExpr<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write_expr(f, self.interner, self.expr)
    }
}

/// A [`Statement`] paired with its interner, rendered at nesting depth zero.
pub struct DisplayStatement<'a> {
    statement: &'a Statement,
    interner: &'a Interner,
}

impl fmt::Display for DisplayStatement<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write_statement(f, self.interner, 0, self.statement)
    }
}

/// A [`TopLevel`] paired with its interner for rendering.
pub struct DisplayTopLevel<'a> {
    top_level: &'a TopLevel,
    interner: &'a Interner,
}

impl fmt::Display for DisplayTopLevel<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write_top_level(f, self.interner, self.top_level)
    }
}

/// A [`TranslationUnit`] paired with its interner for rendering.
pub struct DisplayUnit<'a> {
    unit: &'a TranslationUnit,
    interner: &'a Interner,
}

impl fmt::Display for DisplayUnit<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, top_level) in self.unit.top_levels.iter().enumerate() {
            if i > 0 {
                writeln!(f)?;
            }
            write_top_level(f, self.interner, top_level)?;
        }
        Ok(())
    }
}

fn write_literal(f: &mut fmt::Formatter<'_>, literal: Literal) -> fmt::Result {
    match literal {
        Literal::Type => f.write_str("type"),
        Literal::Void => f.write_str("void"),
        Literal::U8 => f.write_str("u8"),
        Literal::S8 => f.write_str("s8"),
        Literal::U16 => f.write_str("u16"),
        Literal::S16 => f.write_str("s16"),
        Literal::U32 => f.write_str("u32"),
        Literal::S32 => f.write_str("s32"),
        Literal::U64 => f.write_str("u64"),
        Literal::S64 => f.write_str("s64"),
        Literal::Bool => f.write_str("bool"),
        Literal::Integral(n) => write!(f, "{n}"),
        Literal::Boolean(b) => f.write_str(if b { "true" } else { "false" }),
    }
}

fn bin_op_str(op: BinOp) -> &'static str {
    match op {
        BinOp::Eq => " == ",
        BinOp::Ne => " != ",
        BinOp::Lt => " < ",
        BinOp::Le => " <= ",
        BinOp::Gt => " > ",
        BinOp::Ge => " >= ",
        BinOp::Add => " + ",
        BinOp::Sub => " - ",
        BinOp::AndThen => " >> ",
    }
}

/// Write `expr`, parenthesized unless it is a literal, identifier, struct,
/// or union.
fn write_wrapped(f: &mut fmt::Formatter<'_>, interner: &Interner, expr: &Expr) -> fmt::Result {
    let simple = matches!(
        expr.kind,
        ExprKind::Literal(_) | ExprKind::Ident(_) | ExprKind::Struct(_) | ExprKind::Union(_)
    );
    if simple {
        write_expr(f, interner, expr)
    } else {
        f.write_str("(")?;
        write_expr(f, interner, expr)?;
        f.write_str(")")
    }
}

fn write_expr(f: &mut fmt::Formatter<'_>, interner: &Interner, expr: &Expr) -> fmt::Result {
    match &expr.kind {
        ExprKind::Literal(literal) => write_literal(f, *literal),

        ExprKind::Ident(sym) => f.write_str(interner.resolve(*sym)),

        ExprKind::BinOp { op, lhs, rhs } => {
            write_wrapped(f, interner, lhs)?;
            f.write_str(bin_op_str(*op))?;
            write_wrapped(f, interner, rhs)
        }

        ExprKind::IfThenElse {
            predicate,
            then_branch,
            else_branch,
        } => {
            f.write_str("if ")?;
            write_expr(f, interner, predicate)?;
            f.write_str(" then ")?;
            write_expr(f, interner, then_branch)?;
            f.write_str(" else ")?;
            write_expr(f, interner, else_branch)
        }

        ExprKind::FuncType { ret_type, params } => {
            write_wrapped(f, interner, ret_type)?;
            f.write_str("[")?;
            for (i, param) in params.iter().enumerate() {
                if i > 0 {
                    f.write_str(", ")?;
                }
                write_expr(f, interner, &param.ty)?;
                if let Some(name) = param.name {
                    write!(f, " {}", interner.resolve(name))?;
                }
            }
            f.write_str("]")
        }

        ExprKind::Lambda { params, body } => {
            f.write_str("\\(")?;
            for (i, param) in params.iter().enumerate() {
                if i > 0 {
                    f.write_str(", ")?;
                }
                write_expr(f, interner, &param.ty)?;
                write!(f, " {}", interner.resolve(param.name))?;
            }
            f.write_str(") -> ")?;
            write_expr(f, interner, body)
        }

        ExprKind::Call { callee, args } => {
            write_wrapped(f, interner, callee)?;
            f.write_str("(")?;
            for (i, arg) in args.iter().enumerate() {
                if i > 0 {
                    f.write_str(", ")?;
                }
                write_expr(f, interner, arg)?;
            }
            f.write_str(")")
        }

        ExprKind::Struct(fields) => {
            f.write_str("struct { ")?;
            for field in fields {
                write_expr(f, interner, &field.ty)?;
                write!(f, " {}; ", interner.resolve(field.name))?;
            }
            f.write_str("}")
        }

        ExprKind::Union(fields) => {
            f.write_str("union { ")?;
            for field in fields {
                write_expr(f, interner, &field.ty)?;
                write!(f, " {}; ", interner.resolve(field.name))?;
            }
            f.write_str("}")
        }

        ExprKind::Pack { ty, inits } => {
            f.write_str("[")?;
            write_wrapped(f, interner, ty)?;
            f.write_str("]{")?;
            for (i, init) in inits.iter().enumerate() {
                if i > 0 {
                    f.write_str(", ")?;
                }
                write!(f, ".{} = ", interner.resolve(init.name))?;
                write_expr(f, interner, &init.value)?;
            }
            f.write_str("}")
        }

        ExprKind::Member { record, field } => {
            write_wrapped(f, interner, record)?;
            write!(f, ".{}", interner.resolve(*field))
        }

        ExprKind::Pointer(inner) => {
            write_wrapped(f, interner, inner)?;
            f.write_str("*")
        }

        ExprKind::Reference(inner) => {
            f.write_str("&")?;
            write_wrapped(f, interner, inner)
        }

        ExprKind::Dereference(inner) => {
            f.write_str("*")?;
            write_wrapped(f, interner, inner)
        }

        ExprKind::Statement(statement) => {
            f.write_str("[")?;
            write_statement(f, interner, 0, statement)?;
            f.write_str("]")
        }
    }
}

fn write_indent(f: &mut fmt::Formatter<'_>, nesting: usize) -> fmt::Result {
    for _ in 0..nesting {
        f.write_str("    ")?;
    }
    Ok(())
}

fn write_statement(
    f: &mut fmt::Formatter<'_>,
    interner: &Interner,
    nesting: usize,
    statement: &Statement,
) -> fmt::Result {
    write_indent(f, nesting)?;

    match &statement.kind {
        StatementKind::Empty => f.write_str(";\n"),

        StatementKind::Expr(expr) => {
            write_expr(f, interner, expr)?;
            f.write_str(";\n")
        }

        StatementKind::Return(expr) => {
            f.write_str("return ")?;
            write_expr(f, interner, expr)?;
            f.write_str(";\n")
        }

        StatementKind::Block(block) => {
            f.write_str("{\n")?;
            write_block(f, interner, nesting + 1, block)?;
            write_indent(f, nesting)?;
            f.write_str("}\n")
        }

        StatementKind::Decl { ty, name, init } => {
            write_expr(f, interner, ty)?;
            write!(f, " {}", interner.resolve(*name))?;
            if let Some(init) = init {
                f.write_str(" = ")?;
                write_expr(f, interner, init)?;
            }
            f.write_str(";\n")
        }

        StatementKind::IfThenElse { arms, else_block } => {
            for (i, arm) in arms.iter().enumerate() {
                if i > 0 {
                    write_indent(f, nesting)?;
                    f.write_str("} else ")?;
                }
                f.write_str("if (")?;
                write_expr(f, interner, &arm.condition)?;
                f.write_str(") {\n")?;
                write_block(f, interner, nesting + 1, &arm.block)?;
            }
            write_indent(f, nesting)?;
            f.write_str("} else {\n")?;
            write_block(f, interner, nesting + 1, else_block)?;
            write_indent(f, nesting)?;
            f.write_str("}\n")
        }
    }
}

fn write_block(
    f: &mut fmt::Formatter<'_>,
    interner: &Interner,
    nesting: usize,
    block: &Block,
) -> fmt::Result {
    for statement in &block.statements {
        write_statement(f, interner, nesting, statement)?;
    }
    Ok(())
}

fn write_top_level(
    f: &mut fmt::Formatter<'_>,
    interner: &Interner,
    top_level: &TopLevel,
) -> fmt::Result {
    match &top_level.kind {
        TopLevelKind::Func(func) => {
            write_expr(f, interner, &func.ret_type)?;
            write!(f, " {}(", interner.resolve(top_level.name))?;
            for (i, param) in func.params.iter().enumerate() {
                if i > 0 {
                    f.write_str(", ")?;
                }
                write_expr(f, interner, &param.ty)?;
                if let Some(name) = param.name {
                    write!(f, " {}", interner.resolve(name))?;
                }
            }
            f.write_str(") = \n    ")?;
            write_expr(f, interner, &func.body)?;
            f.write_str(";\n")
        }
    }
}
