//! AST node definitions and core semantic operations for Tern.
//!
//! This crate defines the abstract syntax tree produced by the parser and
//! the operations the type checker is built on: structural equality, deep
//! copy, free-variable analysis, and capture-avoiding substitution.
//!
//! Tern is dependently typed, so expressions appear inside types and binders
//! appear in many constructs: function types, lambdas, dependent struct
//! fields, and block-local declarations. Every node exclusively owns its
//! children; identifiers are shared interned [`Symbol`] handles.

use tern_sym::{Symbol, SymbolSet};

mod pretty;
mod subst;

pub use pretty::{DisplayExpr, DisplayStatement, DisplayTopLevel, DisplayUnit};
pub use subst::{SubstError, subst, subst_block, subst_statement};

/// A source position at (line, column) granularity. Both are 1-based.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Loc {
    pub line: u32,
    pub column: u32,
}

impl Loc {
    pub fn new(line: u32, column: u32) -> Self {
        Self { line, column }
    }
}

// ---------------------------------------------------------------------------
// Literals
// ---------------------------------------------------------------------------

/// A literal: the universe of types, a built-in type, or a literal value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Literal {
    /// The type of types.
    Type,
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
    /// A non-negative integer literal.
    Integral(u64),
    Boolean(bool),
}

impl Literal {
    /// Is this one of the built-in integral type literals?
    pub fn is_integral_type(self) -> bool {
        matches!(
            self,
            Literal::U8
                | Literal::S8
                | Literal::U16
                | Literal::S16
                | Literal::U32
                | Literal::S32
                | Literal::U64
                | Literal::S64
        )
    }
}

// ---------------------------------------------------------------------------
// Expressions
// ---------------------------------------------------------------------------

/// A binary operator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinOp {
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
    Add,
    Sub,
    /// Sequencing: evaluate the left operand, then the right.
    AndThen,
}

/// A function-type parameter. The name is optional; an absent name does not
/// bind. A present name binds in all later parameter types and in the
/// return type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Param {
    pub ty: Expr,
    pub name: Option<Symbol>,
}

/// A lambda parameter. The name is required and binds in all later
/// parameter types and in the body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Binder {
    pub ty: Expr,
    pub name: Symbol,
}

/// A struct or union field. In a struct the name binds in all later field
/// types (dependent record); in a union field names do not bind.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Field {
    pub ty: Expr,
    pub name: Symbol,
}

/// One field assignment of a pack expression: `.name = value`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldInit {
    pub name: Symbol,
    pub value: Expr,
}

/// An expression, with an optional source location.
///
/// Equality compares the kind only: two expressions written at different
/// source positions are equal when they have the same structure. This is
/// what type equality needs — a type's identity cannot depend on where it
/// was spelled.
#[derive(Debug, Clone, Eq)]
pub struct Expr {
    pub loc: Option<Loc>,
    pub kind: ExprKind,
}

impl PartialEq for Expr {
    fn eq(&self, other: &Self) -> bool {
        self.kind == other.kind
    }
}

impl Expr {
    pub fn new(kind: ExprKind) -> Self {
        Self { loc: None, kind }
    }

    pub fn at(kind: ExprKind, loc: Loc) -> Self {
        Self {
            loc: Some(loc),
            kind,
        }
    }

    pub fn literal(lit: Literal) -> Self {
        Self::new(ExprKind::Literal(lit))
    }

    pub fn ident(sym: Symbol) -> Self {
        Self::new(ExprKind::Ident(sym))
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExprKind {
    Literal(Literal),

    /// An identifier occurrence.
    Ident(Symbol),

    BinOp {
        op: BinOp,
        lhs: Box<Expr>,
        rhs: Box<Expr>,
    },

    /// Expression-level conditional: `if p then t else e`.
    IfThenElse {
        predicate: Box<Expr>,
        then_branch: Box<Expr>,
        else_branch: Box<Expr>,
    },

    /// A (dependent) function type: `Ret[P0 n0, P1 n1, ...]`.
    FuncType {
        ret_type: Box<Expr>,
        params: Vec<Param>,
    },

    /// A lambda: `\(T0 x0, T1 x1, ...) -> body`.
    Lambda {
        params: Vec<Binder>,
        body: Box<Expr>,
    },

    Call {
        callee: Box<Expr>,
        args: Vec<Expr>,
    },

    /// A dependent record type: later field types may mention earlier
    /// field names.
    Struct(Vec<Field>),

    /// A union type. Field names do not bind.
    Union(Vec<Field>),

    /// A record constructor: `[type]{.f0 = e0, .f1 = e1, ...}`.
    Pack {
        ty: Box<Expr>,
        inits: Vec<FieldInit>,
    },

    /// Field projection: `record.field`.
    Member {
        record: Box<Expr>,
        field: Symbol,
    },

    /// The pointer type constructor: `inner*`.
    Pointer(Box<Expr>),

    /// Address-of: `&inner`.
    Reference(Box<Expr>),

    /// Pointer dereference: `*inner`.
    Dereference(Box<Expr>),

    /// A statement in expression position. Introduces the statement's
    /// binders to the surrounding term.
    Statement(Box<Statement>),
}

// ---------------------------------------------------------------------------
// Statements
// ---------------------------------------------------------------------------

/// A statement, with an optional source location.
///
/// As with [`Expr`], equality ignores the location.
#[derive(Debug, Clone, Eq)]
pub struct Statement {
    pub loc: Option<Loc>,
    pub kind: StatementKind,
}

impl PartialEq for Statement {
    fn eq(&self, other: &Self) -> bool {
        self.kind == other.kind
    }
}

impl Statement {
    pub fn new(kind: StatementKind) -> Self {
        Self { loc: None, kind }
    }

    pub fn at(kind: StatementKind, loc: Loc) -> Self {
        Self {
            loc: Some(loc),
            kind,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StatementKind {
    Empty,

    Expr(Expr),

    Return(Expr),

    Block(Block),

    /// A declaration: `type name;` or `type name = value;`. The declared
    /// name binds the *later* statements of the enclosing block, not its
    /// own initializer.
    Decl {
        ty: Expr,
        name: Symbol,
        init: Option<Expr>,
    },

    /// `if (c0) { .. } else if (c1) { .. } ... else { .. }`. The else block
    /// is always present; an absent surface `else` is an empty block.
    IfThenElse {
        arms: Vec<IfArm>,
        else_block: Block,
    },
}

/// One `if`/`else if` arm of a statement conditional.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IfArm {
    pub condition: Expr,
    pub block: Block,
}

/// An ordered sequence of statements.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Block {
    pub statements: Vec<Statement>,
}

impl Block {
    pub fn new(statements: Vec<Statement>) -> Self {
        Self { statements }
    }
}

// ---------------------------------------------------------------------------
// Top-level definitions
// ---------------------------------------------------------------------------

/// A top-level definition.
#[derive(Debug, Clone, Eq)]
pub struct TopLevel {
    pub loc: Option<Loc>,
    pub name: Symbol,
    pub kind: TopLevelKind,
}

impl PartialEq for TopLevel {
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name && self.kind == other.kind
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TopLevelKind {
    Func(FuncDef),
}

/// A top-level function: `Ret name(P0 n0, ...) { ... }`. The body is an
/// expression whose top level is typically a statement.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FuncDef {
    pub ret_type: Expr,
    pub params: Vec<Param>,
    pub body: Expr,
}

/// A complete source file.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TranslationUnit {
    pub top_levels: Vec<TopLevel>,
}

// ---------------------------------------------------------------------------
// Free variable analysis
// ---------------------------------------------------------------------------

/// Compute the set of identifiers that occur free in `expr`.
///
/// Each binder's scope is honored: function-type and lambda parameters bind
/// in later parameter types and in the return type / body, struct field
/// names bind in later field types, and block declarations bind the later
/// statements of their block (but not their own initializer).
pub fn free_vars(expr: &Expr) -> SymbolSet {
    let mut free = SymbolSet::new();
    collect_expr(expr, &mut free);
    free
}

/// Free variables of a statement. A declaration's own name is not
/// subtracted here — it scopes in the enclosing block.
pub fn statement_free_vars(statement: &Statement) -> SymbolSet {
    let mut free = SymbolSet::new();
    collect_statement(statement, &mut free);
    free
}

/// Free variables of a block: a right-to-left fold in which each
/// declaration binds everything after it.
pub fn block_free_vars(block: &Block) -> SymbolSet {
    let mut free = SymbolSet::new();
    for statement in block.statements.iter().rev() {
        if let StatementKind::Decl { name, .. } = &statement.kind {
            free.remove(*name);
        }
        collect_statement(statement, &mut free);
    }
    free
}

fn collect_expr(expr: &Expr, free: &mut SymbolSet) {
    match &expr.kind {
        ExprKind::Literal(_) => {}

        ExprKind::Ident(sym) => {
            free.insert(*sym);
        }

        ExprKind::BinOp { lhs, rhs, .. } => {
            collect_expr(lhs, free);
            collect_expr(rhs, free);
        }

        ExprKind::IfThenElse {
            predicate,
            then_branch,
            else_branch,
        } => {
            collect_expr(predicate, free);
            collect_expr(then_branch, free);
            collect_expr(else_branch, free);
        }

        ExprKind::FuncType { ret_type, params } => {
            let mut ret = free_vars(ret_type);
            for param in params {
                if let Some(name) = param.name {
                    ret.remove(name);
                }
            }
            free.extend(ret);
            for (i, param) in params.iter().enumerate() {
                let mut ty = free_vars(&param.ty);
                for earlier in &params[..i] {
                    if let Some(name) = earlier.name {
                        ty.remove(name);
                    }
                }
                free.extend(ty);
            }
        }

        ExprKind::Lambda { params, body } => {
            let mut inner = free_vars(body);
            for param in params {
                inner.remove(param.name);
            }
            free.extend(inner);
            for (i, param) in params.iter().enumerate() {
                let mut ty = free_vars(&param.ty);
                for earlier in &params[..i] {
                    ty.remove(earlier.name);
                }
                free.extend(ty);
            }
        }

        ExprKind::Call { callee, args } => {
            collect_expr(callee, free);
            for arg in args {
                collect_expr(arg, free);
            }
        }

        ExprKind::Struct(fields) => {
            for (i, field) in fields.iter().enumerate() {
                let mut ty = free_vars(&field.ty);
                for earlier in &fields[..i] {
                    ty.remove(earlier.name);
                }
                free.extend(ty);
            }
        }

        ExprKind::Union(fields) => {
            for field in fields {
                collect_expr(&field.ty, free);
            }
        }

        ExprKind::Pack { ty, inits } => {
            // Assignments are not in the field-name scope.
            collect_expr(ty, free);
            for init in inits {
                collect_expr(&init.value, free);
            }
        }

        ExprKind::Member { record, .. } => {
            collect_expr(record, free);
        }

        ExprKind::Pointer(inner) | ExprKind::Reference(inner) | ExprKind::Dereference(inner) => {
            collect_expr(inner, free);
        }

        ExprKind::Statement(statement) => {
            collect_statement(statement, free);
        }
    }
}

fn collect_statement(statement: &Statement, free: &mut SymbolSet) {
    match &statement.kind {
        StatementKind::Empty => {}

        StatementKind::Expr(expr) | StatementKind::Return(expr) => {
            collect_expr(expr, free);
        }

        StatementKind::Block(block) => {
            free.extend(block_free_vars(block));
        }

        StatementKind::Decl { ty, init, .. } => {
            collect_expr(ty, free);
            if let Some(init) = init {
                collect_expr(init, free);
            }
        }

        StatementKind::IfThenElse { arms, else_block } => {
            for arm in arms {
                collect_expr(&arm.condition, free);
                free.extend(block_free_vars(&arm.block));
            }
            free.extend(block_free_vars(else_block));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tern_sym::Interner;

    fn lit(l: Literal) -> Expr {
        Expr::literal(l)
    }

    fn ident(sym: Symbol) -> Expr {
        Expr::ident(sym)
    }

    fn bin(op: BinOp, lhs: Expr, rhs: Expr) -> Expr {
        Expr::new(ExprKind::BinOp {
            op,
            lhs: Box::new(lhs),
            rhs: Box::new(rhs),
        })
    }

    fn lambda(params: Vec<Binder>, body: Expr) -> Expr {
        Expr::new(ExprKind::Lambda {
            params,
            body: Box::new(body),
        })
    }

    fn call(callee: Expr, args: Vec<Expr>) -> Expr {
        Expr::new(ExprKind::Call {
            callee: Box::new(callee),
            args,
        })
    }

    fn set(syms: &[Symbol]) -> SymbolSet {
        syms.iter().copied().collect()
    }

    #[test]
    fn equality_ignores_locations() {
        let mut interner = Interner::new();
        let x = interner.intern("x");
        let a = Expr::at(ExprKind::Ident(x), Loc::new(1, 1));
        let b = Expr::at(ExprKind::Ident(x), Loc::new(7, 40));
        assert_eq!(a, b);
    }

    #[test]
    fn equality_compares_operators() {
        let a = bin(BinOp::Add, lit(Literal::Integral(1)), lit(Literal::Integral(2)));
        let b = bin(BinOp::Sub, lit(Literal::Integral(1)), lit(Literal::Integral(2)));
        assert_eq!(a, a.clone());
        assert_ne!(a, b);
    }

    #[test]
    fn equality_distinguishes_literal_payloads() {
        assert_eq!(lit(Literal::Integral(42)), lit(Literal::Integral(42)));
        assert_ne!(lit(Literal::Integral(42)), lit(Literal::Integral(43)));
        assert_ne!(lit(Literal::Boolean(true)), lit(Literal::Boolean(false)));
        assert_ne!(lit(Literal::U8), lit(Literal::S8));
    }

    #[test]
    fn equality_over_statement_expressions_is_structural() {
        let mut interner = Interner::new();
        let x = interner.intern("x");
        let stmt = |loc| {
            Expr::new(ExprKind::Statement(Box::new(Statement::at(
                StatementKind::Return(ident(x)),
                loc,
            ))))
        };
        assert_eq!(stmt(Loc::new(1, 1)), stmt(Loc::new(2, 9)));

        let other = Expr::new(ExprKind::Statement(Box::new(Statement::new(
            StatementKind::Expr(ident(x)),
        ))));
        assert_ne!(stmt(Loc::new(1, 1)), other);
    }

    #[test]
    fn clone_is_independent() {
        let mut interner = Interner::new();
        let x = interner.intern("x");
        let original = call(ident(x), vec![lit(Literal::Integral(1))]);
        let mut copy = original.clone();
        assert_eq!(copy, original);

        if let ExprKind::Call { args, .. } = &mut copy.kind {
            args[0] = lit(Literal::Integral(2));
        }
        assert_ne!(copy, original);
        if let ExprKind::Call { args, .. } = &original.kind {
            assert_eq!(args[0], lit(Literal::Integral(1)));
        }
    }

    #[test]
    fn free_vars_of_literal_and_ident() {
        let mut interner = Interner::new();
        let x = interner.intern("x");
        assert!(free_vars(&lit(Literal::U8)).is_empty());
        assert_eq!(free_vars(&ident(x)), SymbolSet::singleton(x));
    }

    #[test]
    fn lambda_binds_its_parameters() {
        let mut interner = Interner::new();
        let x = interner.intern("x");
        let y = interner.intern("y");
        // \(u8 x) -> x + y
        let body = bin(BinOp::Add, ident(x), ident(y));
        let lam = lambda(
            vec![Binder {
                ty: lit(Literal::U8),
                name: x,
            }],
            body,
        );
        assert_eq!(free_vars(&lam), SymbolSet::singleton(y));
    }

    #[test]
    fn lambda_parameter_types_see_earlier_parameters_only() {
        let mut interner = Interner::new();
        let t = interner.intern("t");
        let u = interner.intern("u");
        // \(type t, t u) -> u : the second parameter's type mentions t,
        // which the first parameter binds.
        let lam = lambda(
            vec![
                Binder {
                    ty: lit(Literal::Type),
                    name: t,
                },
                Binder {
                    ty: ident(t),
                    name: u,
                },
            ],
            ident(u),
        );
        assert!(free_vars(&lam).is_empty());

        // Flipping the parameter order leaves t free in the first type.
        let flipped = lambda(
            vec![
                Binder {
                    ty: ident(t),
                    name: u,
                },
                Binder {
                    ty: lit(Literal::Type),
                    name: t,
                },
            ],
            ident(u),
        );
        assert_eq!(free_vars(&flipped), SymbolSet::singleton(t));
    }

    #[test]
    fn func_type_absent_names_do_not_bind() {
        let mut interner = Interner::new();
        let n = interner.intern("n");
        // u8[u32 n, n] : the named parameter binds in the later type and in
        // nothing else; an unnamed parameter binds nowhere.
        let func = Expr::new(ExprKind::FuncType {
            ret_type: Box::new(ident(n)),
            params: vec![
                Param {
                    ty: lit(Literal::U32),
                    name: Some(n),
                },
                Param {
                    ty: ident(n),
                    name: None,
                },
            ],
        });
        assert!(free_vars(&func).is_empty());
    }

    #[test]
    fn dependent_struct_field_names_do_not_escape() {
        let mut interner = Interner::new();
        let n = interner.intern("n");
        let data = interner.intern("data");
        let array = interner.intern("array");
        let t = interner.intern("T");
        // struct { u32 n; array(T, n) data; }
        let s = Expr::new(ExprKind::Struct(vec![
            Field {
                ty: lit(Literal::U32),
                name: n,
            },
            Field {
                ty: call(ident(array), vec![ident(t), ident(n)]),
                name: data,
            },
        ]));
        assert_eq!(free_vars(&s), set(&[array, t]));
    }

    #[test]
    fn union_field_names_do_not_bind() {
        let mut interner = Interner::new();
        let a = interner.intern("a");
        let b = interner.intern("b");
        let u = Expr::new(ExprKind::Union(vec![
            Field {
                ty: ident(a),
                name: b,
            },
            Field {
                ty: ident(b),
                name: a,
            },
        ]));
        assert_eq!(free_vars(&u), set(&[a, b]));
    }

    #[test]
    fn pack_assignments_are_not_in_field_scope() {
        let mut interner = Interner::new();
        let pair = interner.intern("pair");
        let fst = interner.intern("fst");
        let x = interner.intern("x");
        // [pair]{.fst = x}
        let pack = Expr::new(ExprKind::Pack {
            ty: Box::new(ident(pair)),
            inits: vec![FieldInit {
                name: fst,
                value: ident(x),
            }],
        });
        assert_eq!(free_vars(&pack), set(&[pair, x]));
    }

    #[test]
    fn block_declarations_bind_later_statements_only() {
        let mut interner = Interner::new();
        let x = interner.intern("x");
        let y = interner.intern("y");
        let z = interner.intern("z");
        // { u8 x = y; x + z; }
        let block = Block::new(vec![
            Statement::new(StatementKind::Decl {
                ty: lit(Literal::U8),
                name: x,
                init: Some(ident(y)),
            }),
            Statement::new(StatementKind::Expr(bin(BinOp::Add, ident(x), ident(z)))),
        ]);
        assert_eq!(block_free_vars(&block), set(&[y, z]));
    }

    #[test]
    fn declaration_does_not_bind_its_own_initializer() {
        let mut interner = Interner::new();
        let x = interner.intern("x");
        // { u8 x = x; } : the initializer's x is free (it refers to an
        // outer x, not the one being declared).
        let block = Block::new(vec![Statement::new(StatementKind::Decl {
            ty: lit(Literal::U8),
            name: x,
            init: Some(ident(x)),
        })]);
        assert_eq!(block_free_vars(&block), SymbolSet::singleton(x));
    }

    #[test]
    fn statement_if_arms_contribute_once() {
        let mut interner = Interner::new();
        let c = interner.intern("c");
        let a = interner.intern("a");
        let b = interner.intern("b");
        let stmt = Statement::new(StatementKind::IfThenElse {
            arms: vec![IfArm {
                condition: ident(c),
                block: Block::new(vec![Statement::new(StatementKind::Expr(ident(a)))]),
            }],
            else_block: Block::new(vec![Statement::new(StatementKind::Expr(ident(b)))]),
        });
        assert_eq!(statement_free_vars(&stmt), set(&[c, a, b]));
    }

    #[test]
    fn nested_block_scope_does_not_leak() {
        let mut interner = Interner::new();
        let x = interner.intern("x");
        // { { u8 x; x; } x; } : the inner declaration binds the inner x
        // only; the trailing x is free.
        let inner = Block::new(vec![
            Statement::new(StatementKind::Decl {
                ty: lit(Literal::U8),
                name: x,
                init: None,
            }),
            Statement::new(StatementKind::Expr(ident(x))),
        ]);
        let outer = Block::new(vec![
            Statement::new(StatementKind::Block(inner)),
            Statement::new(StatementKind::Expr(ident(x))),
        ]);
        assert_eq!(block_free_vars(&outer), SymbolSet::singleton(x));
    }
}
