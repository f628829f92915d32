//! Capture-avoiding substitution over expressions, statements, and blocks.
//!
//! [`subst`] replaces every free occurrence of a symbol inside a term with a
//! deep copy of a replacement expression, α-renaming any intervening binder
//! that would otherwise capture a free variable of the replacement. Function
//! type parameters, lambda parameters, and block declarations are renamed
//! via [`Interner::fresh`]; record field names are part of a type's public
//! interface and are never renamed — capture on a field name is a refusal.
//!
//! The term is mutated in place. On failure, already-performed mutations are
//! left behind and the caller must treat the term as semantically undefined.

use tern_sym::{Interner, Symbol, SymbolSet};

use crate::{Block, Expr, ExprKind, Statement, StatementKind, free_vars, statement_free_vars};

/// Substitution failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum SubstError {
    /// A struct or pack field name occurs free in the replacement. Renaming
    /// the field would change the type's identity, so the operation refuses.
    #[error("substitution would capture a record field name")]
    FieldCapture { field: Symbol },
}

/// Replace every free occurrence of `name` in `expr` with a copy of
/// `replacement`, renaming binders as needed.
///
/// `replacement` is not consumed or mutated. Substituting under a binder
/// whose name equals `name` is not an error: occurrences below it are bound,
/// so the walk stops there silently.
pub fn subst(
    interner: &mut Interner,
    expr: &mut Expr,
    name: Symbol,
    replacement: &Expr,
) -> Result<(), SubstError> {
    // A binder form in which `name` has no free occurrence is left alone:
    // nothing would be inserted below it, so no shadowing or capture can
    // matter, and field-name checks must not fire spuriously.
    let binds = matches!(
        expr.kind,
        ExprKind::FuncType { .. }
            | ExprKind::Lambda { .. }
            | ExprKind::Struct(_)
            | ExprKind::Pack { .. }
    );
    if binds && !free_vars(expr).contains(name) {
        return Ok(());
    }

    match &mut expr.kind {
        ExprKind::Literal(_) => Ok(()),

        ExprKind::Ident(sym) => {
            if *sym == name {
                *expr = replacement.clone();
            }
            Ok(())
        }

        ExprKind::BinOp { lhs, rhs, .. } => {
            subst(interner, lhs, name, replacement)?;
            subst(interner, rhs, name, replacement)
        }

        ExprKind::IfThenElse {
            predicate,
            then_branch,
            else_branch,
        } => {
            subst(interner, predicate, name, replacement)?;
            subst(interner, then_branch, name, replacement)?;
            subst(interner, else_branch, name, replacement)
        }

        ExprKind::FuncType { ret_type, params } => {
            let free_in_replacement = free_vars(replacement);
            for i in 0..params.len() {
                subst(interner, &mut params[i].ty, name, replacement)?;
                let Some(param_name) = params[i].name else {
                    continue;
                };
                if param_name == name {
                    // Shadowed: later parameter types and the return type
                    // cannot contain free occurrences of `name`.
                    return Ok(());
                }
                if free_in_replacement.contains(param_name) {
                    let fresh = interner.fresh(param_name);
                    params[i].name = Some(fresh);
                    let fresh_ident = Expr::ident(fresh);
                    for later in params[i + 1..].iter_mut() {
                        subst(interner, &mut later.ty, param_name, &fresh_ident)?;
                    }
                    subst(interner, ret_type, param_name, &fresh_ident)?;
                }
            }
            subst(interner, ret_type, name, replacement)
        }

        ExprKind::Lambda { params, body } => {
            let free_in_replacement = free_vars(replacement);
            for i in 0..params.len() {
                subst(interner, &mut params[i].ty, name, replacement)?;
                let param_name = params[i].name;
                if param_name == name {
                    return Ok(());
                }
                if free_in_replacement.contains(param_name) {
                    let fresh = interner.fresh(param_name);
                    params[i].name = fresh;
                    let fresh_ident = Expr::ident(fresh);
                    for later in params[i + 1..].iter_mut() {
                        subst(interner, &mut later.ty, param_name, &fresh_ident)?;
                    }
                    subst(interner, body, param_name, &fresh_ident)?;
                }
            }
            subst(interner, body, name, replacement)
        }

        ExprKind::Call { callee, args } => {
            subst(interner, callee, name, replacement)?;
            for arg in args {
                subst(interner, arg, name, replacement)?;
            }
            Ok(())
        }

        ExprKind::Struct(fields) => {
            let free_in_replacement = free_vars(replacement);
            for field in fields.iter_mut() {
                subst(interner, &mut field.ty, name, replacement)?;
                if field.name == name {
                    return Ok(());
                }
                if free_in_replacement.contains(field.name) {
                    return Err(SubstError::FieldCapture { field: field.name });
                }
            }
            Ok(())
        }

        ExprKind::Union(fields) => {
            // Union field names do not bind.
            for field in fields {
                subst(interner, &mut field.ty, name, replacement)?;
            }
            Ok(())
        }

        ExprKind::Pack { ty, inits } => {
            subst(interner, ty, name, replacement)?;
            let free_in_replacement = free_vars(replacement);
            for init in inits.iter_mut() {
                subst(interner, &mut init.value, name, replacement)?;
                if init.name == name {
                    return Ok(());
                }
                if free_in_replacement.contains(init.name) {
                    return Err(SubstError::FieldCapture { field: init.name });
                }
            }
            Ok(())
        }

        ExprKind::Member { record, .. } => subst(interner, record, name, replacement),

        ExprKind::Pointer(inner) | ExprKind::Reference(inner) | ExprKind::Dereference(inner) => {
            subst(interner, inner, name, replacement)
        }

        ExprKind::Statement(statement) => subst_statement(interner, statement, name, replacement),
    }
}

/// Substitute into a statement. The binding effect of a declaration applies
/// to the later statements of its enclosing block, which is handled by
/// [`subst_block`]; on a lone statement a declaration only has its type and
/// initializer rewritten.
pub fn subst_statement(
    interner: &mut Interner,
    statement: &mut Statement,
    name: Symbol,
    replacement: &Expr,
) -> Result<(), SubstError> {
    match &mut statement.kind {
        StatementKind::Empty => Ok(()),

        StatementKind::Expr(expr) | StatementKind::Return(expr) => {
            subst(interner, expr, name, replacement)
        }

        StatementKind::Block(block) => subst_block(interner, block, name, replacement),

        StatementKind::Decl { ty, init, .. } => {
            subst(interner, ty, name, replacement)?;
            match init {
                Some(init) => subst(interner, init, name, replacement),
                None => Ok(()),
            }
        }

        StatementKind::IfThenElse { arms, else_block } => {
            for arm in arms {
                subst(interner, &mut arm.condition, name, replacement)?;
                subst_block(interner, &mut arm.block, name, replacement)?;
            }
            subst_block(interner, else_block, name, replacement)
        }
    }
}

/// Substitute into a block, honoring declaration scope: a declaration whose
/// name equals `name` shadows the rest of the block, and a declaration
/// whose name occurs free in the replacement is α-renamed together with the
/// statements it governs.
pub fn subst_block(
    interner: &mut Interner,
    block: &mut Block,
    name: Symbol,
    replacement: &Expr,
) -> Result<(), SubstError> {
    subst_statements(interner, &mut block.statements, name, replacement)
}

fn subst_statements(
    interner: &mut Interner,
    statements: &mut [Statement],
    name: Symbol,
    replacement: &Expr,
) -> Result<(), SubstError> {
    let free_in_replacement = free_vars(replacement);
    for i in 0..statements.len() {
        // Once no free occurrence remains from here on, the remaining
        // declarations are left alone — renaming them would churn names
        // with nothing to protect.
        if !statements_free_vars(&statements[i..]).contains(name) {
            return Ok(());
        }

        // The declaration's own type and initializer first: a declaration
        // does not bind its own right-hand side.
        subst_statement(interner, &mut statements[i], name, replacement)?;

        let decl_name = match &statements[i].kind {
            StatementKind::Decl {
                name: decl_name, ..
            } => *decl_name,
            _ => continue,
        };
        if decl_name == name {
            // Shadowed: the rest of the block cannot contain free
            // occurrences of `name`.
            return Ok(());
        }
        if free_in_replacement.contains(decl_name)
            && statements_free_vars(&statements[i + 1..]).contains(name)
        {
            let fresh = interner.fresh(decl_name);
            if let StatementKind::Decl { name: slot, .. } = &mut statements[i].kind {
                *slot = fresh;
            }
            let fresh_ident = Expr::ident(fresh);
            subst_statements(interner, &mut statements[i + 1..], decl_name, &fresh_ident)?;
        }
    }
    Ok(())
}

/// Free variables of a statement suffix, with the same right-to-left
/// declaration fold as [`block_free_vars`].
fn statements_free_vars(statements: &[Statement]) -> SymbolSet {
    let mut free = SymbolSet::new();
    for statement in statements.iter().rev() {
        if let StatementKind::Decl { name, .. } = &statement.kind {
            free.remove(*name);
        }
        free.extend(statement_free_vars(statement));
    }
    free
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Binder, Field, FieldInit, Literal, Param};
    use tern_sym::Interner;

    fn lit(l: Literal) -> Expr {
        Expr::literal(l)
    }

    fn ident(sym: Symbol) -> Expr {
        Expr::ident(sym)
    }

    fn int(n: u64) -> Expr {
        lit(Literal::Integral(n))
    }

    fn add(lhs: Expr, rhs: Expr) -> Expr {
        Expr::new(ExprKind::BinOp {
            op: crate::BinOp::Add,
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

    fn decl(ty: Expr, name: Symbol, init: Option<Expr>) -> Statement {
        Statement::new(StatementKind::Decl { ty, name, init })
    }

    fn expr_stmt(expr: Expr) -> Statement {
        Statement::new(StatementKind::Expr(expr))
    }

    #[test]
    fn shadowed_parameter_is_untouched() {
        let mut interner = Interner::new();
        let x = interner.intern("x");
        // subst(\(u8 x) -> x, x, 42) leaves the term unchanged.
        let mut term = lambda(
            vec![Binder {
                ty: lit(Literal::U8),
                name: x,
            }],
            ident(x),
        );
        let original = term.clone();
        subst(&mut interner, &mut term, x, &int(42)).unwrap();
        assert_eq!(term, original);
    }

    #[test]
    fn plain_substitution_in_lambda_body() {
        let mut interner = Interner::new();
        let x = interner.intern("x");
        let y = interner.intern("y");
        // subst(\(u8 y) -> x, x, 42) = \(u8 y) -> 42
        let mut term = lambda(
            vec![Binder {
                ty: lit(Literal::U8),
                name: y,
            }],
            ident(x),
        );
        subst(&mut interner, &mut term, x, &int(42)).unwrap();
        let expected = lambda(
            vec![Binder {
                ty: lit(Literal::U8),
                name: y,
            }],
            int(42),
        );
        assert_eq!(term, expected);
    }

    #[test]
    fn capture_is_avoided_by_renaming() {
        let mut interner = Interner::new();
        let x = interner.intern("x");
        let y = interner.intern("y");
        // subst(\(u8 y) -> x, x, y) = \(u8 y') -> y for fresh y'.
        let mut term = lambda(
            vec![Binder {
                ty: lit(Literal::U8),
                name: y,
            }],
            ident(x),
        );
        subst(&mut interner, &mut term, x, &ident(y)).unwrap();

        let ExprKind::Lambda { params, body } = &term.kind else {
            panic!("still a lambda");
        };
        assert_eq!(params.len(), 1);
        assert_eq!(params[0].ty, lit(Literal::U8), "parameter type preserved");
        assert_ne!(params[0].name, y, "parameter was renamed");
        assert_eq!(**body, ident(y), "the inserted y stays free");
    }

    #[test]
    fn renaming_rewrites_later_parameter_types_and_body() {
        let mut interner = Interner::new();
        let x = interner.intern("x");
        let y = interner.intern("y");
        let z = interner.intern("z");
        // subst(\(u8 y, y z) -> x + y, x, y): y is renamed to a fresh y',
        // the second parameter's type follows the rename, and the body's
        // bound occurrence follows it too while the inserted y stays free.
        let mut term = lambda(
            vec![
                Binder {
                    ty: lit(Literal::U8),
                    name: y,
                },
                Binder {
                    ty: ident(y),
                    name: z,
                },
            ],
            add(ident(x), ident(y)),
        );
        subst(&mut interner, &mut term, x, &ident(y)).unwrap();

        let ExprKind::Lambda { params, body } = &term.kind else {
            panic!("still a lambda");
        };
        let fresh = params[0].name;
        assert_ne!(fresh, y);
        assert_eq!(params[1].ty, ident(fresh));
        assert_eq!(**body, add(ident(y), ident(fresh)));
    }

    #[test]
    fn func_type_shadowing_stops_the_walk() {
        let mut interner = Interner::new();
        let n = interner.intern("n");
        // subst(n[u32 n, n], n, 42): the return type and the second
        // parameter type are governed by the binder, so only free
        // occurrences before it change — here there are none.
        let mut term = Expr::new(ExprKind::FuncType {
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
        let original = term.clone();
        subst(&mut interner, &mut term, n, &int(42)).unwrap();
        assert_eq!(term, original);
    }

    #[test]
    fn func_type_substitutes_through_unnamed_parameters() {
        let mut interner = Interner::new();
        let t = interner.intern("t");
        // subst(t[t], t, u8) = u8[u8]
        let mut term = Expr::new(ExprKind::FuncType {
            ret_type: Box::new(ident(t)),
            params: vec![Param {
                ty: ident(t),
                name: None,
            }],
        });
        subst(&mut interner, &mut term, t, &lit(Literal::U8)).unwrap();
        let expected = Expr::new(ExprKind::FuncType {
            ret_type: Box::new(lit(Literal::U8)),
            params: vec![Param {
                ty: lit(Literal::U8),
                name: None,
            }],
        });
        assert_eq!(term, expected);
    }

    #[test]
    fn struct_field_shadowing_stops_early() {
        let mut interner = Interner::new();
        let n = interner.intern("n");
        let m = interner.intern("m");
        // subst(struct { n m; u8 n; n q; }, n, u8): the first field's type
        // is rewritten, the second field's name shadows the rest.
        let q = interner.intern("q");
        let mut term = Expr::new(ExprKind::Struct(vec![
            Field {
                ty: ident(n),
                name: m,
            },
            Field {
                ty: lit(Literal::U8),
                name: n,
            },
            Field {
                ty: ident(n),
                name: q,
            },
        ]));
        subst(&mut interner, &mut term, n, &lit(Literal::U8)).unwrap();
        let expected = Expr::new(ExprKind::Struct(vec![
            Field {
                ty: lit(Literal::U8),
                name: m,
            },
            Field {
                ty: lit(Literal::U8),
                name: n,
            },
            Field {
                ty: ident(n),
                name: q,
            },
        ]));
        assert_eq!(term, expected);
    }

    #[test]
    fn struct_field_capture_is_refused() {
        let mut interner = Interner::new();
        let t = interner.intern("t");
        let n = interner.intern("n");
        let m = interner.intern("m");
        // subst(struct { u8 n; t m; }, t, n): inserting n under the field
        // binder n would capture it, and field names cannot be renamed.
        let mut term = Expr::new(ExprKind::Struct(vec![
            Field {
                ty: lit(Literal::U8),
                name: n,
            },
            Field {
                ty: ident(t),
                name: m,
            },
        ]));
        let err = subst(&mut interner, &mut term, t, &ident(n)).unwrap_err();
        assert_eq!(err, SubstError::FieldCapture { field: n });
    }

    #[test]
    fn union_fields_neither_bind_nor_capture() {
        let mut interner = Interner::new();
        let t = interner.intern("t");
        let n = interner.intern("n");
        // subst(union { t n; }, t, n) = union { n n; }
        let mut term = Expr::new(ExprKind::Union(vec![Field {
            ty: ident(t),
            name: n,
        }]));
        subst(&mut interner, &mut term, t, &ident(n)).unwrap();
        let expected = Expr::new(ExprKind::Union(vec![Field {
            ty: ident(n),
            name: n,
        }]));
        assert_eq!(term, expected);
    }

    #[test]
    fn pack_substitutes_type_and_assignments() {
        let mut interner = Interner::new();
        let t = interner.intern("t");
        let f = interner.intern("f");
        // subst([t]{.f = t}, t, u8) = [u8]{.f = u8}
        let mut term = Expr::new(ExprKind::Pack {
            ty: Box::new(ident(t)),
            inits: vec![FieldInit {
                name: f,
                value: ident(t),
            }],
        });
        subst(&mut interner, &mut term, t, &lit(Literal::U8)).unwrap();
        let expected = Expr::new(ExprKind::Pack {
            ty: Box::new(lit(Literal::U8)),
            inits: vec![FieldInit {
                name: f,
                value: lit(Literal::U8),
            }],
        });
        assert_eq!(term, expected);
    }

    #[test]
    fn pack_field_capture_is_refused() {
        let mut interner = Interner::new();
        let t = interner.intern("t");
        let f = interner.intern("f");
        let g = interner.intern("g");
        let mut term = Expr::new(ExprKind::Pack {
            ty: Box::new(lit(Literal::U8)),
            inits: vec![
                FieldInit {
                    name: f,
                    value: int(0),
                },
                FieldInit {
                    name: g,
                    value: ident(t),
                },
            ],
        });
        let err = subst(&mut interner, &mut term, t, &ident(f)).unwrap_err();
        assert_eq!(err, SubstError::FieldCapture { field: f });
    }

    #[test]
    fn block_declaration_shadows_later_statements() {
        let mut interner = Interner::new();
        let x = interner.intern("x");
        // subst({ u8 x = x; x; }, x, 42): the initializer's x is free and
        // is replaced; the trailing x is bound by the declaration.
        let mut block = Block::new(vec![
            decl(lit(Literal::U8), x, Some(ident(x))),
            expr_stmt(ident(x)),
        ]);
        subst_block(&mut interner, &mut block, x, &int(42)).unwrap();
        let expected = Block::new(vec![
            decl(lit(Literal::U8), x, Some(int(42))),
            expr_stmt(ident(x)),
        ]);
        assert_eq!(block, expected);
    }

    #[test]
    fn block_declaration_is_renamed_to_avoid_capture() {
        let mut interner = Interner::new();
        let x = interner.intern("x");
        let y = interner.intern("y");
        // subst({ u8 y = 1; x + y; }, x, y): the declaration would capture
        // the inserted y, so it is renamed and the tail follows.
        let mut block = Block::new(vec![
            decl(lit(Literal::U8), y, Some(int(1))),
            expr_stmt(add(ident(x), ident(y))),
        ]);
        subst_block(&mut interner, &mut block, x, &ident(y)).unwrap();

        let StatementKind::Decl { name: fresh, .. } = block.statements[0].kind else {
            panic!("first statement is still a declaration");
        };
        assert_ne!(fresh, y);
        assert_eq!(
            block.statements[1],
            expr_stmt(add(ident(y), ident(fresh))),
            "the inserted y stays free; the bound occurrence follows the rename"
        );
    }

    #[test]
    fn block_rename_respects_inner_shadowing() {
        let mut interner = Interner::new();
        let x = interner.intern("x");
        let y = interner.intern("y");
        // { u8 y = 1; x; u8 y = 2; y; } with x := y: the first declaration
        // is renamed for the capture at `x`, but the second declaration
        // re-binds y, so the final occurrence is untouched.
        let mut block = Block::new(vec![
            decl(lit(Literal::U8), y, Some(int(1))),
            expr_stmt(ident(x)),
            decl(lit(Literal::U8), y, Some(int(2))),
            expr_stmt(ident(y)),
        ]);
        subst_block(&mut interner, &mut block, x, &ident(y)).unwrap();

        let StatementKind::Decl { name: fresh, .. } = block.statements[0].kind else {
            panic!("first statement is still a declaration");
        };
        assert_ne!(fresh, y);
        assert_eq!(block.statements[1], expr_stmt(ident(y)));
        let StatementKind::Decl { name: second, .. } = block.statements[2].kind else {
            panic!("third statement is still a declaration");
        };
        assert_eq!(second, y, "the inner re-binding keeps its name");
        assert_eq!(block.statements[3], expr_stmt(ident(y)));
    }

    #[test]
    fn statement_conditionals_substitute_every_arm_once() {
        let mut interner = Interner::new();
        let x = interner.intern("x");
        let mut stmt = Statement::new(StatementKind::IfThenElse {
            arms: vec![crate::IfArm {
                condition: ident(x),
                block: Block::new(vec![expr_stmt(ident(x))]),
            }],
            else_block: Block::new(vec![expr_stmt(ident(x))]),
        });
        subst_statement(&mut interner, &mut stmt, x, &int(1)).unwrap();
        let expected = Statement::new(StatementKind::IfThenElse {
            arms: vec![crate::IfArm {
                condition: int(1),
                block: Block::new(vec![expr_stmt(int(1))]),
            }],
            else_block: Block::new(vec![expr_stmt(int(1))]),
        });
        assert_eq!(stmt, expected);
    }

    #[test]
    fn failed_substitution_reports_no_spurious_capture() {
        let mut interner = Interner::new();
        let t = interner.intern("t");
        let n = interner.intern("n");
        // t is not free in the struct, so nothing is inserted and the
        // field check never fires even though n is free in the replacement.
        let mut term = Expr::new(ExprKind::Struct(vec![Field {
            ty: lit(Literal::U8),
            name: n,
        }]));
        let original = term.clone();
        subst(&mut interner, &mut term, t, &ident(n)).unwrap();
        assert_eq!(term, original);
    }
}
