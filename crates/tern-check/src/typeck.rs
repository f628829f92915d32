//! Bidirectional type checking and type-level evaluation.
//!
//! The dependent cases are the load-bearing ones: applying a dependent
//! function type substitutes each named parameter with its argument in the
//! later parameter types and the return type, and projecting a field out of
//! a dependent struct substitutes the earlier field names with projections
//! of the record. Both go through the capture-avoiding substitution of
//! `tern-ast`; a refused substitution surfaces as a type error.

use tern_ast::{
    BinOp, Binder, Expr, ExprKind, Literal, Loc, Param, Statement, StatementKind, SubstError,
    TopLevel, TopLevelKind, subst,
};
use tern_diag::{Category, Diagnostic, SourceLocation};

use crate::Context;

/// Unfolding depth limit for [`type_eval`]. Recursive definitions surface
/// as a diagnostic instead of diverging.
const MAX_UNFOLD_DEPTH: usize = 64;

fn lit(literal: Literal) -> Expr {
    Expr::literal(literal)
}

fn type_universe() -> Expr {
    lit(Literal::Type)
}

fn error(category: Category, message: String, loc: Option<Loc>) -> Diagnostic {
    let diag = Diagnostic::error(category, message);
    match loc {
        Some(loc) => diag.at(SourceLocation::new(loc.line, loc.column)),
        None => diag,
    }
}

fn capture_error(err: SubstError, loc: Option<Loc>) -> Diagnostic {
    let SubstError::FieldCapture { .. } = err;
    error(
        Category::Capture,
        "substitution would capture a record field name".to_string(),
        loc,
    )
}

fn render(ctx: &Context, expr: &Expr) -> String {
    expr.display(&ctx.interner).to_string()
}

// ---------------------------------------------------------------------------
// Inference
// ---------------------------------------------------------------------------

/// Synthesize the type of `expr`.
pub fn type_infer(ctx: &mut Context, expr: &Expr) -> Result<Expr, Diagnostic> {
    match &expr.kind {
        ExprKind::Literal(literal) => Ok(match literal {
            Literal::Integral(_) => lit(Literal::U64),
            Literal::Boolean(_) => lit(Literal::Bool),
            _ => type_universe(),
        }),

        ExprKind::Ident(sym) => match ctx.lookup(*sym) {
            Some(ty) => Ok(ty.clone()),
            None => Err(error(
                Category::UndefinedName,
                format!("unknown identifier `{}`", ctx.interner.resolve(*sym)),
                expr.loc,
            )),
        },

        ExprKind::BinOp { op, lhs, rhs } => match op {
            BinOp::Eq | BinOp::Ne | BinOp::Lt | BinOp::Le | BinOp::Gt | BinOp::Ge => {
                let lhs_ty = type_infer(ctx, lhs)?;
                type_check(ctx, rhs, &lhs_ty)?;
                Ok(lit(Literal::Bool))
            }
            BinOp::Add | BinOp::Sub => {
                let lhs_ty = type_infer(ctx, lhs)?;
                let norm = type_eval(ctx, &lhs_ty)?;
                let integral =
                    matches!(norm.kind, ExprKind::Literal(l) if l.is_integral_type());
                if !integral {
                    return Err(error(
                        Category::TypeError,
                        format!("`{}` is not an integral type", render(ctx, &norm)),
                        lhs.loc,
                    ));
                }
                type_check(ctx, rhs, &lhs_ty)?;
                Ok(lhs_ty)
            }
            BinOp::AndThen => {
                type_infer(ctx, lhs)?;
                type_infer(ctx, rhs)
            }
        },

        ExprKind::IfThenElse {
            predicate,
            then_branch,
            else_branch,
        } => {
            type_check(ctx, predicate, &lit(Literal::Bool))?;
            let then_ty = type_infer(ctx, then_branch)?;
            type_check(ctx, else_branch, &then_ty)?;
            Ok(then_ty)
        }

        ExprKind::FuncType { ret_type, params } => ctx.scoped(|ctx| {
            for param in params {
                type_check(ctx, &param.ty, &type_universe())?;
                if let Some(name) = param.name {
                    ctx.bind(name, param.ty.clone());
                }
            }
            type_check(ctx, ret_type, &type_universe())?;
            Ok(type_universe())
        }),

        ExprKind::Lambda { params, body } => ctx.scoped(|ctx| {
            for param in params {
                type_check(ctx, &param.ty, &type_universe())?;
                ctx.bind(param.name, param.ty.clone());
            }
            let body_ty = type_infer(ctx, body)?;
            Ok(Expr::new(ExprKind::FuncType {
                ret_type: Box::new(body_ty),
                params: params
                    .iter()
                    .map(|p| Param {
                        ty: p.ty.clone(),
                        name: Some(p.name),
                    })
                    .collect(),
            }))
        }),

        ExprKind::Call { callee, args } => {
            let callee_ty = type_infer(ctx, callee)?;
            let callee_ty = type_eval(ctx, &callee_ty)?;
            let ExprKind::FuncType { ret_type, params } = &callee_ty.kind else {
                return Err(error(
                    Category::TypeError,
                    format!("cannot call a value of type `{}`", render(ctx, &callee_ty)),
                    callee.loc,
                ));
            };
            let mut params = params.clone();
            if params.len() != args.len() {
                return Err(error(
                    Category::ArityMismatch,
                    format!(
                        "this function takes {} argument(s) but {} were supplied",
                        params.len(),
                        args.len()
                    ),
                    expr.loc,
                ));
            }

            // Dependent application: each named parameter is substituted
            // with its argument in the later parameter types and in the
            // return type.
            let mut ret = (**ret_type).clone();
            for (i, arg) in args.iter().enumerate() {
                type_check(ctx, arg, &params[i].ty)?;
                if let Some(name) = params[i].name {
                    for later in params[i + 1..].iter_mut() {
                        subst(&mut ctx.interner, &mut later.ty, name, arg)
                            .map_err(|e| capture_error(e, expr.loc))?;
                    }
                    subst(&mut ctx.interner, &mut ret, name, arg)
                        .map_err(|e| capture_error(e, expr.loc))?;
                }
            }
            Ok(ret)
        }

        ExprKind::Struct(fields) => ctx.scoped(|ctx| {
            for field in fields {
                type_check(ctx, &field.ty, &type_universe())?;
                ctx.bind(field.name, field.ty.clone());
            }
            Ok(type_universe())
        }),

        ExprKind::Union(fields) => {
            for field in fields {
                type_check(ctx, &field.ty, &type_universe())?;
            }
            Ok(type_universe())
        }

        ExprKind::Pack { ty, inits } => {
            type_check(ctx, ty, &type_universe())?;
            let norm = type_eval(ctx, ty)?;
            match &norm.kind {
                ExprKind::Struct(fields) => {
                    let mut fields = fields.clone();
                    if fields.len() != inits.len() {
                        return Err(error(
                            Category::ArityMismatch,
                            format!(
                                "this struct has {} field(s) but {} were assigned",
                                fields.len(),
                                inits.len()
                            ),
                            expr.loc,
                        ));
                    }
                    for (i, init) in inits.iter().enumerate() {
                        if init.name != fields[i].name {
                            return Err(error(
                                Category::ExtraField,
                                format!(
                                    "expected field `{}`, found `{}`",
                                    ctx.interner.resolve(fields[i].name),
                                    ctx.interner.resolve(init.name)
                                ),
                                init.value.loc,
                            ));
                        }
                        type_check(ctx, &init.value, &fields[i].ty)?;
                        let name = fields[i].name;
                        for later in fields[i + 1..].iter_mut() {
                            subst(&mut ctx.interner, &mut later.ty, name, &init.value)
                                .map_err(|e| capture_error(e, expr.loc))?;
                        }
                    }
                    Ok((**ty).clone())
                }
                ExprKind::Union(fields) => {
                    // A union packing assigns exactly one field.
                    if inits.len() != 1 {
                        return Err(error(
                            Category::ArityMismatch,
                            format!(
                                "a union packing assigns exactly one field, found {}",
                                inits.len()
                            ),
                            expr.loc,
                        ));
                    }
                    let init = &inits[0];
                    match fields.iter().find(|f| f.name == init.name) {
                        Some(field) => {
                            type_check(ctx, &init.value, &field.ty)?;
                            Ok((**ty).clone())
                        }
                        None => Err(error(
                            Category::ExtraField,
                            format!(
                                "no field `{}` in the union",
                                ctx.interner.resolve(init.name)
                            ),
                            init.value.loc,
                        )),
                    }
                }
                _ => Err(error(
                    Category::TypeError,
                    format!("`{}` is not a struct or union type", render(ctx, &norm)),
                    ty.loc,
                )),
            }
        }

        ExprKind::Member { record, field } => {
            let record_ty = type_infer(ctx, record)?;
            let record_ty = type_eval(ctx, &record_ty)?;
            match &record_ty.kind {
                ExprKind::Struct(fields) => {
                    let Some(index) = fields.iter().position(|f| f.name == *field) else {
                        return Err(error(
                            Category::MissingField,
                            format!(
                                "no field `{}` in `{}`",
                                ctx.interner.resolve(*field),
                                render(ctx, record)
                            ),
                            expr.loc,
                        ));
                    };
                    // Dependent projection: earlier field names become
                    // projections of the record itself.
                    let mut ty = fields[index].ty.clone();
                    for earlier in &fields[..index] {
                        let projection = Expr::new(ExprKind::Member {
                            record: record.clone(),
                            field: earlier.name,
                        });
                        subst(&mut ctx.interner, &mut ty, earlier.name, &projection)
                            .map_err(|e| capture_error(e, expr.loc))?;
                    }
                    Ok(ty)
                }
                ExprKind::Union(fields) => match fields.iter().find(|f| f.name == *field) {
                    Some(found) => Ok(found.ty.clone()),
                    None => Err(error(
                        Category::MissingField,
                        format!(
                            "no field `{}` in `{}`",
                            ctx.interner.resolve(*field),
                            render(ctx, record)
                        ),
                        expr.loc,
                    )),
                },
                _ => Err(error(
                    Category::TypeError,
                    format!("`{}` is not a record type", render(ctx, &record_ty)),
                    record.loc,
                )),
            }
        }

        ExprKind::Pointer(inner) => {
            type_check(ctx, inner, &type_universe())?;
            Ok(type_universe())
        }

        ExprKind::Reference(inner) => {
            let inner_ty = type_infer(ctx, inner)?;
            Ok(Expr::new(ExprKind::Pointer(Box::new(inner_ty))))
        }

        ExprKind::Dereference(inner) => {
            let inner_ty = type_infer(ctx, inner)?;
            let norm = type_eval(ctx, &inner_ty)?;
            match &norm.kind {
                ExprKind::Pointer(pointee) => Ok((**pointee).clone()),
                _ => Err(error(
                    Category::TypeError,
                    format!("cannot dereference a value of type `{}`", render(ctx, &norm)),
                    inner.loc,
                )),
            }
        }

        ExprKind::Statement(_) => Err(error(
            Category::TypeError,
            "a statement expression is checked against a return type, not inferred".to_string(),
            expr.loc,
        )),
    }
}

// ---------------------------------------------------------------------------
// Checking
// ---------------------------------------------------------------------------

/// Check `expr` against `expected`.
pub fn type_check(ctx: &mut Context, expr: &Expr, expected: &Expr) -> Result<(), Diagnostic> {
    // Integral literals check against every integral type.
    if let ExprKind::Literal(Literal::Integral(_)) = &expr.kind {
        let norm = type_eval(ctx, expected)?;
        if matches!(norm.kind, ExprKind::Literal(l) if l.is_integral_type()) {
            return Ok(());
        }
    }

    match &expr.kind {
        ExprKind::Lambda { params, body } => {
            let norm = type_eval(ctx, expected)?;
            let ExprKind::FuncType {
                ret_type,
                params: expected_params,
            } = norm.kind
            else {
                return Err(error(
                    Category::TypeMismatch,
                    format!("expected `{}`, found a lambda", render(ctx, expected)),
                    expr.loc,
                ));
            };
            if expected_params.len() != params.len() {
                return Err(error(
                    Category::ArityMismatch,
                    format!(
                        "expected a function of {} parameter(s), found {}",
                        expected_params.len(),
                        params.len()
                    ),
                    expr.loc,
                ));
            }
            ctx.scoped(|ctx| {
                let mut expected_params = expected_params;
                let mut ret = *ret_type;
                for i in 0..params.len() {
                    type_check(ctx, &params[i].ty, &type_universe())?;
                    if !type_equal(ctx, &params[i].ty, &expected_params[i].ty)? {
                        return Err(error(
                            Category::TypeMismatch,
                            format!(
                                "parameter type `{}` does not match expected `{}`",
                                render(ctx, &params[i].ty),
                                render(ctx, &expected_params[i].ty)
                            ),
                            params[i].ty.loc,
                        ));
                    }
                    ctx.bind(params[i].name, params[i].ty.clone());
                    // Rewrite the expected signature in terms of the
                    // lambda's own parameter name.
                    if let Some(expected_name) = expected_params[i].name
                        && expected_name != params[i].name
                    {
                        let with = Expr::ident(params[i].name);
                        for later in expected_params[i + 1..].iter_mut() {
                            subst(&mut ctx.interner, &mut later.ty, expected_name, &with)
                                .map_err(|e| capture_error(e, expr.loc))?;
                        }
                        subst(&mut ctx.interner, &mut ret, expected_name, &with)
                            .map_err(|e| capture_error(e, expr.loc))?;
                    }
                }
                type_check(ctx, body, &ret)
            })
        }

        ExprKind::Statement(statement) => check_statement(ctx, statement, expected),

        _ => {
            let actual = type_infer(ctx, expr)?;
            if type_equal(ctx, &actual, expected)? {
                Ok(())
            } else {
                Err(error(
                    Category::TypeMismatch,
                    format!(
                        "expected `{}`, found `{}`",
                        render(ctx, expected),
                        render(ctx, &actual)
                    ),
                    expr.loc,
                ))
            }
        }
    }
}

/// Check a statement with `ret_type` as the type `return` values must have.
pub fn check_statement(
    ctx: &mut Context,
    statement: &Statement,
    ret_type: &Expr,
) -> Result<(), Diagnostic> {
    match &statement.kind {
        StatementKind::Empty => Ok(()),

        StatementKind::Expr(expr) => {
            type_infer(ctx, expr)?;
            Ok(())
        }

        StatementKind::Return(expr) => type_check(ctx, expr, ret_type),

        StatementKind::Block(block) => ctx.scoped(|ctx| {
            for statement in &block.statements {
                check_statement(ctx, statement, ret_type)?;
            }
            Ok(())
        }),

        StatementKind::Decl { ty, name, init } => {
            type_check(ctx, ty, &type_universe())?;
            if let Some(init) = init {
                type_check(ctx, init, ty)?;
            }
            ctx.bind(*name, ty.clone());
            Ok(())
        }

        StatementKind::IfThenElse { arms, else_block } => {
            for arm in arms {
                type_check(ctx, &arm.condition, &lit(Literal::Bool))?;
                ctx.scoped(|ctx| {
                    for statement in &arm.block.statements {
                        check_statement(ctx, statement, ret_type)?;
                    }
                    Ok(())
                })?;
            }
            ctx.scoped(|ctx| {
                for statement in &else_block.statements {
                    check_statement(ctx, statement, ret_type)?;
                }
                Ok(())
            })
        }
    }
}

// ---------------------------------------------------------------------------
// Equality and evaluation
// ---------------------------------------------------------------------------

/// Are `a` and `b` the same type, up to type-level evaluation?
///
/// α-equivalence comes from normalizing before the structural comparison;
/// the structural comparison itself matches binders by symbol identity.
pub fn type_equal(ctx: &mut Context, a: &Expr, b: &Expr) -> Result<bool, Diagnostic> {
    Ok(type_eval(ctx, a)? == type_eval(ctx, b)?)
}

/// Normalize a type-level term: β-reduce applications, unfold top-level
/// definitions in call position, fold conditionals on literal booleans and
/// operators on literal payloads, and normalize children.
pub fn type_eval(ctx: &mut Context, expr: &Expr) -> Result<Expr, Diagnostic> {
    eval(ctx, expr, 0)
}

fn eval(ctx: &mut Context, expr: &Expr, depth: usize) -> Result<Expr, Diagnostic> {
    if depth > MAX_UNFOLD_DEPTH {
        return Err(error(
            Category::TypeError,
            "type-level evaluation exceeded the unfolding depth limit".to_string(),
            expr.loc,
        ));
    }

    match &expr.kind {
        ExprKind::Literal(_) | ExprKind::Ident(_) | ExprKind::Statement(_) => Ok(expr.clone()),

        ExprKind::BinOp { op, lhs, rhs } => {
            let lhs = eval(ctx, lhs, depth)?;
            let rhs = eval(ctx, rhs, depth)?;
            if let Some(folded) = fold_bin_op(*op, &lhs, &rhs) {
                return Ok(folded);
            }
            Ok(Expr {
                loc: expr.loc,
                kind: ExprKind::BinOp {
                    op: *op,
                    lhs: Box::new(lhs),
                    rhs: Box::new(rhs),
                },
            })
        }

        ExprKind::IfThenElse {
            predicate,
            then_branch,
            else_branch,
        } => {
            let predicate = eval(ctx, predicate, depth)?;
            if let ExprKind::Literal(Literal::Boolean(b)) = predicate.kind {
                return if b {
                    eval(ctx, then_branch, depth)
                } else {
                    eval(ctx, else_branch, depth)
                };
            }
            Ok(Expr {
                loc: expr.loc,
                kind: ExprKind::IfThenElse {
                    predicate: Box::new(predicate),
                    then_branch: Box::new(eval(ctx, then_branch, depth)?),
                    else_branch: Box::new(eval(ctx, else_branch, depth)?),
                },
            })
        }

        ExprKind::FuncType { ret_type, params } => {
            let params = params
                .iter()
                .map(|p| {
                    Ok(Param {
                        ty: eval(ctx, &p.ty, depth)?,
                        name: p.name,
                    })
                })
                .collect::<Result<_, Diagnostic>>()?;
            Ok(Expr {
                loc: expr.loc,
                kind: ExprKind::FuncType {
                    ret_type: Box::new(eval(ctx, ret_type, depth)?),
                    params,
                },
            })
        }

        ExprKind::Lambda { params, body } => {
            let params = params
                .iter()
                .map(|p| {
                    Ok(Binder {
                        ty: eval(ctx, &p.ty, depth)?,
                        name: p.name,
                    })
                })
                .collect::<Result<_, Diagnostic>>()?;
            Ok(Expr {
                loc: expr.loc,
                kind: ExprKind::Lambda {
                    params,
                    body: Box::new(eval(ctx, body, depth)?),
                },
            })
        }

        ExprKind::Call { callee, args } => {
            let callee = eval(ctx, callee, depth)?;
            let args = args
                .iter()
                .map(|a| eval(ctx, a, depth))
                .collect::<Result<Vec<_>, Diagnostic>>()?;

            match &callee.kind {
                ExprKind::Lambda { params, body } => {
                    if params.len() != args.len() {
                        return Err(error(
                            Category::ArityMismatch,
                            format!(
                                "this function takes {} argument(s) but {} were supplied",
                                params.len(),
                                args.len()
                            ),
                            expr.loc,
                        ));
                    }
                    // β-reduction. The parameters are renamed apart first
                    // so an argument free in a later parameter's name is
                    // not rewritten by the later substitution.
                    let mut body = (**body).clone();
                    let mut fresh_names = Vec::with_capacity(params.len());
                    for param in params {
                        let fresh = ctx.interner.fresh(param.name);
                        subst(&mut ctx.interner, &mut body, param.name, &Expr::ident(fresh))
                            .map_err(|e| capture_error(e, expr.loc))?;
                        fresh_names.push(fresh);
                    }
                    for (fresh, arg) in fresh_names.iter().zip(&args) {
                        subst(&mut ctx.interner, &mut body, *fresh, arg)
                            .map_err(|e| capture_error(e, expr.loc))?;
                    }
                    eval(ctx, &body, depth + 1)
                }

                ExprKind::Ident(sym) if ctx.definition(*sym).is_some() => {
                    let definition = ctx
                        .definition(*sym)
                        .cloned()
                        .expect("definition presence checked above");
                    let unfolded = Expr {
                        loc: expr.loc,
                        kind: ExprKind::Call {
                            callee: Box::new(definition),
                            args,
                        },
                    };
                    eval(ctx, &unfolded, depth + 1)
                }

                _ => Ok(Expr {
                    loc: expr.loc,
                    kind: ExprKind::Call {
                        callee: Box::new(callee),
                        args,
                    },
                }),
            }
        }

        ExprKind::Struct(fields) => {
            let fields = eval_fields(ctx, fields, depth)?;
            Ok(Expr {
                loc: expr.loc,
                kind: ExprKind::Struct(fields),
            })
        }

        ExprKind::Union(fields) => {
            let fields = eval_fields(ctx, fields, depth)?;
            Ok(Expr {
                loc: expr.loc,
                kind: ExprKind::Union(fields),
            })
        }

        ExprKind::Pack { ty, inits } => {
            let inits = inits
                .iter()
                .map(|init| {
                    Ok(tern_ast::FieldInit {
                        name: init.name,
                        value: eval(ctx, &init.value, depth)?,
                    })
                })
                .collect::<Result<_, Diagnostic>>()?;
            Ok(Expr {
                loc: expr.loc,
                kind: ExprKind::Pack {
                    ty: Box::new(eval(ctx, ty, depth)?),
                    inits,
                },
            })
        }

        ExprKind::Member { record, field } => {
            let record = eval(ctx, record, depth)?;
            if let ExprKind::Pack { inits, .. } = &record.kind
                && let Some(init) = inits.iter().find(|i| i.name == *field)
            {
                return Ok(init.value.clone());
            }
            Ok(Expr {
                loc: expr.loc,
                kind: ExprKind::Member {
                    record: Box::new(record),
                    field: *field,
                },
            })
        }

        ExprKind::Pointer(inner) => Ok(Expr {
            loc: expr.loc,
            kind: ExprKind::Pointer(Box::new(eval(ctx, inner, depth)?)),
        }),

        ExprKind::Reference(inner) => Ok(Expr {
            loc: expr.loc,
            kind: ExprKind::Reference(Box::new(eval(ctx, inner, depth)?)),
        }),

        ExprKind::Dereference(inner) => {
            let inner = eval(ctx, inner, depth)?;
            if let ExprKind::Reference(referent) = &inner.kind {
                return Ok((**referent).clone());
            }
            Ok(Expr {
                loc: expr.loc,
                kind: ExprKind::Dereference(Box::new(inner)),
            })
        }
    }
}

fn eval_fields(
    ctx: &mut Context,
    fields: &[tern_ast::Field],
    depth: usize,
) -> Result<Vec<tern_ast::Field>, Diagnostic> {
    fields
        .iter()
        .map(|field| {
            Ok(tern_ast::Field {
                ty: eval(ctx, &field.ty, depth)?,
                name: field.name,
            })
        })
        .collect()
}

fn fold_bin_op(op: BinOp, lhs: &Expr, rhs: &Expr) -> Option<Expr> {
    let (ExprKind::Literal(a), ExprKind::Literal(b)) = (&lhs.kind, &rhs.kind) else {
        return None;
    };
    let literal = match (op, a, b) {
        (BinOp::Eq, Literal::Integral(a), Literal::Integral(b)) => Literal::Boolean(a == b),
        (BinOp::Ne, Literal::Integral(a), Literal::Integral(b)) => Literal::Boolean(a != b),
        (BinOp::Lt, Literal::Integral(a), Literal::Integral(b)) => Literal::Boolean(a < b),
        (BinOp::Le, Literal::Integral(a), Literal::Integral(b)) => Literal::Boolean(a <= b),
        (BinOp::Gt, Literal::Integral(a), Literal::Integral(b)) => Literal::Boolean(a > b),
        (BinOp::Ge, Literal::Integral(a), Literal::Integral(b)) => Literal::Boolean(a >= b),
        (BinOp::Add, Literal::Integral(a), Literal::Integral(b)) => {
            Literal::Integral(a.wrapping_add(*b))
        }
        (BinOp::Sub, Literal::Integral(a), Literal::Integral(b)) => {
            Literal::Integral(a.wrapping_sub(*b))
        }
        (BinOp::Eq, Literal::Boolean(a), Literal::Boolean(b)) => Literal::Boolean(a == b),
        (BinOp::Ne, Literal::Boolean(a), Literal::Boolean(b)) => Literal::Boolean(a != b),
        (BinOp::AndThen, _, _) => *b,
        _ => return None,
    };
    Some(Expr::literal(literal))
}

// ---------------------------------------------------------------------------
// Top-level definitions
// ---------------------------------------------------------------------------

/// Check a top-level function and register it for later top-levels: its
/// function type becomes a global binding, and (when every parameter is
/// named and the body computes a single expression) its definition unfolds
/// during type-level evaluation.
pub fn type_check_top_level(ctx: &mut Context, top_level: &TopLevel) -> Result<(), Diagnostic> {
    let TopLevelKind::Func(func) = &top_level.kind;

    ctx.scoped(|ctx| {
        for param in &func.params {
            type_check(ctx, &param.ty, &type_universe())?;
            if let Some(name) = param.name {
                ctx.bind(name, param.ty.clone());
            }
        }
        type_check(ctx, &func.ret_type, &type_universe())?;
        type_check(ctx, &func.body, &func.ret_type)
    })?;

    let func_type = Expr::new(ExprKind::FuncType {
        ret_type: Box::new(func.ret_type.clone()),
        params: func.params.clone(),
    });
    ctx.bind_global(top_level.name, func_type);

    let binders: Option<Vec<Binder>> = func
        .params
        .iter()
        .map(|p| {
            p.name.map(|name| Binder {
                ty: p.ty.clone(),
                name,
            })
        })
        .collect();
    if let Some(binders) = binders
        && let Some(body) = body_expression(&func.body)
    {
        ctx.define(
            top_level.name,
            Expr::new(ExprKind::Lambda {
                params: binders,
                body: Box::new(body.clone()),
            }),
        );
    }
    Ok(())
}

/// The expression a function body computes, when it has one: either the
/// body itself, or the value of a body that is just `return expr;`
/// (possibly wrapped in a block). Such functions unfold during type-level
/// evaluation; bodies with control flow do not.
fn body_expression(body: &Expr) -> Option<&Expr> {
    let ExprKind::Statement(statement) = &body.kind else {
        return Some(body);
    };
    statement_expression(statement)
}

fn statement_expression(statement: &Statement) -> Option<&Expr> {
    match &statement.kind {
        StatementKind::Return(expr) => Some(expr),
        StatementKind::Block(block) => match block.statements.as_slice() {
            [only] => statement_expression(only),
            _ => None,
        },
        _ => None,
    }
}
