//! Type checking for Tern.
//!
//! Tern is dependently typed: types are expressions, so the checker leans
//! on the core term operations — structural equality, deep copy, free
//! variables, and capture-avoiding substitution — for dependent function
//! application, dependent record projection, and type-level evaluation.
//!
//! The public surface is bidirectional: [`type_infer`] synthesizes a type,
//! [`type_check`] checks against an expected one, [`type_equal`] compares
//! types up to evaluation, and [`type_eval`] normalizes type-level terms.
//! [`check_unit`] drives a whole translation unit in dependency order.

use std::collections::HashMap;

use tern_ast::{Expr, TranslationUnit};
use tern_diag::DiagnosticError;
use tern_sym::{Interner, Symbol};

pub mod topo;
pub mod typeck;

pub use tern_diag::{Category, Diagnostic, Severity, SourceLocation};
pub use topo::topological_sort;
pub use typeck::{
    check_statement, type_check, type_check_top_level, type_equal, type_eval, type_infer,
};

/// Per-invocation checking context.
///
/// Owns the symbol registry (substitution gensyms through it), a scoped
/// stack of `name -> type` bindings, and the definitions of top-level
/// functions already checked, which [`type_eval`] unfolds in call position.
#[derive(Debug)]
pub struct Context {
    pub interner: Interner,
    scopes: Vec<HashMap<Symbol, Expr>>,
    definitions: HashMap<Symbol, Expr>,
}

impl Context {
    pub fn new(interner: Interner) -> Self {
        Self {
            interner,
            scopes: vec![HashMap::new()],
            definitions: HashMap::new(),
        }
    }

    /// Run `f` inside a fresh binding scope.
    pub fn scoped<T>(&mut self, f: impl FnOnce(&mut Self) -> T) -> T {
        self.scopes.push(HashMap::new());
        let result = f(self);
        self.scopes.pop();
        result
    }

    /// Bind `name` to `ty` in the innermost scope.
    pub fn bind(&mut self, name: Symbol, ty: Expr) {
        self.scopes
            .last_mut()
            .expect("the global scope is never popped")
            .insert(name, ty);
    }

    /// Bind `name` to `ty` in the global scope.
    pub fn bind_global(&mut self, name: Symbol, ty: Expr) {
        self.scopes[0].insert(name, ty);
    }

    /// The type of `name`, innermost binding first.
    pub fn lookup(&self, name: Symbol) -> Option<&Expr> {
        self.scopes.iter().rev().find_map(|scope| scope.get(&name))
    }

    /// Record the definition of a top-level function for unfolding.
    pub fn define(&mut self, name: Symbol, definition: Expr) {
        self.definitions.insert(name, definition);
    }

    pub fn definition(&self, name: Symbol) -> Option<&Expr> {
        self.definitions.get(&name)
    }
}

/// Type check a whole translation unit: order the top-levels by their type
/// signature dependencies, then check each in order. All diagnostics are
/// collected; any error fails the unit.
pub fn check_unit(ctx: &mut Context, unit: &TranslationUnit) -> Result<(), DiagnosticError> {
    let order =
        topological_sort(&unit.top_levels, &ctx.interner).map_err(DiagnosticError::single)?;
    let mut diagnostics = Vec::new();
    for index in order {
        if let Err(diag) = type_check_top_level(ctx, &unit.top_levels[index]) {
            diagnostics.push(diag);
        }
    }
    if diagnostics.is_empty() {
        Ok(())
    } else {
        Err(DiagnosticError::multiple(diagnostics))
    }
}
