//! Dependency ordering of top-level declarations.
//!
//! Top-level functions may use each other's names in their type
//! signatures, so the checker processes them in dependency order. The
//! dependencies are computed from the free variables of each signature
//! (parameter names bind later parameter types and the return type, the
//! same scoping as a function type); bodies are allowed to be mutually
//! recursive and do not contribute.

use std::collections::HashMap;

use tern_ast::{TopLevel, TopLevelKind, free_vars};
use tern_diag::{Category, Diagnostic};
use tern_sym::{Interner, SymbolSet};

/// Compute an order in which every top-level's signature dependencies
/// come before it. A cyclic dependency is a diagnostic.
pub fn topological_sort(
    top_levels: &[TopLevel],
    interner: &Interner,
) -> Result<Vec<usize>, Diagnostic> {
    let mut index_of = HashMap::new();
    for (index, top_level) in top_levels.iter().enumerate() {
        index_of.insert(top_level.name, index);
    }

    let dependencies: Vec<Vec<usize>> = top_levels
        .iter()
        .map(|top_level| {
            let free = signature_free_vars(top_level);
            free.iter()
                .filter_map(|sym| index_of.get(&sym).copied())
                .collect()
        })
        .collect();

    let mut state = vec![Mark::White; top_levels.len()];
    let mut order = Vec::with_capacity(top_levels.len());
    for index in 0..top_levels.len() {
        visit(index, &dependencies, &mut state, &mut order).map_err(|at| {
            Diagnostic::error(
                Category::Cycle,
                format!(
                    "the type signature of `{}` depends on itself",
                    interner.resolve(top_levels[at].name)
                ),
            )
        })?;
    }
    Ok(order)
}

#[derive(Clone, Copy, PartialEq, Eq)]
enum Mark {
    White,
    Grey,
    Black,
}

fn visit(
    index: usize,
    dependencies: &[Vec<usize>],
    state: &mut [Mark],
    order: &mut Vec<usize>,
) -> Result<(), usize> {
    match state[index] {
        Mark::Black => return Ok(()),
        Mark::Grey => return Err(index),
        Mark::White => {}
    }
    state[index] = Mark::Grey;
    for &dep in &dependencies[index] {
        visit(dep, dependencies, state, order)?;
    }
    state[index] = Mark::Black;
    order.push(index);
    Ok(())
}

/// Free variables of a top-level's type signature, with function-type
/// scoping over the parameter list.
fn signature_free_vars(top_level: &TopLevel) -> SymbolSet {
    let TopLevelKind::Func(func) = &top_level.kind;

    let mut free = free_vars(&func.ret_type);
    for param in &func.params {
        if let Some(name) = param.name {
            free.remove(name);
        }
    }
    for (i, param) in func.params.iter().enumerate() {
        let mut ty = free_vars(&param.ty);
        for earlier in &func.params[..i] {
            if let Some(name) = earlier.name {
                ty.remove(name);
            }
        }
        free.extend(ty);
    }
    free
}
