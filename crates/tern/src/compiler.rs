//! The compilation pipeline: read → lex → parse → order → type check.
//!
//! Diagnostic routing: lexical diagnostics go to stderr and do not stop the
//! pipeline (the offending characters were skipped); parse diagnostics are
//! printed to stdout with their (line, column) and abort; type diagnostics
//! go to stderr.

use std::fs;
use std::path::Path;

use tern_ast::TranslationUnit;
use tern_check::{Context, check_unit};
use tern_diag::Diagnostic;
use tern_sym::Interner;
use tern_syntax::{lex, parse_unit};

/// Outcome of `tern check`.
#[derive(Debug)]
pub struct CheckReport {
    pub errors: usize,
}

/// Parse and type check `input`.
pub fn check_file(input: &Path) -> Result<CheckReport, String> {
    let source = read_source(input)?;
    let mut interner = Interner::new();
    let unit = match parse_source(&source, &mut interner) {
        Ok(unit) => unit,
        Err(count) => return Ok(CheckReport { errors: count }),
    };

    let mut ctx = Context::new(interner);
    match check_unit(&mut ctx, &unit) {
        Ok(()) => Ok(CheckReport { errors: 0 }),
        Err(err) => {
            for diag in err.diagnostics() {
                eprintln!("{diag}");
            }
            Ok(CheckReport {
                errors: err.diagnostics().len(),
            })
        }
    }
}

/// Parse `input` and pretty-print it back.
pub fn print_file(input: &Path) -> Result<String, String> {
    let source = read_source(input)?;
    let mut interner = Interner::new();
    let unit = parse_source(&source, &mut interner)
        .map_err(|_| "parsing failed".to_string())?;
    Ok(unit.display(&interner).to_string())
}

fn read_source(input: &Path) -> Result<String, String> {
    fs::read_to_string(input)
        .map_err(|err| format!("failed to read `{}`: {err}", input.display()))
}

/// Lex and parse, routing diagnostics. Returns the number of parse errors
/// on failure.
fn parse_source(source: &str, interner: &mut Interner) -> Result<TranslationUnit, usize> {
    let (tokens, lex_diags) = lex(source);
    emit_to_stderr(&lex_diags);

    match parse_unit(tokens, interner) {
        Ok(unit) => Ok(unit),
        Err(diags) => {
            // Parse errors go to stdout, with (line, column).
            for diag in &diags {
                println!("{diag}");
            }
            Err(diags.len())
        }
    }
}

fn emit_to_stderr(diagnostics: &[Diagnostic]) {
    for diag in diagnostics {
        eprintln!("{diag}");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tern_check::Category;

    fn parse_str(source: &str) -> (TranslationUnit, Interner) {
        let mut interner = Interner::new();
        let (tokens, lex_diags) = lex(source);
        assert!(lex_diags.is_empty(), "lex diagnostics: {lex_diags:?}");
        let unit = parse_unit(tokens, &mut interner)
            .unwrap_or_else(|diags| panic!("parse failed: {diags:?}"));
        (unit, interner)
    }

    fn check_str(source: &str) -> Result<(), Vec<Diagnostic>> {
        let (unit, interner) = parse_str(source);
        let mut ctx = Context::new(interner);
        check_unit(&mut ctx, &unit).map_err(|err| err.diagnostics().to_vec())
    }

    #[test]
    fn a_well_typed_unit_checks() {
        check_str(
            "u8 id(u8 x) {\n\
             \x20   return x;\n\
             }\n\
             \n\
             u8 main() {\n\
             \x20   u8 y = 1;\n\
             \x20   if (y == 1) {\n\
             \x20       return y + 1;\n\
             \x20   } else {\n\
             \x20       return 0;\n\
             \x20   }\n\
             }\n",
        )
        .unwrap();
    }

    #[test]
    fn dependent_signatures_check_across_top_levels() {
        // `pair` builds a type; `first` consumes it. The declaration order
        // is backwards on purpose — the topological sort fixes it up.
        check_str(
            "u8 first(pair(u8) p) {\n\
             \x20   return p.fst;\n\
             }\n\
             \n\
             type pair(type t) {\n\
             \x20   return struct { t fst; t snd; };\n\
             }\n",
        )
        .unwrap();
    }

    #[test]
    fn type_errors_are_reported() {
        let diags = check_str("u8 bad() {\n    return true;\n}\n").unwrap_err();
        assert_eq!(diags.len(), 1);
        assert_eq!(diags[0].category, Category::TypeMismatch);
    }

    #[test]
    fn undefined_names_are_reported() {
        let diags = check_str("u8 f() {\n    return missing;\n}\n").unwrap_err();
        assert_eq!(diags[0].category, Category::UndefinedName);
    }

    #[test]
    fn printing_reproduces_the_surface() {
        let (unit, interner) = parse_str("u8 f(u8 x) {\n    return x;\n}\n");
        assert_eq!(
            unit.display(&interner).to_string(),
            "u8 f(u8 x) = \n    [{\n    return x;\n}\n];\n"
        );
    }

    #[test]
    fn struct_types_print_byte_for_byte() {
        let (unit, interner) = parse_str("type t() {\n    return struct { u8 a; bool b; };\n}\n");
        let printed = unit.display(&interner).to_string();
        assert!(
            printed.contains("return struct { u8 a; bool b; };"),
            "unexpected pretty-print: {printed:?}"
        );
    }
}
