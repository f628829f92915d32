//! Error reporting and diagnostics for Tern.
//!
//! This crate provides structured diagnostics with (line, column) source
//! locations. Diagnostics are created by the other crates (`tern-syntax`,
//! `tern-check`) and rendered here for display; the driver decides which
//! stream each kind goes to.

use std::fmt;

// ---------------------------------------------------------------------------
// Diagnostic severity and categories
// ---------------------------------------------------------------------------

/// How severe a diagnostic is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Severity {
    Error,
    Warning,
}

/// Broad category for diagnostics. Used for filtering and grouping.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Category {
    /// Lexical error: an unknown character was skipped.
    Lexical,
    /// Syntax error.
    Syntax,
    /// Undefined variable or name.
    UndefinedName,
    /// Type mismatch: expected X, got Y.
    TypeMismatch,
    /// Arity mismatch in a call or pack.
    ArityMismatch,
    /// Missing field in a record.
    MissingField,
    /// Field not present in the record type.
    ExtraField,
    /// Substitution refused: a record field name would be captured.
    Capture,
    /// Cyclic dependency between top-level declarations.
    Cycle,
    /// General type checking error.
    TypeError,
}

impl Category {
    pub const ALL: [Category; 10] = [
        Category::Lexical,
        Category::Syntax,
        Category::UndefinedName,
        Category::TypeMismatch,
        Category::ArityMismatch,
        Category::MissingField,
        Category::ExtraField,
        Category::Capture,
        Category::Cycle,
        Category::TypeError,
    ];

    pub fn all() -> &'static [Category] {
        &Self::ALL
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Category::Lexical => "lexical",
            Category::Syntax => "syntax",
            Category::UndefinedName => "undefined_name",
            Category::TypeMismatch => "type_mismatch",
            Category::ArityMismatch => "arity_mismatch",
            Category::MissingField => "missing_field",
            Category::ExtraField => "extra_field",
            Category::Capture => "capture",
            Category::Cycle => "cycle",
            Category::TypeError => "type_error",
        }
    }

    pub fn code(self) -> &'static str {
        match self {
            Category::Lexical => "E0001",
            Category::Syntax => "E0002",
            Category::UndefinedName => "E0003",
            Category::TypeMismatch => "E0004",
            Category::ArityMismatch => "E0005",
            Category::MissingField => "E0006",
            Category::ExtraField => "E0007",
            Category::Capture => "E0008",
            Category::Cycle => "E0009",
            Category::TypeError => "E0010",
        }
    }

    pub fn description(self) -> &'static str {
        match self {
            Category::Lexical => "Source text contains a character outside the language.",
            Category::Syntax => "Source text does not parse as valid Tern syntax.",
            Category::UndefinedName => "A referenced variable, function, or type is undefined.",
            Category::TypeMismatch => "Expression type does not match the expected type.",
            Category::ArityMismatch => {
                "A function or record constructor was applied to the wrong number of arguments."
            }
            Category::MissingField => "A required record field is missing.",
            Category::ExtraField => "A record field is not part of the record type.",
            Category::Capture => {
                "Substitution would capture a record field name, which cannot be renamed."
            }
            Category::Cycle => "Top-level type signatures depend on each other cyclically.",
            Category::TypeError => "General type checking error.",
        }
    }
}

// ---------------------------------------------------------------------------
// Source locations
// ---------------------------------------------------------------------------

/// A source location for diagnostics, at (line, column) granularity.
/// Both are 1-based.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SourceLocation {
    pub line: u32,
    pub column: u32,
}

impl SourceLocation {
    pub fn new(line: u32, column: u32) -> Self {
        Self { line, column }
    }
}

impl fmt::Display for SourceLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.line, self.column)
    }
}

// ---------------------------------------------------------------------------
// Diagnostic
// ---------------------------------------------------------------------------

/// A structured diagnostic message.
#[derive(Debug, Clone)]
pub struct Diagnostic {
    /// Stable diagnostic code (e.g. E0002).
    pub code: Option<String>,
    pub severity: Severity,
    pub category: Category,
    /// Primary message: what went wrong.
    pub message: String,
    /// Where it went wrong.
    pub location: Option<SourceLocation>,
    /// Suggested fix, if any.
    pub help: Option<String>,
}

impl Diagnostic {
    pub fn error(category: Category, message: impl Into<String>) -> Self {
        Self {
            code: Some(category.code().to_string()),
            severity: Severity::Error,
            category,
            message: message.into(),
            location: None,
            help: None,
        }
    }

    pub fn warning(category: Category, message: impl Into<String>) -> Self {
        Self {
            code: Some(category.code().to_string()),
            severity: Severity::Warning,
            category,
            message: message.into(),
            location: None,
            help: None,
        }
    }

    pub fn at(mut self, location: SourceLocation) -> Self {
        self.location = Some(location);
        self
    }

    pub fn with_help(mut self, help: impl Into<String>) -> Self {
        self.help = Some(help.into());
        self
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let prefix = match self.severity {
            Severity::Error => "error",
            Severity::Warning => "warning",
        };
        if let Some(code) = &self.code {
            write!(f, "{prefix}[{code}]: {}", self.message)?;
        } else {
            write!(f, "{prefix}: {}", self.message)?;
        }
        if let Some(location) = self.location {
            write!(f, " at {location}")?;
        }
        if let Some(help) = &self.help {
            write!(f, "\n  help: {help}")?;
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Error type for crates that produce diagnostics
// ---------------------------------------------------------------------------

/// Error type wrapping one or more diagnostics.
#[derive(Debug, Clone, thiserror::Error)]
#[error("{}", .0.first().map(|d| d.to_string()).unwrap_or_default())]
pub struct DiagnosticError(pub Vec<Diagnostic>);

impl DiagnosticError {
    pub fn single(diag: Diagnostic) -> Self {
        Self(vec![diag])
    }

    pub fn multiple(diags: Vec<Diagnostic>) -> Self {
        Self(diags)
    }

    pub fn diagnostics(&self) -> &[Diagnostic] {
        &self.0
    }
}
