//! Error reporting for the command line
//!
//! Errors reach `main` wrapped in `anyhow` context. Before printing, the
//! cause chain is searched for one of the tool's own error types so the
//! report can say where the problem is and which rule it broke.

use crate::emit::EmitError;
use crate::patch::PatchError;
use colored::*;
use prism_ast::{DirectiveError, Flags, ParseError};

/// Where a failure happened and what rule it broke
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Diagnostic {
    /// `input line 12`, or `marker line 4` for a patched file
    pub location: Option<String>,
    pub rule: String,
    pub hint: Option<String>,
}

/// Find the first error in the chain that prism itself raised
pub fn diagnose(error: &anyhow::Error) -> Option<Diagnostic> {
    error.chain().find_map(|cause| {
        if let Some(e) = cause.downcast_ref::<ParseError>() {
            Some(parse_diagnostic(e))
        } else if let Some(e) = cause.downcast_ref::<DirectiveError>() {
            Some(directive_diagnostic(e))
        } else if let Some(e) = cause.downcast_ref::<EmitError>() {
            Some(emit_diagnostic(e))
        } else {
            cause.downcast_ref::<PatchError>().map(patch_diagnostic)
        }
    })
}

fn input_line(line: Option<usize>) -> Option<String> {
    line.map(|line| format!("input line {}", line))
}

fn parse_diagnostic(error: &ParseError) -> Diagnostic {
    let (rule, hint) = match error {
        ParseError::Lex { .. } => (
            "lexical error",
            Some("Annotation macros must be listed under `ignored_macros` in prism.toml".to_string()),
        ),
        ParseError::Expected { .. } => ("unsupported syntax", None),
        ParseError::DuplicateEnumValue { .. } => ("enum values must be unique", None),
        ParseError::EmptyEnum { .. } => ("enums need at least one value", None),
        ParseError::EmptyInput => ("the header declares nothing", None),
    };
    Diagnostic { location: input_line(error.line()), rule: rule.to_string(), hint }
}

fn directive_diagnostic(error: &DirectiveError) -> Diagnostic {
    let known: Vec<String> = Flags::directive_names().map(|name| format!("%{}%", name)).collect();
    Diagnostic {
        location: input_line(Some(error.line())),
        rule: "unknown directive".to_string(),
        hint: Some(format!("Known directives: {}", known.join(", "))),
    }
}

fn emit_diagnostic(error: &EmitError) -> Diagnostic {
    let (backend, line, rule) = match error {
        EmitError::UnmappableType { backend, line, .. } => (*backend, *line, "unmappable type"),
        EmitError::UnmappableDefault { backend, line, .. } => (*backend, *line, "unmappable default"),
    };
    let skip = match backend {
        "serialization" => Some("%codegen_skip_json%"),
        "javascript" => Some("%codegen_skip_javascript%"),
        _ => None,
    };
    let hint = match (error, skip) {
        (EmitError::UnmappableDefault { .. }, _) => {
            Some("Defaults must be literals of the field's type".to_string())
        }
        (EmitError::UnmappableType { .. }, Some(skip)) => {
            Some(format!("Annotate the field with {} to leave it out of the {} output", skip, backend))
        }
        (EmitError::UnmappableType { .. }, None) => None,
    };
    Diagnostic {
        location: input_line(Some(line)),
        rule: format!("{} ({} backend)", rule, backend),
        hint,
    }
}

fn patch_diagnostic(error: &PatchError) -> Diagnostic {
    let location = match error {
        PatchError::DuplicateMarker { line, .. } | PatchError::EndBeforeBegin { line } => {
            Some(format!("marker line {}", line))
        }
        PatchError::MissingBegin { .. } | PatchError::MissingEnd { .. } => None,
    };
    Diagnostic {
        location,
        rule: "generated region markers".to_string(),
        hint: Some("Patched files need one begin marker line followed by one end marker line".to_string()),
    }
}

/// Print a formatted error message with its chain of causes
pub fn print_error(context: &str, error: &anyhow::Error) {
    eprintln!("{} {}", "Error:".red().bold(), context);
    eprintln!("  {}", error.to_string().red());

    for cause in error.chain().skip(1) {
        eprintln!("  {} {}", "Caused by:".dimmed(), cause.to_string().dimmed());
    }

    if let Some(diagnostic) = diagnose(error) {
        match &diagnostic.location {
            Some(location) => eprintln!("  {} {}: {}", "At:".bold(), location, diagnostic.rule),
            None => eprintln!("  {} {}", "Rule:".bold(), diagnostic.rule),
        }
        if let Some(hint) = &diagnostic.hint {
            eprintln!("\n{} {}", "Suggestion:".cyan().bold(), hint);
        }
    }
}

/// Print an error with a suggestion
pub fn print_error_with_suggestion(context: &str, error: &anyhow::Error, suggestion: &str) {
    print_error(context, error);
    eprintln!("\n{} {}", "Suggestion:".cyan().bold(), suggestion);
}

/// Print a warning message
pub fn print_warning(message: &str) {
    eprintln!("{} {}", "Warning:".yellow().bold(), message);
}
