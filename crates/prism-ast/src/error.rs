use std::fmt;

/// Position in source text
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Position {
    pub offset: usize, // Byte offset
    pub line: usize,   // Line number (1-based)
}

impl Position {
    pub fn new(offset: usize, line: usize) -> Self {
        Self { offset, line }
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "line {}", self.line)
    }
}

/// Parser errors
///
/// Parsing halts at the first defect, so each variant describes exactly one
/// problem together with the line it was found on.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ParseError {
    #[error("Lexical error at line {line}: {message}")]
    Lex { message: String, line: usize },

    #[error("Expected {expected}, found {found} at line {line}")]
    Expected { expected: String, found: String, line: usize },

    #[error("Duplicate value '{value}' in enum {name} at line {line}")]
    DuplicateEnumValue { name: String, value: String, line: usize },

    #[error("Enum {name} has no values at line {line}")]
    EmptyEnum { name: String, line: usize },

    #[error("Empty input")]
    EmptyInput,
}

impl ParseError {
    /// Line the error was reported at, if any
    pub fn line(&self) -> Option<usize> {
        match self {
            ParseError::Lex { line, .. }
            | ParseError::Expected { line, .. }
            | ParseError::DuplicateEnumValue { line, .. }
            | ParseError::EmptyEnum { line, .. } => Some(*line),
            ParseError::EmptyInput => None,
        }
    }
}

/// Directive resolution errors
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DirectiveError {
    #[error("Unknown directive '%{name}%' at line {line}")]
    Unknown { name: String, line: usize },
}

impl DirectiveError {
    pub fn line(&self) -> usize {
        match self {
            DirectiveError::Unknown { line, .. } => *line,
        }
    }
}

pub type Result<T> = std::result::Result<T, ParseError>;
