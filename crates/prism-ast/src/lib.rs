pub mod ast;
pub mod directives;
pub mod docs;
pub mod error;
pub mod lexer;
pub mod parser;
pub mod stream;

// Re-export commonly used items
pub use ast::{DefaultValue, Root};
pub use directives::{resolve, Directives, Flags, Resolved};
pub use docs::DocIndex;
pub use error::{DirectiveError, ParseError, Position, Result};
pub use lexer::{Lexer, LexerOptions, Token, TokenKind};
pub use parser::{parse_str, parse_str_threaded, parse_str_with, ParseOutput, Parser};
pub use stream::{ChannelTokens, TokenSource};
