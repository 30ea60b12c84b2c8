//! Recursive descent parser
//!
//! ```text
//! root      = namespace
//! namespace = "namespace" [ident] "{" block "}"
//! block     = { class | struct | enum | namespace }
//! class     = "class" ident [":" [access] ident] "{" members "}" ";"
//! struct    = "struct" [ident] "{" members "}" [ident] ";"
//! enum      = "enum" "class" ident [":" type] "{" ident {"," ident} "}" ";"
//! members   = { access ":" | group | using | field | method | nested type }
//! ```
//!
//! One token of lookahead, no backtracking. The lexer already split
//! declarations into types, names and blobs, so every decision here is made
//! on the kind of the current token.

use crate::ast::*;
use crate::docs::DocIndex;
use crate::error::{ParseError, Result};
use crate::lexer::{Lexer, LexerOptions, Token, TokenKind};
use crate::stream::{ChannelTokens, TokenSource};

/// A successfully parsed header
#[derive(Debug, Clone, PartialEq)]
pub struct ParseOutput {
    pub root: Root,
    pub docs: DocIndex,
}

pub struct Parser<S: TokenSource> {
    source: S,
    current: Token,
}

/// Parse with the default options on the calling thread
pub fn parse_str(input: &str) -> Result<ParseOutput> {
    parse_str_with(input, LexerOptions::default())
}

pub fn parse_str_with(input: &str, options: LexerOptions) -> Result<ParseOutput> {
    Parser::new(Lexer::with_options(input, options)).parse()
}

/// Parse with the lexer running on its own thread
pub fn parse_str_threaded(
    input: &str,
    options: LexerOptions,
    capacity: usize,
) -> Result<ParseOutput> {
    Parser::new(ChannelTokens::spawn(input.to_string(), options, capacity)).parse()
}

impl<S: TokenSource> Parser<S> {
    pub fn new(mut source: S) -> Self {
        let current = source.next().unwrap_or_else(eof_token);
        Self { source, current }
    }

    pub fn parse(mut self) -> Result<ParseOutput> {
        let result = self.parse_root();
        let Parser { source, .. } = self;
        let docs = source.finish();
        let root = result?;
        log::debug!("parsed namespace '{}' with {} comments", root.namespace.name, docs.len());
        Ok(ParseOutput { root, docs })
    }

    fn parse_root(&mut self) -> Result<Root> {
        if self.check(TokenKind::Eof) {
            return Err(ParseError::EmptyInput);
        }
        let namespace = self.parse_namespace()?;
        self.expect(TokenKind::Eof, "end of input after the top-level namespace")?;
        Ok(Root { line: namespace.line, namespace })
    }

    fn parse_namespace(&mut self) -> Result<Namespace> {
        let keyword = self.expect(TokenKind::Namespace, "'namespace'")?;
        let name = self.accept(TokenKind::Identifier).map(|t| t.text).unwrap_or_default();
        self.expect(TokenKind::OpenBrace, "'{' after namespace name")?;

        let mut children = Vec::new();
        loop {
            let decl = match self.current.kind {
                TokenKind::CloseBrace => break,
                TokenKind::Namespace => Decl::Namespace(self.parse_namespace()?),
                TokenKind::Class => Decl::Class(self.parse_class()?),
                TokenKind::Struct => Decl::Struct(self.parse_struct()?),
                TokenKind::Enum => Decl::Enum(self.parse_enum()?),
                _ => return Err(self.unexpected("namespace, struct, class, or enum")),
            };
            children.push(decl);
        }
        self.expect(TokenKind::CloseBrace, "'}' closing namespace")?;

        Ok(Namespace { line: keyword.line, name, children })
    }

    fn parse_class(&mut self) -> Result<Class> {
        let keyword = self.expect(TokenKind::Class, "'class'")?;
        let name = self.expect(TokenKind::Identifier, "class name")?.text;
        let base = if self.accept(TokenKind::Colon).is_some() {
            self.accept_access();
            Some(self.expect(TokenKind::Identifier, "base class name")?.text)
        } else {
            None
        };
        self.expect(TokenKind::OpenBrace, "'{' after class name")?;
        let members = self.parse_members()?;
        self.expect(TokenKind::CloseBrace, "'}' closing class")?;
        self.expect(TokenKind::Semicolon, "';' after class")?;

        Ok(Class { line: keyword.line, name, base, members })
    }

    fn parse_struct(&mut self) -> Result<Struct> {
        let keyword = self.expect(TokenKind::Struct, "'struct'")?;
        let name = self.accept(TokenKind::Identifier).map(|t| t.text);
        self.expect(TokenKind::OpenBrace, "'{' after struct name")?;
        let members = self.parse_members()?;
        self.expect(TokenKind::CloseBrace, "'}' closing struct")?;
        let instance_name = self.accept(TokenKind::Identifier).map(|t| t.text);
        self.expect(TokenKind::Semicolon, "';' after struct")?;

        Ok(Struct { line: keyword.line, name, members, instance_name })
    }

    fn parse_enum(&mut self) -> Result<Enum> {
        let keyword = self.expect(TokenKind::Enum, "'enum'")?;
        self.expect(TokenKind::Class, "'class' after 'enum'")?;
        let name = self.expect(TokenKind::Identifier, "enum name")?.text;
        let underlying = if self.accept(TokenKind::Colon).is_some() {
            Some(self.expect(TokenKind::SimpleType, "enum base type")?.text)
        } else {
            None
        };
        self.expect(TokenKind::OpenBrace, "'{' after enum name")?;

        let mut values: Vec<String> = Vec::new();
        while let Some(value) = self.accept(TokenKind::Identifier) {
            if values.contains(&value.text) {
                return Err(ParseError::DuplicateEnumValue {
                    name,
                    value: value.text,
                    line: value.line,
                });
            }
            values.push(value.text);
        }
        self.expect(TokenKind::CloseBrace, "enum value or '}'")?;
        if values.is_empty() {
            return Err(ParseError::EmptyEnum { name, line: keyword.line });
        }
        self.expect(TokenKind::Semicolon, "';' after enum")?;

        Ok(Enum { line: keyword.line, name, underlying, values })
    }

    fn parse_members(&mut self) -> Result<Vec<Member>> {
        let mut members = Vec::new();
        loop {
            let member = match self.current.kind {
                TokenKind::CloseBrace => break,
                TokenKind::Public | TokenKind::Protected | TokenKind::Private => {
                    let line = self.current.line;
                    let access = self.accept_access().unwrap_or(Access::Public);
                    self.expect(TokenKind::Colon, "':' after access specifier")?;
                    Member::Access(AccessSpecifier { line, access })
                }
                TokenKind::GroupBegin | TokenKind::GroupEnd => {
                    let token = self.advance();
                    let kind = if token.kind == TokenKind::GroupBegin {
                        GroupKind::Begin
                    } else {
                        GroupKind::End
                    };
                    Member::Group(GroupingDelimiter { line: token.line, kind, doc: token.text })
                }
                TokenKind::Using => Member::Using(self.parse_using()?),
                TokenKind::Class => Member::Class(self.parse_class()?),
                TokenKind::Struct => Member::Struct(self.parse_struct()?),
                TokenKind::Enum => Member::Enum(self.parse_enum()?),
                TokenKind::Template => {
                    self.advance();
                    self.expect(TokenKind::TemplateArgs, "template argument list")?;
                    self.parse_declaration(true)?
                }
                TokenKind::SimpleType => self.parse_declaration(false)?,
                _ => return Err(self.unexpected("member declaration or '}'")),
            };
            members.push(member);
        }
        Ok(members)
    }

    fn parse_using(&mut self) -> Result<Using> {
        let keyword = self.expect(TokenKind::Using, "'using'")?;
        let name = self.expect(TokenKind::Identifier, "alias name")?.text;
        self.expect(TokenKind::Equals, "'=' in using alias")?;
        let rhs = self.expect(TokenKind::SimpleType, "aliased type")?.text;
        self.expect(TokenKind::Semicolon, "';' after using alias")?;
        Ok(Using { line: keyword.line, name, rhs })
    }

    /// A field or a method, told apart by the token after the name
    fn parse_declaration(&mut self, is_template: bool) -> Result<Member> {
        let type_token = self.expect(TokenKind::SimpleType, "member type")?;
        let name = self.expect(TokenKind::Identifier, "member name")?.text;
        let line = type_token.line;

        if self.check(TokenKind::MethodArgs) {
            let arguments = self.advance().text;
            let is_const = self.accept(TokenKind::Const).is_some();
            let is_noexcept = self.accept(TokenKind::Noexcept).is_some();
            let body = match self.current.kind {
                TokenKind::MethodBody => Some(self.advance().text),
                TokenKind::Semicolon => {
                    self.advance();
                    None
                }
                TokenKind::Equals => {
                    self.advance();
                    self.expect(TokenKind::DefaultValue, "method specifier after '='")?;
                    self.expect(TokenKind::Semicolon, "';' after method declaration")?;
                    None
                }
                _ => return Err(self.unexpected("';' or method body")),
            };
            return Ok(Member::Method(Method {
                line,
                name,
                return_type: type_token.text,
                arguments,
                body,
                is_template,
                is_const,
                is_noexcept,
            }));
        }

        if is_template {
            return Err(self.unexpected("argument list of template method"));
        }

        let default = match self.current.kind {
            TokenKind::Semicolon => None,
            TokenKind::Equals => {
                self.advance();
                Some(self.expect(TokenKind::DefaultValue, "default value")?.text)
            }
            _ => return Err(self.unexpected("';', '=' or argument list")),
        };
        self.expect(TokenKind::Semicolon, "';' after field")?;

        Ok(Member::Field(Field { line, name, field_type: type_token.text, default }))
    }

    // Token helpers

    fn advance(&mut self) -> Token {
        let next = self.source.next().unwrap_or_else(|| eof_token_at(&self.current));
        std::mem::replace(&mut self.current, next)
    }

    fn check(&self, kind: TokenKind) -> bool {
        self.current.kind == kind
    }

    fn accept(&mut self, kind: TokenKind) -> Option<Token> {
        if self.check(kind) {
            Some(self.advance())
        } else {
            None
        }
    }

    fn accept_access(&mut self) -> Option<Access> {
        let access = match self.current.kind {
            TokenKind::Public => Access::Public,
            TokenKind::Protected => Access::Protected,
            TokenKind::Private => Access::Private,
            _ => return None,
        };
        self.advance();
        Some(access)
    }

    fn expect(&mut self, kind: TokenKind, expected: &str) -> Result<Token> {
        if self.check(kind) {
            Ok(self.advance())
        } else {
            Err(self.unexpected(expected))
        }
    }

    fn unexpected(&self, expected: &str) -> ParseError {
        match self.current.kind {
            TokenKind::Error => {
                ParseError::Lex { message: self.current.text.clone(), line: self.current.line }
            }
            _ => ParseError::Expected {
                expected: expected.to_string(),
                found: self.current.to_string(),
                line: self.current.line,
            },
        }
    }
}

fn eof_token() -> Token {
    Token { kind: TokenKind::Eof, text: String::new(), offset: 0, line: 1 }
}

/// Sources stop after `Eof` or `Error`; keep reporting where they stopped
fn eof_token_at(last: &Token) -> Token {
    match last.kind {
        TokenKind::Error => last.clone(),
        _ => Token { kind: TokenKind::Eof, text: String::new(), offset: last.offset, line: last.line },
    }
}
