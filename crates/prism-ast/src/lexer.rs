//! Context-aware scanner for annotated headers
//!
//! The grammar is ambiguous without context: `{1, 2, 3}` is a default value
//! after `=`, a method body after an argument list and a type body after
//! `struct`. The scanner therefore runs a small state machine that knows which
//! construct it is inside, and hands the parser unparsed blobs (argument
//! lists, bodies, template arguments, default values) as single tokens.

use crate::docs::{clean_comment, Comment, DocIndex};
use crate::error::{ParseError, Position};
use serde::Serialize;
use std::collections::VecDeque;
use std::fmt;

/// Annotation macros that are dropped wherever they appear
pub const DEFAULT_IGNORED_MACROS: &[&str] = &[
    "UTILS_PUBLIC",
    "UTILS_PRIVATE",
    "UTILS_DEPRECATED",
    "UTILS_NOINLINE",
    "UTILS_ALWAYS_INLINE",
    "UTILS_NONNULL",
    "UTILS_NULLABLE",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum TokenKind {
    Error,
    Eof,

    // Doc group markers (`/** @{ */` and `/** @} */`)
    GroupBegin,
    GroupEnd,

    // Text tokens
    Identifier,
    SimpleType,
    MethodBody,
    MethodArgs,
    TemplateArgs,
    DefaultValue,

    // Symbols
    OpenBrace,
    CloseBrace,
    Semicolon,
    Colon,
    Equals,

    // Keywords
    Namespace,
    Class,
    Struct,
    Enum,
    Template,
    Const,
    Noexcept,
    Public,
    Protected,
    Private,
    Using,
}

impl TokenKind {
    /// Human readable description used in diagnostics
    pub fn describe(&self) -> &'static str {
        match self {
            TokenKind::Error => "error",
            TokenKind::Eof => "end of input",
            TokenKind::GroupBegin => "group begin marker",
            TokenKind::GroupEnd => "group end marker",
            TokenKind::Identifier => "identifier",
            TokenKind::SimpleType => "type",
            TokenKind::MethodBody => "method body",
            TokenKind::MethodArgs => "argument list",
            TokenKind::TemplateArgs => "template arguments",
            TokenKind::DefaultValue => "default value",
            TokenKind::OpenBrace => "'{'",
            TokenKind::CloseBrace => "'}'",
            TokenKind::Semicolon => "';'",
            TokenKind::Colon => "':'",
            TokenKind::Equals => "'='",
            TokenKind::Namespace => "'namespace'",
            TokenKind::Class => "'class'",
            TokenKind::Struct => "'struct'",
            TokenKind::Enum => "'enum'",
            TokenKind::Template => "'template'",
            TokenKind::Const => "'const'",
            TokenKind::Noexcept => "'noexcept'",
            TokenKind::Public => "'public'",
            TokenKind::Protected => "'protected'",
            TokenKind::Private => "'private'",
            TokenKind::Using => "'using'",
        }
    }

    pub fn is_keyword(&self) -> bool {
        matches!(
            self,
            TokenKind::Namespace
                | TokenKind::Class
                | TokenKind::Struct
                | TokenKind::Enum
                | TokenKind::Template
                | TokenKind::Const
                | TokenKind::Noexcept
                | TokenKind::Public
                | TokenKind::Protected
                | TokenKind::Private
                | TokenKind::Using
        )
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Token {
    pub kind: TokenKind,
    pub text: String,
    pub offset: usize,
    pub line: usize,
}

impl Token {
    pub fn pos(&self) -> Position {
        Position::new(self.offset, self.line)
    }
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.kind {
            TokenKind::Eof => write!(f, "end of input"),
            TokenKind::Error => write!(f, "{}", self.text),
            kind if kind.is_keyword() => write!(f, "<{}>", self.text),
            _ if self.text.chars().count() > 10 => {
                let head: String = self.text.chars().take(10).collect();
                write!(f, "{:?}...", head)
            }
            _ => write!(f, "{:?}", self.text),
        }
    }
}

#[derive(Debug, Clone)]
pub struct LexerOptions {
    pub ignored_macros: Vec<String>,
}

impl Default for LexerOptions {
    fn default() -> Self {
        Self { ignored_macros: DEFAULT_IGNORED_MACROS.iter().map(|m| m.to_string()).collect() }
    }
}

impl LexerOptions {
    /// Defaults plus the given extra macro names
    pub fn with_extra_macros<I, S>(extra: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut options = Self::default();
        for name in extra {
            let name = name.into();
            if !options.ignored_macros.contains(&name) {
                options.ignored_macros.push(name);
            }
        }
        options
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    Root,
    NamespaceHeader,
    Block,
    StructHeader,
    ClassHeader,
    EnumHeader,
    EnumBody,
    Members,
    AfterTypeBody,
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Scope {
    Namespace,
    Record(Option<String>),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Blob {
    Args,
    Body,
    Template,
    Default,
}

impl Blob {
    fn describe(self) -> &'static str {
        match self {
            Blob::Args => "argument list",
            Blob::Body => "method body",
            Blob::Template => "template argument list",
            Blob::Default => "default value",
        }
    }
}

enum Trivia {
    Done,
    Group,
}

/// A word of a member declaration, before it is split into type and name
struct Word {
    text: String,
    offset: usize,
    line: usize,
}

impl Word {
    fn is_punct(&self) -> bool {
        self.text == "*" || self.text == "&" || self.text == "&&"
    }
}

type StepResult = Option<State>;

pub struct Lexer<'a> {
    input: &'a str,
    options: LexerOptions,
    pos: usize,
    start: usize,
    line: usize,
    start_line: usize,
    at_eof: bool,
    paren_depth: usize,
    brace_depth: usize,
    angle_depth: usize,
    state: Option<State>,
    scopes: Vec<Scope>,
    pending: VecDeque<Token>,
    docs: DocIndex,
    last_token_line: usize,
}

impl<'a> Lexer<'a> {
    pub fn new(input: &'a str) -> Self {
        Self::with_options(input, LexerOptions::default())
    }

    pub fn with_options(input: &'a str, options: LexerOptions) -> Self {
        Self {
            input,
            options,
            pos: 0,
            start: 0,
            line: 1,
            start_line: 1,
            at_eof: false,
            paren_depth: 0,
            brace_depth: 0,
            angle_depth: 0,
            state: Some(State::Root),
            scopes: Vec::new(),
            pending: VecDeque::new(),
            docs: DocIndex::new(),
            last_token_line: 0,
        }
    }

    /// Scan the whole input. The returned tokens end with `Eof`.
    pub fn tokenize(&mut self) -> Result<Vec<Token>, ParseError> {
        let mut tokens = Vec::new();
        for token in self.by_ref() {
            if token.kind == TokenKind::Error {
                return Err(ParseError::Lex { message: token.text, line: token.line });
            }
            tokens.push(token);
        }
        Ok(tokens)
    }

    /// Comments seen so far, indexed by line
    pub fn docs(&self) -> &DocIndex {
        &self.docs
    }

    pub fn into_docs(self) -> DocIndex {
        self.docs
    }

    // Cursor

    fn next_char(&mut self) -> Option<char> {
        match self.input[self.pos..].chars().next() {
            Some(ch) => {
                self.pos += ch.len_utf8();
                if ch == '\n' {
                    self.line += 1;
                }
                Some(ch)
            }
            None => {
                self.at_eof = true;
                None
            }
        }
    }

    /// Step back one char. Undoes a read that hit the end of input as a no-op.
    fn backup(&mut self) {
        if self.at_eof {
            self.at_eof = false;
            return;
        }
        if let Some(ch) = self.input[..self.pos].chars().next_back() {
            self.pos -= ch.len_utf8();
            if ch == '\n' {
                self.line -= 1;
            }
        }
    }

    fn backup_n(&mut self, count: usize) {
        for _ in 0..count {
            self.backup();
        }
    }

    fn peek(&mut self) -> Option<char> {
        let ch = self.next_char();
        self.backup();
        ch
    }

    fn peek_second(&self) -> Option<char> {
        let mut chars = self.input[self.pos..].chars();
        chars.next();
        chars.next()
    }

    fn is_eof(&self) -> bool {
        self.pos >= self.input.len()
    }

    fn accept_char(&mut self, expected: char) -> bool {
        if self.next_char() == Some(expected) {
            return true;
        }
        self.backup();
        false
    }

    fn accept_str(&mut self, expected: &str) -> bool {
        for (i, ch) in expected.chars().enumerate() {
            if self.next_char() != Some(ch) {
                self.backup_n(i + 1);
                return false;
            }
        }
        true
    }

    fn accept_identifier(&mut self) -> bool {
        match self.next_char() {
            Some(ch) if ch == '_' || ch.is_alphabetic() => {}
            _ => {
                self.backup();
                return false;
            }
        }
        while self.next_char().is_some_and(is_alphanumeric) {}
        self.backup();
        true
    }

    /// Identifier with optional `::` separated segments
    fn accept_qualified_identifier(&mut self) -> bool {
        let begin = self.pos;
        self.accept_str("::");
        if !self.accept_identifier() {
            self.rewind_to(begin);
            return false;
        }
        loop {
            let before = self.pos;
            if !self.accept_str("::") {
                return true;
            }
            if !self.accept_identifier() {
                self.rewind_to(before);
                return true;
            }
        }
    }

    fn accept_keyword(&mut self, keyword: &str) -> bool {
        let begin = self.pos;
        if !self.accept_str(keyword) {
            return false;
        }
        if self.peek().is_some_and(is_alphanumeric) {
            self.rewind_to(begin);
            return false;
        }
        true
    }

    fn rewind_to(&mut self, pos: usize) {
        while self.pos > pos {
            self.backup();
        }
    }

    fn peek_identifier(&self) -> Option<&'a str> {
        let input = self.input;
        let rest = &input[self.pos..];
        let mut chars = rest.char_indices();
        match chars.next() {
            Some((_, ch)) if ch == '_' || ch.is_alphabetic() => {}
            _ => return None,
        }
        let end = chars.find(|(_, ch)| !is_alphanumeric(*ch)).map(|(i, _)| i).unwrap_or(rest.len());
        Some(&rest[..end])
    }

    fn pending_text(&self) -> &'a str {
        let input = self.input;
        &input[self.start..self.pos]
    }

    // Output

    fn emit(&mut self, kind: TokenKind) {
        let text = self.pending_text().to_string();
        self.emit_text(kind, text);
    }

    fn emit_text(&mut self, kind: TokenKind, text: String) {
        let (offset, line) = (self.start, self.start_line);
        self.push_token(kind, text, offset, line);
        self.ignore();
    }

    fn push_token(&mut self, kind: TokenKind, text: String, offset: usize, line: usize) {
        log::trace!("token {:?} {:?} at line {}", kind, text, line);
        self.pending.push_back(Token { kind, text, offset, line });
        self.last_token_line = self.line;
    }

    fn ignore(&mut self) {
        self.start = self.pos;
        self.start_line = self.line;
    }

    fn errorf(&mut self, message: impl Into<String>) -> StepResult {
        let line = self.line;
        self.error_at(line, message)
    }

    fn error_at(&mut self, line: usize, message: impl Into<String>) -> StepResult {
        self.pending.push_back(Token {
            kind: TokenKind::Error,
            text: message.into(),
            offset: self.start,
            line,
        });
        None
    }

    /// The state that resumes the body enclosing the construct just closed
    fn body_state(&self) -> State {
        match self.scopes.last() {
            Some(Scope::Namespace) => State::Block,
            Some(Scope::Record(_)) => State::Members,
            None => State::Root,
        }
    }

    // Trivia

    /// Skip whitespace, comments, preprocessor lines and ignored macros.
    ///
    /// With `groups` set, a doc comment holding a group marker is emitted as a
    /// token and scanning stops there.
    fn skip_trivia(&mut self, groups: bool) -> Result<Trivia, (usize, String)> {
        loop {
            let Some(ch) = self.peek() else {
                break;
            };
            if ch.is_whitespace() {
                self.next_char();
                continue;
            }
            if ch == '/' && self.peek_second() == Some('/') {
                self.skip_line_comment();
                continue;
            }
            if ch == '/' && self.peek_second() == Some('*') {
                if let Some(kind) = self.skip_block_comment(groups)? {
                    self.emit(kind);
                    return Ok(Trivia::Group);
                }
                continue;
            }
            if ch == '#' {
                self.skip_preprocessor()?;
                continue;
            }
            if let Some(word) = self.peek_identifier() {
                if self.options.ignored_macros.iter().any(|m| m == word) {
                    self.skip_macro(word.len())?;
                    continue;
                }
            }
            break;
        }
        self.ignore();
        Ok(Trivia::Done)
    }

    fn skip_line_comment(&mut self) {
        let (begin, line) = (self.pos, self.line);
        while let Some(ch) = self.next_char() {
            if ch == '\n' {
                self.backup();
                break;
            }
        }
        let input = self.input;
        self.record_comment(&input[begin..self.pos], line);
    }

    /// Returns the group marker kind when the comment is promoted to a token
    fn skip_block_comment(&mut self, groups: bool) -> Result<Option<TokenKind>, (usize, String)> {
        let (begin, line) = (self.pos, self.line);
        self.next_char();
        self.next_char();
        loop {
            match self.next_char() {
                None => return Err((line, "Unterminated block comment".to_string())),
                Some('*') if self.peek() == Some('/') => {
                    self.next_char();
                    break;
                }
                Some(_) => {}
            }
        }
        let input = self.input;
        let raw = &input[begin..self.pos];
        if groups && raw.starts_with("/**") {
            let marker = if raw.contains("@{") {
                Some(TokenKind::GroupBegin)
            } else if raw.contains("@}") {
                Some(TokenKind::GroupEnd)
            } else {
                None
            };
            if marker.is_some() {
                self.start = begin;
                self.start_line = line;
                return Ok(marker);
            }
        }
        self.record_comment(raw, line);
        Ok(None)
    }

    fn record_comment(&mut self, raw: &str, line: usize) {
        let trailing = self.last_token_line == line;
        self.docs.insert(Comment { line, end_line: self.line, text: clean_comment(raw), trailing });
    }

    fn skip_preprocessor(&mut self) -> Result<(), (usize, String)> {
        let (begin, line) = (self.pos, self.line);
        let mut previous = '\0';
        while let Some(ch) = self.next_char() {
            if ch == '\n' && previous != '\\' {
                self.backup();
                break;
            }
            if ch != '\r' {
                previous = ch;
            }
        }
        let input = self.input;
        let directive = &input[begin..self.pos];
        let words: Vec<&str> = directive.trim_start_matches('#').split_whitespace().collect();
        // A bare `#define NAME` (include guard) carries no definition
        if words.first() == Some(&"define") && words.len() > 2 {
            return Err((line, "Macro definitions are not supported".to_string()));
        }
        if words.first() == Some(&"define") && words.get(1).is_some_and(|w| w.contains('(')) {
            return Err((line, "Macro definitions are not supported".to_string()));
        }
        Ok(())
    }

    fn skip_macro(&mut self, len: usize) -> Result<(), (usize, String)> {
        let line = self.line;
        let target = self.pos + len;
        while self.pos < target {
            self.next_char();
        }
        let resume = self.pos;
        while self.peek().is_some_and(|c| c == ' ' || c == '\t') {
            self.next_char();
        }
        if self.peek() == Some('(') {
            self.scan_blob(Blob::Args).map_err(|message| (line, message))?;
        } else {
            self.rewind_to(resume);
        }
        Ok(())
    }

    /// Skip trivia, turning a failure into an error token
    fn trivia(&mut self, groups: bool) -> Option<Trivia> {
        match self.skip_trivia(groups) {
            Ok(trivia) => Some(trivia),
            Err((line, message)) => {
                self.error_at(line, message);
                None
            }
        }
    }

    // Blobs

    fn skip_literal(&mut self, quote: char) -> Result<(), String> {
        loop {
            match self.next_char() {
                None => return Err("Unterminated literal".to_string()),
                Some('\\') => {
                    self.next_char();
                }
                Some('\n') => return Err("Multi-line string literals are not supported".to_string()),
                Some(ch) if ch == quote => return Ok(()),
                Some(_) => {}
            }
        }
    }

    /// Consume a delimiter-balanced span. The cursor must be on the opening
    /// delimiter, except for default values which run up to a top-level `;`.
    fn scan_blob(&mut self, blob: Blob) -> Result<(), String> {
        self.paren_depth = 0;
        self.brace_depth = 0;
        self.angle_depth = 0;
        loop {
            let Some(ch) = self.next_char() else {
                return Err(format!("Unterminated {}", blob.describe()));
            };
            match ch {
                '"' | '\'' => self.skip_literal(ch)?,
                '/' if self.peek() == Some('/') => {
                    while let Some(c) = self.next_char() {
                        if c == '\n' {
                            self.backup();
                            break;
                        }
                    }
                }
                '/' if self.peek() == Some('*') => {
                    self.next_char();
                    loop {
                        match self.next_char() {
                            None => return Err("Unterminated block comment".to_string()),
                            Some('*') if self.peek() == Some('/') => {
                                self.next_char();
                                break;
                            }
                            Some(_) => {}
                        }
                    }
                }
                '(' => self.paren_depth += 1,
                ')' => {
                    if self.paren_depth == 0 {
                        return Err(format!("Unbalanced ')' in {}", blob.describe()));
                    }
                    self.paren_depth -= 1;
                }
                '{' => self.brace_depth += 1,
                '}' => {
                    if self.brace_depth == 0 {
                        return Err(format!("Unbalanced '}}' in {}", blob.describe()));
                    }
                    self.brace_depth -= 1;
                }
                '<' if self.paren_depth == 0 => self.angle_depth += 1,
                '>' if self.paren_depth == 0 && self.angle_depth > 0 => self.angle_depth -= 1,
                ';' if blob == Blob::Default && self.paren_depth == 0 && self.brace_depth == 0 => {
                    self.backup();
                    return Ok(());
                }
                _ => {}
            }
            let closed = match blob {
                Blob::Args => ch == ')' && self.paren_depth == 0,
                Blob::Body => ch == '}' && self.brace_depth == 0,
                Blob::Template => ch == '>' && self.angle_depth == 0,
                Blob::Default => false,
            };
            if closed {
                return Ok(());
            }
        }
    }

    fn lex_blob(&mut self, blob: Blob, kind: TokenKind) -> bool {
        let line = self.line;
        match self.scan_blob(blob) {
            Ok(()) => {
                let text = self.pending_text().trim().to_string();
                self.emit_text(kind, text);
                true
            }
            Err(message) => {
                self.error_at(line, message);
                false
            }
        }
    }

    // States

    fn step(&mut self, state: State) -> StepResult {
        match state {
            State::Root => self.lex_root(),
            State::NamespaceHeader => self.lex_namespace_header(),
            State::Block => self.lex_block(),
            State::StructHeader => self.lex_struct_header(),
            State::ClassHeader => self.lex_class_header(),
            State::EnumHeader => self.lex_enum_header(),
            State::EnumBody => self.lex_enum_body(),
            State::Members => self.lex_members(),
            State::AfterTypeBody => self.lex_after_type_body(),
        }
    }

    fn lex_root(&mut self) -> StepResult {
        self.trivia(false)?;
        if self.is_eof() {
            self.emit(TokenKind::Eof);
            return None;
        }
        if self.accept_keyword("namespace") {
            self.emit(TokenKind::Namespace);
            return Some(State::NamespaceHeader);
        }
        self.errorf("Expected namespace")
    }

    fn lex_namespace_header(&mut self) -> StepResult {
        self.trivia(false)?;
        if self.accept_identifier() {
            self.emit(TokenKind::Identifier);
            self.trivia(false)?;
        }
        if self.accept_char('{') {
            self.emit(TokenKind::OpenBrace);
            self.scopes.push(Scope::Namespace);
            return Some(State::Block);
        }
        self.errorf("Badly formed namespace")
    }

    fn lex_block(&mut self) -> StepResult {
        self.trivia(false)?;
        if self.is_eof() {
            return self.errorf("Unexpected end of input inside namespace");
        }
        if self.accept_char('}') {
            self.emit(TokenKind::CloseBrace);
            self.scopes.pop();
            return Some(self.body_state());
        }
        match self.lex_type_keyword() {
            Some(next) => next,
            None => self.errorf("Expected namespace, struct, class, or enum"),
        }
    }

    /// Dispatch on a type-introducing keyword. `None` when there is none.
    fn lex_type_keyword(&mut self) -> Option<StepResult> {
        if self.accept_keyword("namespace") {
            if self.scopes.last() != Some(&Scope::Namespace) {
                return Some(self.errorf("Namespaces may only be nested in namespaces"));
            }
            self.emit(TokenKind::Namespace);
            return Some(Some(State::NamespaceHeader));
        }
        if self.accept_keyword("struct") {
            self.emit(TokenKind::Struct);
            return Some(Some(State::StructHeader));
        }
        if self.accept_keyword("class") {
            self.emit(TokenKind::Class);
            return Some(Some(State::ClassHeader));
        }
        if self.accept_keyword("enum") {
            self.emit(TokenKind::Enum);
            return Some(Some(State::EnumHeader));
        }
        None
    }

    fn lex_struct_header(&mut self) -> StepResult {
        self.trivia(false)?;
        let mut name = None;
        if self.accept_identifier() {
            name = Some(self.pending_text().to_string());
            self.emit(TokenKind::Identifier);
            self.trivia(false)?;
        }
        if self.accept_char('{') {
            self.emit(TokenKind::OpenBrace);
            self.scopes.push(Scope::Record(name));
            return Some(State::Members);
        }
        self.errorf("Badly formed struct")
    }

    fn lex_class_header(&mut self) -> StepResult {
        self.trivia(false)?;
        if !self.accept_identifier() {
            return self.errorf("Anonymous classes are illegal");
        }
        let name = self.pending_text().to_string();
        self.emit(TokenKind::Identifier);
        self.trivia(false)?;
        if self.accept_char(':') {
            self.emit(TokenKind::Colon);
            self.trivia(false)?;
            for (keyword, kind) in ACCESS_KEYWORDS {
                if self.accept_keyword(keyword) {
                    self.emit(kind);
                    self.trivia(false)?;
                    break;
                }
            }
            if !self.accept_qualified_identifier() {
                return self.errorf("Badly formed base class");
            }
            self.emit(TokenKind::Identifier);
            self.trivia(false)?;
        }
        if self.accept_char('{') {
            self.emit(TokenKind::OpenBrace);
            self.scopes.push(Scope::Record(Some(name)));
            return Some(State::Members);
        }
        self.errorf("Badly formed class")
    }

    fn lex_enum_header(&mut self) -> StepResult {
        self.trivia(false)?;
        if !self.accept_keyword("class") {
            return self.errorf("Enums must be scoped (enum class)");
        }
        self.emit(TokenKind::Class);
        self.trivia(false)?;
        if !self.accept_identifier() {
            return self.errorf("Anonymous enums are illegal");
        }
        self.emit(TokenKind::Identifier);
        self.trivia(false)?;
        if self.accept_char(':') {
            self.emit(TokenKind::Colon);
            self.trivia(false)?;
            while self.next_char().is_some_and(|c| is_alphanumeric(c) || c == ':' || c == ' ') {}
            self.backup();
            let text = self.pending_text().trim().to_string();
            if text.is_empty() {
                return self.errorf("Badly formed enum base type");
            }
            self.emit_text(TokenKind::SimpleType, text);
            self.trivia(false)?;
        }
        if self.accept_char('{') {
            self.emit(TokenKind::OpenBrace);
            return Some(State::EnumBody);
        }
        self.errorf("Badly formed enum")
    }

    fn lex_enum_body(&mut self) -> StepResult {
        self.trivia(false)?;
        if self.accept_char('}') {
            self.emit(TokenKind::CloseBrace);
            self.trivia(false)?;
            if self.accept_char(';') {
                self.emit(TokenKind::Semicolon);
                return Some(self.body_state());
            }
            return self.errorf("Expected ';' after enum");
        }
        if !self.accept_identifier() {
            return self.errorf("Badly formed enum");
        }
        self.emit(TokenKind::Identifier);
        self.trivia(false)?;
        if self.accept_char(',') {
            self.ignore();
            return Some(State::EnumBody);
        }
        match self.peek() {
            Some('}') => Some(State::EnumBody),
            Some('=') => self.errorf("Enum values must not be assigned explicitly"),
            _ => self.errorf("Badly formed enum value"),
        }
    }

    fn lex_members(&mut self) -> StepResult {
        if let Trivia::Group = self.trivia(true)? {
            return Some(State::Members);
        }
        if self.is_eof() {
            return self.errorf("Unexpected end of input inside struct or class");
        }
        if self.accept_char('}') {
            self.emit(TokenKind::CloseBrace);
            self.scopes.pop();
            return Some(State::AfterTypeBody);
        }
        for (keyword, kind) in ACCESS_KEYWORDS {
            if self.accept_keyword(keyword) {
                self.emit(kind);
                self.trivia(false)?;
                if self.accept_char(':') {
                    self.emit(TokenKind::Colon);
                    return Some(State::Members);
                }
                return self.errorf("Expected ':' after access specifier");
            }
        }
        if self.accept_keyword("using") {
            self.emit(TokenKind::Using);
            return self.lex_using();
        }
        if let Some(next) = self.lex_type_keyword() {
            return next;
        }
        if self.accept_keyword("template") {
            self.emit(TokenKind::Template);
            self.trivia(false)?;
            if self.peek() != Some('<') {
                return self.errorf("Expected template argument list");
            }
            if !self.lex_blob(Blob::Template, TokenKind::TemplateArgs) {
                return None;
            }
        }
        self.lex_declaration()
    }

    fn lex_using(&mut self) -> StepResult {
        self.trivia(false)?;
        if !self.accept_identifier() {
            return self.errorf("Badly formed using alias");
        }
        self.emit(TokenKind::Identifier);
        self.trivia(false)?;
        if !self.accept_char('=') {
            return self.errorf("Badly formed using alias");
        }
        self.emit(TokenKind::Equals);
        self.trivia(false)?;
        let line = self.line;
        if let Err(message) = self.scan_blob(Blob::Default) {
            return self.error_at(line, message);
        }
        let text = normalize_space(self.pending_text());
        if text.is_empty() {
            return self.errorf("Badly formed using alias");
        }
        self.emit_text(TokenKind::SimpleType, text);
        self.accept_char(';');
        self.emit(TokenKind::Semicolon);
        Some(State::Members)
    }

    fn lex_after_type_body(&mut self) -> StepResult {
        self.trivia(false)?;
        if self.accept_identifier() {
            self.emit(TokenKind::Identifier);
            self.trivia(false)?;
        }
        if self.accept_char(';') {
            self.emit(TokenKind::Semicolon);
            return Some(self.body_state());
        }
        self.errorf("Expected ';' after struct or class")
    }

    /// A field or method: type words, a name, then whatever follows the name
    fn lex_declaration(&mut self) -> StepResult {
        let mut words: Vec<Word> = Vec::new();
        loop {
            self.trivia(false)?;
            let (offset, line) = (self.pos, self.line);
            let Some(ch) = self.peek() else {
                return self.errorf("Unexpected end of input in declaration");
            };
            match ch {
                '(' | ';' | '=' | '{' => break,
                '*' | '&' => {
                    self.next_char();
                    if ch == '&' {
                        self.accept_char('&');
                    }
                    words.push(Word { text: self.input[offset..self.pos].to_string(), offset, line });
                }
                '~' => {
                    self.next_char();
                    if !self.accept_identifier() {
                        return self.errorf("Badly formed destructor");
                    }
                    words.push(Word { text: self.input[offset..self.pos].to_string(), offset, line });
                }
                '<' => {
                    return self.errorf(
                        "Template types are not supported in declarations; introduce a using alias",
                    )
                }
                '[' => return self.errorf("Array members are not supported"),
                ',' => return self.errorf("Multiple declarators are not supported"),
                ':' if self.peek_second() != Some(':') => {
                    return self.errorf("Bit fields are not supported")
                }
                _ if ch == '_' || ch == ':' || ch.is_alphabetic() => {
                    if !self.accept_qualified_identifier() {
                        return self.errorf(format!("Unexpected character '{}'", ch));
                    }
                    let mut text = self.input[offset..self.pos].to_string();
                    if text == "operator" || text.ends_with("::operator") {
                        text.push_str(&self.scan_operator_symbol());
                    }
                    words.push(Word { text, offset, line });
                }
                _ => return self.errorf(format!("Unexpected character '{}'", ch)),
            }
        }

        let terminator = self.peek();
        let Some(name) = words.pop() else {
            return self.errorf("Expected a declaration");
        };
        if name.is_punct() {
            return self.errorf("Expected a member name");
        }
        if words.is_empty() {
            let is_special = terminator == Some('(')
                && (name.text.starts_with('~')
                    || matches!(self.scopes.last(), Some(Scope::Record(Some(n))) if *n == name.text));
            if !is_special {
                return match terminator {
                    Some('(') => self.errorf(
                        "Type text may not contain parentheses; introduce a using alias",
                    ),
                    _ => self.errorf("Expected a type and a name"),
                };
            }
        }

        let type_text = join_type_words(&words);
        let (type_offset, type_line) =
            words.first().map(|w| (w.offset, w.line)).unwrap_or((name.offset, name.line));
        self.push_token(TokenKind::SimpleType, type_text, type_offset, type_line);
        self.push_token(TokenKind::Identifier, name.text, name.offset, name.line);
        self.ignore();

        match terminator {
            Some('(') => self.lex_method_tail(),
            Some(';') => {
                self.next_char();
                self.emit(TokenKind::Semicolon);
                Some(State::Members)
            }
            Some('=') => {
                self.next_char();
                self.emit(TokenKind::Equals);
                self.lex_default_value()
            }
            _ => self.errorf("Brace initialization is not supported; use '= { ... }'"),
        }
    }

    fn scan_operator_symbol(&mut self) -> String {
        let begin = self.pos;
        while self.peek().is_some_and(|c| c == ' ') {
            self.next_char();
        }
        if self.peek() == Some('(') && self.peek_second() == Some(')') {
            self.next_char();
            self.next_char();
        } else {
            while self.peek().is_some_and(|c| "+-*/%^&|~!=<>[],".contains(c)) {
                self.next_char();
            }
        }
        self.input[begin..self.pos].trim().to_string()
    }

    fn lex_default_value(&mut self) -> StepResult {
        self.trivia(false)?;
        if !self.lex_blob(Blob::Default, TokenKind::DefaultValue) {
            return None;
        }
        if self.pending.back().is_some_and(|t| t.text.is_empty()) {
            return self.errorf("Missing default value");
        }
        if !self.accept_char(';') {
            return self.errorf("Expected ';' after default value");
        }
        self.emit(TokenKind::Semicolon);
        Some(State::Members)
    }

    fn lex_method_tail(&mut self) -> StepResult {
        if !self.lex_blob(Blob::Args, TokenKind::MethodArgs) {
            return None;
        }
        loop {
            self.trivia(false)?;
            if self.accept_keyword("const") {
                self.emit(TokenKind::Const);
            } else if self.accept_keyword("noexcept") {
                self.emit(TokenKind::Noexcept);
                self.trivia(false)?;
                if self.peek() == Some('(') {
                    let line = self.line;
                    if let Err(message) = self.scan_blob(Blob::Args) {
                        return self.error_at(line, message);
                    }
                    self.ignore();
                }
            } else if self.accept_keyword("override") || self.accept_keyword("final") {
                self.ignore();
            } else {
                break;
            }
        }
        match self.peek() {
            Some(';') => {
                self.next_char();
                self.emit(TokenKind::Semicolon);
                Some(State::Members)
            }
            Some('{') => {
                if !self.lex_blob(Blob::Body, TokenKind::MethodBody) {
                    return None;
                }
                Some(State::Members)
            }
            Some('=') => {
                self.next_char();
                self.emit(TokenKind::Equals);
                self.lex_default_value()
            }
            _ => self.errorf("Badly formed method"),
        }
    }
}

impl Iterator for Lexer<'_> {
    type Item = Token;

    fn next(&mut self) -> Option<Token> {
        loop {
            if let Some(token) = self.pending.pop_front() {
                return Some(token);
            }
            let state = self.state.take()?;
            self.state = self.step(state);
        }
    }
}

const ACCESS_KEYWORDS: [(&str, TokenKind); 3] = [
    ("public", TokenKind::Public),
    ("protected", TokenKind::Protected),
    ("private", TokenKind::Private),
];

fn is_alphanumeric(ch: char) -> bool {
    ch == '_' || ch.is_alphanumeric()
}

fn normalize_space(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// `["Texture", "*", "const"]` becomes `Texture* const`
fn join_type_words(words: &[Word]) -> String {
    let mut out = String::new();
    for word in words {
        if !out.is_empty() && !word.is_punct() {
            out.push(' ');
        }
        out.push_str(&word.text);
    }
    out
}
