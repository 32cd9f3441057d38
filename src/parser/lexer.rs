//! Lexer (tokenizer) for the hosted language
//!
//! Converts raw source text into a flat [`Token`] stream consumed by the parser.
//! Indentation is significant: the lexer tracks an indentation stack and emits
//! synthetic [`TokenKind::Indent`] / [`TokenKind::Dedent`] tokens, and ends every
//! logical line with [`TokenKind::Newline`]. Line breaks inside brackets and
//! after a trailing backslash do not end a logical line.

use super::ast::SourceLocation;
use std::fmt;

/// Token variants produced by the lexer.
#[derive(Debug, Clone, PartialEq)]
pub enum TokenKind {
    // Literals
    Int(i64),
    Float(f64),
    Str(String),
    Bytes(Vec<u8>),
    /// f-string body with escapes already processed; fields are still `{...}`
    FString(String),

    Ident(String),

    // Keywords
    Def,
    Return,
    If,
    Elif,
    Else,
    While,
    For,
    In,
    Not,
    And,
    Or,
    Is,
    Break,
    Continue,
    Pass,
    Class,
    Global,
    Nonlocal,
    Del,
    Raise,
    Try,
    Except,
    Finally,
    As,
    Assert,
    Lambda,
    True,
    False,
    None,

    // Arithmetic
    Plus,
    Minus,
    Star,
    DoubleStar,
    Slash,
    DoubleSlash,
    Percent,

    // Bitwise
    Amp,
    Pipe,
    Caret,
    Tilde,
    LtLt,
    GtGt,

    // Comparison
    EqEq,
    NotEq,
    Lt,
    Le,
    Gt,
    Ge,

    // Assignment
    Eq,
    PlusEq,
    MinusEq,
    StarEq,
    SlashEq,
    DoubleSlashEq,
    PercentEq,
    DoubleStarEq,
    AmpEq,
    PipeEq,
    CaretEq,
    LtLtEq,
    GtGtEq,

    // Punctuation
    Dot,
    Comma,
    Colon,
    Semicolon,
    Arrow,
    LParen,
    RParen,
    LBracket,
    RBracket,
    LBrace,
    RBrace,

    // Layout
    Newline,
    Indent,
    Dedent,
    Eof,
}

impl fmt::Display for TokenKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            TokenKind::Int(n) => return write!(f, "int literal {}", n),
            TokenKind::Float(n) => return write!(f, "float literal {}", n),
            TokenKind::Str(s) => return write!(f, "string literal {:?}", s),
            TokenKind::Bytes(_) => "bytes literal",
            TokenKind::FString(_) => "f-string",
            TokenKind::Ident(s) => return write!(f, "identifier '{}'", s),
            TokenKind::Def => "'def'",
            TokenKind::Return => "'return'",
            TokenKind::If => "'if'",
            TokenKind::Elif => "'elif'",
            TokenKind::Else => "'else'",
            TokenKind::While => "'while'",
            TokenKind::For => "'for'",
            TokenKind::In => "'in'",
            TokenKind::Not => "'not'",
            TokenKind::And => "'and'",
            TokenKind::Or => "'or'",
            TokenKind::Is => "'is'",
            TokenKind::Break => "'break'",
            TokenKind::Continue => "'continue'",
            TokenKind::Pass => "'pass'",
            TokenKind::Class => "'class'",
            TokenKind::Global => "'global'",
            TokenKind::Nonlocal => "'nonlocal'",
            TokenKind::Del => "'del'",
            TokenKind::Raise => "'raise'",
            TokenKind::Try => "'try'",
            TokenKind::Except => "'except'",
            TokenKind::Finally => "'finally'",
            TokenKind::As => "'as'",
            TokenKind::Assert => "'assert'",
            TokenKind::Lambda => "'lambda'",
            TokenKind::True => "'True'",
            TokenKind::False => "'False'",
            TokenKind::None => "'None'",
            TokenKind::Plus => "'+'",
            TokenKind::Minus => "'-'",
            TokenKind::Star => "'*'",
            TokenKind::DoubleStar => "'**'",
            TokenKind::Slash => "'/'",
            TokenKind::DoubleSlash => "'//'",
            TokenKind::Percent => "'%'",
            TokenKind::Amp => "'&'",
            TokenKind::Pipe => "'|'",
            TokenKind::Caret => "'^'",
            TokenKind::Tilde => "'~'",
            TokenKind::LtLt => "'<<'",
            TokenKind::GtGt => "'>>'",
            TokenKind::EqEq => "'=='",
            TokenKind::NotEq => "'!='",
            TokenKind::Lt => "'<'",
            TokenKind::Le => "'<='",
            TokenKind::Gt => "'>'",
            TokenKind::Ge => "'>='",
            TokenKind::Eq => "'='",
            TokenKind::PlusEq => "'+='",
            TokenKind::MinusEq => "'-='",
            TokenKind::StarEq => "'*='",
            TokenKind::SlashEq => "'/='",
            TokenKind::DoubleSlashEq => "'//='",
            TokenKind::PercentEq => "'%='",
            TokenKind::DoubleStarEq => "'**='",
            TokenKind::AmpEq => "'&='",
            TokenKind::PipeEq => "'|='",
            TokenKind::CaretEq => "'^='",
            TokenKind::LtLtEq => "'<<='",
            TokenKind::GtGtEq => "'>>='",
            TokenKind::Dot => "'.'",
            TokenKind::Comma => "','",
            TokenKind::Colon => "':'",
            TokenKind::Semicolon => "';'",
            TokenKind::Arrow => "'->'",
            TokenKind::LParen => "'('",
            TokenKind::RParen => "')'",
            TokenKind::LBracket => "'['",
            TokenKind::RBracket => "']'",
            TokenKind::LBrace => "'{'",
            TokenKind::RBrace => "'}'",
            TokenKind::Newline => "end of line",
            TokenKind::Indent => "indent",
            TokenKind::Dedent => "dedent",
            TokenKind::Eof => "end of file",
        };
        f.write_str(text)
    }
}

/// A token together with the position of its first character.
#[derive(Debug, Clone, PartialEq)]
pub struct Token {
    pub kind: TokenKind,
    pub location: SourceLocation,
}

impl Token {
    pub fn new(kind: TokenKind, location: SourceLocation) -> Self {
        Token { kind, location }
    }
}

/// Lexer error type
#[derive(Debug, Clone)]
pub struct LexError {
    pub message: String,
    pub location: SourceLocation,
}

impl fmt::Display for LexError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Lexer error at line {}, column {}: {}",
            self.location.line, self.location.column, self.message
        )
    }
}

impl std::error::Error for LexError {}

const TAB_WIDTH: usize = 8;

pub struct Lexer {
    input: Vec<char>,
    position: usize,
    line: usize,
    column: usize,
    indent_stack: Vec<usize>,
    bracket_depth: usize,
}

impl Lexer {
    /// Create a new lexer for the given source string.
    pub fn new(input: &str) -> Self {
        Self {
            input: input.chars().collect(),
            position: 0,
            line: 1,
            column: 1,
            indent_stack: vec![0],
            bracket_depth: 0,
        }
    }

    /// Tokenize the entire input
    pub fn tokenize(&mut self) -> Result<Vec<Token>, LexError> {
        let mut tokens = Vec::new();
        let mut at_line_start = true;

        loop {
            if at_line_start && self.bracket_depth == 0 {
                if !self.handle_indentation(&mut tokens)? {
                    break;
                }
                at_line_start = false;
            }

            self.skip_inline_whitespace()?;

            match self.peek() {
                None => break,
                Some('#') => self.skip_comment(),
                Some('\n') => {
                    let loc = self.current_location();
                    self.advance();
                    if self.bracket_depth == 0 {
                        tokens.push(Token::new(TokenKind::Newline, loc));
                        at_line_start = true;
                    }
                }
                Some(_) => {
                    let token = self.next_token()?;
                    tokens.push(token);
                }
            }
        }

        let eof = self.current_location();
        if tokens
            .last()
            .is_some_and(|t| !matches!(t.kind, TokenKind::Newline | TokenKind::Dedent))
        {
            tokens.push(Token::new(TokenKind::Newline, eof));
        }
        while self.indent_stack.len() > 1 {
            self.indent_stack.pop();
            tokens.push(Token::new(TokenKind::Dedent, eof));
        }
        tokens.push(Token::new(TokenKind::Eof, eof));

        Ok(tokens)
    }

    /// Measure the indentation of the next non-blank line and emit
    /// Indent/Dedent tokens. Returns false at end of input.
    fn handle_indentation(&mut self, tokens: &mut Vec<Token>) -> Result<bool, LexError> {
        loop {
            let mut width = 0;
            while let Some(ch) = self.peek() {
                match ch {
                    ' ' => width += 1,
                    '\t' => width = (width / TAB_WIDTH + 1) * TAB_WIDTH,
                    '\x0c' => width = 0,
                    _ => break,
                }
                self.advance();
            }

            match self.peek() {
                None => return Ok(false),
                Some('\n') => {
                    self.advance();
                    continue;
                }
                Some('\r') if self.peek_ahead(1) == Some('\n') => {
                    self.advance();
                    self.advance();
                    continue;
                }
                Some('#') => {
                    self.skip_comment();
                    continue;
                }
                _ => {}
            }

            let loc = self.current_location();
            let current = self.indent_stack.last().copied().unwrap_or(0);
            if width > current {
                self.indent_stack.push(width);
                tokens.push(Token::new(TokenKind::Indent, loc));
            } else if width < current {
                while self.indent_stack.last().is_some_and(|&top| top > width) {
                    self.indent_stack.pop();
                    tokens.push(Token::new(TokenKind::Dedent, loc));
                }
                if self.indent_stack.last() != Some(&width) {
                    return Err(LexError {
                        message: "unindent does not match any outer indentation level".to_string(),
                        location: loc,
                    });
                }
            }
            return Ok(true);
        }
    }

    /// Get next token
    fn next_token(&mut self) -> Result<Token, LexError> {
        let loc = self.current_location();
        let ch = self.advance().ok_or_else(|| LexError {
            message: "Unexpected end of file".to_string(),
            location: loc,
        })?;

        let kind = match ch {
            '"' | '\'' => self.string_literal(ch, StringPrefix::default(), loc)?,

            '0'..='9' => self.number_literal(ch, loc)?,
            '.' if self.peek().is_some_and(|c| c.is_ascii_digit()) => {
                self.number_literal(ch, loc)?
            }

            c if c.is_alphabetic() || c == '_' => {
                let ident = self.identifier(c);
                match StringPrefix::parse(&ident) {
                    Some(prefix) if matches!(self.peek(), Some('"') | Some('\'')) => {
                        let quote = self.advance().unwrap_or('"');
                        self.string_literal(quote, prefix, loc)?
                    }
                    _ => keyword_or_ident(ident),
                }
            }

            '+' => self.with_eq(TokenKind::Plus, TokenKind::PlusEq),
            '-' => {
                if self.peek() == Some('>') {
                    self.advance();
                    TokenKind::Arrow
                } else {
                    self.with_eq(TokenKind::Minus, TokenKind::MinusEq)
                }
            }
            '*' => {
                if self.peek() == Some('*') {
                    self.advance();
                    self.with_eq(TokenKind::DoubleStar, TokenKind::DoubleStarEq)
                } else {
                    self.with_eq(TokenKind::Star, TokenKind::StarEq)
                }
            }
            '/' => {
                if self.peek() == Some('/') {
                    self.advance();
                    self.with_eq(TokenKind::DoubleSlash, TokenKind::DoubleSlashEq)
                } else {
                    self.with_eq(TokenKind::Slash, TokenKind::SlashEq)
                }
            }
            '%' => self.with_eq(TokenKind::Percent, TokenKind::PercentEq),
            '&' => self.with_eq(TokenKind::Amp, TokenKind::AmpEq),
            '|' => self.with_eq(TokenKind::Pipe, TokenKind::PipeEq),
            '^' => self.with_eq(TokenKind::Caret, TokenKind::CaretEq),
            '~' => TokenKind::Tilde,
            '=' => self.with_eq(TokenKind::Eq, TokenKind::EqEq),
            '!' => {
                if self.peek() == Some('=') {
                    self.advance();
                    TokenKind::NotEq
                } else {
                    return Err(LexError {
                        message: "invalid syntax: '!'".to_string(),
                        location: loc,
                    });
                }
            }
            '<' => {
                if self.peek() == Some('<') {
                    self.advance();
                    self.with_eq(TokenKind::LtLt, TokenKind::LtLtEq)
                } else {
                    self.with_eq(TokenKind::Lt, TokenKind::Le)
                }
            }
            '>' => {
                if self.peek() == Some('>') {
                    self.advance();
                    self.with_eq(TokenKind::GtGt, TokenKind::GtGtEq)
                } else {
                    self.with_eq(TokenKind::Gt, TokenKind::Ge)
                }
            }
            '.' => TokenKind::Dot,
            ',' => TokenKind::Comma,
            ':' => TokenKind::Colon,
            ';' => TokenKind::Semicolon,
            '(' | '[' | '{' => {
                self.bracket_depth += 1;
                match ch {
                    '(' => TokenKind::LParen,
                    '[' => TokenKind::LBracket,
                    _ => TokenKind::LBrace,
                }
            }
            ')' | ']' | '}' => {
                self.bracket_depth = self.bracket_depth.saturating_sub(1);
                match ch {
                    ')' => TokenKind::RParen,
                    ']' => TokenKind::RBracket,
                    _ => TokenKind::RBrace,
                }
            }

            _ => {
                return Err(LexError {
                    message: format!("invalid character '{}'", ch),
                    location: loc,
                })
            }
        };

        Ok(Token::new(kind, loc))
    }

    /// Consume a trailing `=` if present, choosing between the two kinds.
    fn with_eq(&mut self, plain: TokenKind, with_eq: TokenKind) -> TokenKind {
        if self.peek() == Some('=') {
            self.advance();
            with_eq
        } else {
            plain
        }
    }

    /// Parse a string, bytes or f-string literal; the opening quote has been consumed.
    fn string_literal(
        &mut self,
        quote: char,
        prefix: StringPrefix,
        loc: SourceLocation,
    ) -> Result<TokenKind, LexError> {
        let triple = self.peek() == Some(quote) && self.peek_ahead(1) == Some(quote);
        if triple {
            self.advance();
            self.advance();
        }

        let mut text = String::new();
        loop {
            let ch = self.peek().ok_or_else(|| LexError {
                message: "unterminated string literal".to_string(),
                location: loc,
            })?;

            if ch == quote {
                if !triple {
                    self.advance();
                    break;
                }
                if self.peek_ahead(1) == Some(quote) && self.peek_ahead(2) == Some(quote) {
                    self.advance();
                    self.advance();
                    self.advance();
                    break;
                }
            }

            if ch == '\n' && !triple {
                return Err(LexError {
                    message: "unterminated string literal".to_string(),
                    location: loc,
                });
            }

            self.advance();
            if ch == '\\' {
                let escaped = self.advance().ok_or_else(|| LexError {
                    message: "unterminated string literal".to_string(),
                    location: loc,
                })?;
                if prefix.raw {
                    text.push('\\');
                    text.push(escaped);
                } else {
                    self.unescape(escaped, &mut text)?;
                }
            } else {
                text.push(ch);
            }
        }

        if prefix.bytes {
            if let Some(bad) = text.chars().find(|c| !c.is_ascii()) {
                return Err(LexError {
                    message: format!("bytes can only contain ASCII literal characters, found '{}'", bad),
                    location: loc,
                });
            }
            Ok(TokenKind::Bytes(text.into_bytes()))
        } else if prefix.format {
            Ok(TokenKind::FString(text))
        } else {
            Ok(TokenKind::Str(text))
        }
    }

    fn unescape(&mut self, escaped: char, out: &mut String) -> Result<(), LexError> {
        match escaped {
            'n' => out.push('\n'),
            't' => out.push('\t'),
            'r' => out.push('\r'),
            '0' => out.push('\0'),
            '\\' => out.push('\\'),
            '\'' => out.push('\''),
            '"' => out.push('"'),
            '\n' => {}
            'x' | 'u' => {
                let digits = if escaped == 'x' { 2 } else { 4 };
                let mut code = String::new();
                for _ in 0..digits {
                    match self.advance() {
                        Some(c) if c.is_ascii_hexdigit() => code.push(c),
                        _ => {
                            return Err(LexError {
                                message: format!("truncated \\{} escape", escaped),
                                location: self.current_location(),
                            })
                        }
                    }
                }
                let value = u32::from_str_radix(&code, 16)
                    .ok()
                    .and_then(char::from_u32)
                    .ok_or_else(|| LexError {
                        message: format!("invalid escape \\{}{}", escaped, code),
                        location: self.current_location(),
                    })?;
                out.push(value);
            }
            other => {
                out.push('\\');
                out.push(other);
            }
        }
        Ok(())
    }

    /// Parse numeric literal (int, float, hex/octal/binary)
    fn number_literal(&mut self, first: char, loc: SourceLocation) -> Result<TokenKind, LexError> {
        if first == '0' {
            let radix = match self.peek() {
                Some('x') | Some('X') => Some(16),
                Some('o') | Some('O') => Some(8),
                Some('b') | Some('B') => Some(2),
                _ => None,
            };
            if let Some(radix) = radix {
                self.advance();
                let mut digits = String::new();
                while let Some(ch) = self.peek() {
                    if ch.is_digit(radix) {
                        digits.push(ch);
                    } else if ch != '_' {
                        break;
                    }
                    self.advance();
                }
                return i64::from_str_radix(&digits, radix)
                    .map(TokenKind::Int)
                    .map_err(|_| LexError {
                        message: format!("invalid integer literal '0{}'", digits),
                        location: loc,
                    });
            }
        }

        let mut text = String::new();
        text.push(first);
        let mut is_float = first == '.';

        while let Some(ch) = self.peek() {
            if ch.is_ascii_digit() {
                text.push(ch);
            } else if ch == '_' {
                // digit separator
            } else if ch == '.' && !is_float {
                is_float = true;
                text.push(ch);
            } else if (ch == 'e' || ch == 'E')
                && (self.peek_ahead(1).is_some_and(|c| c.is_ascii_digit())
                    || (matches!(self.peek_ahead(1), Some('+') | Some('-'))
                        && self.peek_ahead(2).is_some_and(|c| c.is_ascii_digit())))
            {
                is_float = true;
                text.push(ch);
                self.advance();
                if let Some(sign) = self.peek().filter(|c| *c == '+' || *c == '-') {
                    text.push(sign);
                    self.advance();
                }
                continue;
            } else {
                break;
            }
            self.advance();
        }

        if is_float {
            text.parse::<f64>().map(TokenKind::Float).map_err(|_| LexError {
                message: format!("invalid float literal '{}'", text),
                location: loc,
            })
        } else {
            text.parse::<i64>().map(TokenKind::Int).map_err(|_| LexError {
                message: format!("integer literal '{}' is too large", text),
                location: loc,
            })
        }
    }

    fn identifier(&mut self, first: char) -> String {
        let mut ident = String::new();
        ident.push(first);
        while let Some(ch) = self.peek() {
            if ch.is_alphanumeric() || ch == '_' {
                ident.push(ch);
                self.advance();
            } else {
                break;
            }
        }
        ident
    }

    /// Skip spaces, tabs and backslash line continuations.
    fn skip_inline_whitespace(&mut self) -> Result<(), LexError> {
        loop {
            match self.peek() {
                Some(' ') | Some('\t') | Some('\r') | Some('\x0c') => {
                    self.advance();
                }
                Some('\n') if self.bracket_depth > 0 => {
                    self.advance();
                }
                Some('#') if self.bracket_depth > 0 => self.skip_comment(),
                Some('\\') => {
                    let loc = self.current_location();
                    self.advance();
                    if self.peek() == Some('\r') {
                        self.advance();
                    }
                    if self.advance() != Some('\n') {
                        return Err(LexError {
                            message: "unexpected character after line continuation character"
                                .to_string(),
                            location: loc,
                        });
                    }
                }
                _ => return Ok(()),
            }
        }
    }

    /// Skip to (but not past) the end of the line
    fn skip_comment(&mut self) {
        while let Some(ch) = self.peek() {
            if ch == '\n' {
                break;
            }
            self.advance();
        }
    }

    fn peek(&self) -> Option<char> {
        self.input.get(self.position).copied()
    }

    fn peek_ahead(&self, n: usize) -> Option<char> {
        self.input.get(self.position + n).copied()
    }

    fn advance(&mut self) -> Option<char> {
        let ch = *self.input.get(self.position)?;
        self.position += 1;

        if ch == '\n' {
            self.line += 1;
            self.column = 1;
        } else {
            self.column += 1;
        }

        Some(ch)
    }

    fn current_location(&self) -> SourceLocation {
        SourceLocation::new(self.line, self.column)
    }
}

#[derive(Debug, Clone, Copy, Default)]
struct StringPrefix {
    raw: bool,
    bytes: bool,
    format: bool,
}

impl StringPrefix {
    fn parse(ident: &str) -> Option<Self> {
        if ident.len() > 2 {
            return None;
        }
        let mut prefix = StringPrefix::default();
        for c in ident.chars() {
            match c.to_ascii_lowercase() {
                'r' if !prefix.raw => prefix.raw = true,
                'b' if !prefix.bytes && !prefix.format => prefix.bytes = true,
                'f' if !prefix.format && !prefix.bytes => prefix.format = true,
                _ => return None,
            }
        }
        Some(prefix)
    }
}

fn keyword_or_ident(ident: String) -> TokenKind {
    match ident.as_str() {
        "def" => TokenKind::Def,
        "return" => TokenKind::Return,
        "if" => TokenKind::If,
        "elif" => TokenKind::Elif,
        "else" => TokenKind::Else,
        "while" => TokenKind::While,
        "for" => TokenKind::For,
        "in" => TokenKind::In,
        "not" => TokenKind::Not,
        "and" => TokenKind::And,
        "or" => TokenKind::Or,
        "is" => TokenKind::Is,
        "break" => TokenKind::Break,
        "continue" => TokenKind::Continue,
        "pass" => TokenKind::Pass,
        "class" => TokenKind::Class,
        "global" => TokenKind::Global,
        "nonlocal" => TokenKind::Nonlocal,
        "del" => TokenKind::Del,
        "raise" => TokenKind::Raise,
        "try" => TokenKind::Try,
        "except" => TokenKind::Except,
        "finally" => TokenKind::Finally,
        "as" => TokenKind::As,
        "assert" => TokenKind::Assert,
        "lambda" => TokenKind::Lambda,
        "True" => TokenKind::True,
        "False" => TokenKind::False,
        "None" => TokenKind::None,
        _ => TokenKind::Ident(ident),
    }
}
