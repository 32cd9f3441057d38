//! Main parser coordinator
//!
//! This module provides the [`Parser`] struct and core parsing infrastructure,
//! including error types, helper methods, and the main parse entry point.
//!
//! # Parser Architecture
//!
//! The Parser uses a recursive descent approach with the following organization:
//! - This module: Parser struct, helper methods, and coordination
//! - `statements`: simple and compound statements, indented blocks
//! - `expressions`: expressions with one function per precedence level
//! - `scope`: name-binding analysis run on each function body
//!
//! Parser methods are split across multiple files using `impl Parser` blocks,
//! allowing each module to extend the Parser with related functionality while
//! maintaining access to the shared parser state.

use crate::parser::ast::*;
use crate::parser::lexer::{LexError, Lexer, Token, TokenKind};
use std::fmt;

/// Parser error type
#[derive(Debug, Clone)]
pub struct ParseError {
    pub message: String,
    pub location: SourceLocation,
}

impl fmt::Display for ParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Parse error at line {}, column {}: {}",
            self.location.line, self.location.column, self.message
        )
    }
}

impl std::error::Error for ParseError {}

impl From<LexError> for ParseError {
    fn from(err: LexError) -> Self {
        ParseError {
            message: err.message,
            location: err.location,
        }
    }
}

/// Recursive descent parser
pub struct Parser {
    pub(crate) tokens: Vec<Token>,
    pub(crate) position: usize,
}

impl Parser {
    pub fn new(source: &str) -> Result<Self, ParseError> {
        let mut lexer = Lexer::new(source);
        let tokens = lexer.tokenize()?;
        Ok(Self {
            tokens,
            position: 0,
        })
    }

    /// Parse a whole source unit
    pub fn parse_program(&mut self) -> Result<Program, ParseError> {
        let mut program = Program::new();

        while self.match_token(&TokenKind::Newline) {}
        while !self.is_at_end() {
            let stmts = self.parse_statement()?;
            program.body.extend(stmts);
        }

        Ok(program)
    }

    /// Parse a standalone expression (used for f-string fields)
    pub fn parse_standalone_expression(&mut self) -> Result<Expr, ParseError> {
        let expr = self.parse_expression_list()?;
        while self.match_token(&TokenKind::Newline) {}
        if !self.is_at_end() {
            return Err(self.error_here("invalid syntax"));
        }
        Ok(expr)
    }

    // ===== Helper methods =====

    pub(crate) fn peek(&self) -> &TokenKind {
        &self.peek_full().kind
    }

    pub(crate) fn peek_full(&self) -> &Token {
        // The lexer always terminates the stream with Eof, and `advance` never
        // moves past it.
        let last = self.tokens.len().saturating_sub(1);
        &self.tokens[self.position.min(last)]
    }

    pub(crate) fn peek_ahead(&self, n: usize) -> Option<&TokenKind> {
        self.tokens.get(self.position + n).map(|t| &t.kind)
    }

    pub(crate) fn check(&self, kind: &TokenKind) -> bool {
        std::mem::discriminant(self.peek()) == std::mem::discriminant(kind)
    }

    pub(crate) fn match_token(&mut self, kind: &TokenKind) -> bool {
        if self.check(kind) {
            self.advance();
            true
        } else {
            false
        }
    }

    pub(crate) fn advance(&mut self) -> Token {
        let token = self.peek_full().clone();
        if !self.is_at_end() {
            self.position += 1;
        }
        token
    }

    pub(crate) fn is_at_end(&self) -> bool {
        matches!(self.peek(), TokenKind::Eof)
    }

    pub(crate) fn current_location(&self) -> SourceLocation {
        self.peek_full().location
    }

    pub(crate) fn error_here(&self, message: &str) -> ParseError {
        ParseError {
            message: message.to_string(),
            location: self.current_location(),
        }
    }

    pub(crate) fn expect_token(&mut self, kind: &TokenKind, message: &str) -> Result<(), ParseError> {
        if self.check(kind) {
            self.advance();
            Ok(())
        } else {
            Err(ParseError {
                message: format!("{}, found {}", message, self.peek()),
                location: self.current_location(),
            })
        }
    }

    pub(crate) fn expect_colon(&mut self, ctx: &str) -> Result<(), ParseError> {
        self.expect_token(&TokenKind::Colon, &format!("expected ':' {ctx}"))
    }

    pub(crate) fn expect_rparen(&mut self, ctx: &str) -> Result<(), ParseError> {
        self.expect_token(&TokenKind::RParen, &format!("expected ')' {ctx}"))
    }

    pub(crate) fn expect_identifier(&mut self) -> Result<String, ParseError> {
        if let TokenKind::Ident(name) = self.peek() {
            let name = name.clone();
            self.advance();
            Ok(name)
        } else {
            Err(ParseError {
                message: format!("expected identifier, found {}", self.peek()),
                location: self.current_location(),
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(src: &str) -> Program {
        Parser::new(src).unwrap().parse_program().unwrap()
    }

    #[test]
    fn test_parse_simple_function() {
        let program = parse("def add(a, b=2):\n    return a + b\n");
        assert_eq!(program.body.len(), 1);
        match &program.body[0].kind {
            StmtKind::FunctionDef(code) => {
                assert_eq!(code.name, "add");
                assert_eq!(code.params.len(), 2);
                assert!(code.params[1].default.is_some());
                assert_eq!(code.location.line, 1);
                match &code.body {
                    FunctionBody::Block(body) => assert_eq!(body.len(), 1),
                    FunctionBody::Expr(_) => panic!("expected block body"),
                }
            }
            other => panic!("Expected function definition, got {:?}", other),
        }
    }

    #[test]
    fn test_parse_if_elif_else() {
        let program = parse("if x:\n    a = 1\nelif y:\n    a = 2\nelse:\n    a = 3\n");
        match &program.body[0].kind {
            StmtKind::If {
                branches,
                else_body,
            } => {
                assert_eq!(branches.len(), 2);
                assert_eq!(branches[1].location.line, 3);
                assert!(else_body.is_some());
            }
            other => panic!("Expected if, got {:?}", other),
        }
    }

    #[test]
    fn test_semicolons_split_statements() {
        let program = parse("a = 1; b = 2\n");
        assert_eq!(program.body.len(), 2);
        assert_eq!(program.body[1].location.line, 1);
    }

    #[test]
    fn test_chained_and_tuple_assignment() {
        let program = parse("a = b = 1\nx, y = y, x\n");
        match &program.body[0].kind {
            StmtKind::Assign { targets, .. } => assert_eq!(targets.len(), 2),
            other => panic!("Expected assignment, got {:?}", other),
        }
        match &program.body[1].kind {
            StmtKind::Assign { targets, value } => {
                assert!(matches!(targets[0], Target::Tuple(ref t) if t.len() == 2));
                assert!(matches!(value, Expr::Tuple(ref v) if v.len() == 2));
            }
            other => panic!("Expected assignment, got {:?}", other),
        }
    }

    #[test]
    fn test_parse_class_and_try() {
        let program = parse(
            "class Node(Base):\n    def __init__(self, v):\n        self.v = v\n\ntry:\n    f()\nexcept (ValueError, KeyError) as e:\n    pass\nfinally:\n    done = True\n",
        );
        assert!(matches!(program.body[0].kind, StmtKind::ClassDef { ref name, .. } if name == "Node"));
        match &program.body[1].kind {
            StmtKind::Try {
                handlers,
                finally_body,
                ..
            } => {
                assert_eq!(handlers.len(), 1);
                assert_eq!(handlers[0].name.as_deref(), Some("e"));
                assert_eq!(handlers[0].location.line, 7);
                assert!(finally_body.is_some());
            }
            other => panic!("Expected try, got {:?}", other),
        }
    }

    #[test]
    fn test_invalid_assignment_target() {
        let err = Parser::new("1 = x\n").unwrap().parse_program().unwrap_err();
        assert!(err.message.contains("cannot assign"));
    }

    #[test]
    fn test_missing_colon_reports_location() {
        let err = Parser::new("x = 1\nif x\n    pass\n")
            .unwrap()
            .parse_program()
            .unwrap_err();
        assert_eq!(err.location.line, 2);
        assert!(err.message.contains("':'"));
    }
}
