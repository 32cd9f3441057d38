//! Source parser
//!
//! This module transforms source text into an Abstract Syntax Tree (AST):
//! - [`lexer`]: Tokenization with indentation tracking (source text → tokens)
//! - [`parse`]: Parser entry point and shared helpers (tokens → AST)
//! - [`ast`]: AST node definitions
//! - [`scope`]: which names a function body binds locally
//!
//! # Supported language
//!
//! The parser accepts an indentation-sensitive teaching subset of Python:
//! functions with defaults, lambdas, single-inheritance classes, `if`/`while`/`for`,
//! `try`/`except`/`else`/`finally`, list and dict comprehensions, f-strings,
//! slices and chained comparisons. Decorators, generators, `with`, star
//! arguments and `import` are rejected as syntax errors.
//!
//! # Parser Implementation
//!
//! Hand-written recursive descent parser, one method per precedence level.
//! No external parser generator dependencies.

pub mod ast;
pub mod expressions;
pub mod lexer;
pub mod parse;
pub mod scope;
pub mod statements;
