//! Statement parsing
//!
//! Simple statements may share a line (separated by `;`); compound statements
//! (`if`, `while`, `for`, `def`, `class`, `try`) own an indented block, or a
//! single line of simple statements after the colon.

use crate::parser::ast::*;
use crate::parser::lexer::TokenKind;
use crate::parser::parse::{ParseError, Parser};
use crate::parser::scope::{self, expr_to_target};
use std::rc::Rc;

impl Parser {
    /// Parse one statement line. Returns several statements for `a; b`.
    pub(crate) fn parse_statement(&mut self) -> Result<Vec<Stmt>, ParseError> {
        match self.peek() {
            TokenKind::If => Ok(vec![self.parse_if()?]),
            TokenKind::While => Ok(vec![self.parse_while()?]),
            TokenKind::For => Ok(vec![self.parse_for()?]),
            TokenKind::Def => Ok(vec![self.parse_def()?]),
            TokenKind::Class => Ok(vec![self.parse_class()?]),
            TokenKind::Try => Ok(vec![self.parse_try()?]),
            TokenKind::Indent => Err(self.error_here("unexpected indent")),
            _ => self.parse_simple_line(),
        }
    }

    fn parse_simple_line(&mut self) -> Result<Vec<Stmt>, ParseError> {
        let mut stmts = vec![self.parse_simple_statement()?];
        while self.match_token(&TokenKind::Semicolon) {
            if self.check(&TokenKind::Newline) {
                break;
            }
            stmts.push(self.parse_simple_statement()?);
        }
        if !self.match_token(&TokenKind::Newline) && !self.is_at_end() {
            return Err(self.error_here("invalid syntax"));
        }
        Ok(stmts)
    }

    /// Parse `: NEWLINE INDENT stmt+ DEDENT` or `: simple_stmts`.
    pub(crate) fn parse_block(&mut self, ctx: &str) -> Result<Vec<Stmt>, ParseError> {
        self.expect_colon(ctx)?;

        if !self.match_token(&TokenKind::Newline) {
            return self.parse_simple_line();
        }

        if !self.match_token(&TokenKind::Indent) {
            return Err(self.error_here(&format!("expected an indented block {ctx}")));
        }

        let mut body = Vec::new();
        while !self.check(&TokenKind::Dedent) && !self.is_at_end() {
            body.extend(self.parse_statement()?);
        }
        self.match_token(&TokenKind::Dedent);
        Ok(body)
    }

    fn parse_simple_statement(&mut self) -> Result<Stmt, ParseError> {
        let location = self.current_location();

        let kind = match self.peek() {
            TokenKind::Pass => {
                self.advance();
                StmtKind::Pass
            }
            TokenKind::Break => {
                self.advance();
                StmtKind::Break
            }
            TokenKind::Continue => {
                self.advance();
                StmtKind::Continue
            }
            TokenKind::Return => {
                self.advance();
                if self.at_statement_end() {
                    StmtKind::Return(None)
                } else {
                    StmtKind::Return(Some(self.parse_expression_list()?))
                }
            }
            TokenKind::Global | TokenKind::Nonlocal => {
                let is_global = matches!(self.advance().kind, TokenKind::Global);
                let mut names = vec![self.expect_identifier()?];
                while self.match_token(&TokenKind::Comma) {
                    names.push(self.expect_identifier()?);
                }
                if is_global {
                    StmtKind::Global(names)
                } else {
                    StmtKind::Nonlocal(names)
                }
            }
            TokenKind::Del => {
                self.advance();
                let mut targets = Vec::new();
                loop {
                    let expr = self.parse_bitor()?;
                    targets.push(self.to_target(expr, location, "delete")?);
                    if !self.match_token(&TokenKind::Comma) || self.at_statement_end() {
                        break;
                    }
                }
                StmtKind::Del(targets)
            }
            TokenKind::Raise => {
                self.advance();
                if self.at_statement_end() {
                    StmtKind::Raise(None)
                } else {
                    StmtKind::Raise(Some(self.parse_expression()?))
                }
            }
            TokenKind::Assert => {
                self.advance();
                let test = self.parse_expression()?;
                let message = if self.match_token(&TokenKind::Comma) {
                    Some(self.parse_expression()?)
                } else {
                    None
                };
                StmtKind::Assert { test, message }
            }
            _ => self.parse_expression_statement(location)?,
        };

        Ok(Stmt { kind, location })
    }

    fn parse_expression_statement(&mut self, location: SourceLocation) -> Result<StmtKind, ParseError> {
        let first = self.parse_expression_list()?;

        if let Some(op) = self.augmented_operator() {
            self.advance();
            let target = self.to_target(first, location, "assign")?;
            if matches!(target, Target::Tuple(_)) {
                return Err(ParseError {
                    message: "illegal expression for augmented assignment".to_string(),
                    location,
                });
            }
            let value = self.parse_expression_list()?;
            return Ok(StmtKind::AugAssign { target, op, value });
        }

        if !self.check(&TokenKind::Eq) {
            return Ok(StmtKind::Expr(first));
        }

        let mut exprs = vec![first];
        while self.match_token(&TokenKind::Eq) {
            exprs.push(self.parse_expression_list()?);
        }
        let value = exprs.pop().ok_or_else(|| self.error_here("invalid syntax"))?;
        let targets = exprs
            .into_iter()
            .map(|e| self.to_target(e, location, "assign"))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(StmtKind::Assign { targets, value })
    }

    fn augmented_operator(&self) -> Option<BinOp> {
        Some(match self.peek() {
            TokenKind::PlusEq => BinOp::Add,
            TokenKind::MinusEq => BinOp::Sub,
            TokenKind::StarEq => BinOp::Mul,
            TokenKind::SlashEq => BinOp::Div,
            TokenKind::DoubleSlashEq => BinOp::FloorDiv,
            TokenKind::PercentEq => BinOp::Mod,
            TokenKind::DoubleStarEq => BinOp::Pow,
            TokenKind::AmpEq => BinOp::BitAnd,
            TokenKind::PipeEq => BinOp::BitOr,
            TokenKind::CaretEq => BinOp::BitXor,
            TokenKind::LtLtEq => BinOp::Shl,
            TokenKind::GtGtEq => BinOp::Shr,
            _ => return None,
        })
    }

    pub(crate) fn to_target(
        &self,
        expr: Expr,
        location: SourceLocation,
        verb: &str,
    ) -> Result<Target, ParseError> {
        expr_to_target(expr).ok_or_else(|| ParseError {
            message: format!("cannot {} to expression", verb),
            location,
        })
    }

    fn at_statement_end(&self) -> bool {
        matches!(
            self.peek(),
            TokenKind::Newline | TokenKind::Semicolon | TokenKind::Eof
        )
    }

    fn parse_if(&mut self) -> Result<Stmt, ParseError> {
        let location = self.current_location();
        self.advance(); // if

        let mut branches = Vec::new();
        let condition = self.parse_expression()?;
        let body = self.parse_block("after if condition")?;
        branches.push(IfBranch {
            condition,
            body,
            location,
        });

        while self.check(&TokenKind::Elif) {
            let elif_location = self.current_location();
            self.advance();
            let condition = self.parse_expression()?;
            let body = self.parse_block("after elif condition")?;
            branches.push(IfBranch {
                condition,
                body,
                location: elif_location,
            });
        }

        let else_body = if self.match_token(&TokenKind::Else) {
            Some(self.parse_block("after else")?)
        } else {
            None
        };

        Ok(Stmt {
            kind: StmtKind::If {
                branches,
                else_body,
            },
            location,
        })
    }

    fn parse_while(&mut self) -> Result<Stmt, ParseError> {
        let location = self.current_location();
        self.advance(); // while
        let condition = self.parse_expression()?;
        let body = self.parse_block("after while condition")?;
        Ok(Stmt {
            kind: StmtKind::While { condition, body },
            location,
        })
    }

    fn parse_for(&mut self) -> Result<Stmt, ParseError> {
        let location = self.current_location();
        self.advance(); // for
        let target = self.parse_target_list(location)?;
        self.expect_token(&TokenKind::In, "expected 'in' in for statement")?;
        let iter = self.parse_expression_list()?;
        let body = self.parse_block("after for clause")?;
        Ok(Stmt {
            kind: StmtKind::For { target, iter, body },
            location,
        })
    }

    /// Parse `a` or `a, b` as a loop target (stops before `in`).
    pub(crate) fn parse_target_list(&mut self, location: SourceLocation) -> Result<Target, ParseError> {
        let first = self.parse_bitor()?;
        if !self.check(&TokenKind::Comma) {
            return self.to_target(first, location, "assign");
        }
        let mut items = vec![first];
        while self.match_token(&TokenKind::Comma) {
            if self.check(&TokenKind::In) {
                break;
            }
            items.push(self.parse_bitor()?);
        }
        self.to_target(Expr::Tuple(items), location, "assign")
    }

    fn parse_def(&mut self) -> Result<Stmt, ParseError> {
        let location = self.current_location();
        self.advance(); // def
        let name = self.expect_identifier()?;

        self.expect_token(&TokenKind::LParen, "expected '(' after function name")?;
        let params = self.parse_params(&TokenKind::RParen, true)?;
        self.expect_rparen("after parameters")?;

        if self.match_token(&TokenKind::Arrow) {
            self.parse_expression()?;
        }

        let body = FunctionBody::Block(self.parse_block("after function signature")?);
        let code = build_function_code(name, params, body, location);
        Ok(Stmt {
            kind: StmtKind::FunctionDef(Rc::new(code)),
            location,
        })
    }

    /// Parse a parameter list up to (not including) `end`.
    pub(crate) fn parse_params(
        &mut self,
        end: &TokenKind,
        allow_annotations: bool,
    ) -> Result<Vec<Param>, ParseError> {
        let mut params: Vec<Param> = Vec::new();
        while !self.check(end) {
            if self.check(&TokenKind::Star) || self.check(&TokenKind::DoubleStar) {
                return Err(self.error_here("variadic parameters are not supported"));
            }
            let location = self.current_location();
            let name = self.expect_identifier()?;
            if params.iter().any(|p| p.name == name) {
                return Err(ParseError {
                    message: format!("duplicate argument '{}' in function definition", name),
                    location,
                });
            }
            if allow_annotations && self.match_token(&TokenKind::Colon) {
                self.parse_expression()?;
            }
            let default = if self.match_token(&TokenKind::Eq) {
                Some(self.parse_expression()?)
            } else {
                if params.iter().any(|p| p.default.is_some()) {
                    return Err(ParseError {
                        message: "non-default argument follows default argument".to_string(),
                        location,
                    });
                }
                None
            };
            params.push(Param { name, default });
            if !self.match_token(&TokenKind::Comma) {
                break;
            }
        }
        Ok(params)
    }

    fn parse_class(&mut self) -> Result<Stmt, ParseError> {
        let location = self.current_location();
        self.advance(); // class
        let name = self.expect_identifier()?;

        let mut base = None;
        if self.match_token(&TokenKind::LParen) {
            if !self.check(&TokenKind::RParen) {
                base = Some(self.parse_expression()?);
                if self.match_token(&TokenKind::Comma) && !self.check(&TokenKind::RParen) {
                    return Err(self.error_here("multiple inheritance is not supported"));
                }
            }
            self.expect_rparen("after base class")?;
        }

        let body = self.parse_block("after class header")?;
        Ok(Stmt {
            kind: StmtKind::ClassDef { name, base, body },
            location,
        })
    }

    fn parse_try(&mut self) -> Result<Stmt, ParseError> {
        let location = self.current_location();
        self.advance(); // try
        let body = self.parse_block("after try")?;

        let mut handlers = Vec::new();
        while self.check(&TokenKind::Except) {
            let handler_location = self.current_location();
            self.advance();
            let mut kind = None;
            let mut name = None;
            if !self.check(&TokenKind::Colon) {
                kind = Some(self.parse_expression()?);
                if self.match_token(&TokenKind::As) {
                    name = Some(self.expect_identifier()?);
                }
            }
            let handler_body = self.parse_block("after except clause")?;
            handlers.push(ExceptHandler {
                kind,
                name,
                body: handler_body,
                location: handler_location,
            });
        }

        let else_body = if !handlers.is_empty() && self.match_token(&TokenKind::Else) {
            Some(self.parse_block("after else")?)
        } else {
            None
        };

        let finally_body = if self.match_token(&TokenKind::Finally) {
            Some(self.parse_block("after finally")?)
        } else {
            None
        };

        if handlers.is_empty() && finally_body.is_none() {
            return Err(self.error_here("expected 'except' or 'finally' block"));
        }

        Ok(Stmt {
            kind: StmtKind::Try {
                body,
                handlers,
                else_body,
                finally_body,
            },
            location,
        })
    }
}

/// Run scope analysis and assemble the shared function code.
pub(crate) fn build_function_code(
    name: String,
    params: Vec<Param>,
    body: FunctionBody,
    location: SourceLocation,
) -> FunctionCode {
    let info = scope::analyze(&params, &body);
    FunctionCode {
        name,
        params,
        body,
        location,
        local_names: info.local_names,
        global_names: info.global_names,
        nonlocal_names: info.nonlocal_names,
    }
}
