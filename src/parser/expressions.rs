//! Expression parsing
//!
//! One method per precedence level, loosest first:
//! lambda / conditional, `or`, `and`, `not`, comparisons, `|`, `^`, `&`,
//! shifts, `+ -`, `* / // %`, unary `- + ~`, `**`, then primaries with
//! call / attribute / subscript trailers.

use crate::parser::ast::*;
use crate::parser::lexer::TokenKind;
use crate::parser::parse::{ParseError, Parser};
use crate::parser::statements::build_function_code;
use std::rc::Rc;

impl Parser {
    /// `expr (',' expr)* [',']`, producing a tuple when a comma is present.
    pub(crate) fn parse_expression_list(&mut self) -> Result<Expr, ParseError> {
        let first = self.parse_expression()?;
        if !self.check(&TokenKind::Comma) {
            return Ok(first);
        }
        let mut items = vec![first];
        while self.match_token(&TokenKind::Comma) {
            if self.at_expression_list_end() {
                break;
            }
            items.push(self.parse_expression()?);
        }
        Ok(Expr::Tuple(items))
    }

    fn at_expression_list_end(&self) -> bool {
        matches!(
            self.peek(),
            TokenKind::Newline
                | TokenKind::Semicolon
                | TokenKind::Eof
                | TokenKind::Eq
                | TokenKind::RParen
                | TokenKind::RBracket
                | TokenKind::RBrace
                | TokenKind::Colon
        )
    }

    pub(crate) fn parse_expression(&mut self) -> Result<Expr, ParseError> {
        if self.check(&TokenKind::Lambda) {
            return self.parse_lambda();
        }

        let value = self.parse_or()?;
        if !self.match_token(&TokenKind::If) {
            return Ok(value);
        }
        let condition = self.parse_or()?;
        self.expect_token(&TokenKind::Else, "expected 'else' in conditional expression")?;
        let else_value = self.parse_expression()?;
        Ok(Expr::Conditional {
            condition: Box::new(condition),
            then_value: Box::new(value),
            else_value: Box::new(else_value),
        })
    }

    fn parse_lambda(&mut self) -> Result<Expr, ParseError> {
        let location = self.current_location();
        self.advance(); // lambda
        let params = self.parse_params(&TokenKind::Colon, false)?;
        self.expect_colon("after lambda parameters")?;
        let body = self.parse_expression()?;
        let code = build_function_code(
            "<lambda>".to_string(),
            params,
            FunctionBody::Expr(body),
            location,
        );
        Ok(Expr::Lambda(Rc::new(code)))
    }

    pub(crate) fn parse_or(&mut self) -> Result<Expr, ParseError> {
        let mut left = self.parse_and()?;
        while self.match_token(&TokenKind::Or) {
            let right = self.parse_and()?;
            left = Expr::Logical {
                op: BoolOp::Or,
                left: Box::new(left),
                right: Box::new(right),
            };
        }
        Ok(left)
    }

    fn parse_and(&mut self) -> Result<Expr, ParseError> {
        let mut left = self.parse_not()?;
        while self.match_token(&TokenKind::And) {
            let right = self.parse_not()?;
            left = Expr::Logical {
                op: BoolOp::And,
                left: Box::new(left),
                right: Box::new(right),
            };
        }
        Ok(left)
    }

    fn parse_not(&mut self) -> Result<Expr, ParseError> {
        if self.match_token(&TokenKind::Not) {
            let operand = self.parse_not()?;
            return Ok(Expr::Unary {
                op: UnOp::Not,
                operand: Box::new(operand),
            });
        }
        self.parse_comparison()
    }

    fn parse_comparison(&mut self) -> Result<Expr, ParseError> {
        let left = self.parse_bitor()?;
        let mut rest = Vec::new();

        loop {
            let op = match self.peek() {
                TokenKind::EqEq => CmpOp::Eq,
                TokenKind::NotEq => CmpOp::Ne,
                TokenKind::Lt => CmpOp::Lt,
                TokenKind::Le => CmpOp::Le,
                TokenKind::Gt => CmpOp::Gt,
                TokenKind::Ge => CmpOp::Ge,
                TokenKind::In => CmpOp::In,
                TokenKind::Not if self.peek_ahead(1) == Some(&TokenKind::In) => {
                    self.advance();
                    CmpOp::NotIn
                }
                TokenKind::Is => {
                    if self.peek_ahead(1) == Some(&TokenKind::Not) {
                        self.advance();
                        CmpOp::IsNot
                    } else {
                        CmpOp::Is
                    }
                }
                _ => break,
            };
            self.advance();
            rest.push((op, self.parse_bitor()?));
        }

        if rest.is_empty() {
            Ok(left)
        } else {
            Ok(Expr::Compare {
                left: Box::new(left),
                rest,
            })
        }
    }

    pub(crate) fn parse_bitor(&mut self) -> Result<Expr, ParseError> {
        self.parse_binary_level(0)
    }

    /// Left-associative binary levels from `|` (level 0) down to `* / // %`.
    fn parse_binary_level(&mut self, level: usize) -> Result<Expr, ParseError> {
        if level > MULTIPLICATIVE_LEVEL {
            return self.parse_unary();
        }

        let mut left = self.parse_binary_level(level + 1)?;
        while let Some(op) = binary_operator(level, self.peek()) {
            self.advance();
            let right = self.parse_binary_level(level + 1)?;
            left = Expr::Binary {
                op,
                left: Box::new(left),
                right: Box::new(right),
            };
        }
        Ok(left)
    }

    fn parse_unary(&mut self) -> Result<Expr, ParseError> {
        let op = match self.peek() {
            TokenKind::Minus => UnOp::Neg,
            TokenKind::Plus => UnOp::Pos,
            TokenKind::Tilde => UnOp::Invert,
            _ => return self.parse_power(),
        };
        self.advance();
        let operand = self.parse_unary()?;

        // Fold negative literals so `-5` is a constant
        if op == UnOp::Neg {
            match operand {
                Expr::Int(n) => return Ok(Expr::Int(n.wrapping_neg())),
                Expr::Float(n) => return Ok(Expr::Float(-n)),
                _ => {}
            }
        }
        Ok(Expr::Unary {
            op,
            operand: Box::new(operand),
        })
    }

    fn parse_power(&mut self) -> Result<Expr, ParseError> {
        let base = self.parse_primary()?;
        if self.match_token(&TokenKind::DoubleStar) {
            let exponent = self.parse_unary()?;
            return Ok(Expr::Binary {
                op: BinOp::Pow,
                left: Box::new(base),
                right: Box::new(exponent),
            });
        }
        Ok(base)
    }

    fn parse_primary(&mut self) -> Result<Expr, ParseError> {
        let mut expr = self.parse_atom()?;

        loop {
            match self.peek() {
                TokenKind::LParen => {
                    self.advance();
                    let (args, kwargs) = self.parse_call_arguments()?;
                    expr = Expr::Call {
                        func: Box::new(expr),
                        args,
                        kwargs,
                    };
                }
                TokenKind::Dot => {
                    self.advance();
                    let name = self.expect_identifier()?;
                    expr = Expr::Attribute {
                        value: Box::new(expr),
                        name,
                    };
                }
                TokenKind::LBracket => {
                    self.advance();
                    let index = self.parse_subscript()?;
                    self.expect_token(&TokenKind::RBracket, "expected ']' after subscript")?;
                    expr = Expr::Subscript {
                        value: Box::new(expr),
                        index: Box::new(index),
                    };
                }
                _ => break,
            }
        }

        Ok(expr)
    }

    fn parse_call_arguments(&mut self) -> Result<(Vec<Expr>, Vec<(String, Expr)>), ParseError> {
        let mut args = Vec::new();
        let mut kwargs: Vec<(String, Expr)> = Vec::new();

        while !self.check(&TokenKind::RParen) {
            if self.check(&TokenKind::Star) || self.check(&TokenKind::DoubleStar) {
                return Err(self.error_here("argument unpacking is not supported"));
            }
            let is_keyword = matches!(self.peek(), TokenKind::Ident(_))
                && self.peek_ahead(1) == Some(&TokenKind::Eq);
            if is_keyword {
                let location = self.current_location();
                let name = self.expect_identifier()?;
                self.advance(); // =
                if kwargs.iter().any(|(k, _)| *k == name) {
                    return Err(ParseError {
                        message: format!("keyword argument repeated: {}", name),
                        location,
                    });
                }
                kwargs.push((name, self.parse_expression()?));
            } else {
                if !kwargs.is_empty() {
                    return Err(self.error_here("positional argument follows keyword argument"));
                }
                args.push(self.parse_expression()?);
            }
            if !self.match_token(&TokenKind::Comma) {
                break;
            }
        }

        self.expect_rparen("after call arguments")?;
        Ok((args, kwargs))
    }

    fn parse_subscript(&mut self) -> Result<Expr, ParseError> {
        let lower = if self.check(&TokenKind::Colon) {
            None
        } else {
            let index = self.parse_expression_list()?;
            if !self.check(&TokenKind::Colon) {
                return Ok(index);
            }
            Some(Box::new(index))
        };

        self.advance(); // :
        let upper = if matches!(self.peek(), TokenKind::Colon | TokenKind::RBracket) {
            None
        } else {
            Some(Box::new(self.parse_expression()?))
        };
        let step = if self.match_token(&TokenKind::Colon) && !self.check(&TokenKind::RBracket) {
            Some(Box::new(self.parse_expression()?))
        } else {
            None
        };
        Ok(Expr::Slice { lower, upper, step })
    }

    fn parse_atom(&mut self) -> Result<Expr, ParseError> {
        let token = self.advance();
        let location = token.location;

        match token.kind {
            TokenKind::Int(n) => Ok(Expr::Int(n)),
            TokenKind::Float(n) => Ok(Expr::Float(n)),
            TokenKind::True => Ok(Expr::Bool(true)),
            TokenKind::False => Ok(Expr::Bool(false)),
            TokenKind::None => Ok(Expr::NoneLit),
            TokenKind::Ident(name) => Ok(Expr::Name(name)),
            kind @ (TokenKind::Str(_) | TokenKind::FString(_) | TokenKind::Bytes(_)) => {
                self.parse_string_concatenation(kind, location)
            }
            TokenKind::LParen => self.parse_parenthesized(),
            TokenKind::LBracket => self.parse_list_display(),
            TokenKind::LBrace => self.parse_brace_display(),
            other => Err(ParseError {
                message: format!("invalid syntax: unexpected {}", other),
                location,
            }),
        }
    }

    /// Adjacent string literals are concatenated, as in `"a" "b"`.
    fn parse_string_concatenation(
        &mut self,
        first: TokenKind,
        location: SourceLocation,
    ) -> Result<Expr, ParseError> {
        let mut pieces = vec![first];
        while matches!(
            self.peek(),
            TokenKind::Str(_) | TokenKind::FString(_) | TokenKind::Bytes(_)
        ) {
            pieces.push(self.advance().kind);
        }

        if pieces.iter().all(|p| matches!(p, TokenKind::Bytes(_))) {
            let mut bytes = Vec::new();
            for piece in pieces {
                if let TokenKind::Bytes(b) = piece {
                    bytes.extend(b);
                }
            }
            return Ok(Expr::Bytes(bytes));
        }
        if pieces.iter().any(|p| matches!(p, TokenKind::Bytes(_))) {
            return Err(ParseError {
                message: "cannot mix bytes and nonbytes literals".to_string(),
                location,
            });
        }

        let mut parts = Vec::new();
        for piece in pieces {
            match piece {
                TokenKind::Str(s) => parts.push(FStringPart::Literal(s)),
                TokenKind::FString(raw) => parts.extend(parse_fstring(&raw, location)?),
                _ => {}
            }
        }

        if parts.iter().all(|p| matches!(p, FStringPart::Literal(_))) {
            let text: String = parts
                .into_iter()
                .map(|p| match p {
                    FStringPart::Literal(s) => s,
                    FStringPart::Field { .. } => String::new(),
                })
                .collect();
            Ok(Expr::Str(text))
        } else {
            Ok(Expr::FString(parts))
        }
    }

    fn parse_parenthesized(&mut self) -> Result<Expr, ParseError> {
        if self.match_token(&TokenKind::RParen) {
            return Ok(Expr::Tuple(Vec::new()));
        }
        let first = self.parse_expression()?;
        if self.check(&TokenKind::For) {
            return Err(self.error_here("generator expressions are not supported"));
        }
        if self.match_token(&TokenKind::RParen) {
            return Ok(first);
        }

        let mut items = vec![first];
        while self.match_token(&TokenKind::Comma) {
            if self.check(&TokenKind::RParen) {
                break;
            }
            items.push(self.parse_expression()?);
        }
        self.expect_rparen("to close tuple")?;
        Ok(Expr::Tuple(items))
    }

    fn parse_list_display(&mut self) -> Result<Expr, ParseError> {
        if self.match_token(&TokenKind::RBracket) {
            return Ok(Expr::List(Vec::new()));
        }
        let first = self.parse_expression()?;
        if self.check(&TokenKind::For) {
            let clause = self.parse_comprehension_clause()?;
            self.expect_token(&TokenKind::RBracket, "expected ']' after list comprehension")?;
            return Ok(Expr::ListComp {
                element: Box::new(first),
                clause: Box::new(clause),
            });
        }

        let mut items = vec![first];
        while self.match_token(&TokenKind::Comma) {
            if self.check(&TokenKind::RBracket) {
                break;
            }
            items.push(self.parse_expression()?);
        }
        self.expect_token(&TokenKind::RBracket, "expected ']' to close list")?;
        Ok(Expr::List(items))
    }

    fn parse_brace_display(&mut self) -> Result<Expr, ParseError> {
        if self.match_token(&TokenKind::RBrace) {
            return Ok(Expr::Dict(Vec::new()));
        }

        let first = self.parse_expression()?;
        if !self.match_token(&TokenKind::Colon) {
            if self.check(&TokenKind::For) {
                return Err(self.error_here("set comprehensions are not supported"));
            }
            let mut items = vec![first];
            while self.match_token(&TokenKind::Comma) {
                if self.check(&TokenKind::RBrace) {
                    break;
                }
                items.push(self.parse_expression()?);
            }
            self.expect_token(&TokenKind::RBrace, "expected '}' to close set")?;
            return Ok(Expr::Set(items));
        }

        let first_value = self.parse_expression()?;
        if self.check(&TokenKind::For) {
            let clause = self.parse_comprehension_clause()?;
            self.expect_token(&TokenKind::RBrace, "expected '}' after dict comprehension")?;
            return Ok(Expr::DictComp {
                key: Box::new(first),
                value: Box::new(first_value),
                clause: Box::new(clause),
            });
        }

        let mut entries = vec![(first, first_value)];
        while self.match_token(&TokenKind::Comma) {
            if self.check(&TokenKind::RBrace) {
                break;
            }
            let key = self.parse_expression()?;
            self.expect_colon("after dict key")?;
            let value = self.parse_expression()?;
            entries.push((key, value));
        }
        self.expect_token(&TokenKind::RBrace, "expected '}' to close dict")?;
        Ok(Expr::Dict(entries))
    }

    fn parse_comprehension_clause(&mut self) -> Result<Comprehension, ParseError> {
        let location = self.current_location();
        self.advance(); // for
        let target = self.parse_target_list(location)?;
        self.expect_token(&TokenKind::In, "expected 'in' in comprehension")?;
        let iter = self.parse_or()?;
        let condition = if self.match_token(&TokenKind::If) {
            Some(self.parse_or()?)
        } else {
            None
        };
        if self.check(&TokenKind::For) || self.check(&TokenKind::If) {
            return Err(self.error_here("only one 'for' clause is supported in comprehensions"));
        }
        Ok(Comprehension {
            target,
            iter,
            condition,
        })
    }
}

const MULTIPLICATIVE_LEVEL: usize = 5;

fn binary_operator(level: usize, kind: &TokenKind) -> Option<BinOp> {
    let op = match (level, kind) {
        (0, TokenKind::Pipe) => BinOp::BitOr,
        (1, TokenKind::Caret) => BinOp::BitXor,
        (2, TokenKind::Amp) => BinOp::BitAnd,
        (3, TokenKind::LtLt) => BinOp::Shl,
        (3, TokenKind::GtGt) => BinOp::Shr,
        (4, TokenKind::Plus) => BinOp::Add,
        (4, TokenKind::Minus) => BinOp::Sub,
        (5, TokenKind::Star) => BinOp::Mul,
        (5, TokenKind::Slash) => BinOp::Div,
        (5, TokenKind::DoubleSlash) => BinOp::FloorDiv,
        (5, TokenKind::Percent) => BinOp::Mod,
        _ => return None,
    };
    Some(op)
}

/// Split an f-string body into literal text and `{expr[!r][:spec]}` fields.
fn parse_fstring(raw: &str, location: SourceLocation) -> Result<Vec<FStringPart>, ParseError> {
    let chars: Vec<char> = raw.chars().collect();
    let mut parts = Vec::new();
    let mut literal = String::new();
    let mut i = 0;

    let error = |message: &str| ParseError {
        message: format!("f-string: {}", message),
        location,
    };

    while i < chars.len() {
        let c = chars[i];
        if c == '{' && chars.get(i + 1) == Some(&'{') {
            literal.push('{');
            i += 2;
            continue;
        }
        if c == '}' {
            if chars.get(i + 1) == Some(&'}') {
                literal.push('}');
                i += 2;
                continue;
            }
            return Err(error("single '}' is not allowed"));
        }
        if c != '{' {
            literal.push(c);
            i += 1;
            continue;
        }

        // Scan to the matching close brace, tracking nesting and quotes
        let start = i + 1;
        let mut depth = 0usize;
        let mut quote: Option<char> = None;
        let mut expr_end = None;
        let mut conversion_at = None;
        let mut spec_at = None;
        let mut j = start;
        while j < chars.len() {
            let d = chars[j];
            if let Some(q) = quote {
                if d == q {
                    quote = None;
                }
            } else {
                match d {
                    '\'' | '"' => quote = Some(d),
                    '(' | '[' | '{' => depth += 1,
                    ')' | ']' => depth = depth.saturating_sub(1),
                    '}' if depth > 0 => depth -= 1,
                    '}' => {
                        expr_end = Some(j);
                        break;
                    }
                    '!' if depth == 0
                        && spec_at.is_none()
                        && chars.get(j + 1) != Some(&'=') =>
                    {
                        conversion_at.get_or_insert(j);
                    }
                    ':' if depth == 0 && spec_at.is_none() => spec_at = Some(j),
                    _ => {}
                }
            }
            j += 1;
        }

        let close = expr_end.ok_or_else(|| error("expecting '}'"))?;
        let expr_stop = conversion_at.or(spec_at).unwrap_or(close);
        let expr_text: String = chars[start..expr_stop].iter().collect();
        if expr_text.trim().is_empty() {
            return Err(error("empty expression not allowed"));
        }

        let repr = match conversion_at {
            Some(at) => {
                let conv_end = spec_at.unwrap_or(close);
                let conversion: String = chars[at + 1..conv_end].iter().collect();
                match conversion.as_str() {
                    "r" => true,
                    "s" => false,
                    other => return Err(error(&format!("invalid conversion character '{}'", other))),
                }
            }
            None => false,
        };
        let spec = spec_at.map(|at| chars[at + 1..close].iter().collect::<String>());

        let mut sub = Parser::new(expr_text.trim()).map_err(|e| error(&e.message))?;
        let expr = sub.parse_standalone_expression().map_err(|e| error(&e.message))?;

        if !literal.is_empty() {
            parts.push(FStringPart::Literal(std::mem::take(&mut literal)));
        }
        parts.push(FStringPart::Field { expr, repr, spec });
        i = close + 1;
    }

    if !literal.is_empty() {
        parts.push(FStringPart::Literal(literal));
    }
    Ok(parts)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn expr(src: &str) -> Expr {
        Parser::new(src).unwrap().parse_standalone_expression().unwrap()
    }

    #[test]
    fn test_precedence() {
        match expr("1 + 2 * 3") {
            Expr::Binary {
                op: BinOp::Add,
                right,
                ..
            } => assert!(matches!(*right, Expr::Binary { op: BinOp::Mul, .. })),
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_power_binds_tighter_than_unary_minus() {
        match expr("-2 ** 2") {
            Expr::Unary { op: UnOp::Neg, operand } => {
                assert!(matches!(*operand, Expr::Binary { op: BinOp::Pow, .. }))
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_chained_comparison_and_membership() {
        match expr("a < b <= c not in d") {
            Expr::Compare { rest, .. } => {
                let ops: Vec<CmpOp> = rest.iter().map(|(op, _)| *op).collect();
                assert_eq!(ops, vec![CmpOp::Lt, CmpOp::Le, CmpOp::NotIn]);
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_displays() {
        assert!(matches!(expr("()"), Expr::Tuple(ref v) if v.is_empty()));
        assert!(matches!(expr("(1,)"), Expr::Tuple(ref v) if v.len() == 1));
        assert!(matches!(expr("(1)"), Expr::Int(1)));
        assert!(matches!(expr("{}"), Expr::Dict(ref v) if v.is_empty()));
        assert!(matches!(expr("{1, 2}"), Expr::Set(ref v) if v.len() == 2));
        assert!(matches!(expr("{'a': 1}"), Expr::Dict(ref v) if v.len() == 1));
        assert!(matches!(expr("[x * 2 for x in xs if x]"), Expr::ListComp { .. }));
        assert!(matches!(expr("{k: v for k, v in items}"), Expr::DictComp { .. }));
    }

    #[test]
    fn test_call_with_keywords_and_slices() {
        match expr("f(a, sep='-')[1:3]") {
            Expr::Subscript { value, index } => {
                assert!(matches!(*index, Expr::Slice { .. }));
                match *value {
                    Expr::Call { args, kwargs, .. } => {
                        assert_eq!(args.len(), 1);
                        assert_eq!(kwargs[0].0, "sep");
                    }
                    other => panic!("unexpected {:?}", other),
                }
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_lambda_and_conditional() {
        assert!(matches!(expr("lambda x, y=1: x + y"), Expr::Lambda(ref c) if c.params.len() == 2));
        assert!(matches!(expr("a if c else b"), Expr::Conditional { .. }));
    }

    #[test]
    fn test_fstring_fields() {
        match expr("f'x={x!r} y={y:.2f} {{lit}}'") {
            Expr::FString(parts) => {
                assert_eq!(parts.len(), 5);
                assert!(matches!(parts[1], FStringPart::Field { repr: true, .. }));
                assert!(
                    matches!(parts[3], FStringPart::Field { ref spec, .. } if spec.as_deref() == Some(".2f"))
                );
                assert!(matches!(parts[4], FStringPart::Literal(ref s) if s == " {lit}"));
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_plain_fstring_collapses_to_string() {
        assert!(matches!(expr("f'plain' 'text'"), Expr::Str(ref s) if s == "plaintext"));
    }
}
