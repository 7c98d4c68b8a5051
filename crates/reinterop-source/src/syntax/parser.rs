//! Recursive-descent parser for `ExposeToCPP` bodies
//!
//! Ambiguous constructs (generic argument lists vs. `<`, casts vs. parenthesized
//! expressions, lambdas vs. parenthesized expressions, declarations vs.
//! expression statements) are resolved by speculative parsing with rollback,
//! following the disambiguation rules of the managed language.

use super::ast::*;
use super::lexer::{tokenize, SpannedToken, Token};
use super::SyntaxError;

/// Parse an entry body into its statements
pub fn parse_body(source: &str) -> Result<Vec<Statement>, SyntaxError> {
    let tokens = tokenize(source)?;
    let mut parser = Parser::new(tokens);
    let mut statements = Vec::new();
    while !parser.at_end() {
        statements.push(parser.parse_statement()?);
    }
    Ok(statements)
}

/// Parse a standalone type, as used in declarations
pub fn parse_type_syntax(source: &str) -> Result<TypeSyntax, SyntaxError> {
    let tokens = tokenize(source)?;
    let mut parser = Parser::new(tokens);
    let ty = parser.parse_type()?;
    if !parser.at_end() {
        return Err(parser.error_here("unexpected tokens after type"));
    }
    Ok(ty)
}

struct Parser {
    tokens: Vec<SpannedToken>,
    position: usize,
}

impl Parser {
    fn new(tokens: Vec<SpannedToken>) -> Self {
        Self { tokens, position: 0 }
    }

    fn at_end(&self) -> bool {
        self.position >= self.tokens.len()
    }

    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.position).map(|t| &t.token)
    }

    fn peek_at(&self, offset: usize) -> Option<&Token> {
        self.tokens.get(self.position + offset).map(|t| &t.token)
    }

    fn current_span(&self) -> Span {
        self.tokens
            .get(self.position)
            .or_else(|| self.tokens.last())
            .map(|t| t.span)
            .unwrap_or_default()
    }

    fn previous_span(&self) -> Span {
        if self.position == 0 {
            return self.current_span();
        }
        self.tokens[self.position - 1].span
    }

    fn advance(&mut self) -> Option<Token> {
        let token = self.tokens.get(self.position).map(|t| t.token.clone());
        if token.is_some() {
            self.position += 1;
        }
        token
    }

    fn check(&self, token: &Token) -> bool {
        self.peek() == Some(token)
    }

    fn eat(&mut self, token: &Token) -> bool {
        if self.check(token) {
            self.position += 1;
            true
        } else {
            false
        }
    }

    fn error_here(&self, message: &str) -> SyntaxError {
        let span = self.current_span();
        let found = match self.peek() {
            Some(token) => format!("{:?}", token),
            None => "end of input".to_string(),
        };
        SyntaxError::new(format!("{}, found {}", message, found), span.line, span.column)
    }

    fn expect(&mut self, token: Token, what: &str) -> Result<(), SyntaxError> {
        if self.eat(&token) {
            Ok(())
        } else {
            Err(self.error_here(&format!("expected {}", what)))
        }
    }

    fn expect_identifier(&mut self) -> Result<String, SyntaxError> {
        match self.peek() {
            Some(Token::Identifier(name)) => {
                let name = name.clone();
                self.position += 1;
                Ok(name)
            }
            _ => Err(self.error_here("expected identifier")),
        }
    }

    /// Run `f`, restoring the position if it fails
    fn speculate<T>(&mut self, f: impl FnOnce(&mut Self) -> Result<T, SyntaxError>) -> Option<T> {
        let saved = self.position;
        match f(self) {
            Ok(value) => Some(value),
            Err(_) => {
                self.position = saved;
                None
            }
        }
    }

    // ---------------------------------------------------------------- types

    fn parse_type(&mut self) -> Result<TypeSyntax, SyntaxError> {
        let start = self.current_span();
        let mut name = self.expect_identifier()?;
        while self.check(&Token::Dot) && matches!(self.peek_at(1), Some(Token::Identifier(_))) {
            self.position += 1;
            let segment = self.expect_identifier()?;
            name.push('.');
            name.push_str(&segment);
        }
        let type_args = if self.check(&Token::Less) {
            self.parse_type_arguments()?
        } else {
            Vec::new()
        };
        if self.check(&Token::LeftBracket) && self.peek_at(1) == Some(&Token::RightBracket) {
            return Err(self.error_here("array types are not supported"));
        }
        Ok(TypeSyntax {
            name,
            type_args,
            span: start.to(self.previous_span()),
        })
    }

    fn parse_type_arguments(&mut self) -> Result<Vec<TypeSyntax>, SyntaxError> {
        self.expect(Token::Less, "'<'")?;
        let mut args = vec![self.parse_type()?];
        while self.eat(&Token::Comma) {
            args.push(self.parse_type()?);
        }
        self.expect(Token::Greater, "'>'")?;
        Ok(args)
    }

    /// Generic arguments after a name, only if what follows disambiguates them
    fn try_generic_arguments(&mut self) -> Vec<TypeSyntax> {
        if !self.check(&Token::Less) {
            return Vec::new();
        }
        self.speculate(|parser| {
            let args = parser.parse_type_arguments()?;
            match parser.peek() {
                Some(Token::LeftParen)
                | Some(Token::RightParen)
                | Some(Token::Dot)
                | Some(Token::Semicolon)
                | Some(Token::Comma)
                | Some(Token::EqualEqual)
                | Some(Token::NotEqual)
                | Some(Token::RightBracket)
                | None => Ok(args),
                _ => Err(parser.error_here("not a generic argument list")),
            }
        })
        .unwrap_or_default()
    }

    // ----------------------------------------------------------- statements

    fn parse_statement(&mut self) -> Result<Statement, SyntaxError> {
        match self.peek() {
            Some(Token::LeftBrace) => {
                self.position += 1;
                let statements = self.parse_block_rest()?;
                Ok(Statement::Block(statements))
            }
            Some(Token::Semicolon) => {
                self.position += 1;
                Ok(Statement::Empty)
            }
            Some(Token::Return) => {
                self.position += 1;
                if self.eat(&Token::Semicolon) {
                    return Ok(Statement::Return(None));
                }
                let value = self.parse_expression()?;
                self.expect(Token::Semicolon, "';'")?;
                Ok(Statement::Return(Some(value)))
            }
            Some(Token::If) => self.parse_if(),
            Some(Token::Var) => {
                let start = self.current_span();
                self.position += 1;
                let name = self.expect_identifier()?;
                self.expect(Token::Assign, "'=' after implicitly-typed local")?;
                let initializer = self.parse_expression()?;
                self.expect(Token::Semicolon, "';'")?;
                Ok(Statement::Local {
                    ty: None,
                    name,
                    initializer: Some(initializer),
                    span: start.to(self.previous_span()),
                })
            }
            _ => {
                if let Some(local) = self.speculate(Self::parse_typed_local) {
                    return Ok(local);
                }
                let expr = self.parse_expression()?;
                self.expect(Token::Semicolon, "';'")?;
                Ok(Statement::Expression(expr))
            }
        }
    }

    /// Statements up to and including the closing brace
    fn parse_block_rest(&mut self) -> Result<Vec<Statement>, SyntaxError> {
        let mut statements = Vec::new();
        while !self.check(&Token::RightBrace) {
            if self.at_end() {
                return Err(self.error_here("expected '}'"));
            }
            statements.push(self.parse_statement()?);
        }
        self.position += 1;
        Ok(statements)
    }

    fn parse_typed_local(&mut self) -> Result<Statement, SyntaxError> {
        let start = self.current_span();
        let ty = self.parse_type()?;
        let name = self.expect_identifier()?;
        let initializer = if self.eat(&Token::Assign) {
            Some(self.parse_expression()?)
        } else {
            None
        };
        self.expect(Token::Semicolon, "';'")?;
        Ok(Statement::Local {
            ty: Some(ty),
            name,
            initializer,
            span: start.to(self.previous_span()),
        })
    }

    fn parse_if(&mut self) -> Result<Statement, SyntaxError> {
        self.expect(Token::If, "'if'")?;
        self.expect(Token::LeftParen, "'('")?;
        let condition = self.parse_expression()?;
        self.expect(Token::RightParen, "')'")?;
        let then_branch = Box::new(self.parse_statement()?);
        let else_branch = if self.eat(&Token::Else) {
            Some(Box::new(self.parse_statement()?))
        } else {
            None
        };
        Ok(Statement::If {
            condition,
            then_branch,
            else_branch,
        })
    }

    // ---------------------------------------------------------- expressions

    fn parse_expression(&mut self) -> Result<Expr, SyntaxError> {
        self.parse_assignment()
    }

    fn parse_assignment(&mut self) -> Result<Expr, SyntaxError> {
        let target = self.parse_conditional()?;
        let op = match self.peek() {
            Some(Token::Assign) => AssignOp::Assign,
            Some(Token::PlusAssign) => AssignOp::AddAssign,
            Some(Token::MinusAssign) => AssignOp::SubtractAssign,
            _ => return Ok(target),
        };
        self.position += 1;
        let value = self.parse_assignment()?;
        let span = target.span.to(value.span);
        Ok(Expr::new(
            ExprKind::Assign {
                op,
                target: Box::new(target),
                value: Box::new(value),
            },
            span,
        ))
    }

    fn parse_conditional(&mut self) -> Result<Expr, SyntaxError> {
        let condition = self.parse_binary(0)?;
        if !self.eat(&Token::Question) {
            return Ok(condition);
        }
        let when_true = self.parse_expression()?;
        self.expect(Token::Colon, "':'")?;
        let when_false = self.parse_expression()?;
        let span = condition.span.to(when_false.span);
        Ok(Expr::new(
            ExprKind::Conditional {
                condition: Box::new(condition),
                when_true: Box::new(when_true),
                when_false: Box::new(when_false),
            },
            span,
        ))
    }

    fn binary_operator(&self) -> Option<(BinaryOp, u8)> {
        let op = match self.peek()? {
            Token::OrOr => (BinaryOp::Or, 1),
            Token::AndAnd => (BinaryOp::And, 2),
            Token::EqualEqual => (BinaryOp::Equal, 3),
            Token::NotEqual => (BinaryOp::NotEqual, 3),
            Token::Less => (BinaryOp::Less, 4),
            Token::LessEqual => (BinaryOp::LessEqual, 4),
            Token::Greater => (BinaryOp::Greater, 4),
            Token::GreaterEqual => (BinaryOp::GreaterEqual, 4),
            Token::Plus => (BinaryOp::Add, 5),
            Token::Minus => (BinaryOp::Subtract, 5),
            Token::Star => (BinaryOp::Multiply, 6),
            Token::Slash => (BinaryOp::Divide, 6),
            Token::Percent => (BinaryOp::Remainder, 6),
            _ => return None,
        };
        Some(op)
    }

    /// Precedence climbing over left-associative binary operators
    fn parse_binary(&mut self, min_precedence: u8) -> Result<Expr, SyntaxError> {
        let mut left = self.parse_unary()?;
        while let Some((op, precedence)) = self.binary_operator() {
            if precedence <= min_precedence {
                break;
            }
            self.position += 1;
            let right = self.parse_binary(precedence)?;
            let span = left.span.to(right.span);
            left = Expr::new(
                ExprKind::Binary {
                    op,
                    left: Box::new(left),
                    right: Box::new(right),
                },
                span,
            );
        }
        Ok(left)
    }

    fn parse_unary(&mut self) -> Result<Expr, SyntaxError> {
        let start = self.current_span();
        let op = match self.peek() {
            Some(Token::Bang) => UnaryOp::Not,
            Some(Token::Minus) => UnaryOp::Negate,
            Some(Token::PlusPlus) => UnaryOp::Increment,
            Some(Token::MinusMinus) => UnaryOp::Decrement,
            Some(Token::LeftParen) => {
                if let Some(cast) = self.speculate(Self::parse_cast) {
                    return Ok(cast);
                }
                return self.parse_postfix();
            }
            _ => return self.parse_postfix(),
        };
        self.position += 1;
        let operand = self.parse_unary()?;
        let span = start.to(operand.span);
        Ok(Expr::new(
            ExprKind::Unary {
                op,
                operand: Box::new(operand),
            },
            span,
        ))
    }

    /// `(T)operand`, accepted only when the token after `)` can start an operand
    fn parse_cast(&mut self) -> Result<Expr, SyntaxError> {
        let start = self.current_span();
        self.expect(Token::LeftParen, "'('")?;
        let ty = self.parse_type()?;
        self.expect(Token::RightParen, "')'")?;
        match self.peek() {
            Some(Token::Identifier(_))
            | Some(Token::IntegerLiteral(_))
            | Some(Token::RealLiteral(_))
            | Some(Token::StringLiteral(_))
            | Some(Token::CharLiteral(_))
            | Some(Token::LeftParen)
            | Some(Token::New)
            | Some(Token::This)
            | Some(Token::Null)
            | Some(Token::True)
            | Some(Token::False)
            | Some(Token::Typeof)
            | Some(Token::Default)
            | Some(Token::Bang) => {}
            _ => return Err(self.error_here("not a cast")),
        }
        let operand = self.parse_unary()?;
        let span = start.to(operand.span);
        Ok(Expr::new(
            ExprKind::Cast {
                ty,
                operand: Box::new(operand),
            },
            span,
        ))
    }

    fn parse_arguments(&mut self, close: Token, what: &str) -> Result<Vec<Expr>, SyntaxError> {
        let mut args = Vec::new();
        if self.eat(&close) {
            return Ok(args);
        }
        loop {
            args.push(self.parse_expression()?);
            if self.eat(&Token::Comma) {
                continue;
            }
            self.expect(close, what)?;
            return Ok(args);
        }
    }

    fn parse_postfix(&mut self) -> Result<Expr, SyntaxError> {
        let mut expr = self.parse_primary()?;
        loop {
            match self.peek() {
                Some(Token::Dot) => {
                    self.position += 1;
                    let name = self.expect_identifier()?;
                    let type_args = self.try_generic_arguments();
                    let span = expr.span.to(self.previous_span());
                    expr = Expr::new(
                        ExprKind::Member {
                            target: Box::new(expr),
                            name,
                            type_args,
                        },
                        span,
                    );
                }
                Some(Token::LeftParen) => {
                    self.position += 1;
                    let args = self.parse_arguments(Token::RightParen, "')'")?;
                    let span = expr.span.to(self.previous_span());
                    expr = Expr::new(
                        ExprKind::Invoke {
                            callee: Box::new(expr),
                            args,
                        },
                        span,
                    );
                }
                Some(Token::LeftBracket) => {
                    self.position += 1;
                    let args = self.parse_arguments(Token::RightBracket, "']'")?;
                    let span = expr.span.to(self.previous_span());
                    expr = Expr::new(
                        ExprKind::Index {
                            target: Box::new(expr),
                            args,
                        },
                        span,
                    );
                }
                Some(Token::PlusPlus) | Some(Token::MinusMinus) => {
                    let op = if self.check(&Token::PlusPlus) {
                        UnaryOp::Increment
                    } else {
                        UnaryOp::Decrement
                    };
                    self.position += 1;
                    let span = expr.span.to(self.previous_span());
                    expr = Expr::new(
                        ExprKind::Unary {
                            op,
                            operand: Box::new(expr),
                        },
                        span,
                    );
                }
                _ => return Ok(expr),
            }
        }
    }

    fn parse_lambda_body(&mut self) -> Result<LambdaBody, SyntaxError> {
        if self.eat(&Token::LeftBrace) {
            Ok(LambdaBody::Block(self.parse_block_rest()?))
        } else {
            Ok(LambdaBody::Expression(Box::new(self.parse_expression()?)))
        }
    }

    /// `(a, b) => ...` or `(int a, float b) => ...`
    fn parse_parenthesized_lambda(&mut self) -> Result<Expr, SyntaxError> {
        let start = self.current_span();
        self.expect(Token::LeftParen, "'('")?;
        let mut parameters = Vec::new();
        if !self.eat(&Token::RightParen) {
            loop {
                let first = self.expect_identifier()?;
                let name = if matches!(self.peek(), Some(Token::Identifier(_))) {
                    self.expect_identifier()?
                } else {
                    first
                };
                parameters.push(name);
                if self.eat(&Token::Comma) {
                    continue;
                }
                self.expect(Token::RightParen, "')'")?;
                break;
            }
        }
        self.expect(Token::Arrow, "'=>'")?;
        let body = self.parse_lambda_body()?;
        Ok(Expr::new(
            ExprKind::Lambda { parameters, body },
            start.to(self.previous_span()),
        ))
    }

    fn parse_primary(&mut self) -> Result<Expr, SyntaxError> {
        let start = self.current_span();
        let token = match self.peek() {
            Some(token) => token.clone(),
            None => return Err(self.error_here("expected expression")),
        };

        let kind = match token {
            Token::IntegerLiteral(text) => {
                self.position += 1;
                ExprKind::Literal(Literal::Integer(text))
            }
            Token::RealLiteral(text) => {
                self.position += 1;
                ExprKind::Literal(Literal::Real(text))
            }
            Token::StringLiteral(text) => {
                self.position += 1;
                ExprKind::Literal(Literal::String(text))
            }
            Token::CharLiteral(c) => {
                self.position += 1;
                ExprKind::Literal(Literal::Char(c))
            }
            Token::True | Token::False => {
                self.position += 1;
                ExprKind::Literal(Literal::Bool(token == Token::True))
            }
            Token::Null => {
                self.position += 1;
                ExprKind::Literal(Literal::Null)
            }
            Token::This => {
                self.position += 1;
                ExprKind::This
            }
            Token::New => {
                self.position += 1;
                let ty = self.parse_type()?;
                self.expect(Token::LeftParen, "'(' after type in object creation")?;
                let args = self.parse_arguments(Token::RightParen, "')'")?;
                ExprKind::New { ty, args }
            }
            Token::Typeof => {
                self.position += 1;
                self.expect(Token::LeftParen, "'('")?;
                let ty = self.parse_type()?;
                self.expect(Token::RightParen, "')'")?;
                ExprKind::TypeOf(ty)
            }
            Token::Default => {
                self.position += 1;
                if self.eat(&Token::LeftParen) {
                    let ty = self.parse_type()?;
                    self.expect(Token::RightParen, "')'")?;
                    ExprKind::Default(Some(ty))
                } else {
                    ExprKind::Default(None)
                }
            }
            Token::Identifier(name) => {
                if self.peek_at(1) == Some(&Token::Arrow) {
                    self.position += 2;
                    let body = self.parse_lambda_body()?;
                    ExprKind::Lambda {
                        parameters: vec![name],
                        body,
                    }
                } else {
                    self.position += 1;
                    let type_args = self.try_generic_arguments();
                    ExprKind::Name { name, type_args }
                }
            }
            Token::LeftParen => {
                if let Some(lambda) = self.speculate(Self::parse_parenthesized_lambda) {
                    return Ok(lambda);
                }
                self.position += 1;
                let inner = self.parse_expression()?;
                self.expect(Token::RightParen, "')'")?;
                return Ok(Expr::new(inner.kind, start.to(self.previous_span())));
            }
            _ => return Err(self.error_here("expected expression")),
        };

        Ok(Expr::new(kind, start.to(self.previous_span())))
    }
}
