//! Formula parser
//!
//! A recursive descent parser for field formulas with proper operator precedence.

use crate::ast::{BinaryOperator, FormulaExpr, Literal, UnaryOperator};
use crate::error::{FormulaError, FormulaResult};
use std::fmt;

/// Maximum nesting depth accepted by the parser
pub const MAX_DEPTH: usize = 64;

/// Parse a formula string into an AST
///
/// # Example
/// ```rust
/// use fieldrules_formula::parse_formula;
///
/// let ast = parse_formula("1 + 2").unwrap();
/// let ast = parse_formula("qty * unit_price").unwrap();
/// let ast = parse_formula("if_else(qty > 0, \"Yes\", \"No\")").unwrap();
/// ```
pub fn parse_formula(formula: &str) -> FormulaResult<FormulaExpr> {
    if formula.trim().is_empty() {
        return Err(FormulaError::syntax("Empty formula"));
    }

    let mut parser = FormulaParser::new(formula)?;
    let expr = parser.parse_expression()?;

    // Make sure we consumed all input
    if !matches!(parser.current_token(), Token::Eof) {
        return Err(FormulaError::syntax(format!(
            "Unexpected {} after expression at position {}",
            parser.current_token(),
            parser.column(parser.token_start)
        )));
    }

    Ok(expr)
}

/// Token types
#[derive(Debug, Clone, PartialEq)]
enum Token {
    // Literals
    Integer(i64),
    Float(f64),
    String(String),
    Boolean(bool),
    None,

    // Identifiers
    Identifier(String),

    // Keywords
    And,
    Or,
    Not,

    // Operators
    Plus,
    Minus,
    Star,
    DoubleStar,
    Slash,
    Percent,
    EqualEqual,
    NotEqual,
    LessThan,
    LessEqual,
    GreaterThan,
    GreaterEqual,
    Comma,

    // Delimiters
    LeftParen,
    RightParen,

    // End of input
    Eof,
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Token::Integer(n) => write!(f, "number {}", n),
            Token::Float(n) => write!(f, "number {:?}", n),
            Token::String(s) => write!(f, "string {:?}", s),
            Token::Boolean(b) => write!(f, "'{}'", b),
            Token::None => write!(f, "'none'"),
            Token::Identifier(name) => write!(f, "identifier '{}'", name),
            Token::And => write!(f, "'and'"),
            Token::Or => write!(f, "'or'"),
            Token::Not => write!(f, "'not'"),
            Token::Plus => write!(f, "'+'"),
            Token::Minus => write!(f, "'-'"),
            Token::Star => write!(f, "'*'"),
            Token::DoubleStar => write!(f, "'**'"),
            Token::Slash => write!(f, "'/'"),
            Token::Percent => write!(f, "'%'"),
            Token::EqualEqual => write!(f, "'=='"),
            Token::NotEqual => write!(f, "'!='"),
            Token::LessThan => write!(f, "'<'"),
            Token::LessEqual => write!(f, "'<='"),
            Token::GreaterThan => write!(f, "'>'"),
            Token::GreaterEqual => write!(f, "'>='"),
            Token::Comma => write!(f, "','"),
            Token::LeftParen => write!(f, "'('"),
            Token::RightParen => write!(f, "')'"),
            Token::Eof => write!(f, "end of input"),
        }
    }
}

/// Formula parser
struct FormulaParser<'a> {
    input: &'a str,
    pos: usize,
    current_token: Token,
    /// Byte offset where the current token starts
    token_start: usize,
    depth: usize,
}

impl<'a> FormulaParser<'a> {
    fn new(input: &'a str) -> FormulaResult<Self> {
        let mut parser = Self {
            input,
            pos: 0,
            current_token: Token::Eof,
            token_start: 0,
            depth: 0,
        };
        parser.advance_token()?;
        Ok(parser)
    }

    // === Token scanning ===

    fn advance_token(&mut self) -> FormulaResult<()> {
        self.skip_whitespace();
        self.token_start = self.pos;
        self.current_token = self.scan_token()?;
        Ok(())
    }

    fn scan_token(&mut self) -> FormulaResult<Token> {
        let c = match self.peek_char() {
            Some(c) => c,
            None => return Ok(Token::Eof),
        };

        // Single-character tokens
        let single = match c {
            '+' => Some(Token::Plus),
            '-' => Some(Token::Minus),
            '/' => Some(Token::Slash),
            '%' => Some(Token::Percent),
            ',' => Some(Token::Comma),
            '(' => Some(Token::LeftParen),
            ')' => Some(Token::RightParen),
            _ => None,
        };
        if let Some(token) = single {
            self.advance();
            return Ok(token);
        }

        // One- or two-character operators
        match c {
            '*' => {
                self.advance();
                if self.peek_char() == Some('*') {
                    self.advance();
                    return Ok(Token::DoubleStar);
                }
                return Ok(Token::Star);
            }
            '<' => {
                self.advance();
                if self.peek_char() == Some('=') {
                    self.advance();
                    return Ok(Token::LessEqual);
                }
                return Ok(Token::LessThan);
            }
            '>' => {
                self.advance();
                if self.peek_char() == Some('=') {
                    self.advance();
                    return Ok(Token::GreaterEqual);
                }
                return Ok(Token::GreaterThan);
            }
            '=' => {
                self.advance();
                if self.peek_char() == Some('=') {
                    self.advance();
                    return Ok(Token::EqualEqual);
                }
                return Err(self.unexpected_char('=', Some("did you mean '=='?")));
            }
            '!' => {
                self.advance();
                if self.peek_char() == Some('=') {
                    self.advance();
                    return Ok(Token::NotEqual);
                }
                return Err(self.unexpected_char('!', Some("did you mean '!=' or 'not'?")));
            }
            _ => {}
        }

        // String literal
        if c == '"' {
            return self.scan_string();
        }

        // Number
        if c.is_ascii_digit()
            || (c == '.' && self.peek_char_at(1).map_or(false, |c| c.is_ascii_digit()))
        {
            return self.scan_number();
        }

        // Identifier or keyword
        if c.is_ascii_alphabetic() || c == '_' {
            return Ok(self.scan_identifier());
        }

        Err(self.unexpected_char(c, None))
    }

    fn unexpected_char(&self, c: char, hint: Option<&str>) -> FormulaError {
        let mut msg = format!(
            "Unexpected character '{}' at position {}",
            c,
            self.column(self.token_start)
        );
        if let Some(hint) = hint {
            msg.push_str(" (");
            msg.push_str(hint);
            msg.push(')');
        }
        FormulaError::Syntax(msg)
    }

    fn scan_string(&mut self) -> FormulaResult<Token> {
        let start = self.pos;
        self.advance(); // Skip opening quote

        let mut s = String::new();
        loop {
            match self.peek_char() {
                None => {
                    return Err(FormulaError::syntax(format!(
                        "Unterminated string literal starting at position {}",
                        self.column(start)
                    )))
                }
                Some('"') => {
                    self.advance();
                    return Ok(Token::String(s));
                }
                Some('\\') => {
                    self.advance();
                    match self.peek_char() {
                        Some('"') => s.push('"'),
                        Some('\\') => s.push('\\'),
                        Some('n') => s.push('\n'),
                        Some('t') => s.push('\t'),
                        Some('r') => s.push('\r'),
                        // Unknown escapes are kept verbatim
                        Some(other) => {
                            s.push('\\');
                            s.push(other);
                        }
                        None => continue,
                    }
                    self.advance();
                }
                Some(c) => {
                    s.push(c);
                    self.advance();
                }
            }
        }
    }

    fn scan_number(&mut self) -> FormulaResult<Token> {
        let start = self.pos;
        let mut is_float = false;

        // Integer part
        while self.peek_char().map_or(false, |c| c.is_ascii_digit()) {
            self.advance();
        }

        // Decimal part
        if self.peek_char() == Some('.') {
            is_float = true;
            self.advance();
            while self.peek_char().map_or(false, |c| c.is_ascii_digit()) {
                self.advance();
            }
        }

        // Exponent part
        if self.peek_char().map_or(false, |c| c == 'e' || c == 'E') {
            is_float = true;
            self.advance();
            if self.peek_char().map_or(false, |c| c == '+' || c == '-') {
                self.advance();
            }
            if !self.peek_char().map_or(false, |c| c.is_ascii_digit()) {
                return Err(FormulaError::syntax(format!(
                    "Malformed number '{}' at position {}",
                    &self.input[start..self.pos],
                    self.column(start)
                )));
            }
            while self.peek_char().map_or(false, |c| c.is_ascii_digit()) {
                self.advance();
            }
        }

        // A number must not run straight into an identifier (e.g. `3abc`)
        if self
            .peek_char()
            .map_or(false, |c| c.is_ascii_alphanumeric() || c == '_')
        {
            while self
                .peek_char()
                .map_or(false, |c| c.is_ascii_alphanumeric() || c == '_')
            {
                self.advance();
            }
            return Err(FormulaError::syntax(format!(
                "Invalid number literal '{}' at position {}",
                &self.input[start..self.pos],
                self.column(start)
            )));
        }

        let num_str = &self.input[start..self.pos];
        if is_float {
            num_str.parse().map(Token::Float).map_err(|_| {
                FormulaError::syntax(format!("Malformed number '{}'", num_str))
            })
        } else {
            num_str.parse().map(Token::Integer).map_err(|_| {
                FormulaError::syntax(format!("Integer literal out of range: {}", num_str))
            })
        }
    }

    fn scan_identifier(&mut self) -> Token {
        let start = self.pos;

        while self
            .peek_char()
            .map_or(false, |c| c.is_ascii_alphanumeric() || c == '_')
        {
            self.advance();
        }

        match &self.input[start..self.pos] {
            "and" => Token::And,
            "or" => Token::Or,
            "not" => Token::Not,
            "true" | "True" => Token::Boolean(true),
            "false" | "False" => Token::Boolean(false),
            "none" | "None" | "null" => Token::None,
            text => Token::Identifier(text.to_string()),
        }
    }

    // === Helper methods ===

    fn peek_char(&self) -> Option<char> {
        self.input[self.pos..].chars().next()
    }

    fn peek_char_at(&self, offset: usize) -> Option<char> {
        self.input[self.pos..].chars().nth(offset)
    }

    fn advance(&mut self) {
        if let Some(c) = self.peek_char() {
            self.pos += c.len_utf8();
        }
    }

    fn skip_whitespace(&mut self) {
        while self.peek_char().map_or(false, |c| c.is_whitespace()) {
            self.advance();
        }
    }

    /// Character column (0-based) of a byte offset, for messages
    fn column(&self, byte_pos: usize) -> usize {
        self.input[..byte_pos].chars().count()
    }

    fn current_token(&self) -> &Token {
        &self.current_token
    }

    fn consume(&mut self) -> FormulaResult<Token> {
        let token = std::mem::replace(&mut self.current_token, Token::Eof);
        self.advance_token()?;
        Ok(token)
    }

    fn expect(&mut self, expected: &Token) -> FormulaResult<()> {
        if self.current_token() == expected {
            self.consume()?;
            Ok(())
        } else {
            Err(FormulaError::syntax(format!(
                "Expected {} but found {} at position {}",
                expected,
                self.current_token(),
                self.column(self.token_start)
            )))
        }
    }

    fn descend(&mut self) -> FormulaResult<()> {
        self.depth += 1;
        if self.depth > MAX_DEPTH {
            return Err(FormulaError::syntax(format!(
                "Formula nested more than {} levels deep",
                MAX_DEPTH
            )));
        }
        Ok(())
    }

    fn ascend(&mut self) {
        self.depth -= 1;
    }

    // === Expression parsing with precedence ===
    // Precedence (lowest to highest):
    // 1. or
    // 2. and
    // 3. not
    // 4. Equality: ==, !=
    // 5. Relational: <, <=, >, >=
    // 6. Additive: +, -
    // 7. Multiplicative: *, /, %
    // 8. Unary: +, -
    // 9. Power: ** (right associative)
    // 10. Primary: literals, field references, function calls, parentheses

    fn parse_expression(&mut self) -> FormulaResult<FormulaExpr> {
        self.descend()?;
        let expr = self.parse_or();
        self.ascend();
        expr
    }

    fn parse_or(&mut self) -> FormulaResult<FormulaExpr> {
        let mut left = self.parse_and()?;

        while matches!(self.current_token(), Token::Or) {
            self.consume()?;
            let right = self.parse_and()?;
            left = binary(BinaryOperator::Or, left, right);
        }

        Ok(left)
    }

    fn parse_and(&mut self) -> FormulaResult<FormulaExpr> {
        let mut left = self.parse_not()?;

        while matches!(self.current_token(), Token::And) {
            self.consume()?;
            let right = self.parse_not()?;
            left = binary(BinaryOperator::And, left, right);
        }

        Ok(left)
    }

    fn parse_not(&mut self) -> FormulaResult<FormulaExpr> {
        if matches!(self.current_token(), Token::Not) {
            self.consume()?;
            self.descend()?;
            let operand = self.parse_not();
            self.ascend();
            return Ok(FormulaExpr::UnaryOp {
                op: UnaryOperator::Not,
                operand: Box::new(operand?),
            });
        }

        self.parse_equality()
    }

    fn parse_equality(&mut self) -> FormulaResult<FormulaExpr> {
        let mut left = self.parse_relational()?;

        loop {
            let op = match self.current_token() {
                Token::EqualEqual => BinaryOperator::Equal,
                Token::NotEqual => BinaryOperator::NotEqual,
                _ => break,
            };

            self.consume()?;
            let right = self.parse_relational()?;
            left = binary(op, left, right);
        }

        Ok(left)
    }

    fn parse_relational(&mut self) -> FormulaResult<FormulaExpr> {
        let mut left = self.parse_additive()?;

        loop {
            let op = match self.current_token() {
                Token::LessThan => BinaryOperator::LessThan,
                Token::LessEqual => BinaryOperator::LessEqual,
                Token::GreaterThan => BinaryOperator::GreaterThan,
                Token::GreaterEqual => BinaryOperator::GreaterEqual,
                _ => break,
            };

            self.consume()?;
            let right = self.parse_additive()?;
            left = binary(op, left, right);
        }

        Ok(left)
    }

    fn parse_additive(&mut self) -> FormulaResult<FormulaExpr> {
        let mut left = self.parse_multiplicative()?;

        loop {
            let op = match self.current_token() {
                Token::Plus => BinaryOperator::Add,
                Token::Minus => BinaryOperator::Subtract,
                _ => break,
            };

            self.consume()?;
            let right = self.parse_multiplicative()?;
            left = binary(op, left, right);
        }

        Ok(left)
    }

    fn parse_multiplicative(&mut self) -> FormulaResult<FormulaExpr> {
        let mut left = self.parse_unary()?;

        loop {
            let op = match self.current_token() {
                Token::Star => BinaryOperator::Multiply,
                Token::Slash => BinaryOperator::Divide,
                Token::Percent => BinaryOperator::Modulo,
                _ => break,
            };

            self.consume()?;
            let right = self.parse_unary()?;
            left = binary(op, left, right);
        }

        Ok(left)
    }

    fn parse_unary(&mut self) -> FormulaResult<FormulaExpr> {
        let op = match self.current_token() {
            Token::Minus => UnaryOperator::Negate,
            Token::Plus => UnaryOperator::Plus,
            _ => return self.parse_power(),
        };

        self.consume()?;
        self.descend()?;
        let operand = self.parse_unary();
        self.ascend();
        Ok(FormulaExpr::UnaryOp {
            op,
            operand: Box::new(operand?),
        })
    }

    fn parse_power(&mut self) -> FormulaResult<FormulaExpr> {
        let left = self.parse_primary()?;

        if matches!(self.current_token(), Token::DoubleStar) {
            self.consume()?;
            // Right associative; the exponent may carry its own sign (2 ** -1)
            self.descend()?;
            let right = self.parse_unary();
            self.ascend();
            return Ok(binary(BinaryOperator::Power, left, right?));
        }

        Ok(left)
    }

    fn parse_primary(&mut self) -> FormulaResult<FormulaExpr> {
        match self.current_token().clone() {
            Token::Integer(n) => {
                self.consume()?;
                Ok(FormulaExpr::Literal(Literal::Integer(n)))
            }

            Token::Float(n) => {
                self.consume()?;
                Ok(FormulaExpr::Literal(Literal::Float(n)))
            }

            Token::String(s) => {
                self.consume()?;
                Ok(FormulaExpr::Literal(Literal::Text(s)))
            }

            Token::Boolean(b) => {
                self.consume()?;
                Ok(FormulaExpr::Literal(Literal::Boolean(b)))
            }

            Token::None => {
                self.consume()?;
                Ok(FormulaExpr::Literal(Literal::None))
            }

            Token::LeftParen => {
                self.consume()?;
                let expr = self.parse_expression()?;
                self.expect(&Token::RightParen)?;
                Ok(expr)
            }

            Token::Identifier(name) => {
                self.consume()?;
                // Check if it's a function call
                if matches!(self.current_token(), Token::LeftParen) {
                    self.parse_function_call(name)
                } else {
                    Ok(FormulaExpr::FieldRef(name))
                }
            }

            Token::Eof => Err(FormulaError::syntax("Unexpected end of input")),

            token => Err(FormulaError::syntax(format!(
                "Unexpected {} at position {}",
                token,
                self.column(self.token_start)
            ))),
        }
    }

    fn parse_function_call(&mut self, name: String) -> FormulaResult<FormulaExpr> {
        self.expect(&Token::LeftParen)?;

        let mut args = Vec::new();

        // Parse arguments
        if !matches!(self.current_token(), Token::RightParen) {
            args.push(self.parse_expression()?);

            while matches!(self.current_token(), Token::Comma) {
                self.consume()?;
                args.push(self.parse_expression()?);
            }
        }

        self.expect(&Token::RightParen)?;

        Ok(FormulaExpr::Function { name, args })
    }
}

fn binary(op: BinaryOperator, left: FormulaExpr, right: FormulaExpr) -> FormulaExpr {
    FormulaExpr::BinaryOp {
        op,
        left: Box::new(left),
        right: Box::new(right),
    }
}
