//! Lexer and recursive-descent parser for predicate expressions.
//!
//! Keywords `AND`/`OR` are matched case-insensitively. `AND` binds tighter
//! than `OR`; parentheses group.

use std::fmt;
use std::iter::Peekable;
use std::str::Chars;

use super::ast::BoolExpr;

// ---------------------------------------------------------------------------
// Error type
// ---------------------------------------------------------------------------

/// Errors produced while parsing or validating an expression.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ExpressionError {
    /// An unexpected token was encountered.
    #[error("unexpected token: expected {expected}, found {found}")]
    UnexpectedToken {
        /// What was expected.
        expected: String,
        /// What was found.
        found: String,
    },
    /// The expression ended prematurely.
    #[error("unexpected end of expression")]
    UnexpectedEof,
    /// A `$` is not followed by a positive index.
    #[error("invalid placeholder '{text}'")]
    InvalidPlaceholder {
        /// Offending text.
        text: String,
    },
    /// The expression names something that does not exist.
    #[error("unknown name '{name}'")]
    UnknownName {
        /// The unknown name.
        name: String,
    },
}

// ---------------------------------------------------------------------------
// Token type
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq)]
enum Token {
    Identifier(String),
    Placeholder(usize),
    And,
    Or,
    LParen,
    RParen,
    Eof,
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Identifier(s) => write!(f, "identifier '{s}'"),
            Self::Placeholder(n) => write!(f, "${n}"),
            Self::And => write!(f, "AND"),
            Self::Or => write!(f, "OR"),
            Self::LParen => write!(f, "'('"),
            Self::RParen => write!(f, "')'"),
            Self::Eof => write!(f, "EOF"),
        }
    }
}

// ---------------------------------------------------------------------------
// Lexer
// ---------------------------------------------------------------------------

struct Lexer<'a> {
    chars: Peekable<Chars<'a>>,
}

impl<'a> Lexer<'a> {
    fn new(input: &'a str) -> Self {
        Self {
            chars: input.chars().peekable(),
        }
    }

    fn tokenize(&mut self) -> Result<Vec<Token>, ExpressionError> {
        let mut tokens = Vec::new();
        loop {
            let tok = self.next_token()?;
            if tok == Token::Eof {
                tokens.push(Token::Eof);
                break;
            }
            tokens.push(tok);
        }
        Ok(tokens)
    }

    fn skip_whitespace(&mut self) {
        while self.chars.peek().is_some_and(char::is_ascii_whitespace) {
            self.chars.next();
        }
    }

    fn next_token(&mut self) -> Result<Token, ExpressionError> {
        self.skip_whitespace();

        let Some(&ch) = self.chars.peek() else {
            return Ok(Token::Eof);
        };

        match ch {
            '(' => {
                self.chars.next();
                Ok(Token::LParen)
            }
            ')' => {
                self.chars.next();
                Ok(Token::RParen)
            }
            '$' => self.read_placeholder(),
            c if is_ident_start(c) => Ok(self.read_identifier_or_keyword()),
            _ => Err(ExpressionError::UnexpectedToken {
                expected: "valid token".to_owned(),
                found: format!("'{ch}'"),
            }),
        }
    }

    fn read_placeholder(&mut self) -> Result<Token, ExpressionError> {
        self.chars.next(); // consume '$'
        let mut digits = String::new();
        while let Some(&c) = self.chars.peek() {
            if c.is_ascii_digit() {
                digits.push(c);
                self.chars.next();
            } else {
                break;
            }
        }
        match digits.parse::<usize>() {
            Ok(n) if n > 0 => Ok(Token::Placeholder(n)),
            _ => Err(ExpressionError::InvalidPlaceholder {
                text: format!("${digits}"),
            }),
        }
    }

    fn read_identifier_or_keyword(&mut self) -> Token {
        let mut ident = String::new();
        while let Some(&c) = self.chars.peek() {
            if is_ident_continue(c) {
                ident.push(c);
                self.chars.next();
            } else {
                break;
            }
        }
        if ident.eq_ignore_ascii_case("and") {
            Token::And
        } else if ident.eq_ignore_ascii_case("or") {
            Token::Or
        } else {
            Token::Identifier(ident)
        }
    }
}

fn is_ident_start(c: char) -> bool {
    c.is_ascii_alphabetic() || c == '_'
}

fn is_ident_continue(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '_'
}

// ---------------------------------------------------------------------------
// Parser
// ---------------------------------------------------------------------------

struct Parser {
    tokens: Vec<Token>,
    pos: usize,
}

impl Parser {
    fn new(tokens: Vec<Token>) -> Self {
        Self { tokens, pos: 0 }
    }

    fn peek(&self) -> &Token {
        self.tokens.get(self.pos).unwrap_or(&Token::Eof)
    }

    fn advance(&mut self) -> Token {
        let tok = self.tokens.get(self.pos).cloned().unwrap_or(Token::Eof);
        self.pos += 1;
        tok
    }

    fn expect(&mut self, expected: &Token) -> Result<Token, ExpressionError> {
        let tok = self.advance();
        if std::mem::discriminant(&tok) == std::mem::discriminant(expected) {
            Ok(tok)
        } else if tok == Token::Eof {
            Err(ExpressionError::UnexpectedEof)
        } else {
            Err(ExpressionError::UnexpectedToken {
                expected: expected.to_string(),
                found: tok.to_string(),
            })
        }
    }

    fn at_end(&self) -> bool {
        matches!(self.peek(), Token::Eof)
    }

    fn parse_or_expr(&mut self) -> Result<BoolExpr, ExpressionError> {
        let mut children = vec![self.parse_and_expr()?];
        while matches!(self.peek(), Token::Or) {
            self.advance();
            children.push(self.parse_and_expr()?);
        }
        Ok(chain(children, false))
    }

    fn parse_and_expr(&mut self) -> Result<BoolExpr, ExpressionError> {
        let mut children = vec![self.parse_primary_expr()?];
        while matches!(self.peek(), Token::And) {
            self.advance();
            children.push(self.parse_primary_expr()?);
        }
        Ok(chain(children, true))
    }

    fn parse_primary_expr(&mut self) -> Result<BoolExpr, ExpressionError> {
        match self.advance() {
            Token::LParen => {
                let expr = self.parse_or_expr()?;
                self.expect(&Token::RParen)?;
                Ok(expr)
            }
            Token::Identifier(name) => Ok(BoolExpr::Name(name)),
            Token::Placeholder(n) => Ok(BoolExpr::Placeholder(n)),
            Token::Eof => Err(ExpressionError::UnexpectedEof),
            other => Err(ExpressionError::UnexpectedToken {
                expected: "name, placeholder or '('".to_owned(),
                found: other.to_string(),
            }),
        }
    }
}

/// Builds an n-ary node, splicing nested nodes of the same kind.
fn chain(mut children: Vec<BoolExpr>, and: bool) -> BoolExpr {
    if children.len() == 1 {
        if let Some(only) = children.pop() {
            return only;
        }
    }
    let mut flat = Vec::with_capacity(children.len());
    for child in children {
        match child {
            BoolExpr::And(inner) if and => flat.extend(inner),
            BoolExpr::Or(inner) if !and => flat.extend(inner),
            other => flat.push(other),
        }
    }
    if and { BoolExpr::And(flat) } else { BoolExpr::Or(flat) }
}

// ---------------------------------------------------------------------------
// Public API
// ---------------------------------------------------------------------------

/// Parse a boolean expression such as `author AND (title OR summary)` or
/// `$1 OR ($2 AND $3)`.
///
/// # Errors
///
/// Returns [`ExpressionError`] when the input is empty, contains an invalid
/// character or placeholder, or is not a well-formed expression.
pub fn parse_expression(input: &str) -> Result<BoolExpr, ExpressionError> {
    let tokens = Lexer::new(input).tokenize()?;
    let mut parser = Parser::new(tokens);
    let expr = parser.parse_or_expr()?;
    if !parser.at_end() {
        return Err(ExpressionError::UnexpectedToken {
            expected: "end of expression".to_owned(),
            found: parser.peek().to_string(),
        });
    }
    Ok(expr)
}
