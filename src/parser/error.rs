use crate::lexer::{Token, TokenTag};

// Parse error
#[derive(Debug, Clone, PartialEq)]
pub struct ParseError {
    pub message: String,
    pub line: usize,
    pub column: usize,
    pub found: Option<TokenTag>, // None when the stream ran out
}

impl ParseError {
    pub fn new(message: String, line: usize, column: usize) -> Self {
        Self {
            message,
            line,
            column,
            found: None,
        }
    }

    pub fn from_token(message: String, token: &Token) -> Self {
        Self {
            message,
            line: token.line,
            column: token.column,
            found: Some(token.tag()),
        }
    }

    pub fn unexpected_token(expected: &str, token: &Token) -> Self {
        Self::from_token(
            format!("Expected {}, found {}", expected, token.describe()),
            token,
        )
    }

    pub fn unexpected_end(expected: &str, line: usize, column: usize) -> Self {
        Self::new(
            format!("Expected {}, found end of stream", expected),
            line,
            column,
        )
    }
}

impl std::fmt::Display for ParseError {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        write!(
            f,
            "Parse error at {}:{}: {}",
            self.line, self.column, self.message
        )
    }
}

impl std::error::Error for ParseError {}
