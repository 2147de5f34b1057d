use std::fmt;
use std::iter::Peekable;
use std::str::CharIndices;

use crate::limits::CompilerLimits;

// Token types

/// Statement keywords. Matched case-insensitively, so `return` and
/// `RETURN` are the same token.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Keyword {
    Function,
    Call,
    Return,
    Goto,
    Label,
    If,
    Else,
    Switch,
    Case,
    Default,
    While,
    Do,
    For,
    Break,
    Continue,
    Var,
    Set,
}

impl Keyword {
    pub fn from_word(word: &str) -> Option<Self> {
        // Keywords are max 8 chars
        if word.len() > 8 {
            return None;
        }

        let kw = match word.to_ascii_uppercase().as_str() {
            "FUNCTION" => Keyword::Function,
            "CALL" => Keyword::Call,
            "RETURN" => Keyword::Return,
            "GOTO" => Keyword::Goto,
            "LABEL" => Keyword::Label,
            "IF" => Keyword::If,
            "ELSE" => Keyword::Else,
            "SWITCH" => Keyword::Switch,
            "CASE" => Keyword::Case,
            "DEFAULT" => Keyword::Default,
            "WHILE" => Keyword::While,
            "DO" => Keyword::Do,
            "FOR" => Keyword::For,
            "BREAK" => Keyword::Break,
            "CONTINUE" => Keyword::Continue,
            "VAR" => Keyword::Var,
            "SET" => Keyword::Set,
            _ => return None,
        };
        Some(kw)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Keyword::Function => "FUNCTION",
            Keyword::Call => "CALL",
            Keyword::Return => "RETURN",
            Keyword::Goto => "GOTO",
            Keyword::Label => "LABEL",
            Keyword::If => "IF",
            Keyword::Else => "ELSE",
            Keyword::Switch => "SWITCH",
            Keyword::Case => "CASE",
            Keyword::Default => "DEFAULT",
            Keyword::While => "WHILE",
            Keyword::Do => "DO",
            Keyword::For => "FOR",
            Keyword::Break => "BREAK",
            Keyword::Continue => "CONTINUE",
            Keyword::Var => "VAR",
            Keyword::Set => "SET",
        }
    }
}

/// Assignment operators, `=` and the compound forms
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AssignOp {
    Assign, // =
    Add,    // +=
    Sub,    // -=
    Mul,    // *=
    Div,    // /=
    Rem,    // %=
    And,    // &=
    Or,     // |=
    Xor,    // ^=
    Shl,    // <<=
    Shr,    // >>=
}

impl AssignOp {
    pub fn from_symbol(symbol: &str) -> Option<Self> {
        let op = match symbol {
            "=" => AssignOp::Assign,
            "+=" => AssignOp::Add,
            "-=" => AssignOp::Sub,
            "*=" => AssignOp::Mul,
            "/=" => AssignOp::Div,
            "%=" => AssignOp::Rem,
            "&=" => AssignOp::And,
            "|=" => AssignOp::Or,
            "^=" => AssignOp::Xor,
            "<<=" => AssignOp::Shl,
            ">>=" => AssignOp::Shr,
            _ => return None,
        };
        Some(op)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            AssignOp::Assign => "=",
            AssignOp::Add => "+=",
            AssignOp::Sub => "-=",
            AssignOp::Mul => "*=",
            AssignOp::Div => "/=",
            AssignOp::Rem => "%=",
            AssignOp::And => "&=",
            AssignOp::Or => "|=",
            AssignOp::Xor => "^=",
            AssignOp::Shl => "<<=",
            AssignOp::Shr => ">>=",
        }
    }
}

impl fmt::Display for AssignOp {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum TokenKind {
    // Atomic tokens, produced by the lexer
    Keyword(Keyword),
    Name(String),
    Number(String),
    Str(String), // raw content between the quotes, escapes kept
    Operator(String),
    Semicolon, // ;
    Colon,     // :
    Comma,     // ,
    LParen,    // (
    RParen,    // )
    LBrace,    // {
    RBrace,    // }
    LBracket,  // [
    RBracket,  // ]

    // Grouped tokens, produced by the grouping layer
    CodeBlock(Vec<Token>),
    Paren(ParenGroup),
    Bracket(Box<Token>),          // index expression
    Rvalue(AssignOp, Box<Token>), // assignment operator and value expression
    Expression(Vec<Token>),       // flat atoms of one expression
}

/// A parenthesized clause, already split according to what it belongs to
#[derive(Debug, Clone, PartialEq)]
pub enum ParenGroup {
    /// `IF (..)`, `WHILE (..)`, `SWITCH (..)`: one expression token
    Expr(Box<Token>),
    /// `CALL f(..)`: one expression token per argument
    ArgValues(Vec<Token>),
    /// `FUNCTION f(..)`: one name token per parameter
    ArgNames(Vec<Token>),
    /// `FOR (init; cond; iter)`
    For {
        init: Vec<Token>,
        cond: Box<Token>,
        iter: Vec<Token>,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParenKind {
    Expr,
    ArgValues,
    ArgNames,
    For,
}

impl ParenGroup {
    pub fn kind(&self) -> ParenKind {
        match self {
            ParenGroup::Expr(_) => ParenKind::Expr,
            ParenGroup::ArgValues(_) => ParenKind::ArgValues,
            ParenGroup::ArgNames(_) => ParenKind::ArgNames,
            ParenGroup::For { .. } => ParenKind::For,
        }
    }
}

impl fmt::Display for ParenKind {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let text = match self {
            ParenKind::Expr => "parenthesized expression",
            ParenKind::ArgValues => "argument list",
            ParenKind::ArgNames => "parameter list",
            ParenKind::For => "FOR clause",
        };
        f.write_str(text)
    }
}

/// Payload-free view of a token kind, used for lookahead and diagnostics
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenTag {
    Keyword(Keyword),
    Name,
    Number,
    Str,
    Operator,
    Semicolon,
    Colon,
    Comma,
    LParen,
    RParen,
    LBrace,
    RBrace,
    LBracket,
    RBracket,
    CodeBlock,
    Paren,
    Bracket,
    Rvalue,
    Expression,
}

impl fmt::Display for TokenTag {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            TokenTag::Keyword(kw) => write!(f, "'{}'", kw.as_str()),
            TokenTag::Name => f.write_str("name"),
            TokenTag::Number => f.write_str("number"),
            TokenTag::Str => f.write_str("string"),
            TokenTag::Operator => f.write_str("operator"),
            TokenTag::Semicolon => f.write_str("';'"),
            TokenTag::Colon => f.write_str("':'"),
            TokenTag::Comma => f.write_str("','"),
            TokenTag::LParen => f.write_str("'('"),
            TokenTag::RParen => f.write_str("')'"),
            TokenTag::LBrace => f.write_str("'{'"),
            TokenTag::RBrace => f.write_str("'}'"),
            TokenTag::LBracket => f.write_str("'['"),
            TokenTag::RBracket => f.write_str("']'"),
            TokenTag::CodeBlock => f.write_str("code block"),
            TokenTag::Paren => f.write_str("parenthesis"),
            TokenTag::Bracket => f.write_str("index"),
            TokenTag::Rvalue => f.write_str("assignment"),
            TokenTag::Expression => f.write_str("expression"),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Token {
    pub kind: TokenKind,
    pub line: usize,   // 1-indexed
    pub column: usize, // 1-indexed
}

impl Token {
    pub fn new(kind: TokenKind, line: usize, column: usize) -> Self {
        Self { kind, line, column }
    }

    /// A token placed at the same source position as `self`
    pub fn sibling(&self, kind: TokenKind) -> Self {
        Self::new(kind, self.line, self.column)
    }

    pub fn tag(&self) -> TokenTag {
        match &self.kind {
            TokenKind::Keyword(kw) => TokenTag::Keyword(*kw),
            TokenKind::Name(_) => TokenTag::Name,
            TokenKind::Number(_) => TokenTag::Number,
            TokenKind::Str(_) => TokenTag::Str,
            TokenKind::Operator(_) => TokenTag::Operator,
            TokenKind::Semicolon => TokenTag::Semicolon,
            TokenKind::Colon => TokenTag::Colon,
            TokenKind::Comma => TokenTag::Comma,
            TokenKind::LParen => TokenTag::LParen,
            TokenKind::RParen => TokenTag::RParen,
            TokenKind::LBrace => TokenTag::LBrace,
            TokenKind::RBrace => TokenTag::RBrace,
            TokenKind::LBracket => TokenTag::LBracket,
            TokenKind::RBracket => TokenTag::RBracket,
            TokenKind::CodeBlock(_) => TokenTag::CodeBlock,
            TokenKind::Paren(_) => TokenTag::Paren,
            TokenKind::Bracket(_) => TokenTag::Bracket,
            TokenKind::Rvalue(..) => TokenTag::Rvalue,
            TokenKind::Expression(_) => TokenTag::Expression,
        }
    }

    /// Human readable description for error messages
    pub fn describe(&self) -> String {
        match &self.kind {
            TokenKind::Name(name) => format!("name '{}'", name),
            TokenKind::Number(text) => format!("number '{}'", text),
            TokenKind::Str(text) => format!("string \"{}\"", text),
            TokenKind::Operator(op) => format!("operator '{}'", op),
            TokenKind::Paren(group) => group.kind().to_string(),
            TokenKind::Rvalue(op, _) => format!("assignment '{}'", op),
            _ => self.tag().to_string(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct LexError {
    pub message: String,
    pub line: usize,
    pub column: usize,
}

impl LexError {
    pub fn at(message: String, token: &Token) -> Self {
        Self {
            message,
            line: token.line,
            column: token.column,
        }
    }
}

impl fmt::Display for LexError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(
            f,
            "Lexical error at {}:{}: {}",
            self.line, self.column, self.message
        )
    }
}

impl std::error::Error for LexError {}

// Operators, longest first within each length
const OPERATORS_3: [&str; 2] = ["<<=", ">>="];
const OPERATORS_2: [&str; 16] = [
    "==", "!=", "<=", ">=", "&&", "||", "<<", ">>", "+=", "-=", "*=", "/=", "%=", "&=", "|=",
    "^=",
];
const OPERATORS_1: &str = "+-*/%<>=!&|^~";

// Lexer

pub struct Lexer<'a> {
    source: &'a str,
    chars: Peekable<CharIndices<'a>>,
    pos: usize,
    line: usize,
    column: usize,
    limits: &'a CompilerLimits,
    token_count: usize,
}

impl<'a> Lexer<'a> {
    pub fn new(source: &'a str, limits: &'a CompilerLimits) -> Result<Self, LexError> {
        if source.len() > limits.max_input_size {
            return Err(LexError {
                message: format!(
                    "Input too large: {} bytes (max: {} bytes)",
                    source.len(),
                    limits.max_input_size
                ),
                line: 1,
                column: 1,
            });
        }

        Ok(Self {
            source,
            chars: source.char_indices().peekable(),
            pos: 0,
            line: 1,
            column: 1,
            limits,
            token_count: 0,
        })
    }

    // Character navigation methods

    fn peek_char(&mut self) -> Option<char> {
        self.chars.peek().map(|(_, c)| *c)
    }

    fn peek_nth(&self, n: usize) -> Option<char> {
        self.chars.clone().nth(n).map(|(_, c)| c)
    }

    fn consume_char(&mut self) -> Option<char> {
        let (pos, ch) = self.chars.next()?;
        self.pos = pos + ch.len_utf8();

        if ch == '\n' {
            self.line += 1;
            self.column = 1;
        } else {
            self.column += 1;
        }

        Some(ch)
    }

    fn consume_while<F>(&mut self, predicate: F) -> bool
    where
        F: Fn(char) -> bool,
    {
        let mut consumed = false;
        while let Some(c) = self.peek_char() {
            if !predicate(c) {
                break;
            }
            self.consume_char();
            consumed = true;
        }
        consumed
    }

    fn error(&self, message: String) -> LexError {
        LexError {
            message,
            line: self.line,
            column: self.column,
        }
    }

    /// Skip whitespace and comments; newlines are plain whitespace
    fn skip_trivia(&mut self) -> Result<(), LexError> {
        loop {
            self.consume_while(char::is_whitespace);

            match (self.peek_char(), self.peek_nth(1)) {
                (Some('/'), Some('/')) => self.skip_line_comment()?,
                (Some('/'), Some('*')) => self.skip_block_comment()?,
                _ => return Ok(()),
            }
        }
    }

    fn skip_line_comment(&mut self) -> Result<(), LexError> {
        let start = self.pos;
        while let Some(c) = self.peek_char() {
            if c == '\n' {
                break;
            }
            self.consume_char();
            self.check_comment_length(start)?;
        }
        Ok(())
    }

    fn skip_block_comment(&mut self) -> Result<(), LexError> {
        let (line, column) = (self.line, self.column);
        let start = self.pos;
        self.consume_char(); // '/'
        self.consume_char(); // '*'

        loop {
            match self.consume_char() {
                None => {
                    return Err(LexError {
                        message: "Unterminated block comment".into(),
                        line,
                        column,
                    });
                }
                Some('*') if self.peek_char() == Some('/') => {
                    self.consume_char();
                    return Ok(());
                }
                Some(_) => self.check_comment_length(start)?,
            }
        }
    }

    fn check_comment_length(&self, start: usize) -> Result<(), LexError> {
        let len = self.pos - start;
        if len > self.limits.max_comment_length {
            return Err(self.error(format!(
                "Comment too long: {} bytes (max: {} bytes)",
                len, self.limits.max_comment_length
            )));
        }
        Ok(())
    }

    // Main tokenization method

    /// Next atomic token, or `None` at end of input
    pub fn next_token(&mut self) -> Result<Option<Token>, LexError> {
        self.skip_trivia()?;

        let (line, column) = (self.line, self.column);
        let Some(c) = self.peek_char() else {
            return Ok(None);
        };

        if self.token_count >= self.limits.max_token_count {
            return Err(self.error(format!(
                "Token limit exceeded: {} tokens (max: {})",
                self.token_count, self.limits.max_token_count
            )));
        }

        let kind = match c {
            c if c.is_ascii_digit() => self.lex_number()?,
            c if is_ident_start(c) => self.lex_ident_or_keyword()?,
            '"' => self.lex_string()?,
            ';' | ':' | ',' | '(' | ')' | '{' | '}' | '[' | ']' => {
                self.consume_char();
                match c {
                    ';' => TokenKind::Semicolon,
                    ':' => TokenKind::Colon,
                    ',' => TokenKind::Comma,
                    '(' => TokenKind::LParen,
                    ')' => TokenKind::RParen,
                    '{' => TokenKind::LBrace,
                    '}' => TokenKind::RBrace,
                    '[' => TokenKind::LBracket,
                    _ => TokenKind::RBracket,
                }
            }
            c if OPERATORS_1.contains(c) => self.lex_operator(),
            c => {
                self.consume_char();
                return Err(LexError {
                    message: format!("Unexpected character: '{}'", c),
                    line,
                    column,
                });
            }
        };

        self.token_count += 1;
        Ok(Some(Token::new(kind, line, column)))
    }

    fn lex_operator(&mut self) -> TokenKind {
        let lookahead: String = self.chars.clone().take(3).map(|(_, c)| c).collect();

        let symbol = OPERATORS_3
            .iter()
            .chain(OPERATORS_2.iter())
            .find(|op| lookahead.starts_with(**op))
            .map(|op| op.to_string())
            .unwrap_or_else(|| lookahead[..1].to_string());

        for _ in 0..symbol.len() {
            self.consume_char();
        }
        TokenKind::Operator(symbol)
    }

    fn lex_ident_or_keyword(&mut self) -> Result<TokenKind, LexError> {
        let start = self.pos;
        self.consume_while(is_ident_continue);
        let text = &self.source[start..self.pos];

        if text.len() > self.limits.max_identifier_length {
            return Err(self.error(format!(
                "Identifier too long: {} bytes (max: {} bytes)",
                text.len(),
                self.limits.max_identifier_length
            )));
        }

        Ok(match Keyword::from_word(text) {
            Some(kw) => TokenKind::Keyword(kw),
            None => TokenKind::Name(text.to_string()),
        })
    }

    fn lex_number(&mut self) -> Result<TokenKind, LexError> {
        let start = self.pos;

        if self.peek_char() == Some('0') && matches!(self.peek_nth(1), Some('x') | Some('X')) {
            self.consume_char(); // '0'
            self.consume_char(); // 'x'
            if !self.consume_while(|c| c.is_ascii_hexdigit()) {
                return Err(self.error("Hex number must have at least one digit".into()));
            }
        } else {
            self.consume_while(|c| c.is_ascii_digit());
            if self.peek_char() == Some('.') && self.peek_nth(1).is_some_and(|c| c.is_ascii_digit())
            {
                self.consume_char(); // '.'
                self.consume_while(|c| c.is_ascii_digit());
            }
        }

        if self.peek_char().is_some_and(is_ident_start) {
            return Err(self.error(format!(
                "Invalid number literal: '{}'",
                &self.source[start..self.pos]
            )));
        }

        Ok(TokenKind::Number(self.source[start..self.pos].to_string()))
    }

    fn lex_string(&mut self) -> Result<TokenKind, LexError> {
        let (line, column) = (self.line, self.column);
        self.consume_char(); // opening quote
        let content_start = self.pos;

        loop {
            match self.peek_char() {
                None | Some('\n') => {
                    return Err(LexError {
                        message: "Unterminated string literal".into(),
                        line,
                        column,
                    });
                }
                Some('\\') => {
                    self.consume_char();
                    if self.consume_char().is_none() {
                        return Err(self.error("Unterminated escape sequence".into()));
                    }
                }
                Some('"') => {
                    let content = &self.source[content_start..self.pos];
                    self.consume_char();

                    if content.len() > self.limits.max_string_length {
                        return Err(self.error(format!(
                            "String literal too long: {} bytes (max: {} bytes)",
                            content.len(),
                            self.limits.max_string_length
                        )));
                    }
                    return Ok(TokenKind::Str(content.to_string()));
                }
                Some(_) => {
                    self.consume_char();
                }
            }
        }
    }
}

fn is_ident_start(c: char) -> bool {
    c.is_ascii_alphabetic() || c == '_'
}

fn is_ident_continue(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '_'
}

/// Split source text into flat atomic tokens
pub fn lex(source: &str, limits: &CompilerLimits) -> Result<Vec<Token>, LexError> {
    let mut lexer = Lexer::new(source, limits)?;
    let mut tokens = Vec::new();

    while let Some(token) = lexer.next_token()? {
        tokens.push(token);
    }

    tracing::trace!(target: "stmt_parse::lexer", count = tokens.len(), "lexed");
    Ok(tokens)
}
