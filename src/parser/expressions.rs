use super::helpers::{get_precedence, get_unary};
use super::ParseError;
use crate::ast::{Ast, Expr, Literal, NodeId};
use crate::lexer::{Token, TokenKind, TokenTag};

/// Expression sub-parser used by the statement constructors.
///
/// Receives one `Expression` token (the flat atoms of one expression),
/// adds the expression nodes to the arena and returns the root.
pub trait ExprParser {
    fn parse(&self, ast: &mut Ast, token: &Token) -> Result<NodeId, ParseError>;
}

/// Precedence climbing over expression atoms
#[derive(Debug, Clone)]
pub struct PrecedenceParser {
    max_depth: usize,
}

impl PrecedenceParser {
    pub fn new(max_depth: usize) -> Self {
        Self { max_depth }
    }
}

impl ExprParser for PrecedenceParser {
    fn parse(&self, ast: &mut Ast, token: &Token) -> Result<NodeId, ParseError> {
        let TokenKind::Expression(atoms) = &token.kind else {
            return Err(ParseError::unexpected_token("expression", token));
        };

        let mut state = ExprState {
            atoms,
            pos: 0,
            ast,
            anchor: token,
            max_depth: self.max_depth,
        };
        let root = state.parse_expression(0, 0)?;

        // Every atom must belong to the expression
        if let Some(extra) = state.peek() {
            return Err(ParseError::unexpected_token("operator", extra));
        }
        Ok(root)
    }
}

// Position within one expression token
struct ExprState<'a> {
    atoms: &'a [Token],
    pos: usize,
    ast: &'a mut Ast,
    anchor: &'a Token, // reported when the atoms run out
    max_depth: usize,
}

impl ExprState<'_> {
    fn peek(&self) -> Option<&Token> {
        self.atoms.get(self.pos)
    }

    fn peek_tag(&self) -> Option<TokenTag> {
        self.peek().map(Token::tag)
    }

    fn advance(&mut self) {
        self.pos += 1;
    }

    fn unexpected(&self, expected: &str) -> ParseError {
        match self.peek() {
            Some(token) => ParseError::unexpected_token(expected, token),
            None => ParseError::unexpected_end(expected, self.anchor.line, self.anchor.column),
        }
    }

    fn expect(&mut self, tag: TokenTag) -> Result<(), ParseError> {
        if self.peek_tag() != Some(tag) {
            return Err(self.unexpected(&tag.to_string()));
        }
        self.advance();
        Ok(())
    }

    // Helper: Check recursion depth limit
    fn check_depth(&self, depth: usize) -> Result<(), ParseError> {
        if depth >= self.max_depth {
            let message = format!(
                "Expression nesting too deep: {} levels (max {})",
                depth, self.max_depth
            );
            return Err(match self.peek() {
                Some(token) => ParseError::from_token(message, token),
                None => ParseError::new(message, self.anchor.line, self.anchor.column),
            });
        }
        Ok(())
    }

    /// Parse an expression recursively with precedence climbing
    fn parse_expression(&mut self, depth: usize, min_precedence: u8) -> Result<NodeId, ParseError> {
        self.check_depth(depth)?;
        let mut lhs = self.parse_unary(depth)?;

        // Each loop pass stacks one more Binary on top of the left side
        let mut height = 0;
        loop {
            // Check if we have a binary operator
            let (op, precedence) = match self.peek().and_then(get_precedence) {
                Some((op, p)) if p >= min_precedence => (op, p),
                _ => break,
            };
            height += 1;
            self.check_depth(depth + height)?;
            self.advance();

            // Higher minimum on the right side keeps operators left-associative
            let rhs = self.parse_expression(depth + height, precedence + 1)?;
            lhs = self.ast.add_expr(Expr::Binary { op, lhs, rhs });
        }

        Ok(lhs)
    }

    fn parse_unary(&mut self, depth: usize) -> Result<NodeId, ParseError> {
        self.check_depth(depth)?;

        match self.peek().and_then(get_unary) {
            Some(op) => {
                self.advance();
                let operand = self.parse_unary(depth + 1)?;
                Ok(self.ast.add_expr(Expr::Unary { op, operand }))
            }
            None => self.parse_primary(depth),
        }
    }

    /// Literals, variables, indexing, calls and parenthesized expressions
    fn parse_primary(&mut self, depth: usize) -> Result<NodeId, ParseError> {
        let Some(token) = self.peek() else {
            return Err(self.unexpected("expression"));
        };

        match &token.kind {
            TokenKind::Number(text) => {
                let literal = Expr::Literal(Literal::Number(text.clone()));
                self.advance();
                Ok(self.ast.add_expr(literal))
            }
            TokenKind::Str(text) => {
                let literal = Expr::Literal(Literal::Str(text.clone()));
                self.advance();
                Ok(self.ast.add_expr(literal))
            }
            TokenKind::Name(name) => {
                let name = name.clone();
                self.advance();
                match self.peek_tag() {
                    Some(TokenTag::LParen) => {
                        let args = self.parse_argument_list(depth)?;
                        Ok(self.ast.add_expr(Expr::Call { name, args }))
                    }
                    Some(TokenTag::LBracket) => {
                        self.advance();
                        let index = self.parse_expression(depth + 1, 0)?;
                        self.expect(TokenTag::RBracket)?;
                        Ok(self.ast.add_expr(Expr::Variable {
                            name,
                            index: Some(index),
                        }))
                    }
                    _ => Ok(self.ast.add_expr(Expr::Variable { name, index: None })),
                }
            }
            TokenKind::LParen => {
                self.advance();
                let inner = self.parse_expression(depth + 1, 0)?;
                self.expect(TokenTag::RParen)?;
                Ok(inner)
            }
            _ => Err(ParseError::unexpected_token("expression", token)),
        }
    }

    /// Parse argument list: consumes '(' and ')', parses comma-separated arguments
    fn parse_argument_list(&mut self, depth: usize) -> Result<Vec<NodeId>, ParseError> {
        self.expect(TokenTag::LParen)?;

        let mut args = Vec::new();
        if self.peek_tag() == Some(TokenTag::RParen) {
            self.advance();
            return Ok(args);
        }

        loop {
            args.push(self.parse_expression(depth + 1, 0)?);
            match self.peek_tag() {
                Some(TokenTag::Comma) => self.advance(),
                Some(TokenTag::RParen) => {
                    self.advance();
                    return Ok(args);
                }
                _ => return Err(self.unexpected("',' or ')'")),
            }
        }
    }
}
