use super::ParseError;
use crate::lexer::{AssignOp, Keyword, ParenGroup, ParenKind, Token, TokenKind, TokenTag};

/// Positional reader over one grouped token stream.
///
/// Code blocks and paren groups hand out fresh cursors over their inner
/// streams, so every cursor only ever sees one syntactic level.
#[derive(Debug, Clone)]
pub struct Cursor<'t> {
    tokens: &'t [Token],
    pos: usize,
    // Where "end of stream" errors are reported
    end_line: usize,
    end_column: usize,
}

/// The three independent sub-streams of a FOR clause
#[derive(Debug)]
pub struct ForClause<'t> {
    pub init: Cursor<'t>,
    pub cond: &'t Token,
    pub iter: Cursor<'t>,
}

impl<'t> Cursor<'t> {
    pub fn new(tokens: &'t [Token]) -> Self {
        let (end_line, end_column) = tokens.last().map_or((1, 1), |t| (t.line, t.column));
        Self {
            tokens,
            pos: 0,
            end_line,
            end_column,
        }
    }

    /// Cursor over the inner stream of a grouped token
    pub fn scoped(tokens: &'t [Token], anchor: &Token) -> Self {
        Self {
            tokens,
            pos: 0,
            end_line: anchor.line,
            end_column: anchor.column,
        }
    }

    pub fn position(&self) -> usize {
        self.pos
    }

    pub fn has_next(&self) -> bool {
        self.pos < self.tokens.len()
    }

    pub fn peek(&self) -> Option<&'t Token> {
        self.tokens.get(self.pos)
    }

    pub fn peek_tag(&self) -> Option<TokenTag> {
        self.peek().map(Token::tag)
    }

    pub fn has(&self, tag: TokenTag) -> bool {
        self.peek_tag() == Some(tag)
    }

    /// Error describing what was expected at the current position
    pub fn unexpected(&self, expected: &str) -> ParseError {
        match self.peek() {
            Some(token) => ParseError::unexpected_token(expected, token),
            None => ParseError::unexpected_end(expected, self.end_line, self.end_column),
        }
    }

    /// Error with a custom message at the current position
    pub fn error_here(&self, message: String) -> ParseError {
        match self.peek() {
            Some(token) => ParseError::from_token(message, token),
            None => ParseError::new(message, self.end_line, self.end_column),
        }
    }

    fn advance(&mut self) -> Option<&'t Token> {
        let token = self.peek()?;
        self.pos += 1;
        Some(token)
    }

    /// Consume a token of the given kind or fail without moving
    pub fn consume(&mut self, tag: TokenTag) -> Result<&'t Token, ParseError> {
        if self.has(tag) {
            if let Some(token) = self.advance() {
                return Ok(token);
            }
        }
        Err(self.unexpected(&tag.to_string()))
    }

    pub fn consume_keyword(&mut self, kw: Keyword) -> Result<&'t Token, ParseError> {
        self.consume(TokenTag::Keyword(kw))
    }

    pub fn consume_name(&mut self) -> Result<&'t str, ParseError> {
        match self.peek().map(|t| &t.kind) {
            Some(TokenKind::Name(name)) => {
                self.pos += 1;
                Ok(name)
            }
            _ => Err(self.unexpected("name")),
        }
    }

    /// Expression token inside a bracket (`name[..]`)
    pub fn consume_bracket(&mut self) -> Result<&'t Token, ParseError> {
        match self.peek().map(|t| &t.kind) {
            Some(TokenKind::Bracket(index)) => {
                self.pos += 1;
                Ok(&**index)
            }
            _ => Err(self.unexpected("index")),
        }
    }

    /// Assignment operator and value expression token
    pub fn consume_rvalue(&mut self) -> Result<(AssignOp, &'t Token), ParseError> {
        match self.peek().map(|t| &t.kind) {
            Some(TokenKind::Rvalue(op, value)) => {
                self.pos += 1;
                Ok((*op, &**value))
            }
            _ => Err(self.unexpected("assignment")),
        }
    }

    /// Sub-cursor over a code block's statements
    pub fn consume_block(&mut self) -> Result<Cursor<'t>, ParseError> {
        match self.peek() {
            Some(token) => match &token.kind {
                TokenKind::CodeBlock(inner) => {
                    self.pos += 1;
                    Ok(Cursor::scoped(inner, token))
                }
                _ => Err(self.unexpected("code block")),
            },
            None => Err(self.unexpected("code block")),
        }
    }

    /// Paren group of the given kind; any other kind is an error
    pub fn consume_paren(
        &mut self,
        kind: ParenKind,
    ) -> Result<(&'t Token, &'t ParenGroup), ParseError> {
        match self.peek() {
            Some(token) => match &token.kind {
                TokenKind::Paren(group) if group.kind() == kind => {
                    self.pos += 1;
                    Ok((token, group))
                }
                _ => Err(self.unexpected(&kind.to_string())),
            },
            None => Err(self.unexpected(&kind.to_string())),
        }
    }

    /// Expression token of `( expr )`
    pub fn consume_paren_expr(&mut self) -> Result<&'t Token, ParseError> {
        match self.consume_paren(ParenKind::Expr)? {
            (_, ParenGroup::Expr(expr)) => Ok(&**expr),
            (token, _) => Err(mismatch(ParenKind::Expr, token)),
        }
    }

    /// Sub-cursor over the expression tokens of a call's arguments
    pub fn consume_paren_args(&mut self) -> Result<Cursor<'t>, ParseError> {
        match self.consume_paren(ParenKind::ArgValues)? {
            (token, ParenGroup::ArgValues(args)) => Ok(Cursor::scoped(args, token)),
            (token, _) => Err(mismatch(ParenKind::ArgValues, token)),
        }
    }

    /// Sub-cursor over the name tokens of a parameter list
    pub fn consume_paren_names(&mut self) -> Result<Cursor<'t>, ParseError> {
        match self.consume_paren(ParenKind::ArgNames)? {
            (token, ParenGroup::ArgNames(names)) => Ok(Cursor::scoped(names, token)),
            (token, _) => Err(mismatch(ParenKind::ArgNames, token)),
        }
    }

    /// The init, condition and iteration parts of `FOR ( .. )`
    pub fn consume_paren_for(&mut self) -> Result<ForClause<'t>, ParseError> {
        match self.consume_paren(ParenKind::For)? {
            (token, ParenGroup::For { init, cond, iter }) => Ok(ForClause {
                init: Cursor::scoped(init, token),
                cond: &**cond,
                iter: Cursor::scoped(iter, token),
            }),
            (token, _) => Err(mismatch(ParenKind::For, token)),
        }
    }
}

fn mismatch(kind: ParenKind, token: &Token) -> ParseError {
    ParseError::unexpected_token(&kind.to_string(), token)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grouping::tokenize;
    use crate::limits::CompilerLimits;

    fn tokens(source: &str) -> Vec<Token> {
        tokenize(source, &CompilerLimits::default()).unwrap()
    }

    #[test]
    fn test_consume_expected_kinds() {
        let tokens = tokens("GOTO done;");
        let mut cursor = Cursor::new(&tokens);

        assert!(cursor.has(TokenTag::Keyword(Keyword::Goto)));
        cursor.consume_keyword(Keyword::Goto).unwrap();
        assert_eq!(cursor.consume_name().unwrap(), "done");
        cursor.consume(TokenTag::Semicolon).unwrap();
        assert!(!cursor.has_next());
        assert_eq!(cursor.position(), 3);
    }

    #[test]
    fn test_mismatch_does_not_move() {
        let tokens = tokens("LABEL 12:");
        let mut cursor = Cursor::new(&tokens);
        cursor.consume_keyword(Keyword::Label).unwrap();

        let err = cursor.consume_name().unwrap_err();
        assert_eq!(err.message, "Expected name, found number '12'");
        assert_eq!(cursor.position(), 1);
    }

    #[test]
    fn test_end_of_stream_reports_last_position() {
        let tokens = tokens("BREAK");
        let mut cursor = Cursor::new(&tokens);
        cursor.consume_keyword(Keyword::Break).unwrap();

        let err = cursor.consume(TokenTag::Semicolon).unwrap_err();
        assert_eq!(err.message, "Expected ';', found end of stream");
        assert_eq!(err.found, None);
        assert_eq!((err.line, err.column), (1, 1));
    }

    #[test]
    fn test_block_sub_cursor() {
        let tokens = tokens("{ BREAK; CONTINUE; } ;");
        let mut cursor = Cursor::new(&tokens);

        let mut inner = cursor.consume_block().unwrap();
        assert_eq!(inner.peek_tag(), Some(TokenTag::Keyword(Keyword::Break)));
        inner.consume_keyword(Keyword::Break).unwrap();
        inner.consume(TokenTag::Semicolon).unwrap();
        inner.consume_keyword(Keyword::Continue).unwrap();
        inner.consume(TokenTag::Semicolon).unwrap();
        assert!(!inner.has_next());

        assert!(cursor.has(TokenTag::Semicolon));
    }

    #[test]
    fn test_paren_kind_mismatch() {
        let tokens = tokens("CALL f(a);");
        let mut cursor = Cursor::new(&tokens);
        cursor.consume_keyword(Keyword::Call).unwrap();
        cursor.consume_name().unwrap();

        let err = cursor.consume_paren_expr().unwrap_err();
        assert_eq!(
            err.message,
            "Expected parenthesized expression, found argument list"
        );

        assert_eq!(cursor.position(), 2);

        let (_, group) = cursor.consume_paren(ParenKind::ArgValues).unwrap();
        assert_eq!(group.kind(), ParenKind::ArgValues);
        assert!(cursor.has(TokenTag::Semicolon));
    }

    #[test]
    fn test_argument_sub_cursor() {
        let tokens = tokens("CALL f(a, b + 1);");
        let mut cursor = Cursor::new(&tokens);
        cursor.consume_keyword(Keyword::Call).unwrap();
        cursor.consume_name().unwrap();

        let mut args = cursor.consume_paren_args().unwrap();
        assert!(args.consume(TokenTag::Expression).is_ok());
        assert!(args.consume(TokenTag::Expression).is_ok());
        assert!(!args.has_next());
    }

    #[test]
    fn test_for_clause_parts() {
        let tokens = tokens("FOR ({i = 0;}; i < 3; {}) BREAK;");
        let mut cursor = Cursor::new(&tokens);
        cursor.consume_keyword(Keyword::For).unwrap();

        let clause = cursor.consume_paren_for().unwrap();
        assert_eq!(clause.init.peek_tag(), Some(TokenTag::Keyword(Keyword::Set)));
        assert_eq!(clause.cond.tag(), TokenTag::Expression);
        assert!(!clause.iter.has_next());
        assert!(cursor.has(TokenTag::Keyword(Keyword::Break)));
    }

    #[test]
    fn test_rvalue_and_bracket() {
        let tokens = tokens("a[1] -= 2;");
        let mut cursor = Cursor::new(&tokens);
        cursor.consume_keyword(Keyword::Set).unwrap();
        cursor.consume_name().unwrap();

        assert_eq!(cursor.consume_bracket().unwrap().tag(), TokenTag::Expression);
        let (op, value) = cursor.consume_rvalue().unwrap();
        assert_eq!(op, AssignOp::Sub);
        assert_eq!(value.tag(), TokenTag::Expression);
    }
}
