// Grouping layer
//
// Folds the flat token stream into the grouped tokens the statement
// parser consumes:
// - `{ .. }` becomes a code block holding grouped statements
// - `( .. )` becomes a paren group whose shape depends on the keyword
//   it follows (expression, argument values, parameter names, FOR clause)
// - `RETURN ..;` and `CASE ..:` get their expression folded into one token
// - `VAR`/`SET` tails get `[..]` folded into a bracket and `op ..;` into
//   an rvalue; a bare `name op ..;` or `name[..] op ..;` gets an implicit SET
//
// The layer never rejects a statement it does not understand; it passes
// the tokens through and lets the parser report them. It only fails on
// unbalanced delimiters and malformed FOR clauses.

use crate::lexer::{self, AssignOp, Keyword, LexError, ParenGroup, Token, TokenKind, TokenTag};
use crate::limits::CompilerLimits;

/// Lex and group source text in one step
pub fn tokenize(source: &str, limits: &CompilerLimits) -> Result<Vec<Token>, LexError> {
    let flat = lexer::lex(source, limits)?;
    group(&flat, limits)
}

/// Group a flat token stream at statement level
pub fn group(tokens: &[Token], limits: &CompilerLimits) -> Result<Vec<Token>, LexError> {
    let mut grouper = Grouper {
        max_depth: limits.max_nesting_depth,
        depth: 0,
    };
    grouper.statements(tokens)
}

struct Grouper {
    max_depth: usize,
    depth: usize,
}

impl Grouper {
    fn statements(&mut self, tokens: &[Token]) -> Result<Vec<Token>, LexError> {
        let mut out = Vec::with_capacity(tokens.len());
        let mut i = 0;

        while i < tokens.len() {
            let token = &tokens[i];
            i = match &token.kind {
                TokenKind::LBrace => {
                    let close = matching_close(tokens, i)?;
                    let inner = self.nested(token, &tokens[i + 1..close])?;
                    out.push(token.sibling(TokenKind::CodeBlock(inner)));
                    close + 1
                }
                TokenKind::LParen => {
                    let close = matching_close(tokens, i)?;
                    out.push(expr_paren(token, &tokens[i + 1..close]));
                    close + 1
                }
                TokenKind::RParen | TokenKind::RBrace | TokenKind::RBracket => {
                    return Err(LexError::at(format!("Unexpected {}", token.tag()), token));
                }
                TokenKind::Keyword(kw) => {
                    out.push(token.clone());
                    self.keyword_tail(*kw, tokens, i + 1, &mut out)?
                }
                TokenKind::Name(_) if starts_assignment(tokens, i + 1) => {
                    out.push(token.sibling(TokenKind::Keyword(Keyword::Set)));
                    assignment_tail(tokens, i, &mut out)?
                }
                _ => {
                    out.push(token.clone());
                    i + 1
                }
            };
        }

        Ok(out)
    }

    fn nested(&mut self, anchor: &Token, tokens: &[Token]) -> Result<Vec<Token>, LexError> {
        if self.depth >= self.max_depth {
            return Err(LexError::at(
                format!("Nesting too deep (max {} levels)", self.max_depth),
                anchor,
            ));
        }

        self.depth += 1;
        let grouped = self.statements(tokens);
        self.depth -= 1;
        grouped
    }

    /// Fold whatever a keyword owns; returns the index after it
    fn keyword_tail(
        &mut self,
        kw: Keyword,
        tokens: &[Token],
        i: usize,
        out: &mut Vec<Token>,
    ) -> Result<usize, LexError> {
        match kw {
            Keyword::Return => fold_expression_until(tokens, i, TokenTag::Semicolon, out),
            Keyword::Case => fold_expression_until(tokens, i, TokenTag::Colon, out),
            Keyword::Goto | Keyword::Label => Ok(take_name(tokens, i, out)),
            Keyword::Call => {
                let i = take_name(tokens, i, out);
                fold_paren(tokens, i, out, |open, inner| {
                    Ok(open.sibling(TokenKind::Paren(arg_values(open, inner)?)))
                })
            }
            Keyword::Function => {
                let i = take_name(tokens, i, out);
                fold_paren(tokens, i, out, |open, inner| {
                    Ok(open.sibling(TokenKind::Paren(arg_names(open, inner)?)))
                })
            }
            Keyword::If | Keyword::While | Keyword::Switch => {
                fold_paren(tokens, i, out, |open, inner| Ok(expr_paren(open, inner)))
            }
            Keyword::For => fold_paren(tokens, i, out, |open, inner| self.for_clause(open, inner)),
            Keyword::Var | Keyword::Set => assignment_tail(tokens, i, out),
            Keyword::Else
            | Keyword::Do
            | Keyword::Default
            | Keyword::Break
            | Keyword::Continue => Ok(i),
        }
    }

    fn for_clause(&mut self, open: &Token, inner: &[Token]) -> Result<Token, LexError> {
        let parts = split_top_level(inner, TokenTag::Semicolon)?;
        let [init, cond, iter] = parts.as_slice() else {
            return Err(LexError::at(
                format!(
                    "FOR clause needs init, condition and iteration separated by ';', found {} part(s)",
                    parts.len()
                ),
                open,
            ));
        };

        let group = ParenGroup::For {
            init: self.clause_statements(open, init)?,
            cond: Box::new(expression(open, cond)),
            iter: self.clause_statements(open, iter)?,
        };
        Ok(open.sibling(TokenKind::Paren(group)))
    }

    /// A FOR init/iter part: either `{ stmt; stmt; }` or one bare
    /// statement missing its terminator
    fn clause_statements(&mut self, open: &Token, part: &[Token]) -> Result<Vec<Token>, LexError> {
        let Some(last) = part.last() else {
            return Ok(Vec::new());
        };

        if part[0].tag() == TokenTag::LBrace && matching_close(part, 0)? == part.len() - 1 {
            return self.nested(open, &part[1..part.len() - 1]);
        }

        let mut terminated = part.to_vec();
        terminated.push(last.sibling(TokenKind::Semicolon));
        self.nested(open, &terminated)
    }
}

/// Expression token over `atoms`, placed at the first atom
fn expression(anchor: &Token, atoms: &[Token]) -> Token {
    atoms
        .first()
        .unwrap_or(anchor)
        .sibling(TokenKind::Expression(atoms.to_vec()))
}

fn expr_paren(open: &Token, inner: &[Token]) -> Token {
    open.sibling(TokenKind::Paren(ParenGroup::Expr(Box::new(expression(
        open, inner,
    )))))
}

fn arg_values(open: &Token, inner: &[Token]) -> Result<ParenGroup, LexError> {
    if inner.is_empty() {
        return Ok(ParenGroup::ArgValues(Vec::new()));
    }

    let args = split_top_level(inner, TokenTag::Comma)?
        .into_iter()
        .map(|arg| expression(open, arg))
        .collect();
    Ok(ParenGroup::ArgValues(args))
}

fn arg_names(open: &Token, inner: &[Token]) -> Result<ParenGroup, LexError> {
    if inner.is_empty() {
        return Ok(ParenGroup::ArgNames(Vec::new()));
    }

    let names = split_top_level(inner, TokenTag::Comma)?
        .into_iter()
        .map(|part| match part {
            [single] => single.clone(),
            _ => expression(open, part),
        })
        .collect();
    Ok(ParenGroup::ArgNames(names))
}

fn take_name(tokens: &[Token], i: usize, out: &mut Vec<Token>) -> usize {
    match tokens.get(i) {
        Some(token) if token.tag() == TokenTag::Name => {
            out.push(token.clone());
            i + 1
        }
        _ => i,
    }
}

/// If a `(` sits at `i`, fold it with `make`; returns the index after it
fn fold_paren<F>(tokens: &[Token], i: usize, out: &mut Vec<Token>, make: F) -> Result<usize, LexError>
where
    F: FnOnce(&Token, &[Token]) -> Result<Token, LexError>,
{
    match tokens.get(i) {
        Some(open) if open.tag() == TokenTag::LParen => {
            let close = matching_close(tokens, i)?;
            out.push(make(open, &tokens[i + 1..close])?);
            Ok(close + 1)
        }
        _ => Ok(i),
    }
}

fn fold_expression_until(
    tokens: &[Token],
    i: usize,
    stop: TokenTag,
    out: &mut Vec<Token>,
) -> Result<usize, LexError> {
    let end = find_top_level(tokens, i, stop)?;
    if end > i {
        out.push(expression(&tokens[i], &tokens[i..end]));
    }
    Ok(end)
}

fn starts_assignment(tokens: &[Token], i: usize) -> bool {
    match tokens.get(i).map(|t| &t.kind) {
        Some(TokenKind::LBracket) => true,
        Some(TokenKind::Operator(op)) => AssignOp::from_symbol(op).is_some(),
        _ => false,
    }
}

/// `name [index] op value` after VAR/SET, each part optional
fn assignment_tail(tokens: &[Token], i: usize, out: &mut Vec<Token>) -> Result<usize, LexError> {
    let mut i = take_name(tokens, i, out);

    if let Some(open) = tokens.get(i).filter(|t| t.tag() == TokenTag::LBracket) {
        let close = matching_close(tokens, i)?;
        let index = expression(open, &tokens[i + 1..close]);
        out.push(open.sibling(TokenKind::Bracket(Box::new(index))));
        i = close + 1;
    }

    if let Some(token) = tokens.get(i) {
        if let TokenKind::Operator(symbol) = &token.kind {
            if let Some(op) = AssignOp::from_symbol(symbol) {
                let end = find_top_level(tokens, i + 1, TokenTag::Semicolon)?;
                let value = expression(token, &tokens[i + 1..end]);
                out.push(token.sibling(TokenKind::Rvalue(op, Box::new(value))));
                i = end;
            }
        }
    }

    Ok(i)
}

fn closer_for(tag: TokenTag) -> Option<TokenTag> {
    match tag {
        TokenTag::LParen => Some(TokenTag::RParen),
        TokenTag::LBrace => Some(TokenTag::RBrace),
        TokenTag::LBracket => Some(TokenTag::RBracket),
        _ => None,
    }
}

fn is_closer(tag: TokenTag) -> bool {
    matches!(tag, TokenTag::RParen | TokenTag::RBrace | TokenTag::RBracket)
}

/// Index of the delimiter closing the one at `open`
fn matching_close(tokens: &[Token], open: usize) -> Result<usize, LexError> {
    let mut expected = Vec::new();

    for (i, token) in tokens.iter().enumerate().skip(open) {
        let tag = token.tag();
        if let Some(closer) = closer_for(tag) {
            expected.push(closer);
        } else if is_closer(tag) {
            match expected.pop() {
                Some(want) if want == tag => {
                    if expected.is_empty() {
                        return Ok(i);
                    }
                }
                Some(want) => {
                    return Err(LexError::at(
                        format!("Mismatched delimiter: expected {}, found {}", want, tag),
                        token,
                    ));
                }
                None => unreachable!("scan starts at an opening delimiter"),
            }
        }
    }

    Err(LexError::at(
        format!("Unclosed {}", tokens[open].tag()),
        &tokens[open],
    ))
}

/// First index at or after `from` holding `stop` outside any delimiters,
/// or `tokens.len()` if there is none
fn find_top_level(tokens: &[Token], from: usize, stop: TokenTag) -> Result<usize, LexError> {
    let mut i = from;
    while i < tokens.len() {
        let tag = tokens[i].tag();
        if tag == stop {
            return Ok(i);
        }
        if closer_for(tag).is_some() {
            i = matching_close(tokens, i)?;
        } else if is_closer(tag) {
            return Err(LexError::at(format!("Unexpected {}", tag), &tokens[i]));
        }
        i += 1;
    }
    Ok(tokens.len())
}

/// Split on `separator` outside any delimiters; always yields at least
/// one (possibly empty) part
fn split_top_level(tokens: &[Token], separator: TokenTag) -> Result<Vec<&[Token]>, LexError> {
    let mut parts = Vec::new();
    let mut start = 0;

    loop {
        let end = find_top_level(tokens, start, separator)?;
        parts.push(&tokens[start..end]);
        if end == tokens.len() {
            return Ok(parts);
        }
        start = end + 1;
    }
}
