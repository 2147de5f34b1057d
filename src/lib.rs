//! Statement-level parser for a small imperative language with GOTO,
//! labels, SWITCH/CASE and C-style loops.
//!
//! Source text is lexed, grouped into nested tokens, parsed into an
//! arena AST and finally bound (parent links filled in) by
//! [`Ast::bind_program`].

pub mod ast;
pub mod grouping;
pub mod lexer;
pub mod limits;
pub mod parser;
pub mod render;

pub use ast::{Ast, AstNode, Expr, Node, NodeId, Stmt};
pub use lexer::LexError;
pub use limits::{CompilerLimits, LimitError};
pub use parser::{parse, parse_with, Cursor, ExprParser, ParseError, Parser, PrecedenceParser};
pub use render::DumpFlags;

/// Any failure between source text and an unbound AST
#[derive(Debug)]
pub enum FrontendError {
    Lex(LexError),
    Parse(ParseError),
}

impl std::fmt::Display for FrontendError {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        match self {
            FrontendError::Lex(e) => write!(f, "{}", e),
            FrontendError::Parse(e) => write!(f, "{}", e),
        }
    }
}

impl std::error::Error for FrontendError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            FrontendError::Lex(e) => Some(e),
            FrontendError::Parse(e) => Some(e),
        }
    }
}

impl From<LexError> for FrontendError {
    fn from(e: LexError) -> Self {
        FrontendError::Lex(e)
    }
}

impl From<ParseError> for FrontendError {
    fn from(e: ParseError) -> Self {
        FrontendError::Parse(e)
    }
}

/// Lex, group and parse source text. The returned tree is not bound yet.
pub fn parse_source(source: &str, limits: &CompilerLimits) -> Result<Ast, FrontendError> {
    let tokens = grouping::tokenize(source, limits)?;
    tracing::trace!(target: "stmt_parse::grouping", tokens = tokens.len(), "grouped");
    Ok(parse(&tokens, limits)?)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_source_errors() {
        let limits = CompilerLimits::default();

        let err = parse_source("WHILE (1 { }", &limits).unwrap_err();
        assert!(matches!(err, FrontendError::Lex(_)));

        let err = parse_source("GOTO 5;", &limits).unwrap_err();
        assert!(matches!(err, FrontendError::Parse(_)));
        assert_eq!(err.to_string(), "Parse error at 1:6: Expected name, found number '5'");
    }

    #[test]
    fn test_long_operator_chain() {
        let limits = CompilerLimits::default();
        let chain = |terms: usize| format!("RETURN {};", vec!["1"; terms].join(" + "));

        // Within the expression depth limit: binds and renders
        let mut ast = parse_source(&chain(200), &limits).unwrap();
        ast.bind_program();
        let rendered = ast.render_program();
        assert!(rendered.starts_with(&format!("RETURN {}1 + 1)", "(".repeat(199))));
        assert!(rendered.ends_with(" + 1)"));
        assert!(ast.to_tree_string(DumpFlags::empty()).lines().count() > 200);

        // Far beyond it: a parse error instead of a runaway tree
        let err = parse_source(&chain(20_000), &limits).unwrap_err();
        let FrontendError::Parse(err) = err else {
            panic!("expected parse error, got {:?}", err);
        };
        assert!(err.message.contains("Expression nesting too deep"), "{}", err.message);
    }

    #[test]
    fn test_binding_is_exhaustive() {
        let source = "
            FUNCTION main(n) {
                VAR i = 0;
                LABEL again:
                FOR ({i = 0;}; i < n; {i += 1;}) {
                    SWITCH (i % 3) {
                        CASE 0: CALL log(i, \"zero\"); BREAK;
                        DEFAULT: CONTINUE;
                    }
                }
                DO i -= 1; WHILE (i > 0);
                IF (seen[i]) GOTO again;
                RETURN;
            }
        ";
        let mut ast = parse_source(source, &CompilerLimits::default()).unwrap();
        ast.bind_program();

        for (id, node) in ast.nodes.iter().enumerate() {
            if ast.program.contains(&id) {
                assert_eq!(node.parent, None);
            } else {
                let parent = node.parent.expect("every non-root node has a parent");
                assert!(ast.children(parent).contains(&id));
            }
        }

        // Binding again changes nothing
        let before: Vec<_> = ast.nodes.iter().map(|n| n.parent).collect();
        ast.bind_program();
        let after: Vec<_> = ast.nodes.iter().map(|n| n.parent).collect();
        assert_eq!(before, after);
    }
}
