// Parser module - statement dispatcher plus one constructor per statement kind
mod control;
mod cursor;
mod error;
mod expressions;
mod helpers;
mod statements;

// Public exports
pub use cursor::{Cursor, ForClause};
pub use error::ParseError;
pub use expressions::{ExprParser, PrecedenceParser};

use crate::ast::{Ast, NodeId};
use crate::lexer::{Keyword, Token, TokenKind};
use crate::limits::CompilerLimits;
use tracing::{debug, trace};

// Parser structure
pub struct Parser<'e> {
    ast: Ast,
    exprs: &'e dyn ExprParser,
    limits: CompilerLimits,
    depth: usize, // statements currently being constructed
}

impl<'e> Parser<'e> {
    pub fn new(exprs: &'e dyn ExprParser, limits: CompilerLimits) -> Self {
        Self {
            ast: Ast::new(),
            exprs,
            limits,
            depth: 0,
        }
    }

    pub fn ast(&self) -> &Ast {
        &self.ast
    }

    // Main parsing entry point: every top-level statement becomes a root
    pub fn parse_program(mut self, tokens: &[Token]) -> Result<Ast, ParseError> {
        let mut cursor = Cursor::new(tokens);
        while cursor.has_next() {
            let stmt = self.consume_statement(&mut cursor)?;
            self.ast.program.push(stmt);
        }

        debug!(
            target: "stmt_parse::parser",
            statements = self.ast.program.len(),
            nodes = self.ast.len(),
            "parsed program"
        );
        Ok(self.ast)
    }

    /// Build the statement starting at the cursor.
    ///
    /// Selection looks only at the next token. If nothing matches, the
    /// cursor is left where it was.
    pub fn consume_statement(&mut self, cursor: &mut Cursor<'_>) -> Result<NodeId, ParseError> {
        self.enter_statement(cursor)?;
        let stmt = self.dispatch(cursor);
        self.depth -= 1;
        stmt
    }

    fn dispatch(&mut self, cursor: &mut Cursor<'_>) -> Result<NodeId, ParseError> {
        let Some(token) = cursor.peek() else {
            return Err(cursor.unexpected("statement"));
        };
        trace!(
            target: "stmt_parse::parser",
            token = %token.describe(),
            line = token.line,
            column = token.column,
            "dispatch"
        );

        match &token.kind {
            TokenKind::CodeBlock(_) => self.block(cursor),
            TokenKind::Semicolon => self.empty(cursor),
            TokenKind::Keyword(kw) => match kw {
                Keyword::Function => self.function(cursor),
                Keyword::Call => self.call(cursor),
                Keyword::Return => self.return_stmt(cursor),
                Keyword::Goto => self.goto(cursor),
                Keyword::Label => self.label(cursor),
                Keyword::If => self.if_stmt(cursor),
                Keyword::Switch => self.switch(cursor),
                Keyword::Case => self.case(cursor),
                Keyword::Default => self.default_stmt(cursor),
                Keyword::While => self.while_stmt(cursor),
                Keyword::Do => self.do_while(cursor),
                Keyword::For => self.for_stmt(cursor),
                Keyword::Break => self.break_stmt(cursor),
                Keyword::Continue => self.continue_stmt(cursor),
                Keyword::Var => self.var(cursor),
                Keyword::Set => self.assign(cursor),
                Keyword::Else => Err(ParseError::unexpected_token("statement", token)),
            },
            _ => Err(ParseError::unexpected_token("statement", token)),
        }
    }

    /// Hand an expression token to the expression sub-parser
    fn parse_expr(&mut self, token: &Token) -> Result<NodeId, ParseError> {
        self.exprs.parse(&mut self.ast, token)
    }
}

// Public API functions

/// Parse grouped tokens with the built-in expression parser
pub fn parse(tokens: &[Token], limits: &CompilerLimits) -> Result<Ast, ParseError> {
    let exprs = PrecedenceParser::new(limits.max_expr_depth);
    parse_with(tokens, limits, &exprs)
}

/// Parse grouped tokens with a caller-supplied expression parser
pub fn parse_with(
    tokens: &[Token],
    limits: &CompilerLimits,
    exprs: &dyn ExprParser,
) -> Result<Ast, ParseError> {
    Parser::new(exprs, limits.clone()).parse_program(tokens)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::{Expr, Literal, Node, Stmt};
    use crate::grouping::tokenize;
    use crate::lexer::{AssignOp, TokenTag};
    use std::cell::Cell;

    fn parse_source(source: &str) -> Result<Ast, ParseError> {
        let limits = CompilerLimits::default();
        let tokens = tokenize(source, &limits).expect("grouping failed");
        parse(&tokens, &limits)
    }

    fn roots(source: &str) -> (Ast, Vec<Stmt>) {
        let ast = parse_source(source).unwrap();
        let stmts = ast
            .program
            .iter()
            .map(|&id| ast.stmt(id).unwrap().clone())
            .collect();
        (ast, stmts)
    }

    /// Expression parser that records calls and yields a placeholder
    /// literal holding the atom count
    struct CountingParser {
        calls: Cell<usize>,
    }

    impl ExprParser for CountingParser {
        fn parse(&self, ast: &mut Ast, token: &Token) -> Result<NodeId, ParseError> {
            self.calls.set(self.calls.get() + 1);
            let atoms = match &token.kind {
                TokenKind::Expression(atoms) => atoms.len(),
                _ => return Err(ParseError::unexpected_token("expression", token)),
            };
            Ok(ast.add_expr(Expr::Literal(Literal::Number(format!("<{}>", atoms)))))
        }
    }

    #[test]
    fn test_simple_statements() {
        let (_, stmts) = roots("GOTO L1; LABEL L1: BREAK; CONTINUE; DEFAULT: ;");
        assert_eq!(
            stmts,
            vec![
                Stmt::Goto {
                    label: "L1".to_string()
                },
                Stmt::Label {
                    name: "L1".to_string()
                },
                Stmt::Break,
                Stmt::Continue,
                Stmt::Default,
                Stmt::Empty,
            ]
        );
    }

    #[test]
    fn test_return_without_value_is_zero() {
        let (ast, stmts) = roots("RETURN;");
        let Stmt::Return { value } = stmts[0] else {
            panic!("expected return, got {:?}", stmts[0]);
        };
        assert_eq!(
            ast.expr(value),
            Some(&Expr::Literal(Literal::Number("0".to_string())))
        );
    }

    #[test]
    fn test_return_with_value() {
        let (ast, stmts) = roots("RETURN a + 1;");
        let Stmt::Return { value } = stmts[0] else {
            panic!("expected return");
        };
        assert!(matches!(ast.expr(value), Some(Expr::Binary { .. })));
    }

    #[test]
    fn test_call_and_function() {
        let (ast, stmts) = roots("CALL f(a, 1 + 2); FUNCTION g(x, y) { RETURN x; }");

        let Stmt::Call { name, args } = &stmts[0] else {
            panic!("expected call");
        };
        assert_eq!(name, "f");
        assert_eq!(args.len(), 2);

        let Stmt::Function { name, params, body } = &stmts[1] else {
            panic!("expected function");
        };
        assert_eq!(name, "g");
        assert_eq!(params, &vec!["x".to_string(), "y".to_string()]);
        assert!(matches!(ast.stmt(*body), Some(Stmt::Block { children }) if children.len() == 1));
    }

    #[test]
    fn test_function_parameters_must_be_names() {
        let err = parse_source("FUNCTION g(x + 1) { }").unwrap_err();
        assert_eq!(err.message, "Expected name, found expression");
    }

    #[test]
    fn test_function_body_must_be_block() {
        let err = parse_source("FUNCTION g() RETURN;").unwrap_err();
        assert_eq!(err.message, "Expected code block, found 'RETURN'");
    }

    #[test]
    fn test_block_drops_empty_statements() {
        let (ast, stmts) = roots("{ ; BREAK; ;; { ; } }");
        let Stmt::Block { children } = &stmts[0] else {
            panic!("expected block");
        };
        assert_eq!(children.len(), 2);
        assert_eq!(ast.stmt(children[0]), Some(&Stmt::Break));
        assert_eq!(
            ast.stmt(children[1]),
            Some(&Stmt::Block {
                children: Vec::new()
            })
        );
        for node in &ast.nodes {
            if let Node::Stmt(Stmt::Block { children }) = &node.node {
                assert!(children
                    .iter()
                    .all(|&child| ast.stmt(child) != Some(&Stmt::Empty)));
            }
        }
    }

    #[test]
    fn test_var_declarations() {
        let (ast, stmts) = roots("VAR x; VAR y = 2;");

        let Stmt::Var { var, value } = stmts[0] else {
            panic!("expected var");
        };
        assert_eq!(value, None);
        assert_eq!(
            ast.expr(var),
            Some(&Expr::Variable {
                name: "x".to_string(),
                index: None
            })
        );

        let Stmt::Var { value, .. } = stmts[1] else {
            panic!("expected var");
        };
        assert!(value.is_some());
    }

    #[test]
    fn test_var_rejects_compound_operator() {
        let err = parse_source("VAR x += 1;").unwrap_err();
        assert_eq!(err.message, "Cannot use '+=' in variable declaration");
        assert_eq!((err.line, err.column), (1, 7));
        assert_eq!(err.found, Some(TokenTag::Rvalue));
    }

    #[test]
    fn test_assignments() {
        let (ast, stmts) = roots("SET a = 1; b[i + 1] <<= 2; c -= d;");

        let Stmt::Assign { op, .. } = stmts[0] else {
            panic!("expected assign");
        };
        assert_eq!(op, AssignOp::Assign);

        let Stmt::Assign { var, op, .. } = stmts[1] else {
            panic!("expected assign");
        };
        assert_eq!(op, AssignOp::Shl);
        let Some(Expr::Variable { name, index }) = ast.expr(var) else {
            panic!("expected variable");
        };
        assert_eq!(name, "b");
        assert!(matches!(index.and_then(|i| ast.expr(i)), Some(Expr::Binary { .. })));

        assert!(matches!(stmts[2], Stmt::Assign { op: AssignOp::Sub, .. }));
    }

    #[test]
    fn test_assignment_needs_value_and_terminator() {
        let err = parse_source("SET a;").unwrap_err();
        assert_eq!(err.message, "Expected assignment, found ';'");

        let err = parse_source("SET a = 1").unwrap_err();
        assert_eq!(err.message, "Expected ';', found end of stream");
    }

    #[test]
    fn test_case_needs_colon() {
        let (_, stmts) = roots("CASE 1: CASE x + 1:");
        assert!(matches!(stmts[0], Stmt::Case { .. }));
        assert!(matches!(stmts[1], Stmt::Case { .. }));

        let err = parse_source("CASE 1").unwrap_err();
        assert_eq!(err.message, "Expected ':', found end of stream");

        let err = parse_source("CASE:").unwrap_err();
        assert_eq!(err.message, "Expected expression, found ':'");
    }

    #[test]
    fn test_unrecognized_token_leaves_cursor() {
        let limits = CompilerLimits::default();
        let tokens = tokenize("+ 1; BREAK;", &limits).unwrap();
        let exprs = PrecedenceParser::new(limits.max_expr_depth);
        let mut parser = Parser::new(&exprs, limits);
        let mut cursor = Cursor::new(&tokens);

        let err = parser.consume_statement(&mut cursor).unwrap_err();
        assert_eq!(err.message, "Expected statement, found operator '+'");
        assert_eq!(err.found, Some(TokenTag::Operator));
        assert_eq!(cursor.position(), 0);
        assert!(parser.ast().is_empty());
    }

    #[test]
    fn test_else_without_if() {
        let err = parse_source("ELSE BREAK;").unwrap_err();
        assert_eq!(err.message, "Expected statement, found 'ELSE'");
    }

    #[test]
    fn test_error_inside_nested_block() {
        let err = parse_source("WHILE (1) {\n  BREAK;\n  GOTO;\n}").unwrap_err();
        assert_eq!(err.message, "Expected name, found ';'");
        assert_eq!((err.line, err.column), (3, 7));
    }

    #[test]
    fn test_injected_expression_parser() {
        let limits = CompilerLimits::default();
        let tokens =
            tokenize("IF (a < b) x = a; ELSE CALL f(1, 2 * 3); RETURN;", &limits).unwrap();
        let exprs = CountingParser {
            calls: Cell::new(0),
        };
        let ast = parse_with(&tokens, &limits, &exprs).unwrap();

        // condition, assigned value, two call arguments
        assert_eq!(exprs.calls.get(), 4);
        let Some(Stmt::If { cond, .. }) = ast.stmt(ast.program[0]) else {
            panic!("expected if");
        };
        assert_eq!(
            ast.expr(*cond),
            Some(&Expr::Literal(Literal::Number("<3>".to_string())))
        );
    }

    #[test]
    fn test_nesting_limit() {
        let mut limits = CompilerLimits::default();
        limits.max_nesting_depth = 3;
        let tokens = tokenize("WHILE (1) WHILE (1) BREAK;", &limits).unwrap();
        assert!(parse(&tokens, &limits).is_ok());

        let tokens = tokenize("WHILE (1) WHILE (1) WHILE (1) BREAK;", &limits).unwrap();
        let err = parse(&tokens, &limits).unwrap_err();
        assert!(err.message.contains("nesting too deep"), "{}", err.message);
    }

    #[test]
    fn test_node_limit() {
        let mut limits = CompilerLimits::default();
        limits.max_ast_nodes = 3;
        let tokens = tokenize("BREAK; BREAK; BREAK; BREAK;", &limits).unwrap();
        let err = parse(&tokens, &limits).unwrap_err();
        assert!(err.message.contains("AST node limit"), "{}", err.message);
        assert_eq!((err.line, err.column), (1, 22));
    }

    #[test]
    fn test_parse_is_unbound() {
        let ast = parse_source("WHILE (1) { BREAK; }").unwrap();
        assert!(ast.nodes.iter().all(|n| n.parent.is_none()));
    }
}
