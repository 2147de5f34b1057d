use super::{Cursor, ParseError, Parser};
use crate::ast::{NodeId, Stmt};
use crate::lexer::{Keyword, TokenTag};

// Control flow constructors: conditions come from paren groups, bodies
// are arbitrary statements built through the dispatcher
impl Parser<'_> {
    /// `IF (cond) stmt` with an optional `ELSE stmt`
    pub(super) fn if_stmt(&mut self, cursor: &mut Cursor<'_>) -> Result<NodeId, ParseError> {
        cursor.consume_keyword(Keyword::If)?;
        let cond_expr = cursor.consume_paren_expr()?;
        let cond = self.parse_expr(cond_expr)?;
        let then_branch = self.consume_statement(cursor)?;

        let else_branch = if cursor.has(TokenTag::Keyword(Keyword::Else)) {
            cursor.consume_keyword(Keyword::Else)?;
            self.consume_statement(cursor)?
        } else {
            self.ast.add_stmt(Stmt::Empty)
        };

        Ok(self.ast.add_stmt(Stmt::If {
            cond,
            then_branch,
            else_branch,
        }))
    }

    /// `WHILE (cond) stmt`
    pub(super) fn while_stmt(&mut self, cursor: &mut Cursor<'_>) -> Result<NodeId, ParseError> {
        cursor.consume_keyword(Keyword::While)?;
        let cond_expr = cursor.consume_paren_expr()?;
        let cond = self.parse_expr(cond_expr)?;
        let body = self.consume_statement(cursor)?;
        Ok(self.ast.add_stmt(Stmt::While { cond, body }))
    }

    /// `DO stmt WHILE (cond);`
    pub(super) fn do_while(&mut self, cursor: &mut Cursor<'_>) -> Result<NodeId, ParseError> {
        cursor.consume_keyword(Keyword::Do)?;
        let body = self.consume_statement(cursor)?;

        cursor.consume_keyword(Keyword::While)?;
        let cond_expr = cursor.consume_paren_expr()?;
        let cond = self.parse_expr(cond_expr)?;
        cursor.consume(TokenTag::Semicolon)?;

        Ok(self.ast.add_stmt(Stmt::DoWhile { body, cond }))
    }

    /// `FOR (init; cond; iter) stmt`
    pub(super) fn for_stmt(&mut self, cursor: &mut Cursor<'_>) -> Result<NodeId, ParseError> {
        cursor.consume_keyword(Keyword::For)?;
        let mut clause = cursor.consume_paren_for()?;

        let init = self.statement_list(&mut clause.init)?;
        let cond = self.parse_expr(clause.cond)?;
        let iter = self.statement_list(&mut clause.iter)?;
        let body = self.consume_statement(cursor)?;

        Ok(self.ast.add_stmt(Stmt::For {
            init,
            cond,
            iter,
            body,
        }))
    }

    /// `SWITCH (value) { .. }`
    pub(super) fn switch(&mut self, cursor: &mut Cursor<'_>) -> Result<NodeId, ParseError> {
        cursor.consume_keyword(Keyword::Switch)?;
        let value_expr = cursor.consume_paren_expr()?;
        let value = self.parse_expr(value_expr)?;
        let body = self.block(cursor)?;
        Ok(self.ast.add_stmt(Stmt::Switch { value, body }))
    }

    // Every statement of a FOR init/iter part, Empty ones included
    fn statement_list(&mut self, cursor: &mut Cursor<'_>) -> Result<Vec<NodeId>, ParseError> {
        let mut stmts = Vec::new();
        while cursor.has_next() {
            stmts.push(self.consume_statement(cursor)?);
        }
        Ok(stmts)
    }
}

#[cfg(test)]
mod tests {
    use crate::ast::{Ast, BinaryOp, Expr, Stmt};
    use crate::grouping::tokenize;
    use crate::limits::CompilerLimits;
    use crate::parser::{parse, ParseError};

    fn parse_source(source: &str) -> Result<Ast, ParseError> {
        let limits = CompilerLimits::default();
        let tokens = tokenize(source, &limits).expect("grouping failed");
        parse(&tokens, &limits)
    }

    fn first(ast: &Ast) -> &Stmt {
        ast.stmt(ast.program[0]).unwrap()
    }

    #[test]
    fn test_if_without_else_gets_empty() {
        let ast = parse_source("IF (x) GOTO L1;").unwrap();
        let Stmt::If {
            then_branch,
            else_branch,
            ..
        } = first(&ast)
        else {
            panic!("expected if");
        };
        assert!(matches!(ast.stmt(*then_branch), Some(Stmt::Goto { .. })));
        assert_eq!(ast.stmt(*else_branch), Some(&Stmt::Empty));
    }

    #[test]
    fn test_if_else_chain() {
        let ast = parse_source("IF (a) BREAK; ELSE IF (b) CONTINUE; ELSE { RETURN; }").unwrap();
        assert_eq!(ast.program.len(), 1);

        let Stmt::If { else_branch, .. } = first(&ast) else {
            panic!("expected if");
        };
        let Some(Stmt::If { else_branch, .. }) = ast.stmt(*else_branch) else {
            panic!("expected nested if");
        };
        assert!(matches!(ast.stmt(*else_branch), Some(Stmt::Block { .. })));
    }

    #[test]
    fn test_if_needs_expression_paren() {
        let err = parse_source("IF x BREAK;").unwrap_err();
        assert_eq!(
            err.message,
            "Expected parenthesized expression, found name 'x'"
        );
    }

    #[test]
    fn test_while_and_do_while() {
        let ast = parse_source("WHILE (n > 0) n -= 1; DO { n += 1; } WHILE (n < 5);").unwrap();
        assert!(matches!(first(&ast), Stmt::While { .. }));

        let Some(Stmt::DoWhile { body, cond }) = ast.stmt(ast.program[1]) else {
            panic!("expected do-while");
        };
        assert!(matches!(ast.stmt(*body), Some(Stmt::Block { .. })));
        assert!(matches!(
            ast.expr(*cond),
            Some(Expr::Binary {
                op: BinaryOp::Lt,
                ..
            })
        ));
    }

    #[test]
    fn test_do_while_needs_terminator() {
        let err = parse_source("DO BREAK; WHILE (1)").unwrap_err();
        assert_eq!(err.message, "Expected ';', found end of stream");

        let err = parse_source("DO BREAK; (1);").unwrap_err();
        assert_eq!(err.message, "Expected 'WHILE', found parenthesized expression");
    }

    #[test]
    fn test_for_with_block_parts() {
        let ast = parse_source("FOR ({i=0;}; i<10; {i=i+1;}) CALL print(i);").unwrap();
        let Stmt::For {
            init,
            cond,
            iter,
            body,
        } = first(&ast)
        else {
            panic!("expected for");
        };

        assert_eq!(init.len(), 1);
        assert_eq!(iter.len(), 1);
        assert!(matches!(ast.stmt(init[0]), Some(Stmt::Assign { .. })));
        assert!(matches!(
            ast.expr(*cond),
            Some(Expr::Binary {
                op: BinaryOp::Lt,
                ..
            })
        ));
        assert!(matches!(ast.stmt(*body), Some(Stmt::Call { .. })));
    }

    #[test]
    fn test_for_with_bare_parts() {
        let ast = parse_source("FOR (i = 0; i < n; i += 2) { }").unwrap();
        let Stmt::For { init, iter, .. } = first(&ast) else {
            panic!("expected for");
        };
        assert_eq!(init.len(), 1);
        assert_eq!(iter.len(), 1);
    }

    #[test]
    fn test_for_keeps_empty_parts() {
        let ast = parse_source("FOR ({;}; 1; {}) BREAK;").unwrap();
        let Stmt::For { init, iter, .. } = first(&ast) else {
            panic!("expected for");
        };
        assert_eq!(init.len(), 1);
        assert_eq!(ast.stmt(init[0]), Some(&Stmt::Empty));
        assert!(iter.is_empty());
    }

    #[test]
    fn test_switch_body_is_block() {
        let ast = parse_source("SWITCH (x) { CASE 1: BREAK; DEFAULT: RETURN; }").unwrap();
        let Stmt::Switch { body, .. } = first(&ast) else {
            panic!("expected switch");
        };
        let Some(Stmt::Block { children }) = ast.stmt(*body) else {
            panic!("expected block");
        };
        assert_eq!(children.len(), 4);

        let err = parse_source("SWITCH (x) BREAK;").unwrap_err();
        assert_eq!(err.message, "Expected code block, found 'BREAK'");
    }

    #[test]
    fn test_empty_condition() {
        let err = parse_source("WHILE () BREAK;").unwrap_err();
        assert_eq!(err.message, "Expected expression, found end of stream");
        assert_eq!((err.line, err.column), (1, 7));
    }
}
