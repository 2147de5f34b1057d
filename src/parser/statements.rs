use super::{Cursor, ParseError, Parser};
use crate::ast::{Expr, Literal, NodeId, Stmt};
use crate::lexer::{AssignOp, Keyword, TokenTag};

// Statement constructors. Each one starts with the cursor on its leading
// token and leaves it after its terminator.
impl Parser<'_> {
    /// `;`
    pub(super) fn empty(&mut self, cursor: &mut Cursor<'_>) -> Result<NodeId, ParseError> {
        cursor.consume(TokenTag::Semicolon)?;
        Ok(self.ast.add_stmt(Stmt::Empty))
    }

    /// `GOTO label;`
    pub(super) fn goto(&mut self, cursor: &mut Cursor<'_>) -> Result<NodeId, ParseError> {
        cursor.consume_keyword(Keyword::Goto)?;
        let label = cursor.consume_name()?.to_string();
        cursor.consume(TokenTag::Semicolon)?;
        Ok(self.ast.add_stmt(Stmt::Goto { label }))
    }

    /// `LABEL name:`
    pub(super) fn label(&mut self, cursor: &mut Cursor<'_>) -> Result<NodeId, ParseError> {
        cursor.consume_keyword(Keyword::Label)?;
        let name = cursor.consume_name()?.to_string();
        cursor.consume(TokenTag::Colon)?;
        Ok(self.ast.add_stmt(Stmt::Label { name }))
    }

    /// `CALL name(expr, ...);`
    pub(super) fn call(&mut self, cursor: &mut Cursor<'_>) -> Result<NodeId, ParseError> {
        cursor.consume_keyword(Keyword::Call)?;
        let name = cursor.consume_name()?.to_string();

        let mut arg_cursor = cursor.consume_paren_args()?;
        let mut args = Vec::new();
        while arg_cursor.has_next() {
            let arg = arg_cursor.consume(TokenTag::Expression)?;
            args.push(self.parse_expr(arg)?);
        }

        cursor.consume(TokenTag::Semicolon)?;
        Ok(self.ast.add_stmt(Stmt::Call { name, args }))
    }

    /// `FUNCTION name(param, ...) { .. }`
    pub(super) fn function(&mut self, cursor: &mut Cursor<'_>) -> Result<NodeId, ParseError> {
        cursor.consume_keyword(Keyword::Function)?;
        let name = cursor.consume_name()?.to_string();

        let mut param_cursor = cursor.consume_paren_names()?;
        let mut params = Vec::new();
        while param_cursor.has_next() {
            params.push(param_cursor.consume_name()?.to_string());
        }

        let body = self.block(cursor)?;
        Ok(self.ast.add_stmt(Stmt::Function { name, params, body }))
    }

    /// `RETURN;` or `RETURN expr;`
    pub(super) fn return_stmt(&mut self, cursor: &mut Cursor<'_>) -> Result<NodeId, ParseError> {
        cursor.consume_keyword(Keyword::Return)?;

        let value = if cursor.has(TokenTag::Expression) {
            let expr = cursor.consume(TokenTag::Expression)?;
            self.parse_expr(expr)?
        } else {
            // A bare return yields zero
            self.ast
                .add_expr(Expr::Literal(Literal::Number("0".to_string())))
        };

        cursor.consume(TokenTag::Semicolon)?;
        Ok(self.ast.add_stmt(Stmt::Return { value }))
    }

    /// `CASE expr:`
    pub(super) fn case(&mut self, cursor: &mut Cursor<'_>) -> Result<NodeId, ParseError> {
        cursor.consume_keyword(Keyword::Case)?;
        let expr = cursor.consume(TokenTag::Expression)?;
        let value = self.parse_expr(expr)?;
        cursor.consume(TokenTag::Colon)?;
        Ok(self.ast.add_stmt(Stmt::Case { value }))
    }

    /// `DEFAULT:`
    pub(super) fn default_stmt(&mut self, cursor: &mut Cursor<'_>) -> Result<NodeId, ParseError> {
        cursor.consume_keyword(Keyword::Default)?;
        cursor.consume(TokenTag::Colon)?;
        Ok(self.ast.add_stmt(Stmt::Default))
    }

    pub(super) fn break_stmt(&mut self, cursor: &mut Cursor<'_>) -> Result<NodeId, ParseError> {
        cursor.consume_keyword(Keyword::Break)?;
        cursor.consume(TokenTag::Semicolon)?;
        Ok(self.ast.add_stmt(Stmt::Break))
    }

    pub(super) fn continue_stmt(&mut self, cursor: &mut Cursor<'_>) -> Result<NodeId, ParseError> {
        cursor.consume_keyword(Keyword::Continue)?;
        cursor.consume(TokenTag::Semicolon)?;
        Ok(self.ast.add_stmt(Stmt::Continue))
    }

    /// `{ stmt ... }`; Empty statements never make it into the block
    pub(super) fn block(&mut self, cursor: &mut Cursor<'_>) -> Result<NodeId, ParseError> {
        let mut inner = cursor.consume_block()?;
        let mut children = Vec::new();

        while inner.has_next() {
            let stmt = self.consume_statement(&mut inner)?;
            if self.is_empty_stmt(stmt) {
                // Empty is a leaf and always the newest node
                self.ast.nodes.truncate(stmt);
                continue;
            }
            children.push(stmt);
        }

        Ok(self.ast.add_stmt(Stmt::Block { children }))
    }

    /// `VAR name;` or `VAR name = expr;`
    pub(super) fn var(&mut self, cursor: &mut Cursor<'_>) -> Result<NodeId, ParseError> {
        cursor.consume_keyword(Keyword::Var)?;
        let name = cursor.consume_name()?.to_string();
        let var = self.ast.add_expr(Expr::Variable { name, index: None });

        let value = match cursor.peek() {
            Some(token) if token.tag() == TokenTag::Rvalue => {
                let (op, expr) = cursor.consume_rvalue()?;
                if op != AssignOp::Assign {
                    return Err(ParseError::from_token(
                        format!("Cannot use '{}' in variable declaration", op),
                        token,
                    ));
                }
                Some(self.parse_expr(expr)?)
            }
            _ => None,
        };

        cursor.consume(TokenTag::Semicolon)?;
        Ok(self.ast.add_stmt(Stmt::Var { var, value }))
    }

    /// `SET name op expr;` or `SET name[expr] op expr;`
    pub(super) fn assign(&mut self, cursor: &mut Cursor<'_>) -> Result<NodeId, ParseError> {
        cursor.consume_keyword(Keyword::Set)?;
        let name = cursor.consume_name()?.to_string();

        let index = if cursor.has(TokenTag::Bracket) {
            let expr = cursor.consume_bracket()?;
            Some(self.parse_expr(expr)?)
        } else {
            None
        };
        let var = self.ast.add_expr(Expr::Variable { name, index });

        let (op, expr) = cursor.consume_rvalue()?;
        let value = self.parse_expr(expr)?;

        cursor.consume(TokenTag::Semicolon)?;
        Ok(self.ast.add_stmt(Stmt::Assign { var, op, value }))
    }
}
