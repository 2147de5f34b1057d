use super::error::ParseError;
use super::Cursor;
use crate::ast::{BinaryOp, NodeId, Stmt, UnaryOp};
use crate::lexer::{Token, TokenKind};

// Binary operator and its precedence level, if the atom is one
pub(super) fn get_precedence(token: &Token) -> Option<(BinaryOp, u8)> {
    match &token.kind {
        TokenKind::Operator(symbol) => {
            BinaryOp::from_symbol(symbol).map(|op| (op, op.precedence()))
        }
        _ => None,
    }
}

pub(super) fn get_unary(token: &Token) -> Option<UnaryOp> {
    match &token.kind {
        TokenKind::Operator(symbol) => UnaryOp::from_symbol(symbol),
        _ => None,
    }
}

// Parser helper methods
impl super::Parser<'_> {
    // Helper: Check statement nesting and arena size before building a statement
    pub(super) fn enter_statement(&mut self, cursor: &Cursor<'_>) -> Result<(), ParseError> {
        if self.depth >= self.limits.max_nesting_depth {
            return Err(cursor.error_here(format!(
                "Statement nesting too deep: {} levels (max {})",
                self.depth, self.limits.max_nesting_depth
            )));
        }
        if self.ast.len() >= self.limits.max_ast_nodes {
            return Err(cursor.error_here(format!(
                "AST node limit exceeded: {} nodes (max {})",
                self.ast.len(),
                self.limits.max_ast_nodes
            )));
        }
        self.depth += 1;
        Ok(())
    }

    /// Helper: Check whether a freshly built statement is Empty
    pub(super) fn is_empty_stmt(&self, id: NodeId) -> bool {
        matches!(self.ast.stmt(id), Some(Stmt::Empty))
    }
}
