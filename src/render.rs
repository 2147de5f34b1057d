// Rendering: one deterministic string per node, plus an indented
// outline of the whole tree for debugging.

use crate::ast::{Ast, Expr, Literal, Node, NodeId, Stmt};
use std::fmt;

bitflags::bitflags! {
    /// Extra markers in the tree outline
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct DumpFlags: u8 {
        const IDS = 1 << 0;     // `#id` after each node
        const PARENTS = 1 << 1; // `^parent` after each node, `^-` for roots
    }
}

/// `Display` adapter for one node and everything below it
pub struct NodeDisplay<'a> {
    ast: &'a Ast,
    id: NodeId,
}

impl Ast {
    pub fn display(&self, id: NodeId) -> NodeDisplay<'_> {
        NodeDisplay { ast: self, id }
    }

    pub fn render(&self, id: NodeId) -> String {
        self.display(id).to_string()
    }

    /// Every top-level statement, one rendering per line
    pub fn render_program(&self) -> String {
        self.program
            .iter()
            .map(|&id| self.render(id))
            .collect::<Vec<_>>()
            .join("\n")
    }

    /// Indented outline, one line per node
    pub fn to_tree_string(&self, flags: DumpFlags) -> String {
        let mut out = String::from("Program\n");
        for &root in &self.program {
            self.write_tree(&mut out, root, 1, flags);
        }
        out
    }

    fn write_tree(&self, out: &mut String, id: NodeId, depth: usize, flags: DumpFlags) {
        let node = self.node(id);
        out.push_str(&"  ".repeat(depth));
        out.push_str(node.node.kind_name());
        if let Some(payload) = payload(&node.node) {
            out.push(' ');
            out.push_str(&payload);
        }
        if flags.contains(DumpFlags::IDS) {
            out.push_str(&format!(" #{}", id));
        }
        if flags.contains(DumpFlags::PARENTS) {
            match node.parent {
                Some(parent) => out.push_str(&format!(" ^{}", parent)),
                None => out.push_str(" ^-"),
            }
        }
        out.push('\n');

        for child in self.children(id) {
            self.write_tree(out, child, depth + 1, flags);
        }
    }
}

// Scalar data shown next to the kind name in the outline
fn payload(node: &Node) -> Option<String> {
    match node {
        Node::Stmt(stmt) => match stmt {
            Stmt::Comment { text } => Some(format!("\"{}\"", text)),
            Stmt::Goto { label } => Some(format!("'{}'", label)),
            Stmt::Label { name } | Stmt::Call { name, .. } => Some(format!("'{}'", name)),
            Stmt::Function { name, params, .. } => {
                Some(format!("'{}' ({})", name, params.join(", ")))
            }
            Stmt::Assign { op, .. } => Some(format!("'{}'", op)),
            _ => None,
        },
        Node::Expr(expr) => match expr {
            Expr::Literal(Literal::Number(text)) => Some(format!("'{}'", text)),
            Expr::Literal(Literal::Str(text)) => Some(format!("\"{}\"", text)),
            Expr::Variable { name, .. } | Expr::Call { name, .. } => Some(format!("'{}'", name)),
            Expr::Unary { op, .. } => Some(format!("'{}'", op.symbol())),
            Expr::Binary { op, .. } => Some(format!("'{}'", op.symbol())),
        },
    }
}

impl<'a> NodeDisplay<'a> {
    fn sub(&self, id: NodeId) -> NodeDisplay<'a> {
        NodeDisplay { ast: self.ast, id }
    }

    fn joined(&self, f: &mut fmt::Formatter, ids: &[NodeId], sep: &str) -> fmt::Result {
        for (i, &id) in ids.iter().enumerate() {
            if i > 0 {
                f.write_str(sep)?;
            }
            write!(f, "{}", self.sub(id))?;
        }
        Ok(())
    }

    fn fmt_stmt(&self, stmt: &Stmt, f: &mut fmt::Formatter) -> fmt::Result {
        match stmt {
            Stmt::Empty => f.write_str("EMPTY"),
            Stmt::Comment { text } => write!(f, "/* {} */", text),
            Stmt::Goto { label } => write!(f, "GOTO -> {}", label),
            Stmt::Label { name } => write!(f, "LABEL: {}", name),
            Stmt::Call { name, args } => {
                write!(f, "CALL {}(", name)?;
                self.joined(f, args, ", ")?;
                f.write_str(")")
            }
            Stmt::Function { name, params, body } => {
                write!(f, "FUNC {}({}) {}", name, params.join(", "), self.sub(*body))
            }
            Stmt::Return { value } => write!(f, "RETURN {}", self.sub(*value)),
            Stmt::Case { value } => write!(f, "CASE {}", self.sub(*value)),
            Stmt::Default => f.write_str("DEFAULT"),
            Stmt::Break => f.write_str("BREAK"),
            Stmt::Continue => f.write_str("CONTINUE"),
            Stmt::Block { children } => {
                f.write_str("BLOCK {\n")?;
                self.joined(f, children, "\n")?;
                f.write_str("\n}")
            }
            Stmt::Var { var, value } => match value {
                Some(value) => write!(f, "ALLOC {} = {}", self.sub(*var), self.sub(*value)),
                None => write!(f, "ALLOC {}", self.sub(*var)),
            },
            Stmt::Assign { var, op, value } => {
                write!(f, "SET {} {} {}", self.sub(*var), op, self.sub(*value))
            }
            Stmt::If {
                cond,
                then_branch,
                else_branch,
            } => write!(
                f,
                "IF ({}) THEN \n\t{}\nELSE\n\t{}\nENDIF",
                self.sub(*cond),
                self.sub(*then_branch),
                self.sub(*else_branch)
            ),
            Stmt::While { cond, body } => {
                write!(f, "WHILE ({}) {}", self.sub(*cond), self.sub(*body))
            }
            Stmt::DoWhile { body, cond } => {
                write!(f, "DO {} WHILE ({});", self.sub(*body), self.sub(*cond))
            }
            Stmt::For {
                init,
                cond,
                iter,
                body,
            } => {
                f.write_str("FOR ({")?;
                self.joined(f, init, "; ")?;
                write!(f, "}}; {}; {{", self.sub(*cond))?;
                self.joined(f, iter, "; ")?;
                write!(f, "}}) {}", self.sub(*body))
            }
            Stmt::Switch { value, body } => {
                write!(f, "SWITCH ({}) {}", self.sub(*value), self.sub(*body))
            }
        }
    }

    fn fmt_expr(&self, expr: &Expr, f: &mut fmt::Formatter) -> fmt::Result {
        match expr {
            Expr::Literal(Literal::Number(text)) => f.write_str(text),
            Expr::Literal(Literal::Str(text)) => write!(f, "\"{}\"", text),
            Expr::Variable { name, index } => match index {
                Some(index) => write!(f, "{}[{}]", name, self.sub(*index)),
                None => f.write_str(name),
            },
            Expr::Unary { op, operand } => write!(f, "{}{}", op.symbol(), self.sub(*operand)),
            Expr::Binary { op, lhs, rhs } => write!(
                f,
                "({} {} {})",
                self.sub(*lhs),
                op.symbol(),
                self.sub(*rhs)
            ),
            Expr::Call { name, args } => {
                write!(f, "{}(", name)?;
                self.joined(f, args, ", ")?;
                f.write_str(")")
            }
        }
    }
}

impl fmt::Display for NodeDisplay<'_> {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match &self.ast.node(self.id).node {
            Node::Stmt(stmt) => self.fmt_stmt(stmt, f),
            Node::Expr(expr) => self.fmt_expr(expr, f),
        }
    }
}
