use crate::lexer::AssignOp;

/// Index of a node in the AST arena
pub type NodeId = usize;

// AST with single vector storage; child links are indices into `nodes`,
// parent links are filled in by the binding pass
#[derive(Debug, Default)]
pub struct Ast {
    pub nodes: Vec<AstNode>,
    pub program: Vec<NodeId>, // Top-level statements in source order
}

#[derive(Debug, Clone, PartialEq)]
pub struct AstNode {
    pub node: Node,
    pub parent: Option<NodeId>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Node {
    Stmt(Stmt),
    Expr(Expr),
}

/// Statement variants
#[derive(Debug, Clone, PartialEq)]
pub enum Stmt {
    Empty,
    Comment {
        text: String,
    },
    Goto {
        label: String,
    },
    Label {
        name: String,
    },
    Call {
        name: String,
        args: Vec<NodeId>,
    },
    Function {
        name: String,
        params: Vec<String>,
        body: NodeId,
    },
    Return {
        value: NodeId,
    },
    Case {
        value: NodeId,
    },
    Default,
    Break,
    Continue,
    Block {
        children: Vec<NodeId>,
    },
    Var {
        var: NodeId,
        value: Option<NodeId>,
    },
    Assign {
        var: NodeId,
        op: AssignOp,
        value: NodeId,
    },
    If {
        cond: NodeId,
        then_branch: NodeId,
        else_branch: NodeId,
    },
    While {
        cond: NodeId,
        body: NodeId,
    },
    DoWhile {
        body: NodeId,
        cond: NodeId,
    },
    For {
        init: Vec<NodeId>,
        cond: NodeId,
        iter: Vec<NodeId>,
        body: NodeId,
    },
    Switch {
        value: NodeId,
        body: NodeId,
    },
}

impl Stmt {
    pub fn kind_name(&self) -> &'static str {
        match self {
            Stmt::Empty => "Empty",
            Stmt::Comment { .. } => "Comment",
            Stmt::Goto { .. } => "Goto",
            Stmt::Label { .. } => "Label",
            Stmt::Call { .. } => "Call",
            Stmt::Function { .. } => "Function",
            Stmt::Return { .. } => "Return",
            Stmt::Case { .. } => "Case",
            Stmt::Default => "Default",
            Stmt::Break => "Break",
            Stmt::Continue => "Continue",
            Stmt::Block { .. } => "Block",
            Stmt::Var { .. } => "Var",
            Stmt::Assign { .. } => "Assign",
            Stmt::If { .. } => "If",
            Stmt::While { .. } => "While",
            Stmt::DoWhile { .. } => "DoWhile",
            Stmt::For { .. } => "For",
            Stmt::Switch { .. } => "Switch",
        }
    }

    /// Direct children in source order
    pub fn children(&self) -> Vec<NodeId> {
        match self {
            Stmt::Empty
            | Stmt::Comment { .. }
            | Stmt::Goto { .. }
            | Stmt::Label { .. }
            | Stmt::Default
            | Stmt::Break
            | Stmt::Continue => Vec::new(),
            Stmt::Call { args, .. } => args.clone(),
            Stmt::Block { children } => children.clone(),
            Stmt::Function { body, .. } => vec![*body],
            Stmt::Return { value } | Stmt::Case { value } => vec![*value],
            Stmt::Var { var, value } => std::iter::once(*var).chain(*value).collect(),
            Stmt::Assign { var, value, .. } => vec![*var, *value],
            Stmt::If {
                cond,
                then_branch,
                else_branch,
            } => vec![*cond, *then_branch, *else_branch],
            Stmt::While { cond, body } => vec![*cond, *body],
            Stmt::DoWhile { body, cond } => vec![*body, *cond],
            Stmt::For {
                init,
                cond,
                iter,
                body,
            } => {
                let mut ids = init.clone();
                ids.push(*cond);
                ids.extend(iter);
                ids.push(*body);
                ids
            }
            Stmt::Switch { value, body } => vec![*value, *body],
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Literal {
    Number(String),
    Str(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnaryOp {
    Neg,    // -
    Not,    // !
    BitNot, // ~
}

impl UnaryOp {
    pub fn from_symbol(symbol: &str) -> Option<Self> {
        match symbol {
            "-" => Some(UnaryOp::Neg),
            "!" => Some(UnaryOp::Not),
            "~" => Some(UnaryOp::BitNot),
            _ => None,
        }
    }

    pub fn symbol(self) -> &'static str {
        match self {
            UnaryOp::Neg => "-",
            UnaryOp::Not => "!",
            UnaryOp::BitNot => "~",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryOp {
    Or,
    And,
    BitOr,
    BitXor,
    BitAnd,
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
    Shl,
    Shr,
    Add,
    Sub,
    Mul,
    Div,
    Rem,
}

impl BinaryOp {
    pub fn from_symbol(symbol: &str) -> Option<Self> {
        let op = match symbol {
            "||" => BinaryOp::Or,
            "&&" => BinaryOp::And,
            "|" => BinaryOp::BitOr,
            "^" => BinaryOp::BitXor,
            "&" => BinaryOp::BitAnd,
            "==" => BinaryOp::Eq,
            "!=" => BinaryOp::Ne,
            "<" => BinaryOp::Lt,
            "<=" => BinaryOp::Le,
            ">" => BinaryOp::Gt,
            ">=" => BinaryOp::Ge,
            "<<" => BinaryOp::Shl,
            ">>" => BinaryOp::Shr,
            "+" => BinaryOp::Add,
            "-" => BinaryOp::Sub,
            "*" => BinaryOp::Mul,
            "/" => BinaryOp::Div,
            "%" => BinaryOp::Rem,
            _ => return None,
        };
        Some(op)
    }

    pub fn symbol(self) -> &'static str {
        match self {
            BinaryOp::Or => "||",
            BinaryOp::And => "&&",
            BinaryOp::BitOr => "|",
            BinaryOp::BitXor => "^",
            BinaryOp::BitAnd => "&",
            BinaryOp::Eq => "==",
            BinaryOp::Ne => "!=",
            BinaryOp::Lt => "<",
            BinaryOp::Le => "<=",
            BinaryOp::Gt => ">",
            BinaryOp::Ge => ">=",
            BinaryOp::Shl => "<<",
            BinaryOp::Shr => ">>",
            BinaryOp::Add => "+",
            BinaryOp::Sub => "-",
            BinaryOp::Mul => "*",
            BinaryOp::Div => "/",
            BinaryOp::Rem => "%",
        }
    }

    /// Binding strength, higher binds tighter
    pub fn precedence(self) -> u8 {
        match self {
            BinaryOp::Or => 1,
            BinaryOp::And => 2,
            BinaryOp::BitOr => 3,
            BinaryOp::BitXor => 4,
            BinaryOp::BitAnd => 5,
            BinaryOp::Eq | BinaryOp::Ne => 6,
            BinaryOp::Lt | BinaryOp::Le | BinaryOp::Gt | BinaryOp::Ge => 7,
            BinaryOp::Shl | BinaryOp::Shr => 8,
            BinaryOp::Add | BinaryOp::Sub => 9,
            BinaryOp::Mul | BinaryOp::Div | BinaryOp::Rem => 10,
        }
    }
}

/// Expression variants produced by the expression parser
#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    Literal(Literal),
    Variable {
        name: String,
        index: Option<NodeId>,
    },
    Unary {
        op: UnaryOp,
        operand: NodeId,
    },
    Binary {
        op: BinaryOp,
        lhs: NodeId,
        rhs: NodeId,
    },
    Call {
        name: String,
        args: Vec<NodeId>,
    },
}

impl Expr {
    pub fn kind_name(&self) -> &'static str {
        match self {
            Expr::Literal(Literal::Number(_)) => "Number",
            Expr::Literal(Literal::Str(_)) => "String",
            Expr::Variable { .. } => "Variable",
            Expr::Unary { .. } => "Unary",
            Expr::Binary { .. } => "Binary",
            Expr::Call { .. } => "CallExpr",
        }
    }

    pub fn children(&self) -> Vec<NodeId> {
        match self {
            Expr::Literal(_) => Vec::new(),
            Expr::Variable { index, .. } => index.iter().copied().collect(),
            Expr::Unary { operand, .. } => vec![*operand],
            Expr::Binary { lhs, rhs, .. } => vec![*lhs, *rhs],
            Expr::Call { args, .. } => args.clone(),
        }
    }
}

impl Node {
    pub fn kind_name(&self) -> &'static str {
        match self {
            Node::Stmt(stmt) => stmt.kind_name(),
            Node::Expr(expr) => expr.kind_name(),
        }
    }

    pub fn children(&self) -> Vec<NodeId> {
        match self {
            Node::Stmt(stmt) => stmt.children(),
            Node::Expr(expr) => expr.children(),
        }
    }
}

impl Ast {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    fn add_node(&mut self, node: Node) -> NodeId {
        let idx = self.nodes.len();
        self.nodes.push(AstNode { node, parent: None });
        idx
    }

    /// Add an unbound statement node and return its index
    pub fn add_stmt(&mut self, stmt: Stmt) -> NodeId {
        self.add_node(Node::Stmt(stmt))
    }

    /// Add an unbound expression node and return its index
    pub fn add_expr(&mut self, expr: Expr) -> NodeId {
        self.add_node(Node::Expr(expr))
    }

    /// Synthetic comment, never produced from source
    pub fn add_comment(&mut self, text: impl Into<String>) -> NodeId {
        self.add_stmt(Stmt::Comment { text: text.into() })
    }

    pub fn node(&self, id: NodeId) -> &AstNode {
        &self.nodes[id]
    }

    pub fn stmt(&self, id: NodeId) -> Option<&Stmt> {
        match &self.nodes.get(id)?.node {
            Node::Stmt(stmt) => Some(stmt),
            Node::Expr(_) => None,
        }
    }

    pub fn expr(&self, id: NodeId) -> Option<&Expr> {
        match &self.nodes.get(id)?.node {
            Node::Expr(expr) => Some(expr),
            Node::Stmt(_) => None,
        }
    }

    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.nodes.get(id)?.parent
    }

    pub fn children(&self, id: NodeId) -> Vec<NodeId> {
        self.nodes[id].node.children()
    }

    // Parent binding

    /// Set the parent of `id`, then bind its whole subtree below it.
    /// Re-binding overwrites whatever parent was there before.
    pub fn bind_parent(&mut self, id: NodeId, parent: Option<NodeId>) {
        self.nodes[id].parent = parent;
        self.bind_children(id);
    }

    /// Bind every direct child of `id` to `id`, recursively
    pub fn bind_children(&mut self, id: NodeId) {
        for child in self.children(id) {
            self.bind_parent(child, Some(id));
        }
    }

    /// Bind every top-level statement as a root
    pub fn bind_program(&mut self) {
        for root in self.program.clone() {
            self.bind_parent(root, None);
        }
        tracing::trace!(target: "stmt_parse::ast", nodes = self.nodes.len(), "bound program");
    }

    // Navigation over bound trees

    /// Parents of `id`, nearest first
    pub fn ancestors(&self, id: NodeId) -> Ancestors<'_> {
        Ancestors {
            ast: self,
            next: self.parent(id),
        }
    }

    /// Nearest enclosing statement matching `pred`
    pub fn enclosing<F>(&self, id: NodeId, pred: F) -> Option<NodeId>
    where
        F: Fn(&Stmt) -> bool,
    {
        self.ancestors(id)
            .find(|&ancestor| self.stmt(ancestor).is_some_and(&pred))
    }
}

pub struct Ancestors<'a> {
    ast: &'a Ast,
    next: Option<NodeId>,
}

impl Iterator for Ancestors<'_> {
    type Item = NodeId;

    fn next(&mut self) -> Option<NodeId> {
        let current = self.next?;
        self.next = self.ast.parent(current);
        Some(current)
    }
}
