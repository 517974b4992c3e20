// AST definitions for the beginner Python subset

use num_bigint::BigInt;

/// Source location information for error reporting (1-based)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SourceLocation {
    pub line: usize,
    pub column: usize,
}

impl SourceLocation {
    pub fn new(line: usize, column: usize) -> Self {
        Self { line, column }
    }
}

/// Arithmetic operators
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinOp {
    Add,
    Sub,
    Mul,
    Div,
    FloorDiv,
    Mod,
    Pow,
}

impl BinOp {
    pub fn symbol(&self) -> &'static str {
        match self {
            BinOp::Add => "+",
            BinOp::Sub => "-",
            BinOp::Mul => "*",
            BinOp::Div => "/",
            BinOp::FloorDiv => "//",
            BinOp::Mod => "%",
            BinOp::Pow => "** or pow()",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CmpOp {
    Eq,
    NotEq,
    Lt,
    Le,
    Gt,
    Ge,
}

impl CmpOp {
    pub fn symbol(&self) -> &'static str {
        match self {
            CmpOp::Eq => "==",
            CmpOp::NotEq => "!=",
            CmpOp::Lt => "<",
            CmpOp::Le => "<=",
            CmpOp::Gt => ">",
            CmpOp::Ge => ">=",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnaryOp {
    Neg,
    Pos,
    Not,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BoolOp {
    And,
    Or,
}

/// Piece of an f-string: literal text or a `{expr!conv:spec}` replacement field
#[derive(Debug, Clone, PartialEq)]
pub enum FStringPart {
    Literal(String),
    Field {
        expr: Expr,
        conversion: Option<char>,
        spec: String,
    },
}

#[derive(Debug, Clone, PartialEq)]
pub struct Expr {
    pub kind: ExprKind,
    pub location: SourceLocation,
}

impl Expr {
    pub fn new(kind: ExprKind, location: SourceLocation) -> Self {
        Self { kind, location }
    }

    /// Short description used by "cannot assign to ..." syntax errors
    pub fn describe(&self) -> &'static str {
        match self.kind {
            ExprKind::Int(_)
            | ExprKind::Float(_)
            | ExprKind::Str(_)
            | ExprKind::Bool(_)
            | ExprKind::NoneLit => "literal",
            ExprKind::FString(_) => "f-string expression",
            ExprKind::Call { .. } | ExprKind::MethodCall { .. } => "function call",
            ExprKind::Compare { .. } => "comparison",
            ExprKind::Name(_) => "name",
            _ => "expression",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum ExprKind {
    Int(BigInt),
    Float(f64),
    Str(String),
    Bool(bool),
    NoneLit,
    FString(Vec<FStringPart>),
    Name(String),
    Binary {
        op: BinOp,
        left: Box<Expr>,
        right: Box<Expr>,
    },
    Unary {
        op: UnaryOp,
        operand: Box<Expr>,
    },
    Logical {
        op: BoolOp,
        left: Box<Expr>,
        right: Box<Expr>,
    },
    Compare {
        first: Box<Expr>,
        rest: Vec<(CmpOp, Expr)>,
    },
    Call {
        func: String,
        args: Vec<Expr>,
        kwargs: Vec<(String, Expr)>,
    },
    MethodCall {
        receiver: Box<Expr>,
        method: String,
        args: Vec<Expr>,
    },
    Index {
        target: Box<Expr>,
        index: Box<Expr>,
    },
}

#[derive(Debug, Clone, PartialEq)]
pub enum Stmt {
    /// `a = b = value`
    Assign {
        targets: Vec<String>,
        value: Expr,
        location: SourceLocation,
    },
    /// `a += value`
    AugAssign {
        target: String,
        op: BinOp,
        value: Expr,
        location: SourceLocation,
    },
    Expr(Expr),
    Pass(SourceLocation),
}

impl Stmt {
    pub fn location(&self) -> SourceLocation {
        match self {
            Stmt::Assign { location, .. } | Stmt::AugAssign { location, .. } => *location,
            Stmt::Expr(expr) => expr.location,
            Stmt::Pass(location) => *location,
        }
    }
}

/// A parsed module: statements in source order
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Program {
    pub statements: Vec<Stmt>,
}
