//! Syntax tree for `ExposeToCPP` bodies

/// Location of a syntax node in the body text
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Span {
    pub start: usize,
    pub end: usize,
    pub line: u32,
    pub column: u32,
}

impl Span {
    pub fn new(start: usize, end: usize, line: u32, column: u32) -> Self {
        Self { start, end, line, column }
    }

    /// Span covering `self` through `other`
    pub fn to(self, other: Span) -> Span {
        Span {
            start: self.start,
            end: other.end,
            line: self.line,
            column: self.column,
        }
    }
}

/// A type as written in source: `int`, `UnityEngine.GameObject`, `List<Foo>`
#[derive(Debug, Clone, PartialEq)]
pub struct TypeSyntax {
    /// Dotted name, possibly a keyword alias
    pub name: String,
    pub type_args: Vec<TypeSyntax>,
    pub span: Span,
}

impl std::fmt::Display for TypeSyntax {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name)?;
        if !self.type_args.is_empty() {
            let args: Vec<String> = self.type_args.iter().map(|arg| arg.to_string()).collect();
            write!(f, "<{}>", args.join(", "))?;
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Statement {
    /// `var x = e;`, `T x = e;` or `T x;`
    Local {
        ty: Option<TypeSyntax>,
        name: String,
        initializer: Option<Expr>,
        span: Span,
    },
    Expression(Expr),
    Block(Vec<Statement>),
    If {
        condition: Expr,
        then_branch: Box<Statement>,
        else_branch: Option<Box<Statement>>,
    },
    Return(Option<Expr>),
    Empty,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Literal {
    /// Integer text including any `u`/`L` suffix
    Integer(String),
    /// Real text including any `f`/`d`/`m` suffix
    Real(String),
    String(String),
    Char(char),
    Bool(bool),
    Null,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnaryOp {
    Not,
    Negate,
    Increment,
    Decrement,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryOp {
    Add,
    Subtract,
    Multiply,
    Divide,
    Remainder,
    Equal,
    NotEqual,
    Less,
    LessEqual,
    Greater,
    GreaterEqual,
    And,
    Or,
}

impl BinaryOp {
    /// Name of the user-defined operator method implementing this operator
    pub fn operator_method_name(self) -> &'static str {
        match self {
            BinaryOp::Add => "op_Addition",
            BinaryOp::Subtract => "op_Subtraction",
            BinaryOp::Multiply => "op_Multiply",
            BinaryOp::Divide => "op_Division",
            BinaryOp::Remainder => "op_Modulus",
            BinaryOp::Equal => "op_Equality",
            BinaryOp::NotEqual => "op_Inequality",
            BinaryOp::Less => "op_LessThan",
            BinaryOp::LessEqual => "op_LessThanOrEqual",
            BinaryOp::Greater => "op_GreaterThan",
            BinaryOp::GreaterEqual => "op_GreaterThanOrEqual",
            BinaryOp::And | BinaryOp::Or => "",
        }
    }

    /// Comparison and logical operators produce `bool` when not user-defined
    pub fn yields_boolean(self) -> bool {
        matches!(
            self,
            BinaryOp::Equal
                | BinaryOp::NotEqual
                | BinaryOp::Less
                | BinaryOp::LessEqual
                | BinaryOp::Greater
                | BinaryOp::GreaterEqual
                | BinaryOp::And
                | BinaryOp::Or
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AssignOp {
    Assign,
    AddAssign,
    SubtractAssign,
}

#[derive(Debug, Clone, PartialEq)]
pub enum LambdaBody {
    Expression(Box<Expr>),
    Block(Vec<Statement>),
}

#[derive(Debug, Clone, PartialEq)]
pub struct Expr {
    pub kind: ExprKind,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq)]
pub enum ExprKind {
    Literal(Literal),
    /// A simple name, optionally with explicit generic arguments
    Name {
        name: String,
        type_args: Vec<TypeSyntax>,
    },
    This,
    Member {
        target: Box<Expr>,
        name: String,
        type_args: Vec<TypeSyntax>,
    },
    Invoke {
        callee: Box<Expr>,
        args: Vec<Expr>,
    },
    Index {
        target: Box<Expr>,
        args: Vec<Expr>,
    },
    New {
        ty: TypeSyntax,
        args: Vec<Expr>,
    },
    TypeOf(TypeSyntax),
    Default(Option<TypeSyntax>),
    Lambda {
        parameters: Vec<String>,
        body: LambdaBody,
    },
    Unary {
        op: UnaryOp,
        operand: Box<Expr>,
    },
    Binary {
        op: BinaryOp,
        left: Box<Expr>,
        right: Box<Expr>,
    },
    Assign {
        op: AssignOp,
        target: Box<Expr>,
        value: Box<Expr>,
    },
    Cast {
        ty: TypeSyntax,
        operand: Box<Expr>,
    },
    Conditional {
        condition: Box<Expr>,
        when_true: Box<Expr>,
        when_false: Box<Expr>,
    },
}

impl Expr {
    pub fn new(kind: ExprKind, span: Span) -> Self {
        Self { kind, span }
    }

    /// Dotted name if this expression is a chain of simple names (`A.B.C`)
    pub fn dotted_name(&self) -> Option<String> {
        match &self.kind {
            ExprKind::Name { name, type_args } if type_args.is_empty() => Some(name.clone()),
            ExprKind::Member { target, name, type_args } if type_args.is_empty() => {
                target.dotted_name().map(|prefix| format!("{}.{}", prefix, name))
            }
            _ => None,
        }
    }
}
