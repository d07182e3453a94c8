//! Typed program representation
//!
//! The parse tree mirrors the grammar one node per symbol, which makes it
//! awkward to interpret directly. [`super::lower`] rewrites it into these
//! types, where every construct has named fields and binary operator chains
//! carry their precedence.

use std::fmt;
use std::rc::Rc;

use crate::memory::value::{Value, ValueType};

/// Declared type of a variable, parameter or function result
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DataType {
    Pinch,
    Skim,
    Pasta,
    Bool,
}

impl DataType {
    pub fn value_type(self) -> ValueType {
        match self {
            DataType::Pinch => ValueType::Integer,
            DataType::Skim => ValueType::Float,
            DataType::Pasta => ValueType::String,
            DataType::Bool => ValueType::Boolean,
        }
    }

    pub fn keyword(self) -> &'static str {
        match self {
            DataType::Pinch => "pinch",
            DataType::Skim => "skim",
            DataType::Pasta => "pasta",
            DataType::Bool => "bool",
        }
    }
}

impl fmt::Display for DataType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.keyword())
    }
}

/// Literal as written in source
#[derive(Debug, Clone, PartialEq)]
pub enum Literal {
    Pinch(i64),
    Skim(f64),
    Pasta(String),
    Bool(bool),
}

impl Literal {
    pub fn to_value(&self) -> Value {
        match self {
            Literal::Pinch(n) => Value::Integer(*n),
            Literal::Skim(x) => Value::Float(*x),
            Literal::Pasta(s) => Value::String(s.clone()),
            Literal::Bool(b) => Value::Boolean(*b),
        }
    }
}

/// Complete program
#[derive(Debug, Clone)]
pub struct Program {
    pub globals: Vec<Declaration>,
    pub functions: Vec<Rc<FunctionDef>>,
    /// Declarations at the top of the entry body
    pub locals: Vec<Declaration>,
    pub body: Vec<Statement>,
    pub exit_code: i64,
    pub exit_line: usize,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Declaration {
    /// `pinch a = 1, b, c = 3;`
    Variables {
        data_type: DataType,
        declarators: Vec<Declarator>,
    },
    /// `recipe pinch xs[3] = {1, 2, 3};`
    Array(ArrayDecl),
}

#[derive(Debug, Clone, PartialEq)]
pub struct Declarator {
    pub name: String,
    pub init: Option<Literal>,
    pub line: usize,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ArrayDecl {
    pub element: DataType,
    pub name: String,
    /// Dimension lexeme; validated at declaration time
    pub dimension: String,
    pub elements: Option<Vec<Literal>>,
    pub line: usize,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Param {
    pub data_type: DataType,
    pub name: String,
    pub line: usize,
}

/// `full` (typed) or `hungry` (void) function
#[derive(Debug, Clone, PartialEq)]
pub struct FunctionDef {
    pub name: String,
    /// `None` for void functions
    pub return_type: Option<DataType>,
    pub params: Vec<Param>,
    pub locals: Vec<Declaration>,
    pub body: Vec<Statement>,
    /// Trailing `spit` expression of typed functions
    pub result: Option<Expr>,
    pub line: usize,
}

/// Assignment target
#[derive(Debug, Clone, PartialEq)]
pub enum Place {
    Variable(String),
    Element { name: String, index: i64 },
}

impl Place {
    pub fn name(&self) -> &str {
        match self {
            Place::Variable(name) | Place::Element { name, .. } => name,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AssignOp {
    Assign,
    AddAssign,
    SubAssign,
    MulAssign,
    DivAssign,
    ModAssign,
}

impl AssignOp {
    /// Binary operator a compound assignment applies
    pub fn binary(self) -> Option<BinaryOp> {
        match self {
            AssignOp::Assign => None,
            AssignOp::AddAssign => Some(BinaryOp::Add),
            AssignOp::SubAssign => Some(BinaryOp::Sub),
            AssignOp::MulAssign => Some(BinaryOp::Mul),
            AssignOp::DivAssign => Some(BinaryOp::Div),
            AssignOp::ModAssign => Some(BinaryOp::Mod),
        }
    }
}

/// `++` / `--`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StepOp {
    Increment,
    Decrement,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Branch {
    pub condition: Expr,
    pub body: Vec<Statement>,
    pub line: usize,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Case {
    pub value: Literal,
    pub body: Vec<Statement>,
    pub line: usize,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Statement {
    /// Call used as a statement
    Call {
        name: String,
        args: Vec<Expr>,
        line: usize,
    },
    Assign {
        target: Place,
        op: AssignOp,
        value: Expr,
        line: usize,
    },
    /// `x++;`, `--x;`
    Step {
        name: String,
        op: StepOp,
        line: usize,
    },
    /// `taste` / `elif` chain with optional `mix`
    If {
        branches: Vec<Branch>,
        otherwise: Option<Vec<Statement>>,
        line: usize,
    },
    /// `flip` with `case` arms and optional `default`
    Switch {
        subject: String,
        cases: Vec<Case>,
        default: Option<Vec<Statement>>,
        line: usize,
    },
    For {
        /// `for (pinch i = ...)` declares a fresh induction variable
        declares: bool,
        var: String,
        init: Expr,
        condition: Expr,
        /// Variable named in the update clause
        step_var: String,
        step: StepOp,
        body: Vec<Statement>,
        line: usize,
    },
    /// `simmer`
    While {
        condition: Expr,
        body: Vec<Statement>,
        line: usize,
    },
    /// `keepmix { } simmer ( )`
    DoWhile {
        body: Vec<Statement>,
        condition: Expr,
        line: usize,
    },
    /// `serve ( a + b + ... );`
    Serve { parts: Vec<Expr>, line: usize },
    /// `make ( id );`
    Make { target: String, line: usize },
}

impl Statement {
    pub fn line(&self) -> usize {
        match self {
            Statement::Call { line, .. }
            | Statement::Assign { line, .. }
            | Statement::Step { line, .. }
            | Statement::If { line, .. }
            | Statement::Switch { line, .. }
            | Statement::For { line, .. }
            | Statement::While { line, .. }
            | Statement::DoWhile { line, .. }
            | Statement::Serve { line, .. }
            | Statement::Make { line, .. } => *line,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryOp {
    Add,
    Sub,
    Mul,
    Div,
    Mod,
    Equal,
    NotEqual,
    Less,
    Greater,
    LessEqual,
    GreaterEqual,
    And,
    Or,
}

impl BinaryOp {
    /// Binding power, higher binds tighter. All levels are left-associative.
    pub fn precedence(self) -> u8 {
        match self {
            BinaryOp::Or => 1,
            BinaryOp::And => 2,
            BinaryOp::Equal | BinaryOp::NotEqual => 3,
            BinaryOp::Less | BinaryOp::Greater | BinaryOp::LessEqual | BinaryOp::GreaterEqual => 4,
            BinaryOp::Add | BinaryOp::Sub => 5,
            BinaryOp::Mul | BinaryOp::Div | BinaryOp::Mod => 6,
        }
    }

    pub fn symbol(self) -> &'static str {
        match self {
            BinaryOp::Add => "+",
            BinaryOp::Sub => "-",
            BinaryOp::Mul => "*",
            BinaryOp::Div => "/",
            BinaryOp::Mod => "%",
            BinaryOp::Equal => "==",
            BinaryOp::NotEqual => "!=",
            BinaryOp::Less => "<",
            BinaryOp::Greater => ">",
            BinaryOp::LessEqual => "<=",
            BinaryOp::GreaterEqual => ">=",
            BinaryOp::And => "&&",
            BinaryOp::Or => "??",
        }
    }
}

impl fmt::Display for BinaryOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.symbol())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    Literal {
        value: Literal,
        line: usize,
    },
    Variable {
        name: String,
        line: usize,
    },
    /// `xs[2]`; the grammar only allows literal indices
    Element {
        name: String,
        index: i64,
        line: usize,
    },
    Call {
        name: String,
        args: Vec<Expr>,
        line: usize,
    },
    Binary {
        op: BinaryOp,
        left: Box<Expr>,
        right: Box<Expr>,
        line: usize,
    },
    /// `!( ... )`
    Not { operand: Box<Expr>, line: usize },
    /// `!!( ... )`
    DoubleNot { operand: Box<Expr>, line: usize },
}

impl Expr {
    pub fn line(&self) -> usize {
        match self {
            Expr::Literal { line, .. }
            | Expr::Variable { line, .. }
            | Expr::Element { line, .. }
            | Expr::Call { line, .. }
            | Expr::Binary { line, .. }
            | Expr::Not { line, .. }
            | Expr::DoubleNot { line, .. } => *line,
        }
    }
}
