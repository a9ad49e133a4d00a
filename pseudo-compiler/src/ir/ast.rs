//! Abstract syntax tree for pseudocode programs.
//!
//! Every node kind is its own variant; the tree is built once by the parser
//! and only read afterwards. Positions are kept for diagnostics.

use crate::frontend::source::Position;

#[derive(Debug, Clone, PartialEq)]
pub struct Program {
    pub statements: Vec<Statement>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Statement {
    pub pos: Position,
    pub kind: StatementKind,
}

#[derive(Debug, Clone, PartialEq)]
pub enum StatementKind {
    /// `OUTPUT expr`
    Output(Expression),
    /// `INPUT key`
    Input(Key),
    /// `DECLARE name : type`
    Declare { name: String, ty: VariableType },
    /// `key <- expr`
    Assign { target: Key, value: Expression },
    /// `PrintfD expr`
    DebugPrintInt(Expression),
    /// `PrintfF expr`
    DebugPrintReal(Expression),
    If {
        condition: Expression,
        then_branch: Vec<Statement>,
        else_branch: Option<Vec<Statement>>,
    },
    While {
        condition: Expression,
        body: Vec<Statement>,
    },
    /// Post-test loop; exits the first time `condition` is true.
    Repeat {
        body: Vec<Statement>,
        condition: Expression,
    },
    /// `CALL name(args)`; the result is discarded.
    Call(FunctionCall),
    /// A blank line.
    Empty,
}

#[derive(Debug, Clone, PartialEq)]
pub enum VariableType {
    Int,
    Real,
    Bool,
    /// A user type name. Parsed but never lowered.
    Custom(String),
}

/// An operator together with the operand that follows it in a left-assoc chain.
#[derive(Debug, Clone, PartialEq)]
pub struct OpTail<Op, T> {
    pub op: Op,
    pub pos: Position,
    pub operand: T,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Expression {
    pub comparison: Comparison,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Comparison {
    pub head: Addition,
    pub tail: Vec<OpTail<CompareOp, Addition>>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Addition {
    pub head: Multiplication,
    pub tail: Vec<OpTail<AddOp, Multiplication>>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Multiplication {
    pub head: Unary,
    pub tail: Vec<OpTail<MulOp, Unary>>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Unary {
    Not(Position, Box<Unary>),
    Negate(Position, Box<Unary>),
    Primary(Primary),
}

#[derive(Debug, Clone, PartialEq)]
pub enum Primary {
    Constant(Constant),
    Call(FunctionCall),
    Key(Key),
    Parenthesized(Box<Expression>),
}

#[derive(Debug, Clone, PartialEq)]
pub enum Constant {
    Bool(bool),
    String(String),
    Real(f64),
    Integer(i32),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CompareOp {
    Eq,
    Neq,
    Lt,
    Gt,
    Le,
    Ge,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AddOp {
    Add,
    Sub,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MulOp {
    Mul,
    Div,
}

/// An assignable path such as `a`, `rec.field` or `list[3]`.
/// Only the first component is ever resolved.
#[derive(Debug, Clone, PartialEq)]
pub struct Key {
    pub pos: Position,
    pub path: Vec<KeyComponent>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct KeyComponent {
    pub name: String,
    pub index: Option<i32>,
}

impl Key {
    /// Name of the variable the key resolves through.
    pub fn root_name(&self) -> &str {
        self.path.first().map(|c| c.name.as_str()).unwrap_or_default()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct FunctionCall {
    pub pos: Position,
    pub name: String,
    pub args: Vec<Expression>,
}
