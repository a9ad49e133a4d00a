//! Recursive descent parser for pseudocode.
//!
//! One method per grammar production. Statements are line terminated; block
//! statements must be closed by their matching keyword.

use super::lexer::{SpannedToken, Token};
use super::source::{Position, SourceIndex};
use crate::ir::ast::*;
use crate::CompileError;

/// Deepest allowed nesting of blocks, parentheses, call arguments and unary operators.
pub const MAX_NESTING: usize = 128;

pub struct Parser<'a> {
    tokens: Vec<SpannedToken>,
    cursor: usize,
    depth: usize,
    index: &'a SourceIndex<'a>,
}

impl<'a> Parser<'a> {
    pub fn new(tokens: Vec<SpannedToken>, index: &'a SourceIndex<'a>) -> Self {
        Self {
            tokens,
            cursor: 0,
            depth: 0,
            index,
        }
    }

    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.cursor).map(|t| &t.token)
    }

    fn peek_nth(&self, n: usize) -> Option<&Token> {
        self.tokens.get(self.cursor + n).map(|t| &t.token)
    }

    fn pos(&self) -> Position {
        self.tokens
            .get(self.cursor)
            .map(|t| t.pos)
            .unwrap_or_else(|| self.index.end())
    }

    fn bump(&mut self) -> Option<SpannedToken> {
        let tok = self.tokens.get(self.cursor).cloned();
        if tok.is_some() {
            self.cursor += 1;
        }
        tok
    }

    fn at(&self, token: &Token) -> bool {
        self.peek() == Some(token)
    }

    fn consume(&mut self, token: &Token) -> bool {
        if self.at(token) {
            self.cursor += 1;
            true
        } else {
            false
        }
    }

    fn error_at(&self, pos: Position, message: String) -> CompileError {
        CompileError::Parse {
            line: pos.line,
            col: pos.column,
            context: self.index.line_context(pos.offset),
            message,
        }
    }

    fn unexpected(&self, expected: &str) -> CompileError {
        let found = match self.peek() {
            Some(tok) => format!("'{}'", tok),
            None => "end of input".to_string(),
        };
        self.error_at(self.pos(), format!("Expected {}, found {}", expected, found))
    }

    fn expect(&mut self, token: &Token) -> Result<(), CompileError> {
        if self.consume(token) {
            Ok(())
        } else {
            Err(self.unexpected(&format!("'{}'", token)))
        }
    }

    fn expect_ident(&mut self) -> Result<String, CompileError> {
        match self.peek() {
            Some(Token::Ident(_)) => match self.bump().map(|t| t.token) {
                Some(Token::Ident(name)) => Ok(name),
                _ => Err(self.unexpected("identifier")),
            },
            _ => Err(self.unexpected("identifier")),
        }
    }

    /// Run a production one nesting level deeper, failing past `MAX_NESTING`.
    fn nested<T>(
        &mut self,
        f: impl FnOnce(&mut Self) -> Result<T, CompileError>,
    ) -> Result<T, CompileError> {
        if self.depth >= MAX_NESTING {
            return Err(self.error_at(
                self.pos(),
                format!("Nesting too deep (more than {} levels)", MAX_NESTING),
            ));
        }
        self.depth += 1;
        let result = f(self);
        self.depth -= 1;
        result
    }

    /// A statement ends at a line break or at the end of input.
    fn end_of_statement(&mut self) -> Result<(), CompileError> {
        match self.peek() {
            None => Ok(()),
            Some(Token::Newline) => {
                self.cursor += 1;
                Ok(())
            }
            Some(_) => Err(self.unexpected("end of line")),
        }
    }

    /// program = { statement } EOF
    pub fn parse_program(&mut self) -> Result<Program, CompileError> {
        let mut statements = Vec::new();
        while self.peek().is_some() {
            statements.push(self.parse_statement()?);
        }
        Ok(Program { statements })
    }

    /// Statements up to (not including) one of `closers`.
    fn parse_block(
        &mut self,
        closers: &[Token],
        opener: &str,
        opened_at: Position,
    ) -> Result<Vec<Statement>, CompileError> {
        let mut statements = Vec::new();
        loop {
            match self.peek() {
                Some(tok) if closers.contains(tok) => return Ok(statements),
                Some(_) => statements.push(self.parse_statement()?),
                None => {
                    let names = closers
                        .iter()
                        .map(|t| t.to_string())
                        .collect::<Vec<_>>()
                        .join(" or ");
                    return Err(self.error_at(
                        self.pos(),
                        format!(
                            "Unterminated {} starting at line {}: expected {}",
                            opener, opened_at.line, names
                        ),
                    ));
                }
            }
        }
    }

    fn parse_statement(&mut self) -> Result<Statement, CompileError> {
        let pos = self.pos();
        let kind = match self.peek() {
            Some(Token::Newline) => {
                self.cursor += 1;
                return Ok(Statement {
                    pos,
                    kind: StatementKind::Empty,
                });
            }
            Some(Token::Output) => {
                self.cursor += 1;
                StatementKind::Output(self.parse_expression()?)
            }
            Some(Token::Input) => {
                self.cursor += 1;
                StatementKind::Input(self.parse_key()?)
            }
            Some(Token::Call) => {
                self.cursor += 1;
                StatementKind::Call(self.parse_function_call()?)
            }
            Some(Token::PrintfD) => {
                self.cursor += 1;
                StatementKind::DebugPrintInt(self.parse_expression()?)
            }
            Some(Token::PrintfF) => {
                self.cursor += 1;
                StatementKind::DebugPrintReal(self.parse_expression()?)
            }
            Some(Token::Declare) => {
                self.cursor += 1;
                let name = self.expect_ident()?;
                self.expect(&Token::Colon)?;
                let ty = self.parse_type()?;
                StatementKind::Declare { name, ty }
            }
            Some(Token::If) => return self.nested(|p| p.parse_if(pos)),
            Some(Token::While) => return self.nested(|p| p.parse_while(pos)),
            Some(Token::Repeat) => return self.nested(|p| p.parse_repeat(pos)),
            Some(Token::Ident(_)) => {
                let target = self.parse_key()?;
                self.expect(&Token::Assign)?;
                let value = self.parse_expression()?;
                StatementKind::Assign { target, value }
            }
            _ => return Err(self.unexpected("a statement")),
        };
        self.end_of_statement()?;
        Ok(Statement { pos, kind })
    }

    /// IF expr [NEWLINE*] THEN NEWLINE block [ELSE NEWLINE block] ENDIF
    fn parse_if(&mut self, pos: Position) -> Result<Statement, CompileError> {
        self.expect(&Token::If)?;
        let condition = self.parse_expression()?;
        while self.consume(&Token::Newline) {}
        self.expect(&Token::Then)?;
        self.end_of_statement()?;

        let then_branch = self.parse_block(&[Token::Else, Token::EndIf], "IF", pos)?;
        let else_branch = if self.consume(&Token::Else) {
            self.end_of_statement()?;
            Some(self.parse_block(&[Token::EndIf], "IF", pos)?)
        } else {
            None
        };
        self.expect(&Token::EndIf)?;
        self.end_of_statement()?;

        Ok(Statement {
            pos,
            kind: StatementKind::If {
                condition,
                then_branch,
                else_branch,
            },
        })
    }

    /// WHILE expr DO NEWLINE block ENDWHILE
    fn parse_while(&mut self, pos: Position) -> Result<Statement, CompileError> {
        self.expect(&Token::While)?;
        let condition = self.parse_expression()?;
        self.expect(&Token::Do)?;
        self.end_of_statement()?;
        let body = self.parse_block(&[Token::EndWhile], "WHILE", pos)?;
        self.expect(&Token::EndWhile)?;
        self.end_of_statement()?;

        Ok(Statement {
            pos,
            kind: StatementKind::While { condition, body },
        })
    }

    /// REPEAT NEWLINE block UNTIL expr
    fn parse_repeat(&mut self, pos: Position) -> Result<Statement, CompileError> {
        self.expect(&Token::Repeat)?;
        self.end_of_statement()?;
        let body = self.parse_block(&[Token::Until], "REPEAT", pos)?;
        self.expect(&Token::Until)?;
        let condition = self.parse_expression()?;
        self.end_of_statement()?;

        Ok(Statement {
            pos,
            kind: StatementKind::Repeat { body, condition },
        })
    }

    /// type = INT | REAL | BOOL | ident
    fn parse_type(&mut self) -> Result<VariableType, CompileError> {
        let ty = match self.peek() {
            Some(Token::Int) => VariableType::Int,
            Some(Token::Real) => VariableType::Real,
            Some(Token::Bool) => VariableType::Bool,
            Some(Token::Ident(name)) => VariableType::Custom(name.clone()),
            _ => return Err(self.unexpected("a type (INT, REAL, BOOL or a type name)")),
        };
        self.cursor += 1;
        Ok(ty)
    }

    /// key = var { "." var }, var = ident [ "[" int "]" ]
    fn parse_key(&mut self) -> Result<Key, CompileError> {
        let pos = self.pos();
        let mut path = vec![self.parse_key_component()?];
        while self.consume(&Token::Dot) {
            path.push(self.parse_key_component()?);
        }
        Ok(Key { pos, path })
    }

    fn parse_key_component(&mut self) -> Result<KeyComponent, CompileError> {
        let name = self.expect_ident()?;
        let index = if self.consume(&Token::LBracket) {
            let idx = match self.peek() {
                Some(Token::Integer(n)) => *n,
                _ => return Err(self.unexpected("an integer index")),
            };
            self.cursor += 1;
            self.expect(&Token::RBracket)?;
            Some(idx)
        } else {
            None
        };
        Ok(KeyComponent { name, index })
    }

    /// call = ident "(" [ expr { "," expr } ] ")"
    fn parse_function_call(&mut self) -> Result<FunctionCall, CompileError> {
        let pos = self.pos();
        let name = self.expect_ident()?;
        self.expect(&Token::LParen)?;
        let mut args = Vec::new();
        if !self.at(&Token::RParen) {
            loop {
                args.push(self.nested(|p| p.parse_expression())?);
                if !self.consume(&Token::Comma) {
                    break;
                }
            }
        }
        self.expect(&Token::RParen)?;
        Ok(FunctionCall { pos, name, args })
    }

    pub fn parse_expression(&mut self) -> Result<Expression, CompileError> {
        Ok(Expression {
            comparison: self.parse_comparison()?,
        })
    }

    fn parse_comparison(&mut self) -> Result<Comparison, CompileError> {
        let head = self.parse_addition()?;
        let mut tail = Vec::new();
        loop {
            let op = match self.peek() {
                Some(Token::Eq) => CompareOp::Eq,
                Some(Token::Neq) => CompareOp::Neq,
                Some(Token::Lt) => CompareOp::Lt,
                Some(Token::Gt) => CompareOp::Gt,
                Some(Token::Le) => CompareOp::Le,
                Some(Token::Ge) => CompareOp::Ge,
                _ => break,
            };
            let pos = self.pos();
            self.cursor += 1;
            let operand = self.parse_addition()?;
            tail.push(OpTail { op, pos, operand });
        }
        Ok(Comparison { head, tail })
    }

    fn parse_addition(&mut self) -> Result<Addition, CompileError> {
        let head = self.parse_multiplication()?;
        let mut tail = Vec::new();
        loop {
            let op = match self.peek() {
                Some(Token::Plus) => AddOp::Add,
                Some(Token::Minus) => AddOp::Sub,
                _ => break,
            };
            let pos = self.pos();
            self.cursor += 1;
            let operand = self.parse_multiplication()?;
            tail.push(OpTail { op, pos, operand });
        }
        Ok(Addition { head, tail })
    }

    fn parse_multiplication(&mut self) -> Result<Multiplication, CompileError> {
        let head = self.parse_unary()?;
        let mut tail = Vec::new();
        loop {
            let op = match self.peek() {
                Some(Token::Mul) => MulOp::Mul,
                Some(Token::Div) => MulOp::Div,
                _ => break,
            };
            let pos = self.pos();
            self.cursor += 1;
            let operand = self.parse_unary()?;
            tail.push(OpTail { op, pos, operand });
        }
        Ok(Multiplication { head, tail })
    }

    fn parse_unary(&mut self) -> Result<Unary, CompileError> {
        let pos = self.pos();
        if self.consume(&Token::Bang) {
            let operand = self.nested(|p| p.parse_unary())?;
            return Ok(Unary::Not(pos, Box::new(operand)));
        }
        if self.consume(&Token::Minus) {
            let operand = self.nested(|p| p.parse_unary())?;
            return Ok(Unary::Negate(pos, Box::new(operand)));
        }
        Ok(Unary::Primary(self.parse_primary()?))
    }

    fn parse_primary(&mut self) -> Result<Primary, CompileError> {
        let constant = match self.peek() {
            Some(Token::True) => Some(Constant::Bool(true)),
            Some(Token::False) => Some(Constant::Bool(false)),
            Some(Token::String(s)) => Some(Constant::String(s.clone())),
            Some(Token::RealLiteral(r)) => Some(Constant::Real(*r)),
            Some(Token::Integer(n)) => Some(Constant::Integer(*n)),
            _ => None,
        };
        if let Some(constant) = constant {
            self.cursor += 1;
            return Ok(Primary::Constant(constant));
        }

        match self.peek() {
            // One token of lookahead separates a call from a variable.
            Some(Token::Ident(_)) if self.peek_nth(1) == Some(&Token::LParen) => {
                Ok(Primary::Call(self.parse_function_call()?))
            }
            Some(Token::Ident(_)) => Ok(Primary::Key(self.parse_key()?)),
            Some(Token::LParen) => {
                self.cursor += 1;
                let inner = self.nested(|p| p.parse_expression())?;
                self.expect(&Token::RParen)?;
                Ok(Primary::Parenthesized(Box::new(inner)))
            }
            _ => Err(self.unexpected("an expression")),
        }
    }
}

/// Parse a token stream into a program.
pub fn parse_program(
    tokens: Vec<SpannedToken>,
    index: &SourceIndex<'_>,
) -> Result<Program, CompileError> {
    Parser::new(tokens, index).parse_program()
}
