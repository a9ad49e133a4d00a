use super::context::Gen;
use crate::frontend::source::Position;
use crate::ir::ast::{Expression, Key, Program, Statement, StatementKind, VariableType};
use crate::ir::error_utils::{make_resolution_error, make_type_error, symbol_error, SymbolKind};
use crate::ir::runtime;
use crate::ir::symbol_table::VariableInfo;
use crate::ir::*;
use crate::{CompileError, ResolutionErrorKind};

impl Gen {
    pub fn lower_program(&mut self, program: &Program) -> Result<(), CompileError> {
        self.lower_block(&program.statements)
    }

    pub fn lower_block(&mut self, statements: &[Statement]) -> Result<(), CompileError> {
        for s in statements {
            self.lower_stmt(s)?;
        }
        Ok(())
    }

    pub fn lower_stmt(&mut self, s: &Statement) -> Result<(), CompileError> {
        match &s.kind {
            StatementKind::Empty => Ok(()),
            StatementKind::Declare { name, ty } => self.lower_declare(name, ty, s.pos),
            StatementKind::Output(e) => {
                let v = self.eval_expression(e)?;
                let text = self.coerce_to_text_ptr(v, s.pos, "OUTPUT")?;
                self.call_runtime(runtime::WRITE_LINE, vec![text], s.pos)
            }
            StatementKind::DebugPrintInt(e) => {
                let v = self.eval_expression(e)?;
                let v = match v.ty().int_width() {
                    Some(32) => v,
                    Some(w) if w < 32 => self.zext(v, Type::i32())?,
                    _ => {
                        return Err(make_type_error(
                            s.pos,
                            format!("PrintfD expects an integer, found {}", v.ty()),
                        ))
                    }
                };
                self.lower_debug_print(runtime::INT_FORMAT, v, s.pos)
            }
            StatementKind::DebugPrintReal(e) => {
                let v = self.eval_expression(e)?;
                if !v.ty().is_double() {
                    return Err(make_type_error(
                        s.pos,
                        format!("PrintfF expects a real, found {}", v.ty()),
                    ));
                }
                self.lower_debug_print(runtime::REAL_FORMAT, v, s.pos)
            }
            StatementKind::Assign { target, value } => self.lower_assign(target, value),
            StatementKind::Input(key) => self.lower_input(key),
            StatementKind::If {
                condition,
                then_branch,
                else_branch,
            } => self.lower_if(condition, then_branch, else_branch.as_deref(), s.pos),
            StatementKind::While { condition, body } => self.lower_while(condition, body, s.pos),
            StatementKind::Repeat { body, condition } => self.lower_repeat(body, condition, s.pos),
            StatementKind::Call(call) => {
                self.eval_function_call(call)?;
                Ok(())
            }
        }
    }

    /// Variables live in module globals and are bound in the root scope, so
    /// a DECLARE inside a loop body stays visible after the loop.
    fn lower_declare(
        &mut self,
        name: &str,
        ty: &VariableType,
        pos: Position,
    ) -> Result<(), CompileError> {
        let init = match ty {
            VariableType::Int => Initializer::Int { bits: 32, value: 0 },
            VariableType::Real => Initializer::Double(0.0),
            VariableType::Bool => Initializer::Int { bits: 1, value: 0 },
            VariableType::Custom(type_name) => {
                tracing::debug!(variable = name, type_name = %type_name, "ignoring declaration of custom type");
                return Ok(());
            }
        };

        let root = self.scopes.root();
        let storage = self.module.add_global(name, init, false);
        tracing::debug!(variable = name, storage = %storage, "declared variable");
        self.scopes
            .declare_variable(
                root,
                name,
                VariableInfo {
                    storage,
                    declared_at: Some(pos),
                },
            )
            .map_err(|e| symbol_error(e, pos, SymbolKind::Variable))
    }

    fn lower_assign(&mut self, target: &Key, value: &Expression) -> Result<(), CompileError> {
        let storage = self.resolve_key(target)?;
        let v = self.eval_expression(value)?;
        let expected = storage.ty().pointee().cloned();
        if expected.as_ref() != Some(&v.ty()) {
            let expected = expected.map_or_else(|| "nothing".to_string(), |t| t.to_string());
            return Err(make_type_error(
                target.pos,
                format!(
                    "Cannot assign a value of type {} to '{}' of type {}",
                    v.ty(),
                    target.root_name(),
                    expected
                ),
            ));
        }
        self.emit(Instr::Store {
            value: v,
            dst: storage,
        })
    }

    fn lower_input(&mut self, key: &Key) -> Result<(), CompileError> {
        let storage = self.resolve_key(key)?;
        let held = storage.ty().pointee().cloned();
        if held != Some(Type::i32()) {
            let held = held.map_or_else(|| "not a variable".to_string(), |t| t.to_string());
            return Err(make_type_error(
                key.pos,
                format!(
                    "INPUT can only read into an INT variable, '{}' is {}",
                    key.root_name(),
                    held
                ),
            ));
        }
        let ch = self.call_runtime_value(runtime::READ_CHAR, Vec::new(), key.pos)?;
        self.emit(Instr::Store {
            value: ch,
            dst: storage,
        })
    }

    fn lower_debug_print(
        &mut self,
        fmt_name: &str,
        value: Value,
        pos: Position,
    ) -> Result<(), CompileError> {
        let fmt_storage = self
            .scopes
            .resolve_variable(self.scope, fmt_name)
            .map(|info| info.storage.clone())
            .ok_or_else(|| {
                make_resolution_error(
                    ResolutionErrorKind::UndefinedVariable,
                    pos,
                    format!("Undefined variable '{}'", fmt_name),
                )
            })?;
        let fmt_ptr = self.bitcast(fmt_storage, Type::i8_ptr())?;
        self.call_runtime(runtime::FORMATTED_PRINT, vec![fmt_ptr, value], pos)
    }

    fn call_runtime(
        &mut self,
        name: &str,
        args: Vec<Value>,
        pos: Position,
    ) -> Result<(), CompileError> {
        self.call_runtime_value(name, args, pos).map(|_| ())
    }

    /// Call an intrinsic with already-lowered arguments.
    fn call_runtime_value(
        &mut self,
        name: &str,
        args: Vec<Value>,
        pos: Position,
    ) -> Result<Value, CompileError> {
        let callee = self.scopes.resolve_function(name).cloned().ok_or_else(|| {
            make_resolution_error(
                ResolutionErrorKind::UndefinedFunction,
                pos,
                format!("Undefined function '{}'", name),
            )
        })?;
        let dst = self.new_temp(callee.ret.clone());
        self.emit(Instr::Call {
            dst: Some(dst.clone()),
            callee,
            args,
        })?;
        Ok(dst)
    }

    fn eval_condition(
        &mut self,
        e: &Expression,
        pos: Position,
        what: &str,
    ) -> Result<Value, CompileError> {
        let v = self.eval_expression(e)?;
        if v.ty() != Type::i1() {
            return Err(make_type_error(
                pos,
                format!("{} condition must be BOOL, found {}", what, v.ty()),
            ));
        }
        Ok(v)
    }

    fn lower_if(
        &mut self,
        condition: &Expression,
        then_branch: &[Statement],
        else_branch: Option<&[Statement]>,
        pos: Position,
    ) -> Result<(), CompileError> {
        let cond = self.eval_condition(condition, pos, "IF")?;
        let origin = self.block;

        let true_block = self.new_block()?;
        let false_block = self.new_block()?;
        let cont = self.new_block()?;

        self.block = true_block;
        self.with_child_scope(|g| g.lower_block(then_branch))?;
        self.terminate(Terminator::Br(cont))?;

        self.block = false_block;
        self.with_child_scope(|g| g.lower_block(else_branch.unwrap_or(&[])))?;
        self.terminate(Terminator::Br(cont))?;

        self.terminate_block(
            origin,
            Terminator::CondBr {
                cond,
                then_block: true_block,
                else_block: false_block,
            },
        )?;
        self.block = cont;
        Ok(())
    }

    /// Pre-test loop: `cond -> body -> cond`, exit to `cont` when false.
    fn lower_while(
        &mut self,
        condition: &Expression,
        body: &[Statement],
        pos: Position,
    ) -> Result<(), CompileError> {
        let cond_block = self.new_block()?;
        let body_block = self.new_block()?;
        let cont = self.new_block()?;

        self.terminate(Terminator::Br(cond_block))?;
        self.block = cond_block;

        self.with_child_scope(|g| {
            let c = g.eval_condition(condition, pos, "WHILE")?;
            g.terminate(Terminator::CondBr {
                cond: c,
                then_block: body_block,
                else_block: cont,
            })?;
            g.block = body_block;
            g.lower_block(body)?;
            g.terminate(Terminator::Br(cond_block))
        })?;

        self.block = cont;
        Ok(())
    }

    /// Post-test loop: the body runs once, then repeats until the condition holds.
    fn lower_repeat(
        &mut self,
        body: &[Statement],
        condition: &Expression,
        pos: Position,
    ) -> Result<(), CompileError> {
        let body_block = self.new_block()?;
        let cont = self.new_block()?;

        self.terminate(Terminator::Br(body_block))?;
        self.block = body_block;

        self.with_child_scope(|g| {
            g.lower_block(body)?;
            let c = g.eval_condition(condition, pos, "REPEAT")?;
            g.terminate(Terminator::CondBr {
                cond: c,
                then_block: cont,
                else_block: body_block,
            })
        })?;

        self.block = cont;
        Ok(())
    }
}
