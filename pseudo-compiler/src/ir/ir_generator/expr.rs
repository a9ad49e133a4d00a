use super::context::Gen;
use crate::frontend::source::Position;
use crate::ir::ast::{
    AddOp, Addition, CompareOp, Comparison, Constant, Expression, FunctionCall, Key, MulOp,
    Multiplication, Primary, Unary,
};
use crate::ir::error_utils::{make_resolution_error, make_type_error, unsupported_type};
use crate::ir::runtime;
use crate::ir::*;
use crate::{CompileError, ResolutionErrorKind};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Arith {
    Add,
    Sub,
    Mul,
    Div,
}

impl Arith {
    fn symbol(self) -> &'static str {
        match self {
            Arith::Add => "'+'",
            Arith::Sub => "'-'",
            Arith::Mul => "'*'",
            Arith::Div => "'/'",
        }
    }
}

fn map_add(op: AddOp) -> Arith {
    match op {
        AddOp::Add => Arith::Add,
        AddOp::Sub => Arith::Sub,
    }
}

fn map_mul(op: MulOp) -> Arith {
    match op {
        MulOp::Mul => Arith::Mul,
        MulOp::Div => Arith::Div,
    }
}

fn compare_symbol(op: CompareOp) -> &'static str {
    match op {
        CompareOp::Eq => "'='",
        CompareOp::Neq => "'<>'",
        CompareOp::Lt => "'<'",
        CompareOp::Gt => "'>'",
        CompareOp::Le => "'<='",
        CompareOp::Ge => "'>='",
    }
}

fn map_int_pred(op: CompareOp) -> IntPredicate {
    match op {
        CompareOp::Eq => IntPredicate::Eq,
        CompareOp::Neq => IntPredicate::Ne,
        CompareOp::Lt => IntPredicate::Slt,
        CompareOp::Gt => IntPredicate::Sgt,
        CompareOp::Le => IntPredicate::Sle,
        CompareOp::Ge => IntPredicate::Sge,
    }
}

fn map_float_pred(op: CompareOp) -> FloatPredicate {
    match op {
        CompareOp::Eq => FloatPredicate::Oeq,
        CompareOp::Neq => FloatPredicate::One,
        CompareOp::Lt => FloatPredicate::Olt,
        CompareOp::Gt => FloatPredicate::Ogt,
        CompareOp::Le => FloatPredicate::Ole,
        CompareOp::Ge => FloatPredicate::Oge,
    }
}

/// How a binary operation is lowered, picked from the left operand.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Repr {
    Integer,
    Floating,
}

impl Gen {
    pub fn eval_expression(&mut self, e: &Expression) -> Result<Value, CompileError> {
        self.eval_comparison(&e.comparison)
    }

    /// Left fold of `head (op operand)*` into i1 compares.
    fn eval_comparison(&mut self, c: &Comparison) -> Result<Value, CompileError> {
        let mut acc = self.eval_addition(&c.head)?;
        for tail in &c.tail {
            let rhs = self.eval_addition(&tail.operand)?;
            acc = self.emit_compare(tail.op, acc, rhs, tail.pos)?;
        }
        Ok(acc)
    }

    fn eval_addition(&mut self, a: &Addition) -> Result<Value, CompileError> {
        let mut acc = self.eval_multiplication(&a.head)?;
        for tail in &a.tail {
            let rhs = self.eval_multiplication(&tail.operand)?;
            acc = self.emit_arith(map_add(tail.op), acc, rhs, tail.pos)?;
        }
        Ok(acc)
    }

    fn eval_multiplication(&mut self, m: &Multiplication) -> Result<Value, CompileError> {
        let mut acc = self.eval_unary(&m.head)?;
        for tail in &m.tail {
            let rhs = self.eval_unary(&tail.operand)?;
            acc = self.emit_arith(map_mul(tail.op), acc, rhs, tail.pos)?;
        }
        Ok(acc)
    }

    fn eval_unary(&mut self, u: &Unary) -> Result<Value, CompileError> {
        match u {
            Unary::Primary(p) => self.eval_primary(p),
            Unary::Negate(pos, operand) => {
                let v = self.eval_unary(operand)?;
                self.emit_negate(v, *pos)
            }
            Unary::Not(pos, operand) => {
                let v = self.eval_unary(operand)?;
                let ty = v.ty();
                if ty != Type::i1() {
                    return Err(unsupported_type(*pos, "'!'", &ty));
                }
                let dst = self.new_temp(Type::i1());
                self.emit(Instr::Binary {
                    dst: dst.clone(),
                    op: BinaryOp::Xor,
                    lhs: v,
                    rhs: Value::bool(true),
                })?;
                Ok(dst)
            }
        }
    }

    fn eval_primary(&mut self, p: &Primary) -> Result<Value, CompileError> {
        match p {
            Primary::Constant(c) => Ok(self.eval_constant(c)),
            Primary::Call(call) => self.eval_function_call(call),
            Primary::Key(key) => self.load_key(key),
            Primary::Parenthesized(inner) => self.eval_expression(inner),
        }
    }

    fn eval_constant(&mut self, c: &Constant) -> Value {
        match c {
            Constant::Bool(b) => Value::bool(*b),
            Constant::Integer(n) => Value::i32(*n),
            Constant::Real(r) => Value::ConstDouble(*r),
            Constant::String(s) => self.hoist_string(s),
        }
    }

    /// Give a string literal its own global. Identical texts are not shared.
    pub fn hoist_string(&mut self, text: &str) -> Value {
        let base = format!(".str.{}", self.string_count);
        self.string_count += 1;
        let addr = self
            .module
            .add_global(&base, runtime::string_literal(text), true);
        tracing::debug!(global = %addr, "hoisted string literal");
        addr
    }

    /// Storage pointer for a key. Only the first path component is resolved.
    pub fn resolve_key(&self, key: &Key) -> Result<Value, CompileError> {
        let name = key.root_name();
        self.scopes
            .resolve_variable(self.scope, name)
            .map(|info| info.storage.clone())
            .ok_or_else(|| {
                make_resolution_error(
                    ResolutionErrorKind::UndefinedVariable,
                    key.pos,
                    format!("Undefined variable '{}'", name),
                )
            })
    }

    fn load_key(&mut self, key: &Key) -> Result<Value, CompileError> {
        let storage = self.resolve_key(key)?;
        let pointee = storage
            .ty()
            .pointee()
            .cloned()
            .ok_or_else(|| IrError::NotAPointer(key.root_name().to_string()))?;

        // Byte arrays are used by address, not loaded.
        if let Type::Array(..) = pointee {
            return Ok(storage);
        }
        let dst = self.new_temp(pointee);
        self.emit(Instr::Load {
            dst: dst.clone(),
            src: storage,
        })?;
        Ok(dst)
    }

    fn emit_negate(&mut self, v: Value, pos: Position) -> Result<Value, CompileError> {
        let ty = v.ty();
        let (op, zero) = match &ty {
            Type::Int(32) => (BinaryOp::Sub, Value::i32(0)),
            Type::Double => (BinaryOp::FSub, Value::ConstDouble(0.0)),
            other => return Err(unsupported_type(pos, "Negation", other)),
        };
        let dst = self.new_temp(ty);
        self.emit(Instr::Binary {
            dst: dst.clone(),
            op,
            lhs: zero,
            rhs: v,
        })?;
        Ok(dst)
    }

    /// Pick the lowering from the left operand and bring the right one in line.
    fn unify_operands(
        &mut self,
        lhs: Value,
        rhs: Value,
        pos: Position,
        what: &str,
    ) -> Result<(Value, Value, Repr), CompileError> {
        let (lt, rt) = (lhs.ty(), rhs.ty());
        match (lt.int_width(), rt.int_width()) {
            (Some(lw), Some(rw)) if lw == rw => Ok((lhs, rhs, Repr::Integer)),
            // Mixed widths: widen the narrower side (BOOL next to INT)
            (Some(lw), Some(rw)) if lw < rw => {
                let lhs = self.zext(lhs, rt)?;
                Ok((lhs, rhs, Repr::Integer))
            }
            (Some(_), Some(_)) => {
                let rhs = self.zext(rhs, lt)?;
                Ok((lhs, rhs, Repr::Integer))
            }
            _ if lt.is_double() && rt.is_double() => Ok((lhs, rhs, Repr::Floating)),
            (Some(_), _) => Err(make_type_error(
                pos,
                format!("Operator {} cannot combine {} with {}", what, lt, rt),
            )),
            _ if lt.is_double() => Err(make_type_error(
                pos,
                format!("Operator {} cannot combine {} with {}", what, lt, rt),
            )),
            _ => Err(unsupported_type(pos, &format!("Operator {}", what), &lt)),
        }
    }

    fn emit_arith(
        &mut self,
        op: Arith,
        lhs: Value,
        rhs: Value,
        pos: Position,
    ) -> Result<Value, CompileError> {
        let (lhs, rhs, repr) = self.unify_operands(lhs, rhs, pos, op.symbol())?;
        let op = match (repr, op) {
            (Repr::Integer, Arith::Add) => BinaryOp::Add,
            (Repr::Integer, Arith::Sub) => BinaryOp::Sub,
            (Repr::Integer, Arith::Mul) => BinaryOp::Mul,
            (Repr::Integer, Arith::Div) => BinaryOp::SDiv,
            (Repr::Floating, Arith::Add) => BinaryOp::FAdd,
            (Repr::Floating, Arith::Sub) => BinaryOp::FSub,
            (Repr::Floating, Arith::Mul) => BinaryOp::FMul,
            (Repr::Floating, Arith::Div) => BinaryOp::FDiv,
        };
        let dst = self.new_temp(lhs.ty());
        self.emit(Instr::Binary {
            dst: dst.clone(),
            op,
            lhs,
            rhs,
        })?;
        Ok(dst)
    }

    fn emit_compare(
        &mut self,
        op: CompareOp,
        lhs: Value,
        rhs: Value,
        pos: Position,
    ) -> Result<Value, CompileError> {
        let (lhs, rhs, repr) = self.unify_operands(lhs, rhs, pos, compare_symbol(op))?;
        let dst = self.new_temp(Type::i1());
        let instr = match repr {
            Repr::Integer => Instr::ICmp {
                dst: dst.clone(),
                pred: map_int_pred(op),
                lhs,
                rhs,
            },
            Repr::Floating => Instr::FCmp {
                dst: dst.clone(),
                pred: map_float_pred(op),
                lhs,
                rhs,
            },
        };
        self.emit(instr)?;
        Ok(dst)
    }

    pub fn zext(&mut self, v: Value, to: Type) -> Result<Value, CompileError> {
        let dst = self.new_temp(to);
        self.emit(Instr::Cast {
            dst: dst.clone(),
            op: CastOp::ZExt,
            value: v,
        })?;
        Ok(dst)
    }

    pub fn bitcast(&mut self, v: Value, to: Type) -> Result<Value, CompileError> {
        let dst = self.new_temp(to);
        self.emit(Instr::Cast {
            dst: dst.clone(),
            op: CastOp::BitCast,
            value: v,
        })?;
        Ok(dst)
    }

    /// View a pointer value as `i8*`.
    pub fn coerce_to_text_ptr(
        &mut self,
        v: Value,
        pos: Position,
        what: &str,
    ) -> Result<Value, CompileError> {
        let ty = v.ty();
        if ty == Type::i8_ptr() {
            Ok(v)
        } else if ty.is_pointer() {
            self.bitcast(v, Type::i8_ptr())
        } else {
            Err(make_type_error(
                pos,
                format!("{} expects a string, found a value of type {}", what, ty),
            ))
        }
    }

    fn coerce_argument(
        &mut self,
        arg: Value,
        param: &Type,
        call: &FunctionCall,
        position: usize,
    ) -> Result<Value, CompileError> {
        let ty = arg.ty();
        if &ty == param {
            return Ok(arg);
        }
        if ty.is_pointer() && param.is_pointer() {
            return self.bitcast(arg, param.clone());
        }
        if let (Some(aw), Some(pw)) = (ty.int_width(), param.int_width()) {
            if aw < pw {
                return self.zext(arg, param.clone());
            }
        }
        Err(make_type_error(
            call.pos,
            format!(
                "Argument {} of '{}' expects {}, found {}",
                position + 1,
                call.name,
                param,
                ty
            ),
        ))
    }

    /// C default promotions for the variadic tail of a call.
    fn promote_variadic(&mut self, arg: Value) -> Result<Value, CompileError> {
        let ty = arg.ty();
        if ty.is_pointer() && ty != Type::i8_ptr() {
            return self.bitcast(arg, Type::i8_ptr());
        }
        match ty.int_width() {
            Some(w) if w < 32 => self.zext(arg, Type::i32()),
            _ => Ok(arg),
        }
    }

    /// Arguments left to right, then the callee from the root scope.
    pub fn eval_function_call(&mut self, call: &FunctionCall) -> Result<Value, CompileError> {
        let mut args = Vec::with_capacity(call.args.len());
        for a in &call.args {
            args.push(self.eval_expression(a)?);
        }

        let callee = self
            .scopes
            .resolve_function(&call.name)
            .cloned()
            .ok_or_else(|| {
                make_resolution_error(
                    ResolutionErrorKind::UndefinedFunction,
                    call.pos,
                    format!("Undefined function '{}'", call.name),
                )
            })?;

        let fixed = callee.params.len();
        let arity_ok = if callee.variadic {
            args.len() >= fixed
        } else {
            args.len() == fixed
        };
        if !arity_ok {
            return Err(make_resolution_error(
                ResolutionErrorKind::ArgumentCountMismatch,
                call.pos,
                format!(
                    "Function '{}' expects {}{} argument(s), got {}",
                    call.name,
                    if callee.variadic { "at least " } else { "" },
                    fixed,
                    args.len()
                ),
            ));
        }

        let mut lowered = Vec::with_capacity(args.len());
        for (i, arg) in args.into_iter().enumerate() {
            let v = match callee.params.get(i) {
                Some(param) => self.coerce_argument(arg, param, call, i)?,
                None => self.promote_variadic(arg)?,
            };
            lowered.push(v);
        }

        let dst = self.new_temp(callee.ret.clone());
        self.emit(Instr::Call {
            dst: Some(dst.clone()),
            callee,
            args: lowered,
        })?;
        Ok(dst)
    }
}
