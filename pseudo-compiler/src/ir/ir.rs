// A small SSA-style IR with basic blocks, serialized as LLVM assembly text.

use std::collections::HashSet;
use std::fmt;
use thiserror::Error;

/// Violations of the block/terminator invariants.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum IrError {
    #[error("block '{label}' in '{function}' is already terminated")]
    AlreadyTerminated { function: String, label: String },

    #[error("block '{label}' in '{function}' has no terminator")]
    Unterminated { function: String, label: String },

    #[error("block #{index} does not exist in '{function}'")]
    UnknownBlock { function: String, index: usize },

    #[error("function #{0} does not exist")]
    UnknownFunction(usize),

    #[error("storage bound to '{0}' is not a pointer")]
    NotAPointer(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Type {
    Int(u32),
    Double,
    Ptr(Box<Type>),
    Array(usize, Box<Type>),
}

impl Type {
    pub fn i1() -> Self {
        Type::Int(1)
    }

    pub fn i8() -> Self {
        Type::Int(8)
    }

    pub fn i32() -> Self {
        Type::Int(32)
    }

    pub fn i8_ptr() -> Self {
        Type::Ptr(Box::new(Type::i8()))
    }

    pub fn ptr_to(self) -> Self {
        Type::Ptr(Box::new(self))
    }

    pub fn int_width(&self) -> Option<u32> {
        match self {
            Type::Int(bits) => Some(*bits),
            _ => None,
        }
    }

    pub fn is_double(&self) -> bool {
        matches!(self, Type::Double)
    }

    pub fn is_pointer(&self) -> bool {
        matches!(self, Type::Ptr(_))
    }

    pub fn pointee(&self) -> Option<&Type> {
        match self {
            Type::Ptr(inner) => Some(inner),
            _ => None,
        }
    }
}

impl fmt::Display for Type {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Type::Int(bits) => write!(f, "i{bits}"),
            Type::Double => write!(f, "double"),
            Type::Ptr(inner) => write!(f, "{inner}*"),
            Type::Array(len, inner) => write!(f, "[{len} x {inner}]"),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    ConstInt { bits: u32, value: i64 },
    ConstDouble(f64),
    /// Address of a module global; `ty` is the pointer type.
    Global { name: String, ty: Type },
    /// Result of an instruction.
    Temp { name: String, ty: Type },
}

impl Value {
    pub fn i32(value: i32) -> Self {
        Value::ConstInt {
            bits: 32,
            value: value.into(),
        }
    }

    pub fn bool(value: bool) -> Self {
        Value::ConstInt {
            bits: 1,
            value: value.into(),
        }
    }

    pub fn ty(&self) -> Type {
        match self {
            Value::ConstInt { bits, .. } => Type::Int(*bits),
            Value::ConstDouble(_) => Type::Double,
            Value::Global { ty, .. } | Value::Temp { ty, .. } => ty.clone(),
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::ConstInt { bits: 1, value } => {
                write!(f, "{}", if *value != 0 { "true" } else { "false" })
            }
            Value::ConstInt { value, .. } => write!(f, "{value}"),
            // Hex form is exact for every double
            Value::ConstDouble(v) => write!(f, "0x{:016X}", v.to_bits()),
            Value::Global { name, .. } => write!(f, "@{name}"),
            Value::Temp { name, .. } => write!(f, "%{name}"),
        }
    }
}

/// `<type> <value>` as operands are spelled in LLVM.
struct Typed<'a>(&'a Value);

impl fmt::Display for Typed<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.0.ty(), self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryOp {
    Add,
    Sub,
    Mul,
    SDiv,
    FAdd,
    FSub,
    FMul,
    FDiv,
    Xor,
}

impl fmt::Display for BinaryOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            BinaryOp::Add => "add",
            BinaryOp::Sub => "sub",
            BinaryOp::Mul => "mul",
            BinaryOp::SDiv => "sdiv",
            BinaryOp::FAdd => "fadd",
            BinaryOp::FSub => "fsub",
            BinaryOp::FMul => "fmul",
            BinaryOp::FDiv => "fdiv",
            BinaryOp::Xor => "xor",
        };
        write!(f, "{s}")
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IntPredicate {
    Eq,
    Ne,
    Slt,
    Sgt,
    Sle,
    Sge,
}

impl fmt::Display for IntPredicate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            IntPredicate::Eq => "eq",
            IntPredicate::Ne => "ne",
            IntPredicate::Slt => "slt",
            IntPredicate::Sgt => "sgt",
            IntPredicate::Sle => "sle",
            IntPredicate::Sge => "sge",
        };
        write!(f, "{s}")
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FloatPredicate {
    Oeq,
    One,
    Olt,
    Ogt,
    Ole,
    Oge,
}

impl fmt::Display for FloatPredicate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            FloatPredicate::Oeq => "oeq",
            FloatPredicate::One => "one",
            FloatPredicate::Olt => "olt",
            FloatPredicate::Ogt => "ogt",
            FloatPredicate::Ole => "ole",
            FloatPredicate::Oge => "oge",
        };
        write!(f, "{s}")
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CastOp {
    BitCast,
    ZExt,
}

impl fmt::Display for CastOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CastOp::BitCast => write!(f, "bitcast"),
            CastOp::ZExt => write!(f, "zext"),
        }
    }
}

/// Signature of a callable symbol.
#[derive(Debug, Clone, PartialEq)]
pub struct Callee {
    pub name: String,
    pub ret: Type,
    pub params: Vec<Type>,
    pub variadic: bool,
}

impl Callee {
    /// Parameter list as written in declarations, e.g. `i8*, ...`.
    fn param_list(&self) -> String {
        let mut parts: Vec<String> = self.params.iter().map(|t| t.to_string()).collect();
        if self.variadic {
            parts.push("...".to_string());
        }
        parts.join(", ")
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Instr {
    /// `dst = load <pointee>, <ptr>`
    Load { dst: Value, src: Value },

    /// `store <value>, <ptr>`
    Store { value: Value, dst: Value },

    /// `dst = <op> <lhs>, <rhs>`
    Binary {
        dst: Value,
        op: BinaryOp,
        lhs: Value,
        rhs: Value,
    },

    /// `dst = icmp <pred> <lhs>, <rhs>`
    ICmp {
        dst: Value,
        pred: IntPredicate,
        lhs: Value,
        rhs: Value,
    },

    /// `dst = fcmp <pred> <lhs>, <rhs>`
    FCmp {
        dst: Value,
        pred: FloatPredicate,
        lhs: Value,
        rhs: Value,
    },

    /// `dst = <op> <value> to <dst type>`
    Cast { dst: Value, op: CastOp, value: Value },

    /// Call with an optional destination for the return value
    Call {
        dst: Option<Value>,
        callee: Callee,
        args: Vec<Value>,
    },
}

impl fmt::Display for Instr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Instr::Load { dst, src } => {
                write!(f, "{dst} = load {}, {}", dst.ty(), Typed(src))
            }
            Instr::Store { value, dst } => write!(f, "store {}, {}", Typed(value), Typed(dst)),
            Instr::Binary { dst, op, lhs, rhs } => {
                write!(f, "{dst} = {op} {}, {rhs}", Typed(lhs))
            }
            Instr::ICmp {
                dst,
                pred,
                lhs,
                rhs,
            } => write!(f, "{dst} = icmp {pred} {}, {rhs}", Typed(lhs)),
            Instr::FCmp {
                dst,
                pred,
                lhs,
                rhs,
            } => write!(f, "{dst} = fcmp {pred} {}, {rhs}", Typed(lhs)),
            Instr::Cast { dst, op, value } => {
                write!(f, "{dst} = {op} {} to {}", Typed(value), dst.ty())
            }
            Instr::Call { dst, callee, args } => {
                if let Some(d) = dst {
                    write!(f, "{d} = ")?;
                }
                // Variadic callees need the full function type at the call site
                if callee.variadic {
                    write!(f, "call {} ({}) @{}(", callee.ret, callee.param_list(), callee.name)?;
                } else {
                    write!(f, "call {} @{}(", callee.ret, callee.name)?;
                }
                for (i, a) in args.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}", Typed(a))?;
                }
                write!(f, ")")
            }
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct BlockId(pub usize);

#[derive(Debug, Clone, PartialEq)]
pub enum Terminator {
    Br(BlockId),
    CondBr {
        cond: Value,
        then_block: BlockId,
        else_block: BlockId,
    },
    Ret(Value),
}

#[derive(Debug, Clone, PartialEq)]
pub struct BasicBlock {
    pub label: String,
    pub instrs: Vec<Instr>,
    pub terminator: Option<Terminator>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Function {
    pub signature: Callee,
    /// Empty for external declarations.
    pub blocks: Vec<BasicBlock>,
}

impl Function {
    pub fn declaration(signature: Callee) -> Self {
        Self {
            signature,
            blocks: Vec::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.signature.name
    }

    pub fn is_declaration(&self) -> bool {
        self.blocks.is_empty()
    }

    pub fn new_block(&mut self) -> BlockId {
        let id = BlockId(self.blocks.len());
        let label = if id.0 == 0 {
            "entry".to_string()
        } else {
            format!("bb{}", id.0)
        };
        self.blocks.push(BasicBlock {
            label,
            instrs: Vec::new(),
            terminator: None,
        });
        id
    }

    fn open_block_mut(&mut self, id: BlockId) -> Result<&mut BasicBlock, IrError> {
        let function = self.signature.name.clone();
        let block = self
            .blocks
            .get_mut(id.0)
            .ok_or_else(|| IrError::UnknownBlock {
                function: function.clone(),
                index: id.0,
            })?;
        if block.terminator.is_some() {
            return Err(IrError::AlreadyTerminated {
                function,
                label: block.label.clone(),
            });
        }
        Ok(block)
    }

    /// Append an instruction; fails once the block is terminated.
    pub fn push(&mut self, id: BlockId, instr: Instr) -> Result<(), IrError> {
        self.open_block_mut(id)?.instrs.push(instr);
        Ok(())
    }

    /// Set the block's single terminator.
    pub fn terminate(&mut self, id: BlockId, term: Terminator) -> Result<(), IrError> {
        self.open_block_mut(id)?.terminator = Some(term);
        Ok(())
    }

    pub fn successors(&self, id: BlockId) -> Vec<BlockId> {
        match self.blocks.get(id.0).and_then(|b| b.terminator.as_ref()) {
            Some(Terminator::Br(target)) => vec![*target],
            Some(Terminator::CondBr {
                then_block,
                else_block,
                ..
            }) => vec![*then_block, *else_block],
            Some(Terminator::Ret(_)) | None => Vec::new(),
        }
    }

    fn label(&self, id: BlockId) -> &str {
        self.blocks
            .get(id.0)
            .map(|b| b.label.as_str())
            .unwrap_or("<invalid>")
    }

    fn write_terminator(&self, f: &mut fmt::Formatter<'_>, term: &Terminator) -> fmt::Result {
        match term {
            Terminator::Br(target) => write!(f, "br label %{}", self.label(*target)),
            Terminator::CondBr {
                cond,
                then_block,
                else_block,
            } => write!(
                f,
                "br {}, label %{}, label %{}",
                Typed(cond),
                self.label(*then_block),
                self.label(*else_block)
            ),
            Terminator::Ret(v) => write!(f, "ret {}", Typed(v)),
        }
    }
}

impl fmt::Display for Function {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let sig = &self.signature;
        if self.is_declaration() {
            return write!(f, "declare {} @{}({})", sig.ret, sig.name, sig.param_list());
        }
        writeln!(f, "define {} @{}({}) {{", sig.ret, sig.name, sig.param_list())?;
        for (i, block) in self.blocks.iter().enumerate() {
            if i > 0 {
                writeln!(f)?;
            }
            writeln!(f, "{}:", block.label)?;
            for instr in &block.instrs {
                writeln!(f, "  {instr}")?;
            }
            if let Some(term) = &block.terminator {
                write!(f, "  ")?;
                self.write_terminator(f, term)?;
                writeln!(f)?;
            }
        }
        write!(f, "}}")
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Initializer {
    Int { bits: u32, value: i64 },
    Double(f64),
    /// Byte string, including any terminator.
    Bytes(Vec<u8>),
}

impl Initializer {
    pub fn ty(&self) -> Type {
        match self {
            Initializer::Int { bits, .. } => Type::Int(*bits),
            Initializer::Double(_) => Type::Double,
            Initializer::Bytes(bytes) => Type::Array(bytes.len(), Box::new(Type::i8())),
        }
    }
}

impl fmt::Display for Initializer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Initializer::Int { bits, value } => write!(
                f,
                "{}",
                Value::ConstInt {
                    bits: *bits,
                    value: *value
                }
            ),
            Initializer::Double(v) => write!(f, "{}", Value::ConstDouble(*v)),
            Initializer::Bytes(bytes) => {
                write!(f, "c\"")?;
                for b in bytes {
                    if (b.is_ascii_graphic() && *b != b'"' && *b != b'\\') || *b == b' ' {
                        write!(f, "{}", *b as char)?;
                    } else {
                        write!(f, "\\{:02X}", b)?;
                    }
                }
                write!(f, "\"")
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Global {
    pub name: String,
    pub init: Initializer,
    /// Read-only, private, address-insignificant data (string literals).
    pub constant: bool,
}

impl Global {
    pub fn ty(&self) -> Type {
        self.init.ty()
    }

    /// The pointer value that addresses this global.
    pub fn address(&self) -> Value {
        Value::Global {
            name: self.name.clone(),
            ty: self.ty().ptr_to(),
        }
    }
}

impl fmt::Display for Global {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.constant {
            write!(
                f,
                "@{} = private unnamed_addr constant {} {}",
                self.name,
                self.ty(),
                self.init
            )
        } else {
            write!(f, "@{} = global {} {}", self.name, self.ty(), self.init)
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct FunctionId(pub usize);

/// A whole compiled program: globals plus function definitions/declarations.
#[derive(Debug, Clone, Default)]
pub struct Module {
    pub globals: Vec<Global>,
    pub functions: Vec<Function>,
    symbols: HashSet<String>,
}

impl Module {
    pub fn new() -> Self {
        Self::default()
    }

    /// `base` if unused, otherwise `base.N` for the first free N.
    pub fn unique_symbol(&self, base: &str) -> String {
        if !self.symbols.contains(base) {
            return base.to_string();
        }
        (1..)
            .map(|n| format!("{base}.{n}"))
            .find(|candidate| !self.symbols.contains(candidate))
            .unwrap_or_else(|| base.to_string())
    }

    /// Add a global under a unique symbol and return its address.
    pub fn add_global(&mut self, base: &str, init: Initializer, constant: bool) -> Value {
        let name = self.unique_symbol(base);
        self.symbols.insert(name.clone());
        let global = Global {
            name,
            init,
            constant,
        };
        let address = global.address();
        self.globals.push(global);
        address
    }

    pub fn add_function(&mut self, function: Function) -> FunctionId {
        self.symbols.insert(function.signature.name.clone());
        self.functions.push(function);
        FunctionId(self.functions.len() - 1)
    }

    pub fn function(&self, id: FunctionId) -> Result<&Function, IrError> {
        self.functions.get(id.0).ok_or(IrError::UnknownFunction(id.0))
    }

    pub fn function_mut(&mut self, id: FunctionId) -> Result<&mut Function, IrError> {
        self.functions
            .get_mut(id.0)
            .ok_or(IrError::UnknownFunction(id.0))
    }

    pub fn get_function(&self, name: &str) -> Option<&Function> {
        self.functions.iter().find(|f| f.name() == name)
    }

    pub fn get_global(&self, name: &str) -> Option<&Global> {
        self.globals.iter().find(|g| g.name == name)
    }

    /// Every block of every defined function must carry a terminator.
    pub fn verify(&self) -> Result<(), IrError> {
        for function in &self.functions {
            if let Some(block) = function.blocks.iter().find(|b| b.terminator.is_none()) {
                return Err(IrError::Unterminated {
                    function: function.name().to_string(),
                    label: block.label.clone(),
                });
            }
        }
        Ok(())
    }
}

impl fmt::Display for Module {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for g in &self.globals {
            writeln!(f, "{g}")?;
        }
        for function in self.functions.iter().filter(|func| func.is_declaration()) {
            writeln!(f)?;
            writeln!(f, "{function}")?;
        }
        for function in self.functions.iter().filter(|func| !func.is_declaration()) {
            writeln!(f)?;
            writeln!(f, "{function}")?;
        }
        Ok(())
    }
}
