pub mod frontend;
pub mod ir;

use thiserror::Error;

use frontend::source::SourceIndex;

#[derive(Error, Debug)]
pub enum CompileError {
    #[error("Lexical error: {0}")]
    Lexical(#[from] frontend::lexer::LexicalError),

    #[error("Parse error at line {line}, column {col}: {message}\n  Context: {context}")]
    Parse {
        line: usize,
        col: usize,
        context: String,
        message: String,
    },

    #[error("ResolutionError:{kind} ({line}:{col}) - {message}")]
    Resolution {
        kind: ResolutionErrorKind,
        line: usize,
        col: usize,
        message: String,
    },

    #[error("TypeError ({line}:{col}) - {message}")]
    Type {
        line: usize,
        col: usize,
        message: String,
    },

    #[error("Internal IR error: {0}")]
    Consistency(#[from] ir::IrError),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResolutionErrorKind {
    VariableRedefinition,
    FunctionRedefinition,
    FunctionOutsideRoot,
    UndefinedVariable,
    UndefinedFunction,
    ArgumentCountMismatch,
}

impl std::fmt::Display for ResolutionErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ResolutionErrorKind::VariableRedefinition => write!(f, "VariableRedefinition"),
            ResolutionErrorKind::FunctionRedefinition => write!(f, "FunctionRedefinition"),
            ResolutionErrorKind::FunctionOutsideRoot => write!(f, "FunctionOutsideRoot"),
            ResolutionErrorKind::UndefinedVariable => write!(f, "UndefinedVariable"),
            ResolutionErrorKind::UndefinedFunction => write!(f, "UndefinedFunction"),
            ResolutionErrorKind::ArgumentCountMismatch => write!(f, "ArgumentCountMismatch"),
        }
    }
}

/// Lex source text into positioned tokens.
pub fn tokenize(source: &str) -> Result<Vec<frontend::lexer::SpannedToken>, CompileError> {
    Ok(frontend::lexer::tokenize(source)?)
}

/// Lex and parse source text into an AST.
pub fn parse(source: &str) -> Result<ir::ast::Program, CompileError> {
    let tokens = frontend::lexer::tokenize(source)?;
    let index = SourceIndex::new(source);
    frontend::parser::parse_program(tokens, &index)
}

/// Lower an already parsed program into an IR module.
pub fn compile_program(program: &ir::ast::Program) -> Result<ir::Module, CompileError> {
    ir::ir_generator::lower(program)
}

/// Lex, parse and lower source text into a verified IR module.
pub fn compile_to_ir(source: &str) -> Result<ir::Module, CompileError> {
    let program = parse(source)?;
    compile_program(&program)
}

/// Compile source text directly to LLVM assembly text.
pub fn compile_to_llvm(source: &str) -> Result<String, CompileError> {
    Ok(compile_to_ir(source)?.to_string())
}
