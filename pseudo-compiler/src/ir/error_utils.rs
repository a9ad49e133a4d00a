use crate::frontend::source::Position;
use crate::ir::symbol_table::SymbolError;
use crate::ir::Type;
use crate::{CompileError, ResolutionErrorKind};

/// Helper to create resolution errors at a source position
pub fn make_resolution_error(
    kind: ResolutionErrorKind,
    pos: Position,
    message: String,
) -> CompileError {
    CompileError::Resolution {
        kind,
        line: pos.line,
        col: pos.column,
        message,
    }
}

pub fn make_type_error(pos: Position, message: String) -> CompileError {
    CompileError::Type {
        line: pos.line,
        col: pos.column,
        message,
    }
}

/// Error for a value whose type has no lowering in the given context.
pub fn unsupported_type(pos: Position, what: &str, ty: &Type) -> CompileError {
    make_type_error(pos, format!("{} is not defined for values of type {}", what, ty))
}

/// Which namespace a failed declaration targeted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SymbolKind {
    Variable,
    Function,
}

impl SymbolKind {
    fn noun(self) -> &'static str {
        match self {
            SymbolKind::Variable => "Variable",
            SymbolKind::Function => "Function",
        }
    }
}

/// Map a scope-table failure to the user-facing error.
pub fn symbol_error(err: SymbolError, pos: Position, kind: SymbolKind) -> CompileError {
    match err {
        SymbolError::Redefinition { name, previous } => {
            let resolution = match kind {
                SymbolKind::Variable => ResolutionErrorKind::VariableRedefinition,
                SymbolKind::Function => ResolutionErrorKind::FunctionRedefinition,
            };
            let origin = match previous {
                Some(at) => format!("previously declared at {}", at),
                None => "reserved by the runtime".to_string(),
            };
            make_resolution_error(
                resolution,
                pos,
                format!(
                    "{} '{}' is already defined in this scope ({})",
                    kind.noun(),
                    name,
                    origin
                ),
            )
        }
        SymbolError::NotRootScope(name) => make_resolution_error(
            ResolutionErrorKind::FunctionOutsideRoot,
            pos,
            format!("Function '{}' can only be declared at the top level", name),
        ),
        SymbolError::UnknownScope => make_resolution_error(
            ResolutionErrorKind::UndefinedVariable,
            pos,
            format!(
                "Cannot declare {} in a scope that no longer exists",
                kind.noun().to_lowercase()
            ),
        ),
    }
}
