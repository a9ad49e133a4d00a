//! Runtime intrinsics: C library functions declared (not defined) in every
//! module, plus the format strings used by the debug-print statements.

use crate::frontend::source::Position;
use crate::ir::error_utils::{symbol_error, SymbolKind};
use crate::ir::symbol_table::{ScopeTree, VariableInfo};
use crate::ir::{Callee, Function, Initializer, Module, Type};
use crate::CompileError;

/// `puts(i8*) -> i32`, used by OUTPUT.
pub const WRITE_LINE: &str = "puts";
/// `printf(i8*, ...) -> i32`, used by PrintfD/PrintfF.
pub const FORMATTED_PRINT: &str = "printf";
/// `getchar() -> i32`, used by INPUT.
pub const READ_CHAR: &str = "getchar";

pub const INT_FORMAT: &str = "printfd_fmt";
pub const REAL_FORMAT: &str = "printff_fmt";

fn intrinsics() -> Vec<Callee> {
    vec![
        Callee {
            name: WRITE_LINE.to_string(),
            ret: Type::i32(),
            params: vec![Type::i8_ptr()],
            variadic: false,
        },
        Callee {
            name: FORMATTED_PRINT.to_string(),
            ret: Type::i32(),
            params: vec![Type::i8_ptr()],
            variadic: true,
        },
        Callee {
            name: READ_CHAR.to_string(),
            ret: Type::i32(),
            params: Vec::new(),
            variadic: false,
        },
    ]
}

fn c_string(text: &str) -> Initializer {
    let mut bytes = text.as_bytes().to_vec();
    bytes.push(0);
    Initializer::Bytes(bytes)
}

/// Declare the intrinsics in `module` and bind them in the root scope.
pub fn install(module: &mut Module, scopes: &mut ScopeTree) -> Result<(), CompileError> {
    let root = scopes.root();
    let origin = Position::default();

    for callee in intrinsics() {
        let name = callee.name.clone();
        module.add_function(Function::declaration(callee.clone()));
        scopes
            .declare_function(root, &name, callee)
            .map_err(|e| symbol_error(e, origin, SymbolKind::Function))?;
    }

    for (name, text) in [(INT_FORMAT, "Int: %d\n"), (REAL_FORMAT, "Real: %f\n")] {
        let storage = module.add_global(name, c_string(text), true);
        scopes
            .declare_variable(
                root,
                name,
                VariableInfo {
                    storage,
                    declared_at: None,
                },
            )
            .map_err(|e| symbol_error(e, origin, SymbolKind::Variable))?;
    }

    tracing::debug!("runtime intrinsics installed");
    Ok(())
}

/// Initializer for a hoisted string literal.
pub fn string_literal(text: &str) -> Initializer {
    c_string(text)
}
