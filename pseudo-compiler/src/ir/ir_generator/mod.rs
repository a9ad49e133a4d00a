//! AST to IR lowering module.
//!
//! This module handles the translation of the parsed program into
//! a basic-block IR module with a single `main` function.

pub mod context;
pub mod expr;
pub mod stmt;

use crate::ir::ast::Program;
use crate::ir::Module;
use crate::CompileError;

/// The main Gen struct that orchestrates the lowering process.
pub use context::Gen;

/// Entry point for lowering an AST Program to an IR Module.
pub fn lower(program: &Program) -> Result<Module, CompileError> {
    let mut g = Gen::new()?;
    g.lower_program(program)?;
    g.finish()
}
