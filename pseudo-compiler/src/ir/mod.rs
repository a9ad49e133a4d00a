//! Intermediate Representation (IR) module.
//!
//! This module contains the AST, the IR definitions, the scope tree,
//! the runtime intrinsics and the AST-to-IR generator.

pub mod ir;
pub use ir::*;
pub mod ast;
pub mod error_utils;
pub mod ir_generator;
pub mod runtime;
pub mod symbol_table;
