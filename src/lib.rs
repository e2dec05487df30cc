//! A PL/0-derived teaching language: a lexer and parser for expressions, a
//! compiler to a compact bytecode chunk, and a stack virtual machine.
//!
//! ```text
//! source -> lexer -> parser -> Expr -> compiler -> Chunk -> Vm -> Value
//! ```

pub mod ast;
pub mod chunk;
pub mod compiler;
pub mod diagnostic;
pub mod disasm;
pub mod lexer;
pub mod parser;
pub mod value;
pub mod vm;
