mod assembler;
mod scanner;
mod symbols;
mod token;
mod writer;

use std::rc::Rc;

pub use assembler::{Assembler, CompiledClass};
pub use scanner::{Scanner, TokenStream};
pub use symbols::{StorageClass, Symbol, SymbolError, SymbolTable};
pub use token::*;
pub use writer::CodeWriter;

use crate::errors::CompileResult;

/// Compiles one source unit into its class name and emitted program.
pub fn compile(code: Rc<Vec<char>>) -> CompileResult<CompiledClass> {
    let tokens = Scanner::new(code).scan_tokens()?;
    Assembler::new(tokens).compile()
}
