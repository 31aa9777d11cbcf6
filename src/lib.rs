use std::rc::Rc;

mod data;
pub use data::*;
pub mod driver;
mod errors;
pub use errors::*;
pub mod frontend;

/// Compiles one source unit to VM text, one instruction per line.
pub fn compile_source(source: &str) -> CompileResult<String> {
    let code = Rc::new(source.chars().collect::<Vec<_>>());
    let class = frontend::compile(code)?;
    Ok(class.program.to_string())
}
