mod instruction;
mod program;

pub use instruction::*;
pub use program::Program;

/// Largest integer constant the target machine accepts.
pub const MAX_INTEGER_CONSTANT: u16 = 32767;
