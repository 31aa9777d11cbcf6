use crate::{Arithmetic, Instruction, Program, Segment};

/// Append-only sink for emitted instructions. No validation is done here.
#[derive(Default)]
pub struct CodeWriter {
    program: Program,
}

impl CodeWriter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, segment: Segment, index: usize, line: usize) {
        self.write(Instruction::Push(segment, index), line);
    }

    pub fn pop(&mut self, segment: Segment, index: usize, line: usize) {
        self.write(Instruction::Pop(segment, index), line);
    }

    pub fn arithmetic(&mut self, op: Arithmetic, line: usize) {
        self.write(Instruction::Arithmetic(op), line);
    }

    pub fn label(&mut self, name: &str, line: usize) {
        self.write(Instruction::Label(name.to_string()), line);
    }

    pub fn goto(&mut self, name: &str, line: usize) {
        self.write(Instruction::Goto(name.to_string()), line);
    }

    pub fn if_goto(&mut self, name: &str, line: usize) {
        self.write(Instruction::IfGoto(name.to_string()), line);
    }

    pub fn call(&mut self, name: &str, args: usize, line: usize) {
        self.write(Instruction::Call(name.to_string(), args), line);
    }

    pub fn function(&mut self, name: &str, locals: usize, line: usize) {
        self.write(Instruction::Function(name.to_string(), locals), line);
    }

    pub fn ret(&mut self, line: usize) {
        self.write(Instruction::Return, line);
    }

    pub fn size(&self) -> usize {
        self.program.size()
    }

    pub fn finish(self) -> Program {
        self.program
    }

    fn write(&mut self, instruction: Instruction, line: usize) {
        self.program.write(instruction, line);
    }
}
