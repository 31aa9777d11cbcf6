use std::fmt::Display;

use crate::Instruction;

/// Emitted VM program of one source unit.
#[derive(Debug, Default, Clone)]
pub struct Program {
    code: Vec<Instruction>,
    line: Vec<usize>,
}

impl Program {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn write(&mut self, instruction: Instruction, line: usize) {
        self.code.push(instruction);
        self.line.push(line);
    }

    pub fn instructions(&self) -> &[Instruction] {
        &self.code
    }

    pub fn line_number(&self, idx: usize) -> Option<usize> {
        self.line.get(idx).cloned()
    }

    pub fn size(&self) -> usize {
        self.code.len()
    }

    pub fn is_empty(&self) -> bool {
        self.code.is_empty()
    }
}

impl Display for Program {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        for instruction in &self.code {
            writeln!(f, "{instruction}")?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Segment;

    #[test]
    fn write_keeps_order_and_lines() {
        let mut program = Program::new();
        assert!(program.is_empty());
        program.write(Instruction::Push(Segment::Constant, 0), 3);
        program.write(Instruction::Return, 4);

        assert_eq!(program.size(), 2);
        assert_eq!(program.line_number(0), Some(3));
        assert_eq!(program.line_number(1), Some(4));
        assert_eq!(program.line_number(2), None);
        assert_eq!(program.instructions()[1], Instruction::Return);
    }

    #[test]
    fn renders_one_instruction_per_line() {
        let mut program = Program::new();
        program.write(Instruction::Function("T.get".to_string(), 0), 1);
        program.write(Instruction::Push(Segment::Constant, 0), 1);
        program.write(Instruction::Return, 1);
        assert_eq!(
            program.to_string(),
            "function T.get 0\npush constant 0\nreturn\n"
        );
    }
}
