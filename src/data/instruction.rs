use std::fmt::Display;

/// Memory segments of the target stack machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Segment {
    Constant,
    Argument,
    Local,
    Static,
    This,
    That,
    Pointer,
    Temp,
}

impl Segment {
    pub fn name(&self) -> &'static str {
        match self {
            Segment::Constant => "constant",
            Segment::Argument => "argument",
            Segment::Local => "local",
            Segment::Static => "static",
            Segment::This => "this",
            Segment::That => "that",
            Segment::Pointer => "pointer",
            Segment::Temp => "temp",
        }
    }
}

impl Display for Segment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Arithmetic {
    Add,
    Sub,
    Neg,
    Eq,
    Gt,
    Lt,
    And,
    Or,
    Not,
}

impl Arithmetic {
    pub fn mnemonic(&self) -> &'static str {
        match self {
            Arithmetic::Add => "add",
            Arithmetic::Sub => "sub",
            Arithmetic::Neg => "neg",
            Arithmetic::Eq => "eq",
            Arithmetic::Gt => "gt",
            Arithmetic::Lt => "lt",
            Arithmetic::And => "and",
            Arithmetic::Or => "or",
            Arithmetic::Not => "not",
        }
    }

    /// Unary operators consume one stack slot, all others consume two.
    pub fn is_unary(&self) -> bool {
        matches!(self, Arithmetic::Neg | Arithmetic::Not)
    }
}

#[derive(Debug, PartialEq, Eq, Clone)]
pub enum Instruction {
    Push(Segment, usize),
    Pop(Segment, usize),
    Arithmetic(Arithmetic),
    Label(String),
    Goto(String),
    IfGoto(String),
    Function(String, usize),
    Call(String, usize),
    Return,
}

impl Instruction {
    /// Net change of the operand stack depth, ignoring the callee frame.
    pub fn stack_effect(&self) -> isize {
        match self {
            Instruction::Push(_, _) => 1,
            Instruction::Pop(_, _) | Instruction::IfGoto(_) => -1,
            Instruction::Arithmetic(op) if op.is_unary() => 0,
            Instruction::Arithmetic(_) => -1,
            Instruction::Call(_, args) => 1 - *args as isize,
            Instruction::Return => -1,
            Instruction::Label(_) | Instruction::Goto(_) | Instruction::Function(_, _) => 0,
        }
    }
}

impl Display for Instruction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Instruction::Push(segment, index) => write!(f, "push {segment} {index}"),
            Instruction::Pop(segment, index) => write!(f, "pop {segment} {index}"),
            Instruction::Arithmetic(op) => write!(f, "{}", op.mnemonic()),
            Instruction::Label(name) => write!(f, "label {name}"),
            Instruction::Goto(name) => write!(f, "goto {name}"),
            Instruction::IfGoto(name) => write!(f, "if-goto {name}"),
            Instruction::Function(name, locals) => write!(f, "function {name} {locals}"),
            Instruction::Call(name, args) => write!(f, "call {name} {args}"),
            Instruction::Return => write!(f, "return"),
        }
    }
}
