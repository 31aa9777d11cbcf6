use std::{fmt::Display, rc::Rc};

use crate::frontend::Token;

pub type CompileResult<T> = Result<T, CompileError>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Lexical,
    Syntax,
    Resolution,
    Structural,
}

impl Display for ErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let text = match self {
            ErrorKind::Lexical => "Lexical",
            ErrorKind::Syntax => "Syntax",
            ErrorKind::Resolution => "Resolution",
            ErrorKind::Structural => "Structural",
        };
        write!(f, "{text}")
    }
}

#[derive(thiserror::Error, Debug, Clone, PartialEq)]
#[error("[line {}] {kind} error: {message}", .position.line)]
pub struct CompileError {
    kind: ErrorKind,
    position: CodePosition,
    message: String,
}

impl CompileError {
    pub fn new<T: Into<String>>(kind: ErrorKind, position: CodePosition, message: T) -> Self {
        Self {
            kind,
            position,
            message: message.into(),
        }
    }

    pub fn lexical<T: Into<String>>(position: CodePosition, message: T) -> Self {
        Self::new(ErrorKind::Lexical, position, message)
    }

    pub fn resolution<T: Into<String>>(token: &Token, message: T) -> Self {
        Self::new(ErrorKind::Resolution, token.position, message)
    }

    pub fn structural<T: Into<String>>(token: &Token, message: T) -> Self {
        Self::new(ErrorKind::Structural, token.position, message)
    }

    /// Syntax error reported against the offending token.
    pub fn unexpected(token: &Token, expected: &str) -> Self {
        let message = format!("Expect {expected}, found {}", token.describe());
        Self::new(ErrorKind::Syntax, token.position, message)
    }

    pub fn kind(&self) -> ErrorKind {
        self.kind
    }

    pub fn position(&self) -> CodePosition {
        self.position
    }

    pub fn message(&self) -> &str {
        self.message.as_str()
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CodePosition {
    pub line: usize,
    pub absolute_index: usize,
}

pub struct ErrorFormatter {
    code: Rc<Vec<char>>,
}

impl ErrorFormatter {
    pub fn with(code: Rc<Vec<char>>) -> Self {
        Self { code }
    }

    pub fn format_error(&self, error: &CompileError) -> String {
        let p = error.position();
        let message = format!("{} error: {}", error.kind(), error.message());
        if self.code.is_empty() || p.line == 0 {
            return message;
        }

        let mut lines: Vec<String> = Vec::new();
        let (offset, code_line) = self.extract_line(&p);
        let prefix = format!("{} |", p.line);
        lines.push(format!("{}{}", prefix, code_line));

        let arrow_idx = prefix.chars().count() + offset;
        let fill = " ".repeat(arrow_idx);
        lines.push(format!("{fill}▲"));
        lines.push(format!("{fill}└─ {message}"));

        lines.join("\n")
    }

    fn extract_line(&self, position: &CodePosition) -> (usize, String) {
        let len = self.code.len();
        let index = position.absolute_index.min(len);
        let is_terminator = |ch: char| -> bool { ch == '\n' || ch == '\r' };

        let mut left = index;
        while left > 0 && !is_terminator(self.code[left - 1]) {
            left -= 1;
        }
        let mut right = index;
        while right < len && !is_terminator(self.code[right]) {
            right += 1;
        }

        (
            index - left,
            self.code[left..right].iter().collect::<String>(),
        )
    }
}
