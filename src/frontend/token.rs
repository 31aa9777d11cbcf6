use std::fmt::Display;

use crate::errors::CodePosition;

#[derive(Debug, Clone, PartialEq)]
pub struct Token {
    pub t_type: TokenType,
    pub text: String,
    pub position: CodePosition,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenType {
    Keyword(Keyword),
    Symbol(char),
    IntegerConstant(u16),
    /// Lexeme holds the string body without quotes.
    StringConstant,
    Identifier,
    Eof,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Keyword {
    Class,
    Constructor,
    Function,
    Method,
    Field,
    Static,
    Var,
    Int,
    Char,
    Boolean,
    Void,
    True,
    False,
    Null,
    This,
    Let,
    Do,
    If,
    Else,
    While,
    Return,
}

/// Characters recognized as symbol tokens.
pub const SYMBOLS: &str = "{}()[].,;+-*/&|<>=~";

impl Keyword {
    pub fn lookup(text: &str) -> Option<Self> {
        use Keyword::*;
        let keyword = match text {
            "class" => Class,
            "constructor" => Constructor,
            "function" => Function,
            "method" => Method,
            "field" => Field,
            "static" => Static,
            "var" => Var,
            "int" => Int,
            "char" => Char,
            "boolean" => Boolean,
            "void" => Void,
            "true" => True,
            "false" => False,
            "null" => Null,
            "this" => This,
            "let" => Let,
            "do" => Do,
            "if" => If,
            "else" => Else,
            "while" => While,
            "return" => Return,
            _ => return None,
        };
        Some(keyword)
    }

    pub fn text(&self) -> &'static str {
        use Keyword::*;
        match self {
            Class => "class",
            Constructor => "constructor",
            Function => "function",
            Method => "method",
            Field => "field",
            Static => "static",
            Var => "var",
            Int => "int",
            Char => "char",
            Boolean => "boolean",
            Void => "void",
            True => "true",
            False => "false",
            Null => "null",
            This => "this",
            Let => "let",
            Do => "do",
            If => "if",
            Else => "else",
            While => "while",
            Return => "return",
        }
    }
}

impl Display for Keyword {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.text())
    }
}

impl Token {
    pub fn new(t_type: TokenType, text: &str, position: CodePosition) -> Self {
        Self {
            t_type,
            text: text.to_string(),
            position,
        }
    }

    pub fn eof(position: CodePosition) -> Self {
        Self::new(TokenType::Eof, "", position)
    }

    pub fn is_keyword(&self, keyword: Keyword) -> bool {
        self.t_type == TokenType::Keyword(keyword)
    }

    pub fn is_symbol(&self, symbol: char) -> bool {
        self.t_type == TokenType::Symbol(symbol)
    }

    pub fn is_identifier(&self) -> bool {
        matches!(self.t_type, TokenType::Identifier)
    }

    pub fn is_eof(&self) -> bool {
        matches!(self.t_type, TokenType::Eof)
    }

    /// Human readable form used by diagnostics.
    pub fn describe(&self) -> String {
        match self.t_type {
            TokenType::Keyword(k) => format!("keyword '{k}'"),
            TokenType::Symbol(s) => format!("symbol '{s}'"),
            TokenType::IntegerConstant(n) => format!("integer constant {n}"),
            TokenType::StringConstant => format!("string constant \"{}\"", self.text),
            TokenType::Identifier => format!("identifier '{}'", self.text),
            TokenType::Eof => "end of input".to_string(),
        }
    }
}
