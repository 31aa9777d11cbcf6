use std::rc::Rc;

use crate::{
    data::MAX_INTEGER_CONSTANT,
    errors::{CodePosition, CompileError, CompileResult},
};

use super::{Keyword, SYMBOLS, Token, TokenType};

pub struct Scanner {
    line: usize,
    code: Rc<Vec<char>>,
    code_start_idx: usize,
    code_current_idx: usize,
}

impl Scanner {
    pub fn new(code: Rc<Vec<char>>) -> Self {
        Self {
            line: 1,
            code,
            code_start_idx: 0,
            code_current_idx: 0,
        }
    }

    /// Tokenizes the whole source; the returned stream always ends with `Eof`.
    pub fn scan_tokens(mut self) -> CompileResult<TokenStream> {
        let mut tokens = Vec::new();
        loop {
            let token = self.scan_token()?;
            let is_eof = token.is_eof();
            tokens.push(token);
            if is_eof {
                break;
            }
        }
        Ok(TokenStream::new(tokens))
    }

    fn scan_token(&mut self) -> CompileResult<Token> {
        self.skip_non_code()?;
        self.code_start_idx = self.code_current_idx;

        let Some(ch) = self.advance_char() else {
            return Ok(Token::eof(self.code_position()));
        };

        match ch {
            x if SYMBOLS.contains(x) => Ok(self.make_token(TokenType::Symbol(x))),
            x if x.is_ascii_digit() => self.advance_number_token(),
            '"' => self.advance_string_token(),
            x if is_alphabetic(x) => Ok(self.advance_identifier()),
            x => Err(CompileError::lexical(
                self.code_position(),
                format!("Unexpected character '{x}'"),
            )),
        }
    }

    fn skip_non_code(&mut self) -> CompileResult<()> {
        while self.skip_whitespace() || self.skip_comment_line() || self.skip_comment_block()? {}
        Ok(())
    }

    fn skip_whitespace(&mut self) -> bool {
        let mut skipped = false;
        while let Some(ch) = self.peek_char() {
            if !ch.is_whitespace() {
                break;
            }
            self.advance_char();
            skipped = true;
        }
        skipped
    }

    fn skip_comment_line(&mut self) -> bool {
        if (Some('/'), Some('/')) != (self.peek_char(), self.peek_next_char()) {
            return false;
        }
        while let Some(ch) = self.peek_char() {
            if ch == '\n' {
                break;
            }
            self.advance_char();
        }
        true
    }

    fn skip_comment_block(&mut self) -> CompileResult<bool> {
        if (Some('/'), Some('*')) != (self.peek_char(), self.peek_next_char()) {
            return Ok(false);
        }
        self.code_start_idx = self.code_current_idx;
        let position = self.code_position();
        self.advance_char();
        self.advance_char();
        loop {
            match (self.peek_char(), self.peek_next_char()) {
                (Some('*'), Some('/')) => {
                    self.advance_char();
                    self.advance_char();
                    return Ok(true);
                }
                (Some(_), _) => {
                    self.advance_char();
                }
                (None, _) => {
                    return Err(CompileError::lexical(position, "Unterminated block comment"));
                }
            }
        }
    }

    fn peek_char(&self) -> Option<char> {
        self.code.get(self.code_current_idx).cloned()
    }

    fn peek_next_char(&self) -> Option<char> {
        self.code.get(self.code_current_idx + 1).cloned()
    }

    fn advance_char(&mut self) -> Option<char> {
        let ch = self.peek_char();
        if let Some(ch) = ch {
            self.code_current_idx += 1;
            if ch == '\n' {
                self.line += 1;
            }
        }
        ch
    }

    fn advance_identifier(&mut self) -> Token {
        while let Some(ch) = self.peek_char() {
            if !is_alphanumeric(ch) {
                break;
            }
            self.advance_char();
        }

        let value = self.current_lexeme();
        let t_type = match Keyword::lookup(&value) {
            Some(keyword) => TokenType::Keyword(keyword),
            None => TokenType::Identifier,
        };
        self.make_token(t_type)
    }

    fn current_lexeme(&self) -> String {
        self.code[self.code_start_idx..self.code_current_idx]
            .iter()
            .collect::<String>()
    }

    fn advance_string_token(&mut self) -> CompileResult<Token> {
        let position = self.code_position();
        loop {
            match self.peek_char() {
                Some('"') => break,
                Some('\n') | None => {
                    return Err(CompileError::lexical(position, "Unterminated string"));
                }
                Some(ch) if !ch.is_ascii() => {
                    let position = CodePosition {
                        line: self.line,
                        absolute_index: self.code_current_idx,
                    };
                    return Err(CompileError::lexical(
                        position,
                        format!("Unsupported character '{ch}' in string constant"),
                    ));
                }
                Some(_) => {
                    self.advance_char();
                }
            }
        }
        self.advance_char();
        let body = &self.code[self.code_start_idx + 1..self.code_current_idx - 1];
        let text = body.iter().collect::<String>();
        Ok(Token::new(TokenType::StringConstant, &text, position))
    }

    fn advance_number_token(&mut self) -> CompileResult<Token> {
        while let Some(ch) = self.peek_char() {
            if !ch.is_ascii_digit() {
                break;
            }
            self.advance_char();
        }

        let text = self.current_lexeme();
        match text.parse::<u16>() {
            Ok(value) if value <= MAX_INTEGER_CONSTANT => {
                Ok(self.make_token(TokenType::IntegerConstant(value)))
            }
            _ => Err(CompileError::lexical(
                self.code_position(),
                format!("Integer constant {text} exceeds {MAX_INTEGER_CONSTANT}"),
            )),
        }
    }

    fn make_token(&self, t_type: TokenType) -> Token {
        Token {
            t_type,
            text: self.current_lexeme(),
            position: self.code_position(),
        }
    }

    fn code_position(&self) -> CodePosition {
        CodePosition {
            line: self.line,
            absolute_index: self.code_start_idx,
        }
    }
}

fn is_alphabetic(ch: char) -> bool {
    ch == '_' || ch.is_ascii_alphabetic()
}

fn is_alphanumeric(ch: char) -> bool {
    ch == '_' || ch.is_ascii_alphanumeric()
}

/// Finished token sequence walked by the assembler, restartable by index.
pub struct TokenStream {
    tokens: Vec<Token>,
    cursor: usize,
}

impl TokenStream {
    pub fn new(mut tokens: Vec<Token>) -> Self {
        if !tokens.last().is_some_and(Token::is_eof) {
            let position = tokens.last().map(|t| t.position).unwrap_or_default();
            tokens.push(Token::eof(position));
        }
        Self { tokens, cursor: 0 }
    }

    /// Returns the next token; keeps returning `Eof` once exhausted.
    pub fn next_token(&mut self) -> Token {
        let idx = self.cursor.min(self.tokens.len() - 1);
        if self.cursor < self.tokens.len() {
            self.cursor += 1;
        }
        self.tokens[idx].clone()
    }

    pub fn position(&self) -> usize {
        self.cursor
    }

    pub fn rewind(&mut self) {
        self.cursor = 0;
    }

    pub fn len(&self) -> usize {
        self.tokens.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tokens.len() == 1
    }

    pub fn tokens(&self) -> &[Token] {
        &self.tokens
    }
}
