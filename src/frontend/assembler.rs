use tracing::{debug, trace};

use crate::{
    Arithmetic, Program, Segment,
    errors::{CompileError, CompileResult},
    frontend::{
        Keyword, Token, TokenType,
        scanner::TokenStream,
        symbols::{StorageClass, SymbolTable},
        writer::CodeWriter,
    },
};

/// Result of compiling one source unit.
#[derive(Debug, Clone)]
pub struct CompiledClass {
    pub name: String,
    pub program: Program,
}

pub struct Assembler {
    current: Token,
    previous: Token,
    tokens: TokenStream,
    symbols: SymbolTable,
    writer: CodeWriter,
    class_name: String,
    label_counter: usize,
}

impl Assembler {
    pub fn new(tokens: TokenStream) -> Self {
        Self {
            current: Token::eof(Default::default()),
            previous: Token::eof(Default::default()),
            tokens,
            symbols: SymbolTable::new(),
            writer: CodeWriter::new(),
            class_name: String::new(),
            label_counter: 0,
        }
    }

    /// Compiles exactly one class; stops at the first error.
    pub fn compile(mut self) -> CompileResult<CompiledClass> {
        self.advance();
        self.class_declaration()?;
        if !self.current.is_eof() {
            return Err(CompileError::unexpected(
                &self.current,
                "end of input after class body",
            ));
        }
        Ok(CompiledClass {
            name: self.class_name,
            program: self.writer.finish(),
        })
    }

    fn advance(&mut self) {
        let next = self.tokens.next_token();
        self.previous = std::mem::replace(&mut self.current, next);
    }

    fn check_symbol(&self, symbol: char) -> bool {
        self.current.is_symbol(symbol)
    }

    fn check_keyword(&self, keyword: Keyword) -> bool {
        self.current.is_keyword(keyword)
    }

    fn is_match_symbol(&mut self, symbol: char) -> bool {
        if !self.check_symbol(symbol) {
            return false;
        }
        self.advance();
        true
    }

    fn consume_symbol(&mut self, symbol: char) -> CompileResult<()> {
        if self.is_match_symbol(symbol) {
            return Ok(());
        }
        Err(CompileError::unexpected(
            &self.current,
            &format!("'{symbol}'"),
        ))
    }

    fn consume_keyword(&mut self, keyword: Keyword) -> CompileResult<()> {
        if self.check_keyword(keyword) {
            self.advance();
            return Ok(());
        }
        Err(CompileError::unexpected(
            &self.current,
            &format!("'{keyword}'"),
        ))
    }

    fn consume_identifier(&mut self, what: &str) -> CompileResult<Token> {
        if !self.current.is_identifier() {
            return Err(CompileError::unexpected(&self.current, what));
        }
        self.advance();
        Ok(self.previous.clone())
    }

    fn line(&self) -> usize {
        self.previous.position.line
    }

    fn next_label_index(&mut self) -> usize {
        let index = self.label_counter;
        self.label_counter += 1;
        index
    }
}

/// Declarations
impl Assembler {
    fn class_declaration(&mut self) -> CompileResult<()> {
        self.consume_keyword(Keyword::Class)?;
        let name = self.consume_identifier("class name")?;
        self.class_name = name.text.clone();
        self.consume_symbol('{')?;

        while self.check_keyword(Keyword::Static) || self.check_keyword(Keyword::Field) {
            self.class_var_declaration()?;
        }
        while self.check_keyword(Keyword::Constructor)
            || self.check_keyword(Keyword::Function)
            || self.check_keyword(Keyword::Method)
        {
            self.subroutine_declaration()?;
        }
        self.consume_symbol('}')?;

        debug!(
            class = %self.class_name,
            statics = self.symbols.count(StorageClass::Static),
            fields = self.symbols.count(StorageClass::Field),
            instructions = self.writer.size(),
            "Compiled class"
        );
        Ok(())
    }

    fn class_var_declaration(&mut self) -> CompileResult<()> {
        self.advance();
        let kind = if self.previous.is_keyword(Keyword::Static) {
            StorageClass::Static
        } else {
            StorageClass::Field
        };
        self.variable_names(kind)
    }

    fn var_declaration(&mut self) -> CompileResult<()> {
        self.consume_keyword(Keyword::Var)?;
        self.variable_names(StorageClass::Local)
    }

    /// `type varName (',' varName)* ';'`
    fn variable_names(&mut self, kind: StorageClass) -> CompileResult<()> {
        let type_name = self.parse_type(false)?;
        loop {
            let name = self.consume_identifier("variable name")?;
            self.define_symbol(&name, &type_name, kind)?;
            if !self.is_match_symbol(',') {
                break;
            }
        }
        self.consume_symbol(';')
    }

    fn parse_type(&mut self, allow_void: bool) -> CompileResult<String> {
        let is_type = match self.current.t_type {
            TokenType::Keyword(Keyword::Int | Keyword::Char | Keyword::Boolean) => true,
            TokenType::Keyword(Keyword::Void) => allow_void,
            TokenType::Identifier => true,
            _ => false,
        };
        if !is_type {
            let expected = if allow_void { "return type" } else { "type" };
            return Err(CompileError::unexpected(&self.current, expected));
        }
        self.advance();
        Ok(self.previous.text.clone())
    }

    fn define_symbol(
        &mut self,
        name: &Token,
        type_name: &str,
        kind: StorageClass,
    ) -> CompileResult<usize> {
        self.symbols
            .define(&name.text, type_name, kind)
            .map_err(|err| CompileError::resolution(name, err.to_string()))
    }

    fn verify_layout(&self) -> CompileResult<()> {
        self.symbols
            .verify_layout()
            .map_err(|err| CompileError::structural(&self.previous, err.to_string()))
    }

    fn subroutine_declaration(&mut self) -> CompileResult<()> {
        self.advance();
        let subroutine_kind = match self.previous.t_type {
            TokenType::Keyword(keyword) => keyword,
            _ => unreachable!("subroutine keyword already checked"),
        };
        self.symbols.start_subroutine();
        if subroutine_kind == Keyword::Method {
            let receiver = Token::new(TokenType::Identifier, "this", self.previous.position);
            let class_name = self.class_name.clone();
            self.define_symbol(&receiver, &class_name, StorageClass::Argument)?;
        }

        self.parse_type(true)?;
        let name = self.consume_identifier("subroutine name")?;
        self.consume_symbol('(')?;
        self.parameter_list()?;
        self.consume_symbol(')')?;

        self.consume_symbol('{')?;
        while self.check_keyword(Keyword::Var) {
            self.var_declaration()?;
        }

        let qualified = format!("{}.{}", self.class_name, name.text);
        let locals = self.symbols.count(StorageClass::Local);
        let line = name.position.line;
        self.writer.function(&qualified, locals, line);
        match subroutine_kind {
            Keyword::Constructor => {
                let fields = self.symbols.count(StorageClass::Field);
                self.writer.push(Segment::Constant, fields, line);
                self.writer.call("Memory.alloc", 1, line);
                self.writer.pop(Segment::Pointer, 0, line);
            }
            Keyword::Method => {
                self.writer.push(Segment::Argument, 0, line);
                self.writer.pop(Segment::Pointer, 0, line);
            }
            _ => {}
        }

        self.statements()?;
        self.consume_symbol('}')?;
        self.verify_layout()?;

        debug!(
            subroutine = %qualified,
            kind = %subroutine_kind,
            arguments = self.symbols.count(StorageClass::Argument),
            locals,
            "Compiled subroutine"
        );
        Ok(())
    }

    fn parameter_list(&mut self) -> CompileResult<()> {
        if self.check_symbol(')') {
            return Ok(());
        }
        loop {
            let type_name = self.parse_type(false)?;
            let name = self.consume_identifier("parameter name")?;
            self.define_symbol(&name, &type_name, StorageClass::Argument)?;
            if !self.is_match_symbol(',') {
                break;
            }
        }
        Ok(())
    }
}

/// Statements
impl Assembler {
    fn statements(&mut self) -> CompileResult<()> {
        loop {
            match self.current.t_type {
                TokenType::Keyword(Keyword::Let) => self.let_statement()?,
                TokenType::Keyword(Keyword::If) => self.if_statement()?,
                TokenType::Keyword(Keyword::While) => self.while_statement()?,
                TokenType::Keyword(Keyword::Do) => self.do_statement()?,
                TokenType::Keyword(Keyword::Return) => self.return_statement()?,
                _ => return Ok(()),
            }
        }
    }

    fn let_statement(&mut self) -> CompileResult<()> {
        self.consume_keyword(Keyword::Let)?;
        let name = self.consume_identifier("variable name")?;
        let (segment, index) = self.resolve_variable(&name)?;

        if self.is_match_symbol('[') {
            self.writer.push(segment, index, name.position.line);
            self.expression()?;
            self.consume_symbol(']')?;
            self.writer.arithmetic(Arithmetic::Add, self.line());
            self.consume_symbol('=')?;
            self.expression()?;
            self.consume_symbol(';')?;
            let line = self.line();
            self.writer.pop(Segment::Temp, 0, line);
            self.writer.pop(Segment::Pointer, 1, line);
            self.writer.push(Segment::Temp, 0, line);
            self.writer.pop(Segment::That, 0, line);
        } else {
            self.consume_symbol('=')?;
            self.expression()?;
            self.consume_symbol(';')?;
            self.writer.pop(segment, index, self.line());
        }
        Ok(())
    }

    fn while_statement(&mut self) -> CompileResult<()> {
        self.consume_keyword(Keyword::While)?;
        let index = self.next_label_index();
        let top = format!("WHILE_EXP{index}");
        let end = format!("WHILE_END{index}");

        self.writer.label(&top, self.line());
        self.consume_symbol('(')?;
        self.expression()?;
        self.consume_symbol(')')?;
        self.writer.arithmetic(Arithmetic::Not, self.line());
        self.writer.if_goto(&end, self.line());

        self.block()?;
        self.writer.goto(&top, self.line());
        self.writer.label(&end, self.line());
        Ok(())
    }

    fn if_statement(&mut self) -> CompileResult<()> {
        self.consume_keyword(Keyword::If)?;
        let index = self.next_label_index();
        let on_false = format!("IF_FALSE{index}");
        let end = format!("IF_END{index}");

        self.consume_symbol('(')?;
        self.expression()?;
        self.consume_symbol(')')?;
        self.writer.arithmetic(Arithmetic::Not, self.line());
        self.writer.if_goto(&on_false, self.line());

        self.block()?;
        self.writer.goto(&end, self.line());
        self.writer.label(&on_false, self.line());
        if self.check_keyword(Keyword::Else) {
            self.advance();
            self.block()?;
        }
        self.writer.label(&end, self.line());
        Ok(())
    }

    /// `'{' statements '}'`
    fn block(&mut self) -> CompileResult<()> {
        self.consume_symbol('{')?;
        self.statements()?;
        self.consume_symbol('}')
    }

    fn do_statement(&mut self) -> CompileResult<()> {
        self.consume_keyword(Keyword::Do)?;
        let name = self.consume_identifier("subroutine name")?;
        self.subroutine_call(name)?;
        self.consume_symbol(';')?;
        self.writer.pop(Segment::Temp, 0, self.line());
        Ok(())
    }

    fn return_statement(&mut self) -> CompileResult<()> {
        self.consume_keyword(Keyword::Return)?;
        if self.check_symbol(';') {
            self.writer.push(Segment::Constant, 0, self.line());
        } else {
            self.expression()?;
        }
        self.consume_symbol(';')?;
        self.writer.ret(self.line());
        Ok(())
    }
}

/// Expressions
impl Assembler {
    /// Operators apply strictly left to right.
    fn expression(&mut self) -> CompileResult<()> {
        self.term()?;
        while let TokenType::Symbol(op) = self.current.t_type
            && "+-*/&|<>=".contains(op)
        {
            self.advance();
            self.term()?;
            let line = self.line();
            match op {
                '+' => self.writer.arithmetic(Arithmetic::Add, line),
                '-' => self.writer.arithmetic(Arithmetic::Sub, line),
                '*' => self.writer.call("Math.multiply", 2, line),
                '/' => self.writer.call("Math.divide", 2, line),
                '&' => self.writer.arithmetic(Arithmetic::And, line),
                '|' => self.writer.arithmetic(Arithmetic::Or, line),
                '<' => self.writer.arithmetic(Arithmetic::Lt, line),
                '>' => self.writer.arithmetic(Arithmetic::Gt, line),
                '=' => self.writer.arithmetic(Arithmetic::Eq, line),
                x => unreachable!("Unexpected binary operator {x}"),
            }
        }
        Ok(())
    }

    fn term(&mut self) -> CompileResult<()> {
        let line = self.current.position.line;
        match self.current.t_type {
            TokenType::IntegerConstant(value) => {
                self.advance();
                self.writer.push(Segment::Constant, value as usize, line);
            }
            TokenType::StringConstant => {
                self.advance();
                self.string(line);
            }
            TokenType::Keyword(Keyword::True) => {
                self.advance();
                self.writer.push(Segment::Constant, 0, line);
                self.writer.arithmetic(Arithmetic::Not, line);
            }
            TokenType::Keyword(Keyword::False | Keyword::Null) => {
                self.advance();
                self.writer.push(Segment::Constant, 0, line);
            }
            TokenType::Keyword(Keyword::This) => {
                self.advance();
                self.writer.push(Segment::Pointer, 0, line);
            }
            TokenType::Identifier => {
                self.advance();
                let name = self.previous.clone();
                self.identifier_term(name)?;
            }
            TokenType::Symbol('(') => {
                self.advance();
                self.expression()?;
                self.consume_symbol(')')?;
            }
            TokenType::Symbol(op @ ('-' | '~')) => {
                self.advance();
                self.term()?;
                let unary = if op == '-' {
                    Arithmetic::Neg
                } else {
                    Arithmetic::Not
                };
                self.writer.arithmetic(unary, self.line());
            }
            _ => return Err(CompileError::unexpected(&self.current, "expression")),
        }
        Ok(())
    }

    fn string(&mut self, line: usize) {
        let text = self.previous.text.clone();
        self.writer
            .push(Segment::Constant, text.chars().count(), line);
        self.writer.call("String.new", 1, line);
        for ch in text.chars() {
            self.writer.push(Segment::Constant, ch as usize, line);
            self.writer.call("String.appendChar", 2, line);
        }
    }

    /// Decided by the token following the identifier.
    fn identifier_term(&mut self, name: Token) -> CompileResult<()> {
        if self.check_symbol('(') || self.check_symbol('.') {
            return self.subroutine_call(name);
        }
        let (segment, index) = self.resolve_variable(&name)?;
        let line = name.position.line;
        self.writer.push(segment, index, line);
        if self.is_match_symbol('[') {
            self.expression()?;
            self.consume_symbol(']')?;
            let line = self.line();
            self.writer.arithmetic(Arithmetic::Add, line);
            self.writer.pop(Segment::Pointer, 1, line);
            self.writer.push(Segment::That, 0, line);
        }
        Ok(())
    }

    fn resolve_variable(&self, name: &Token) -> CompileResult<(Segment, usize)> {
        let Some(symbol) = self.symbols.lookup(&name.text) else {
            return Err(CompileError::resolution(
                name,
                format!("Undefined variable '{}'", name.text),
            ));
        };
        Ok((symbol.kind.segment(), symbol.index))
    }

    /// `name` is already consumed; the current token is `(` or `.`.
    fn subroutine_call(&mut self, name: Token) -> CompileResult<()> {
        let line = name.position.line;
        let (qualified, receiver) = if self.is_match_symbol('.') {
            let method = self.consume_identifier("subroutine name")?;
            match self.symbols.lookup(&name.text) {
                Some(symbol) => {
                    let segment = symbol.kind.segment();
                    let index = symbol.index;
                    let qualified = format!("{}.{}", symbol.type_name, method.text);
                    self.writer.push(segment, index, line);
                    (qualified, 1)
                }
                None => (format!("{}.{}", name.text, method.text), 0),
            }
        } else {
            self.writer.push(Segment::Pointer, 0, line);
            (format!("{}.{}", self.class_name, name.text), 1)
        };

        self.consume_symbol('(')?;
        let arguments = self.expression_list()?;
        self.consume_symbol(')')?;
        trace!(callee = %qualified, arguments = receiver + arguments, "Call");
        self.writer.call(&qualified, receiver + arguments, self.line());
        Ok(())
    }

    fn expression_list(&mut self) -> CompileResult<usize> {
        let mut count = 0;
        if self.check_symbol(')') {
            return Ok(count);
        }
        loop {
            self.expression()?;
            count += 1;
            if !self.is_match_symbol(',') {
                break;
            }
        }
        Ok(count)
    }
}
