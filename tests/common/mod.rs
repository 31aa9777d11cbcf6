#![allow(dead_code)]

extern crate jack_bytecode;

use jack_bytecode::{CompileError, Instruction, compile_source, frontend};

pub fn str_to_code_ref(input: &str) -> std::rc::Rc<Vec<char>> {
    std::rc::Rc::new(input.chars().collect())
}

pub fn compile_lines(input: &str) -> Vec<String> {
    let text = compile_source(input).expect("Failed to compile");
    text.lines().map(str::to_string).collect()
}

pub fn compile_instructions(input: &str) -> Vec<Instruction> {
    let class = frontend::compile(str_to_code_ref(input)).expect("Failed to compile");
    class.program.instructions().to_vec()
}

pub fn compile_error(input: &str) -> CompileError {
    match compile_source(input) {
        Ok(text) => panic!("Unexpected success:\n{text}"),
        Err(err) => err,
    }
}

/// Wraps statements into `Main.main` with locals `a`, `b` and `arr`.
pub fn main_with(statements: &str) -> String {
    format!(
        r#"
class Main {{
    function void main() {{
        var int a, b;
        var Array arr;
        {statements}
        return;
    }}
}}
"#
    )
}

pub fn assert_contains_sequence(lines: &[String], expected: &[&str]) {
    let found = lines
        .windows(expected.len())
        .any(|window| window.iter().zip(expected).all(|(a, b)| a == b));
    assert!(found, "{expected:#?} not found in {lines:#?}");
}
