use crate::common::*;
mod common;

#[test]
fn function_round_trip_test() {
    let lines = compile_lines("class T { field int x; function int get() { return 0; } }");
    assert_eq!(lines, ["function T.get 0", "push constant 0", "return"]);
}

#[test]
fn constructor_test() {
    let src = r#"
class Point {
    field int x, y;
    static int count;

    constructor Point new(int ax, int ay) {
        let x = ax;
        let y = ay;
        let count = count + 1;
        return this;
    }
}
"#;
    let lines = compile_lines(src);
    let expected = [
        "function Point.new 0",
        "push constant 2",
        "call Memory.alloc 1",
        "pop pointer 0",
        "push argument 0",
        "pop this 0",
        "push argument 1",
        "pop this 1",
        "push static 0",
        "push constant 1",
        "add",
        "pop static 0",
        "push pointer 0",
        "return",
    ];
    assert_eq!(lines, expected);
}

#[test]
fn method_test() {
    let src = r#"
class Point {
    field int x, y;

    method int distance(Point other) {
        var int dx;
        let dx = x - other.getX();
        return dx;
    }

    method int getX() {
        return x;
    }
}
"#;
    let lines = compile_lines(src);
    let expected = [
        "function Point.distance 1",
        "push argument 0",
        "pop pointer 0",
        "push this 0",
        "push argument 1",
        "call Point.getX 1",
        "sub",
        "pop local 0",
        "push local 0",
        "return",
        "function Point.getX 0",
        "push argument 0",
        "pop pointer 0",
        "push this 0",
        "return",
    ];
    assert_eq!(lines, expected);
}

#[test]
fn implicit_receiver_call_test() {
    let src = r#"
class Counter {
    field int value;

    method void bump() {
        do add(1);
        return;
    }

    method void add(int n) {
        let value = value + n;
        return;
    }
}
"#;
    let lines = compile_lines(src);
    assert_contains_sequence(
        &lines,
        &[
            "push pointer 0",
            "push constant 1",
            "call Counter.add 2",
            "pop temp 0",
        ],
    );
    // `n` follows the receiver in argument slots
    assert_contains_sequence(&lines, &["push this 0", "push argument 1", "add", "pop this 0"]);
}

#[test]
fn field_count_spans_declarations_test() {
    let src = r#"
class Big {
    field int a;
    static int s;
    field boolean b, c;
    field Array d;

    constructor Big new() {
        return this;
    }
}
"#;
    let lines = compile_lines(src);
    assert_eq!(&lines[..3], ["function Big.new 0", "push constant 4", "call Memory.alloc 1"]);
}

#[test]
fn subroutine_scope_resets_test() {
    let src = r#"
class Main {
    function void first(int p) {
        var int a, b;
        let b = p;
        return;
    }

    function void second() {
        var char c;
        let c = 1;
        return;
    }
}
"#;
    let lines = compile_lines(src);
    assert!(lines.contains(&"function Main.first 2".to_string()));
    assert!(lines.contains(&"function Main.second 1".to_string()));
    assert_contains_sequence(&lines, &["push argument 0", "pop local 1"]);
    assert_contains_sequence(&lines, &["push constant 1", "pop local 0"]);
}

#[test]
fn empty_class_test() {
    let text = jack_bytecode::compile_source("class Nothing { }").unwrap();
    assert!(text.is_empty());
}
