//! Per-target emission behaviour.

use argot_compiler::compile;
use argot_compiler::options::{EmitOptions, IndentStyle};
use serde_json::{json, Value};

fn program(body: Value) -> Value {
    json!({"type": "Program", "body": body})
}

fn ident(name: &str) -> Value {
    json!({"type": "Identifier", "name": name})
}

fn lit_int(n: i64) -> Value {
    json!({"type": "Literal", "value": n})
}

fn func_with_body(name: &str, params: Value, body: Value) -> Value {
    json!({
        "type": "FunctionDeclaration",
        "id": ident(name),
        "params": params,
        "body": {"type": "BlockStatement", "body": body}
    })
}

fn switch_with_breaks() -> Value {
    program(json!([func_with_body(
        "pick",
        json!([ident("x")]),
        json!([{
            "type": "SwitchStatement",
            "discriminant": ident("x"),
            "cases": [
                {"type": "SwitchCase", "test": lit_int(1), "consequent": [
                    {"type": "ExpressionStatement", "expression": {
                        "type": "CallExpression",
                        "callee": ident("one"),
                        "arguments": []
                    }},
                    {"type": "BreakStatement"}
                ]},
                {"type": "SwitchCase", "test": lit_int(2), "consequent": [
                    {"type": "ExpressionStatement", "expression": {
                        "type": "CallExpression",
                        "callee": ident("two"),
                        "arguments": []
                    }},
                    {"type": "BreakStatement"}
                ]},
                {"type": "SwitchCase", "test": null, "consequent": [
                    {"type": "ExpressionStatement", "expression": {
                        "type": "CallExpression",
                        "callee": ident("other"),
                        "arguments": []
                    }}
                ]}
            ]
        }])
    )]))
}

#[test]
fn ruby_case_when_has_no_break() {
    let output = compile(&switch_with_breaks(), "ruby", None).unwrap();
    assert!(output.code.contains("case x"));
    assert!(output.code.contains("when 1"));
    assert!(output.code.contains("when 2"));
    assert!(
        !output.code.contains("break"),
        "no break may appear in a when body:\n{}",
        output.code
    );
}

#[test]
fn c_switch_regains_breaks() {
    let output = compile(&switch_with_breaks(), "c", None).unwrap();
    assert!(output.code.contains("switch (x) {"));
    assert!(output.code.contains("case 1:"));
    assert!(
        output.code.contains("break;"),
        "the C emitter must re-add case breaks:\n{}",
        output.code
    );
}

#[test]
fn typescript_preserves_zero_fill_shift() {
    let ast = program(json!([func_with_body(
        "top",
        json!([ident("x")]),
        json!([{
            "type": "ReturnStatement",
            "argument": {
                "type": "BinaryExpression",
                "operator": ">>>",
                "left": ident("x"),
                "right": lit_int(2)
            }
        }])
    )]));
    let output = compile(&ast, "typescript", None).unwrap();
    assert!(
        output.code.contains(">>>"),
        "the zero-fill shift is native TypeScript:\n{}",
        output.code
    );
    // And the result type is known unsigned, so the annotation is number.
    assert!(output.code.contains("): number {"));
}

#[test]
fn undefined_becomes_target_null() {
    let ast = program(json!([func_with_body(
        "blank",
        json!([]),
        json!([{
            "type": "ReturnStatement",
            "argument": {"type": "Identifier", "name": "undefined"}
        }])
    )]));
    let ruby = compile(&ast, "ruby", None).unwrap();
    assert!(ruby.code.contains("return nil"));
    let ts = compile(&ast, "typescript", None).unwrap();
    assert!(ts.code.contains("return null;"));
    let c = compile(&ast, "c", None).unwrap();
    assert!(c.code.contains("return NULL;"));
}

#[test]
fn module_constants_scream_in_ruby() {
    let ast = program(json!([{
        "type": "VariableDeclaration",
        "kind": "const",
        "declarations": [{
            "type": "VariableDeclarator",
            "id": ident("roundCount"),
            "init": lit_int(20)
        }]
    }]));
    let output = compile(&ast, "ruby", None).unwrap();
    assert!(
        output.code.contains("ROUND_COUNT = 20"),
        "module constants take SCREAMING_SNAKE_CASE:\n{}",
        output.code
    );
}

#[test]
fn counting_loop_becomes_range_each_in_ruby() {
    let ast = program(json!([func_with_body(
        "sum",
        json!([ident("n")]),
        json!([{
            "type": "ForStatement",
            "init": {
                "type": "VariableDeclaration",
                "kind": "let",
                "declarations": [{
                    "type": "VariableDeclarator",
                    "id": ident("i"),
                    "init": lit_int(0)
                }]
            },
            "test": {
                "type": "BinaryExpression",
                "operator": "<",
                "left": ident("i"),
                "right": ident("n")
            },
            "update": {
                "type": "UpdateExpression",
                "operator": "++",
                "prefix": false,
                "argument": ident("i")
            },
            "body": {"type": "BlockStatement", "body": [{
                "type": "ExpressionStatement",
                "expression": {
                    "type": "CallExpression",
                    "callee": ident("step"),
                    "arguments": [ident("i")]
                }
            }]}
        }])
    )]));
    let output = compile(&ast, "ruby", None).unwrap();
    assert!(
        output.code.contains("(0...n).each do |i|"),
        "counting loops read as Range#each:\n{}",
        output.code
    );
}

#[test]
fn ruby_shebang_and_indent_options_apply() {
    let ast = program(json!([]));
    let options = EmitOptions {
        shebang: true,
        indent: Some(IndentStyle::Tab),
        ..EmitOptions::default()
    };
    let output = compile(&ast, "ruby", Some(&options)).unwrap();
    assert!(output.code.starts_with("#!/usr/bin/env ruby"));
    assert!(output.code.contains("# frozen_string_literal: true"));
}

#[test]
fn doc_comments_off_removes_banner() {
    let ast = program(json!([]));
    let options = EmitOptions {
        doc_comments: false,
        ..EmitOptions::default()
    };
    let output = compile(&ast, "typescript", Some(&options)).unwrap();
    assert!(!output.code.contains("Generated by argot"));
}

#[test]
fn ruby_set_creation_adds_require() {
    let ast = program(json!([func_with_body(
        "fresh",
        json!([]),
        json!([{
            "type": "ReturnStatement",
            "argument": {"type": "NewExpression", "callee": ident("Set"), "arguments": []}
        }])
    )]));
    let output = compile(&ast, "ruby", None).unwrap();
    assert!(output.code.contains("require 'set'"));
    assert!(output.dependencies.contains(&"set".to_string()));
}

#[test]
fn secure_compare_registers_constant_time_helper() {
    let ast = program(json!([func_with_body(
        "check",
        json!([ident("a"), ident("b")]),
        json!([{
            "type": "ReturnStatement",
            "argument": {
                "type": "CallExpression",
                "callee": {
                    "type": "MemberExpression",
                    "object": ident("OpCodes"),
                    "property": ident("SecureCompare"),
                    "computed": false
                },
                "arguments": [ident("a"), ident("b")]
            }
        }])
    )]));
    let ruby = compile(&ast, "ruby", None).unwrap();
    assert!(ruby.code.contains("def secure_compare"));
    assert!(ruby.code.contains("secure_compare(a, b)"));
    let c = compile(&ast, "c", None).unwrap();
    assert!(c.code.contains("static bool secure_compare"));
    assert!(c.code.contains("secure_compare(a, b, a_len)"));
    let ts = compile(&ast, "typescript", None).unwrap();
    assert!(ts.code.contains("function secureCompare"));
}

#[test]
fn getter_maps_per_target() {
    let ast = program(json!([{
        "type": "ClassDeclaration",
        "id": ident("Box"),
        "superClass": null,
        "body": {"type": "ClassBody", "body": [
            {
                "type": "MethodDefinition",
                "kind": "constructor",
                "static": false,
                "key": ident("constructor"),
                "value": {
                    "type": "FunctionExpression",
                    "params": [],
                    "body": {"type": "BlockStatement", "body": [{
                        "type": "ExpressionStatement",
                        "expression": {
                            "type": "AssignmentExpression",
                            "operator": "=",
                            "left": {
                                "type": "MemberExpression",
                                "object": {"type": "ThisExpression"},
                                "property": ident("_size"),
                                "computed": false
                            },
                            "right": lit_int(16)
                        }
                    }]}
                }
            },
            {
                "type": "MethodDefinition",
                "kind": "get",
                "static": false,
                "key": ident("size"),
                "value": {
                    "type": "FunctionExpression",
                    "params": [],
                    "body": {"type": "BlockStatement", "body": [{
                        "type": "ReturnStatement",
                        "argument": {
                            "type": "MemberExpression",
                            "object": {"type": "ThisExpression"},
                            "property": ident("_size"),
                            "computed": false
                        }
                    }]}
                }
            }
        ]}
    }]));
    let ts = compile(&ast, "typescript", None).unwrap();
    assert!(ts.code.contains("get size(): number {"));
    let ruby = compile(&ast, "ruby", None).unwrap();
    assert!(ruby.code.contains("def size"));
    let c = compile(&ast, "c", None).unwrap();
    assert!(c.code.contains("int64_t Box_get_size(Box *self)"));
}

#[test]
fn super_calls_map_per_target() {
    let ast = program(json!([
        {
            "type": "ClassDeclaration",
            "id": ident("Base"),
            "superClass": null,
            "body": {"type": "ClassBody", "body": [{
                "type": "MethodDefinition",
                "kind": "constructor",
                "static": false,
                "key": ident("constructor"),
                "value": {
                    "type": "FunctionExpression",
                    "params": [ident("n")],
                    "body": {"type": "BlockStatement", "body": []}
                }
            }]}
        },
        {
            "type": "ClassDeclaration",
            "id": ident("Derived"),
            "superClass": ident("Base"),
            "body": {"type": "ClassBody", "body": [{
                "type": "MethodDefinition",
                "kind": "constructor",
                "static": false,
                "key": ident("constructor"),
                "value": {
                    "type": "FunctionExpression",
                    "params": [ident("n")],
                    "body": {"type": "BlockStatement", "body": [{
                        "type": "ExpressionStatement",
                        "expression": {
                            "type": "CallExpression",
                            "callee": {"type": "Super"},
                            "arguments": [ident("n")]
                        }
                    }]}
                }
            }]}
        }
    ]));
    let ts = compile(&ast, "typescript", None).unwrap();
    assert!(ts.code.contains("class Derived extends Base {"));
    assert!(ts.code.contains("super(n);"));
    let ruby = compile(&ast, "ruby", None).unwrap();
    assert!(ruby.code.contains("class Derived < Base"));
    assert!(ruby.code.contains("super(n)"));
    let c = compile(&ast, "c", None).unwrap();
    assert!(c.code.contains("Base_init((Base *)self, n);"));
    assert!(
        c.code.contains("Base base;"),
        "the superclass embeds as the first field:\n{}",
        c.code
    );
}
