//! End-to-end pipeline scenarios: Source AST JSON in, target text out.

use argot_compiler::{compile, CompileOutput};
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

fn lit_str(s: &str) -> Value {
    json!({"type": "Literal", "value": s})
}

fn member_call(object: &str, method: &str, args: Value) -> Value {
    json!({
        "type": "CallExpression",
        "callee": {
            "type": "MemberExpression",
            "object": ident(object),
            "property": ident(method),
            "computed": false
        },
        "arguments": args
    })
}

fn func_returning(name: &str, params: Value, expr: Value) -> Value {
    json!({
        "type": "FunctionDeclaration",
        "id": ident(name),
        "params": params,
        "body": {"type": "BlockStatement", "body": [
            {"type": "ReturnStatement", "argument": expr}
        ]}
    })
}

fn compile_ok(ast: &Value, target: &str) -> CompileOutput {
    compile(ast, target, None).unwrap_or_else(|e| panic!("{target} compile failed: {e}"))
}

// ── Scenario: rotation lowering ──

#[test]
fn rotation_call_reaches_every_target() {
    let ast = program(json!([func_returning(
        "spin",
        json!([ident("x")]),
        member_call("OpCodes", "RotL32", json!([ident("x"), lit_int(7)]))
    )]));

    let c = compile_ok(&ast, "c");
    assert!(c.code.contains("rotl32(x, 7)"), "c output:\n{}", c.code);
    assert!(
        c.code.contains("static inline uint32_t rotl32"),
        "helper must appear in the C prologue"
    );

    let ts = compile_ok(&ast, "typescript");
    assert!(ts.code.contains("rotl32(x, 7)"));
    assert!(ts.code.contains("function rotl32"));

    // Ruby inlines the shift/or/mask form.
    let ruby = compile_ok(&ast, "ruby");
    assert!(ruby.code.contains("<<"));
    assert!(ruby.code.contains(">>"));
    assert!(ruby.code.contains("0xFFFFFFFF"));
}

// ── Scenario: class with constructor field assignment ──

fn class_with_ctor() -> Value {
    program(json!([{
        "type": "ClassDeclaration",
        "id": ident("K"),
        "superClass": null,
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
                        "type": "AssignmentExpression",
                        "operator": "=",
                        "left": {
                            "type": "MemberExpression",
                            "object": {"type": "ThisExpression"},
                            "property": ident("_name"),
                            "computed": false
                        },
                        "right": ident("n")
                    }
                }]}
            }
        }]}
    }]))
}

#[test]
fn class_constructor_maps_to_ruby_attr_accessor() {
    let output = compile_ok(&class_with_ctor(), "ruby");
    assert!(output.code.contains("class K"));
    assert!(output.code.contains("attr_accessor :name"));
    assert!(output.code.contains("def initialize(n)"));
    assert!(output.code.contains("@name = n"));
}

#[test]
fn class_constructor_maps_to_typescript_public_field() {
    let output = compile_ok(&class_with_ctor(), "typescript");
    assert!(output.code.contains("class K {"));
    assert!(output.code.contains("public name: any;"));
    assert!(output.code.contains("constructor(n: any) {"));
    assert!(output.code.contains("this.name = n;"));
}

#[test]
fn class_constructor_maps_to_c_struct_and_init() {
    let output = compile_ok(&class_with_ctor(), "c");
    assert!(output.code.contains("struct K {"));
    assert!(output.code.contains("name;"));
    assert!(output.code.contains("void K_init(K *self"));
    assert!(output.code.contains("self->name = n;"));
}

// ── Scenario: template literal ──

#[test]
fn template_literal_interpolates_in_ruby_and_typescript() {
    let ast = program(json!([func_returning(
        "greet",
        json!([ident("who"), ident("n")]),
        json!({
            "type": "TemplateLiteral",
            "quasis": [
                {"type": "TemplateElement", "value": {"cooked": "Hello "}},
                {"type": "TemplateElement", "value": {"cooked": ", you are "}},
                {"type": "TemplateElement", "value": {"cooked": ""}}
            ],
            "expressions": [ident("who"), ident("n")]
        })
    )]));

    let ruby = compile_ok(&ast, "ruby");
    assert!(ruby.code.contains("\"Hello #{who}, you are #{n}\""));

    let ts = compile_ok(&ast, "typescript");
    assert!(ts.code.contains("`Hello ${who}, you are ${n}`"));
}

// ── Scenario: hex decode and byte XOR ──

#[test]
fn hex_decode_and_xor_arrays() {
    let ast = program(json!([func_returning(
        "mix",
        json!([ident("a"), ident("b")]),
        json!({
            "type": "CallExpression",
            "callee": {
                "type": "MemberExpression",
                "object": ident("OpCodes"),
                "property": ident("XorArrays"),
                "computed": false
            },
            "arguments": [
                member_call("OpCodes", "Hex8ToBytes", json!([lit_str("0102")])),
                ident("b")
            ]
        })
    )]));

    let ruby = compile_ok(&ast, "ruby");
    assert!(ruby.code.contains("[\"0102\"].pack(\"H*\").bytes"));
    assert!(ruby.code.contains(".zip("));
    assert!(ruby.code.contains("x ^ y"));

    let c = compile_ok(&ast, "c");
    assert!(
        c.code.contains("static uint8_t *array_xor"),
        "array_xor must be defined in the C prologue"
    );
    assert!(c.code.contains("array_xor("));
    assert!(c.code.contains("hex_to_bytes"));
}

// ── Scenario: struct field ordering in C ──

fn class_decl(name: &str, ctor_body: Value) -> Value {
    json!({
        "type": "ClassDeclaration",
        "id": ident(name),
        "superClass": null,
        "body": {"type": "ClassBody", "body": [{
            "type": "MethodDefinition",
            "kind": "constructor",
            "static": false,
            "key": ident("constructor"),
            "value": {
                "type": "FunctionExpression",
                "params": [],
                "body": {"type": "BlockStatement", "body": ctor_body}
            }
        }]}
    })
}

fn assign_this(prop: &str, value: Value) -> Value {
    json!({
        "type": "ExpressionStatement",
        "expression": {
            "type": "AssignmentExpression",
            "operator": "=",
            "left": {
                "type": "MemberExpression",
                "object": {"type": "ThisExpression"},
                "property": ident(prop),
                "computed": false
            },
            "right": value
        }
    })
}

fn new_expr(class: &str) -> Value {
    json!({"type": "NewExpression", "callee": ident(class), "arguments": []})
}

#[test]
fn value_field_struct_is_defined_before_its_dependent() {
    // B embeds A by value, but B is declared first in the source.
    let ast = program(json!([
        class_decl("B", json!([assign_this("a", new_expr("A"))])),
        class_decl("A", json!([assign_this("x", lit_int(0))])),
    ]));
    let output = compile_ok(&ast, "c");
    let a_def = output.code.find("struct A {").expect("A defined");
    let b_def = output.code.find("struct B {").expect("B defined");
    assert!(
        a_def < b_def,
        "A must be defined before B:\n{}",
        output.code
    );
}

#[test]
fn value_field_cycle_downgrades_to_pointer_with_warning() {
    let ast = program(json!([
        class_decl("A", json!([assign_this("b", new_expr("B"))])),
        class_decl("B", json!([assign_this("a", new_expr("A"))])),
    ]));
    let output = compile_ok(&ast, "c");
    assert!(
        output.warnings.iter().any(|w| w.contains("cycle")),
        "expected a cycle warning, got {:?}",
        output.warnings
    );
    assert!(
        output.code.contains("B *") || output.code.contains("A *"),
        "one side of the cycle must become a pointer:\n{}",
        output.code
    );
}

// ── Scenario: unhandled variant loudness ──

#[test]
fn unmappable_variant_is_loud_in_c() {
    // Dynamic array push has no C mapping; the output must carry a sentinel
    // and the warnings must name the variant.
    let ast = program(json!([func_returning(
        "grow",
        json!([ident("arr")]),
        member_call("arr", "push", json!([lit_int(1)]))
    )]));
    let output = compile_ok(&ast, "c");
    assert!(
        output.code.contains("UNHANDLED_ArrayAppend"),
        "sentinel expected:\n{}",
        output.code
    );
    assert!(output
        .warnings
        .iter()
        .any(|w| w.contains("ArrayAppend")));
    assert!(output
        .warnings
        .iter()
        .any(|w| w.contains("not expected to compile")));
}

// ── Cross-cutting properties ──

#[test]
fn outputs_are_deterministic_across_runs() {
    let ast = class_with_ctor();
    for target in ["c", "ruby", "typescript"] {
        let first = compile_ok(&ast, target);
        let second = compile_ok(&ast, target);
        assert_eq!(first.code, second.code, "{target} output must be stable");
    }
}

#[test]
fn fingerprint_is_reported_and_stable() {
    let ast = class_with_ctor();
    let output = compile_ok(&ast, "ruby");
    assert!(output.fingerprint.starts_with("sha256:"));
    assert_eq!(output.fingerprint, compile_ok(&ast, "c").fingerprint);
}

#[test]
fn helper_closure_holds_for_typescript() {
    let ast = program(json!([func_returning(
        "pack",
        json!([ident("b")]),
        member_call(
            "OpCodes",
            "Pack32BE",
            json!([
                {"type": "MemberExpression", "object": ident("b"), "property": lit_int(0), "computed": true},
                {"type": "MemberExpression", "object": ident("b"), "property": lit_int(1), "computed": true},
                {"type": "MemberExpression", "object": ident("b"), "property": lit_int(2), "computed": true},
                {"type": "MemberExpression", "object": ident("b"), "property": lit_int(3), "computed": true}
            ])
        )
    )]));
    let output = compile_ok(&ast, "typescript");
    assert!(output.code.contains("pack32BE(b[0], b[1], b[2], b[3])"));
    assert!(
        output.code.contains("function pack32BE"),
        "every called helper must be defined in the prologue:\n{}",
        output.code
    );
}
