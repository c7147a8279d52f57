//! Registry contract and width/endian coverage.

use argot_compiler::compile;
use argot_compiler::registry::Registry;
use serde_json::{json, Value};

fn program(body: Value) -> Value {
    json!({"type": "Program", "body": body})
}

fn ident(name: &str) -> Value {
    json!({"type": "Identifier", "name": name})
}

#[test]
fn registry_records_expose_the_plugin_surface() {
    let registry = Registry::with_builtin_targets();
    let mut names: Vec<&str> = registry.list().iter().map(|info| info.name).collect();
    names.sort_unstable();
    assert_eq!(names, ["c", "ruby", "typescript"]);
    for info in registry.list() {
        assert!(!info.extension.is_empty());
        assert!(!info.mime.is_empty());
        assert!(!info.version.is_empty());
        assert!(!info.description.is_empty());
    }
    let c = registry.find("c").unwrap();
    assert_eq!(c.info().extension, "c");
}

#[test]
fn parser_spelling_variants_compile_identically() {
    // ESPrima-style `Literal` vs Babel-style `NumericLiteral` for the same
    // program must produce the same output text.
    let espree = program(json!([{
        "type": "FunctionDeclaration",
        "id": ident("f"),
        "params": [],
        "body": {"type": "BlockStatement", "body": [{
            "type": "ReturnStatement",
            "argument": {"type": "Literal", "value": 42}
        }]}
    }]));
    let babel = program(json!([{
        "type": "FunctionDeclaration",
        "id": ident("f"),
        "params": [],
        "body": {"type": "BlockStatement", "body": [{
            "type": "ReturnStatement",
            "argument": {"type": "NumericLiteral", "value": 42}
        }]}
    }]));
    for target in ["c", "ruby", "typescript"] {
        let a = compile(&espree, target, None).unwrap();
        let b = compile(&babel, target, None).unwrap();
        assert_eq!(a.code, b.code, "{target} output diverged across parsers");
    }
}

fn pack_program(method: &str, arg_count: usize) -> Value {
    let args: Vec<Value> = (0..arg_count)
        .map(|i| {
            json!({
                "type": "MemberExpression",
                "object": ident("b"),
                "property": {"type": "Literal", "value": i},
                "computed": true
            })
        })
        .collect();
    program(json!([{
        "type": "FunctionDeclaration",
        "id": ident("f"),
        "params": [ident("b")],
        "body": {"type": "BlockStatement", "body": [{
            "type": "ReturnStatement",
            "argument": {
                "type": "CallExpression",
                "callee": {
                    "type": "MemberExpression",
                    "object": ident("OpCodes"),
                    "property": ident(method),
                    "computed": false
                },
                "arguments": args
            }
        }]}
    }]))
}

fn unpack_program(method: &str) -> Value {
    program(json!([{
        "type": "FunctionDeclaration",
        "id": ident("f"),
        "params": [ident("v")],
        "body": {"type": "BlockStatement", "body": [{
            "type": "ReturnStatement",
            "argument": {
                "type": "CallExpression",
                "callee": {
                    "type": "MemberExpression",
                    "object": ident("OpCodes"),
                    "property": ident(method),
                    "computed": false
                },
                "arguments": [ident("v")]
            }
        }]}
    }]))
}

#[test]
fn every_pack_width_and_endian_registers_its_helper() {
    let cases = [
        ("Pack16BE", 2, "pack16_be", "pack16BE"),
        ("Pack16LE", 2, "pack16_le", "pack16LE"),
        ("Pack32BE", 4, "pack32_be", "pack32BE"),
        ("Pack32LE", 4, "pack32_le", "pack32LE"),
        ("Pack64BE", 8, "pack64_be", "pack64BE"),
        ("Pack64LE", 8, "pack64_le", "pack64LE"),
    ];
    for (method, arity, c_name, ts_name) in cases {
        let ast = pack_program(method, arity);
        let c = compile(&ast, "c", None).unwrap();
        assert!(
            c.code.contains(&format!("{}(", c_name)),
            "{method}: expected call to {c_name} in C output"
        );
        let width = &method[4..6];
        assert!(
            c.code.contains(&format!("uint{}_t {}", width, c_name)),
            "{method}: helper definition missing from C prologue:\n{}",
            c.code
        );
        let ts = compile(&ast, "typescript", None).unwrap();
        assert!(ts.code.contains(&format!("function {}", ts_name)));
    }
}

#[test]
fn every_unpack_width_and_endian_registers_its_helper() {
    let cases = [
        ("Unpack16BE", "unpack16_be", "n"),
        ("Unpack16LE", "unpack16_le", "v"),
        ("Unpack32BE", "unpack32_be", "N"),
        ("Unpack32LE", "unpack32_le", "V"),
        ("Unpack64BE", "unpack64_be", "Q>"),
        ("Unpack64LE", "unpack64_le", "Q<"),
    ];
    for (method, c_name, ruby_format) in cases {
        let ast = unpack_program(method);
        let c = compile(&ast, "c", None).unwrap();
        assert!(
            c.code.contains(&format!("{}(", c_name)),
            "{method}: expected call to {c_name} in C output"
        );
        let ruby = compile(&ast, "ruby", None).unwrap();
        assert!(
            ruby.code.contains(&format!("pack(\"{}\")", ruby_format)),
            "{method}: expected pack format {ruby_format} in Ruby output:\n{}",
            ruby.code
        );
    }
}

#[test]
fn rotation_helpers_cover_all_widths_in_typescript() {
    for (method, helper) in [
        ("RotL8", "rotl8"),
        ("RotR8", "rotr8"),
        ("RotL16", "rotl16"),
        ("RotR16", "rotr16"),
        ("RotL32", "rotl32"),
        ("RotR32", "rotr32"),
        ("RotL64", "rotl64"),
        ("RotR64", "rotr64"),
    ] {
        let ast = program(json!([{
            "type": "FunctionDeclaration",
            "id": ident("f"),
            "params": [ident("x")],
            "body": {"type": "BlockStatement", "body": [{
                "type": "ReturnStatement",
                "argument": {
                    "type": "CallExpression",
                    "callee": {
                        "type": "MemberExpression",
                        "object": ident("OpCodes"),
                        "property": ident(method),
                        "computed": false
                    },
                    "arguments": [ident("x"), {"type": "Literal", "value": 3}]
                }
            }]}
        }]));
        let ts = compile(&ast, "typescript", None).unwrap();
        assert!(
            ts.code.contains(&format!("function {}", helper)),
            "{method}: helper {helper} missing from prologue"
        );
        assert!(ts.code.contains(&format!("{}(x, 3)", helper)));
    }
}

#[test]
fn unknown_opcode_method_lowers_to_placeholder_with_warning() {
    let ast = program(json!([{
        "type": "FunctionDeclaration",
        "id": ident("f"),
        "params": [],
        "body": {"type": "BlockStatement", "body": [{
            "type": "ReturnStatement",
            "argument": {
                "type": "CallExpression",
                "callee": {
                    "type": "MemberExpression",
                    "object": ident("OpCodes"),
                    "property": ident("QuantumMix"),
                    "computed": false
                },
                "arguments": []
            }
        }]}
    }]));
    let output = compile(&ast, "ruby", None).unwrap();
    assert!(output
        .warnings
        .iter()
        .any(|w| w.contains("QuantumMix")));
    assert!(
        !output.code.contains("OpCodes"),
        "the bit-ops namespace must never reach the output:\n{}",
        output.code
    );
}
