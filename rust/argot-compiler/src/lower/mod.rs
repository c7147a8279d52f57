//! Source AST → IL lowering.
//!
//! The only component that knows the source ecosystem. It unwraps module
//! wrappers, strips registration scaffolding, rewrites well-known library
//! calls into domain nodes, and hands every back-end the same closed IL
//! variant set. Constructs that cannot change observable behaviour lower to
//! placeholders with a warning; behaviour-relevant failures abort.

mod builtins;
mod opcodes;

use crate::diagnostics::Diagnostics;
use crate::estree::SourceNode;
use crate::il::*;
use argot_core::Type;
use num_bigint::BigInt;
use num_traits::Num;
use serde_json::Value;
use sha2::{Digest, Sha256};
use std::collections::HashMap;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum LowerError {
    #[error("source AST is not a Program: {0}")]
    NotAProgram(String),
}

/// Lower a parsed Source AST (`type`-tagged JSON) into an IL module.
pub fn lower_program(
    source_ast: &Value,
    module_name: &str,
    diags: &mut Diagnostics,
) -> Result<Module, LowerError> {
    let root = SourceNode::from_value(source_ast)
        .ok_or_else(|| LowerError::NotAProgram("missing `type` tag".into()))?;
    if root.kind() != "Program" {
        return Err(LowerError::NotAProgram(format!(
            "expected Program, found {}",
            root.kind()
        )));
    }

    let fingerprint = format!(
        "sha256:{:x}",
        Sha256::digest(source_ast.to_string().as_bytes())
    );

    let mut lowerer = Lowerer::new(diags);
    let body = lowerer.unwrap_module_body(root);
    let mut module = Module {
        name: module_name.to_string(),
        fingerprint,
        decls: Vec::new(),
    };
    lowerer.lower_module_body(&body, &mut module);
    Ok(module)
}

/// Ecosystem identifiers whose top-level statements are registration
/// scaffolding, not algorithm content.
const SCAFFOLDING_IDENTS: &[&str] = &[
    "module",
    "exports",
    "define",
    "require",
    "global",
    "globalThis",
    "window",
    "self",
    "RegisterAlgorithm",
    "AlgorithmFramework",
];

struct Lowerer<'d> {
    diags: &'d mut Diagnostics,
    /// `const { X } = Dep` at module scope: later uses of `X` become `Dep.X`.
    import_aliases: HashMap<String, String>,
}

impl<'d> Lowerer<'d> {
    fn new(diags: &'d mut Diagnostics) -> Lowerer<'d> {
        Lowerer {
            diags,
            import_aliases: HashMap::new(),
        }
    }

    fn placeholder(&mut self, what: &str, span: Option<Span>) -> Expr {
        self.diags
            .warn(format!("unhandled source construct: {what}"), span);
        Expr::typed(ExprKind::Placeholder(what.to_string()), Type::Any).with_span(span)
    }

    // ── Module wrappers ──

    /// Descend into the innermost wrapper-function body that carries the
    /// declarations. Handles the self-invoking form and the factory form
    /// (an invocation whose second argument is a function literal).
    fn unwrap_module_body<'a>(&mut self, program: SourceNode<'a>) -> Vec<SourceNode<'a>> {
        let mut body = program.children("body");
        loop {
            let Some(inner) = body.iter().find_map(|stmt| self.wrapper_body(*stmt)) else {
                return body;
            };
            // Keep descending while the inner body is itself wrapped.
            body = inner.children("body");
        }
    }

    /// If this statement is a module-wrapper invocation, return the wrapped
    /// function's block body.
    fn wrapper_body<'a>(&mut self, stmt: SourceNode<'a>) -> Option<SourceNode<'a>> {
        if stmt.kind() != "ExpressionStatement" {
            return None;
        }
        let mut expr = stmt.child("expression")?;
        // `(function(){...})()` sometimes parses the parenthesis explicitly.
        if expr.kind() == "ParenthesizedExpression" {
            expr = expr.child("expression")?;
        }
        let call = match expr.kind() {
            "CallExpression" => expr,
            "UnaryExpression" => {
                // `!function(){...}()` wrapper spelling.
                let arg = expr.child("argument")?;
                if arg.kind() == "CallExpression" {
                    arg
                } else {
                    return None;
                }
            }
            _ => return None,
        };
        let callee = call.child("callee")?;
        let callee = if callee.kind() == "ParenthesizedExpression" {
            callee.child("expression")?
        } else {
            callee
        };
        if is_function_literal(callee) {
            return callee.child("body");
        }
        // Factory form: `wrapper(this, function(deps) { ... })`.
        let args = call.children("arguments");
        if args.len() >= 2 && is_function_literal(args[1]) {
            return args[1].child("body");
        }
        None
    }

    // ── Module-level declarations ──

    fn lower_module_body(&mut self, body: &[SourceNode<'_>], module: &mut Module) {
        // First pass: collect import-destructuring aliases so later uses
        // rewrite to direct member references.
        for stmt in body {
            self.collect_import_aliases(*stmt);
        }
        for stmt in body {
            self.lower_module_stmt(*stmt, module);
        }
    }

    fn collect_import_aliases(&mut self, stmt: SourceNode<'_>) {
        if stmt.kind() != "VariableDeclaration" {
            return;
        }
        for declarator in stmt.children("declarations") {
            let Some(id) = declarator.child("id") else {
                continue;
            };
            if id.kind() != "ObjectPattern" {
                continue;
            }
            let Some(init) = declarator.child("init") else {
                continue;
            };
            let Some(dep) = init.name() else { continue };
            for prop in id.children("properties") {
                if let Some(key) = prop.child("key").and_then(|k| k.name()) {
                    self.import_aliases.insert(key.to_string(), dep.to_string());
                }
            }
        }
    }

    fn lower_module_stmt(&mut self, stmt: SourceNode<'_>, module: &mut Module) {
        match stmt.kind() {
            "ClassDeclaration" => {
                let class = self.lower_class(stmt);
                module.decls.push(Decl::Class(class));
            }
            "FunctionDeclaration" => {
                let func = self.lower_function_decl(stmt);
                module.decls.push(Decl::Function(func));
            }
            "VariableDeclaration" => {
                for declarator in stmt.children("declarations") {
                    let Some(id) = declarator.child("id") else {
                        continue;
                    };
                    match id.kind() {
                        // Import destructuring was folded into the alias map.
                        "ObjectPattern" => {}
                        "ArrayPattern" => {
                            let Some(init) = declarator.child("init") else {
                                continue;
                            };
                            let init_expr = self.lower_expr(init);
                            for (i, elem) in id.children_with_holes("elements").iter().enumerate() {
                                let Some(elem) = elem else { continue };
                                let Some(name) = elem.name() else { continue };
                                module.decls.push(Decl::Constant(ConstantDecl {
                                    name: name.to_string(),
                                    value: element_of(init_expr.clone(), i),
                                    span: elem.span(),
                                }));
                            }
                        }
                        _ => {
                            let Some(name) = id.name() else { continue };
                            let value = match declarator.child("init") {
                                Some(init) => self.lower_expr(init),
                                None => Expr::typed(
                                    ExprKind::Literal(Literal::Null),
                                    Type::Null,
                                ),
                            };
                            module.decls.push(Decl::Constant(ConstantDecl {
                                name: name.to_string(),
                                value,
                                span: declarator.span(),
                            }));
                        }
                    }
                }
            }
            "ExpressionStatement" => {
                // `'use strict'` and sibling directives carry no semantics
                // for the output.
                let is_directive = stmt
                    .child("expression")
                    .is_some_and(|e| e.kind() == "Literal" && e.literal_value().is_some_and(Value::is_string));
                if is_directive {
                    return;
                }
                if self.is_scaffolding_stmt(stmt) {
                    self.diags
                        .note("dropped registration scaffolding statement", stmt.span());
                } else {
                    // Top-level side effect outside any declaration; nothing
                    // in the IL module can hold it.
                    self.diags.warn(
                        "dropped module-level expression statement with no declaration form",
                        stmt.span(),
                    );
                }
            }
            "ImportDeclaration" => {
                let names = stmt
                    .children("specifiers")
                    .iter()
                    .filter_map(|s| s.child("local").and_then(|l| l.name()))
                    .map(str::to_string)
                    .collect();
                let from = stmt
                    .child("source")
                    .and_then(|s| s.literal_value())
                    .and_then(Value::as_str)
                    .unwrap_or("")
                    .to_string();
                module.decls.push(Decl::Import(ImportDecl {
                    names,
                    from,
                    span: stmt.span(),
                }));
            }
            "ExportNamedDeclaration" | "ExportDefaultDeclaration" => {
                if let Some(decl) = stmt.child("declaration") {
                    self.lower_module_stmt(decl, module);
                }
                let names: Vec<String> = stmt
                    .children("specifiers")
                    .iter()
                    .filter_map(|s| s.child("exported").and_then(|e| e.name()))
                    .map(str::to_string)
                    .collect();
                if !names.is_empty() {
                    module.decls.push(Decl::Export(ExportDecl {
                        names,
                        span: stmt.span(),
                    }));
                }
            }
            "EmptyStatement" => {}
            "IfStatement" => {
                // Environment-probe guards (`if (typeof module !== ...)`)
                // are scaffolding at module level.
                self.diags
                    .note("dropped module-level conditional scaffolding", stmt.span());
            }
            other => {
                self.diags.warn(
                    format!("unhandled module-level statement: {other}"),
                    stmt.span(),
                );
            }
        }
    }

    fn is_scaffolding_stmt(&self, stmt: SourceNode<'_>) -> bool {
        fn mentions(value: &Value, idents: &[&str]) -> bool {
            match value {
                Value::String(_) => false,
                Value::Array(items) => items.iter().any(|v| mentions(v, idents)),
                Value::Object(map) => map.iter().any(|(key, v)| {
                    (key == "name" && v.as_str().is_some_and(|n| idents.contains(&n)))
                        || mentions(v, idents)
                }),
                _ => false,
            }
        }
        mentions(stmt.value(), SCAFFOLDING_IDENTS)
    }

    // ── Classes ──

    fn lower_class(&mut self, node: SourceNode<'_>) -> ClassDecl {
        let name = node
            .child("id")
            .and_then(|id| id.name())
            .unwrap_or("AnonymousClass")
            .to_string();
        let super_class = node
            .child("superClass")
            .and_then(|s| s.name())
            .map(str::to_string);
        let body = match node.child("body") {
            Some(b) => b.children("body"),
            None => Vec::new(),
        };
        let mut members = Vec::new();
        for member in body {
            match member.kind() {
                "MethodDefinition" => members.push(Member::Method(self.lower_method(member))),
                "PropertyDefinition" => {
                    let field_name = member
                        .child("key")
                        .and_then(|k| k.name())
                        .unwrap_or("_field")
                        .to_string();
                    let init = member.child("value").map(|v| self.lower_expr(v));
                    members.push(Member::Field(FieldDecl {
                        name: field_name,
                        ty: Type::Any,
                        is_static: member.bool_field("static"),
                        init,
                        span: member.span(),
                    }));
                }
                "StaticBlock" => {
                    let stmts = self.lower_stmt_list(&member.children("body"));
                    members.push(Member::StaticInit(StaticInitDecl {
                        body: stmts,
                        span: member.span(),
                    }));
                }
                other => {
                    self.diags
                        .warn(format!("unhandled class member: {other}"), member.span());
                }
            }
        }
        ClassDecl {
            name,
            super_class,
            members,
            span: node.span(),
        }
    }

    fn lower_method(&mut self, node: SourceNode<'_>) -> MethodDecl {
        let name = node
            .child("key")
            .and_then(|k| k.name())
            .unwrap_or("_method")
            .to_string();
        let kind = match node.str_field("kind") {
            Some("constructor") => MethodKind::Constructor,
            Some("get") => MethodKind::Getter,
            Some("set") => MethodKind::Setter,
            _ => MethodKind::Normal,
        };
        let (params, body) = match node.child("value") {
            Some(func) => (
                self.lower_params(&func.children("params")),
                self.lower_function_body(func),
            ),
            None => (Vec::new(), Vec::new()),
        };
        MethodDecl {
            name,
            kind,
            is_static: node.bool_field("static"),
            params,
            body,
            return_ty: Type::Any,
            span: node.span(),
        }
    }

    fn lower_function_decl(&mut self, node: SourceNode<'_>) -> FunctionDecl {
        let name = node
            .child("id")
            .and_then(|id| id.name())
            .unwrap_or("_anonymous")
            .to_string();
        FunctionDecl {
            name,
            params: self.lower_params(&node.children("params")),
            body: self.lower_function_body(node),
            return_ty: Type::Any,
            span: node.span(),
        }
    }

    fn lower_params(&mut self, params: &[SourceNode<'_>]) -> Vec<Param> {
        params
            .iter()
            .map(|p| match p.kind() {
                "Identifier" => Param::untyped(p.name().unwrap_or("_arg")),
                "AssignmentPattern" => {
                    let name = p
                        .child("left")
                        .and_then(|l| l.name())
                        .unwrap_or("_arg")
                        .to_string();
                    let default = p.child("right").map(|r| self.lower_expr(r));
                    Param {
                        name,
                        ty: Type::Any,
                        default,
                    }
                }
                "RestElement" => {
                    self.diags
                        .warn("rest parameter lowered as plain parameter", p.span());
                    Param::untyped(
                        p.child("argument")
                            .and_then(|a| a.name())
                            .unwrap_or("_rest"),
                    )
                }
                other => {
                    self.diags
                        .warn(format!("unhandled parameter pattern: {other}"), p.span());
                    Param::untyped("_arg")
                }
            })
            .collect()
    }

    fn lower_function_body(&mut self, func: SourceNode<'_>) -> Vec<Stmt> {
        match func.child("body") {
            Some(body) if body.kind() == "BlockStatement" => {
                self.lower_stmt_list(&body.children("body"))
            }
            // Arrow shorthand: `x => expr` is an implicit return.
            Some(expr_body) => vec![Stmt::Return(Some(self.lower_expr(expr_body)))],
            None => Vec::new(),
        }
    }

    // ── Statements ──

    fn lower_stmt_list(&mut self, stmts: &[SourceNode<'_>]) -> Vec<Stmt> {
        let mut out = Vec::with_capacity(stmts.len());
        for stmt in stmts {
            self.lower_stmt_into(*stmt, &mut out);
        }
        out
    }

    fn lower_stmt_into(&mut self, node: SourceNode<'_>, out: &mut Vec<Stmt>) {
        match node.kind() {
            "BlockStatement" => {
                out.push(Stmt::Block(self.lower_stmt_list(&node.children("body"))));
            }
            "VariableDeclaration" => self.lower_var_declaration(node, out),
            "ExpressionStatement" => {
                if let Some(expr) = node.child("expression") {
                    out.push(Stmt::Expr(self.lower_expr(expr)));
                }
            }
            "ReturnStatement" => {
                let value = node.child("argument").map(|a| self.lower_expr(a));
                out.push(Stmt::Return(value));
            }
            "IfStatement" => {
                let cond = match node.child("test") {
                    Some(test) => self.lower_expr(test),
                    None => self.placeholder("IfStatement without test", node.span()),
                };
                let then_block = match node.child("consequent") {
                    Some(cons) => self.lower_stmt_as_block(cons),
                    None => Vec::new(),
                };
                let else_block = node.child("alternate").map(|alt| self.lower_stmt_as_block(alt));
                out.push(Stmt::If(IfStmt {
                    cond,
                    then_block,
                    else_block,
                }));
            }
            "WhileStatement" => {
                let cond = match node.child("test") {
                    Some(test) => self.lower_expr(test),
                    None => self.placeholder("WhileStatement without test", node.span()),
                };
                let body = match node.child("body") {
                    Some(b) => self.lower_stmt_as_block(b),
                    None => Vec::new(),
                };
                out.push(Stmt::While(WhileStmt { cond, body }));
            }
            "DoWhileStatement" => {
                let body = match node.child("body") {
                    Some(b) => self.lower_stmt_as_block(b),
                    None => Vec::new(),
                };
                let cond = match node.child("test") {
                    Some(test) => self.lower_expr(test),
                    None => self.placeholder("DoWhileStatement without test", node.span()),
                };
                out.push(Stmt::DoWhile(DoWhileStmt { body, cond }));
            }
            "ForStatement" => {
                let init = node.child("init").map(|init| {
                    let mut init_stmts = Vec::new();
                    if init.kind() == "VariableDeclaration" {
                        self.lower_var_declaration(init, &mut init_stmts);
                    } else {
                        init_stmts.push(Stmt::Expr(self.lower_expr(init)));
                    }
                    // A multi-declarator init keeps only its first binding in
                    // the header; the rest are hoisted before the loop.
                    let first = init_stmts.remove(0);
                    out.extend(init_stmts);
                    Box::new(first)
                });
                let cond = node.child("test").map(|t| self.lower_expr(t));
                let update = node.child("update").map(|u| self.lower_expr(u));
                let body = match node.child("body") {
                    Some(b) => self.lower_stmt_as_block(b),
                    None => Vec::new(),
                };
                out.push(Stmt::For(ForStmt {
                    init,
                    cond,
                    update,
                    body,
                }));
            }
            "ForOfStatement" | "ForInStatement" => {
                let var = node
                    .child("left")
                    .map(|left| {
                        if left.kind() == "VariableDeclaration" {
                            left.children("declarations")
                                .first()
                                .and_then(|d| d.child("id"))
                                .and_then(|id| id.name())
                                .unwrap_or("_it")
                                .to_string()
                        } else {
                            left.name().unwrap_or("_it").to_string()
                        }
                    })
                    .unwrap_or_else(|| "_it".to_string());
                let right = match node.child("right") {
                    Some(r) => self.lower_expr(r),
                    None => self.placeholder("for loop without iterable", node.span()),
                };
                let body = match node.child("body") {
                    Some(b) => self.lower_stmt_as_block(b),
                    None => Vec::new(),
                };
                if node.kind() == "ForOfStatement" {
                    out.push(Stmt::ForOf(ForOfStmt {
                        var,
                        iterable: right,
                        body,
                    }));
                } else {
                    out.push(Stmt::ForIn(ForInStmt {
                        var,
                        object: right,
                        body,
                    }));
                }
            }
            "BreakStatement" => {
                if node.has("label") {
                    self.diags
                        .warn("labelled break lowered as plain break", node.span());
                }
                out.push(Stmt::Break);
            }
            "ContinueStatement" => {
                if node.has("label") {
                    self.diags
                        .warn("labelled continue lowered as plain continue", node.span());
                }
                out.push(Stmt::Continue);
            }
            "ThrowStatement" => {
                let value = match node.child("argument") {
                    Some(a) => self.lower_expr(a),
                    None => self.placeholder("throw without argument", node.span()),
                };
                out.push(Stmt::Throw(value));
            }
            "TryStatement" => {
                let try_block = match node.child("block") {
                    Some(b) => self.lower_stmt_list(&b.children("body")),
                    None => Vec::new(),
                };
                let mut catches = Vec::new();
                if let Some(handler) = node.child("handler") {
                    let var_name = handler
                        .child("param")
                        .and_then(|p| p.name())
                        .unwrap_or("e")
                        .to_string();
                    let body = match handler.child("body") {
                        Some(b) => self.lower_stmt_list(&b.children("body")),
                        None => Vec::new(),
                    };
                    catches.push(CatchClause {
                        ex_type: None,
                        var_name,
                        body,
                    });
                }
                let finally = node
                    .child("finalizer")
                    .map(|f| self.lower_stmt_list(&f.children("body")));
                out.push(Stmt::TryCatch(TryCatchStmt {
                    try_block,
                    catches,
                    finally,
                }));
            }
            "SwitchStatement" => out.push(self.lower_switch(node)),
            "FunctionDeclaration" => {
                // Nested function: bind a lambda so the body stays statement
                // shaped for every target.
                let func = self.lower_function_decl(node);
                out.push(Stmt::VarDecl(VarDeclStmt {
                    kind: VarKind::Const,
                    name: func.name.clone(),
                    ty: Type::Function,
                    init: Some(Expr::typed(
                        ExprKind::Lambda {
                            params: func.params,
                            body: func.body,
                        },
                        Type::Function,
                    )),
                    span: func.span,
                }));
            }
            "LabeledStatement" => {
                self.diags
                    .warn("label dropped from labelled statement", node.span());
                if let Some(body) = node.child("body") {
                    self.lower_stmt_into(body, out);
                }
            }
            "EmptyStatement" => {}
            other => {
                let ph = self.placeholder(&format!("statement {other}"), node.span());
                out.push(Stmt::Expr(ph));
            }
        }
    }

    fn lower_stmt_as_block(&mut self, node: SourceNode<'_>) -> Vec<Stmt> {
        if node.kind() == "BlockStatement" {
            self.lower_stmt_list(&node.children("body"))
        } else {
            let mut out = Vec::new();
            self.lower_stmt_into(node, &mut out);
            out
        }
    }

    fn lower_var_declaration(&mut self, node: SourceNode<'_>, out: &mut Vec<Stmt>) {
        let kind = match node.str_field("kind") {
            Some("const") => VarKind::Const,
            _ => VarKind::Let,
        };
        for declarator in node.children("declarations") {
            let Some(id) = declarator.child("id") else {
                continue;
            };
            match id.kind() {
                "ArrayPattern" => {
                    // `const [a, b] = arr` → one VarDecl per element.
                    let init = match declarator.child("init") {
                        Some(init) => self.lower_expr(init),
                        None => {
                            self.diags.warn(
                                "array destructuring without initialiser",
                                declarator.span(),
                            );
                            continue;
                        }
                    };
                    for (i, elem) in id.children_with_holes("elements").iter().enumerate() {
                        let Some(elem) = elem else { continue };
                        let Some(name) = elem.name() else { continue };
                        out.push(Stmt::VarDecl(VarDeclStmt {
                            kind,
                            name: name.to_string(),
                            ty: Type::Any,
                            init: Some(element_of(init.clone(), i)),
                            span: elem.span(),
                        }));
                    }
                }
                "ObjectPattern" => {
                    let init = match declarator.child("init") {
                        Some(init) => self.lower_expr(init),
                        None => continue,
                    };
                    for prop in id.children("properties") {
                        let Some(key) = prop.child("key").and_then(|k| k.name()) else {
                            continue;
                        };
                        out.push(Stmt::VarDecl(VarDeclStmt {
                            kind,
                            name: key.to_string(),
                            ty: Type::Any,
                            init: Some(Expr::new(ExprKind::Member {
                                target: Box::new(init.clone()),
                                name: key.to_string(),
                                optional: false,
                            })),
                            span: prop.span(),
                        }));
                    }
                }
                _ => {
                    let Some(name) = id.name() else { continue };
                    let init = declarator.child("init").map(|i| self.lower_expr(i));
                    out.push(Stmt::VarDecl(VarDeclStmt {
                        kind,
                        name: name.to_string(),
                        ty: Type::Any,
                        init,
                        span: declarator.span(),
                    }));
                }
            }
        }
    }

    /// Lower a switch, folding fall-through-only cases into shared pattern
    /// lists and dropping each body's terminal `break`.
    fn lower_switch(&mut self, node: SourceNode<'_>) -> Stmt {
        let subject = match node.child("discriminant") {
            Some(d) => self.lower_expr(d),
            None => self.placeholder("switch without discriminant", node.span()),
        };
        let mut cases: Vec<SwitchCase> = Vec::new();
        let mut default: Option<Vec<Stmt>> = None;
        let mut pending_patterns: Vec<Expr> = Vec::new();

        for case in node.children("cases") {
            let test = case.child("test").map(|t| self.lower_expr(t));
            let raw_body = case.children("consequent");
            if raw_body.is_empty() {
                // Empty case falls through into the next arm's body.
                if let Some(test) = test {
                    pending_patterns.push(test);
                }
                continue;
            }
            let mut body = self.lower_stmt_list(&raw_body);
            let had_break = matches!(body.last(), Some(Stmt::Break));
            if had_break {
                body.pop();
            } else if !matches!(body.last(), Some(Stmt::Return(_) | Stmt::Throw(_)))
                && test.is_some()
            {
                self.diags.warn(
                    "switch case falls through into the next case; lowered as a closed arm",
                    case.span(),
                );
            }
            match test {
                Some(test) => {
                    let mut patterns = std::mem::take(&mut pending_patterns);
                    patterns.push(test);
                    cases.push(SwitchCase { patterns, body });
                }
                None => {
                    if !pending_patterns.is_empty() {
                        let patterns = std::mem::take(&mut pending_patterns);
                        cases.push(SwitchCase {
                            patterns,
                            body: body.clone(),
                        });
                    }
                    default = Some(body);
                }
            }
        }
        if !pending_patterns.is_empty() {
            // Trailing empty cases with no body act like the default.
            cases.push(SwitchCase {
                patterns: pending_patterns,
                body: Vec::new(),
            });
        }
        Stmt::Switch(SwitchStmt {
            subject,
            cases,
            default,
        })
    }

    // ── Expressions ──

    fn lower_expr(&mut self, node: SourceNode<'_>) -> Expr {
        let span = node.span();
        let expr = self.lower_expr_inner(node);
        expr.with_span(span)
    }

    fn lower_expr_inner(&mut self, node: SourceNode<'_>) -> Expr {
        match node.kind() {
            "Literal" => self.lower_literal(node),
            "Identifier" => self.lower_identifier(node),
            "TemplateLiteral" => self.lower_template(node),
            "TaggedTemplateExpression" => {
                self.placeholder("tagged template literal", node.span())
            }
            "BinaryExpression" | "LogicalExpression" => self.lower_binary(node),
            "UnaryExpression" => self.lower_unary(node),
            "UpdateExpression" => self.lower_update(node),
            "AssignmentExpression" => self.lower_assignment(node),
            "ConditionalExpression" => {
                let cond = self.lower_child_expr(node, "test");
                let then_val = self.lower_child_expr(node, "consequent");
                let else_val = self.lower_child_expr(node, "alternate");
                Expr::new(ExprKind::Conditional {
                    cond: Box::new(cond),
                    then_val: Box::new(then_val),
                    else_val: Box::new(else_val),
                })
            }
            "SequenceExpression" => {
                let exprs = node
                    .children("expressions")
                    .iter()
                    .map(|e| self.lower_expr(*e))
                    .collect();
                Expr::new(ExprKind::Sequence(exprs))
            }
            "ParenthesizedExpression" => {
                let inner = self.lower_child_expr(node, "expression");
                Expr::new(ExprKind::Paren(Box::new(inner)))
            }
            "MemberExpression" | "OptionalMemberExpression" => self.lower_member(node),
            "CallExpression" | "OptionalCallExpression" => self.lower_call(node),
            "NewExpression" => self.lower_new(node),
            "ArrowFunctionExpression" | "FunctionExpression" => {
                let params = self.lower_params(&node.children("params"));
                let body = self.lower_function_body(node);
                Expr::typed(ExprKind::Lambda { params, body }, Type::Function)
            }
            "ArrayExpression" => {
                let elements = node
                    .children_with_holes("elements")
                    .into_iter()
                    .map(|e| match e {
                        Some(e) if e.raw_kind() == "SpreadElement" => {
                            let arg = self.lower_child_expr(e, "argument");
                            Expr::new(ExprKind::Spread(Box::new(arg)))
                        }
                        Some(e) => self.lower_expr(e),
                        None => Expr::typed(ExprKind::Literal(Literal::Null), Type::Null),
                    })
                    .collect();
                Expr::new(ExprKind::ArrayLit(elements))
            }
            "ObjectExpression" => {
                let mut entries = Vec::new();
                for prop in node.children("properties") {
                    if prop.raw_kind() == "SpreadElement" {
                        return self.placeholder("object spread", prop.span());
                    }
                    let key = match prop.child("key") {
                        Some(key) => match key.kind() {
                            "Identifier" => {
                                ObjectKey::Ident(key.name().unwrap_or("_key").to_string())
                            }
                            "Literal" => match key.literal_value() {
                                Some(Value::String(s)) => ObjectKey::Str(s.clone()),
                                Some(Value::Number(n)) => {
                                    ObjectKey::Int(n.as_i64().unwrap_or(0))
                                }
                                _ => ObjectKey::Str(String::new()),
                            },
                            _ => return self.placeholder("computed object key", prop.span()),
                        },
                        None => continue,
                    };
                    let value = self.lower_child_expr(prop, "value");
                    entries.push((key, value));
                }
                Expr::typed(ExprKind::ObjectLit(entries), Type::Object)
            }
            "SpreadElement" => {
                let arg = self.lower_child_expr(node, "argument");
                Expr::new(ExprKind::Spread(Box::new(arg)))
            }
            "ThisExpression" => Expr::new(ExprKind::This),
            "Super" => Expr::new(ExprKind::Super),
            "AwaitExpression" => {
                let arg = self.lower_child_expr(node, "argument");
                Expr::new(ExprKind::Await(Box::new(arg)))
            }
            "YieldExpression" => {
                let value = node.child("argument").map(|a| Box::new(self.lower_expr(a)));
                Expr::new(ExprKind::Yield {
                    value,
                    delegate: node.bool_field("delegate"),
                })
            }
            other => self.placeholder(&format!("expression {other}"), node.span()),
        }
    }

    fn lower_child_expr(&mut self, node: SourceNode<'_>, field: &str) -> Expr {
        match node.child(field) {
            Some(child) => self.lower_expr(child),
            None => self.placeholder(&format!("missing {field}"), node.span()),
        }
    }

    fn lower_literal(&mut self, node: SourceNode<'_>) -> Expr {
        if let Some(digits) = node.bigint_digits() {
            return lower_bigint_digits(digits);
        }
        match node.literal_value() {
            Some(Value::Number(n)) => {
                if let Some(i) = n.as_i64() {
                    // Integer-valued source numbers stay integers unless the
                    // raw text spells a float.
                    let raw_is_float = node
                        .str_field("raw")
                        .is_some_and(|raw| raw.contains('.') || raw.contains('e'));
                    if raw_is_float {
                        Expr::typed(ExprKind::Literal(Literal::Float(i as f64)), Type::Float)
                    } else {
                        Expr::typed(ExprKind::Literal(Literal::Int(i)), Type::Int)
                    }
                } else {
                    let f = n.as_f64().unwrap_or(0.0);
                    Expr::typed(ExprKind::Literal(Literal::Float(f)), Type::Float)
                }
            }
            Some(Value::String(s)) => {
                Expr::typed(ExprKind::Literal(Literal::Str(s.clone())), Type::String)
            }
            Some(Value::Bool(b)) => Expr::typed(ExprKind::Literal(Literal::Bool(*b)), Type::Bool),
            Some(Value::Null) | None => {
                if node.has("regex") {
                    return self.placeholder("regex literal", node.span());
                }
                Expr::typed(ExprKind::Literal(Literal::Null), Type::Null)
            }
            Some(_) => self.placeholder("unrecognised literal", node.span()),
        }
    }

    fn lower_identifier(&mut self, node: SourceNode<'_>) -> Expr {
        let name = node.name().unwrap_or("");
        match name {
            "undefined" => Expr::typed(ExprKind::Literal(Literal::Null), Type::Null),
            "NaN" => Expr::typed(ExprKind::NumberConstant(NumberConst::NaN), Type::Float),
            "Infinity" => Expr::typed(
                ExprKind::NumberConstant(NumberConst::PositiveInfinity),
                Type::Float,
            ),
            _ => {
                if let Some(dep) = self.import_aliases.get(name) {
                    // Destructured import: rewrite to a direct reference.
                    return Expr::new(ExprKind::Member {
                        target: Box::new(Expr::new(ExprKind::Ident(dep.clone()))),
                        name: name.to_string(),
                        optional: false,
                    });
                }
                Expr::new(ExprKind::Ident(name.to_string()))
            }
        }
    }

    fn lower_template(&mut self, node: SourceNode<'_>) -> Expr {
        let quasis = node.children("quasis");
        let exprs = node.children("expressions");
        let mut parts = Vec::new();
        for (i, quasi) in quasis.iter().enumerate() {
            let cooked = quasi
                .value()
                .get("value")
                .and_then(|v| v.get("cooked"))
                .and_then(Value::as_str)
                .unwrap_or("");
            if !cooked.is_empty() {
                parts.push(InterpPart::Str(cooked.to_string()));
            }
            if let Some(expr) = exprs.get(i) {
                parts.push(InterpPart::Expr(self.lower_expr(*expr)));
            }
        }
        Expr::typed(ExprKind::StringInterpolation(parts), Type::String)
    }

    fn lower_binary(&mut self, node: SourceNode<'_>) -> Expr {
        let op_str = node.str_field("operator").unwrap_or("");
        let left = self.lower_child_expr(node, "left");
        let right = self.lower_child_expr(node, "right");
        if op_str == "instanceof" {
            let class_name = match &right.kind {
                ExprKind::Ident(name) => name.clone(),
                _ => return self.placeholder("instanceof with non-identifier class", node.span()),
            };
            return Expr::typed(
                ExprKind::InstanceOf {
                    value: Box::new(left),
                    class_name,
                },
                Type::Bool,
            );
        }
        if op_str == "??" {
            // `a ?? b` → `a === null ? b : a`; the clone is the IL's
            // sanctioned way to reuse a subtree.
            let is_null = Expr::typed(
                ExprKind::Binary {
                    op: BinaryOp::StrictEq,
                    left: Box::new(left.clone()),
                    right: Box::new(Expr::typed(ExprKind::Literal(Literal::Null), Type::Null)),
                },
                Type::Bool,
            );
            return Expr::new(ExprKind::Conditional {
                cond: Box::new(is_null),
                then_val: Box::new(right),
                else_val: Box::new(left),
            });
        }
        if op_str == "**" {
            return Expr::new(ExprKind::Power {
                base: Box::new(left),
                exp: Box::new(right),
            });
        }
        let op = match op_str {
            "+" => BinaryOp::Add,
            "-" => BinaryOp::Sub,
            "*" => BinaryOp::Mul,
            "/" => BinaryOp::Div,
            "%" => BinaryOp::Mod,
            "==" => BinaryOp::Eq,
            "!=" => BinaryOp::NotEq,
            "===" => BinaryOp::StrictEq,
            "!==" => BinaryOp::StrictNotEq,
            "<" => BinaryOp::Lt,
            "<=" => BinaryOp::LtEq,
            ">" => BinaryOp::Gt,
            ">=" => BinaryOp::GtEq,
            "&&" => BinaryOp::And,
            "||" => BinaryOp::Or,
            "&" => BinaryOp::BitAnd,
            "|" => BinaryOp::BitOr,
            "^" => BinaryOp::BitXor,
            "<<" => BinaryOp::Shl,
            ">>" => BinaryOp::Shr,
            ">>>" => BinaryOp::UShr,
            other => {
                return self.placeholder(&format!("binary operator {other}"), node.span());
            }
        };
        Expr::new(ExprKind::Binary {
            op,
            left: Box::new(left),
            right: Box::new(right),
        })
    }

    fn lower_unary(&mut self, node: SourceNode<'_>) -> Expr {
        let op_str = node.str_field("operator").unwrap_or("");
        if op_str == "typeof" {
            let operand = self.lower_child_expr(node, "argument");
            return Expr::typed(ExprKind::TypeOf(Box::new(operand)), Type::String);
        }
        let op = match op_str {
            "-" => UnaryOp::Neg,
            "+" => UnaryOp::Plus,
            "!" => UnaryOp::Not,
            "~" => UnaryOp::BitNot,
            other => {
                return self.placeholder(&format!("unary operator {other}"), node.span());
            }
        };
        let operand = self.lower_child_expr(node, "argument");
        Expr::new(ExprKind::Unary {
            op,
            operand: Box::new(operand),
            prefix: node.bool_field("prefix"),
        })
    }

    fn lower_update(&mut self, node: SourceNode<'_>) -> Expr {
        // `i++` / `--i` lower to compound assignment; the value-producing
        // postfix case is rare in the supported subset.
        let op = match node.str_field("operator") {
            Some("++") => AssignOp::Add,
            Some("--") => AssignOp::Sub,
            _ => return self.placeholder("update operator", node.span()),
        };
        let target = self.lower_child_expr(node, "argument");
        Expr::new(ExprKind::Assign {
            op,
            target: Box::new(target),
            value: Box::new(Expr::typed(ExprKind::Literal(Literal::Int(1)), Type::Int)),
        })
    }

    fn lower_assignment(&mut self, node: SourceNode<'_>) -> Expr {
        let op = match node.str_field("operator") {
            Some("=") => AssignOp::Assign,
            Some("+=") => AssignOp::Add,
            Some("-=") => AssignOp::Sub,
            Some("*=") => AssignOp::Mul,
            Some("/=") => AssignOp::Div,
            Some("%=") => AssignOp::Mod,
            Some("<<=") => AssignOp::Shl,
            Some(">>=") => AssignOp::Shr,
            Some(">>>=") => AssignOp::UShr,
            Some("&=") => AssignOp::BitAnd,
            Some("|=") => AssignOp::BitOr,
            Some("^=") => AssignOp::BitXor,
            other => {
                return self.placeholder(
                    &format!("assignment operator {}", other.unwrap_or("?")),
                    node.span(),
                );
            }
        };
        let target = self.lower_child_expr(node, "left");
        let value = self.lower_child_expr(node, "right");
        // `arr.length = 0` is the array-clear idiom.
        if op == AssignOp::Assign {
            if let ExprKind::ArrayLength(inner) = &target.kind {
                if matches!(value.kind, ExprKind::Literal(Literal::Int(0))) {
                    return Expr::typed(ExprKind::ArrayClear(inner.clone()), Type::Void);
                }
            }
        }
        Expr::new(ExprKind::Assign {
            op,
            target: Box::new(target),
            value: Box::new(value),
        })
    }

    fn lower_member(&mut self, node: SourceNode<'_>) -> Expr {
        let Some(object) = node.child("object") else {
            return self.placeholder("member access without object", node.span());
        };
        let optional = node.bool_field("optional") || node.raw_kind() == "OptionalMemberExpression";
        if node.bool_field("computed") {
            let target = self.lower_expr(object);
            let index = self.lower_child_expr(node, "property");
            return Expr::new(ExprKind::Element {
                target: Box::new(target),
                index: Box::new(index),
            });
        }
        let Some(prop_name) = node.child("property").and_then(|p| p.name()) else {
            return self.placeholder("member access without property name", node.span());
        };
        // Namespace constants: Math.PI, Number.MAX_SAFE_INTEGER.
        if let Some(ns) = object.name() {
            if object.kind() == "Identifier" && !self.import_aliases.contains_key(ns) {
                if let Some(expr) = builtins::lower_namespace_constant(ns, prop_name) {
                    return expr;
                }
            }
        }
        if object.kind() == "ThisExpression" {
            return Expr::new(ExprKind::ThisProperty(prop_name.to_string()));
        }
        let target = self.lower_expr(object);
        if prop_name == "length" {
            return Expr::typed(ExprKind::ArrayLength(Box::new(target)), Type::Int);
        }
        Expr::new(ExprKind::Member {
            target: Box::new(target),
            name: prop_name.to_string(),
            optional,
        })
    }

    fn lower_new(&mut self, node: SourceNode<'_>) -> Expr {
        let Some(callee) = node.child("callee") else {
            return self.placeholder("new without callee", node.span());
        };
        let args: Vec<Expr> = node
            .children("arguments")
            .iter()
            .map(|a| self.lower_expr(*a))
            .collect();
        let Some(name) = callee.name() else {
            return self.placeholder("new with non-identifier callee", node.span());
        };
        builtins::lower_constructor(self, name, args, node.span())
    }

    fn lower_call(&mut self, node: SourceNode<'_>) -> Expr {
        let Some(callee) = node.child("callee") else {
            return self.placeholder("call without callee", node.span());
        };
        let args: Vec<Expr> = node
            .children("arguments")
            .iter()
            .map(|a| {
                if a.raw_kind() == "SpreadElement" {
                    let inner = self.lower_child_expr(*a, "argument");
                    Expr::new(ExprKind::Spread(Box::new(inner)))
                } else {
                    self.lower_expr(*a)
                }
            })
            .collect();

        // `super(...)`.
        if callee.kind() == "Super" {
            return Expr::new(ExprKind::ParentConstructorCall(args));
        }

        // Bare identifier calls: destructured imports and global builtins.
        if callee.kind() == "Identifier" {
            let name = callee.name().unwrap_or("");
            if let Some(dep) = self.import_aliases.get(name).cloned() {
                if opcodes::is_opcode_namespace(&dep) {
                    return opcodes::lower_opcode_call(self, &dep, name, &args, node.span());
                }
                return Expr::new(ExprKind::Call {
                    callee: Box::new(Expr::new(ExprKind::Member {
                        target: Box::new(Expr::new(ExprKind::Ident(dep))),
                        name: name.to_string(),
                        optional: false,
                    })),
                    args,
                });
            }
            // Global builtins (`BigInt`, `String.fromCharCode` aliases) or a
            // plain user-function call.
            return builtins::lower_global_call(self, name, args, node.span());
        }

        if callee.kind() == "MemberExpression" || callee.kind() == "OptionalMemberExpression" {
            let object = callee.child("object");
            let prop = callee.child("property").and_then(|p| p.name());
            if let (Some(object), Some(method)) = (object, prop) {
                if !callee.bool_field("computed") {
                    // `super.m(...)`.
                    if object.kind() == "Super" {
                        return Expr::new(ExprKind::ParentMethodCall {
                            name: method.to_string(),
                            args,
                        });
                    }
                    // `this.m(...)`.
                    if object.kind() == "ThisExpression" {
                        return Expr::new(ExprKind::ThisMethodCall {
                            name: method.to_string(),
                            args,
                        });
                    }
                    // Namespace calls: OpCodes.*, Math.*, Array.*, ...
                    if object.kind() == "Identifier" {
                        let ns = object.name().unwrap_or("");
                        if opcodes::is_opcode_namespace(ns) {
                            return opcodes::lower_opcode_call(self, ns, method, &args, node.span());
                        }
                        if let Some(expr) =
                            builtins::lower_namespace_call(self, ns, method, &args, node.span())
                        {
                            return expr;
                        }
                    }
                    // Instance method calls: `.push`, `.map`, `.slice`, ...
                    let target = self.lower_expr(object);
                    return builtins::lower_method_call(self, target, method, args, node.span());
                }
            }
        }

        let callee_expr = self.lower_expr(callee);
        Expr::new(ExprKind::Call {
            callee: Box::new(callee_expr),
            args,
        })
    }
}

fn is_function_literal(node: SourceNode<'_>) -> bool {
    matches!(
        node.kind(),
        "FunctionExpression" | "ArrowFunctionExpression"
    )
}

fn element_of(target: Expr, index: usize) -> Expr {
    Expr::new(ExprKind::Element {
        target: Box::new(target),
        index: Box::new(Expr::typed(
            ExprKind::Literal(Literal::Int(index as i64)),
            Type::Int,
        )),
    })
}

/// Parse `BigInt("0x…")`-style digits at lowering time. Values that fit an
/// `i64` become `Int64`-typed integer literals; wider values keep their
/// arbitrary-precision form.
pub(crate) fn lower_bigint_digits(digits: &str) -> Expr {
    let trimmed = digits.trim().trim_end_matches('n');
    let (radix, body) = if let Some(hex) = trimmed
        .strip_prefix("0x")
        .or_else(|| trimmed.strip_prefix("0X"))
    {
        (16, hex)
    } else if let Some(bin) = trimmed
        .strip_prefix("0b")
        .or_else(|| trimmed.strip_prefix("0B"))
    {
        (2, bin)
    } else if let Some(oct) = trimmed
        .strip_prefix("0o")
        .or_else(|| trimmed.strip_prefix("0O"))
    {
        (8, oct)
    } else {
        (10, trimmed)
    };
    match BigInt::from_str_radix(body, radix) {
        Ok(value) => match i64::try_from(&value) {
            Ok(small) => Expr::typed(ExprKind::Literal(Literal::Int(small)), Type::Int64),
            Err(_) => Expr::typed(ExprKind::Literal(Literal::BigInt(value)), Type::Int64),
        },
        Err(_) => Expr::typed(ExprKind::Placeholder(format!("BigInt({digits})")), Type::Any),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn lower_src(ast: Value) -> (Module, Diagnostics) {
        let mut diags = Diagnostics::new();
        let module = lower_program(&ast, "test", &mut diags).expect("lowering failed");
        (module, diags)
    }

    fn program(body: Value) -> Value {
        json!({"type": "Program", "body": body})
    }

    #[test]
    fn test_rejects_non_program_input() {
        let mut diags = Diagnostics::new();
        let err = lower_program(&json!({"type": "Identifier", "name": "x"}), "m", &mut diags)
            .unwrap_err();
        assert!(err.to_string().contains("Identifier"));
    }

    #[test]
    fn test_iife_wrapper_is_unwrapped() {
        let ast = program(json!([{
            "type": "ExpressionStatement",
            "expression": {
                "type": "CallExpression",
                "callee": {
                    "type": "FunctionExpression",
                    "params": [],
                    "body": {"type": "BlockStatement", "body": [{
                        "type": "VariableDeclaration",
                        "kind": "const",
                        "declarations": [{
                            "type": "VariableDeclarator",
                            "id": {"type": "Identifier", "name": "ROUNDS"},
                            "init": {"type": "Literal", "value": 20}
                        }]
                    }]}
                },
                "arguments": []
            }
        }]));
        let (module, _) = lower_src(ast);
        assert_eq!(module.decls.len(), 1);
        match &module.decls[0] {
            Decl::Constant(c) => assert_eq!(c.name, "ROUNDS"),
            other => panic!("expected constant, got {:?}", other),
        }
    }

    #[test]
    fn test_factory_wrapper_second_arg_is_unwrapped() {
        let ast = program(json!([{
            "type": "ExpressionStatement",
            "expression": {
                "type": "CallExpression",
                "callee": {"type": "Identifier", "name": "umdish"},
                "arguments": [
                    {"type": "ThisExpression"},
                    {
                        "type": "FunctionExpression",
                        "params": [{"type": "Identifier", "name": "exports"}],
                        "body": {"type": "BlockStatement", "body": [{
                            "type": "FunctionDeclaration",
                            "id": {"type": "Identifier", "name": "round"},
                            "params": [],
                            "body": {"type": "BlockStatement", "body": []}
                        }]}
                    }
                ]
            }
        }]));
        let (module, _) = lower_src(ast);
        assert!(matches!(&module.decls[0], Decl::Function(f) if f.name == "round"));
    }

    #[test]
    fn test_bigint_parses_at_lowering_time() {
        let small = lower_bigint_digits("0xff");
        assert!(matches!(
            small.kind,
            ExprKind::Literal(Literal::Int(255))
        ));
        assert_eq!(small.ty, Type::Int64);
        let wide = lower_bigint_digits("0xffffffffffffffffff");
        assert!(matches!(wide.kind, ExprKind::Literal(Literal::BigInt(_))));
    }

    #[test]
    fn test_undefined_lowers_to_null_literal() {
        let ast = program(json!([{
            "type": "VariableDeclaration",
            "kind": "const",
            "declarations": [{
                "type": "VariableDeclarator",
                "id": {"type": "Identifier", "name": "x"},
                "init": {"type": "Identifier", "name": "undefined"}
            }]
        }]));
        let (module, _) = lower_src(ast);
        match &module.decls[0] {
            Decl::Constant(c) => {
                assert!(matches!(c.value.kind, ExprKind::Literal(Literal::Null)))
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_switch_break_dropped_and_fallthrough_groups() {
        let ast = program(json!([{
            "type": "FunctionDeclaration",
            "id": {"type": "Identifier", "name": "f"},
            "params": [{"type": "Identifier", "name": "x"}],
            "body": {"type": "BlockStatement", "body": [{
                "type": "SwitchStatement",
                "discriminant": {"type": "Identifier", "name": "x"},
                "cases": [
                    {"type": "SwitchCase", "test": {"type": "Literal", "value": 1}, "consequent": []},
                    {"type": "SwitchCase", "test": {"type": "Literal", "value": 2}, "consequent": [
                        {"type": "ReturnStatement", "argument": {"type": "Literal", "value": 10}}
                    ]},
                    {"type": "SwitchCase", "test": {"type": "Literal", "value": 3}, "consequent": [
                        {"type": "ExpressionStatement", "expression": {"type": "Identifier", "name": "y"}},
                        {"type": "BreakStatement"}
                    ]}
                ]
            }]}
        }]));
        let (module, _) = lower_src(ast);
        let Decl::Function(f) = &module.decls[0] else {
            panic!("expected function");
        };
        let Stmt::Switch(sw) = &f.body[0] else {
            panic!("expected switch");
        };
        assert_eq!(sw.cases.len(), 2);
        assert_eq!(sw.cases[0].patterns.len(), 2); // 1 and 2 share a body
        assert!(
            !sw.cases[1].body.iter().any(|s| matches!(s, Stmt::Break)),
            "terminal break must be dropped"
        );
    }

    #[test]
    fn test_destructured_import_rewrites_to_member() {
        let ast = program(json!([
            {
                "type": "VariableDeclaration",
                "kind": "const",
                "declarations": [{
                    "type": "VariableDeclarator",
                    "id": {"type": "ObjectPattern", "properties": [{
                        "type": "Property",
                        "key": {"type": "Identifier", "name": "Blowfish"},
                        "value": {"type": "Identifier", "name": "Blowfish"}
                    }]},
                    "init": {"type": "Identifier", "name": "Ciphers"}
                }]
            },
            {
                "type": "VariableDeclaration",
                "kind": "const",
                "declarations": [{
                    "type": "VariableDeclarator",
                    "id": {"type": "Identifier", "name": "c"},
                    "init": {"type": "Identifier", "name": "Blowfish"}
                }]
            }
        ]));
        let (module, _) = lower_src(ast);
        // The destructuring itself is dropped; the use site is a member ref.
        assert_eq!(module.decls.len(), 1);
        let Decl::Constant(c) = &module.decls[0] else {
            panic!("expected constant");
        };
        match &c.value.kind {
            ExprKind::Member { target, name, .. } => {
                assert_eq!(name, "Blowfish");
                assert!(matches!(&target.kind, ExprKind::Ident(n) if n == "Ciphers"));
            }
            other => panic!("expected member ref, got {:?}", other),
        }
    }
}
