//! C AST → source text.
//!
//! Prologue order is fixed: banner, includes, framework stubs, runtime
//! helpers, forward declarations, topologically-sorted struct definitions,
//! globals, prototypes, then function bodies. Struct sorting places every
//! value-field dependency before its dependent; a surviving cycle falls
//! back to declaration order with a warning comment.

use super::ast::*;
use super::runtime;
use crate::backend::{HelperSet, Printer};
use crate::diagnostics::Diagnostics;
use crate::options::{EmitOptions, IndentStyle};
use std::collections::{HashMap, HashSet};

pub fn emit_program(
    program: &CProgram,
    helpers: &HelperSet,
    options: &EmitOptions,
    fingerprint: &str,
    diags: &mut Diagnostics,
) -> String {
    let mut p = Printer::new(options, IndentStyle::Spaces4);
    if options.doc_comments {
        p.line(&format!("/* Generated by argot ({}) */", fingerprint));
        p.line(&format!("/* target standard: {} */", options.c_standard));
        p.blank();
    }
    for include in &program.includes {
        p.line(&format!("#include <{}>", include));
    }
    p.blank();
    if helpers.contains("framework_stubs") {
        p.fragment(runtime::FRAMEWORK_STUBS);
        p.blank();
    }
    for name in helpers.iter() {
        if let Some(fragment) = runtime::fragment(name) {
            p.fragment(fragment);
            p.blank();
        }
    }
    if !program.structs.is_empty() {
        for s in &program.structs {
            p.line(&format!("typedef struct {} {};", s.name, s.name));
        }
        p.blank();
        let ordered = topo_sort_structs(&program.structs, diags);
        for s in ordered {
            emit_struct(&mut p, s);
            p.blank();
        }
    }
    for global in &program.globals {
        emit_stmt(&mut p, global);
    }
    if !program.globals.is_empty() {
        p.blank();
    }
    if program.functions.len() > 1 {
        for f in &program.functions {
            p.line(&format!("{};", signature(f)));
        }
        p.blank();
    }
    for (i, f) in program.functions.iter().enumerate() {
        if i > 0 {
            p.blank();
        }
        p.line(&format!("{} {{", signature(f)));
        p.indent();
        for stmt in &f.body {
            emit_stmt(&mut p, stmt);
        }
        p.dedent();
        p.line("}");
    }
    p.finish()
}

/// Value-field dependencies first. A cycle that survived the transformer's
/// pointer downgrade emits in declaration order with a warning.
fn topo_sort_structs<'a>(structs: &'a [CStruct], diags: &mut Diagnostics) -> Vec<&'a CStruct> {
    let names: HashSet<&str> = structs.iter().map(|s| s.name.as_str()).collect();
    let mut deps: HashMap<&str, Vec<&str>> = HashMap::new();
    for s in structs {
        let entry = deps.entry(s.name.as_str()).or_default();
        for f in &s.fields {
            // Pointer fields need only the forward declaration.
            if !f.ty.contains('*') && names.contains(f.ty.as_str()) {
                entry.push(f.ty.as_str());
            }
        }
    }
    let mut ordered: Vec<&CStruct> = Vec::new();
    let mut placed: HashSet<&str> = HashSet::new();
    let mut remaining: Vec<&CStruct> = structs.iter().collect();
    while !remaining.is_empty() {
        let before = ordered.len();
        let mut deferred = Vec::new();
        for s in remaining {
            if deps[s.name.as_str()].iter().all(|d| placed.contains(d)) {
                placed.insert(s.name.as_str());
                ordered.push(s);
            } else {
                deferred.push(s);
            }
        }
        if ordered.len() == before {
            diags.warn(
                "struct dependency cycle; definitions emitted in declaration order and may not compile",
                None,
            );
            ordered.extend(deferred);
            break;
        }
        remaining = deferred;
    }
    ordered
}

fn emit_struct(p: &mut Printer, s: &CStruct) {
    p.line(&format!("struct {} {{", s.name));
    p.indent();
    for f in &s.fields {
        match &f.array_len {
            Some(len) => p.line(&format!("{} {}[{}];", f.ty.trim_end(), f.name, len)),
            None => p.line(&format!("{}{};", declarator(&f.ty), f.name)),
        }
    }
    p.dedent();
    p.line("};");
}

fn signature(f: &CFunction) -> String {
    let params = if f.params.is_empty() {
        "void".to_string()
    } else {
        f.params
            .iter()
            .map(|param| format!("{}{}", declarator(&param.ty), param.name))
            .collect::<Vec<_>>()
            .join(", ")
    };
    format!("{}{}({})", declarator(&f.ret), f.name, params)
}

/// `uint8_t *` keeps the pointer glued to the name; plain types get a space.
fn declarator(ty: &str) -> String {
    if ty.ends_with('*') {
        ty.to_string()
    } else {
        format!("{} ", ty)
    }
}

fn emit_stmt(p: &mut Printer, stmt: &CStmt) {
    match stmt {
        CStmt::Decl {
            ty,
            name,
            array_len,
            init,
        } => {
            let head = match array_len {
                Some(len) => format!("{} {}[{}]", ty.trim_end(), name, len),
                None => format!("{}{}", declarator(ty), name),
            };
            match init {
                Some(init) => p.line(&format!("{} = {};", head, expr_str(init))),
                None => p.line(&format!("{};", head)),
            }
        }
        CStmt::Expr(expr) => p.line(&format!("{};", expr_str(expr))),
        CStmt::Return(value) => match value {
            Some(value) => p.line(&format!("return {};", expr_str(value))),
            None => p.line("return;"),
        },
        CStmt::If {
            cond,
            then_body,
            else_body,
        } => {
            p.line(&format!("if ({}) {{", expr_str(cond)));
            emit_block(p, then_body);
            match else_body {
                Some(else_body) => {
                    p.line("} else {");
                    emit_block(p, else_body);
                    p.line("}");
                }
                None => p.line("}"),
            }
        }
        CStmt::While { cond, body } => {
            p.line(&format!("while ({}) {{", expr_str(cond)));
            emit_block(p, body);
            p.line("}");
        }
        CStmt::DoWhile { body, cond } => {
            p.line("do {");
            emit_block(p, body);
            p.line(&format!("}} while ({});", expr_str(cond)));
        }
        CStmt::For {
            init,
            cond,
            update,
            body,
        } => {
            let init_str = init.as_ref().map(|s| stmt_inline(s)).unwrap_or_default();
            let cond_str = cond.as_ref().map(expr_str).unwrap_or_default();
            let update_str = update.as_ref().map(expr_str).unwrap_or_default();
            p.line(&format!(
                "for ({}; {}; {}) {{",
                init_str, cond_str, update_str
            ));
            emit_block(p, body);
            p.line("}");
        }
        CStmt::Break => p.line("break;"),
        CStmt::Continue => p.line("continue;"),
        CStmt::Switch {
            subject,
            cases,
            default,
        } => {
            p.line(&format!("switch ({}) {{", expr_str(subject)));
            for (patterns, body) in cases {
                for pattern in patterns {
                    p.line(&format!("case {}:", expr_str(pattern)));
                }
                emit_block(p, body);
                if needs_break(body) {
                    p.indent();
                    p.line("break;");
                    p.dedent();
                }
            }
            if let Some(default) = default {
                p.line("default:");
                emit_block(p, default);
                if needs_break(default) {
                    p.indent();
                    p.line("break;");
                    p.dedent();
                }
            }
            p.line("}");
        }
        CStmt::Block(body) => {
            p.line("{");
            emit_block(p, body);
            p.line("}");
        }
        CStmt::Comment(text) => p.line(&format!("/* {} */", text)),
        CStmt::Blank => p.blank(),
    }
}

fn emit_block(p: &mut Printer, body: &[CStmt]) {
    p.indent();
    for stmt in body {
        emit_stmt(p, stmt);
    }
    p.dedent();
}

fn needs_break(body: &[CStmt]) -> bool {
    !matches!(
        body.last(),
        Some(CStmt::Return(_)) | Some(CStmt::Break) | Some(CStmt::Continue)
    )
}

fn stmt_inline(stmt: &CStmt) -> String {
    match stmt {
        CStmt::Decl {
            ty,
            name,
            array_len: _,
            init,
        } => match init {
            Some(init) => format!("{}{} = {}", declarator(ty), name, expr_str(init)),
            None => format!("{}{}", declarator(ty), name),
        },
        CStmt::Expr(expr) => expr_str(expr),
        _ => String::new(),
    }
}

fn operand_str(expr: &CExpr) -> String {
    match expr {
        CExpr::Binary { .. }
        | CExpr::Ternary { .. }
        | CExpr::Assign { .. }
        | CExpr::Comma(_)
        | CExpr::Cast { .. } => format!("({})", expr_str(expr)),
        _ => expr_str(expr),
    }
}

fn expr_str(expr: &CExpr) -> String {
    match expr {
        CExpr::Num(text) => text.clone(),
        CExpr::Str(text) => format!("\"{}\"", text),
        CExpr::Char(c) => format!("'{}'", c),
        CExpr::Ident(name) => name.clone(),
        CExpr::Call { callee, args } => {
            let args = args.iter().map(expr_str).collect::<Vec<_>>().join(", ");
            format!("{}({})", operand_str(callee), args)
        }
        CExpr::Member {
            recv,
            name,
            pointer,
        } => {
            let sep = if *pointer { "->" } else { "." };
            format!("{}{}{}", operand_str(recv), sep, name)
        }
        CExpr::Subscript { recv, index } => {
            format!("{}[{}]", operand_str(recv), expr_str(index))
        }
        CExpr::Binary { op, left, right } => {
            format!("{} {} {}", operand_str(left), op, operand_str(right))
        }
        CExpr::Unary {
            op,
            operand,
            prefix,
        } => {
            if *prefix {
                format!("{}{}", op, operand_str(operand))
            } else {
                format!("{}{}", operand_str(operand), op)
            }
        }
        CExpr::Assign { op, target, value } => {
            // Compound-literal stores regain their type through the
            // `__typeof__` of the assignment target.
            if let CExpr::CompoundLit { ty, fields } = value.as_ref() {
                if ty.is_empty() {
                    let target_str = expr_str(target);
                    return format!(
                        "{} {} (__typeof__({})){}",
                        target_str,
                        op,
                        target_str,
                        braces(fields)
                    );
                }
            }
            format!("{} {} {}", expr_str(target), op, expr_str(value))
        }
        CExpr::Ternary {
            cond,
            then_val,
            else_val,
        } => format!(
            "{} ? {} : {}",
            operand_str(cond),
            operand_str(then_val),
            operand_str(else_val)
        ),
        CExpr::Cast { ty, value } => format!("({}){}", ty.trim_end(), operand_str(value)),
        CExpr::CompoundLit { ty, fields } => {
            if ty.is_empty() {
                braces(fields)
            } else {
                format!("({}){}", ty, braces(fields))
            }
        }
        CExpr::AddrOf(inner) => format!("&{}", operand_str(inner)),
        CExpr::Deref(inner) => format!("*{}", operand_str(inner)),
        CExpr::SizeOf(ty) => format!("sizeof({})", ty.trim_end()),
        CExpr::Comma(exprs) => format!(
            "({})",
            exprs.iter().map(expr_str).collect::<Vec<_>>().join(", ")
        ),
        CExpr::Paren(inner) => format!("({})", expr_str(inner)),
    }
}

fn braces(fields: &[(Option<String>, CExpr)]) -> String {
    let body = fields
        .iter()
        .map(|(name, value)| match name {
            Some(name) => format!(".{} = {}", name, expr_str(value)),
            None => expr_str(value),
        })
        .collect::<Vec<_>>()
        .join(", ");
    format!("{{{}}}", body)
}
