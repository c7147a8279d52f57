//! Ruby AST → source text.
//!
//! The emitter owns all whitespace: two-space indentation by default, one
//! statement per line, `do ... end` blocks at statement level and inline
//! brace blocks inside expressions. Operands of nested operators are
//! parenthesised unconditionally, so source precedence survives no matter
//! how the tree was built.

use super::ast::*;
use super::runtime;
use crate::backend::{HelperSet, Printer};
use crate::options::{EmitOptions, IndentStyle};

pub fn emit_program(
    program: &RubyProgram,
    helpers: &HelperSet,
    options: &EmitOptions,
    fingerprint: &str,
) -> String {
    let mut p = Printer::new(options, IndentStyle::Spaces2);
    if options.shebang {
        p.line("#!/usr/bin/env ruby");
    }
    p.line("# frozen_string_literal: true");
    p.blank();
    if options.doc_comments {
        p.line(&format!("# Generated by argot ({})", fingerprint));
        p.blank();
    }
    for require in &program.requires {
        p.line(&format!("require '{}'", require));
    }
    if !program.requires.is_empty() {
        p.blank();
    }
    for name in helpers.iter() {
        if let Some(fragment) = runtime::fragment(name) {
            p.fragment(fragment);
            p.blank();
        }
    }
    let mut last_blank = false;
    for stmt in &program.decls {
        if matches!(stmt, RubyStmt::Blank) && last_blank {
            continue;
        }
        last_blank = matches!(stmt, RubyStmt::Blank);
        emit_stmt(&mut p, stmt);
    }
    p.finish()
}

fn emit_block(p: &mut Printer, body: &[RubyStmt]) {
    p.indent();
    for stmt in body {
        emit_stmt(p, stmt);
    }
    p.dedent();
}

fn emit_stmt(p: &mut Printer, stmt: &RubyStmt) {
    match stmt {
        RubyStmt::Class {
            name,
            superclass,
            attr_accessors,
            body,
        } => {
            match superclass {
                Some(superclass) => p.line(&format!("class {} < {}", name, superclass)),
                None => p.line(&format!("class {}", name)),
            }
            p.indent();
            if !attr_accessors.is_empty() {
                let list = attr_accessors
                    .iter()
                    .map(|a| format!(":{}", a))
                    .collect::<Vec<_>>()
                    .join(", ");
                p.line(&format!("attr_accessor {}", list));
                p.blank();
            }
            p.dedent();
            emit_block(p, body);
            p.line("end");
        }
        RubyStmt::Def {
            name,
            on_self,
            params,
            body,
        } => {
            let prefix = if *on_self { "self." } else { "" };
            if params.is_empty() {
                p.line(&format!("def {}{}", prefix, name));
            } else {
                let params = params
                    .iter()
                    .map(|param| match &param.default {
                        Some(default) => format!("{} = {}", param.name, expr_str(default)),
                        None => param.name.clone(),
                    })
                    .collect::<Vec<_>>()
                    .join(", ");
                p.line(&format!("def {}{}({})", prefix, name, params));
            }
            emit_block(p, body);
            p.line("end");
        }
        RubyStmt::ConstAssign { name, value } => {
            p.line(&format!("{} = {}", name, expr_str(value)));
        }
        RubyStmt::Assign { target, op, value } => {
            let spelling = op.unwrap_or("=");
            let spelling = if spelling == "=" { "=" } else { spelling };
            p.line(&format!(
                "{} {} {}",
                assign_target_str(target),
                spelling,
                expr_str(value)
            ));
        }
        RubyStmt::Expr(expr) => {
            // Statement-level iterator calls read better as do ... end.
            if let RubyExpr::MethodCall {
                recv,
                name,
                args,
                block: Some(block),
            } = expr
            {
                if block.body.len() > 1 {
                    let recv_str = recv
                        .as_ref()
                        .map(|r| format!("{}.", receiver_str(r)))
                        .unwrap_or_default();
                    let args_str = if args.is_empty() {
                        String::new()
                    } else {
                        format!(
                            "({})",
                            args.iter().map(expr_str).collect::<Vec<_>>().join(", ")
                        )
                    };
                    let params = if block.params.is_empty() {
                        String::new()
                    } else {
                        format!(" |{}|", block.params.join(", "))
                    };
                    p.line(&format!("{}{}{} do{}", recv_str, name, args_str, params));
                    emit_block(p, &block.body);
                    p.line("end");
                    return;
                }
            }
            p.line(&expr_str(expr));
        }
        RubyStmt::Return(value) => match value {
            Some(value) => p.line(&format!("return {}", expr_str(value))),
            None => p.line("return"),
        },
        RubyStmt::If {
            cond,
            then_body,
            elsifs,
            else_body,
        } => {
            p.line(&format!("if {}", expr_str(cond)));
            emit_block(p, then_body);
            for (cond, body) in elsifs {
                p.line(&format!("elsif {}", expr_str(cond)));
                emit_block(p, body);
            }
            if let Some(else_body) = else_body {
                p.line("else");
                emit_block(p, else_body);
            }
            p.line("end");
        }
        RubyStmt::While { cond, body } => {
            p.line(&format!("while {}", expr_str(cond)));
            emit_block(p, body);
            p.line("end");
        }
        RubyStmt::BeginWhile { body, cond } => {
            p.line("begin");
            emit_block(p, body);
            p.line(&format!("end while {}", expr_str(cond)));
        }
        RubyStmt::Each {
            iterable,
            var,
            body,
            method,
        } => {
            p.line(&format!(
                "{}.{} do |{}|",
                receiver_str(iterable),
                method,
                var
            ));
            emit_block(p, body);
            p.line("end");
        }
        RubyStmt::Break => p.line("break"),
        RubyStmt::Next => p.line("next"),
        RubyStmt::Raise { class, value } => match (class, value) {
            (Some(class), Some(value)) => {
                p.line(&format!("raise {}, {}", class, expr_str(value)))
            }
            (Some(class), None) => p.line(&format!("raise {}", class)),
            (None, Some(value)) => p.line(&format!("raise {}", expr_str(value))),
            (None, None) => p.line("raise"),
        },
        RubyStmt::BeginRescue {
            body,
            rescues,
            ensure_body,
        } => {
            p.line("begin");
            emit_block(p, body);
            for rescue in rescues {
                p.line(&format!("rescue {} => {}", rescue.class, rescue.var));
                emit_block(p, &rescue.body);
            }
            if let Some(ensure_body) = ensure_body {
                p.line("ensure");
                emit_block(p, ensure_body);
            }
            p.line("end");
        }
        RubyStmt::Case {
            subject,
            whens,
            else_body,
        } => {
            p.line(&format!("case {}", expr_str(subject)));
            for (patterns, body) in whens {
                let patterns = patterns.iter().map(expr_str).collect::<Vec<_>>().join(", ");
                p.line(&format!("when {}", patterns));
                emit_block(p, body);
            }
            if let Some(else_body) = else_body {
                p.line("else");
                emit_block(p, else_body);
            }
            p.line("end");
        }
        RubyStmt::Comment(text) => p.line(&format!("# {}", text)),
        RubyStmt::Blank => p.blank(),
    }
}

/// Assignment targets print without the operand-parenthesising the general
/// printer applies.
fn assign_target_str(target: &RubyExpr) -> String {
    match target {
        RubyExpr::MethodCall {
            recv: Some(recv),
            name,
            args,
            ..
        } if name == "[]" => {
            let args = args.iter().map(expr_str).collect::<Vec<_>>().join(", ");
            format!("{}[{}]", receiver_str(recv), args)
        }
        other => expr_str(other),
    }
}

fn receiver_str(expr: &RubyExpr) -> String {
    match expr {
        RubyExpr::Binary { .. }
        | RubyExpr::Ternary { .. }
        | RubyExpr::Unary { .. }
        | RubyExpr::AssignExpr { .. }
        | RubyExpr::Lambda { .. }
        | RubyExpr::Seq(_)
        | RubyExpr::Range { .. }
        | RubyExpr::RangeFrom(_) => format!("({})", expr_str(expr)),
        _ => expr_str(expr),
    }
}

/// Operand of a binary/unary operator: parenthesise anything compound.
fn operand_str(expr: &RubyExpr) -> String {
    match expr {
        RubyExpr::Binary { .. }
        | RubyExpr::Ternary { .. }
        | RubyExpr::AssignExpr { .. }
        | RubyExpr::Seq(_)
        | RubyExpr::Range { .. }
        | RubyExpr::RangeFrom(_) => format!("({})", expr_str(expr)),
        _ => expr_str(expr),
    }
}

fn expr_str(expr: &RubyExpr) -> String {
    match expr {
        RubyExpr::Int(n) => n.to_string(),
        RubyExpr::RawInt(text) => text.clone(),
        RubyExpr::Float(f) => {
            if f.fract() == 0.0 && f.is_finite() {
                format!("{:.1}", f)
            } else {
                f.to_string()
            }
        }
        RubyExpr::Str(s) => quote_str(s),
        RubyExpr::Symbol(name) => format!(":{}", name),
        RubyExpr::Bool(b) => b.to_string(),
        RubyExpr::Nil => "nil".to_string(),
        RubyExpr::Ident(name) => name.clone(),
        RubyExpr::IVar(name) => format!("@{}", name),
        RubyExpr::Const(name) => name.clone(),
        RubyExpr::SelfRef => "self".to_string(),
        RubyExpr::Interp(parts) => {
            let mut out = String::from("\"");
            for part in parts {
                match part {
                    RubyInterpPart::Str(s) => out.push_str(&escape_str(s)),
                    RubyInterpPart::Expr(e) => {
                        out.push_str("#{");
                        out.push_str(&expr_str(e));
                        out.push('}');
                    }
                }
            }
            out.push('"');
            out
        }
        RubyExpr::Array(items) => {
            let items = items.iter().map(expr_str).collect::<Vec<_>>().join(", ");
            format!("[{}]", items)
        }
        RubyExpr::Hash(pairs) => {
            if pairs.is_empty() {
                return "{}".to_string();
            }
            let pairs = pairs
                .iter()
                .map(|(key, value)| match key {
                    RubyExpr::Symbol(name) => format!("{}: {}", name, expr_str(value)),
                    other => format!("{} => {}", expr_str(other), expr_str(value)),
                })
                .collect::<Vec<_>>()
                .join(", ");
            format!("{{ {} }}", pairs)
        }
        RubyExpr::Binary { op, left, right } => {
            format!("{} {} {}", operand_str(left), op, operand_str(right))
        }
        RubyExpr::Unary { op, operand } => format!("{}{}", op, operand_str(operand)),
        RubyExpr::Ternary {
            cond,
            then_val,
            else_val,
        } => format!(
            "{} ? {} : {}",
            operand_str(cond),
            operand_str(then_val),
            operand_str(else_val)
        ),
        RubyExpr::MethodCall {
            recv,
            name,
            args,
            block,
        } => {
            if name == "[]" {
                let recv = recv.as_ref().map(|r| receiver_str(r)).unwrap_or_default();
                let args = args.iter().map(expr_str).collect::<Vec<_>>().join(", ");
                return format!("{}[{}]", recv, args);
            }
            if name == "[]=" {
                if let (Some(recv), [index @ .., value]) = (recv, args.as_slice()) {
                    let index = index.iter().map(expr_str).collect::<Vec<_>>().join(", ");
                    return format!("{}[{}] = {}", receiver_str(recv), index, expr_str(value));
                }
            }
            let mut out = String::new();
            if let Some(recv) = recv {
                out.push_str(&receiver_str(recv));
                out.push('.');
            }
            out.push_str(name);
            if !args.is_empty() {
                out.push('(');
                out.push_str(&args.iter().map(expr_str).collect::<Vec<_>>().join(", "));
                out.push(')');
            }
            if let Some(block) = block {
                out.push_str(" { ");
                if !block.params.is_empty() {
                    out.push('|');
                    out.push_str(&block.params.join(", "));
                    out.push_str("| ");
                }
                out.push_str(&stmts_inline(&block.body));
                out.push_str(" }");
            }
            out
        }
        RubyExpr::Index { recv, index } => {
            format!("{}[{}]", receiver_str(recv), expr_str(index))
        }
        RubyExpr::Range {
            start,
            end,
            exclusive,
        } => format!(
            "{}{}{}",
            operand_str(start),
            if *exclusive { "..." } else { ".." },
            operand_str(end)
        ),
        RubyExpr::RangeFrom(start) => format!("{}..", operand_str(start)),
        RubyExpr::Lambda { params, body } => {
            let params = if params.is_empty() {
                String::new()
            } else {
                format!(
                    "({})",
                    params
                        .iter()
                        .map(|param| param.name.clone())
                        .collect::<Vec<_>>()
                        .join(", ")
                )
            };
            format!("->{} {{ {} }}", params, stmts_inline(body))
        }
        RubyExpr::AssignExpr { target, value } => {
            format!("{} = {}", assign_target_str(target), expr_str(value))
        }
        RubyExpr::Super(args) => {
            if args.is_empty() {
                "super()".to_string()
            } else {
                format!(
                    "super({})",
                    args.iter().map(expr_str).collect::<Vec<_>>().join(", ")
                )
            }
        }
        RubyExpr::Paren(inner) => format!("({})", expr_str(inner)),
        RubyExpr::Splat(inner) => format!("*{}", operand_str(inner)),
        RubyExpr::Seq(exprs) => format!(
            "({})",
            exprs.iter().map(expr_str).collect::<Vec<_>>().join("; ")
        ),
    }
}

/// Inline form of a block body (`a; b; c`), used inside brace blocks and
/// lambda literals.
fn stmts_inline(body: &[RubyStmt]) -> String {
    body.iter()
        .filter_map(stmt_inline)
        .collect::<Vec<_>>()
        .join("; ")
}

/// Single-line spelling of one statement, for brace blocks and lambda
/// literals. Every Ruby statement form has one.
fn stmt_inline(stmt: &RubyStmt) -> Option<String> {
    match stmt {
        RubyStmt::Expr(e) => Some(expr_str(e)),
        RubyStmt::Return(Some(e)) => Some(expr_str(e)),
        RubyStmt::Return(None) => Some("return".to_string()),
        RubyStmt::Assign { target, op, value } => Some(format!(
            "{} {} {}",
            assign_target_str(target),
            op.unwrap_or("="),
            expr_str(value)
        )),
        RubyStmt::ConstAssign { name, value } => {
            Some(format!("{} = {}", name, expr_str(value)))
        }
        RubyStmt::Break => Some("break".to_string()),
        RubyStmt::Next => Some("next".to_string()),
        RubyStmt::Raise { class, value } => Some(match (class, value) {
            (Some(class), Some(value)) => format!("raise {}, {}", class, expr_str(value)),
            (Some(class), None) => format!("raise {}", class),
            (None, Some(value)) => format!("raise {}", expr_str(value)),
            (None, None) => "raise".to_string(),
        }),
        RubyStmt::If {
            cond,
            then_body,
            elsifs,
            else_body,
        } => {
            let mut out = format!("if {} then {}", expr_str(cond), stmts_inline(then_body));
            for (cond, body) in elsifs {
                out.push_str(&format!(" elsif {} then {}", expr_str(cond), stmts_inline(body)));
            }
            if let Some(else_body) = else_body {
                out.push_str(&format!(" else {}", stmts_inline(else_body)));
            }
            out.push_str(" end");
            Some(out)
        }
        RubyStmt::While { cond, body } => Some(format!(
            "while {} do {} end",
            expr_str(cond),
            stmts_inline(body)
        )),
        RubyStmt::BeginWhile { body, cond } => Some(format!(
            "begin; {}; end while {}",
            stmts_inline(body),
            expr_str(cond)
        )),
        RubyStmt::Each {
            iterable,
            var,
            body,
            method,
        } => Some(format!(
            "{}.{} {{ |{}| {} }}",
            receiver_str(iterable),
            method,
            var,
            stmts_inline(body)
        )),
        RubyStmt::Case {
            subject,
            whens,
            else_body,
        } => {
            let mut out = format!("case {}", expr_str(subject));
            for (patterns, body) in whens {
                let patterns = patterns.iter().map(expr_str).collect::<Vec<_>>().join(", ");
                out.push_str(&format!(" when {} then {}", patterns, stmts_inline(body)));
            }
            if let Some(else_body) = else_body {
                out.push_str(&format!(" else {}", stmts_inline(else_body)));
            }
            out.push_str(" end");
            Some(out)
        }
        RubyStmt::BeginRescue {
            body,
            rescues,
            ensure_body,
        } => {
            let mut out = format!("begin; {}", stmts_inline(body));
            for rescue in rescues {
                out.push_str(&format!(
                    "; rescue {} => {}; {}",
                    rescue.class,
                    rescue.var,
                    stmts_inline(&rescue.body)
                ));
            }
            if let Some(ensure_body) = ensure_body {
                out.push_str(&format!("; ensure; {}", stmts_inline(ensure_body)));
            }
            out.push_str("; end");
            Some(out)
        }
        RubyStmt::Blank | RubyStmt::Comment(_) => None,
        // Class and method definitions never appear inside blocks.
        RubyStmt::Class { .. } | RubyStmt::Def { .. } => None,
    }
}

fn quote_str(s: &str) -> String {
    format!("\"{}\"", escape_str(s))
}

fn escape_str(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for ch in s.chars() {
        match ch {
            '"' => out.push_str("\\\""),
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '\t' => out.push_str("\\t"),
            '\r' => out.push_str("\\r"),
            '#' => out.push_str("\\#"),
            other => out.push(other),
        }
    }
    out
}
