//! TypeScript AST → source text.
//!
//! Two-space indentation by default, no prologue unless helpers are needed.
//! `switch` cases regain their `break` statements here; the IL carries
//! structured cases without them.

use super::ast::*;
use super::runtime;
use crate::backend::{HelperSet, Printer};
use crate::options::{EmitOptions, IndentStyle};

pub fn emit_program(
    program: &TsProgram,
    helpers: &HelperSet,
    options: &EmitOptions,
    fingerprint: &str,
) -> String {
    let mut p = Printer::new(options, IndentStyle::Spaces2);
    if options.doc_comments {
        p.line(&format!("// Generated by argot ({})", fingerprint));
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
        if matches!(stmt, TsStmt::Blank) && last_blank {
            continue;
        }
        last_blank = matches!(stmt, TsStmt::Blank);
        emit_stmt(&mut p, stmt);
    }
    p.finish()
}

fn emit_block(p: &mut Printer, body: &[TsStmt]) {
    p.indent();
    for stmt in body {
        emit_stmt(p, stmt);
    }
    p.dedent();
}

fn emit_stmt(p: &mut Printer, stmt: &TsStmt) {
    match stmt {
        TsStmt::Class {
            name,
            extends,
            fields,
            methods,
        } => {
            let header = match extends {
                Some(base) => format!("class {} extends {} {{", name, base),
                None => format!("class {} {{", name),
            };
            p.line(&header);
            p.indent();
            for field in fields {
                let stat = if field.is_static { "static " } else { "public " };
                match &field.init {
                    Some(init) => p.line(&format!(
                        "{}{}: {} = {};",
                        stat,
                        field.name,
                        field.ty,
                        expr_str(init)
                    )),
                    None => p.line(&format!("{}{}: {};", stat, field.name, field.ty)),
                }
            }
            if !fields.is_empty() && !methods.is_empty() {
                p.blank();
            }
            for (i, method) in methods.iter().enumerate() {
                if i > 0 {
                    p.blank();
                }
                emit_method(p, method);
            }
            p.dedent();
            p.line("}");
            // A lowered `static {}` block runs immediately after the class.
            if methods.iter().any(|m| m.name == "__staticInit") {
                p.line(&format!("{}.__staticInit();", name));
            }
        }
        TsStmt::Function {
            name,
            params,
            ret,
            body,
        } => {
            p.line(&format!(
                "function {}({}): {} {{",
                name,
                params_str(params),
                ret
            ));
            emit_block(p, body);
            p.line("}");
        }
        TsStmt::Const { name, ty, value } => match ty {
            Some(ty) => p.line(&format!("const {}: {} = {};", name, ty, expr_str(value))),
            None => p.line(&format!("const {} = {};", name, expr_str(value))),
        },
        TsStmt::Let { name, ty, value } => {
            let annotation = ty
                .as_ref()
                .map(|ty| format!(": {}", ty))
                .unwrap_or_default();
            match value {
                Some(value) => {
                    p.line(&format!("let {}{} = {};", name, annotation, expr_str(value)))
                }
                None => p.line(&format!("let {}{};", name, annotation)),
            }
        }
        TsStmt::Expr(expr) => p.line(&format!("{};", expr_str(expr))),
        TsStmt::Return(value) => match value {
            Some(value) => p.line(&format!("return {};", expr_str(value))),
            None => p.line("return;"),
        },
        TsStmt::If {
            cond,
            then_body,
            else_body,
        } => {
            p.line(&format!("if ({}) {{", expr_str(cond)));
            emit_block(p, then_body);
            match else_body {
                Some(else_body) if matches!(else_body.as_slice(), [TsStmt::If { .. }]) => {
                    // else-if chain stays flat.
                    p.line("} else {");
                    emit_block(p, else_body);
                    p.line("}");
                }
                Some(else_body) => {
                    p.line("} else {");
                    emit_block(p, else_body);
                    p.line("}");
                }
                None => p.line("}"),
            }
        }
        TsStmt::While { cond, body } => {
            p.line(&format!("while ({}) {{", expr_str(cond)));
            emit_block(p, body);
            p.line("}");
        }
        TsStmt::DoWhile { body, cond } => {
            p.line("do {");
            emit_block(p, body);
            p.line(&format!("}} while ({});", expr_str(cond)));
        }
        TsStmt::For {
            init,
            cond,
            update,
            body,
        } => {
            let init_str = init
                .as_ref()
                .map(|s| stmt_inline(s))
                .unwrap_or_default();
            let cond_str = cond.as_ref().map(expr_str).unwrap_or_default();
            let update_str = update.as_ref().map(expr_str).unwrap_or_default();
            p.line(&format!(
                "for ({}; {}; {}) {{",
                init_str, cond_str, update_str
            ));
            emit_block(p, body);
            p.line("}");
        }
        TsStmt::ForOf {
            var,
            iterable,
            body,
            in_keys,
        } => {
            let keyword = if *in_keys { "in" } else { "of" };
            p.line(&format!(
                "for (const {} {} {}) {{",
                var,
                keyword,
                expr_str(iterable)
            ));
            emit_block(p, body);
            p.line("}");
        }
        TsStmt::Break => p.line("break;"),
        TsStmt::Continue => p.line("continue;"),
        TsStmt::Throw(expr) => p.line(&format!("throw {};", expr_str(expr))),
        TsStmt::TryCatch {
            body,
            catch_var,
            catch_body,
            finally_body,
        } => {
            p.line("try {");
            emit_block(p, body);
            if let Some(catch_body) = catch_body {
                let var = catch_var.as_deref().unwrap_or("e");
                p.line(&format!("}} catch ({}) {{", var));
                emit_block(p, catch_body);
            }
            if let Some(finally_body) = finally_body {
                p.line("} finally {");
                emit_block(p, finally_body);
            }
            p.line("}");
        }
        TsStmt::Switch {
            subject,
            cases,
            default,
        } => {
            p.line(&format!("switch ({}) {{", expr_str(subject)));
            p.indent();
            for (patterns, body) in cases {
                for (i, pattern) in patterns.iter().enumerate() {
                    if i + 1 == patterns.len() {
                        p.line(&format!("case {}: {{", expr_str(pattern)));
                    } else {
                        p.line(&format!("case {}:", expr_str(pattern)));
                    }
                }
                emit_block(p, body);
                if needs_break(body) {
                    p.indent();
                    p.line("break;");
                    p.dedent();
                }
                p.line("}");
            }
            if let Some(default) = default {
                p.line("default: {");
                emit_block(p, default);
                p.line("}");
            }
            p.dedent();
            p.line("}");
        }
        TsStmt::Comment(text) => p.line(&format!("// {}", text)),
        TsStmt::Blank => p.blank(),
    }
}

fn needs_break(body: &[TsStmt]) -> bool {
    !matches!(
        body.last(),
        Some(TsStmt::Return(_)) | Some(TsStmt::Throw(_)) | Some(TsStmt::Break)
    )
}

fn emit_method(p: &mut Printer, method: &TsMethod) {
    let stat = if method.is_static { "static " } else { "" };
    let prefix = match method.kind {
        TsMethodKind::Getter => "get ",
        TsMethodKind::Setter => "set ",
        _ => "",
    };
    let ret = if method.ret.is_empty() || method.kind == TsMethodKind::Setter {
        String::new()
    } else {
        format!(": {}", method.ret)
    };
    p.line(&format!(
        "{}{}{}({}){} {{",
        stat,
        prefix,
        method.name,
        params_str(&method.params),
        ret
    ));
    emit_block(p, &method.body);
    p.line("}");
}

fn params_str(params: &[TsParam]) -> String {
    params
        .iter()
        .map(|param| match &param.default {
            Some(default) => format!("{}: {} = {}", param.name, param.ty, expr_str(default)),
            None => format!("{}: {}", param.name, param.ty),
        })
        .collect::<Vec<_>>()
        .join(", ")
}

/// Inline statement form for `for` headers.
fn stmt_inline(stmt: &TsStmt) -> String {
    match stmt {
        TsStmt::Const { name, ty, value } => match ty {
            Some(ty) => format!("const {}: {} = {}", name, ty, expr_str(value)),
            None => format!("const {} = {}", name, expr_str(value)),
        },
        TsStmt::Let { name, ty, value } => {
            let annotation = ty
                .as_ref()
                .map(|ty| format!(": {}", ty))
                .unwrap_or_default();
            match value {
                Some(value) => format!("let {}{} = {}", name, annotation, expr_str(value)),
                None => format!("let {}{}", name, annotation),
            }
        }
        TsStmt::Expr(expr) => expr_str(expr),
        _ => String::new(),
    }
}

fn operand_str(expr: &TsExpr) -> String {
    match expr {
        TsExpr::Binary { .. }
        | TsExpr::Ternary { .. }
        | TsExpr::Assign { .. }
        | TsExpr::Comma(_)
        | TsExpr::Arrow { .. }
        | TsExpr::Await(_)
        | TsExpr::Yield { .. }
        | TsExpr::As { .. } => format!("({})", expr_str(expr)),
        _ => expr_str(expr),
    }
}

fn receiver_str(expr: &TsExpr) -> String {
    match expr {
        TsExpr::Binary { .. }
        | TsExpr::Ternary { .. }
        | TsExpr::Assign { .. }
        | TsExpr::Comma(_)
        | TsExpr::Arrow { .. }
        | TsExpr::Await(_)
        | TsExpr::Yield { .. }
        | TsExpr::New { .. }
        | TsExpr::As { .. } => format!("({})", expr_str(expr)),
        TsExpr::Num(text) => format!("({})", text),
        _ => expr_str(expr),
    }
}

fn expr_str(expr: &TsExpr) -> String {
    match expr {
        TsExpr::Num(text) => text.clone(),
        TsExpr::Str(s) => quote_str(s),
        TsExpr::Bool(b) => b.to_string(),
        TsExpr::Null => "null".to_string(),
        TsExpr::BigIntLit(text) => text.clone(),
        TsExpr::Ident(name) => name.clone(),
        TsExpr::This => "this".to_string(),
        TsExpr::SuperCall(args) => format!("super({})", args_str(args)),
        TsExpr::SuperMethodCall { name, args } => {
            format!("super.{}({})", name, args_str(args))
        }
        TsExpr::Template(parts) => {
            let mut out = String::from("`");
            for part in parts {
                match part {
                    TsTemplatePart::Str(s) => out.push_str(&escape_template(s)),
                    TsTemplatePart::Expr(e) => {
                        out.push_str("${");
                        out.push_str(&expr_str(e));
                        out.push('}');
                    }
                }
            }
            out.push('`');
            out
        }
        TsExpr::Array(items) => format!("[{}]", args_str(items)),
        TsExpr::Object(entries) => {
            if entries.is_empty() {
                return "{}".to_string();
            }
            let entries = entries
                .iter()
                .map(|(key, value)| format!("{}: {}", key, expr_str(value)))
                .collect::<Vec<_>>()
                .join(", ");
            format!("{{ {} }}", entries)
        }
        TsExpr::Binary { op, left, right } => {
            format!("{} {} {}", operand_str(left), op, operand_str(right))
        }
        TsExpr::Unary {
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
        TsExpr::Assign { op, target, value } => {
            format!("{} {} {}", expr_str(target), op, expr_str(value))
        }
        TsExpr::Ternary {
            cond,
            then_val,
            else_val,
        } => format!(
            "{} ? {} : {}",
            operand_str(cond),
            operand_str(then_val),
            operand_str(else_val)
        ),
        TsExpr::Call { callee, args } => {
            format!("{}({})", receiver_str(callee), args_str(args))
        }
        TsExpr::New { callee, args } => format!("new {}({})", callee, args_str(args)),
        TsExpr::Member {
            recv,
            name,
            optional,
        } => {
            let dot = if *optional { "?." } else { "." };
            format!("{}{}{}", receiver_str(recv), dot, name)
        }
        TsExpr::Index { recv, index } => {
            format!("{}[{}]", receiver_str(recv), expr_str(index))
        }
        TsExpr::Arrow { params, body } => {
            let params = params_str(params);
            match body {
                TsArrowBody::Expr(value) => format!("({}) => {}", params, operand_str(value)),
                TsArrowBody::Block(stmts) => {
                    let inline = stmts
                        .iter()
                        .filter_map(|s| {
                            let text = stmt_inline_full(s);
                            if text.is_empty() {
                                None
                            } else {
                                Some(text)
                            }
                        })
                        .collect::<Vec<_>>()
                        .join(" ");
                    format!("({}) => {{ {} }}", params, inline)
                }
            }
        }
        TsExpr::Paren(inner) => format!("({})", expr_str(inner)),
        TsExpr::Comma(exprs) => format!(
            "({})",
            exprs.iter().map(expr_str).collect::<Vec<_>>().join(", ")
        ),
        TsExpr::Spread(inner) => format!("...{}", operand_str(inner)),
        TsExpr::Await(inner) => format!("await {}", operand_str(inner)),
        TsExpr::Yield { value, delegate } => {
            let star = if *delegate { "*" } else { "" };
            match value {
                Some(value) => format!("yield{} {}", star, operand_str(value)),
                None => format!("yield{}", star),
            }
        }
        TsExpr::TypeOf(inner) => format!("typeof {}", operand_str(inner)),
        TsExpr::InstanceOf { value, class_name } => {
            format!("{} instanceof {}", operand_str(value), class_name)
        }
        TsExpr::As { value, ty } => format!("{} as {}", operand_str(value), ty),
    }
}

/// Full single-line statement spelling, used inside inline arrow blocks.
fn stmt_inline_full(stmt: &TsStmt) -> String {
    match stmt {
        TsStmt::Expr(expr) => format!("{};", expr_str(expr)),
        TsStmt::Return(Some(value)) => format!("return {};", expr_str(value)),
        TsStmt::Return(None) => "return;".to_string(),
        TsStmt::Const { .. } | TsStmt::Let { .. } => format!("{};", stmt_inline(stmt)),
        TsStmt::If {
            cond,
            then_body,
            else_body,
        } => {
            let then_inline = then_body
                .iter()
                .map(stmt_inline_full)
                .collect::<Vec<_>>()
                .join(" ");
            match else_body {
                Some(else_body) => {
                    let else_inline = else_body
                        .iter()
                        .map(stmt_inline_full)
                        .collect::<Vec<_>>()
                        .join(" ");
                    format!(
                        "if ({}) {{ {} }} else {{ {} }}",
                        expr_str(cond),
                        then_inline,
                        else_inline
                    )
                }
                None => format!("if ({}) {{ {} }}", expr_str(cond), then_inline),
            }
        }
        TsStmt::Throw(expr) => format!("throw {};", expr_str(expr)),
        TsStmt::Break => "break;".to_string(),
        TsStmt::Continue => "continue;".to_string(),
        _ => String::new(),
    }
}

fn args_str(args: &[TsExpr]) -> String {
    args.iter().map(expr_str).collect::<Vec<_>>().join(", ")
}

fn quote_str(s: &str) -> String {
    let mut out = String::with_capacity(s.len() + 2);
    out.push('"');
    for ch in s.chars() {
        match ch {
            '"' => out.push_str("\\\""),
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '\t' => out.push_str("\\t"),
            '\r' => out.push_str("\\r"),
            other => out.push(other),
        }
    }
    out.push('"');
    out
}

fn escape_template(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut chars = s.chars().peekable();
    while let Some(ch) = chars.next() {
        match ch {
            '`' => out.push_str("\\`"),
            '\\' => out.push_str("\\\\"),
            '$' if chars.peek() == Some(&'{') => out.push_str("\\$"),
            other => out.push(other),
        }
    }
    out
}
