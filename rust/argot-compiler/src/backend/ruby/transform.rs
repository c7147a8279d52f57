//! IL → Ruby AST.
//!
//! Naming conventions are applied here: snake_case methods and locals,
//! PascalCase classes, SCREAMING_SNAKE_CASE module constants, `@ivar` for
//! instance properties (leading source underscores dropped). Every IL
//! variant is handled; anything else would be a compiler bug surfaced as an
//! `UNHANDLED_` sentinel plus a warning.

use super::ast::*;
use crate::backend::HelperSet;
use crate::diagnostics::Diagnostics;
use crate::il::*;
use crate::options::EmitOptions;
use argot_core::names::{to_pascal_case, to_screaming_snake_case, to_snake_case};
use argot_core::{Endian, Type, Width};
use std::collections::{BTreeSet, HashSet};

pub struct RubyTransformer {
    pub helpers: HelperSet,
    pub diags: Diagnostics,
    pub requires: BTreeSet<String>,
    symbol_keys: bool,
    const_names: HashSet<String>,
    class_names: HashSet<String>,
}

impl RubyTransformer {
    pub fn new(options: &EmitOptions) -> RubyTransformer {
        RubyTransformer {
            helpers: HelperSet::new(),
            diags: Diagnostics::new(),
            requires: BTreeSet::new(),
            symbol_keys: options.symbol_keys,
            const_names: HashSet::new(),
            class_names: HashSet::new(),
        }
    }

    pub fn transform_module(&mut self, module: &Module) -> RubyProgram {
        for decl in &module.decls {
            match decl {
                Decl::Constant(c) => {
                    self.const_names.insert(c.name.clone());
                }
                Decl::Class(c) => {
                    self.class_names.insert(c.name.clone());
                }
                _ => {}
            }
        }
        let mut decls = Vec::new();
        for decl in &module.decls {
            match decl {
                Decl::Class(class) => {
                    decls.push(self.transform_class(class));
                    decls.push(RubyStmt::Blank);
                }
                Decl::Function(func) => {
                    decls.push(RubyStmt::Def {
                        name: to_snake_case(&func.name),
                        on_self: false,
                        params: self.transform_params(&func.params),
                        body: self.transform_stmts(&func.body),
                    });
                    decls.push(RubyStmt::Blank);
                }
                Decl::Constant(c) => {
                    let value = self.transform_expr(&c.value);
                    decls.push(RubyStmt::ConstAssign {
                        name: to_screaming_snake_case(&c.name),
                        value,
                    });
                }
                Decl::Import(import) => {
                    decls.push(RubyStmt::Comment(format!(
                        "imported from {}: {}",
                        import.from,
                        import.names.join(", ")
                    )));
                }
                Decl::Export(_) => {}
            }
        }
        RubyProgram {
            requires: self.requires.iter().cloned().collect(),
            decls,
        }
    }

    // ── Declarations ──

    fn transform_class(&mut self, class: &ClassDecl) -> RubyStmt {
        let mut attr_accessors: Vec<String> = Vec::new();
        let mut seen = HashSet::new();
        // attr_accessor comes from declared fields and constructor
        // assignments, declared once at class scope.
        for member in &class.members {
            match member {
                Member::Field(field) if !field.is_static => {
                    let name = ivar_name(&field.name);
                    if seen.insert(name.clone()) {
                        attr_accessors.push(name);
                    }
                }
                Member::Method(method) if method.kind == MethodKind::Constructor => {
                    collect_this_assignments(&method.body, &mut |prop| {
                        let name = ivar_name(prop);
                        if seen.insert(name.clone()) {
                            attr_accessors.push(name);
                        }
                    });
                }
                _ => {}
            }
        }

        let mut body = Vec::new();
        // Static fields become class-scope constants, ahead of methods.
        for member in &class.members {
            if let Member::Field(field) = member {
                if field.is_static {
                    let value = field
                        .init
                        .as_ref()
                        .map(|e| self.transform_expr(e))
                        .unwrap_or(RubyExpr::Nil);
                    body.push(RubyStmt::ConstAssign {
                        name: to_screaming_snake_case(&field.name),
                        value,
                    });
                }
            }
        }
        for member in &class.members {
            match member {
                Member::StaticInit(init) => {
                    let stmts = self.transform_stmts(&init.body);
                    body.extend(stmts);
                }
                Member::Method(method) => {
                    body.push(self.transform_method(class, method));
                    body.push(RubyStmt::Blank);
                }
                Member::Field(_) => {}
            }
        }
        if matches!(body.last(), Some(RubyStmt::Blank)) {
            body.pop();
        }
        RubyStmt::Class {
            name: to_pascal_case(&class.name),
            superclass: class.super_class.as_deref().map(to_pascal_case),
            attr_accessors,
            body,
        }
    }

    fn transform_method(&mut self, class: &ClassDecl, method: &MethodDecl) -> RubyStmt {
        let name = match method.kind {
            MethodKind::Constructor => "initialize".to_string(),
            MethodKind::Setter => format!("{}=", to_snake_case(&method.name)),
            _ => to_snake_case(&method.name),
        };
        let mut body = Vec::new();
        if method.kind == MethodKind::Constructor {
            // Declared instance fields initialise ahead of the constructor
            // statements.
            for member in &class.members {
                if let Member::Field(field) = member {
                    if !field.is_static {
                        let value = field
                            .init
                            .as_ref()
                            .map(|e| self.transform_expr(e))
                            .unwrap_or(RubyExpr::Nil);
                        body.push(RubyStmt::Assign {
                            target: RubyExpr::IVar(ivar_name(&field.name)),
                            op: None,
                            value,
                        });
                    }
                }
            }
        }
        body.extend(self.transform_stmts(&method.body));
        RubyStmt::Def {
            name,
            on_self: method.is_static,
            params: self.transform_params(&method.params),
            body,
        }
    }

    fn transform_params(&mut self, params: &[Param]) -> Vec<RubyParam> {
        params
            .iter()
            .map(|p| RubyParam {
                name: to_snake_case(&p.name),
                default: p.default.as_ref().map(|d| self.transform_expr(d)),
            })
            .collect()
    }

    // ── Statements ──

    fn transform_stmts(&mut self, stmts: &[Stmt]) -> Vec<RubyStmt> {
        let mut out = Vec::new();
        for stmt in stmts {
            self.transform_stmt(stmt, &mut out);
        }
        out
    }

    fn transform_stmt(&mut self, stmt: &Stmt, out: &mut Vec<RubyStmt>) {
        match stmt {
            Stmt::Block(body) => {
                // Ruby has no bare block scope; inline the statements.
                out.extend(self.transform_stmts(body));
            }
            Stmt::VarDecl(decl) => {
                let value = decl
                    .init
                    .as_ref()
                    .map(|e| self.transform_expr(e))
                    .unwrap_or(RubyExpr::Nil);
                out.push(RubyStmt::Assign {
                    target: RubyExpr::Ident(to_snake_case(&decl.name)),
                    op: None,
                    value,
                });
            }
            Stmt::Expr(expr) => self.push_expr_stmt(expr, out),
            Stmt::Return(value) => {
                out.push(RubyStmt::Return(
                    value.as_ref().map(|e| self.transform_expr(e)),
                ));
            }
            Stmt::If(s) => {
                // Collapse an else-of-single-if chain into elsif arms.
                let cond = self.transform_expr(&s.cond);
                let then_body = self.transform_stmts(&s.then_block);
                let mut elsifs = Vec::new();
                let mut else_src = s.else_block.as_deref();
                let else_body = loop {
                    match else_src {
                        Some([Stmt::If(nested)]) => {
                            let nested_cond = self.transform_expr(&nested.cond);
                            let nested_body = self.transform_stmts(&nested.then_block);
                            elsifs.push((nested_cond, nested_body));
                            else_src = nested.else_block.as_deref();
                        }
                        Some(block) => break Some(self.transform_stmts(block)),
                        None => break None,
                    }
                };
                out.push(RubyStmt::If {
                    cond,
                    then_body,
                    elsifs,
                    else_body,
                });
            }
            Stmt::While(s) => {
                let cond = self.transform_expr(&s.cond);
                let body = self.transform_stmts(&s.body);
                out.push(RubyStmt::While { cond, body });
            }
            Stmt::DoWhile(s) => {
                let body = self.transform_stmts(&s.body);
                let cond = self.transform_expr(&s.cond);
                out.push(RubyStmt::BeginWhile { body, cond });
            }
            Stmt::For(s) => self.transform_for(s, out),
            Stmt::ForOf(s) => {
                let iterable = self.transform_expr(&s.iterable);
                let body = self.transform_stmts(&s.body);
                out.push(RubyStmt::Each {
                    iterable,
                    var: to_snake_case(&s.var),
                    body,
                    method: "each",
                });
            }
            Stmt::ForIn(s) => {
                let object = self.transform_expr(&s.object);
                let body = self.transform_stmts(&s.body);
                out.push(RubyStmt::Each {
                    iterable: object,
                    var: to_snake_case(&s.var),
                    body,
                    method: "each_key",
                });
            }
            Stmt::Break => out.push(RubyStmt::Break),
            Stmt::Continue => out.push(RubyStmt::Next),
            Stmt::Throw(expr) => {
                if let ExprKind::ErrorCreation { kind, message } = &expr.kind {
                    out.push(RubyStmt::Raise {
                        class: Some(error_class(*kind).to_string()),
                        value: message.as_ref().map(|m| self.transform_expr(m)),
                    });
                } else {
                    out.push(RubyStmt::Raise {
                        class: None,
                        value: Some(self.transform_expr(expr)),
                    });
                }
            }
            Stmt::TryCatch(s) => {
                let body = self.transform_stmts(&s.try_block);
                let rescues = s
                    .catches
                    .iter()
                    .map(|catch| RubyRescue {
                        class: catch
                            .ex_type
                            .as_deref()
                            .map(to_pascal_case)
                            .unwrap_or_else(|| "StandardError".to_string()),
                        var: to_snake_case(&catch.var_name),
                        body: self.transform_stmts(&catch.body),
                    })
                    .collect();
                let ensure_body = s.finally.as_ref().map(|f| self.transform_stmts(f));
                out.push(RubyStmt::BeginRescue {
                    body,
                    rescues,
                    ensure_body,
                });
            }
            Stmt::Switch(s) => {
                let subject = self.transform_expr(&s.subject);
                let whens = s
                    .cases
                    .iter()
                    .map(|case| {
                        let patterns =
                            case.patterns.iter().map(|p| self.transform_expr(p)).collect();
                        (patterns, self.transform_case_body(&case.body))
                    })
                    .collect();
                let else_body = s.default.as_ref().map(|d| self.transform_case_body(d));
                out.push(RubyStmt::Case {
                    subject,
                    whens,
                    else_body,
                });
            }
        }
    }

    /// `case/when` bodies must not carry `break`: a Ruby `when` does not fall
    /// through, and a literal `break` would escape the enclosing loop.
    fn transform_case_body(&mut self, body: &[Stmt]) -> Vec<RubyStmt> {
        let mut out = Vec::new();
        for stmt in body {
            if matches!(stmt, Stmt::Break) {
                self.diags
                    .note("dropped redundant break inside case/when body", None);
                continue;
            }
            self.transform_stmt(stmt, &mut out);
        }
        out
    }

    fn transform_for(&mut self, s: &ForStmt, out: &mut Vec<RubyStmt>) {
        // The canonical counting loop becomes a Range#each.
        if let Some(range_each) = self.counting_loop(s) {
            out.push(range_each);
            return;
        }
        if let Some(init) = &s.init {
            self.transform_stmt(init, out);
        }
        let cond = match &s.cond {
            Some(cond) => self.transform_expr(cond),
            None => RubyExpr::Bool(true),
        };
        let mut body = self.transform_stmts(&s.body);
        if let Some(update) = &s.update {
            if body_has_continue(&s.body) {
                self.diags.warn(
                    "for-loop with continue lowered as while; continue skips the update",
                    None,
                );
            }
            self.push_expr_stmt_into(update, &mut body);
        }
        out.push(RubyStmt::While { cond, body });
    }

    /// `for (let i = a; i < b; i++)` → `(a...b).each do |i|`.
    fn counting_loop(&mut self, s: &ForStmt) -> Option<RubyStmt> {
        let init = s.init.as_deref()?;
        let Stmt::VarDecl(decl) = init else {
            return None;
        };
        let start = decl.init.as_ref()?;
        let cond = s.cond.as_ref()?;
        let ExprKind::Binary { op, left, right } = &cond.kind else {
            return None;
        };
        let exclusive = match op {
            BinaryOp::Lt => true,
            BinaryOp::LtEq => false,
            _ => return None,
        };
        let ExprKind::Ident(cond_var) = &left.kind else {
            return None;
        };
        if *cond_var != decl.name {
            return None;
        }
        let update = s.update.as_ref()?;
        let ExprKind::Assign { op: AssignOp::Add, target, value } = &update.kind else {
            return None;
        };
        let ExprKind::Ident(update_var) = &target.kind else {
            return None;
        };
        if *update_var != decl.name || !matches!(value.kind, ExprKind::Literal(Literal::Int(1))) {
            return None;
        }
        let start = self.transform_expr(start);
        let end = self.transform_expr(right);
        let body = self.transform_stmts(&s.body);
        Some(RubyStmt::Each {
            iterable: RubyExpr::paren(RubyExpr::Range {
                start: Box::new(start),
                end: Box::new(end),
                exclusive,
            }),
            var: to_snake_case(&decl.name),
            body,
            method: "each",
        })
    }

    fn push_expr_stmt(&mut self, expr: &Expr, out: &mut Vec<RubyStmt>) {
        self.push_expr_stmt_into(expr, out);
    }

    fn push_expr_stmt_into(&mut self, expr: &Expr, out: &mut Vec<RubyStmt>) {
        match &expr.kind {
            ExprKind::Assign { op, target, value } => {
                let target = self.transform_expr(target);
                let value = self.transform_expr(value);
                out.push(RubyStmt::Assign {
                    target,
                    op: compound_spelling(*op),
                    value,
                });
            }
            ExprKind::Sequence(exprs) => {
                for e in exprs {
                    self.push_expr_stmt_into(e, out);
                }
            }
            _ => out.push(RubyStmt::Expr(self.transform_expr(expr))),
        }
    }

    // ── Expressions ──

    fn unhandled(&mut self, variant: &str) -> RubyExpr {
        self.diags
            .warn(format!("no Ruby mapping for IL variant {variant}"), None);
        RubyExpr::Ident(format!("UNHANDLED_{variant}"))
    }

    pub fn transform_expr(&mut self, expr: &Expr) -> RubyExpr {
        match &expr.kind {
            ExprKind::Literal(lit) => match lit {
                Literal::Int(n) => RubyExpr::Int(*n),
                Literal::Float(f) => RubyExpr::Float(*f),
                Literal::Str(s) => RubyExpr::Str(s.clone()),
                Literal::Bool(b) => RubyExpr::Bool(*b),
                Literal::Null => RubyExpr::Nil,
                Literal::BigInt(v) => RubyExpr::RawInt(v.to_string()),
            },
            ExprKind::Ident(name) => {
                if self.const_names.contains(name) {
                    RubyExpr::Const(to_screaming_snake_case(name))
                } else if self.class_names.contains(name) {
                    RubyExpr::Const(to_pascal_case(name))
                } else {
                    RubyExpr::Ident(to_snake_case(name))
                }
            }
            ExprKind::Binary { op, left, right } => self.transform_binary(*op, left, right),
            ExprKind::Unary { op, operand, .. } => {
                let spelling = match op {
                    UnaryOp::Neg => "-",
                    UnaryOp::Plus => "+",
                    UnaryOp::Not => "!",
                    UnaryOp::BitNot => "~",
                };
                RubyExpr::Unary {
                    op: spelling,
                    operand: Box::new(self.transform_expr(operand)),
                }
            }
            ExprKind::Assign { op, target, value } => {
                let value = self.transform_expr(value);
                let target = self.transform_expr(target);
                let value = match compound_spelling(*op) {
                    None => value,
                    Some(spelling) => {
                        // Expression-position compound assignment expands to
                        // `target = target <op> value`.
                        let bare = spelling.trim_end_matches('=');
                        RubyExpr::binary(
                            match bare {
                                "+" => "+",
                                "-" => "-",
                                "*" => "*",
                                "/" => "/",
                                "%" => "%",
                                "<<" => "<<",
                                ">>" => ">>",
                                "&" => "&",
                                "|" => "|",
                                "^" => "^",
                                _ => "+",
                            },
                            target.clone(),
                            value,
                        )
                    }
                };
                RubyExpr::AssignExpr {
                    target: Box::new(target),
                    value: Box::new(value),
                }
            }
            ExprKind::Conditional {
                cond,
                then_val,
                else_val,
            } => RubyExpr::Ternary {
                cond: Box::new(self.transform_expr(cond)),
                then_val: Box::new(self.transform_expr(then_val)),
                else_val: Box::new(self.transform_expr(else_val)),
            },
            ExprKind::Sequence(exprs) => {
                RubyExpr::Seq(exprs.iter().map(|e| self.transform_expr(e)).collect())
            }
            ExprKind::Paren(inner) => RubyExpr::paren(self.transform_expr(inner)),
            ExprKind::Member { target, name, .. } => RubyExpr::call(
                self.transform_expr(target),
                to_snake_case(name),
                vec![],
            ),
            ExprKind::Element { target, index } => RubyExpr::Index {
                recv: Box::new(self.transform_expr(target)),
                index: Box::new(self.transform_expr(index)),
            },
            ExprKind::ThisProperty(name) => RubyExpr::IVar(ivar_name(name)),
            ExprKind::ThisMethodCall { name, args } => RubyExpr::MethodCall {
                recv: None,
                name: to_snake_case(name),
                args: self.transform_args(args),
                block: None,
            },
            ExprKind::ParentConstructorCall(args) => RubyExpr::Super(self.transform_args(args)),
            ExprKind::ParentMethodCall { name, .. } => {
                // Ruby `super` reaches only the same-named method.
                self.diags.warn(
                    format!("super.{name} call emitted as bare super"),
                    None,
                );
                RubyExpr::Super(vec![])
            }
            ExprKind::Super => self.unhandled("Super"),
            ExprKind::This => RubyExpr::SelfRef,
            ExprKind::Spread(inner) => RubyExpr::Splat(Box::new(self.transform_expr(inner))),
            ExprKind::Call { callee, args } => self.transform_call(callee, args),
            ExprKind::New { class_name, args } => RubyExpr::call(
                RubyExpr::Const(to_pascal_case(class_name)),
                "new",
                self.transform_args(args),
            ),
            ExprKind::Lambda { params, body } => RubyExpr::Lambda {
                params: self.transform_params(params),
                body: self.block_body(body),
            },
            ExprKind::ArrayLit(elements) => {
                RubyExpr::Array(elements.iter().map(|e| self.transform_expr(e)).collect())
            }
            ExprKind::ArrayCreation { size, init } => {
                let fill = init
                    .as_ref()
                    .map(|i| self.transform_expr(i))
                    .unwrap_or(RubyExpr::Int(0));
                RubyExpr::call(
                    RubyExpr::Const("Array".into()),
                    "new",
                    vec![self.transform_expr(size), fill],
                )
            }
            ExprKind::TypedArrayCreation { size, .. } => RubyExpr::call(
                RubyExpr::Const("Array".into()),
                "new",
                vec![self.transform_expr(size), RubyExpr::Int(0)],
            ),
            ExprKind::ObjectLit(entries) => {
                let symbol_keys = self.symbol_keys;
                let pairs = entries
                    .iter()
                    .map(|(key, value)| {
                        let key = match key {
                            ObjectKey::Ident(name) | ObjectKey::Str(name) => {
                                if symbol_keys {
                                    RubyExpr::Symbol(to_snake_case(name))
                                } else {
                                    RubyExpr::Str(name.clone())
                                }
                            }
                            ObjectKey::Int(n) => RubyExpr::Int(*n),
                        };
                        (key, self.transform_expr(value))
                    })
                    .collect();
                RubyExpr::Hash(pairs)
            }
            ExprKind::MapCreation => RubyExpr::Hash(vec![]),
            ExprKind::SetCreation => {
                self.requires.insert("set".to_string());
                RubyExpr::call(RubyExpr::Const("Set".into()), "new", vec![])
            }
            ExprKind::ArrayLength(target) => {
                RubyExpr::call(self.transform_expr(target), "length", vec![])
            }
            ExprKind::ArrayAppend { target, values } => RubyExpr::call(
                self.transform_expr(target),
                "push",
                self.transform_args(values),
            ),
            ExprKind::ArrayPop(target) => {
                RubyExpr::call(self.transform_expr(target), "pop", vec![])
            }
            ExprKind::ArrayShift(target) => {
                RubyExpr::call(self.transform_expr(target), "shift", vec![])
            }
            ExprKind::ArrayUnshift { target, values } => RubyExpr::call(
                self.transform_expr(target),
                "unshift",
                self.transform_args(values),
            ),
            ExprKind::ArraySplice {
                target,
                start,
                delete_count,
                items,
            } => {
                let recv = self.transform_expr(target);
                let start = self.transform_expr(start);
                match (delete_count, items.is_empty()) {
                    (Some(count), true) => RubyExpr::call(
                        recv,
                        "slice!",
                        vec![start, self.transform_expr(count)],
                    ),
                    (None, true) => RubyExpr::call(
                        recv,
                        "slice!",
                        vec![RubyExpr::RangeFrom(Box::new(start))],
                    ),
                    (Some(count), false) => {
                        // `a[s, n] = items` — replacement splice.
                        let lhs = RubyExpr::MethodCall {
                            recv: Some(Box::new(recv)),
                            name: "[]=".into(),
                            args: vec![
                                start,
                                self.transform_expr(count),
                                RubyExpr::Array(self.transform_args(items)),
                            ],
                            block: None,
                        };
                        lhs
                    }
                    (None, false) => self.unhandled("ArraySplice"),
                }
            }
            ExprKind::ArraySlice { target, start, end } => {
                self.slice_index(target, start, end)
            }
            ExprKind::ArrayFill { target, value } => RubyExpr::call(
                self.transform_expr(target),
                "fill",
                vec![self.transform_expr(value)],
            ),
            ExprKind::ArrayClear(target) => {
                RubyExpr::call(self.transform_expr(target), "clear", vec![])
            }
            ExprKind::ArrayConcat { target, others } => {
                let mut acc = RubyExpr::paren(self.transform_expr(target));
                for other in others {
                    acc = RubyExpr::binary("+", acc, self.transform_expr(other));
                }
                acc
            }
            ExprKind::ArrayReverse(target) => {
                RubyExpr::call(self.transform_expr(target), "reverse!", vec![])
            }
            ExprKind::ArrayJoin { target, sep } => {
                let sep = sep
                    .as_ref()
                    .map(|s| self.transform_expr(s))
                    .unwrap_or_else(|| RubyExpr::Str(",".into()));
                RubyExpr::call(self.transform_expr(target), "join", vec![sep])
            }
            ExprKind::ArrayIndexOf { target, needle } => RubyExpr::paren(RubyExpr::binary(
                "||",
                RubyExpr::call(
                    self.transform_expr(target),
                    "index",
                    vec![self.transform_expr(needle)],
                ),
                RubyExpr::Int(-1),
            )),
            ExprKind::ArrayIncludes { target, needle } => RubyExpr::call(
                self.transform_expr(target),
                "include?",
                vec![self.transform_expr(needle)],
            ),
            ExprKind::ArrayMap { target, callback } => {
                self.iterator_call(target, callback, "map")
            }
            ExprKind::ArrayFilter { target, callback } => {
                self.iterator_call(target, callback, "select")
            }
            ExprKind::ArrayForEach { target, callback } => {
                self.iterator_call(target, callback, "each")
            }
            ExprKind::ArrayFind { target, callback } => {
                self.iterator_call(target, callback, "find")
            }
            ExprKind::ArrayFindIndex { target, callback } => RubyExpr::paren(RubyExpr::binary(
                "||",
                self.iterator_call(target, callback, "find_index"),
                RubyExpr::Int(-1),
            )),
            ExprKind::ArrayReduce {
                target,
                callback,
                init,
            } => {
                let recv = self.transform_expr(target);
                let args = match init {
                    Some(init) => vec![self.transform_expr(init)],
                    None => vec![],
                };
                let block = self.callback_block(callback, 2);
                RubyExpr::MethodCall {
                    recv: Some(Box::new(recv)),
                    name: "reduce".into(),
                    args,
                    block: Some(block),
                }
            }
            ExprKind::ArrayEvery { target, callback } => {
                self.iterator_call(target, callback, "all?")
            }
            ExprKind::ArraySome { target, callback } => {
                self.iterator_call(target, callback, "any?")
            }
            ExprKind::ArraySort { target, comparator } => {
                let recv = self.transform_expr(target);
                match comparator {
                    Some(cmp) => {
                        let block = self.callback_block(cmp, 2);
                        RubyExpr::MethodCall {
                            recv: Some(Box::new(recv)),
                            name: "sort!".into(),
                            args: vec![],
                            block: Some(block),
                        }
                    }
                    None => RubyExpr::call(recv, "sort!", vec![]),
                }
            }
            ExprKind::ArrayFrom(source) => {
                RubyExpr::call(self.transform_expr(source), "to_a", vec![])
            }
            ExprKind::ArrayXor { a, b } => {
                let zipped = RubyExpr::call(
                    self.transform_expr(a),
                    "zip",
                    vec![self.transform_expr(b)],
                );
                RubyExpr::MethodCall {
                    recv: Some(Box::new(zipped)),
                    name: "map".into(),
                    args: vec![],
                    block: Some(RubyBlock {
                        params: vec!["x".into(), "y".into()],
                        body: vec![RubyStmt::Expr(RubyExpr::binary(
                            "^",
                            RubyExpr::Ident("x".into()),
                            RubyExpr::Ident("y".into()),
                        ))],
                    }),
                }
            }
            ExprKind::CopyArray(target) => {
                RubyExpr::call(self.transform_expr(target), "dup", vec![])
            }
            ExprKind::RotateLeft {
                value,
                amount,
                width,
            } => self.rotate(value, amount, *width, false),
            ExprKind::RotateRight {
                value,
                amount,
                width,
            } => self.rotate(value, amount, *width, true),
            ExprKind::PackBytes {
                bytes,
                width,
                endian,
            } => self.pack_bytes(bytes, *width, *endian),
            ExprKind::UnpackBytes {
                value,
                width,
                endian,
            } => self.unpack_bytes(value, *width, *endian),
            ExprKind::Cast { value, target_ty } => self.cast(value, target_ty),
            ExprKind::BigIntCast(value) => {
                RubyExpr::call(RubyExpr::paren(self.transform_expr(value)), "to_i", vec![])
            }
            ExprKind::MathCall { func, args } => self.math_call(*func, args),
            ExprKind::MathConstant(c) => match c {
                MathConst::Pi => RubyExpr::Const("Math::PI".into()),
                MathConst::E => RubyExpr::Const("Math::E".into()),
                MathConst::Ln2 => {
                    RubyExpr::call(RubyExpr::Const("Math".into()), "log", vec![RubyExpr::Int(2)])
                }
                MathConst::Ln10 => RubyExpr::call(
                    RubyExpr::Const("Math".into()),
                    "log",
                    vec![RubyExpr::Int(10)],
                ),
                MathConst::Log2E => RubyExpr::binary(
                    "/",
                    RubyExpr::Float(1.0),
                    RubyExpr::call(RubyExpr::Const("Math".into()), "log", vec![RubyExpr::Int(2)]),
                ),
                MathConst::Log10E => RubyExpr::binary(
                    "/",
                    RubyExpr::Float(1.0),
                    RubyExpr::call(
                        RubyExpr::Const("Math".into()),
                        "log",
                        vec![RubyExpr::Int(10)],
                    ),
                ),
                MathConst::Sqrt2 => RubyExpr::call(
                    RubyExpr::Const("Math".into()),
                    "sqrt",
                    vec![RubyExpr::Int(2)],
                ),
                MathConst::Sqrt1_2 => RubyExpr::call(
                    RubyExpr::Const("Math".into()),
                    "sqrt",
                    vec![RubyExpr::Float(0.5)],
                ),
            },
            ExprKind::NumberConstant(c) => match c {
                NumberConst::MaxSafeInteger => RubyExpr::RawInt("9007199254740991".into()),
                NumberConst::MinSafeInteger => RubyExpr::RawInt("-9007199254740991".into()),
                NumberConst::MaxValue => RubyExpr::Const("Float::MAX".into()),
                NumberConst::MinValue => RubyExpr::Const("Float::MIN".into()),
                NumberConst::Epsilon => RubyExpr::Const("Float::EPSILON".into()),
                NumberConst::PositiveInfinity => RubyExpr::Const("Float::INFINITY".into()),
                NumberConst::NegativeInfinity => RubyExpr::Unary {
                    op: "-",
                    operand: Box::new(RubyExpr::Const("Float::INFINITY".into())),
                },
                NumberConst::NaN => RubyExpr::Const("Float::NAN".into()),
            },
            ExprKind::Power { base, exp } => RubyExpr::binary(
                "**",
                self.transform_expr(base),
                self.transform_expr(exp),
            ),
            ExprKind::IsInteger(x) => RubyExpr::call(
                RubyExpr::paren(self.transform_expr(x)),
                "is_a?",
                vec![RubyExpr::Const("Integer".into())],
            ),
            ExprKind::IsNaN(x) => {
                let value = self.transform_expr(x);
                RubyExpr::paren(RubyExpr::binary(
                    "&&",
                    RubyExpr::call(
                        RubyExpr::paren(value.clone()),
                        "is_a?",
                        vec![RubyExpr::Const("Float".into())],
                    ),
                    RubyExpr::call(RubyExpr::paren(value), "nan?", vec![]),
                ))
            }
            ExprKind::IsFinite(x) => RubyExpr::call(
                RubyExpr::paren(self.transform_expr(x)),
                "finite?",
                vec![],
            ),
            ExprKind::SecureCompare { a, b } => {
                self.helpers.register("secure_compare");
                RubyExpr::free_call(
                    "secure_compare",
                    vec![self.transform_expr(a), self.transform_expr(b)],
                )
            }
            ExprKind::StringInterpolation(parts) => {
                let parts = parts
                    .iter()
                    .map(|part| match part {
                        InterpPart::Str(s) => RubyInterpPart::Str(s.clone()),
                        InterpPart::Expr(e) => RubyInterpPart::Expr(self.transform_expr(e)),
                    })
                    .collect();
                RubyExpr::Interp(parts)
            }
            ExprKind::StringSplit { target, sep } => RubyExpr::call(
                self.transform_expr(target),
                "split",
                vec![self.transform_expr(sep)],
            ),
            ExprKind::StringTrim(target) => {
                RubyExpr::call(self.transform_expr(target), "strip", vec![])
            }
            ExprKind::StringRepeat { target, count } => RubyExpr::binary(
                "*",
                RubyExpr::paren(self.transform_expr(target)),
                self.transform_expr(count),
            ),
            ExprKind::StringReplace {
                target,
                from,
                to,
                all,
            } => RubyExpr::call(
                self.transform_expr(target),
                if *all { "gsub" } else { "sub" },
                vec![self.transform_expr(from), self.transform_expr(to)],
            ),
            ExprKind::StringSlice { target, start, end } => {
                self.slice_index(target, start, end)
            }
            ExprKind::StringSubstring { target, start, end } => {
                let recv = self.transform_expr(target);
                let start = self.transform_expr(start);
                match end {
                    Some(end) => RubyExpr::Index {
                        recv: Box::new(recv),
                        index: Box::new(RubyExpr::Range {
                            start: Box::new(start),
                            end: Box::new(self.transform_expr(end)),
                            exclusive: true,
                        }),
                    },
                    None => RubyExpr::Index {
                        recv: Box::new(recv),
                        index: Box::new(RubyExpr::RangeFrom(Box::new(start))),
                    },
                }
            }
            ExprKind::StringCharCodeAt { target, index } => RubyExpr::call(
                RubyExpr::Index {
                    recv: Box::new(self.transform_expr(target)),
                    index: Box::new(self.transform_expr(index)),
                },
                "ord",
                vec![],
            ),
            ExprKind::StringCharAt { target, index } => RubyExpr::Index {
                recv: Box::new(self.transform_expr(target)),
                index: Box::new(self.transform_expr(index)),
            },
            ExprKind::StringIndexOf { target, needle } => RubyExpr::paren(RubyExpr::binary(
                "||",
                RubyExpr::call(
                    self.transform_expr(target),
                    "index",
                    vec![self.transform_expr(needle)],
                ),
                RubyExpr::Int(-1),
            )),
            ExprKind::StringIncludes { target, needle } => RubyExpr::call(
                self.transform_expr(target),
                "include?",
                vec![self.transform_expr(needle)],
            ),
            ExprKind::StringStartsWith { target, prefix } => RubyExpr::call(
                self.transform_expr(target),
                "start_with?",
                vec![self.transform_expr(prefix)],
            ),
            ExprKind::StringEndsWith { target, suffix } => RubyExpr::call(
                self.transform_expr(target),
                "end_with?",
                vec![self.transform_expr(suffix)],
            ),
            ExprKind::StringToLower(target) => {
                RubyExpr::call(self.transform_expr(target), "downcase", vec![])
            }
            ExprKind::StringToUpper(target) => {
                RubyExpr::call(self.transform_expr(target), "upcase", vec![])
            }
            ExprKind::StringConcat(parts) => {
                let mut iter = parts.iter();
                let first = match iter.next() {
                    Some(first) => self.transform_expr(first),
                    None => RubyExpr::Str(String::new()),
                };
                iter.fold(first, |acc, part| {
                    RubyExpr::binary("+", acc, self.transform_expr(part))
                })
            }
            ExprKind::StringFromCharCodes(codes) => RubyExpr::call(
                RubyExpr::Array(self.transform_args(codes)),
                "pack",
                vec![RubyExpr::Str("C*".into())],
            ),
            ExprKind::StringToBytes(target) => {
                RubyExpr::call(self.transform_expr(target), "bytes", vec![])
            }
            ExprKind::BytesToString(target) => RubyExpr::call(
                self.transform_expr(target),
                "pack",
                vec![RubyExpr::Str("C*".into())],
            ),
            ExprKind::HexDecode(hex) => RubyExpr::call(
                RubyExpr::call(
                    RubyExpr::Array(vec![self.transform_expr(hex)]),
                    "pack",
                    vec![RubyExpr::Str("H*".into())],
                ),
                "bytes",
                vec![],
            ),
            ExprKind::HexEncode(bytes) => RubyExpr::call(
                RubyExpr::call(
                    self.transform_expr(bytes),
                    "pack",
                    vec![RubyExpr::Str("C*".into())],
                ),
                "unpack1",
                vec![RubyExpr::Str("H*".into())],
            ),
            ExprKind::ObjectKeys(target) => {
                RubyExpr::call(self.transform_expr(target), "keys", vec![])
            }
            ExprKind::ObjectValues(target) => {
                RubyExpr::call(self.transform_expr(target), "values", vec![])
            }
            ExprKind::ObjectEntries(target) => {
                RubyExpr::call(self.transform_expr(target), "to_a", vec![])
            }
            ExprKind::ObjectFreeze(target) => {
                RubyExpr::call(self.transform_expr(target), "freeze", vec![])
            }
            ExprKind::JsonParse(target) => {
                self.requires.insert("json".to_string());
                RubyExpr::call(
                    RubyExpr::Const("JSON".into()),
                    "parse",
                    vec![self.transform_expr(target)],
                )
            }
            ExprKind::JsonStringify { value, .. } => {
                self.requires.insert("json".to_string());
                RubyExpr::call(
                    RubyExpr::Const("JSON".into()),
                    "generate",
                    vec![self.transform_expr(value)],
                )
            }
            ExprKind::TypeOf(value) => RubyExpr::call(
                RubyExpr::call(
                    RubyExpr::call(RubyExpr::paren(self.transform_expr(value)), "class", vec![]),
                    "name",
                    vec![],
                ),
                "downcase",
                vec![],
            ),
            ExprKind::InstanceOf { value, class_name } => RubyExpr::call(
                RubyExpr::paren(self.transform_expr(value)),
                "is_a?",
                vec![RubyExpr::Const(to_pascal_case(class_name))],
            ),
            ExprKind::IsArray(value) => RubyExpr::call(
                RubyExpr::paren(self.transform_expr(value)),
                "is_a?",
                vec![RubyExpr::Const("Array".into())],
            ),
            ExprKind::ErrorCreation { kind, message } => {
                let args = message
                    .as_ref()
                    .map(|m| vec![self.transform_expr(m)])
                    .unwrap_or_default();
                RubyExpr::call(RubyExpr::Const(error_class(*kind).into()), "new", args)
            }
            ExprKind::Await(inner) => {
                self.diags
                    .warn("await has no Ruby counterpart; evaluated synchronously", None);
                self.transform_expr(inner)
            }
            ExprKind::Yield { .. } => self.unhandled("Yield"),
            ExprKind::DataViewCreation(buffer) => self.transform_expr(buffer),
            ExprKind::DataViewRead {
                view,
                offset,
                width,
                endian,
            } => {
                let view = self.transform_expr(view);
                let offset = self.transform_expr(offset);
                if *width == Width::W8 {
                    return RubyExpr::Index {
                        recv: Box::new(view),
                        index: Box::new(offset),
                    };
                }
                let window = RubyExpr::MethodCall {
                    recv: Some(Box::new(view)),
                    name: "[]".into(),
                    args: vec![offset, RubyExpr::Int(width.bytes() as i64)],
                    block: None,
                };
                RubyExpr::call(
                    RubyExpr::call(window, "pack", vec![RubyExpr::Str("C*".into())]),
                    "unpack1",
                    vec![RubyExpr::Str(pack_format(*width, *endian).into())],
                )
            }
            ExprKind::DataViewWrite {
                view,
                offset,
                value,
                width,
                endian,
            } => {
                let view = self.transform_expr(view);
                let offset = self.transform_expr(offset);
                let value = self.transform_expr(value);
                if *width == Width::W8 {
                    return RubyExpr::AssignExpr {
                        target: Box::new(RubyExpr::Index {
                            recv: Box::new(view),
                            index: Box::new(offset),
                        }),
                        value: Box::new(RubyExpr::binary(
                            "&",
                            RubyExpr::paren(value),
                            RubyExpr::RawInt("0xFF".into()),
                        )),
                    };
                }
                let window = RubyExpr::MethodCall {
                    recv: Some(Box::new(view)),
                    name: "[]".into(),
                    args: vec![offset, RubyExpr::Int(width.bytes() as i64)],
                    block: None,
                };
                RubyExpr::AssignExpr {
                    target: Box::new(window),
                    value: Box::new(RubyExpr::call(
                        RubyExpr::call(
                            RubyExpr::Array(vec![value]),
                            "pack",
                            vec![RubyExpr::Str(pack_format(*width, *endian).into())],
                        ),
                        "bytes",
                        vec![],
                    )),
                }
            }
            ExprKind::BufferCreation { size } => RubyExpr::call(
                RubyExpr::Const("Array".into()),
                "new",
                vec![self.transform_expr(size), RubyExpr::Int(0)],
            ),
            ExprKind::TypedArraySet {
                target,
                source,
                offset,
            } => {
                let source_expr = self.transform_expr(source);
                let offset = offset
                    .as_ref()
                    .map(|o| self.transform_expr(o))
                    .unwrap_or(RubyExpr::Int(0));
                let window = RubyExpr::MethodCall {
                    recv: Some(Box::new(self.transform_expr(target))),
                    name: "[]".into(),
                    args: vec![
                        offset,
                        RubyExpr::call(source_expr.clone(), "length", vec![]),
                    ],
                    block: None,
                };
                RubyExpr::AssignExpr {
                    target: Box::new(window),
                    value: Box::new(source_expr),
                }
            }
            ExprKind::TypedArraySubarray { target, start, end } => {
                self.slice_index(target, start, end)
            }
            ExprKind::DebugOutput { level, args } => {
                let name = match level {
                    DebugLevel::Log => "puts",
                    DebugLevel::Warn | DebugLevel::Error => "warn",
                };
                RubyExpr::free_call(name, self.transform_args(args))
            }
            ExprKind::Placeholder(what) => {
                self.diags.warn(
                    format!("unsupported construct reached the Ruby back-end: {what}"),
                    None,
                );
                RubyExpr::Ident(format!("UNSUPPORTED_{}", slug(what)))
            }
        }
    }

    fn transform_args(&mut self, args: &[Expr]) -> Vec<RubyExpr> {
        args.iter().map(|a| self.transform_expr(a)).collect()
    }

    fn transform_binary(&mut self, op: BinaryOp, left: &Expr, right: &Expr) -> RubyExpr {
        let spelling = match op {
            BinaryOp::Add => "+",
            BinaryOp::Sub => "-",
            BinaryOp::Mul => "*",
            BinaryOp::Div => "/",
            BinaryOp::Mod => "%",
            BinaryOp::Eq | BinaryOp::StrictEq => "==",
            BinaryOp::NotEq | BinaryOp::StrictNotEq => "!=",
            BinaryOp::Lt => "<",
            BinaryOp::LtEq => "<=",
            BinaryOp::Gt => ">",
            BinaryOp::GtEq => ">=",
            BinaryOp::And => "&&",
            BinaryOp::Or => "||",
            BinaryOp::BitAnd => "&",
            BinaryOp::BitOr => "|",
            BinaryOp::BitXor => "^",
            BinaryOp::Shl => "<<",
            BinaryOp::Shr => ">>",
            BinaryOp::UShr => {
                // Zero-fill shift: truncate to 32 bits, then shift.
                let truncated = RubyExpr::paren(RubyExpr::binary(
                    "&",
                    RubyExpr::paren(self.transform_expr(left)),
                    RubyExpr::RawInt("0xFFFFFFFF".into()),
                ));
                return RubyExpr::paren(RubyExpr::binary(
                    ">>",
                    truncated,
                    self.transform_expr(right),
                ));
            }
        };
        RubyExpr::binary(
            spelling,
            self.transform_expr(left),
            self.transform_expr(right),
        )
    }

    fn transform_call(&mut self, callee: &Expr, args: &[Expr]) -> RubyExpr {
        let args = self.transform_args(args);
        match &callee.kind {
            ExprKind::Ident(name) => RubyExpr::free_call(to_snake_case(name), args),
            ExprKind::Member { target, name, .. } => RubyExpr::call(
                self.transform_expr(target),
                to_snake_case(name),
                args,
            ),
            _ => RubyExpr::call(
                RubyExpr::paren(self.transform_expr(callee)),
                "call",
                args,
            ),
        }
    }

    /// Shared `recv[start...end]` mapping for array, string, and subarray
    /// slicing.
    fn slice_index(
        &mut self,
        target: &Expr,
        start: &Option<Box<Expr>>,
        end: &Option<Box<Expr>>,
    ) -> RubyExpr {
        let recv = self.transform_expr(target);
        match (start, end) {
            (Some(start), Some(end)) => RubyExpr::Index {
                recv: Box::new(recv),
                index: Box::new(RubyExpr::Range {
                    start: Box::new(self.transform_expr(start)),
                    end: Box::new(self.transform_expr(end)),
                    exclusive: true,
                }),
            },
            (Some(start), None) => RubyExpr::Index {
                recv: Box::new(recv),
                index: Box::new(RubyExpr::RangeFrom(Box::new(self.transform_expr(start)))),
            },
            (None, _) => RubyExpr::call(recv, "dup", vec![]),
        }
    }

    fn iterator_call(&mut self, target: &Expr, callback: &Expr, method: &str) -> RubyExpr {
        let recv = self.transform_expr(target);
        let block = self.callback_block(callback, 1);
        RubyExpr::MethodCall {
            recv: Some(Box::new(recv)),
            name: method.to_string(),
            args: vec![],
            block: Some(block),
        }
    }

    /// A lambda-literal callback becomes an inline block; anything else is
    /// invoked through `.call`.
    fn callback_block(&mut self, callback: &Expr, arity: usize) -> RubyBlock {
        if let ExprKind::Lambda { params, body } = &callback.kind {
            let names: Vec<String> = params.iter().map(|p| to_snake_case(&p.name)).collect();
            return RubyBlock {
                params: names,
                body: self.block_body(body),
            };
        }
        let callee = self.transform_expr(callback);
        let params: Vec<String> = (0..arity.max(1))
            .map(|i| if i == 0 { "e".to_string() } else { format!("e{i}") })
            .collect();
        let args = params
            .iter()
            .map(|p| RubyExpr::Ident(p.clone()))
            .collect();
        RubyBlock {
            params,
            body: vec![RubyStmt::Expr(RubyExpr::call(
                RubyExpr::paren(callee),
                "call",
                args,
            ))],
        }
    }

    /// Block bodies yield their last expression; a trailing `return e`
    /// becomes a bare expression.
    fn block_body(&mut self, body: &[Stmt]) -> Vec<RubyStmt> {
        let mut stmts = self.transform_stmts(body);
        if let Some(RubyStmt::Return(Some(_))) = stmts.last() {
            if let Some(RubyStmt::Return(Some(value))) = stmts.pop() {
                stmts.push(RubyStmt::Expr(value));
            }
        }
        stmts
    }

    /// `((v << (a % w)) | (v >> ((w - a) % w))) & mask` — safe for any
    /// amount, including zero.
    fn rotate(&mut self, value: &Expr, amount: &Expr, width: Width, right: bool) -> RubyExpr {
        let w = RubyExpr::Int(width.bits() as i64);
        let value = RubyExpr::paren(self.transform_expr(value));
        let amount = RubyExpr::paren(self.transform_expr(amount));
        let amt = RubyExpr::paren(RubyExpr::binary("%", amount.clone(), w.clone()));
        let inv = RubyExpr::paren(RubyExpr::binary(
            "%",
            RubyExpr::paren(RubyExpr::binary("-", w.clone(), amount)),
            w,
        ));
        let (lo, hi) = if right { (inv, amt) } else { (amt, inv) };
        let shifted = RubyExpr::binary(
            "|",
            RubyExpr::paren(RubyExpr::binary("<<", value.clone(), lo)),
            RubyExpr::paren(RubyExpr::binary(">>", value, hi)),
        );
        RubyExpr::paren(RubyExpr::binary(
            "&",
            RubyExpr::paren(shifted),
            RubyExpr::RawInt(mask_literal(width).into()),
        ))
    }

    fn pack_bytes(&mut self, bytes: &[Expr], width: Width, endian: Endian) -> RubyExpr {
        if width == Width::W8 {
            let byte = bytes
                .first()
                .map(|b| self.transform_expr(b))
                .unwrap_or(RubyExpr::Int(0));
            return RubyExpr::paren(RubyExpr::binary(
                "&",
                RubyExpr::paren(byte),
                RubyExpr::RawInt("0xFF".into()),
            ));
        }
        let list = RubyExpr::Array(self.transform_args(bytes));
        RubyExpr::call(
            RubyExpr::call(list, "pack", vec![RubyExpr::Str("C*".into())]),
            "unpack1",
            vec![RubyExpr::Str(pack_format(width, endian).into())],
        )
    }

    fn unpack_bytes(&mut self, value: &Expr, width: Width, endian: Endian) -> RubyExpr {
        let value = self.transform_expr(value);
        if width == Width::W8 {
            return RubyExpr::Array(vec![RubyExpr::binary(
                "&",
                RubyExpr::paren(value),
                RubyExpr::RawInt("0xFF".into()),
            )]);
        }
        RubyExpr::call(
            RubyExpr::call(
                RubyExpr::Array(vec![value]),
                "pack",
                vec![RubyExpr::Str(pack_format(width, endian).into())],
            ),
            "bytes",
            vec![],
        )
    }

    fn cast(&mut self, value: &Expr, target_ty: &Type) -> RubyExpr {
        let inner = RubyExpr::paren(self.transform_expr(value));
        match target_ty {
            Type::Int | Type::Int64 => RubyExpr::call(inner, "to_i", vec![]),
            Type::Int32 => {
                self.helpers.register("to_int32");
                RubyExpr::free_call("to_int32", vec![inner])
            }
            Type::UInt8 => RubyExpr::binary("&", inner, RubyExpr::RawInt("0xFF".into())),
            Type::UInt16 => RubyExpr::binary("&", inner, RubyExpr::RawInt("0xFFFF".into())),
            Type::UInt32 => RubyExpr::binary("&", inner, RubyExpr::RawInt("0xFFFFFFFF".into())),
            Type::UInt64 => RubyExpr::binary(
                "&",
                inner,
                RubyExpr::RawInt("0xFFFFFFFFFFFFFFFF".into()),
            ),
            Type::Float => RubyExpr::call(inner, "to_f", vec![]),
            Type::String => RubyExpr::call(inner, "to_s", vec![]),
            Type::Bool => RubyExpr::Unary {
                op: "!",
                operand: Box::new(RubyExpr::Unary {
                    op: "!",
                    operand: Box::new(inner),
                }),
            },
            Type::Array(_) | Type::TypedArray(_) => RubyExpr::call(inner, "dup", vec![]),
            _ => inner,
        }
    }

    fn math_call(&mut self, func: MathFunc, args: &[Expr]) -> RubyExpr {
        use MathFunc::*;
        let module_fn = |name: &str, args: Vec<RubyExpr>| {
            RubyExpr::call(RubyExpr::Const("Math".into()), name, args)
        };
        let args_t = self.transform_args(args);
        match func {
            Floor | Ceil | Round | Abs => {
                let name = match func {
                    Floor => "floor",
                    Ceil => "ceil",
                    Round => "round",
                    _ => "abs",
                };
                let recv = args_t
                    .into_iter()
                    .next()
                    .unwrap_or(RubyExpr::Int(0));
                RubyExpr::call(RubyExpr::paren(recv), name, vec![])
            }
            Trunc => {
                let recv = args_t.into_iter().next().unwrap_or(RubyExpr::Int(0));
                RubyExpr::call(RubyExpr::paren(recv), "truncate", vec![])
            }
            Sign => {
                let recv = args_t.into_iter().next().unwrap_or(RubyExpr::Int(0));
                RubyExpr::paren(RubyExpr::binary("<=>", RubyExpr::paren(recv), RubyExpr::Int(0)))
            }
            Min | Max => {
                let name = if func == Min { "min" } else { "max" };
                RubyExpr::call(RubyExpr::Array(args_t), name, vec![])
            }
            Sqrt => module_fn("sqrt", args_t),
            Cbrt => module_fn("cbrt", args_t),
            Exp => module_fn("exp", args_t),
            Log => module_fn("log", args_t),
            Log2 => module_fn("log2", args_t),
            Log10 => module_fn("log10", args_t),
            Sin => module_fn("sin", args_t),
            Cos => module_fn("cos", args_t),
            Tan => module_fn("tan", args_t),
            Asin => module_fn("asin", args_t),
            Acos => module_fn("acos", args_t),
            Atan => module_fn("atan", args_t),
            Atan2 => module_fn("atan2", args_t),
            Sinh => module_fn("sinh", args_t),
            Cosh => module_fn("cosh", args_t),
            Tanh => module_fn("tanh", args_t),
            Hypot => module_fn("hypot", args_t),
            Random => RubyExpr::free_call("rand", vec![]),
        }
    }
}

fn compound_spelling(op: AssignOp) -> Option<&'static str> {
    match op {
        AssignOp::Assign => None,
        AssignOp::Add => Some("+="),
        AssignOp::Sub => Some("-="),
        AssignOp::Mul => Some("*="),
        AssignOp::Div => Some("/="),
        AssignOp::Mod => Some("%="),
        AssignOp::Shl => Some("<<="),
        AssignOp::Shr => Some(">>="),
        // Ruby has no zero-fill compound shift; the plain shift is close
        // enough only after 32-bit truncation, so spell it out.
        AssignOp::UShr => Some(">>="),
        AssignOp::BitAnd => Some("&="),
        AssignOp::BitOr => Some("|="),
        AssignOp::BitXor => Some("^="),
    }
}

fn error_class(kind: ErrorKind) -> &'static str {
    match kind {
        ErrorKind::Error | ErrorKind::ReferenceError => "StandardError",
        ErrorKind::TypeError => "TypeError",
        ErrorKind::RangeError => "RangeError",
        ErrorKind::SyntaxError => "ArgumentError",
    }
}

fn ivar_name(prop: &str) -> String {
    to_snake_case(prop.trim_start_matches('_'))
}

fn mask_literal(width: Width) -> &'static str {
    match width {
        Width::W8 => "0xFF",
        Width::W16 => "0xFFFF",
        Width::W32 => "0xFFFFFFFF",
        Width::W64 => "0xFFFFFFFFFFFFFFFF",
    }
}

fn pack_format(width: Width, endian: Endian) -> &'static str {
    match (width, endian) {
        (Width::W16, Endian::Big) => "n",
        (Width::W16, Endian::Little) => "v",
        (Width::W32, Endian::Big) => "N",
        (Width::W32, Endian::Little) => "V",
        (Width::W64, Endian::Big) => "Q>",
        (Width::W64, Endian::Little) => "Q<",
        // Callers special-case W8 before asking for a format.
        (Width::W8, _) => "C",
    }
}

fn collect_this_assignments(body: &[Stmt], visit: &mut impl FnMut(&str)) {
    fn walk_expr(expr: &Expr, visit: &mut impl FnMut(&str)) {
        if let ExprKind::Assign { target, .. } = &expr.kind {
            if let ExprKind::ThisProperty(name) = &target.kind {
                visit(name);
            }
        }
    }
    for stmt in body {
        match stmt {
            Stmt::Expr(e) => walk_expr(e, visit),
            Stmt::If(s) => {
                collect_this_assignments(&s.then_block, visit);
                if let Some(else_block) = &s.else_block {
                    collect_this_assignments(else_block, visit);
                }
            }
            Stmt::Block(inner) => collect_this_assignments(inner, visit),
            Stmt::For(s) => collect_this_assignments(&s.body, visit),
            Stmt::ForOf(s) => collect_this_assignments(&s.body, visit),
            Stmt::While(s) => collect_this_assignments(&s.body, visit),
            _ => {}
        }
    }
}

fn body_has_continue(body: &[Stmt]) -> bool {
    body.iter().any(|stmt| match stmt {
        Stmt::Continue => true,
        Stmt::Block(inner) => body_has_continue(inner),
        Stmt::If(s) => {
            body_has_continue(&s.then_block)
                || s.else_block.as_deref().is_some_and(body_has_continue)
        }
        Stmt::Switch(s) => {
            s.cases.iter().any(|c| body_has_continue(&c.body))
                || s.default.as_deref().is_some_and(body_has_continue)
        }
        _ => false,
    })
}

fn slug(text: &str) -> String {
    text.chars()
        .map(|c| if c.is_ascii_alphanumeric() { c } else { '_' })
        .collect()
}
