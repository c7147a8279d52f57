//! IL → TypeScript AST.
//!
//! TypeScript is the closest target to the source, so most container and
//! string operations map onto the native method with the same meaning;
//! rotation, packing, and codec nodes call camelCase runtime helpers. The
//! zero-fill shift is preserved verbatim. Leading-underscore property names
//! become public fields without the underscore.

use super::ast::*;
use crate::backend::HelperSet;
use crate::diagnostics::Diagnostics;
use crate::il::*;
use crate::options::EmitOptions;
use argot_core::names::strip_privacy_prefix;
use argot_core::{Endian, Type, Width};
use std::collections::HashSet;

pub struct TsTransformer {
    pub helpers: HelperSet,
    pub diags: Diagnostics,
}

impl TsTransformer {
    pub fn new(_options: &EmitOptions) -> TsTransformer {
        TsTransformer {
            helpers: HelperSet::new(),
            diags: Diagnostics::new(),
        }
    }

    pub fn transform_module(&mut self, module: &Module) -> TsProgram {
        let mut decls = Vec::new();
        for decl in &module.decls {
            match decl {
                Decl::Class(class) => {
                    decls.push(self.transform_class(class));
                    decls.push(TsStmt::Blank);
                }
                Decl::Function(func) => {
                    decls.push(TsStmt::Function {
                        name: func.name.clone(),
                        params: self.transform_params(&func.params),
                        ret: type_str(&func.return_ty),
                        body: self.transform_stmts(&func.body),
                    });
                    decls.push(TsStmt::Blank);
                }
                Decl::Constant(c) => {
                    let value = self.transform_expr(&c.value);
                    decls.push(TsStmt::Const {
                        name: c.name.clone(),
                        ty: None,
                        value,
                    });
                }
                Decl::Import(import) => {
                    decls.push(TsStmt::Comment(format!(
                        "imported from {}: {}",
                        import.from,
                        import.names.join(", ")
                    )));
                }
                Decl::Export(_) => {}
            }
        }
        TsProgram { decls }
    }

    fn transform_class(&mut self, class: &ClassDecl) -> TsStmt {
        let mut fields: Vec<TsField> = Vec::new();
        let mut seen = HashSet::new();
        for member in &class.members {
            if let Member::Field(field) = member {
                let name = strip_privacy_prefix(&field.name).to_string();
                if seen.insert(name.clone()) {
                    fields.push(TsField {
                        name,
                        ty: type_str(&field.ty),
                        is_static: field.is_static,
                        init: field.init.as_ref().map(|e| self.transform_expr(e)),
                    });
                }
            }
        }
        // Constructor assignments declare the remaining public fields.
        for member in &class.members {
            if let Member::Method(method) = member {
                if method.kind == MethodKind::Constructor {
                    collect_field_types(&method.body, &mut |name, ty| {
                        let name = strip_privacy_prefix(name).to_string();
                        if seen.insert(name.clone()) {
                            fields.push(TsField {
                                name,
                                ty: type_str(ty),
                                is_static: false,
                                init: None,
                            });
                        }
                    });
                }
            }
        }
        let mut methods = Vec::new();
        let mut static_init: Vec<TsStmt> = Vec::new();
        for member in &class.members {
            match member {
                Member::Method(method) => methods.push(self.transform_method(method)),
                Member::StaticInit(init) => {
                    static_init.extend(self.transform_stmts(&init.body));
                }
                Member::Field(_) => {}
            }
        }
        if !static_init.is_empty() {
            // `static {}` blocks surface as a synthetic static initialiser
            // invoked right after the declaration.
            methods.push(TsMethod {
                name: "__staticInit".to_string(),
                kind: TsMethodKind::Normal,
                is_static: true,
                params: vec![],
                ret: "void".to_string(),
                body: static_init,
            });
        }
        TsStmt::Class {
            name: class.name.clone(),
            extends: class.super_class.clone(),
            fields,
            methods,
        }
    }

    fn transform_method(&mut self, method: &MethodDecl) -> TsMethod {
        let kind = match method.kind {
            MethodKind::Constructor => TsMethodKind::Constructor,
            MethodKind::Getter => TsMethodKind::Getter,
            MethodKind::Setter => TsMethodKind::Setter,
            MethodKind::Normal => TsMethodKind::Normal,
        };
        TsMethod {
            name: if kind == TsMethodKind::Constructor {
                "constructor".to_string()
            } else {
                method.name.clone()
            },
            kind,
            is_static: method.is_static,
            params: self.transform_params(&method.params),
            ret: if kind == TsMethodKind::Constructor {
                String::new()
            } else {
                type_str(&method.return_ty)
            },
            body: self.transform_stmts(&method.body),
        }
    }

    fn transform_params(&mut self, params: &[Param]) -> Vec<TsParam> {
        params
            .iter()
            .map(|p| TsParam {
                name: p.name.clone(),
                ty: type_str(&p.ty),
                default: p.default.as_ref().map(|d| self.transform_expr(d)),
            })
            .collect()
    }

    // ── Statements ──

    fn transform_stmts(&mut self, stmts: &[Stmt]) -> Vec<TsStmt> {
        let mut out = Vec::new();
        for stmt in stmts {
            self.transform_stmt(stmt, &mut out);
        }
        out
    }

    fn transform_stmt(&mut self, stmt: &Stmt, out: &mut Vec<TsStmt>) {
        match stmt {
            Stmt::Block(body) => {
                // Re-emitted flat; TS block scoping matters only for
                // shadowing, which the lowered subset does not rely on.
                out.extend(self.transform_stmts(body));
            }
            Stmt::VarDecl(decl) => {
                let value = decl.init.as_ref().map(|e| self.transform_expr(e));
                let ty = if decl.ty.is_any() {
                    None
                } else {
                    Some(type_str(&decl.ty))
                };
                match (decl.kind, value) {
                    (VarKind::Const, Some(value)) => out.push(TsStmt::Const {
                        name: decl.name.clone(),
                        ty,
                        value,
                    }),
                    (_, value) => out.push(TsStmt::Let {
                        name: decl.name.clone(),
                        ty,
                        value,
                    }),
                }
            }
            Stmt::Expr(expr) => out.push(TsStmt::Expr(self.transform_expr(expr))),
            Stmt::Return(value) => out.push(TsStmt::Return(
                value.as_ref().map(|e| self.transform_expr(e)),
            )),
            Stmt::If(s) => {
                out.push(TsStmt::If {
                    cond: self.transform_expr(&s.cond),
                    then_body: self.transform_stmts(&s.then_block),
                    else_body: s.else_block.as_ref().map(|b| self.transform_stmts(b)),
                });
            }
            Stmt::While(s) => out.push(TsStmt::While {
                cond: self.transform_expr(&s.cond),
                body: self.transform_stmts(&s.body),
            }),
            Stmt::DoWhile(s) => out.push(TsStmt::DoWhile {
                body: self.transform_stmts(&s.body),
                cond: self.transform_expr(&s.cond),
            }),
            Stmt::For(s) => {
                let init = s.init.as_ref().map(|init| {
                    let mut tmp = Vec::new();
                    self.transform_stmt(init, &mut tmp);
                    Box::new(tmp.into_iter().next().unwrap_or(TsStmt::Blank))
                });
                out.push(TsStmt::For {
                    init,
                    cond: s.cond.as_ref().map(|c| self.transform_expr(c)),
                    update: s.update.as_ref().map(|u| self.transform_expr(u)),
                    body: self.transform_stmts(&s.body),
                });
            }
            Stmt::ForOf(s) => out.push(TsStmt::ForOf {
                var: s.var.clone(),
                iterable: self.transform_expr(&s.iterable),
                body: self.transform_stmts(&s.body),
                in_keys: false,
            }),
            Stmt::ForIn(s) => out.push(TsStmt::ForOf {
                var: s.var.clone(),
                iterable: self.transform_expr(&s.object),
                body: self.transform_stmts(&s.body),
                in_keys: true,
            }),
            Stmt::Break => out.push(TsStmt::Break),
            Stmt::Continue => out.push(TsStmt::Continue),
            Stmt::Throw(expr) => out.push(TsStmt::Throw(self.transform_expr(expr))),
            Stmt::TryCatch(s) => {
                let catch = s.catches.first();
                if s.catches.len() > 1 {
                    self.diags.warn(
                        "multiple catch clauses merged into one for TypeScript",
                        None,
                    );
                }
                out.push(TsStmt::TryCatch {
                    body: self.transform_stmts(&s.try_block),
                    catch_var: catch.map(|c| c.var_name.clone()),
                    catch_body: catch.map(|c| self.transform_stmts(&c.body)),
                    finally_body: s.finally.as_ref().map(|f| self.transform_stmts(f)),
                });
            }
            Stmt::Switch(s) => {
                let cases = s
                    .cases
                    .iter()
                    .map(|case| {
                        let patterns =
                            case.patterns.iter().map(|p| self.transform_expr(p)).collect();
                        (patterns, self.transform_stmts(&case.body))
                    })
                    .collect();
                out.push(TsStmt::Switch {
                    subject: self.transform_expr(&s.subject),
                    cases,
                    default: s.default.as_ref().map(|d| self.transform_stmts(d)),
                });
            }
        }
    }

    // ── Expressions ──

    fn unhandled(&mut self, variant: &str) -> TsExpr {
        self.diags
            .warn(format!("no TypeScript mapping for IL variant {variant}"), None);
        TsExpr::Ident(format!("UNHANDLED_{variant}"))
    }

    pub fn transform_expr(&mut self, expr: &Expr) -> TsExpr {
        match &expr.kind {
            ExprKind::Literal(lit) => match lit {
                Literal::Int(n) => TsExpr::int(*n),
                Literal::Float(f) => TsExpr::Num(format_float(*f)),
                Literal::Str(s) => TsExpr::Str(s.clone()),
                Literal::Bool(b) => TsExpr::Bool(*b),
                Literal::Null => TsExpr::Null,
                Literal::BigInt(v) => TsExpr::BigIntLit(format!("{v}n")),
            },
            ExprKind::Ident(name) => TsExpr::Ident(name.clone()),
            ExprKind::Binary { op, left, right } => {
                let spelling = binary_spelling(*op);
                TsExpr::binary(
                    spelling,
                    self.transform_expr(left),
                    self.transform_expr(right),
                )
            }
            ExprKind::Unary { op, operand, prefix } => TsExpr::Unary {
                op: match op {
                    UnaryOp::Neg => "-",
                    UnaryOp::Plus => "+",
                    UnaryOp::Not => "!",
                    UnaryOp::BitNot => "~",
                },
                operand: Box::new(self.transform_expr(operand)),
                prefix: *prefix,
            },
            ExprKind::Assign { op, target, value } => TsExpr::Assign {
                op: assign_spelling(*op),
                target: Box::new(self.transform_expr(target)),
                value: Box::new(self.transform_expr(value)),
            },
            ExprKind::Conditional {
                cond,
                then_val,
                else_val,
            } => TsExpr::Ternary {
                cond: Box::new(self.transform_expr(cond)),
                then_val: Box::new(self.transform_expr(then_val)),
                else_val: Box::new(self.transform_expr(else_val)),
            },
            ExprKind::Sequence(exprs) => {
                TsExpr::Comma(exprs.iter().map(|e| self.transform_expr(e)).collect())
            }
            ExprKind::Paren(inner) => TsExpr::paren(self.transform_expr(inner)),
            ExprKind::Member {
                target,
                name,
                optional,
            } => TsExpr::Member {
                recv: Box::new(self.transform_expr(target)),
                name: name.clone(),
                optional: *optional,
            },
            ExprKind::Element { target, index } => TsExpr::Index {
                recv: Box::new(self.transform_expr(target)),
                index: Box::new(self.transform_expr(index)),
            },
            ExprKind::ThisProperty(name) => {
                TsExpr::member(TsExpr::This, strip_privacy_prefix(name))
            }
            ExprKind::ThisMethodCall { name, args } => TsExpr::method(
                TsExpr::This,
                name.clone(),
                self.transform_args(args),
            ),
            ExprKind::ParentConstructorCall(args) => {
                TsExpr::SuperCall(self.transform_args(args))
            }
            ExprKind::ParentMethodCall { name, args } => TsExpr::SuperMethodCall {
                name: name.clone(),
                args: self.transform_args(args),
            },
            ExprKind::Super => self.unhandled("Super"),
            ExprKind::This => TsExpr::This,
            ExprKind::Spread(inner) => {
                TsExpr::Spread(Box::new(self.transform_expr(inner)))
            }
            ExprKind::Call { callee, args } => TsExpr::call(
                self.transform_expr(callee),
                self.transform_args(args),
            ),
            ExprKind::New { class_name, args } => TsExpr::New {
                callee: class_name.clone(),
                args: self.transform_args(args),
            },
            ExprKind::Lambda { params, body } => self.arrow(params, body),
            ExprKind::ArrayLit(elements) => {
                TsExpr::Array(elements.iter().map(|e| self.transform_expr(e)).collect())
            }
            ExprKind::ArrayCreation { size, init } => {
                let base = TsExpr::call(
                    TsExpr::member(
                        TsExpr::New {
                            callee: "Array".to_string(),
                            args: vec![self.transform_expr(size)],
                        },
                        "fill",
                    ),
                    vec![init
                        .as_ref()
                        .map(|i| self.transform_expr(i))
                        .unwrap_or(TsExpr::int(0))],
                );
                base
            }
            ExprKind::TypedArrayCreation { width, size } => TsExpr::New {
                callee: typed_array_name(*width).to_string(),
                args: vec![self.transform_expr(size)],
            },
            ExprKind::ObjectLit(entries) => TsExpr::Object(
                entries
                    .iter()
                    .map(|(key, value)| {
                        let key = match key {
                            ObjectKey::Ident(name) => name.clone(),
                            ObjectKey::Str(s) => format!("{:?}", s),
                            ObjectKey::Int(n) => n.to_string(),
                        };
                        (key, self.transform_expr(value))
                    })
                    .collect(),
            ),
            ExprKind::MapCreation => TsExpr::New {
                callee: "Map".to_string(),
                args: vec![],
            },
            ExprKind::SetCreation => TsExpr::New {
                callee: "Set".to_string(),
                args: vec![],
            },
            ExprKind::ArrayLength(target) => {
                TsExpr::member(self.transform_expr(target), "length")
            }
            ExprKind::ArrayAppend { target, values } => TsExpr::method(
                self.transform_expr(target),
                "push",
                self.transform_args(values),
            ),
            ExprKind::ArrayPop(target) => {
                TsExpr::method(self.transform_expr(target), "pop", vec![])
            }
            ExprKind::ArrayShift(target) => {
                TsExpr::method(self.transform_expr(target), "shift", vec![])
            }
            ExprKind::ArrayUnshift { target, values } => TsExpr::method(
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
                let mut args = vec![self.transform_expr(start)];
                if let Some(count) = delete_count {
                    args.push(self.transform_expr(count));
                }
                args.extend(self.transform_args(items));
                TsExpr::method(self.transform_expr(target), "splice", args)
            }
            ExprKind::ArraySlice { target, start, end } => {
                self.slice_call(target, start, end, "slice")
            }
            ExprKind::ArrayFill { target, value } => TsExpr::method(
                self.transform_expr(target),
                "fill",
                vec![self.transform_expr(value)],
            ),
            ExprKind::ArrayClear(target) => TsExpr::Assign {
                op: "=",
                target: Box::new(TsExpr::member(self.transform_expr(target), "length")),
                value: Box::new(TsExpr::int(0)),
            },
            ExprKind::ArrayConcat { target, others } => TsExpr::method(
                self.transform_expr(target),
                "concat",
                self.transform_args(others),
            ),
            ExprKind::ArrayReverse(target) => {
                TsExpr::method(self.transform_expr(target), "reverse", vec![])
            }
            ExprKind::ArrayJoin { target, sep } => TsExpr::method(
                self.transform_expr(target),
                "join",
                sep.as_ref()
                    .map(|s| vec![self.transform_expr(s)])
                    .unwrap_or_default(),
            ),
            ExprKind::ArrayIndexOf { target, needle } => TsExpr::method(
                self.transform_expr(target),
                "indexOf",
                vec![self.transform_expr(needle)],
            ),
            ExprKind::ArrayIncludes { target, needle } => TsExpr::method(
                self.transform_expr(target),
                "includes",
                vec![self.transform_expr(needle)],
            ),
            ExprKind::ArrayMap { target, callback } => {
                self.higher_order(target, callback, "map")
            }
            ExprKind::ArrayFilter { target, callback } => {
                self.higher_order(target, callback, "filter")
            }
            ExprKind::ArrayForEach { target, callback } => {
                self.higher_order(target, callback, "forEach")
            }
            ExprKind::ArrayFind { target, callback } => {
                self.higher_order(target, callback, "find")
            }
            ExprKind::ArrayFindIndex { target, callback } => {
                self.higher_order(target, callback, "findIndex")
            }
            ExprKind::ArrayReduce {
                target,
                callback,
                init,
            } => {
                let mut args = vec![self.transform_expr(callback)];
                if let Some(init) = init {
                    args.push(self.transform_expr(init));
                }
                TsExpr::method(self.transform_expr(target), "reduce", args)
            }
            ExprKind::ArrayEvery { target, callback } => {
                self.higher_order(target, callback, "every")
            }
            ExprKind::ArraySome { target, callback } => {
                self.higher_order(target, callback, "some")
            }
            ExprKind::ArraySort { target, comparator } => TsExpr::method(
                self.transform_expr(target),
                "sort",
                comparator
                    .as_ref()
                    .map(|c| vec![self.transform_expr(c)])
                    .unwrap_or_default(),
            ),
            ExprKind::ArrayFrom(source) => TsExpr::method(
                TsExpr::Ident("Array".to_string()),
                "from",
                vec![self.transform_expr(source)],
            ),
            ExprKind::ArrayXor { a, b } => {
                self.helpers.register("xorArrays");
                TsExpr::free_call(
                    "xorArrays",
                    vec![self.transform_expr(a), self.transform_expr(b)],
                )
            }
            ExprKind::CopyArray(target) => {
                TsExpr::method(self.transform_expr(target), "slice", vec![])
            }
            ExprKind::RotateLeft {
                value,
                amount,
                width,
            } => self.rotate_helper(value, amount, *width, false),
            ExprKind::RotateRight {
                value,
                amount,
                width,
            } => self.rotate_helper(value, amount, *width, true),
            ExprKind::PackBytes {
                bytes,
                width,
                endian,
            } => {
                let name = pack_helper_name("pack", *width, *endian);
                self.helpers.register(name);
                TsExpr::free_call(name, self.transform_args(bytes))
            }
            ExprKind::UnpackBytes {
                value,
                width,
                endian,
            } => {
                let name = pack_helper_name("unpack", *width, *endian);
                self.helpers.register(name);
                TsExpr::free_call(name, vec![self.transform_expr(value)])
            }
            ExprKind::Cast { value, target_ty } => self.cast(value, target_ty),
            ExprKind::BigIntCast(value) => {
                TsExpr::free_call("BigInt", vec![self.transform_expr(value)])
            }
            ExprKind::MathCall { func, args } => {
                let name = math_method_name(*func);
                TsExpr::method(
                    TsExpr::Ident("Math".to_string()),
                    name,
                    self.transform_args(args),
                )
            }
            ExprKind::MathConstant(c) => TsExpr::member(
                TsExpr::Ident("Math".to_string()),
                match c {
                    MathConst::Pi => "PI",
                    MathConst::E => "E",
                    MathConst::Ln2 => "LN2",
                    MathConst::Ln10 => "LN10",
                    MathConst::Log2E => "LOG2E",
                    MathConst::Log10E => "LOG10E",
                    MathConst::Sqrt2 => "SQRT2",
                    MathConst::Sqrt1_2 => "SQRT1_2",
                },
            ),
            ExprKind::NumberConstant(c) => match c {
                NumberConst::NaN => TsExpr::Ident("NaN".to_string()),
                NumberConst::PositiveInfinity => TsExpr::Ident("Infinity".to_string()),
                NumberConst::NegativeInfinity => TsExpr::Unary {
                    op: "-",
                    operand: Box::new(TsExpr::Ident("Infinity".to_string())),
                    prefix: true,
                },
                other => TsExpr::member(
                    TsExpr::Ident("Number".to_string()),
                    match other {
                        NumberConst::MaxSafeInteger => "MAX_SAFE_INTEGER",
                        NumberConst::MinSafeInteger => "MIN_SAFE_INTEGER",
                        NumberConst::MaxValue => "MAX_VALUE",
                        NumberConst::MinValue => "MIN_VALUE",
                        NumberConst::Epsilon => "EPSILON",
                        _ => "NaN",
                    },
                ),
            },
            ExprKind::Power { base, exp } => TsExpr::paren(TsExpr::binary(
                "**",
                self.transform_expr(base),
                self.transform_expr(exp),
            )),
            ExprKind::IsInteger(x) => TsExpr::method(
                TsExpr::Ident("Number".to_string()),
                "isInteger",
                vec![self.transform_expr(x)],
            ),
            ExprKind::IsNaN(x) => TsExpr::method(
                TsExpr::Ident("Number".to_string()),
                "isNaN",
                vec![self.transform_expr(x)],
            ),
            ExprKind::IsFinite(x) => TsExpr::method(
                TsExpr::Ident("Number".to_string()),
                "isFinite",
                vec![self.transform_expr(x)],
            ),
            ExprKind::SecureCompare { a, b } => {
                self.helpers.register("secureCompare");
                TsExpr::free_call(
                    "secureCompare",
                    vec![self.transform_expr(a), self.transform_expr(b)],
                )
            }
            ExprKind::StringInterpolation(parts) => TsExpr::Template(
                parts
                    .iter()
                    .map(|part| match part {
                        InterpPart::Str(s) => TsTemplatePart::Str(s.clone()),
                        InterpPart::Expr(e) => TsTemplatePart::Expr(self.transform_expr(e)),
                    })
                    .collect(),
            ),
            ExprKind::StringSplit { target, sep } => TsExpr::method(
                self.transform_expr(target),
                "split",
                vec![self.transform_expr(sep)],
            ),
            ExprKind::StringTrim(target) => {
                TsExpr::method(self.transform_expr(target), "trim", vec![])
            }
            ExprKind::StringRepeat { target, count } => TsExpr::method(
                self.transform_expr(target),
                "repeat",
                vec![self.transform_expr(count)],
            ),
            ExprKind::StringReplace {
                target,
                from,
                to,
                all,
            } => TsExpr::method(
                self.transform_expr(target),
                if *all { "replaceAll" } else { "replace" },
                vec![self.transform_expr(from), self.transform_expr(to)],
            ),
            ExprKind::StringSlice { target, start, end } => {
                self.slice_call(target, start, end, "slice")
            }
            ExprKind::StringSubstring { target, start, end } => {
                let mut args = vec![self.transform_expr(start)];
                if let Some(end) = end {
                    args.push(self.transform_expr(end));
                }
                TsExpr::method(self.transform_expr(target), "substring", args)
            }
            ExprKind::StringCharCodeAt { target, index } => TsExpr::method(
                self.transform_expr(target),
                "charCodeAt",
                vec![self.transform_expr(index)],
            ),
            ExprKind::StringCharAt { target, index } => TsExpr::method(
                self.transform_expr(target),
                "charAt",
                vec![self.transform_expr(index)],
            ),
            ExprKind::StringIndexOf { target, needle } => TsExpr::method(
                self.transform_expr(target),
                "indexOf",
                vec![self.transform_expr(needle)],
            ),
            ExprKind::StringIncludes { target, needle } => TsExpr::method(
                self.transform_expr(target),
                "includes",
                vec![self.transform_expr(needle)],
            ),
            ExprKind::StringStartsWith { target, prefix } => TsExpr::method(
                self.transform_expr(target),
                "startsWith",
                vec![self.transform_expr(prefix)],
            ),
            ExprKind::StringEndsWith { target, suffix } => TsExpr::method(
                self.transform_expr(target),
                "endsWith",
                vec![self.transform_expr(suffix)],
            ),
            ExprKind::StringToLower(target) => {
                TsExpr::method(self.transform_expr(target), "toLowerCase", vec![])
            }
            ExprKind::StringToUpper(target) => {
                TsExpr::method(self.transform_expr(target), "toUpperCase", vec![])
            }
            ExprKind::StringConcat(parts) => {
                let mut iter = parts.iter();
                let first = match iter.next() {
                    Some(first) => self.transform_expr(first),
                    None => TsExpr::Str(String::new()),
                };
                iter.fold(first, |acc, part| {
                    TsExpr::binary("+", acc, self.transform_expr(part))
                })
            }
            ExprKind::StringFromCharCodes(codes) => TsExpr::method(
                TsExpr::Ident("String".to_string()),
                "fromCharCode",
                self.transform_args(codes),
            ),
            ExprKind::StringToBytes(target) => {
                self.helpers.register("stringToBytes");
                TsExpr::free_call("stringToBytes", vec![self.transform_expr(target)])
            }
            ExprKind::BytesToString(target) => {
                self.helpers.register("bytesToString");
                TsExpr::free_call("bytesToString", vec![self.transform_expr(target)])
            }
            ExprKind::HexDecode(hex) => {
                self.helpers.register("hexToBytes");
                TsExpr::free_call("hexToBytes", vec![self.transform_expr(hex)])
            }
            ExprKind::HexEncode(bytes) => {
                self.helpers.register("bytesToHex");
                TsExpr::free_call("bytesToHex", vec![self.transform_expr(bytes)])
            }
            ExprKind::ObjectKeys(target) => TsExpr::method(
                TsExpr::Ident("Object".to_string()),
                "keys",
                vec![self.transform_expr(target)],
            ),
            ExprKind::ObjectValues(target) => TsExpr::method(
                TsExpr::Ident("Object".to_string()),
                "values",
                vec![self.transform_expr(target)],
            ),
            ExprKind::ObjectEntries(target) => TsExpr::method(
                TsExpr::Ident("Object".to_string()),
                "entries",
                vec![self.transform_expr(target)],
            ),
            ExprKind::ObjectFreeze(target) => TsExpr::method(
                TsExpr::Ident("Object".to_string()),
                "freeze",
                vec![self.transform_expr(target)],
            ),
            ExprKind::JsonParse(target) => TsExpr::method(
                TsExpr::Ident("JSON".to_string()),
                "parse",
                vec![self.transform_expr(target)],
            ),
            ExprKind::JsonStringify { value, indent } => {
                let mut args = vec![self.transform_expr(value)];
                if let Some(indent) = indent {
                    args.push(TsExpr::Null);
                    args.push(self.transform_expr(indent));
                }
                TsExpr::method(TsExpr::Ident("JSON".to_string()), "stringify", args)
            }
            ExprKind::TypeOf(value) => {
                TsExpr::TypeOf(Box::new(self.transform_expr(value)))
            }
            ExprKind::InstanceOf { value, class_name } => TsExpr::InstanceOf {
                value: Box::new(self.transform_expr(value)),
                class_name: class_name.clone(),
            },
            ExprKind::IsArray(value) => TsExpr::method(
                TsExpr::Ident("Array".to_string()),
                "isArray",
                vec![self.transform_expr(value)],
            ),
            ExprKind::ErrorCreation { kind, message } => TsExpr::New {
                callee: error_class(*kind).to_string(),
                args: message
                    .as_ref()
                    .map(|m| vec![self.transform_expr(m)])
                    .unwrap_or_default(),
            },
            ExprKind::Await(inner) => {
                TsExpr::Await(Box::new(self.transform_expr(inner)))
            }
            ExprKind::Yield { value, delegate } => TsExpr::Yield {
                value: value.as_ref().map(|v| Box::new(self.transform_expr(v))),
                delegate: *delegate,
            },
            ExprKind::DataViewCreation(buffer) => TsExpr::New {
                callee: "DataView".to_string(),
                args: vec![self.transform_expr(buffer)],
            },
            ExprKind::DataViewRead {
                view,
                offset,
                width,
                endian,
            } => {
                let mut args = vec![self.transform_expr(offset)];
                if *width != Width::W8 {
                    args.push(TsExpr::Bool(*endian == Endian::Little));
                }
                TsExpr::method(
                    self.transform_expr(view),
                    data_view_method("get", *width),
                    args,
                )
            }
            ExprKind::DataViewWrite {
                view,
                offset,
                value,
                width,
                endian,
            } => {
                let mut args = vec![self.transform_expr(offset), self.transform_expr(value)];
                if *width != Width::W8 {
                    args.push(TsExpr::Bool(*endian == Endian::Little));
                }
                TsExpr::method(
                    self.transform_expr(view),
                    data_view_method("set", *width),
                    args,
                )
            }
            ExprKind::BufferCreation { size } => TsExpr::New {
                callee: "ArrayBuffer".to_string(),
                args: vec![self.transform_expr(size)],
            },
            ExprKind::TypedArraySet {
                target,
                source,
                offset,
            } => {
                let mut args = vec![self.transform_expr(source)];
                if let Some(offset) = offset {
                    args.push(self.transform_expr(offset));
                }
                TsExpr::method(self.transform_expr(target), "set", args)
            }
            ExprKind::TypedArraySubarray { target, start, end } => {
                self.slice_call(target, start, end, "subarray")
            }
            ExprKind::DebugOutput { level, args } => TsExpr::method(
                TsExpr::Ident("console".to_string()),
                match level {
                    DebugLevel::Log => "log",
                    DebugLevel::Warn => "warn",
                    DebugLevel::Error => "error",
                },
                self.transform_args(args),
            ),
            ExprKind::Placeholder(what) => {
                self.diags.warn(
                    format!("unsupported construct reached the TypeScript back-end: {what}"),
                    None,
                );
                TsExpr::Ident(format!("UNSUPPORTED_{}", slug(what)))
            }
        }
    }

    fn transform_args(&mut self, args: &[Expr]) -> Vec<TsExpr> {
        args.iter().map(|a| self.transform_expr(a)).collect()
    }

    fn arrow(&mut self, params: &[Param], body: &[Stmt]) -> TsExpr {
        let params = self.transform_params(params);
        // `x => expr` for a single-return body, a block otherwise.
        if let [Stmt::Return(Some(value))] = body {
            return TsExpr::Arrow {
                params,
                body: TsArrowBody::Expr(Box::new(self.transform_expr(value))),
            };
        }
        TsExpr::Arrow {
            params,
            body: TsArrowBody::Block(self.transform_stmts(body)),
        }
    }

    fn higher_order(&mut self, target: &Expr, callback: &Expr, method: &str) -> TsExpr {
        TsExpr::method(
            self.transform_expr(target),
            method,
            vec![self.transform_expr(callback)],
        )
    }

    fn slice_call(
        &mut self,
        target: &Expr,
        start: &Option<Box<Expr>>,
        end: &Option<Box<Expr>>,
        method: &str,
    ) -> TsExpr {
        let mut args = Vec::new();
        if let Some(start) = start {
            args.push(self.transform_expr(start));
            if let Some(end) = end {
                args.push(self.transform_expr(end));
            }
        }
        TsExpr::method(self.transform_expr(target), method, args)
    }

    fn rotate_helper(&mut self, value: &Expr, amount: &Expr, width: Width, right: bool) -> TsExpr {
        let name: &'static str = match (width, right) {
            (Width::W8, false) => "rotl8",
            (Width::W8, true) => "rotr8",
            (Width::W16, false) => "rotl16",
            (Width::W16, true) => "rotr16",
            (Width::W32, false) => "rotl32",
            (Width::W32, true) => "rotr32",
            (Width::W64, false) => "rotl64",
            (Width::W64, true) => "rotr64",
        };
        self.helpers.register(name);
        TsExpr::free_call(
            name,
            vec![self.transform_expr(value), self.transform_expr(amount)],
        )
    }

    fn cast(&mut self, value: &Expr, target_ty: &Type) -> TsExpr {
        let inner = self.transform_expr(value);
        match target_ty {
            Type::Int => TsExpr::method(
                TsExpr::Ident("Math".to_string()),
                "trunc",
                vec![TsExpr::free_call("Number", vec![inner])],
            ),
            Type::Int32 => TsExpr::paren(TsExpr::binary("|", inner, TsExpr::int(0))),
            Type::UInt8 => TsExpr::paren(TsExpr::binary("&", inner, TsExpr::Num("0xFF".into()))),
            Type::UInt16 => {
                TsExpr::paren(TsExpr::binary("&", inner, TsExpr::Num("0xFFFF".into())))
            }
            Type::UInt32 => TsExpr::paren(TsExpr::binary(">>>", inner, TsExpr::int(0))),
            Type::Int64 | Type::UInt64 => TsExpr::free_call("BigInt", vec![inner]),
            Type::Float => TsExpr::free_call("Number", vec![inner]),
            Type::String => TsExpr::free_call("String", vec![inner]),
            Type::Bool => TsExpr::free_call("Boolean", vec![inner]),
            Type::TypedArray(width) => TsExpr::New {
                callee: typed_array_name(*width).to_string(),
                args: vec![inner],
            },
            Type::Array(_) => TsExpr::method(TsExpr::paren(inner), "slice", vec![]),
            other => TsExpr::As {
                value: Box::new(inner),
                ty: type_str(other),
            },
        }
    }
}

/// IL lattice tag → TypeScript annotation.
pub fn type_str(ty: &Type) -> String {
    match ty {
        Type::Int | Type::Int32 | Type::Float | Type::UInt8 | Type::UInt16 | Type::UInt32 => {
            "number".to_string()
        }
        Type::Int64 | Type::UInt64 => "bigint".to_string(),
        Type::Bool => "boolean".to_string(),
        Type::String => "string".to_string(),
        Type::Void => "void".to_string(),
        Type::Null => "null".to_string(),
        Type::Any => "any".to_string(),
        Type::Array(elem) => format!("{}[]", type_str(elem)),
        Type::TypedArray(width) => typed_array_name(*width).to_string(),
        Type::Map(k, v) => format!("Map<{}, {}>", type_str(k), type_str(v)),
        Type::Set(elem) => format!("Set<{}>", type_str(elem)),
        Type::Tuple(parts) => format!(
            "[{}]",
            parts.iter().map(type_str).collect::<Vec<_>>().join(", ")
        ),
        Type::Object => "Record<string, any>".to_string(),
        Type::Function => "(...args: any[]) => any".to_string(),
    }
}

fn typed_array_name(width: Width) -> &'static str {
    match width {
        Width::W8 => "Uint8Array",
        Width::W16 => "Uint16Array",
        Width::W32 => "Uint32Array",
        Width::W64 => "BigUint64Array",
    }
}

fn data_view_method(prefix: &str, width: Width) -> String {
    match width {
        Width::W8 => format!("{prefix}Uint8"),
        Width::W16 => format!("{prefix}Uint16"),
        Width::W32 => format!("{prefix}Uint32"),
        Width::W64 => format!("{prefix}BigUint64"),
    }
}

fn pack_helper_name(prefix: &str, width: Width, endian: Endian) -> &'static str {
    match (prefix, width, endian) {
        ("pack", Width::W16, Endian::Big) => "pack16BE",
        ("pack", Width::W16, Endian::Little) => "pack16LE",
        ("pack", Width::W32, Endian::Big) => "pack32BE",
        ("pack", Width::W32, Endian::Little) => "pack32LE",
        ("pack", Width::W64, Endian::Big) => "pack64BE",
        ("pack", Width::W64, Endian::Little) => "pack64LE",
        ("pack", Width::W8, _) => "pack8",
        ("unpack", Width::W16, Endian::Big) => "unpack16BE",
        ("unpack", Width::W16, Endian::Little) => "unpack16LE",
        ("unpack", Width::W32, Endian::Big) => "unpack32BE",
        ("unpack", Width::W32, Endian::Little) => "unpack32LE",
        ("unpack", Width::W64, Endian::Big) => "unpack64BE",
        ("unpack", Width::W64, Endian::Little) => "unpack64LE",
        _ => "unpack8",
    }
}

fn math_method_name(func: MathFunc) -> &'static str {
    use MathFunc::*;
    match func {
        Floor => "floor",
        Ceil => "ceil",
        Round => "round",
        Trunc => "trunc",
        Abs => "abs",
        Min => "min",
        Max => "max",
        Sqrt => "sqrt",
        Cbrt => "cbrt",
        Sign => "sign",
        Exp => "exp",
        Log => "log",
        Log2 => "log2",
        Log10 => "log10",
        Sin => "sin",
        Cos => "cos",
        Tan => "tan",
        Asin => "asin",
        Acos => "acos",
        Atan => "atan",
        Atan2 => "atan2",
        Sinh => "sinh",
        Cosh => "cosh",
        Tanh => "tanh",
        Hypot => "hypot",
        Random => "random",
    }
}

fn binary_spelling(op: BinaryOp) -> &'static str {
    match op {
        BinaryOp::Add => "+",
        BinaryOp::Sub => "-",
        BinaryOp::Mul => "*",
        BinaryOp::Div => "/",
        BinaryOp::Mod => "%",
        BinaryOp::Eq => "==",
        BinaryOp::NotEq => "!=",
        BinaryOp::StrictEq => "===",
        BinaryOp::StrictNotEq => "!==",
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
        // Preserved verbatim: TypeScript supports the zero-fill shift.
        BinaryOp::UShr => ">>>",
    }
}

fn assign_spelling(op: AssignOp) -> &'static str {
    match op {
        AssignOp::Assign => "=",
        AssignOp::Add => "+=",
        AssignOp::Sub => "-=",
        AssignOp::Mul => "*=",
        AssignOp::Div => "/=",
        AssignOp::Mod => "%=",
        AssignOp::Shl => "<<=",
        AssignOp::Shr => ">>=",
        AssignOp::UShr => ">>>=",
        AssignOp::BitAnd => "&=",
        AssignOp::BitOr => "|=",
        AssignOp::BitXor => "^=",
    }
}

fn error_class(kind: ErrorKind) -> &'static str {
    match kind {
        ErrorKind::Error => "Error",
        ErrorKind::TypeError => "TypeError",
        ErrorKind::RangeError => "RangeError",
        ErrorKind::SyntaxError => "SyntaxError",
        ErrorKind::ReferenceError => "ReferenceError",
    }
}

fn format_float(f: f64) -> String {
    if f.fract() == 0.0 && f.is_finite() {
        format!("{:.1}", f)
    } else {
        f.to_string()
    }
}

fn slug(text: &str) -> String {
    text.chars()
        .map(|c| if c.is_ascii_alphanumeric() { c } else { '_' })
        .collect()
}

fn collect_field_types(body: &[Stmt], visit: &mut impl FnMut(&str, &Type)) {
    fn walk_expr(expr: &Expr, visit: &mut impl FnMut(&str, &Type)) {
        if let ExprKind::Assign { target, value, .. } = &expr.kind {
            if let ExprKind::ThisProperty(name) = &target.kind {
                visit(name, &value.ty);
            }
        }
    }
    for stmt in body {
        match stmt {
            Stmt::Expr(e) => walk_expr(e, visit),
            Stmt::Block(inner) => collect_field_types(inner, visit),
            Stmt::If(s) => {
                collect_field_types(&s.then_block, visit);
                if let Some(else_block) = &s.else_block {
                    collect_field_types(else_block, visit);
                }
            }
            Stmt::For(s) => collect_field_types(&s.body, visit),
            Stmt::ForOf(s) => collect_field_types(&s.body, visit),
            Stmt::While(s) => collect_field_types(&s.body, visit),
            _ => {}
        }
    }
}
