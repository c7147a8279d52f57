//! IL → C AST.
//!
//! Classes become structs plus `ClassName_method(ClassName *self, ...)`
//! functions; a superclass is embedded as the leading `base` field. Arrays
//! travel as pointers with companion `<name>_len` variables (struct fields
//! get a `<field>_len` sibling), which is what the length-taking runtime
//! helpers consume. Value-field cycles between structs are broken here by
//! downgrading the back edge to a pointer; the emitter still sorts and
//! warns if one survives.

use super::ast::*;
use crate::backend::HelperSet;
use crate::diagnostics::Diagnostics;
use crate::il::*;
use crate::options::EmitOptions;
use argot_core::names::{to_screaming_snake_case, to_snake_case};
use argot_core::{Endian, Type, Width};
use std::collections::{BTreeSet, HashMap, HashSet};

pub struct CTransformer {
    pub helpers: HelperSet,
    pub diags: Diagnostics,
    pub includes: BTreeSet<&'static str>,
    safety_checks: bool,
    const_names: HashSet<String>,
    class_names: HashSet<String>,
    supers: HashMap<String, String>,
    /// Locals holding a struct by value (member access uses `.`).
    value_structs: HashSet<String>,
    /// C return type of the function being transformed.
    current_ret: String,
    current_class: Option<String>,
    in_method: bool,
}

impl CTransformer {
    pub fn new(options: &EmitOptions) -> CTransformer {
        let mut includes = BTreeSet::new();
        includes.insert("stdint.h");
        includes.insert("stddef.h");
        CTransformer {
            helpers: HelperSet::new(),
            diags: Diagnostics::new(),
            includes,
            safety_checks: options.safety_checks,
            const_names: HashSet::new(),
            class_names: HashSet::new(),
            supers: HashMap::new(),
            value_structs: HashSet::new(),
            current_ret: "void".to_string(),
            current_class: None,
            in_method: false,
        }
    }

    pub fn transform_module(&mut self, module: &Module) -> CProgram {
        for decl in &module.decls {
            match decl {
                Decl::Constant(c) => {
                    self.const_names.insert(c.name.clone());
                }
                Decl::Class(c) => {
                    self.class_names.insert(c.name.clone());
                    if let Some(superclass) = &c.super_class {
                        self.supers.insert(c.name.clone(), superclass.clone());
                    }
                }
                _ => {}
            }
        }
        let mut structs = Vec::new();
        let mut globals = Vec::new();
        let mut functions = Vec::new();
        for decl in &module.decls {
            match decl {
                Decl::Class(class) => {
                    structs.push(self.build_struct(class));
                    functions.extend(self.build_class_functions(class));
                }
                Decl::Function(func) => {
                    functions.push(self.build_function(func));
                }
                Decl::Constant(c) => self.build_global(c, &mut globals),
                Decl::Import(import) => globals.push(CStmt::Comment(format!(
                    "imported from {}: {}",
                    import.from,
                    import.names.join(", ")
                ))),
                Decl::Export(_) => {}
            }
        }
        break_struct_cycles(&mut structs, &mut self.diags);
        CProgram {
            includes: self.includes.iter().copied().collect(),
            structs,
            globals,
            functions,
        }
    }

    // ── Structs ──

    fn build_struct(&mut self, class: &ClassDecl) -> CStruct {
        let mut fields: Vec<CField> = Vec::new();
        let mut seen = HashSet::new();
        if let Some(superclass) = &class.super_class {
            fields.push(CField {
                ty: superclass.clone(),
                name: "base".to_string(),
                array_len: None,
            });
            seen.insert("base".to_string());
        }
        let mut add_field = |fields: &mut Vec<CField>,
                             seen: &mut HashSet<String>,
                             name: &str,
                             ty: &Type,
                             value: Option<&Expr>| {
            let name = to_snake_case(name.trim_start_matches('_'));
            if !seen.insert(name.clone()) {
                return;
            }
            // A field initialised from `new K(...)` embeds K by value.
            if let Some(Expr {
                kind: ExprKind::New { class_name, .. },
                ..
            }) = value
            {
                fields.push(CField {
                    ty: class_name.clone(),
                    name,
                    array_len: None,
                });
                return;
            }
            let c_ty = self.c_type(ty);
            let array = is_array_like(ty);
            fields.push(CField {
                ty: c_ty,
                name: name.clone(),
                array_len: None,
            });
            if array {
                fields.push(CField {
                    ty: "size_t".to_string(),
                    name: format!("{}_len", name),
                    array_len: None,
                });
            }
        };
        for member in &class.members {
            match member {
                Member::Field(field) if !field.is_static => {
                    add_field(
                        &mut fields,
                        &mut seen,
                        &field.name,
                        &field.ty,
                        field.init.as_ref(),
                    );
                }
                Member::Method(method) if method.kind == MethodKind::Constructor => {
                    collect_field_assignments(&method.body, &mut |name, value| {
                        add_field(&mut fields, &mut seen, name, &value.ty, Some(value));
                    });
                }
                _ => {}
            }
        }
        CStruct {
            name: class.name.clone(),
            fields,
        }
    }

    // ── Functions ──

    fn build_class_functions(&mut self, class: &ClassDecl) -> Vec<CFunction> {
        let mut functions = Vec::new();
        self.current_class = Some(class.name.clone());
        for member in &class.members {
            match member {
                Member::Method(method) => {
                    functions.push(self.build_method(&class.name, method));
                }
                Member::StaticInit(init) => {
                    self.current_ret = "void".to_string();
                    self.in_method = false;
                    self.value_structs.clear();
                    let body = self.transform_stmts(&init.body);
                    functions.push(CFunction {
                        ret: "void".to_string(),
                        name: format!("{}_static_init", class.name),
                        params: vec![],
                        body,
                    });
                }
                Member::Field(_) => {}
            }
        }
        self.current_class = None;
        functions
    }

    fn build_method(&mut self, class_name: &str, method: &MethodDecl) -> CFunction {
        let (name, ret) = match method.kind {
            MethodKind::Constructor => (format!("{}_init", class_name), "void".to_string()),
            MethodKind::Getter => (
                format!("{}_get_{}", class_name, to_snake_case(&method.name)),
                self.c_type(&method.return_ty),
            ),
            MethodKind::Setter => (
                format!("{}_set_{}", class_name, to_snake_case(&method.name)),
                "void".to_string(),
            ),
            MethodKind::Normal => (
                format!("{}_{}", class_name, to_snake_case(&method.name)),
                self.c_type(&method.return_ty),
            ),
        };
        let mut params = Vec::new();
        if !method.is_static {
            params.push(CParam {
                ty: format!("{} *", class_name),
                name: "self".to_string(),
            });
        }
        params.extend(self.build_params(&method.params));
        self.current_ret = ret.clone();
        self.in_method = !method.is_static;
        self.value_structs.clear();
        let mut body = Vec::new();
        if self.safety_checks && !method.is_static {
            body.push(CStmt::If {
                cond: CExpr::binary("==", CExpr::ident("self"), CExpr::ident("NULL")),
                then_body: vec![CStmt::Return(zero_return(&ret))],
                else_body: None,
            });
        }
        body.extend(self.transform_stmts(&method.body));
        CFunction {
            ret,
            name,
            params,
            body,
        }
    }

    fn build_function(&mut self, func: &FunctionDecl) -> CFunction {
        let ret = self.c_type(&func.return_ty);
        self.current_ret = ret.clone();
        self.in_method = false;
        self.value_structs.clear();
        CFunction {
            ret,
            name: to_snake_case(&func.name),
            params: self.build_params(&func.params),
            body: self.transform_stmts(&func.body),
        }
    }

    fn build_params(&mut self, params: &[Param]) -> Vec<CParam> {
        params
            .iter()
            .map(|p| CParam {
                ty: self.c_type(&p.ty),
                name: to_snake_case(&p.name),
            })
            .collect()
    }

    fn build_global(&mut self, c: &ConstantDecl, out: &mut Vec<CStmt>) {
        let name = to_screaming_snake_case(&c.name);
        if let ExprKind::ArrayLit(elements) = &c.value.kind {
            let elem_ty = self
                .c_type(&c.value.ty.element().unwrap_or(Type::Int))
                .to_string();
            let items = elements
                .iter()
                .map(|e| (None, self.transform_expr(e)))
                .collect();
            out.push(CStmt::Decl {
                ty: format!("static const {}", elem_ty),
                name,
                array_len: Some(String::new()),
                init: Some(CExpr::CompoundLit {
                    ty: String::new(),
                    fields: items,
                }),
            });
            return;
        }
        let init = self.transform_expr(&c.value);
        out.push(CStmt::Decl {
            ty: format!("static const {}", self.c_type(&c.value.ty)),
            name,
            array_len: None,
            init: Some(init),
        });
    }

    // ── Statements ──

    fn transform_stmts(&mut self, stmts: &[Stmt]) -> Vec<CStmt> {
        let mut out = Vec::new();
        for stmt in stmts {
            self.transform_stmt(stmt, &mut out);
        }
        out
    }

    fn transform_stmt(&mut self, stmt: &Stmt, out: &mut Vec<CStmt>) {
        match stmt {
            Stmt::Block(body) => out.push(CStmt::Block(self.transform_stmts(body))),
            Stmt::VarDecl(decl) => self.transform_var_decl(decl, out),
            Stmt::Expr(expr) => {
                if let ExprKind::ArrayForEach { target, callback } = &expr.kind {
                    if let Some(stmt) = self.for_each_loop(target, callback) {
                        out.push(stmt);
                        return;
                    }
                }
                out.push(CStmt::Expr(self.transform_expr(expr)));
            }
            Stmt::Return(value) => {
                out.push(CStmt::Return(value.as_ref().map(|e| self.transform_expr(e))))
            }
            Stmt::If(s) => out.push(CStmt::If {
                cond: self.transform_expr(&s.cond),
                then_body: self.transform_stmts(&s.then_block),
                else_body: s.else_block.as_ref().map(|b| self.transform_stmts(b)),
            }),
            Stmt::While(s) => out.push(CStmt::While {
                cond: self.transform_expr(&s.cond),
                body: self.transform_stmts(&s.body),
            }),
            Stmt::DoWhile(s) => out.push(CStmt::DoWhile {
                body: self.transform_stmts(&s.body),
                cond: self.transform_expr(&s.cond),
            }),
            Stmt::For(s) => {
                let init = s.init.as_ref().map(|init| {
                    let mut tmp = Vec::new();
                    self.transform_stmt(init, &mut tmp);
                    let first = if tmp.is_empty() {
                        CStmt::Blank
                    } else {
                        tmp.remove(0)
                    };
                    out.extend(tmp);
                    Box::new(first)
                });
                out.push(CStmt::For {
                    init,
                    cond: s.cond.as_ref().map(|c| self.transform_expr(c)),
                    update: s.update.as_ref().map(|u| self.transform_expr(u)),
                    body: self.transform_stmts(&s.body),
                });
            }
            Stmt::ForOf(s) => {
                let len = self.length_expr(&s.iterable);
                let iter = self.transform_expr(&s.iterable);
                let elem_ty = self.c_type(&s.iterable.ty.element().unwrap_or(Type::Any));
                let var = to_snake_case(&s.var);
                let idx = format!("{}_i", var);
                let mut body = vec![CStmt::Decl {
                    ty: elem_ty,
                    name: var,
                    array_len: None,
                    init: Some(CExpr::Subscript {
                        recv: Box::new(iter),
                        index: Box::new(CExpr::ident(idx.clone())),
                    }),
                }];
                body.extend(self.transform_stmts(&s.body));
                out.push(CStmt::For {
                    init: Some(Box::new(CStmt::Decl {
                        ty: "size_t".to_string(),
                        name: idx.clone(),
                        array_len: None,
                        init: Some(CExpr::int(0)),
                    })),
                    cond: Some(CExpr::binary("<", CExpr::ident(idx.clone()), len)),
                    update: Some(CExpr::Assign {
                        op: "+=",
                        target: Box::new(CExpr::ident(idx)),
                        value: Box::new(CExpr::int(1)),
                    }),
                    body,
                });
            }
            Stmt::ForIn(_) => {
                self.diags
                    .warn("for-in key iteration has no C mapping", None);
                out.push(CStmt::Expr(self.unhandled("ForIn")));
            }
            Stmt::Break => out.push(CStmt::Break),
            Stmt::Continue => out.push(CStmt::Continue),
            Stmt::Throw(expr) => self.transform_throw(expr, out),
            Stmt::TryCatch(s) => {
                self.diags.warn(
                    "try/catch has no C mapping; emitting the protected block inline",
                    None,
                );
                out.extend(self.transform_stmts(&s.try_block));
                if let Some(finally) = &s.finally {
                    out.extend(self.transform_stmts(finally));
                }
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
                out.push(CStmt::Switch {
                    subject: self.transform_expr(&s.subject),
                    cases,
                    default: s.default.as_ref().map(|d| self.transform_stmts(d)),
                });
            }
        }
    }

    fn transform_var_decl(&mut self, decl: &VarDeclStmt, out: &mut Vec<CStmt>) {
        let name = to_snake_case(&decl.name);
        let Some(init) = &decl.init else {
            out.push(CStmt::Decl {
                ty: self.c_type(&decl.ty),
                name,
                array_len: None,
                init: None,
            });
            return;
        };
        match &init.kind {
            ExprKind::TypedArrayCreation { width, size } => {
                let elem = width_c_type(*width);
                self.emit_sized_array(elem, &name, size, out);
            }
            ExprKind::BufferCreation { size } => {
                self.emit_sized_array("uint8_t", &name, size, out);
            }
            ExprKind::ArrayCreation { size, init: fill } => {
                let elem = self
                    .c_type(&decl.ty.element().unwrap_or(Type::Int))
                    .to_string();
                self.emit_sized_array(&elem, &name, size, out);
                if let Some(fill) = fill {
                    if !matches!(fill.kind, ExprKind::Literal(Literal::Int(0))) {
                        self.diags.warn(
                            "array fill value other than zero dropped in C declaration",
                            None,
                        );
                    }
                }
            }
            ExprKind::ArrayLit(elements) => {
                let elem_ty = self
                    .c_type(&init.ty.element().unwrap_or(Type::Int))
                    .to_string();
                let items: Vec<(Option<String>, CExpr)> = elements
                    .iter()
                    .map(|e| (None, self.transform_expr(e)))
                    .collect();
                let count = items.len();
                out.push(CStmt::Decl {
                    ty: elem_ty,
                    name: name.clone(),
                    array_len: Some(String::new()),
                    init: Some(CExpr::CompoundLit {
                        ty: String::new(),
                        fields: items,
                    }),
                });
                out.push(self.len_decl(&name, CExpr::int(count as i64)));
            }
            ExprKind::New { class_name, args } => {
                if !self.class_names.contains(class_name) {
                    if is_framework_record(class_name) {
                        // Registration records (link items, vulnerabilities,
                        // test cases, key sizes) come from stub typedefs.
                        self.helpers.register("framework_stubs");
                    } else {
                        self.diags.warn(
                            format!("constructed unknown class {class_name}"),
                            None,
                        );
                    }
                }
                let args = self.transform_args(args);
                out.push(CStmt::Decl {
                    ty: class_name.clone(),
                    name: name.clone(),
                    array_len: None,
                    init: None,
                });
                let mut call_args = vec![CExpr::AddrOf(Box::new(CExpr::ident(name.clone())))];
                call_args.extend(args);
                out.push(CStmt::Expr(CExpr::call(
                    format!("{}_init", class_name),
                    call_args,
                )));
                self.value_structs.insert(name);
            }
            ExprKind::HexDecode(hex) => {
                self.helpers.register("hex_to_bytes");
                self.includes.insert("stdlib.h");
                let len = match &hex.kind {
                    ExprKind::Literal(Literal::Str(s)) => CExpr::int((s.len() / 2) as i64),
                    _ => {
                        self.includes.insert("string.h");
                        CExpr::binary(
                            "/",
                            CExpr::call("strlen", vec![self.transform_expr(hex)]),
                            CExpr::int(2),
                        )
                    }
                };
                let arg = self.transform_expr(hex);
                out.push(CStmt::Decl {
                    ty: "uint8_t *".to_string(),
                    name: name.clone(),
                    array_len: None,
                    init: Some(CExpr::call("hex_to_bytes", vec![arg])),
                });
                out.push(self.len_decl(&name, len));
            }
            ExprKind::ArrayMap { target, callback } => {
                if !self.emit_map_loop(&name, target, callback, out) {
                    let fallback = self.unhandled("ArrayMap");
                    out.push(CStmt::Decl {
                        ty: self.c_type(&decl.ty),
                        name,
                        array_len: None,
                        init: Some(fallback),
                    });
                }
            }
            _ => {
                let c_ty = self.c_type(&decl.ty);
                let len = self.derived_length(init);
                let init = self.transform_expr(init);
                out.push(CStmt::Decl {
                    ty: c_ty,
                    name: name.clone(),
                    array_len: None,
                    init: Some(init),
                });
                if let Some(len) = len {
                    out.push(self.len_decl(&name, len));
                }
            }
        }
    }

    fn emit_sized_array(
        &mut self,
        elem: &str,
        name: &str,
        size: &Expr,
        out: &mut Vec<CStmt>,
    ) {
        if let ExprKind::Literal(Literal::Int(n)) = &size.kind {
            out.push(CStmt::Decl {
                ty: elem.to_string(),
                name: name.to_string(),
                array_len: Some(n.to_string()),
                init: Some(CExpr::CompoundLit {
                    ty: String::new(),
                    fields: vec![(None, CExpr::int(0))],
                }),
            });
            out.push(self.len_decl(name, CExpr::int(*n)));
            return;
        }
        self.includes.insert("stdlib.h");
        let size_expr = self.transform_expr(size);
        out.push(CStmt::Decl {
            ty: format!("{} *", elem),
            name: name.to_string(),
            array_len: None,
            init: Some(CExpr::call(
                "calloc",
                vec![size_expr.clone(), CExpr::SizeOf(elem.to_string())],
            )),
        });
        out.push(self.len_decl(name, size_expr));
    }

    fn len_decl(&self, name: &str, len: CExpr) -> CStmt {
        CStmt::Decl {
            ty: "size_t".to_string(),
            name: format!("{}_len", name),
            array_len: None,
            init: Some(len),
        }
    }

    /// Companion length for array-producing initialisers, when derivable.
    fn derived_length(&mut self, init: &Expr) -> Option<CExpr> {
        match &init.kind {
            ExprKind::CopyArray(src) | ExprKind::ArrayXor { a: src, .. } => {
                Some(self.length_expr(src))
            }
            ExprKind::UnpackBytes { width, .. } => Some(CExpr::int(width.bytes() as i64)),
            ExprKind::ArraySlice {
                start: Some(start),
                end: Some(end),
                ..
            } => {
                let start = self.transform_expr(start);
                let end = self.transform_expr(end);
                Some(CExpr::paren(CExpr::binary("-", end, start)))
            }
            ExprKind::StringToBytes(s) => {
                self.includes.insert("string.h");
                Some(CExpr::call("strlen", vec![self.transform_expr(s)]))
            }
            _ => None,
        }
    }

    fn for_each_loop(&mut self, target: &Expr, callback: &Expr) -> Option<CStmt> {
        let ExprKind::Lambda { params, body } = &callback.kind else {
            return None;
        };
        let elem_name = params
            .first()
            .map(|p| to_snake_case(&p.name))
            .unwrap_or_else(|| "e".to_string());
        let elem_ty = self.c_type(&target.ty.element().unwrap_or(Type::Any));
        let len = self.length_expr(target);
        let iter = self.transform_expr(target);
        let idx = format!("{}_i", elem_name);
        let mut loop_body = vec![CStmt::Decl {
            ty: elem_ty,
            name: elem_name,
            array_len: None,
            init: Some(CExpr::Subscript {
                recv: Box::new(iter),
                index: Box::new(CExpr::ident(idx.clone())),
            }),
        }];
        loop_body.extend(self.transform_stmts(body));
        Some(CStmt::For {
            init: Some(Box::new(CStmt::Decl {
                ty: "size_t".to_string(),
                name: idx.clone(),
                array_len: None,
                init: Some(CExpr::int(0)),
            })),
            cond: Some(CExpr::binary("<", CExpr::ident(idx.clone()), len)),
            update: Some(CExpr::Assign {
                op: "+=",
                target: Box::new(CExpr::ident(idx)),
                value: Box::new(CExpr::int(1)),
            }),
            body: loop_body,
        })
    }

    /// `const out = arr.map(x => expr)` → malloc + hand-written loop.
    fn emit_map_loop(
        &mut self,
        name: &str,
        target: &Expr,
        callback: &Expr,
        out: &mut Vec<CStmt>,
    ) -> bool {
        let ExprKind::Lambda { params, body } = &callback.kind else {
            return false;
        };
        let [Stmt::Return(Some(value))] = body.as_slice() else {
            return false;
        };
        self.includes.insert("stdlib.h");
        let elem_name = params
            .first()
            .map(|p| to_snake_case(&p.name))
            .unwrap_or_else(|| "e".to_string());
        let in_ty = self.c_type(&target.ty.element().unwrap_or(Type::Any));
        let out_ty = self.c_type(&value.ty);
        let len = self.length_expr(target);
        let iter = self.transform_expr(target);
        out.push(self.len_decl(name, len));
        out.push(CStmt::Decl {
            ty: format!("{} *", out_ty),
            name: name.to_string(),
            array_len: None,
            init: Some(CExpr::call(
                "malloc",
                vec![CExpr::binary(
                    "*",
                    CExpr::ident(format!("{}_len", name)),
                    CExpr::SizeOf(out_ty.clone()),
                )],
            )),
        });
        let idx = format!("{}_i", elem_name);
        let mapped = self.transform_expr(value);
        let loop_body = vec![
            CStmt::Decl {
                ty: in_ty,
                name: elem_name,
                array_len: None,
                init: Some(CExpr::Subscript {
                    recv: Box::new(iter),
                    index: Box::new(CExpr::ident(idx.clone())),
                }),
            },
            CStmt::Expr(CExpr::Assign {
                op: "=",
                target: Box::new(CExpr::Subscript {
                    recv: Box::new(CExpr::ident(name.to_string())),
                    index: Box::new(CExpr::ident(idx.clone())),
                }),
                value: Box::new(mapped),
            }),
        ];
        out.push(CStmt::For {
            init: Some(Box::new(CStmt::Decl {
                ty: "size_t".to_string(),
                name: idx.clone(),
                array_len: None,
                init: Some(CExpr::int(0)),
            })),
            cond: Some(CExpr::binary(
                "<",
                CExpr::ident(idx.clone()),
                CExpr::ident(format!("{}_len", name)),
            )),
            update: Some(CExpr::Assign {
                op: "+=",
                target: Box::new(CExpr::ident(idx)),
                value: Box::new(CExpr::int(1)),
            }),
            body: loop_body,
        });
        true
    }

    fn transform_throw(&mut self, expr: &Expr, out: &mut Vec<CStmt>) {
        self.includes.insert("stdio.h");
        let (label, message) = match &expr.kind {
            ExprKind::ErrorCreation { kind, message } => {
                (error_label(*kind), message.as_deref().map(|m| self.transform_expr(m)))
            }
            _ => ("error", Some(self.transform_expr(expr))),
        };
        let call = match message {
            Some(message) => CExpr::call(
                "fprintf",
                vec![
                    CExpr::ident("stderr"),
                    CExpr::Str(format!("{}: %s\\n", label)),
                    message,
                ],
            ),
            None => CExpr::call(
                "fprintf",
                vec![CExpr::ident("stderr"), CExpr::Str(format!("{}\\n", label))],
            ),
        };
        out.push(CStmt::Expr(call));
        out.push(CStmt::Return(zero_return(&self.current_ret.clone())));
    }

    // ── Expressions ──

    fn unhandled(&mut self, variant: &str) -> CExpr {
        self.diags
            .warn(format!("no C mapping for IL variant {variant}"), None);
        CExpr::ident(format!("UNHANDLED_{variant}"))
    }

    pub fn transform_expr(&mut self, expr: &Expr) -> CExpr {
        match &expr.kind {
            ExprKind::Literal(lit) => match lit {
                Literal::Int(n) => {
                    if *n > i64::from(i32::MAX) || *n < i64::from(i32::MIN) {
                        CExpr::Num(format!("{}LL", n))
                    } else {
                        CExpr::int(*n)
                    }
                }
                Literal::Float(f) => CExpr::Num(format_double(*f)),
                Literal::Str(s) => CExpr::Str(escape_c(s)),
                Literal::Bool(b) => {
                    self.includes.insert("stdbool.h");
                    CExpr::ident(if *b { "true" } else { "false" })
                }
                Literal::Null => CExpr::ident("NULL"),
                Literal::BigInt(v) => CExpr::Num(format!("{}ULL", v)),
            },
            ExprKind::Ident(name) => {
                if self.const_names.contains(name) {
                    CExpr::ident(to_screaming_snake_case(name))
                } else if self.class_names.contains(name) {
                    CExpr::ident(name.clone())
                } else {
                    CExpr::ident(to_snake_case(name))
                }
            }
            ExprKind::Binary { op, left, right } => self.transform_binary(*op, left, right),
            ExprKind::Unary { op, operand, prefix } => CExpr::Unary {
                op: match op {
                    UnaryOp::Neg => "-",
                    UnaryOp::Plus => "+",
                    UnaryOp::Not => "!",
                    UnaryOp::BitNot => "~",
                },
                operand: Box::new(self.transform_expr(operand)),
                prefix: *prefix,
            },
            ExprKind::Assign { op, target, value } => {
                let target_c = self.transform_expr(target);
                // A constructed value stored into a member initialises the
                // embedded struct in place.
                if let ExprKind::New { class_name, args } = &value.kind {
                    if !self.class_names.contains(class_name) && is_framework_record(class_name) {
                        self.helpers.register("framework_stubs");
                    }
                    let mut call_args = vec![CExpr::AddrOf(Box::new(target_c))];
                    call_args.extend(self.transform_args(args));
                    return CExpr::call(format!("{}_init", class_name), call_args);
                }
                // Object-literal stores through members take the
                // `*(__typeof__(*p))`-style compound-literal cast; the
                // emitter renders the target into the cast.
                if let ExprKind::ObjectLit(entries) = &value.kind {
                    let fields = entries
                        .iter()
                        .map(|(key, value)| {
                            let key = match key {
                                ObjectKey::Ident(name) | ObjectKey::Str(name) => {
                                    Some(to_snake_case(name))
                                }
                                ObjectKey::Int(_) => None,
                            };
                            (key, self.transform_expr(value))
                        })
                        .collect();
                    return CExpr::Assign {
                        op: "=",
                        target: Box::new(target_c),
                        value: Box::new(CExpr::CompoundLit {
                            ty: String::new(),
                            fields,
                        }),
                    };
                }
                CExpr::Assign {
                    op: assign_spelling(*op),
                    target: Box::new(target_c),
                    value: Box::new(self.transform_expr(value)),
                }
            }
            ExprKind::Conditional {
                cond,
                then_val,
                else_val,
            } => CExpr::Ternary {
                cond: Box::new(self.transform_expr(cond)),
                then_val: Box::new(self.transform_expr(then_val)),
                else_val: Box::new(self.transform_expr(else_val)),
            },
            ExprKind::Sequence(exprs) => {
                CExpr::Comma(exprs.iter().map(|e| self.transform_expr(e)).collect())
            }
            ExprKind::Paren(inner) => CExpr::paren(self.transform_expr(inner)),
            ExprKind::Member { target, name, .. } => {
                let pointer = !self.is_value_struct(target);
                CExpr::member(
                    self.transform_expr(target),
                    to_snake_case(name),
                    pointer,
                )
            }
            ExprKind::Element { target, index } => CExpr::Subscript {
                recv: Box::new(self.transform_expr(target)),
                index: Box::new(self.transform_expr(index)),
            },
            ExprKind::ThisProperty(name) => CExpr::member(
                CExpr::ident("self"),
                to_snake_case(name.trim_start_matches('_')),
                true,
            ),
            ExprKind::ThisMethodCall { name, args } => {
                let class = self.current_class_name();
                let mut call_args = vec![CExpr::ident("self")];
                call_args.extend(self.transform_args(args));
                CExpr::call(format!("{}_{}", class, to_snake_case(name)), call_args)
            }
            ExprKind::ParentConstructorCall(args) => {
                let class = self.current_class_name();
                let base = self.supers.get(&class).cloned().unwrap_or_default();
                if base.is_empty() {
                    return self.unhandled("ParentConstructorCall");
                }
                let mut call_args = vec![CExpr::Cast {
                    ty: format!("{} *", base),
                    value: Box::new(CExpr::ident("self")),
                }];
                call_args.extend(self.transform_args(args));
                CExpr::call(format!("{}_init", base), call_args)
            }
            ExprKind::ParentMethodCall { name, args } => {
                let class = self.current_class_name();
                let base = self.supers.get(&class).cloned().unwrap_or_default();
                if base.is_empty() {
                    return self.unhandled("ParentMethodCall");
                }
                let mut call_args = vec![CExpr::Cast {
                    ty: format!("{} *", base),
                    value: Box::new(CExpr::ident("self")),
                }];
                call_args.extend(self.transform_args(args));
                CExpr::call(format!("{}_{}", base, to_snake_case(name)), call_args)
            }
            ExprKind::Super => self.unhandled("Super"),
            ExprKind::This => CExpr::ident("self"),
            ExprKind::Spread(_) => self.unhandled("Spread"),
            ExprKind::Call { callee, args } => {
                let args = self.transform_args(args);
                match &callee.kind {
                    ExprKind::Ident(name) => CExpr::call(to_snake_case(name), args),
                    ExprKind::Member { target, name, .. } => {
                        // Object-style calls on a known class value become
                        // ClassName_method(&value, ...).
                        if let ExprKind::Ident(var) = &target.kind {
                            if self.value_structs.contains(&to_snake_case(var)) {
                                self.diags.note(
                                    format!("method call {name} dispatched by struct type"),
                                    None,
                                );
                            }
                        }
                        let recv = self.transform_expr(target);
                        let mut call_args = vec![recv];
                        call_args.extend(args);
                        CExpr::call(to_snake_case(name), call_args)
                    }
                    _ => self.unhandled("Call"),
                }
            }
            ExprKind::New { .. } => self.unhandled("New"),
            ExprKind::Lambda { .. } => self.unhandled("Lambda"),
            ExprKind::ArrayLit(elements) => CExpr::CompoundLit {
                ty: String::new(),
                fields: elements
                    .iter()
                    .map(|e| (None, self.transform_expr(e)))
                    .collect(),
            },
            ExprKind::ArrayCreation { .. } | ExprKind::TypedArrayCreation { .. } => {
                // Only meaningful as a declaration initialiser, which
                // transform_var_decl intercepts.
                self.unhandled("TypedArrayCreation")
            }
            ExprKind::ObjectLit(entries) => CExpr::CompoundLit {
                ty: String::new(),
                fields: entries
                    .iter()
                    .map(|(key, value)| {
                        let key = match key {
                            ObjectKey::Ident(name) | ObjectKey::Str(name) => {
                                Some(to_snake_case(name))
                            }
                            ObjectKey::Int(_) => None,
                        };
                        (key, self.transform_expr(value))
                    })
                    .collect(),
            },
            ExprKind::MapCreation => self.unhandled("MapCreation"),
            ExprKind::SetCreation => self.unhandled("SetCreation"),
            ExprKind::ArrayLength(target) => {
                if target.ty == Type::String {
                    self.includes.insert("string.h");
                    return CExpr::call("strlen", vec![self.transform_expr(target)]);
                }
                self.length_expr(target)
            }
            ExprKind::ArrayAppend { .. } => self.unhandled("ArrayAppend"),
            ExprKind::ArrayPop(_) => self.unhandled("ArrayPop"),
            ExprKind::ArrayShift(_) => self.unhandled("ArrayShift"),
            ExprKind::ArrayUnshift { .. } => self.unhandled("ArrayUnshift"),
            ExprKind::ArraySplice { .. } => self.unhandled("ArraySplice"),
            ExprKind::ArraySlice { target, start, .. } => match start {
                Some(start) => {
                    let start = self.transform_expr(start);
                    CExpr::paren(CExpr::binary("+", self.transform_expr(target), start))
                }
                None => {
                    self.helpers.register("copy_array");
                    self.includes.insert("stdlib.h");
                    let len = self.length_expr(target);
                    CExpr::call("copy_array", vec![self.transform_expr(target), len])
                }
            },
            ExprKind::ArrayFill { target, value } => {
                self.includes.insert("string.h");
                let len = self.length_expr(target);
                let target_c = self.transform_expr(target);
                if matches!(value.kind, ExprKind::Literal(Literal::Int(0))) {
                    CExpr::call(
                        "memset",
                        vec![target_c, CExpr::int(0), len],
                    )
                } else {
                    self.diags
                        .warn("non-zero array fill emitted as memset of low byte", None);
                    let value = self.transform_expr(value);
                    CExpr::call("memset", vec![target_c, value, len])
                }
            }
            ExprKind::ArrayClear(target) => {
                self.helpers.register("clear_array");
                let len = self.length_expr(target);
                CExpr::call("clear_array", vec![self.transform_expr(target), len])
            }
            ExprKind::ArrayConcat { target, others } => {
                if others.len() != 1 {
                    return self.unhandled("ArrayConcat");
                }
                self.helpers.register("concat_arrays");
                self.includes.insert("stdlib.h");
                let a_len = self.length_expr(target);
                let b_len = self.length_expr(&others[0]);
                let a = self.transform_expr(target);
                let b = self.transform_expr(&others[0]);
                CExpr::call("concat_arrays", vec![a, a_len, b, b_len])
            }
            ExprKind::ArrayReverse(_) => self.unhandled("ArrayReverse"),
            ExprKind::ArrayJoin { .. } => self.unhandled("ArrayJoin"),
            ExprKind::ArrayIndexOf { .. } => self.unhandled("ArrayIndexOf"),
            ExprKind::ArrayIncludes { .. } => self.unhandled("ArrayIncludes"),
            ExprKind::ArrayMap { .. } => self.unhandled("ArrayMap"),
            ExprKind::ArrayFilter { .. } => self.unhandled("ArrayFilter"),
            ExprKind::ArrayForEach { .. } => self.unhandled("ArrayForEach"),
            ExprKind::ArrayFind { .. } => self.unhandled("ArrayFind"),
            ExprKind::ArrayFindIndex { .. } => self.unhandled("ArrayFindIndex"),
            ExprKind::ArrayReduce { .. } => self.unhandled("ArrayReduce"),
            ExprKind::ArrayEvery { .. } => self.unhandled("ArrayEvery"),
            ExprKind::ArraySome { .. } => self.unhandled("ArraySome"),
            ExprKind::ArraySort { .. } => self.unhandled("ArraySort"),
            ExprKind::ArrayFrom(_) => self.unhandled("ArrayFrom"),
            ExprKind::ArrayXor { a, b } => {
                self.helpers.register("array_xor");
                self.includes.insert("stdlib.h");
                let len = self.length_expr(a);
                let a = self.transform_expr(a);
                let b = self.transform_expr(b);
                CExpr::call("array_xor", vec![a, b, len])
            }
            ExprKind::CopyArray(target) => {
                self.helpers.register("copy_array");
                self.includes.insert("stdlib.h");
                let len = self.length_expr(target);
                CExpr::call("copy_array", vec![self.transform_expr(target), len])
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
                let name = pack_helper(*width, *endian, false);
                self.helpers.register(name);
                CExpr::call(name, self.transform_args(bytes))
            }
            ExprKind::UnpackBytes {
                value,
                width,
                endian,
            } => {
                let name = pack_helper(*width, *endian, true);
                self.helpers.register(name);
                self.includes.insert("stdlib.h");
                CExpr::call(name, vec![self.transform_expr(value)])
            }
            ExprKind::Cast { value, target_ty } => {
                let inner = self.transform_expr(value);
                match target_ty {
                    Type::String => {
                        self.diags.warn("string cast has no C mapping", None);
                        inner
                    }
                    other => CExpr::Cast {
                        ty: self.c_type(other),
                        value: Box::new(inner),
                    },
                }
            }
            ExprKind::BigIntCast(value) => CExpr::Cast {
                ty: "uint64_t".to_string(),
                value: Box::new(self.transform_expr(value)),
            },
            ExprKind::MathCall { func, args } => self.math_call(*func, args),
            ExprKind::MathConstant(c) => {
                self.includes.insert("math.h");
                CExpr::ident(match c {
                    MathConst::Pi => "M_PI",
                    MathConst::E => "M_E",
                    MathConst::Ln2 => "M_LN2",
                    MathConst::Ln10 => "M_LN10",
                    MathConst::Log2E => "M_LOG2E",
                    MathConst::Log10E => "M_LOG10E",
                    MathConst::Sqrt2 => "M_SQRT2",
                    MathConst::Sqrt1_2 => "M_SQRT1_2",
                })
            }
            ExprKind::NumberConstant(c) => match c {
                NumberConst::MaxSafeInteger => CExpr::Num("9007199254740991LL".to_string()),
                NumberConst::MinSafeInteger => CExpr::Num("-9007199254740991LL".to_string()),
                NumberConst::MaxValue => {
                    self.includes.insert("float.h");
                    CExpr::ident("DBL_MAX")
                }
                NumberConst::MinValue => {
                    self.includes.insert("float.h");
                    CExpr::ident("DBL_MIN")
                }
                NumberConst::Epsilon => {
                    self.includes.insert("float.h");
                    CExpr::ident("DBL_EPSILON")
                }
                NumberConst::PositiveInfinity => {
                    self.includes.insert("math.h");
                    CExpr::ident("INFINITY")
                }
                NumberConst::NegativeInfinity => {
                    self.includes.insert("math.h");
                    CExpr::Unary {
                        op: "-",
                        operand: Box::new(CExpr::ident("INFINITY")),
                        prefix: true,
                    }
                }
                NumberConst::NaN => {
                    self.includes.insert("math.h");
                    CExpr::ident("NAN")
                }
            },
            ExprKind::Power { base, exp } => {
                self.includes.insert("math.h");
                CExpr::call(
                    "pow",
                    vec![self.transform_expr(base), self.transform_expr(exp)],
                )
            }
            ExprKind::IsInteger(x) => {
                let value = self.transform_expr(x);
                CExpr::paren(CExpr::binary(
                    "==",
                    value.clone(),
                    CExpr::Cast {
                        ty: "int64_t".to_string(),
                        value: Box::new(value),
                    },
                ))
            }
            ExprKind::IsNaN(x) => {
                self.includes.insert("math.h");
                CExpr::call("isnan", vec![self.transform_expr(x)])
            }
            ExprKind::IsFinite(x) => {
                self.includes.insert("math.h");
                CExpr::call("isfinite", vec![self.transform_expr(x)])
            }
            ExprKind::SecureCompare { a, b } => {
                self.helpers.register("secure_compare");
                self.includes.insert("stdbool.h");
                let len = self.length_expr(a);
                let a = self.transform_expr(a);
                let b = self.transform_expr(b);
                CExpr::call("secure_compare", vec![a, b, len])
            }
            ExprKind::StringInterpolation(parts) => {
                // Constant-only interpolations fold to a literal; anything
                // else is out of reach without a formatting runtime.
                let mut folded = String::new();
                for part in parts {
                    match part {
                        InterpPart::Str(s) => folded.push_str(s),
                        InterpPart::Expr(_) => {
                            self.diags.warn(
                                "string interpolation is not supported in C output",
                                None,
                            );
                            return self.unhandled("StringInterpolation");
                        }
                    }
                }
                CExpr::Str(escape_c(&folded))
            }
            ExprKind::StringSplit { .. } => self.unhandled("StringSplit"),
            ExprKind::StringTrim(_) => self.unhandled("StringTrim"),
            ExprKind::StringRepeat { .. } => self.unhandled("StringRepeat"),
            ExprKind::StringReplace { .. } => self.unhandled("StringReplace"),
            ExprKind::StringSlice { .. } => self.unhandled("StringSlice"),
            ExprKind::StringSubstring { .. } => self.unhandled("StringSubstring"),
            ExprKind::StringCharCodeAt { target, index } => CExpr::Cast {
                ty: "uint8_t".to_string(),
                value: Box::new(CExpr::Subscript {
                    recv: Box::new(self.transform_expr(target)),
                    index: Box::new(self.transform_expr(index)),
                }),
            },
            ExprKind::StringCharAt { target, index } => CExpr::Subscript {
                recv: Box::new(self.transform_expr(target)),
                index: Box::new(self.transform_expr(index)),
            },
            ExprKind::StringIndexOf { .. } => self.unhandled("StringIndexOf"),
            ExprKind::StringIncludes { .. } => self.unhandled("StringIncludes"),
            ExprKind::StringStartsWith { .. } => self.unhandled("StringStartsWith"),
            ExprKind::StringEndsWith { .. } => self.unhandled("StringEndsWith"),
            ExprKind::StringToLower(_) => self.unhandled("StringToLower"),
            ExprKind::StringToUpper(_) => self.unhandled("StringToUpper"),
            ExprKind::StringConcat(_) => self.unhandled("StringConcat"),
            ExprKind::StringFromCharCodes(_) => self.unhandled("StringFromCharCodes"),
            ExprKind::StringToBytes(s) => {
                self.helpers.register("string_to_bytes");
                self.includes.insert("stdlib.h");
                self.includes.insert("string.h");
                CExpr::call("string_to_bytes", vec![self.transform_expr(s)])
            }
            ExprKind::BytesToString(b) => {
                self.helpers.register("bytes_to_string");
                self.includes.insert("stdlib.h");
                let len = self.length_expr(b);
                CExpr::call("bytes_to_string", vec![self.transform_expr(b), len])
            }
            ExprKind::HexDecode(hex) => {
                self.helpers.register("hex_to_bytes");
                self.includes.insert("stdlib.h");
                CExpr::call("hex_to_bytes", vec![self.transform_expr(hex)])
            }
            ExprKind::HexEncode(bytes) => {
                self.helpers.register("bytes_to_hex");
                self.includes.insert("stdlib.h");
                let len = self.length_expr(bytes);
                CExpr::call("bytes_to_hex", vec![self.transform_expr(bytes), len])
            }
            ExprKind::ObjectKeys(_) => self.unhandled("ObjectKeys"),
            ExprKind::ObjectValues(_) => self.unhandled("ObjectValues"),
            ExprKind::ObjectEntries(_) => self.unhandled("ObjectEntries"),
            ExprKind::ObjectFreeze(inner) => self.transform_expr(inner),
            ExprKind::JsonParse(_) => self.unhandled("JsonParse"),
            ExprKind::JsonStringify { .. } => self.unhandled("JsonStringify"),
            ExprKind::TypeOf(_) => self.unhandled("TypeOfExpression"),
            ExprKind::InstanceOf { .. } => self.unhandled("InstanceOfCheck"),
            ExprKind::IsArray(_) => self.unhandled("IsArrayCheck"),
            ExprKind::ErrorCreation { .. } => self.unhandled("ErrorCreation"),
            ExprKind::Await(inner) => {
                self.diags
                    .warn("await has no C counterpart; evaluated synchronously", None);
                self.transform_expr(inner)
            }
            ExprKind::Yield { .. } => self.unhandled("YieldExpression"),
            ExprKind::DataViewCreation(buffer) => self.transform_expr(buffer),
            ExprKind::DataViewRead {
                view,
                offset,
                width,
                endian,
            } => {
                // A read is a pack of the window's bytes.
                let name = pack_helper(*width, *endian, false);
                self.helpers.register(name);
                let view = self.transform_expr(view);
                let offset = self.transform_expr(offset);
                let args = (0..width.bytes() as i64)
                    .map(|i| CExpr::Subscript {
                        recv: Box::new(view.clone()),
                        index: Box::new(CExpr::paren(CExpr::binary(
                            "+",
                            offset.clone(),
                            CExpr::int(i),
                        ))),
                    })
                    .collect();
                CExpr::call(name, args)
            }
            ExprKind::DataViewWrite {
                view,
                offset,
                value,
                width,
                endian,
            } => {
                let name = store_helper(*width, *endian);
                self.helpers.register(name);
                CExpr::call(
                    name,
                    vec![
                        self.transform_expr(view),
                        self.transform_expr(offset),
                        self.transform_expr(value),
                    ],
                )
            }
            ExprKind::BufferCreation { .. } => self.unhandled("BufferCreation"),
            ExprKind::TypedArraySet {
                target,
                source,
                offset,
            } => {
                self.includes.insert("string.h");
                let len = self.length_expr(source);
                let dest = match offset {
                    Some(offset) => {
                        let offset = self.transform_expr(offset);
                        CExpr::paren(CExpr::binary("+", self.transform_expr(target), offset))
                    }
                    None => self.transform_expr(target),
                };
                CExpr::call("memcpy", vec![dest, self.transform_expr(source), len])
            }
            ExprKind::TypedArraySubarray { target, start, .. } => match start {
                Some(start) => {
                    let start = self.transform_expr(start);
                    CExpr::paren(CExpr::binary("+", self.transform_expr(target), start))
                }
                None => self.transform_expr(target),
            },
            ExprKind::DebugOutput { level, args } => self.debug_output(*level, args),
            ExprKind::Placeholder(what) => {
                self.diags.warn(
                    format!("unsupported construct reached the C back-end: {what}"),
                    None,
                );
                CExpr::ident(format!("UNSUPPORTED_{}", slug(what)))
            }
        }
    }

    fn transform_args(&mut self, args: &[Expr]) -> Vec<CExpr> {
        args.iter().map(|a| self.transform_expr(a)).collect()
    }

    fn transform_binary(&mut self, op: BinaryOp, left: &Expr, right: &Expr) -> CExpr {
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
                // Zero-fill semantics: shift the 32-bit unsigned view.
                let left = CExpr::Cast {
                    ty: "uint32_t".to_string(),
                    value: Box::new(CExpr::paren(self.transform_expr(left))),
                };
                return CExpr::paren(CExpr::binary(
                    ">>",
                    left,
                    self.transform_expr(right),
                ));
            }
        };
        CExpr::binary(
            spelling,
            self.transform_expr(left),
            self.transform_expr(right),
        )
    }

    fn math_call(&mut self, func: MathFunc, args: &[Expr]) -> CExpr {
        use MathFunc::*;
        self.includes.insert("math.h");
        let args_c = self.transform_args(args);
        let name = match func {
            Floor => "floor",
            Ceil => "ceil",
            Round => "round",
            Trunc => "trunc",
            Abs => "fabs",
            Min => "fmin",
            Max => "fmax",
            Sqrt => "sqrt",
            Cbrt => "cbrt",
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
            Sign => {
                let x = args_c.into_iter().next().unwrap_or(CExpr::int(0));
                return CExpr::paren(CExpr::binary(
                    "-",
                    CExpr::paren(CExpr::binary(">", x.clone(), CExpr::int(0))),
                    CExpr::paren(CExpr::binary("<", x, CExpr::int(0))),
                ));
            }
            Random => {
                self.includes.insert("stdlib.h");
                return CExpr::paren(CExpr::binary(
                    "/",
                    CExpr::Cast {
                        ty: "double".to_string(),
                        value: Box::new(CExpr::call("rand", vec![])),
                    },
                    CExpr::ident("RAND_MAX"),
                ));
            }
        };
        CExpr::call(name, args_c)
    }

    fn rotate_helper(&mut self, value: &Expr, amount: &Expr, width: Width, right: bool) -> CExpr {
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
        CExpr::call(
            name,
            vec![self.transform_expr(value), self.transform_expr(amount)],
        )
    }

    fn debug_output(&mut self, level: DebugLevel, args: &[Expr]) -> CExpr {
        self.includes.insert("stdio.h");
        let stream = match level {
            DebugLevel::Log => None,
            DebugLevel::Warn | DebugLevel::Error => Some(CExpr::ident("stderr")),
        };
        let mut format = String::new();
        let mut call_args: Vec<CExpr> = Vec::new();
        for (i, arg) in args.iter().enumerate() {
            if i > 0 {
                format.push(' ');
            }
            match &arg.ty {
                Type::String => format.push_str("%s"),
                Type::Float => format.push_str("%f"),
                Type::Bool => format.push_str("%d"),
                ty if ty.is_integer() => format.push_str("%lld"),
                _ => format.push_str("%p"),
            }
            let value = self.transform_expr(arg);
            if arg.ty.is_integer() {
                call_args.push(CExpr::Cast {
                    ty: "long long".to_string(),
                    value: Box::new(value),
                });
            } else {
                call_args.push(value);
            }
        }
        format.push_str("\\n");
        match stream {
            Some(stream) => {
                let mut all = vec![stream, CExpr::Str(format)];
                all.extend(call_args);
                CExpr::call("fprintf", all)
            }
            None => {
                let mut all = vec![CExpr::Str(format)];
                all.extend(call_args);
                CExpr::call("printf", all)
            }
        }
    }

    /// Length companion of an array expression, under the `<name>_len`
    /// convention.
    fn length_expr(&mut self, expr: &Expr) -> CExpr {
        match &expr.kind {
            ExprKind::ArrayLit(elements) => CExpr::int(elements.len() as i64),
            ExprKind::Ident(name) => CExpr::ident(format!("{}_len", to_snake_case(name))),
            ExprKind::ThisProperty(name) => CExpr::member(
                CExpr::ident("self"),
                format!("{}_len", to_snake_case(name.trim_start_matches('_'))),
                true,
            ),
            ExprKind::HexDecode(hex) => match &hex.kind {
                ExprKind::Literal(Literal::Str(s)) => CExpr::int((s.len() / 2) as i64),
                _ => {
                    self.includes.insert("string.h");
                    CExpr::binary(
                        "/",
                        CExpr::call("strlen", vec![self.transform_expr(hex)]),
                        CExpr::int(2),
                    )
                }
            },
            ExprKind::UnpackBytes { width, .. } => CExpr::int(width.bytes() as i64),
            _ => {
                self.diags.warn(
                    "array length not derivable; emitted 0 (review generated C)",
                    None,
                );
                CExpr::int(0)
            }
        }
    }

    fn is_value_struct(&self, expr: &Expr) -> bool {
        matches!(&expr.kind, ExprKind::Ident(name) if self.value_structs.contains(&to_snake_case(name)))
    }

    fn current_class_name(&mut self) -> String {
        if !self.in_method {
            self.diags
                .warn("this-reference outside a method body", None);
        }
        // `self` dispatch always goes through the owning class prefix; the
        // transformer tracks it through build_method's call order.
        self.current_class.clone().unwrap_or_default()
    }

    fn c_type(&mut self, ty: &Type) -> String {
        match ty {
            Type::Int => "int64_t".to_string(),
            Type::Int32 => "int32_t".to_string(),
            Type::Int64 => "int64_t".to_string(),
            Type::UInt8 => "uint8_t".to_string(),
            Type::UInt16 => "uint16_t".to_string(),
            Type::UInt32 => "uint32_t".to_string(),
            Type::UInt64 => "uint64_t".to_string(),
            Type::Float => "double".to_string(),
            Type::Bool => {
                self.includes.insert("stdbool.h");
                "bool".to_string()
            }
            Type::String => "const char *".to_string(),
            Type::Void => "void".to_string(),
            Type::Null | Type::Any | Type::Object | Type::Function => "void *".to_string(),
            Type::Array(elem) => format!("{} *", self.c_type(elem)),
            Type::TypedArray(width) => format!("{} *", width_c_type(*width)),
            Type::Map(_, _) | Type::Set(_) | Type::Tuple(_) => "void *".to_string(),
        }
    }
}

fn is_array_like(ty: &Type) -> bool {
    matches!(ty, Type::Array(_) | Type::TypedArray(_))
}

fn is_framework_record(class_name: &str) -> bool {
    matches!(
        class_name,
        "LinkItem" | "Vulnerability" | "TestCase" | "KeySize"
    )
}

fn width_c_type(width: Width) -> &'static str {
    match width {
        Width::W8 => "uint8_t",
        Width::W16 => "uint16_t",
        Width::W32 => "uint32_t",
        Width::W64 => "uint64_t",
    }
}

fn pack_helper(width: Width, endian: Endian, unpack: bool) -> &'static str {
    match (width, endian, unpack) {
        (Width::W16, Endian::Big, false) => "pack16_be",
        (Width::W16, Endian::Little, false) => "pack16_le",
        (Width::W32, Endian::Big, false) => "pack32_be",
        (Width::W32, Endian::Little, false) => "pack32_le",
        (Width::W64, Endian::Big, false) => "pack64_be",
        (Width::W64, Endian::Little, false) => "pack64_le",
        (Width::W8, _, false) => "pack8",
        (Width::W16, Endian::Big, true) => "unpack16_be",
        (Width::W16, Endian::Little, true) => "unpack16_le",
        (Width::W32, Endian::Big, true) => "unpack32_be",
        (Width::W32, Endian::Little, true) => "unpack32_le",
        (Width::W64, Endian::Big, true) => "unpack64_be",
        (Width::W64, Endian::Little, true) => "unpack64_le",
        (Width::W8, _, true) => "unpack8",
    }
}

fn store_helper(width: Width, endian: Endian) -> &'static str {
    match (width, endian) {
        (Width::W8, _) => "store8",
        (Width::W16, Endian::Big) => "store16_be",
        (Width::W16, Endian::Little) => "store16_le",
        (Width::W32, Endian::Big) => "store32_be",
        (Width::W32, Endian::Little) => "store32_le",
        (Width::W64, Endian::Big) => "store64_be",
        (Width::W64, Endian::Little) => "store64_le",
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
        AssignOp::Shr | AssignOp::UShr => ">>=",
        AssignOp::BitAnd => "&=",
        AssignOp::BitOr => "|=",
        AssignOp::BitXor => "^=",
    }
}

fn error_label(kind: ErrorKind) -> &'static str {
    match kind {
        ErrorKind::Error => "error",
        ErrorKind::TypeError => "TypeError",
        ErrorKind::RangeError => "RangeError",
        ErrorKind::SyntaxError => "SyntaxError",
        ErrorKind::ReferenceError => "ReferenceError",
    }
}

fn zero_return(ret: &str) -> Option<CExpr> {
    match ret {
        "void" => None,
        "bool" => Some(CExpr::ident("false")),
        "double" => Some(CExpr::Num("0.0".to_string())),
        ty if ty.contains('*') => Some(CExpr::ident("NULL")),
        _ => Some(CExpr::int(0)),
    }
}

fn format_double(f: f64) -> String {
    if f.fract() == 0.0 && f.is_finite() {
        format!("{:.1}", f)
    } else {
        f.to_string()
    }
}

fn escape_c(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
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
    out
}

fn slug(text: &str) -> String {
    text.chars()
        .map(|c| if c.is_ascii_alphanumeric() { c } else { '_' })
        .collect()
}

fn collect_field_assignments(body: &[Stmt], visit: &mut impl FnMut(&str, &Expr)) {
    fn walk_expr(expr: &Expr, visit: &mut impl FnMut(&str, &Expr)) {
        if let ExprKind::Assign { target, value, .. } = &expr.kind {
            if let ExprKind::ThisProperty(name) = &target.kind {
                visit(name, value);
            }
        }
    }
    for stmt in body {
        match stmt {
            Stmt::Expr(e) => walk_expr(e, visit),
            Stmt::Block(inner) => collect_field_assignments(inner, visit),
            Stmt::If(s) => {
                collect_field_assignments(&s.then_block, visit);
                if let Some(else_block) = &s.else_block {
                    collect_field_assignments(else_block, visit);
                }
            }
            Stmt::For(s) => collect_field_assignments(&s.body, visit),
            Stmt::ForOf(s) => collect_field_assignments(&s.body, visit),
            Stmt::While(s) => collect_field_assignments(&s.body, visit),
            _ => {}
        }
    }
}

/// Break value-field cycles by downgrading the back edge to a pointer.
fn break_struct_cycles(structs: &mut [CStruct], diags: &mut Diagnostics) {
    let names: HashSet<String> = structs.iter().map(|s| s.name.clone()).collect();
    // Repeatedly look for a cycle; each pass downgrades one back edge.
    loop {
        let edges: Vec<(String, String)> = structs
            .iter()
            .flat_map(|s| {
                s.fields
                    .iter()
                    .filter(|f| names.contains(&f.ty))
                    .map(|f| (s.name.clone(), f.ty.clone()))
                    .collect::<Vec<_>>()
            })
            .collect();
        let Some((from, to)) = find_cycle_edge(&edges) else {
            return;
        };
        diags.warn(
            format!(
                "struct cycle between {from} and {to}; field downgraded to a pointer"
            ),
            None,
        );
        for s in structs.iter_mut() {
            if s.name == from {
                for f in s.fields.iter_mut() {
                    if f.ty == to {
                        f.ty = format!("{} *", to);
                    }
                }
            }
        }
    }
}

/// One edge that participates in a dependency cycle, if any.
fn find_cycle_edge(edges: &[(String, String)]) -> Option<(String, String)> {
    fn reachable(edges: &[(String, String)], from: &str, to: &str) -> bool {
        let mut stack = vec![from.to_string()];
        let mut seen = HashSet::new();
        while let Some(node) = stack.pop() {
            if node == to {
                return true;
            }
            if !seen.insert(node.clone()) {
                continue;
            }
            for (a, b) in edges {
                if *a == node {
                    stack.push(b.clone());
                }
            }
        }
        false
    }
    edges
        .iter()
        .find(|(from, to)| reachable(edges, to, from))
        .cloned()
}
