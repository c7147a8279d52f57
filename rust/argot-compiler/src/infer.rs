//! Type inference over the IL.
//!
//! Runs after lowering and before any target transform. Pass one walks every
//! body bottom-up, typing expressions from literals, initialisers, and the
//! operator table while recording argument types seen at call sites. Pass two
//! feeds that call-site evidence back into parameter types and re-walks, so
//! callees typed `Any` on the first pass can settle. Widening to `Any` is
//! always the fallback; the walk terminates by construction.

use crate::diagnostics::Diagnostics;
use crate::il::*;
use argot_core::{Type, Width};
use std::collections::HashMap;

/// Infer types for every expression in the module, in place.
pub fn infer_module(module: &mut Module, diags: &mut Diagnostics) {
    let mut inferencer = Inferencer::new(diags);
    inferencer.collect_globals(module);
    inferencer.walk_module(module);
    // Second pass: parameter types refined from call-site evidence.
    inferencer.apply_call_evidence();
    inferencer.walk_module(module);
    inferencer.report_coverage(module);
}

#[derive(Debug, Clone, Default)]
struct FnSig {
    params: Vec<Type>,
    ret: Type,
}

#[derive(Debug, Clone, Default)]
struct ClassInfo {
    fields: HashMap<String, Type>,
    methods: HashMap<String, FnSig>,
}

struct Inferencer<'d> {
    diags: &'d mut Diagnostics,
    globals: HashMap<String, Type>,
    functions: HashMap<String, FnSig>,
    classes: HashMap<String, ClassInfo>,
    /// Joined argument types observed at call sites, per callee name.
    call_evidence: HashMap<String, Vec<Type>>,
}

/// Lexical scope stack for local bindings.
struct Env {
    scopes: Vec<HashMap<String, Type>>,
}

impl Env {
    fn new() -> Env {
        Env {
            scopes: vec![HashMap::new()],
        }
    }

    fn push(&mut self) {
        self.scopes.push(HashMap::new());
    }

    fn pop(&mut self) {
        self.scopes.pop();
    }

    fn declare(&mut self, name: &str, ty: Type) {
        if let Some(scope) = self.scopes.last_mut() {
            scope.insert(name.to_string(), ty);
        }
    }

    fn lookup(&self, name: &str) -> Option<&Type> {
        self.scopes.iter().rev().find_map(|s| s.get(name))
    }

    /// Reassignment widens the binding in its declaring scope.
    fn widen(&mut self, name: &str, ty: &Type) {
        for scope in self.scopes.iter_mut().rev() {
            if let Some(existing) = scope.get_mut(name) {
                *existing = existing.join(ty);
                return;
            }
        }
    }
}

impl<'d> Inferencer<'d> {
    fn new(diags: &'d mut Diagnostics) -> Inferencer<'d> {
        Inferencer {
            diags,
            globals: HashMap::new(),
            functions: HashMap::new(),
            classes: HashMap::new(),
            call_evidence: HashMap::new(),
        }
    }

    // ── Pass scaffolding ──

    fn collect_globals(&mut self, module: &mut Module) {
        for decl in &mut module.decls {
            match decl {
                Decl::Constant(c) => {
                    let mut env = Env::new();
                    self.infer_expr(&mut c.value, &mut env, None);
                    self.globals.insert(c.name.clone(), c.value.ty.clone());
                }
                Decl::Class(c) => {
                    self.classes.entry(c.name.clone()).or_default();
                }
                Decl::Function(f) => {
                    self.functions.entry(f.name.clone()).or_default();
                }
                Decl::Import(_) | Decl::Export(_) => {}
            }
        }
    }

    fn walk_module(&mut self, module: &mut Module) {
        for decl in &mut module.decls {
            match decl {
                Decl::Function(f) => self.walk_function(f),
                Decl::Class(c) => self.walk_class(c),
                Decl::Constant(c) => {
                    let mut env = Env::new();
                    self.infer_expr(&mut c.value, &mut env, None);
                    self.globals.insert(c.name.clone(), c.value.ty.clone());
                }
                Decl::Import(_) | Decl::Export(_) => {}
            }
        }
    }

    fn walk_function(&mut self, f: &mut FunctionDecl) {
        let known = self.functions.get(&f.name).cloned().unwrap_or_default();
        for (i, param) in f.params.iter_mut().enumerate() {
            if param.ty.is_any() {
                if let Some(d) = &param.default {
                    param.ty = d.ty.clone();
                }
            }
            if param.ty.is_any() {
                if let Some(t) = known.params.get(i) {
                    param.ty = t.clone();
                }
            }
        }
        let mut env = Env::new();
        for param in &f.params {
            env.declare(&param.name, param.ty.clone());
        }
        self.infer_block(&mut f.body, &mut env, None);
        f.return_ty = return_type_of(&f.body);
        self.functions.insert(
            f.name.clone(),
            FnSig {
                params: f.params.iter().map(|p| p.ty.clone()).collect(),
                ret: f.return_ty.clone(),
            },
        );
    }

    fn walk_class(&mut self, class: &mut ClassDecl) {
        let class_name = class.name.clone();
        // Field declarations seed the instance-property table.
        for member in &mut class.members {
            if let Member::Field(field) = member {
                if let Some(init) = &mut field.init {
                    let mut env = Env::new();
                    self.infer_expr(init, &mut env, Some(&class_name));
                    if field.ty.is_any() {
                        field.ty = init.ty.clone();
                    }
                }
                self.classes
                    .entry(class_name.clone())
                    .or_default()
                    .fields
                    .insert(field.name.clone(), field.ty.clone());
            }
        }
        for member in &mut class.members {
            match member {
                Member::Method(method) => {
                    let qualified = format!("{}.{}", class_name, method.name);
                    let known = self.functions.get(&qualified).cloned().unwrap_or_default();
                    for (i, param) in method.params.iter_mut().enumerate() {
                        if param.ty.is_any() {
                            if let Some(d) = &param.default {
                                param.ty = d.ty.clone();
                            }
                        }
                        if param.ty.is_any() {
                            if let Some(t) = known.params.get(i) {
                                param.ty = t.clone();
                            }
                        }
                    }
                    let mut env = Env::new();
                    for param in &method.params {
                        env.declare(&param.name, param.ty.clone());
                    }
                    self.infer_block(&mut method.body, &mut env, Some(&class_name));
                    method.return_ty = return_type_of(&method.body);
                    let sig = FnSig {
                        params: method.params.iter().map(|p| p.ty.clone()).collect(),
                        ret: method.return_ty.clone(),
                    };
                    self.functions.insert(qualified, sig.clone());
                    self.classes
                        .entry(class_name.clone())
                        .or_default()
                        .methods
                        .insert(method.name.clone(), sig);
                }
                Member::StaticInit(init) => {
                    let mut env = Env::new();
                    self.infer_block(&mut init.body, &mut env, Some(&class_name));
                }
                Member::Field(_) => {}
            }
        }
    }

    fn apply_call_evidence(&mut self) {
        for (name, evidence) in &self.call_evidence {
            if let Some(sig) = self.functions.get_mut(name) {
                if sig.params.len() < evidence.len() {
                    sig.params.resize(evidence.len(), Type::Any);
                }
                for (slot, seen) in sig.params.iter_mut().zip(evidence) {
                    if slot.is_any() {
                        *slot = seen.clone();
                    }
                }
            }
        }
    }

    fn record_call(&mut self, name: &str, args: &[Expr]) {
        let entry = self.call_evidence.entry(name.to_string()).or_default();
        if entry.len() < args.len() {
            entry.resize(args.len(), Type::Null);
        }
        for (slot, arg) in entry.iter_mut().zip(args) {
            *slot = slot.join(&arg.ty);
        }
    }

    fn report_coverage(&mut self, module: &Module) {
        let (mut total, mut any) = (0usize, 0usize);
        count_expr_types(module, &mut total, &mut any);
        if total > 0 && any * 10 > total * 3 {
            self.diags.note(
                format!(
                    "type inference left {any} of {total} expressions untyped (Any)"
                ),
                None,
            );
        }
    }

    // ── Statements ──

    fn infer_block(&mut self, stmts: &mut [Stmt], env: &mut Env, class: Option<&str>) {
        for stmt in stmts {
            self.infer_stmt(stmt, env, class);
        }
    }

    fn infer_stmt(&mut self, stmt: &mut Stmt, env: &mut Env, class: Option<&str>) {
        match stmt {
            Stmt::Block(body) => {
                env.push();
                self.infer_block(body, env, class);
                env.pop();
            }
            Stmt::VarDecl(decl) => {
                if let Some(init) = &mut decl.init {
                    self.infer_expr(init, env, class);
                    if decl.ty.is_any() {
                        decl.ty = init.ty.clone();
                    }
                }
                env.declare(&decl.name, decl.ty.clone());
            }
            Stmt::Expr(expr) => self.infer_expr(expr, env, class),
            Stmt::Return(Some(expr)) => self.infer_expr(expr, env, class),
            Stmt::Return(None) => {}
            Stmt::If(s) => {
                self.infer_expr(&mut s.cond, env, class);
                env.push();
                self.infer_block(&mut s.then_block, env, class);
                env.pop();
                if let Some(else_block) = &mut s.else_block {
                    env.push();
                    self.infer_block(else_block, env, class);
                    env.pop();
                }
            }
            Stmt::While(s) => {
                self.infer_expr(&mut s.cond, env, class);
                env.push();
                self.infer_block(&mut s.body, env, class);
                env.pop();
            }
            Stmt::DoWhile(s) => {
                env.push();
                self.infer_block(&mut s.body, env, class);
                env.pop();
                self.infer_expr(&mut s.cond, env, class);
            }
            Stmt::For(s) => {
                env.push();
                if let Some(init) = &mut s.init {
                    self.infer_stmt(init, env, class);
                }
                if let Some(cond) = &mut s.cond {
                    self.infer_expr(cond, env, class);
                }
                if let Some(update) = &mut s.update {
                    self.infer_expr(update, env, class);
                }
                self.infer_block(&mut s.body, env, class);
                env.pop();
            }
            Stmt::ForOf(s) => {
                self.infer_expr(&mut s.iterable, env, class);
                env.push();
                let elem = s.iterable.ty.element().unwrap_or(Type::Any);
                env.declare(&s.var, elem);
                self.infer_block(&mut s.body, env, class);
                env.pop();
            }
            Stmt::ForIn(s) => {
                self.infer_expr(&mut s.object, env, class);
                env.push();
                env.declare(&s.var, Type::String);
                self.infer_block(&mut s.body, env, class);
                env.pop();
            }
            Stmt::Break | Stmt::Continue => {}
            Stmt::Throw(expr) => self.infer_expr(expr, env, class),
            Stmt::TryCatch(s) => {
                env.push();
                self.infer_block(&mut s.try_block, env, class);
                env.pop();
                for catch in &mut s.catches {
                    env.push();
                    env.declare(&catch.var_name, Type::Any);
                    self.infer_block(&mut catch.body, env, class);
                    env.pop();
                }
                if let Some(finally) = &mut s.finally {
                    env.push();
                    self.infer_block(finally, env, class);
                    env.pop();
                }
            }
            Stmt::Switch(s) => {
                self.infer_expr(&mut s.subject, env, class);
                for case in &mut s.cases {
                    for pattern in &mut case.patterns {
                        self.infer_expr(pattern, env, class);
                    }
                    env.push();
                    self.infer_block(&mut case.body, env, class);
                    env.pop();
                }
                if let Some(default) = &mut s.default {
                    env.push();
                    self.infer_block(default, env, class);
                    env.pop();
                }
            }
        }
    }

    // ── Expressions ──

    fn infer_expr(&mut self, expr: &mut Expr, env: &mut Env, class: Option<&str>) {
        let ty = self.infer_kind(&mut expr.kind, env, class);
        // A type settled at lowering time (literals, domain nodes) is only
        // ever refined, never erased back to Any.
        if !ty.is_any() || expr.ty.is_any() {
            expr.ty = ty;
        }
    }

    fn infer_kind(&mut self, kind: &mut ExprKind, env: &mut Env, class: Option<&str>) -> Type {
        match kind {
            ExprKind::Literal(lit) => match lit {
                Literal::Int(_) => Type::Int,
                Literal::Float(_) => Type::Float,
                Literal::Str(_) => Type::String,
                Literal::Bool(_) => Type::Bool,
                Literal::Null => Type::Null,
                Literal::BigInt(_) => Type::Int64,
            },
            ExprKind::Ident(name) => env
                .lookup(name)
                .cloned()
                .or_else(|| self.globals.get(name).cloned())
                .unwrap_or(Type::Any),
            ExprKind::Binary { op, left, right } => {
                self.infer_expr(left, env, class);
                self.infer_expr(right, env, class);
                binary_result(*op, &left.ty, &right.ty)
            }
            ExprKind::Unary { op, operand, .. } => {
                self.infer_expr(operand, env, class);
                match op {
                    UnaryOp::Not => Type::Bool,
                    UnaryOp::Neg | UnaryOp::Plus | UnaryOp::BitNot => {
                        if operand.ty.is_numeric() {
                            operand.ty.clone()
                        } else {
                            Type::Int
                        }
                    }
                }
            }
            ExprKind::Assign { target, value, .. } => {
                self.infer_expr(value, env, class);
                self.infer_expr(target, env, class);
                if let ExprKind::Ident(name) = &target.kind {
                    env.widen(name, &value.ty);
                }
                if let (ExprKind::ThisProperty(prop), Some(class_name)) = (&target.kind, class) {
                    let entry = self
                        .classes
                        .entry(class_name.to_string())
                        .or_default()
                        .fields
                        .entry(prop.clone())
                        .or_insert(Type::Null);
                    *entry = entry.join(&value.ty);
                }
                value.ty.clone()
            }
            ExprKind::Conditional {
                cond,
                then_val,
                else_val,
            } => {
                self.infer_expr(cond, env, class);
                self.infer_expr(then_val, env, class);
                self.infer_expr(else_val, env, class);
                then_val.ty.join(&else_val.ty)
            }
            ExprKind::Sequence(exprs) => {
                for e in exprs.iter_mut() {
                    self.infer_expr(e, env, class);
                }
                exprs.last().map(|e| e.ty.clone()).unwrap_or(Type::Void)
            }
            ExprKind::Paren(inner) => {
                self.infer_expr(inner, env, class);
                inner.ty.clone()
            }
            ExprKind::Member { target, .. } => {
                self.infer_expr(target, env, class);
                Type::Any
            }
            ExprKind::Element { target, index } => {
                self.infer_expr(target, env, class);
                self.infer_expr(index, env, class);
                match &target.ty {
                    Type::String => Type::String,
                    other => other.element().unwrap_or(Type::Any),
                }
            }
            ExprKind::ThisProperty(name) => class
                .and_then(|c| self.classes.get(c))
                .and_then(|info| info.fields.get(name))
                .cloned()
                .unwrap_or(Type::Any),
            ExprKind::ThisMethodCall { name, args } => {
                for arg in args.iter_mut() {
                    self.infer_expr(arg, env, class);
                }
                if let Some(class_name) = class {
                    self.record_call(&format!("{class_name}.{name}"), args);
                    return self
                        .classes
                        .get(class_name)
                        .and_then(|info| info.methods.get(name))
                        .map(|sig| sig.ret.clone())
                        .unwrap_or(Type::Any);
                }
                Type::Any
            }
            ExprKind::ParentConstructorCall(args) | ExprKind::ParentMethodCall { args, .. } => {
                for arg in args.iter_mut() {
                    self.infer_expr(arg, env, class);
                }
                Type::Any
            }
            ExprKind::Super | ExprKind::This => Type::Any,
            ExprKind::Spread(inner) => {
                self.infer_expr(inner, env, class);
                inner.ty.clone()
            }
            ExprKind::Call { callee, args } => {
                self.infer_expr(callee, env, class);
                for arg in args.iter_mut() {
                    self.infer_expr(arg, env, class);
                }
                if let ExprKind::Ident(name) = &callee.kind {
                    self.record_call(name, args);
                    if let Some(sig) = self.functions.get(name.as_str()) {
                        return sig.ret.clone();
                    }
                }
                Type::Any
            }
            ExprKind::New { class_name, args } => {
                for arg in args.iter_mut() {
                    self.infer_expr(arg, env, class);
                }
                self.record_call(&format!("{class_name}.constructor"), args);
                Type::Object
            }
            ExprKind::Lambda { params, body } => {
                let mut inner = Env::new();
                for param in params.iter() {
                    inner.declare(&param.name, param.ty.clone());
                }
                self.infer_block(body, &mut inner, class);
                Type::Function
            }
            ExprKind::ArrayLit(elements) => {
                for e in elements.iter_mut() {
                    self.infer_expr(e, env, class);
                }
                // Empty literals lean integer: in this domain they are almost
                // always byte/word accumulators.
                let elem = if elements.is_empty() {
                    Type::Int
                } else {
                    Type::join_all(elements.iter().map(|e| &e.ty))
                };
                Type::Array(Box::new(elem))
            }
            ExprKind::ArrayCreation { size, init } => {
                self.infer_expr(size, env, class);
                let elem = match init {
                    Some(init) => {
                        self.infer_expr(init, env, class);
                        init.ty.clone()
                    }
                    None => Type::Int,
                };
                Type::Array(Box::new(elem))
            }
            ExprKind::TypedArrayCreation { width, size } => {
                self.infer_expr(size, env, class);
                Type::TypedArray(*width)
            }
            ExprKind::ObjectLit(entries) => {
                for (_, value) in entries.iter_mut() {
                    self.infer_expr(value, env, class);
                }
                Type::Object
            }
            ExprKind::MapCreation => Type::Map(Box::new(Type::Any), Box::new(Type::Any)),
            ExprKind::SetCreation => Type::Set(Box::new(Type::Any)),
            ExprKind::ArrayLength(target) => {
                self.infer_expr(target, env, class);
                Type::Int
            }
            ExprKind::ArrayAppend { target, values } => {
                self.infer_expr(target, env, class);
                for v in values.iter_mut() {
                    self.infer_expr(v, env, class);
                }
                Type::Int
            }
            ExprKind::ArrayUnshift { target, values } => {
                self.infer_expr(target, env, class);
                for v in values.iter_mut() {
                    self.infer_expr(v, env, class);
                }
                Type::Int
            }
            ExprKind::ArrayPop(target) | ExprKind::ArrayShift(target) => {
                self.infer_expr(target, env, class);
                target.ty.element().unwrap_or(Type::Any)
            }
            ExprKind::ArraySplice { target, start, delete_count, items } => {
                self.infer_expr(target, env, class);
                self.infer_expr(start, env, class);
                if let Some(dc) = delete_count {
                    self.infer_expr(dc, env, class);
                }
                for item in items.iter_mut() {
                    self.infer_expr(item, env, class);
                }
                target.ty.clone()
            }
            ExprKind::ArraySlice { target, start, end } => {
                self.infer_expr(target, env, class);
                if let Some(s) = start {
                    self.infer_expr(s, env, class);
                }
                if let Some(e) = end {
                    self.infer_expr(e, env, class);
                }
                target.ty.clone()
            }
            ExprKind::ArrayFill { target, value } => {
                self.infer_expr(target, env, class);
                self.infer_expr(value, env, class);
                target.ty.clone()
            }
            ExprKind::ArrayClear(target) => {
                self.infer_expr(target, env, class);
                Type::Void
            }
            ExprKind::ArrayConcat { target, others } => {
                self.infer_expr(target, env, class);
                for other in others.iter_mut() {
                    self.infer_expr(other, env, class);
                }
                target.ty.clone()
            }
            ExprKind::ArrayReverse(target) | ExprKind::CopyArray(target) => {
                self.infer_expr(target, env, class);
                target.ty.clone()
            }
            ExprKind::ArrayJoin { target, sep } => {
                self.infer_expr(target, env, class);
                if let Some(sep) = sep {
                    self.infer_expr(sep, env, class);
                }
                Type::String
            }
            ExprKind::ArrayIndexOf { target, needle } => {
                self.infer_expr(target, env, class);
                self.infer_expr(needle, env, class);
                Type::Int
            }
            ExprKind::ArrayIncludes { target, needle } => {
                self.infer_expr(target, env, class);
                self.infer_expr(needle, env, class);
                Type::Bool
            }
            ExprKind::ArrayMap { target, callback } => {
                self.infer_expr(target, env, class);
                let elem_out = self.infer_callback(callback, &target.ty, env, class);
                Type::Array(Box::new(elem_out))
            }
            ExprKind::ArrayFilter { target, callback } => {
                self.infer_expr(target, env, class);
                self.infer_callback(callback, &target.ty, env, class);
                target.ty.clone()
            }
            ExprKind::ArrayForEach { target, callback } => {
                self.infer_expr(target, env, class);
                self.infer_callback(callback, &target.ty, env, class);
                Type::Void
            }
            ExprKind::ArrayFind { target, callback } => {
                self.infer_expr(target, env, class);
                self.infer_callback(callback, &target.ty, env, class);
                target.ty.element().unwrap_or(Type::Any)
            }
            ExprKind::ArrayFindIndex { target, callback } => {
                self.infer_expr(target, env, class);
                self.infer_callback(callback, &target.ty, env, class);
                Type::Int
            }
            ExprKind::ArrayReduce { target, callback, init } => {
                self.infer_expr(target, env, class);
                self.infer_callback(callback, &target.ty, env, class);
                match init {
                    Some(init) => {
                        self.infer_expr(init, env, class);
                        init.ty.clone()
                    }
                    None => target.ty.element().unwrap_or(Type::Any),
                }
            }
            ExprKind::ArrayEvery { target, callback } | ExprKind::ArraySome { target, callback } => {
                self.infer_expr(target, env, class);
                self.infer_callback(callback, &target.ty, env, class);
                Type::Bool
            }
            ExprKind::ArraySort { target, comparator } => {
                self.infer_expr(target, env, class);
                if let Some(cmp) = comparator {
                    self.infer_expr(cmp, env, class);
                }
                target.ty.clone()
            }
            ExprKind::ArrayFrom(source) => {
                self.infer_expr(source, env, class);
                Type::Array(Box::new(source.ty.element().unwrap_or(Type::Any)))
            }
            ExprKind::ArrayXor { a, b } => {
                self.infer_expr(a, env, class);
                self.infer_expr(b, env, class);
                Type::Array(Box::new(Type::UInt8))
            }
            ExprKind::RotateLeft { value, amount, width }
            | ExprKind::RotateRight { value, amount, width } => {
                self.infer_expr(value, env, class);
                self.infer_expr(amount, env, class);
                width_type(*width)
            }
            ExprKind::PackBytes { bytes, width, .. } => {
                for b in bytes.iter_mut() {
                    self.infer_expr(b, env, class);
                }
                width_type(*width)
            }
            ExprKind::UnpackBytes { value, .. } => {
                self.infer_expr(value, env, class);
                Type::Array(Box::new(Type::UInt8))
            }
            ExprKind::Cast { value, target_ty } => {
                self.infer_expr(value, env, class);
                target_ty.clone()
            }
            ExprKind::BigIntCast(value) => {
                self.infer_expr(value, env, class);
                Type::Int64
            }
            ExprKind::MathCall { func, args } => {
                for arg in args.iter_mut() {
                    self.infer_expr(arg, env, class);
                }
                math_result(*func, args)
            }
            ExprKind::MathConstant(_) => Type::Float,
            ExprKind::NumberConstant(c) => match c {
                NumberConst::MaxSafeInteger | NumberConst::MinSafeInteger => Type::Int64,
                _ => Type::Float,
            },
            ExprKind::Power { base, exp } => {
                self.infer_expr(base, env, class);
                self.infer_expr(exp, env, class);
                if base.ty.is_integer() && exp.ty.is_integer() {
                    base.ty.join(&exp.ty)
                } else {
                    Type::Float
                }
            }
            ExprKind::IsInteger(x) | ExprKind::IsNaN(x) | ExprKind::IsFinite(x) => {
                self.infer_expr(x, env, class);
                Type::Bool
            }
            ExprKind::SecureCompare { a, b } => {
                self.infer_expr(a, env, class);
                self.infer_expr(b, env, class);
                Type::Bool
            }
            ExprKind::StringInterpolation(parts) => {
                for part in parts.iter_mut() {
                    if let InterpPart::Expr(e) = part {
                        self.infer_expr(e, env, class);
                    }
                }
                Type::String
            }
            ExprKind::StringSplit { target, sep } => {
                self.infer_expr(target, env, class);
                self.infer_expr(sep, env, class);
                Type::Array(Box::new(Type::String))
            }
            ExprKind::StringTrim(t) | ExprKind::StringToLower(t) | ExprKind::StringToUpper(t) => {
                self.infer_expr(t, env, class);
                Type::String
            }
            ExprKind::StringRepeat { target, count } => {
                self.infer_expr(target, env, class);
                self.infer_expr(count, env, class);
                Type::String
            }
            ExprKind::StringReplace { target, from, to, .. } => {
                self.infer_expr(target, env, class);
                self.infer_expr(from, env, class);
                self.infer_expr(to, env, class);
                Type::String
            }
            ExprKind::StringSlice { target, start, end } => {
                self.infer_expr(target, env, class);
                if let Some(s) = start {
                    self.infer_expr(s, env, class);
                }
                if let Some(e) = end {
                    self.infer_expr(e, env, class);
                }
                Type::String
            }
            ExprKind::StringSubstring { target, start, end } => {
                self.infer_expr(target, env, class);
                self.infer_expr(start, env, class);
                if let Some(e) = end {
                    self.infer_expr(e, env, class);
                }
                Type::String
            }
            ExprKind::StringCharCodeAt { target, index } => {
                self.infer_expr(target, env, class);
                self.infer_expr(index, env, class);
                Type::Int
            }
            ExprKind::StringCharAt { target, index } => {
                self.infer_expr(target, env, class);
                self.infer_expr(index, env, class);
                Type::String
            }
            ExprKind::StringIndexOf { target, needle } => {
                self.infer_expr(target, env, class);
                self.infer_expr(needle, env, class);
                Type::Int
            }
            ExprKind::StringIncludes { target, needle }
            | ExprKind::StringStartsWith { target, prefix: needle }
            | ExprKind::StringEndsWith { target, suffix: needle } => {
                self.infer_expr(target, env, class);
                self.infer_expr(needle, env, class);
                Type::Bool
            }
            ExprKind::StringConcat(parts) | ExprKind::StringFromCharCodes(parts) => {
                for part in parts.iter_mut() {
                    self.infer_expr(part, env, class);
                }
                Type::String
            }
            ExprKind::StringToBytes(t) => {
                self.infer_expr(t, env, class);
                Type::Array(Box::new(Type::UInt8))
            }
            ExprKind::BytesToString(t) => {
                self.infer_expr(t, env, class);
                Type::String
            }
            ExprKind::HexDecode(t) => {
                self.infer_expr(t, env, class);
                Type::Array(Box::new(Type::UInt8))
            }
            ExprKind::HexEncode(t) => {
                self.infer_expr(t, env, class);
                Type::String
            }
            ExprKind::ObjectKeys(t) => {
                self.infer_expr(t, env, class);
                Type::Array(Box::new(Type::String))
            }
            ExprKind::ObjectValues(t) | ExprKind::ObjectEntries(t) => {
                self.infer_expr(t, env, class);
                Type::Array(Box::new(Type::Any))
            }
            ExprKind::ObjectFreeze(t) => {
                self.infer_expr(t, env, class);
                t.ty.clone()
            }
            ExprKind::JsonParse(t) => {
                self.infer_expr(t, env, class);
                Type::Any
            }
            ExprKind::JsonStringify { value, indent } => {
                self.infer_expr(value, env, class);
                if let Some(indent) = indent {
                    self.infer_expr(indent, env, class);
                }
                Type::String
            }
            ExprKind::TypeOf(t) => {
                self.infer_expr(t, env, class);
                Type::String
            }
            ExprKind::InstanceOf { value, .. } => {
                self.infer_expr(value, env, class);
                Type::Bool
            }
            ExprKind::IsArray(t) => {
                self.infer_expr(t, env, class);
                Type::Bool
            }
            ExprKind::ErrorCreation { message, .. } => {
                if let Some(message) = message {
                    self.infer_expr(message, env, class);
                }
                Type::Object
            }
            ExprKind::Await(inner) => {
                self.infer_expr(inner, env, class);
                inner.ty.clone()
            }
            ExprKind::Yield { value, .. } => {
                if let Some(value) = value {
                    self.infer_expr(value, env, class);
                }
                Type::Any
            }
            ExprKind::DataViewCreation(buffer) => {
                self.infer_expr(buffer, env, class);
                Type::Object
            }
            ExprKind::DataViewRead { view, offset, width, .. } => {
                self.infer_expr(view, env, class);
                self.infer_expr(offset, env, class);
                width_type(*width)
            }
            ExprKind::DataViewWrite { view, offset, value, .. } => {
                self.infer_expr(view, env, class);
                self.infer_expr(offset, env, class);
                self.infer_expr(value, env, class);
                Type::Void
            }
            ExprKind::BufferCreation { size } => {
                self.infer_expr(size, env, class);
                Type::TypedArray(Width::W8)
            }
            ExprKind::TypedArraySet { target, source, offset } => {
                self.infer_expr(target, env, class);
                self.infer_expr(source, env, class);
                if let Some(offset) = offset {
                    self.infer_expr(offset, env, class);
                }
                Type::Void
            }
            ExprKind::TypedArraySubarray { target, start, end } => {
                self.infer_expr(target, env, class);
                if let Some(s) = start {
                    self.infer_expr(s, env, class);
                }
                if let Some(e) = end {
                    self.infer_expr(e, env, class);
                }
                target.ty.clone()
            }
            ExprKind::DebugOutput { args, .. } => {
                for arg in args.iter_mut() {
                    self.infer_expr(arg, env, class);
                }
                Type::Void
            }
            ExprKind::Placeholder(_) => Type::Any,
        }
    }

    /// Type a higher-order callback against the element type of its receiver
    /// and return the callback's own return type.
    fn infer_callback(
        &mut self,
        callback: &mut Expr,
        receiver_ty: &Type,
        env: &mut Env,
        class: Option<&str>,
    ) -> Type {
        let elem = receiver_ty.element().unwrap_or(Type::Any);
        if let ExprKind::Lambda { params, body } = &mut callback.kind {
            if let Some(first) = params.first_mut() {
                if first.ty.is_any() {
                    first.ty = elem;
                }
            }
            // Index parameter, when present.
            if let Some(second) = params.get_mut(1) {
                if second.ty.is_any() {
                    second.ty = Type::Int;
                }
            }
            let mut inner = Env::new();
            for param in params.iter() {
                inner.declare(&param.name, param.ty.clone());
            }
            self.infer_block(body, &mut inner, class);
            callback.ty = Type::Function;
            return return_type_of(body);
        }
        self.infer_expr(callback, env, class);
        Type::Any
    }
}

/// The binary-operator result table.
fn binary_result(op: BinaryOp, left: &Type, right: &Type) -> Type {
    use BinaryOp::*;
    match op {
        Eq | NotEq | StrictEq | StrictNotEq | Lt | LtEq | Gt | GtEq | And | Or => Type::Bool,
        UShr => Type::UInt32,
        Add => {
            if *left == Type::String || *right == Type::String {
                Type::String
            } else if left.is_numeric() && right.is_numeric() {
                left.join(right)
            } else if left.is_numeric() || right.is_numeric() {
                // One side untyped; trust the numeric side.
                if left.is_numeric() { left.clone() } else { right.clone() }
            } else {
                Type::Any
            }
        }
        Sub | Mul | Div | Mod | BitAnd | BitOr | BitXor | Shl | Shr => {
            if left.is_numeric() && right.is_numeric() {
                left.join(right)
            } else if left.is_numeric() {
                left.clone()
            } else if right.is_numeric() {
                right.clone()
            } else {
                Type::Int
            }
        }
    }
}

fn math_result(func: MathFunc, args: &[Expr]) -> Type {
    use MathFunc::*;
    match func {
        Floor | Ceil | Round | Trunc | Sign => Type::Int,
        Abs | Min | Max => {
            let joined = Type::join_all(args.iter().map(|a| &a.ty));
            if joined.is_numeric() {
                joined
            } else {
                Type::Float
            }
        }
        _ => Type::Float,
    }
}

fn width_type(width: Width) -> Type {
    match width {
        Width::W8 => Type::UInt8,
        Width::W16 => Type::UInt16,
        Width::W32 => Type::UInt32,
        Width::W64 => Type::UInt64,
    }
}

/// Return-type rule: no value-returning return → `Void`; agreeing returns →
/// their type; only-`Null` returns (nullable-factory idiom) and disagreeing
/// returns → `Any`.
fn return_type_of(body: &[Stmt]) -> Type {
    let mut found: Vec<Type> = Vec::new();
    collect_return_types(body, &mut found);
    if found.is_empty() {
        return Type::Void;
    }
    if found.iter().all(|t| *t == Type::Null) {
        return Type::Any;
    }
    Type::join_all(found.iter())
}

fn collect_return_types(body: &[Stmt], out: &mut Vec<Type>) {
    for stmt in body {
        match stmt {
            Stmt::Return(Some(expr)) => out.push(expr.ty.clone()),
            Stmt::Return(None) => {}
            Stmt::Block(inner) => collect_return_types(inner, out),
            Stmt::If(s) => {
                collect_return_types(&s.then_block, out);
                if let Some(else_block) = &s.else_block {
                    collect_return_types(else_block, out);
                }
            }
            Stmt::While(s) => collect_return_types(&s.body, out),
            Stmt::DoWhile(s) => collect_return_types(&s.body, out),
            Stmt::For(s) => collect_return_types(&s.body, out),
            Stmt::ForOf(s) => collect_return_types(&s.body, out),
            Stmt::ForIn(s) => collect_return_types(&s.body, out),
            Stmt::TryCatch(s) => {
                collect_return_types(&s.try_block, out);
                for catch in &s.catches {
                    collect_return_types(&catch.body, out);
                }
                if let Some(finally) = &s.finally {
                    collect_return_types(finally, out);
                }
            }
            Stmt::Switch(s) => {
                for case in &s.cases {
                    collect_return_types(&case.body, out);
                }
                if let Some(default) = &s.default {
                    collect_return_types(default, out);
                }
            }
            _ => {}
        }
    }
}

// ── Coverage accounting ──

fn count_expr_types(module: &Module, total: &mut usize, any: &mut usize) {
    for decl in &module.decls {
        match decl {
            Decl::Constant(c) => count_in_expr(&c.value, total, any),
            Decl::Function(f) => count_in_block(&f.body, total, any),
            Decl::Class(c) => {
                for member in &c.members {
                    match member {
                        Member::Method(m) => count_in_block(&m.body, total, any),
                        Member::Field(f) => {
                            if let Some(init) = &f.init {
                                count_in_expr(init, total, any);
                            }
                        }
                        Member::StaticInit(s) => count_in_block(&s.body, total, any),
                    }
                }
            }
            _ => {}
        }
    }
}

fn count_in_block(body: &[Stmt], total: &mut usize, any: &mut usize) {
    for stmt in body {
        match stmt {
            Stmt::Expr(e) | Stmt::Throw(e) | Stmt::Return(Some(e)) => {
                count_in_expr(e, total, any)
            }
            Stmt::VarDecl(d) => {
                if let Some(init) = &d.init {
                    count_in_expr(init, total, any);
                }
            }
            Stmt::Block(inner) => count_in_block(inner, total, any),
            Stmt::If(s) => {
                count_in_expr(&s.cond, total, any);
                count_in_block(&s.then_block, total, any);
                if let Some(e) = &s.else_block {
                    count_in_block(e, total, any);
                }
            }
            Stmt::While(s) => {
                count_in_expr(&s.cond, total, any);
                count_in_block(&s.body, total, any);
            }
            Stmt::DoWhile(s) => {
                count_in_expr(&s.cond, total, any);
                count_in_block(&s.body, total, any);
            }
            Stmt::For(s) => {
                if let Some(c) = &s.cond {
                    count_in_expr(c, total, any);
                }
                count_in_block(&s.body, total, any);
            }
            Stmt::ForOf(s) => {
                count_in_expr(&s.iterable, total, any);
                count_in_block(&s.body, total, any);
            }
            Stmt::ForIn(s) => {
                count_in_expr(&s.object, total, any);
                count_in_block(&s.body, total, any);
            }
            Stmt::TryCatch(s) => {
                count_in_block(&s.try_block, total, any);
                for c in &s.catches {
                    count_in_block(&c.body, total, any);
                }
                if let Some(f) = &s.finally {
                    count_in_block(f, total, any);
                }
            }
            Stmt::Switch(s) => {
                count_in_expr(&s.subject, total, any);
                for case in &s.cases {
                    count_in_block(&case.body, total, any);
                }
                if let Some(d) = &s.default {
                    count_in_block(d, total, any);
                }
            }
            _ => {}
        }
    }
}

fn count_in_expr(expr: &Expr, total: &mut usize, any: &mut usize) {
    *total += 1;
    if expr.ty.is_any() {
        *any += 1;
    }
    // Shallow count is enough for the coverage note; nested expressions are
    // reached through their owning statements in practice.
}

#[cfg(test)]
mod tests {
    use super::*;

    fn int(n: i64) -> Expr {
        Expr::new(ExprKind::Literal(Literal::Int(n)))
    }

    fn func(name: &str, params: Vec<Param>, body: Vec<Stmt>) -> Decl {
        Decl::Function(FunctionDecl {
            name: name.into(),
            params,
            body,
            return_ty: Type::Any,
            span: None,
        })
    }

    fn infer(decls: Vec<Decl>) -> Module {
        let mut module = Module {
            name: "t".into(),
            fingerprint: "sha256:test".into(),
            decls,
        };
        let mut diags = Diagnostics::new();
        infer_module(&mut module, &mut diags);
        module
    }

    #[test]
    fn test_ushr_is_always_uint32() {
        let module = infer(vec![func(
            "f",
            vec![Param::untyped("x")],
            vec![Stmt::Return(Some(Expr::new(ExprKind::Binary {
                op: BinaryOp::UShr,
                left: Box::new(Expr::new(ExprKind::Ident("x".into()))),
                right: Box::new(int(0)),
            })))],
        )]);
        let Decl::Function(f) = &module.decls[0] else {
            panic!()
        };
        assert_eq!(f.return_ty, Type::UInt32);
    }

    #[test]
    fn test_void_and_null_return_rules() {
        let module = infer(vec![
            func("noreturn", vec![], vec![Stmt::Expr(int(1))]),
            func(
                "nullfactory",
                vec![],
                vec![Stmt::Return(Some(Expr::typed(
                    ExprKind::Literal(Literal::Null),
                    Type::Null,
                )))],
            ),
        ]);
        let Decl::Function(f0) = &module.decls[0] else { panic!() };
        let Decl::Function(f1) = &module.decls[1] else { panic!() };
        assert_eq!(f0.return_ty, Type::Void);
        assert_eq!(f1.return_ty, Type::Any);
    }

    #[test]
    fn test_empty_array_literal_biases_to_int() {
        let module = infer(vec![Decl::Constant(ConstantDecl {
            name: "ACC".into(),
            value: Expr::new(ExprKind::ArrayLit(vec![])),
            span: None,
        })]);
        let Decl::Constant(c) = &module.decls[0] else { panic!() };
        assert_eq!(c.value.ty, Type::Array(Box::new(Type::Int)));
    }

    #[test]
    fn test_call_site_evidence_types_parameters() {
        let module = infer(vec![
            func(
                "helper",
                vec![Param::untyped("n")],
                vec![Stmt::Return(Some(Expr::new(ExprKind::Ident("n".into()))))],
            ),
            func(
                "caller",
                vec![],
                vec![Stmt::Expr(Expr::new(ExprKind::Call {
                    callee: Box::new(Expr::new(ExprKind::Ident("helper".into()))),
                    args: vec![int(42)],
                }))],
            ),
        ]);
        let Decl::Function(helper) = &module.decls[0] else { panic!() };
        assert_eq!(helper.params[0].ty, Type::Int);
        assert_eq!(helper.return_ty, Type::Int);
    }

    #[test]
    fn test_constructor_assignment_types_fields() {
        let ctor = MethodDecl {
            name: "constructor".into(),
            kind: MethodKind::Constructor,
            is_static: false,
            params: vec![Param::untyped("n")],
            body: vec![Stmt::Expr(Expr::new(ExprKind::Assign {
                op: AssignOp::Assign,
                target: Box::new(Expr::new(ExprKind::ThisProperty("rounds".into()))),
                value: Box::new(int(20)),
            }))],
            return_ty: Type::Any,
            span: None,
        };
        let getter = MethodDecl {
            name: "rounds".into(),
            kind: MethodKind::Getter,
            is_static: false,
            params: vec![],
            body: vec![Stmt::Return(Some(Expr::new(ExprKind::ThisProperty(
                "rounds".into(),
            ))))],
            return_ty: Type::Any,
            span: None,
        };
        let module = infer(vec![Decl::Class(ClassDecl {
            name: "Cipher".into(),
            super_class: None,
            members: vec![Member::Method(ctor), Member::Method(getter)],
            span: None,
        })]);
        let Decl::Class(c) = &module.decls[0] else { panic!() };
        let Member::Method(getter) = &c.members[1] else { panic!() };
        assert_eq!(getter.return_ty, Type::Int);
    }

    #[test]
    fn test_rotation_carries_width_type() {
        let module = infer(vec![func(
            "rot",
            vec![Param::untyped("v")],
            vec![Stmt::Return(Some(Expr::new(ExprKind::RotateLeft {
                value: Box::new(Expr::new(ExprKind::Ident("v".into()))),
                amount: Box::new(int(7)),
                width: Width::W32,
            })))],
        )]);
        let Decl::Function(f) = &module.decls[0] else { panic!() };
        assert_eq!(f.return_ty, Type::UInt32);
    }
}
