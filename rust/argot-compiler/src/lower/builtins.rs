//! Recognition of source standard-library surfaces.
//!
//! `Math.*`, `Number.*`, `Array.*`, `Object.*`, `JSON.*`, `console.*`, the
//! typed-array/DataView constructors, and the instance-method vocabulary all
//! lower to dedicated IL variants here, so back-ends never re-recognise
//! source spellings. Methods like `.slice` that exist on both strings and
//! arrays are split on syntactic evidence about the receiver.

use super::{lower_bigint_digits, Lowerer, Span};
use crate::il::{
    DebugLevel, ErrorKind, Expr, ExprKind, Literal, MathConst, MathFunc, NumberConst,
};
use argot_core::{Endian, Type, Width};
use std::str::FromStr;

/// `Math.PI`, `Number.MAX_SAFE_INTEGER`, and friends.
pub(super) fn lower_namespace_constant(ns: &str, name: &str) -> Option<Expr> {
    let kind = match (ns, name) {
        ("Math", "PI") => ExprKind::MathConstant(MathConst::Pi),
        ("Math", "E") => ExprKind::MathConstant(MathConst::E),
        ("Math", "LN2") => ExprKind::MathConstant(MathConst::Ln2),
        ("Math", "LN10") => ExprKind::MathConstant(MathConst::Ln10),
        ("Math", "LOG2E") => ExprKind::MathConstant(MathConst::Log2E),
        ("Math", "LOG10E") => ExprKind::MathConstant(MathConst::Log10E),
        ("Math", "SQRT2") => ExprKind::MathConstant(MathConst::Sqrt2),
        ("Math", "SQRT1_2") => ExprKind::MathConstant(MathConst::Sqrt1_2),
        ("Number", "MAX_SAFE_INTEGER") => ExprKind::NumberConstant(NumberConst::MaxSafeInteger),
        ("Number", "MIN_SAFE_INTEGER") => ExprKind::NumberConstant(NumberConst::MinSafeInteger),
        ("Number", "MAX_VALUE") => ExprKind::NumberConstant(NumberConst::MaxValue),
        ("Number", "MIN_VALUE") => ExprKind::NumberConstant(NumberConst::MinValue),
        ("Number", "EPSILON") => ExprKind::NumberConstant(NumberConst::Epsilon),
        ("Number", "POSITIVE_INFINITY") => {
            ExprKind::NumberConstant(NumberConst::PositiveInfinity)
        }
        ("Number", "NEGATIVE_INFINITY") => {
            ExprKind::NumberConstant(NumberConst::NegativeInfinity)
        }
        ("Number", "NaN") => ExprKind::NumberConstant(NumberConst::NaN),
        _ => return None,
    };
    let ty = match (ns, name) {
        ("Number", "MAX_SAFE_INTEGER" | "MIN_SAFE_INTEGER") => Type::Int64,
        _ => Type::Float,
    };
    Some(Expr::typed(kind, ty))
}

/// Namespace call sites: `Math.floor(x)`, `Array.isArray(a)`, `JSON.parse`,
/// `console.log`. `None` means the namespace is not a recognised builtin and
/// the caller should fall back to a generic member call.
pub(super) fn lower_namespace_call(
    lowerer: &mut Lowerer<'_>,
    ns: &str,
    method: &str,
    args: &[Expr],
    span: Option<Span>,
) -> Option<Expr> {
    let expr = match ns {
        "Math" => lower_math_call(lowerer, method, args, span),
        "Number" => match (method, args) {
            ("isInteger", [x]) => Expr::typed(ExprKind::IsInteger(Box::new(x.clone())), Type::Bool),
            ("isNaN", [x]) => Expr::typed(ExprKind::IsNaN(Box::new(x.clone())), Type::Bool),
            ("isFinite", [x]) => Expr::typed(ExprKind::IsFinite(Box::new(x.clone())), Type::Bool),
            ("isSafeInteger", [x]) => {
                Expr::typed(ExprKind::IsInteger(Box::new(x.clone())), Type::Bool)
            }
            _ => lowerer.placeholder(&format!("Number.{method}"), span),
        },
        "Array" => match (method, args) {
            ("isArray", [x]) => Expr::typed(ExprKind::IsArray(Box::new(x.clone())), Type::Bool),
            ("from", [x]) => Expr::new(ExprKind::ArrayFrom(Box::new(x.clone()))),
            ("of", _) => Expr::new(ExprKind::ArrayLit(args.to_vec())),
            _ => lowerer.placeholder(&format!("Array.{method}"), span),
        },
        "Object" => match (method, args) {
            ("keys", [x]) => Expr::typed(
                ExprKind::ObjectKeys(Box::new(x.clone())),
                Type::Array(Box::new(Type::String)),
            ),
            ("values", [x]) => Expr::new(ExprKind::ObjectValues(Box::new(x.clone()))),
            ("entries", [x]) => Expr::new(ExprKind::ObjectEntries(Box::new(x.clone()))),
            ("freeze", [x]) => Expr::new(ExprKind::ObjectFreeze(Box::new(x.clone()))),
            _ => lowerer.placeholder(&format!("Object.{method}"), span),
        },
        "JSON" => match (method, args) {
            ("parse", [x]) => Expr::new(ExprKind::JsonParse(Box::new(x.clone()))),
            ("stringify", [value, rest @ ..]) => Expr::typed(
                ExprKind::JsonStringify {
                    value: Box::new(value.clone()),
                    indent: rest.get(1).map(|e| Box::new(e.clone())),
                },
                Type::String,
            ),
            _ => lowerer.placeholder(&format!("JSON.{method}"), span),
        },
        "String" => match method {
            "fromCharCode" => Expr::typed(
                ExprKind::StringFromCharCodes(args.to_vec()),
                Type::String,
            ),
            _ => lowerer.placeholder(&format!("String.{method}"), span),
        },
        "console" => {
            let level = match method {
                "warn" => DebugLevel::Warn,
                "error" => DebugLevel::Error,
                _ => DebugLevel::Log,
            };
            Expr::typed(
                ExprKind::DebugOutput {
                    level,
                    args: args.to_vec(),
                },
                Type::Void,
            )
        }
        _ => return None,
    };
    Some(expr.with_span(span))
}

fn lower_math_call(
    lowerer: &mut Lowerer<'_>,
    method: &str,
    args: &[Expr],
    span: Option<Span>,
) -> Expr {
    match (method, args) {
        ("pow", [base, exp]) => {
            return Expr::new(ExprKind::Power {
                base: Box::new(base.clone()),
                exp: Box::new(exp.clone()),
            });
        }
        // `Math.imul` is 32-bit multiply; the cast carries the truncation.
        ("imul", [a, b]) => {
            return Expr::typed(
                ExprKind::Cast {
                    value: Box::new(Expr::new(ExprKind::Binary {
                        op: crate::il::BinaryOp::Mul,
                        left: Box::new(a.clone()),
                        right: Box::new(b.clone()),
                    })),
                    target_ty: Type::Int32,
                },
                Type::Int32,
            );
        }
        _ => {}
    }
    let pascal = argot_core::names::to_pascal_case(method);
    match MathFunc::from_str(&pascal) {
        Ok(func) => Expr::new(ExprKind::MathCall {
            func,
            args: args.to_vec(),
        }),
        Err(_) => lowerer.placeholder(&format!("Math.{method}"), span),
    }
}

/// Constructor calls (`new X(...)`).
pub(super) fn lower_constructor(
    lowerer: &mut Lowerer<'_>,
    name: &str,
    args: Vec<Expr>,
    span: Option<Span>,
) -> Expr {
    let typed_array_width = match name {
        "Uint8Array" | "Int8Array" | "Uint8ClampedArray" => Some(Width::W8),
        "Uint16Array" | "Int16Array" => Some(Width::W16),
        "Uint32Array" | "Int32Array" => Some(Width::W32),
        "BigUint64Array" | "BigInt64Array" => Some(Width::W64),
        _ => None,
    };
    if let Some(width) = typed_array_width {
        let expr = match args.into_iter().next() {
            // `new Uint8Array([..])` copies an existing array; carried as a
            // width-preserving cast.
            Some(arg) if matches!(arg.kind, ExprKind::ArrayLit(_) | ExprKind::Ident(_)) => {
                Expr::typed(
                    ExprKind::Cast {
                        value: Box::new(arg),
                        target_ty: Type::TypedArray(width),
                    },
                    Type::TypedArray(width),
                )
            }
            Some(size) => Expr::typed(
                ExprKind::TypedArrayCreation {
                    width,
                    size: Box::new(size),
                },
                Type::TypedArray(width),
            ),
            None => Expr::typed(
                ExprKind::TypedArrayCreation {
                    width,
                    size: Box::new(Expr::typed(ExprKind::Literal(Literal::Int(0)), Type::Int)),
                },
                Type::TypedArray(width),
            ),
        };
        return expr.with_span(span);
    }
    let expr = match (name, args.len()) {
        ("Array", 1) => {
            let size = args
                .into_iter()
                .next()
                .unwrap_or_else(|| Expr::typed(ExprKind::Literal(Literal::Int(0)), Type::Int));
            Expr::typed(
                ExprKind::ArrayCreation {
                    size: Box::new(size),
                    init: None,
                },
                Type::Array(Box::new(Type::Int)),
            )
        }
        ("Array", _) => Expr::new(ExprKind::ArrayLit(args)),
        ("Map", 0) => Expr::typed(ExprKind::MapCreation, Type::Map(Box::new(Type::Any), Box::new(Type::Any))),
        ("Set", 0) => Expr::typed(ExprKind::SetCreation, Type::Set(Box::new(Type::Any))),
        ("DataView", _) => {
            let buffer = args
                .into_iter()
                .next()
                .unwrap_or_else(|| Expr::typed(ExprKind::Literal(Literal::Null), Type::Null));
            Expr::new(ExprKind::DataViewCreation(Box::new(buffer)))
        }
        ("ArrayBuffer", 1) => {
            let size = args
                .into_iter()
                .next()
                .unwrap_or_else(|| Expr::typed(ExprKind::Literal(Literal::Int(0)), Type::Int));
            Expr::new(ExprKind::BufferCreation {
                size: Box::new(size),
            })
        }
        ("Error" | "TypeError" | "RangeError" | "SyntaxError" | "ReferenceError", _) => {
            let kind = match name {
                "TypeError" => ErrorKind::TypeError,
                "RangeError" => ErrorKind::RangeError,
                "SyntaxError" => ErrorKind::SyntaxError,
                "ReferenceError" => ErrorKind::ReferenceError,
                _ => ErrorKind::Error,
            };
            Expr::new(ExprKind::ErrorCreation {
                kind,
                message: args.into_iter().next().map(Box::new),
            })
        }
        ("Map" | "Set", _) => {
            lowerer.placeholder(&format!("new {name} with constructor arguments"), span)
        }
        _ => Expr::new(ExprKind::New {
            class_name: name.to_string(),
            args,
        }),
    };
    expr.with_span(span)
}

/// Bare-identifier calls: conversion builtins or a plain function call.
pub(super) fn lower_global_call(
    lowerer: &mut Lowerer<'_>,
    name: &str,
    args: Vec<Expr>,
    span: Option<Span>,
) -> Expr {
    let _ = lowerer;
    if let Some(expr) = conversion_call(name, &args) {
        return expr.with_span(span);
    }
    Expr::new(ExprKind::Call {
        callee: Box::new(Expr::new(ExprKind::Ident(name.to_string()))),
        args,
    })
    .with_span(span)
}

fn conversion_call(name: &str, args: &[Expr]) -> Option<Expr> {
    let expr = match (name, args) {
        ("BigInt", [arg]) => match &arg.kind {
            ExprKind::Literal(Literal::Str(s)) => lower_bigint_digits(s),
            ExprKind::Literal(Literal::Int(n)) => {
                Expr::typed(ExprKind::Literal(Literal::Int(*n)), Type::Int64)
            }
            _ => Expr::typed(ExprKind::BigIntCast(Box::new(arg.clone())), Type::Int64),
        },
        ("isNaN", [x]) => Expr::typed(ExprKind::IsNaN(Box::new(x.clone())), Type::Bool),
        ("isFinite", [x]) => Expr::typed(ExprKind::IsFinite(Box::new(x.clone())), Type::Bool),
        ("parseInt", [x]) => Expr::typed(
            ExprKind::Cast {
                value: Box::new(x.clone()),
                target_ty: Type::Int,
            },
            Type::Int,
        ),
        ("parseFloat", [x]) => Expr::typed(
            ExprKind::Cast {
                value: Box::new(x.clone()),
                target_ty: Type::Float,
            },
            Type::Float,
        ),
        ("String", [x]) => Expr::typed(
            ExprKind::Cast {
                value: Box::new(x.clone()),
                target_ty: Type::String,
            },
            Type::String,
        ),
        ("Number", [x]) => Expr::typed(
            ExprKind::Cast {
                value: Box::new(x.clone()),
                target_ty: Type::Float,
            },
            Type::Float,
        ),
        ("Boolean", [x]) => Expr::typed(
            ExprKind::Cast {
                value: Box::new(x.clone()),
                target_ty: Type::Bool,
            },
            Type::Bool,
        ),
        _ => return None,
    };
    Some(expr)
}

/// Receiver-method calls. Ambiguous names (`slice`, `indexOf`, `includes`,
/// `concat`) are split on whether the receiver is visibly string-shaped.
pub(super) fn lower_method_call(
    lowerer: &mut Lowerer<'_>,
    target: Expr,
    method: &str,
    args: Vec<Expr>,
    span: Option<Span>,
) -> Expr {
    if let Some(expr) = container_method(&target, method, &args) {
        return expr.with_span(span);
    }
    if let Some(expr) = lower_data_view_call(lowerer, &target, method, &args, span) {
        return expr;
    }
    Expr::new(ExprKind::Call {
        callee: Box::new(Expr::new(ExprKind::Member {
            target: Box::new(target),
            name: method.to_string(),
            optional: false,
        })),
        args,
    })
    .with_span(span)
}

fn container_method(target: &Expr, method: &str, args: &[Expr]) -> Option<Expr> {
    let stringish = is_stringish(target);
    let t = || Box::new(target.clone());
    let expr = match (method, args) {
        ("push", _) => Expr::typed(
            ExprKind::ArrayAppend {
                target: t(),
                values: args.to_vec(),
            },
            Type::Int,
        ),
        ("pop", []) => Expr::new(ExprKind::ArrayPop(t())),
        ("shift", []) => Expr::new(ExprKind::ArrayShift(t())),
        ("unshift", _) => Expr::typed(
            ExprKind::ArrayUnshift {
                target: t(),
                values: args.to_vec(),
            },
            Type::Int,
        ),
        ("splice", [start, rest @ ..]) => Expr::new(ExprKind::ArraySplice {
            target: t(),
            start: Box::new(start.clone()),
            delete_count: rest.first().map(|e| Box::new(e.clone())),
            items: rest.iter().skip(1).cloned().collect(),
        }),
        ("slice", _) if stringish => Expr::typed(
            ExprKind::StringSlice {
                target: t(),
                start: args.first().map(|e| Box::new(e.clone())),
                end: args.get(1).map(|e| Box::new(e.clone())),
            },
            Type::String,
        ),
        ("slice", _) => Expr::new(ExprKind::ArraySlice {
            target: t(),
            start: args.first().map(|e| Box::new(e.clone())),
            end: args.get(1).map(|e| Box::new(e.clone())),
        }),
        ("fill", [value]) => Expr::new(ExprKind::ArrayFill {
            target: t(),
            value: Box::new(value.clone()),
        }),
        ("concat", _) if stringish => {
            let mut parts = vec![target.clone()];
            parts.extend(args.iter().cloned());
            Expr::typed(ExprKind::StringConcat(parts), Type::String)
        }
        ("concat", _) => Expr::new(ExprKind::ArrayConcat {
            target: t(),
            others: args.to_vec(),
        }),
        ("reverse", []) => Expr::new(ExprKind::ArrayReverse(t())),
        ("join", _) => Expr::typed(
            ExprKind::ArrayJoin {
                target: t(),
                sep: args.first().map(|e| Box::new(e.clone())),
            },
            Type::String,
        ),
        ("indexOf", [needle]) if stringish => Expr::typed(
            ExprKind::StringIndexOf {
                target: t(),
                needle: Box::new(needle.clone()),
            },
            Type::Int,
        ),
        ("indexOf", [needle]) => Expr::typed(
            ExprKind::ArrayIndexOf {
                target: t(),
                needle: Box::new(needle.clone()),
            },
            Type::Int,
        ),
        ("includes", [needle]) if stringish => Expr::typed(
            ExprKind::StringIncludes {
                target: t(),
                needle: Box::new(needle.clone()),
            },
            Type::Bool,
        ),
        ("includes", [needle]) => Expr::typed(
            ExprKind::ArrayIncludes {
                target: t(),
                needle: Box::new(needle.clone()),
            },
            Type::Bool,
        ),
        ("map", [callback]) => Expr::new(ExprKind::ArrayMap {
            target: t(),
            callback: Box::new(callback.clone()),
        }),
        ("filter", [callback]) => Expr::new(ExprKind::ArrayFilter {
            target: t(),
            callback: Box::new(callback.clone()),
        }),
        ("forEach", [callback]) => Expr::typed(
            ExprKind::ArrayForEach {
                target: t(),
                callback: Box::new(callback.clone()),
            },
            Type::Void,
        ),
        ("find", [callback]) => Expr::new(ExprKind::ArrayFind {
            target: t(),
            callback: Box::new(callback.clone()),
        }),
        ("findIndex", [callback]) => Expr::typed(
            ExprKind::ArrayFindIndex {
                target: t(),
                callback: Box::new(callback.clone()),
            },
            Type::Int,
        ),
        ("reduce", [callback, rest @ ..]) => Expr::new(ExprKind::ArrayReduce {
            target: t(),
            callback: Box::new(callback.clone()),
            init: rest.first().map(|e| Box::new(e.clone())),
        }),
        ("every", [callback]) => Expr::typed(
            ExprKind::ArrayEvery {
                target: t(),
                callback: Box::new(callback.clone()),
            },
            Type::Bool,
        ),
        ("some", [callback]) => Expr::typed(
            ExprKind::ArraySome {
                target: t(),
                callback: Box::new(callback.clone()),
            },
            Type::Bool,
        ),
        ("sort", _) => Expr::new(ExprKind::ArraySort {
            target: t(),
            comparator: args.first().map(|e| Box::new(e.clone())),
        }),
        ("split", [sep]) => Expr::typed(
            ExprKind::StringSplit {
                target: t(),
                sep: Box::new(sep.clone()),
            },
            Type::Array(Box::new(Type::String)),
        ),
        ("trim", []) => Expr::typed(ExprKind::StringTrim(t()), Type::String),
        ("repeat", [count]) => Expr::typed(
            ExprKind::StringRepeat {
                target: t(),
                count: Box::new(count.clone()),
            },
            Type::String,
        ),
        ("replace" | "replaceAll", [from, to]) => Expr::typed(
            ExprKind::StringReplace {
                target: t(),
                from: Box::new(from.clone()),
                to: Box::new(to.clone()),
                all: method == "replaceAll",
            },
            Type::String,
        ),
        ("substring", [start, rest @ ..]) => Expr::typed(
            ExprKind::StringSubstring {
                target: t(),
                start: Box::new(start.clone()),
                end: rest.first().map(|e| Box::new(e.clone())),
            },
            Type::String,
        ),
        ("charCodeAt", [index]) => Expr::typed(
            ExprKind::StringCharCodeAt {
                target: t(),
                index: Box::new(index.clone()),
            },
            Type::Int,
        ),
        ("charAt", [index]) => Expr::typed(
            ExprKind::StringCharAt {
                target: t(),
                index: Box::new(index.clone()),
            },
            Type::String,
        ),
        ("startsWith", [prefix]) => Expr::typed(
            ExprKind::StringStartsWith {
                target: t(),
                prefix: Box::new(prefix.clone()),
            },
            Type::Bool,
        ),
        ("endsWith", [suffix]) => Expr::typed(
            ExprKind::StringEndsWith {
                target: t(),
                suffix: Box::new(suffix.clone()),
            },
            Type::Bool,
        ),
        ("toLowerCase", []) => Expr::typed(ExprKind::StringToLower(t()), Type::String),
        ("toUpperCase", []) => Expr::typed(ExprKind::StringToUpper(t()), Type::String),
        ("set", [source, rest @ ..]) => Expr::typed(
            ExprKind::TypedArraySet {
                target: t(),
                source: Box::new(source.clone()),
                offset: rest.first().map(|e| Box::new(e.clone())),
            },
            Type::Void,
        ),
        ("subarray", _) => Expr::new(ExprKind::TypedArraySubarray {
            target: t(),
            start: args.first().map(|e| Box::new(e.clone())),
            end: args.get(1).map(|e| Box::new(e.clone())),
        }),
        _ => return None,
    };
    Some(expr)
}

/// `view.getUint32(off, littleEndian)` / `view.setUint16(off, v, le)` — the
/// endian flag must be a literal so the IL node can carry it explicitly.
fn lower_data_view_call(
    lowerer: &mut Lowerer<'_>,
    target: &Expr,
    method: &str,
    args: &[Expr],
    span: Option<Span>,
) -> Option<Expr> {
    let (is_set, width) = match method {
        "getUint8" | "getInt8" => (false, Width::W8),
        "getUint16" | "getInt16" => (false, Width::W16),
        "getUint32" | "getInt32" => (false, Width::W32),
        "getBigUint64" | "getBigInt64" => (false, Width::W64),
        "setUint8" | "setInt8" => (true, Width::W8),
        "setUint16" | "setInt16" => (true, Width::W16),
        "setUint32" | "setInt32" => (true, Width::W32),
        "setBigUint64" | "setBigInt64" => (true, Width::W64),
        _ => return None,
    };
    let endian_arg = if is_set { args.get(2) } else { args.get(1) };
    let endian = match endian_arg.map(|e| &e.kind) {
        None => Endian::Big,
        Some(ExprKind::Literal(Literal::Bool(true))) => Endian::Little,
        Some(ExprKind::Literal(Literal::Bool(false))) => Endian::Big,
        Some(_) => {
            return Some(lowerer.placeholder(
                &format!("DataView.{method} with non-literal endian flag"),
                span,
            ));
        }
    };
    let view = Box::new(target.clone());
    let expr = if is_set {
        let (offset, value) = (args.first()?, args.get(1)?);
        Expr::typed(
            ExprKind::DataViewWrite {
                view,
                offset: Box::new(offset.clone()),
                value: Box::new(value.clone()),
                width,
                endian,
            },
            Type::Void,
        )
    } else {
        let offset = args.first()?;
        Expr::typed(
            ExprKind::DataViewRead {
                view,
                offset: Box::new(offset.clone()),
                width,
                endian,
            },
            match width {
                Width::W8 => Type::UInt8,
                Width::W16 => Type::UInt16,
                Width::W32 => Type::UInt32,
                Width::W64 => Type::UInt64,
            },
        )
    };
    Some(expr.with_span(span))
}

/// Syntactic evidence that an expression produces a string.
fn is_stringish(expr: &Expr) -> bool {
    if expr.ty == Type::String {
        return true;
    }
    matches!(
        expr.kind,
        ExprKind::Literal(Literal::Str(_))
            | ExprKind::StringInterpolation(_)
            | ExprKind::StringConcat(_)
            | ExprKind::StringSlice { .. }
            | ExprKind::StringSubstring { .. }
            | ExprKind::StringTrim(_)
            | ExprKind::StringRepeat { .. }
            | ExprKind::StringReplace { .. }
            | ExprKind::StringToLower(_)
            | ExprKind::StringToUpper(_)
            | ExprKind::StringCharAt { .. }
            | ExprKind::StringFromCharCodes(_)
            | ExprKind::HexEncode(_)
            | ExprKind::BytesToString(_)
            | ExprKind::TypeOf(_)
            | ExprKind::ArrayJoin { .. }
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::diagnostics::Diagnostics;

    fn str_lit(s: &str) -> Expr {
        Expr::typed(ExprKind::Literal(Literal::Str(s.into())), Type::String)
    }

    fn ident(name: &str) -> Expr {
        Expr::new(ExprKind::Ident(name.into()))
    }

    #[test]
    fn test_slice_splits_on_receiver_shape() {
        let mut diags = Diagnostics::new();
        let mut lowerer = Lowerer::new(&mut diags);
        let on_string = lower_method_call(&mut lowerer, str_lit("abc"), "slice", vec![], None);
        assert!(matches!(on_string.kind, ExprKind::StringSlice { .. }));
        let on_array = lower_method_call(&mut lowerer, ident("buf"), "slice", vec![], None);
        assert!(matches!(on_array.kind, ExprKind::ArraySlice { .. }));
    }

    #[test]
    fn test_math_calls_resolve_through_closed_enum() {
        let mut diags = Diagnostics::new();
        let mut lowerer = Lowerer::new(&mut diags);
        let floor =
            lower_namespace_call(&mut lowerer, "Math", "floor", &[ident("x")], None).unwrap();
        assert!(matches!(
            floor.kind,
            ExprKind::MathCall {
                func: MathFunc::Floor,
                ..
            }
        ));
        let unknown =
            lower_namespace_call(&mut lowerer, "Math", "clz32", &[ident("x")], None).unwrap();
        assert!(matches!(unknown.kind, ExprKind::Placeholder(_)));
        assert!(!diags.is_empty());
    }

    #[test]
    fn test_data_view_endian_flag_must_be_literal() {
        let mut diags = Diagnostics::new();
        let mut lowerer = Lowerer::new(&mut diags);
        let read = lower_method_call(
            &mut lowerer,
            ident("view"),
            "getUint32",
            vec![
                Expr::typed(ExprKind::Literal(Literal::Int(0)), Type::Int),
                Expr::typed(ExprKind::Literal(Literal::Bool(true)), Type::Bool),
            ],
            None,
        );
        match read.kind {
            ExprKind::DataViewRead { width, endian, .. } => {
                assert_eq!(width, Width::W32);
                assert_eq!(endian, Endian::Little);
            }
            other => panic!("expected DataViewRead, got {:?}", other),
        }
        let dynamic = lower_method_call(
            &mut lowerer,
            ident("view"),
            "getUint32",
            vec![
                Expr::typed(ExprKind::Literal(Literal::Int(0)), Type::Int),
                ident("le"),
            ],
            None,
        );
        assert!(matches!(dynamic.kind, ExprKind::Placeholder(_)));
    }

    #[test]
    fn test_console_levels() {
        let mut diags = Diagnostics::new();
        let mut lowerer = Lowerer::new(&mut diags);
        let warn =
            lower_namespace_call(&mut lowerer, "console", "warn", &[str_lit("hi")], None).unwrap();
        assert!(matches!(
            warn.kind,
            ExprKind::DebugOutput {
                level: DebugLevel::Warn,
                ..
            }
        ));
    }

    #[test]
    fn test_constructor_recognition() {
        let mut diags = Diagnostics::new();
        let mut lowerer = Lowerer::new(&mut diags);
        let words = lower_constructor(
            &mut lowerer,
            "Uint32Array",
            vec![Expr::typed(ExprKind::Literal(Literal::Int(16)), Type::Int)],
            None,
        );
        assert!(matches!(
            words.kind,
            ExprKind::TypedArrayCreation {
                width: Width::W32,
                ..
            }
        ));
        let err = lower_constructor(&mut lowerer, "TypeError", vec![str_lit("bad")], None);
        assert!(matches!(
            err.kind,
            ExprKind::ErrorCreation {
                kind: ErrorKind::TypeError,
                ..
            }
        ));
        let user = lower_constructor(&mut lowerer, "KeySchedule", vec![], None);
        assert!(matches!(user.kind, ExprKind::New { .. }));
    }
}
