//! Recognition of the source's bit-operations library.
//!
//! Calls on the well-known `OpCodes` object are rewritten into domain IL
//! nodes carrying explicit width and endianness, so no back-end ever has to
//! guess either. An `OpCodes` method outside this table lowers to a
//! placeholder with a warning; the namespace itself never reaches the IL.

use super::{Lowerer, Span};
use crate::il::{Expr, ExprKind};
use argot_core::{Endian, Type, Width};

/// Names under which the bit-ops library appears in source programs.
pub(super) fn is_opcode_namespace(name: &str) -> bool {
    matches!(name, "OpCodes" | "Op" | "BitOps")
}

pub(super) fn lower_opcode_call(
    lowerer: &mut Lowerer<'_>,
    ns: &str,
    method: &str,
    args: &[Expr],
    span: Option<Span>,
) -> Expr {
    if let Some((width, right)) = rotation_of(method) {
        if args.len() == 2 {
            let kind = if right {
                ExprKind::RotateRight {
                    value: Box::new(args[0].clone()),
                    amount: Box::new(args[1].clone()),
                    width,
                }
            } else {
                ExprKind::RotateLeft {
                    value: Box::new(args[0].clone()),
                    amount: Box::new(args[1].clone()),
                    width,
                }
            };
            return Expr::typed(kind, width_type(width)).with_span(span);
        }
        return arity_placeholder(lowerer, ns, method, span);
    }

    if let Some((width, endian)) = packing_of(method, "Pack") {
        if args.len() as u32 == width.bytes() {
            return Expr::typed(
                ExprKind::PackBytes {
                    bytes: args.to_vec(),
                    width,
                    endian,
                },
                width_type(width),
            )
            .with_span(span);
        }
        return arity_placeholder(lowerer, ns, method, span);
    }

    if let Some((width, endian)) = packing_of(method, "Unpack") {
        if args.len() == 1 {
            return Expr::typed(
                ExprKind::UnpackBytes {
                    value: Box::new(args[0].clone()),
                    width,
                    endian,
                },
                Type::Array(Box::new(Type::UInt8)),
            )
            .with_span(span);
        }
        return arity_placeholder(lowerer, ns, method, span);
    }

    match (method, args) {
        ("Hex8ToBytes" | "HexToBytes", [s]) => Expr::typed(
            ExprKind::HexDecode(Box::new(s.clone())),
            Type::Array(Box::new(Type::UInt8)),
        ),
        ("BytesToHex8" | "BytesToHex", [b]) => {
            Expr::typed(ExprKind::HexEncode(Box::new(b.clone())), Type::String)
        }
        ("XorArrays", [a, b]) => Expr::typed(
            ExprKind::ArrayXor {
                a: Box::new(a.clone()),
                b: Box::new(b.clone()),
            },
            Type::Array(Box::new(Type::UInt8)),
        ),
        ("SecureCompare" | "ConstantTimeCompare", [a, b]) => Expr::typed(
            ExprKind::SecureCompare {
                a: Box::new(a.clone()),
                b: Box::new(b.clone()),
            },
            Type::Bool,
        ),
        ("CopyArray", [a]) => Expr::new(ExprKind::CopyArray(Box::new(a.clone()))),
        ("ClearArray", [a]) => {
            Expr::typed(ExprKind::ArrayClear(Box::new(a.clone())), Type::Void)
        }
        ("ConcatArrays", [first, rest @ ..]) if !rest.is_empty() => Expr::new(ExprKind::ArrayConcat {
            target: Box::new(first.clone()),
            others: rest.to_vec(),
        }),
        ("AnsiToBytes" | "AsciiToBytes" | "StringToBytes", [s]) => Expr::typed(
            ExprKind::StringToBytes(Box::new(s.clone())),
            Type::Array(Box::new(Type::UInt8)),
        ),
        ("BytesToAnsi" | "BytesToString", [b]) => {
            Expr::typed(ExprKind::BytesToString(Box::new(b.clone())), Type::String)
        }
        _ => arity_placeholder(lowerer, ns, method, span),
    }
    .with_span(span)
}

fn arity_placeholder(
    lowerer: &mut Lowerer<'_>,
    ns: &str,
    method: &str,
    span: Option<Span>,
) -> Expr {
    lowerer.placeholder(&format!("bit-ops call {ns}.{method}"), span)
}

/// `RotL32` → `(W32, false)`, `RotR8` → `(W8, true)`.
fn rotation_of(method: &str) -> Option<(Width, bool)> {
    let (rest, right) = if let Some(rest) = method.strip_prefix("RotL") {
        (rest, false)
    } else if let Some(rest) = method.strip_prefix("RotR") {
        (rest, true)
    } else {
        return None;
    };
    let bits: u32 = rest.parse().ok()?;
    Width::from_bits(bits).map(|w| (w, right))
}

/// `Pack32BE` → `(W32, Big)`; `Unpack16LE` → `(W16, Little)` with the
/// matching prefix.
fn packing_of(method: &str, prefix: &str) -> Option<(Width, Endian)> {
    let rest = method.strip_prefix(prefix)?;
    let (digits, endian) = if let Some(d) = rest.strip_suffix("BE") {
        (d, Endian::Big)
    } else if let Some(d) = rest.strip_suffix("LE") {
        (d, Endian::Little)
    } else {
        return None;
    };
    let bits: u32 = digits.parse().ok()?;
    Width::from_bits(bits).map(|w| (w, endian))
}

fn width_type(width: Width) -> Type {
    match width {
        Width::W8 => Type::UInt8,
        Width::W16 => Type::UInt16,
        Width::W32 => Type::UInt32,
        Width::W64 => Type::UInt64,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rotation_names() {
        assert_eq!(rotation_of("RotL32"), Some((Width::W32, false)));
        assert_eq!(rotation_of("RotR8"), Some((Width::W8, true)));
        assert_eq!(rotation_of("RotL12"), None);
        assert_eq!(rotation_of("Rotate"), None);
    }

    #[test]
    fn test_packing_names() {
        assert_eq!(packing_of("Pack32BE", "Pack"), Some((Width::W32, Endian::Big)));
        assert_eq!(
            packing_of("Unpack64LE", "Unpack"),
            Some((Width::W64, Endian::Little))
        );
        assert_eq!(packing_of("Pack32", "Pack"), None);
        assert_eq!(packing_of("Unpack32BE", "Pack"), None);
    }

    #[test]
    fn test_namespace_spellings() {
        assert!(is_opcode_namespace("OpCodes"));
        assert!(is_opcode_namespace("BitOps"));
        assert!(!is_opcode_namespace("Math"));
    }
}
