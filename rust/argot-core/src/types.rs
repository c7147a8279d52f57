//! The inferred type lattice.
//!
//! Every IL expression carries one of these tags. `Any` is the join element:
//! inference widens to it whenever evidence conflicts or runs out. Unsigned
//! widths are preserved so back-ends can emit masking (`& 0xFF`, shift
//! truncation) without re-deriving them.

use serde::{Deserialize, Serialize};
use std::fmt;
use strum_macros::{Display, EnumString};

/// Bit width of a packed integer, rotation, or typed array element.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumString,
)]
pub enum Width {
    #[strum(serialize = "8")]
    W8,
    #[strum(serialize = "16")]
    W16,
    #[strum(serialize = "32")]
    W32,
    #[strum(serialize = "64")]
    W64,
}

impl Width {
    pub fn bits(self) -> u32 {
        match self {
            Width::W8 => 8,
            Width::W16 => 16,
            Width::W32 => 32,
            Width::W64 => 64,
        }
    }

    pub fn bytes(self) -> u32 {
        self.bits() / 8
    }

    /// The all-ones mask for this width, as a u64.
    pub fn mask(self) -> u64 {
        match self {
            Width::W8 => 0xFF,
            Width::W16 => 0xFFFF,
            Width::W32 => 0xFFFF_FFFF,
            Width::W64 => u64::MAX,
        }
    }

    pub fn from_bits(bits: u32) -> Option<Width> {
        match bits {
            8 => Some(Width::W8),
            16 => Some(Width::W16),
            32 => Some(Width::W32),
            64 => Some(Width::W64),
            _ => None,
        }
    }
}

/// Byte order of a pack/unpack or data-view operation.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumString,
)]
pub enum Endian {
    #[strum(serialize = "be")]
    Big,
    #[strum(serialize = "le")]
    Little,
}

/// A type tag from the flat lattice.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Type {
    /// Untagged integer (JS `number` known to hold integral values).
    Int,
    Int32,
    Int64,
    UInt8,
    UInt16,
    UInt32,
    UInt64,
    Float,
    Bool,
    String,
    Void,
    Null,
    /// Join element; the fallback when inference is exhausted.
    Any,
    Array(Box<Type>),
    TypedArray(Width),
    Map(Box<Type>, Box<Type>),
    Set(Box<Type>),
    Tuple(Vec<Type>),
    Object,
    Function,
}

impl Default for Type {
    /// The join element is the natural "not yet inferred" state.
    fn default() -> Type {
        Type::Any
    }
}

impl Type {
    pub fn is_any(&self) -> bool {
        matches!(self, Type::Any)
    }

    pub fn is_numeric(&self) -> bool {
        matches!(
            self,
            Type::Int
                | Type::Int32
                | Type::Int64
                | Type::UInt8
                | Type::UInt16
                | Type::UInt32
                | Type::UInt64
                | Type::Float
        )
    }

    pub fn is_integer(&self) -> bool {
        self.is_numeric() && !matches!(self, Type::Float)
    }

    /// The masking width of an unsigned tag, if it has one.
    pub fn width(&self) -> Option<Width> {
        match self {
            Type::UInt8 => Some(Width::W8),
            Type::UInt16 => Some(Width::W16),
            Type::UInt32 => Some(Width::W32),
            Type::UInt64 => Some(Width::W64),
            _ => None,
        }
    }

    /// Element type of an array-like tag.
    pub fn element(&self) -> Option<Type> {
        match self {
            Type::Array(elem) => Some((**elem).clone()),
            Type::TypedArray(w) => Some(match w {
                Width::W8 => Type::UInt8,
                Width::W16 => Type::UInt16,
                Width::W32 => Type::UInt32,
                Width::W64 => Type::UInt64,
            }),
            Type::Set(elem) => Some((**elem).clone()),
            _ => None,
        }
    }

    /// Rank used when widening two numeric operands; higher wins.
    fn numeric_rank(&self) -> u8 {
        match self {
            Type::UInt8 => 1,
            Type::UInt16 => 2,
            Type::Int32 | Type::UInt32 => 3,
            Type::Int => 4,
            Type::Int64 | Type::UInt64 => 5,
            Type::Float => 6,
            _ => 0,
        }
    }

    /// Least upper bound of two tags. Total: conflicting evidence joins to
    /// `Any`, never an error.
    pub fn join(&self, other: &Type) -> Type {
        if self == other {
            return self.clone();
        }
        match (self, other) {
            (Type::Any, _) | (_, Type::Any) => Type::Any,
            // Null beside a concrete type reads as "nullable T"; the lattice
            // keeps the concrete tag.
            (Type::Null, t) | (t, Type::Null) => t.clone(),
            (a, b) if a.is_numeric() && b.is_numeric() => {
                let (ra, rb) = (a.numeric_rank(), b.numeric_rank());
                if ra == rb {
                    // Same width, different signedness: fall back to the
                    // generic integer tag (or Float, which has no pair).
                    match ra {
                        3 => Type::Int,
                        5 => Type::Int64,
                        _ => Type::Int,
                    }
                } else if ra > rb {
                    a.clone()
                } else {
                    b.clone()
                }
            }
            (Type::Array(a), Type::Array(b)) => Type::Array(Box::new(a.join(b))),
            (Type::Array(a), Type::TypedArray(w)) | (Type::TypedArray(w), Type::Array(a)) => {
                let elem = Type::TypedArray(*w).element().unwrap_or(Type::Any);
                Type::Array(Box::new(a.join(&elem)))
            }
            (Type::TypedArray(a), Type::TypedArray(b)) => {
                if a.bits() >= b.bits() {
                    Type::TypedArray(*a)
                } else {
                    Type::TypedArray(*b)
                }
            }
            (Type::Set(a), Type::Set(b)) => Type::Set(Box::new(a.join(b))),
            (Type::Map(ka, va), Type::Map(kb, vb)) => {
                Type::Map(Box::new(ka.join(kb)), Box::new(va.join(vb)))
            }
            (Type::Tuple(a), Type::Tuple(b)) if a.len() == b.len() => {
                Type::Tuple(a.iter().zip(b).map(|(x, y)| x.join(y)).collect())
            }
            _ => Type::Any,
        }
    }

    /// Join a whole list; `Any` for an empty input.
    pub fn join_all<'a>(types: impl IntoIterator<Item = &'a Type>) -> Type {
        let mut iter = types.into_iter();
        match iter.next() {
            None => Type::Any,
            Some(first) => iter.fold(first.clone(), |acc, t| acc.join(t)),
        }
    }

    pub fn contains_any(&self) -> bool {
        match self {
            Type::Any => true,
            Type::Array(t) | Type::Set(t) => t.contains_any(),
            Type::Map(k, v) => k.contains_any() || v.contains_any(),
            Type::Tuple(ts) => ts.iter().any(Type::contains_any),
            _ => false,
        }
    }
}

impl fmt::Display for Type {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Type::Int => write!(f, "Int"),
            Type::Int32 => write!(f, "Int32"),
            Type::Int64 => write!(f, "Int64"),
            Type::UInt8 => write!(f, "UInt8"),
            Type::UInt16 => write!(f, "UInt16"),
            Type::UInt32 => write!(f, "UInt32"),
            Type::UInt64 => write!(f, "UInt64"),
            Type::Float => write!(f, "Float"),
            Type::Bool => write!(f, "Bool"),
            Type::String => write!(f, "String"),
            Type::Void => write!(f, "Void"),
            Type::Null => write!(f, "Null"),
            Type::Any => write!(f, "Any"),
            Type::Array(t) => write!(f, "Array[{}]", t),
            Type::TypedArray(w) => write!(f, "TypedArray[{}]", w.bits()),
            Type::Map(k, v) => write!(f, "Map[{}, {}]", k, v),
            Type::Set(t) => write!(f, "Set[{}]", t),
            Type::Tuple(ts) => {
                write!(f, "(")?;
                for (i, t) in ts.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}", t)?;
                }
                write!(f, ")")
            }
            Type::Object => write!(f, "Object"),
            Type::Function => write!(f, "Function"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_join_is_commutative_on_numerics() {
        let pairs = [
            (Type::UInt8, Type::UInt32),
            (Type::Int, Type::Float),
            (Type::Int32, Type::UInt32),
            (Type::Int64, Type::UInt64),
        ];
        for (a, b) in pairs {
            assert_eq!(a.join(&b), b.join(&a));
        }
    }

    #[test]
    fn test_join_widens_to_wider_operand() {
        assert_eq!(Type::UInt8.join(&Type::UInt32), Type::UInt32);
        assert_eq!(Type::UInt32.join(&Type::Float), Type::Float);
        assert_eq!(Type::Int32.join(&Type::UInt32), Type::Int);
    }

    #[test]
    fn test_any_is_absorbing() {
        assert_eq!(Type::Any.join(&Type::UInt32), Type::Any);
        assert_eq!(Type::Array(Box::new(Type::Int)).join(&Type::Any), Type::Any);
    }

    #[test]
    fn test_null_keeps_concrete_side() {
        assert_eq!(Type::Null.join(&Type::String), Type::String);
        assert_eq!(Type::String.join(&Type::Null), Type::String);
    }

    #[test]
    fn test_array_join_joins_elements() {
        let a = Type::Array(Box::new(Type::UInt8));
        let b = Type::Array(Box::new(Type::UInt32));
        assert_eq!(a.join(&b), Type::Array(Box::new(Type::UInt32)));
    }

    #[test]
    fn test_mismatched_primitives_join_to_any() {
        assert_eq!(Type::String.join(&Type::Bool), Type::Any);
        assert_eq!(Type::Object.join(&Type::Function), Type::Any);
    }

    #[test]
    fn test_width_masks() {
        assert_eq!(Width::W8.mask(), 0xFF);
        assert_eq!(Width::W32.mask(), 0xFFFF_FFFF);
        assert_eq!(Width::W32.bytes(), 4);
        assert_eq!(Width::from_bits(16), Some(Width::W16));
        assert_eq!(Width::from_bits(12), None);
    }
}
