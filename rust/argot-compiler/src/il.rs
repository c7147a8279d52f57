//! The intermediate language.
//!
//! A closed, source-neutral node set: the lowerer is the only component that
//! knows the source ecosystem, and each back-end consumes exactly this
//! taxonomy. Every expression carries an inferred [`Type`] (`Any` only after
//! inference exhaustion) and an optional source location. The tree is
//! strictly owned; re-using a subtree means cloning it.

use argot_core::{Endian, Type, Width};
use num_bigint::BigInt;
use serde::{Deserialize, Serialize};
use strum_macros::{AsRefStr, EnumString};

/// Line/column of the originating source construct.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Span {
    pub line: u32,
    pub col: u32,
}

impl Span {
    pub fn new(line: u32, col: u32) -> Span {
        Span { line, col }
    }
}

// ── Declarations ──

/// A lowered compilation unit: one flat list of declarations.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Module {
    pub name: String,
    /// `sha256:<hex>` of the source AST this module was lowered from.
    pub fingerprint: String,
    pub decls: Vec<Decl>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum Decl {
    Class(ClassDecl),
    Function(FunctionDecl),
    Constant(ConstantDecl),
    Import(ImportDecl),
    Export(ExportDecl),
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClassDecl {
    pub name: String,
    pub super_class: Option<String>,
    pub members: Vec<Member>,
    pub span: Option<Span>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum Member {
    Method(MethodDecl),
    Field(FieldDecl),
    StaticInit(StaticInitDecl),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MethodKind {
    Constructor,
    Normal,
    Getter,
    Setter,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MethodDecl {
    pub name: String,
    pub kind: MethodKind,
    pub is_static: bool,
    pub params: Vec<Param>,
    pub body: Vec<Stmt>,
    pub return_ty: Type,
    pub span: Option<Span>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FieldDecl {
    pub name: String,
    pub ty: Type,
    pub is_static: bool,
    pub init: Option<Expr>,
    pub span: Option<Span>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StaticInitDecl {
    pub body: Vec<Stmt>,
    pub span: Option<Span>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FunctionDecl {
    pub name: String,
    pub params: Vec<Param>,
    pub body: Vec<Stmt>,
    pub return_ty: Type,
    pub span: Option<Span>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConstantDecl {
    pub name: String,
    pub value: Expr,
    pub span: Option<Span>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImportDecl {
    pub names: Vec<String>,
    pub from: String,
    pub span: Option<Span>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExportDecl {
    pub names: Vec<String>,
    pub span: Option<Span>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Param {
    pub name: String,
    pub ty: Type,
    pub default: Option<Expr>,
}

impl Param {
    pub fn untyped(name: impl Into<String>) -> Param {
        Param {
            name: name.into(),
            ty: Type::Any,
            default: None,
        }
    }
}

// ── Statements ──

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum VarKind {
    Const,
    Let,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum Stmt {
    Block(Vec<Stmt>),
    VarDecl(VarDeclStmt),
    Expr(Expr),
    Return(Option<Expr>),
    If(IfStmt),
    While(WhileStmt),
    DoWhile(DoWhileStmt),
    For(ForStmt),
    ForOf(ForOfStmt),
    ForIn(ForInStmt),
    Break,
    Continue,
    Throw(Expr),
    TryCatch(TryCatchStmt),
    Switch(SwitchStmt),
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VarDeclStmt {
    pub kind: VarKind,
    pub name: String,
    pub ty: Type,
    pub init: Option<Expr>,
    pub span: Option<Span>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IfStmt {
    pub cond: Expr,
    pub then_block: Vec<Stmt>,
    pub else_block: Option<Vec<Stmt>>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WhileStmt {
    pub cond: Expr,
    pub body: Vec<Stmt>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DoWhileStmt {
    pub body: Vec<Stmt>,
    pub cond: Expr,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ForStmt {
    pub init: Option<Box<Stmt>>,
    pub cond: Option<Expr>,
    pub update: Option<Expr>,
    pub body: Vec<Stmt>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ForOfStmt {
    pub var: String,
    pub iterable: Expr,
    pub body: Vec<Stmt>,
}

/// `for (const k in obj)`: iteration over keys, kept distinct from `ForOf`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ForInStmt {
    pub var: String,
    pub object: Expr,
    pub body: Vec<Stmt>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TryCatchStmt {
    pub try_block: Vec<Stmt>,
    pub catches: Vec<CatchClause>,
    pub finally: Option<Vec<Stmt>>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CatchClause {
    pub ex_type: Option<String>,
    pub var_name: String,
    pub body: Vec<Stmt>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SwitchStmt {
    pub subject: Expr,
    pub cases: Vec<SwitchCase>,
    pub default: Option<Vec<Stmt>>,
}

/// One `case` arm; several patterns share a body when the source cases fall
/// through to a common block.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SwitchCase {
    pub patterns: Vec<Expr>,
    pub body: Vec<Stmt>,
}

// ── Expressions ──

/// An expression node: discriminant + inferred type + source location.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Expr {
    pub kind: ExprKind,
    pub ty: Type,
    pub span: Option<Span>,
}

impl Expr {
    /// A fresh node with `Any` as its not-yet-inferred type.
    pub fn new(kind: ExprKind) -> Expr {
        Expr {
            kind,
            ty: Type::Any,
            span: None,
        }
    }

    pub fn typed(kind: ExprKind, ty: Type) -> Expr {
        Expr {
            kind,
            ty,
            span: None,
        }
    }

    pub fn with_span(mut self, span: Option<Span>) -> Expr {
        self.span = span;
        self
    }

    /// The discriminant name, used for diagnostics and `UNHANDLED_` sentinels.
    pub fn variant_name(&self) -> &str {
        self.kind.as_ref()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum Literal {
    Int(i64),
    Float(f64),
    Str(String),
    Bool(bool),
    Null,
    BigInt(BigInt),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, AsRefStr)]
pub enum BinaryOp {
    Add,
    Sub,
    Mul,
    Div,
    Mod,
    Eq,
    NotEq,
    StrictEq,
    StrictNotEq,
    Lt,
    LtEq,
    Gt,
    GtEq,
    And,
    Or,
    BitAnd,
    BitOr,
    BitXor,
    Shl,
    /// Sign-propagating right shift (`>>`).
    Shr,
    /// Zero-fill right shift (`>>>`); always `UInt32`-typed.
    UShr,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, AsRefStr)]
pub enum UnaryOp {
    Neg,
    Plus,
    Not,
    BitNot,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, AsRefStr)]
pub enum AssignOp {
    Assign,
    Add,
    Sub,
    Mul,
    Div,
    Mod,
    Shl,
    Shr,
    UShr,
    BitAnd,
    BitOr,
    BitXor,
}

/// Closed set of recognised `Math.*` functions with numeric-only signatures.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, AsRefStr, EnumString)]
pub enum MathFunc {
    Floor,
    Ceil,
    Round,
    Trunc,
    Abs,
    Min,
    Max,
    Sqrt,
    Cbrt,
    Sign,
    Exp,
    Log,
    Log2,
    Log10,
    Sin,
    Cos,
    Tan,
    Asin,
    Acos,
    Atan,
    Atan2,
    Sinh,
    Cosh,
    Tanh,
    Hypot,
    Random,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, AsRefStr)]
pub enum MathConst {
    Pi,
    E,
    Ln2,
    Ln10,
    Log2E,
    Log10E,
    Sqrt2,
    Sqrt1_2,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, AsRefStr)]
pub enum NumberConst {
    MaxSafeInteger,
    MinSafeInteger,
    MaxValue,
    MinValue,
    Epsilon,
    PositiveInfinity,
    NegativeInfinity,
    NaN,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, AsRefStr)]
pub enum ErrorKind {
    Error,
    TypeError,
    RangeError,
    SyntaxError,
    ReferenceError,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, AsRefStr)]
pub enum DebugLevel {
    Log,
    Warn,
    Error,
}

/// A segment of a `StringInterpolation`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum InterpPart {
    Str(String),
    Expr(Expr),
}

/// An `ObjectLit` entry key.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum ObjectKey {
    Ident(String),
    Str(String),
    Int(i64),
}

/// The expression discriminant set. Back-ends switch exhaustively on this
/// enumeration; an arm they cannot map becomes an `UNHANDLED_<variant>`
/// sentinel, never a silent drop.
#[derive(Debug, Clone, Serialize, Deserialize, AsRefStr)]
pub enum ExprKind {
    // Core
    Literal(Literal),
    Ident(String),
    Binary {
        op: BinaryOp,
        left: Box<Expr>,
        right: Box<Expr>,
    },
    Unary {
        op: UnaryOp,
        operand: Box<Expr>,
        prefix: bool,
    },
    Assign {
        op: AssignOp,
        target: Box<Expr>,
        value: Box<Expr>,
    },
    Conditional {
        cond: Box<Expr>,
        then_val: Box<Expr>,
        else_val: Box<Expr>,
    },
    Sequence(Vec<Expr>),
    Paren(Box<Expr>),

    // Access
    Member {
        target: Box<Expr>,
        name: String,
        optional: bool,
    },
    Element {
        target: Box<Expr>,
        index: Box<Expr>,
    },
    ThisProperty(String),
    ThisMethodCall {
        name: String,
        args: Vec<Expr>,
    },
    ParentConstructorCall(Vec<Expr>),
    ParentMethodCall {
        name: String,
        args: Vec<Expr>,
    },
    Super,
    This,
    Spread(Box<Expr>),

    // Calls
    Call {
        callee: Box<Expr>,
        args: Vec<Expr>,
    },
    New {
        class_name: String,
        args: Vec<Expr>,
    },
    Lambda {
        params: Vec<Param>,
        body: Vec<Stmt>,
    },

    // Containers
    ArrayLit(Vec<Expr>),
    ArrayCreation {
        size: Box<Expr>,
        init: Option<Box<Expr>>,
    },
    TypedArrayCreation {
        width: Width,
        size: Box<Expr>,
    },
    ObjectLit(Vec<(ObjectKey, Expr)>),
    MapCreation,
    SetCreation,
    ArrayLength(Box<Expr>),
    ArrayAppend {
        target: Box<Expr>,
        values: Vec<Expr>,
    },
    ArrayPop(Box<Expr>),
    ArrayShift(Box<Expr>),
    ArrayUnshift {
        target: Box<Expr>,
        values: Vec<Expr>,
    },
    ArraySplice {
        target: Box<Expr>,
        start: Box<Expr>,
        delete_count: Option<Box<Expr>>,
        items: Vec<Expr>,
    },
    ArraySlice {
        target: Box<Expr>,
        start: Option<Box<Expr>>,
        end: Option<Box<Expr>>,
    },
    ArrayFill {
        target: Box<Expr>,
        value: Box<Expr>,
    },
    /// `arr.length = 0` and equivalent idioms.
    ArrayClear(Box<Expr>),
    ArrayConcat {
        target: Box<Expr>,
        others: Vec<Expr>,
    },
    ArrayReverse(Box<Expr>),
    ArrayJoin {
        target: Box<Expr>,
        sep: Option<Box<Expr>>,
    },
    ArrayIndexOf {
        target: Box<Expr>,
        needle: Box<Expr>,
    },
    ArrayIncludes {
        target: Box<Expr>,
        needle: Box<Expr>,
    },
    ArrayMap {
        target: Box<Expr>,
        callback: Box<Expr>,
    },
    ArrayFilter {
        target: Box<Expr>,
        callback: Box<Expr>,
    },
    ArrayForEach {
        target: Box<Expr>,
        callback: Box<Expr>,
    },
    ArrayFind {
        target: Box<Expr>,
        callback: Box<Expr>,
    },
    ArrayFindIndex {
        target: Box<Expr>,
        callback: Box<Expr>,
    },
    ArrayReduce {
        target: Box<Expr>,
        callback: Box<Expr>,
        init: Option<Box<Expr>>,
    },
    ArrayEvery {
        target: Box<Expr>,
        callback: Box<Expr>,
    },
    ArraySome {
        target: Box<Expr>,
        callback: Box<Expr>,
    },
    ArraySort {
        target: Box<Expr>,
        comparator: Option<Box<Expr>>,
    },
    ArrayFrom(Box<Expr>),
    ArrayXor {
        a: Box<Expr>,
        b: Box<Expr>,
    },
    CopyArray(Box<Expr>),

    // Numeric / bit
    RotateLeft {
        value: Box<Expr>,
        amount: Box<Expr>,
        width: Width,
    },
    RotateRight {
        value: Box<Expr>,
        amount: Box<Expr>,
        width: Width,
    },
    PackBytes {
        bytes: Vec<Expr>,
        width: Width,
        endian: Endian,
    },
    UnpackBytes {
        value: Box<Expr>,
        width: Width,
        endian: Endian,
    },
    Cast {
        value: Box<Expr>,
        target_ty: Type,
    },
    BigIntCast(Box<Expr>),
    MathCall {
        func: MathFunc,
        args: Vec<Expr>,
    },
    MathConstant(MathConst),
    NumberConstant(NumberConst),
    Power {
        base: Box<Expr>,
        exp: Box<Expr>,
    },
    IsInteger(Box<Expr>),
    IsNaN(Box<Expr>),
    IsFinite(Box<Expr>),

    // Constant-time compare
    SecureCompare {
        a: Box<Expr>,
        b: Box<Expr>,
    },

    // Strings
    StringInterpolation(Vec<InterpPart>),
    StringSplit {
        target: Box<Expr>,
        sep: Box<Expr>,
    },
    StringTrim(Box<Expr>),
    StringRepeat {
        target: Box<Expr>,
        count: Box<Expr>,
    },
    StringReplace {
        target: Box<Expr>,
        from: Box<Expr>,
        to: Box<Expr>,
        all: bool,
    },
    StringSlice {
        target: Box<Expr>,
        start: Option<Box<Expr>>,
        end: Option<Box<Expr>>,
    },
    StringSubstring {
        target: Box<Expr>,
        start: Box<Expr>,
        end: Option<Box<Expr>>,
    },
    StringCharCodeAt {
        target: Box<Expr>,
        index: Box<Expr>,
    },
    StringCharAt {
        target: Box<Expr>,
        index: Box<Expr>,
    },
    StringIndexOf {
        target: Box<Expr>,
        needle: Box<Expr>,
    },
    StringIncludes {
        target: Box<Expr>,
        needle: Box<Expr>,
    },
    StringStartsWith {
        target: Box<Expr>,
        prefix: Box<Expr>,
    },
    StringEndsWith {
        target: Box<Expr>,
        suffix: Box<Expr>,
    },
    StringToLower(Box<Expr>),
    StringToUpper(Box<Expr>),
    StringConcat(Vec<Expr>),
    StringFromCharCodes(Vec<Expr>),
    StringToBytes(Box<Expr>),
    BytesToString(Box<Expr>),

    // Hex codec
    HexDecode(Box<Expr>),
    HexEncode(Box<Expr>),

    // Object / JSON
    ObjectKeys(Box<Expr>),
    ObjectValues(Box<Expr>),
    ObjectEntries(Box<Expr>),
    ObjectFreeze(Box<Expr>),
    JsonParse(Box<Expr>),
    JsonStringify {
        value: Box<Expr>,
        indent: Option<Box<Expr>>,
    },

    // Reflection
    TypeOf(Box<Expr>),
    InstanceOf {
        value: Box<Expr>,
        class_name: String,
    },
    IsArray(Box<Expr>),

    // Errors
    ErrorCreation {
        kind: ErrorKind,
        message: Option<Box<Expr>>,
    },

    // Async / generators
    Await(Box<Expr>),
    Yield {
        value: Option<Box<Expr>>,
        delegate: bool,
    },

    // Buffers and views
    DataViewCreation(Box<Expr>),
    DataViewRead {
        view: Box<Expr>,
        offset: Box<Expr>,
        width: Width,
        endian: Endian,
    },
    DataViewWrite {
        view: Box<Expr>,
        offset: Box<Expr>,
        value: Box<Expr>,
        width: Width,
        endian: Endian,
    },
    BufferCreation {
        size: Box<Expr>,
    },
    TypedArraySet {
        target: Box<Expr>,
        source: Box<Expr>,
        offset: Option<Box<Expr>>,
    },
    TypedArraySubarray {
        target: Box<Expr>,
        start: Option<Box<Expr>>,
        end: Option<Box<Expr>>,
    },

    // Debug output
    DebugOutput {
        level: DebugLevel,
        args: Vec<Expr>,
    },

    /// Placeholder for a source construct the lowerer could not map without
    /// changing behaviour; carries the diagnostic text.
    Placeholder(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    fn int(n: i64) -> Expr {
        Expr::typed(ExprKind::Literal(Literal::Int(n)), Type::Int)
    }

    #[test]
    fn test_new_expr_defaults_to_any() {
        let e = Expr::new(ExprKind::Ident("x".into()));
        assert_eq!(e.ty, Type::Any);
        assert!(e.span.is_none());
    }

    #[test]
    fn test_variant_name_matches_discriminant() {
        let e = Expr::new(ExprKind::RotateLeft {
            value: Box::new(int(1)),
            amount: Box::new(int(7)),
            width: Width::W32,
        });
        assert_eq!(e.variant_name(), "RotateLeft");
        let h = Expr::new(ExprKind::HexDecode(Box::new(int(0))));
        assert_eq!(h.variant_name(), "HexDecode");
    }

    #[test]
    fn test_il_round_trips_through_serde() {
        let module = Module {
            name: "m".into(),
            fingerprint: "sha256:0".into(),
            decls: vec![Decl::Constant(ConstantDecl {
                name: "K".into(),
                value: Expr::typed(
                    ExprKind::ArrayLit(vec![int(1), int(2)]),
                    Type::Array(Box::new(Type::Int)),
                ),
                span: Some(Span::new(3, 1)),
            })],
        };
        let json = serde_json::to_string(&module).unwrap();
        let back: Module = serde_json::from_str(&json).unwrap();
        assert_eq!(back.decls.len(), 1);
        assert_eq!(back.name, "m");
    }

    #[test]
    fn test_reuse_requires_clone() {
        // Ownership is strict; the only way to share is to clone.
        let leaf = int(5);
        let twice = Expr::new(ExprKind::Binary {
            op: BinaryOp::Add,
            left: Box::new(leaf.clone()),
            right: Box::new(leaf),
        });
        assert_eq!(twice.variant_name(), "Binary");
    }
}
