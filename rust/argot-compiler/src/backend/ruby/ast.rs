//! The Ruby target AST.
//!
//! Variants mirror Ruby surface syntax closely enough for the emitter to
//! pretty-print without re-deriving structure. Nothing outside the Ruby
//! emitter consumes these nodes.

#[derive(Debug, Clone)]
pub struct RubyProgram {
    pub requires: Vec<String>,
    pub decls: Vec<RubyStmt>,
}

#[derive(Debug, Clone)]
pub struct RubyParam {
    pub name: String,
    pub default: Option<RubyExpr>,
}

#[derive(Debug, Clone)]
pub enum RubyStmt {
    Class {
        name: String,
        superclass: Option<String>,
        /// `attr_accessor :a, :b` emitted once at class scope.
        attr_accessors: Vec<String>,
        body: Vec<RubyStmt>,
    },
    Def {
        name: String,
        /// `def self.name` when true.
        on_self: bool,
        params: Vec<RubyParam>,
        body: Vec<RubyStmt>,
    },
    /// Module/class-level constant assignment (SCREAMING_SNAKE_CASE names).
    ConstAssign {
        name: String,
        value: RubyExpr,
    },
    Assign {
        target: RubyExpr,
        /// Compound spelling (`+=`, `<<=`, ...); plain `=` when `None`.
        op: Option<&'static str>,
        value: RubyExpr,
    },
    Expr(RubyExpr),
    Return(Option<RubyExpr>),
    If {
        cond: RubyExpr,
        then_body: Vec<RubyStmt>,
        elsifs: Vec<(RubyExpr, Vec<RubyStmt>)>,
        else_body: Option<Vec<RubyStmt>>,
    },
    While {
        cond: RubyExpr,
        body: Vec<RubyStmt>,
    },
    /// `begin ... end while cond` (post-tested loop).
    BeginWhile {
        body: Vec<RubyStmt>,
        cond: RubyExpr,
    },
    /// `iterable.each do |var| ... end`.
    Each {
        iterable: RubyExpr,
        var: String,
        body: Vec<RubyStmt>,
        /// `each_key` for key iteration.
        method: &'static str,
    },
    Break,
    Next,
    Raise {
        /// Exception class (`TypeError`), absent for a bare value raise.
        class: Option<String>,
        value: Option<RubyExpr>,
    },
    BeginRescue {
        body: Vec<RubyStmt>,
        rescues: Vec<RubyRescue>,
        ensure_body: Option<Vec<RubyStmt>>,
    },
    Case {
        subject: RubyExpr,
        whens: Vec<(Vec<RubyExpr>, Vec<RubyStmt>)>,
        else_body: Option<Vec<RubyStmt>>,
    },
    Comment(String),
    Blank,
}

#[derive(Debug, Clone)]
pub struct RubyRescue {
    pub class: String,
    pub var: String,
    pub body: Vec<RubyStmt>,
}

#[derive(Debug, Clone)]
pub enum RubyExpr {
    Int(i64),
    /// Big or formatted integers kept as source text (`0xFFFFFFFF`).
    RawInt(String),
    Float(f64),
    Str(String),
    Symbol(String),
    Bool(bool),
    Nil,
    /// Local variable or bare method call without arguments.
    Ident(String),
    /// `@name`.
    IVar(String),
    /// Constant reference (`TypeError`, `Math::PI`).
    Const(String),
    SelfRef,
    /// `"a#{b}c"`.
    Interp(Vec<RubyInterpPart>),
    Array(Vec<RubyExpr>),
    Hash(Vec<(RubyExpr, RubyExpr)>),
    Binary {
        op: &'static str,
        left: Box<RubyExpr>,
        right: Box<RubyExpr>,
    },
    Unary {
        op: &'static str,
        operand: Box<RubyExpr>,
    },
    Ternary {
        cond: Box<RubyExpr>,
        then_val: Box<RubyExpr>,
        else_val: Box<RubyExpr>,
    },
    /// `recv.name(args) { |params| body }`; receiver-less for helper and
    /// local calls.
    MethodCall {
        recv: Option<Box<RubyExpr>>,
        name: String,
        args: Vec<RubyExpr>,
        block: Option<RubyBlock>,
    },
    Index {
        recv: Box<RubyExpr>,
        index: Box<RubyExpr>,
    },
    /// `start...end` (exclusive) or `start..end`.
    Range {
        start: Box<RubyExpr>,
        end: Box<RubyExpr>,
        exclusive: bool,
    },
    /// Open-ended index range `start..`.
    RangeFrom(Box<RubyExpr>),
    Lambda {
        params: Vec<RubyParam>,
        body: Vec<RubyStmt>,
    },
    /// Assignment in expression position.
    AssignExpr {
        target: Box<RubyExpr>,
        value: Box<RubyExpr>,
    },
    Super(Vec<RubyExpr>),
    Paren(Box<RubyExpr>),
    /// Splat argument `*expr`.
    Splat(Box<RubyExpr>),
    /// `(a; b; c)` — evaluates left to right, yields the last value.
    Seq(Vec<RubyExpr>),
}

#[derive(Debug, Clone)]
pub enum RubyInterpPart {
    Str(String),
    Expr(RubyExpr),
}

/// An inline block `{ |params| expr }` or a `do |params| ... end` body.
#[derive(Debug, Clone)]
pub struct RubyBlock {
    pub params: Vec<String>,
    pub body: Vec<RubyStmt>,
}

impl RubyExpr {
    pub fn call(recv: RubyExpr, name: impl Into<String>, args: Vec<RubyExpr>) -> RubyExpr {
        RubyExpr::MethodCall {
            recv: Some(Box::new(recv)),
            name: name.into(),
            args,
            block: None,
        }
    }

    pub fn free_call(name: impl Into<String>, args: Vec<RubyExpr>) -> RubyExpr {
        RubyExpr::MethodCall {
            recv: None,
            name: name.into(),
            args,
            block: None,
        }
    }

    pub fn binary(op: &'static str, left: RubyExpr, right: RubyExpr) -> RubyExpr {
        RubyExpr::Binary {
            op,
            left: Box::new(left),
            right: Box::new(right),
        }
    }

    pub fn paren(inner: RubyExpr) -> RubyExpr {
        RubyExpr::Paren(Box::new(inner))
    }
}
