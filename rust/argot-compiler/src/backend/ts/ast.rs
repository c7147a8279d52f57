//! The TypeScript target AST.
//!
//! Consumed only by the TypeScript emitter. Type annotations are carried as
//! already-rendered strings; the transformer maps IL lattice tags onto them.

#[derive(Debug, Clone)]
pub struct TsProgram {
    pub decls: Vec<TsStmt>,
}

#[derive(Debug, Clone)]
pub struct TsParam {
    pub name: String,
    pub ty: String,
    pub default: Option<TsExpr>,
}

#[derive(Debug, Clone)]
pub struct TsField {
    pub name: String,
    pub ty: String,
    pub is_static: bool,
    pub init: Option<TsExpr>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TsMethodKind {
    Constructor,
    Normal,
    Getter,
    Setter,
}

#[derive(Debug, Clone)]
pub struct TsMethod {
    pub name: String,
    pub kind: TsMethodKind,
    pub is_static: bool,
    pub params: Vec<TsParam>,
    pub ret: String,
    pub body: Vec<TsStmt>,
}

#[derive(Debug, Clone)]
pub enum TsStmt {
    Class {
        name: String,
        extends: Option<String>,
        fields: Vec<TsField>,
        methods: Vec<TsMethod>,
    },
    Function {
        name: String,
        params: Vec<TsParam>,
        ret: String,
        body: Vec<TsStmt>,
    },
    Const {
        name: String,
        ty: Option<String>,
        value: TsExpr,
    },
    Let {
        name: String,
        ty: Option<String>,
        value: Option<TsExpr>,
    },
    Expr(TsExpr),
    Return(Option<TsExpr>),
    If {
        cond: TsExpr,
        then_body: Vec<TsStmt>,
        else_body: Option<Vec<TsStmt>>,
    },
    While {
        cond: TsExpr,
        body: Vec<TsStmt>,
    },
    DoWhile {
        body: Vec<TsStmt>,
        cond: TsExpr,
    },
    For {
        init: Option<Box<TsStmt>>,
        cond: Option<TsExpr>,
        update: Option<TsExpr>,
        body: Vec<TsStmt>,
    },
    ForOf {
        var: String,
        iterable: TsExpr,
        body: Vec<TsStmt>,
        /// `for ... in` when true.
        in_keys: bool,
    },
    Break,
    Continue,
    Throw(TsExpr),
    TryCatch {
        body: Vec<TsStmt>,
        catch_var: Option<String>,
        catch_body: Option<Vec<TsStmt>>,
        finally_body: Option<Vec<TsStmt>>,
    },
    Switch {
        subject: TsExpr,
        cases: Vec<(Vec<TsExpr>, Vec<TsStmt>)>,
        default: Option<Vec<TsStmt>>,
    },
    Comment(String),
    Blank,
}

#[derive(Debug, Clone)]
pub enum TsExpr {
    /// Pre-formatted numeric literal (`7`, `0.5`, `0xFF`).
    Num(String),
    Str(String),
    Bool(bool),
    Null,
    /// `123n`.
    BigIntLit(String),
    Ident(String),
    This,
    SuperCall(Vec<TsExpr>),
    SuperMethodCall {
        name: String,
        args: Vec<TsExpr>,
    },
    Template(Vec<TsTemplatePart>),
    Array(Vec<TsExpr>),
    Object(Vec<(String, TsExpr)>),
    Binary {
        op: &'static str,
        left: Box<TsExpr>,
        right: Box<TsExpr>,
    },
    Unary {
        op: &'static str,
        operand: Box<TsExpr>,
        prefix: bool,
    },
    Assign {
        op: &'static str,
        target: Box<TsExpr>,
        value: Box<TsExpr>,
    },
    Ternary {
        cond: Box<TsExpr>,
        then_val: Box<TsExpr>,
        else_val: Box<TsExpr>,
    },
    Call {
        callee: Box<TsExpr>,
        args: Vec<TsExpr>,
    },
    New {
        callee: String,
        args: Vec<TsExpr>,
    },
    Member {
        recv: Box<TsExpr>,
        name: String,
        optional: bool,
    },
    Index {
        recv: Box<TsExpr>,
        index: Box<TsExpr>,
    },
    Arrow {
        params: Vec<TsParam>,
        body: TsArrowBody,
    },
    Paren(Box<TsExpr>),
    /// Comma expression `(a, b)`.
    Comma(Vec<TsExpr>),
    Spread(Box<TsExpr>),
    Await(Box<TsExpr>),
    Yield {
        value: Option<Box<TsExpr>>,
        delegate: bool,
    },
    TypeOf(Box<TsExpr>),
    InstanceOf {
        value: Box<TsExpr>,
        class_name: String,
    },
    /// `expr as T`.
    As {
        value: Box<TsExpr>,
        ty: String,
    },
}

#[derive(Debug, Clone)]
pub enum TsArrowBody {
    Expr(Box<TsExpr>),
    Block(Vec<TsStmt>),
}

#[derive(Debug, Clone)]
pub enum TsTemplatePart {
    Str(String),
    Expr(TsExpr),
}

impl TsExpr {
    pub fn call(callee: TsExpr, args: Vec<TsExpr>) -> TsExpr {
        TsExpr::Call {
            callee: Box::new(callee),
            args,
        }
    }

    pub fn free_call(name: impl Into<String>, args: Vec<TsExpr>) -> TsExpr {
        TsExpr::call(TsExpr::Ident(name.into()), args)
    }

    pub fn method(recv: TsExpr, name: impl Into<String>, args: Vec<TsExpr>) -> TsExpr {
        TsExpr::call(
            TsExpr::Member {
                recv: Box::new(recv),
                name: name.into(),
                optional: false,
            },
            args,
        )
    }

    pub fn member(recv: TsExpr, name: impl Into<String>) -> TsExpr {
        TsExpr::Member {
            recv: Box::new(recv),
            name: name.into(),
            optional: false,
        }
    }

    pub fn binary(op: &'static str, left: TsExpr, right: TsExpr) -> TsExpr {
        TsExpr::Binary {
            op,
            left: Box::new(left),
            right: Box::new(right),
        }
    }

    pub fn paren(inner: TsExpr) -> TsExpr {
        TsExpr::Paren(Box::new(inner))
    }

    pub fn int(n: i64) -> TsExpr {
        TsExpr::Num(n.to_string())
    }
}
