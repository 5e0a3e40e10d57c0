//! Semantic actions attached to grammar productions.
//!
//! An [`Action`] stores the value of an [`Expr`] into a [`Variable`]. Variables
//! address a production instance's namespace by right-hand-side position and
//! field name:
//!
//! | form    | position          | meaning                                     |
//! |---------|-------------------|---------------------------------------------|
//! | `$.f`   | [`Variable::RESULT`] | field `f` of the production's result (caller-visible) |
//! | `$3.f`  | `3`               | field `f` of the fourth right-hand-side symbol |
//! | `$@.f`  | [`Variable::LOCAL`]  | production-private scratch field          |
//!
//! Matched terminals bind `text`, `start` and `end` at their position.

use smartstring::alias::String;
use std::fmt;

/// Runtime value produced by actions.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub enum Value {
    #[default]
    Null,
    Bool(bool),
    Int(i64),
    Str(String),
    List(Vec<Value>),
}

impl Value {
    pub fn as_int(&self) -> Option<i64> {
        match self {
            Value::Int(n) => Some(*n),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Str(s) => Some(s.as_str()),
            _ => None,
        }
    }
}

impl From<i64> for Value {
    fn from(n: i64) -> Self {
        Value::Int(n)
    }
}

impl From<i32> for Value {
    fn from(n: i32) -> Self {
        Value::Int(n as i64)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::Str(s.into())
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => write!(f, "null"),
            Value::Bool(b) => write!(f, "{}", b),
            Value::Int(n) => write!(f, "{}", n),
            Value::Str(s) => write!(f, "{:?}", s.as_str()),
            Value::List(items) => {
                write!(f, "[")?;
                for (i, v) in items.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}", v)?;
                }
                write!(f, "]")
            }
        }
    }
}

/// A namespace key: position plus field name.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Variable {
    pub pos: i32,
    pub field: String,
}

impl Variable {
    pub const RESULT: i32 = -1;
    pub const LOCAL: i32 = -2;

    pub fn new(pos: i32, field: &str) -> Self {
        Self {
            pos,
            field: field.into(),
        }
    }

    pub fn result(field: &str) -> Self {
        Self::new(Self::RESULT, field)
    }

    pub fn slot(pos: usize, field: &str) -> Self {
        Self::new(pos as i32, field)
    }

    pub fn local(field: &str) -> Self {
        Self::new(Self::LOCAL, field)
    }

    pub fn is_result(&self) -> bool {
        self.pos == Self::RESULT
    }

    pub fn is_local(&self) -> bool {
        self.pos == Self::LOCAL
    }

    /// Right-hand-side position, if this is a slot variable.
    pub fn slot_index(&self) -> Option<usize> {
        (self.pos >= 0).then_some(self.pos as usize)
    }
}

impl fmt::Display for Variable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.pos {
            Variable::RESULT => write!(f, "$.{}", self.field),
            Variable::LOCAL => write!(f, "$@.{}", self.field),
            n => write!(f, "${}.{}", n, self.field),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Expr {
    Var(Variable),
    Const(Value),
    Call(String, Vec<Expr>),
}

impl Expr {
    pub fn var(v: Variable) -> Self {
        Expr::Var(v)
    }

    pub fn constant(v: impl Into<Value>) -> Self {
        Expr::Const(v.into())
    }

    pub fn call(name: &str, args: impl IntoIterator<Item = Expr>) -> Self {
        Expr::Call(name.into(), args.into_iter().collect())
    }

    /// Visit every variable read by this expression, left to right.
    pub fn for_each_var(&self, f: &mut impl FnMut(&Variable)) {
        match self {
            Expr::Var(v) => f(v),
            Expr::Const(_) => {}
            Expr::Call(_, args) => {
                for a in args {
                    a.for_each_var(f);
                }
            }
        }
    }
}

impl fmt::Display for Expr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Expr::Var(v) => write!(f, "{}", v),
            Expr::Const(v) => write!(f, "{}", v),
            Expr::Call(name, args) => {
                write!(f, "{}(", name)?;
                for (i, a) in args.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}", a)?;
                }
                write!(f, ")")
            }
        }
    }
}

/// `dest = expr`, evaluated when the element it trails has been matched.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Action {
    pub dest: Variable,
    pub expr: Expr,
}

impl Action {
    pub fn new(dest: Variable, expr: Expr) -> Self {
        Self { dest, expr }
    }

    /// Shorthand for `dest = src`.
    pub fn copy(dest: Variable, src: Variable) -> Self {
        Self::new(dest, Expr::Var(src))
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} = {}", self.dest, self.expr)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_forms() {
        let a = Action::new(
            Variable::result("v"),
            Expr::call(
                "mknode",
                [
                    Expr::constant("+"),
                    Expr::var(Variable::slot(0, "v")),
                    Expr::var(Variable::local("t")),
                ],
            ),
        );
        assert_eq!(a.to_string(), r#"$.v = mknode("+", $0.v, $@.t)"#);
    }

    #[test]
    fn variables_are_visited_in_order() {
        let e = Expr::call(
            "f",
            [
                Expr::var(Variable::slot(2, "a")),
                Expr::call("g", [Expr::var(Variable::result("b"))]),
                Expr::constant(1),
            ],
        );
        let mut seen = Vec::new();
        e.for_each_var(&mut |v| seen.push(v.to_string()));
        assert_eq!(seen, ["$2.a", "$.b"]);
    }

    #[test]
    fn slot_classification() {
        assert_eq!(Variable::slot(4, "x").slot_index(), Some(4));
        assert!(Variable::result("x").is_result());
        assert!(Variable::local("x").is_local());
        assert_eq!(Variable::local("x").slot_index(), None);
    }

    #[test]
    fn value_display() {
        let v = Value::List(vec![Value::Int(1), "a".into(), Value::Null, true.into()]);
        assert_eq!(v.to_string(), r#"[1, "a", null, true]"#);
    }
}
