use std::fmt;
use internment::Intern;
use crate::util::with_stack;
use super::{
    heap::{Heap, HeapRef, HeapValue},
    Builtin,
};

pub type Symbol = Intern<String>;

pub fn symbol(name: &str) -> Symbol {
    Intern::new(name.to_string())
}

#[derive(Copy, Clone, Debug, PartialEq)]
pub enum Number {
    Int(i64),
    Dec(f64),
}

impl Number {
    pub fn as_f64(self) -> f64 {
        match self {
            Number::Int(x) => x as f64,
            Number::Dec(x) => x,
        }
    }

    pub fn is_dec(self) -> bool {
        match self {
            Number::Dec(_) => true,
            Number::Int(_) => false,
        }
    }

    pub fn is_zero(self) -> bool {
        match self {
            Number::Int(x) => x == 0,
            Number::Dec(x) => x.abs() < 1e-8,
        }
    }
}

pub enum Func {
    Builtin {
        name: Symbol,
        f: Builtin,
    },
    User {
        name: Option<Symbol>,
        params: HeapRef,
        body: HeapRef,
    },
}

impl fmt::Debug for Func {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Func::Builtin { name, .. } => write!(f, "Builtin({})", name.as_str()),
            Func::User { name: Some(name), params, body } =>
                write!(f, "User({}, {:?}, {:?})", name.as_str(), params, body),
            Func::User { name: None, params, body } =>
                write!(f, "User(<lambda>, {:?}, {:?})", params, body),
        }
    }
}

#[derive(Debug)]
pub enum Value {
    Number(Number),
    Symbol(Symbol),
    Str(String),
    Bool(bool),
    Unit,
    Error(String),
    List(Vec<HeapRef>),
    Func(Func),
}

impl Value {
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Number(Number::Int(_)) => "integer",
            Value::Number(Number::Dec(_)) => "decimal",
            Value::Symbol(_) => "symbol",
            Value::Str(_) => "string",
            Value::Bool(_) => "boolean",
            Value::Unit => "unit",
            Value::Error(_) => "error",
            Value::List(_) => "list",
            Value::Func(Func::Builtin { .. }) => "builtin",
            Value::Func(Func::User { .. }) => "function",
        }
    }

    /// Only `#f` is false.
    pub fn truth(&self) -> bool {
        match self {
            Value::Bool(x) => *x,
            _ => true,
        }
    }

    pub fn as_error(&self) -> Option<&str> {
        match self {
            Value::Error(msg) => Some(msg),
            _ => None,
        }
    }

    pub fn as_symbol(&self) -> Option<Symbol> {
        match self {
            Value::Symbol(s) => Some(*s),
            _ => None,
        }
    }
}

impl HeapValue for Value {
    type ChildIter = std::vec::IntoIter<HeapRef>;

    fn children(&self) -> Self::ChildIter {
        match self {
            Value::List(items) => items.clone().into_iter(),
            Value::Func(Func::User { params, body, .. }) => vec![*params, *body].into_iter(),
            _ => Vec::new().into_iter(),
        }
    }
}

impl Heap<Value> {
    pub fn number(&mut self, n: Number) -> HeapRef {
        self.insert(Value::Number(n))
    }

    pub fn int(&mut self, x: i64) -> HeapRef {
        self.number(Number::Int(x))
    }

    pub fn dec(&mut self, x: f64) -> HeapRef {
        self.number(Number::Dec(x))
    }

    pub fn symbol(&mut self, name: Symbol) -> HeapRef {
        self.insert(Value::Symbol(name))
    }

    pub fn string(&mut self, s: impl Into<String>) -> HeapRef {
        self.insert(Value::Str(s.into()))
    }

    pub fn boolean(&mut self, x: bool) -> HeapRef {
        self.insert(Value::Bool(x))
    }

    pub fn unit(&mut self) -> HeapRef {
        self.insert(Value::Unit)
    }

    pub fn error(&mut self, msg: impl Into<String>) -> HeapRef {
        self.insert(Value::Error(msg.into()))
    }

    pub fn list(&mut self, items: Vec<HeapRef>) -> HeapRef {
        self.insert(Value::List(items))
    }

    pub fn builtin(&mut self, name: Symbol, f: Builtin) -> HeapRef {
        self.insert(Value::Func(Func::Builtin { name, f }))
    }

    pub fn user_function(&mut self, name: Option<Symbol>, params: HeapRef, body: HeapRef) -> HeapRef {
        self.insert(Value::Func(Func::User { name, params, body }))
    }

    /// The elements of a list, or `None` for any other value.
    pub fn items(&self, r: HeapRef) -> Option<&[HeapRef]> {
        match self.get(r) {
            Value::List(items) => Some(items),
            _ => None,
        }
    }

    /// Deep copy. Builtins are shared rather than copied: the new handle points
    /// at the same native procedure.
    pub fn copy(&mut self, r: HeapRef) -> HeapRef {
        with_stack(|| self.copy_inner(r))
    }

    fn copy_inner(&mut self, r: HeapRef) -> HeapRef {
        let value = match self.get(r) {
            Value::Number(n) => Value::Number(*n),
            Value::Symbol(s) => Value::Symbol(*s),
            Value::Str(s) => Value::Str(s.clone()),
            Value::Bool(x) => Value::Bool(*x),
            Value::Unit => Value::Unit,
            Value::Error(msg) => Value::Error(msg.clone()),
            Value::Func(Func::Builtin { name, f }) => Value::Func(Func::Builtin { name: *name, f: *f }),
            Value::List(items) => {
                let items = items.clone();
                let copied = items
                    .into_iter()
                    .map(|item| self.copy(item))
                    .collect();
                Value::List(copied)
            },
            Value::Func(Func::User { name, params, body }) => {
                let (name, params, body) = (*name, *params, *body);
                let params = self.copy(params);
                let body = self.copy(body);
                Value::Func(Func::User { name, params, body })
            },
        };
        self.insert(value)
    }

    /// Structural equality, ignoring handle identity.
    pub fn structural_eq(&self, a: HeapRef, b: HeapRef) -> bool {
        with_stack(|| self.structural_eq_inner(a, b))
    }

    fn structural_eq_inner(&self, a: HeapRef, b: HeapRef) -> bool {
        match (self.get(a), self.get(b)) {
            (Value::Number(Number::Int(x)), Value::Number(Number::Int(y))) => x == y,
            (Value::Number(Number::Dec(x)), Value::Number(Number::Dec(y))) => x == y,
            (Value::Symbol(x), Value::Symbol(y)) => x == y,
            (Value::Str(x), Value::Str(y)) => x == y,
            (Value::Bool(x), Value::Bool(y)) => x == y,
            (Value::Unit, Value::Unit) => true,
            (Value::Error(x), Value::Error(y)) => x == y,
            (Value::List(xs), Value::List(ys)) => xs.len() == ys.len() && xs
                .iter()
                .zip(ys.iter())
                .all(|(x, y)| self.structural_eq(*x, *y)),
            (Value::Func(Func::Builtin { name: x, .. }), Value::Func(Func::Builtin { name: y, .. })) => x == y,
            (
                Value::Func(Func::User { params: params_a, body: body_a, .. }),
                Value::Func(Func::User { params: params_b, body: body_b, .. }),
            ) => self.structural_eq(*params_a, *params_b) && self.structural_eq(*body_a, *body_b),
            _ => false,
        }
    }
}
