use std::fmt;
use crate::util::with_stack;
use super::{
    heap::{Heap, HeapRef},
    value::{Func, Number, Value},
};

/// Decimals always carry a `.` so that printing and reading agree on the kind
/// of number.
pub fn format_dec(x: f64) -> String {
    let s = format!("{:?}", x);
    if s.contains('.') || !x.is_finite() {
        s
    } else if let Some(idx) = s.find('e') {
        format!("{}.0{}", &s[..idx], &s[idx..])
    } else {
        format!("{}.0", s)
    }
}

pub fn format_number(n: Number) -> String {
    match n {
        Number::Int(x) => x.to_string(),
        Number::Dec(x) => format_dec(x),
    }
}

fn write_escaped(f: &mut fmt::Formatter, s: &str) -> fmt::Result {
    write!(f, "\"")?;
    for c in s.chars() {
        match c {
            '"' => write!(f, "\\\"")?,
            '\\' => write!(f, "\\\\")?,
            c => write!(f, "{}", c)?,
        }
    }
    write!(f, "\"")
}

/// Renders a value the way the REPL shows it.
pub struct Printer<'a> {
    heap: &'a Heap<Value>,
    value: HeapRef,
}

impl<'a> Printer<'a> {
    pub fn new(heap: &'a Heap<Value>, value: HeapRef) -> Self {
        Self { heap, value }
    }

    fn at(&self, value: HeapRef) -> Self {
        Self { heap: self.heap, value }
    }

    fn write(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self.heap.get(self.value) {
            Value::Number(n) => write!(f, "{}", format_number(*n)),
            Value::Symbol(s) => write!(f, "{}", s.as_str()),
            Value::Str(s) => write_escaped(f, s),
            Value::Bool(true) => write!(f, "#t"),
            Value::Bool(false) => write!(f, "#f"),
            Value::Unit => Ok(()),
            Value::Error(msg) => write!(f, "Error: {}", msg),
            Value::List(items) => {
                write!(f, "(")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        write!(f, " ")?;
                    }
                    write!(f, "{}", self.at(*item))?;
                }
                write!(f, ")")
            },
            Value::Func(Func::Builtin { name, .. }) => write!(f, "#<builtin {}>", name.as_str()),
            Value::Func(Func::User { name: Some(name), .. }) => write!(f, "#<procedure {}>", name.as_str()),
            Value::Func(Func::User { name: None, .. }) => write!(f, "#<procedure>"),
        }
    }
}

impl<'a> fmt::Display for Printer<'a> {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        with_stack(|| self.write(f))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::walker::value::symbol;

    #[test]
    fn decimals_keep_their_point() {
        assert_eq!(format_dec(3.0), "3.0");
        assert_eq!(format_dec(-0.5), "-0.5");
        assert_eq!(format_dec(1e300), "1.0e300");
        assert_eq!(format_dec(f64::INFINITY), "inf");
    }

    #[test]
    fn print_nested_list() {
        let mut heap: Heap<Value> = Heap::new();
        let a = heap.symbol(symbol("a"));
        let s = heap.string("say \"hi\"");
        let t = heap.boolean(true);
        let d = heap.dec(2.5);
        let inner = heap.list(vec![t, d]);
        let empty = heap.list(Vec::new());
        let list = heap.list(vec![a, s, inner, empty]);
        assert_eq!(
            Printer::new(&heap, list).to_string(),
            r#"(a "say \"hi\"" (#t 2.5) ())"#,
        );
    }

    #[test]
    fn print_unit_and_error() {
        let mut heap: Heap<Value> = Heap::new();
        let unit = heap.unit();
        let err = heap.error("Division by zero!");
        assert_eq!(Printer::new(&heap, unit).to_string(), "");
        assert_eq!(Printer::new(&heap, err).to_string(), "Error: Division by zero!");
    }
}
