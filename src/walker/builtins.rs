use std::{convert::TryFrom, fs};
use tracing::debug;
use crate::parse;
use super::{
    env::ScopeId,
    heap::HeapRef,
    value::{symbol, Func, Number, Symbol, Value},
    Builtin, ExecError, Machine,
};

const EPSILON: f64 = 1e-9;

pub(super) fn install(m: &mut Machine) {
    let table: &[(&str, Builtin)] = &[
        ("+", arithmetic),
        ("-", arithmetic),
        ("*", arithmetic),
        ("/", arithmetic),
        ("^", arithmetic),
        ("%", modulo),
        ("=", compare),
        ("<", compare),
        (">", compare),
        ("<=", compare),
        (">=", compare),
        ("min", extremum),
        ("max", extremum),
        ("and", and),
        ("or", or),
        ("not", not),
        ("car", car),
        ("cdr", cdr),
        ("cons", cons),
        ("list", list),
        ("null?", is_null),
        ("pair?", is_pair),
        ("number?", is_number),
        ("string?", is_string),
        ("string", string),
        ("string-length", string_length),
        ("string-append", string_append),
        ("string-copy", string_copy),
        ("eq?", eq),
        ("eval", eval),
        ("quote", quote),
        ("define", define),
        ("lambda", lambda),
        ("if", if_),
        ("cond", cond),
        ("load", load),
        ("dump", dump),
        ("quit", quit),
    ];

    let global = m.env.global();
    for (name, f) in table {
        let name = symbol(name);
        let r = m.heap.builtin(name, *f);
        m.heap.pin(r);
        m.env.insert(global, name, r);
    }
}

fn arity(args: &[HeapRef], n: usize, msg: &'static str) -> Result<(), ExecError> {
    if args.len() == n {
        Ok(())
    } else {
        Err(ExecError::WrongNumberOfArgs(msg))
    }
}

fn number(m: &mut Machine, scope: ScopeId, arg: HeapRef, msg: &'static str) -> Result<Number, ExecError> {
    let r = m.operand(scope, arg)?;
    match m.heap.get(r) {
        Value::Number(n) => Ok(*n),
        _ => Err(ExecError::InvalidOperation(msg)),
    }
}

fn string_operand(m: &mut Machine, scope: ScopeId, arg: HeapRef, msg: &'static str) -> Result<String, ExecError> {
    let r = m.operand(scope, arg)?;
    match m.heap.get(r) {
        Value::Str(s) => Ok(s.clone()),
        _ => Err(ExecError::InvalidOperation(msg)),
    }
}

fn list_operand(m: &mut Machine, scope: ScopeId, arg: HeapRef, msg: &'static str) -> Result<Vec<HeapRef>, ExecError> {
    let r = m.operand(scope, arg)?;
    match m.heap.get(r) {
        Value::List(items) => Ok(items.clone()),
        _ => Err(ExecError::InvalidOperation(msg)),
    }
}

// Integer arithmetic is exact until it overflows, at which point it falls back
// to floating point.
fn combine(a: Number, b: Number, int: fn(i64, i64) -> Option<i64>, dec: fn(f64, f64) -> f64) -> Number {
    match (a, b) {
        (Number::Int(x), Number::Int(y)) => int(x, y)
            .map(Number::Int)
            .unwrap_or_else(|| Number::Dec(dec(x as f64, y as f64))),
        _ => Number::Dec(dec(a.as_f64(), b.as_f64())),
    }
}

fn negate(n: Number) -> Number {
    match n {
        Number::Int(x) => x
            .checked_neg()
            .map(Number::Int)
            .unwrap_or_else(|| Number::Dec(-(x as f64))),
        Number::Dec(x) => Number::Dec(-x),
    }
}

fn divide(a: Number, b: Number) -> Result<Number, ExecError> {
    if b.is_zero() {
        return Err(ExecError::DivisionByZero);
    }
    Ok(match (a, b) {
        (Number::Int(x), Number::Int(y)) if x.checked_rem(y) == Some(0) => x
            .checked_div(y)
            .map(Number::Int)
            .unwrap_or_else(|| Number::Dec(x as f64 / y as f64)),
        _ => Number::Dec(a.as_f64() / b.as_f64()),
    })
}

/// Integer powers stay integers. A negative exponent truncates toward zero,
/// so only a base of 1 or -1 survives it.
fn power(a: Number, b: Number) -> Result<Number, ExecError> {
    Ok(match (a, b) {
        (Number::Int(0), Number::Int(y)) if y < 0 => return Err(ExecError::DivisionByZero),
        (Number::Int(x), Number::Int(y)) if y < 0 => match x {
            1 => Number::Int(1),
            -1 => Number::Int(if y % 2 == 0 { 1 } else { -1 }),
            _ => Number::Int(0),
        },
        (Number::Int(x), Number::Int(y)) => u32::try_from(y)
            .ok()
            .and_then(|y| x.checked_pow(y))
            .map(Number::Int)
            .unwrap_or_else(|| Number::Dec((x as f64).powf(y as f64))),
        _ => Number::Dec(a.as_f64().powf(b.as_f64())),
    })
}

/// Decimals that overflow or lose meaning become errors, since `inf` and
/// `nan` would read back as symbols.
fn finite(n: Number) -> Result<Number, ExecError> {
    match n {
        Number::Dec(x) if !x.is_finite() => Err(ExecError::NotFinite),
        n => Ok(n),
    }
}

fn arithmetic(m: &mut Machine, scope: ScopeId, args: &[HeapRef], op: Symbol) -> Result<HeapRef, ExecError> {
    let op = op.as_str();
    let (first, rest) = match args.split_first() {
        Some(split) => split,
        None => return match op {
            "+" => Ok(m.heap.int(0)),
            "*" => Ok(m.heap.int(1)),
            _ => Err(ExecError::WrongNumberOfArgs("At least one parameter expected.")),
        },
    };

    let mut acc = number(m, scope, *first, "Expected number!")?;
    if rest.is_empty() && op == "-" {
        return Ok(m.heap.number(negate(acc)));
    }

    for arg in rest {
        let n = number(m, scope, *arg, "Expected number!")?;
        acc = match op {
            "+" => combine(acc, n, i64::checked_add, |x, y| x + y),
            "-" => combine(acc, n, i64::checked_sub, |x, y| x - y),
            "*" => combine(acc, n, i64::checked_mul, |x, y| x * y),
            "/" => divide(acc, n)?,
            "^" => power(acc, n)?,
            _ => return Err(ExecError::Unimplemented),
        };
        acc = finite(acc)?;
    }
    Ok(m.heap.number(acc))
}

fn modulo(m: &mut Machine, scope: ScopeId, args: &[HeapRef], _: Symbol) -> Result<HeapRef, ExecError> {
    arity(args, 2, "Modulo takes exactly two parameters.")?;
    let dividend = number(m, scope, args[0], "The dividend must be an integer")?;
    let divisor = number(m, scope, args[1], "The divisor must be an integer")?;
    match (dividend, divisor) {
        (Number::Int(_), Number::Int(0)) => Err(ExecError::DivisionByZero),
        (Number::Int(x), Number::Int(y)) => Ok(m.heap.int(x.checked_rem(y).unwrap_or(0))),
        _ => Err(ExecError::NonIntegerModulo),
    }
}

fn compare(m: &mut Machine, scope: ScopeId, args: &[HeapRef], op: Symbol) -> Result<HeapRef, ExecError> {
    arity(args, 2, "Just two parameters expected.")?;
    let a = number(m, scope, args[0], "Number expected.")?.as_f64();
    let b = number(m, scope, args[1], "Number expected.")?.as_f64();
    let close = (a - b).abs() < EPSILON;
    let result = match op.as_str() {
        "=" => close,
        "<" => a < b,
        ">" => a > b,
        "<=" => a < b || close,
        ">=" => a > b || close,
        _ => return Err(ExecError::Unimplemented),
    };
    Ok(m.heap.boolean(result))
}

fn extremum(m: &mut Machine, scope: ScopeId, args: &[HeapRef], op: Symbol) -> Result<HeapRef, ExecError> {
    let (first, rest) = args
        .split_first()
        .ok_or(ExecError::WrongNumberOfArgs("At least one parameter expected."))?;
    let want_min = op.as_str() == "min";

    let mut best = number(m, scope, *first, "Expected number!")?;
    let mut dec = best.is_dec();
    for arg in rest {
        let n = number(m, scope, *arg, "Expected number!")?;
        dec |= n.is_dec();
        let better = if want_min {
            n.as_f64() < best.as_f64()
        } else {
            n.as_f64() > best.as_f64()
        };
        if better {
            best = n;
        }
    }

    if dec {
        best = Number::Dec(best.as_f64());
    }
    Ok(m.heap.number(best))
}

/// `#f` as soon as an operand is `#f`, otherwise the last operand.
fn and(m: &mut Machine, scope: ScopeId, args: &[HeapRef], _: Symbol) -> Result<HeapRef, ExecError> {
    let mut last = None;
    for arg in args {
        let r = m.operand(scope, *arg)?;
        if !m.heap.get(r).truth() {
            return Ok(m.heap.boolean(false));
        }
        last = Some(r);
    }
    match last {
        Some(r) => Ok(r),
        None => Ok(m.heap.boolean(true)),
    }
}

/// The first operand that is not `#f`.
fn or(m: &mut Machine, scope: ScopeId, args: &[HeapRef], _: Symbol) -> Result<HeapRef, ExecError> {
    for arg in args {
        let r = m.operand(scope, *arg)?;
        if m.heap.get(r).truth() {
            return Ok(r);
        }
    }
    Ok(m.heap.boolean(false))
}

fn not(m: &mut Machine, scope: ScopeId, args: &[HeapRef], _: Symbol) -> Result<HeapRef, ExecError> {
    arity(args, 1, "Just one parameter expected.")?;
    let r = m.operand(scope, args[0])?;
    match m.heap.get(r) {
        Value::Bool(x) => {
            let x = *x;
            Ok(m.heap.boolean(!x))
        },
        _ => Err(ExecError::InvalidOperation("Boolean value expected.")),
    }
}

fn car(m: &mut Machine, scope: ScopeId, args: &[HeapRef], _: Symbol) -> Result<HeapRef, ExecError> {
    arity(args, 1, "car expects only one argument")?;
    let items = list_operand(m, scope, args[0], "car is defined only for non-empty lists.")?;
    items
        .first()
        .copied()
        .ok_or(ExecError::InvalidOperation("car is defined only for non-empty lists."))
}

fn cdr(m: &mut Machine, scope: ScopeId, args: &[HeapRef], _: Symbol) -> Result<HeapRef, ExecError> {
    arity(args, 1, "cdr expects only one argument")?;
    let items = list_operand(m, scope, args[0], "cdr is defined only for non-empty lists.")?;
    match items.split_first() {
        Some((_, rest)) => Ok(m.heap.list(rest.to_vec())),
        None => Err(ExecError::InvalidOperation("cdr is defined only for non-empty lists.")),
    }
}

fn cons(m: &mut Machine, scope: ScopeId, args: &[HeapRef], _: Symbol) -> Result<HeapRef, ExecError> {
    arity(args, 2, "cons expects two arguments")?;
    let tail = list_operand(m, scope, args[1], "The second argument of cons must be a list.")?;
    let head = m.operand(scope, args[0])?;
    let mut items = Vec::with_capacity(tail.len() + 1);
    items.push(head);
    items.extend(tail);
    Ok(m.heap.list(items))
}

fn list(m: &mut Machine, scope: ScopeId, args: &[HeapRef], _: Symbol) -> Result<HeapRef, ExecError> {
    let items = args
        .iter()
        .map(|arg| m.operand(scope, *arg))
        .collect::<Result<Vec<_>, _>>()?;
    Ok(m.heap.list(items))
}

fn test_one(
    m: &mut Machine,
    scope: ScopeId,
    args: &[HeapRef],
    msg: &'static str,
    test: fn(&Value) -> bool,
) -> Result<HeapRef, ExecError> {
    arity(args, 1, msg)?;
    let r = m.operand(scope, args[0])?;
    let result = test(m.heap.get(r));
    Ok(m.heap.boolean(result))
}

fn is_null(m: &mut Machine, scope: ScopeId, args: &[HeapRef], _: Symbol) -> Result<HeapRef, ExecError> {
    test_one(m, scope, args, "null? expects just 1 argument", |v| match v {
        Value::List(items) => items.is_empty(),
        _ => false,
    })
}

fn is_pair(m: &mut Machine, scope: ScopeId, args: &[HeapRef], _: Symbol) -> Result<HeapRef, ExecError> {
    test_one(m, scope, args, "pair? expects just 1 argument", |v| match v {
        Value::List(items) => !items.is_empty(),
        _ => false,
    })
}

fn is_number(m: &mut Machine, scope: ScopeId, args: &[HeapRef], _: Symbol) -> Result<HeapRef, ExecError> {
    test_one(m, scope, args, "number? expects just 1 argument", |v| match v {
        Value::Number(_) => true,
        _ => false,
    })
}

fn is_string(m: &mut Machine, scope: ScopeId, args: &[HeapRef], _: Symbol) -> Result<HeapRef, ExecError> {
    test_one(m, scope, args, "string? expects just 1 argument", |v| match v {
        Value::Str(_) => true,
        _ => false,
    })
}

fn string(m: &mut Machine, scope: ScopeId, args: &[HeapRef], _: Symbol) -> Result<HeapRef, ExecError> {
    arity(args, 1, "String takes just one parameter.")?;
    let r = m.operand(scope, args[0])?;
    match m.heap.get(r) {
        Value::Str(_) => Ok(r),
        _ => Err(ExecError::InvalidOperation("String takes a string type for its parameter.")),
    }
}

fn string_length(m: &mut Machine, scope: ScopeId, args: &[HeapRef], _: Symbol) -> Result<HeapRef, ExecError> {
    arity(args, 1, "string-length takes just one parameter.")?;
    let s = string_operand(m, scope, args[0], "That was not a string.")?;
    Ok(m.heap.int(s.chars().count() as i64))
}

fn string_append(m: &mut Machine, scope: ScopeId, args: &[HeapRef], _: Symbol) -> Result<HeapRef, ExecError> {
    arity(args, 2, "string-append takes just two parameters.")?;
    let a = string_operand(m, scope, args[0], "string-append requires two strings.")?;
    let b = string_operand(m, scope, args[1], "string-append requires two strings.")?;
    Ok(m.heap.string(a + &b))
}

fn string_copy(m: &mut Machine, scope: ScopeId, args: &[HeapRef], _: Symbol) -> Result<HeapRef, ExecError> {
    arity(args, 1, "string-copy takes just one parameter.")?;
    let s = string_operand(m, scope, args[0], "String copy only copies strings.")?;
    Ok(m.heap.string(s))
}

fn eq(m: &mut Machine, scope: ScopeId, args: &[HeapRef], _: Symbol) -> Result<HeapRef, ExecError> {
    arity(args, 2, "eq? expects exactly 2 arguments.")?;
    let a = m.operand(scope, args[0])?;
    let b = m.operand(scope, args[1])?;
    let same = match (m.heap.get(a), m.heap.get(b)) {
        (Value::Bool(x), Value::Bool(y)) => x == y,
        (Value::Symbol(x), Value::Symbol(y)) => x == y,
        (Value::Str(x), Value::Str(y)) => x == y,
        (Value::Number(Number::Int(x)), Value::Number(Number::Int(y))) => x == y,
        (Value::Number(Number::Dec(x)), Value::Number(Number::Dec(y))) => (x - y).abs() < 1e-7,
        (Value::Number(_), Value::Number(_)) => false,
        _ => a == b,
    };
    Ok(m.heap.boolean(same))
}

fn eval(m: &mut Machine, scope: ScopeId, args: &[HeapRef], _: Symbol) -> Result<HeapRef, ExecError> {
    arity(args, 1, "eval expects just 1 argument")?;
    let expr = m.operand(scope, args[0])?;
    m.exec(scope, expr)
}

fn quote(_: &mut Machine, _: ScopeId, args: &[HeapRef], _: Symbol) -> Result<HeapRef, ExecError> {
    arity(args, 1, "quote expects exactly one argument.")?;
    Ok(args[0])
}

/// The datum of a `(quote x)` form.
fn quoted(m: &Machine, expr: HeapRef) -> Option<HeapRef> {
    match m.heap.items(expr)? {
        [head, datum] if m.heap.get(*head).as_symbol().map_or(false, |s| s.as_str() == "quote") => Some(*datum),
        _ => None,
    }
}

fn guard_primitive(m: &Machine, scope: ScopeId, name: Symbol) -> Result<(), ExecError> {
    match m.env.lookup(scope, name) {
        Some((_, r)) => match m.heap.get(r) {
            Value::Func(Func::Builtin { .. }) => Err(ExecError::PrimitiveRedefinition),
            _ => Ok(()),
        },
        None => Ok(()),
    }
}

fn symbols(m: &Machine, items: &[HeapRef]) -> Result<Vec<Symbol>, ExecError> {
    items
        .iter()
        .map(|item| m.heap
            .get(*item)
            .as_symbol()
            .ok_or(ExecError::InvalidOperation("Parameter names must be symbols.")))
        .collect()
}

fn make_function(m: &mut Machine, name: Option<Symbol>, params: &[Symbol], body: HeapRef) -> HeapRef {
    let params = params
        .iter()
        .map(|p| m.heap.symbol(*p))
        .collect();
    let params = m.heap.list(params);
    m.heap.user_function(name, params, body)
}

fn define(m: &mut Machine, scope: ScopeId, args: &[HeapRef], _: Symbol) -> Result<HeapRef, ExecError> {
    if args.len() < 2 {
        return Err(ExecError::WrongNumberOfArgs("Invalid definition."));
    }
    match m.heap.get(args[0]) {
        Value::Symbol(name) => {
            let name = *name;
            define_var(m, scope, name, args[1])
        },
        Value::List(header) => {
            let header = header.clone();
            define_function(m, scope, &header, &args[1..])
        },
        _ => Err(ExecError::InvalidOperation("Expected variable name.")),
    }
}

fn define_var(m: &mut Machine, scope: ScopeId, name: Symbol, expr: HeapRef) -> Result<HeapRef, ExecError> {
    guard_primitive(m, scope, name)?;
    let value = match quoted(m, expr) {
        Some(datum) => datum,
        None => m.operand(scope, expr)?,
    };
    m.env.insert(scope, name, value);
    Ok(m.heap.unit())
}

/// `(define (name params...) body...)`. Nested function definitions in the
/// body are defined globally right away; the last remaining form is the body.
fn define_function(m: &mut Machine, scope: ScopeId, header: &[HeapRef], body: &[HeapRef]) -> Result<HeapRef, ExecError> {
    let (name, params) = header
        .split_first()
        .ok_or(ExecError::InvalidOperation("Expected function name."))?;
    let name = m.heap
        .get(*name)
        .as_symbol()
        .ok_or(ExecError::InvalidOperation("Expected function name."))?;
    guard_primitive(m, scope, name)?;
    let params = symbols(m, params)?;

    let mut func = None;
    for form in body {
        if let Some(items) = nested_function(m, *form) {
            let root = m.env.root(scope);
            define(m, root, &items[1..], symbol("define"))?;
        } else {
            let body = m.heap.copy(*form);
            func = Some(make_function(m, Some(name), &params, body));
        }
    }

    let func = func.ok_or(ExecError::InvalidOperation("Function body expected."))?;
    debug!(function = name.as_str(), "defined function");
    m.env.insert(scope, name, func);
    Ok(m.heap.unit())
}

fn nested_function(m: &Machine, form: HeapRef) -> Option<Vec<HeapRef>> {
    let items = m.heap.items(form)?;
    let is_define = items
        .first()
        .and_then(|head| m.heap.get(*head).as_symbol())
        .map_or(false, |s| s.as_str() == "define");
    let defines_function = items
        .get(1)
        .and_then(|target| m.heap.items(*target))
        .is_some();
    if is_define && defines_function {
        Some(items.to_vec())
    } else {
        None
    }
}

fn lambda(m: &mut Machine, scope: ScopeId, args: &[HeapRef], _: Symbol) -> Result<HeapRef, ExecError> {
    arity(args, 2, "A lambda takes a parameter list and a body.")?;
    let params = m.heap
        .items(args[0])
        .ok_or(ExecError::InvalidOperation("Expected a parameter list."))?
        .to_vec();
    let params = symbols(m, &params)?;
    let body = m.heap.copy(args[1]);
    let body = m.capture(scope, &params, body)?;
    Ok(make_function(m, None, &params, body))
}

fn if_(m: &mut Machine, scope: ScopeId, args: &[HeapRef], _: Symbol) -> Result<HeapRef, ExecError> {
    if args.len() != 2 && args.len() != 3 {
        return Err(ExecError::WrongNumberOfArgs("If is of the form (if <pred> <consequent> <alternate>)."));
    }
    let pred = m.operand(scope, args[0])?;
    if m.heap.get(pred).truth() {
        m.exec(scope, args[1])
    } else if let Some(alternate) = args.get(2) {
        m.exec(scope, *alternate)
    } else {
        Ok(m.heap.unit())
    }
}

fn cond(m: &mut Machine, scope: ScopeId, args: &[HeapRef], _: Symbol) -> Result<HeapRef, ExecError> {
    if args.is_empty() {
        return Err(ExecError::WrongNumberOfArgs("Cond requires at least one expression."));
    }
    for (idx, clause) in args.iter().enumerate() {
        let (test, result) = match m.heap.items(*clause) {
            Some([test, result]) => (*test, *result),
            Some(_) => return Err(ExecError::InvalidOperation("Invalid cond expression.")),
            None => return Err(ExecError::InvalidOperation("Cond tests must be an expression.")),
        };

        let is_else = idx == args.len() - 1 && m.heap
            .get(test)
            .as_symbol()
            .map_or(false, |s| s.as_str() == "else");
        if is_else {
            return m.exec(scope, result);
        }

        let test = m.operand(scope, test)?;
        if m.heap.get(test).truth() {
            return m.exec(scope, result);
        }
    }
    Ok(m.heap.unit())
}

/// Evaluate every form in a file in the current scope, printing each result.
fn load(m: &mut Machine, scope: ScopeId, args: &[HeapRef], _: Symbol) -> Result<HeapRef, ExecError> {
    arity(args, 1, "Load expects only the filename to be loaded.")?;
    let path = string_operand(m, scope, args[0], "Filename must be a string.")?;
    let code = fs::read_to_string(&path).map_err(|_| ExecError::FileNotFound(path.clone()))?;
    let forms = parse::read(&mut m.heap, &code).map_err(|err| ExecError::Read(err.describe(&code)))?;
    debug!(path = path.as_str(), forms = forms.len(), "loading file");

    for form in forms {
        let r = m.eval(scope, form);
        if m.is_quit(r) {
            return Err(ExecError::Quit);
        }
        if !m.is_unit(r) {
            let line = m.display(r).to_string();
            m.emit(&line);
        }
    }
    Ok(m.heap.unit())
}

/// Print the bindings of the current scope and the state of the heap.
fn dump(m: &mut Machine, scope: ScopeId, _: &[HeapRef], _: Symbol) -> Result<HeapRef, ExecError> {
    let lines = m.env
        .scope(scope)
        .bindings()
        .map(|(name, r)| format!(
            "{} : {} = {}",
            name.as_str(),
            m.heap.get(r).type_name(),
            m.display(r),
        ))
        .collect::<Vec<_>>();
    for line in lines {
        m.emit(&line);
    }
    let stats = m.heap.stats().to_string();
    m.emit(&stats);
    Ok(m.heap.unit())
}

fn quit(_: &mut Machine, _: ScopeId, _: &[HeapRef], _: Symbol) -> Result<HeapRef, ExecError> {
    Err(ExecError::Quit)
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use crate::{config::Config, parse, walker::Machine};

    fn machine() -> Machine {
        Machine::new(Config::default().with_seed(11)).capture_output()
    }

    fn run(m: &mut Machine, code: &str) -> String {
        let global = m.global();
        let forms = parse::read(&mut m.heap, code).unwrap();
        let mut last = String::new();
        for form in forms {
            let r = m.eval(global, form);
            last = m.display(r).to_string();
        }
        last
    }

    fn eval(code: &str) -> String {
        run(&mut machine(), code)
    }

    #[test]
    fn arithmetic() {
        assert_eq!(eval("(+ 1 2 3)"), "6");
        assert_eq!(eval("(+ 1 2.0)"), "3.0");
        assert_eq!(eval("(- 10 4 3)"), "3");
        assert_eq!(eval("(- 5)"), "-5");
        assert_eq!(eval("(- 2.5)"), "-2.5");
        assert_eq!(eval("(* 2 3 4)"), "24");
        assert_eq!(eval("(+)"), "0");
        assert_eq!(eval("(*)"), "1");
        assert_eq!(eval("(-)"), "Error: At least one parameter expected.");
        assert_eq!(eval("(+ 1 \"two\")"), "Error: Expected number!");
    }

    #[test]
    fn division() {
        assert_eq!(eval("(/ 12 4)"), "3");
        assert_eq!(eval("(/ 7 2)"), "3.5");
        assert_eq!(eval("(/ 4 0)"), "Error: Division by zero!");
        assert_eq!(eval("(/ 4 0.0)"), "Error: Division by zero!");
    }

    #[test]
    fn powers_and_overflow() {
        assert_eq!(eval("(^ 2 10)"), "1024");
        assert_eq!(eval("(^ 2 -1)"), "0");
        assert_eq!(eval("(^ -1 -3)"), "-1");
        assert_eq!(eval("(^ 0 -1)"), "Error: Division by zero!");
        assert_eq!(eval("(^ 2.0 -1)"), "0.5");
        assert_eq!(eval("(^ 4 0.5)"), "2.0");
        assert_eq!(eval("(* 9223372036854775807 2)"), "1.8446744073709552e19");
    }

    #[test]
    fn infinite_results_are_errors() {
        assert_eq!(eval("(^ 10.0 400)"), "Error: Arithmetic result is not a finite number.");
        assert_eq!(eval("(^ 10 400)"), "Error: Arithmetic result is not a finite number.");
        assert_eq!(eval("(* 1.0e300 1.0e300)"), "Error: Arithmetic result is not a finite number.");
    }

    #[test]
    fn remainders() {
        assert_eq!(eval("(% 17 5)"), "2");
        assert_eq!(eval("(% -7 2)"), "-1");
        assert_eq!(eval("(% 1 0)"), "Error: Division by zero!");
        assert_eq!(eval("(% 5.5 2)"), "Error: Can only calculate the remainder for integers.");
        assert_eq!(eval("(% 5)"), "Error: Modulo takes exactly two parameters.");
    }

    #[test]
    fn comparisons() {
        assert_eq!(eval("(= 1 1.0)"), "#t");
        assert_eq!(eval("(< 1 2)"), "#t");
        assert_eq!(eval("(> 1 2)"), "#f");
        assert_eq!(eval("(<= 2 2)"), "#t");
        assert_eq!(eval("(>= 1 2)"), "#f");
        assert_eq!(eval("(= 0.1 0.1000000000001)"), "#t");
        assert_eq!(eval("(< 1 2 3)"), "Error: Just two parameters expected.");
    }

    #[test]
    fn min_and_max() {
        assert_eq!(eval("(min 3 1 2)"), "1");
        assert_eq!(eval("(max 3 1 2)"), "3");
        assert_eq!(eval("(max 1 2.0)"), "2.0");
        assert_eq!(eval("(min 1 2.0)"), "1.0");
        assert_eq!(eval("(min)"), "Error: At least one parameter expected.");
    }

    #[test]
    fn booleans() {
        assert_eq!(eval("(and)"), "#t");
        assert_eq!(eval("(or)"), "#f");
        assert_eq!(eval("(and #t 5)"), "5");
        assert_eq!(eval("(and #t #f oops)"), "#f");
        assert_eq!(eval("(or #f 7 oops)"), "7");
        assert_eq!(eval("(or #f oops)"), "Error: Unbound symbol: oops");
        assert_eq!(eval("(not #f)"), "#t");
        assert_eq!(eval("(not 1)"), "Error: Boolean value expected.");
    }

    #[test]
    fn lists() {
        assert_eq!(eval("(car '(1 2 3))"), "1");
        assert_eq!(eval("(cdr '(1 2 3))"), "(2 3)");
        assert_eq!(eval("(cdr '(1))"), "()");
        assert_eq!(eval("(cons 0 '(1 2))"), "(0 1 2)");
        assert_eq!(eval("(cons 0 1)"), "Error: The second argument of cons must be a list.");
        assert_eq!(eval("(list 1 (+ 1 1) 'three)"), "(1 2 three)");
        assert_eq!(eval("(car '())"), "Error: car is defined only for non-empty lists.");
        assert_eq!(eval("(null? '())"), "#t");
        assert_eq!(eval("(null? 0)"), "#f");
        assert_eq!(eval("(pair? '(1))"), "#t");
        assert_eq!(eval("(pair? '())"), "#f");
    }

    #[test]
    fn type_predicates() {
        assert_eq!(eval("(number? 1.5)"), "#t");
        assert_eq!(eval("(number? 'a)"), "#f");
        assert_eq!(eval("(string? \"a\")"), "#t");
        assert_eq!(eval("(string? 'a)"), "#f");
    }

    #[test]
    fn strings() {
        assert_eq!(eval("(string \"abc\")"), "\"abc\"");
        assert_eq!(eval("(string 1)"), "Error: String takes a string type for its parameter.");
        assert_eq!(eval("(string-length \"héllo\")"), "5");
        assert_eq!(eval("(string-append \"foo\" \"bar\")"), "\"foobar\"");
        assert_eq!(eval("(string-append \"foo\" 1)"), "Error: string-append requires two strings.");
        assert_eq!(eval("(string-copy \"x\")"), "\"x\"");
    }

    #[test]
    fn equality() {
        assert_eq!(eval("(eq? 'a 'a)"), "#t");
        assert_eq!(eval("(eq? \"a\" \"a\")"), "#t");
        assert_eq!(eval("(eq? 1 1)"), "#t");
        assert_eq!(eval("(eq? 1 1.0)"), "#f");
        assert_eq!(eval("(eq? #t #t)"), "#t");
        assert_eq!(eval("(eq? '(1) '(1))"), "#f");

        let mut m = machine();
        run(&mut m, "(define l '(1 2))");
        assert_eq!(run(&mut m, "(eq? l l)"), "#t");
    }

    #[test]
    fn quote_and_eval() {
        assert_eq!(eval("'(+ 1 2)"), "(+ 1 2)");
        assert_eq!(eval("(quote a)"), "a");
        assert_eq!(eval("(eval '(+ 1 2))"), "3");
        assert_eq!(eval("(quote)"), "Error: quote expects exactly one argument.");
    }

    #[test]
    fn define_and_call() {
        let mut m = machine();
        assert_eq!(run(&mut m, "(define (sq x) (* x x))"), "");
        assert_eq!(run(&mut m, "(sq 5)"), "25");
        run(&mut m, "(define x 'sym)");
        assert_eq!(run(&mut m, "x"), "sym");
        run(&mut m, "(define y (+ 1 2))");
        assert_eq!(run(&mut m, "y"), "3");
    }

    #[test]
    fn primitives_cannot_be_redefined() {
        let mut m = machine();
        assert_eq!(run(&mut m, "(define + 5)"), "Error: Scheme primitives cannot be redefined.");
        assert_eq!(run(&mut m, "(define (car l) l)"), "Error: Scheme primitives cannot be redefined.");
        assert_eq!(run(&mut m, "(+ 1 2)"), "3");
    }

    #[test]
    fn failed_definitions_bind_nothing() {
        let mut m = machine();
        assert_eq!(run(&mut m, "(define z (/ 1 0))"), "Error: Division by zero!");
        assert_eq!(run(&mut m, "z"), "Error: Unbound symbol: z");
    }

    #[test]
    fn nested_function_definitions_are_global() {
        let mut m = machine();
        run(&mut m, "(define (outer x) (define (helper y) (* y 2)) (helper x))");
        assert_eq!(run(&mut m, "(helper 4)"), "8");
        assert_eq!(run(&mut m, "(outer 3)"), "6");
    }

    #[test]
    fn conditionals() {
        assert_eq!(eval("(if #t 1 2)"), "1");
        assert_eq!(eval("(if #f 1 2)"), "2");
        assert_eq!(eval("(if 0 1 2)"), "1");
        assert_eq!(eval("(if #f 1)"), "");
        assert_eq!(eval("(if (car '()) 1 2)"), "Error: car is defined only for non-empty lists.");
        assert_eq!(eval("(cond (#f 1) ((= 1 1) 2) (else 3))"), "2");
        assert_eq!(eval("(cond (#f 1) (else 3))"), "3");
        assert_eq!(eval("(cond (#f 1))"), "");
        assert_eq!(eval("(cond (#f 1 2))"), "Error: Invalid cond expression.");
        assert_eq!(eval("(cond 5)"), "Error: Cond tests must be an expression.");
    }

    #[test]
    fn else_only_counts_last() {
        assert_eq!(eval("(cond (else 1) (#t 2))"), "Error: Unbound symbol: else");
    }

    #[test]
    fn lambdas() {
        assert_eq!(eval("((lambda (x y) (+ x y)) 1 2)"), "3");
        assert_eq!(eval("(lambda (x) x)"), "#<procedure>");
        assert_eq!(eval("(lambda (1) x)"), "Error: Parameter names must be symbols.");
    }

    #[test]
    fn dump_lists_bindings() {
        let mut m = machine();
        run(&mut m, "(define (show a) (dump))");
        run(&mut m, "(show 12)");
        let out = m.take_output();
        let mut lines = out.lines();
        assert_eq!(lines.next(), Some("a : integer = 12"));
        assert!(lines.next().unwrap_or("").starts_with("heap: "));
    }

    #[test]
    fn quit_yields_the_sentinel() {
        let mut m = machine();
        let global = m.global();
        let form = crate::parse::read(&mut m.heap, "(list 1 (quit))").unwrap()[0];
        let r = m.eval(global, form);
        assert!(m.is_quit(r));
    }
}
