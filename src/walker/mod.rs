pub mod heap;
pub mod env;
pub mod value;
pub mod print;
mod builtins;
mod closure;

use std::io::{self, Write};
use rand::{rngs::StdRng, SeedableRng};
use thiserror::Error as ThisError;
use tracing::{debug, trace};
use crate::{config::Config, util::with_stack};
use self::{
    heap::{Heap, HeapRef},
    env::{Environment, ScopeId},
    value::{Func, Symbol, Value},
    print::Printer,
};

/// A native procedure. It receives its operands unevaluated, along with the
/// name it was invoked through.
pub type Builtin = fn(&mut Machine, ScopeId, &[HeapRef], Symbol) -> Result<HeapRef, ExecError>;

/// The message carried by the error value that `quit` produces.
pub const QUIT: &str = "<quit>";

#[derive(Clone, Debug, PartialEq, ThisError)]
pub enum ExecError {
    /// An operand evaluated to an error value, which is handed back untouched.
    #[error("raised {0:?}")]
    Raised(HeapRef),
    #[error("Unbound symbol: {0}")]
    NoSuchVar(String),
    #[error("{0}")]
    WrongNumberOfArgs(&'static str),
    #[error("{0}")]
    InvalidOperation(&'static str),
    #[error("Division by zero!")]
    DivisionByZero,
    #[error("Can only calculate the remainder for integers.")]
    NonIntegerModulo,
    #[error("Arithmetic result is not a finite number.")]
    NotFinite,
    #[error("Scheme primitives cannot be redefined.")]
    PrimitiveRedefinition,
    #[error("Expected function. Instead got: {0}")]
    NotCallable(String),
    #[error("Could not load file: {0}")]
    FileNotFound(String),
    #[error("{0}")]
    Read(String),
    #[error("Something hasn't been implemented yet")]
    Unimplemented,
    #[error("Maximum recursion depth exceeded")]
    DepthExceeded,
    #[error("{}", QUIT)]
    Quit,
}

enum Output {
    Stdout,
    Captured(String),
}

/// The evaluator and everything it mutates: the heap, the scope chain and the
/// generator used to name hoisted closure captures.
pub struct Machine {
    pub heap: Heap<Value>,
    pub env: Environment,
    config: Config,
    rng: StdRng,
    depth: usize,
    output: Output,
}

impl Machine {
    pub fn new(config: Config) -> Self {
        let rng = match config.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        let mut this = Self {
            heap: Heap::new(),
            env: Environment::new(config.global_buckets),
            config,
            rng,
            depth: 0,
            output: Output::Stdout,
        };
        builtins::install(&mut this);
        this
    }

    /// Keep anything `load` or `dump` would print in a buffer rather than
    /// writing it to stdout.
    pub fn capture_output(mut self) -> Self {
        self.output = Output::Captured(String::new());
        self
    }

    /// Drain the captured output. Always empty when printing to stdout.
    pub fn take_output(&mut self) -> String {
        match &mut self.output {
            Output::Captured(buf) => std::mem::take(buf),
            Output::Stdout => String::new(),
        }
    }

    pub(crate) fn emit(&mut self, line: &str) {
        match &mut self.output {
            Output::Captured(buf) => {
                buf.push_str(line);
                buf.push('\n');
            },
            Output::Stdout => {
                let stdout = io::stdout();
                let mut out = stdout.lock();
                let _ = writeln!(out, "{}", line);
                let _ = out.flush();
            },
        }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn global(&self) -> ScopeId {
        self.env.global()
    }

    pub fn display(&self, r: HeapRef) -> Printer<'_> {
        Printer::new(&self.heap, r)
    }

    pub fn is_quit(&self, r: HeapRef) -> bool {
        self.heap.get(r).as_error() == Some(QUIT)
    }

    pub fn is_unit(&self, r: HeapRef) -> bool {
        match self.heap.get(r) {
            Value::Unit => true,
            _ => false,
        }
    }

    /// Evaluate `expr` in `scope`. Failures come back as error values.
    pub fn eval(&mut self, scope: ScopeId, expr: HeapRef) -> HeapRef {
        match self.exec(scope, expr) {
            Ok(r) => r,
            Err(ExecError::Raised(r)) => r,
            Err(err) => {
                trace!(%err, "evaluation failed");
                self.heap.error(err.to_string())
            },
        }
    }

    /// Free everything that cannot be reached from the chain above `scope`.
    pub fn collect(&mut self, scope: ScopeId) -> usize {
        let roots = self.env.roots(scope);
        let freed = self.heap.collect(roots);
        debug!(freed, live = self.heap.len(), "garbage collection finished");
        freed
    }

    pub(crate) fn exec(&mut self, scope: ScopeId, expr: HeapRef) -> Result<HeapRef, ExecError> {
        if self.depth >= self.config.max_depth {
            return Err(ExecError::DepthExceeded);
        }
        self.depth += 1;
        let result = with_stack(|| self.exec_inner(scope, expr));
        self.depth -= 1;
        result
    }

    fn exec_inner(&mut self, scope: ScopeId, expr: HeapRef) -> Result<HeapRef, ExecError> {
        match self.heap.get(expr) {
            Value::Number(_)
            | Value::Str(_)
            | Value::Bool(_)
            | Value::Unit
            | Value::Error(_) => Ok(self.heap.copy(expr)),
            Value::Func(_) => Ok(expr),
            Value::Symbol(name) => {
                let name = *name;
                self.env.fetch(&self.heap, scope, name)
            },
            Value::List(items) => {
                let items = items.clone();
                self.call(scope, &items)
            },
        }
    }

    fn call(&mut self, scope: ScopeId, items: &[HeapRef]) -> Result<HeapRef, ExecError> {
        let (head, operands) = match items.split_first() {
            Some(split) => split,
            None => return Ok(self.heap.list(Vec::new())),
        };
        let op = self.operand(scope, *head)?;

        match self.heap.get(op) {
            Value::Func(Func::Builtin { name, f }) => {
                let (name, f) = (*name, *f);
                trace!(builtin = name.as_str(), operands = operands.len(), "calling builtin");
                f(self, scope, operands, name)
            },
            Value::Func(Func::User { params, body, .. }) => {
                let (params, body) = (*params, *body);
                self.apply(scope, params, body, operands)
            },
            _ => Err(ExecError::NotCallable(self.describe(op))),
        }
    }

    /// Apply a user function. Operands are resolved in the caller's scope and
    /// bound in a fresh scope that lives until the body returns.
    fn apply(
        &mut self,
        caller: ScopeId,
        params: HeapRef,
        body: HeapRef,
        operands: &[HeapRef],
    ) -> Result<HeapRef, ExecError> {
        let params = self.heap
            .items(params)
            .unwrap_or(&[])
            .iter()
            .filter_map(|p| self.heap.get(*p).as_symbol())
            .collect::<Vec<_>>();

        if operands.len() < params.len() {
            return Err(ExecError::WrongNumberOfArgs("Too few parameters passed to function."));
        }

        let mut args = Vec::with_capacity(params.len());
        for (param, operand) in params.into_iter().zip(operands.iter().copied()) {
            let value = match self.heap.get(operand) {
                Value::Symbol(name) => {
                    let name = *name;
                    self.env.fetch(&self.heap, caller, name)?
                },
                Value::List(_) => self.exec(caller, operand)?,
                _ => operand,
            };
            args.push((param, self.check(value)?));
        }

        let local = self.env.push(caller, self.config.local_buckets);
        for (param, value) in args {
            self.env.insert(local, param, value);
        }
        let result = self.exec(local, body);
        self.env.pop(local);
        result
    }

    /// Turn an error value into an `Err` so that `?` hands it straight back.
    pub(crate) fn check(&self, r: HeapRef) -> Result<HeapRef, ExecError> {
        match self.heap.get(r) {
            Value::Error(_) => Err(ExecError::Raised(r)),
            _ => Ok(r),
        }
    }

    /// Evaluate an operand, short-circuiting on errors.
    pub(crate) fn operand(&mut self, scope: ScopeId, expr: HeapRef) -> Result<HeapRef, ExecError> {
        let r = self.exec(scope, expr)?;
        self.check(r)
    }

    /// A short description of a value for error messages, e.g. `integer 5`.
    pub(crate) fn describe(&self, r: HeapRef) -> String {
        format!("{} {}", self.heap.get(r).type_name(), self.display(r))
    }
}
