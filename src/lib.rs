pub mod config;
pub mod error;
pub mod lex;
pub mod parse;
pub mod util;
pub mod walker;

pub use self::{
    config::Config,
    error::{Error, ErrorKind, Thing},
    walker::{
        heap::{HeapRef, Stats},
        print::Printer,
        ExecError, Machine,
    },
};

/// Reads and evaluates source code against a single global environment.
pub struct Engine {
    machine: Machine,
}

impl Default for Engine {
    fn default() -> Self {
        Self::new(Config::default())
    }
}

impl Engine {
    pub fn new(config: Config) -> Self {
        Self {
            machine: Machine::new(config),
        }
    }

    /// Capture anything `load` or `dump` print instead of writing to stdout.
    pub fn capture_output(self) -> Self {
        Self {
            machine: self.machine.capture_output(),
        }
    }

    pub fn take_output(&mut self) -> String {
        self.machine.take_output()
    }

    pub fn machine(&self) -> &Machine {
        &self.machine
    }

    pub fn machine_mut(&mut self) -> &mut Machine {
        &mut self.machine
    }

    /// Turn source code into one value per top-level form without evaluating it.
    pub fn read(&mut self, code: &str) -> Result<Vec<HeapRef>, Error> {
        parse::read(&mut self.machine.heap, code)
    }

    /// Evaluate a form in the global scope.
    pub fn eval(&mut self, form: HeapRef) -> HeapRef {
        let global = self.machine.global();
        self.machine.eval(global, form)
    }

    /// Read and evaluate every form in `code`, returning the last result.
    /// A read error becomes an error value, and evaluation stops early at `quit`.
    pub fn execute(&mut self, code: &str) -> HeapRef {
        let forms = match self.read(code) {
            Ok(forms) => forms,
            Err(err) => return self.machine.heap.error(err.describe(code)),
        };

        let mut last = self.machine.heap.unit();
        for form in forms {
            last = self.eval(form);
            if self.is_quit(last) {
                break;
            }
        }
        last
    }

    /// Load a file into the global scope, as `(load "path")` would.
    pub fn load(&mut self, path: &str) -> HeapRef {
        let heap = &mut self.machine.heap;
        let head = heap.symbol(walker::value::symbol("load"));
        let path = heap.string(path);
        let form = heap.list(vec![head, path]);
        self.eval(form)
    }

    /// Collect garbage, keeping everything reachable from the global scope.
    /// Handles to unbound values must not be used afterwards.
    pub fn collect(&mut self) -> usize {
        let global = self.machine.global();
        self.machine.collect(global)
    }

    /// Collect only if the configuration asks for it after each evaluation.
    pub fn maybe_collect(&mut self) -> usize {
        if self.machine.config().collect_after_eval {
            self.collect()
        } else {
            0
        }
    }

    pub fn display(&self, r: HeapRef) -> Printer<'_> {
        self.machine.display(r)
    }

    pub fn is_quit(&self, r: HeapRef) -> bool {
        self.machine.is_quit(r)
    }

    pub fn is_unit(&self, r: HeapRef) -> bool {
        self.machine.is_unit(r)
    }

    pub fn stats(&self) -> Stats {
        self.machine.heap.stats()
    }
}
