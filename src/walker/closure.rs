//! Closure capture by hoisting.
//!
//! Functions do not carry their defining scope around. Instead, when a `lambda`
//! is built, every free symbol of its body that is bound in a call scope is
//! copied into the global scope under a fresh private name, and the body is
//! rewritten to refer to that name. The captured value therefore outlives the
//! call scope that produced it.

use rand::Rng;
use tracing::{trace, warn};
use crate::util::with_stack;
use super::{
    env::ScopeId,
    heap::HeapRef,
    value::{symbol, Symbol, Value},
    ExecError, Machine,
};

impl Machine {
    /// Rewrite `body` in place so that it no longer depends on call scopes.
    /// `params` are left alone since they are rebound on every call.
    pub(super) fn capture(&mut self, scope: ScopeId, params: &[Symbol], body: HeapRef) -> Result<HeapRef, ExecError> {
        let mut bound = params.to_vec();
        self.hoist(scope, &mut bound, body)
    }

    fn hoist(&mut self, scope: ScopeId, bound: &mut Vec<Symbol>, expr: HeapRef) -> Result<HeapRef, ExecError> {
        with_stack(|| self.hoist_inner(scope, bound, expr))
    }

    fn hoist_inner(&mut self, scope: ScopeId, bound: &mut Vec<Symbol>, expr: HeapRef) -> Result<HeapRef, ExecError> {
        match self.heap.get(expr) {
            Value::Symbol(name) => {
                let name = *name;
                if bound.contains(&name) {
                    return Ok(expr);
                }
                match self.env.lookup(scope, name) {
                    Some((owner, _)) if owner != self.env.global() => {
                        let value = self.env.fetch(&self.heap, scope, name)?;
                        let hidden = self.private_name(scope);
                        self.env.insert_global(scope, hidden, value);
                        trace!(captured = name.as_str(), hidden = hidden.as_str(), "hoisted capture");
                        Ok(self.heap.symbol(hidden))
                    },
                    _ => Ok(expr),
                }
            },
            Value::List(items) => {
                let items = items.clone();
                match self.form_head(&items) {
                    // Quoted data is never evaluated, so it captures nothing.
                    Some("quote") => return Ok(expr),
                    // A nested lambda binds its own parameters.
                    Some("lambda") if items.len() == 3 => {
                        let inner = self.heap
                            .items(items[1])
                            .unwrap_or(&[])
                            .iter()
                            .filter_map(|p| self.heap.get(*p).as_symbol())
                            .collect::<Vec<_>>();
                        let before = bound.len();
                        bound.extend(inner);
                        let body = self.hoist(scope, bound, items[2]);
                        bound.truncate(before);
                        let body = body?;
                        if let Value::List(items) = self.heap.get_mut(expr) {
                            items[2] = body;
                        }
                        return Ok(expr);
                    },
                    _ => {},
                }

                let mut rewritten = Vec::with_capacity(items.len());
                for item in items {
                    rewritten.push(self.hoist(scope, bound, item)?);
                }
                *self.heap.get_mut(expr) = Value::List(rewritten);
                Ok(expr)
            },
            _ => Ok(expr),
        }
    }

    fn form_head(&self, items: &[HeapRef]) -> Option<&'static str> {
        let head = items.first().and_then(|head| self.heap.get(*head).as_symbol())?;
        match head.as_str() {
            "quote" => Some("quote"),
            "lambda" => Some("lambda"),
            _ => None,
        }
    }

    /// A name no program can spell: it lexes as an integer.
    fn private_name(&mut self, scope: ScopeId) -> Symbol {
        loop {
            let name = symbol(&self.rng.gen_range(0..i32::MAX).to_string());
            if self.env.lookup(scope, name).is_none() {
                return name;
            }
            // The retry keeps this correct, but a collision means the name
            // space is filling up with captures that are never freed.
            warn!(name = name.as_str(), "hoisted name already bound, retrying");
        }
    }
}
