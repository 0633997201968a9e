use tracing::trace;
use super::{
    heap::{Heap, HeapRef},
    value::{Symbol, Value},
    ExecError,
};

/// Polynomial hash of a symbol name with base 163, reduced over the bucket count.
pub fn hash(name: &str, buckets: usize) -> usize {
    let buckets = buckets.max(1) as u64;
    name
        .bytes()
        .fold(0u64, |h, b| (h * 163 + b as u64) % buckets) as usize
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct ScopeId(usize);

/// A single hashed symbol table. Each bucket keeps its bindings oldest first,
/// so walking a bucket backwards finds the most recent binding first.
pub struct Scope {
    buckets: Vec<Vec<(Symbol, HeapRef)>>,
    parent: Option<ScopeId>,
    len: usize,
}

impl Scope {
    fn new(buckets: usize, parent: Option<ScopeId>) -> Self {
        Self {
            buckets: (0..buckets.max(1)).map(|_| Vec::new()).collect(),
            parent,
            len: 0,
        }
    }

    fn bucket(&self, name: Symbol) -> usize {
        hash(name.as_str(), self.buckets.len())
    }

    pub fn parent(&self) -> Option<ScopeId> {
        self.parent
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Bind `name`, overwriting any existing binding of it in this scope.
    pub fn insert(&mut self, name: Symbol, value: HeapRef) {
        let idx = self.bucket(name);
        let bucket = &mut self.buckets[idx];
        match bucket.iter_mut().find(|(n, _)| *n == name) {
            Some((_, slot)) => *slot = value,
            None => {
                bucket.push((name, value));
                self.len += 1;
            },
        }
    }

    pub fn get(&self, name: Symbol) -> Option<HeapRef> {
        self.buckets[self.bucket(name)]
            .iter()
            .rev()
            .find(|(n, _)| *n == name)
            .map(|(_, v)| *v)
    }

    /// Every binding in this scope, most recently bound first within a bucket.
    pub fn bindings(&self) -> impl Iterator<Item=(Symbol, HeapRef)> + '_ {
        self.buckets
            .iter()
            .flat_map(|bucket| bucket.iter().rev().copied())
    }
}

/// The scope chain. Call scopes are strictly nested, so they live on a stack
/// above the global scope and are popped when the call returns.
pub struct Environment {
    scopes: Vec<Scope>,
}

impl Environment {
    pub fn new(global_buckets: usize) -> Self {
        Self {
            scopes: vec![Scope::new(global_buckets, None)],
        }
    }

    pub fn global(&self) -> ScopeId {
        ScopeId(0)
    }

    pub fn depth(&self) -> usize {
        self.scopes.len()
    }

    pub fn scope(&self, id: ScopeId) -> &Scope {
        &self.scopes[id.0]
    }

    /// Open a new scope whose parent is `parent`.
    pub fn push(&mut self, parent: ScopeId, buckets: usize) -> ScopeId {
        self.scopes.push(Scope::new(buckets, Some(parent)));
        let id = ScopeId(self.scopes.len() - 1);
        trace!(scope = id.0, parent = parent.0, "opened scope");
        id
    }

    /// Discard `id` and every scope opened after it. The global scope is never
    /// discarded.
    pub fn pop(&mut self, id: ScopeId) {
        debug_assert!(id.0 > 0, "cannot pop the global scope");
        debug_assert!(id.0 == self.scopes.len() - 1, "scopes must be popped in order");
        self.scopes.truncate(id.0.max(1));
    }

    /// The scopes from `id` up to and including the global scope.
    pub fn chain(&self, id: ScopeId) -> impl Iterator<Item=ScopeId> + '_ {
        std::iter::successors(Some(id), move |id| self.scope(*id).parent())
    }

    pub fn root(&self, id: ScopeId) -> ScopeId {
        self.chain(id).last().unwrap_or(id)
    }

    pub fn insert(&mut self, id: ScopeId, name: Symbol, value: HeapRef) {
        self.scopes[id.0].insert(name, value);
    }

    pub fn insert_global(&mut self, id: ScopeId, name: Symbol, value: HeapRef) {
        let root = self.root(id);
        self.insert(root, name, value);
    }

    /// Find the innermost binding of `name`, along with the scope that holds it.
    pub fn lookup(&self, id: ScopeId, name: Symbol) -> Option<(ScopeId, HeapRef)> {
        self.chain(id)
            .find_map(|scope| self.scope(scope).get(name).map(|value| (scope, value)))
    }

    /// Look up `name`. When the bound value is itself a symbol, that symbol is
    /// resolved in turn; if resolution fails the last symbol found is returned.
    pub fn fetch(&self, heap: &Heap<Value>, id: ScopeId, name: Symbol) -> Result<HeapRef, ExecError> {
        let (_, mut found) = self
            .lookup(id, name)
            .ok_or_else(|| ExecError::NoSuchVar(name.as_str().to_string()))?;

        let mut seen = vec![name];
        while let Some(alias) = heap.get(found).as_symbol() {
            if seen.contains(&alias) {
                break;
            }
            seen.push(alias);
            match self.lookup(id, alias) {
                Some((_, value)) => found = value,
                None => break,
            }
        }
        Ok(found)
    }

    /// Every value bound anywhere in the chain above `id`.
    pub fn roots(&self, id: ScopeId) -> Vec<HeapRef> {
        self.chain(id)
            .flat_map(|scope| self.scope(scope).bindings().map(|(_, value)| value))
            .collect()
    }
}
