//! Runtime configuration.
//!
//! The defaults mirror a typical interactive session: a large global table, small
//! call-local tables, and a collection after every top-level evaluation.

/// Bucket count for the global scope.
pub const GLOBAL_BUCKETS: usize = 1019;

/// Bucket count for scopes created by a function call.
pub const LOCAL_BUCKETS: usize = 47;

/// How deeply evaluation may nest before it gives up with an error.
pub const MAX_DEPTH: usize = 10_000;

#[derive(Clone, Debug, PartialEq)]
pub struct Config {
    pub global_buckets: usize,
    pub local_buckets: usize,
    pub max_depth: usize,
    /// Run the collector after each top-level evaluation.
    pub collect_after_eval: bool,
    /// Seed for the generator of hoisted closure names. `None` seeds from the OS.
    pub seed: Option<u64>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            global_buckets: GLOBAL_BUCKETS,
            local_buckets: LOCAL_BUCKETS,
            max_depth: MAX_DEPTH,
            collect_after_eval: true,
            seed: None,
        }
    }
}

impl Config {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    pub fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth;
        self
    }

    pub fn with_collection(mut self, collect_after_eval: bool) -> Self {
        self.collect_after_eval = collect_after_eval;
        self
    }

    pub fn with_buckets(mut self, global: usize, local: usize) -> Self {
        self.global_buckets = global.max(1);
        self.local_buckets = local.max(1);
        self
    }
}
