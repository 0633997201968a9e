#![allow(dead_code)]

use notion::{Config, Engine, HeapRef};

pub fn engine() -> Engine {
    Engine::new(Config::default().with_seed(42)).capture_output()
}

/// Evaluate `code` and render the last result.
pub fn run(engine: &mut Engine, code: &str) -> String {
    let result = engine.execute(code);
    engine.display(result).to_string()
}

/// Evaluate a sequence of top-level inputs, collecting after each one the
/// way the REPL does, and render every result.
pub fn session(engine: &mut Engine, inputs: &[&str]) -> Vec<String> {
    inputs
        .iter()
        .map(|code| {
            let out = run(engine, code);
            engine.collect();
            out
        })
        .collect()
}

pub fn eval(code: &str) -> String {
    run(&mut engine(), code)
}

pub fn handle(engine: &mut Engine, code: &str) -> HeapRef {
    engine.execute(code)
}
