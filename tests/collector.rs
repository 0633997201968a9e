mod common;

use notion::{Config, Engine};
use common::{engine, handle, run};

#[test]
fn unreachable_values_are_swept_with_their_children() {
    let mut e = engine();
    e.collect();
    let baseline = e.stats().total;

    handle(&mut e, "'(1 (2 3) (4 (5)))");
    assert!(e.stats().total > baseline);

    e.collect();
    assert_eq!(e.stats().total, baseline);
}

#[test]
fn bound_values_survive() {
    let mut e = engine();
    run(&mut e, "(define tree '(1 (2 3) (4 (5))))");
    e.collect();
    let live = e.stats().total;
    e.collect();
    assert_eq!(e.stats().total, live);
    assert_eq!(run(&mut e, "tree"), "(1 (2 3) (4 (5)))");
}

#[test]
fn builtins_are_pinned() {
    let mut e = engine();
    e.collect();
    e.collect();
    assert_eq!(run(&mut e, "(car (list 1 2))"), "1");
    assert!(e.stats().marked >= 38);
}

#[test]
fn call_scopes_are_reclaimed() {
    let mut e = engine();
    run(&mut e, "(define (waste n) (list n n n n))");
    e.collect();
    let baseline = e.stats().total;
    run(&mut e, "(waste 1)");
    run(&mut e, "(waste 2)");
    e.collect();
    assert_eq!(e.stats().total, baseline);
}

#[test]
fn hoisted_captures_stay_alive() {
    let mut e = engine();
    run(&mut e, "(define (adder n) (lambda (x) (+ x n)))");
    run(&mut e, "(define add2 (adder 2))");
    e.collect();
    e.collect();
    assert_eq!(run(&mut e, "(add2 40)"), "42");
}

#[test]
fn freed_slots_are_reused() {
    let mut e = engine();
    handle(&mut e, "'(a b c d e f)");
    e.collect();
    let free = e.stats().free_slots;
    assert!(free >= 7);

    handle(&mut e, "'(x)");
    assert!(e.stats().free_slots < free);
}

#[test]
fn no_collection_when_disabled() {
    let mut e = Engine::new(Config::default().with_seed(1).with_collection(false));
    let before = e.stats().total;
    e.execute("'(1 2 3)");
    assert_eq!(e.maybe_collect(), 0);
    assert!(e.stats().total > before);
}
