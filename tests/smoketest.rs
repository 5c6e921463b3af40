extern crate choicetree;
extern crate env_logger;
#[macro_use]
extern crate log;

use choicetree::generators::*;
use choicetree::*;

#[test]
fn some_approximation_of_usage() {
    property(vecs_between(booleans(), 0, 20)).check(|l| {
        let rev = l.iter().cloned().rev().collect::<Vec<_>>();
        let rev2 = rev.into_iter().rev().collect::<Vec<_>>();
        return rev2 == l;
    })
}

// In this case, we reverse the last three items.
#[test]
#[should_panic(expected = "Predicate failed for argument ")]
fn some_approximation_of_failing_example() {
    let _ = env_logger::try_init();
    property(vecs_between(booleans(), 0, 20)).check(|l| {
        let rev = l.iter().cloned().rev().take(3).collect::<Vec<_>>();
        let rev2 = rev.into_iter().rev().collect::<Vec<_>>();
        info!("in:{:?}; out:{:?}; ok? {:?}", l, rev2, &rev2 == &l);
        return rev2 == l;
    })
}

// http://matt.might.net/articles/quick-quickcheck/
#[test]
#[should_panic(expected = "Predicate failed for argument ")]
fn mersenne_conjecture() {
    let _ = env_logger::try_init();
    fn is_prime(n: u64) -> bool {
        match n {
            0 | 1 => false,
            2 => true,
            n => !(2..n - 1).any(|q| (n % q) == 0),
        }
    }

    // Only check small primes.
    property(ints(0..=15).filter(|&n| {
        let primep = is_prime(n as u64);
        debug!("mersenne_conjecture n: {}; prime? {}", n, primep);
        primep
    }))
    .check(|n| is_prime((1u64 << n) - 1))
}

#[test]
#[should_panic(expected = "Predicate failed for argument ")]
fn trivial_failure() {
    let _ = env_logger::try_init();
    property(booleans()).check(|_| false)
}

#[test]
fn trivial_pass() {
    property(booleans()).check(|_| true)
}

#[test]
#[should_panic(expected = "Predicate failed for argument [true]")]
fn value_dependent() {
    property(vecs_between(booleans(), 0, 20)).check(|v| {
        println!("Check: {:?}", v);
        !v.into_iter().any(|t| t)
    })
}

#[test]
#[should_panic(expected = "Predicate failed for argument ")]
fn trivial_result_failure() {
    property(booleans()).check(|_| -> Result<(), ()> { Err(()) })
}

#[test]
#[should_panic(expected = "horrible failure")]
fn trivial_result_includes_failing_result() {
    property(booleans()).check(|_| -> Result<(), &'static str> { Err("horrible failure") })
}

#[test]
fn trivial_result_pass() {
    property(booleans()).check(|_| -> Result<(), ()> { Ok(()) })
}

#[test]
#[should_panic(expected = "Predicate failed for argument ")]
fn trivial_panic_failure() {
    property(booleans()).check(|_| -> () { panic!("Big bad boom") })
}

#[test]
#[should_panic(expected = "Big bad boom")]
fn panic_includes_failure_message() {
    property(booleans()).check(|_| -> () { panic!("Big bad boom") })
}

#[test]
#[should_panic(expected = "Predicate failed for argument 12345;")]
fn panic_includes_minimal_example() {
    let _ = env_logger::try_init();
    property(ints(0..=i64::max_value())).check(|n| n < 12345);
}

#[test]
#[should_panic(expected = "CHOICETREE_SEED=")]
fn panic_includes_replay_instructions() {
    property(ints(0..=10)).check(|n| n < 5);
}

#[test]
#[should_panic(expected = "could not draw 3 distinct elements")]
fn generation_errors_are_reported() {
    property(ints(0..=1).set(3)).check(|_| true);
}

#[test]
#[should_panic(expected = "generator panicked: no values today")]
fn generator_panics_are_reported() {
    property(booleans().map(|_| -> bool { panic!("no values today") })).check(|_| true);
}
