//! This module contains the underlying data generation and shrinking
//! mechanism. The main type is the `ChoiceTree`, a lazily derived, infinite
//! binary tree of decisions, each of which is either drawn from a seed, or
//! fixed to a recorded value.
//!
//! Also manages the shrinking process (see [`minimize`](fn.minimize.html)).

mod errors;
mod seed;
mod shrinkers;
mod tree;
pub use self::errors::*;
pub use self::seed::*;
pub use self::shrinkers::*;
pub use self::tree::*;
