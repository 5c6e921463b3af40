//! Property testing over lazily derived choice trees.
//!
//! Every value is read from a [`ChoiceTree`](data/struct.ChoiceTree.html):
//! an infinite binary tree of decisions derived from a single seed. When a
//! property fails, each generator proposes variants of the tree with some
//! decisions pinned to smaller values, and we search through these for the
//! smallest input that still fails.
//!
//! ```
//! use choicetree::*;
//! use choicetree::generators::*;
//!
//! property(ints(-100..=100).list_between(0, 10))
//!     .check(|v| v.iter().rev().rev().eq(v.iter()));
//! ```

#[macro_use]
extern crate log;

pub mod data;
pub mod generators;
mod properties;

pub use crate::properties::*;
