//! This module describes how data gets generated from the underlying
//! [`ChoiceTree`](../data/struct.ChoiceTree.html), and how each kind of
//! value proposes smaller trees to try when shrinking.

mod collections;
mod composition;
pub(crate) mod core;
mod numbers;
mod tuples;

pub use self::collections::*;
pub use self::composition::*;
pub use self::core::*;
pub use self::numbers::*;
