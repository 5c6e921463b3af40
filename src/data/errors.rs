use std::any::Any;

use thiserror::Error;

use super::tree::{ChoiceKind, Value};

/// The result of drawing from a choice tree.
pub type Maybe<T> = Result<T, GenError>;

/// The reasons why generating a value from a choice tree can fail.
///
/// None of these indicate that the property under test is at fault; they
/// describe a generator that could not produce a value.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GenError {
    /// A recorded choice was read with an incompatible kind, or lies outside
    /// the requested domain. Expected while replaying shrink candidates;
    /// during initial generation it means generators were composed
    /// inconsistently.
    #[error("cannot read recorded choice {recorded:?} as {expected} in {domain}")]
    MismatchedChoice {
        /// The kind of choice that was requested.
        expected: ChoiceKind,
        /// The domain the read was constrained to.
        domain: String,
        /// What the tree actually held.
        recorded: Value,
    },
    /// A pinned attempt of `filter` or `ignore_errors` was rejected on
    /// replay.
    #[error("replayed attempt was rejected: {0}")]
    Rejected(String),
    /// A set could not find enough distinct elements within its retry budget.
    #[error(
        "could not draw {wanted} distinct elements; stuck at {found} after {attempts} duplicate draws"
    )]
    ImpossibleSetSize {
        /// Requested cardinality.
        wanted: usize,
        /// Distinct elements collected before giving up.
        found: usize,
        /// Consecutive duplicate draws that exhausted the budget.
        attempts: usize,
    },
    /// A filter rejected every draw within its budget.
    #[error("filter rejected {attempts} draws in a row; last rejected value: {last_rejected}")]
    FilterLimitReached {
        /// Draws attempted.
        attempts: usize,
        /// Debug rendering of the last value the predicate refused.
        last_rejected: String,
    },
    /// `ignore_errors` saw an ignorable error on every draw within its
    /// budget.
    #[error("ignored {attempts} errors in a row; last error: {cause}")]
    ExceptionLimitReached {
        /// Draws attempted.
        attempts: usize,
        /// The last error observed.
        cause: String,
    },
    /// A generator produced an error that was not declared ignorable.
    #[error("generator failed: {0}")]
    Unhandled(String),
    /// A generator (usually a closure given to `map` or `flat_map`)
    /// panicked while reading the tree.
    #[error("generator panicked: {0}")]
    Panicked(String),
}

impl GenError {
    /// True for errors caused by replaying a tree recorded for a different
    /// generator shape.
    pub fn is_mismatch(&self) -> bool {
        match *self {
            GenError::MismatchedChoice { .. } => true,
            _ => false,
        }
    }
}

/// Renders the payload of a caught panic.
pub(crate) fn panic_message(err: Box<dyn Any + Send>) -> String {
    if let Some(s) = err.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = err.downcast_ref::<String>() {
        s.to_string()
    } else {
        format!("Unrecognised panic result: {:?}", err)
    }
}
