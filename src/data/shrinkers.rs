use std::fmt;

use crate::data::errors::*;
use crate::data::tree::*;

/// A failing run of a property.
#[derive(Debug, Clone)]
pub struct Failure<A> {
    /// The arguments the property was called with.
    pub args: A,
    /// Why the property failed.
    pub cause: String,
    /// The tree that reproduces `args`.
    pub tree: ChoiceTree,
}

/// The result of running a property once.
#[derive(Debug, Clone)]
pub enum Outcome<A> {
    /// The property held for these arguments.
    Success(A),
    /// The property failed.
    Failure(Failure<A>),
}

/// A replayed run, along with the candidates for shrinking it further.
pub struct Trial<A> {
    /// What happened.
    pub outcome: Outcome<A>,
    /// Smaller trees to try next, should this one have failed.
    pub shrinks: Shrinks,
}

impl<A> Outcome<A> {
    /// Whether this outcome witnesses a failure.
    pub fn is_failure(&self) -> bool {
        match *self {
            Outcome::Failure(_) => true,
            Outcome::Success(_) => false,
        }
    }
}

impl<A: fmt::Debug> fmt::Debug for Trial<A> {
    fn fmt(&self, fmt: &mut fmt::Formatter) -> fmt::Result {
        fmt.debug_struct("Trial")
            .field("outcome", &self.outcome)
            .finish()
    }
}

/// Searches for a smaller failure than the one `tree` produces.
///
/// `run` replays a tree. We walk the shrink candidates of the current
/// failure in order; the first candidate that also fails becomes the current
/// failure, and we carry on with its own candidates. The search ends when no
/// candidate of the current failure fails, and we return the last failure
/// found, or `None` if not even the first set of candidates produced one.
///
/// Candidates that cannot be replayed (eg: because a chained generator now
/// reads a different kind of choice from a recorded subtree) are skipped;
/// they never count as failures.
///
/// The search only ever holds the candidate sequence of the current failure,
/// so long chains of successively smaller failures run in constant stack
/// space.
pub fn minimize<A, F>(tree: &ChoiceTree, mut run: F) -> Option<Failure<A>>
where
    F: FnMut(&ChoiceTree) -> Maybe<Trial<A>>,
{
    let mut shrinks = match run(tree) {
        Ok(trial) => trial.shrinks,
        Err(e) => {
            debug!("Cannot replay tree to shrink: {}", e);
            return None;
        }
    };

    debug!("Shrinking");
    let mut best = None;
    let mut steps = 0usize;
    loop {
        let next = shrinks.find_map(|candidate| match run(&candidate) {
            Ok(Trial {
                outcome: Outcome::Failure(failure),
                shrinks,
            }) => Some((failure, shrinks)),
            Ok(_) => None,
            Err(e) => {
                trace!("Skipping candidate {:?}: {}", candidate, e);
                None
            }
        });

        match next {
            Some((failure, next_shrinks)) => {
                steps += 1;
                trace!("Re-shrinking from {:?}", failure.tree);
                best = Some(failure);
                shrinks = next_shrinks;
            }
            None => break,
        }
    }

    if best.is_some() {
        debug!("Shrinking done after {} steps", steps);
    } else {
        debug!("Nothing smaller found");
    }
    best
}
