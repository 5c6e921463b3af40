use std::env;
use std::fmt;
use std::ops::Range;
use std::panic;
use std::str::FromStr;

use thiserror::Error;

use crate::data::*;
use crate::generators::*;

const DEFAULT_NUM_TESTS: usize = 1000;
const TESTS_VAR: &str = "CHOICETREE_TESTS";
const SEED_VAR: &str = "CHOICETREE_SEED";
const REPLAY_VAR: &str = "CHOICETREE_REPLAY";
// Salts 1 and 2 derive tree children.
const ITERATION_SALT_OFFSET: u64 = 3;

/// Configuration that allows the user to override how many tests are run,
/// and which seed they derive from.
///
/// The defaults may be overridden from the environment, via
/// `CHOICETREE_TESTS`, `CHOICETREE_SEED` and `CHOICETREE_REPLAY`.
#[derive(Debug, Clone)]
pub struct CheckConfig {
    num_tests: usize,
    seed: Option<Seed>,
    replay: Option<usize>,
}

impl Default for CheckConfig {
    fn default() -> Self {
        CheckConfig::from_lookup(|key| env::var(key).ok())
    }
}

fn parsed<T, F>(lookup: &F, key: &str) -> Option<T>
where
    T: FromStr,
    T::Err: fmt::Display,
    F: Fn(&str) -> Option<String>,
{
    let raw = lookup(key)?;
    match raw.trim().parse() {
        Ok(val) => Some(val),
        Err(e) => {
            warn!("Ignoring {}={:?}: {}", key, raw, e);
            None
        }
    }
}

impl CheckConfig {
    /// Builds the default configuration, with overrides found by `lookup`.
    /// Values that do not parse are ignored.
    pub fn from_lookup<F: Fn(&str) -> Option<String>>(lookup: F) -> Self {
        CheckConfig {
            num_tests: parsed(&lookup, TESTS_VAR).unwrap_or(DEFAULT_NUM_TESTS),
            seed: parsed(&lookup, SEED_VAR),
            replay: parsed(&lookup, REPLAY_VAR),
        }
    }

    /// Overrides how many tests are executed.
    pub fn num_tests(&self, num_tests: usize) -> Self {
        CheckConfig {
            num_tests,
            ..self.clone()
        }
    }

    /// Derives every test from `seed`, rather than a random one.
    pub fn seed(&self, seed: Seed) -> Self {
        CheckConfig {
            seed: Some(seed),
            ..self.clone()
        }
    }

    /// Runs only `iteration` of the tests derived from `seed`; as printed
    /// when a check fails.
    pub fn replay(&self, seed: Seed, iteration: usize) -> Self {
        CheckConfig {
            seed: Some(seed),
            replay: Some(iteration),
            ..self.clone()
        }
    }

    /// This is the main entry point for users of the library.
    pub fn property<G: Generator>(&self, gen: G) -> Property<G> {
        Property {
            config: self.clone(),
            gen,
            reporter: LogReporter,
        }
    }

    fn iterations(&self) -> Range<usize> {
        match (self.replay, self.seed) {
            (Some(i), Some(_)) => i..i + 1,
            (Some(i), None) => {
                warn!("Cannot replay iteration {} without a seed; running all", i);
                0..self.num_tests
            }
            (None, _) => 0..self.num_tests,
        }
    }
}

/// The seed of the tree used for `iteration` of a run from `seed`.
pub fn iteration_seed(seed: Seed, iteration: usize) -> Seed {
    seed.derive(iteration as u64 + ITERATION_SALT_OFFSET)
}

/// This represents a configuration for a particular test, ie: a set of
/// generators, a set of test parameters, and somewhere to report to.
pub struct Property<G, R = LogReporter> {
    config: CheckConfig,
    gen: G,
    reporter: R,
}

/// See [`CheckConfig::property`](struct.CheckConfig.html#method.property)
/// Initiates a test with default configuration.
pub fn property<G: Generator>(gen: G) -> Property<G> {
    CheckConfig::default().property(gen)
}

/// This represents something that a check can return.
pub trait CheckResult {
    /// Check whether this result witnesses a failure.
    fn is_failure(&self) -> bool;
}

/// Receives the results of a run.
pub trait Reporter<A> {
    /// Every iteration passed.
    fn report_success(&self, seed: Seed, iterations: usize);
    /// An iteration failed; `shrunk` is the smallest failure found from it,
    /// if there was anything smaller.
    fn report_failure(
        &self,
        seed: Seed,
        iteration: usize,
        original: &Failure<A>,
        shrunk: Option<&Failure<A>>,
    );
}

/// Reports via the `log` crate.
#[derive(Debug, Clone, Copy, Default)]
pub struct LogReporter;

impl<A: fmt::Debug> Reporter<A> for LogReporter {
    fn report_success(&self, seed: Seed, iterations: usize) {
        info!("Passed {} tests from seed {}", iterations, seed);
    }

    fn report_failure(
        &self,
        seed: Seed,
        iteration: usize,
        original: &Failure<A>,
        shrunk: Option<&Failure<A>>,
    ) {
        error!(
            "Failed at iteration {} from seed {}: {:?} ({})",
            iteration, seed, original.args, original.cause
        );
        match shrunk {
            Some(f) => error!("Shrunk to: {:?} ({})", f.args, f.cause),
            None => error!("Could not shrink any further"),
        }
    }
}

/// The result of a complete run.
#[derive(Debug)]
pub enum Report<A> {
    /// Every iteration passed.
    Passed {
        /// The seed iterations were derived from.
        seed: Seed,
        /// How many iterations ran.
        iterations: usize,
    },
    /// Some iteration failed.
    Failed(FailureReport<A>),
}

/// Where, and how, a run failed.
#[derive(Debug)]
pub struct FailureReport<A> {
    /// The seed iterations were derived from.
    pub seed: Seed,
    /// The iteration that failed.
    pub iteration: usize,
    /// The failure as first found.
    pub original: Failure<A>,
    /// The smallest failure found by shrinking, if any.
    pub shrunk: Option<Failure<A>>,
}

impl<A> Report<A> {
    /// Whether the run found a failure.
    pub fn is_failure(&self) -> bool {
        match *self {
            Report::Passed { .. } => false,
            Report::Failed(_) => true,
        }
    }
}

impl<A> FailureReport<A> {
    /// The smallest failure we know of.
    pub fn minimal(&self) -> &Failure<A> {
        self.shrunk.as_ref().unwrap_or(&self.original)
    }
}

/// Failures of the engine, as opposed to the property.
#[derive(Debug, Error)]
pub enum CheckError {
    /// Generating the input of an iteration failed.
    #[error("could not generate input for iteration {iteration} from seed {seed}: {source}")]
    Generation {
        /// The run's seed.
        seed: Seed,
        /// The iteration that could not be generated.
        iteration: usize,
        /// Why.
        source: GenError,
    },
}

/// Runs `subject` once over the value `gen` reads from `tree`. The value is
/// generated a second time to record the arguments, as `subject` consumes
/// the first.
///
/// A panic inside `gen` comes back as `GenError::Panicked`, so that the
/// shrink search skips candidates a `map` cannot handle.
pub fn run_property<G, R, F>(gen: &G, tree: &ChoiceTree, subject: F) -> Maybe<Trial<G::Item>>
where
    G: Generator + ?Sized,
    R: CheckResult + fmt::Debug,
    F: Fn(G::Item) -> R,
{
    let GenResult { value, shrinks } = generate_caught(gen, tree)?;
    let res = attempt(&subject, value);
    let args = generate_caught(gen, tree)?.value;
    let outcome = if res.is_failure() {
        Outcome::Failure(Failure {
            args,
            cause: format!("{:?}", res),
            tree: tree.clone(),
        })
    } else {
        Outcome::Success(args)
    };
    Ok(Trial { outcome, shrinks })
}

fn attempt<A, R, F: Fn(A) -> R>(subject: &F, arg: A) -> Result<R, String> {
    let res = panic::catch_unwind(panic::AssertUnwindSafe(|| subject(arg)));
    res.map_err(panic_message)
}

impl<G, R> Property<G, R> {
    /// Sends results to `reporter` instead.
    pub fn with_reporter<S>(self, reporter: S) -> Property<G, S> {
        Property {
            config: self.config,
            gen: self.gen,
            reporter,
        }
    }
}

impl<G: Generator, Rep: Reporter<G::Item>> Property<G, Rep>
where
    G::Item: fmt::Debug,
{
    /// Runs `subject` over generated inputs until one fails, or the
    /// configured number of tests pass. A failure is shrunk before it is
    /// reported.
    pub fn run<R, F>(&self, subject: F) -> Result<Report<G::Item>, CheckError>
    where
        R: CheckResult + fmt::Debug,
        F: Fn(G::Item) -> R,
    {
        let seed = self.config.seed.unwrap_or_else(Seed::random);
        let iterations = self.config.iterations();
        debug!("Running iterations {:?} from seed {}", iterations, seed);
        for iteration in iterations.clone() {
            let tree = ChoiceTree::new(iteration_seed(seed, iteration));
            let trial = run_property(&self.gen, &tree, &subject).map_err(|source| {
                CheckError::Generation {
                    seed,
                    iteration,
                    source,
                }
            })?;
            trace!("Iteration {}: {:?}", iteration, trial.outcome);
            if let Outcome::Failure(original) = trial.outcome {
                let shrunk = minimize(&tree, |t| run_property(&self.gen, t, &subject));
                self.reporter
                    .report_failure(seed, iteration, &original, shrunk.as_ref());
                return Ok(Report::Failed(FailureReport {
                    seed,
                    iteration,
                    original,
                    shrunk,
                }));
            }
        }
        self.reporter.report_success(seed, iterations.len());
        Ok(Report::Passed {
            seed,
            iterations: iterations.len(),
        })
    }

    /// Use this function to specify the thing you wish to check. Panics
    /// with the smallest failing input found, and the seed and iteration
    /// that reproduce it.
    pub fn check<R: CheckResult + fmt::Debug, F: Fn(G::Item) -> R>(self, subject: F) {
        match self.run(subject) {
            Ok(Report::Passed { .. }) => trace!("Completing okay"),
            Ok(Report::Failed(report)) => {
                let min = report.minimal();
                let shrunk = if report.shrunk.is_some() {
                    ""
                } else {
                    " (could not shrink)"
                };
                panic!(
                    "Predicate failed for argument {:?}; check returned {}{}; seed {} iteration {} \
                     (replay with {}={} {}={})",
                    min.args,
                    min.cause,
                    shrunk,
                    report.seed,
                    report.iteration,
                    SEED_VAR,
                    report.seed,
                    REPLAY_VAR,
                    report.iteration
                )
            }
            Err(e) => panic!("{}", e),
        }
    }
}

impl CheckResult for bool {
    fn is_failure(&self) -> bool {
        !self
    }
}

impl<O: CheckResult, E> CheckResult for Result<O, E> {
    fn is_failure(&self) -> bool {
        self.as_ref().map(|r| r.is_failure()).unwrap_or(true)
    }
}

impl CheckResult for () {
    fn is_failure(&self) -> bool {
        false
    }
}
