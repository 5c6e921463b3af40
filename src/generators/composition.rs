use std::fmt;

use crate::data::*;

use super::core::*;
use super::numbers::towards;

const DEFAULT_MAX_ATTEMPTS: usize = 100;

/// See [`Generator::map`](trait.Generator.html#method.map)
#[derive(Debug, Clone)]
pub struct Mapped<G, F>(pub(crate) G, pub(crate) F);

/// See [`Generator::flat_map`](trait.Generator.html#method.flat_map)
#[derive(Debug, Clone)]
pub struct FlatMapped<G, F>(pub(crate) G, pub(crate) F);

/// See [`Generator::filter`](trait.Generator.html#method.filter)
#[derive(Debug, Clone)]
pub struct Filtered<G, F> {
    inner: G,
    pred: F,
    max_attempts: usize,
}

/// See [`Generator::ignore_errors`](trait.Generator.html#method.ignore_errors)
#[derive(Debug, Clone)]
pub struct IgnoreErrors<G, F> {
    inner: G,
    is_ignorable: F,
    max_attempts: usize,
}

/// See [`one_of`](fn.one_of.html) or [`frequency`](fn.frequency.html)
pub struct OneOfGenerator<T> {
    alternatives: Vec<(u64, Box<dyn Generator<Item = T>>)>,
}

/// See [`generator_fn`](fn.generator_fn.html)
#[derive(Debug, Clone)]
pub struct GeneratorFn<F>(F);

/// Makes it slightly easier to implement generators, by allowing the user
/// to specify a function, rather than needing to build it from either
/// combinators, or create a new Generator instance.
pub fn generator_fn<T, F>(f: F) -> GeneratorFn<F>
where
    F: Fn(&ChoiceTree) -> Maybe<GenResult<T>>,
{
    GeneratorFn(f)
}

/// Picks uniformly between alternatives. Add more with
/// [`or`](struct.OneOfGenerator.html#method.or).
///
/// ```
/// use choicetree::generators::*;
/// let gen = one_of(consts(1)).or(ints(10..=20)).or(consts(100));
/// ```
pub fn one_of<G: Generator + 'static>(gen: G) -> OneOfGenerator<G::Item> {
    frequency(1, gen)
}

/// Picks between alternatives in proportion to their weights. Add more with
/// [`or_weighted`](struct.OneOfGenerator.html#method.or_weighted).
pub fn frequency<G: Generator + 'static>(weight: u64, gen: G) -> OneOfGenerator<G::Item> {
    OneOfGenerator {
        alternatives: Vec::new(),
    }
    .or_weighted(weight, gen)
}

impl<T, F> Generator for GeneratorFn<F>
where
    F: Fn(&ChoiceTree) -> Maybe<GenResult<T>>,
{
    type Item = T;
    fn generate(&self, tree: &ChoiceTree) -> Maybe<GenResult<Self::Item>> {
        (self.0)(tree)
    }
}

impl<G: Generator, F: Fn(G::Item) -> U, U> Generator for Mapped<G, F> {
    type Item = U;
    fn generate(&self, tree: &ChoiceTree) -> Maybe<GenResult<Self::Item>> {
        let GenResult { value, shrinks } = self.0.generate(tree)?;
        Ok(GenResult::new((self.1)(value), shrinks))
    }
}

/// Reads a value with `first` from the left of `tree`, and uses it to build
/// the generator that reads the right.
pub(crate) fn bind<G, F, H>(tree: &ChoiceTree, first: &G, then: F) -> Maybe<GenResult<H::Item>>
where
    G: Generator + ?Sized,
    F: FnOnce(G::Item) -> H,
    H: Generator,
{
    let GenResult {
        value,
        shrinks: first_shrinks,
    } = first.generate(tree.left())?;
    let GenResult {
        value,
        shrinks: second_shrinks,
    } = then(value).generate(tree.right())?;

    let (l, r) = (tree.clone(), tree.clone());
    let shrinks = first_shrinks
        .map(move |s| l.with_left(s))
        .chain(second_shrinks.map(move |s| r.with_right(s)));
    Ok(GenResult::new(value, Box::new(shrinks)))
}

impl<G, F, H> Generator for FlatMapped<G, F>
where
    G: Generator,
    F: Fn(G::Item) -> H,
    H: Generator,
{
    type Item = H::Item;
    fn generate(&self, tree: &ChoiceTree) -> Maybe<GenResult<Self::Item>> {
        bind(tree, &self.0, &self.1)
    }
}

enum Attempt<T> {
    Accepted(GenResult<T>),
    Missed(String),
}

// Attempt `k` reads from the left of the `k`th node along the right spine.
// Once one is accepted, the root is pinned to `k` so that replays go
// straight to that attempt.
fn retrying<T, A, X>(
    tree: &ChoiceTree,
    max_attempts: usize,
    mut attempt: A,
    exhausted: X,
) -> Maybe<GenResult<T>>
where
    A: FnMut(&ChoiceTree) -> Maybe<Attempt<T>>,
    X: FnOnce(usize, String) -> GenError,
{
    let last = max_attempts as i64 - 1;
    if let Some(k) = tree.pinned_int(&(0..=last))? {
        let k = k as usize;
        let spine = Spine::walk(tree, k + 1);
        return match attempt(spine.node(k).left())? {
            Attempt::Accepted(res) => Ok(pin_attempt(spine, k, res)),
            Attempt::Missed(why) => Err(GenError::Rejected(format!("attempt {}: {}", k, why))),
        };
    }

    let mut nodes = Vec::new();
    let mut node = tree.clone();
    let mut missed = String::new();
    for k in 0..max_attempts {
        match attempt(node.left())? {
            Attempt::Accepted(res) => {
                nodes.push(node);
                return Ok(pin_attempt(Spine::new(nodes), k, res));
            }
            Attempt::Missed(why) => {
                trace!("Attempt {} missed: {}", k, why);
                missed = why;
                let next = node.right().clone();
                nodes.push(node);
                node = next;
            }
        }
    }
    Err(exhausted(max_attempts, missed))
}

fn pin_attempt<T>(spine: Spine, k: usize, res: GenResult<T>) -> GenResult<T> {
    let GenResult { value, shrinks } = res;
    let shrinks = shrinks.map(move |s| spine.with_left_at(k, s).fix(Value::Int(k as i64)));
    GenResult::new(value, Box::new(shrinks))
}

impl<G, F> Filtered<G, F> {
    pub(crate) fn new(inner: G, pred: F) -> Self {
        Filtered {
            inner,
            pred,
            max_attempts: DEFAULT_MAX_ATTEMPTS,
        }
    }

    /// Specify how many draws to make before giving up.
    pub fn max_attempts(mut self, attempts: usize) -> Self {
        assert!(attempts > 0, "A filter needs at least one attempt");
        self.max_attempts = attempts;
        self
    }
}

impl<G: Generator, F: Fn(&G::Item) -> bool> Generator for Filtered<G, F>
where
    G::Item: fmt::Debug,
{
    type Item = G::Item;
    fn generate(&self, tree: &ChoiceTree) -> Maybe<GenResult<Self::Item>> {
        retrying(
            tree,
            self.max_attempts,
            |t| {
                let res = self.inner.generate(t)?;
                if (self.pred)(&res.value) {
                    Ok(Attempt::Accepted(res))
                } else {
                    Ok(Attempt::Missed(format!("{:?}", res.value)))
                }
            },
            |attempts, last_rejected| GenError::FilterLimitReached {
                attempts,
                last_rejected,
            },
        )
    }
}

impl<G, F> IgnoreErrors<G, F> {
    pub(crate) fn new(inner: G, is_ignorable: F) -> Self {
        IgnoreErrors {
            inner,
            is_ignorable,
            max_attempts: DEFAULT_MAX_ATTEMPTS,
        }
    }

    /// Specify how many draws to make before giving up.
    pub fn max_attempts(mut self, attempts: usize) -> Self {
        assert!(attempts > 0, "Ignoring errors needs at least one attempt");
        self.max_attempts = attempts;
        self
    }
}

impl<G, F, T, E> Generator for IgnoreErrors<G, F>
where
    G: Generator<Item = Result<T, E>>,
    F: Fn(&E) -> bool,
    E: fmt::Display,
{
    type Item = T;
    fn generate(&self, tree: &ChoiceTree) -> Maybe<GenResult<Self::Item>> {
        retrying(
            tree,
            self.max_attempts,
            |t| {
                let GenResult { value, shrinks } = self.inner.generate(t)?;
                match value {
                    Ok(v) => Ok(Attempt::Accepted(GenResult::new(v, shrinks))),
                    Err(ref e) if (self.is_ignorable)(e) => Ok(Attempt::Missed(e.to_string())),
                    Err(e) => Err(GenError::Unhandled(e.to_string())),
                }
            },
            |attempts, cause| GenError::ExceptionLimitReached { attempts, cause },
        )
    }
}

impl<T> OneOfGenerator<T> {
    /// Adds an alternative with weight 1.
    pub fn or<G: Generator<Item = T> + 'static>(self, gen: G) -> Self {
        self.or_weighted(1, gen)
    }

    /// Adds an alternative, chosen in proportion to `weight`.
    pub fn or_weighted<G: Generator<Item = T> + 'static>(mut self, weight: u64, gen: G) -> Self {
        assert!(weight > 0, "Alternatives must have a positive weight");
        assert!(
            self.total_weight()
                .checked_add(weight)
                .map_or(false, |t| t <= i64::max_value() as u64),
            "Total weight of alternatives overflows"
        );
        self.alternatives.push((weight, Box::new(gen)));
        self
    }

    fn total_weight(&self) -> u64 {
        self.alternatives.iter().map(|&(w, _)| w).sum()
    }

    // The first draw that selects each alternative.
    fn starts(&self) -> Vec<i64> {
        self.alternatives
            .iter()
            .scan(0i64, |acc, &(w, _)| {
                let start = *acc;
                *acc += w as i64;
                Some(start)
            })
            .collect()
    }
}

impl<T> fmt::Debug for OneOfGenerator<T> {
    fn fmt(&self, fmt: &mut fmt::Formatter) -> fmt::Result {
        let weights = self.alternatives.iter().map(|&(w, _)| w).collect::<Vec<_>>();
        fmt.debug_struct("OneOfGenerator")
            .field("weights", &weights)
            .finish()
    }
}

impl<T> Generator for OneOfGenerator<T> {
    type Item = T;
    fn generate(&self, tree: &ChoiceTree) -> Maybe<GenResult<Self::Item>> {
        let starts = self.starts();
        let draw = tree
            .left()
            .read_int(&(0..=self.total_weight() as i64 - 1))?;
        let index = starts.iter().rposition(|&s| s <= draw).unwrap_or(0);

        let spine = Spine::walk(tree.right(), index + 1);
        let GenResult { value, shrinks } = self.alternatives[index].1.generate(spine.node(index).left())?;

        let t = tree.clone();
        let switches = towards(index as i64, 0).map(move |j| {
            let pinned = t.left().fix(Value::Int(starts[j as usize]));
            t.with_left(pinned)
        });
        let t = tree.clone();
        let values = shrinks.map(move |s| t.with_right(spine.with_left_at(index, s)));
        Ok(GenResult::new(value, Box::new(switches.chain(values))))
    }
}
