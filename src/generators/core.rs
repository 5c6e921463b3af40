use std::fmt;
use std::iter;
use std::panic;
use std::rc::Rc;

use crate::data::*;

use super::collections::*;
use super::composition::*;

/// A generated value, along with the trees that might produce a smaller one.
pub struct GenResult<T> {
    /// The value read from the tree.
    pub value: T,
    /// Candidate trees, in the order they should be tried.
    pub shrinks: Shrinks,
}

impl<T> GenResult<T> {
    /// Pairs a value with its shrink candidates.
    pub fn new(value: T, shrinks: Shrinks) -> Self {
        GenResult { value, shrinks }
    }

    /// A value that cannot be shrunk any further.
    pub fn unshrinkable(value: T) -> Self {
        GenResult::new(value, Box::new(iter::empty()))
    }
}

impl<T: fmt::Debug> fmt::Debug for GenResult<T> {
    fn fmt(&self, fmt: &mut fmt::Formatter) -> fmt::Result {
        fmt.debug_struct("GenResult")
            .field("value", &self.value)
            .finish()
    }
}

/// Something that can read values of some type out of a
/// [`ChoiceTree`](../data/struct.ChoiceTree.html).
///
/// Generating is a pure function of the tree: the same tree always yields
/// the same value and the same shrink candidates.
pub trait Generator {
    /// The type of values generated.
    type Item;

    /// Reads a value from `tree`.
    fn generate(&self, tree: &ChoiceTree) -> Maybe<GenResult<Self::Item>>;

    /// Converts the generated values with `f`. Shrinking happens on the
    /// underlying tree, so `f` is re-applied to every replayed candidate.
    fn map<F, U>(self, f: F) -> Mapped<Self, F>
    where
        Self: Sized,
        F: Fn(Self::Item) -> U,
    {
        Mapped(self, f)
    }

    /// Uses the value generated to choose a second generator, and yields
    /// the value produced by that.
    ///
    /// If `f` can return generators that read different kinds of choices,
    /// shrinking the first value may yield candidates whose second half
    /// cannot be replayed; these are skipped, so shrinking gets coarser.
    fn flat_map<F, H>(self, f: F) -> FlatMapped<Self, F>
    where
        Self: Sized,
        F: Fn(Self::Item) -> H,
        H: Generator,
    {
        FlatMapped(self, f)
    }

    /// Only yields values for which `pred` returns true, redrawing up to
    /// (by default) 100 times.
    fn filter<F>(self, pred: F) -> Filtered<Self, F>
    where
        Self: Sized,
        F: Fn(&Self::Item) -> bool,
    {
        Filtered::new(self, pred)
    }

    /// For generators of `Result`s: redraws whenever an error satisfying
    /// `is_ignorable` comes up. Other errors fail generation straight away.
    fn ignore_errors<F, T, E>(self, is_ignorable: F) -> IgnoreErrors<Self, F>
    where
        Self: Sized + Generator<Item = Result<T, E>>,
        F: Fn(&E) -> bool,
    {
        IgnoreErrors::new(self, is_ignorable)
    }

    /// Generates vectors of `size` items. See [`vecs`](fn.vecs.html).
    fn list(self, size: usize) -> VecGenerator<Self>
    where
        Self: Sized,
    {
        vecs(self, size)
    }

    /// Generates vectors of between `min` and `max` items (inclusive). See
    /// [`vecs_between`](fn.vecs_between.html).
    fn list_between(self, min: usize, max: usize) -> VecsBetweenGenerator<Self>
    where
        Self: Sized,
    {
        vecs_between(self, min, max)
    }

    /// Generates sets of `size` distinct items. See [`sets`](fn.sets.html).
    fn set(self, size: usize) -> SetGenerator<Self>
    where
        Self: Sized,
    {
        sets(self, size)
    }

    /// Erases the type of this generator.
    fn boxed(self) -> Box<dyn Generator<Item = Self::Item>>
    where
        Self: Sized + 'static,
    {
        Box::new(self)
    }
}

impl<G: Generator + ?Sized> Generator for Box<G> {
    type Item = G::Item;
    fn generate(&self, tree: &ChoiceTree) -> Maybe<GenResult<Self::Item>> {
        (**self).generate(tree)
    }
}

impl<G: Generator + ?Sized> Generator for Rc<G> {
    type Item = G::Item;
    fn generate(&self, tree: &ChoiceTree) -> Maybe<GenResult<Self::Item>> {
        (**self).generate(tree)
    }
}

impl<'a, G: Generator + ?Sized> Generator for &'a G {
    type Item = G::Item;
    fn generate(&self, tree: &ChoiceTree) -> Maybe<GenResult<Self::Item>> {
        (**self).generate(tree)
    }
}

/// See [`consts`](fn.consts.html)
#[derive(Debug, Clone)]
pub struct Const<V>(V);

/// See [`lazy`](fn.lazy.html)
#[derive(Debug, Clone)]
pub struct Lazy<F>(F);

/// Always generates `val`. Reads nothing from the tree, and never shrinks.
pub fn consts<V: Clone>(val: V) -> Const<V> {
    Const(val)
}

/// Builds the generator with `f` each time it is used. Handy for
/// recursive generators.
pub fn lazy<G: Generator, F: Fn() -> G>(f: F) -> Lazy<F> {
    Lazy(f)
}

impl<V: Clone> Generator for Const<V> {
    type Item = V;
    fn generate(&self, _: &ChoiceTree) -> Maybe<GenResult<Self::Item>> {
        Ok(GenResult::unshrinkable(self.0.clone()))
    }
}

impl<G: Generator, F: Fn() -> G> Generator for Lazy<F> {
    type Item = G::Item;
    fn generate(&self, tree: &ChoiceTree) -> Maybe<GenResult<Self::Item>> {
        (self.0)().generate(tree)
    }
}

/// Generates a single value from a fresh tree rooted at `seed`, without
/// any shrinking.
pub fn sample<G: Generator + ?Sized>(gen: &G, seed: Seed) -> Maybe<G::Item> {
    gen.generate(&ChoiceTree::new(seed)).map(|r| r.value)
}

/// Generates from `tree` as `gen.generate` does, but turns a panic inside
/// the generator into `GenError::Panicked`.
pub fn generate_caught<G: Generator + ?Sized>(
    gen: &G,
    tree: &ChoiceTree,
) -> Maybe<GenResult<G::Item>> {
    panic::catch_unwind(panic::AssertUnwindSafe(|| gen.generate(tree)))
        .unwrap_or_else(|err| Err(GenError::Panicked(panic_message(err))))
}

/// Finds the smallest tree reachable from `tree` by shrinking, whose value
/// still satisfies `pred`. Returns `tree` itself if nothing smaller does.
pub fn find_minimal<G: Generator + ?Sized, F: Fn(G::Item) -> bool>(
    gen: &G,
    tree: ChoiceTree,
    pred: F,
) -> ChoiceTree {
    let found = minimize(&tree, |t| {
        let GenResult { value, shrinks } = generate_caught(gen, t)?;
        let outcome = if pred(value) {
            Outcome::Failure(Failure {
                args: (),
                cause: "predicate held".to_string(),
                tree: t.clone(),
            })
        } else {
            Outcome::Success(())
        };
        Ok(Trial { outcome, shrinks })
    });
    found.map(|f| f.tree).unwrap_or(tree)
}
