use std::collections::BTreeSet;
use std::rc::Rc;

use crate::data::*;

use super::composition::bind;
use super::core::*;
use super::numbers::*;

const DEFAULT_MAX_RETRIES: usize = 100;

/// See [`vecs`](fn.vecs.html)
#[derive(Debug, Clone)]
pub struct VecGenerator<G> {
    inner: G,
    size: usize,
    min: usize,
}

/// See [`vecs_between`](fn.vecs_between.html)
#[derive(Debug, Clone)]
pub struct VecsBetweenGenerator<G> {
    inner: G,
    min: usize,
    max: usize,
}

/// See [`sets`](fn.sets.html)
#[derive(Debug)]
pub struct SetGenerator<G> {
    inner: Rc<G>,
    size: usize,
    max_retries: usize,
}

/// Generates vectors of `size` items given by `inner`.
///
/// Items live in the left children of the nodes along the tree's right
/// spine. When shrinking, we first try dropping items from the end, then
/// from the front, and then shrinking each item in turn.
pub fn vecs<G>(inner: G, size: usize) -> VecGenerator<G> {
    VecGenerator {
        inner,
        size,
        min: 0,
    }
}

/// Generates vectors of between `min` and `max` items (inclusive). The
/// length is drawn first, and shrinks before the items do; no shrink ever
/// yields fewer than `min` items.
pub fn vecs_between<G>(inner: G, min: usize, max: usize) -> VecsBetweenGenerator<G> {
    assert!(min <= max, "Empty length range: {}..={}", min, max);
    VecsBetweenGenerator { inner, min, max }
}

/// Generates sets of `size` distinct items given by `inner`.
///
/// Duplicate draws are skipped; if `max_retries` (by default, 100)
/// duplicates come up in a row, generation fails with
/// `ImpossibleSetSize`.
///
/// ```
/// use choicetree::generators::*;
/// use choicetree::data::Seed;
/// let set = sample(&ints(0..=9).set(4), Seed::new(7)).expect("a set");
/// assert_eq!(set.len(), 4);
/// ```
pub fn sets<G>(inner: G, size: usize) -> SetGenerator<G> {
    SetGenerator {
        inner: Rc::new(inner),
        size,
        max_retries: DEFAULT_MAX_RETRIES,
    }
}

impl<G: Generator> Generator for VecGenerator<G> {
    type Item = Vec<G::Item>;
    fn generate(&self, tree: &ChoiceTree) -> Maybe<GenResult<Self::Item>> {
        let mut values = Vec::new();
        let mut shrinks = Vec::new();
        let mut nodes = Vec::new();
        let mut node = tree.clone();
        while values.len() < self.size
            && (values.len() < self.min || node.pinned_bool()? != Some(false))
        {
            let GenResult { value, shrinks: s } = self.inner.generate(node.left())?;
            values.push(value);
            shrinks.push(s);
            let next = node.right().clone();
            nodes.push(node);
            node = next;
        }
        nodes.push(node);

        Ok(GenResult::new(
            values,
            list_shrinks(Spine::new(nodes), shrinks, self.min),
        ))
    }
}

// `spine` holds one node per item, plus the node after the last item. Size
// shrinks keep at least `min` items.
fn list_shrinks(spine: Spine, items: Vec<Shrinks>, min: usize) -> Shrinks {
    let len = items.len();
    let (tail, head) = (spine.clone(), spine.clone());
    let truncations = (min..len).map(move |keep| {
        let end = tail.node(keep).fix(Value::Bool(false));
        tail.splice(0, keep, end)
    });
    let drops = (1..len)
        .rev()
        .filter(move |from| len - from >= min)
        .map(move |from| {
            let end = head.node(len).fix(Value::Bool(false));
            head.splice(from, len, end)
        });
    Box::new(
        truncations
            .chain(drops)
            .chain(spine.shrink_each_left(items)),
    )
}

impl<G: Generator> Generator for VecsBetweenGenerator<G> {
    type Item = Vec<G::Item>;
    fn generate(&self, tree: &ChoiceTree) -> Maybe<GenResult<Self::Item>> {
        let lengths = ints(self.min as i64..=self.max as i64);
        bind(tree, &lengths, |n| VecGenerator {
            inner: &self.inner,
            size: n as usize,
            min: self.min,
        })
    }
}

impl<G> SetGenerator<G> {
    /// Specify how many duplicates in a row to tolerate before giving up.
    pub fn max_retries(mut self, retries: usize) -> Self {
        self.max_retries = retries;
        self
    }
}

impl<G> Clone for SetGenerator<G> {
    fn clone(&self) -> Self {
        SetGenerator {
            inner: self.inner.clone(),
            size: self.size,
            max_retries: self.max_retries,
        }
    }
}

impl<G> Generator for SetGenerator<G>
where
    G: Generator + 'static,
    G::Item: Ord + Clone + 'static,
{
    type Item = BTreeSet<G::Item>;
    fn generate(&self, tree: &ChoiceTree) -> Maybe<GenResult<Self::Item>> {
        let mut set = BTreeSet::new();
        let mut accepted = Vec::new();
        let mut shrinks = Vec::new();
        let mut duplicates = 0;
        let mut node = tree.clone();
        while set.len() < self.size && node.pinned_bool()? != Some(false) {
            let GenResult { value, shrinks: s } = self.inner.generate(node.left())?;
            let next = node.right().clone();
            if set.insert(value) {
                duplicates = 0;
                accepted.push(node);
                shrinks.push(s);
            } else {
                duplicates += 1;
                trace!("Duplicate draw {} of {}", duplicates, self.max_retries);
                if duplicates >= self.max_retries {
                    return Err(GenError::ImpossibleSetSize {
                        wanted: self.size,
                        found: set.len(),
                        attempts: duplicates,
                    });
                }
            }
            node = next;
        }

        let compacted = Compacted {
            accepted: Rc::new(accepted),
            end: node,
        };
        let values = compacted.value_shrinks(self.inner.clone(), Rc::new(set.clone()), shrinks);
        let shrinks = compacted.size_shrinks().chain(values);
        Ok(GenResult::new(set, Box::new(shrinks)))
    }
}

// A spine made of only the accepted draws of a set, so that replays never
// see a duplicate.
#[derive(Clone)]
struct Compacted {
    accepted: Rc<Vec<ChoiceTree>>,
    end: ChoiceTree,
}

impl Compacted {
    fn keep(&self, from: usize, to: usize) -> ChoiceTree {
        self.accepted[from..to]
            .iter()
            .rev()
            .fold(self.end.fix(Value::Bool(false)), |tree, node| {
                node.with_right(tree)
            })
    }

    fn replacing(&self, i: usize, item: ChoiceTree) -> ChoiceTree {
        let tail = self.keep(i + 1, self.accepted.len());
        let tree = self.accepted[i].with_left(item).with_right(tail);
        self.accepted[..i]
            .iter()
            .rev()
            .fold(tree, |tree, node| node.with_right(tree))
    }

    fn size_shrinks(&self) -> impl Iterator<Item = ChoiceTree> {
        let len = self.accepted.len();
        let (tail, head) = (self.clone(), self.clone());
        (0..len)
            .map(move |keep| tail.keep(0, keep))
            .chain((1..len).rev().map(move |from| head.keep(from, len)))
    }

    // Candidates that would reproduce an element already in the set are
    // dropped here, rather than left for the search to stumble over.
    fn value_shrinks<G>(
        &self,
        inner: Rc<G>,
        set: Rc<BTreeSet<G::Item>>,
        items: Vec<Shrinks>,
    ) -> impl Iterator<Item = ChoiceTree>
    where
        G: Generator + 'static,
        G::Item: Ord + 'static,
    {
        let this = self.clone();
        items.into_iter().enumerate().flat_map(move |(i, candidates)| {
            let (this, inner, set) = (this.clone(), inner.clone(), set.clone());
            candidates
                .filter(move |c| match generate_caught(&*inner, c) {
                    Ok(res) => !set.contains(&res.value),
                    Err(_) => false,
                })
                .map(move |c| this.replacing(i, c))
        })
    }
}

#[cfg(test)]
mod tests {
    extern crate env_logger;
    use super::*;
    use crate::generators::core::tests::*;

    fn set_of(items: &[i64]) -> BTreeSet<i64> {
        items.iter().cloned().collect()
    }

    #[test]
    fn vecs_should_generate_same_output_given_same_input() {
        should_generate_same_output_given_same_input(vecs(booleans(), 10));
    }

    #[test]
    fn vecs_usually_generates_different_output_for_different_inputs() {
        usually_generates_different_output_for_different_inputs(vecs(booleans(), 10))
    }

    #[test]
    fn vecs_have_the_requested_length() {
        let gen = ints(0..=9).list(7);
        for _ in 0..100 {
            assert_eq!(sample(&gen, Seed::random()).expect("a list").len(), 7);
        }
    }

    #[test]
    fn vecs_shrink_by_truncating_dropping_then_items() {
        let _ = env_logger::try_init();
        let gen = ints(0..=10).list(3);
        let tree = tree_with_elements(&[Value::Int(5), Value::Int(6), Value::Int(7)]);
        assert_eq!(gen.generate(&tree).expect("a list").value, vec![5, 6, 7]);

        let expected: Vec<Maybe<Vec<i64>>> = vec![
            vec![],
            vec![5],
            vec![5, 6],
            vec![7],
            vec![6, 7],
            vec![0, 6, 7],
            vec![3, 6, 7],
            vec![4, 6, 7],
            vec![5, 0, 7],
            vec![5, 3, 7],
            vec![5, 5, 7],
            vec![5, 6, 0],
            vec![5, 6, 4],
            vec![5, 6, 6],
        ]
        .into_iter()
        .map(Ok)
        .collect();
        assert_eq!(shrink_values(&gen, &tree), expected);
    }

    #[test]
    fn vec_bools_minimize_to_empty() {
        let _ = env_logger::try_init();
        should_minimize_to(vecs_between(booleans(), 0, 10), vec![])
    }

    #[test]
    fn vec_bools_can_minimise_with_predicate() {
        let _ = env_logger::try_init();
        should_minimize_to(
            vecs_between(booleans(), 0, 10).filter(|v| v.len() > 2),
            vec![false, false, false],
        );
    }

    #[test]
    fn vecs_between_minimize_to_their_shortest_length() {
        let _ = env_logger::try_init();
        should_minimize_to(vecs_between(booleans(), 3, 6), vec![false, false, false]);
    }

    #[test]
    fn vecs_between_shrinks_never_go_below_the_minimum() {
        let gen = ints(0..=10).list_between(3, 6);
        for _ in 0..20 {
            let tree = ChoiceTree::new(Seed::random());
            for shrunk in shrink_values(&gen, &tree).into_iter().filter_map(Result::ok) {
                assert!(shrunk.len() >= 3 && shrunk.len() <= 6, "{:?}", shrunk);
            }
        }
    }

    #[test]
    fn fixed_length_lists_shrink_down_to_empty() {
        let tree = tree_with_elements(&[Value::Bool(true), Value::Bool(true)]);
        let lengths = shrink_values(&booleans().list(2), &tree)
            .into_iter()
            .map(|v| v.expect("a list").len())
            .collect::<Vec<_>>();
        assert_eq!(&lengths[..3], &[0, 1, 1]);
    }

    #[test]
    fn vecs_between_stay_within_bounds() {
        let gen = booleans().list_between(3, 6);
        for _ in 0..100 {
            let len = sample(&gen, Seed::random()).expect("a list").len();
            assert!(len >= 3 && len <= 6, "{} in 3..=6", len);
        }
    }

    #[test]
    fn vecs_between_should_generate_same_output_given_same_input() {
        should_generate_same_output_given_same_input(i64s().list_between(0, 20))
    }

    #[test]
    fn sets_should_generate_same_output_given_same_input() {
        should_generate_same_output_given_same_input(ints(0..=1000).set(8))
    }

    #[test]
    fn sets_usually_generates_different_output_for_different_inputs() {
        usually_generates_different_output_for_different_inputs(ints(0..=1000).set(8))
    }

    #[test]
    fn sets_have_exactly_the_requested_size() {
        let gen = ints(0..=20).set(10);
        for _ in 0..100 {
            assert_eq!(sample(&gen, Seed::random()).expect("a set").len(), 10);
        }
    }

    #[test]
    fn sets_exhausting_their_domain_still_fill_up() {
        let gen = ints(0..=2).set(3);
        assert_eq!(sample(&gen, Seed::random()), Ok(set_of(&[0, 1, 2])));
    }

    #[test]
    fn impossible_set_sizes_are_reported() {
        match sample(&ints(0..=1).set(3), Seed::random()) {
            Err(GenError::ImpossibleSetSize { wanted, found, attempts }) => {
                assert_eq!((wanted, found, attempts), (3, 2, 100));
            }
            other => panic!("Expected an impossible size, got {:?}", other),
        }
    }

    #[test]
    fn max_retries_bounds_the_duplicates() {
        match sample(&ints(0..=1).set(3).max_retries(4), Seed::random()) {
            Err(GenError::ImpossibleSetSize { attempts, .. }) => assert_eq!(attempts, 4),
            other => panic!("Expected an impossible size, got {:?}", other),
        }
    }

    #[test]
    fn singleton_set_shrinks_exactly() {
        let gen = ints(0..=4).set(1);
        let tree = tree_with_elements(&[Value::Int(4)]);
        assert_eq!(gen.generate(&tree).expect("a set").value, set_of(&[4]));
        assert_eq!(
            shrink_values(&gen, &tree),
            vec![
                Ok(set_of(&[])),
                Ok(set_of(&[0])),
                Ok(set_of(&[2])),
                Ok(set_of(&[3])),
            ]
        );
    }

    #[test]
    fn full_domain_sets_have_no_equal_size_shrinks() {
        let gen = ints(0..=2).set(3);
        for _ in 0..20 {
            let tree = ChoiceTree::new(Seed::random());
            let shrinks = shrink_values(&gen, &tree);
            assert_eq!(shrinks.len(), 5);
            for s in shrinks {
                let s = s.expect("replayable shrink");
                assert!(s.len() < 3, "{:?} is smaller", s);
            }
        }
    }

    #[test]
    fn set_shrinks_drop_or_replace_one_element() {
        let gen = ints(0..=50).set(5);
        for _ in 0..20 {
            let tree = ChoiceTree::new(Seed::random());
            let original = gen.generate(&tree).expect("a set").value;
            for s in shrink_values(&gen, &tree) {
                let s = s.expect("replayable shrink");
                assert!(
                    s.len() < original.len() || s.symmetric_difference(&original).count() == 2,
                    "{:?} from {:?}",
                    s,
                    original
                );
            }
        }
    }

    #[test]
    fn set_duplicates_are_skipped_on_the_spine() {
        let gen = ints(0..=9).set(2);
        let tree = tree_with_elements(&[Value::Int(3), Value::Int(3), Value::Int(8)]);
        assert_eq!(gen.generate(&tree).expect("a set").value, set_of(&[3, 8]));
        for s in shrink_values(&gen, &tree) {
            let s = s.expect("replayable shrink");
            assert!(s.len() < 2 || s.contains(&3) != s.contains(&8), "{:?}", s);
        }
    }

    #[test]
    fn sets_minimize_to_empty() {
        should_minimize_to(ints(0..=100).set(3), BTreeSet::new())
    }

    #[test]
    fn full_sets_minimize_to_smallest_elements() {
        should_minimize_to(
            ints(0..=100).set(3).filter(|s| s.len() == 3),
            set_of(&[0, 1, 2]),
        )
    }
}
