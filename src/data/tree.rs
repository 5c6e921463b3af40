use std::cell::OnceCell;
use std::fmt;
use std::ops::RangeInclusive;
use std::rc::Rc;

use super::errors::*;
use super::seed::*;

/// A lazily evaluated sequence of candidate trees, each of which should be
/// replayed through the generator that produced it.
pub type Shrinks = Box<dyn Iterator<Item = ChoiceTree>>;

/// The kinds of scalar that can be recorded in a tree.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ChoiceKind {
    /// A bounded integer.
    Int,
    /// A boolean.
    Bool,
    /// A character.
    Char,
}

/// A recorded scalar. The variant identifies its kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Value {
    /// See [`ChoiceKind::Int`](enum.ChoiceKind.html)
    Int(i64),
    /// See [`ChoiceKind::Bool`](enum.ChoiceKind.html)
    Bool(bool),
    /// See [`ChoiceKind::Char`](enum.ChoiceKind.html)
    Char(char),
}

/// The decision held by a single node.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Choice {
    /// Nothing recorded; reads draw from the seed.
    Undetermined(Seed),
    /// A previously recorded value that reads must accept.
    Fixed(Value),
}

/// An infinite binary tree of choices, derived from a root seed.
///
/// Children are computed on first access from the node's seed lineage, and
/// memoized. Trees are persistent: [`fix`](#method.fix),
/// [`with_left`](#method.with_left) and [`with_right`](#method.with_right)
/// build new nodes that share all unmodified structure.
#[derive(Clone)]
pub struct ChoiceTree {
    node: Rc<Node>,
}

struct Node {
    seed: Seed,
    choice: Choice,
    left: OnceCell<ChoiceTree>,
    right: OnceCell<ChoiceTree>,
}

impl fmt::Display for ChoiceKind {
    fn fmt(&self, fmt: &mut fmt::Formatter) -> fmt::Result {
        let name = match *self {
            ChoiceKind::Int => "int",
            ChoiceKind::Bool => "bool",
            ChoiceKind::Char => "char",
        };
        fmt.write_str(name)
    }
}

impl Value {
    /// The kind tag of this value.
    pub fn kind(&self) -> ChoiceKind {
        match *self {
            Value::Int(_) => ChoiceKind::Int,
            Value::Bool(_) => ChoiceKind::Bool,
            Value::Char(_) => ChoiceKind::Char,
        }
    }
}

fn mismatch<D: fmt::Debug>(expected: ChoiceKind, domain: D, recorded: Value) -> GenError {
    if recorded.kind() != expected {
        trace!("Recorded {} choice read as {}", recorded.kind(), expected);
    }
    GenError::MismatchedChoice {
        expected,
        domain: format!("{:?}", domain),
        recorded,
    }
}

// Characters are drawn from a dense ordinal space that skips the surrogates.
const SURROGATES_START: u32 = 0xd800;
const SURROGATES_LEN: u32 = 0x800;

pub(crate) fn char_ordinal(c: char) -> u32 {
    let c = c as u32;
    if c >= SURROGATES_START + SURROGATES_LEN {
        c - SURROGATES_LEN
    } else {
        c
    }
}

pub(crate) fn char_from_ordinal(ordinal: u32) -> Option<char> {
    let c = if ordinal >= SURROGATES_START {
        ordinal + SURROGATES_LEN
    } else {
        ordinal
    };
    ::std::char::from_u32(c)
}

impl ChoiceTree {
    /// A fresh tree where every node is undetermined.
    pub fn new(seed: Seed) -> Self {
        ChoiceTree::of(Node {
            seed,
            choice: Choice::Undetermined(seed),
            left: OnceCell::new(),
            right: OnceCell::new(),
        })
    }

    fn of(node: Node) -> Self {
        ChoiceTree {
            node: Rc::new(node),
        }
    }

    /// The seed this node's lineage derives from. Unaffected by fixing.
    pub fn seed(&self) -> Seed {
        self.node.seed
    }

    /// This node's own decision.
    pub fn choice(&self) -> &Choice {
        &self.node.choice
    }

    /// The left child, derived on first access.
    pub fn left(&self) -> &ChoiceTree {
        let seed = self.node.seed;
        self.node
            .left
            .get_or_init(|| ChoiceTree::new(seed.derive(LEFT_SALT)))
    }

    /// The right child, derived on first access.
    pub fn right(&self) -> &ChoiceTree {
        let seed = self.node.seed;
        self.node
            .right
            .get_or_init(|| ChoiceTree::new(seed.derive(RIGHT_SALT)))
    }

    /// A copy of this node with its own choice fixed to `value`. The
    /// children (and their lineage) are unchanged.
    pub fn fix(&self, value: Value) -> Self {
        ChoiceTree::of(Node {
            seed: self.node.seed,
            choice: Choice::Fixed(value),
            left: self.node.left.clone(),
            right: self.node.right.clone(),
        })
    }

    /// A copy of this node with `child` as its left subtree.
    pub fn with_left(&self, child: ChoiceTree) -> Self {
        ChoiceTree::of(Node {
            seed: self.node.seed,
            choice: self.node.choice,
            left: OnceCell::from(child),
            right: self.node.right.clone(),
        })
    }

    /// A copy of this node with `child` as its right subtree.
    pub fn with_right(&self, child: ChoiceTree) -> Self {
        ChoiceTree::of(Node {
            seed: self.node.seed,
            choice: self.node.choice,
            left: self.node.left.clone(),
            right: OnceCell::from(child),
        })
    }

    /// Reads an integer within `range` (inclusive).
    pub fn read_int(&self, range: &RangeInclusive<i64>) -> Maybe<i64> {
        match self.node.choice {
            Choice::Undetermined(seed) => {
                let lo = i128::from(*range.start());
                let span = (i128::from(*range.end()) - lo) as u64;
                Ok((lo + i128::from(seed.draw_upto(span))) as i64)
            }
            Choice::Fixed(Value::Int(v)) if range.contains(&v) => Ok(v),
            Choice::Fixed(recorded) => Err(mismatch(ChoiceKind::Int, range, recorded)),
        }
    }

    /// Reads a boolean.
    pub fn read_bool(&self) -> Maybe<bool> {
        match self.node.choice {
            Choice::Undetermined(seed) => Ok(seed.draw_upto(1) == 1),
            Choice::Fixed(Value::Bool(b)) => Ok(b),
            Choice::Fixed(recorded) => Err(mismatch(ChoiceKind::Bool, "false..=true", recorded)),
        }
    }

    /// Reads a character within `domain` (inclusive).
    pub fn read_char(&self, domain: &RangeInclusive<char>) -> Maybe<char> {
        match self.node.choice {
            Choice::Undetermined(seed) => {
                let lo = char_ordinal(*domain.start());
                let hi = char_ordinal(*domain.end());
                let ordinal = lo + seed.draw_upto(u64::from(hi - lo)) as u32;
                Ok(char_from_ordinal(ordinal).unwrap_or(*domain.start()))
            }
            Choice::Fixed(Value::Char(c)) if domain.contains(&c) => Ok(c),
            Choice::Fixed(recorded) => Err(mismatch(ChoiceKind::Char, domain, recorded)),
        }
    }

    /// The integer recorded at this node, if any, without drawing.
    pub fn pinned_int(&self, range: &RangeInclusive<i64>) -> Maybe<Option<i64>> {
        match self.node.choice {
            Choice::Undetermined(_) => Ok(None),
            Choice::Fixed(Value::Int(v)) if range.contains(&v) => Ok(Some(v)),
            Choice::Fixed(recorded) => Err(mismatch(ChoiceKind::Int, range, recorded)),
        }
    }

    /// The boolean recorded at this node, if any, without drawing.
    pub fn pinned_bool(&self) -> Maybe<Option<bool>> {
        match self.node.choice {
            Choice::Undetermined(_) => Ok(None),
            Choice::Fixed(Value::Bool(b)) => Ok(Some(b)),
            Choice::Fixed(recorded) => Err(mismatch(ChoiceKind::Bool, "false..=true", recorded)),
        }
    }
}

impl fmt::Debug for ChoiceTree {
    fn fmt(&self, fmt: &mut fmt::Formatter) -> fmt::Result {
        fmt.debug_struct("ChoiceTree")
            .field("seed", &self.node.seed)
            .field("choice", &self.node.choice)
            .finish()
    }
}

// Spines run many thousands of nodes deep, so both comparison and drop walk
// the tree with an explicit stack.
impl PartialEq for ChoiceTree {
    fn eq(&self, other: &ChoiceTree) -> bool {
        let mut pending = vec![(self.clone(), other.clone())];
        while let Some((a, b)) = pending.pop() {
            if Rc::ptr_eq(&a.node, &b.node) {
                continue;
            }
            if a.node.seed != b.node.seed || a.node.choice != b.node.choice {
                return false;
            }
            // An underived child equals whatever its lineage derives to.
            if a.node.left.get().is_some() || b.node.left.get().is_some() {
                pending.push((a.left().clone(), b.left().clone()));
            }
            if a.node.right.get().is_some() || b.node.right.get().is_some() {
                pending.push((a.right().clone(), b.right().clone()));
            }
        }
        true
    }
}

impl Eq for ChoiceTree {}

impl Drop for Node {
    fn drop(&mut self) {
        let mut pending = Vec::new();
        pending.extend(self.left.take());
        pending.extend(self.right.take());
        while let Some(tree) = pending.pop() {
            if let Ok(mut node) = Rc::try_unwrap(tree.node) {
                pending.extend(node.left.take());
                pending.extend(node.right.take());
            }
        }
    }
}

/// The nodes reached from a root by repeatedly going right. Collections and
/// tuples keep their elements in the left children of these nodes.
#[derive(Clone, Debug)]
pub(crate) struct Spine {
    nodes: Rc<Vec<ChoiceTree>>,
}

impl Spine {
    pub(crate) fn new(nodes: Vec<ChoiceTree>) -> Self {
        Spine {
            nodes: Rc::new(nodes),
        }
    }

    /// The first `len` nodes of `root`'s spine.
    pub(crate) fn walk(root: &ChoiceTree, len: usize) -> Self {
        let mut nodes = Vec::with_capacity(len);
        let mut node = root.clone();
        for _ in 0..len {
            let next = node.right().clone();
            nodes.push(node);
            node = next;
        }
        Spine::new(nodes)
    }

    pub(crate) fn node(&self, i: usize) -> &ChoiceTree {
        &self.nodes[i]
    }

    /// Rebuilds nodes `from..at` of the spine on top of `replacement`, which
    /// takes the place of node `at`.
    pub(crate) fn splice(&self, from: usize, at: usize, replacement: ChoiceTree) -> ChoiceTree {
        self.nodes[from..at]
            .iter()
            .rev()
            .fold(replacement, |tree, node| node.with_right(tree))
    }

    /// The whole spine with the left child of node `i` replaced.
    pub(crate) fn with_left_at(&self, i: usize, child: ChoiceTree) -> ChoiceTree {
        self.splice(0, i, self.nodes[i].with_left(child))
    }

    /// Lifts the shrinks of each element (held in the left child of the
    /// corresponding spine node) to shrinks of the whole spine, one element
    /// at a time, in order.
    pub(crate) fn shrink_each_left(&self, shrinks: Vec<Shrinks>) -> Shrinks {
        let spine = self.clone();
        Box::new(
            shrinks
                .into_iter()
                .enumerate()
                .flat_map(move |(i, candidates)| {
                    let spine = spine.clone();
                    candidates.map(move |c| spine.with_left_at(i, c))
                }),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tree() -> ChoiceTree {
        ChoiceTree::new(Seed::new(0x5eed))
    }

    #[test]
    fn undetermined_reads_are_idempotent() {
        let t = tree();
        let range = -1000..=1000;
        assert_eq!(t.read_int(&range), t.read_int(&range));
        assert_eq!(t.read_bool(), t.read_bool());
        assert_eq!(t.read_char(&('a'..='z')), t.read_char(&('a'..='z')));
    }

    #[test]
    fn undetermined_reads_respect_their_domain() {
        let mut node = tree();
        for _ in 0..500 {
            let v = node.read_int(&(-3..=3)).expect("int");
            assert!(v >= -3 && v <= 3, "{} in -3..=3", v);
            let c = node.read_char(&('a'..='e')).expect("char");
            assert!(c >= 'a' && c <= 'e', "{:?} in a..=e", c);
            node = node.right().clone();
        }
    }

    #[test]
    fn full_range_reads_do_not_overflow() {
        let mut node = tree();
        for _ in 0..100 {
            let _ = node
                .read_int(&(i64::min_value()..=i64::max_value()))
                .expect("int");
            node = node.left().clone();
        }
    }

    #[test]
    fn character_draws_skip_surrogates() {
        let mut node = tree();
        for _ in 0..500 {
            let c = node
                .read_char(&('\u{d7fe}'..='\u{e001}'))
                .expect("char");
            let c = c as u32;
            assert!(c < 0xd800 || c > 0xdfff, "{:x} is not a surrogate", c);
            node = node.right().clone();
        }
    }

    #[test]
    fn fixed_reads_return_the_recorded_value() {
        let t = tree();
        assert_eq!(t.fix(Value::Int(3)).read_int(&(0..=5)), Ok(3));
        assert_eq!(t.fix(Value::Bool(true)).read_bool(), Ok(true));
        assert_eq!(t.fix(Value::Char('q')).read_char(&('a'..='z')), Ok('q'));
    }

    #[test]
    fn fixed_reads_of_another_kind_are_mismatches() {
        let t = tree().fix(Value::Int(1));
        assert!(t.read_bool().unwrap_err().is_mismatch());
        assert!(t.read_char(&('a'..='z')).unwrap_err().is_mismatch());
        let t = tree().fix(Value::Bool(false));
        assert!(t.read_int(&(0..=1)).unwrap_err().is_mismatch());
    }

    #[test]
    fn values_know_their_kind() {
        assert_eq!(Value::Int(-3).kind(), ChoiceKind::Int);
        assert_eq!(Value::Bool(true).kind(), ChoiceKind::Bool);
        assert_eq!(Value::Char('q').kind(), ChoiceKind::Char);
    }

    #[test]
    fn fixed_reads_outside_the_domain_are_mismatches() {
        let t = tree().fix(Value::Int(10));
        assert_eq!(
            t.read_int(&(0..=5)),
            Err(GenError::MismatchedChoice {
                expected: ChoiceKind::Int,
                domain: "0..=5".to_string(),
                recorded: Value::Int(10),
            })
        );
        let t = tree().fix(Value::Char('Z'));
        assert!(t.read_char(&('a'..='z')).unwrap_err().is_mismatch());
    }

    #[test]
    fn pinned_reads_never_draw() {
        let t = tree();
        assert_eq!(t.pinned_bool(), Ok(None));
        assert_eq!(t.pinned_int(&(0..=3)), Ok(None));
        assert_eq!(t.fix(Value::Bool(false)).pinned_bool(), Ok(Some(false)));
        assert_eq!(t.fix(Value::Int(2)).pinned_int(&(0..=3)), Ok(Some(2)));
        assert!(t.fix(Value::Int(2)).pinned_bool().is_err());
        assert!(t.fix(Value::Int(7)).pinned_int(&(0..=3)).is_err());
    }

    #[test]
    fn fixing_keeps_the_child_lineage() {
        let t = tree();
        let fixed = t.fix(Value::Int(0));
        assert_eq!(fixed.seed(), t.seed());
        assert_eq!(fixed.left(), t.left());
        assert_eq!(fixed.right().right(), t.right().right());
        assert_eq!(fixed.choice(), &Choice::Fixed(Value::Int(0)));
    }

    #[test]
    fn children_derive_from_the_seed_lineage() {
        let t = tree();
        assert_eq!(t.left().seed(), t.seed().derive(LEFT_SALT));
        assert_eq!(t.right().seed(), t.seed().derive(RIGHT_SALT));
        assert_eq!(t.left().choice(), &Choice::Undetermined(t.left().seed()));
    }

    #[test]
    fn replacing_children_shares_the_rest() {
        let t = tree();
        let child = ChoiceTree::new(Seed::new(1)).fix(Value::Bool(true));
        let replaced = t.with_left(child.clone());
        assert_eq!(replaced.left(), &child);
        assert_eq!(replaced.right(), t.right());
        assert_ne!(replaced, t);

        let replaced = t.with_right(child.clone());
        assert_eq!(replaced.right(), &child);
        assert_eq!(replaced.left(), t.left());
    }

    #[test]
    fn same_operations_yield_equal_trees() {
        let build = || {
            let t = tree();
            let l = t.left().fix(Value::Int(4));
            t.with_left(l).with_right(t.right().fix(Value::Bool(false)))
        };
        let a = build();
        let b = build();
        assert_eq!(a, b);
        assert_eq!(a.left().read_int(&(0..=4)), b.left().read_int(&(0..=4)));
    }

    #[test]
    fn different_seeds_are_different_trees() {
        assert_ne!(ChoiceTree::new(Seed::new(1)), ChoiceTree::new(Seed::new(2)));
    }

    #[test]
    fn deep_spines_compare_and_drop_without_recursion() {
        let build = || {
            let mut tree = ChoiceTree::new(Seed::new(9)).fix(Value::Bool(false));
            for i in 0..200_000 {
                tree = ChoiceTree::new(Seed::new(i))
                    .with_left(ChoiceTree::new(Seed::new(i)).fix(Value::Int(i as i64)))
                    .with_right(tree);
            }
            tree
        };
        let a = build();
        let b = build();
        assert_eq!(a, b);
    }

    #[test]
    fn spine_splices_replace_one_node() {
        let t = tree();
        let spine = Spine::walk(&t, 4);
        assert_eq!(spine.node(3), t.right().right().right());
        let child = ChoiceTree::new(Seed::new(77));
        let rebuilt = spine.with_left_at(2, child.clone());
        assert_eq!(rebuilt.right().right().left(), &child);
        assert_eq!(rebuilt.left(), t.left());
        assert_eq!(rebuilt.right().left(), t.right().left());
        assert_eq!(rebuilt.right().right().right(), t.right().right().right());
    }
}
