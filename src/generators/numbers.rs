use std::iter;
use std::ops::RangeInclusive;

use crate::data::*;

use super::core::*;

/// See [`ints`](fn.ints.html) or [`i64s`](fn.i64s.html)
#[derive(Debug, Clone)]
pub struct IntGenerator {
    range: RangeInclusive<i64>,
}

/// See [`booleans`](fn.booleans.html)
#[derive(Debug, Clone)]
pub struct BoolGenerator;

/// See [`chars`](fn.chars.html)
#[derive(Debug, Clone)]
pub struct CharGenerator {
    domain: RangeInclusive<char>,
}

/// Generates integers within `range`, inclusive of both ends.
///
/// Values shrink toward zero, or toward whichever end of the range is
/// nearest zero when zero is out of range.
///
/// ```
/// use choicetree::generators::*;
/// use choicetree::data::Seed;
/// let v = sample(&ints(-3..=3), Seed::new(42)).expect("an integer");
/// assert!(v >= -3 && v <= 3);
/// ```
pub fn ints(range: RangeInclusive<i64>) -> IntGenerator {
    assert!(
        range.start() <= range.end(),
        "Empty integer range: {:?}",
        range
    );
    IntGenerator { range }
}

/// Generates integers from the whole of `i64`.
pub fn i64s() -> IntGenerator {
    ints(i64::min_value()..=i64::max_value())
}

/// Generates booleans, shrinking toward `false`.
pub fn booleans() -> BoolGenerator {
    BoolGenerator
}

/// Generates characters within `domain`, shrinking toward its start.
pub fn chars(domain: RangeInclusive<char>) -> CharGenerator {
    assert!(
        domain.start() <= domain.end(),
        "Empty character range: {:?}",
        domain
    );
    CharGenerator { domain }
}

/// The values `value - d`, for `d` halving from `(value - target) / 2`
/// until it reaches zero.
pub(crate) fn halvings(value: i64, target: i64) -> impl Iterator<Item = i64> {
    let start = i128::from(value);
    iter::successors(Some((start - i128::from(target)) / 2), |d| Some(d / 2))
        .take_while(|&d| d != 0)
        .map(move |d| (start - d) as i64)
}

/// `target` itself, followed by successively closer approximations of
/// `value`. Empty when the two are already equal.
pub(crate) fn towards(value: i64, target: i64) -> impl Iterator<Item = i64> {
    let first = if value == target { None } else { Some(target) };
    first.into_iter().chain(halvings(value, target))
}

impl IntGenerator {
    fn target(&self) -> i64 {
        let (lo, hi) = (*self.range.start(), *self.range.end());
        if lo > 0 {
            lo
        } else if hi < 0 {
            hi
        } else {
            0
        }
    }

    fn shrinks_of(&self, value: i64) -> impl Iterator<Item = i64> {
        let target = self.target();
        let first = if value == target { None } else { Some(target) };
        let negated = if value < 0 {
            value
                .checked_neg()
                .filter(|n| self.range.contains(n) && *n != target)
        } else {
            None
        };
        first
            .into_iter()
            .chain(negated)
            .chain(halvings(value, target))
    }
}

impl Generator for IntGenerator {
    type Item = i64;
    fn generate(&self, tree: &ChoiceTree) -> Maybe<GenResult<Self::Item>> {
        let value = tree.read_int(&self.range)?;
        let node = tree.clone();
        let shrinks = self
            .shrinks_of(value)
            .map(move |v| node.fix(Value::Int(v)));
        Ok(GenResult::new(value, Box::new(shrinks)))
    }
}

impl Generator for BoolGenerator {
    type Item = bool;
    fn generate(&self, tree: &ChoiceTree) -> Maybe<GenResult<Self::Item>> {
        let value = tree.read_bool()?;
        let shrinks: Shrinks = if value {
            Box::new(iter::once(tree.fix(Value::Bool(false))))
        } else {
            Box::new(iter::empty())
        };
        Ok(GenResult::new(value, shrinks))
    }
}

impl Generator for CharGenerator {
    type Item = char;
    fn generate(&self, tree: &ChoiceTree) -> Maybe<GenResult<Self::Item>> {
        let value = tree.read_char(&self.domain)?;
        let lo = char_ordinal(*self.domain.start());
        let node = tree.clone();
        let shrinks = towards(i64::from(char_ordinal(value)), i64::from(lo))
            .filter_map(|o| char_from_ordinal(o as u32))
            .map(move |c| node.fix(Value::Char(c)));
        Ok(GenResult::new(value, Box::new(shrinks)))
    }
}
