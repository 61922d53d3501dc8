//! Set union of two sorted, duplicate-free runs, biased towards the first.
//!
//! The engine assumes the first run is the long one and that its elements
//! usually precede the head of the second run. It copies from the first run
//! one comparison at a time, and once the first run has won
//! [`BIASED_UNROLL`] times in a row it switches to segment mode: a single
//! galloping search finds how much more of the first run precedes the head
//! of the second, and that whole stretch is taken in one go.
//!
//! On equivalence the element of the first run is kept and the one from the
//! second run is dropped.

use std::vec;

use crate::search::find_boundary_by;

/// Consecutive first-run wins before the engine searches for a whole segment.
pub const BIASED_UNROLL: usize = 4;

/// The two inputs and the output of a union, as seen by
/// [`set_union_biased_by`].
///
/// "First" and "second" are in merge order, which does not have to be the
/// storage order: the container runs its batch insert over reversed views.
pub trait UnionRuns {
    type Item;

    fn first_len(&self) -> usize;

    /// The element `offset` places past the head of the first run.
    fn first(&self, offset: usize) -> &Self::Item;

    fn second_len(&self) -> usize;

    /// Head of the second run.
    fn second(&self) -> &Self::Item;

    /// Emits the next `n` elements of the first run.
    fn take_first(&mut self, n: usize);

    /// Emits the head of the second run.
    fn take_second(&mut self);

    /// Discards the head of the second run.
    fn skip_second(&mut self);

    fn drain_first(&mut self) {
        self.take_first(self.first_len());
    }

    fn drain_second(&mut self) {
        while self.second_len() > 0 {
            self.take_second();
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    ScanFirst,
    CheckSecond,
    Biased,
    Drain,
}

/// Runs the biased union over `runs`, comparing with `is_less`.
pub fn set_union_biased_by<R, F>(runs: &mut R, is_less: &mut F)
where
    R: UnionRuns,
    F: FnMut(&R::Item, &R::Item) -> bool,
{
    use State::*;

    let mut state = ScanFirst;
    loop {
        state = match state {
            ScanFirst => {
                if runs.first_len() == 0 || runs.second_len() == 0 {
                    Drain
                } else if is_less(runs.first(0), runs.second()) {
                    runs.take_first(1);
                    Biased
                } else {
                    CheckSecond
                }
            }
            // the head of the first run is known not to precede the second
            CheckSecond => {
                if is_less(runs.second(), runs.first(0)) {
                    runs.take_second();
                } else {
                    runs.skip_second();
                }
                if runs.second_len() == 0 {
                    Drain
                } else {
                    Biased
                }
            }
            Biased => biased_step(runs, is_less),
            Drain => {
                runs.drain_first();
                runs.drain_second();
                return;
            }
        }
    }
}

fn biased_step<R, F>(runs: &mut R, is_less: &mut F) -> State
where
    R: UnionRuns,
    F: FnMut(&R::Item, &R::Item) -> bool,
{
    for _ in 0..BIASED_UNROLL {
        if runs.first_len() == 0 {
            return State::Drain;
        }
        if !is_less(runs.first(0), runs.second()) {
            return State::CheckSecond;
        }
        runs.take_first(1);
    }

    let segment = {
        let runs = &*runs;
        let second = runs.second();
        find_boundary_by(runs.first_len(), |i| is_less(runs.first(i), second))
    };
    runs.take_first(segment);
    State::ScanFirst
}

/// Clones the union of `first` and `second` onto the end of `out`. Returns
/// how many elements were appended.
pub fn set_union_biased<T, F>(first: &[T], second: &[T], out: &mut Vec<T>, is_less: &mut F) -> usize
where
    T: Clone,
    F: FnMut(&T, &T) -> bool,
{
    let before = out.len();
    out.reserve(first.len() + second.len());
    let mut runs = SliceRuns {
        first,
        second,
        out: &mut *out,
    };
    set_union_biased_by(&mut runs, is_less);
    out.len() - before
}

/// Moving variant of [`set_union_biased`]; works for types that cannot be
/// cloned. Dropped duplicates from `second` are dropped here.
pub fn set_union_biased_owned<T, F>(first: Vec<T>, second: Vec<T>, is_less: &mut F) -> Vec<T>
where
    F: FnMut(&T, &T) -> bool,
{
    let mut runs = OwnedRuns {
        out: Vec::with_capacity(first.len() + second.len()),
        first: first.into_iter(),
        second: second.into_iter(),
    };
    set_union_biased_by(&mut runs, is_less);
    runs.out
}

/// Union where `second` is sorted but may still contain adjacent
/// equivalents. `second` is deduplicated in place (first of each class
/// kept) before the union runs.
pub fn set_union_deduplicating_second<T, F>(
    first: &[T],
    second: &mut Vec<T>,
    out: &mut Vec<T>,
    is_less: &mut F,
) -> usize
where
    T: Clone,
    F: FnMut(&T, &T) -> bool,
{
    second.dedup_by(|later, kept| !is_less(&*kept, &*later));
    set_union_biased(first, second, out, is_less)
}

struct SliceRuns<'a, T> {
    first: &'a [T],
    second: &'a [T],
    out: &'a mut Vec<T>,
}

impl<T: Clone> UnionRuns for SliceRuns<'_, T> {
    type Item = T;

    fn first_len(&self) -> usize {
        self.first.len()
    }

    fn first(&self, offset: usize) -> &T {
        &self.first[offset]
    }

    fn second_len(&self) -> usize {
        self.second.len()
    }

    fn second(&self) -> &T {
        &self.second[0]
    }

    fn take_first(&mut self, n: usize) {
        let (taken, rest) = self.first.split_at(n);
        self.out.extend_from_slice(taken);
        self.first = rest;
    }

    fn take_second(&mut self) {
        self.out.push(self.second[0].clone());
        self.second = &self.second[1..];
    }

    fn skip_second(&mut self) {
        self.second = &self.second[1..];
    }

    fn drain_second(&mut self) {
        self.out.extend_from_slice(self.second);
        self.second = &[];
    }
}

struct OwnedRuns<T> {
    first: vec::IntoIter<T>,
    second: vec::IntoIter<T>,
    out: Vec<T>,
}

impl<T> UnionRuns for OwnedRuns<T> {
    type Item = T;

    fn first_len(&self) -> usize {
        self.first.len()
    }

    fn first(&self, offset: usize) -> &T {
        &self.first.as_slice()[offset]
    }

    fn second_len(&self) -> usize {
        self.second.len()
    }

    fn second(&self) -> &T {
        &self.second.as_slice()[0]
    }

    fn take_first(&mut self, n: usize) {
        self.out.extend(self.first.by_ref().take(n));
    }

    fn take_second(&mut self) {
        self.out.extend(self.second.next());
    }

    fn skip_second(&mut self) {
        self.second.next();
    }

    fn drain_first(&mut self) {
        self.out.extend(self.first.by_ref());
    }

    fn drain_second(&mut self) {
        self.out.extend(self.second.by_ref());
    }
}

#[cfg(test)]
mod test {
    use std::{cell::Cell, cmp::Ordering, collections::BTreeSet};

    use proptest::prelude::*;
    use rand::{rngs::StdRng, Rng, SeedableRng};

    use super::*;

    fn union_of(first: &[i32], second: &[i32]) -> Vec<i32> {
        let mut out = vec![];
        set_union_biased(first, second, &mut out, &mut |a, b| a < b);
        out
    }

    fn reference(first: &[i32], second: &[i32]) -> Vec<i32> {
        first
            .iter()
            .chain(second)
            .copied()
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect()
    }

    #[test]
    fn empty_inputs() {
        assert_eq!(union_of(&[], &[]), Vec::<i32>::new());
        assert_eq!(union_of(&[1, 2], &[]), [1, 2]);
        assert_eq!(union_of(&[], &[1, 2]), [1, 2]);
    }

    #[test]
    fn interleaved_and_overlapping() {
        assert_eq!(union_of(&[1, 3, 5], &[2, 4, 6]), [1, 2, 3, 4, 5, 6]);
        assert_eq!(union_of(&[1, 2, 3], &[2, 3, 4]), [1, 2, 3, 4]);
        assert_eq!(union_of(&[5, 6], &[1, 2]), [1, 2, 5, 6]);
        assert_eq!(union_of(&[1, 2], &[1, 2]), [1, 2]);
    }

    #[test]
    fn long_first_small_second() {
        let first: Vec<i32> = (0..10_000).map(|x| x * 2).collect();
        let second = [-1, 7, 4_001, 4_002, 19_999, 20_000];
        assert_eq!(union_of(&first, &second), reference(&first, &second));
    }

    #[test]
    fn segment_mode_skips_comparisons() {
        let first: Vec<u32> = (0..100_000).collect();
        let second = [50_000u32];
        let calls = Cell::new(0);
        let mut out = vec![];
        set_union_biased(&first, &second, &mut out, &mut |a, b| {
            calls.set(calls.get() + 1);
            a < b
        });
        assert_eq!(out, first);
        assert!(calls.get() < 200, "took {} comparisons", calls.get());
    }

    #[test]
    fn random_sizes_match_reference() {
        let mut rng = StdRng::seed_from_u64(42);
        for _ in 0..500 {
            let first_len = rng.gen_range(0..200);
            let second_len = rng.gen_range(0..20);
            let first: BTreeSet<i32> = (0..first_len).map(|_| rng.gen_range(0..400)).collect();
            let second: BTreeSet<i32> = (0..second_len).map(|_| rng.gen_range(0..400)).collect();
            let first: Vec<i32> = first.into_iter().collect();
            let second: Vec<i32> = second.into_iter().collect();
            assert_eq!(union_of(&first, &second), reference(&first, &second));
            assert_eq!(union_of(&second, &first), reference(&first, &second));
        }
    }

    #[derive(Debug)]
    struct Tagged {
        key: u32,
        from: &'static str,
    }

    impl PartialEq for Tagged {
        fn eq(&self, other: &Self) -> bool {
            self.key == other.key
        }
    }

    impl Eq for Tagged {}

    impl PartialOrd for Tagged {
        fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
            Some(self.cmp(other))
        }
    }

    impl Ord for Tagged {
        fn cmp(&self, other: &Self) -> Ordering {
            self.key.cmp(&other.key)
        }
    }

    fn tagged(keys: &[u32], from: &'static str) -> Vec<Tagged> {
        keys.iter().map(|&key| Tagged { key, from }).collect()
    }

    #[test]
    fn first_run_wins_ties() {
        let first = tagged(&[1, 2, 3, 4, 5, 6, 7, 8, 9, 10, 20], "first");
        let second = tagged(&[0, 2, 10, 11, 20, 21], "second");
        let out = set_union_biased_owned(first, second, &mut |a, b| a < b);
        let keys: Vec<u32> = out.iter().map(|t| t.key).collect();
        assert_eq!(keys, [0, 1, 2, 3, 4, 5, 6, 7, 8, 9, 10, 11, 20, 21]);
        for t in &out {
            let expected = if [0, 11, 21].contains(&t.key) {
                "second"
            } else {
                "first"
            };
            assert_eq!(t.from, expected, "key {}", t.key);
        }
    }

    #[test]
    fn deduplicating_second() {
        let mut second = vec![1, 1, 4, 4, 4, 9];
        let mut out = vec![0];
        let appended =
            set_union_deduplicating_second(&[2, 4, 6], &mut second, &mut out, &mut |a, b| a < b);
        assert_eq!(appended, 5);
        assert_eq!(out, [0, 1, 2, 4, 6, 9]);
        assert_eq!(second, [1, 4, 9]);
    }

    proptest! {
        #[test]
        fn union_is_sorted_set_union(
            first in prop::collection::btree_set(0u16..300, 0..150),
            second in prop::collection::btree_set(0u16..300, 0..150),
        ) {
            let first: Vec<u16> = first.into_iter().collect();
            let second: Vec<u16> = second.into_iter().collect();
            let mut out = vec![];
            set_union_biased(&first, &second, &mut out, &mut |a, b| a < b);
            let expected: BTreeSet<u16> = first.iter().chain(&second).copied().collect();
            prop_assert_eq!(out, expected.into_iter().collect::<Vec<_>>());
        }
    }
}
