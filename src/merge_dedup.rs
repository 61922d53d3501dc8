use std::{
    cmp::Ordering,
    iter::{FusedIterator, Peekable},
};

/// Stable-sorts `v` and keeps the first element of every equivalence class.
pub fn sort_and_unique<T, F>(v: &mut Vec<T>, is_less: &mut F)
where
    F: FnMut(&T, &T) -> bool,
{
    // already strictly ascending input is common enough to check for
    if sorted_prefix_len(v, &mut *is_less) == v.len() {
        return;
    }
    v.sort_by(|a, b| {
        if is_less(a, b) {
            Ordering::Less
        } else if is_less(b, a) {
            Ordering::Greater
        } else {
            Ordering::Equal
        }
    });
    v.dedup_by(|later, kept| !is_less(&*kept, &*later));
}

/// Length of the longest prefix of `v` in which every adjacent pair
/// satisfies `adjacent`.
pub fn sorted_prefix_len<T>(v: &[T], mut adjacent: impl FnMut(&T, &T) -> bool) -> usize {
    match v.windows(2).position(|pair| !adjacent(&pair[0], &pair[1])) {
        Some(breaks_at) => breaks_at + 1,
        None => v.len(),
    }
}

/// Clones the leading run of `v` whose adjacent pairs satisfy `adjacent` onto
/// `out`. Returns the number of elements copied.
pub fn copy_until_adjacent_check<T, P>(v: &[T], out: &mut Vec<T>, adjacent: P) -> usize
where
    T: Clone,
    P: FnMut(&T, &T) -> bool,
{
    let len = sorted_prefix_len(v, adjacent);
    out.extend_from_slice(&v[..len]);
    len
}

/// [`copy_until_adjacent_check`] for the strictly ascending prefix.
pub fn copy_until_sorted<T>(v: &[T], out: &mut Vec<T>) -> usize
where
    T: Clone + Ord,
{
    copy_until_adjacent_check(v, out, |a, b| a < b)
}

/// Lazy union of two sorted, duplicate-free iterators. When the heads are
/// equivalent the one from `a` is yielded and the one from `b` is skipped.
///
/// This is the streaming form with at most two comparisons per element; the
/// biased engine in [`crate::union`] is the fast path for materialised runs.
#[must_use = "iterator adaptors are lazy and do nothing unless consumed"]
pub struct SetUnion<I, J, F>
where
    I: Iterator,
    J: Iterator<Item = I::Item>,
{
    a: Peekable<I>,
    b: Peekable<J>,
    is_less: F,
}

pub fn set_union<I, J, F>(a: I, b: J, is_less: F) -> SetUnion<I::IntoIter, J::IntoIter, F>
where
    I: IntoIterator,
    J: IntoIterator<Item = I::Item>,
    F: FnMut(&I::Item, &I::Item) -> bool,
{
    SetUnion {
        a: a.into_iter().peekable(),
        b: b.into_iter().peekable(),
        is_less,
    }
}

impl<I, J, F> Iterator for SetUnion<I, J, F>
where
    I: Iterator,
    J: Iterator<Item = I::Item>,
    F: FnMut(&I::Item, &I::Item) -> bool,
{
    type Item = I::Item;

    fn next(&mut self) -> Option<Self::Item> {
        match (self.a.peek(), self.b.peek()) {
            (Some(a), Some(b)) => {
                if (self.is_less)(b, a) {
                    return self.b.next();
                }
                if !(self.is_less)(a, b) {
                    self.b.next();
                }
                self.a.next()
            }
            (Some(_), None) => self.a.next(),
            (None, _) => self.b.next(),
        }
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        // every tie swallows one element, so only the longer side is certain
        let (a_low, a_high) = self.a.size_hint();
        let (b_low, b_high) = self.b.size_hint();
        let high = a_high.zip(b_high).and_then(|(a, b)| a.checked_add(b));
        (a_low.max(b_low), high)
    }
}

impl<I, J, F> FusedIterator for SetUnion<I, J, F>
where
    I: FusedIterator,
    J: FusedIterator<Item = I::Item>,
    F: FnMut(&I::Item, &I::Item) -> bool,
{
}
