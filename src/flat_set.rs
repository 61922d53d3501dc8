use std::{
    cmp::Ordering,
    fmt,
    hash::{Hash, Hasher},
    mem,
    ops::{Range, RangeBounds},
    ptr, slice, vec,
};

use itertools::Itertools;

use crate::{
    compare::{Compare, Less, Transparent},
    error::FlatSetError,
    merge_dedup::{set_union, sort_and_unique},
    search::lower_bound_hinted,
    union::{set_union_biased_by, UnionRuns},
};

/// A sorted, duplicate-free set stored in one contiguous `Vec`.
///
/// Elements are kept ascending under `C`, and no two elements are equivalent
/// under it. Positions handed out by the API are plain indices into
/// [`as_slice`](FlatSet::as_slice) and are invalidated by any mutation.
///
/// Single-element inserts cost a binary search plus a shift. Batch inserts
/// ([`insert_vec`](FlatSet::insert_vec) and friends) sort and deduplicate the
/// batch, then splice it in with one backward pass of the biased union, so a
/// small batch going into a large set costs far less than one insert per
/// element.
#[derive(Clone)]
pub struct FlatSet<T, C = Less> {
    compare: C,
    body: Vec<T>,
}

impl<T: Ord> FlatSet<T> {
    pub fn new() -> Self {
        Self::with_compare(Less)
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            compare: Less,
            body: Vec::with_capacity(capacity),
        }
    }

    /// Takes over `body`, sorting it and dropping all but the first of each
    /// run of equal elements.
    pub fn from_vec(body: Vec<T>) -> Self {
        Self::from_vec_with_compare(body, Less)
    }
}

impl<T, C> FlatSet<T, C>
where
    C: Compare<T>,
{
    pub fn with_compare(compare: C) -> Self {
        Self {
            compare,
            body: vec![],
        }
    }

    pub fn from_vec_with_compare(mut body: Vec<T>, compare: C) -> Self {
        sort_and_unique(&mut body, &mut |a, b| compare.less(a, b));
        Self { compare, body }
    }

    pub fn key_compare(&self) -> &C {
        &self.compare
    }

    pub fn len(&self) -> usize {
        self.body.len()
    }

    pub fn is_empty(&self) -> bool {
        self.body.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.body.capacity()
    }

    pub fn reserve(&mut self, additional: usize) {
        self.body.reserve(additional)
    }

    pub fn try_reserve(&mut self, additional: usize) -> Result<(), FlatSetError> {
        self.body
            .try_reserve(additional)
            .map_err(|source| FlatSetError::Reserve { additional, source })
    }

    pub fn shrink_to_fit(&mut self) {
        self.body.shrink_to_fit()
    }

    pub fn clear(&mut self) {
        self.body.clear()
    }

    pub fn iter(&self) -> slice::Iter<'_, T> {
        self.body.iter()
    }

    pub fn as_slice(&self) -> &[T] {
        &self.body
    }

    pub fn into_vec(self) -> Vec<T> {
        self.body
    }

    pub fn first(&self) -> Option<&T> {
        self.body.first()
    }

    pub fn last(&self) -> Option<&T> {
        self.body.last()
    }

    //---------------------------------------------------------------------------
    // Insertion

    /// Inserts `value` unless an equivalent element is already present, in
    /// which case the existing element is kept and `value` is dropped.
    /// Returns the index of the element and whether it was inserted.
    pub fn insert(&mut self, value: T) -> (usize, bool) {
        let pos = self.lower_bound(&value);
        if pos == self.body.len() || self.compare.less(&value, &self.body[pos]) {
            self.body.insert(pos, value);
            return (pos, true);
        }
        (pos, false)
    }

    /// Like [`insert`](Self::insert), but starts the search at `hint` and
    /// gallops outwards from there. A hint past the end is treated as the
    /// end.
    pub fn insert_hint(&mut self, hint: usize, value: T) -> usize {
        let compare = &self.compare;
        let hint = hint.min(self.body.len());
        let pos = lower_bound_hinted(&self.body, hint, &value, &mut |a, b| compare.less(a, b));
        if pos == self.body.len() || compare.less(&value, &self.body[pos]) {
            self.body.insert(pos, value);
        }
        pos
    }

    pub fn emplace<A>(&mut self, args: A) -> (usize, bool)
    where
        T: From<A>,
    {
        self.insert(T::from(args))
    }

    pub fn emplace_hint<A>(&mut self, hint: usize, args: A) -> usize
    where
        T: From<A>,
    {
        self.insert_hint(hint, T::from(args))
    }

    /// Inserts every element of `batch`, in any order and with any
    /// duplicates. Elements already in the set win over equivalent ones in
    /// the batch, and within the batch the first of each class wins, so the
    /// result is the same as inserting the batch one element at a time.
    pub fn insert_vec(&mut self, mut batch: Vec<T>) {
        self.prepare_batch(&mut batch);
        self.body.reserve(batch.len());
        self.merge_prepared(batch);
    }

    /// [`insert_vec`](Self::insert_vec) that reports a failure to grow the
    /// backing storage instead of aborting. The set is unchanged on error.
    pub fn try_insert_vec(&mut self, mut batch: Vec<T>) -> Result<(), FlatSetError> {
        self.prepare_batch(&mut batch);
        self.try_reserve(batch.len())?;
        self.merge_prepared(batch);
        Ok(())
    }

    pub fn insert_slice(&mut self, values: &[T])
    where
        T: Clone,
    {
        self.insert_vec(values.to_vec())
    }

    /// Collects `values` into a batch and inserts it.
    pub fn insert_iter<I>(&mut self, values: I)
    where
        I: IntoIterator<Item = T>,
    {
        self.insert_vec(values.into_iter().collect())
    }

    fn prepare_batch(&self, batch: &mut Vec<T>) {
        let compare = &self.compare;
        sort_and_unique(batch, &mut |a, b| compare.less(a, b));
    }

    // `batch` must be sorted and unique, and `body` must have room for it
    fn merge_prepared(&mut self, batch: Vec<T>) {
        if batch.is_empty() {
            return;
        }
        tracing::trace!(
            existing = self.body.len(),
            batch = batch.len(),
            "merging sorted batch"
        );
        {
            let compare = &self.compare;
            let mut tail = TailMerge::new(&mut self.body, batch);
            // both runs are walked back to front
            set_union_biased_by(&mut tail, &mut |a: &T, b: &T| compare.less(b, a));
        }
        debug_assert!(self.is_strictly_sorted());
    }

    //---------------------------------------------------------------------------
    // Removal

    pub fn remove_at(&mut self, index: usize) -> T {
        self.body.remove(index)
    }

    /// Removes and yields the elements in `range`.
    pub fn drain<R>(&mut self, range: R) -> vec::Drain<'_, T>
    where
        R: RangeBounds<usize>,
    {
        self.body.drain(range)
    }

    /// Removes the element equivalent to `value`, if any. Returns how many
    /// elements were removed (0 or 1).
    pub fn remove(&mut self, value: &T) -> usize {
        let range = self.equal_range(value);
        self.remove_range(range)
    }

    pub fn remove_key<Q>(&mut self, query: &Q) -> usize
    where
        C: Transparent<T, Q>,
        Q: ?Sized,
    {
        let range = self.equal_range_key(query);
        self.remove_range(range)
    }

    /// Removes and returns the element equivalent to `value`.
    pub fn take(&mut self, value: &T) -> Option<T> {
        self.find(value).map(|index| self.body.remove(index))
    }

    pub fn retain(&mut self, keep: impl FnMut(&T) -> bool) {
        self.body.retain(keep)
    }

    fn remove_range(&mut self, range: Range<usize>) -> usize {
        let removed = range.len();
        self.body.drain(range);
        removed
    }

    //---------------------------------------------------------------------------
    // Search

    pub fn lower_bound(&self, value: &T) -> usize {
        self.body.partition_point(|x| self.compare.less(x, value))
    }

    pub fn upper_bound(&self, value: &T) -> usize {
        self.body.partition_point(|x| !self.compare.less(value, x))
    }

    pub fn equal_range(&self, value: &T) -> Range<usize> {
        let pos = self.lower_bound(value);
        if pos == self.body.len() || self.compare.less(value, &self.body[pos]) {
            return pos..pos;
        }
        pos..pos + 1
    }

    pub fn find(&self, value: &T) -> Option<usize> {
        let range = self.equal_range(value);
        (!range.is_empty()).then_some(range.start)
    }

    pub fn get(&self, value: &T) -> Option<&T> {
        self.find(value).map(|index| &self.body[index])
    }

    pub fn contains(&self, value: &T) -> bool {
        self.find(value).is_some()
    }

    pub fn count(&self, value: &T) -> usize {
        self.equal_range(value).len()
    }

    pub fn lower_bound_key<Q>(&self, query: &Q) -> usize
    where
        C: Transparent<T, Q>,
        Q: ?Sized,
    {
        self.body
            .partition_point(|x| self.compare.less_than_query(x, query))
    }

    pub fn upper_bound_key<Q>(&self, query: &Q) -> usize
    where
        C: Transparent<T, Q>,
        Q: ?Sized,
    {
        self.body
            .partition_point(|x| !self.compare.query_less_than(query, x))
    }

    pub fn equal_range_key<Q>(&self, query: &Q) -> Range<usize>
    where
        C: Transparent<T, Q>,
        Q: ?Sized,
    {
        let pos = self.lower_bound_key(query);
        if pos == self.body.len() || self.compare.query_less_than(query, &self.body[pos]) {
            return pos..pos;
        }
        pos..pos + 1
    }

    pub fn find_key<Q>(&self, query: &Q) -> Option<usize>
    where
        C: Transparent<T, Q>,
        Q: ?Sized,
    {
        let range = self.equal_range_key(query);
        (!range.is_empty()).then_some(range.start)
    }

    pub fn get_key<Q>(&self, query: &Q) -> Option<&T>
    where
        C: Transparent<T, Q>,
        Q: ?Sized,
    {
        self.find_key(query).map(|index| &self.body[index])
    }

    pub fn contains_key<Q>(&self, query: &Q) -> bool
    where
        C: Transparent<T, Q>,
        Q: ?Sized,
    {
        self.find_key(query).is_some()
    }

    pub fn count_key<Q>(&self, query: &Q) -> usize
    where
        C: Transparent<T, Q>,
        Q: ?Sized,
    {
        self.equal_range_key(query).len()
    }

    //---------------------------------------------------------------------------
    // Whole-set operations

    pub fn swap(&mut self, other: &mut Self) {
        mem::swap(self, other)
    }

    /// Lazily yields the union of both sets in order. For equivalent
    /// elements the one from `self` is yielded.
    pub fn union<'a>(&'a self, other: &'a Self) -> impl Iterator<Item = &'a T> + 'a {
        let compare = &self.compare;
        set_union(self.body.iter(), other.body.iter(), move |a: &&T, b: &&T| {
            compare.less(*a, *b)
        })
    }

    fn is_strictly_sorted(&self) -> bool {
        self.body
            .iter()
            .tuple_windows()
            .all(|(a, b)| self.compare.less(a, b))
    }
}

/// Backward merge of a sorted, unique batch into the spare capacity behind
/// `body`, as the runs of a biased union.
///
/// The first run is the existing elements read from the back, the second is
/// the batch read from the back, and output is written downwards from
/// `existing + batch.len()`. While the merge runs, `[0, existing)` holds the
/// unmerged existing elements, `[existing, out)` is a hole and `[out, end)`
/// the merged output; `out >= existing + batch.len()` keeps writes inside
/// the hole. Dropping the merge, normally or during unwinding, closes the
/// hole and gives `body` its length back.
struct TailMerge<'a, T> {
    body: &'a mut Vec<T>,
    batch: Vec<T>,
    existing: usize,
    out: usize,
    end: usize,
}

impl<'a, T> TailMerge<'a, T> {
    fn new(body: &'a mut Vec<T>, batch: Vec<T>) -> Self {
        let existing = body.len();
        let end = existing + batch.len();
        assert!(body.capacity() >= end, "no room reserved for the batch");
        // SAFETY: the elements below `existing` stay initialized and are
        // handed back by `drop`.
        unsafe { body.set_len(0) };
        Self {
            body,
            batch,
            existing,
            out: end,
            end,
        }
    }
}

impl<T> UnionRuns for TailMerge<'_, T> {
    type Item = T;

    fn first_len(&self) -> usize {
        self.existing
    }

    fn first(&self, offset: usize) -> &T {
        assert!(offset < self.existing);
        // SAFETY: slots below `existing` are initialized.
        unsafe { &*self.body.as_ptr().add(self.existing - 1 - offset) }
    }

    fn second_len(&self) -> usize {
        self.batch.len()
    }

    fn second(&self) -> &T {
        &self.batch[self.batch.len() - 1]
    }

    fn take_first(&mut self, n: usize) {
        assert!(n <= self.existing);
        self.existing -= n;
        self.out -= n;
        // SAFETY: moves the top `n` unmerged elements to the top of the hole.
        // The ranges may overlap, which `ptr::copy` allows.
        unsafe {
            let base = self.body.as_mut_ptr();
            ptr::copy(base.add(self.existing), base.add(self.out), n);
        }
    }

    fn take_second(&mut self) {
        if let Some(value) = self.batch.pop() {
            self.out -= 1;
            // SAFETY: the slot is inside the hole.
            unsafe { ptr::write(self.body.as_mut_ptr().add(self.out), value) };
        }
    }

    fn skip_second(&mut self) {
        self.batch.pop();
    }

    // what is left of the first run already sits below the hole
    fn drain_first(&mut self) {}

    fn drain_second(&mut self) {
        let n = self.batch.len();
        self.out -= n;
        // SAFETY: the batch moves into the top of the hole and gives up
        // ownership by dropping its length to zero.
        unsafe {
            ptr::copy_nonoverlapping(self.batch.as_ptr(), self.body.as_mut_ptr().add(self.out), n);
            self.batch.set_len(0);
        }
    }
}

impl<T> Drop for TailMerge<'_, T> {
    fn drop(&mut self) {
        let merged = self.end - self.out;
        // SAFETY: `[0, existing)` and `[out, end)` are initialized; sliding
        // the output down onto the hole makes `[0, existing + merged)` whole.
        unsafe {
            let base = self.body.as_mut_ptr();
            ptr::copy(base.add(self.out), base.add(self.existing), merged);
            self.body.set_len(self.existing + merged);
        }
    }
}

impl<T, C: Default> Default for FlatSet<T, C> {
    fn default() -> Self {
        Self {
            compare: C::default(),
            body: vec![],
        }
    }
}

impl<T, C> fmt::Debug for FlatSet<T, C>
where
    T: fmt::Debug,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_set().entries(self.body.iter()).finish()
    }
}

// comparison looks at contents only, so sets with different but agreeing
// comparators compare equal
impl<T, C1, C2> PartialEq<FlatSet<T, C2>> for FlatSet<T, C1>
where
    T: PartialEq,
{
    fn eq(&self, other: &FlatSet<T, C2>) -> bool {
        self.body == other.body
    }
}

impl<T: Eq, C> Eq for FlatSet<T, C> {}

impl<T, C1, C2> PartialOrd<FlatSet<T, C2>> for FlatSet<T, C1>
where
    T: PartialOrd,
{
    fn partial_cmp(&self, other: &FlatSet<T, C2>) -> Option<Ordering> {
        self.body.partial_cmp(&other.body)
    }
}

impl<T: Ord, C> Ord for FlatSet<T, C> {
    fn cmp(&self, other: &Self) -> Ordering {
        self.body.cmp(&other.body)
    }
}

impl<T: Hash, C> Hash for FlatSet<T, C> {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.body.hash(state)
    }
}

impl<T, C> FromIterator<T> for FlatSet<T, C>
where
    C: Compare<T> + Default,
{
    fn from_iter<I: IntoIterator<Item = T>>(iter: I) -> Self {
        Self::from_vec_with_compare(iter.into_iter().collect(), C::default())
    }
}

// only for the natural order, so `FlatSet::from([..])` needs no annotation;
// other comparators go through `from_vec_with_compare` or `collect`
impl<T: Ord> From<Vec<T>> for FlatSet<T> {
    fn from(body: Vec<T>) -> Self {
        Self::from_vec(body)
    }
}

impl<T: Ord, const N: usize> From<[T; N]> for FlatSet<T> {
    fn from(values: [T; N]) -> Self {
        Self::from_vec(values.into())
    }
}

impl<T, C> Extend<T> for FlatSet<T, C>
where
    C: Compare<T>,
{
    fn extend<I: IntoIterator<Item = T>>(&mut self, iter: I) {
        self.insert_iter(iter)
    }
}

impl<'a, T, C> Extend<&'a T> for FlatSet<T, C>
where
    T: Copy + 'a,
    C: Compare<T>,
{
    fn extend<I: IntoIterator<Item = &'a T>>(&mut self, iter: I) {
        self.insert_iter(iter.into_iter().copied())
    }
}

impl<T, C> IntoIterator for FlatSet<T, C> {
    type Item = T;
    type IntoIter = vec::IntoIter<T>;

    fn into_iter(self) -> Self::IntoIter {
        self.body.into_iter()
    }
}

impl<'a, T, C> IntoIterator for &'a FlatSet<T, C> {
    type Item = &'a T;
    type IntoIter = slice::Iter<'a, T>;

    fn into_iter(self) -> Self::IntoIter {
        self.body.iter()
    }
}

impl<T, C> AsRef<[T]> for FlatSet<T, C> {
    fn as_ref(&self) -> &[T] {
        &self.body
    }
}
