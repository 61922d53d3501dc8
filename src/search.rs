//! Biased ("galloping") searches over sorted ranges.
//!
//! Every search here assumes the answer is close to where it starts. Probes
//! go out at offsets 1, 2, 4, ... from the current anchor and only fall back
//! to a binary search once a probe overshoots, so finding a boundary `d`
//! slots away costs `O(log d)` comparisons instead of `O(log n)`.
//!
//! The `_by` forms work on indices so callers can search views that are not
//! slices (reversed runs, raw storage).

/// Returns the first index in `0..len` for which `pred` is false, assuming
/// `pred` holds for a prefix and fails afterwards. Gallops forward from 0.
pub fn partition_point_biased_by(len: usize, mut pred: impl FnMut(usize) -> bool) -> usize {
    let mut lo = 0;
    let mut step = 1usize;
    while lo < len {
        let probe = lo.saturating_add(step - 1).min(len - 1);
        if !pred(probe) {
            return partition_between(lo, probe, &mut pred);
        }
        lo = probe + 1;
        step = step.saturating_mul(2);
    }
    lo
}

/// Same contract as [`partition_point_biased_by`] but gallops backward from
/// `len`, for when the boundary is expected near the end.
pub fn partition_point_biased_back_by(len: usize, mut pred: impl FnMut(usize) -> bool) -> usize {
    let mut hi = len;
    let mut step = 1usize;
    while hi > 0 {
        let probe = hi.saturating_sub(step);
        if pred(probe) {
            return partition_between(probe + 1, hi, &mut pred);
        }
        hi = probe;
        step = step.saturating_mul(2);
    }
    hi
}

/// Gallops forward from `hint`; if the boundary is not past `hint`, gallops
/// backward from it instead.
pub fn partition_point_hinted_by(
    len: usize,
    hint: usize,
    mut pred: impl FnMut(usize) -> bool,
) -> usize {
    assert!(hint <= len, "hint {hint} out of range for length {len}");
    let rhs = hint + partition_point_biased_by(len - hint, |i| pred(hint + i));
    if rhs != hint {
        return rhs;
    }
    partition_point_biased_back_by(hint, pred)
}

/// Bounded step used by the union engine to skip a run.
///
/// Checks the middle of the range first: if the predicate still holds there,
/// everything through the middle belongs to the run and is returned without
/// galloping. Otherwise the middle acts as an upper bound for the gallop.
/// The result is always a prefix on which `pred` holds, but not necessarily
/// the whole one.
pub(crate) fn find_boundary_by(len: usize, mut pred: impl FnMut(usize) -> bool) -> usize {
    if len == 0 {
        return 0;
    }
    let middle = len / 2;
    if pred(middle) {
        return middle + 1;
    }
    partition_point_biased_by(middle, pred)
}

// binary search in lo..hi where everything from hi on is known to fail
fn partition_between(mut lo: usize, mut hi: usize, pred: &mut impl FnMut(usize) -> bool) -> usize {
    while lo < hi {
        let mid = lo + (hi - lo) / 2;
        if pred(mid) {
            lo = mid + 1;
        } else {
            hi = mid;
        }
    }
    lo
}

pub fn partition_point_biased<T>(v: &[T], mut pred: impl FnMut(&T) -> bool) -> usize {
    partition_point_biased_by(v.len(), |i| pred(&v[i]))
}

pub fn partition_point_hinted<T>(v: &[T], hint: usize, mut pred: impl FnMut(&T) -> bool) -> usize {
    partition_point_hinted_by(v.len(), hint, |i| pred(&v[i]))
}

/// `lower_bound` that expects the answer near the front of `v`.
pub fn lower_bound_biased<T, F>(v: &[T], value: &T, is_less: &mut F) -> usize
where
    F: FnMut(&T, &T) -> bool,
{
    partition_point_biased(v, |x| is_less(x, value))
}

/// `lower_bound` that expects the answer near `hint`.
pub fn lower_bound_hinted<T, F>(v: &[T], hint: usize, value: &T, is_less: &mut F) -> usize
where
    F: FnMut(&T, &T) -> bool,
{
    partition_point_hinted(v, hint, |x| is_less(x, value))
}
