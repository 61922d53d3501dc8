//! Merging two adjacent sorted runs of one slice without a full-size buffer.
//!
//! The left run is split at its middle element, that element's landing spot
//! in the right run is found with a lower bound, and the span in between is
//! rotated so both halves of the problem become independent. Each level
//! halves the left side of both sub-problems, so the recursion is
//! logarithmic in the length of the left run. Equal elements keep their
//! relative order.

use crate::{buffer::ScratchBuffer, rotate::rotate_buffered};

/// Merges the sorted runs `v[..mid]` and `v[mid..]` using only buffer-free
/// rotations.
pub fn inplace_merge_rotating_middles<T, F>(v: &mut [T], mid: usize, is_less: &mut F)
where
    F: FnMut(&T, &T) -> bool,
{
    inplace_merge_with_buffer(v, mid, is_less, &mut ScratchBuffer::empty());
}

/// Like [`inplace_merge_rotating_middles`], but allocates one scratch buffer
/// of `min(left, right)` elements up front and reuses it for every rotation
/// in the recursion.
pub fn inplace_merge_rotating_middles_buffered<T, F>(v: &mut [T], mid: usize, is_less: &mut F)
where
    F: FnMut(&T, &T) -> bool,
{
    assert!(mid <= v.len(), "mid {mid} out of range for length {}", v.len());
    let mut buffer = ScratchBuffer::new(mid.min(v.len() - mid));
    inplace_merge_with_buffer(v, mid, is_less, &mut buffer);
}

/// Recursive step shared by both entry points. `buffer` is cleared after each
/// rotation so siblings can reuse it.
pub fn inplace_merge_with_buffer<T, F>(
    v: &mut [T],
    mid: usize,
    is_less: &mut F,
    buffer: &mut ScratchBuffer<T>,
) where
    F: FnMut(&T, &T) -> bool,
{
    assert!(mid <= v.len(), "mid {mid} out of range for length {}", v.len());
    if mid == 0 || mid == v.len() {
        return;
    }

    let left_mid = mid / 2;
    let right_mid = {
        let (left, right) = v.split_at(mid);
        let pivot = &left[left_mid];
        mid + right.partition_point(|x| is_less(x, pivot))
    };
    let pivot = left_mid + rotate_buffered(&mut v[left_mid..right_mid], mid - left_mid, buffer);
    buffer.clear();

    // a one element left run is already in place after the rotation
    if left_mid == 0 {
        return;
    }
    let (lower, upper) = v.split_at_mut(pivot);
    inplace_merge_with_buffer(upper, right_mid - pivot, is_less, buffer);
    inplace_merge_with_buffer(lower, left_mid, is_less, buffer);
}
