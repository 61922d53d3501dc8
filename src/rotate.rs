use std::ptr;

use crate::buffer::ScratchBuffer;

/// Rotates `v` so that `v[mid..]` comes first, keeping the order inside each
/// side. Returns `v.len() - mid`, the new index of what was `v[0]`.
///
/// The smaller side is parked in `buffer` while the larger one slides over in
/// a single move. If `buffer` has no room for the smaller side, this falls
/// back to [`rotate_reversing`].
pub fn rotate_buffered<T>(v: &mut [T], mid: usize, buffer: &mut ScratchBuffer<T>) -> usize {
    assert!(mid <= v.len(), "mid {mid} out of range for length {}", v.len());
    let lhs = mid;
    let rhs = v.len() - mid;
    if lhs == 0 || rhs == 0 {
        return rhs;
    }

    let base = v.as_mut_ptr();
    if lhs <= rhs {
        if buffer.remaining() >= lhs {
            // SAFETY: the lhs slots are vacated into the buffer, the rhs is
            // memmoved down over them and the buffer refills the tail. Nothing
            // in between can panic, so no slot is observed or dropped twice.
            unsafe {
                buffer.stage_raw(base, lhs);
                ptr::copy(base.add(mid), base, rhs);
                buffer.unstage_raw(base.add(rhs), lhs);
            }
            return rhs;
        }
    } else if buffer.remaining() >= rhs {
        // SAFETY: mirror image of the branch above.
        unsafe {
            buffer.stage_raw(base.add(mid), rhs);
            ptr::copy(base, base.add(rhs), lhs);
            buffer.unstage_raw(base, rhs);
        }
        return rhs;
    }

    rotate_reversing(v, mid)
}

/// Buffer-free rotation by three reversals. Same contract as
/// [`rotate_buffered`].
pub fn rotate_reversing<T>(v: &mut [T], mid: usize) -> usize {
    v[..mid].reverse();
    v[mid..].reverse();
    v.reverse();
    v.len() - mid
}

/// Rotates with a scratch buffer sized for the smaller side.
pub fn rotate<T>(v: &mut [T], mid: usize) -> usize {
    assert!(mid <= v.len(), "mid {mid} out of range for length {}", v.len());
    let mut buffer = ScratchBuffer::new(mid.min(v.len() - mid));
    rotate_buffered(v, mid, &mut buffer)
}

#[cfg(test)]
mod test {
    use super::*;

    fn check_every_split(rotate_at: impl Fn(&mut [u32], usize) -> usize) {
        let v: Vec<u32> = (0..100).collect();
        for mid in 0..=v.len() {
            let mut actual = v.clone();
            let actual_point = rotate_at(&mut actual, mid);

            let mut expected = v.clone();
            expected.rotate_left(mid);

            assert_eq!(actual, expected, "mid = {mid}");
            assert_eq!(actual_point, v.len() - mid, "mid = {mid}");
        }
    }

    #[test]
    fn rotate_sized_buffer() {
        check_every_split(|v, mid| rotate(v, mid));
    }

    #[test]
    fn rotate_full_buffer() {
        check_every_split(|v, mid| {
            let mut buffer = ScratchBuffer::new(v.len());
            rotate_buffered(v, mid, &mut buffer)
        });
    }

    #[test]
    fn rotate_zero_buffer() {
        check_every_split(|v, mid| rotate_buffered(v, mid, &mut ScratchBuffer::empty()));
    }

    #[test]
    fn rotate_undersized_buffer() {
        check_every_split(|v, mid| rotate_buffered(v, mid, &mut ScratchBuffer::new(10)));
    }

    #[test]
    fn rotate_reversing_every_split() {
        check_every_split(rotate_reversing);
    }

    #[test]
    fn rotate_five() {
        for capacity in [2, 0] {
            let mut v = [1, 2, 3, 4, 5];
            let mut buffer = ScratchBuffer::new(capacity);
            assert_eq!(rotate_buffered(&mut v, 2, &mut buffer), 3);
            assert_eq!(v, [3, 4, 5, 1, 2]);
            assert!(buffer.is_empty());
        }
    }

    #[test]
    fn rotate_owned_values() {
        let mut v: Vec<String> = (0..7).map(|i| i.to_string()).collect();
        let mut buffer = ScratchBuffer::new(3);
        rotate_buffered(&mut v, 4, &mut buffer);
        assert_eq!(v, ["4", "5", "6", "0", "1", "2", "3"]);
        rotate_buffered(&mut v, 2, &mut buffer);
        assert_eq!(v, ["6", "0", "1", "2", "3", "4", "5"]);
    }
}
