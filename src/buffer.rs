use std::{mem, ptr};

/// Bounded staging area for elements moved out of a sequence during a
/// rotation or merge.
///
/// The capacity is granted once, at construction, on a best-effort basis: if
/// the allocator refuses the request, the request is halved until it succeeds
/// or reaches zero. A zero-capacity buffer is still usable; rotations that
/// see it simply take their buffer-free path.
///
/// Live elements never exceed the granted capacity. They are dropped in
/// reverse staging order by [`clear`](ScratchBuffer::clear) and when the
/// buffer itself goes away.
pub struct ScratchBuffer<T> {
    storage: Vec<T>,
    granted: usize,
}

impl<T> ScratchBuffer<T> {
    pub fn new(requested: usize) -> Self {
        let mut storage = Vec::new();
        let granted = halving_grant(requested, |n| storage.try_reserve_exact(n).is_ok());
        if granted < requested {
            tracing::debug!(requested, granted, "scratch buffer allocation degraded");
        }
        Self { storage, granted }
    }

    /// A buffer with no capacity at all.
    pub fn empty() -> Self {
        Self {
            storage: Vec::new(),
            granted: 0,
        }
    }

    pub fn capacity(&self) -> usize {
        self.granted
    }

    pub fn len(&self) -> usize {
        self.storage.len()
    }

    pub fn is_empty(&self) -> bool {
        self.storage.is_empty()
    }

    pub fn remaining(&self) -> usize {
        self.granted - self.storage.len()
    }

    pub fn as_slice(&self) -> &[T] {
        &self.storage
    }

    /// Drops every live element, last staged first. The granted capacity is
    /// kept for the next use.
    pub fn clear(&mut self) {
        while let Some(last) = self.storage.pop() {
            drop(last);
        }
    }

    /// Clones as many leading elements of `source` as fit. Returns the
    /// elements staged by this call and the part of `source` that did not fit.
    ///
    /// If a clone panics, whatever this call already staged is dropped (in
    /// reverse) before the panic continues; earlier contents are untouched.
    pub fn stage_cloned<'s>(&mut self, source: &'s [T]) -> (&[T], &'s [T])
    where
        T: Clone,
    {
        let start = self.storage.len();
        let (head, rest) = source.split_at(source.len().min(self.remaining()));
        let guard = StageGuard {
            storage: &mut self.storage,
            start,
        };
        for value in head {
            guard.storage.push(value.clone());
        }
        mem::forget(guard);
        (&self.storage[start..], rest)
    }

    /// Moves items out of `source` until the buffer is full or the iterator
    /// runs dry, and hands back the rest of the iterator.
    pub fn stage_iter<I>(&mut self, mut source: I) -> I
    where
        I: Iterator<Item = T>,
    {
        let start = self.storage.len();
        let room = self.remaining();
        let guard = StageGuard {
            storage: &mut self.storage,
            start,
        };
        for _ in 0..room {
            match source.next() {
                Some(value) => guard.storage.push(value),
                None => break,
            }
        }
        mem::forget(guard);
        source
    }

    /// Bitwise-moves `n` elements starting at `src` into the buffer.
    ///
    /// # Safety
    ///
    /// `src..src + n` must be initialized, must not alias the buffer, and
    /// `n <= self.remaining()`. The caller takes the source slots as
    /// moved-from: it must neither read nor drop them until they are
    /// refilled, and must not panic before handing the elements back with
    /// [`unstage_raw`](Self::unstage_raw).
    pub(crate) unsafe fn stage_raw(&mut self, src: *const T, n: usize) {
        debug_assert!(n <= self.remaining());
        let len = self.storage.len();
        ptr::copy_nonoverlapping(src, self.storage.as_mut_ptr().add(len), n);
        self.storage.set_len(len + n);
    }

    /// Bitwise-moves the last `n` staged elements out to `dst`.
    ///
    /// # Safety
    ///
    /// `dst..dst + n` must be valid for writes, must not alias the buffer and
    /// must hold no live values, and `n <= self.len()`.
    pub(crate) unsafe fn unstage_raw(&mut self, dst: *mut T, n: usize) {
        debug_assert!(n <= self.storage.len());
        let len = self.storage.len() - n;
        ptr::copy_nonoverlapping(self.storage.as_ptr().add(len), dst, n);
        self.storage.set_len(len);
    }
}

impl<T> Drop for ScratchBuffer<T> {
    fn drop(&mut self) {
        self.clear();
    }
}

// largest of `requested`, `requested / 2`, ... that `fits`, or zero
fn halving_grant(requested: usize, mut fits: impl FnMut(usize) -> bool) -> usize {
    let mut granted = requested;
    while granted > 0 && !fits(granted) {
        granted /= 2;
    }
    granted
}

// rolls a stage back to `start` if a clone or iterator panics part way
struct StageGuard<'a, T> {
    storage: &'a mut Vec<T>,
    start: usize,
}

impl<T> Drop for StageGuard<'_, T> {
    fn drop(&mut self) {
        while self.storage.len() > self.start {
            self.storage.pop();
        }
    }
}

#[cfg(test)]
mod test {
    use std::{
        cell::RefCell,
        panic::{catch_unwind, AssertUnwindSafe},
        rc::Rc,
    };

    use super::{halving_grant, ScratchBuffer};

    #[test]
    fn int_stage_stops_at_capacity() {
        let mut buf = ScratchBuffer::new(3);
        let all = [1, 2, 3, 4];
        let (staged, rest) = buf.stage_cloned(&all);
        assert_eq!(staged, [1, 2, 3]);
        assert_eq!(rest, [4]);
        assert_eq!(buf.remaining(), 0);
    }

    #[test]
    fn string_stage_stops_at_capacity() {
        let mut buf = ScratchBuffer::new(3);
        let all: Vec<String> = ["1", "2", "3", "4"].map(String::from).into();
        let (staged, rest) = buf.stage_cloned(&all);
        assert_eq!(staged, ["1", "2", "3"]);
        assert_eq!(rest, ["4"]);
    }

    #[test]
    fn clear_restores_capacity() {
        let mut buf = ScratchBuffer::new(2);
        let rest = buf.stage_iter(vec![String::from("a"), "b".into(), "c".into()].into_iter());
        assert_eq!(rest.collect::<Vec<_>>(), ["c"]);
        assert_eq!(buf.len(), 2);
        buf.clear();
        assert!(buf.is_empty());
        assert_eq!(buf.remaining(), 2);
        assert_eq!(buf.capacity(), 2);
    }

    #[test]
    fn zero_capacity_stages_nothing() {
        let mut buf = ScratchBuffer::empty();
        let (staged, rest) = buf.stage_cloned(&[1, 2]);
        assert!(staged.is_empty());
        assert_eq!(rest, [1, 2]);
        assert_eq!(ScratchBuffer::<u8>::new(0).capacity(), 0);
    }

    #[test]
    fn refused_request_is_halved() {
        let mut asked = vec![];
        let granted = halving_grant(100, |n| {
            asked.push(n);
            n <= 30
        });
        assert_eq!(granted, 25);
        assert_eq!(asked, [100, 50, 25]);

        assert_eq!(halving_grant(7, |_| false), 0);
        assert_eq!(halving_grant(0, |_| panic!("nothing to ask for")), 0);
        assert_eq!(halving_grant(8, |_| true), 8);
    }

    #[derive(Debug)]
    struct Loud {
        id: u32,
        log: Rc<RefCell<Vec<u32>>>,
    }

    impl Clone for Loud {
        fn clone(&self) -> Self {
            if self.id == 3 {
                panic!("clone of 3");
            }
            Loud {
                id: self.id,
                log: self.log.clone(),
            }
        }
    }

    impl Drop for Loud {
        fn drop(&mut self) {
            self.log.borrow_mut().push(self.id);
        }
    }

    #[test]
    fn failed_clone_drops_partial_stage_in_reverse() {
        let log = Rc::new(RefCell::new(vec![]));
        let source: Vec<Loud> = (1..=4)
            .map(|id| Loud {
                id,
                log: log.clone(),
            })
            .collect();
        let mut buf = ScratchBuffer::new(4);
        let result = catch_unwind(AssertUnwindSafe(|| {
            buf.stage_cloned(&source);
        }));
        assert!(result.is_err());
        assert!(buf.is_empty());
        assert_eq!(*log.borrow(), [2, 1]);
        drop(source);
        assert_eq!(*log.borrow(), [2, 1, 1, 2, 3, 4]);
    }

    #[test]
    fn failed_iterator_drops_partial_stage_in_reverse() {
        let log = Rc::new(RefCell::new(vec![]));
        let loud = |id| Loud {
            id,
            log: log.clone(),
        };
        let mut buf = ScratchBuffer::new(5);
        let rest = buf.stage_iter(std::iter::once(loud(10)));
        assert_eq!(rest.count(), 0);

        let source = (1..=5).map(|id| {
            if id == 3 {
                panic!("source ran out at 3");
            }
            loud(id)
        });
        let result = catch_unwind(AssertUnwindSafe(|| {
            buf.stage_iter(source);
        }));
        assert!(result.is_err());
        assert_eq!(*log.borrow(), [2, 1]);
        assert_eq!(buf.as_slice().iter().map(|l| l.id).collect::<Vec<_>>(), [10]);
        drop(buf);
        assert_eq!(*log.borrow(), [2, 1, 10]);
    }
}
