use std::borrow::Borrow;

/// A strict weak ordering over `T`.
///
/// Two values are equivalent when neither is `less` than the other; a
/// [`FlatSet`](crate::FlatSet) keeps at most one value per equivalence class.
pub trait Compare<T: ?Sized> {
    fn less(&self, a: &T, b: &T) -> bool;
}

/// Capability marker for comparators that can order a stored `T` against a
/// query `Q` without building a `T` first.
///
/// The ordering must agree with [`Compare::less`]: for every `t` that borrows
/// as `q`, comparing against `q` gives the same answer as comparing against `t`.
pub trait Transparent<T: ?Sized, Q: ?Sized>: Compare<T> {
    fn less_than_query(&self, element: &T, query: &Q) -> bool;

    fn query_less_than(&self, query: &Q, element: &T) -> bool;
}

/// Ascending order by `Ord`. Transparent for anything `T` borrows as.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct Less;

/// Descending order by `Ord`. Transparent for anything `T` borrows as.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct Greater;

impl<T> Compare<T> for Less
where
    T: Ord + ?Sized,
{
    fn less(&self, a: &T, b: &T) -> bool {
        a < b
    }
}

impl<T, Q> Transparent<T, Q> for Less
where
    T: Borrow<Q> + Ord + ?Sized,
    Q: Ord + ?Sized,
{
    fn less_than_query(&self, element: &T, query: &Q) -> bool {
        element.borrow() < query
    }

    fn query_less_than(&self, query: &Q, element: &T) -> bool {
        query < element.borrow()
    }
}

impl<T> Compare<T> for Greater
where
    T: Ord + ?Sized,
{
    fn less(&self, a: &T, b: &T) -> bool {
        a > b
    }
}

impl<T, Q> Transparent<T, Q> for Greater
where
    T: Borrow<Q> + Ord + ?Sized,
    Q: Ord + ?Sized,
{
    fn less_than_query(&self, element: &T, query: &Q) -> bool {
        element.borrow() > query
    }

    fn query_less_than(&self, query: &Q, element: &T) -> bool {
        query > element.borrow()
    }
}

// plain closures are never transparent
impl<T, F> Compare<T> for F
where
    T: ?Sized,
    F: Fn(&T, &T) -> bool,
{
    fn less(&self, a: &T, b: &T) -> bool {
        self(a, b)
    }
}

#[cfg(test)]
mod test {
    use super::{Compare, Greater, Less, Transparent};

    #[test]
    fn natural_orders() {
        assert!(Less.less(&1, &2));
        assert!(!Less.less(&2, &2));
        assert!(Greater.less(&2, &1));
        assert!(!Greater.less(&1, &1));
    }

    #[test]
    fn transparent_through_borrow() {
        let stored = String::from("bb");
        assert!(<Less as Transparent<String, str>>::less_than_query(
            &Less, &stored, "c"
        ));
        assert!(<Less as Transparent<String, str>>::query_less_than(
            &Less, "a", &stored
        ));
        assert!(<Greater as Transparent<String, str>>::less_than_query(
            &Greater, &stored, "a"
        ));
    }

    #[test]
    fn closures_compare() {
        let by_len = |a: &&str, b: &&str| a.len() < b.len();
        assert!(by_len.less(&"a", &"bb"));
        assert!(!by_len.less(&"aa", &"bb"));
    }
}
