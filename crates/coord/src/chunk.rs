//! Splitting work queues into bounded chunks.

/// Splits off the first `n` items of `items`, returning `(prefix, remainder)`.
///
/// The prefix holds `min(n, items.len())` items in their original order. A chunk size of zero
/// yields an empty prefix and leaves everything in the remainder.
pub fn take_chunk<T>(mut items: Vec<T>, n: usize) -> (Vec<T>, Vec<T>) {
    let remainder = items.split_off(n.min(items.len()));
    (items, remainder)
}

/// Splits `items` into consecutive chunks of at most `n` items each.
///
/// # Panics
///
/// Panics if `n` is zero.
pub fn chunks<T>(items: Vec<T>, n: usize) -> Vec<Vec<T>> {
    assert!(n > 0, "chunk size must be positive");
    let mut out = Vec::with_capacity(items.len().div_ceil(n));
    let mut rest = items;
    while !rest.is_empty() {
        let (chunk, remainder) = take_chunk(rest, n);
        out.push(chunk);
        rest = remainder;
    }
    out
}

#[cfg(test)]
mod tests {
    use proptest::prelude::*;

    use super::*;

    #[test]
    fn takes_prefix_and_keeps_order() {
        let (prefix, rest) = take_chunk(vec![1, 2, 3, 4, 5], 2);
        assert_eq!(prefix, vec![1, 2]);
        assert_eq!(rest, vec![3, 4, 5]);
    }

    #[test]
    fn short_queue_is_fully_taken() {
        let (prefix, rest) = take_chunk(vec!['a', 'b'], 25);
        assert_eq!(prefix, vec!['a', 'b']);
        assert!(rest.is_empty());
    }

    #[test]
    fn zero_sized_chunk_takes_nothing() {
        let (prefix, rest) = take_chunk(vec![1, 2], 0);
        assert!(prefix.is_empty());
        assert_eq!(rest, vec![1, 2]);
    }

    proptest! {
        #[test]
        fn chunks_partition_the_input(
            items in prop::collection::vec(any::<u16>(), 0..200),
            n in 1..30usize,
        ) {
            let split = chunks(items.clone(), n);
            prop_assert!(split.iter().all(|c| !c.is_empty() && c.len() <= n));
            prop_assert_eq!(split.concat(), items);
        }
    }
}
