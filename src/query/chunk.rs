//! Fixed-size grouping of sequences

/// Split `items` into contiguous groups of at most `size` items.
///
/// Order is preserved and every item lands in exactly one group. An empty
/// input yields no groups; a `size` of 0 yields the whole input as one group.
pub fn chunk<T>(items: &[T], size: usize) -> Vec<&[T]> {
    if items.is_empty() {
        return Vec::new();
    }
    if size == 0 {
        return vec![items];
    }
    items.chunks(size).collect()
}
