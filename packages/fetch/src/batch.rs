//! Splits region identifiers into bounded query batches.

/// Splits `ids` into contiguous batches of at most `batch_size` items.
///
/// Order is preserved and every identifier lands in exactly one batch.
/// Empty input yields no batches. A `batch_size` of zero is treated as
/// one so the partition is always well defined.
#[must_use]
pub fn partition<T: Clone>(ids: &[T], batch_size: usize) -> Vec<Vec<T>> {
    ids.chunks(batch_size.max(1)).map(<[T]>::to_vec).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ids(n: usize) -> Vec<String> {
        (0..n).map(|i| format!("E{i:08}")).collect()
    }

    #[test]
    fn batch_count_is_ceiling_division() {
        for len in [0, 1, 49, 50, 51, 100, 101, 733] {
            for size in [1, 7, 50] {
                let batches = partition(&ids(len), size);
                assert_eq!(batches.len(), len.div_ceil(size), "len={len} size={size}");
            }
        }
    }

    #[test]
    fn concatenation_reproduces_input() {
        let input = ids(123);
        let batches = partition(&input, 50);
        let rejoined: Vec<String> = batches.concat();
        assert_eq!(rejoined, input);
    }

    #[test]
    fn no_batch_exceeds_size() {
        let batches = partition(&ids(101), 50);
        assert!(batches.iter().all(|b| !b.is_empty() && b.len() <= 50));
        assert_eq!(batches.last().map(Vec::len), Some(1));
    }

    #[test]
    fn empty_input_yields_no_batches() {
        let empty: Vec<String> = Vec::new();
        assert!(partition(&empty, 50).is_empty());
    }

    #[test]
    fn three_ids_fit_in_one_batch() {
        let input = vec!["A".to_string(), "B".to_string(), "C".to_string()];
        assert_eq!(partition(&input, 50), vec![input]);
    }
}
