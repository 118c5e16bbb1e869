/// Walks `checkpoint..head` against the ascending list of persisted
/// numbers and returns the complement. The head itself is excluded; it
/// is still settling and gets picked up by the next pass. Persisted
/// blocks are skipped, so repeating a pass over the same range is a
/// no-op.
pub fn find_missing_blocks(head: u64, persisted: &[u64], checkpoint: u64) -> Vec<u64> {
    let mut missing = Vec::new();
    let mut cursor = 0;

    for number in checkpoint..head {
        match persisted.get(cursor) {
            Some(&persisted_number) if persisted_number == number => cursor += 1,
            _ => missing.push(number),
        }
    }

    missing
}

/// Splits the missing numbers into worker-sized batches.
pub fn partition(missing: &[u64], step: usize) -> Vec<Vec<u64>> {
    missing.chunks(step.max(1)).map(<[u64]>::to_vec).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn finds_holes_between_persisted_blocks() {
        assert_eq!(find_missing_blocks(5, &[2, 4], 1), vec![1, 3]);
    }

    #[test]
    fn nothing_missing_when_fully_persisted() {
        assert_eq!(find_missing_blocks(3, &[1, 2], 1), Vec::<u64>::new());
    }

    #[test]
    fn empty_store_yields_full_range() {
        assert_eq!(find_missing_blocks(3, &[], 0), vec![0, 1, 2]);
    }

    #[test]
    fn head_at_checkpoint_yields_nothing() {
        assert_eq!(find_missing_blocks(7, &[], 7), Vec::<u64>::new());
    }

    #[test]
    fn repeating_a_pass_is_idempotent() {
        let first = find_missing_blocks(10, &[3, 4, 7], 2);
        let second = find_missing_blocks(10, &[3, 4, 7], 2);
        assert_eq!(first, second);
    }

    #[test]
    fn partitions_by_step() {
        let batches = partition(&[10, 11, 12, 13], 2);
        assert_eq!(batches, vec![vec![10, 11], vec![12, 13]]);

        let uneven = partition(&[10, 11, 12], 2);
        assert_eq!(uneven, vec![vec![10, 11], vec![12]]);
    }

    #[test]
    fn zero_step_still_makes_progress() {
        let batches = partition(&[1, 2], 0);
        assert_eq!(batches.len(), 2);
    }
}
