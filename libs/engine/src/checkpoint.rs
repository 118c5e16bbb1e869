use store::model::BlockRef;

/// Outcome of comparing the persisted verification window against the
/// node's view of the same numbers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WindowVerdict {
    /// At least one hash differs. The entire compared window is rolled
    /// back and re-synced on the next pass; the checkpoint stays put.
    Rollback,
    /// All hashes match; the checkpoint moves forward.
    Advance(u64),
}

/// Compares the two windows positionally. The windows hold the same
/// block numbers in the same ascending order; any disagreement, in
/// length or in any hash, condemns the whole window.
pub fn validate_window(db_refs: &[BlockRef], chain_refs: &[BlockRef], checkpoint: u64) -> WindowVerdict {
    if db_refs.len() != chain_refs.len() {
        return WindowVerdict::Rollback;
    }

    for (db_ref, chain_ref) in db_refs.iter().zip(chain_refs) {
        if db_ref.number != chain_ref.number || db_ref.hash != chain_ref.hash {
            return WindowVerdict::Rollback;
        }
    }

    let numbers: Vec<u64> = db_refs.iter().map(|r| r.number as u64).collect();
    WindowVerdict::Advance(next_checkpoint(checkpoint, &numbers))
}

/// The first gap in the verified numbers bounds how far the checkpoint
/// may advance; with no gap it lands on the last verified number.
pub fn next_checkpoint(checkpoint: u64, verified: &[u64]) -> u64 {
    let mut cursor = 0;

    for number in checkpoint..=checkpoint + verified.len() as u64 {
        match verified.get(cursor) {
            Some(&verified_number) if number < verified_number => return number,
            Some(_) => cursor += 1,
            None => break,
        }
    }

    verified.last().copied().unwrap_or(checkpoint)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn refs(pairs: &[(i64, &str)]) -> Vec<BlockRef> {
        pairs.iter().map(|(number, hash)| BlockRef { number: *number, hash: (*hash).into() }).collect()
    }

    #[test]
    fn matching_windows_advance() {
        let window = refs(&[(1, "0xa"), (2, "0xb"), (3, "0xc")]);
        assert_eq!(validate_window(&window, &window.clone(), 1), WindowVerdict::Advance(3));
    }

    #[test]
    fn any_hash_mismatch_condemns_the_window() {
        let db = refs(&[(1, "0xa"), (2, "0xb"), (3, "0xc")]);
        let chain = refs(&[(1, "0xa"), (2, "0xreorged"), (3, "0xc")]);
        assert_eq!(validate_window(&db, &chain, 1), WindowVerdict::Rollback);
    }

    #[test]
    fn length_mismatch_condemns_the_window() {
        let db = refs(&[(1, "0xa"), (2, "0xb")]);
        let chain = refs(&[(1, "0xa")]);
        assert_eq!(validate_window(&db, &chain, 1), WindowVerdict::Rollback);
    }

    #[test]
    fn checkpoint_stops_at_first_gap() {
        // 4 is missing, so the checkpoint may not pass it
        assert_eq!(next_checkpoint(2, &[2, 3, 5, 6]), 4);
    }

    #[test]
    fn contiguous_window_advances_to_its_end() {
        assert_eq!(next_checkpoint(2, &[2, 3, 4, 5]), 5);
    }

    #[test]
    fn empty_window_keeps_the_checkpoint() {
        assert_eq!(next_checkpoint(7, &[]), 7);
    }
}
