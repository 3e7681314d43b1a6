use std::ops::Range;

use crate::error::PipelineError;

/// A contiguous `[start, end)` slice of the work sequence owned by one worker
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Partition {
    pub worker: usize,
    pub start: usize,
    pub end: usize,
}

impl Partition {
    pub fn len(&self) -> usize {
        self.end - self.start
    }

    pub fn is_empty(&self) -> bool {
        self.start == self.end
    }

    pub fn range(&self) -> Range<usize> {
        self.start..self.end
    }
}

/// Split `len` items into exactly `workers` contiguous, disjoint partitions
///
/// Every partition gets `len / workers` items except the last, which also absorbs
/// the remainder. When `len < workers` the leading partitions are empty.
pub fn partition(len: usize, workers: usize) -> Result<Vec<Partition>, PipelineError> {
    if workers == 0 {
        return Err(PipelineError::configuration("worker count must be at least 1"));
    }

    let base = len / workers;
    let partitions = (0..workers)
        .map(|worker| {
            let start = worker * base;
            let end = if worker == workers - 1 {
                len
            } else {
                start + base
            };
            Partition { worker, start, end }
        })
        .collect();

    Ok(partitions)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sizes(partitions: &[Partition]) -> Vec<usize> {
        partitions.iter().map(Partition::len).collect()
    }

    #[test]
    fn test_even_split() {
        let parts = partition(4, 2).unwrap();
        assert_eq!(parts[0].range(), 0..2);
        assert_eq!(parts[1].range(), 2..4);
    }

    #[test]
    fn test_last_partition_absorbs_remainder() {
        let parts = partition(10, 4).unwrap();
        assert_eq!(sizes(&parts), vec![2, 2, 2, 4]);
        assert_eq!(parts[3].range(), 6..10);
    }

    #[test]
    fn test_fewer_items_than_workers() {
        let parts = partition(3, 8).unwrap();
        assert_eq!(parts.len(), 8);
        assert!(parts[..7].iter().all(Partition::is_empty));
        assert_eq!(parts[7].range(), 0..3);
    }

    #[test]
    fn test_empty_input() {
        let parts = partition(0, 8).unwrap();
        assert_eq!(parts.len(), 8);
        assert!(parts.iter().all(Partition::is_empty));
    }

    #[test]
    fn test_zero_workers_is_configuration_error() {
        let err = partition(10, 0).unwrap_err();
        assert!(matches!(err, PipelineError::Configuration(_)));
    }

    #[test]
    fn test_partitions_cover_every_item_once() {
        for len in 0..40 {
            for workers in 1..12 {
                let parts = partition(len, workers).unwrap();
                assert_eq!(parts.len(), workers);
                assert_eq!(sizes(&parts).iter().sum::<usize>(), len);

                // Contiguous and disjoint: each partition starts where the previous ended
                let mut next = 0;
                for (index, part) in parts.iter().enumerate() {
                    assert_eq!(part.worker, index);
                    assert_eq!(part.start, next);
                    next = part.end;
                }
                assert_eq!(next, len);

                // Only the last partition may exceed the base size, by exactly the remainder
                let base = len / workers;
                assert!(parts[..workers - 1].iter().all(|p| p.len() == base));
                assert_eq!(parts[workers - 1].len(), base + len % workers);
            }
        }
    }
}
