//! Splitting the candidate list into contiguous per-worker chunks.

use crate::util::{TexSearchError, TexSearchResult};
use serde::{Deserialize, Serialize};

/// Number of worker processes: 0 (scan in-process) or 2 to 4.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "usize", into = "usize")]
pub struct WorkerCount(usize);

impl WorkerCount {
    /// Pooling disabled; the whole list is one chunk scanned in-process.
    pub const SINGLE: WorkerCount = WorkerCount(0);
    /// Largest supported pool.
    pub const MAX: usize = 4;

    pub fn new(count: usize) -> TexSearchResult<Self> {
        if count == 0 || (2..=Self::MAX).contains(&count) {
            Ok(Self(count))
        } else {
            Err(TexSearchError::ThreadCountOutOfRange(count))
        }
    }

    pub fn get(self) -> usize {
        self.0
    }

    /// True when chunks are handed to separate worker processes.
    pub fn is_pooled(self) -> bool {
        self.0 != 0
    }

    /// Number of chunks [`partition`] produces.
    pub fn chunk_count(self) -> usize {
        self.0.max(1)
    }
}

impl TryFrom<usize> for WorkerCount {
    type Error = TexSearchError;

    fn try_from(value: usize) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<WorkerCount> for usize {
    fn from(value: WorkerCount) -> Self {
        value.0
    }
}

/// Splits `items` into `workers.chunk_count()` contiguous chunks.
///
/// The first `W - 1` chunks hold `floor(len / W)` items each; the last chunk
/// takes everything that remains, so it is larger by up to `W - 1` items.
/// Chunks may be empty when there are fewer items than workers.
pub fn partition<T>(items: &[T], workers: WorkerCount) -> Vec<&[T]> {
    let count = workers.chunk_count();
    let share = items.len() / count;
    let mut chunks = Vec::with_capacity(count);
    let mut rest = items;
    for _ in 1..count {
        let (head, tail) = rest.split_at(share);
        chunks.push(head);
        rest = tail;
    }
    chunks.push(rest);
    chunks
}

#[cfg(test)]
mod tests {
    use super::{partition, WorkerCount};
    use crate::util::TexSearchError;
    use proptest::prelude::*;

    #[test]
    fn worker_count_accepts_only_supported_sizes() {
        for ok in [0, 2, 3, 4] {
            assert_eq!(WorkerCount::new(ok).unwrap().get(), ok);
        }
        for bad in [1, 5, 16] {
            assert!(matches!(
                WorkerCount::new(bad),
                Err(TexSearchError::ThreadCountOutOfRange(n)) if n == bad
            ));
        }
    }

    #[test]
    fn five_items_over_four_workers() {
        let items = ["a", "b", "c", "d", "e"];
        let chunks = partition(&items, WorkerCount::new(4).unwrap());
        let sizes: Vec<usize> = chunks.iter().map(|c| c.len()).collect();
        assert_eq!(sizes, vec![1, 1, 1, 2]);
        assert_eq!(chunks[3], &["d", "e"]);
    }

    #[test]
    fn disabled_pool_is_one_chunk() {
        let items = [1, 2, 3];
        assert_eq!(partition(&items, WorkerCount::SINGLE), vec![&items[..]]);
    }

    #[test]
    fn fewer_items_than_workers() {
        let items = [7, 8];
        let chunks = partition(&items, WorkerCount::new(3).unwrap());
        assert_eq!(chunks, vec![&[][..], &[][..], &[7, 8][..]]);
    }

    #[test]
    fn worker_count_serde_validates() {
        let w: WorkerCount = serde_json::from_str("3").unwrap();
        assert_eq!(w.get(), 3);
        assert!(serde_json::from_str::<WorkerCount>("1").is_err());
        assert_eq!(serde_json::to_string(&w).unwrap(), "3");
    }

    fn worker_count() -> impl Strategy<Value = WorkerCount> {
        prop_oneof![Just(0usize), 2usize..=4].prop_map(|n| WorkerCount::new(n).unwrap())
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(64))]

        #[test]
        fn chunks_cover_every_item_once(len in 0usize..200, workers in worker_count()) {
            let items: Vec<usize> = (0..len).collect();
            let chunks = partition(&items, workers);
            prop_assert_eq!(chunks.len(), workers.chunk_count());
            let joined: Vec<usize> = chunks.concat();
            prop_assert_eq!(joined, items);
        }

        #[test]
        fn chunk_sizes_follow_floor_policy(len in 0usize..200, workers in worker_count()) {
            let items: Vec<usize> = (0..len).collect();
            let chunks = partition(&items, workers);
            let w = workers.chunk_count();
            let share = len / w;
            for chunk in &chunks[..w - 1] {
                prop_assert_eq!(chunk.len(), share);
            }
            prop_assert_eq!(chunks[w - 1].len(), len - (w - 1) * share);
        }
    }
}
