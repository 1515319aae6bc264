//! Asynchronous batching façade over the synchronous `canonmap` engine.
//!
//! Per spec.md §1/§9 this is an *external collaborator*: the core engine
//! (`canonmap`) has no suspension points and is specified only at its
//! interface with this crate. `AsyncEngine` owns an `Arc<SyncEngine<V>>`,
//! serializes access to it through that mutex (the core's single-writer
//! assumption), and introduces explicit yields *between* batches of
//! `batch_size` elements — never within a batch, which still runs
//! synchronously end to end, per spec.md §5's "Suspension points."

use canonmap::sync::SyncEngine;
use canonmap::{Key, Options};
use futures::stream::{self, Stream, StreamExt};
use std::sync::Arc;
use std::time::Duration;

/// Adapter around a shared, mutex-guarded [`canonmap::Engine`]. Cheap to
/// clone: cloning duplicates the `Arc`, not the engine.
#[derive(Clone)]
pub struct AsyncEngine<V> {
    engine: Arc<SyncEngine<V>>,
    batch_size: usize,
    max_concurrency: usize,
}

impl<V: Clone + Send + Sync + 'static> AsyncEngine<V> {
    pub fn new(engine: Arc<SyncEngine<V>>, options: &Options) -> Self {
        AsyncEngine {
            engine,
            batch_size: options.batch_size.max(1),
            max_concurrency: options.max_concurrency.max(1),
        }
    }

    pub fn from_options(options: Options) -> Self {
        let batch_size = options.batch_size.max(1);
        let max_concurrency = options.max_concurrency.max(1);
        AsyncEngine {
            engine: Arc::new(SyncEngine::new(options)),
            batch_size,
            max_concurrency,
        }
    }

    pub fn engine(&self) -> &Arc<SyncEngine<V>> {
        &self.engine
    }

    // ---- single-element operations: no suspension in the sync core, but
    // these stay `async fn` so callers can `.await` them uniformly inside a
    // batch pipeline alongside the combinators below. ----

    pub async fn put_async(&self, key: Key, value: V) {
        let engine = self.engine.clone();
        engine.put(key, value);
    }

    pub async fn get_async(&self, key: Key) -> Option<V> {
        let engine = self.engine.clone();
        engine.get(key)
    }

    pub async fn has_async(&self, key: Key) -> bool {
        let engine = self.engine.clone();
        engine.with_engine(|e| e.has(&key))
    }

    pub async fn remove_async(&self, key: Key) -> bool {
        let engine = self.engine.clone();
        engine.remove(key)
    }

    /// Applies `entries` in batches of `batch_size`, yielding to the runtime
    /// between (not within) each batch. Returns the total number applied.
    /// If `batch_timeout` is set, a batch that doesn't complete in time is
    /// abandoned (its entries are not retried here — that's the caller's
    /// concern, mirroring spec.md §5's "accept a timeout that applies per
    /// batch, not per element").
    pub async fn put_all_batched(&self, entries: Vec<(Key, V)>, batch_timeout: Option<Duration>) -> usize {
        let mut applied = 0;
        for chunk in entries.chunks(self.batch_size) {
            let engine = self.engine.clone();
            let batch: Vec<(Key, V)> = chunk.to_vec();
            let batch_len = batch.len();
            let work = async move {
                for (key, value) in batch {
                    engine.put(key, value);
                }
            };
            let completed = match batch_timeout {
                Some(d) => tokio::time::timeout(d, work).await.is_ok(),
                None => {
                    work.await;
                    true
                }
            };
            if completed {
                applied += batch_len;
            } else {
                tracing::warn!(batch_len, "async façade: batch exceeded its timeout, entries not applied");
            }
            tokio::task::yield_now().await;
        }
        applied
    }

    /// Streaming variant of [`Self::put_all_batched`]: yields the running
    /// count of entries applied after each batch completes, so a caller can
    /// observe progress instead of waiting for the whole operation.
    pub fn put_all_stream(&self, entries: Vec<(Key, V)>) -> impl Stream<Item = usize> {
        let batch_size = self.batch_size;
        let batches: Vec<Vec<(Key, V)>> = entries.chunks(batch_size).map(|c| c.to_vec()).collect();
        let engine = self.engine.clone();
        stream::iter(batches).then(move |batch| {
            let engine = engine.clone();
            async move {
                let n = batch.len();
                for (key, value) in batch {
                    engine.put(key, value);
                }
                tokio::task::yield_now().await;
                n
            }
        })
    }

    /// Looks up every key in `keys`, dispatching up to `max_concurrency`
    /// lookups at once (`Options::max_concurrency`). Order of the returned
    /// `Vec` matches the order of `keys`, not completion order.
    pub async fn get_all_concurrent(&self, keys: Vec<Key>) -> Vec<Option<V>> {
        let max_concurrency = self.max_concurrency;
        stream::iter(keys.into_iter().map(|key| {
            let engine = self.engine.clone();
            async move { engine.get(key) }
        }))
        .buffered(max_concurrency)
        .collect()
        .await
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[tokio::test]
    async fn put_then_get_round_trips() {
        let engine = AsyncEngine::from_options(Options::default());
        engine.put_async(Key::str("k"), 1).await;
        assert_eq!(engine.get_async(Key::str("k")).await, Some(1));
    }

    #[tokio::test]
    async fn batched_put_applies_everything_and_preserves_structural_equality() {
        let mut opts = Options::default();
        opts.batch_size = 2;
        let engine = AsyncEngine::from_options(opts);
        let entries: Vec<(Key, i32)> = (0..7).map(|i| (Key::Int(i), i)).collect();
        let applied = engine.put_all_batched(entries, None).await;
        assert_eq!(applied, 7);
        assert_eq!(engine.engine().size(), 7);
    }

    #[tokio::test]
    async fn stream_reports_progress_per_batch() {
        let mut opts = Options::default();
        opts.batch_size = 3;
        let engine = AsyncEngine::from_options(opts);
        let entries: Vec<(Key, i32)> = (0..10).map(|i| (Key::Int(i), i)).collect();
        let counts: Vec<usize> = engine.put_all_stream(entries).collect().await;
        assert_eq!(counts, vec![3, 3, 3, 1]);
        assert_eq!(engine.engine().size(), 10);
    }

    #[tokio::test]
    async fn get_all_concurrent_preserves_request_order() {
        let engine = AsyncEngine::from_options(Options::default());
        for i in 0..5 {
            engine.put_async(Key::Int(i), i * 10).await;
        }
        let keys: Vec<Key> = (0..5).map(Key::Int).collect();
        let values = engine.get_all_concurrent(keys).await;
        assert_eq!(values, vec![Some(0), Some(10), Some(20), Some(30), Some(40)]);
    }
}
