use std::sync::Arc;

use async_stream::stream;
use futures::stream::FuturesUnordered;
use futures::{Stream, StreamExt};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use vela_cache::{TeacherResource, UnitKey};

use super::{ResolveEvent, Resolver};

/// Handle to a background [`Resolver::preload`].
///
/// Dropping the handle does not stop the preload; it keeps running until it
/// finishes or is [cancelled](Self::cancel).
#[derive(Debug)]
pub struct PreloadHandle {
    key: UnitKey,
    token: CancellationToken,
    task: JoinHandle<Option<Arc<[TeacherResource]>>>,
}

impl PreloadHandle {
    pub fn key(&self) -> &UnitKey {
        &self.key
    }

    /// Stop waiting for the resolution. Nothing is cached on behalf of a
    /// cancelled preload.
    ///
    /// The interrupted resolution stays parked in the resolver's in-flight
    /// table. The next [`Resolver::resolve`] for the same key joins it and
    /// drives it to completion from where it stopped, so work already done
    /// by the module source is not repeated.
    pub fn cancel(&self) {
        self.token.cancel();
    }

    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }

    /// Wait for the preload. `None` if it was cancelled.
    pub async fn join(self) -> Option<Arc<[TeacherResource]>> {
        match self.task.await {
            Ok(resources) => resources,
            Err(error) => {
                tracing::warn!(key = %self.key, %error, "Preload task failed");
                None
            },
        }
    }
}

/// Progress of [`Resolver::preload_all`].
///
/// Events follow a strict ordering:
/// 1. [`Started`](Self::Started) - exactly once, with the number of keys.
/// 2. [`Resolved`](Self::Resolved) - once per key, in completion order.
/// 3. [`Complete`](Self::Complete) - exactly once.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PreloadEvent {
    Started(u64),
    /// `count` is zero when the unit has no resources.
    Resolved { key: UnitKey, count: usize },
    Complete,
}

impl Resolver {
    /// Warm the cache for `key` in the background.
    ///
    /// The caller does not need to keep or await the handle. Outcomes,
    /// including cancellation, are published as [`ResolveEvent`]s.
    pub fn preload(&self, key: UnitKey) -> PreloadHandle {
        let token = CancellationToken::new();
        let cancelled = token.clone();
        let resolver = self.clone();
        let task_key = key.clone();
        let task = tokio::spawn(async move {
            tokio::select! {
                biased;
                () = cancelled.cancelled() => {
                    tracing::debug!(key = %task_key, "Preload cancelled");
                    resolver.inner.publish(ResolveEvent::PreloadCancelled { key: task_key.clone() });
                    None
                },
                resources = resolver.resolve(&task_key) => Some(resources),
            }
        });
        PreloadHandle { key, token, task }
    }

    /// Resolve every key, at most `concurrency` at a time, reporting progress
    /// as a stream. Keys are started in the order given.
    pub fn preload_all(&self, keys: Vec<UnitKey>, concurrency: usize) -> impl Stream<Item = PreloadEvent> + '_ {
        // `rustfmt` does not format macros that use braces. Wrap in parentheses!
        stream!({
            // Infallible: a usize (either 32- or 64-bit) will always fit in a u64.
            yield PreloadEvent::Started(u64::try_from(keys.len()).unwrap_or(0));

            let mut pending: Vec<_> = keys
                .into_iter()
                .map(|key| async move {
                    let count = self.resolve(&key).await.len();
                    PreloadEvent::Resolved { key, count }
                })
                .collect();
            let mut running = FuturesUnordered::new();
            running.extend(pending.drain(..concurrency.max(1).min(pending.len())));
            while let Some(event) = running.next().await {
                yield event;
                // Pop-n-push, but FIFO instead of LIFO.
                if !pending.is_empty() {
                    running.push(pending.remove(0));
                }
            }

            yield PreloadEvent::Complete;
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mock::MockModuleSource;
    use std::time::Duration;
    use vela_cache::{ResourceCache, ResourceType};

    fn key(unit: &str) -> UnitKey {
        UnitKey::new("2", unit).unwrap()
    }

    fn resources(key: &UnitKey, n: usize) -> Vec<TeacherResource> {
        (1..=n).map(|i| TeacherResource::new(key, ResourceType::Video, i, format!("Video {i}"))).collect()
    }

    #[tokio::test(start_paused = true)]
    async fn test_preload_warms_cache() {
        let source = Arc::new(
            MockModuleSource::default()
                .with_resources(key("1"), resources(&key("1"), 2))
                .with_delay(Duration::from_millis(100)),
        );
        let resolver = Resolver::new(source.clone(), Arc::new(ResourceCache::new()));
        let handle = resolver.preload(key("1"));
        assert_eq!(handle.key(), &key("1"));
        assert_eq!(handle.join().await.map(|r| r.len()), Some(2));

        assert!(resolver.cache().contains(&key("1")).await);
        resolver.resolve(&key("1")).await;
        assert_eq!(source.resource_loads(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancelled_preload_caches_nothing() {
        let source = Arc::new(
            MockModuleSource::default()
                .with_resources(key("1"), resources(&key("1"), 1))
                .with_delay(Duration::from_secs(5)),
        );
        let resolver = Resolver::new(source.clone(), Arc::new(ResourceCache::new()));
        let mut rx = resolver.subscribe();

        let handle = resolver.preload(key("1"));
        // Let the preload get as far as the (slow) module source.
        tokio::time::sleep(Duration::from_millis(10)).await;
        assert_eq!(source.resource_loads(), 1);
        handle.cancel();
        assert_eq!(handle.join().await, None);

        tokio::time::sleep(Duration::from_secs(10)).await;
        assert!(resolver.cache().is_empty().await);
        assert_eq!(rx.try_recv().unwrap(), ResolveEvent::PreloadCancelled { key: key("1") });
    }

    #[tokio::test(start_paused = true)]
    async fn test_resolve_after_cancel_resumes_parked_resolution() {
        let source = Arc::new(
            MockModuleSource::default()
                .with_resources(key("1"), resources(&key("1"), 2))
                .with_delay(Duration::from_secs(5)),
        );
        let resolver = Resolver::new(source.clone(), Arc::new(ResourceCache::new()));

        let handle = resolver.preload(key("1"));
        tokio::time::sleep(Duration::from_millis(10)).await;
        handle.cancel();
        assert_eq!(handle.join().await, None);

        assert_eq!(resolver.resolve(&key("1")).await.len(), 2);
        assert_eq!(source.resource_loads(), 1);
        assert!(resolver.cache().contains(&key("1")).await);
    }

    #[tokio::test]
    async fn test_preload_all_reports_each_key() {
        let source = Arc::new(
            MockModuleSource::default()
                .with_resources(key("1"), resources(&key("1"), 3))
                .with_resources(key("3"), resources(&key("3"), 1)),
        );
        let resolver = Resolver::new(source, Arc::new(ResourceCache::new()));
        let events: Vec<PreloadEvent> = resolver.preload_all(vec![key("1"), key("2"), key("3")], 2).collect().await;

        assert_eq!(events.first(), Some(&PreloadEvent::Started(3)));
        assert_eq!(events.last(), Some(&PreloadEvent::Complete));
        let mut resolved: Vec<(String, usize)> = events
            .iter()
            .filter_map(|event| match event {
                PreloadEvent::Resolved { key, count } => Some((key.to_string(), *count)),
                _ => None,
            })
            .collect();
        resolved.sort();
        assert_eq!(
            resolved,
            vec![("book2-unit1".to_string(), 3), ("book2-unit2".to_string(), 0), ("book2-unit3".to_string(), 1)]
        );
        assert_eq!(resolver.cache().len().await, 2);
    }

    #[tokio::test]
    async fn test_preload_all_empty() {
        let resolver = Resolver::new(Arc::new(MockModuleSource::default()), Arc::new(ResourceCache::new()));
        let events: Vec<PreloadEvent> = resolver.preload_all(Vec::new(), 0).collect().await;
        assert_eq!(events, vec![PreloadEvent::Started(0), PreloadEvent::Complete]);
    }
}
