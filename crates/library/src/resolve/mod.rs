//! Resource resolution.
//!
//! [`Resolver::resolve`] walks a fixed sequence of lookups and stops at the
//! first that produces a non-empty list:
//!
//! 1. **Cache** - a previous successful resolution is returned as-is, the
//!    module source is not consulted again.
//! 2. **Primary** - the `resources` export of `book{b}-unit{u}-resources`.
//! 3. **Legacy** - the `book{b}Unit{u}Resources` export of the same module.
//! 4. **Implementation** - the `getBook{b}Unit{u}Resources` getter of
//!    `book{b}-unit{u}-implementation`, invoked.
//!
//! If all of them come up empty the result is an empty list, which is an
//! ordinary outcome ("no resources yet") and is not cached. Loader failures
//! (and panicking getters) are logged, published as
//! [`ResolveEvent::StrategyFailed`] and treated as a miss for that strategy:
//! resolution never returns an error.

mod event;
mod preload;

use std::any::Any;
use std::collections::HashMap;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;

use futures::FutureExt;
use futures::future::{BoxFuture, Shared};
use tokio::sync::{Mutex, broadcast};
use tracing::instrument;
use vela_cache::{ResourceCache, TeacherResource, UnitKey};

pub use self::event::{ResolveEvent, Strategy};
pub use self::preload::{PreloadEvent, PreloadHandle};
use crate::module::{ModuleSourceHandle, RESOURCES_EXPORT};

/// Capacity of the event channel. Lagging subscribers skip older events.
pub const EVENT_CHANNEL_CAPACITY: usize = 256;

type SharedResolution = Shared<BoxFuture<'static, Arc<[TeacherResource]>>>;

/// Resolves book/unit keys to resource lists.
///
/// Cheap to clone; clones share the cache, the in-flight table and the event
/// channel. Concurrent calls for the same key share one pending resolution,
/// so the strategies run at most once per key at a time.
#[derive(Clone)]
pub struct Resolver {
    inner: Arc<Inner>,
}

struct Inner {
    source: ModuleSourceHandle,
    cache: Arc<ResourceCache>,
    inflight: Mutex<HashMap<UnitKey, SharedResolution>>,
    events: broadcast::Sender<ResolveEvent>,
}

impl Resolver {
    pub fn new(source: ModuleSourceHandle, cache: Arc<ResourceCache>) -> Self {
        let (events, _) = broadcast::channel(EVENT_CHANNEL_CAPACITY);
        Self {
            inner: Arc::new(Inner {
                source,
                cache,
                inflight: Mutex::new(HashMap::new()),
                events,
            }),
        }
    }

    pub fn cache(&self) -> &Arc<ResourceCache> {
        &self.inner.cache
    }

    /// Receive every [`ResolveEvent`] published from now on.
    pub fn subscribe(&self) -> broadcast::Receiver<ResolveEvent> {
        self.inner.events.subscribe()
    }

    /// Drop every cached resolution.
    pub async fn clear_cache(&self) {
        self.inner.cache.clear().await;
    }

    /// Resource list for `key`, in the order the winning strategy listed it.
    #[instrument(skip(self), fields(key = %key))]
    pub async fn resolve(&self, key: &UnitKey) -> Arc<[TeacherResource]> {
        if let Some(hit) = self.cache_hit(key).await {
            return hit;
        }
        let pending = {
            let mut inflight = self.inner.inflight.lock().await;
            // A resolution may have finished between the first check and
            // taking the lock.
            if let Some(hit) = self.cache_hit(key).await {
                return hit;
            }
            match inflight.get(key) {
                Some(pending) => {
                    tracing::debug!("Joining in-flight resolution");
                    pending.clone()
                },
                None => {
                    let pending = run(self.inner.clone(), key.clone()).boxed().shared();
                    inflight.insert(key.clone(), pending.clone());
                    pending
                },
            }
        };
        pending.await
    }

    async fn cache_hit(&self, key: &UnitKey) -> Option<Arc<[TeacherResource]>> {
        let hit = self.inner.cache.get(key).await?;
        tracing::debug!(key = %key, count = hit.len(), "Resource cache hit");
        self.inner.publish(ResolveEvent::CacheHit { key: key.clone() });
        Some(hit)
    }
}

impl Inner {
    fn publish(&self, event: ResolveEvent) {
        // Sending only fails when nobody is subscribed.
        let _ = self.events.send(event);
    }

    fn strategy_failed(&self, key: &UnitKey, strategy: Strategy, message: String) {
        tracing::warn!(key = %key, %strategy, error = %message, "Resource loader failed, trying next strategy");
        self.publish(ResolveEvent::StrategyFailed {
            key: key.clone(),
            strategy,
            message,
        });
    }

    /// Run the strategies in order. `None` when all of them came up empty.
    async fn find(&self, key: &UnitKey) -> Option<(Strategy, Vec<TeacherResource>)> {
        match self.source.load_resources(key).await {
            Ok(Some(module)) => {
                for (strategy, export) in [(Strategy::Primary, RESOURCES_EXPORT.to_string()), (Strategy::Legacy, key.legacy_export())] {
                    match module.resources(&export) {
                        Some(resources) if !resources.is_empty() => return Some((strategy, resources.to_vec())),
                        _ => tracing::debug!(key = %key, %strategy, export = %export, "Export missing or empty"),
                    }
                }
            },
            Ok(None) => tracing::debug!(key = %key, module = %key.resources_module(), "Resource module not found"),
            Err(error) => self.strategy_failed(key, Strategy::Primary, (*error).to_string()),
        }

        match self.source.load_implementation(key).await {
            Ok(Some(module)) => match module.getter(&key.getter_export()) {
                Some(getter) => match panic::catch_unwind(AssertUnwindSafe(|| getter())) {
                    Ok(resources) if !resources.is_empty() => return Some((Strategy::Implementation, resources)),
                    Ok(_) => tracing::debug!(key = %key, "Getter returned no resources"),
                    Err(payload) => self.strategy_failed(key, Strategy::Implementation, panic_message(&*payload)),
                },
                None => tracing::debug!(key = %key, getter = %key.getter_export(), "Getter not exported"),
            },
            Ok(None) => {
                tracing::debug!(key = %key, module = %key.implementation_module(), "Implementation module not found")
            },
            Err(error) => self.strategy_failed(key, Strategy::Implementation, (*error).to_string()),
        }
        None
    }
}

/// The shared body of a resolution. Caches a hit, then leaves the in-flight
/// table so later callers go through the cache.
async fn run(inner: Arc<Inner>, key: UnitKey) -> Arc<[TeacherResource]> {
    // Panics are caught so the shared future always completes and leaves
    // the in-flight table.
    let found = match AssertUnwindSafe(inner.find(&key)).catch_unwind().await {
        Ok(found) => found,
        Err(payload) => {
            tracing::error!(key = %key, panic = %panic_message(&*payload), "Module source panicked");
            None
        },
    };
    let resources = match found {
        Some((strategy, resources)) => {
            let count = resources.len();
            let resources = inner.cache.put(key.clone(), resources).await;
            tracing::info!(key = %key, %strategy, count, "Resolved resources");
            inner.publish(ResolveEvent::Resolved {
                key: key.clone(),
                strategy,
                count,
            });
            resources
        },
        None => {
            tracing::warn!(key = %key, "No resources found for unit");
            inner.publish(ResolveEvent::Miss { key: key.clone() });
            Arc::from(Vec::new())
        },
    };
    inner.inflight.lock().await.remove(&key);
    resources
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    payload
        .downcast_ref::<&str>()
        .map(|message| message.to_string())
        .or_else(|| payload.downcast_ref::<String>().cloned())
        .unwrap_or_else(|| "panicked".to_string())
}
