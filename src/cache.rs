use std::collections::HashMap;
use std::future::Future;
use std::hash::Hash;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use futures::future::{BoxFuture, FutureExt, Shared};

/// A keyed memoizer for asynchronous lookups.
///
/// The shared future is stored *before* it settles, so every caller that
/// arrives while an entry is fresh awaits the same pending result: N
/// concurrent lookups for one key cost exactly one producer call. A failed
/// result stays cached like any other until TTL expiry; there is no eager
/// invalidation and no capacity bound.
pub struct TtlCache<K, T, E> {
    ttl: Duration,
    entries: Mutex<HashMap<K, CacheEntry<T, E>>>,
}

struct CacheEntry<T, E> {
    result: Shared<BoxFuture<'static, Result<T, Arc<E>>>>,
    expires_at: Instant,
}

impl<K, T, E> TtlCache<K, T, E>
where
    K: Eq + Hash + Clone,
    T: Clone + Send + Sync + 'static,
    E: Send + Sync + 'static,
{
    pub fn new(ttl: Duration) -> Self {
        Self {
            ttl,
            entries: Mutex::new(HashMap::new()),
        }
    }

    /// Return the cached result for `key`, invoking `producer` only on a
    /// miss or after expiry. The producer error is wrapped in an `Arc` so
    /// that every coalesced caller can observe the same failure.
    pub async fn lookup<F, Fut>(&self, key: K, producer: F) -> Result<T, Arc<E>>
    where
        F: FnOnce(K) -> Fut,
        Fut: Future<Output = Result<T, E>> + Send + 'static,
    {
        let shared = {
            let mut entries = self.entries.lock().unwrap();
            let now = Instant::now();
            match entries.get(&key) {
                Some(entry) if now < entry.expires_at => entry.result.clone(),
                _ => {
                    let fut = producer(key.clone());
                    let shared = fut.map(|r| r.map_err(Arc::new)).boxed().shared();
                    entries.insert(
                        key,
                        CacheEntry {
                            result: shared.clone(),
                            expires_at: now + self.ttl,
                        },
                    );
                    shared
                }
            }
        };
        shared.await
    }
}
