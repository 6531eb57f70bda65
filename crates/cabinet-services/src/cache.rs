//! Per-tenant client cache
//!
//! One client per tenant, built on first use. Creation runs under the write
//! lock so concurrent first calls for a tenant build exactly one client.
//! `replace` always wins over whatever is cached.

use std::collections::HashMap;
use std::future::Future;
use std::sync::Arc;

use tokio::sync::RwLock;

pub struct ClientCache<C> {
    clients: Arc<RwLock<HashMap<String, C>>>,
}

impl<C> Clone for ClientCache<C> {
    fn clone(&self) -> Self {
        Self {
            clients: Arc::clone(&self.clients),
        }
    }
}

impl<C> Default for ClientCache<C> {
    fn default() -> Self {
        Self {
            clients: Arc::new(RwLock::new(HashMap::new())),
        }
    }
}

impl<C: Clone> ClientCache<C> {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn get(&self, tenant: &str) -> Option<C> {
        self.clients.read().await.get(tenant).cloned()
    }

    /// Cached client for `tenant`, building it with `build` if absent.
    pub async fn get_or_try_insert_with<E, F, Fut>(&self, tenant: &str, build: F) -> Result<C, E>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<C, E>>,
    {
        if let Some(client) = self.clients.read().await.get(tenant) {
            return Ok(client.clone());
        }

        let mut clients = self.clients.write().await;
        if let Some(client) = clients.get(tenant) {
            return Ok(client.clone());
        }
        let client = build().await?;
        clients.insert(tenant.to_string(), client.clone());
        tracing::debug!(tenant = %tenant, "Object storage client created");
        Ok(client)
    }

    pub async fn replace(&self, tenant: &str, client: C) {
        self.clients.write().await.insert(tenant.to_string(), client);
        tracing::info!(tenant = %tenant, "Object storage client replaced");
    }

    pub async fn remove(&self, tenant: &str) -> bool {
        self.clients.write().await.remove(tenant).is_some()
    }

    pub async fn len(&self) -> usize {
        self.clients.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::convert::Infallible;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[tokio::test]
    async fn test_builds_once_per_tenant() {
        let cache: ClientCache<usize> = ClientCache::new();
        let builds = AtomicUsize::new(0);
        let builds = &builds;

        for _ in 0..3 {
            let client = cache
                .get_or_try_insert_with("acme", || async move {
                    Ok::<_, Infallible>(builds.fetch_add(1, Ordering::SeqCst) + 10)
                })
                .await
                .unwrap();
            assert_eq!(client, 10);
        }
        assert_eq!(builds.load(Ordering::SeqCst), 1);

        cache
            .get_or_try_insert_with("globex", || async { Ok::<_, Infallible>(20) })
            .await
            .unwrap();
        assert_eq!(cache.len().await, 2);
    }

    #[tokio::test]
    async fn test_concurrent_first_use_builds_one_client() {
        let cache: ClientCache<usize> = ClientCache::new();
        let builds = Arc::new(AtomicUsize::new(0));

        let mut handles = Vec::new();
        for _ in 0..8 {
            let cache = cache.clone();
            let builds = Arc::clone(&builds);
            handles.push(tokio::spawn(async move {
                cache
                    .get_or_try_insert_with("acme", || async move {
                        tokio::task::yield_now().await;
                        Ok::<_, Infallible>(builds.fetch_add(1, Ordering::SeqCst))
                    })
                    .await
                    .unwrap()
            }));
        }
        for handle in handles {
            assert_eq!(handle.await.unwrap(), 0);
        }
        assert_eq!(builds.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_failed_build_caches_nothing() {
        let cache: ClientCache<usize> = ClientCache::new();
        let result = cache
            .get_or_try_insert_with("acme", || async { Err::<usize, _>("bad endpoint") })
            .await;
        assert_eq!(result, Err("bad endpoint"));
        assert!(cache.is_empty().await);
    }

    #[tokio::test]
    async fn test_replace_overrides_cached_client() {
        let cache: ClientCache<usize> = ClientCache::new();
        cache
            .get_or_try_insert_with("acme", || async { Ok::<_, Infallible>(1) })
            .await
            .unwrap();
        cache.replace("acme", 2).await;
        assert_eq!(cache.get("acme").await, Some(2));
        assert!(cache.remove("acme").await);
        assert_eq!(cache.get("acme").await, None);
    }
}
