//! Client Cache: one reusable client per (credential, endpoint) pair.
//!
//! Owned by [`Bridge`](crate::runner::Bridge) for the process lifetime; no eviction.
//! Sequential request handling means no lock is needed here.

use std::collections::HashMap;
use std::sync::Arc;

use tracing::debug;

use crate::llm::ClientFactory;

#[derive(Clone, Debug, PartialEq, Eq, Hash)]
struct CacheKey {
    credential: String,
    endpoint: Option<String>,
}

/// Empty or whitespace-only endpoints mean "provider default".
pub fn normalize_endpoint(endpoint: Option<&str>) -> Option<&str> {
    endpoint.filter(|e| !e.trim().is_empty())
}

pub struct ClientCache<F: ClientFactory> {
    factory: F,
    clients: HashMap<CacheKey, Arc<F::Client>>,
}

impl<F: ClientFactory> ClientCache<F> {
    pub fn new(factory: F) -> Self {
        Self {
            factory,
            clients: HashMap::new(),
        }
    }

    pub fn factory(&self) -> &F {
        &self.factory
    }

    /// Returns the cached client for the pair, creating it on first use.
    pub fn get_or_create(&mut self, credential: &str, endpoint: Option<&str>) -> Arc<F::Client> {
        let endpoint = normalize_endpoint(endpoint);
        let key = CacheKey {
            credential: credential.to_string(),
            endpoint: endpoint.map(str::to_string),
        };
        let factory = &self.factory;
        let entries = self.clients.len();
        self.clients
            .entry(key)
            .or_insert_with(|| {
                debug!(
                    endpoint = endpoint.unwrap_or("<default>"),
                    cached = entries,
                    "creating client"
                );
                Arc::new(factory.create(credential, endpoint))
            })
            .clone()
    }

    pub fn len(&self) -> usize {
        self.clients.len()
    }

    pub fn is_empty(&self) -> bool {
        self.clients.is_empty()
    }
}
