//! Request Deduplication Module
//!
//! Single-flight map: concurrent requests for one key share a single call.

use std::collections::HashMap;
use std::future::Future;

use futures::future::{BoxFuture, FutureExt, Shared};
use parking_lot::Mutex;
use tracing::debug;

use crate::error::Result;

type Flight<V> = Shared<BoxFuture<'static, Result<V>>>;

// == Request Deduplicator ==
/// Tracks in-flight requests by key.
///
/// The first caller for a key starts the request; callers arriving before it
/// finishes await the same future and receive a clone of its result. Nothing
/// is kept once the flight has completed.
pub struct RequestDeduplicator<V> {
    inflight: Mutex<HashMap<String, Flight<V>>>,
}

impl<V> Default for RequestDeduplicator<V> {
    fn default() -> Self {
        Self {
            inflight: Mutex::new(HashMap::new()),
        }
    }
}

impl<V: Clone + Send + Sync + 'static> RequestDeduplicator<V> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Joins the flight for `key`, starting it with `make` if none is running.
    ///
    /// When every caller of a flight has been dropped before it finishes, the
    /// flight is unregistered and its future dropped.
    pub async fn run<F, Fut>(&self, key: &str, make: F) -> Result<V>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<V>> + Send + 'static,
    {
        let flight = {
            let mut inflight = self.inflight.lock();
            let running = inflight
                .get(key)
                .filter(|flight| flight.peek().is_none())
                .cloned();
            match running {
                Some(existing) => {
                    debug!(key, "joining in-flight request");
                    existing
                }
                None => {
                    let flight = make().boxed().shared();
                    inflight.insert(key.to_string(), flight.clone());
                    flight
                }
            }
        };

        let mut release = Release {
            inflight: &self.inflight,
            key,
            flight,
        };
        let result = (&mut release.flight).await;
        result
    }

    /// Number of registered flights.
    pub fn in_flight(&self) -> usize {
        self.inflight.lock().len()
    }
}

/// Unregisters a flight once it has finished or nobody is waiting on it.
struct Release<'a, V: Clone> {
    inflight: &'a Mutex<HashMap<String, Flight<V>>>,
    key: &'a str,
    flight: Flight<V>,
}

impl<V: Clone> Drop for Release<'_, V> {
    fn drop(&mut self) {
        let mut inflight = self.inflight.lock();
        // The map's handle plus ours means we are the last waiter
        let done = inflight.get(self.key).is_some_and(|flight| {
            flight.peek().is_some()
                || (flight.ptr_eq(&self.flight) && flight.strong_count() == Some(2))
        });
        if done {
            inflight.remove(self.key);
        }
    }
}
