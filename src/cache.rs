//! Document content cache with TTL and request coalescing.
//!
//! Each key holds one of three explicit states: absent, a pending fetch
//! shared by every concurrent caller, or a resolved value with a
//! timestamp. The pending slot is registered synchronously before the
//! first await point, so a caller arriving mid-fetch always joins the
//! in-flight request instead of issuing a duplicate.

use futures_util::future::{BoxFuture, Shared};
use futures_util::FutureExt;
use log::{debug, warn};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use crate::documents::DocumentApi;
use crate::error::{PaperLinkError, Result};

/// Default validity window for cached content.
pub const DEFAULT_CONTENT_TTL: Duration = Duration::from_secs(5 * 60);

/// A fetch shared by every caller coalesced onto the same key. The error
/// side carries the rendered message because the shared result must be
/// cloneable.
type SharedFetch = Shared<BoxFuture<'static, std::result::Result<String, String>>>;

enum CacheSlot {
    /// Fetch in flight; at most one per key at any instant.
    Pending(SharedFetch),
    /// Resolved content; treated as absent once older than the TTL.
    Ready { content: String, fetched_at: Instant },
}

/// On-demand document content cache.
///
/// Reads go through [`get_content`](ContentCache::get_content); writes go
/// through [`update`](ContentCache::update), which writes to the backend
/// and invalidates locally — the next read fetches fresh truth rather than
/// trusting an optimistic local copy.
pub struct ContentCache {
    api: DocumentApi,
    entries: Arc<Mutex<HashMap<String, CacheSlot>>>,
    ttl: Duration,
}

impl ContentCache {
    pub(crate) fn new(api: DocumentApi, ttl: Duration) -> Self {
        Self {
            api,
            entries: Arc::new(Mutex::new(HashMap::new())),
            ttl,
        }
    }

    /// Get a document's content, fetching it at most once per TTL window.
    ///
    /// Concurrent calls for the same key share a single underlying fetch
    /// and all resolve to the identical value. A failed fetch leaves no
    /// entry behind: the error reaches every coalesced caller, and the
    /// next call retries.
    pub async fn get_content(&self, document_id: &str) -> Result<String> {
        let fetch = {
            let mut entries = self.entries.lock().unwrap();
            match entries.get(document_id) {
                Some(CacheSlot::Ready { content, fetched_at }) if fetched_at.elapsed() < self.ttl => {
                    debug!("[paper-link] Cache hit for {}", document_id);
                    return Ok(content.clone());
                },
                Some(CacheSlot::Pending(shared)) => {
                    debug!("[paper-link] Joining in-flight fetch for {}", document_id);
                    shared.clone()
                },
                // Absent or expired: reserve the slot before the first
                // await so later callers coalesce onto this fetch.
                _ => {
                    debug!("[paper-link] Cache miss for {}", document_id);
                    let api = self.api.clone();
                    let entries_handle = Arc::clone(&self.entries);
                    let key = document_id.to_string();
                    let shared: SharedFetch = async move {
                        let result = api.fetch_content(&key).await.map_err(|e| e.to_string());
                        let mut entries = entries_handle.lock().unwrap();
                        match &result {
                            Ok(content) => {
                                entries.insert(
                                    key,
                                    CacheSlot::Ready {
                                        content: content.clone(),
                                        fetched_at: Instant::now(),
                                    },
                                );
                            },
                            Err(_) => {
                                // Never cache a failure; the next read retries.
                                entries.remove(&key);
                            },
                        }
                        result
                    }
                    .boxed()
                    .shared();
                    entries.insert(document_id.to_string(), CacheSlot::Pending(shared.clone()));
                    shared
                },
            }
        };

        fetch.await.map_err(PaperLinkError::CacheFetchError)
    }

    /// Drop whatever the cache holds for a key. The next
    /// [`get_content`](ContentCache::get_content) is a guaranteed fetch.
    pub fn invalidate(&self, document_id: &str) {
        let mut entries = self.entries.lock().unwrap();
        if entries.remove(document_id).is_some() {
            debug!("[paper-link] Invalidated {}", document_id);
        }
    }

    /// Write content through to the backend, then invalidate locally.
    pub async fn update(&self, document_id: &str, content: &str) -> Result<()> {
        self.api.update_content(document_id, content).await?;
        self.invalidate(document_id);
        Ok(())
    }

    /// Best-effort concurrent warm of several keys. Per-key failures are
    /// logged and swallowed so one bad key does not abort the others.
    pub async fn preload(&self, document_ids: &[String]) {
        let warms = document_ids.iter().map(|id| async move {
            if let Err(e) = self.get_content(id).await {
                warn!("[paper-link] Preload of {} failed: {}", id, e);
            }
        });
        futures_util::future::join_all(warms).await;
    }

    /// Whether a usable entry exists for a key: resolved and fresh, or an
    /// in-flight fetch a read would join.
    pub fn contains(&self, document_id: &str) -> bool {
        let entries = self.entries.lock().unwrap();
        match entries.get(document_id) {
            Some(CacheSlot::Ready { fetched_at, .. }) => fetched_at.elapsed() < self.ttl,
            Some(CacheSlot::Pending(_)) => true,
            None => false,
        }
    }

    /// Number of slots currently held, including in-flight fetches and
    /// not-yet-pruned expired entries.
    pub fn len(&self) -> usize {
        self.entries.lock().unwrap().len()
    }

    /// Whether the cache holds no slots at all.
    pub fn is_empty(&self) -> bool {
        self.entries.lock().unwrap().is_empty()
    }
}
