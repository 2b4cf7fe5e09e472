//! Upload queue: a per-item state machine driven by HTTP responses and
//! realtime job events.
//!
//! Items are inserted synchronously at enqueue time so a consumer can
//! render the queued file before any network activity. A single driver
//! task then starts the uploads sequentially, in drop order, with a short
//! stagger between starts. Server-side processing transitions arrive as
//! `job_progress` / `job_completed` / `job_failed` events, matched against
//! items by the job id recorded from the upload response.

use log::{debug, warn};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use uuid::Uuid;

use crate::connection::now_ms;
use crate::documents::DocumentApi;
use crate::models::{
    EventKind, JobCompletedEvent, JobFailedEvent, JobProgressEvent, UploadItem, UploadRequest,
    UploadStatus,
};
use crate::registry::{EventRegistry, Subscription};

/// Default pause between successive upload starts. Long enough that each
/// item's pending phase is observable, short enough to be invisible in
/// aggregate.
pub const DEFAULT_UPLOAD_STAGGER: Duration = Duration::from_millis(250);

/// Upload queue controller.
///
/// One instance per client; registers its job-event subscriptions at
/// construction and keeps them for its lifetime.
pub struct UploadQueue {
    inner: Arc<QueueInner>,
    /// Registry subscriptions held for the queue's lifetime.
    _event_subs: Vec<Subscription>,
}

struct QueueInner {
    api: DocumentApi,
    stagger: Duration,
    /// Items in drop order. Every mutation goes through this single list;
    /// event callbacks query it directly rather than a mirrored copy.
    items: Mutex<Vec<UploadItem>>,
    /// File payloads not yet handed to HTTP, keyed by item id.
    pending_payloads: Mutex<HashMap<String, UploadRequest>>,
}

impl UploadQueue {
    pub(crate) fn new(api: DocumentApi, registry: &EventRegistry, stagger: Duration) -> Self {
        let inner = Arc::new(QueueInner {
            api,
            stagger,
            items: Mutex::new(Vec::new()),
            pending_payloads: Mutex::new(HashMap::new()),
        });

        let progress_inner = Arc::clone(&inner);
        let completed_inner = Arc::clone(&inner);
        let failed_inner = Arc::clone(&inner);

        let event_subs = vec![
            registry.on(EventKind::JobProgress, move |payload| {
                match JobProgressEvent::from_payload(payload) {
                    Some(event) => progress_inner.apply_progress(&event),
                    None => warn!("[paper-link] Malformed job_progress payload: {}", payload),
                }
            }),
            registry.on(EventKind::JobCompleted, move |payload| {
                match JobCompletedEvent::from_payload(payload) {
                    Some(event) => completed_inner.apply_completed(&event),
                    None => warn!("[paper-link] Malformed job_completed payload: {}", payload),
                }
            }),
            registry.on(EventKind::JobFailed, move |payload| {
                match JobFailedEvent::from_payload(payload) {
                    Some(event) => failed_inner.apply_failed(&event),
                    None => warn!("[paper-link] Malformed job_failed payload: {}", payload),
                }
            }),
        ];

        Self {
            inner,
            _event_subs: event_subs,
        }
    }

    /// Enqueue files for upload.
    ///
    /// Ids are allocated and `Pending` items inserted synchronously, before
    /// any network call. The uploads then start sequentially in the given
    /// order, each preceded by the configured stagger delay. Never fails;
    /// per-item errors are recorded on the items themselves.
    pub fn enqueue(&self, files: Vec<UploadRequest>) -> Vec<String> {
        let mut ids = Vec::with_capacity(files.len());
        {
            let mut items = self.inner.items.lock().unwrap();
            let mut payloads = self.inner.pending_payloads.lock().unwrap();
            for file in files {
                let id = Uuid::new_v4().to_string();
                items.push(UploadItem {
                    id: id.clone(),
                    file_name: file.file_name.clone(),
                    file_size: file.file_size(),
                    file_type: file.file_type.clone(),
                    status: UploadStatus::Pending,
                    progress: 0.0,
                    job_id: None,
                    document_id: None,
                    error: None,
                    started_at_ms: now_ms(),
                });
                payloads.insert(id.clone(), file);
                ids.push(id);
            }
        }

        if !ids.is_empty() {
            let inner = Arc::clone(&self.inner);
            let batch = ids.clone();
            tokio::spawn(async move {
                for id in batch {
                    if !inner.stagger.is_zero() {
                        tokio::time::sleep(inner.stagger).await;
                    }
                    inner.run_upload(&id).await;
                }
            });
        }

        ids
    }

    /// Snapshot of all items in drop order.
    pub fn items(&self) -> Vec<UploadItem> {
        self.inner.items.lock().unwrap().clone()
    }

    /// Look up one item by id.
    pub fn get(&self, id: &str) -> Option<UploadItem> {
        self.inner
            .items
            .lock()
            .unwrap()
            .iter()
            .find(|item| item.id == id)
            .cloned()
    }

    /// Number of items currently in the queue.
    pub fn len(&self) -> usize {
        self.inner.items.lock().unwrap().len()
    }

    /// Whether the queue holds no items.
    pub fn is_empty(&self) -> bool {
        self.inner.items.lock().unwrap().is_empty()
    }

    /// Remove one item by id. Returns whether an item was removed.
    ///
    /// A pending item that has not started uploading will no longer start.
    pub fn remove(&self, id: &str) -> bool {
        self.inner.pending_payloads.lock().unwrap().remove(id);
        let mut items = self.inner.items.lock().unwrap();
        let before = items.len();
        items.retain(|item| item.id != id);
        items.len() != before
    }

    /// Remove exactly the items in `Completed` state, preserving the
    /// relative order of everything else. Returns how many were removed.
    pub fn clear_completed(&self) -> usize {
        let mut items = self.inner.items.lock().unwrap();
        let before = items.len();
        items.retain(|item| item.status != UploadStatus::Completed);
        before - items.len()
    }
}

impl QueueInner {
    /// Drive one item through its HTTP upload.
    async fn run_upload(&self, id: &str) {
        // Pending → Uploading. Fails when the item was removed meanwhile.
        if !self.transition(id, |item| {
            if item.status == UploadStatus::Pending {
                item.status = UploadStatus::Uploading;
                item.progress = 0.0;
                true
            } else {
                false
            }
        }) {
            debug!("[paper-link] Upload {} skipped (removed or already started)", id);
            self.pending_payloads.lock().unwrap().remove(id);
            return;
        }

        let payload = self.pending_payloads.lock().unwrap().remove(id);
        let Some(payload) = payload else {
            self.fail(id, "Upload payload missing".to_string());
            return;
        };

        match self.api.upload_document(&payload).await {
            Ok(response) => {
                // Uploading → Processing once the server-side job exists.
                self.transition(id, |item| {
                    if item.status == UploadStatus::Uploading {
                        item.status = UploadStatus::Processing;
                        item.job_id = Some(response.job_id.clone());
                        item.document_id = Some(response.document_id.clone());
                        true
                    } else {
                        false
                    }
                });
            },
            Err(e) => {
                warn!("[paper-link] Upload {} failed: {}", id, e);
                self.fail(id, e.to_string());
            },
        }
    }

    /// Apply a mutation to the item with the given id. Returns the
    /// closure's verdict, or `false` when no such item exists.
    fn transition(&self, id: &str, apply: impl FnOnce(&mut UploadItem) -> bool) -> bool {
        let mut items = self.items.lock().unwrap();
        match items.iter_mut().find(|item| item.id == id) {
            Some(item) => apply(item),
            None => false,
        }
    }

    /// Move a non-terminal item to `Error`.
    fn fail(&self, id: &str, message: String) {
        self.transition(id, |item| {
            if item.status.is_terminal() {
                false
            } else {
                item.status = UploadStatus::Error;
                item.error = Some(message);
                true
            }
        });
    }

    fn apply_progress(&self, event: &JobProgressEvent) {
        let mut items = self.items.lock().unwrap();
        let Some(item) = items
            .iter_mut()
            .find(|item| item.job_id.as_deref() == Some(event.job_id.as_str()))
        else {
            debug!("[paper-link] job_progress for unknown job {}", event.job_id);
            return;
        };
        // Updates against a terminal item are silent no-ops.
        if item.status.is_terminal() {
            return;
        }
        item.progress = event.progress.clamp(0.0, 100.0);
    }

    fn apply_completed(&self, event: &JobCompletedEvent) {
        let mut items = self.items.lock().unwrap();
        let Some(item) = items
            .iter_mut()
            .find(|item| item.job_id.as_deref() == Some(event.job_id.as_str()))
        else {
            debug!("[paper-link] job_completed for unknown job {}", event.job_id);
            return;
        };
        if item.status.is_terminal() {
            return;
        }
        item.status = UploadStatus::Completed;
        // Completion wins over whatever the last reported progress was.
        item.progress = 100.0;
        if item.document_id.is_none() {
            item.document_id = event.document_id.clone();
        }
    }

    fn apply_failed(&self, event: &JobFailedEvent) {
        let mut items = self.items.lock().unwrap();
        let Some(item) = items
            .iter_mut()
            .find(|item| item.job_id.as_deref() == Some(event.job_id.as_str()))
        else {
            debug!("[paper-link] job_failed for unknown job {}", event.job_id);
            return;
        };
        if item.status.is_terminal() {
            return;
        }
        item.status = UploadStatus::Error;
        item.error = Some(event.error_message.clone());
    }
}
