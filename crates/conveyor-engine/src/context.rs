//! Per-run execution context passed to handlers.

use std::sync::{Arc, Mutex};

use uuid::Uuid;

use conveyor_store::JobStore;

/// Context a handler receives for one run: progress reporting, tagged
/// logging, and the store handle for direct reads.
///
/// Progress reporting is best-effort: store failures are logged and
/// swallowed, so a broken reporting path cannot fail an otherwise
/// correct job.
#[derive(Clone)]
pub struct JobContext {
    job_id: Option<Uuid>,
    job_name: String,
    persist: bool,
    store: Arc<dyn JobStore>,
    last_progress: Arc<Mutex<Option<(i32, Option<String>)>>>,
}

impl JobContext {
    /// Context for a persisted run.
    pub(crate) fn persisted(job_id: Uuid, job_name: String, store: Arc<dyn JobStore>) -> Self {
        Self {
            job_id: Some(job_id),
            job_name,
            persist: true,
            store,
            last_progress: Arc::new(Mutex::new(None)),
        }
    }

    /// Context for an unpersisted (`persist=false`) run.
    pub(crate) fn unpersisted(job_name: String, store: Arc<dyn JobStore>) -> Self {
        Self {
            job_id: None,
            job_name,
            persist: false,
            store,
            last_progress: Arc::new(Mutex::new(None)),
        }
    }

    /// The persisted record id, if any.
    pub fn job_id(&self) -> Option<Uuid> {
        self.job_id
    }

    /// The job name.
    pub fn job_name(&self) -> &str {
        &self.job_name
    }

    /// The store handle, for handlers needing direct reads.
    pub fn store(&self) -> Arc<dyn JobStore> {
        Arc::clone(&self.store)
    }

    /// Report progress. Percent is clamped to `[0, 100]`.
    ///
    /// No-op for unpersisted runs and for repeated identical updates.
    /// Store failures are logged at WARN and never propagated.
    pub async fn update_progress(&self, percent: i32, message: Option<&str>) {
        let percent = percent.clamp(0, 100);

        let Some(job_id) = self.job_id.filter(|_| self.persist) else {
            tracing::debug!(
                job_name = %self.job_name,
                percent,
                "Progress update on unpersisted run, skipping"
            );
            return;
        };

        let update = (percent, message.map(str::to_string));
        {
            let last = self.last_progress.lock().unwrap_or_else(|e| e.into_inner());
            if last.as_ref() == Some(&update) {
                return;
            }
        }

        match self.store.update_progress(job_id, percent, message).await {
            Ok(()) => {
                let mut last = self.last_progress.lock().unwrap_or_else(|e| e.into_inner());
                *last = Some(update);
            }
            Err(e) => {
                tracing::warn!(
                    job_id = %job_id,
                    job_name = %self.job_name,
                    percent,
                    "Failed to record progress: {e}"
                );
            }
        }
    }

    /// Emit an info-level event tagged with the job id and name.
    pub fn info(&self, message: &str) {
        tracing::info!(job_id = ?self.job_id, job_name = %self.job_name, "{message}");
    }

    /// Emit a warn-level event tagged with the job id and name.
    pub fn warn(&self, message: &str) {
        tracing::warn!(job_id = ?self.job_id, job_name = %self.job_name, "{message}");
    }

    /// Emit an error-level event tagged with the job id and name.
    pub fn error(&self, message: &str) {
        tracing::error!(job_id = ?self.job_id, job_name = %self.job_name, "{message}");
    }
}

impl std::fmt::Debug for JobContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JobContext")
            .field("job_id", &self.job_id)
            .field("job_name", &self.job_name)
            .field("persist", &self.persist)
            .finish_non_exhaustive()
    }
}
