// src/session.rs
//! The per-session context every view is built on.
//!
//! A `Session` owns the filter store and the notification queue and holds a
//! handle to the backend. Each user action is one method here: it calls the
//! backend once, folds the result into local state and reports the outcome as
//! exactly one notification. Failures are returned to the caller after being
//! reported; none of them is retried.

use std::path::PathBuf;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tracing::{debug, info};

use crate::core::config_manager::ConfigManager;
use crate::core::notifications::{NotificationCenter, NotificationKind};
use crate::core::service_client::{CandidateApi, ClientError, ServiceClient};
use crate::filter::{CriteriaPatch, FilterCriteria, FilterStore, StatusCounts};
use crate::types::{
    Candidate, CandidateStatus, CandidateUpdate, FailedFile, FilterRequest, FilterResponse,
    FilterSuggestions, NewCandidate, OptimizeResponse, Page, Resume, ResumeContent,
    SmartMatchResponse, UploadResponse,
};
use crate::types::response::MAX_PAGE_LIMIT;
use crate::upload_validator::{ResumeFile, UploadValidationError, UploadValidator};
use crate::utils::{count_noun, format_file_size};

pub struct Session {
    api: Arc<dyn CandidateApi>,
    store: Mutex<FilterStore>,
    /// Page used by the last list fetch; re-fetches after edits reuse it
    page: Mutex<Page>,
    notifications: NotificationCenter,
    validator: UploadValidator,
}

impl Session {
    pub fn new(api: Arc<dyn CandidateApi>, notifications: NotificationCenter) -> Self {
        Self {
            api,
            store: Mutex::new(FilterStore::new()),
            page: Mutex::new(Page::default()),
            notifications,
            validator: UploadValidator::default(),
        }
    }

    pub fn with_validator(mut self, validator: UploadValidator) -> Self {
        self.validator = validator;
        self
    }

    /// Build a session talking HTTP to the configured backend
    pub fn from_config(config: &ConfigManager) -> anyhow::Result<Self> {
        let client = ServiceClient::from_config(&config.service)?;
        info!("Session connected to {}", client.base_url());

        let notifications = NotificationCenter::with_lifetime(config.service.notification_lifetime());
        Ok(Self::new(Arc::new(client), notifications)
            .with_validator(UploadValidator::new(config.service.max_upload_bytes)))
    }

    /// Tear the session down: pending notifications and their timers are dropped
    pub fn shutdown(&self) {
        self.notifications.clear();
        debug!("Session shut down");
    }

    pub fn notifications(&self) -> &NotificationCenter {
        &self.notifications
    }

    fn store(&self) -> MutexGuard<'_, FilterStore> {
        self.store.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn page(&self) -> Page {
        *self.page.lock().unwrap_or_else(PoisonError::into_inner)
    }

    // ===== Filter state =====

    pub fn visible(&self) -> Vec<Candidate> {
        self.store().visible().to_vec()
    }

    pub fn collection(&self) -> Vec<Candidate> {
        self.store().collection().to_vec()
    }

    pub fn criteria(&self) -> FilterCriteria {
        self.store().criteria().clone()
    }

    pub fn status_counts(&self) -> StatusCounts {
        self.store().status_counts()
    }

    pub fn find(&self, id: i64) -> Option<Candidate> {
        self.store().find(id).cloned()
    }

    /// Merge `patch` into the criteria; returns how many candidates stay visible
    pub fn set_criteria(&self, patch: CriteriaPatch) -> usize {
        let mut store = self.store();
        store.set_criteria(patch);
        store.visible().len()
    }

    pub fn clear_criteria(&self) {
        self.store().clear_criteria();
    }

    // ===== Candidate list =====

    /// Re-fetch the collection with the current page. Whichever fetch resolves last wins.
    pub async fn refresh(&self) -> Result<usize, ClientError> {
        self.refresh_page(self.page()).await
    }

    /// Fetch one page of the collection and remember it for later re-fetches
    pub async fn refresh_page(&self, page: Page) -> Result<usize, ClientError> {
        let page = self.checked_page(page, "Failed to load candidates")?;
        *self.page.lock().unwrap_or_else(PoisonError::into_inner) = page;

        let candidates = self.report(
            self.api.fetch_all(page).await,
            "Failed to load candidates",
        )?;
        let count = candidates.len();

        self.store().replace_collection(candidates);
        self.notifications
            .success(format!("Loaded {}", count_noun(count, "candidate")));
        Ok(count)
    }

    pub async fn candidate(&self, id: i64) -> Result<Candidate, ClientError> {
        self.report(self.api.get(id).await, "Failed to load candidate")
    }

    pub async fn create_candidate(&self, candidate: &NewCandidate) -> Result<Candidate, ClientError> {
        if candidate.name.trim().is_empty() {
            return self.report(
                Err(ClientError::Validation("Candidate name is required".to_string())),
                "Cannot create candidate",
            );
        }

        let created = self.report(
            self.api.create(candidate).await,
            "Failed to create candidate",
        )?;
        self.notifications
            .success(format!("Created candidate {}", created.name));
        self.refetch_after_edit().await;
        Ok(created)
    }

    pub async fn update_candidate(
        &self,
        id: i64,
        patch: &CandidateUpdate,
    ) -> Result<Candidate, ClientError> {
        if patch.is_empty() {
            return self.report(
                Err(ClientError::Validation("Nothing to update".to_string())),
                "Cannot update candidate",
            );
        }

        let updated = self.report(self.api.update(id, patch).await, "Update failed")?;
        self.notifications
            .success(format!("Updated candidate {}", updated.name));
        self.refetch_after_edit().await;
        Ok(updated)
    }

    pub async fn change_status(
        &self,
        id: i64,
        status: CandidateStatus,
        notes: Option<&str>,
    ) -> Result<Candidate, ClientError> {
        let updated = self.report(
            self.api.update_status(id, status, notes).await,
            "Status update failed",
        )?;
        self.notifications.success(format!(
            "Status of {} set to {}",
            updated.name,
            status.label()
        ));
        self.refetch_after_edit().await;
        Ok(updated)
    }

    pub async fn delete_candidate(&self, id: i64) -> Result<(), ClientError> {
        self.report(self.api.remove(id).await, "Delete failed")?;
        self.notifications.success(format!("Deleted candidate {}", id));
        self.refetch_after_edit().await;
        Ok(())
    }

    pub async fn candidate_resumes(&self, id: i64) -> Result<Vec<Resume>, ClientError> {
        self.report(
            self.api.candidate_resumes(id).await,
            "Failed to load resumes",
        )
    }

    pub async fn resume_content(&self, resume_id: i64) -> Result<ResumeContent, ClientError> {
        self.report(
            self.api.resume_content(resume_id).await,
            "Failed to load resume content",
        )
    }

    pub async fn download_resume(&self, resume_id: i64) -> Result<Vec<u8>, ClientError> {
        let bytes = self.report(
            self.api.download_resume(resume_id).await,
            "Resume download failed",
        )?;
        self.notifications.success(format!(
            "Downloaded resume {} ({})",
            resume_id,
            format_file_size(bytes.len() as u64)
        ));
        Ok(bytes)
    }

    /// A failed re-fetch has already been reported by `refresh`
    async fn refetch_after_edit(&self) {
        if let Err(e) = self.refresh().await {
            debug!("Re-fetch after edit failed: {}", e);
        }
    }

    // ===== Backend filtering and matching =====

    /// Run the current criteria through the backend's filter endpoint.
    /// The backend cannot filter by location; a set location is reported and ignored.
    pub async fn server_filter(&self, page: Page) -> Result<FilterResponse, ClientError> {
        let page = self.checked_page(page, "Filtering failed")?;
        let criteria = self.criteria();
        if let Some(location) = &criteria.location {
            self.notifications.warning(format!(
                "Server-side filtering ignores the location filter '{}'",
                location
            ));
        }

        let request = FilterRequest::from(&criteria);
        let response = self.report(
            self.api.filter(&request, page).await,
            "Filtering failed",
        )?;
        self.notifications.info(format!(
            "Server filter matched {}",
            count_noun(response.total_count, "candidate")
        ));
        Ok(response)
    }

    pub async fn smart_match(
        &self,
        job_requirements: &str,
        candidate_ids: &[i64],
    ) -> Result<SmartMatchResponse, ClientError> {
        let job_requirements = job_requirements.trim();
        if job_requirements.is_empty() {
            return self.report(
                Err(ClientError::Validation(
                    "Job requirements must not be empty".to_string(),
                )),
                "Cannot run smart match",
            );
        }

        let response = self.report(
            self.api.smart_match(job_requirements, candidate_ids).await,
            "Smart match failed",
        )?;
        self.notifications.success(format!(
            "Analysed {}, {} ranked",
            count_noun(response.total_candidates, "candidate"),
            response.matches.len()
        ));
        Ok(response)
    }

    /// Ask the backend to turn a free-text query into criteria and apply them
    pub async fn optimize_filter(&self, query: &str) -> Result<OptimizeResponse, ClientError> {
        let query = query.trim();
        if query.is_empty() {
            return self.report(
                Err(ClientError::Validation("Query must not be empty".to_string())),
                "Cannot optimize filter",
            );
        }

        let response = self.report(
            self.api.optimize_filter(query).await,
            "Filter optimization failed",
        )?;
        let visible = self.set_criteria(CriteriaPatch::from(&response.optimized_criteria));
        self.notifications.success(format!(
            "Applied suggested filters, {} visible",
            count_noun(visible, "candidate")
        ));
        Ok(response)
    }

    pub async fn suggestions(&self) -> Result<FilterSuggestions, ClientError> {
        self.report(
            self.api.suggestions().await,
            "Failed to load filter suggestions",
        )
    }

    // ===== Resume upload =====

    /// Validate and upload resumes from disk
    pub async fn upload_paths(&self, paths: &[PathBuf]) -> Result<UploadResponse, ClientError> {
        let mut valid = Vec::new();
        let mut rejected = Vec::new();

        for path in paths {
            match self.validator.load(path).await {
                Ok(file) => valid.push(file),
                Err(e) => rejected.push(rejection(e, &path.display().to_string())),
            }
        }

        self.submit_upload(valid, rejected).await
    }

    /// Validate and upload in-memory resumes given as `(file name, content)`
    pub async fn upload_files(
        &self,
        files: Vec<(String, Vec<u8>)>,
    ) -> Result<UploadResponse, ClientError> {
        let mut valid = Vec::new();
        let mut rejected = Vec::new();

        for (name, bytes) in files {
            match self.validator.validate_bytes(&name, bytes) {
                Ok(file) => valid.push(file),
                Err(e) => rejected.push(rejection(e, &name)),
            }
        }

        self.submit_upload(valid, rejected).await
    }

    /// Files rejected locally join the backend's `failed_files`; the whole
    /// batch produces one summary notification
    async fn submit_upload(
        &self,
        valid: Vec<ResumeFile>,
        rejected: Vec<FailedFile>,
    ) -> Result<UploadResponse, ClientError> {
        if valid.is_empty() {
            if rejected.is_empty() {
                return self.report(
                    Err(ClientError::Validation("No files selected".to_string())),
                    "Cannot upload",
                );
            }

            self.notifications.warning(format!(
                "Nothing uploaded: {} failed validation",
                count_noun(rejected.len(), "file")
            ));
            return Ok(UploadResponse {
                message: "No valid resume files to upload".to_string(),
                uploaded_files: Vec::new(),
                total_processed: rejected.len(),
                failed_files: rejected,
            });
        }

        let mut response = self.report(self.api.upload_resumes(valid).await, "Upload failed")?;
        response.total_processed += rejected.len();
        response.failed_files.extend(rejected);

        if response.failed_files.is_empty() {
            self.notifications.success(format!(
                "Uploaded {}; parsing continues in the background",
                count_noun(response.uploaded_files.len(), "resume")
            ));
        } else {
            self.notifications.warning(format!(
                "Upload finished: {} succeeded, {} failed",
                response.uploaded_files.len(),
                response.failed_files.len()
            ));
        }
        Ok(response)
    }

    fn checked_page(&self, page: Page, context: &str) -> Result<Page, ClientError> {
        if page.is_valid() {
            return Ok(page);
        }
        self.report(
            Err(ClientError::Validation(format!(
                "Page limit must be between 1 and {}, got {}",
                MAX_PAGE_LIMIT, page.limit
            ))),
            context,
        )
    }

    /// Turn a failure into its single notification and hand it back
    fn report<T>(&self, result: Result<T, ClientError>, context: &str) -> Result<T, ClientError> {
        result.map_err(|e| {
            let kind = if e.is_validation() {
                NotificationKind::Warning
            } else {
                NotificationKind::Error
            };
            self.notifications.notify(kind, format!("{}: {}", context, e));
            e
        })
    }
}

fn rejection(err: UploadValidationError, fallback_name: &str) -> FailedFile {
    let filename = if err.file_name.is_empty() {
        fallback_name.to_string()
    } else {
        err.file_name
    };
    FailedFile {
        filename,
        error: err.message,
    }
}
