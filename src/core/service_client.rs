// src/core/service_client.rs
//! HTTP client for the recruitment backend - JSON everywhere except resume upload

use anyhow::Context;
use async_trait::async_trait;
use reqwest::multipart::{Form, Part};
use reqwest::{Client, RequestBuilder, Response};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, error, info, trace};

use crate::core::config_manager::ServiceConfig;
use crate::types::{
    response::{OptimizeRequest, SmartMatchRequest},
    Candidate, CandidateStatus, CandidateUpdate, FilterRequest, FilterResponse,
    FilterSuggestions, NewCandidate, OptimizeResponse, Page, Resume, ResumeContent,
    SmartMatchResponse, StatusUpdate, UploadResponse,
};
use crate::upload_validator::ResumeFile;
use crate::utils::truncate_for_log;

const CANDIDATES_ENDPOINT: &str = "/candidates/";
const FILTER_ENDPOINT: &str = "/candidates/filter";
const UPLOAD_ENDPOINT: &str = "/resumes/upload";
const CANDIDATE_RESUMES_ENDPOINT: &str = "/resumes/candidate";
const RESUMES_ENDPOINT: &str = "/resumes/";
const SMART_MATCH_ENDPOINT: &str = "/filters/smart-match";
const OPTIMIZE_ENDPOINT: &str = "/filters/optimize";
const SUGGESTIONS_ENDPOINT: &str = "/filters/suggestions";

const UPLOAD_FIELD: &str = "files";

#[derive(Debug, Error)]
pub enum ClientError {
    #[error("{0}")]
    Validation(String),

    #[error("Request failed{}: {message}", .status.map(|s| format!(" with status {}", s)).unwrap_or_default())]
    Remote { status: Option<u16>, message: String },

    #[error("Request timed out after {}s", .0.as_secs())]
    Timeout(Duration),

    #[error("Unexpected response body: {0}")]
    Decode(String),
}

impl ClientError {
    /// HTTP status of a remote failure, if the server answered at all
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Remote { status, .. } => *status,
            _ => None,
        }
    }

    pub fn is_validation(&self) -> bool {
        matches!(self, Self::Validation(_))
    }

    pub fn is_timeout(&self) -> bool {
        matches!(self, Self::Timeout(_))
    }

    fn from_transport(err: reqwest::Error, timeout: Duration) -> Self {
        if err.is_timeout() {
            Self::Timeout(timeout)
        } else if err.is_decode() {
            Self::Decode(err.to_string())
        } else {
            Self::Remote {
                status: err.status().map(|s| s.as_u16()),
                message: err.to_string(),
            }
        }
    }
}

/// Operations the session needs from the backend.
///
/// [`ServiceClient`] is the HTTP implementation; tests substitute in-memory fakes.
#[async_trait]
pub trait CandidateApi: Send + Sync {
    async fn fetch_all(&self, page: Page) -> Result<Vec<Candidate>, ClientError>;

    async fn get(&self, id: i64) -> Result<Candidate, ClientError>;

    async fn create(&self, candidate: &NewCandidate) -> Result<Candidate, ClientError>;

    async fn update(&self, id: i64, patch: &CandidateUpdate) -> Result<Candidate, ClientError>;

    async fn update_status(
        &self,
        id: i64,
        status: CandidateStatus,
        notes: Option<&str>,
    ) -> Result<Candidate, ClientError>;

    async fn remove(&self, id: i64) -> Result<(), ClientError>;

    async fn filter(
        &self,
        request: &FilterRequest,
        page: Page,
    ) -> Result<FilterResponse, ClientError>;

    async fn upload_resumes(&self, files: Vec<ResumeFile>) -> Result<UploadResponse, ClientError>;

    async fn candidate_resumes(&self, id: i64) -> Result<Vec<Resume>, ClientError>;

    /// Extracted text and structured data of one resume
    async fn resume_content(&self, resume_id: i64) -> Result<ResumeContent, ClientError>;

    /// Raw bytes of the stored resume file (PDF only on the backend side)
    async fn download_resume(&self, resume_id: i64) -> Result<Vec<u8>, ClientError>;

    async fn smart_match(
        &self,
        job_requirements: &str,
        candidate_ids: &[i64],
    ) -> Result<SmartMatchResponse, ClientError>;

    async fn optimize_filter(&self, query: &str) -> Result<OptimizeResponse, ClientError>;

    async fn suggestions(&self) -> Result<FilterSuggestions, ClientError>;
}

pub struct ServiceClient {
    client: Client,
    base_url: String,
    timeout: Duration,
}

impl ServiceClient {
    /// Create new service client; every request is bounded by `timeout`
    pub fn new(base_url: &str, timeout: Duration) -> anyhow::Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .context("Failed to create HTTP client")?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            timeout,
        })
    }

    pub fn from_config(config: &ServiceConfig) -> anyhow::Result<Self> {
        Self::new(&config.api_url, config.timeout())
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, endpoint: &str) -> String {
        format!("{}{}", self.base_url, endpoint)
    }

    fn candidate_url(&self, id: i64) -> String {
        format!("{}{}{}", self.base_url, CANDIDATES_ENDPOINT, id)
    }

    fn resume_url(&self, resume_id: i64, action: &str) -> String {
        format!("{}{}{}/{}", self.base_url, RESUMES_ENDPOINT, resume_id, action)
    }

    /// Send and reject non-2xx answers, surfacing the backend's `detail` text
    async fn execute(&self, request: RequestBuilder, what: &str) -> Result<Response, ClientError> {
        let response = request.send().await.map_err(|e| {
            error!("{} failed: {}", what, e);
            ClientError::from_transport(e, self.timeout)
        })?;

        let status = response.status();
        trace!("{} response status: {}", what, status);

        if status.is_success() {
            return Ok(response);
        }

        let error_text = response
            .text()
            .await
            .unwrap_or_else(|_| "Unknown error".to_string());
        error!("{} error response {}: {}", what, status, error_text);

        Err(ClientError::Remote {
            status: Some(status.as_u16()),
            message: error_detail(&error_text),
        })
    }

    async fn send_json<R>(&self, request: RequestBuilder, what: &str) -> Result<R, ClientError>
    where
        R: DeserializeOwned,
    {
        let response = self.execute(request, what).await?;
        let response_text = response
            .text()
            .await
            .map_err(|e| ClientError::from_transport(e, self.timeout))?;

        serde_json::from_str(&response_text).map_err(|e| {
            error!(
                "Failed to parse {} response: {}. Raw response: {}",
                what,
                e,
                truncate_for_log(&response_text)
            );
            ClientError::Decode(e.to_string())
        })
    }

    async fn post_json<T, R>(&self, endpoint: &str, payload: &T, what: &str) -> Result<R, ClientError>
    where
        T: Serialize + ?Sized,
        R: DeserializeOwned,
    {
        let url = self.url(endpoint);
        trace!("POST {}", url);
        self.send_json(self.client.post(&url).json(payload), what).await
    }

    async fn get_json<R>(&self, url: &str, what: &str) -> Result<R, ClientError>
    where
        R: DeserializeOwned,
    {
        trace!("GET {}", url);
        self.send_json(self.client.get(url), what).await
    }
}

#[async_trait]
impl CandidateApi for ServiceClient {
    async fn fetch_all(&self, page: Page) -> Result<Vec<Candidate>, ClientError> {
        let url = self.url(CANDIDATES_ENDPOINT);
        trace!("GET {} skip={} limit={}", url, page.skip, page.limit);
        let candidates: Vec<Candidate> = self
            .send_json(self.client.get(&url).query(&page), "Candidate list")
            .await?;
        info!("Fetched {} candidates", candidates.len());
        Ok(candidates)
    }

    async fn get(&self, id: i64) -> Result<Candidate, ClientError> {
        self.get_json(&self.candidate_url(id), "Candidate lookup").await
    }

    async fn create(&self, candidate: &NewCandidate) -> Result<Candidate, ClientError> {
        self.post_json(CANDIDATES_ENDPOINT, candidate, "Candidate creation")
            .await
    }

    async fn update(&self, id: i64, patch: &CandidateUpdate) -> Result<Candidate, ClientError> {
        debug!("Updating candidate {}", id);
        let request = self.client.patch(self.candidate_url(id)).json(patch);
        self.send_json(request, "Candidate update").await
    }

    async fn update_status(
        &self,
        id: i64,
        status: CandidateStatus,
        notes: Option<&str>,
    ) -> Result<Candidate, ClientError> {
        debug!("Setting candidate {} status to {}", id, status);
        let body = StatusUpdate {
            status,
            notes: notes.map(str::to_string),
        };
        let url = format!("{}/status", self.candidate_url(id));
        self.send_json(self.client.patch(url).json(&body), "Status update")
            .await
    }

    async fn remove(&self, id: i64) -> Result<(), ClientError> {
        debug!("Deleting candidate {}", id);
        self.execute(self.client.delete(self.candidate_url(id)), "Candidate deletion")
            .await?;
        Ok(())
    }

    async fn filter(
        &self,
        request: &FilterRequest,
        page: Page,
    ) -> Result<FilterResponse, ClientError> {
        let url = self.url(FILTER_ENDPOINT);
        trace!("POST {} skip={} limit={}", url, page.skip, page.limit);
        let request = self.client.post(&url).query(&page).json(request);
        self.send_json(request, "Candidate filter").await
    }

    async fn upload_resumes(&self, files: Vec<ResumeFile>) -> Result<UploadResponse, ClientError> {
        let url = self.url(UPLOAD_ENDPOINT);
        let count = files.len();

        let mut form = Form::new();
        for file in files {
            let part = Part::bytes(file.bytes)
                .file_name(file.file_name.clone())
                .mime_str(file.content_type)
                .map_err(|e| {
                    ClientError::Validation(format!(
                        "{}: invalid content type: {}",
                        file.file_name, e
                    ))
                })?;
            form = form.part(UPLOAD_FIELD, part);
        }

        info!("Uploading {} resume files to {}", count, url);
        let response: UploadResponse = self
            .send_json(self.client.post(&url).multipart(form), "Resume upload")
            .await?;
        info!(
            "Upload processed {} files: {} uploaded, {} failed",
            response.total_processed,
            response.uploaded_files.len(),
            response.failed_files.len()
        );
        Ok(response)
    }

    async fn candidate_resumes(&self, id: i64) -> Result<Vec<Resume>, ClientError> {
        let url = format!("{}{}/{}", self.base_url, CANDIDATE_RESUMES_ENDPOINT, id);
        self.get_json(&url, "Resume list").await
    }

    async fn resume_content(&self, resume_id: i64) -> Result<ResumeContent, ClientError> {
        self.get_json(&self.resume_url(resume_id, "content"), "Resume content")
            .await
    }

    async fn download_resume(&self, resume_id: i64) -> Result<Vec<u8>, ClientError> {
        let url = self.resume_url(resume_id, "download");
        trace!("GET {}", url);
        let response = self.execute(self.client.get(&url), "Resume download").await?;
        let bytes = response
            .bytes()
            .await
            .map_err(|e| ClientError::from_transport(e, self.timeout))?;
        info!("Downloaded resume {} ({} bytes)", resume_id, bytes.len());
        Ok(bytes.to_vec())
    }

    async fn smart_match(
        &self,
        job_requirements: &str,
        candidate_ids: &[i64],
    ) -> Result<SmartMatchResponse, ClientError> {
        let payload = SmartMatchRequest {
            job_requirements,
            candidate_ids,
        };
        info!(
            "Requesting smart match over {} candidates",
            if candidate_ids.is_empty() {
                "all".to_string()
            } else {
                candidate_ids.len().to_string()
            }
        );
        self.post_json(SMART_MATCH_ENDPOINT, &payload, "Smart match")
            .await
    }

    async fn optimize_filter(&self, query: &str) -> Result<OptimizeResponse, ClientError> {
        let payload = OptimizeRequest {
            natural_language_query: query,
        };
        self.post_json(OPTIMIZE_ENDPOINT, &payload, "Filter optimization")
            .await
    }

    async fn suggestions(&self) -> Result<FilterSuggestions, ClientError> {
        self.get_json(&self.url(SUGGESTIONS_ENDPOINT), "Filter suggestions")
            .await
    }
}

/// FastAPI puts the human readable reason under `detail`
fn error_detail(body: &str) -> String {
    serde_json::from_str::<serde_json::Value>(body)
        .ok()
        .and_then(|value| match value.get("detail") {
            Some(serde_json::Value::String(detail)) => Some(detail.clone()),
            Some(other) => Some(other.to_string()),
            None => None,
        })
        .unwrap_or_else(|| {
            if body.trim().is_empty() {
                "Unknown error".to_string()
            } else {
                truncate_for_log(body)
            }
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_detail_prefers_fastapi_detail() {
        assert_eq!(
            error_detail(r#"{"detail": "Candidate not found"}"#),
            "Candidate not found"
        );
        assert_eq!(error_detail("Bad Gateway"), "Bad Gateway");
        assert_eq!(error_detail(""), "Unknown error");
    }

    #[test]
    fn test_error_display() {
        let err = ClientError::Remote {
            status: Some(404),
            message: "Candidate not found".to_string(),
        };
        assert_eq!(err.to_string(), "Request failed with status 404: Candidate not found");
        assert_eq!(err.status(), Some(404));

        let err = ClientError::Remote {
            status: None,
            message: "connection refused".to_string(),
        };
        assert_eq!(err.to_string(), "Request failed: connection refused");

        let err = ClientError::Timeout(Duration::from_secs(60));
        assert_eq!(err.to_string(), "Request timed out after 60s");
        assert!(err.is_timeout());
    }

    #[test]
    fn test_base_url_trailing_slash_is_trimmed() {
        let client = ServiceClient::new("http://localhost:8000/api/", Duration::from_secs(5)).unwrap();
        assert_eq!(client.base_url(), "http://localhost:8000/api");
        assert_eq!(client.candidate_url(4), "http://localhost:8000/api/candidates/4");
        assert_eq!(
            client.resume_url(9, "download"),
            "http://localhost:8000/api/resumes/9/download"
        );
    }
}
