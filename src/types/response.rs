use serde::{Deserialize, Serialize};

use crate::types::candidate::{null_as_default, Candidate, CandidateStatus, ProcessingStatus};

pub const DEFAULT_PAGE_LIMIT: u32 = 100;
pub const MAX_PAGE_LIMIT: u32 = 1000;

// ===== Request Bodies =====

/// Server-side filter body for `POST /candidates/filter`
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FilterRequest {
    #[serde(deserialize_with = "null_as_default")]
    pub keywords: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub education: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub min_experience: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_experience: Option<u32>,
    #[serde(deserialize_with = "null_as_default")]
    pub skills: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<CandidateStatus>,
}

/// `skip`/`limit` query parameters of the list and filter endpoints
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Page {
    pub skip: u32,
    pub limit: u32,
}

impl Default for Page {
    fn default() -> Self {
        Self {
            skip: 0,
            limit: DEFAULT_PAGE_LIMIT,
        }
    }
}

impl Page {
    pub fn new(skip: u32, limit: u32) -> Self {
        Self { skip, limit }
    }

    /// The backend accepts a limit between 1 and 1000
    pub fn is_valid(&self) -> bool {
        (1..=MAX_PAGE_LIMIT).contains(&self.limit)
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct SmartMatchRequest<'a> {
    pub job_requirements: &'a str,
    pub candidate_ids: &'a [i64],
}

#[derive(Debug, Clone, Serialize)]
pub struct OptimizeRequest<'a> {
    pub natural_language_query: &'a str,
}

// ===== Service Response Types =====

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FilterResponse {
    pub candidates: Vec<Candidate>,
    pub total_count: usize,
    #[serde(default)]
    pub filter_criteria: serde_json::Value,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FailedFile {
    pub filename: String,
    pub error: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UploadResponse {
    pub message: String,
    #[serde(default)]
    pub uploaded_files: Vec<String>,
    #[serde(default)]
    pub failed_files: Vec<FailedFile>,
    #[serde(default)]
    pub total_processed: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SmartMatch {
    pub candidate_id: i64,
    #[serde(default)]
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub experience_years: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub current_position: Option<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub skills: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<CandidateStatus>,
    #[serde(default)]
    pub score: f64,
    #[serde(default, deserialize_with = "null_as_default")]
    pub reasons: Vec<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub concerns: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SmartMatchResponse {
    pub job_requirements: String,
    pub matches: Vec<SmartMatch>,
    pub total_candidates: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OptimizeResponse {
    pub original_query: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub optimized_criteria: FilterRequest,
    #[serde(default, deserialize_with = "null_as_default")]
    pub suggestions: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExperienceOption {
    pub label: String,
    pub min: u32,
    #[serde(default)]
    pub max: Option<u32>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusOption {
    pub value: String,
    pub label: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FilterSuggestions {
    #[serde(deserialize_with = "null_as_default")]
    pub common_skills: Vec<String>,
    #[serde(deserialize_with = "null_as_default")]
    pub education_levels: Vec<String>,
    #[serde(deserialize_with = "null_as_default")]
    pub experience_ranges: Vec<ExperienceOption>,
    #[serde(deserialize_with = "null_as_default")]
    pub status_options: Vec<StatusOption>,
}

/// Body of `GET /resumes/{id}/content`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResumeContent {
    pub id: i64,
    pub filename: String,
    pub processing_status: ProcessingStatus,
    #[serde(default)]
    pub raw_text: Option<String>,
    #[serde(default)]
    pub extracted_data: Option<serde_json::Value>,
    #[serde(default)]
    pub candidate_id: Option<i64>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_filter_request_skips_unset_scalars() {
        let request = FilterRequest {
            skills: vec!["Rust".to_string()],
            min_experience: Some(3),
            ..Default::default()
        };
        assert_eq!(
            serde_json::to_value(&request).unwrap(),
            serde_json::json!({ "keywords": [], "skills": ["Rust"], "min_experience": 3 })
        );
    }

    #[test]
    fn test_optimize_response_tolerates_extra_criteria_keys() {
        let raw = r#"{
            "original_query": "senior rust engineers",
            "optimized_criteria": { "skills": ["Rust"], "min_experience": 5, "salary": "high" },
            "suggestions": ["Skills: Rust"]
        }"#;
        let response: OptimizeResponse = serde_json::from_str(raw).unwrap();
        assert_eq!(response.optimized_criteria.skills, vec!["Rust".to_string()]);
        assert_eq!(response.optimized_criteria.min_experience, Some(5));
        assert!(response.optimized_criteria.keywords.is_empty());
    }

    #[test]
    fn test_optimize_response_accepts_null_fields() {
        let raw = r#"{
            "original_query": "python people",
            "optimized_criteria": {
                "keywords": null,
                "education": null,
                "min_experience": null,
                "max_experience": null,
                "skills": ["Python"],
                "position_keywords": null
            },
            "suggestions": null
        }"#;
        let response: OptimizeResponse = serde_json::from_str(raw).unwrap();
        assert!(response.optimized_criteria.keywords.is_empty());
        assert_eq!(response.optimized_criteria.skills, vec!["Python".to_string()]);
        assert_eq!(response.optimized_criteria.min_experience, None);
        assert!(response.suggestions.is_empty());

        let raw = r#"{ "original_query": "anyone", "optimized_criteria": null }"#;
        let response: OptimizeResponse = serde_json::from_str(raw).unwrap();
        assert_eq!(response.optimized_criteria, FilterRequest::default());
    }

    #[test]
    fn test_smart_match_null_lists_are_empty() {
        let raw = r#"{ "candidate_id": 5, "score": 40, "reasons": null, "concerns": null, "skills": null }"#;
        let m: SmartMatch = serde_json::from_str(raw).unwrap();
        assert!(m.reasons.is_empty());
        assert!(m.concerns.is_empty());
        assert!(m.skills.is_empty());
    }

    #[test]
    fn test_page_bounds() {
        assert!(Page::default().is_valid());
        assert!(Page::new(200, MAX_PAGE_LIMIT).is_valid());
        assert!(!Page::new(0, 0).is_valid());
        assert!(!Page::new(0, MAX_PAGE_LIMIT + 1).is_valid());
    }

    #[test]
    fn test_resume_content_without_text() {
        let raw = r#"{
            "id": 9,
            "filename": "cv.pdf",
            "processing_status": "processing",
            "raw_text": null,
            "extracted_data": null,
            "candidate_id": null
        }"#;
        let content: ResumeContent = serde_json::from_str(raw).unwrap();
        assert_eq!(content.processing_status, ProcessingStatus::Processing);
        assert_eq!(content.raw_text, None);
        assert_eq!(content.candidate_id, None);
    }

    #[test]
    fn test_smart_match_defaults() {
        let raw = r#"{ "candidate_id": 3, "score": 82.5 }"#;
        let m: SmartMatch = serde_json::from_str(raw).unwrap();
        assert_eq!(m.candidate_id, 3);
        assert!(m.reasons.is_empty());
        assert!(m.concerns.is_empty());
        assert_eq!(m.status, None);
    }
}
