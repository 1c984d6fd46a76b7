// src/filter/criteria.rs
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;
use thiserror::Error;
use tracing::warn;

use crate::types::{Candidate, CandidateStatus, FilterRequest};

#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("Invalid experience range '{input}': {reason}")]
pub struct RangeParseError {
    pub input: String,
    pub reason: String,
}

/// Inclusive range of years of experience; a missing bound is open
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ExperienceRange {
    pub min: Option<u32>,
    pub max: Option<u32>,
}

impl ExperienceRange {
    pub fn new(min: Option<u32>, max: Option<u32>) -> Self {
        Self { min, max }
    }

    pub fn between(min: u32, max: u32) -> Self {
        Self::new(Some(min), Some(max))
    }

    pub fn at_least(min: u32) -> Self {
        Self::new(Some(min), None)
    }

    pub fn is_unbounded(&self) -> bool {
        self.min.is_none() && self.max.is_none()
    }

    pub fn contains(&self, years: u32) -> bool {
        self.min.map_or(true, |min| years >= min) && self.max.map_or(true, |max| years <= max)
    }

    /// Parse the `min-max` notation used by the filter panel.
    ///
    /// Accepted forms: `3-5`, `10-` or `10+` (no upper bound), `-5` (no lower
    /// bound), a bare `5` (at least five), and the empty string (unbounded).
    pub fn parse(input: &str) -> Result<Self, RangeParseError> {
        let trimmed = input.trim();
        let err = |reason: &str| RangeParseError {
            input: input.to_string(),
            reason: reason.to_string(),
        };

        if trimmed.is_empty() {
            return Ok(Self::default());
        }

        if let Some(min) = trimmed.strip_suffix('+') {
            let min = parse_bound(min).ok_or_else(|| err("lower bound is not a number"))?;
            return Ok(Self::new(min, None));
        }

        let mut parts = trimmed.splitn(3, '-');
        let min = parts.next().unwrap_or_default();
        let max = parts.next();
        if parts.next().is_some() {
            return Err(err("expected at most one '-'"));
        }

        let min = parse_bound(min).ok_or_else(|| err("lower bound is not a number"))?;
        let max = match max {
            Some(max) => parse_bound(max).ok_or_else(|| err("upper bound is not a number"))?,
            None => None,
        };

        if let (Some(lo), Some(hi)) = (min, max) {
            if lo > hi {
                return Err(err("lower bound exceeds upper bound"));
            }
        }

        Ok(Self::new(min, max))
    }

    /// Like [`parse`](Self::parse) but a malformed range becomes unbounded,
    /// so the experience predicate accepts every record.
    pub fn parse_lenient(input: &str) -> Self {
        match Self::parse(input) {
            Ok(range) => range,
            Err(e) => {
                warn!("{}; ignoring experience filter", e);
                Self::default()
            }
        }
    }
}

fn parse_bound(raw: &str) -> Option<Option<u32>> {
    let raw = raw.trim();
    if raw.is_empty() {
        return Some(None);
    }
    raw.parse::<u32>().ok().map(Some)
}

impl fmt::Display for ExperienceRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (self.min, self.max) {
            (Some(min), Some(max)) => write!(f, "{}-{}", min, max),
            (Some(min), None) => write!(f, "{}+", min),
            (None, Some(max)) => write!(f, "-{}", max),
            (None, None) => f.write_str("any"),
        }
    }
}

/// The set of filters a user can apply to the candidate list.
///
/// `None` and the empty skill set are the unset sentinels; an unset field
/// never excludes a record.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FilterCriteria {
    pub keyword: Option<String>,
    pub skills: BTreeSet<String>,
    pub experience: Option<ExperienceRange>,
    pub status: Option<CandidateStatus>,
    pub location: Option<String>,
    pub education: Option<String>,
}

impl FilterCriteria {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_unset(&self) -> bool {
        self.active_fields() == 0
    }

    /// Number of fields currently taking part in filtering
    pub fn active_fields(&self) -> usize {
        [
            self.keyword.is_some(),
            !self.skills.is_empty(),
            self.experience.is_some(),
            self.status.is_some(),
            self.location.is_some(),
            self.education.is_some(),
        ]
        .iter()
        .filter(|active| **active)
        .count()
    }

    /// Merge a patch into these criteria; fields the patch leaves alone keep their value
    pub fn merge(&mut self, patch: CriteriaPatch) {
        patch.keyword.apply(&mut self.keyword);
        patch.experience.apply(&mut self.experience);
        patch.status.apply(&mut self.status);
        patch.location.apply(&mut self.location);
        patch.education.apply(&mut self.education);

        match patch.skills {
            Patch::Keep => {}
            Patch::Clear => self.skills.clear(),
            Patch::Set(skills) => self.skills = skills,
        }

        // Blank text carries no constraint
        for slot in [&mut self.keyword, &mut self.location, &mut self.education] {
            if slot.as_deref().is_some_and(|s| s.trim().is_empty()) {
                *slot = None;
            }
        }
        self.skills.retain(|s| !s.trim().is_empty());
    }

    /// True when the candidate satisfies every set field
    pub fn matches(&self, candidate: &Candidate) -> bool {
        self.matches_keyword(candidate)
            && self.matches_skills(candidate)
            && self.matches_experience(candidate)
            && self.matches_status(candidate)
            && self.matches_location(candidate)
            && self.matches_education(candidate)
    }

    fn matches_keyword(&self, candidate: &Candidate) -> bool {
        let Some(keyword) = &self.keyword else {
            return true;
        };
        let query = keyword.trim().to_lowercase();

        contains_ci(Some(&candidate.name), &query)
            || contains_ci(candidate.email.as_ref(), &query)
            || contains_ci(candidate.current_position.as_ref(), &query)
            || contains_ci(candidate.current_company.as_ref(), &query)
            || candidate
                .skills
                .iter()
                .any(|skill| contains_ci(Some(skill), &query))
    }

    fn matches_skills(&self, candidate: &Candidate) -> bool {
        self.skills.is_empty() || candidate.skills.iter().any(|s| self.skills.contains(s))
    }

    fn matches_experience(&self, candidate: &Candidate) -> bool {
        self.experience
            .map_or(true, |range| range.contains(candidate.experience_years.unwrap_or(0)))
    }

    fn matches_status(&self, candidate: &Candidate) -> bool {
        self.status.map_or(true, |status| candidate.status == status)
    }

    fn matches_location(&self, candidate: &Candidate) -> bool {
        match &self.location {
            Some(location) => {
                contains_ci(candidate.location.as_ref(), &location.trim().to_lowercase())
            }
            None => true,
        }
    }

    fn matches_education(&self, candidate: &Candidate) -> bool {
        match &self.education {
            Some(education) => {
                contains_ci(candidate.education.as_ref(), &education.trim().to_lowercase())
            }
            None => true,
        }
    }
}

fn contains_ci(haystack: Option<&String>, lowered_needle: &str) -> bool {
    haystack.is_some_and(|h| h.to_lowercase().contains(lowered_needle))
}

/// Server-side filtering has no location field; it is dropped here
impl From<&FilterCriteria> for FilterRequest {
    fn from(criteria: &FilterCriteria) -> Self {
        let range = criteria.experience.unwrap_or_default();
        Self {
            keywords: criteria
                .keyword
                .as_deref()
                .map(|k| k.split_whitespace().map(str::to_string).collect())
                .unwrap_or_default(),
            education: criteria.education.clone(),
            min_experience: range.min,
            max_experience: range.max,
            skills: criteria.skills.iter().cloned().collect(),
            status: criteria.status,
        }
    }
}

/// One field of a [`CriteriaPatch`]
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum Patch<T> {
    #[default]
    Keep,
    Clear,
    Set(T),
}

impl<T> Patch<T> {
    fn apply(self, slot: &mut Option<T>) {
        match self {
            Patch::Keep => {}
            Patch::Clear => *slot = None,
            Patch::Set(value) => *slot = Some(value),
        }
    }
}

/// A partial update to [`FilterCriteria`]
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CriteriaPatch {
    pub keyword: Patch<String>,
    pub skills: Patch<BTreeSet<String>>,
    pub experience: Patch<ExperienceRange>,
    pub status: Patch<CandidateStatus>,
    pub location: Patch<String>,
    pub education: Patch<String>,
}

impl CriteriaPatch {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn keyword(mut self, keyword: impl Into<String>) -> Self {
        self.keyword = Patch::Set(keyword.into());
        self
    }

    pub fn skills<I, S>(mut self, skills: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.skills = Patch::Set(skills.into_iter().map(Into::into).collect());
        self
    }

    pub fn experience(mut self, range: ExperienceRange) -> Self {
        self.experience = Patch::Set(range);
        self
    }

    pub fn status(mut self, status: CandidateStatus) -> Self {
        self.status = Patch::Set(status);
        self
    }

    pub fn location(mut self, location: impl Into<String>) -> Self {
        self.location = Patch::Set(location.into());
        self
    }

    pub fn education(mut self, education: impl Into<String>) -> Self {
        self.education = Patch::Set(education.into());
        self
    }

    pub fn clear_keyword(mut self) -> Self {
        self.keyword = Patch::Clear;
        self
    }

    pub fn clear_skills(mut self) -> Self {
        self.skills = Patch::Clear;
        self
    }

    pub fn clear_experience(mut self) -> Self {
        self.experience = Patch::Clear;
        self
    }

    pub fn clear_status(mut self) -> Self {
        self.status = Patch::Clear;
        self
    }

    pub fn clear_location(mut self) -> Self {
        self.location = Patch::Clear;
        self
    }

    pub fn clear_education(mut self) -> Self {
        self.education = Patch::Clear;
        self
    }
}

/// Criteria suggested by the backend's query optimizer, as a patch that
/// replaces every field the optimizer can express
impl From<&FilterRequest> for CriteriaPatch {
    fn from(request: &FilterRequest) -> Self {
        let mut patch = CriteriaPatch::new();

        patch.keyword = if request.keywords.is_empty() {
            Patch::Clear
        } else {
            Patch::Set(request.keywords.join(" "))
        };
        patch.skills = if request.skills.is_empty() {
            Patch::Clear
        } else {
            Patch::Set(request.skills.iter().cloned().collect())
        };
        let range = ExperienceRange::new(request.min_experience, request.max_experience);
        patch.experience = if range.is_unbounded() {
            Patch::Clear
        } else {
            Patch::Set(range)
        };
        patch.status = request.status.map_or(Patch::Clear, Patch::Set);
        patch.education = request.education.clone().map_or(Patch::Clear, Patch::Set);

        patch
    }
}
