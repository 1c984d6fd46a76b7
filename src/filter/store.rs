// src/filter/store.rs
use tracing::debug;

use super::criteria::{CriteriaPatch, FilterCriteria};
use crate::types::{Candidate, CandidateStatus};

/// Derive the visible subset of `collection` under `criteria`.
///
/// Pure and order preserving: the result is always a subsequence of the input.
pub fn recompute(collection: &[Candidate], criteria: &FilterCriteria) -> Vec<Candidate> {
    if criteria.is_unset() {
        return collection.to_vec();
    }

    collection
        .iter()
        .filter(|candidate| criteria.matches(candidate))
        .cloned()
        .collect()
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StatusCounts {
    pub total: usize,
    pub pending: usize,
    pub interviewed: usize,
    pub rejected: usize,
    pub hired: usize,
}

impl StatusCounts {
    pub fn tally(collection: &[Candidate]) -> Self {
        collection.iter().fold(
            Self {
                total: collection.len(),
                ..Default::default()
            },
            |mut counts, candidate| {
                *counts.slot(candidate.status) += 1;
                counts
            },
        )
    }

    pub fn get(&self, status: CandidateStatus) -> usize {
        match status {
            CandidateStatus::Pending => self.pending,
            CandidateStatus::Interviewed => self.interviewed,
            CandidateStatus::Rejected => self.rejected,
            CandidateStatus::Hired => self.hired,
        }
    }

    fn slot(&mut self, status: CandidateStatus) -> &mut usize {
        match status {
            CandidateStatus::Pending => &mut self.pending,
            CandidateStatus::Interviewed => &mut self.interviewed,
            CandidateStatus::Rejected => &mut self.rejected,
            CandidateStatus::Hired => &mut self.hired,
        }
    }
}

/// Holds the fetched collection, the active criteria and the derived view.
///
/// The view is recomputed from the full collection whenever either input
/// changes, so it never drifts from `(collection, criteria)`.
#[derive(Debug, Clone, Default)]
pub struct FilterStore {
    collection: Vec<Candidate>,
    criteria: FilterCriteria,
    visible: Vec<Candidate>,
}

impl FilterStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_collection(collection: Vec<Candidate>) -> Self {
        let mut store = Self::new();
        store.replace_collection(collection);
        store
    }

    /// Install a freshly fetched collection; the last one installed wins
    pub fn replace_collection(&mut self, collection: Vec<Candidate>) {
        self.collection = collection;
        self.refresh();
    }

    pub fn set_criteria(&mut self, patch: CriteriaPatch) {
        self.criteria.merge(patch);
        self.refresh();
    }

    pub fn clear_criteria(&mut self) {
        self.criteria = FilterCriteria::default();
        self.refresh();
    }

    pub fn criteria(&self) -> &FilterCriteria {
        &self.criteria
    }

    pub fn collection(&self) -> &[Candidate] {
        &self.collection
    }

    pub fn visible(&self) -> &[Candidate] {
        &self.visible
    }

    pub fn find(&self, id: i64) -> Option<&Candidate> {
        self.collection.iter().find(|c| c.id == id)
    }

    pub fn status_counts(&self) -> StatusCounts {
        StatusCounts::tally(&self.collection)
    }

    fn refresh(&mut self) {
        self.visible = recompute(&self.collection, &self.criteria);
        debug!(
            "Filter recomputed: {}/{} candidates visible ({} active fields)",
            self.visible.len(),
            self.collection.len(),
            self.criteria.active_fields()
        );
    }
}
