//! Wire types shared with the recruitment backend

pub mod candidate;
pub mod response;

pub use candidate::{
    Candidate, CandidateStatus, CandidateUpdate, NewCandidate, ProcessingStatus, Resume,
    StatusUpdate, UnknownStatus,
};
pub use response::{
    FailedFile, FilterRequest, FilterResponse, FilterSuggestions, OptimizeResponse, Page,
    ResumeContent, SmartMatch, SmartMatchResponse, UploadResponse,
};
