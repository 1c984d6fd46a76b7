//! Client library for the HR Copilot recruitment backend.
//!
//! The backend owns candidates, resume parsing and matching. This crate keeps
//! a local copy of the candidate list, filters it, and reports the outcome of
//! every remote call through a notification queue.

pub mod cli;
pub mod core;
pub mod filter;
pub mod session;
pub mod types;
pub mod upload_validator;
pub mod utils;

pub use crate::core::{
    CandidateApi, ClientError, ConfigManager, Notification, NotificationCenter, NotificationKind,
    ServiceClient,
};
pub use crate::filter::{recompute, CriteriaPatch, ExperienceRange, FilterCriteria, FilterStore};
pub use crate::session::Session;
pub use crate::types::{Candidate, CandidateStatus};
