//! Client-side candidate filtering

pub mod criteria;
pub mod store;

pub use criteria::{CriteriaPatch, ExperienceRange, FilterCriteria, Patch, RangeParseError};
pub use store::{recompute, FilterStore, StatusCounts};
