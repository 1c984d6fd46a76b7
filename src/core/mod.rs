//! Core services shared by every view: configuration, backend client, notifications

pub mod config_manager;
pub mod notifications;
pub mod service_client;

pub use config_manager::ConfigManager;
pub use notifications::{Notification, NotificationCenter, NotificationEvent, NotificationKind};
pub use service_client::{CandidateApi, ClientError, ServiceClient};
