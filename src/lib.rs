pub mod changelog_parser;
pub mod client;
pub mod config_store;
pub mod datetime;
pub mod error;
pub mod history;
pub mod models;
pub mod output;
pub mod report;
pub mod service;
pub mod source;

pub use client::{Auth, JiraClient, JiraConfig};
pub use error::Error;
pub use models::*;

// Changelog parser re-exports
pub use changelog_parser::{ChangelogParser, ParsedChangelog};

// History re-exports
pub use history::{ChangelogEntry, FieldChange, Occurrence, StatusHistory};

// Config store re-exports
pub use config_store::{ConfigStore, FileConfigStore, RunConfig, StatusConfig, StatusRule};

// Report re-exports
pub use report::{Report, ReportRow};
pub use output::{Destination, OutputFormat, ReportFormatter, Separator, render};

// Service re-exports
pub use service::{ReportService, ReportStats};
pub use source::{IssuePager, IssueSource};
