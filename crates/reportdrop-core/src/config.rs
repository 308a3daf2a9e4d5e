//! Run configuration

use crate::{date_label, CoreError, CoreResult};
use chrono::NaiveDate;
use reportdrop_auth::AuthSettings;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Everything a run needs to know, passed explicitly to each step
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReportConfig {
    /// Credential cache file
    pub token_cache_path: PathBuf,
    /// OAuth2 client registration JSON
    pub client_secret_path: PathBuf,
    /// File the reporting tool reads, overwritten on every successful run
    pub output_path: PathBuf,
    /// Subject text preceding the date
    pub subject: String,
    /// strftime format of the date inside the subject, without the year
    pub date_format: String,
    /// Substrings that must all appear in the attachment filename
    pub attachment_patterns: Vec<String>,
    /// OAuth2 scopes requested on a fresh login
    pub scopes: Vec<String>,
}

impl Default for ReportConfig {
    fn default() -> Self {
        Self {
            token_cache_path: PathBuf::from("token.json"),
            client_secret_path: PathBuf::from("key"),
            output_path: PathBuf::from("Sales_History.csv"),
            subject: "Daily Sales Report".to_string(),
            date_format: "%b %d".to_string(),
            attachment_patterns: vec!["Sales_History".to_string(), "csv".to_string()],
            scopes: Vec::new(),
        }
    }
}

impl ReportConfig {
    /// Reject settings that would fail later in less obvious ways
    pub fn validate(&self) -> CoreResult<()> {
        if self.subject.trim().is_empty() {
            return Err(CoreError::InvalidConfig("subject must not be empty".to_string()));
        }

        // Time and timezone fields only fail once a date is rendered
        if date_label(NaiveDate::default(), &self.date_format).is_err() {
            return Err(CoreError::InvalidConfig(format!(
                "invalid date format: {}",
                self.date_format
            )));
        }

        if self.attachment_patterns.iter().any(|p| p.is_empty()) {
            return Err(CoreError::InvalidConfig(
                "attachment patterns must not be empty strings".to_string(),
            ));
        }

        Ok(())
    }

    pub fn auth_settings(&self) -> AuthSettings {
        AuthSettings {
            token_cache_path: self.token_cache_path.clone(),
            client_secret_path: self.client_secret_path.clone(),
            scopes: self.scopes.clone(),
        }
    }
}
