//! The end-to-end run: authenticate, locate, extract, write

use crate::{
    date_label, extract_attachment, locate_report, write_report, AttachmentMatcher, CoreResult,
    ReportConfig,
};
use chrono::NaiveDate;
use reportdrop_auth::Authenticator;
use reportdrop_gmail::GmailClient;
use std::path::PathBuf;
use tracing::{info, warn};

/// How a run ended; only `Saved` touches the output file
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReportOutcome {
    Saved {
        message_id: String,
        filename: String,
        path: PathBuf,
        bytes: usize,
    },
    NoEmail {
        label: String,
    },
    NoAttachment {
        message_id: String,
    },
}

impl ReportOutcome {
    /// Line shown to the user
    pub fn message(&self) -> String {
        match self {
            ReportOutcome::Saved { .. } => "Sales report CSV replaced successfully.".to_string(),
            ReportOutcome::NoEmail { label } => format!("No email found for {}.", label),
            ReportOutcome::NoAttachment { .. } => {
                "No Sales_History CSV attachment found.".to_string()
            }
        }
    }
}

pub struct ReportPipeline {
    config: ReportConfig,
    matcher: AttachmentMatcher,
}

impl ReportPipeline {
    pub fn new(config: ReportConfig) -> CoreResult<Self> {
        config.validate()?;
        let matcher = AttachmentMatcher::new(config.attachment_patterns.clone());
        Ok(Self { config, matcher })
    }

    pub fn config(&self) -> &ReportConfig {
        &self.config
    }

    /// Authenticate and return a Gmail client for the resulting token
    ///
    /// With `reauth` the credential cache is dropped first, forcing the
    /// interactive login.
    pub async fn connect(&self, reauth: bool) -> CoreResult<GmailClient> {
        let authenticator = Authenticator::new(self.config.auth_settings());
        if reauth {
            authenticator.cache().clear()?;
        }

        let credential = authenticator.authenticate().await?;
        Ok(GmailClient::new(credential.access_token().to_string()))
    }

    /// Fetch the report for `date` and overwrite the output file
    pub async fn run(&self, client: &GmailClient, date: NaiveDate) -> CoreResult<ReportOutcome> {
        let Some(message_id) = locate_report(client, &self.config, date).await? else {
            return Ok(ReportOutcome::NoEmail {
                label: date_label(date, &self.config.date_format)?,
            });
        };

        let Some(attachment) = extract_attachment(client, &message_id, &self.matcher).await?
        else {
            return Ok(ReportOutcome::NoAttachment { message_id });
        };
        if attachment.data.is_empty() {
            warn!("{} in {} is empty, keeping the current output", attachment.filename, message_id);
            return Ok(ReportOutcome::NoAttachment { message_id });
        }

        write_report(&self.config.output_path, &attachment.data)?;
        info!(
            "Replaced {} with {} from {}",
            self.config.output_path.display(),
            attachment.filename,
            message_id
        );

        Ok(ReportOutcome::Saved {
            message_id,
            filename: attachment.filename,
            path: self.config.output_path.clone(),
            bytes: attachment.data.len(),
        })
    }
}
