use anyhow::{Context, Result};
use chrono::NaiveDate;
use clap::Parser;
use reportdrop_core::{resolve_report_date, ReportConfig, ReportPipeline};
use std::path::PathBuf;
use tracing::{info, warn};

/// Fetch yesterday's sales report CSV from Gmail and overwrite the local copy
///
/// Options left unset fall back to the built-in defaults: token.json,
/// key, Sales_History.csv, "Daily Sales Report", "%b %d" and the
/// Sales_History/csv filename patterns.
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// File the downloaded CSV replaces
    #[arg(long, env = "REPORTDROP_OUTPUT")]
    output: Option<PathBuf>,

    /// Credential cache file
    #[arg(long, env = "REPORTDROP_TOKEN_CACHE")]
    token_cache: Option<PathBuf>,

    /// OAuth2 client secret JSON downloaded from the Google Cloud console
    #[arg(long, env = "REPORTDROP_CLIENT_SECRET")]
    client_secret: Option<PathBuf>,

    /// Subject text preceding the date
    #[arg(long, env = "REPORTDROP_SUBJECT")]
    subject: Option<String>,

    /// strftime format of the subject date, the year is appended
    #[arg(long, env = "REPORTDROP_DATE_FORMAT")]
    date_format: Option<String>,

    /// Substring required in the attachment filename (repeatable)
    #[arg(long = "pattern", env = "REPORTDROP_PATTERNS", value_delimiter = ',')]
    patterns: Vec<String>,

    /// OAuth2 scope to request on login (repeatable)
    #[arg(long = "scope", env = "REPORTDROP_SCOPES", value_delimiter = ',')]
    scopes: Vec<String>,

    /// Fetch the report for this date (YYYY-MM-DD) instead of yesterday
    #[arg(long)]
    date: Option<NaiveDate>,

    /// Discard the cached credential and log in again
    #[arg(long, action, default_value = "false")]
    reauth: bool,
}

impl Cli {
    /// Overlay the given options on the defaults
    pub fn config(&self) -> ReportConfig {
        let defaults = ReportConfig::default();

        ReportConfig {
            token_cache_path: self.token_cache.clone().unwrap_or(defaults.token_cache_path),
            client_secret_path: self
                .client_secret
                .clone()
                .unwrap_or(defaults.client_secret_path),
            output_path: self.output.clone().unwrap_or(defaults.output_path),
            subject: self.subject.clone().unwrap_or(defaults.subject),
            date_format: self.date_format.clone().unwrap_or(defaults.date_format),
            attachment_patterns: if self.patterns.is_empty() {
                defaults.attachment_patterns
            } else {
                self.patterns.clone()
            },
            scopes: if self.scopes.is_empty() {
                defaults.scopes
            } else {
                self.scopes.clone()
            },
        }
    }
}

pub async fn run(cli: Cli) -> Result<()> {
    let config = cli.config();
    if config.scopes.is_empty() {
        warn!(
            "No --scope given; a fresh login will request none (try {})",
            reportdrop_auth::gmail::READONLY_SCOPE
        );
    }

    let pipeline = ReportPipeline::new(config)?;
    let client = pipeline
        .connect(cli.reauth)
        .await
        .context("authentication failed")?;

    let date = resolve_report_date(cli.date)?;
    info!("Fetching report for {}", date);

    let outcome = pipeline.run(&client, date).await?;
    println!("{}", outcome.message());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_command_is_well_formed() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_defaults() {
        let cli = Cli::try_parse_from(["reportdrop"]).unwrap();
        assert_eq!(cli.config(), ReportConfig::default());
        assert!(!cli.reauth);
        assert!(cli.date.is_none());
    }

    #[test]
    fn test_overrides() {
        let cli = Cli::try_parse_from([
            "reportdrop",
            "--output",
            "/srv/bi/Sales_History.csv",
            "--pattern",
            "Sales_History,csv",
            "--pattern",
            "2024",
            "--scope",
            "https://www.googleapis.com/auth/gmail.readonly",
            "--date",
            "2024-09-18",
            "--reauth",
        ])
        .unwrap();

        let config = cli.config();
        assert_eq!(config.output_path, PathBuf::from("/srv/bi/Sales_History.csv"));
        assert_eq!(config.attachment_patterns, vec!["Sales_History", "csv", "2024"]);
        assert_eq!(config.scopes.len(), 1);
        assert_eq!(config.subject, "Daily Sales Report");
        assert_eq!(cli.date, NaiveDate::from_ymd_opt(2024, 9, 18));
        assert!(cli.reauth);
    }

    #[test]
    fn test_rejects_malformed_date() {
        assert!(Cli::try_parse_from(["reportdrop", "--date", "Sep 18"]).is_err());
    }
}
