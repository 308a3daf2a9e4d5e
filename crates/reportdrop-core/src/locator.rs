//! Finds the report email for a date

use crate::{date_label, CoreResult, ReportConfig};
use chrono::{Datelike, NaiveDate};
use reportdrop_gmail::GmailClient;
use tracing::{debug, info};

/// Gmail search query, e.g. `subject:Daily Sales Report Sep 18, 2024`
pub fn search_query(subject: &str, label: &str, year: i32) -> String {
    format!("subject:{} {}, {}", subject, label, year)
}

/// Id of the first message matching the report subject for `date`
///
/// Gmail lists most recent first, so that message wins. Only the first page
/// of results is consulted.
pub async fn locate_report(
    client: &GmailClient,
    config: &ReportConfig,
    date: NaiveDate,
) -> CoreResult<Option<String>> {
    let label = date_label(date, &config.date_format)?;
    let query = search_query(&config.subject, &label, date.year());
    debug!("Searching mailbox: {}", query);

    let messages = client.list_messages(&query).await?;
    if messages.len() > 1 {
        debug!("{} messages matched, using the first", messages.len());
    }

    let id = messages.into_iter().next().map(|m| m.id);
    match &id {
        Some(id) => info!("Found report email {}", id),
        None => info!("No report email for {}", label),
    }
    Ok(id)
}
