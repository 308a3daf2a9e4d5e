//! Picks the report attachment out of a message

use crate::CoreResult;
use reportdrop_gmail::{GmailClient, MessagePart};
use tracing::{debug, info, warn};

/// A downloaded attachment
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Attachment {
    pub filename: String,
    pub data: Vec<u8>,
}

/// Case-sensitive substring match on attachment filenames
#[derive(Debug, Clone)]
pub struct AttachmentMatcher {
    patterns: Vec<String>,
}

impl AttachmentMatcher {
    pub fn new(patterns: Vec<String>) -> Self {
        Self { patterns }
    }

    /// Non-empty filename containing every pattern
    pub fn matches(&self, filename: &str) -> bool {
        !filename.is_empty() && self.patterns.iter().all(|p| filename.contains(p.as_str()))
    }

    /// First top-level part that qualifies, with its attachment id
    ///
    /// Nested multipart children are not inspected. Later parts are never
    /// considered, even when the first qualifying one cannot be downloaded.
    pub fn select<'a>(&self, parts: &'a [MessagePart]) -> Option<(&'a MessagePart, &'a str)> {
        let part = parts.iter().find(|part| self.matches(&part.filename))?;
        match part.attachment_id() {
            Some(id) => Some((part, id)),
            None => {
                warn!("{} has no attachment id", part.filename);
                None
            }
        }
    }
}

/// Fetch `message_id` and download its first qualifying attachment
pub async fn extract_attachment(
    client: &GmailClient,
    message_id: &str,
    matcher: &AttachmentMatcher,
) -> CoreResult<Option<Attachment>> {
    let message = client.get_message(message_id).await?;
    let parts = message.top_level_parts();
    debug!("Message {} has {} top-level parts", message_id, parts.len());

    let Some((part, attachment_id)) = matcher.select(parts) else {
        return Ok(None);
    };

    let data = client.get_attachment(message_id, attachment_id).await?;
    info!("Downloaded {} ({} bytes)", part.filename, data.len());

    Ok(Some(Attachment {
        filename: part.filename.clone(),
        data,
    }))
}
