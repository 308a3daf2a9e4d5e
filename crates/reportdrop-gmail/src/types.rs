use serde::Deserialize;

/// Response of `users.messages.list`
#[derive(Debug, Deserialize)]
pub struct ListMessagesResponse {
    /// Absent when nothing matches
    #[serde(default)]
    pub messages: Vec<MessageRef>,
    #[serde(rename = "nextPageToken")]
    pub next_page_token: Option<String>,
}

/// Message id as returned by a list query
#[derive(Debug, Clone, Deserialize)]
pub struct MessageRef {
    pub id: String,
}

/// A message fetched with `format=full`
#[derive(Debug, Clone, Deserialize)]
pub struct Message {
    pub id: String,
    pub payload: Option<MessagePart>,
}

impl Message {
    /// Top-level parts of the payload, empty for single-part messages
    pub fn top_level_parts(&self) -> &[MessagePart] {
        self.payload
            .as_ref()
            .map(|payload| payload.parts.as_slice())
            .unwrap_or_default()
    }
}

/// One node of the MIME tree
#[derive(Debug, Clone, Deserialize)]
pub struct MessagePart {
    /// Empty for parts that are not attachments
    #[serde(default)]
    pub filename: String,
    pub body: Option<MessagePartBody>,
    #[serde(default)]
    pub parts: Vec<MessagePart>,
}

impl MessagePart {
    pub fn attachment_id(&self) -> Option<&str> {
        self.body.as_ref()?.attachment_id.as_deref()
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct MessagePartBody {
    #[serde(rename = "attachmentId")]
    pub attachment_id: Option<String>,
}

/// Response of `users.messages.attachments.get`
#[derive(Debug, Deserialize)]
pub struct AttachmentBody {
    /// URL-safe base64, empty for a zero-byte attachment
    #[serde(default)]
    pub data: String,
}
