use crate::error::{GmailError, GmailResult};
use crate::types::*;
use base64::alphabet;
use base64::engine::general_purpose::{GeneralPurpose, GeneralPurposeConfig};
use base64::engine::DecodePaddingMode;
use base64::Engine;
use serde::de::DeserializeOwned;
use tracing::{debug, info};

/// Gmail API v1, acting on the authenticated user
pub const GMAIL_BASE: &str = "https://gmail.googleapis.com/gmail/v1";

/// URL-safe alphabet; Gmail usually pads, but not always
const URL_SAFE_LENIENT: GeneralPurpose = GeneralPurpose::new(
    &alphabet::URL_SAFE,
    GeneralPurposeConfig::new().with_decode_padding_mode(DecodePaddingMode::Indifferent),
);

/// Decode the URL-safe base64 `data` field of a message part or attachment
pub fn decode_attachment_data(data: &str) -> GmailResult<Vec<u8>> {
    Ok(URL_SAFE_LENIENT.decode(data.trim())?)
}

pub struct GmailClient {
    client: reqwest::Client,
    base_url: String,
    access_token: String,
}

impl GmailClient {
    pub fn new(access_token: String) -> Self {
        Self::with_base_url(GMAIL_BASE, access_token)
    }

    /// Point the client at another endpoint (used against mock servers)
    pub fn with_base_url(base_url: impl Into<String>, access_token: String) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
            access_token,
        }
    }

    /// Run a search query and return the first page of matching message ids
    ///
    /// Order is the provider's default (most recent first). Further pages
    /// are not requested.
    pub async fn list_messages(&self, query: &str) -> GmailResult<Vec<MessageRef>> {
        let url = format!("{}/users/me/messages", self.base_url);
        debug!("Gmail: listing messages q={}", query);

        let response = self
            .client
            .get(&url)
            .query(&[("q", query)])
            .bearer_auth(&self.access_token)
            .send()
            .await?;

        let list: ListMessagesResponse = Self::parse_json(response).await?;

        debug!(
            "Gmail: got {} messages, has_more={}",
            list.messages.len(),
            list.next_page_token.is_some()
        );
        Ok(list.messages)
    }

    /// Fetch a message with its full part structure
    pub async fn get_message(&self, message_id: &str) -> GmailResult<Message> {
        let url = format!("{}/users/me/messages/{}", self.base_url, message_id);
        debug!("Gmail: fetching message {}", message_id);

        let response = self
            .client
            .get(&url)
            .query(&[("format", "full")])
            .bearer_auth(&self.access_token)
            .send()
            .await?;

        Self::parse_json(response).await
    }

    /// Download and decode an attachment body
    pub async fn get_attachment(
        &self,
        message_id: &str,
        attachment_id: &str,
    ) -> GmailResult<Vec<u8>> {
        let url = format!(
            "{}/users/me/messages/{}/attachments/{}",
            self.base_url, message_id, attachment_id
        );
        debug!("Gmail: fetching attachment {} of {}", attachment_id, message_id);

        let response = self
            .client
            .get(&url)
            .bearer_auth(&self.access_token)
            .send()
            .await?;

        let attachment: AttachmentBody = Self::parse_json(response).await?;
        let data = decode_attachment_data(&attachment.data)?;

        info!("Gmail: attachment {} is {} bytes", attachment_id, data.len());
        Ok(data)
    }

    async fn parse_json<T: DeserializeOwned>(response: reqwest::Response) -> GmailResult<T> {
        if !response.status().is_success() {
            let status = response.status().as_u16();
            let body = response.text().await.unwrap_or_default();
            return Err(GmailError::ApiError { status, body });
        }

        response
            .json()
            .await
            .map_err(|e| GmailError::ParseError(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use base64::engine::general_purpose::URL_SAFE;

    #[test]
    fn test_decode_round_trip() {
        let bytes: Vec<u8> = (0u8..=255).chain([0xfb, 0xff, 0xfe]).collect();
        let encoded = URL_SAFE.encode(&bytes);
        assert!(encoded.contains('-') || encoded.contains('_'));
        assert_eq!(decode_attachment_data(&encoded).unwrap(), bytes);
    }

    #[test]
    fn test_decode_accepts_unpadded_input() {
        assert_eq!(decode_attachment_data("YSxiLGMKMQ").unwrap(), b"a,b,c\n1");
        assert_eq!(decode_attachment_data("YSxiLGMKMQ==").unwrap(), b"a,b,c\n1");
    }

    #[test]
    fn test_decode_rejects_standard_alphabet() {
        assert!(decode_attachment_data("+/+/").is_err());
    }

    #[tokio::test]
    async fn test_list_messages_sends_query() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("GET", "/users/me/messages")
            .match_query(mockito::Matcher::UrlEncoded(
                "q".into(),
                "subject:Daily Sales Report Sep 18, 2024".into(),
            ))
            .match_header("authorization", "Bearer test_token")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"{"messages": [{"id": "m1", "threadId": "t1"}, {"id": "m0", "threadId": "t0"}], "resultSizeEstimate": 2}"#)
            .create_async()
            .await;

        let client = GmailClient::with_base_url(server.url(), "test_token".to_string());
        let messages = client
            .list_messages("subject:Daily Sales Report Sep 18, 2024")
            .await
            .unwrap();

        assert_eq!(messages.len(), 2);
        assert_eq!(messages[0].id, "m1");
    }

    #[tokio::test]
    async fn test_api_error_carries_status() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("GET", "/users/me/messages/m1")
            .match_query(mockito::Matcher::Any)
            .with_status(401)
            .with_header("content-type", "application/json")
            .with_body(r#"{"error": {"message": "Unauthorized"}}"#)
            .create_async()
            .await;

        let client = GmailClient::with_base_url(server.url(), "bad_token".to_string());
        let err = client.get_message("m1").await.unwrap_err();

        match err {
            GmailError::ApiError { status, body } => {
                assert_eq!(status, 401);
                assert!(body.contains("Unauthorized"));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[tokio::test]
    async fn test_get_attachment_decodes_body() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("GET", "/users/me/messages/m1/attachments/att1")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(format!(
                r#"{{"size": 11, "data": "{}"}}"#,
                URL_SAFE.encode(b"a,b,c\n1,2,3")
            ))
            .create_async()
            .await;

        let client = GmailClient::with_base_url(server.url(), "test_token".to_string());
        let data = client.get_attachment("m1", "att1").await.unwrap();
        assert_eq!(data, b"a,b,c\n1,2,3");
    }

    #[tokio::test]
    async fn test_malformed_json_is_parse_error() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("GET", "/users/me/messages")
            .match_query(mockito::Matcher::Any)
            .with_status(200)
            .with_body("not json")
            .create_async()
            .await;

        let client = GmailClient::with_base_url(server.url(), "test_token".to_string());
        let err = client.list_messages("anything").await.unwrap_err();
        assert!(matches!(err, GmailError::ParseError(_)));
    }
}
