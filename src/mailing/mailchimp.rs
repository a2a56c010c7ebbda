//! Mailchimp marketing API client.

use std::time::Duration;

use async_trait::async_trait;
use log::debug;
use serde::Serialize;
use serde_json::Value;
use wreq::Client;
use wreq::StatusCode;
use wreq::header::CONTENT_TYPE;
use wreq::header::HeaderMap;
use wreq::header::HeaderValue;
use wreq::header::USER_AGENT;

use crate::mailing::MailingList;
use crate::mailing::RejectReason;
use crate::mailing::SubscribeOutcome;
use crate::mailing::Subscriber;
use crate::mailing::error::MailingError;

#[derive(Serialize)]
struct MemberRequest<'a> {
    email_address: &'a str,
    status: &'static str,
    merge_fields: MergeFields<'a>,
}

#[derive(Serialize)]
struct MergeFields<'a> {
    #[serde(rename = "FNAME")]
    first_name: &'a str,
    #[serde(rename = "LNAME")]
    last_name: &'a str,
    #[serde(rename = "PHONE")]
    phone: &'a str,
}

pub struct MailchimpClient {
    /// e.g. `https://us4.api.mailchimp.com/3.0`
    pub api_url: String,
    list_id: String,
    username: String,
    api_key: String,
    client: Client,
}

impl MailchimpClient {
    /// Creates a client. Without `api_url`, the host is derived from the
    /// data-center suffix of the key.
    pub fn new(
        api_key: impl Into<String>,
        list_id: impl Into<String>,
        username: impl Into<String>,
        api_url: Option<String>,
        timeout: Duration,
    ) -> Result<Self, MailingError> {
        let api_key = api_key.into();
        let api_url = match api_url {
            Some(url) => url,
            None => Self::api_url_for_key(&api_key).ok_or(MailingError::InvalidApiKey)?,
        };

        let mut headers = HeaderMap::new();
        headers.insert(USER_AGENT, HeaderValue::from_static("signup-sync/0.1"));
        let client = Client::builder()
            .default_headers(headers)
            .timeout(timeout)
            .build()?;

        Ok(Self {
            api_url,
            list_id: list_id.into(),
            username: username.into(),
            api_key,
            client,
        })
    }

    /// `0123abcd-us4` -> `https://us4.api.mailchimp.com/3.0`
    pub fn api_url_for_key(api_key: &str) -> Option<String> {
        let (_, dc) = api_key.trim().rsplit_once('-')?;
        if dc.is_empty() || !dc.chars().all(|c| c.is_ascii_alphanumeric()) {
            return None;
        }
        Some(format!("https://{dc}.api.mailchimp.com/3.0"))
    }

    /// Classifies a response. 5xx statuses count as transport errors.
    pub fn classify(status: StatusCode, body: &str) -> SubscribeOutcome {
        if status.is_success() {
            return SubscribeOutcome::Added;
        }

        let error: Value = serde_json::from_str(body).unwrap_or(Value::Null);
        let title = error.get("title").and_then(|v| v.as_str()).unwrap_or("");
        let detail = error.get("detail").and_then(|v| v.as_str()).unwrap_or("");

        if title == "Member Exists" || detail.contains("is already a list member") {
            return SubscribeOutcome::Rejected(RejectReason::AlreadySubscribed);
        }

        let message = match (title, detail) {
            ("", "") => format!("status {}: {}", status.as_u16(), body.trim()),
            (title, "") => format!("status {}: {title}", status.as_u16()),
            (_, detail) => format!("status {}: {detail}", status.as_u16()),
        };
        if status.is_server_error() {
            return SubscribeOutcome::TransportError(message);
        }
        SubscribeOutcome::Rejected(RejectReason::Other(message))
    }

    async fn post_member(&self, subscriber: &Subscriber) -> Result<(StatusCode, String), String> {
        let payload = serde_json::to_string(&MemberRequest {
            email_address: &subscriber.email,
            status: "subscribed",
            merge_fields: MergeFields {
                first_name: &subscriber.first_name,
                last_name: &subscriber.last_name,
                phone: &subscriber.phone,
            },
        })
        .map_err(|e| e.to_string())?;

        let url = format!("{}/lists/{}/members", self.api_url, self.list_id);
        debug!("Making request to: {url}");
        let response = self
            .client
            .post(url)
            .basic_auth(&self.username, Some(&self.api_key))
            .header(CONTENT_TYPE, "application/json")
            .body(payload)
            .send()
            .await
            .map_err(|e| e.to_string())?;

        let status = response.status();
        let body = response.text().await.map_err(|e| e.to_string())?;
        Ok((status, body))
    }
}

#[async_trait]
impl MailingList for MailchimpClient {
    async fn add_subscriber(&self, subscriber: &Subscriber) -> SubscribeOutcome {
        match self.post_member(subscriber).await {
            Ok((status, body)) => Self::classify(status, &body),
            Err(message) => SubscribeOutcome::TransportError(message),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_api_url_for_key() {
        assert_eq!(
            MailchimpClient::api_url_for_key("0123abcd-us4").as_deref(),
            Some("https://us4.api.mailchimp.com/3.0")
        );
        assert_eq!(MailchimpClient::api_url_for_key("0123abcd"), None);
        assert_eq!(MailchimpClient::api_url_for_key("0123abcd-"), None);
        assert_eq!(MailchimpClient::api_url_for_key("abc-us4/evil"), None);
    }

    #[test]
    fn test_classify_success() {
        assert_eq!(
            MailchimpClient::classify(StatusCode::OK, "{}"),
            SubscribeOutcome::Added
        );
    }

    #[test]
    fn test_classify_member_exists() {
        let body = r#"{"title":"Member Exists","status":400,"detail":"ada@example.org is already a list member. Use PUT to insert or update list members."}"#;
        assert_eq!(
            MailchimpClient::classify(StatusCode::BAD_REQUEST, body),
            SubscribeOutcome::Rejected(RejectReason::AlreadySubscribed)
        );
    }

    #[test]
    fn test_classify_other_rejection() {
        let body = r#"{"title":"Invalid Resource","status":400,"detail":"Please provide a valid email address."}"#;
        assert_eq!(
            MailchimpClient::classify(StatusCode::BAD_REQUEST, body),
            SubscribeOutcome::Rejected(RejectReason::Other(
                "status 400: Please provide a valid email address.".to_string()
            ))
        );
    }

    #[test]
    fn test_classify_server_error_is_transport_error() {
        assert_eq!(
            MailchimpClient::classify(StatusCode::BAD_GATEWAY, "upstream down"),
            SubscribeOutcome::TransportError("status 502: upstream down".to_string())
        );

        let body = r#"{"title":"Internal Server Error","status":500,"detail":"An unexpected internal error has occurred."}"#;
        assert_eq!(
            MailchimpClient::classify(StatusCode::INTERNAL_SERVER_ERROR, body),
            SubscribeOutcome::TransportError(
                "status 500: An unexpected internal error has occurred.".to_string()
            )
        );
    }

    #[test]
    fn test_missing_datacenter_without_override() {
        let result = MailchimpClient::new("nodc", "list", "user", None, Duration::from_secs(5));
        assert!(matches!(result, Err(MailingError::InvalidApiKey)));
    }
}
