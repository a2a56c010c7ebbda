//! Slack Web API client.

use std::num::NonZeroU32;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use governor::Quota;
use governor::RateLimiter;
use governor::clock::QuantaClock;
use governor::state::InMemoryState;
use governor::state::direct::NotKeyed;
use log::debug;
use log::info;
use log::warn;
use serde_json::Value;
use wreq::Client;
use wreq::header::HeaderMap;
use wreq::header::HeaderValue;
use wreq::header::USER_AGENT;

use crate::chat::Channel;
use crate::chat::ChannelId;
use crate::chat::ChannelPage;
use crate::chat::ChatApi;
use crate::chat::UserId;
use crate::chat::error::ChatError;
use crate::credential::CredentialProvider;

// Tier 3 limit of the lookup and conversation methods.
const CALLS_PER_MINUTE: NonZeroU32 = NonZeroU32::new(50).unwrap();

const CHANNEL_PAGE_LIMIT: &str = "200";

/// Error codes meaning the token itself is bad.
const AUTH_ERRORS: [&str; 5] = [
    "invalid_auth",
    "not_authed",
    "token_revoked",
    "token_expired",
    "account_inactive",
];

pub struct SlackClient {
    /// e.g. `https://slack.com`
    pub api_url: String,
    client: Client,
    credentials: Arc<dyn CredentialProvider>,
    /// `types` argument of `conversations.list`, e.g. `private_channel`.
    channel_types: String,
    limiter: RateLimiter<NotKeyed, InMemoryState, QuantaClock>,
}

impl SlackClient {
    pub fn new(
        api_url: impl Into<String>,
        credentials: Arc<dyn CredentialProvider>,
        channel_types: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self, ChatError> {
        let mut headers = HeaderMap::new();
        headers.insert(USER_AGENT, HeaderValue::from_static("signup-sync/0.1"));
        let client = Client::builder()
            .default_headers(headers)
            .timeout(timeout)
            .build()?;

        Ok(Self {
            api_url: api_url.into(),
            client,
            credentials,
            channel_types: channel_types.into(),
            limiter: RateLimiter::direct(Quota::per_minute(CALLS_PER_MINUTE)),
        })
    }

    /// Calls a Web API method and returns the envelope of an `ok` response.
    async fn call(
        &self,
        method: &str,
        mut params: Vec<(&'static str, String)>,
    ) -> Result<Value, ChatError> {
        if self.limiter.check().is_err() {
            info!("Chat API is ratelimited. Waiting...");
            self.limiter.until_ready().await;
        }

        let token = self.credentials.token().await?;
        params.push(("token", token.clone()));

        let url = format!("{}/api/{}", self.api_url, method);
        debug!("Making request to: {url}");
        let response = self.client.post(url).form(&params).send().await?;
        let status = response.status();
        let body = response.text().await?;

        if !status.is_success() {
            return Err(ChatError::ApiError {
                method: method.to_string(),
                error: format!("http_{}", status.as_u16()),
            });
        }

        let resp: Value = serde_json::from_str(&body)?;
        if resp.get("ok").and_then(Value::as_bool) == Some(true) {
            return Ok(resp);
        }

        let error = resp
            .get("error")
            .and_then(|v| v.as_str())
            .unwrap_or("unknown_error")
            .to_string();
        if AUTH_ERRORS.contains(&error.as_str()) {
            warn!("Chat API rejected the token ({error}), invalidating it.");
            self.credentials.invalidate(&token);
            return Err(ChatError::Unauthorized { error });
        }

        Err(ChatError::ApiError {
            method: method.to_string(),
            error,
        })
    }

    fn get_str(value: &Value, pointer: &str) -> Result<String, ChatError> {
        value
            .pointer(pointer)
            .and_then(|v| v.as_str())
            .map(|s| s.to_string())
            .ok_or_else(|| ChatError::MissingField {
                field: pointer.trim_start_matches('/').replace('/', "."),
            })
    }

    fn get_channels(resp: &Value) -> Result<Vec<Channel>, ChatError> {
        let channels = resp
            .get("channels")
            .and_then(|v| v.as_array())
            .ok_or_else(|| ChatError::MissingField {
                field: "channels".to_string(),
            })?;

        channels
            .iter()
            .map(|channel| {
                Ok(Channel {
                    id: Self::get_str(channel, "/id")?,
                    name: Self::get_str(channel, "/name")?,
                })
            })
            .collect()
    }
}

#[async_trait]
impl ChatApi for SlackClient {
    async fn lookup_user_by_email(&self, email: &str) -> Result<UserId, ChatError> {
        let resp = self
            .call("users.lookupByEmail", vec![("email", email.to_string())])
            .await
            .map_err(|e| match e {
                ChatError::ApiError { error, .. } if error == "users_not_found" => {
                    ChatError::UserNotFound {
                        email: email.to_string(),
                    }
                }
                other => other,
            })?;
        Self::get_str(&resp, "/user/id")
    }

    async fn list_channels(&self, cursor: Option<String>) -> Result<ChannelPage, ChatError> {
        let mut params = vec![
            ("types", self.channel_types.clone()),
            ("exclude_archived", "true".to_string()),
            ("limit", CHANNEL_PAGE_LIMIT.to_string()),
        ];
        if let Some(cursor) = cursor.filter(|c| !c.is_empty()) {
            params.push(("cursor", cursor));
        }

        let resp = self.call("conversations.list", params).await?;
        let channels = Self::get_channels(&resp)?;
        let next_cursor = resp
            .pointer("/response_metadata/next_cursor")
            .and_then(|v| v.as_str())
            .map(|s| s.to_string());

        Ok(ChannelPage {
            channels,
            next_cursor,
        })
    }

    async fn open_conversation(&self, user_ids: Vec<UserId>) -> Result<ChannelId, ChatError> {
        let resp = self
            .call("conversations.open", vec![("users", user_ids.join(","))])
            .await?;
        Self::get_str(&resp, "/channel/id")
    }

    async fn post_message(
        &self,
        channel_id: &str,
        text: &str,
        username: &str,
    ) -> Result<(), ChatError> {
        let mut params = vec![
            ("channel", channel_id.to_string()),
            ("text", text.to_string()),
        ];
        if !username.is_empty() {
            params.push(("username", username.to_string()));
        }

        self.call("chat.postMessage", params)
            .await
            .map_err(|e| match e {
                ChatError::ApiError { error, .. } => ChatError::PostFailed { reason: error },
                other => other,
            })?;
        Ok(())
    }
}
