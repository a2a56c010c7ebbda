//! Group chat notifications.

use async_trait::async_trait;

use crate::chat::error::ChatError;

pub mod error;
pub mod notifier;
pub mod slack;

pub type UserId = String;
pub type ChannelId = String;

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Channel {
    pub id: ChannelId,
    pub name: String,
}

/// One page of a cursor-paginated channel listing.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ChannelPage {
    pub channels: Vec<Channel>,
    /// Empty or absent when this is the last page.
    pub next_cursor: Option<String>,
}

/// Raw chat service calls. Each maps to exactly one request.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ChatApi: Send + Sync {
    async fn lookup_user_by_email(&self, email: &str) -> Result<UserId, ChatError>;

    async fn list_channels(&self, cursor: Option<String>) -> Result<ChannelPage, ChatError>;

    /// Opens, or reuses, a DM with all of `user_ids`.
    async fn open_conversation(&self, user_ids: Vec<UserId>) -> Result<ChannelId, ChatError>;

    async fn post_message(
        &self,
        channel_id: &str,
        text: &str,
        username: &str,
    ) -> Result<(), ChatError>;
}

/// Formats a user reference the chat client renders as an @-mention.
pub fn mention_token(user_id: &str) -> String {
    format!("<@{user_id}>")
}
