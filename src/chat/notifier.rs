//! High-level chat operations built from [`ChatApi`] calls.

use std::collections::HashSet;
use std::sync::Arc;

use futures::Stream;
use futures::StreamExt;
use futures::stream::unfold;
use log::debug;
use log::info;
use log::warn;

use crate::chat::ChannelId;
use crate::chat::ChannelPage;
use crate::chat::ChatApi;
use crate::chat::UserId;
use crate::chat::error::ChatError;

/// Upper bound on listing calls for one channel lookup.
pub const MAX_CHANNEL_PAGES: usize = 500;

enum Cursor {
    Start,
    Next(String),
    Done,
}

struct PageWalk {
    api: Arc<dyn ChatApi>,
    cursor: Cursor,
    fetched: usize,
    seen: HashSet<String>,
}

pub struct ChatNotifier {
    api: Arc<dyn ChatApi>,
    /// Name shown as the sender of posted messages.
    pub display_name: String,
}

impl ChatNotifier {
    pub fn new(api: Arc<dyn ChatApi>, display_name: impl Into<String>) -> Self {
        Self {
            api,
            display_name: display_name.into(),
        }
    }

    pub async fn resolve_user(&self, email: &str) -> Result<UserId, ChatError> {
        debug!("Resolving chat user for {email}");
        self.api.lookup_user_by_email(email).await
    }

    /// Lazily walks the channel listing.
    ///
    /// The stream ends after the page whose cursor is empty or absent, after
    /// the first error, when a cursor repeats, or after [`MAX_CHANNEL_PAGES`].
    pub fn channel_pages(&self) -> impl Stream<Item = Result<ChannelPage, ChatError>> + Send {
        let walk = PageWalk {
            api: self.api.clone(),
            cursor: Cursor::Start,
            fetched: 0,
            seen: HashSet::new(),
        };

        unfold(walk, |mut walk| async move {
            let cursor = match std::mem::replace(&mut walk.cursor, Cursor::Done) {
                Cursor::Done => return None,
                Cursor::Start => None,
                Cursor::Next(cursor) => Some(cursor),
            };
            if walk.fetched >= MAX_CHANNEL_PAGES {
                warn!("Stopped channel listing after {MAX_CHANNEL_PAGES} pages.");
                return None;
            }
            walk.fetched += 1;

            match walk.api.list_channels(cursor).await {
                Ok(page) => {
                    let next = page
                        .next_cursor
                        .as_deref()
                        .map(str::trim)
                        .filter(|c| !c.is_empty())
                        .map(str::to_string);
                    walk.cursor = match next {
                        Some(next) if walk.seen.insert(next.clone()) => Cursor::Next(next),
                        Some(next) => {
                            warn!("Channel listing repeated cursor `{next}`, stopping.");
                            Cursor::Done
                        }
                        None => Cursor::Done,
                    };
                    Some((Ok(page), walk))
                }
                Err(e) => Some((Err(e), walk)),
            }
        })
    }

    /// Finds a channel by name, with or without a leading `#`.
    pub async fn resolve_channel(&self, name: &str) -> Result<ChannelId, ChatError> {
        let name = name.trim_start_matches('#');
        let mut pages = Box::pin(self.channel_pages());

        while let Some(page) = pages.next().await {
            let page = page?;
            if let Some(channel) = page.channels.iter().find(|c| c.name == name) {
                debug!("Resolved channel #{name} to {}", channel.id);
                return Ok(channel.id.clone());
            }
        }

        Err(ChatError::ChannelNotFound {
            name: name.to_string(),
        })
    }

    pub async fn post(
        &self,
        channel_id: &str,
        text: &str,
        display_name: &str,
    ) -> Result<(), ChatError> {
        self.api.post_message(channel_id, text, display_name).await?;
        info!("Posted message to {channel_id}");
        Ok(())
    }

    pub async fn open_group_dm(&self, user_ids: Vec<UserId>) -> Result<ChannelId, ChatError> {
        self.api.open_conversation(user_ids).await
    }

    pub async fn post_in_channel(&self, channel_name: &str, text: &str) -> Result<(), ChatError> {
        let channel_id = self.resolve_channel(channel_name).await?;
        self.post(&channel_id, text, &self.display_name).await
    }

    pub async fn send_dm(&self, emails: &[String], text: &str) -> Result<(), ChatError> {
        let mut user_ids = Vec::with_capacity(emails.len());
        for email in emails {
            user_ids.push(self.resolve_user(email).await?);
        }
        let channel_id = self.open_group_dm(user_ids).await?;
        self.post(&channel_id, text, &self.display_name).await
    }
}
