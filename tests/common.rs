//! Common test utilities and in-memory fakes of the external services.

use std::collections::HashMap;
use std::collections::VecDeque;
use std::sync::Arc;
use std::sync::RwLock;

use async_trait::async_trait;
use signup_sync::chat::ChannelId;
use signup_sync::chat::ChannelPage;
use signup_sync::chat::ChatApi;
use signup_sync::chat::UserId;
use signup_sync::chat::error::ChatError;
use signup_sync::checkpoint::Checkpoint;
use signup_sync::checkpoint::CheckpointStore;
use signup_sync::checkpoint::error::CheckpointError;
use signup_sync::mailing::MailingList;
use signup_sync::mailing::SubscribeOutcome;
use signup_sync::mailing::Subscriber;
use signup_sync::sheets::CellBlock;
use signup_sync::sheets::SpreadsheetStore;
use signup_sync::sheets::error::SheetsError;

/// Builds a raw form row.
#[allow(dead_code)]
pub fn row_cells(first_name: &str, email: &str, interests: &str, comments: &str) -> Vec<String> {
    [
        "10/1/2026 9:00:00",
        first_name,
        "Tester",
        "they/them",
        "2028",
        "Biology",
        interests,
        "Yes",
        email,
        "555-0100",
        comments,
    ]
    .iter()
    .map(|s| s.to_string())
    .collect()
}

// MOCK SPREADSHEET

#[derive(Default)]
#[allow(dead_code)]
pub struct MockSheet {
    pub state: RwLock<MockSheetState>,
}

#[derive(Default)]
#[allow(dead_code)]
pub struct MockSheetState {
    pub ranges: HashMap<String, CellBlock>,
    pub reads: Vec<String>,
    pub fail_reads: bool,
}

#[allow(dead_code)]
impl MockSheet {
    pub fn with_range(range: &str, values: CellBlock) -> Arc<Self> {
        let sheet = Self::default();
        sheet
            .state
            .write()
            .unwrap()
            .ranges
            .insert(range.to_string(), values);
        Arc::new(sheet)
    }

    pub fn set_fail_reads(&self, fail: bool) {
        self.state.write().unwrap().fail_reads = fail;
    }

    pub fn reads(&self) -> Vec<String> {
        self.state.read().unwrap().reads.clone()
    }
}

#[async_trait]
impl SpreadsheetStore for MockSheet {
    async fn get_range(&self, range: &str) -> Result<CellBlock, SheetsError> {
        let mut state = self.state.write().unwrap();
        state.reads.push(range.to_string());
        if state.fail_reads {
            return Err(SheetsError::ApiError {
                status: 503,
                message: "backend unavailable".to_string(),
            });
        }
        Ok(state.ranges.get(range).cloned().unwrap_or_default())
    }

    async fn update_range(&self, range: &str, values: CellBlock) -> Result<(), SheetsError> {
        self.state
            .write()
            .unwrap()
            .ranges
            .insert(range.to_string(), values);
        Ok(())
    }
}

// MOCK CHECKPOINT

#[allow(dead_code)]
pub struct MockCheckpoint {
    pub value: RwLock<Option<Checkpoint>>,
    pub reads: RwLock<usize>,
    pub writes: RwLock<usize>,
}

#[allow(dead_code)]
impl MockCheckpoint {
    pub fn new(value: Option<Checkpoint>) -> Arc<Self> {
        Arc::new(Self {
            value: RwLock::new(value),
            reads: RwLock::new(0),
            writes: RwLock::new(0),
        })
    }

    pub fn value(&self) -> Option<Checkpoint> {
        *self.value.read().unwrap()
    }

    pub fn reads(&self) -> usize {
        *self.reads.read().unwrap()
    }

    pub fn writes(&self) -> usize {
        *self.writes.read().unwrap()
    }
}

#[async_trait]
impl CheckpointStore for MockCheckpoint {
    async fn read(&self) -> Result<Checkpoint, CheckpointError> {
        *self.reads.write().unwrap() += 1;
        self.value()
            .ok_or_else(|| CheckpointError::Unavailable {
                location: self.location(),
                reason: "empty".to_string(),
            })
    }

    async fn write(&self, value: Checkpoint) -> Result<(), CheckpointError> {
        *self.value.write().unwrap() = Some(value);
        *self.writes.write().unwrap() += 1;
        Ok(())
    }

    fn location(&self) -> String {
        "memory".to_string()
    }
}

// MOCK MAILING LIST

#[derive(Default)]
#[allow(dead_code)]
pub struct MockMailingList {
    pub state: RwLock<MockMailingState>,
}

#[derive(Default)]
#[allow(dead_code)]
pub struct MockMailingState {
    /// Returned in order; `Added` once exhausted.
    pub outcomes: VecDeque<SubscribeOutcome>,
    pub calls: Vec<Subscriber>,
}

#[allow(dead_code)]
impl MockMailingList {
    pub fn with_outcomes(outcomes: Vec<SubscribeOutcome>) -> Arc<Self> {
        let mailing = Self::default();
        mailing.state.write().unwrap().outcomes = outcomes.into();
        Arc::new(mailing)
    }

    pub fn calls(&self) -> Vec<Subscriber> {
        self.state.read().unwrap().calls.clone()
    }
}

#[async_trait]
impl MailingList for MockMailingList {
    async fn add_subscriber(&self, subscriber: &Subscriber) -> SubscribeOutcome {
        let mut state = self.state.write().unwrap();
        state.calls.push(subscriber.clone());
        state.outcomes.pop_front().unwrap_or(SubscribeOutcome::Added)
    }
}

// MOCK CHAT

#[derive(Default)]
#[allow(dead_code)]
pub struct MockChat {
    pub state: RwLock<MockChatState>,
}

#[derive(Default, Clone)]
#[allow(dead_code)]
pub struct MockChatState {
    pub users: HashMap<String, UserId>,
    /// Page `i` is returned for cursor `p{i}`; page 0 for no cursor.
    pub pages: Vec<ChannelPage>,
    pub fail_posts: bool,
    pub lookups: Vec<String>,
    pub list_calls: usize,
    pub opened: Vec<Vec<UserId>>,
    pub posts: Vec<(ChannelId, String, String)>,
}

#[allow(dead_code)]
impl MockChat {
    pub fn new(users: &[(&str, &str)], pages: Vec<ChannelPage>) -> Arc<Self> {
        let chat = Self::default();
        {
            let mut state = chat.state.write().unwrap();
            state.users = users
                .iter()
                .map(|(email, id)| (email.to_string(), id.to_string()))
                .collect();
            state.pages = pages;
        }
        Arc::new(chat)
    }

    pub fn set_fail_posts(&self, fail: bool) {
        self.state.write().unwrap().fail_posts = fail;
    }

    pub fn snapshot(&self) -> MockChatState {
        self.state.read().unwrap().clone()
    }
}

#[async_trait]
impl ChatApi for MockChat {
    async fn lookup_user_by_email(&self, email: &str) -> Result<UserId, ChatError> {
        let mut state = self.state.write().unwrap();
        state.lookups.push(email.to_string());
        state
            .users
            .get(email)
            .cloned()
            .ok_or_else(|| ChatError::UserNotFound {
                email: email.to_string(),
            })
    }

    async fn list_channels(&self, cursor: Option<String>) -> Result<ChannelPage, ChatError> {
        let mut state = self.state.write().unwrap();
        state.list_calls += 1;
        let index = match cursor {
            None => 0,
            Some(cursor) => cursor
                .trim_start_matches('p')
                .parse::<usize>()
                .map_err(|_| ChatError::ApiError {
                    method: "conversations.list".to_string(),
                    error: "invalid_cursor".to_string(),
                })?,
        };
        Ok(state.pages.get(index).cloned().unwrap_or_default())
    }

    async fn open_conversation(&self, user_ids: Vec<UserId>) -> Result<ChannelId, ChatError> {
        let mut state = self.state.write().unwrap();
        let id = format!("D{}", state.opened.len() + 1);
        state.opened.push(user_ids);
        Ok(id)
    }

    async fn post_message(
        &self,
        channel_id: &str,
        text: &str,
        username: &str,
    ) -> Result<(), ChatError> {
        let mut state = self.state.write().unwrap();
        if state.fail_posts {
            return Err(ChatError::PostFailed {
                reason: "channel_not_found".to_string(),
            });
        }
        state
            .posts
            .push((channel_id.to_string(), text.to_string(), username.to_string()));
        Ok(())
    }
}
