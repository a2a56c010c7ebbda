//! Mailing-list subscription.

use std::fmt;

use async_trait::async_trait;

use crate::form::FormRow;

pub mod error;
pub mod mailchimp;

/// A new list member derived from a form row.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Subscriber {
    /// Unique key on the mailing-list side.
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub phone: String,
}

impl From<&FormRow> for Subscriber {
    fn from(row: &FormRow) -> Self {
        Self {
            email: row.email.clone(),
            first_name: row.first_name.clone(),
            last_name: row.last_name.clone(),
            phone: row.phone.clone(),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum RejectReason {
    /// The address is already on the list. Expected whenever someone fills
    /// in the form twice.
    AlreadySubscribed,
    Other(String),
}

impl fmt::Display for RejectReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RejectReason::AlreadySubscribed => write!(f, "already subscribed"),
            RejectReason::Other(detail) => write!(f, "{detail}"),
        }
    }
}

/// Result of one subscribe call. None of these stop a batch.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SubscribeOutcome {
    Added,
    Rejected(RejectReason),
    TransportError(String),
}

#[async_trait]
pub trait MailingList: Send + Sync {
    /// Adds one subscriber. Every call is a mutating request; retries
    /// rely on the service rejecting duplicate addresses.
    async fn add_subscriber(&self, subscriber: &Subscriber) -> SubscribeOutcome;
}
