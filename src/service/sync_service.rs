//! One checkpointed sync run: fetch new rows, subscribe, notify, advance.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::DateTime;
use chrono::Utc;
use log::debug;
use log::error;
use log::info;
use log::warn;
use tracing::Instrument;
use uuid::Uuid;

use crate::chat::ChannelId;
use crate::chat::UserId;
use crate::chat::error::ChatError;
use crate::chat::mention_token;
use crate::chat::notifier::ChatNotifier;
use crate::checkpoint::Checkpoint;
use crate::checkpoint::CheckpointStore;
use crate::form::FormRow;
use crate::form::row_fetcher::RowFetcher;
use crate::mailing::MailingList;
use crate::mailing::RejectReason;
use crate::mailing::SubscribeOutcome;
use crate::mailing::Subscriber;
use crate::notify::InterestGroupDirectory;
use crate::notify::composer::NotificationComposer;
use crate::service::error::SyncError;

/// Where a signup notification is delivered.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum NotificationTarget {
    /// Post into a channel, resolved by name once per run.
    Channel(String),
    /// Group DM with the leads of the row's interest groups. Rows matching no
    /// group are not announced.
    GroupDm,
}

pub struct Notifications {
    pub composer: NotificationComposer,
    pub directory: InterestGroupDirectory,
    pub notifier: ChatNotifier,
    pub target: NotificationTarget,
}

/// Chat lookups memoized for the duration of one run.
#[derive(Default)]
struct RunCache {
    users: HashMap<String, UserId>,
    channel: Option<ChannelId>,
}

impl RunCache {
    async fn user(&mut self, notifier: &ChatNotifier, email: &str) -> Result<UserId, ChatError> {
        if let Some(id) = self.users.get(email) {
            return Ok(id.clone());
        }
        let id = notifier.resolve_user(email).await?;
        self.users.insert(email.to_string(), id.clone());
        Ok(id)
    }

    async fn channel(
        &mut self,
        notifier: &ChatNotifier,
        name: &str,
    ) -> Result<ChannelId, ChatError> {
        if let Some(id) = &self.channel {
            return Ok(id.clone());
        }
        let id = notifier.resolve_channel(name).await?;
        self.channel = Some(id.clone());
        Ok(id)
    }
}

impl Notifications {
    /// Composes and sends the notification for one row. Returns whether a
    /// message was posted.
    async fn deliver(&self, row: &FormRow, cache: &mut RunCache) -> Result<bool, SyncError> {
        let notification = self.composer.compose(row, &self.directory)?;
        if notification.groups.is_empty() {
            debug!("{} matched no interest group.", row.email);
        } else {
            info!(
                "{} matched interest groups: {}",
                row.email,
                notification
                    .groups
                    .iter()
                    .map(String::as_str)
                    .collect::<Vec<_>>()
                    .join(", ")
            );
        }

        let mut user_ids = Vec::with_capacity(notification.lead_emails.len());
        for email in &notification.lead_emails {
            user_ids.push(cache.user(&self.notifier, email).await?);
        }
        let mentions: Vec<String> = user_ids.iter().map(|id| mention_token(id)).collect();
        let text = notification.render(&mentions);

        let channel_id = match &self.target {
            NotificationTarget::Channel(name) => cache.channel(&self.notifier, name).await?,
            NotificationTarget::GroupDm => {
                if user_ids.is_empty() {
                    debug!("No leads to message for {}, skipping DM.", row.email);
                    return Ok(false);
                }
                self.notifier.open_group_dm(user_ids).await?
            }
        };

        self.notifier
            .post(&channel_id, &text, &self.notifier.display_name)
            .await?;
        Ok(true)
    }
}

/// What a run did.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SyncReport {
    pub run_id: Uuid,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    pub start_checkpoint: Checkpoint,
    pub end_checkpoint: Checkpoint,
    pub rows_fetched: usize,
    pub added: usize,
    pub already_subscribed: usize,
    pub rejected: usize,
    pub transport_errors: usize,
    pub malformed: usize,
    pub notifications_sent: usize,
}

impl SyncReport {
    fn new(run_id: Uuid, start_checkpoint: Checkpoint) -> Self {
        let now = Utc::now();
        Self {
            run_id,
            started_at: now,
            finished_at: now,
            start_checkpoint,
            end_checkpoint: start_checkpoint,
            rows_fetched: 0,
            added: 0,
            already_subscribed: 0,
            rejected: 0,
            transport_errors: 0,
            malformed: 0,
            notifications_sent: 0,
        }
    }

    fn record(&mut self, outcome: &SubscribeOutcome) {
        match outcome {
            SubscribeOutcome::Added => self.added += 1,
            SubscribeOutcome::Rejected(RejectReason::AlreadySubscribed) => {
                self.already_subscribed += 1
            }
            SubscribeOutcome::Rejected(RejectReason::Other(_)) => self.rejected += 1,
            SubscribeOutcome::TransportError(_) => self.transport_errors += 1,
        }
    }

    pub fn summary(&self) -> String {
        format!(
            "{} rows (rows {}..{}): {} added, {} already subscribed, {} rejected, \
             {} transport errors, {} malformed, {} notifications",
            self.rows_fetched,
            self.start_checkpoint,
            self.end_checkpoint,
            self.added,
            self.already_subscribed,
            self.rejected,
            self.transport_errors,
            self.malformed,
            self.notifications_sent
        )
    }
}

pub struct SyncService {
    checkpoint: Arc<dyn CheckpointStore>,
    fetcher: RowFetcher,
    mailing: Arc<dyn MailingList>,
    notifications: Option<Notifications>,
    max_rows: u64,
}

impl SyncService {
    pub fn new(
        checkpoint: Arc<dyn CheckpointStore>,
        fetcher: RowFetcher,
        mailing: Arc<dyn MailingList>,
        max_rows: u64,
    ) -> Self {
        Self {
            checkpoint,
            fetcher,
            mailing,
            notifications: None,
            max_rows,
        }
    }

    pub fn with_notifications(mut self, notifications: Notifications) -> Self {
        self.notifications = Some(notifications);
        self
    }

    /// Processes the next batch.
    ///
    /// Mailing-list failures are recorded per row and never stop the batch.
    /// Any other failure aborts the run with the checkpoint untouched, so the
    /// next run retries the whole batch.
    pub async fn run_once(&self) -> Result<SyncReport, SyncError> {
        let run_id = Uuid::new_v4();
        self.run(run_id)
            .instrument(tracing::info_span!("sync_run", %run_id))
            .await
    }

    async fn run(&self, run_id: Uuid) -> Result<SyncReport, SyncError> {
        let offset = self.checkpoint.read().await?;
        debug!("Starting at row {offset} from {}", self.checkpoint.location());
        let mut report = SyncReport::new(run_id, offset);

        let batch = self
            .fetcher
            .fetch(offset, self.max_rows)
            .await
            .map_err(SyncError::FetchFailed)?;

        if batch.is_empty() {
            info!("No new subscribers");
            report.finished_at = Utc::now();
            return Ok(report);
        }
        report.rows_fetched = batch.len();

        let mut cache = RunCache::default();
        for (i, row) in batch.rows.iter().enumerate() {
            let row_number = offset + i as u64;
            let row = match row {
                Ok(row) => row,
                Err(e) => {
                    warn!("Skipping malformed row {row_number}: {e}");
                    report.malformed += 1;
                    continue;
                }
            };

            let outcome = self.subscribe(row).await;
            report.record(&outcome);

            if let Some(notifications) = &self.notifications
                && notifications.deliver(row, &mut cache).await?
            {
                report.notifications_sent += 1;
            }
        }

        report.end_checkpoint = self
            .checkpoint
            .advance_from(offset, batch.len() as u64)
            .await?;
        report.finished_at = Utc::now();
        info!("Finished adding subscribers: {}", report.summary());
        Ok(report)
    }

    async fn subscribe(&self, row: &FormRow) -> SubscribeOutcome {
        let subscriber = Subscriber::from(row);
        let outcome = self.mailing.add_subscriber(&subscriber).await;
        match &outcome {
            SubscribeOutcome::Added => {
                info!("Successfully added new subscriber: {}", subscriber.email)
            }
            SubscribeOutcome::Rejected(RejectReason::AlreadySubscribed) => {
                info!("{} is already subscribed", subscriber.email)
            }
            SubscribeOutcome::Rejected(reason) => {
                warn!("Failed to add new subscriber {}: {reason}", subscriber.email)
            }
            SubscribeOutcome::TransportError(message) => {
                error!("Failed to reach mailing list for {}: {message}", subscriber.email)
            }
        }
        outcome
    }
}
