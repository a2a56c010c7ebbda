//! Application entry point for signup-sync.
//!
//! Builds all components from the environment and runs one sync batch, or
//! keeps polling when `POLL_INTERVAL` is set.

use std::path::Path;
use std::sync::Arc;
use std::time::Instant;

use anyhow::Result;
use dotenv::dotenv;
use log::debug;
use log::error;
use log::info;
use signup_sync::chat::notifier::ChatNotifier;
use signup_sync::chat::slack::SlackClient;
use signup_sync::checkpoint::CheckpointStore;
use signup_sync::checkpoint::file_store::FileCheckpointStore;
use signup_sync::checkpoint::sheet_store::SheetCellCheckpointStore;
use signup_sync::config::CheckpointBackend;
use signup_sync::config::Config;
use signup_sync::config::NotifyMode;
use signup_sync::credential::CredentialProvider;
use signup_sync::credential::FileTokenProvider;
use signup_sync::credential::StaticTokenProvider;
use signup_sync::form::row_fetcher::RowFetcher;
use signup_sync::logging::setup_logging;
use signup_sync::mailing::mailchimp::MailchimpClient;
use signup_sync::notify::InterestGroupDirectory;
use signup_sync::notify::composer::NotificationComposer;
use signup_sync::service::sync_service::NotificationTarget;
use signup_sync::service::sync_service::Notifications;
use signup_sync::service::sync_service::SyncService;
use signup_sync::sheets::SpreadsheetStore;
use signup_sync::sheets::google_sheets::GoogleSheetsClient;
use signup_sync::task::sync_task::SyncTask;

#[tokio::main]
async fn main() -> Result<()> {
    dotenv().ok();

    let init_start = Instant::now();
    let mut config = Config::new();
    config.load()?;
    let _log_guard = setup_logging(&config)?;
    info!("Starting signup-sync...");

    let service = Arc::new(setup_service(&config)?);
    info!(
        "Setup complete ({:.2}s).",
        init_start.elapsed().as_secs_f64()
    );

    let task = SyncTask::new(service, config.poll_interval);
    if config.poll_interval.is_zero() {
        let report = task.run_once().await?;
        debug!("Run {} report: {:?}", report.run_id, report);
        return Ok(());
    }

    task.run_until(async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!("Failed to listen for Ctrl+C: {e}");
        }
        info!("Ctrl+C received, shutting down.");
    })
    .await;
    Ok(())
}

fn token_provider(token: Option<&str>, path: &Path) -> Arc<dyn CredentialProvider> {
    match token {
        Some(token) => Arc::new(StaticTokenProvider::new(token)),
        None => Arc::new(FileTokenProvider::new(path)),
    }
}

fn setup_service(config: &Config) -> Result<SyncService> {
    debug!("Setting up spreadsheet client...");
    let google_credentials =
        token_provider(config.google_token.as_deref(), &config.google_token_path);
    let sheets: Arc<dyn SpreadsheetStore> = Arc::new(GoogleSheetsClient::new(
        config.sheets_api_url.clone(),
        config.spreadsheet_id.clone(),
        google_credentials,
        config.http_timeout,
    )?);

    let checkpoint: Arc<dyn CheckpointStore> = match &config.checkpoint {
        CheckpointBackend::File(path) => Arc::new(FileCheckpointStore::new(path)),
        CheckpointBackend::SheetCell(cell) => {
            Arc::new(SheetCellCheckpointStore::new(sheets.clone(), cell.clone()))
        }
    };
    info!("Using checkpoint {}", checkpoint.location());

    debug!("Setting up mailing list client...");
    let mailing = Arc::new(MailchimpClient::new(
        config.mailchimp_api_key.clone(),
        config.mailchimp_list_id.clone(),
        config.mailchimp_username.clone(),
        config.mailchimp_api_url.clone(),
        config.http_timeout,
    )?);

    let fetcher = RowFetcher::new(sheets, config.sheet_name.clone());
    let service = SyncService::new(checkpoint, fetcher, mailing, config.max_rows);

    let target = match &config.notify_mode {
        NotifyMode::Off => {
            info!("Chat notifications are disabled.");
            return Ok(service);
        }
        NotifyMode::Channel(name) => NotificationTarget::Channel(name.clone()),
        NotifyMode::Dm => NotificationTarget::GroupDm,
    };

    debug!("Setting up chat notifications...");
    let slack_credentials =
        token_provider(config.slack_token.as_deref(), &config.slack_token_path);
    let slack = Arc::new(SlackClient::new(
        config.slack_api_url.clone(),
        slack_credentials,
        config.slack_channel_types.clone(),
        config.http_timeout,
    )?);
    let directory = InterestGroupDirectory::load(&config.interest_groups_path)?;
    if directory.is_empty() {
        info!("Interest group directory is empty; no leads will be mentioned.");
    }

    Ok(service.with_notifications(Notifications {
        composer: NotificationComposer::new(config.signup_url.clone())?,
        directory,
        notifier: ChatNotifier::new(slack, config.slack_username.clone()),
        target,
    }))
}
