//! Runtime configuration loaded from environment variables.

use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use crate::error::AppError;

/// Where the processed-row offset is persisted.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum CheckpointBackend {
    /// A local file holding a single integer.
    File(PathBuf),
    /// A reserved cell of the form-response spreadsheet, e.g. `Checkpoint!A1`.
    SheetCell(String),
}

/// How new signups are announced in chat.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum NotifyMode {
    Off,
    /// Post into the named channel.
    Channel(String),
    /// Open a group DM with the leads of the matched interest groups.
    Dm,
}

#[derive(Clone, Debug)]
pub struct Config {
    pub spreadsheet_id: String,
    pub sheet_name: String,
    pub sheets_api_url: String,
    pub google_token_path: PathBuf,
    /// Takes precedence over `google_token_path` when set.
    pub google_token: Option<String>,
    pub max_rows: u64,
    pub checkpoint: CheckpointBackend,
    pub mailchimp_api_key: String,
    pub mailchimp_list_id: String,
    pub mailchimp_username: String,
    pub mailchimp_api_url: Option<String>,
    pub notify_mode: NotifyMode,
    pub slack_token_path: PathBuf,
    /// Takes precedence over `slack_token_path` when set.
    pub slack_token: Option<String>,
    pub slack_api_url: String,
    pub slack_channel_types: String,
    pub slack_username: String,
    pub interest_groups_path: PathBuf,
    pub signup_url: String,
    /// Zero means run a single batch and exit.
    pub poll_interval: Duration,
    pub http_timeout: Duration,
    pub logs_path: PathBuf,
}

impl Config {
    pub fn new() -> Self {
        Self {
            spreadsheet_id: String::new(),
            sheet_name: "Form Responses 1".to_string(),
            sheets_api_url: "https://sheets.googleapis.com/v4".to_string(),
            google_token_path: PathBuf::from("google_token.txt"),
            google_token: None,
            max_rows: 100,
            checkpoint: CheckpointBackend::File(PathBuf::from("offset.txt")),
            mailchimp_api_key: String::new(),
            mailchimp_list_id: String::new(),
            mailchimp_username: "signup-sync".to_string(),
            mailchimp_api_url: None,
            notify_mode: NotifyMode::Off,
            slack_token_path: PathBuf::from("slack_token.txt"),
            slack_token: None,
            slack_api_url: "https://slack.com".to_string(),
            slack_channel_types: "private_channel".to_string(),
            slack_username: "Signup Bot".to_string(),
            interest_groups_path: PathBuf::from("interest_groups.json"),
            signup_url: String::new(),
            poll_interval: Duration::ZERO,
            http_timeout: Duration::from_secs(30),
            logs_path: PathBuf::from("logs"),
        }
    }

    /// Loads the configuration from the process environment.
    pub fn load(&mut self) -> Result<(), AppError> {
        self.load_from(|key| std::env::var(key).ok())
    }

    /// Loads the configuration from an arbitrary key lookup.
    ///
    /// Blank values are treated as unset.
    pub fn load_from<F>(&mut self, lookup: F) -> Result<(), AppError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| {
            lookup(key)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };
        let require = |key: &str| {
            get(key).ok_or_else(|| AppError::MissingConfig {
                key: key.to_string(),
            })
        };

        self.spreadsheet_id = require("SPREADSHEET_ID")?;
        self.mailchimp_api_key = require("MAILCHIMP_API_KEY")?;
        self.mailchimp_list_id = require("MAILCHIMP_LIST_ID")?;

        if let Some(v) = get("SHEET_NAME") {
            self.sheet_name = v;
        }
        if let Some(v) = get("SHEETS_API_URL") {
            self.sheets_api_url = v.trim_end_matches('/').to_string();
        }
        if let Some(v) = get("GOOGLE_TOKEN_PATH") {
            self.google_token_path = PathBuf::from(v);
        }
        self.google_token = get("GOOGLE_ACCESS_TOKEN");
        if let Some(v) = get("MAX_ROWS") {
            self.max_rows = parse_value("MAX_ROWS", &v)?;
            if self.max_rows == 0 {
                return Err(AppError::InvalidConfig {
                    key: "MAX_ROWS".to_string(),
                    value: v,
                    reason: "must be at least 1".to_string(),
                });
            }
        }

        self.checkpoint = match get("CHECKPOINT_BACKEND").as_deref() {
            None | Some("file") => CheckpointBackend::File(
                get("CHECKPOINT_PATH")
                    .map(PathBuf::from)
                    .unwrap_or_else(|| PathBuf::from("offset.txt")),
            ),
            Some("sheet") => CheckpointBackend::SheetCell(
                get("CHECKPOINT_CELL").unwrap_or_else(|| "Checkpoint!A1".to_string()),
            ),
            Some(other) => {
                return Err(AppError::InvalidConfig {
                    key: "CHECKPOINT_BACKEND".to_string(),
                    value: other.to_string(),
                    reason: "expected `file` or `sheet`".to_string(),
                });
            }
        };

        if let Some(v) = get("MAILCHIMP_USERNAME") {
            self.mailchimp_username = v;
        }
        self.mailchimp_api_url = get("MAILCHIMP_API_URL")
            .map(|v| v.trim_end_matches('/').to_string());

        self.notify_mode = match get("NOTIFY_MODE").as_deref() {
            None | Some("off") => NotifyMode::Off,
            Some("channel") => NotifyMode::Channel(require("SLACK_CHANNEL")?),
            Some("dm") => NotifyMode::Dm,
            Some(other) => {
                return Err(AppError::InvalidConfig {
                    key: "NOTIFY_MODE".to_string(),
                    value: other.to_string(),
                    reason: "expected `off`, `channel` or `dm`".to_string(),
                });
            }
        };
        if self.notify_mode != NotifyMode::Off {
            self.signup_url = require("SIGNUP_URL")?;
        }

        if let Some(v) = get("SLACK_TOKEN_PATH") {
            self.slack_token_path = PathBuf::from(v);
        }
        self.slack_token = get("SLACK_TOKEN");
        if let Some(v) = get("SLACK_API_URL") {
            self.slack_api_url = v.trim_end_matches('/').to_string();
        }
        if let Some(v) = get("SLACK_CHANNEL_TYPES") {
            self.slack_channel_types = v;
        }
        if let Some(v) = get("SLACK_USERNAME") {
            self.slack_username = v;
        }
        if let Some(v) = get("INTEREST_GROUPS_PATH") {
            self.interest_groups_path = PathBuf::from(v);
        }
        if let Some(v) = get("POLL_INTERVAL") {
            self.poll_interval = Duration::from_secs(parse_value("POLL_INTERVAL", &v)?);
        }
        if let Some(v) = get("HTTP_TIMEOUT") {
            self.http_timeout = Duration::from_secs(parse_value("HTTP_TIMEOUT", &v)?);
        }
        if let Some(v) = get("LOGS_PATH") {
            self.logs_path = PathBuf::from(v);
        }

        Ok(())
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::new()
    }
}

fn parse_value<T>(key: &str, value: &str) -> Result<T, AppError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    value.parse::<T>().map_err(|e| AppError::InvalidConfig {
        key: key.to_string(),
        value: value.to_string(),
        reason: e.to_string(),
    })
}
