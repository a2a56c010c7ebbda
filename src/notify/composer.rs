//! Builds signup notification messages.

use std::collections::BTreeSet;

use minijinja::Environment;
use minijinja::Error;
use minijinja::Output;
use minijinja::State;
use minijinja::Value;
use minijinja::context;

use crate::form::FormRow;
use crate::notify::InterestGroupDirectory;
use crate::notify::error::NotifyError;

const TEMPLATE_NAME: &str = "signup";

const SIGNUP_TEMPLATE: &str = "\
New signup: {{ row.first_name }} {{ row.last_name }}{% if row.pronouns %} ({{ row.pronouns }}){% endif %}
*Year:* {{ row.year }}
*Major:* {{ row.major }}
*Interested in:* {{ row.interests }}
*OK to contact:* {{ row.contact_permission }}
*Contact via:* {{ row.contact_channel }}
*Preferred contact method:* {{ row.preferred_contact }}
*Email:* {{ row.email }}
*Phone:* {{ row.phone }}
{%- if row.comments %}
*Questions/Comments:*
{{ row.comments }}
{%- endif %}
Sign up for the mailing list here: {{ signup_url }}";

/// A rendered message body plus the leads it should mention.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Notification {
    pub body: String,
    pub groups: BTreeSet<String>,
    pub lead_emails: BTreeSet<String>,
}

impl Notification {
    /// Prefixes the body with the given mention tokens.
    pub fn render(&self, mentions: &[String]) -> String {
        if mentions.is_empty() {
            self.body.clone()
        } else {
            format!("{}\n{}", mentions.join(" "), self.body)
        }
    }
}

/// Escapes the characters chat markup treats as control sequences, so that
/// form text such as `<!channel>` is shown literally instead of pinging.
pub fn escape_chat_text(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            c => escaped.push(c),
        }
    }
    escaped
}

fn slack_escape_formatter(
    out: &mut Output<'_>,
    _state: &State<'_, '_>,
    value: &Value,
) -> Result<(), Error> {
    out.write_str(&escape_chat_text(&value.to_string()))?;
    Ok(())
}

pub struct NotificationComposer {
    env: Environment<'static>,
    signup_url: String,
}

impl NotificationComposer {
    pub fn new(signup_url: impl Into<String>) -> Result<Self, NotifyError> {
        let mut env = Environment::new();
        env.set_formatter(slack_escape_formatter);
        env.add_template(TEMPLATE_NAME, SIGNUP_TEMPLATE)?;
        Ok(Self {
            env,
            signup_url: signup_url.into(),
        })
    }

    pub fn compose(
        &self,
        row: &FormRow,
        directory: &InterestGroupDirectory,
    ) -> Result<Notification, NotifyError> {
        let body = self
            .env
            .get_template(TEMPLATE_NAME)?
            .render(context! { row => row, signup_url => &self.signup_url })?;

        let groups = directory.select_groups(&row.interests);
        let lead_emails = directory.leads_for(&groups);

        Ok(Notification {
            body,
            groups,
            lead_emails,
        })
    }
}
