use anyhow::{Context, Result};
use chrono::Utc;
use reqwest::Client;
use serde::Serialize;
use std::time::Duration;

const REQUEST_TIMEOUT: Duration = Duration::from_secs(5);
const FOOTER_TEXT: &str = "🔐 flixgate logs";

pub const COLOR_LOGIN: u32 = 0x00c853;
pub const COLOR_LOGOUT: u32 = 0xe53935;
pub const COLOR_SUGGESTION: u32 = 0xffd700;

#[derive(Debug, Serialize)]
struct WebhookPayload {
    embeds: [Embed; 1],
}

#[derive(Debug, Serialize)]
struct Embed {
    title: String,
    description: String,
    color: u32,
    footer: Footer,
    timestamp: String,
}

#[derive(Debug, Serialize)]
struct Footer {
    text: &'static str,
}

/// Best-effort Discord webhook notifier. Event logs (logins, logouts) are
/// dispatched on a detached task and never touch the request's outcome;
/// only the suggestion flow awaits delivery because its response reports it.
#[derive(Clone)]
pub struct Notifier {
    client: Client,
    logs_url: Option<String>,
    suggestions_url: Option<String>,
}

impl Notifier {
    pub fn new(logs_url: Option<String>, suggestions_url: Option<String>) -> Self {
        Self {
            client: Client::builder()
                .timeout(REQUEST_TIMEOUT)
                .build()
                .unwrap_or_else(|_| Client::new()),
            logs_url,
            suggestions_url,
        }
    }

    /// Fire-and-forget event log. Failures are logged and dropped.
    pub fn dispatch(&self, title: &str, description: &str, color: u32) {
        let Some(url) = self.logs_url.clone() else {
            return;
        };
        let client = self.client.clone();
        let payload = build_payload(title, description, color);

        tokio::spawn(async move {
            if let Err(e) = post(&client, &url, &payload).await {
                tracing::warn!("Webhook delivery failed: {:#}", e);
            }
        });
    }

    /// The suggestion channel, falling back to the log channel when unset.
    pub fn suggestion_target(&self) -> Option<String> {
        self.suggestions_url
            .clone()
            .or_else(|| self.logs_url.clone())
    }

    /// Awaited delivery for the suggestion endpoint. Returns whether the
    /// webhook accepted the message.
    pub async fn send_suggestion(&self, description: &str) -> bool {
        let Some(url) = self.suggestion_target() else {
            return false;
        };
        let payload = build_payload("💡 New suggestion", description, COLOR_SUGGESTION);

        match post(&self.client, &url, &payload).await {
            Ok(()) => true,
            Err(e) => {
                tracing::warn!("Suggestion webhook failed: {:#}", e);
                false
            }
        }
    }
}

fn build_payload(title: &str, description: &str, color: u32) -> WebhookPayload {
    WebhookPayload {
        embeds: [Embed {
            title: title.to_string(),
            description: description.to_string(),
            color,
            footer: Footer { text: FOOTER_TEXT },
            timestamp: Utc::now().to_rfc3339(),
        }],
    }
}

async fn post(client: &Client, url: &str, payload: &WebhookPayload) -> Result<()> {
    client
        .post(url)
        .json(payload)
        .send()
        .await
        .context("Failed to reach webhook")?
        .error_for_status()
        .context("Webhook rejected the payload")?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_payload_shape() {
        let payload = build_payload("🔗 New login", "`alice` is now online.", COLOR_LOGIN);
        let value = serde_json::to_value(&payload).unwrap();

        let embed = &value["embeds"][0];
        assert_eq!(embed["title"], "🔗 New login");
        assert_eq!(embed["description"], "`alice` is now online.");
        assert_eq!(embed["color"], COLOR_LOGIN);
        assert_eq!(embed["footer"]["text"], FOOTER_TEXT);
        assert!(embed["timestamp"].is_string());
    }

    #[test]
    fn test_suggestion_target_falls_back_to_logs() {
        let both = Notifier::new(Some("logs".into()), Some("suggestions".into()));
        assert_eq!(both.suggestion_target().as_deref(), Some("suggestions"));

        let logs_only = Notifier::new(Some("logs".into()), None);
        assert_eq!(logs_only.suggestion_target().as_deref(), Some("logs"));

        let neither = Notifier::new(None, None);
        assert!(neither.suggestion_target().is_none());
    }
}
