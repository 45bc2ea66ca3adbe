use anyhow::Context;
use async_trait::async_trait;
use tokio::sync::mpsc::UnboundedReceiver;

use crate::models::BookingStatus;

/// Emitted after a status-update transaction commits. Delivery never
/// affects the committed booking.
#[derive(Debug, Clone)]
pub struct StatusChangeEvent {
    pub booking_id: String,
    pub user_id: Option<String>,
    pub status: BookingStatus,
}

#[async_trait]
pub trait BotNotifier: Send + Sync {
    async fn notify(&self, event: &StatusChangeEvent) -> anyhow::Result<()>;
}

/// Posts status changes to the chat/bot service.
pub struct HttpBotNotifier {
    base_url: String,
    client: reqwest::Client,
}

impl HttpBotNotifier {
    pub fn new(base_url: String) -> Self {
        Self {
            base_url,
            client: reqwest::Client::new(),
        }
    }
}

#[async_trait]
impl BotNotifier for HttpBotNotifier {
    async fn notify(&self, event: &StatusChangeEvent) -> anyhow::Result<()> {
        anyhow::ensure!(!self.base_url.is_empty(), "BOT_SERVICE_URL is not configured");

        self.client
            .post(format!("{}/booking-status", self.base_url))
            .json(&serde_json::json!({
                "booking_id": event.booking_id,
                "user_id": event.user_id,
                "status": event.status.as_str(),
            }))
            .send()
            .await
            .context("failed to reach bot service")?
            .error_for_status()
            .context("bot service returned error")?;

        Ok(())
    }
}

const MAX_ATTEMPTS: u32 = 3;

/// Drains the event queue, retrying each delivery a few times before
/// giving up with a log line.
pub fn spawn_notifier(
    mut rx: UnboundedReceiver<StatusChangeEvent>,
    notifier: Box<dyn BotNotifier>,
) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        while let Some(event) = rx.recv().await {
            let mut delivered = false;
            for attempt in 1..=MAX_ATTEMPTS {
                match notifier.notify(&event).await {
                    Ok(()) => {
                        delivered = true;
                        break;
                    }
                    Err(e) => {
                        tracing::warn!(
                            "bot notification attempt {attempt}/{MAX_ATTEMPTS} failed for booking {}: {e:#}",
                            event.booking_id
                        );
                        if attempt < MAX_ATTEMPTS {
                            tokio::time::sleep(std::time::Duration::from_secs(2 * attempt as u64))
                                .await;
                        }
                    }
                }
            }
            if !delivered {
                tracing::error!(
                    "giving up on bot notification for booking {} (status {})",
                    event.booking_id,
                    event.status.as_str()
                );
            }
        }
    })
}
