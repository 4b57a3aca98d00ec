//! Push feed of inserted safety status rows over Postgres LISTEN/NOTIFY.
//!
//! An insert trigger on `safety_status` publishes each new row as JSON on a
//! notification channel (see the migrations). Each subscription holds its own
//! listener connection and forwards notifications until the receiver is
//! dropped or the connection is lost.

use domain::services::{FeedEvent, FeedStatus, StatusFeed};
use domain::BackendError;
use sqlx::postgres::{PgListener, PgNotification};
use sqlx::PgPool;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use crate::error::backend_error;
use crate::metrics::record_feed_event;

/// Channel the insert trigger notifies on.
pub const DEFAULT_FEED_CHANNEL: &str = "safety_status_inserted";

const FEED_BUFFER: usize = 256;

/// [`StatusFeed`] backed by a dedicated listener connection per subscription.
#[derive(Clone)]
pub struct PgStatusFeed {
    pool: PgPool,
    channel: String,
}

impl PgStatusFeed {
    pub fn new(pool: PgPool, channel: impl Into<String>) -> Self {
        Self {
            pool,
            channel: channel.into(),
        }
    }
}

#[async_trait::async_trait]
impl StatusFeed for PgStatusFeed {
    async fn subscribe(&self) -> Result<mpsc::Receiver<FeedEvent>, BackendError> {
        let mut listener = PgListener::connect_with(&self.pool)
            .await
            .map_err(backend_error)?;
        listener
            .listen(&self.channel)
            .await
            .map_err(backend_error)?;
        info!(channel = %self.channel, "Listening for status inserts");

        let (tx, rx) = mpsc::channel(FEED_BUFFER);
        let _ = tx.try_send(FeedEvent::Status(FeedStatus::Subscribed));
        record_feed_event("subscribed");
        tokio::spawn(forward(listener, tx));

        Ok(rx)
    }
}

async fn forward(mut listener: PgListener, tx: mpsc::Sender<FeedEvent>) {
    loop {
        let received = tokio::select! {
            _ = tx.closed() => {
                debug!("Status feed receiver dropped, closing listener");
                return;
            }
            received = listener.try_recv() => received,
        };

        let event = match received {
            Ok(Some(notification)) => match decode_notification(&notification) {
                Some(payload) => {
                    record_feed_event("insert");
                    FeedEvent::Insert(payload)
                }
                None => continue,
            },
            Ok(None) => {
                record_feed_event("disconnected");
                FeedEvent::Status(FeedStatus::ChannelError(
                    "listener connection lost".to_string(),
                ))
            }
            Err(err) => {
                record_feed_event("error");
                FeedEvent::Status(FeedStatus::ChannelError(err.to_string()))
            }
        };

        let terminal = matches!(event, FeedEvent::Status(_));
        if tx.send(event).await.is_err() || terminal {
            return;
        }
    }
}

fn decode_notification(notification: &PgNotification) -> Option<serde_json::Value> {
    decode_payload(notification.payload())
}

fn decode_payload(payload: &str) -> Option<serde_json::Value> {
    match serde_json::from_str(payload) {
        Ok(value) => Some(value),
        Err(err) => {
            record_feed_event("undecodable");
            warn!(error = %err, "Ignoring undecodable status notification");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_payload() {
        let value = decode_payload(
            r#"{"id":1,"member_id":"6f1c1c7e-5a4b-4a7e-9a53-1f0b1d6c2e11","status":"safe"}"#,
        )
        .unwrap();
        assert_eq!(value["status"], "safe");
        assert_eq!(value["id"], 1);
    }

    #[test]
    fn test_decode_payload_rejects_garbage() {
        assert!(decode_payload("not json").is_none());
        assert!(decode_payload("").is_none());
    }
}
