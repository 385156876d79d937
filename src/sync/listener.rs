//! Postgres LISTEN bridge.
//!
//! The store's schema installs pg_notify triggers (schema.sql) so every
//! row change lands on a per-table channel. This task forwards those
//! notifications onto the in-process bus, which is how edits made by the
//! other reader's session invalidate this one's cache.

use sqlx::postgres::PgListener;
use std::time::Duration;

use super::{ChangeBus, ChangeEvent};

const CHANNELS: [&str; 3] = ["books_changed", "user_progress_changed", "notes_changed"];

/// Runs for the lifetime of the process, reconnecting with a delay when the
/// stream drops. On a non-Postgres store there is nothing to listen to and
/// the task exits immediately; the in-process bus still covers local
/// writes.
pub async fn run_change_listener(database_url: String, bus: ChangeBus) {
    if !database_url.starts_with("postgres") {
        tracing::debug!("Change listener disabled: store is not Postgres");
        return;
    }

    tracing::info!("📡 Change listener started");

    loop {
        if let Err(e) = listen(&database_url, &bus).await {
            tracing::warn!("Change stream dropped: {} (reconnecting in 5s)", e);
            tokio::time::sleep(Duration::from_secs(5)).await;
        }
    }
}

async fn listen(database_url: &str, bus: &ChangeBus) -> Result<(), sqlx::Error> {
    let mut listener = PgListener::connect(database_url).await?;
    listener.listen_all(CHANNELS).await?;

    loop {
        let notification = listener.recv().await?;
        let event = match notification.channel() {
            "books_changed" => ChangeEvent::books(),
            "user_progress_changed" => ChangeEvent::progress(),
            "notes_changed" => {
                let payload = notification.payload();
                if payload.is_empty() {
                    ChangeEvent::all_notes()
                } else {
                    ChangeEvent::notes(payload)
                }
            }
            other => {
                tracing::debug!("Ignoring notification on channel {}", other);
                continue;
            }
        };
        bus.publish(event);
    }
}
