//! User notifications.

use super::client::ApiClient;
use super::error::ApiError;
use super::types::Notification;

/// Cache prefix of the notification list.
pub const NOTIFICATIONS_PREFIX: &str = "/api/notifications";

pub async fn list(client: &ApiClient) -> Result<Vec<Notification>, ApiError> {
    client.get("/api/notifications/").await?.json()
}

/// POST /api/notifications/{id}/read/.
pub async fn mark_as_read(client: &ApiClient, id: u64) -> Result<(), ApiError> {
    client.invalidate(&[NOTIFICATIONS_PREFIX]);
    client
        .post_empty(&format!("/api/notifications/{}/read/", id))
        .await?;
    Ok(())
}
