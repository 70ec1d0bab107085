use chrono::{DateTime, Utc};
use sqlx::FromRow;
use uuid::Uuid;

/// An uploaded avatar image. `object_key` is the per-user,
/// timestamp-namespaced path the blob was stored under.
#[derive(Debug, Clone, FromRow)]
#[allow(dead_code)]
pub struct Avatar {
    pub id: Uuid,
    pub user_id: Uuid,
    pub object_key: String,
    pub content_type: String,
    pub data: Vec<u8>,
    pub created_at: DateTime<Utc>,
}
