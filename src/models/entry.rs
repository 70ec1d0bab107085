use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

use crate::datekey;

/// One recorded mood (plus optional note) for one local calendar date.
/// At most one row per (user, date); writes merge rather than replace.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Entry {
    pub id: Uuid,
    pub user_id: Uuid,
    pub entry_date: NaiveDate,
    pub mood: String,
    pub note: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Entry {
    /// Canonical `YYYY-MM-DD` key for this entry.
    pub fn date_key(&self) -> String {
        datekey::date_key(self.entry_date)
    }
}
