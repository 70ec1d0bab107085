//! # Moodlog — Request/Response DTOs
//!
//! All API contract types in one module.
//!
//! Conventions:
//! - `*Request`  → deserialized from client JSON body or query params
//! - `*Response` → serialized to client JSON
//! - Validation is expressed via `validator` derive macros where it fits,
//!   with ad hoc helper impls at the bottom for the rest

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use crate::models::entry::Entry;
use crate::models::user::User;

// ============================================================================
// Auth
// ============================================================================

/// POST /api/auth/register
#[derive(Debug, Deserialize, Validate)]
pub struct RegisterRequest {
    #[validate(email(message = "Invalid email format"))]
    #[validate(length(max = 254, message = "Email too long"))]
    pub email: String,

    #[validate(length(min = 8, max = 128, message = "Password must be 8-128 characters"))]
    pub password: String,

    #[validate(length(min = 1, max = 100, message = "Name must be 1-100 characters"))]
    pub name: String,

    /// IANA timezone identifier (e.g., "America/New_York"). Default: "UTC"
    pub timezone: Option<String>,

    /// If present, upgrades the anonymous account in place, keeping its entries
    pub guest_token: Option<Uuid>,
}

/// POST /api/auth/login
#[derive(Debug, Deserialize, Validate)]
pub struct LoginRequest {
    #[validate(email)]
    pub email: String,

    #[validate(length(min = 1))]
    pub password: String,
}

/// POST /api/auth/anonymous
#[derive(Debug, Deserialize)]
pub struct AnonymousRequest {
    pub timezone: Option<String>,
}

/// POST /api/auth/google
#[derive(Debug, Deserialize, Validate)]
pub struct GoogleSignInRequest {
    #[validate(length(min = 1, message = "id_token is required"))]
    pub id_token: String,

    pub timezone: Option<String>,
}

/// POST /api/auth/refresh
#[derive(Debug, Deserialize)]
pub struct RefreshRequest {
    pub refresh_token: String,
}

/// Response for register, login, and google sign-in
#[derive(Debug, Serialize)]
pub struct AuthResponse {
    pub access_token: String,
    pub refresh_token: String,
    pub expires_in: i64,
    pub user: UserSummary,
}

/// Response for anonymous session creation
#[derive(Debug, Serialize)]
pub struct AnonymousAuthResponse {
    pub access_token: String,
    pub refresh_token: String,
    pub expires_in: i64,
    pub guest_token: Uuid,
    pub user: UserSummary,
}

/// Minimal user info returned in auth responses
#[derive(Debug, Serialize)]
pub struct UserSummary {
    pub id: Uuid,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    pub name: String,
    pub is_guest: bool,
    pub timezone: String,
    pub created_at: DateTime<Utc>,
}

impl From<User> for UserSummary {
    fn from(u: User) -> Self {
        Self {
            id: u.id,
            email: u.email,
            name: u.name,
            is_guest: u.is_guest,
            timezone: u.timezone,
            created_at: u.created_at,
        }
    }
}

/// GET /api/me
#[derive(Debug, Serialize)]
pub struct UserResponse {
    pub id: Uuid,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub avatar_url: Option<String>,
    pub is_guest: bool,
    pub timezone: String,
    pub created_at: DateTime<Utc>,
}

impl From<User> for UserResponse {
    fn from(u: User) -> Self {
        Self {
            id: u.id,
            email: u.email,
            name: u.name,
            avatar_url: u.avatar_url,
            is_guest: u.is_guest,
            timezone: u.timezone,
            created_at: u.created_at,
        }
    }
}

// ============================================================================
// Entries
// ============================================================================

/// POST /api/entries (today) and PUT /api/entries/{date} (keyed merge-write).
/// Omitted fields are preserved by the merge; mood is required only when the
/// write would create the entry.
#[derive(Debug, Deserialize, Validate)]
pub struct UpsertEntryRequest {
    pub mood: Option<String>,

    #[validate(length(max = 5000, message = "Note must be under 5000 characters"))]
    pub note: Option<String>,
}

/// Stored entry, as returned everywhere an entry appears
#[derive(Debug, Serialize)]
pub struct EntryResponse {
    pub id: Uuid,
    pub date: NaiveDate,
    /// Canonical `YYYY-MM-DD` key for this entry
    pub date_key: String,
    pub mood: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<Entry> for EntryResponse {
    fn from(e: Entry) -> Self {
        let date_key = e.date_key();
        Self {
            id: e.id,
            date: e.entry_date,
            date_key,
            mood: e.mood,
            note: e.note,
            created_at: e.created_at,
            updated_at: e.updated_at,
        }
    }
}

/// GET /api/entries/today and POST /api/entries
#[derive(Debug, Serialize)]
pub struct TodayResponse {
    pub date: NaiveDate,
    pub entry: Option<EntryResponse>,
    /// Supportive message for the selected mood; absent for moods outside
    /// the fixed lookup table
    #[serde(skip_serializing_if = "Option::is_none")]
    pub encouragement: Option<&'static str>,
}

// ============================================================================
// Calendar
// ============================================================================

/// GET /api/calendar query params
#[derive(Debug, Deserialize)]
pub struct CalendarQuery {
    pub year: i32,
    pub month: u32,
}

#[derive(Debug, Serialize, PartialEq)]
pub struct MonthRef {
    pub year: i32,
    pub month: u32,
}

/// One day cell in the month grid
#[derive(Debug, Serialize)]
pub struct CalendarCell {
    pub day: u32,
    pub date: NaiveDate,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mood: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub emoji: Option<&'static str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub color: Option<&'static str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
    pub is_today: bool,
    /// Strictly after today's key in the user's timezone; never interactive
    pub is_future: bool,
    pub editable: bool,
}

/// GET /api/calendar
#[derive(Debug, Serialize)]
pub struct CalendarResponse {
    pub year: i32,
    pub month: u32,
    /// Display label, e.g. "March 2024"
    pub label: String,
    pub today: NaiveDate,
    pub cells: Vec<CalendarCell>,
    pub prev: MonthRef,
    pub next: MonthRef,
}

// ============================================================================
// Insights
// ============================================================================

/// GET /api/insights query params
#[derive(Debug, Deserialize)]
pub struct InsightsQuery {
    /// `YYYY-MM` month for the average. Default: current month in the
    /// user's timezone.
    pub month: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct MoodCount {
    pub mood: &'static str,
    pub label: &'static str,
    pub color: &'static str,
    pub count: i64,
}

#[derive(Debug, Serialize)]
pub struct TrendPoint {
    pub date: NaiveDate,
    pub mood: String,
    pub score: i32,
}

/// GET /api/insights
#[derive(Debug, Serialize)]
pub struct InsightsResponse {
    pub distribution: Vec<MoodCount>,
    pub trend: Vec<TrendPoint>,
    /// Month the average was computed for (`YYYY-MM`)
    pub month: String,
    /// Null when the month has no entries
    pub monthly_average: Option<f64>,
    pub year: i32,
    pub yearly_count: i64,
}

// ============================================================================
// Profile
// ============================================================================

/// GET /api/profile — served from the auth-provider user record
#[derive(Debug, Serialize)]
pub struct ProfileResponse {
    pub id: Uuid,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    pub display_name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub photo_url: Option<String>,
    pub timezone: String,
    pub updated_at: DateTime<Utc>,
}

impl From<User> for ProfileResponse {
    fn from(u: User) -> Self {
        Self {
            id: u.id,
            email: u.email,
            display_name: u.name,
            photo_url: u.avatar_url,
            timezone: u.timezone,
            updated_at: u.updated_at,
        }
    }
}

/// PUT /api/profile — partial update, persisted to both the user record
/// and the mirrored profile document
#[derive(Debug, Deserialize, Validate)]
pub struct UpdateProfileRequest {
    #[validate(length(min = 1, max = 100, message = "Name must be 1-100 characters"))]
    pub display_name: Option<String>,

    #[validate(length(max = 2048, message = "Photo URL too long"))]
    pub photo_url: Option<String>,

    pub timezone: Option<String>,
}

/// POST /api/profile/avatar
#[derive(Debug, Serialize)]
pub struct AvatarUploadResponse {
    /// Stable public URL for the stored blob
    pub url: String,
    pub content_type: String,
    pub size: usize,
}

// ============================================================================
// Validation helpers
// ============================================================================

impl UpsertEntryRequest {
    /// A supplied mood id must come from the catalog.
    pub fn validate_mood(&self) -> Result<(), String> {
        match self.mood.as_deref() {
            None => Ok(()),
            Some(id) if crate::moods::is_valid(id) => Ok(()),
            Some(id) => Err(format!("Unknown mood id: {}", id)),
        }
    }
}

impl CalendarQuery {
    pub fn validate_range(&self) -> Result<(), String> {
        if !(1..=12).contains(&self.month) {
            return Err("Month must be 1-12".into());
        }
        if !(1970..=9999).contains(&self.year) {
            return Err("Year out of range".into());
        }
        Ok(())
    }
}

impl InsightsQuery {
    /// Parse `YYYY-MM` into (year, month), or None when absent/malformed.
    pub fn parse_month(&self) -> Option<(i32, u32)> {
        let m = self.month.as_ref()?;
        let (y, mo) = m.split_once('-')?;
        if y.len() != 4 || mo.len() != 2 {
            return None;
        }
        let year: i32 = y.parse().ok()?;
        let month: u32 = mo.parse().ok()?;
        if !(1..=12).contains(&month) {
            return None;
        }
        Some((year, month))
    }
}

impl UpdateProfileRequest {
    /// A supplied timezone must be a known IANA name.
    pub fn validate_timezone(&self) -> Result<(), String> {
        match self.timezone.as_deref() {
            None => Ok(()),
            Some(tz) if tz.parse::<chrono_tz::Tz>().is_ok() => Ok(()),
            Some(tz) => Err(format!("Unknown timezone: {}", tz)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_upsert_rejects_unknown_mood() {
        let req = UpsertEntryRequest {
            mood: Some("ecstatic".into()),
            note: None,
        };
        assert!(req.validate_mood().is_err());

        let req = UpsertEntryRequest {
            mood: Some("tired".into()),
            note: None,
        };
        assert!(req.validate_mood().is_ok());
    }

    #[test]
    fn test_calendar_query_range() {
        assert!(CalendarQuery { year: 2024, month: 3 }.validate_range().is_ok());
        assert!(CalendarQuery { year: 2024, month: 0 }.validate_range().is_err());
        assert!(CalendarQuery { year: 2024, month: 13 }.validate_range().is_err());
        assert!(CalendarQuery { year: 999, month: 6 }.validate_range().is_err());
    }

    #[test]
    fn test_insights_month_parsing() {
        let q = |m: &str| InsightsQuery {
            month: Some(m.into()),
        };
        assert_eq!(q("2024-01").parse_month(), Some((2024, 1)));
        assert_eq!(q("2024-13").parse_month(), None);
        assert_eq!(q("24-01").parse_month(), None);
        assert_eq!(q("garbage").parse_month(), None);
        assert_eq!(InsightsQuery { month: None }.parse_month(), None);
    }

    #[test]
    fn test_profile_timezone_validation() {
        let req = |tz: Option<&str>| UpdateProfileRequest {
            display_name: None,
            photo_url: None,
            timezone: tz.map(String::from),
        };
        assert!(req(Some("Europe/Lisbon")).validate_timezone().is_ok());
        assert!(req(Some("Mars/Olympus")).validate_timezone().is_err());
        assert!(req(None).validate_timezone().is_ok());
    }
}
