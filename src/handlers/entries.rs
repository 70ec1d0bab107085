use axum::{
    extract::{Path, State},
    Extension, Json,
};
use chrono::NaiveDate;
use uuid::Uuid;
use validator::Validate;

use crate::auth::middleware::AuthUser;
use crate::datekey;
use crate::dto::{EntryResponse, TodayResponse, UpsertEntryRequest};
use crate::error::{AppError, AppResult};
use crate::models::entry::Entry;
use crate::moods;
use crate::AppState;

/// Timezone the user's date keys are computed in.
pub async fn user_timezone(db: &sqlx::PgPool, user_id: Uuid) -> AppResult<String> {
    let tz = sqlx::query_scalar::<_, String>("SELECT timezone FROM users WHERE id = $1")
        .bind(user_id)
        .fetch_optional(db)
        .await?;
    Ok(tz.unwrap_or_else(|| "UTC".into()))
}

/// Keyed merge-write: creates the entry on first mood selection, otherwise
/// updates only the supplied fields. Repeating the same write is a no-op on
/// the stored mood/note.
async fn merge_entry(
    db: &sqlx::PgPool,
    user_id: Uuid,
    date: NaiveDate,
    body: &UpsertEntryRequest,
) -> AppResult<Entry> {
    body.validate()
        .map_err(|e| AppError::Validation(e.to_string()))?;
    body.validate_mood().map_err(AppError::Validation)?;

    if body.mood.is_none() {
        // Notes are never saved without a mood selection; a note-only write
        // is only a merge into an entry that already exists.
        let exists = sqlx::query_scalar::<_, i64>(
            "SELECT COUNT(*) FROM entries WHERE user_id = $1 AND entry_date = $2",
        )
        .bind(user_id)
        .bind(date)
        .fetch_one(db)
        .await?;
        if exists == 0 {
            return Err(AppError::Validation(
                "Select a mood before saving a note".into(),
            ));
        }
    }

    let entry = sqlx::query_as::<_, Entry>(
        r#"
        INSERT INTO entries (id, user_id, entry_date, mood, note)
        VALUES ($1, $2, $3, $4, $5)
        ON CONFLICT (user_id, entry_date) DO UPDATE SET
            mood = COALESCE($4, entries.mood),
            note = COALESCE($5, entries.note),
            updated_at = NOW()
        RETURNING *
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(user_id)
    .bind(date)
    .bind(&body.mood)
    .bind(&body.note)
    .fetch_one(db)
    .await?;

    Ok(entry)
}

/// POST /api/entries — upsert today's entry (mood selection and note blur
/// both land here).
pub async fn upsert_today(
    State(state): State<AppState>,
    Extension(auth_user): Extension<AuthUser>,
    Json(body): Json<UpsertEntryRequest>,
) -> AppResult<Json<TodayResponse>> {
    let tz = user_timezone(&state.db, auth_user.id).await?;
    let today = datekey::local_today(&tz);

    let entry = merge_entry(&state.db, auth_user.id, today, &body).await?;
    let encouragement = moods::encouragement(&entry.mood);

    Ok(Json(TodayResponse {
        date: today,
        entry: Some(entry.into()),
        encouragement,
    }))
}

/// GET /api/entries/today
pub async fn get_today(
    State(state): State<AppState>,
    Extension(auth_user): Extension<AuthUser>,
) -> AppResult<Json<TodayResponse>> {
    let tz = user_timezone(&state.db, auth_user.id).await?;
    let today = datekey::local_today(&tz);

    let entry = sqlx::query_as::<_, Entry>(
        "SELECT * FROM entries WHERE user_id = $1 AND entry_date = $2",
    )
    .bind(auth_user.id)
    .bind(today)
    .fetch_optional(&state.db)
    .await?;

    let encouragement = entry
        .as_ref()
        .and_then(|e| moods::encouragement(&e.mood));

    Ok(Json(TodayResponse {
        date: today,
        entry: entry.map(Into::into),
        encouragement,
    }))
}

/// PUT /api/entries/{date} — retroactive merge-write for a past or current
/// day. Dates strictly after today in the user's timezone are rejected.
pub async fn upsert_by_date(
    State(state): State<AppState>,
    Extension(auth_user): Extension<AuthUser>,
    Path(date): Path<NaiveDate>,
    Json(body): Json<UpsertEntryRequest>,
) -> AppResult<Json<EntryResponse>> {
    let tz = user_timezone(&state.db, auth_user.id).await?;
    let today = datekey::local_today(&tz);

    if date > today {
        return Err(AppError::Validation(
            "Cannot record a mood for a future date".into(),
        ));
    }

    let entry = merge_entry(&state.db, auth_user.id, date, &body).await?;
    Ok(Json(entry.into()))
}

/// GET /api/entries/{date}
pub async fn get_by_date(
    State(state): State<AppState>,
    Extension(auth_user): Extension<AuthUser>,
    Path(date): Path<NaiveDate>,
) -> AppResult<Json<EntryResponse>> {
    let entry = sqlx::query_as::<_, Entry>(
        "SELECT * FROM entries WHERE user_id = $1 AND entry_date = $2",
    )
    .bind(auth_user.id)
    .bind(date)
    .fetch_optional(&state.db)
    .await?
    .ok_or_else(|| AppError::NotFound(format!("No entry for {}", datekey::date_key(date))))?;

    Ok(Json(entry.into()))
}

/// GET /api/entries — the user's full entry collection, oldest first. The
/// calendar and insights views re-derive everything from this set.
pub async fn list_entries(
    State(state): State<AppState>,
    Extension(auth_user): Extension<AuthUser>,
) -> AppResult<Json<Vec<EntryResponse>>> {
    let entries = sqlx::query_as::<_, Entry>(
        r#"
        SELECT * FROM entries
        WHERE user_id = $1
        ORDER BY entry_date ASC
        "#,
    )
    .bind(auth_user.id)
    .fetch_all(&state.db)
    .await?;

    Ok(Json(entries.into_iter().map(Into::into).collect()))
}

/// GET /api/moods — the shared mood catalog.
pub async fn list_moods() -> Json<&'static [moods::Mood]> {
    Json(moods::CATALOG)
}
