use axum::{
    extract::{Query, State},
    Extension, Json,
};
use chrono::Datelike;

use crate::auth::middleware::AuthUser;
use crate::datekey;
use crate::dto::{InsightsQuery, InsightsResponse, MoodCount, TrendPoint};
use crate::error::AppResult;
use crate::handlers::entries::user_timezone;
use crate::models::entry::Entry;
use crate::moods;
use crate::AppState;

/// GET /api/insights — every visit re-fetches the full entry set and
/// re-derives the aggregates from scratch; nothing is cached.
pub async fn get_insights(
    State(state): State<AppState>,
    Extension(auth_user): Extension<AuthUser>,
    Query(query): Query<InsightsQuery>,
) -> AppResult<Json<InsightsResponse>> {
    let tz = user_timezone(&state.db, auth_user.id).await?;
    let today = datekey::local_today(&tz);

    let (year, month) = query
        .parse_month()
        .unwrap_or((today.year(), today.month()));
    let month_prefix = datekey::month_key(year, month);
    let year_prefix = format!("{:04}", today.year());

    let entries = sqlx::query_as::<_, Entry>(
        "SELECT * FROM entries WHERE user_id = $1 ORDER BY entry_date ASC",
    )
    .bind(auth_user.id)
    .fetch_all(&state.db)
    .await?;

    Ok(Json(InsightsResponse {
        distribution: mood_distribution(&entries),
        trend: mood_trend(&entries),
        month: month_prefix.clone(),
        monthly_average: monthly_average(&entries, &month_prefix),
        year: today.year(),
        yearly_count: yearly_count(&entries, &year_prefix),
    }))
}

/// Count per mood id across all entries, for every id in the catalog —
/// a mood with no entries reports 0, never goes missing.
pub fn mood_distribution(entries: &[Entry]) -> Vec<MoodCount> {
    moods::CATALOG
        .iter()
        .map(|m| MoodCount {
            mood: m.id,
            label: m.label,
            color: m.color,
            count: entries.iter().filter(|e| e.mood == m.id).count() as i64,
        })
        .collect()
}

/// Chronological score series. Date keys are zero-padded, so sorting the
/// key strings is sorting by date; moods missing from the catalog score 0.
pub fn mood_trend(entries: &[Entry]) -> Vec<TrendPoint> {
    let mut points: Vec<TrendPoint> = entries
        .iter()
        .map(|e| TrendPoint {
            date: e.entry_date,
            mood: e.mood.clone(),
            score: moods::score(&e.mood),
        })
        .collect();
    points.sort_by_key(|p| datekey::date_key(p.date));
    points
}

/// Mean score of entries whose date key has the given `YYYY-MM` prefix;
/// None when the month is empty.
pub fn monthly_average(entries: &[Entry], month_prefix: &str) -> Option<f64> {
    let scores: Vec<i32> = entries
        .iter()
        .filter(|e| e.date_key().starts_with(month_prefix))
        .map(|e| moods::score(&e.mood))
        .collect();

    if scores.is_empty() {
        return None;
    }
    Some(scores.iter().sum::<i32>() as f64 / scores.len() as f64)
}

/// Entries whose date key starts with the given `YYYY` prefix.
pub fn yearly_count(entries: &[Entry], year_prefix: &str) -> i64 {
    entries
        .iter()
        .filter(|e| e.date_key().starts_with(year_prefix))
        .count() as i64
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{NaiveDate, Utc};
    use uuid::Uuid;

    fn entry(date: &str, mood: &str) -> Entry {
        Entry {
            id: Uuid::new_v4(),
            user_id: Uuid::new_v4(),
            entry_date: date.parse::<NaiveDate>().unwrap(),
            mood: mood.into(),
            note: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn test_distribution_defaults_to_zero() {
        let entries = vec![entry("2024-01-05", "happy"), entry("2024-01-06", "happy")];
        let dist = mood_distribution(&entries);

        assert_eq!(dist.len(), moods::CATALOG.len());
        let by_id = |id: &str| dist.iter().find(|c| c.mood == id).unwrap().count;
        assert_eq!(by_id("happy"), 2);
        assert_eq!(by_id("sad"), 0);
        assert_eq!(by_id("tired"), 0);
    }

    #[test]
    fn test_distribution_ignores_unknown_ids() {
        let entries = vec![entry("2024-01-05", "not-a-mood")];
        let dist = mood_distribution(&entries);
        assert!(dist.iter().all(|c| c.count == 0));
    }

    #[test]
    fn test_trend_is_chronological() {
        let entries = vec![
            entry("2024-02-01", "sad"),
            entry("2023-12-31", "happy"),
            entry("2024-01-15", "unknown-mood"),
        ];
        let trend = mood_trend(&entries);

        let dates: Vec<String> = trend.iter().map(|p| datekey::date_key(p.date)).collect();
        assert_eq!(dates, vec!["2023-12-31", "2024-01-15", "2024-02-01"]);
        assert_eq!(trend[0].score, 5);
        assert_eq!(trend[1].score, 0); // missing mapping scores 0
        assert_eq!(trend[2].score, 1);
    }

    #[test]
    fn test_monthly_average() {
        // happy(5) on Jan 5 and sad(1) on Jan 20: January averages 3.0.
        let entries = vec![
            entry("2024-01-05", "happy"),
            entry("2024-01-20", "sad"),
            entry("2024-02-02", "happy"), // other month, excluded
        ];
        assert_eq!(monthly_average(&entries, "2024-01"), Some(3.0));
    }

    #[test]
    fn test_monthly_average_empty_month_is_none() {
        let entries = vec![entry("2024-01-05", "happy")];
        assert_eq!(monthly_average(&entries, "2024-03"), None);
        assert_eq!(monthly_average(&[], "2024-01"), None);
    }

    #[test]
    fn test_yearly_count() {
        let entries = vec![
            entry("2024-01-05", "happy"),
            entry("2024-11-20", "sad"),
            entry("2023-12-31", "good"),
        ];
        assert_eq!(yearly_count(&entries, "2024"), 2);
        assert_eq!(yearly_count(&entries, "2022"), 0);
    }
}
