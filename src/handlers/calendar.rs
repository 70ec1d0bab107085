use std::collections::HashMap;

use axum::{
    extract::{Query, State},
    Extension, Json,
};
use chrono::NaiveDate;

use crate::auth::middleware::AuthUser;
use crate::datekey;
use crate::dto::{CalendarCell, CalendarQuery, CalendarResponse, MonthRef};
use crate::error::{AppError, AppResult};
use crate::handlers::entries::user_timezone;
use crate::models::entry::Entry;
use crate::moods;
use crate::AppState;

/// GET /api/calendar?year&month — the month grid for the Timeline view.
/// Month navigation recomputes this purely from (year, month); the entry
/// set is the same full collection every view reads.
pub async fn get_calendar(
    State(state): State<AppState>,
    Extension(auth_user): Extension<AuthUser>,
    Query(query): Query<CalendarQuery>,
) -> AppResult<Json<CalendarResponse>> {
    query.validate_range().map_err(AppError::Validation)?;

    let tz = user_timezone(&state.db, auth_user.id).await?;
    let today = datekey::local_today(&tz);

    let entries = sqlx::query_as::<_, Entry>(
        "SELECT * FROM entries WHERE user_id = $1 ORDER BY entry_date ASC",
    )
    .bind(auth_user.id)
    .fetch_all(&state.db)
    .await?;

    let by_date: HashMap<NaiveDate, Entry> =
        entries.into_iter().map(|e| (e.entry_date, e)).collect();

    let cells = build_month_grid(query.year, query.month, today, &by_date);
    let first = NaiveDate::from_ymd_opt(query.year, query.month, 1)
        .ok_or_else(|| AppError::Validation("Invalid year/month".into()))?;

    Ok(Json(CalendarResponse {
        year: query.year,
        month: query.month,
        label: first.format("%B %Y").to_string(),
        today,
        cells,
        prev: prev_month(query.year, query.month),
        next: next_month(query.year, query.month),
    }))
}

pub fn prev_month(year: i32, month: u32) -> MonthRef {
    if month == 1 {
        MonthRef {
            year: year - 1,
            month: 12,
        }
    } else {
        MonthRef {
            year,
            month: month - 1,
        }
    }
}

pub fn next_month(year: i32, month: u32) -> MonthRef {
    if month == 12 {
        MonthRef {
            year: year + 1,
            month: 1,
        }
    } else {
        MonthRef {
            year,
            month: month + 1,
        }
    }
}

fn days_in_month(year: i32, month: u32) -> u32 {
    let first = NaiveDate::from_ymd_opt(year, month, 1).expect("validated year/month");
    let next = if month == 12 {
        NaiveDate::from_ymd_opt(year + 1, 1, 1)
    } else {
        NaiveDate::from_ymd_opt(year, month + 1, 1)
    }
    .expect("validated year/month");
    (next - first).num_days() as u32
}

/// One cell per day of the month. Days strictly after `today` are never
/// interactive, whatever the stored data says; days without an entry are
/// the neutral placeholder (no mood metadata).
pub fn build_month_grid(
    year: i32,
    month: u32,
    today: NaiveDate,
    by_date: &HashMap<NaiveDate, Entry>,
) -> Vec<CalendarCell> {
    (1..=days_in_month(year, month))
        .map(|day| {
            let date = NaiveDate::from_ymd_opt(year, month, day).expect("day within month");
            let entry = by_date.get(&date);
            let meta = entry.and_then(|e| moods::get(&e.mood));
            let is_future = date > today;

            CalendarCell {
                day,
                date,
                mood: entry.map(|e| e.mood.clone()),
                emoji: meta.map(|m| m.emoji),
                color: meta.map(|m| m.color),
                note: entry.and_then(|e| e.note.clone()),
                is_today: date == today,
                is_future,
                editable: !is_future,
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use uuid::Uuid;

    fn entry(date: NaiveDate, mood: &str, note: Option<&str>) -> Entry {
        Entry {
            id: Uuid::new_v4(),
            user_id: Uuid::new_v4(),
            entry_date: date,
            mood: mood.into(),
            note: note.map(String::from),
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    fn index(entries: Vec<Entry>) -> HashMap<NaiveDate, Entry> {
        entries.into_iter().map(|e| (e.entry_date, e)).collect()
    }

    #[test]
    fn test_days_in_month() {
        assert_eq!(days_in_month(2024, 2), 29); // leap year
        assert_eq!(days_in_month(2023, 2), 28);
        assert_eq!(days_in_month(2024, 3), 31);
        assert_eq!(days_in_month(2024, 12), 31);
    }

    #[test]
    fn test_month_navigation_wraps_at_year_boundary() {
        assert_eq!(prev_month(2024, 1), MonthRef { year: 2023, month: 12 });
        assert_eq!(next_month(2024, 12), MonthRef { year: 2025, month: 1 });
        assert_eq!(prev_month(2024, 7), MonthRef { year: 2024, month: 6 });
    }

    #[test]
    fn test_future_cells_are_never_editable() {
        let today = NaiveDate::from_ymd_opt(2024, 3, 15).unwrap();
        // A stored entry after today (e.g. written from another timezone)
        // still must not make its cell interactive.
        let by_date = index(vec![entry(
            NaiveDate::from_ymd_opt(2024, 3, 20).unwrap(),
            "happy",
            None,
        )]);

        let cells = build_month_grid(2024, 3, today, &by_date);
        for cell in &cells {
            assert_eq!(cell.is_future, cell.date > today);
            assert_eq!(cell.editable, !cell.is_future);
        }
        let day20 = &cells[19];
        assert!(day20.is_future);
        assert!(!day20.editable);
        assert_eq!(day20.mood.as_deref(), Some("happy"));
    }

    #[test]
    fn test_today_is_marked_and_editable() {
        let today = NaiveDate::from_ymd_opt(2024, 3, 15).unwrap();
        let cells = build_month_grid(2024, 3, today, &HashMap::new());
        let cell = &cells[14];
        assert!(cell.is_today);
        assert!(cell.editable);
    }

    // Anonymous sign-in, mood "tired" on 2024-03-01, reload March 2024:
    // day 1 carries the tired glyph and is editable, day 2 is the neutral
    // placeholder.
    #[test]
    fn test_march_scenario() {
        let today = NaiveDate::from_ymd_opt(2024, 3, 15).unwrap();
        let by_date = index(vec![entry(
            NaiveDate::from_ymd_opt(2024, 3, 1).unwrap(),
            "tired",
            Some("long week"),
        )]);

        let cells = build_month_grid(2024, 3, today, &by_date);
        assert_eq!(cells.len(), 31);

        let day1 = &cells[0];
        assert_eq!(day1.mood.as_deref(), Some("tired"));
        assert_eq!(day1.emoji, Some("\u{1F634}"));
        assert_eq!(day1.note.as_deref(), Some("long week"));
        assert!(day1.editable);

        let day2 = &cells[1];
        assert!(day2.mood.is_none());
        assert!(day2.emoji.is_none());
        assert!(day2.editable);
    }

    #[test]
    fn test_unknown_mood_renders_without_catalog_metadata() {
        let today = NaiveDate::from_ymd_opt(2024, 3, 15).unwrap();
        let by_date = index(vec![entry(
            NaiveDate::from_ymd_opt(2024, 3, 2).unwrap(),
            "retired-mood-id",
            None,
        )]);

        let cells = build_month_grid(2024, 3, today, &by_date);
        let day2 = &cells[1];
        assert_eq!(day2.mood.as_deref(), Some("retired-mood-id"));
        assert!(day2.emoji.is_none());
        assert!(day2.color.is_none());
    }
}
