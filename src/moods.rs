//! The mood catalog.
//!
//! One shared enumerated definition used by the entry editor, the calendar,
//! and the insights derivations. Earlier revisions of the client kept a
//! separate copy of this table per view and the vocabularies drifted; the
//! catalog here is the union of those vocabularies and the single source of
//! truth for id, label, glyph, color, and wellbeing score.

use serde::Serialize;

#[derive(Debug, Clone, Serialize)]
pub struct Mood {
    pub id: &'static str,
    pub label: &'static str,
    pub emoji: &'static str,
    pub color: &'static str,
    /// Wellbeing score, 1 (lowest) to 5 (highest).
    pub score: i32,
}

pub const CATALOG: &[Mood] = &[
    Mood {
        id: "happy",
        label: "Happy",
        emoji: "\u{1F60A}",
        color: "#90DB8A",
        score: 5,
    },
    Mood {
        id: "good",
        label: "Good",
        emoji: "\u{1F642}",
        color: "#A8DADC",
        score: 4,
    },
    Mood {
        id: "neutral",
        label: "Neutral",
        emoji: "\u{1F610}",
        color: "#D3D3D3",
        score: 3,
    },
    Mood {
        id: "tired",
        label: "Tired",
        emoji: "\u{1F634}",
        color: "#B8A9C9",
        score: 2,
    },
    Mood {
        id: "low",
        label: "Low",
        emoji: "\u{1F615}",
        color: "#E9C46A",
        score: 2,
    },
    Mood {
        id: "sad",
        label: "Sad",
        emoji: "\u{1F614}",
        color: "#F4A261",
        score: 1,
    },
];

pub fn get(id: &str) -> Option<&'static Mood> {
    CATALOG.iter().find(|m| m.id == id)
}

pub fn is_valid(id: &str) -> bool {
    get(id).is_some()
}

/// Score for a mood id; ids missing from the catalog score 0.
pub fn score(id: &str) -> i32 {
    get(id).map(|m| m.score).unwrap_or(0)
}

/// Supportive message shown after logging some moods. Deliberately partial:
/// ids outside this table get no message.
pub fn encouragement(id: &str) -> Option<&'static str> {
    match id {
        "sad" => Some("Rough days happen. Be gentle with yourself today."),
        "low" => Some("Small steps still count. Tomorrow is a fresh page."),
        "tired" => Some("Rest is productive too. Maybe an early night?"),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_ids_are_unique() {
        let ids: HashSet<_> = CATALOG.iter().map(|m| m.id).collect();
        assert_eq!(ids.len(), CATALOG.len());
    }

    #[test]
    fn test_scores_in_range() {
        for m in CATALOG {
            assert!((1..=5).contains(&m.score), "{} out of range", m.id);
        }
    }

    #[test]
    fn test_union_vocabulary_present() {
        for id in ["sad", "low", "neutral", "good", "happy", "tired"] {
            assert!(is_valid(id), "missing {id}");
        }
    }

    #[test]
    fn test_unknown_mood_scores_zero() {
        assert_eq!(score("ecstatic"), 0);
        assert!(!is_valid("ecstatic"));
    }

    #[test]
    fn test_encouragement_is_partial() {
        assert!(encouragement("tired").is_some());
        assert!(encouragement("sad").is_some());
        assert!(encouragement("happy").is_none());
        assert!(encouragement("neutral").is_none());
    }
}
