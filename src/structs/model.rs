use std::fmt;

use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use uuid::Uuid;

use crate::structs::quiz_type::{ParticipantId, QuestionId, Seconds};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Difficulty {
    Easy,
    Medium,
    Hard,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Question {
    pub id: QuestionId,
    pub category: String,
    pub question: String,
    pub correct_answer: String,
    pub difficulty: Difficulty,
}

impl Question {
    /// Exact, case-sensitive comparison against the canonical answer.
    pub fn is_correct(&self, answer: &str) -> bool {
        answer == self.correct_answer
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ViolationKind {
    Copy,
    Paste,
    TabChange,
    FocusLoss,
}

impl ViolationKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ViolationKind::Copy => "copy",
            ViolationKind::Paste => "paste",
            ViolationKind::TabChange => "tab_change",
            ViolationKind::FocusLoss => "focus_loss",
        }
    }
}

impl fmt::Display for ViolationKind {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Violation {
    #[serde(rename = "type")]
    pub kind: ViolationKind,
    #[serde(with = "time::serde::rfc3339")]
    pub timestamp: OffsetDateTime,
    pub details: String,
}

impl Violation {
    pub fn new(kind: ViolationKind, details: impl Into<String>) -> Self {
        Violation {
            kind,
            timestamp: OffsetDateTime::now_utc(),
            details: details.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Answer {
    pub question_id: QuestionId,
    pub selected_answer: String,
    pub time_spent: Seconds,
    pub is_correct: bool,
    #[serde(with = "time::serde::rfc3339")]
    pub timestamp: OffsetDateTime,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Participant {
    pub id: ParticipantId,
    pub name: String,
    #[serde(with = "time::serde::rfc3339")]
    pub start_time: OffsetDateTime,
    pub current_question: usize,
    pub answers: Vec<Answer>,
    pub violations: Vec<Violation>,
    pub is_active: bool,
    pub total_time: Seconds,
}

impl Participant {
    pub fn new(name: impl Into<String>) -> Self {
        Participant {
            id: Uuid::new_v4().to_string(),
            name: name.into(),
            start_time: OffsetDateTime::now_utc(),
            current_question: 0,
            answers: Vec::new(),
            violations: Vec::new(),
            is_active: true,
            total_time: 0,
        }
    }

    pub fn correct_count(&self) -> usize {
        self.answers.iter().filter(|answer| answer.is_correct).count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn correctness_is_case_sensitive() {
        let gold = Question {
            id: 2,
            category: "Chemistry".to_string(),
            question: "What is the chemical symbol for gold?".to_string(),
            correct_answer: "Au".to_string(),
            difficulty: Difficulty::Easy,
        };
        assert!(gold.is_correct("Au"));
        assert!(!gold.is_correct("au"));
        assert!(!gold.is_correct("Au "));
    }

    #[test]
    fn violation_serializes_kind_under_type() {
        let violation = Violation::new(ViolationKind::TabChange, "User switched to another tab");
        let json = serde_json::to_value(&violation).unwrap();
        assert_eq!(json["type"], "tab_change");
        assert_eq!(json["details"], "User switched to another tab");
        assert!(json["timestamp"].is_string());
    }

    #[test]
    fn new_participant_starts_empty_and_active() {
        let participant = Participant::new("Ada");
        assert!(participant.is_active);
        assert_eq!(participant.current_question, 0);
        assert_eq!(participant.total_time, 0);
        assert!(participant.answers.is_empty());
        assert!(participant.violations.is_empty());
        assert_eq!(Uuid::parse_str(&participant.id).map(|id| id.get_version_num()).ok(), Some(4));
    }
}
