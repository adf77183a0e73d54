use serde::Serialize;

use crate::structs::model::{Answer, Participant, Violation};
use crate::structs::quiz_type::{ParticipantId, Seconds};
use crate::utils::{format_clock, rounded_average, rounded_percent};

#[derive(Serialize, Debug, Clone)]
#[serde(rename_all = "camelCase")]
pub struct QuizResult {
    pub participant_id: ParticipantId,
    pub name: String,
    pub correct: usize,
    pub incorrect: usize,
    pub answered: usize,
    pub accuracy: u32,
    pub grade: &'static str,
    pub average_time: Seconds,
    pub total_time: Seconds,
    pub violation_count: usize,
    pub answers: Vec<Answer>,
}

impl QuizResult {
    pub fn from_participant(participant: &Participant) -> Self {
        let answered = participant.answers.len();
        let correct = participant.correct_count();
        let accuracy = rounded_percent(correct, answered);
        QuizResult {
            participant_id: participant.id.clone(),
            name: participant.name.clone(),
            correct,
            incorrect: answered - correct,
            answered,
            accuracy,
            grade: grade(accuracy),
            average_time: rounded_average(participant.total_time, answered),
            total_time: participant.total_time,
            violation_count: participant.violations.len(),
            answers: participant.answers.clone(),
        }
    }
}

pub fn grade(accuracy: u32) -> &'static str {
    match accuracy {
        90.. => "A+",
        80..=89 => "A",
        70..=79 => "B",
        60..=69 => "C",
        50..=59 => "D",
        _ => "F",
    }
}

#[derive(Serialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum Standing {
    Clean,
    Warning,
    Flagged,
}

impl Standing {
    pub fn from_violations(count: usize) -> Self {
        match count {
            0..=1 => Standing::Clean,
            2..=4 => Standing::Warning,
            _ => Standing::Flagged,
        }
    }
}

#[derive(Serialize, Debug, Clone)]
#[serde(rename_all = "camelCase")]
pub struct RosterEntry {
    pub id: ParticipantId,
    pub name: String,
    pub current_question: usize,
    pub total_questions: usize,
    pub total_time: Seconds,
    pub time_spent: String,
    pub violation_count: usize,
    pub recent_violations: Vec<Violation>,
    pub is_active: bool,
    pub standing: Standing,
}

/// What the admin table shows: every participant plus roster-wide totals.
#[derive(Serialize, Debug, Clone)]
#[serde(rename_all = "camelCase")]
pub struct AdminSummary {
    pub current_question: usize,
    pub total_participants: usize,
    pub active_participants: usize,
    pub total_violations: usize,
    pub completion_rate: u32,
    pub participants: Vec<RosterEntry>,
}

impl AdminSummary {
    pub fn new(roster: &[Participant], total_questions: usize, current_question: usize) -> Self {
        let finished = roster
            .iter()
            .filter(|participant| participant.current_question >= total_questions)
            .count();
        AdminSummary {
            current_question,
            total_participants: roster.len(),
            active_participants: roster.iter().filter(|participant| participant.is_active).count(),
            total_violations: roster.iter().map(|participant| participant.violations.len()).sum(),
            completion_rate: rounded_percent(finished, roster.len()),
            participants: roster
                .iter()
                .map(|participant| RosterEntry {
                    id: participant.id.clone(),
                    name: participant.name.clone(),
                    current_question: participant.current_question,
                    total_questions,
                    total_time: participant.total_time,
                    time_spent: format_clock(participant.total_time),
                    violation_count: participant.violations.len(),
                    recent_violations: participant.violations.iter().take(3).cloned().collect(),
                    is_active: participant.is_active,
                    standing: Standing::from_violations(participant.violations.len()),
                })
                .collect(),
        }
    }
}
