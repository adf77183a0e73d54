use serde::{Deserialize, Serialize};

use crate::structs::model::{Answer, Participant, Violation, ViolationKind};
use crate::structs::quiz_type::{ParticipantId, QuestionId, Seconds};
use crate::utils::timestamp;

// Actions accepted by the reporting endpoint.
// Serialized as {"action": "...", "data": {...}}
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "action", content = "data", rename_all = "camelCase")]
pub enum ReportAction {
    Initialize,
    UpdateParticipant(ParticipantReport),
    LogViolation(ViolationReport),
}

impl ReportAction {
    pub const NAMES: [&'static str; 3] = ["initialize", "updateParticipant", "logViolation"];

    pub fn name(&self) -> &'static str {
        match self {
            ReportAction::Initialize => "initialize",
            ReportAction::UpdateParticipant(_) => "updateParticipant",
            ReportAction::LogViolation(_) => "logViolation",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ParticipantReport {
    pub participant_id: ParticipantId,
    pub name: String,
    pub current_question: usize,
    pub total_questions: usize,
    pub total_time: Seconds,
    pub violation_count: usize,
    pub is_active: bool,
    pub timestamp: String,
    #[serde(default)]
    pub answers: Vec<AnswerReport>,
}

impl ParticipantReport {
    pub fn new(participant: &Participant, total_questions: usize, at: String) -> Self {
        ParticipantReport {
            participant_id: participant.id.clone(),
            name: participant.name.clone(),
            current_question: participant.current_question,
            total_questions,
            total_time: participant.total_time,
            violation_count: participant.violations.len(),
            is_active: participant.is_active,
            timestamp: at,
            answers: participant.answers.iter().map(AnswerReport::from).collect(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnswerReport {
    pub question_id: QuestionId,
    pub selected_answer: String,
    pub time_spent: Seconds,
    pub is_correct: bool,
    pub timestamp: String,
}

impl From<&Answer> for AnswerReport {
    fn from(answer: &Answer) -> Self {
        AnswerReport {
            question_id: answer.question_id,
            selected_answer: answer.selected_answer.clone(),
            time_spent: answer.time_spent,
            is_correct: answer.is_correct,
            timestamp: timestamp(&answer.timestamp),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ViolationReport {
    pub participant_id: ParticipantId,
    pub participant_name: String,
    pub violation_type: ViolationKind,
    pub violation_details: String,
    pub timestamp: String,
}

impl ViolationReport {
    pub fn new(participant: &Participant, violation: &Violation) -> Self {
        ViolationReport {
            participant_id: participant.id.clone(),
            participant_name: participant.name.clone(),
            violation_type: violation.kind,
            violation_details: violation.details.clone(),
            timestamp: timestamp(&violation.timestamp),
        }
    }
}

// Endpoint reply: {"success": true, "message": ...} or {"success": false, "error": ...}
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReportResponse {
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl ReportResponse {
    pub fn ok(message: impl Into<String>) -> Self {
        ReportResponse { success: true, message: Some(message.into()), error: None }
    }

    pub fn failure(error: impl Into<String>) -> Self {
        ReportResponse { success: false, message: None, error: Some(error.into()) }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn actions_use_the_script_wire_format() {
        let initialize = serde_json::to_value(&ReportAction::Initialize).unwrap();
        assert_eq!(initialize, json!({"action": "initialize"}));

        let mut participant = Participant::new("Ada");
        participant.violations.push(Violation::new(ViolationKind::Copy, "Attempted to copy content"));
        let report = ReportAction::UpdateParticipant(ParticipantReport::new(&participant, 15, "now".to_string()));
        let value = serde_json::to_value(&report).unwrap();
        assert_eq!(value["action"], "updateParticipant");
        assert_eq!(value["data"]["name"], "Ada");
        assert_eq!(value["data"]["totalQuestions"], 15);
        assert_eq!(value["data"]["violationCount"], 1);
        assert_eq!(value["data"]["isActive"], true);

        let violation = ReportAction::LogViolation(ViolationReport::new(&participant, &participant.violations[0]));
        let value = serde_json::to_value(&violation).unwrap();
        assert_eq!(value["data"]["violationType"], "copy");
        assert_eq!(value["data"]["participantName"], "Ada");
    }

    #[test]
    fn initialize_parses_without_data() {
        let action: ReportAction = serde_json::from_value(json!({"action": "initialize"})).unwrap();
        assert_eq!(action, ReportAction::Initialize);
    }
}
