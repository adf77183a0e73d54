use serde::{Deserialize, Serialize};

use crate::controller::Phase;
use crate::detector::Signal;
use crate::structs::model::{Difficulty, Question};
use crate::structs::quiz_type::{ParticipantId, QuestionId, Seconds};

// Request and response bodies of the quiz API

#[derive(Deserialize, Debug)]
pub struct RegisterRequest {
    pub(crate) name: String,
}

#[derive(Deserialize, Debug)]
pub struct SubmitRequest {
    #[serde(default)]
    pub(crate) answer: String,
}

#[derive(Deserialize, Debug)]
pub struct SignalRequest {
    pub(crate) signal: Signal,
}

// A question as shown to the participant, canonical answer stripped
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct QuestionView {
    pub id: QuestionId,
    pub number: usize,
    pub total: usize,
    pub category: String,
    pub question: String,
    pub difficulty: Difficulty,
    pub time_left: Seconds,
}

impl QuestionView {
    pub fn new(question: &Question, index: usize, total: usize, time_left: Seconds) -> Self {
        QuestionView {
            id: question.id,
            number: index + 1,
            total,
            category: question.category.clone(),
            question: question.question.clone(),
            difficulty: question.difficulty,
            time_left,
        }
    }
}

#[derive(Serialize, Debug, Clone)]
#[serde(rename_all = "camelCase")]
pub struct Registration {
    pub participant_id: ParticipantId,
    pub name: String,
    pub question: QuestionView,
}

#[derive(Serialize, Debug, Clone)]
#[serde(rename_all = "camelCase")]
pub struct SubmitResponse {
    pub(crate) correct: bool,
    pub(crate) time_spent: Seconds,
    pub(crate) finished: bool,
    pub(crate) next: Option<QuestionView>,
}

#[derive(Serialize, Debug, Clone, Copy, PartialEq, Eq)]
pub struct SignalAck {
    // Whether the client should cancel the native action
    pub suppress: bool,
}

#[derive(Serialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct SessionStatus {
    pub phase: Phase,
    pub participant_id: Option<ParticipantId>,
    pub question_number: usize,
    pub total_questions: usize,
    pub time_left: Seconds,
    pub violation_count: usize,
    pub is_foreground: bool,
}
