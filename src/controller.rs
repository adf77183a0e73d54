use std::sync::Arc;

use serde::Serialize;
use time::OffsetDateTime;

use crate::error::QuizError;
use crate::structs::model::{Answer, Participant, Question, Violation};
use crate::structs::quiz_type::Seconds;
use crate::structs::report::{ParticipantReport, ReportAction, ViolationReport};
use crate::traits::reporter::Reporter;
use crate::utils::now;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    Registration,
    Answering,
    Results,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Progress {
    /// Index of the question to show next
    Next(usize),
    Finished,
}

/// Drives one quiz kiosk: the participant currently answering, their question
/// index, and every participant seen so far.
///
/// All participant mutation goes through here. Each recorded answer and
/// violation is also handed to the reporter.
pub struct SessionController {
    questions: Vec<Question>,
    roster: Vec<Participant>,
    current: Option<usize>,
    phase: Phase,
    reporter: Arc<dyn Reporter>,
}

impl SessionController {
    pub fn new(questions: Vec<Question>, reporter: Arc<dyn Reporter>) -> Self {
        SessionController {
            questions,
            roster: Vec::new(),
            current: None,
            phase: Phase::Registration,
            reporter,
        }
    }

    /// Asks the reporting endpoint to prepare its sheets
    pub fn initialize_reporting(&self) {
        self.reporter.report(ReportAction::Initialize);
    }

    pub fn register(&mut self, name: &str) -> Result<&Participant, QuizError> {
        if self.phase == Phase::Answering {
            return Err(QuizError::SessionInProgress);
        }
        let name = name.trim();
        if name.is_empty() {
            return Err(QuizError::EmptyName);
        }
        self.roster.push(Participant::new(name));
        self.current = Some(self.roster.len() - 1);
        self.phase = Phase::Answering;
        let participant = &self.roster[self.roster.len() - 1];
        log::info!("Participant {} registered as {}", participant.name, participant.id);
        Ok(participant)
    }

    /// Records the answer to the current question and advances.
    pub fn submit_answer(&mut self, text: &str, time_spent: Seconds) -> Result<Progress, QuizError> {
        let index = self.active_index()?;
        let total = self.questions.len();
        let participant = &mut self.roster[index];
        let question = &self.questions[participant.current_question];

        participant.answers.push(Answer {
            question_id: question.id,
            selected_answer: text.to_string(),
            time_spent,
            is_correct: question.is_correct(text),
            timestamp: OffsetDateTime::now_utc(),
        });
        participant.current_question += 1;
        participant.total_time += time_spent;

        let progress = if participant.current_question < total {
            Progress::Next(participant.current_question)
        } else {
            participant.is_active = false;
            self.phase = Phase::Results;
            log::info!(
                "Participant {} finished: {}/{} correct in {}s",
                participant.name,
                participant.correct_count(),
                total,
                participant.total_time
            );
            Progress::Finished
        };

        self.reporter
            .report(ReportAction::UpdateParticipant(ParticipantReport::new(participant, total, now())));
        Ok(progress)
    }

    pub fn report_violation(&mut self, violation: Violation) -> Result<(), QuizError> {
        let index = self.active_index()?;
        let participant = &mut self.roster[index];
        participant.violations.push(violation);
        if let Some(violation) = participant.violations.last() {
            self.reporter
                .report(ReportAction::LogViolation(ViolationReport::new(participant, violation)));
        }
        Ok(())
    }

    /// Back to the registration screen. The roster is kept.
    pub fn restart(&mut self) -> Result<(), QuizError> {
        if self.phase == Phase::Answering {
            return Err(QuizError::SessionInProgress);
        }
        self.current = None;
        self.phase = Phase::Registration;
        Ok(())
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn questions(&self) -> &[Question] {
        &self.questions
    }

    pub fn roster(&self) -> &[Participant] {
        &self.roster
    }

    pub fn current_participant(&self) -> Option<&Participant> {
        self.current.map(|index| &self.roster[index])
    }

    /// The question being answered, if any
    pub fn current_question(&self) -> Option<(usize, &Question)> {
        if self.phase != Phase::Answering {
            return None;
        }
        let participant = self.current_participant()?;
        let index = participant.current_question;
        self.questions.get(index).map(|question| (index, question))
    }

    fn active_index(&self) -> Result<usize, QuizError> {
        match self.current {
            Some(index) if self.phase == Phase::Answering && self.roster[index].is_active => Ok(index),
            _ => Err(QuizError::SessionInactive),
        }
    }
}
