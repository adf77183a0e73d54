use std::error::Error;
use std::fmt;

#[derive(Debug)]

pub struct ConnectionClosedError;
#[derive(Debug)]

pub struct EmptyQuestionBankError;
impl fmt::Display for ConnectionClosedError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "server channel closed unexpectedly")
    }
}
impl fmt::Display for EmptyQuestionBankError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "question bank contains no questions")
    }
}

impl Error for ConnectionClosedError {}
impl Error for EmptyQuestionBankError {}

// Rejected session transitions. These are caller mistakes, not runtime failures
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QuizError {
    EmptyName,
    SessionInProgress,
    SessionInactive,
    QuizNotFinished,
    ServerClosed,
}

impl QuizError {
    pub fn status_code(&self) -> u16 {
        match self {
            QuizError::EmptyName => 400,
            QuizError::SessionInProgress | QuizError::SessionInactive | QuizError::QuizNotFinished => 409,
            QuizError::ServerClosed => 500,
        }
    }
}

impl fmt::Display for QuizError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            QuizError::EmptyName => write!(f, "participant name must not be empty"),
            QuizError::SessionInProgress => write!(f, "a participant is still answering"),
            QuizError::SessionInactive => write!(f, "no active participant, the quiz is not running"),
            QuizError::QuizNotFinished => write!(f, "the quiz has not been completed yet"),
            QuizError::ServerClosed => write!(f, "quiz server is not running"),
        }
    }
}

impl Error for QuizError {}
