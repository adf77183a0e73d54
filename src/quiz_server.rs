use std::io;
use std::sync::Arc;

use tokio::sync::{mpsc, oneshot, watch};
use tokio::time::Instant;

use crate::controller::{Phase, Progress, SessionController};
use crate::detector::{Signal, Subscription, ViolationDetector};
use crate::error::QuizError;
use crate::results::{AdminSummary, QuizResult};
use crate::structs::model::{Question, Violation};
use crate::structs::quiz_type::Seconds;
use crate::structs::submit::{QuestionView, Registration, SessionStatus, SignalAck, SubmitResponse};
use crate::timer::{Countdown, TimerState};
use crate::traits::reporter::Reporter;

#[derive(Debug)]
enum Command {
    Register {
        name: String,
        res_tx: oneshot::Sender<Result<Registration, QuizError>>,
    },

    Submit {
        answer: String,
        res_tx: oneshot::Sender<Result<SubmitResponse, QuizError>>,
    },

    /// Sent by the countdown when it expires
    TimeUp,

    Signal {
        signal: Signal,
        res_tx: oneshot::Sender<SignalAck>,
    },

    CurrentQuestion {
        res_tx: oneshot::Sender<Result<QuestionView, QuizError>>,
    },

    Results {
        res_tx: oneshot::Sender<Result<QuizResult, QuizError>>,
    },

    Admin {
        res_tx: oneshot::Sender<AdminSummary>,
    },

    Restart {
        res_tx: oneshot::Sender<Result<(), QuizError>>,
    },
}

/// Session actor.
///
/// Owns the controller, the countdown and the detector of the question on
/// screen. The countdown ticker runs as its own task and only reaches the
/// session through this actor's command channel. Signals are observed here,
/// in command order, so a violation is always recorded before any submission
/// queued behind it.
pub struct QuizServer {
    controller: SessionController,

    timer: Countdown,

    /// When the current question was shown
    question_shown: Instant,

    /// Detector of the question on screen
    subscription: Option<Subscription>,

    /// Detector callbacks land here and are drained right after each signal
    violation_tx: mpsc::UnboundedSender<Violation>,
    violation_rx: mpsc::UnboundedReceiver<Violation>,

    /// Foreground state carried over between question screens
    foreground: bool,

    remaining_rx: watch::Receiver<Seconds>,

    status_tx: watch::Sender<SessionStatus>,

    /// Command channel
    cmd_rx: mpsc::UnboundedReceiver<Command>,
}

impl QuizServer {
    pub fn new(questions: Vec<Question>, duration: Seconds, reporter: Arc<dyn Reporter>) -> (QuizServer, QuizServerHandle) {
        let (cmd_tx, cmd_rx) = mpsc::unbounded_channel();
        // weak, so dropping every handle still stops the server
        let timer_tx = cmd_tx.downgrade();
        let timer = Countdown::new(duration, move || {
            if let Some(tx) = timer_tx.upgrade() {
                let _ = tx.send(Command::TimeUp);
            }
        });
        let remaining_rx = timer.subscribe();

        let (violation_tx, violation_rx) = mpsc::unbounded_channel();
        let (status_tx, status_rx) = watch::channel(SessionStatus {
            phase: Phase::Registration,
            participant_id: None,
            question_number: 0,
            total_questions: questions.len(),
            time_left: duration,
            violation_count: 0,
            is_foreground: true,
        });

        (
            QuizServer {
                controller: SessionController::new(questions, reporter),
                timer,
                question_shown: Instant::now(),
                subscription: None,
                violation_tx,
                violation_rx,
                foreground: true,
                remaining_rx,
                status_tx,
                cmd_rx,
            },
            QuizServerHandle { cmd_tx, status_rx },
        )
    }

    pub async fn run(mut self) -> io::Result<()> {
        self.controller.initialize_reporting();
        log::info!("Quiz server started with {} questions", self.controller.questions().len());

        loop {
            tokio::select! {
                cmd = self.cmd_rx.recv() => match cmd {
                    Some(cmd) => self.handle(cmd),
                    None => break,
                },
                // countdown tick
                Ok(()) = self.remaining_rx.changed() => self.publish_status(),
            }
        }

        self.end_question();
        log::info!("Quiz server stopped");
        Ok(())
    }

    fn handle(&mut self, cmd: Command) {
        match cmd {
            Command::Register { name, res_tx } => {
                let _ = res_tx.send(self.register(&name));
            }

            Command::Submit { answer, res_tx } => {
                let time_spent = self.elapsed();
                let _ = res_tx.send(self.submit(&answer, time_spent));
            }

            Command::TimeUp => self.time_up(),

            Command::Signal { signal, res_tx } => {
                let _ = res_tx.send(self.forward_signal(signal));
            }

            Command::CurrentQuestion { res_tx } => {
                let _ = res_tx.send(self.question_view());
            }

            Command::Results { res_tx } => {
                let _ = res_tx.send(self.results());
            }

            Command::Admin { res_tx } => {
                let summary = AdminSummary::new(
                    self.controller.roster(),
                    self.controller.questions().len(),
                    self.question_number(),
                );
                let _ = res_tx.send(summary);
            }

            Command::Restart { res_tx } => {
                let result = self.controller.restart();
                self.publish_status();
                let _ = res_tx.send(result);
            }
        }
    }

    fn register(&mut self, name: &str) -> Result<Registration, QuizError> {
        let participant = self.controller.register(name)?;
        let (participant_id, name) = (participant.id.clone(), participant.name.clone());
        self.begin_question();
        Ok(Registration {
            participant_id,
            name,
            question: self.question_view()?,
        })
    }

    fn submit(&mut self, answer: &str, time_spent: Seconds) -> Result<SubmitResponse, QuizError> {
        if self.controller.phase() != Phase::Answering {
            return Err(QuizError::SessionInactive);
        }
        // cancel the pending expiry before the answer is recorded
        self.timer.reset(None);
        let progress = self.controller.submit_answer(answer.trim(), time_spent)?;
        let correct = self
            .controller
            .current_participant()
            .and_then(|participant| participant.answers.last())
            .map_or(false, |answer| answer.is_correct);

        let next = match progress {
            Progress::Next(_) => {
                self.begin_question();
                Some(self.question_view()?)
            }
            Progress::Finished => {
                self.end_question();
                self.publish_status();
                None
            }
        };
        Ok(SubmitResponse {
            correct,
            time_spent,
            finished: next.is_none(),
            next,
        })
    }

    fn time_up(&mut self) {
        // a manual submission got here first and already reset the timer
        if self.timer.state() != TimerState::Expired || self.controller.phase() != Phase::Answering {
            log::debug!("Ignoring stale time-up");
            return;
        }
        let duration = self.timer.duration();
        log::info!("Time is up on question {}, submitting an empty answer", self.question_number());
        if let Err(e) = self.submit("", duration) {
            log::error!("Auto-submit failed: {}", e);
        }
    }

    fn forward_signal(&mut self, signal: Signal) -> SignalAck {
        let Some(subscription) = self.subscription.as_mut() else {
            log::debug!("No question on screen, ignoring {:?}", signal);
            return SignalAck { suppress: false };
        };
        if subscription.deliver(&signal) {
            // the callback has already queued what the signal produced
            while let Ok(violation) = self.violation_rx.try_recv() {
                if let Err(e) = self.controller.report_violation(violation) {
                    log::debug!("Violation not recorded: {}", e);
                }
            }
        }
        self.publish_status();
        SignalAck { suppress: signal.suppressed() }
    }

    /// Shows the controller's current question: fresh detector, full countdown.
    fn begin_question(&mut self) {
        self.end_question();

        let violation_tx = self.violation_tx.clone();
        self.subscription = Some(ViolationDetector::new(self.foreground).attach(move |violation| {
            let _ = violation_tx.send(violation);
        }));

        self.timer.reset(None);
        self.timer.start();
        self.question_shown = Instant::now();
        self.publish_status();
    }

    /// Detaches the detector and stops the countdown of the question on screen.
    fn end_question(&mut self) {
        self.timer.reset(None);
        if let Some(subscription) = self.subscription.take() {
            self.foreground = subscription.cancel().is_foreground();
        }
    }

    // whole seconds since the question was shown, never more than the time allowed
    fn elapsed(&self) -> Seconds {
        let seconds = self.question_shown.elapsed().as_secs_f64().round() as Seconds;
        seconds.min(self.timer.duration())
    }

    fn question_number(&self) -> usize {
        self.controller.current_question().map_or(0, |(index, _)| index + 1)
    }

    fn question_view(&self) -> Result<QuestionView, QuizError> {
        let (index, question) = self.controller.current_question().ok_or(QuizError::SessionInactive)?;
        Ok(QuestionView::new(
            question,
            index,
            self.controller.questions().len(),
            self.timer.remaining(),
        ))
    }

    fn results(&self) -> Result<QuizResult, QuizError> {
        match (self.controller.phase(), self.controller.current_participant()) {
            (Phase::Results, Some(participant)) => Ok(QuizResult::from_participant(participant)),
            _ => Err(QuizError::QuizNotFinished),
        }
    }

    fn status(&self) -> SessionStatus {
        let participant = self.controller.current_participant();
        SessionStatus {
            phase: self.controller.phase(),
            participant_id: participant.map(|participant| participant.id.clone()),
            question_number: self.question_number(),
            total_questions: self.controller.questions().len(),
            time_left: self.timer.remaining(),
            violation_count: participant.map_or(0, |participant| participant.violations.len()),
            is_foreground: self
                .subscription
                .as_ref()
                .map_or(self.foreground, |subscription| subscription.status().is_foreground),
        }
    }

    fn publish_status(&self) {
        self.status_tx.send_replace(self.status());
    }
}

#[derive(Debug, Clone)]
pub struct QuizServerHandle {
    cmd_tx: mpsc::UnboundedSender<Command>,
    status_rx: watch::Receiver<SessionStatus>,
}

impl QuizServerHandle {
    async fn request<T>(&self, cmd: impl FnOnce(oneshot::Sender<T>) -> Command) -> Result<T, QuizError> {
        let (res_tx, res_rx) = oneshot::channel();
        self.cmd_tx.send(cmd(res_tx)).map_err(|_| QuizError::ServerClosed)?;
        res_rx.await.map_err(|_| QuizError::ServerClosed)
    }

    /// Registers a participant and shows them the first question
    pub async fn register(&self, name: impl Into<String>) -> Result<Registration, QuizError> {
        let name = name.into();
        self.request(|res_tx| Command::Register { name, res_tx }).await?
    }

    /// Manual submission for the question on screen
    pub async fn submit(&self, answer: impl Into<String>) -> Result<SubmitResponse, QuizError> {
        let answer = answer.into();
        self.request(|res_tx| Command::Submit { answer, res_tx }).await?
    }

    pub async fn signal(&self, signal: Signal) -> Result<SignalAck, QuizError> {
        self.request(|res_tx| Command::Signal { signal, res_tx }).await
    }

    pub async fn current_question(&self) -> Result<QuestionView, QuizError> {
        self.request(|res_tx| Command::CurrentQuestion { res_tx }).await?
    }

    pub async fn results(&self) -> Result<QuizResult, QuizError> {
        self.request(|res_tx| Command::Results { res_tx }).await?
    }

    pub async fn admin(&self) -> Result<AdminSummary, QuizError> {
        self.request(|res_tx| Command::Admin { res_tx }).await
    }

    pub async fn restart(&self) -> Result<(), QuizError> {
        self.request(|res_tx| Command::Restart { res_tx }).await?
    }

    pub fn status(&self) -> SessionStatus {
        self.status_rx.borrow().clone()
    }

    pub fn subscribe_status(&self) -> watch::Receiver<SessionStatus> {
        self.status_rx.clone()
    }
}
