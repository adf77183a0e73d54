use log;
use tokio::sync::{mpsc, oneshot};
use sqlx::{pool::Pool, sqlite::{Sqlite, SqlitePoolOptions}};
use std::{error::Error, io};
use std::path::Path;
use crate::error::ConnectionClosedError;
use crate::structs::quiz_type::SqlFile;
use crate::structs::report::{ParticipantReport, ViolationReport};

type Reply<T> = oneshot::Sender<Result<T, Box<dyn Error + Send + Sync>>>;

#[derive(Debug)]
enum Command {
    Initialize {
        res_tx: Reply<()>,
    },
    UpdateParticipant {
        report: ParticipantReport,
        res_tx: Reply<()>,
    },
    LogViolation {
        report: ViolationReport,
        res_tx: Reply<()>,
    },
    CountRows {
        table: Table,
        res_tx: Reply<i64>,
    },
}

// The three sheets of the reporting endpoint
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Table {
    Participants,
    Answers,
    Violations,
}

impl Table {
    pub fn as_str(&self) -> &'static str {
        match self {
            Table::Participants => "participants",
            Table::Answers => "answers",
            Table::Violations => "violations",
        }
    }
}

/// Storage side of the reporting endpoint.
/// Participants are upserted by id, answers and violations are append-only.
pub struct SheetServer {
    pool: Pool<Sqlite>,

    /// Command channel
    cmd_rx: mpsc::UnboundedReceiver<Command>,
}

impl SheetServer {
    pub async fn new(sql_file: SqlFile) -> Result<(SheetServer, SheetServerHandle), Box<dyn Error>> {
        let (cmd_tx, cmd_rx) = mpsc::unbounded_channel();
        let connected = if sql_file == ":memory:" {
            // every connection gets its own in-memory database, so keep exactly one alive
            SqlitePoolOptions::new()
                .max_connections(1)
                .idle_timeout(None)
                .max_lifetime(None)
                .connect("sqlite::memory:")
                .await
        } else {
            // create the database file if it does not exist
            if !Path::new(sql_file.as_str()).exists() {
                log::info!("Database file missing, creating {}", sql_file.as_str());
                let file = std::fs::File::create(sql_file.as_str()).map_err(|e| {
                    log::error!("Failed to create database file: {:?}", e);
                    Box::new(e) as Box<dyn Error>
                })?;
                file.sync_all().map_err(|e| {
                    log::error!("Failed to sync database file: {:?}", e);
                    Box::new(e) as Box<dyn Error>
                })?;
            }
            SqlitePoolOptions::new()
                .max_connections(5)
                .connect(format!("sqlite://{}", sql_file).as_str())
                .await
        };
        let pool = connected.map_err(|e| {
            log::error!("Failed to create SQL pool: {:?}", e);
            Box::new(e) as Box<dyn Error>
        })?;

        let server = SheetServer { pool, cmd_rx };
        server.initialize().await.map_err(|e| {
            log::error!("Failed to create report tables: {:?}", e);
            Box::new(e) as Box<dyn Error>
        })?;

        Ok((server, SheetServerHandle { cmd_tx }))
    }

    /// Creates the three tables if they do not exist yet
    async fn initialize(&self) -> Result<(), sqlx::Error> {
        sqlx::query(
            "CREATE TABLE IF NOT EXISTS participants (
                participant_id   TEXT PRIMARY KEY,
                name             TEXT NOT NULL,
                current_question INTEGER NOT NULL,
                total_questions  INTEGER NOT NULL,
                total_time       INTEGER NOT NULL,
                violation_count  INTEGER NOT NULL,
                is_active        INTEGER NOT NULL,
                last_updated     TEXT NOT NULL
            )"
        )
        .execute(&self.pool)
        .await?;
        sqlx::query(
            "CREATE TABLE IF NOT EXISTS answers (
                id               INTEGER PRIMARY KEY AUTOINCREMENT,
                participant_id   TEXT NOT NULL,
                participant_name TEXT NOT NULL,
                question_id      INTEGER NOT NULL,
                answer           TEXT NOT NULL,
                time_spent       INTEGER NOT NULL,
                is_correct       INTEGER NOT NULL,
                timestamp        TEXT NOT NULL
            )"
        )
        .execute(&self.pool)
        .await?;
        sqlx::query(
            "CREATE TABLE IF NOT EXISTS violations (
                id               INTEGER PRIMARY KEY AUTOINCREMENT,
                participant_id   TEXT NOT NULL,
                participant_name TEXT NOT NULL,
                violation_type   TEXT NOT NULL,
                details          TEXT NOT NULL,
                timestamp        TEXT NOT NULL
            )"
        )
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    /// Upserts the summary row and appends only the most recent answer
    async fn update_participant(&self, report: ParticipantReport) -> Result<(), sqlx::Error> {
        let mut tx = self.pool.begin().await?;
        sqlx::query(
            "INSERT INTO participants
                (participant_id, name, current_question, total_questions, total_time, violation_count, is_active, last_updated)
             VALUES (?, ?, ?, ?, ?, ?, ?, ?)
             ON CONFLICT(participant_id) DO UPDATE SET
                name = excluded.name,
                current_question = excluded.current_question,
                total_questions = excluded.total_questions,
                total_time = excluded.total_time,
                violation_count = excluded.violation_count,
                is_active = excluded.is_active,
                last_updated = excluded.last_updated"
        )
        .bind(&report.participant_id)
        .bind(&report.name)
        .bind(report.current_question as i64)
        .bind(report.total_questions as i64)
        .bind(report.total_time as i64)
        .bind(report.violation_count as i64)
        .bind(report.is_active)
        .bind(&report.timestamp)
        .execute(&mut *tx)
        .await?;

        if let Some(last) = report.answers.last() {
            sqlx::query(
                "INSERT INTO answers
                    (participant_id, participant_name, question_id, answer, time_spent, is_correct, timestamp)
                 VALUES (?, ?, ?, ?, ?, ?, ?)"
            )
            .bind(&report.participant_id)
            .bind(&report.name)
            .bind(last.question_id as i64)
            .bind(&last.selected_answer)
            .bind(last.time_spent as i64)
            .bind(last.is_correct)
            .bind(&last.timestamp)
            .execute(&mut *tx)
            .await?;
        }
        tx.commit().await
    }

    async fn log_violation(&self, report: ViolationReport) -> Result<(), sqlx::Error> {
        sqlx::query(
            "INSERT INTO violations (participant_id, participant_name, violation_type, details, timestamp)
             VALUES (?, ?, ?, ?, ?)"
        )
        .bind(&report.participant_id)
        .bind(&report.participant_name)
        .bind(report.violation_type.as_str())
        .bind(&report.violation_details)
        .bind(&report.timestamp)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn count_rows(&self, table: Table) -> Result<i64, sqlx::Error> {
        let query = format!("SELECT COUNT(*) FROM {}", table.as_str());
        let row: (i64,) = sqlx::query_as(&query).fetch_one(&self.pool).await?;
        Ok(row.0)
    }

    pub async fn run(mut self) -> io::Result<()> {
        while let Some(cmd) = self.cmd_rx.recv().await {
            match cmd {
                Command::Initialize { res_tx } => {
                    let result = self.initialize().await.map_err(boxed);
                    let _ = res_tx.send(result);
                }
                Command::UpdateParticipant { report, res_tx } => {
                    let result = self.update_participant(report).await.map_err(boxed);
                    if let Err(e) = &result {
                        log::error!("Error updating participant row: {:?}", e);
                    }
                    let _ = res_tx.send(result);
                }
                Command::LogViolation { report, res_tx } => {
                    let result = self.log_violation(report).await.map_err(boxed);
                    if let Err(e) = &result {
                        log::error!("Error appending violation row: {:?}", e);
                    }
                    let _ = res_tx.send(result);
                }
                Command::CountRows { table, res_tx } => {
                    let result = self.count_rows(table).await.map_err(boxed);
                    let _ = res_tx.send(result);
                }
            }
        }

        Ok(())
    }
}

fn boxed(e: sqlx::Error) -> Box<dyn Error + Send + Sync> {
    Box::new(e)
}

#[derive(Debug, Clone)]
pub struct SheetServerHandle {
    cmd_tx: mpsc::UnboundedSender<Command>,
}

impl SheetServerHandle {
    async fn request<T>(&self, cmd: impl FnOnce(Reply<T>) -> Command) -> Result<T, Box<dyn Error + Send + Sync>> {
        let (res_tx, res_rx) = oneshot::channel();
        self.cmd_tx
            .send(cmd(res_tx))
            .map_err(|_| Box::new(ConnectionClosedError) as Box<dyn Error + Send + Sync>)?;
        res_rx
            .await
            .map_err(|_| Box::new(ConnectionClosedError) as Box<dyn Error + Send + Sync>)?
    }

    pub async fn initialize(&self) -> Result<(), Box<dyn Error + Send + Sync>> {
        self.request(|res_tx| Command::Initialize { res_tx }).await
    }

    pub async fn update_participant(&self, report: ParticipantReport) -> Result<(), Box<dyn Error + Send + Sync>> {
        self.request(|res_tx| Command::UpdateParticipant { report, res_tx }).await
    }

    pub async fn log_violation(&self, report: ViolationReport) -> Result<(), Box<dyn Error + Send + Sync>> {
        self.request(|res_tx| Command::LogViolation { report, res_tx }).await
    }

    pub async fn count_rows(&self, table: Table) -> Result<i64, Box<dyn Error + Send + Sync>> {
        self.request(|res_tx| Command::CountRows { table, res_tx }).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::structs::model::{Participant, Violation, ViolationKind};
    use crate::structs::report::AnswerReport;

    async fn memory_server() -> SheetServerHandle {
        let (server, handle) = SheetServer::new(":memory:".to_string()).await.unwrap();
        tokio::spawn(server.run());
        handle
    }

    fn answer(question_id: u32, text: &str, is_correct: bool) -> AnswerReport {
        AnswerReport {
            question_id,
            selected_answer: text.to_string(),
            time_spent: 4,
            is_correct,
            timestamp: "2024-03-01T12:30:00Z".to_string(),
        }
    }

    #[tokio::test]
    async fn initialize_is_idempotent() {
        let sheet = memory_server().await;
        sheet.initialize().await.unwrap();
        sheet.initialize().await.unwrap();
        assert_eq!(sheet.count_rows(Table::Participants).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn participant_rows_are_upserted_and_only_the_latest_answer_appended() {
        let sheet = memory_server().await;
        let participant = Participant::new("Ada");
        let mut report = ParticipantReport::new(&participant, 15, crate::utils::now());

        report.current_question = 1;
        report.answers = vec![answer(1, "299,792,458 m/s", true)];
        sheet.update_participant(report.clone()).await.unwrap();

        report.current_question = 2;
        report.answers.push(answer(2, "au", false));
        sheet.update_participant(report.clone()).await.unwrap();

        assert_eq!(sheet.count_rows(Table::Participants).await.unwrap(), 1);
        assert_eq!(sheet.count_rows(Table::Answers).await.unwrap(), 2);

        // a summary without answers only touches the participants table
        report.answers.clear();
        sheet.update_participant(report).await.unwrap();
        assert_eq!(sheet.count_rows(Table::Answers).await.unwrap(), 2);
    }

    #[tokio::test]
    async fn violations_are_appended() {
        let sheet = memory_server().await;
        let participant = Participant::new("Ada");
        for kind in [ViolationKind::Copy, ViolationKind::Copy, ViolationKind::FocusLoss] {
            let violation = Violation::new(kind, "detail");
            sheet.log_violation(ViolationReport::new(&participant, &violation)).await.unwrap();
        }
        assert_eq!(sheet.count_rows(Table::Violations).await.unwrap(), 3);
    }
}
