use std::io;
use std::sync::Arc;

use lazy_static::lazy_static;

use crate::config::Config;
use crate::questions::{load_questions, SCIENCE_QUESTIONS};
use crate::quiz_server::QuizServer;
use crate::reporter::SheetsReporter;
use crate::sheet_server::{SheetServer, Table};
use crate::traits::reporter::Reporter;

mod config;
mod controller;
mod detector;
mod error;
mod questions;
mod quiz_server;
mod quiz_webserver;
mod reporter;
mod results;
mod service;
mod sheet_server;
mod structs;
mod timer;
mod traits;
mod utils;

lazy_static! {
    static ref CONFIG: Config = config::load_config("config.toml");
}

#[actix_web::main]
async fn main() -> io::Result<()> {
    env_logger::init_from_env(env_logger::Env::new().default_filter_or("info"));

    let questions = match load_questions(CONFIG.question_file.as_deref()) {
        Ok(questions) => questions,
        Err(e) => {
            log::error!("Failed to load question bank, using the built-in questions: {}", e);
            SCIENCE_QUESTIONS.clone()
        }
    };

    // local stand-in for the spreadsheet endpoint
    let sheet = if CONFIG.serve_report_endpoint {
        match SheetServer::new(CONFIG.sheet_database.clone()).await {
            Ok((sheet_server, sheet_handle)) => {
                tokio::spawn(sheet_server.run());
                match sheet_handle.count_rows(Table::Participants).await {
                    Ok(count) => log::info!("Report database {} holds {} participants", CONFIG.sheet_database, count),
                    Err(e) => log::warn!("Failed to read report database: {}", e),
                }
                Some(sheet_handle)
            }
            Err(e) => {
                log::error!("Reporting endpoint disabled, database unavailable: {}", e);
                None
            }
        }
    } else {
        None
    };

    let reporter: Arc<dyn Reporter> = Arc::new(SheetsReporter::new(CONFIG.report_url.clone()));
    let (quiz_server, quiz_handle) = QuizServer::new(questions, CONFIG.question_duration, reporter);
    let server = quiz_webserver::new_webserver(quiz_handle, sheet, &CONFIG.bind_address)?;

    tokio::spawn(quiz_server.run());
    server.await
}
