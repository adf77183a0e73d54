use std::error::Error;

use actix_web::{web, HttpResponse};
use serde::Deserialize;
use serde_json::Value;

use crate::sheet_server::SheetServerHandle;
use crate::structs::report::{ReportAction, ReportResponse};

#[derive(Deserialize, Debug)]
pub struct ExecQuery {
    action: Option<String>,
}

// Every reply is a 200 with a success flag, bad input included
pub(crate) async fn exec(body: web::Bytes, sheet: web::Data<SheetServerHandle>) -> HttpResponse {
    let response = match serde_json::from_slice::<Value>(&body) {
        Ok(value) => dispatch(value, &sheet).await,
        Err(e) => {
            log::warn!("Malformed report payload: {}", e);
            ReportResponse::failure(e.to_string())
        }
    };
    HttpResponse::Ok().json(response)
}

pub(crate) async fn initialize(query: web::Query<ExecQuery>, sheet: web::Data<SheetServerHandle>) -> HttpResponse {
    let response = match query.action.as_deref() {
        Some("initialize") => outcome(sheet.initialize().await, "Sheets initialized"),
        _ => ReportResponse::failure("Unknown action"),
    };
    HttpResponse::Ok().json(response)
}

async fn dispatch(value: Value, sheet: &SheetServerHandle) -> ReportResponse {
    let known = value
        .get("action")
        .and_then(Value::as_str)
        .map_or(false, |name| ReportAction::NAMES.iter().any(|known| *known == name));
    if !known {
        log::warn!("Unknown report action: {}", value.get("action").unwrap_or(&Value::Null));
        return ReportResponse::failure("Unknown action");
    }

    let action = match serde_json::from_value::<ReportAction>(value) {
        Ok(action) => action,
        Err(e) => {
            log::warn!("Invalid report payload: {}", e);
            return ReportResponse::failure(e.to_string());
        }
    };
    match action {
        ReportAction::Initialize => outcome(sheet.initialize().await, "Sheets initialized"),
        ReportAction::UpdateParticipant(report) => outcome(sheet.update_participant(report).await, "Participant updated"),
        ReportAction::LogViolation(report) => outcome(sheet.log_violation(report).await, "Violation logged"),
    }
}

fn outcome(result: Result<(), Box<dyn Error + Send + Sync>>, message: &str) -> ReportResponse {
    match result {
        Ok(()) => ReportResponse::ok(message),
        Err(e) => {
            log::error!("Report storage failed: {}", e);
            ReportResponse::failure(e.to_string())
        }
    }
}
