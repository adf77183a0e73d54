use actix_web::{web, HttpResponse};

use crate::quiz_server::QuizServerHandle;
use crate::service::quiz::error_response;

// Roster with progress and violation counts for the admin table
pub(crate) async fn admin(quiz: web::Data<QuizServerHandle>) -> HttpResponse {
    match quiz.admin().await {
        Ok(summary) => HttpResponse::Ok().json(summary),
        Err(e) => error_response(e),
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use actix_web::{test, App};
    use serde_json::Value;
    use tokio::sync::mpsc;

    use super::*;
    use crate::detector::Signal;
    use crate::questions::SCIENCE_QUESTIONS;
    use crate::quiz_server::QuizServer;
    use crate::reporter::ChannelReporter;
    use crate::service::quiz_routes;
    use crate::structs::report::ReportAction;

    #[actix_web::test]
    async fn admin_lists_the_roster() {
        let (tx, mut reports) = mpsc::unbounded_channel();
        let (server, quiz) = QuizServer::new(SCIENCE_QUESTIONS.clone(), 30, Arc::new(ChannelReporter(tx)));
        tokio::spawn(server.run());

        quiz.register("Grace").await.unwrap();
        quiz.signal(Signal::FocusLost).await.unwrap();
        quiz.signal(Signal::Paste).await.unwrap();
        let mut logged = 0;
        while logged < 2 {
            if let Some(ReportAction::LogViolation(_)) = reports.recv().await {
                logged += 1;
            }
        }
        quiz.submit("Au").await.unwrap();

        let app = test::init_service(App::new().app_data(web::Data::new(quiz)).configure(quiz_routes)).await;
        let req = test::TestRequest::get().uri("/api/admin").to_request();
        let summary: Value = test::call_and_read_body_json(&app, req).await;

        assert_eq!(summary["totalParticipants"], 1);
        assert_eq!(summary["activeParticipants"], 1);
        assert_eq!(summary["totalViolations"], 2);
        assert_eq!(summary["currentQuestion"], 2);
        assert_eq!(summary["completionRate"], 0);
        let entry = &summary["participants"][0];
        assert_eq!(entry["name"], "Grace");
        assert_eq!(entry["currentQuestion"], 1);
        assert_eq!(entry["standing"], "warning");
        assert_eq!(entry["recentViolations"][0]["type"], "focus_loss");
    }
}
