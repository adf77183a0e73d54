use actix_web::http::StatusCode;
use actix_web::{web, HttpResponse};

use crate::error::QuizError;
use crate::quiz_server::QuizServerHandle;
use crate::structs::respond::Respond;
use crate::structs::submit::{RegisterRequest, SubmitRequest};

pub(crate) fn error_response(e: QuizError) -> HttpResponse {
    let code = e.status_code();
    if e == QuizError::ServerClosed {
        log::error!("Request failed, quiz server is not running");
    }
    HttpResponse::build(StatusCode::from_u16(code).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR))
        .json(Respond { code, msg: e.to_string() })
}

// Registers the participant and returns the first question
pub(crate) async fn register(req_body: web::Json<RegisterRequest>, quiz: web::Data<QuizServerHandle>) -> HttpResponse {
    match quiz.register(req_body.into_inner().name).await {
        Ok(registration) => HttpResponse::Ok().json(registration),
        Err(e) => error_response(e),
    }
}

pub(crate) async fn question(quiz: web::Data<QuizServerHandle>) -> HttpResponse {
    match quiz.current_question().await {
        Ok(question) => HttpResponse::Ok().json(question),
        Err(e) => error_response(e),
    }
}

pub(crate) async fn submit(req_body: web::Json<SubmitRequest>, quiz: web::Data<QuizServerHandle>) -> HttpResponse {
    match quiz.submit(req_body.into_inner().answer).await {
        Ok(response) => HttpResponse::Ok().json(response),
        Err(e) => error_response(e),
    }
}

pub(crate) async fn status(quiz: web::Data<QuizServerHandle>) -> HttpResponse {
    HttpResponse::Ok().json(quiz.status())
}

pub(crate) async fn results(quiz: web::Data<QuizServerHandle>) -> HttpResponse {
    match quiz.results().await {
        Ok(result) => HttpResponse::Ok().json(result),
        Err(e) => error_response(e),
    }
}

pub(crate) async fn restart(quiz: web::Data<QuizServerHandle>) -> HttpResponse {
    match quiz.restart().await {
        Ok(()) => HttpResponse::Ok().json(Respond { code: 200, msg: "ready for the next participant".to_string() }),
        Err(e) => error_response(e),
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use actix_web::{test, App};
    use serde_json::{json, Value};
    use tokio::sync::mpsc;

    use super::*;
    use crate::questions::SCIENCE_QUESTIONS;
    use crate::quiz_server::QuizServer;
    use crate::reporter::ChannelReporter;
    use crate::service::quiz_routes;

    fn quiz_handle() -> QuizServerHandle {
        let (tx, _) = mpsc::unbounded_channel();
        let (server, handle) = QuizServer::new(SCIENCE_QUESTIONS[..2].to_vec(), 30, Arc::new(ChannelReporter(tx)));
        tokio::spawn(server.run());
        handle
    }

    #[actix_web::test]
    async fn quiz_round_trip_over_http() {
        let app = test::init_service(
            App::new().app_data(web::Data::new(quiz_handle())).configure(quiz_routes),
        )
        .await;

        let req = test::TestRequest::post().uri("/api/register").set_json(json!({"name": "  "})).to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

        let req = test::TestRequest::post().uri("/api/register").set_json(json!({"name": "Ada"})).to_request();
        let registration: Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(registration["name"], "Ada");
        assert_eq!(registration["question"]["number"], 1);
        assert!(registration["question"].get("correctAnswer").is_none());

        let req = test::TestRequest::get().uri("/api/results").to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::CONFLICT);

        let req = test::TestRequest::post().uri("/api/submit").set_json(json!({"answer": "299,792,458 m/s"})).to_request();
        let submitted: Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(submitted["correct"], true);
        assert_eq!(submitted["next"]["number"], 2);

        let req = test::TestRequest::get().uri("/api/status").to_request();
        let status: Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(status["phase"], "answering");
        assert_eq!(status["questionNumber"], 2);

        let req = test::TestRequest::post().uri("/api/submit").set_json(json!({})).to_request();
        let submitted: Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(submitted["finished"], true);
        assert!(submitted["next"].is_null());

        let req = test::TestRequest::get().uri("/api/results").to_request();
        let result: Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(result["accuracy"], 50);
        assert_eq!(result["grade"], "D");

        let req = test::TestRequest::post().uri("/api/restart").to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::OK);
    }
}
